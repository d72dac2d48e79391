//! Token stream extraction: field consumers and the runners that drive them.

pub mod date;
pub mod date_range;
pub mod drexel;
pub mod error;
pub mod once;
pub mod runner;
pub mod traits;

pub use date::LogPatterns;
pub use date_range::{DateRangeConsumer, DATE_RANGE_CONSUMER_NAME};
pub use drexel::{DrexelExtractor, DREXEL_EXTRACTOR_NAME};
pub use error::{ParseError, UnitError};
pub use once::OnceRunner;
pub use runner::{ParseOutput, ParserRunner};
pub use traits::{FieldConsumer, Step};
