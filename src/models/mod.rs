pub mod enums;
pub mod crime;
pub mod report;
pub mod correction;
pub mod geo_loc;

pub use crime::*;
pub use report::*;
pub use correction::*;
pub use geo_loc::*;
