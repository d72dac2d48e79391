pub mod parsing;
pub mod geo;
pub mod reader;
