pub mod json;
pub mod payload;
