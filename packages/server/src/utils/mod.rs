pub mod image;
pub mod mail;
pub mod query;
