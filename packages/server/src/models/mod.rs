pub mod mail;
pub mod portfolio;
pub mod shared;
pub mod stats;
