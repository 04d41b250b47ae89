pub mod health;
pub mod image;
pub mod mail;
pub mod portfolio;
pub mod stats;
