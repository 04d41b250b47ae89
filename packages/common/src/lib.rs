pub mod category;
pub mod image;
pub mod storage;

pub use category::Category;
pub use image::{ImageSource, InlineImage};
