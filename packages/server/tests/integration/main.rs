
mod image;
mod portfolio;
