pub mod image;
pub mod pagination;
