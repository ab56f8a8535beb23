mod catalog_file;
mod export;

pub use catalog_file::*;
pub use export::*;
