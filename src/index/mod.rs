pub mod build;
pub mod data;
pub mod reader;
pub mod types;

pub use build::{IndexBuilder, build_from_dir};
pub use data::IndexData;
pub use reader::{BlobReader, MmapReader, SectionReader};
pub use types::*;
