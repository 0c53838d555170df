pub mod merge;
pub mod summary;
