pub mod file_sink;
pub mod metadata;
