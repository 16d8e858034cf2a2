// src/pipeline/readers/mod.rs

pub mod base_reader;
pub mod id_reader;

pub use base_reader::BaseReader;
pub use id_reader::JsonIdReader;
