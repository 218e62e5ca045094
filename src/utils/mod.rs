pub mod keys;
pub mod limited_reader;
