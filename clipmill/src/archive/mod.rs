/// Archiver trait and the zip implementation.
pub mod zip;
