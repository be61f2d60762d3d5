//! Primitive serialization and deserialization.
//!
//! Fixed-width values are little-endian. Strings carry their UTF-8 byte
//! length as a 7-bit variable-length prefix, low groups first.
//!
//! - [`writer`] - appends primitives to an owned buffer
//! - [`reader`] - consumes primitives from a borrowed buffer

pub mod reader;
pub mod writer;

#[cfg(test)]
mod tests;

pub use reader::NetworkReader;
pub use writer::NetworkWriter;
