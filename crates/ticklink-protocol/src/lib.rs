#![warn(missing_docs)]

//! ticklink-protocol: binary codec, frame layout and reserved control names.
//!
//! Every datagram is one frame: a length-prefixed UTF-8 event name followed
//! by opaque payload bytes. The receiver decodes the name first and only
//! then decides who interprets the rest.

/// Sequential primitive reader/writer.
pub mod codec;
/// Reserved protocol control frames.
pub mod control;
/// Frame encoding and decoding.
pub mod frame;

pub use codec::{NetworkReader, NetworkWriter};
pub use control::ControlFrame;
pub use frame::{decode_frame, encode_frame, Frame};
