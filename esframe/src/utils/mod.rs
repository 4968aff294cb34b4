//! Utility functions and supporting infrastructure.
//!
//! Provides header bit reading, the dispatcher's carry-over cache and the
//! error taxonomy shared by parsers, codecs and the dispatcher.

pub mod bitstream_io;
pub mod errors;
pub mod frame_cache;
