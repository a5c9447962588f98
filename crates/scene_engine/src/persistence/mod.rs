//! Snapshot encoding and save file I/O
//!
//! The rest of the engine treats both as black boxes: values go in through
//! [`BlobCodec::encode`] and come back out of [`BlobCodec::decode`], bytes are
//! written and read whole with [`write_file`] and [`read_file`].

mod codec;
mod disk;

pub use codec::{BlobCodec, CodecKind};
pub use disk::{read_file, write_file};

use std::path::PathBuf;

/// Errors raised while encoding, decoding or storing snapshots
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    /// A value could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Bytes could not be decoded into the requested value
    #[error("Decode error: {0}")]
    Decode(String),

    /// Reading or writing a save file failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
