use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::PersistenceError;

/// Wire encoding used for snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecKind {
    /// Compact binary encoding (bincode)
    #[default]
    Binary,
    /// Human readable encoding (RON), handy when debugging save files
    Text,
}

/// Encodes serde values to opaque byte blobs and back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobCodec {
    kind: CodecKind,
}

impl BlobCodec {
    /// Create a codec for the given encoding
    pub const fn new(kind: CodecKind) -> Self {
        Self { kind }
    }

    /// The encoding in use
    pub const fn kind(&self) -> CodecKind {
        self.kind
    }

    /// Encode a value
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, PersistenceError> {
        match self.kind {
            CodecKind::Binary => bincode::serde::encode_to_vec(value, bincode::config::standard())
                .map_err(|e| PersistenceError::Encode(e.to_string())),
            CodecKind::Text => ron::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| PersistenceError::Encode(e.to_string())),
        }
    }

    /// Decode a value previously produced by [`encode`](Self::encode) with the same encoding
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, PersistenceError> {
        match self.kind {
            CodecKind::Binary => {
                let (value, read) =
                    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                        .map_err(|e| PersistenceError::Decode(e.to_string()))?;
                if read != bytes.len() {
                    return Err(PersistenceError::Decode(format!(
                        "{} trailing bytes after value",
                        bytes.len() - read
                    )));
                }
                Ok(value)
            }
            CodecKind::Text => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| PersistenceError::Decode(e.to_string()))?;
                ron::from_str(text).map_err(|e| PersistenceError::Decode(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: i32,
        name: String,
        weights: Vec<f32>,
    }

    fn sample() -> Sample {
        Sample {
            id: 7,
            name: "crate".to_string(),
            weights: vec![0.5, 1.5],
        }
    }

    #[test]
    fn both_encodings_round_trip() {
        for kind in [CodecKind::Binary, CodecKind::Text] {
            let codec = BlobCodec::new(kind);
            let bytes = codec.encode(&sample()).unwrap();
            assert_eq!(codec.decode::<Sample>(&bytes).unwrap(), sample());
        }
    }

    #[test]
    fn text_encoding_is_readable() {
        let bytes = BlobCodec::new(CodecKind::Text).encode(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("crate"));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let codec = BlobCodec::new(CodecKind::Text);
        assert!(matches!(
            codec.decode::<Sample>(b"not ron at all ("),
            Err(PersistenceError::Decode(_))
        ));

        let codec = BlobCodec::new(CodecKind::Binary);
        assert!(codec.decode::<Sample>(&[0xff]).is_err());
    }
}
