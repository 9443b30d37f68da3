use base64::{engine::general_purpose::STANDARD, Engine};

/// Converts raw chunk bytes to a transport-safe text representation.
pub trait ChunkEncoder: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> String;

    /// Identifier for the representation (e.g., "base64").
    fn name(&self) -> &str;
}

/// Standard-alphabet base64 with padding and no line wrapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Encoder;

impl ChunkEncoder for Base64Encoder {
    fn encode(&self, bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    fn name(&self) -> &str {
        "base64"
    }
}
