use crate::domain::{CodecError, MessageCodec};

/// UTF-8 passthrough
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCodec;

impl MessageCodec for PlainCodec {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn encode(&self, plaintext: &str) -> Result<Vec<u8>, CodecError> {
        Ok(plaintext.as_bytes().to_vec())
    }

    fn decode(&self, frame: &[u8]) -> Result<String, CodecError> {
        String::from_utf8(frame.to_vec()).map_err(|e| CodecError::MalformedFrame(e.to_string()))
    }
}
