//! Frame codec trait.
//!
//! Applied to every frame after the auth handshake, in both directions.
//! Frames are newline delimited on the wire, so a codec whose output may
//! contain `\n` must only be used for text that does not.

use super::error::CodecError;

pub trait MessageCodec: Send + Sync {
    /// Name negotiated in the auth frame
    fn name(&self) -> &'static str;

    fn encode(&self, plaintext: &str) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, frame: &[u8]) -> Result<String, CodecError>;
}
