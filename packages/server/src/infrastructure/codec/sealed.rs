//! Authenticated encryption codec.
//!
//! Frame layout: `base64(nonce[24] || ciphertext)`. Base64 keeps the frame
//! free of newlines.

use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};

use crate::domain::{CodecError, MessageCodec};

pub const SEALED_KEY_LEN: usize = 32;

const NONCE_LEN: usize = 24;

pub struct SealedCodec {
    cipher: XChaCha20Poly1305,
}

impl SealedCodec {
    pub fn new(key: &[u8; SEALED_KEY_LEN]) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }
}

impl MessageCodec for SealedCodec {
    fn name(&self) -> &'static str {
        "sealed"
    }

    fn encode(&self, plaintext: &str) -> Result<Vec<u8>, CodecError> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CodecError::MalformedFrame(e.to_string()))?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(nonce.as_slice());
        raw.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(raw).into_bytes())
    }

    fn decode(&self, frame: &[u8]) -> Result<String, CodecError> {
        let raw = STANDARD
            .decode(frame.trim_ascii())
            .map_err(|e| CodecError::MalformedFrame(e.to_string()))?;
        if raw.len() < NONCE_LEN {
            return Err(CodecError::MalformedFrame("frame shorter than nonce".into()));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CodecError::MalformedFrame("authentication failed".into()))?;

        String::from_utf8(plaintext).map_err(|e| CodecError::MalformedFrame(e.to_string()))
    }
}
