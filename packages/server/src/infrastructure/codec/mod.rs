//! Frame codecs and per-connection codec negotiation.
//!
//! - `plain`: UTF-8 passthrough
//! - `sealed`: XChaCha20-Poly1305 with a pre-shared key, base64 framed

pub mod plain;
pub mod sealed;

use std::{fmt, str::FromStr, sync::Arc};

use crate::domain::{CodecError, MessageCodec};

pub use plain::PlainCodec;
pub use sealed::{SEALED_KEY_LEN, SealedCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Plain,
    Sealed,
}

impl CodecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecKind::Plain => "plain",
            CodecKind::Sealed => "sealed",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(CodecKind::Plain),
            "sealed" => Ok(CodecKind::Sealed),
            other => Err(CodecError::Unsupported(other.to_string())),
        }
    }
}

/// Parse a 64-character hex string into a sealed-codec key
pub fn parse_codec_key(hex_key: &str) -> Result<[u8; SEALED_KEY_LEN], CodecError> {
    let bytes = hex::decode(hex_key.trim()).map_err(|e| CodecError::InvalidKey(e.to_string()))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        CodecError::InvalidKey(format!(
            "expected {SEALED_KEY_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

/// The codecs a server offers.
///
/// `plain` is always available; `sealed` only when a key is configured.
#[derive(Clone)]
pub struct CodecCatalog {
    plain: Arc<PlainCodec>,
    sealed: Option<Arc<SealedCodec>>,
}

impl CodecCatalog {
    pub fn new(sealed_key: Option<[u8; SEALED_KEY_LEN]>) -> Self {
        Self {
            plain: Arc::new(PlainCodec),
            sealed: sealed_key.map(|key| Arc::new(SealedCodec::new(&key))),
        }
    }

    pub fn plain_only() -> Self {
        Self::new(None)
    }

    /// Resolve the codec requested in an auth frame; `None` selects plain.
    pub fn resolve(&self, requested: Option<&str>) -> Result<Arc<dyn MessageCodec>, CodecError> {
        let kind = match requested {
            Some(name) => name.parse::<CodecKind>()?,
            None => CodecKind::Plain,
        };
        match kind {
            CodecKind::Plain => Ok(self.plain.clone()),
            CodecKind::Sealed => match &self.sealed {
                Some(codec) => Ok(codec.clone()),
                None => Err(CodecError::Unsupported(kind.to_string())),
            },
        }
    }

    pub fn offered(&self) -> Vec<CodecKind> {
        let mut kinds = vec![CodecKind::Plain];
        if self.sealed.is_some() {
            kinds.push(CodecKind::Sealed);
        }
        kinds
    }
}

impl Default for CodecCatalog {
    fn default() -> Self {
        Self::plain_only()
    }
}
