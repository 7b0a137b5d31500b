//! Property tests for the frame codecs.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use proptest::prelude::*;

use tertulia_server::{
    domain::MessageCodec,
    infrastructure::codec::{PlainCodec, SealedCodec},
};

const KEY: [u8; 32] = [42u8; 32];

proptest! {
    #[test]
    fn plain_decode_inverts_encode(message in ".*") {
        let codec = PlainCodec;
        let frame = codec.encode(&message).unwrap();
        prop_assert_eq!(codec.decode(&frame).unwrap(), message);
    }

    #[test]
    fn sealed_decode_inverts_encode(message in ".*") {
        let codec = SealedCodec::new(&KEY);
        let frame = codec.encode(&message).unwrap();
        prop_assert!(!frame.contains(&b'\n'));
        prop_assert_eq!(codec.decode(&frame).unwrap(), message);
    }

    #[test]
    fn sealed_rejects_tampered_frames(message in ".{1,64}", index in any::<prop::sample::Index>()) {
        let codec = SealedCodec::new(&KEY);
        let frame = codec.encode(&message).unwrap();

        let mut raw = STANDARD.decode(&frame).unwrap();
        let at = index.index(raw.len());
        raw[at] ^= 0x01;
        let tampered = STANDARD.encode(raw).into_bytes();

        prop_assert!(codec.decode(&tampered).is_err());
    }

    #[test]
    fn sealed_rejects_other_keys(message in ".*") {
        let frame = SealedCodec::new(&KEY).encode(&message).unwrap();
        let other = SealedCodec::new(&[1u8; 32]);
        prop_assert!(other.decode(&frame).is_err());
    }
}

#[test]
fn test_sealed_frames_use_fresh_nonces() {
    // テスト項目: 同じ平文でも暗号化のたびに異なるフレームになる
    // given (前提条件):
    let codec = SealedCodec::new(&KEY);

    // when (操作):
    let first = codec.encode("hola").unwrap();
    let second = codec.encode("hola").unwrap();

    // then (期待する結果):
    assert_ne!(first, second);
}
