use bpjs_decoder::bpjs::crypto;
use bpjs_decoder::{
    CipherMode, CodecError, ParseStrategy, PipelineResult, ResponseDecoder, Stage,
};
use serde_json::json;

const CONSUMER_ID: &str = "1";
const CONSUMER_SECRET: &str = "s";
const TIMESTAMP: u64 = 1000;

/// SHA-256("1" || "s" || "1000"), computed with a reference implementation.
const KEY_HEX: &str = "bd94b4f0d4e5427a452788f0ab857517f392cc229e9a920c62cbc98adf97a0b4";

const PAYLOAD_JSON: &str =
    r#"{"list":[{"nama_pegawai":"BUDI SANTOSO","nik":"3173051201880002"}],"total":1}"#;

// Fixtures generated with a reference implementation against the key above.
// Plaintexts: the LZ-compressed form of PAYLOAD_JSON, PAYLOAD_JSON itself,
// a control-byte-framed JSON fragment, and the compressed form of
// "hello hello hello".
const ECB_COMPRESSED_B64: &str = "qh4jngN6TGSUM/UqjicwlY0kVjXtbQ7xzhZyDjyPDqTgLKn4BvfqFnRIL7oAZ0fzxQMdooMEBEbgJS077ODV9rok4W3DWvxRPLuncc6Wjy4fpJkWVbXNDghsvgdRKrXzLWfZanOGadwTB5QqpObEArBpLgooa3NlJqmXMLRgKqk=";
const CBC_COMPRESSED_B64: &str = "AAECAwQFBgcICQoLDA0OD6l1re5Oamm5a0cOJhBqlYT9Mzw8w6T1BbbnwMb2sboKCGYkIDGfjF56x6KQI3JQNKdNMpEHWfEbBcPEcWaNlkCFmrohC0rF5VKRsyvhNnMBBcN/JYvSRzgSN0aR5Uwr186EZ3exa/2PW2B3ym3mTq0vnPr+NYf3w3NaPeGhy1+A";
const ECB_PLAIN_JSON_B64: &str = "ICF69V+FDslpQkzsx/JINlfcIFYrSfnXIMF1xKt+cJqqkYxBogWgoxzj+eX3H9D58pdr311Dl4EJqCyL8fZRnn+bTZcFCaobxnfcX+d1tv4=";
const ECB_FRAMED_JSON_B64: &str = "oFNtah603HbqXjwiR5yd83FU8c79BLWJbkNAazCr2Wo=";
const ECB_HELLO_B64: &str = "l8g4Ydohb0a/86K5PhSQJg==";
/// Plaintext is non-UTF-8 binary, so decompression is skipped entirely.
const ECB_BINARY_B64: &str = "sJ4BDnf1NWs3HT2T/l+C9692DVExw8b7+kGZ0qvcIZg=";

/// base64 of 32 zero bytes: rejected by both cipher modes under the key above.
const ZEROS_B64: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
/// 5 bytes, not block-aligned.
const SHORT_B64: &str = "AAECAwQ=";

fn decoder() -> ResponseDecoder {
    ResponseDecoder::new(CONSUMER_ID, CONSUMER_SECRET)
}

fn expected_payload() -> serde_json::Value {
    serde_json::from_str(PAYLOAD_JSON).expect("payload fixture is valid JSON")
}

#[test]
fn key_derivation_matches_known_digest() {
    let key = crypto::derive_key(CONSUMER_ID, CONSUMER_SECRET, TIMESTAMP);
    assert_eq!(hex::encode(key), KEY_HEX);

    // Same quadruple, same key; different timestamp, different key.
    assert_eq!(key, crypto::derive_key(CONSUMER_ID, CONSUMER_SECRET, TIMESTAMP));
    assert_ne!(key, crypto::derive_key(CONSUMER_ID, CONSUMER_SECRET, TIMESTAMP + 1));
}

#[test]
fn ecb_payload_decodes_end_to_end() {
    match decoder().decode(ECB_COMPRESSED_B64, TIMESTAMP) {
        PipelineResult::Success {
            data,
            cipher_mode,
            parse_strategy,
        } => {
            assert_eq!(data, expected_payload());
            assert_eq!(cipher_mode, CipherMode::Ecb);
            assert_eq!(parse_strategy, ParseStrategy::Decompressed);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn iv_prefixed_cbc_payload_decodes_end_to_end() {
    match decoder().decode(CBC_COMPRESSED_B64, TIMESTAMP) {
        PipelineResult::Success {
            data,
            cipher_mode,
            parse_strategy,
        } => {
            assert_eq!(data, expected_payload());
            assert_eq!(cipher_mode, CipherMode::Cbc);
            assert_eq!(parse_strategy, ParseStrategy::Decompressed);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn uncompressed_payload_falls_back_to_decrypted_text() {
    match decoder().decode(ECB_PLAIN_JSON_B64, TIMESTAMP) {
        PipelineResult::Success {
            data,
            parse_strategy,
            ..
        } => {
            assert_eq!(data, expected_payload());
            assert_eq!(parse_strategy, ParseStrategy::Decrypted);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn control_byte_framed_payload_uses_strip_strategy() {
    match decoder().decode(ECB_FRAMED_JSON_B64, TIMESTAMP) {
        PipelineResult::Success {
            data,
            parse_strategy,
            ..
        } => {
            assert_eq!(data, json!({"ok": true, "n": 7}));
            assert_eq!(parse_strategy, ParseStrategy::Stripped);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[test]
fn non_json_payload_reports_artifacts_and_attempt_order() {
    match decoder().decode(ECB_HELLO_B64, TIMESTAMP) {
        PipelineResult::PartialFailure {
            stage,
            artifacts,
            strategies_tried,
        } => {
            assert_eq!(stage, Stage::Parse);
            assert_eq!(
                strategies_tried,
                vec![
                    ParseStrategy::Decompressed,
                    ParseStrategy::Decrypted,
                    ParseStrategy::Stripped,
                ]
            );
            assert_eq!(artifacts.ciphertext, ECB_HELLO_B64);
            assert_eq!(
                artifacts.decrypted.as_deref(),
                Some("BYUwNmD2AEoTcpA".as_bytes())
            );
            assert_eq!(artifacts.decompressed.as_deref(), Some("hello hello hello"));
        }
        other => panic!("expected PartialFailure, got {:?}", other),
    }
}

#[test]
fn binary_payload_fails_at_the_decompress_stage() {
    match decoder().decode(ECB_BINARY_B64, TIMESTAMP) {
        PipelineResult::PartialFailure {
            stage,
            artifacts,
            strategies_tried,
        } => {
            assert_eq!(stage, Stage::Decompress);
            // The decompressed-text strategy is never attempted when there
            // is no decompressed text.
            assert_eq!(
                strategies_tried,
                vec![ParseStrategy::Decrypted, ParseStrategy::Stripped]
            );
            assert!(artifacts.decrypted.is_some());
            assert!(artifacts.decompressed.is_none());
        }
        other => panic!("expected PartialFailure, got {:?}", other),
    }
}

#[test]
fn zero_block_ciphertext_fails_both_modes() {
    // Verified against a reference implementation: neither ECB over the
    // whole buffer nor IV-prefixed CBC unpads cleanly under this key.
    for _ in 0..2 {
        match decoder().decode(ZEROS_B64, TIMESTAMP) {
            PipelineResult::Failure { reason, artifacts } => {
                assert!(matches!(reason, CodecError::DecryptFailure));
                assert_eq!(artifacts.ciphertext, ZEROS_B64);
                assert!(artifacts.decrypted.is_none());
                assert!(artifacts.decompressed.is_none());
            }
            other => panic!("expected Failure, got {:?}", other),
        }
    }
}

#[test]
fn short_ciphertext_fails_without_panicking() {
    match decoder().decode(SHORT_B64, TIMESTAMP) {
        PipelineResult::Failure { reason, .. } => {
            assert!(matches!(reason, CodecError::DecryptFailure));
        }
        other => panic!("expected Failure, got {:?}", other),
    }
}

#[test]
fn wrong_timestamp_cannot_decrypt() {
    // Verified against a reference implementation: both trials reject the
    // ciphertext under the shifted key.
    match decoder().decode(ECB_COMPRESSED_B64, TIMESTAMP + 1) {
        PipelineResult::Failure { reason, .. } => {
            assert!(matches!(reason, CodecError::DecryptFailure));
        }
        other => panic!("expected Failure, got {:?}", other),
    }
}

#[test]
fn invalid_base64_is_reported() {
    match decoder().decode("not base64 at all!!!", TIMESTAMP) {
        PipelineResult::Failure { reason, artifacts } => {
            assert!(matches!(reason, CodecError::Base64(_)));
            assert_eq!(artifacts.ciphertext, "not base64 at all!!!");
        }
        other => panic!("expected Failure, got {:?}", other),
    }
}

#[test]
fn cipher_stage_is_deterministic() {
    let key = crypto::derive_key(CONSUMER_ID, CONSUMER_SECRET, TIMESTAMP);
    let first = crypto::decrypt_response(ECB_COMPRESSED_B64, &key).expect("decrypt");
    let second = crypto::decrypt_response(ECB_COMPRESSED_B64, &key).expect("decrypt");
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
}

#[test]
fn missing_payload_yields_empty_sentinel() {
    let result = decoder().decode_opt(None, TIMESTAMP);
    assert!(matches!(result, PipelineResult::Empty));
    assert!(!result.is_success());
    assert!(result.data().is_none());

    // A present payload goes through the normal pipeline.
    assert!(decoder()
        .decode_opt(Some(ECB_COMPRESSED_B64), TIMESTAMP)
        .is_success());
}
