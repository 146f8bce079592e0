//! Core response decoding module.
//!
//! # Submodules
//!
//! - [`crypto`][]: Key derivation and the ordered AES cipher-mode trials
//! - [`lz`][]: LZ-string compression/decompression over the URI-safe alphabet
//! - [`models`][]: Pipeline result and artifact types
//! - [`error`][]: Error types

pub mod error;
pub mod models;

mod alphabet;
mod bits;
pub mod crypto;
pub mod lz;
mod parse;

use log::{debug, info};

use models::{Artifacts, PipelineResult, Stage};
pub use error::{CodecError, Result};

/// Decodes encrypted response payloads for one API consumer.
///
/// Holds the consumer credentials used for per-request key derivation. The
/// decoder itself is stateless beyond them: every call derives a fresh key
/// (the timestamp is part of the derivation) and owns all of its working
/// state, so one decoder may be shared freely across threads.
pub struct ResponseDecoder {
    consumer_id: String,
    consumer_secret: String,
}

impl ResponseDecoder {
    pub fn new(consumer_id: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_id: consumer_id.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Runs the full pipeline over one response payload.
    ///
    /// Stages run strictly forward: decrypt, decompress, parse. A decrypt
    /// failure is terminal. A decompression failure is not: the parse stage
    /// falls back to the decrypted text, covering payloads that were never
    /// compressed. Every failure result carries the intermediate artifacts
    /// produced so far, so callers can diagnose without re-fetching.
    ///
    /// `timestamp` must be the value sent with the originating request; it
    /// is part of the key derivation.
    pub fn decode(&self, ciphertext: &str, timestamp: u64) -> PipelineResult {
        info!(
            "Decoding response payload ({} base64 chars, timestamp {})",
            ciphertext.len(),
            timestamp
        );

        // Stage 1: decrypt
        let key = crypto::derive_key(&self.consumer_id, &self.consumer_secret, timestamp);
        let (decrypted, cipher_mode) = match crypto::decrypt_response(ciphertext, &key) {
            Ok(outcome) => outcome,
            Err(reason) => {
                debug!("Decrypt stage failed: {}", reason);
                return PipelineResult::Failure {
                    reason,
                    artifacts: Artifacts::ciphertext_only(ciphertext),
                };
            }
        };
        debug!("Decrypted {} bytes using {}", decrypted.len(), cipher_mode);

        // Stage 2: decompress
        let decompressed = match std::str::from_utf8(&decrypted) {
            Ok(text) => match lz::decompress_from_uri_component(text) {
                Ok(output) => {
                    debug!("Decompressed to {} chars", output.len());
                    Some(output)
                }
                Err(e) => {
                    debug!("Decompress stage failed: {}", e);
                    None
                }
            },
            Err(_) => {
                debug!("Decrypted bytes are not UTF-8 text, skipping decompression");
                None
            }
        };
        let decompress_failed = decompressed.is_none();

        // Stage 3: parse with fallbacks
        let mut strategies_tried = Vec::new();
        match parse::parse_structured(decompressed.as_deref(), &decrypted, &mut strategies_tried) {
            Ok(attempt) => {
                info!("Parse succeeded with the {} strategy", attempt.strategy);
                PipelineResult::Success {
                    data: attempt.data,
                    cipher_mode,
                    parse_strategy: attempt.strategy,
                }
            }
            Err(_) => {
                let stage = if decompress_failed {
                    Stage::Decompress
                } else {
                    Stage::Parse
                };
                debug!(
                    "Pipeline failed at the {} stage after {} parse attempts",
                    stage,
                    strategies_tried.len()
                );
                PipelineResult::PartialFailure {
                    stage,
                    artifacts: Artifacts {
                        ciphertext: ciphertext.to_string(),
                        decrypted: Some(decrypted),
                        decompressed,
                    },
                    strategies_tried,
                }
            }
        }
    }

    /// Like [`decode`](Self::decode), for envelopes whose payload field may
    /// be absent. A missing payload yields [`PipelineResult::Empty`],
    /// distinguishable from a successful decode of an empty payload.
    pub fn decode_opt(&self, ciphertext: Option<&str>, timestamp: u64) -> PipelineResult {
        match ciphertext {
            Some(text) => self.decode(text, timestamp),
            None => {
                debug!("Response envelope carried no payload");
                PipelineResult::Empty
            }
        }
    }
}
