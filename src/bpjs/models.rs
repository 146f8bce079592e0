//! Data structures representing the decoding pipeline's inputs and results.

use serde_json::Value;

use super::error::CodecError;

/// AES block-cipher mode used for one decryption trial.
///
/// Upstream does not document how responses are encrypted, so the pipeline
/// tries a fixed ordered list of mode variants and accepts the first one
/// that decrypts cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    /// AES-256-ECB over the whole decoded buffer, no IV.
    Ecb,
    /// First 16 decoded bytes are the IV, the remainder is AES-256-CBC ciphertext.
    Cbc,
}

impl CipherMode {
    /// The fixed trial order. Each mode is attempted at most once.
    pub const TRIAL_ORDER: [CipherMode; 2] = [CipherMode::Ecb, CipherMode::Cbc];
}

impl std::fmt::Display for CipherMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CipherMode::Ecb => write!(f, "AES-256-ECB"),
            CipherMode::Cbc => write!(f, "AES-256-CBC"),
        }
    }
}

/// Cipher parameters for a single decryption trial.
///
/// Constructed fresh per request from (consumerID, consumerSecret, timestamp);
/// the timestamp is part of the key derivation, so contexts are never cached
/// or reused across timestamps.
#[derive(Debug)]
pub struct CipherContext {
    pub mode: CipherMode,
    pub key: [u8; 32],
    /// Present only for IV-based modes.
    pub iv: Option<[u8; 16]>,
}

/// Pipeline stage identifiers, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decrypt,
    Decompress,
    Parse,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Stage::Decrypt => write!(f, "decrypt"),
            Stage::Decompress => write!(f, "decompress"),
            Stage::Parse => write!(f, "parse"),
        }
    }
}

/// Structured-parse fallback strategies, in their fixed attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Parse the decompressed text.
    Decompressed,
    /// Parse the decrypted bytes directly (payload was never compressed).
    Decrypted,
    /// Strip control bytes from the non-empty candidate and parse once more.
    Stripped,
}

impl std::fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParseStrategy::Decompressed => write!(f, "decompressed"),
            ParseStrategy::Decrypted => write!(f, "decrypted"),
            ParseStrategy::Stripped => write!(f, "stripped"),
        }
    }
}

/// Intermediate values preserved for diagnosis when the pipeline fails.
///
/// Failures keep every stage's output so callers can inspect what went
/// wrong without re-invoking the upstream network call.
#[derive(Debug)]
pub struct Artifacts {
    /// The original base64 ciphertext, exactly as received.
    pub ciphertext: String,
    /// Plaintext bytes from the cipher stage, if it completed.
    pub decrypted: Option<Vec<u8>>,
    /// Output of the decompression attempt, if it completed.
    pub decompressed: Option<String>,
}

impl Artifacts {
    pub(crate) fn ciphertext_only(ciphertext: &str) -> Self {
        Self {
            ciphertext: ciphertext.to_string(),
            decrypted: None,
            decompressed: None,
        }
    }
}

/// Classified result of one pipeline run.
#[derive(Debug)]
pub enum PipelineResult {
    /// Every stage completed; `data` is the parsed document.
    Success {
        data: Value,
        /// Cipher mode that produced the accepted plaintext.
        cipher_mode: CipherMode,
        /// Parse strategy that produced `data`.
        parse_strategy: ParseStrategy,
    },
    /// Decryption succeeded but no parse strategy produced structured data.
    PartialFailure {
        /// The first stage that failed.
        stage: Stage,
        artifacts: Artifacts,
        /// Parse strategies attempted, in order.
        strategies_tried: Vec<ParseStrategy>,
    },
    /// The pipeline failed before producing any intermediate output.
    Failure {
        reason: CodecError,
        artifacts: Artifacts,
    },
    /// No payload was present in the response envelope. Distinct from a
    /// successful decode of an empty payload.
    Empty,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success { .. })
    }

    /// The parsed document, if the pipeline succeeded.
    pub fn data(&self) -> Option<&Value> {
        match self {
            PipelineResult::Success { data, .. } => Some(data),
            _ => None,
        }
    }
}
