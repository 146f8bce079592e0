//! Custom error types for the bpjs-decoder crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A compressed-stream character is not part of the URI-safe alphabet.
    #[error("Invalid symbol {byte:#04x} at position {position}: not in the URI-safe alphabet")]
    MalformedAlphabetCharacter { byte: u8, position: usize },

    /// The compressed stream ran out of symbols before an end-of-stream marker.
    #[error("Compressed stream truncated at symbol {position}: no end-of-stream marker")]
    TruncatedStream { position: usize },

    /// A dictionary code was referenced before assignment and is not the
    /// "next code" sentinel. The stream is structurally invalid.
    #[error("Back-reference to unassigned dictionary code {code} (next unassigned code is {next_code})")]
    UndefinedBackReference { code: usize, next_code: usize },

    /// The decompressed code units do not form well-formed UTF-16 text.
    #[error("Decompressed output is not well-formed UTF-16 text")]
    MalformedText,

    /// The ciphertext string is not valid base64.
    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Every cipher mode in the trial order rejected the ciphertext.
    #[error("Decryption failed: no cipher mode in the trial order produced a plaintext")]
    DecryptFailure,

    /// Every structured-parse strategy was exhausted without a result.
    #[error("All parse strategies exhausted without producing structured data")]
    ParseFailure,
}

/// A convenience `Result` type alias using the crate's `CodecError` type.
pub type Result<T> = std::result::Result<T, CodecError>;
