//! # bpjs-decoder
//!
//! Decoder for the opaque response payloads returned by BPJS web services.
//! Payloads arrive as base64 ciphertext; this crate reverses the AES
//! encryption, the LZ-string compression underneath it, and parses the
//! resulting JSON, classifying every failure with diagnostic artifacts.
//!
//! **Note:** request construction (headers, signatures, transport) is the
//! caller's concern; this crate only unwraps what comes back.
pub mod bpjs;

// Re-export the main types for convenience
pub use bpjs::{
    error::{CodecError, Result},
    models::{Artifacts, CipherMode, ParseStrategy, PipelineResult, Stage},
    ResponseDecoder,
};
