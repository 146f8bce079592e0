//! Structured-data parsing with ordered fallback strategies.

use log::{debug, trace};
use serde_json::Value;

use super::error::{CodecError, Result};
use super::models::ParseStrategy;

/// A successful parse and the strategy that produced it.
pub struct ParseAttempt {
    pub strategy: ParseStrategy,
    pub data: Value,
}

/// Tries the parse strategies in their fixed order and returns the first
/// success.
///
/// 1. The decompressed text, when the decompression stage produced one.
/// 2. The decrypted bytes directly, covering payloads that were never
///    compressed.
/// 3. The non-empty candidate with control bytes stripped, tried once.
///
/// Every strategy actually attempted is recorded in `tried`, so failure
/// results can report the exact attempt sequence.
pub fn parse_structured(
    decompressed: Option<&str>,
    decrypted: &[u8],
    tried: &mut Vec<ParseStrategy>,
) -> Result<ParseAttempt> {
    if let Some(text) = decompressed {
        tried.push(ParseStrategy::Decompressed);
        match serde_json::from_str(text) {
            Ok(data) => {
                return Ok(ParseAttempt {
                    strategy: ParseStrategy::Decompressed,
                    data,
                })
            }
            Err(e) => trace!("Decompressed text is not structured data: {}", e),
        }
    }

    tried.push(ParseStrategy::Decrypted);
    match serde_json::from_slice(decrypted) {
        Ok(data) => {
            return Ok(ParseAttempt {
                strategy: ParseStrategy::Decrypted,
                data,
            })
        }
        Err(e) => trace!("Decrypted bytes are not structured data: {}", e),
    }

    tried.push(ParseStrategy::Stripped);
    let candidate: &[u8] = match decompressed {
        Some(text) if !text.is_empty() => text.as_bytes(),
        _ => decrypted,
    };
    let stripped = strip_control_bytes(candidate);
    debug!(
        "Stripped {} control bytes before the final parse attempt",
        candidate.len() - stripped.len()
    );
    match serde_json::from_slice(&stripped) {
        Ok(data) => Ok(ParseAttempt {
            strategy: ParseStrategy::Stripped,
            data,
        }),
        Err(_) => Err(CodecError::ParseFailure),
    }
}

/// Removes ASCII control bytes (0x00-0x1F and 0x7F). Upstream payloads are
/// occasionally framed with stray control bytes that break an otherwise
/// valid JSON document.
fn strip_control_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|byte| !byte.is_ascii_control())
        .collect()
}
