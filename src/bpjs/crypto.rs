//! Cryptographic operations for the response envelope.
//!
//! Key derivation and the ordered cipher-mode trials used to reverse the
//! upstream AES encryption.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyInit, KeyIvInit};
use aes::Aes256;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, trace};
use sha2::{Digest, Sha256};

use super::error::{CodecError, Result};
use super::models::{CipherContext, CipherMode};

type Aes256EcbDec = ecb::Decryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

/// Derives the response key for one request.
///
/// Key = SHA-256(consumerID || consumerSecret || timestamp), with the
/// timestamp rendered in decimal. The concatenation order is part of the
/// shared-secret contract with the upstream service and must be reproduced
/// bit-for-bit. A fresh key is derived per call; nothing is cached, since
/// the timestamp changes per request.
pub fn derive_key(consumer_id: &str, consumer_secret: &str, timestamp: u64) -> [u8; KEY_LEN] {
    debug!("Deriving response key for timestamp {}", timestamp);

    let mut hasher = Sha256::new();
    hasher.update(consumer_id.as_bytes());
    hasher.update(consumer_secret.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.finalize().into()
}

/// Decodes the base64 ciphertext and runs the cipher-mode trials in order.
///
/// Trial order:
/// 1. AES-256-ECB over the whole decoded buffer
/// 2. AES-256-CBC with the first 16 bytes as IV and the remainder as ciphertext
///
/// The first mode that decrypts without a padding error is accepted; each
/// mode is attempted at most once. If every trial fails, the ciphertext is
/// undecryptable under this key and [`CodecError::DecryptFailure`] is
/// returned.
pub fn decrypt_response(ciphertext: &str, key: &[u8; KEY_LEN]) -> Result<(Vec<u8>, CipherMode)> {
    let data = BASE64.decode(ciphertext.trim())?;
    trace!("Ciphertext is {} bytes after base64 decoding", data.len());

    for mode in CipherMode::TRIAL_ORDER {
        let Some((context, body)) = CipherContext::prepare(mode, key, &data) else {
            trace!("{} skipped: {} bytes is too short for this mode", mode, data.len());
            continue;
        };
        match context.decrypt(body) {
            Some(plaintext) => {
                debug!("{} produced {} plaintext bytes", mode, plaintext.len());
                return Ok((plaintext, mode));
            }
            None => trace!("{} rejected the ciphertext", mode),
        }
    }

    Err(CodecError::DecryptFailure)
}

impl CipherContext {
    /// Splits `data` according to the mode's IV convention and builds the
    /// trial context. Returns `None` when the buffer is too short for the
    /// mode to apply at all.
    fn prepare<'a>(
        mode: CipherMode,
        key: &[u8; KEY_LEN],
        data: &'a [u8],
    ) -> Option<(Self, &'a [u8])> {
        match mode {
            CipherMode::Ecb => {
                let context = Self {
                    mode,
                    key: *key,
                    iv: None,
                };
                Some((context, data))
            }
            CipherMode::Cbc => {
                if data.len() <= IV_LEN {
                    return None;
                }
                let (iv, body) = data.split_at(IV_LEN);
                let mut iv_bytes = [0u8; IV_LEN];
                iv_bytes.copy_from_slice(iv);
                let context = Self {
                    mode,
                    key: *key,
                    iv: Some(iv_bytes),
                };
                Some((context, body))
            }
        }
    }

    /// Runs one trial. `None` means the cipher library rejected the input
    /// (bad length or bad padding), which sends the caller to the next mode.
    fn decrypt(&self, body: &[u8]) -> Option<Vec<u8>> {
        match self.mode {
            CipherMode::Ecb => Aes256EcbDec::new_from_slice(&self.key)
                .ok()?
                .decrypt_padded_vec_mut::<Pkcs7>(body)
                .ok(),
            CipherMode::Cbc => {
                let iv = self.iv.as_ref()?;
                Aes256CbcDec::new_from_slices(&self.key, iv)
                    .ok()?
                    .decrypt_padded_vec_mut::<Pkcs7>(body)
                    .ok()
            }
        }
    }
}
