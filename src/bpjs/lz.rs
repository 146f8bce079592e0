//! LZ-string codec over the URI-safe alphabet.
//!
//! The format is a bit stream packed into 6-bit symbols. Codes index a
//! dictionary of previously seen fragments that grows as the stream is
//! consumed; the number of bits per code grows with the dictionary. Three
//! codes are reserved for control meaning:
//!
//! - 0: the next 8 bits are a literal unit
//! - 1: the next 16 bits are a literal unit
//! - 2: end of stream
//!
//! Text is modeled as UTF-16 code units throughout (the unit model of the
//! reference codec): the 8-bit literal path carries units below 256, the
//! 16-bit path the rest, and "first character of a fragment" uniformly means
//! its first code unit. Unpaired surrogates in the final output are rejected
//! as [`CodecError::MalformedText`] rather than replaced.

use std::collections::{HashMap, HashSet};

use log::trace;

use super::alphabet::{self, BITS_PER_SYMBOL};
use super::bits::BitCursor;
use super::error::{CodecError, Result};

const CODE_LITERAL_8: u32 = 0;
const CODE_LITERAL_16: u32 = 1;
const CODE_END_OF_STREAM: u32 = 2;

/// Number of reserved control codes; data codes start here.
const RESERVED_CODES: usize = 3;

/// Code width at the start of decoding: reserved codes plus the first
/// literal fit in 3 bits.
const INITIAL_DECODE_WIDTH: u32 = 3;

/// Code width at the start of encoding, before the first literal exists.
const INITIAL_ENCODE_WIDTH: u32 = 2;

/// Decompresses a URI-component-safe LZ-string.
///
/// An empty input decompresses to an empty string with no error. Any other
/// input must be a well-formed stream: an unknown symbol, a back-reference
/// to an unassigned code, or running out of symbols before the end marker
/// all fail the decode. Partial output is never returned as success, since
/// downstream parsing must not receive truncated data mislabeled as valid.
pub fn decompress_from_uri_component(input: &str) -> Result<String> {
    if input.is_empty() {
        return Ok(String::new());
    }
    trace!("Decompressing {} symbols", input.len());

    let mut cursor = BitCursor::new(input.as_bytes())?;
    let mut dictionary: Vec<Vec<u16>> = vec![Vec::new(); RESERVED_CODES];
    let mut code_width = INITIAL_DECODE_WIDTH;
    let mut enlarge_in: u64 = 4;

    // The first code is one of the three control codes, read in 2 bits.
    let first = match cursor.read_bits(2)? {
        CODE_LITERAL_8 => cursor.read_bits(8)? as u16,
        CODE_LITERAL_16 => cursor.read_bits(16)? as u16,
        CODE_END_OF_STREAM => return Ok(String::new()),
        other => {
            return Err(CodecError::UndefinedBackReference {
                code: other as usize,
                next_code: RESERVED_CODES,
            })
        }
    };
    dictionary.push(vec![first]);
    let mut previous = vec![first];
    let mut output = vec![first];

    loop {
        let code = cursor.read_bits(code_width)? as usize;
        let fragment = match code as u32 {
            CODE_LITERAL_8 | CODE_LITERAL_16 => {
                let bit_count = if code as u32 == CODE_LITERAL_8 { 8 } else { 16 };
                let unit = cursor.read_bits(bit_count)? as u16;
                dictionary.push(vec![unit]);
                count_down(&mut enlarge_in, &mut code_width);
                vec![unit]
            }
            CODE_END_OF_STREAM => {
                trace!(
                    "End marker after {} output units ({} dictionary entries)",
                    output.len(),
                    dictionary.len()
                );
                return String::from_utf16(&output).map_err(|_| CodecError::MalformedText);
            }
            _ => resolve_fragment(&dictionary, code, &previous)?,
        };

        output.extend_from_slice(&fragment);

        // Register previous fragment + first unit of the resolved fragment.
        let mut entry = Vec::with_capacity(previous.len() + 1);
        entry.extend_from_slice(&previous);
        entry.push(fragment[0]);
        dictionary.push(entry);
        count_down(&mut enlarge_in, &mut code_width);

        previous = fragment;
    }
}

/// Resolves a data code against the dictionary.
///
/// A code equal to the next unassigned index is the back-reference sentinel:
/// the fragment being defined right now, which must equal the previous
/// fragment extended by its own first unit. Any larger code means the stream
/// is structurally invalid.
fn resolve_fragment(dictionary: &[Vec<u16>], code: usize, previous: &[u16]) -> Result<Vec<u16>> {
    if code < dictionary.len() {
        Ok(dictionary[code].clone())
    } else if code == dictionary.len() {
        let mut fragment = previous.to_vec();
        fragment.push(previous[0]);
        Ok(fragment)
    } else {
        Err(CodecError::UndefinedBackReference {
            code,
            next_code: dictionary.len(),
        })
    }
}

/// Decrements the enlarge countdown; when it hits zero the code width grows
/// by one and the countdown restarts at 2^(width before the increment).
///
/// Applied after every dictionary-growing step so the width change lands on
/// exactly the code boundary the encoder used.
fn count_down(enlarge_in: &mut u64, code_width: &mut u32) {
    *enlarge_in -= 1;
    if *enlarge_in == 0 {
        *enlarge_in = 1 << *code_width;
        *code_width += 1;
    }
}

/// Compresses text to a URI-component-safe LZ-string.
///
/// The exact inverse of [`decompress_from_uri_component`]; output is
/// byte-compatible with the reference encoder. Used for outgoing request
/// payloads and for round-trip verification.
pub fn compress_to_uri_component(input: &str) -> String {
    let mut dictionary: HashMap<Vec<u16>, u32> = HashMap::new();
    // Units seen once but not yet emitted; their first emission is a literal.
    let mut pending_literals: HashSet<Vec<u16>> = HashSet::new();
    let mut next_code = RESERVED_CODES as u32;
    let mut enlarge_in: u64 = 2;
    let mut code_width = INITIAL_ENCODE_WIDTH;
    let mut writer = SymbolWriter::new();
    let mut current: Vec<u16> = Vec::new();

    for unit in input.encode_utf16() {
        let single = vec![unit];
        if !dictionary.contains_key(&single) {
            dictionary.insert(single.clone(), next_code);
            next_code += 1;
            pending_literals.insert(single.clone());
        }

        let mut extended = current.clone();
        extended.push(unit);
        if dictionary.contains_key(&extended) {
            current = extended;
        } else {
            emit_code(
                &mut writer,
                &dictionary,
                &mut pending_literals,
                &current,
                &mut enlarge_in,
                &mut code_width,
            );
            dictionary.insert(extended, next_code);
            next_code += 1;
            current = single;
        }
    }
    if !current.is_empty() {
        emit_code(
            &mut writer,
            &dictionary,
            &mut pending_literals,
            &current,
            &mut enlarge_in,
            &mut code_width,
        );
    }

    writer.write_bits(CODE_END_OF_STREAM, code_width);
    writer.finish()
}

/// Emits the code for one fragment, as a literal on its first appearance.
fn emit_code(
    writer: &mut SymbolWriter,
    dictionary: &HashMap<Vec<u16>, u32>,
    pending_literals: &mut HashSet<Vec<u16>>,
    fragment: &[u16],
    enlarge_in: &mut u64,
    code_width: &mut u32,
) {
    if pending_literals.remove(fragment) {
        let unit = fragment[0];
        if unit < 256 {
            writer.write_bits(CODE_LITERAL_8, *code_width);
            writer.write_bits(u32::from(unit), 8);
        } else {
            writer.write_bits(CODE_LITERAL_16, *code_width);
            writer.write_bits(u32::from(unit), 16);
        }
        count_down(enlarge_in, code_width);
    } else {
        writer.write_bits(dictionary[fragment], *code_width);
    }
    count_down(enlarge_in, code_width);
}

/// Packs bits into 6-bit symbols, most significant bit first within each
/// symbol.
struct SymbolWriter {
    output: String,
    value: u8,
    filled: u32,
}

impl SymbolWriter {
    fn new() -> Self {
        Self {
            output: String::new(),
            value: 0,
            filled: 0,
        }
    }

    fn write_bit(&mut self, bit: u32) {
        self.value = (self.value << 1) | bit as u8;
        self.filled += 1;
        if self.filled == BITS_PER_SYMBOL {
            self.output.push(alphabet::symbol_for(self.value));
            self.value = 0;
            self.filled = 0;
        }
    }

    /// Writes `count` bits of `value`, least significant first.
    fn write_bits(&mut self, mut value: u32, count: u32) {
        for _ in 0..count {
            self.write_bit(value & 1);
            value >>= 1;
        }
    }

    /// Zero-pads and flushes the trailing symbol. Always emits at least one
    /// padding bit, matching the reference encoder's flush.
    fn finish(mut self) -> String {
        loop {
            self.value <<= 1;
            self.filled += 1;
            if self.filled == BITS_PER_SYMBOL {
                self.output.push(alphabet::symbol_for(self.value));
                break;
            }
        }
        self.output
    }
}
