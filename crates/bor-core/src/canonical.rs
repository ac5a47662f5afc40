//! Canonical CBOR encoding for deterministic fingerprints.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Finite integral floats in `i64` range are encoded as integers;
//!   other finite floats as 64-bit IEEE-754; NaN and infinities are rejected
//!
//! Every item carries its major type and length, so the encoding is
//! self-delimiting: distinct value trees never share a byte sequence.
//!
//! **This encoding is FROZEN.** Changing it invalidates every stored proof.

use ciborium::value::{Integer, Value as Cbor};

use crate::error::CoreError;
use crate::fingerprint::Fingerprint;
use crate::value::{Mapping, Value};

/// Maximum number of nested sequences and mappings in one value.
///
/// Stored proofs wrap values in two more JSON levels, and serde_json
/// refuses documents nested 128 deep, so this stays well below that.
pub const MAX_DEPTH: usize = 100;

/// Record field keys.
///
/// Stage and master records are text-keyed maps; the encoder sorts them.
pub(crate) mod keys {
    pub const STEP: &str = "step";
    pub const INPUT: &str = "input";
    pub const CONFIG: &str = "config";
    pub const VERSION: &str = "version";
    pub const OUTPUT: &str = "output";
    pub const INITIAL: &str = "initial";
    pub const STAGES: &str = "stages";
}

/// Encode a value to canonical bytes.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CoreError> {
    let cbor = value_to_cbor(value, 0)?;
    Ok(encode_cbor_value_canonical(&cbor))
}

/// Canonical bytes as lowercase hex, for diagnostics and test vectors.
pub fn canonical_hex(value: &Value) -> Result<String, CoreError> {
    canonicalize(value).map(hex::encode)
}

/// Canonical bytes of a stage record.
///
/// `{"step", "input", "config", "version", "output"}`
pub fn canonical_stage_bytes(
    step: &str,
    input: &Value,
    config: &Mapping,
    version: &str,
    output: &Value,
) -> Result<Vec<u8>, CoreError> {
    let entries = vec![
        (Cbor::Text(keys::STEP.into()), Cbor::Text(step.into())),
        (Cbor::Text(keys::INPUT.into()), value_to_cbor(input, 0)?),
        (Cbor::Text(keys::CONFIG.into()), mapping_to_cbor(config, 0)?),
        (Cbor::Text(keys::VERSION.into()), Cbor::Text(version.into())),
        (Cbor::Text(keys::OUTPUT.into()), value_to_cbor(output, 0)?),
    ];
    Ok(encode_cbor_value_canonical(&Cbor::Map(entries)))
}

/// Canonical bytes of the master record.
///
/// `{"initial", "config", "version", "stages": [bytes, ...]}`
pub fn canonical_master_bytes(
    initial: &Value,
    config: &Mapping,
    version: &str,
    stage_hashes: &[Fingerprint],
) -> Result<Vec<u8>, CoreError> {
    let stages = stage_hashes
        .iter()
        .map(|h| Cbor::Bytes(h.0.to_vec()))
        .collect();
    let entries = vec![
        (Cbor::Text(keys::INITIAL.into()), value_to_cbor(initial, 0)?),
        (Cbor::Text(keys::CONFIG.into()), mapping_to_cbor(config, 0)?),
        (Cbor::Text(keys::VERSION.into()), Cbor::Text(version.into())),
        (Cbor::Text(keys::STAGES.into()), Cbor::Array(stages)),
    ];
    Ok(encode_cbor_value_canonical(&Cbor::Map(entries)))
}

/// Convert a value to its CBOR data model, normalizing numbers.
///
/// `depth` counts the containers enclosing `value` within the same value;
/// record wrappers do not count.
fn value_to_cbor(value: &Value, depth: usize) -> Result<Cbor, CoreError> {
    match value {
        Value::Int(n) => Ok(Cbor::Integer((*n).into())),
        Value::Float(x) => float_to_cbor(*x),
        Value::Bool(b) => Ok(Cbor::Bool(*b)),
        Value::Text(s) => Ok(Cbor::Text(s.clone())),
        Value::Seq(items) => {
            enter_container(depth)?;
            items
                .iter()
                .map(|item| value_to_cbor(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Cbor::Array)
        }
        Value::Map(m) => mapping_to_cbor(m, depth),
    }
}

fn mapping_to_cbor(mapping: &Mapping, depth: usize) -> Result<Cbor, CoreError> {
    enter_container(depth)?;
    mapping
        .iter()
        .map(|(k, v)| Ok((Cbor::Text(k.clone()), value_to_cbor(v, depth + 1)?)))
        .collect::<Result<Vec<_>, CoreError>>()
        .map(Cbor::Map)
}

fn enter_container(depth: usize) -> Result<(), CoreError> {
    if depth >= MAX_DEPTH {
        return Err(CoreError::UnsupportedType(format!(
            "more than {} nested containers",
            MAX_DEPTH
        )));
    }
    Ok(())
}

/// Normalize a float to its canonical CBOR form.
///
/// Integral values in `i64` range become integers, so `2.0` and `2` encode
/// identically; `-0.0` becomes `0`.
fn float_to_cbor(x: f64) -> Result<Cbor, CoreError> {
    if !x.is_finite() {
        return Err(CoreError::UnsupportedType(format!("non-finite float: {}", x)));
    }
    // 2^63 is exactly representable; i64::MAX is not.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if x.fract() == 0.0 && x >= -TWO_POW_63 && x < TWO_POW_63 {
        return Ok(Cbor::Integer((x as i64).into()));
    }
    Ok(Cbor::Float(x))
}

/// Encode a CBOR Value to canonical bytes.
///
/// This function ensures:
/// - Map keys are sorted by encoded byte comparison
/// - Integers use smallest encoding
/// - Definite lengths only
fn encode_cbor_value_canonical(value: &Cbor) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
///
/// Only variants produced by `value_to_cbor` and the record builders reach
/// this function.
fn encode_value_to(buf: &mut Vec<u8>, value: &Cbor) {
    match value {
        Cbor::Integer(i) => encode_integer(buf, *i),
        Cbor::Bytes(b) => encode_bytes(buf, b),
        Cbor::Text(s) => encode_text(buf, s),
        Cbor::Array(arr) => encode_array(buf, arr),
        Cbor::Map(entries) => encode_map_canonical(buf, entries),
        Cbor::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Cbor::Float(x) => {
            buf.push(0xfb);
            buf.extend_from_slice(&x.to_bits().to_be_bytes());
        }
        Cbor::Null => buf.push(0xf6),
        Cbor::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner);
        }
        // ciborium's Value is non-exhaustive; nothing else is ever constructed here.
        _ => buf.push(0xf7),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Cbor]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Cbor, Cbor)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Cbor)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
