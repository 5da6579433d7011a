//! # ABI Codec
//!
//! Minimal contract ABI support: selectors, event topics, head/tail argument
//! encoding and event argument decoding for the types the deployment and
//! registration surfaces use (`address`, `uint256`, `bool`, `string`).

use crate::domain::interface::CallSignature;
use crate::domain::value_objects::{Address, Hash, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// ABI word size in bytes.
pub const WORD: usize = 32;

// =============================================================================
// ARGUMENTS
// =============================================================================

/// A typed call, constructor or event argument.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CallArg {
    /// 20-byte address.
    Address(Address),
    /// Unsigned 256-bit integer.
    Uint(U256),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string (dynamic).
    Str(String),
}

impl CallArg {
    /// Canonical ABI type of this argument.
    #[must_use]
    pub fn abi_type(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Uint(_) => "uint256",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
        }
    }

    /// Returns the address if this is an address argument.
    #[must_use]
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(address) => Some(*address),
            _ => None,
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Str(_))
    }
}

impl fmt::Debug for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(a) => write!(f, "{a:?}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Errors decoding ABI data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// Parameter type not supported by this codec.
    #[error("unsupported ABI type: {0}")]
    UnsupportedType(String),
    /// Data ended before the expected word.
    #[error("ABI data too short: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        available: usize,
    },
    /// String payload is not valid UTF-8.
    #[error("invalid UTF-8 in string argument")]
    InvalidUtf8,
}

// =============================================================================
// SIGNATURES
// =============================================================================

/// Canonical signature for a method name and its arguments.
#[must_use]
pub fn call_signature(method: &str, args: &[CallArg]) -> String {
    let types: Vec<&str> = args.iter().map(CallArg::abi_type).collect();
    format!("{method}({})", types.join(","))
}

/// First four bytes of keccak256(signature).
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Topic-0 of a non-anonymous event: keccak256(signature).
#[must_use]
pub fn event_topic(signature: &str) -> Hash {
    Hash::new(Keccak256::digest(signature.as_bytes()).into())
}

// =============================================================================
// ENCODING
// =============================================================================

fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn static_word(arg: &CallArg) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match arg {
        CallArg::Address(address) => word[12..].copy_from_slice(address.as_bytes()),
        CallArg::Uint(value) => word = uint_word(*value),
        CallArg::Bool(flag) => word[31] = u8::from(*flag),
        CallArg::Str(_) => {}
    }
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Encodes arguments as an ABI tuple (head/tail layout).
#[must_use]
pub fn encode(args: &[CallArg]) -> Vec<u8> {
    let head_len = args.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        if let CallArg::Str(text) = arg {
            let offset = U256::from(head_len + tail.len());
            head.extend_from_slice(&uint_word(offset));

            let bytes = text.as_bytes();
            tail.extend_from_slice(&uint_word(U256::from(bytes.len())));
            tail.extend_from_slice(bytes);
            tail.resize(tail.len() + padded_len(bytes.len()) - bytes.len(), 0);
        } else {
            debug_assert!(!arg.is_dynamic());
            head.extend_from_slice(&static_word(arg));
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Encodes a function call: selector followed by the argument tuple.
#[must_use]
pub fn encode_call(method: &str, args: &[CallArg]) -> Vec<u8> {
    let mut data = selector(&call_signature(method, args)).to_vec();
    data.extend_from_slice(&encode(args));
    data
}

// =============================================================================
// DECODING
// =============================================================================

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let truncated = AbiError::Truncated {
        needed: offset.saturating_add(WORD),
        available: data.len(),
    };
    let end = offset.checked_add(WORD).ok_or_else(|| truncated.clone())?;
    data.get(offset..end).ok_or(truncated)
}

/// Reads a word holding an offset or length. Values past `usize::MAX` can
/// never index `data`.
fn usize_at(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(word_at(data, offset)?);
    if value > U256::from(usize::MAX) {
        return Err(AbiError::Truncated {
            needed: usize::MAX,
            available: data.len(),
        });
    }
    Ok(value.as_usize())
}

/// Decodes a single static word as the given ABI type.
pub fn decode_word(kind: &str, word: &[u8]) -> Result<CallArg, AbiError> {
    if word.len() != WORD {
        return Err(AbiError::Truncated {
            needed: WORD,
            available: word.len(),
        });
    }
    match kind {
        "address" => Ok(CallArg::Address(Address::from_slice(&word[12..]).unwrap_or_default())),
        "uint256" => Ok(CallArg::Uint(U256::from_big_endian(word))),
        "bool" => Ok(CallArg::Bool(word[31] != 0)),
        other => Err(AbiError::UnsupportedType(other.to_string())),
    }
}

fn decode_string(data: &[u8], head_offset: usize) -> Result<CallArg, AbiError> {
    let offset = usize_at(data, head_offset)?;
    let len = usize_at(data, offset)?;
    let start = offset.checked_add(WORD);
    let bytes = start
        .and_then(|start| Some(start..start.checked_add(len)?))
        .and_then(|range| data.get(range))
        .ok_or(AbiError::Truncated {
            needed: start.map_or(usize::MAX, |start| start.saturating_add(len)),
            available: data.len(),
        })?;
    String::from_utf8(bytes.to_vec())
        .map(CallArg::Str)
        .map_err(|_| AbiError::InvalidUtf8)
}

/// Decodes the arguments of an emitted event from its topics and data.
///
/// `topics` excludes topic-0 (the signature hash). Indexed parameters are read
/// from topics in order; the rest are read from `data` as a tuple.
pub fn decode_event(
    event: &CallSignature,
    topics: &[Hash],
    data: &[u8],
) -> Result<Vec<CallArg>, AbiError> {
    let mut indexed = topics.iter();
    let mut head_offset = 0usize;
    let mut args = Vec::with_capacity(event.inputs.len());

    for param in &event.inputs {
        if param.is_indexed() {
            let topic = indexed.next().ok_or(AbiError::Truncated {
                needed: WORD,
                available: 0,
            })?;
            args.push(decode_word(&param.kind, topic.as_bytes())?);
        } else if param.kind == "string" {
            args.push(decode_string(data, head_offset)?);
            head_offset += WORD;
        } else {
            args.push(decode_word(&param.kind, word_at(data, head_offset)?)?);
            head_offset += WORD;
        }
    }

    Ok(args)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interface::Param;

    #[test]
    fn test_known_selector() {
        // transfer(address,uint256) -> a9059cbb
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_known_event_topic() {
        let topic = event_topic("Transfer(address,address,uint256)");
        assert_eq!(
            topic.to_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_call_signature_from_args() {
        let args = [CallArg::Address(Address::ZERO), CallArg::Str("AA".into())];
        assert_eq!(call_signature("wireApp", &args[..1]), "wireApp(address)");
        assert_eq!(call_signature("init", &args), "init(address,string)");
    }

    #[test]
    fn test_encode_static_args() {
        let address = Address::new([0x11; 20]);
        let encoded = encode(&[CallArg::Address(address), CallArg::Uint(U256::from(5)), CallArg::Bool(true)]);

        assert_eq!(encoded.len(), 3 * WORD);
        assert_eq!(&encoded[..12], &[0u8; 12]);
        assert_eq!(&encoded[12..32], address.as_bytes());
        assert_eq!(encoded[63], 5);
        assert_eq!(encoded[95], 1);
    }

    #[test]
    fn test_encode_string_uses_offset_and_padding() {
        let encoded = encode(&[CallArg::Str("hello".into()), CallArg::Uint(U256::from(7))]);

        // head: offset(0x40), 7 ; tail: len(5), "hello" padded to one word
        assert_eq!(encoded.len(), 4 * WORD);
        assert_eq!(encoded[31], 0x40);
        assert_eq!(encoded[63], 7);
        assert_eq!(encoded[95], 5);
        assert_eq!(&encoded[96..101], b"hello");
        assert!(encoded[101..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_call_prefixes_selector() {
        let data = encode_call("registerOracle", &[]);
        assert_eq!(data, selector("registerOracle()").to_vec());
    }

    #[test]
    fn test_decode_event_with_indexed_and_data_args() {
        let event = CallSignature::event(
            "Registered",
            vec![
                Param::indexed("who", "address"),
                Param::new("fee", "uint256"),
                Param::new("label", "string"),
            ],
        );
        let who = Address::new([0xab; 20]);
        let mut topic = [0u8; WORD];
        topic[12..].copy_from_slice(who.as_bytes());
        let data = encode(&[CallArg::Uint(U256::from(9)), CallArg::Str("ok".into())]);

        let args = decode_event(&event, &[Hash::new(topic)], &data).unwrap();
        assert_eq!(
            args,
            vec![
                CallArg::Address(who),
                CallArg::Uint(U256::from(9)),
                CallArg::Str("ok".into())
            ]
        );
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let event = CallSignature::event("E", vec![Param::new("v", "uint256")]);
        let err = decode_event(&event, &[], &[0u8; 4]).unwrap_err();
        assert!(matches!(err, AbiError::Truncated { .. }));
    }

    fn string_event() -> CallSignature {
        CallSignature::event("E", vec![Param::new("s", "string")])
    }

    #[test]
    fn test_decode_rejects_offset_past_address_space() {
        let mut data = [0u8; WORD];
        data[24..].copy_from_slice(&[0xff; 8]);

        let err = decode_event(&string_event(), &[], &data).unwrap_err();
        assert!(matches!(err, AbiError::Truncated { .. }));
    }

    #[test]
    fn test_decode_rejects_offset_wider_than_usize() {
        let mut data = [0u8; WORD];
        data[16] = 0x01;

        let err = decode_event(&string_event(), &[], &data).unwrap_err();
        assert!(matches!(err, AbiError::Truncated { .. }));
    }

    #[test]
    fn test_decode_rejects_oversized_string_length() {
        // offset 0x20, then a length word of 2^64 - 1
        let mut data = [0u8; 2 * WORD];
        data[31] = 0x20;
        data[56..].copy_from_slice(&[0xff; 8]);

        let err = decode_event(&string_event(), &[], &data).unwrap_err();
        assert!(matches!(err, AbiError::Truncated { .. }));
    }
}
