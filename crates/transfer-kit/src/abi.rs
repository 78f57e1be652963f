use num_bigint::BigUint;
use tiny_keccak::{Hasher, Keccak};

use crate::error::AbiError;

/// Parsed function signature.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ParamType>,
    pub canonical: String,
    pub selector: [u8; 4],
}

/// The ABI types an ERC-20 getter or `approve` call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint(usize),
    String,
}

/// Decoded (or to-be-encoded) ABI values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    Address([u8; 20]),
    Uint(Vec<u8>),
    String(std::string::String),
}

impl ArgumentValue {
    /// Unsigned integer value from a `BigUint`.
    pub fn uint(n: &BigUint) -> Self {
        ArgumentValue::Uint(n.to_bytes_be())
    }

    pub fn as_biguint(&self) -> Option<BigUint> {
        match self {
            ArgumentValue::Uint(b) => Some(BigUint::from_bytes_be(b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ArgumentValue::Address(_) => "address",
            ArgumentValue::Uint(_) => "uint",
            ArgumentValue::String(_) => "string",
        }
    }
}

/// Parse a function signature string into a `FunctionSignature`.
///
/// Example: `"approve(address,uint256)"` → name="approve", params=[Address, Uint(256)]
pub fn parse_signature(sig: &str) -> Result<FunctionSignature, AbiError> {
    let sig = sig.trim();
    let open = sig
        .find('(')
        .ok_or_else(|| AbiError::InvalidSignature(format!("missing '(' in: {sig}")))?;

    if !sig.ends_with(')') {
        return Err(AbiError::InvalidSignature(format!("missing ')' in: {sig}")));
    }

    let name = sig[..open].to_string();
    if name.is_empty() {
        return Err(AbiError::InvalidSignature(
            "empty function name".to_string(),
        ));
    }

    let params_str = &sig[open + 1..sig.len() - 1];
    let params = if params_str.is_empty() {
        vec![]
    } else {
        params_str
            .split(',')
            .map(parse_param_type)
            .collect::<Result<Vec<_>, _>>()?
    };

    let canonical = format!("{}({})", name, canonical_params(&params));
    let selector = selector_from_signature(&canonical);

    Ok(FunctionSignature {
        name,
        params,
        canonical,
        selector,
    })
}

fn parse_param_type(s: &str) -> Result<ParamType, AbiError> {
    match s.trim() {
        "address" => Ok(ParamType::Address),
        "string" => Ok(ParamType::String),
        s if s.starts_with("uint") => Ok(ParamType::Uint(parse_width(s)?)),
        s => Err(AbiError::UnsupportedType(s.to_string())),
    }
}

/// Bit width of a `uintN` type; bare `uint` is `uint256`.
fn parse_width(s: &str) -> Result<usize, AbiError> {
    let digits = &s["uint".len()..];
    if digits.is_empty() {
        return Ok(256);
    }
    match digits.parse::<usize>() {
        Ok(bits) if bits > 0 && bits <= 256 && bits % 8 == 0 => Ok(bits),
        _ => Err(AbiError::InvalidSignature(format!("invalid integer width: {s}"))),
    }
}

fn canonical_params(params: &[ParamType]) -> String {
    params
        .iter()
        .map(|p| canonical_param(*p))
        .collect::<Vec<_>>()
        .join(",")
}

fn canonical_param(p: ParamType) -> String {
    match p {
        ParamType::Address => "address".to_string(),
        ParamType::Uint(bits) => format!("uint{bits}"),
        ParamType::String => "string".to_string(),
    }
}

/// Compute the 4-byte selector from a canonical function signature.
pub fn selector_from_signature(canonical: &str) -> [u8; 4] {
    let mut hasher = Keccak::v256();
    hasher.update(canonical.as_bytes());
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Parse a `0x`-prefixed (or bare) 20-byte hex address. Case is ignored.
pub fn parse_address(address: &str) -> Result<[u8; 20], AbiError> {
    let stripped = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    let bytes =
        hex::decode(stripped).map_err(|e| AbiError::InvalidAddress(format!("{address}: {e}")))?;
    <[u8; 20]>::try_from(bytes.as_slice()).map_err(|_| {
        AbiError::InvalidAddress(format!("{address}: expected 20 bytes, got {}", bytes.len()))
    })
}

/// Encode a call: selector followed by the ABI-encoded arguments.
pub fn encode_call(sig: &FunctionSignature, args: &[ArgumentValue]) -> Result<Vec<u8>, AbiError> {
    if args.len() != sig.params.len() {
        return Err(AbiError::InvalidEncoding(format!(
            "{} expects {} arguments, got {}",
            sig.canonical,
            sig.params.len(),
            args.len()
        )));
    }
    let mut out = sig.selector.to_vec();
    out.extend(encode_values(&sig.params, args)?);
    Ok(out)
}

/// ABI-encode a flat list of values: one head word per value, with string
/// bodies appended after the heads.
pub fn encode_values(types: &[ParamType], values: &[ArgumentValue]) -> Result<Vec<u8>, AbiError> {
    let head_len = types.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (param, value) in types.iter().zip(values) {
        match (param, value) {
            (ParamType::Address, ArgumentValue::Address(addr)) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr);
                head.extend_from_slice(&word);
            }
            (ParamType::Uint(bits), ArgumentValue::Uint(bytes)) => {
                head.extend_from_slice(&uint_word(bytes, *bits)?);
            }
            (ParamType::String, ArgumentValue::String(s)) => {
                head.extend_from_slice(&usize_word(head_len + tail.len()));
                push_dynamic(&mut tail, s.as_bytes());
            }
            (expected, actual) => {
                return Err(AbiError::TypeMismatch {
                    expected: canonical_param(*expected),
                    actual: actual.kind().to_string(),
                });
            }
        }
    }

    head.extend(tail);
    Ok(head)
}

/// Right-align a big-endian integer in a word, rejecting values wider than `bits`.
fn uint_word(bytes: &[u8], bits: usize) -> Result<[u8; 32], AbiError> {
    let significant: &[u8] = match bytes.iter().position(|&b| b != 0) {
        Some(first) => &bytes[first..],
        None => &[],
    };
    let width = BigUint::from_bytes_be(significant).bits();
    if width > bits.min(256) as u64 {
        return Err(AbiError::InvalidEncoding(format!(
            "value needs {width} bits, uint{bits} holds {bits}"
        )));
    }
    let mut word = [0u8; 32];
    word[32 - significant.len()..].copy_from_slice(significant);
    Ok(word)
}

fn usize_word(n: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn push_dynamic(tail: &mut Vec<u8>, bytes: &[u8]) {
    tail.extend_from_slice(&usize_word(bytes.len()));
    tail.extend_from_slice(bytes);
    let padding = (32 - bytes.len() % 32) % 32;
    tail.extend(std::iter::repeat_n(0u8, padding));
}

/// Split calldata into its selector and decode the arguments.
pub fn decode_calldata(
    sig: &FunctionSignature,
    calldata: &[u8],
) -> Result<Vec<ArgumentValue>, AbiError> {
    ensure_bytes(calldata, 0, 4)?;

    let actual_selector = &calldata[..4];
    if actual_selector != sig.selector {
        return Err(AbiError::InvalidEncoding(format!(
            "selector mismatch: expected {}, got {}",
            hex::encode(sig.selector),
            hex::encode(actual_selector)
        )));
    }

    decode_values(&sig.params, &calldata[4..])
}

/// Decode ABI-encoded values, e.g. the return data of an `eth_call`.
pub fn decode_values(types: &[ParamType], data: &[u8]) -> Result<Vec<ArgumentValue>, AbiError> {
    let mut values = Vec::with_capacity(types.len());
    let mut offset = 0;
    for param in types {
        values.push(decode_value(param, data, offset)?);
        // One head word per value; strings store an offset to their body.
        offset += 32;
    }
    Ok(values)
}

fn decode_value(param: &ParamType, data: &[u8], offset: usize) -> Result<ArgumentValue, AbiError> {
    ensure_bytes(data, offset, 32)?;
    let word = &data[offset..offset + 32];

    match param {
        ParamType::Address => {
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok(ArgumentValue::Address(addr))
        }
        ParamType::Uint(_) => Ok(ArgumentValue::Uint(word.to_vec())),
        ParamType::String => {
            let start = read_u256_as_usize(data, offset)?;
            let len = read_u256_as_usize(data, start)?;
            let body = start + 32;
            ensure_bytes(data, body, len)?;
            let s = std::str::from_utf8(&data[body..body + len])
                .map_err(|e| AbiError::InvalidEncoding(format!("invalid UTF-8: {e}")))?;
            Ok(ArgumentValue::String(s.to_string()))
        }
    }
}

fn read_u256_as_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    ensure_bytes(data, offset, 32)?;
    let word = &data[offset..offset + 32];
    if word[..24].iter().any(|&b| b != 0) {
        return Err(AbiError::InvalidEncoding(
            "offset too large for usize".to_string(),
        ));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..32]);
    usize::try_from(u64::from_be_bytes(bytes))
        .map_err(|_| AbiError::InvalidEncoding("offset too large for usize".to_string()))
}

fn ensure_bytes(data: &[u8], offset: usize, len: usize) -> Result<(), AbiError> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(AbiError::DataTooShort {
            expected: offset.saturating_add(len),
            actual: data.len(),
        }),
    }
}
