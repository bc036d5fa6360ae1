//! EIP-712 typed structured data.
//!
//! The API hands back a `{domain, types, value}` triple for every signed
//! write. This module models that triple and computes the digest a wallet
//! signs over:
//!
//! ```text
//! keccak256(0x19 0x01 ‖ domainSeparator ‖ hashStruct(primaryType, value))
//! ```
//!
//! @see <https://eips.ethereum.org/EIPS/eip-712>

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha3::{Digest, Keccak256};

use super::Address;
use crate::error::TypedDataError;

/// Name of the implicit domain struct type.
pub const EIP712_DOMAIN: &str = "EIP712Domain";

/// Keccak-256 hash.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

// ============================================================================
// Types
// ============================================================================

/// One member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Struct type definitions keyed by type name.
pub type Types = BTreeMap<String, Vec<TypedDataField>>;

/// The EIP-712 domain.
///
/// Only present fields take part in the domain separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_chain_id"
    )]
    pub chain_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

/// A complete typed-data payload as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedData {
    pub domain: TypedDataDomain,
    #[serde(deserialize_with = "deserialize_types")]
    pub types: Types,
    pub value: Value,
}

impl TypedData {
    /// The struct type being signed.
    pub fn primary_type(&self) -> Result<String, TypedDataError> {
        primary_type(&self.types)
    }

    /// The digest a wallet signs for this payload.
    pub fn signing_hash(&self) -> Result<[u8; 32], TypedDataError> {
        signing_hash(&self.domain, &self.types, &self.value)
    }
}

/// Chain ids arrive as JSON numbers or as decimal/hex strings.
fn deserialize_chain_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let raw: Option<Value> = Option::deserialize(d)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid chainId: {}", n))),
        Some(Value::String(s)) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => s.parse(),
            };
            parsed
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid chainId: {}", s)))
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid chainId: {}",
            other
        ))),
    }
}

/// GraphQL responses may carry `__typename` next to the struct definitions.
fn deserialize_types<'de, D: Deserializer<'de>>(d: D) -> Result<Types, D::Error> {
    let raw: BTreeMap<String, Value> = BTreeMap::deserialize(d)?;
    raw.into_iter()
        .filter(|(name, _)| !name.starts_with("__"))
        .map(|(name, fields)| {
            let fields: Vec<TypedDataField> =
                serde_json::from_value(fields).map_err(serde::de::Error::custom)?;
            Ok((name, fields))
        })
        .collect()
}

// ============================================================================
// Type encoding
// ============================================================================

/// Strip array suffixes: `Person[][3]` → `Person`.
fn base_type(ty: &str) -> &str {
    match ty.find('[') {
        Some(idx) => &ty[..idx],
        None => ty,
    }
}

/// Find the single struct type no other type references.
pub fn primary_type(types: &Types) -> Result<String, TypedDataError> {
    let referenced: BTreeSet<&str> = types
        .values()
        .flatten()
        .map(|field| base_type(&field.ty))
        .collect();

    let candidates: Vec<&String> = types
        .keys()
        .filter(|name| name.as_str() != EIP712_DOMAIN && !referenced.contains(name.as_str()))
        .collect();

    match candidates.as_slice() {
        [single] => Ok((*single).clone()),
        [] => Err(TypedDataError::PrimaryType("no root struct type".to_string())),
        many => Err(TypedDataError::PrimaryType(format!(
            "multiple root struct types: {}",
            many.iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

fn collect_dependencies<'a>(
    ty: &'a str,
    types: &'a Types,
    found: &mut BTreeSet<&'a str>,
) -> Result<(), TypedDataError> {
    let fields = types
        .get(ty)
        .ok_or_else(|| TypedDataError::UnknownType(ty.to_string()))?;
    for field in fields {
        let dep = base_type(&field.ty);
        if types.contains_key(dep) && found.insert(dep) {
            collect_dependencies(dep, types, found)?;
        }
    }
    Ok(())
}

/// `encodeType`: the primary struct first, then its dependencies sorted by name.
pub fn encode_type(primary: &str, types: &Types) -> Result<String, TypedDataError> {
    let mut deps = BTreeSet::new();
    collect_dependencies(primary, types, &mut deps)?;
    deps.remove(primary);

    let mut out = String::new();
    for name in std::iter::once(primary).chain(deps) {
        let fields = types
            .get(name)
            .ok_or_else(|| TypedDataError::UnknownType(name.to_string()))?;
        out.push_str(name);
        out.push('(');
        let members: Vec<String> = fields
            .iter()
            .map(|f| format!("{} {}", f.ty, f.name))
            .collect();
        out.push_str(&members.join(","));
        out.push(')');
    }
    Ok(out)
}

/// `typeHash = keccak256(encodeType(type))`.
pub fn type_hash(primary: &str, types: &Types) -> Result<[u8; 32], TypedDataError> {
    Ok(keccak256(encode_type(primary, types)?))
}

// ============================================================================
// Data encoding
// ============================================================================

/// `hashStruct(s) = keccak256(typeHash ‖ encodeData(s))`.
pub fn hash_struct(primary: &str, value: &Value, types: &Types) -> Result<[u8; 32], TypedDataError> {
    Ok(keccak256(encode_data(primary, value, types)?))
}

/// `typeHash ‖ enc(member₁) ‖ … ‖ enc(memberₙ)`.
pub fn encode_data(primary: &str, value: &Value, types: &Types) -> Result<Vec<u8>, TypedDataError> {
    let fields = types
        .get(primary)
        .ok_or_else(|| TypedDataError::UnknownType(primary.to_string()))?;

    let mut out = Vec::with_capacity(32 * (fields.len() + 1));
    out.extend_from_slice(&type_hash(primary, types)?);

    for field in fields {
        let member = value
            .get(&field.name)
            .ok_or_else(|| TypedDataError::MissingField {
                struct_name: primary.to_string(),
                field: field.name.clone(),
            })?;
        out.extend_from_slice(&encode_value(&field.name, &field.ty, member, types)?);
    }
    Ok(out)
}

fn invalid(field: &str, ty: &str, reason: impl Into<String>) -> TypedDataError {
    TypedDataError::InvalidValue {
        field: field.to_string(),
        ty: ty.to_string(),
        reason: reason.into(),
    }
}

fn encode_value(
    field: &str,
    ty: &str,
    value: &Value,
    types: &Types,
) -> Result<[u8; 32], TypedDataError> {
    if let Some(open) = ty.rfind('[') {
        let inner = &ty[..open];
        let len_spec = ty[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| TypedDataError::UnknownType(ty.to_string()))?;
        let items = value
            .as_array()
            .ok_or_else(|| invalid(field, ty, "expected an array"))?;
        if !len_spec.is_empty() {
            let expected: usize = len_spec
                .parse()
                .map_err(|_| TypedDataError::UnknownType(ty.to_string()))?;
            if items.len() != expected {
                return Err(invalid(
                    field,
                    ty,
                    format!("expected {} elements, got {}", expected, items.len()),
                ));
            }
        }
        let mut concat = Vec::with_capacity(32 * items.len());
        for item in items {
            concat.extend_from_slice(&encode_value(field, inner, item, types)?);
        }
        return Ok(keccak256(concat));
    }

    if types.contains_key(ty) {
        return hash_struct(ty, value, types);
    }

    match ty {
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| invalid(field, ty, "expected a string"))?;
            Ok(keccak256(s.as_bytes()))
        }
        "bytes" => Ok(keccak256(decode_hex_value(field, ty, value)?)),
        "bool" => {
            let b = match value {
                Value::Bool(b) => *b,
                Value::String(s) if s == "true" => true,
                Value::String(s) if s == "false" => false,
                _ => return Err(invalid(field, ty, "expected a boolean")),
            };
            let mut word = [0u8; 32];
            word[31] = b as u8;
            Ok(word)
        }
        "address" => {
            let s = value
                .as_str()
                .ok_or_else(|| invalid(field, ty, "expected an address string"))?;
            let addr: Address = s.parse().map_err(|e| invalid(field, ty, format!("{}", e)))?;
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr.as_bytes());
            Ok(word)
        }
        _ => {
            if let Some(size) = ty.strip_prefix("bytes") {
                let size = parse_size(ty, size, 1, 32, 1)?;
                let bytes = decode_hex_value(field, ty, value)?;
                if bytes.len() > size {
                    return Err(invalid(
                        field,
                        ty,
                        format!("expected at most {} bytes, got {}", size, bytes.len()),
                    ));
                }
                let mut word = [0u8; 32];
                word[..bytes.len()].copy_from_slice(&bytes);
                Ok(word)
            } else if let Some(bits) = ty.strip_prefix("uint") {
                let bits = parse_size(ty, bits, 8, 256, 8)?;
                encode_integer(field, ty, value, bits, false)
            } else if let Some(bits) = ty.strip_prefix("int") {
                let bits = parse_size(ty, bits, 8, 256, 8)?;
                encode_integer(field, ty, value, bits, true)
            } else {
                Err(TypedDataError::UnknownType(ty.to_string()))
            }
        }
    }
}

/// Parse the numeric suffix of `bytesN` / `uintN` / `intN`.
fn parse_size(
    ty: &str,
    raw: &str,
    min: usize,
    max: usize,
    step: usize,
) -> Result<usize, TypedDataError> {
    // bare `uint` / `int` alias the 256-bit width
    if raw.is_empty() && !ty.starts_with("bytes") {
        return Ok(256);
    }
    let n: usize = raw
        .parse()
        .map_err(|_| TypedDataError::UnknownType(ty.to_string()))?;
    if n < min || n > max || n % step != 0 {
        return Err(TypedDataError::UnknownType(ty.to_string()));
    }
    Ok(n)
}

fn decode_hex_value(field: &str, ty: &str, value: &Value) -> Result<Vec<u8>, TypedDataError> {
    let s = value
        .as_str()
        .ok_or_else(|| invalid(field, ty, "expected a hex string"))?;
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    if stripped.len() % 2 == 1 {
        return hex::decode(format!("0{}", stripped)).map_err(|e| invalid(field, ty, e.to_string()));
    }
    hex::decode(stripped).map_err(|e| invalid(field, ty, e.to_string()))
}

// ============================================================================
// Integer encoding
// ============================================================================

fn encode_integer(
    field: &str,
    ty: &str,
    value: &Value,
    bits: usize,
    signed: bool,
) -> Result<[u8; 32], TypedDataError> {
    let (negative, magnitude) = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                (false, word_from_u128(u as u128))
            } else if let Some(i) = n.as_i64() {
                (i < 0, word_from_u128(i.unsigned_abs() as u128))
            } else {
                return Err(invalid(field, ty, "expected an integer"));
            }
        }
        Value::String(s) => parse_integer_string(s).map_err(|reason| invalid(field, ty, reason))?,
        _ => return Err(invalid(field, ty, "expected a number or numeric string")),
    };

    if negative && !signed {
        return Err(invalid(field, ty, "negative value for unsigned type"));
    }

    let len = bit_len(&magnitude);
    let fits = if !signed {
        len <= bits
    } else if !negative {
        len < bits
    } else {
        // -2^(bits-1) is the one value whose magnitude needs `bits` bits
        len < bits || (len == bits && is_power_of_two(&magnitude))
    };
    if !fits {
        return Err(invalid(field, ty, "value out of range"));
    }

    if negative && !is_zero(&magnitude) {
        Ok(twos_complement(magnitude))
    } else {
        Ok(magnitude)
    }
}

fn word_from_u128(v: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&v.to_be_bytes());
    word
}

fn parse_integer_string(s: &str) -> Result<(bool, [u8; 32]), String> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    if let Some(hex_digits) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let padded = if hex_digits.len() % 2 == 1 {
            format!("0{}", hex_digits)
        } else {
            hex_digits.to_string()
        };
        let bytes = hex::decode(&padded).map_err(|e| e.to_string())?;
        let bytes: Vec<u8> = bytes.into_iter().skip_while(|b| *b == 0).collect();
        if bytes.len() > 32 {
            return Err("value exceeds 256 bits".to_string());
        }
        let mut word = [0u8; 32];
        word[32 - bytes.len()..].copy_from_slice(&bytes);
        return Ok((negative, word));
    }

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not an integer", s));
    }

    let mut word = [0u8; 32];
    for digit in digits.bytes() {
        // word = word * 10 + digit
        let mut carry = (digit - b'0') as u32;
        for byte in word.iter_mut().rev() {
            let acc = (*byte as u32) * 10 + carry;
            *byte = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return Err("value exceeds 256 bits".to_string());
        }
    }
    Ok((negative, word))
}

fn bit_len(word: &[u8; 32]) -> usize {
    for (i, byte) in word.iter().enumerate() {
        if *byte != 0 {
            return (32 - i) * 8 - byte.leading_zeros() as usize;
        }
    }
    0
}

fn is_zero(word: &[u8; 32]) -> bool {
    word.iter().all(|b| *b == 0)
}

fn is_power_of_two(word: &[u8; 32]) -> bool {
    word.iter().map(|b| b.count_ones()).sum::<u32>() == 1
}

fn twos_complement(mut word: [u8; 32]) -> [u8; 32] {
    for byte in word.iter_mut() {
        *byte = !*byte;
    }
    for byte in word.iter_mut().rev() {
        let (sum, overflow) = byte.overflowing_add(1);
        *byte = sum;
        if !overflow {
            break;
        }
    }
    word
}

// ============================================================================
// Domain + final digest
// ============================================================================

impl TypedDataDomain {
    /// The `EIP712Domain` member list for the fields present, in canonical order.
    pub fn fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::with_capacity(5);
        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }
        fields
    }

    /// `hashStruct(eip712Domain)`.
    pub fn separator(&self) -> Result<[u8; 32], TypedDataError> {
        let mut types = Types::new();
        types.insert(EIP712_DOMAIN.to_string(), self.fields());
        let value = serde_json::to_value(self)
            .map_err(|e| TypedDataError::PrimaryType(format!("domain: {}", e)))?;
        hash_struct(EIP712_DOMAIN, &value, &types)
    }
}

/// The final EIP-712 digest for `(domain, types, value)`.
///
/// `types` may or may not include `EIP712Domain`; the domain type is always
/// derived from the fields present in `domain`.
pub fn signing_hash(
    domain: &TypedDataDomain,
    types: &Types,
    value: &Value,
) -> Result<[u8; 32], TypedDataError> {
    let mut message_types = types.clone();
    message_types.remove(EIP712_DOMAIN);

    let primary = primary_type(&message_types)?;
    let message_hash = hash_struct(&primary, value, &message_types)?;
    let domain_separator = domain.separator()?;

    let mut buf = Vec::with_capacity(66);
    buf.extend_from_slice(&[0x19, 0x01]);
    buf.extend_from_slice(&domain_separator);
    buf.extend_from_slice(&message_hash);
    Ok(keccak256(buf))
}
