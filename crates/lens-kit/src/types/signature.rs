//! Recoverable secp256k1 signatures in EVM wire format.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseSignatureError;

/// A 65-byte `r || s || v` signature, with `v` in `{27, 28}`.
///
/// This is the format the API's `broadcast` mutation and the protocol's
/// `*WithSig` contract calls expect. Displays as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvmSignature([u8; 65]);

/// The `{v, r, s}` components of an [`EvmSignature`].
///
/// Contract calls that take an `EIP712Signature` struct need the signature
/// split this way instead of the packed 65-byte form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitSignature {
    pub v: u8,
    #[serde(serialize_with = "serialize_word")]
    pub r: [u8; 32],
    #[serde(serialize_with = "serialize_word")]
    pub s: [u8; 32],
}

fn serialize_word<S: Serializer>(word: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("0x{}", hex::encode(word)))
}

impl EvmSignature {
    /// Assemble a signature from its parts. `recovery_id` is 0 or 1.
    pub fn from_parts(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Self {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&r);
        bytes[32..64].copy_from_slice(&s);
        bytes[64] = 27 + recovery_id;
        Self(bytes)
    }

    /// Get the raw 65 bytes.
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// The `v` byte (27 or 28).
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// The recovery id (0 or 1).
    pub fn recovery_id(&self) -> u8 {
        self.0[64] - 27
    }

    /// Split into `{v, r, s}`.
    pub fn split(&self) -> SplitSignature {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&self.0[..32]);
        s.copy_from_slice(&self.0[32..64]);
        SplitSignature { v: self.v(), r, s }
    }
}

impl FromStr for EvmSignature {
    type Err = ParseSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| ParseSignatureError::InvalidHex(e.to_string()))?;
        let mut bytes: [u8; 65] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseSignatureError::InvalidLength(bytes.len()))?;

        // Some wallets emit v as 0/1 rather than 27/28
        match bytes[64] {
            0 | 1 => bytes[64] += 27,
            27 | 28 => {}
            other => return Err(ParseSignatureError::InvalidRecoveryId(other)),
        }

        Ok(Self(bytes))
    }
}

impl Display for EvmSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for EvmSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvmSignature({})", self)
    }
}

impl Serialize for EvmSignature {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EvmSignature {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
