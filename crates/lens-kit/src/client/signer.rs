//! Wallet trait and implementations.
//!
//! A [`TypedDataSigner`] knows which address it signs for and produces
//! Ethereum-style recoverable signatures over EIP-712 typed data and
//! EIP-191 personal messages.
//!
//! # Implementations
//!
//! - [`LocalWallet`] - secp256k1 key held in memory
//! - [`EnvWallet`] - Key loaded from an environment variable
//!
//! Browser wallets, hardware devices or remote signers plug in by
//! implementing the trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use lens_kit::{Lens, LocalWallet, CreatePublicPostRequest};
//!
//! # async fn example() -> Result<(), lens_kit::Error> {
//! let wallet = LocalWallet::new(
//!     "0xc85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
//! )?;
//!
//! let lens = Lens::mainnet()
//!     .signer(wallet)
//!     .build();
//!
//! let request = CreatePublicPostRequest::new("0x01", "ipfs://Qm...");
//! let signed = lens.sign_create_post_typed_data(request).await?;
//! println!("signature: {}", signed.signature);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde_json::Value;

use crate::error::{Error, SignerError};
use crate::types::typed_data::signing_hash;
use crate::types::{Address, EvmSignature, TypedDataDomain, Types, keccak256};

/// Boxed future returned by signing operations.
pub type SignFuture<'a> = Pin<Box<dyn Future<Output = Result<EvmSignature, SignerError>> + Send + 'a>>;

// ============================================================================
// TypedDataSigner Trait
// ============================================================================

/// Trait for wallets that sign typed data.
///
/// Signing is asynchronous so that wallets needing user confirmation or a
/// network round-trip fit behind the same interface as in-memory keys.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use lens_kit::{Address, SignFuture, TypedDataDomain, TypedDataSigner, Types};
///
/// struct RemoteWallet {
///     address: Address,
///     endpoint: String,
/// }
///
/// impl TypedDataSigner for RemoteWallet {
///     fn address(&self) -> Address {
///         self.address
///     }
///
///     fn sign_typed_data<'a>(
///         &'a self,
///         domain: &'a TypedDataDomain,
///         types: &'a Types,
///         value: &'a serde_json::Value,
///     ) -> SignFuture<'a> {
///         Box::pin(async move { todo!("POST to self.endpoint") })
///     }
///
///     fn sign_message<'a>(&'a self, message: &'a [u8]) -> SignFuture<'a> {
///         Box::pin(async move { todo!() })
///     }
/// }
/// ```
pub trait TypedDataSigner: Send + Sync {
    /// The address this wallet signs for.
    fn address(&self) -> Address;

    /// Sign `(domain, types, value)` per EIP-712.
    ///
    /// `types` may include `__typename` artifacts already stripped by
    /// [`TypedData`](crate::TypedData) deserialization; `EIP712Domain` is
    /// ignored if present.
    fn sign_typed_data<'a>(
        &'a self,
        domain: &'a TypedDataDomain,
        types: &'a Types,
        value: &'a Value,
    ) -> SignFuture<'a>;

    /// Sign a personal message per EIP-191.
    fn sign_message<'a>(&'a self, message: &'a [u8]) -> SignFuture<'a>;
}

impl TypedDataSigner for Arc<dyn TypedDataSigner> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_typed_data<'a>(
        &'a self,
        domain: &'a TypedDataDomain,
        types: &'a Types,
        value: &'a Value,
    ) -> SignFuture<'a> {
        (**self).sign_typed_data(domain, types, value)
    }

    fn sign_message<'a>(&'a self, message: &'a [u8]) -> SignFuture<'a> {
        (**self).sign_message(message)
    }
}

// ============================================================================
// Hashing helpers
// ============================================================================

/// The EIP-191 digest of a personal message.
pub fn hash_message(message: impl AsRef<[u8]>) -> [u8; 32] {
    let message = message.as_ref();
    let mut buf = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    buf.extend_from_slice(message);
    keccak256(buf)
}

/// Recover the address that produced `signature` over a 32-byte digest.
pub fn recover_address(hash: &[u8; 32], signature: &EvmSignature) -> Result<Address, SignerError> {
    let bytes = signature.as_bytes();
    let sig = Signature::from_slice(&bytes[..64])
        .map_err(|e| SignerError::SigningFailed(format!("malformed signature: {}", e)))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id()).ok_or_else(|| {
        SignerError::SigningFailed(format!("invalid recovery id {}", signature.recovery_id()))
    })?;
    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| SignerError::SigningFailed(format!("recovery failed: {}", e)))?;
    Ok(address_of(&key))
}

/// Recover the signer of an EIP-712 payload.
pub fn recover_typed_data_signer(
    domain: &TypedDataDomain,
    types: &Types,
    value: &Value,
    signature: &EvmSignature,
) -> Result<Address, SignerError> {
    let hash = signing_hash(domain, types, value)?;
    recover_address(&hash, signature)
}

/// Recover the signer of an EIP-191 personal message.
pub fn recover_message_signer(
    message: impl AsRef<[u8]>,
    signature: &EvmSignature,
) -> Result<Address, SignerError> {
    recover_address(&hash_message(message), signature)
}

fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    Address::from_uncompressed_public_key(point.as_bytes())
}

// ============================================================================
// LocalWallet
// ============================================================================

/// A wallet with a single secp256k1 key stored in memory.
///
/// Suitable for scripts, bots and tests.
///
/// # Example
///
/// ```rust
/// use lens_kit::LocalWallet;
///
/// let wallet = LocalWallet::new(
///     "0xc85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
/// ).unwrap();
/// assert_eq!(
///     wallet.address().to_checksum(),
///     "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
/// );
/// ```
#[derive(Clone)]
pub struct LocalWallet {
    key: SigningKey,
    address: Address,
}

impl LocalWallet {
    /// Create a wallet from a hex private key, with or without `0x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key isn't 32 bytes of hex or is out of range.
    pub fn new(private_key: impl AsRef<str>) -> Result<Self, Error> {
        let raw = private_key.as_ref().trim();
        let hex_digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        let bytes = hex::decode(hex_digits)
            .map_err(|e| SignerError::InvalidKey(format!("not hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(SignerError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            ))
            .into());
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self::from_signing_key(key))
    }

    /// Create a wallet from a k256 signing key.
    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    /// Generate a fresh random wallet.
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// The address this wallet signs for.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest directly.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<EvmSignature, SignerError> {
        let (sig, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash)
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(EvmSignature::from_parts(r, s, recovery_id.to_byte()))
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address.to_checksum())
            .finish()
    }
}

impl TypedDataSigner for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_typed_data<'a>(
        &'a self,
        domain: &'a TypedDataDomain,
        types: &'a Types,
        value: &'a Value,
    ) -> SignFuture<'a> {
        let result = signing_hash(domain, types, value)
            .map_err(SignerError::from)
            .and_then(|hash| self.sign_hash(&hash));
        Box::pin(async move { result })
    }

    fn sign_message<'a>(&'a self, message: &'a [u8]) -> SignFuture<'a> {
        let result = self.sign_hash(&hash_message(message));
        Box::pin(async move { result })
    }
}

// ============================================================================
// EnvWallet
// ============================================================================

/// A wallet that loads its key from an environment variable.
///
/// By default, reads `LENS_PRIVATE_KEY`.
///
/// # Example
///
/// ```rust,no_run
/// use lens_kit::EnvWallet;
///
/// // With LENS_PRIVATE_KEY set:
/// let wallet = EnvWallet::new().unwrap();
/// ```
#[derive(Clone)]
pub struct EnvWallet {
    inner: LocalWallet,
}

impl EnvWallet {
    /// Load from the `LENS_PRIVATE_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is not set or is not a valid key.
    pub fn new() -> Result<Self, Error> {
        Self::from_env_var("LENS_PRIVATE_KEY")
    }

    /// Load from a custom environment variable.
    pub fn from_env_var(key_var: &str) -> Result<Self, Error> {
        let private_key = std::env::var(key_var)
            .map_err(|_| Error::Config(format!("Environment variable {} not set", key_var)))?;
        let inner = LocalWallet::new(&private_key)?;
        Ok(Self { inner })
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }
}

impl std::fmt::Debug for EnvWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvWallet")
            .field("address", &self.inner.address.to_checksum())
            .finish()
    }
}

impl TypedDataSigner for EnvWallet {
    fn address(&self) -> Address {
        self.inner.address
    }

    fn sign_typed_data<'a>(
        &'a self,
        domain: &'a TypedDataDomain,
        types: &'a Types,
        value: &'a Value,
    ) -> SignFuture<'a> {
        self.inner.sign_typed_data(domain, types, value)
    }

    fn sign_message<'a>(&'a self, message: &'a [u8]) -> SignFuture<'a> {
        self.inner.sign_message(message)
    }
}

// ============================================================================
// Tests
// ============================================================================
