//! Ethereum wallet signature handling
//!
//! Recovers signer addresses from `personal_sign` (EIP-191) signatures over
//! secp256k1.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Prefix wallets prepend before hashing a personal message
const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Errors that can occur while handling wallet signatures
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Public key recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Digest a wallet signs for `personal_sign`:
/// `keccak256("\x19Ethereum Signed Message:\n" ++ len(message) ++ message)`
///
/// The length is the UTF-8 byte length of the message.
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let prefixed = format!("{}{}{}", PERSONAL_MESSAGE_PREFIX, message.len(), message);
    keccak256(prefixed.as_bytes())
}

/// Recover the address that produced `signature_hex` over `message`
///
/// # Arguments
/// * `message` - The exact text the wallet signed
/// * `signature_hex` - 65-byte `r || s || v` signature, hex with or without `0x`
///
/// # Returns
/// * `Ok(address)` as lowercase `0x`-prefixed hex
/// * `Err(CryptoError)` if the signature is malformed or recovery fails
pub fn recover_address(message: &str, signature_hex: &str) -> Result<String, CryptoError> {
    let sig_bytes = hex::decode(strip_hex_prefix(signature_hex.trim()))
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    if sig_bytes.len() != 65 {
        return Err(CryptoError::InvalidSignatureFormat(format!(
            "Expected 65 bytes, got {}",
            sig_bytes.len()
        )));
    }

    let (rs, v) = sig_bytes.split_at(64);

    // Wallets emit v as 27/28; recovery wants 0/1
    let v = v[0] % 27;
    let mut recovery_id = RecoveryId::from_byte(v).ok_or(CryptoError::InvalidRecoveryId(v))?;

    let mut signature = Signature::from_slice(rs)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    // Wallets may hand out high-S signatures; recover from the low-S twin,
    // whose R point has the opposite y parity
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let digest = personal_message_hash(message);
    let verifying_key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    Ok(format!("0x{}", hex::encode(public_key_to_address(&verifying_key))))
}

/// Derive the 20-byte account address of a public key
pub fn public_key_to_address(key: &VerifyingKey) -> [u8; 20] {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed tag
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Parse a `0x`-prefixed, 40 hex digit account address in any letter case
pub fn parse_address(address: &str) -> Result<[u8; 20], CryptoError> {
    let digits = address
        .strip_prefix("0x")
        .filter(|d| d.len() == 40)
        .ok_or_else(|| CryptoError::InvalidAddressFormat(address.to_string()))?;

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes)
        .map_err(|_| CryptoError::InvalidAddressFormat(address.to_string()))?;
    Ok(bytes)
}

/// Sign `message` the way a wallet's `personal_sign` does.
///
/// Returns `0x`-prefixed hex of `r || s || v` with `v` in {27, 28}.
pub fn personal_sign(key: &SigningKey, message: &str) -> Result<String, CryptoError> {
    let digest = personal_message_hash(message);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let mut bytes = Vec::with_capacity(65);
    bytes.extend_from_slice(&signature.to_bytes());
    bytes.push(recovery_id.to_byte() + 27);

    Ok(format!("0x{}", hex::encode(bytes)))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
