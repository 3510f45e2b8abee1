//! Payload types crossing the extension boundary.
//!
//! Field names serialize to the camelCase names the Demon extension expects
//! on the wire (`toPublic`, `fromPublic`).

use serde::{Deserialize, Serialize};

/// A single item to be encrypted for a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptInput {
    /// Plaintext to encrypt.
    pub cleartext: String,
    /// Base58 public key of the recipient.
    pub to_public: String,
}

/// An encrypted item returned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptOutput {
    /// Encrypted payload.
    pub ciphertext: String,
    /// Nonce used for this item.
    pub nonce: String,
    /// Base58 public key of the sender (the connected account).
    pub from_public: String,
}

/// A single item to be decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptInput {
    /// Encrypted payload.
    pub ciphertext: String,
    /// Base58 public key of the sender.
    pub from_public: String,
    /// Nonce the item was encrypted with.
    pub nonce: String,
}
