//! The capability boundary with the injected Demon wallet.
//!
//! The extension object itself lives outside this crate; everything here is
//! consumed, not implemented. [`DemonWallet`] mirrors the operations the
//! injected object exposes, and [`ProviderSource`] replaces the original
//! module-scoped global lookup so the adapter can be driven without a real
//! host environment.

use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, transaction::VersionedTransaction};
use tokio::sync::broadcast;

use crate::types::{DecryptInput, EncryptInput, EncryptOutput};

/// Returns a handle to the injected wallet capability, or `None` while the
/// extension has not (yet) injected it.
///
/// The host environment owns the capability's lifetime; the adapter only
/// borrows it through this source.
pub type ProviderSource = Arc<dyn Fn() -> Option<Arc<dyn DemonWallet>> + Send + Sync>;

/// An error surfaced by the wallet extension.
///
/// Extension failures arrive as opaque messages (user rejection, locked
/// wallet, malformed request); the adapter wraps them into
/// [`WalletAdapterError`](crate::WalletAdapterError) variants and keeps
/// this value as the source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for ProviderError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ProviderError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// An event pushed by the wallet extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The active account changed in the extension UI. Carries the new raw
    /// base58 account identifier, if the extension supplied one.
    AccountChanged(Option<String>),
    /// The extension dropped the connection on its own.
    Disconnect,
}

/// Operations exposed by the injected Demon wallet object.
///
/// All async methods may suspend for as long as the extension needs, e.g.
/// while waiting for user approval in the extension UI. No deadline is
/// imposed here.
#[async_trait]
pub trait DemonWallet: Send + Sync {
    /// Request a connection, returning the raw base58 identifier of the
    /// account the user approved.
    async fn connect(&self) -> Result<String, ProviderError>;

    /// Tear down the extension-side connection.
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Sign a single transaction with the given account.
    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
        public_key: &Pubkey,
    ) -> Result<VersionedTransaction, ProviderError>;

    /// Sign a batch of transactions with the given account. All-or-nothing:
    /// a failure fails the whole batch.
    async fn sign_all_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
        public_key: &Pubkey,
    ) -> Result<Vec<VersionedTransaction>, ProviderError>;

    /// Sign an opaque message with the given account.
    async fn sign_message(
        &self,
        message: &[u8],
        public_key: &Pubkey,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Sign and broadcast a transaction. Broadcasting happens through
    /// `connection`; `signers` are additional keypairs the transaction
    /// requires beyond the connected account.
    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
        connection: &RpcClient,
        signers: &[Keypair],
        public_key: &Pubkey,
    ) -> Result<VersionedTransaction, ProviderError>;

    /// Encrypt a batch of items from the given account to each item's
    /// recipient.
    async fn encrypt(
        &self,
        inputs: Vec<EncryptInput>,
        public_key: &Pubkey,
    ) -> Result<Vec<EncryptOutput>, ProviderError>;

    /// Decrypt a batch of items addressed to the given account. A `None`
    /// entry signals that one item failed to decrypt; the extension decides
    /// per item and the adapter passes the mixture through untouched.
    async fn decrypt(
        &self,
        inputs: Vec<DecryptInput>,
        public_key: &Pubkey,
    ) -> Result<Vec<Option<String>>, ProviderError>;

    /// Whether the extension considers itself connected.
    fn is_connected(&self) -> bool;

    /// Subscribe to events pushed by the extension. Dropping the receiver
    /// unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
