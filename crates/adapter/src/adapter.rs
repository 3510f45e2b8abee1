//! The generic wallet-adapter surface consumed by applications.
//!
//! Applications hold an `Arc<dyn WalletAdapter>` and stay agnostic of which
//! extension backs it; [`DemonWalletAdapter`](crate::DemonWalletAdapter) is
//! one implementation.

use std::time::Duration;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, transaction::VersionedTransaction};
use tokio::sync::broadcast;

use crate::{
    error::WalletAdapterError,
    types::{DecryptInput, EncryptInput, EncryptOutput},
};

pub type Result<T, E = WalletAdapterError> = std::result::Result<T, E>;

/// Detection status of the wallet capability.
///
/// Transitions are forward-only: `NotDetected -> Installed` once, on first
/// detection. `Unsupported` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// The runtime has no host environment that could ever inject the
    /// capability.
    Unsupported,
    /// The capability has not been observed so far.
    NotDetected,
    /// The capability is present.
    Installed,
}

/// Events emitted by an adapter to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletAdapterEvent {
    /// Detection completed; carries the new state.
    ReadyStateChange(ReadyState),
    /// A connection now reflects this identity: emitted after a successful
    /// `connect`, and again whenever the extension switches the active
    /// account.
    Connect(Pubkey),
    /// The session ended, by either side.
    Disconnect,
    /// A failure occurred. The same error is also returned to the direct
    /// caller where one exists.
    Error(WalletAdapterError),
}

/// Adapter configuration.
#[derive(Debug, Clone)]
pub struct DemonWalletAdapterConfig {
    /// How often to re-check for the injected capability until it is found.
    pub detection_interval: Duration,
    /// Capacity of the event channel handed to subscribers.
    pub event_capacity: usize,
}

impl Default for DemonWalletAdapterConfig {
    fn default() -> Self {
        Self { detection_interval: Duration::from_secs(1), event_capacity: 64 }
    }
}

/// A connected wallet usable for signing and data operations.
///
/// All async methods suspend for as long as the backing wallet needs (e.g.
/// pending user approval) and report failures on two channels: an
/// [`WalletAdapterEvent::Error`] to subscribers and an `Err` to the caller.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Human-readable wallet name.
    fn name(&self) -> &str;

    /// Wallet homepage.
    fn url(&self) -> &str;

    /// Wallet icon as a data URI.
    fn icon(&self) -> &str;

    /// Current detection status.
    fn ready_state(&self) -> ReadyState;

    /// Public key of the connected account, if any.
    fn public_key(&self) -> Option<Pubkey>;

    /// Whether a connect attempt is in flight.
    fn connecting(&self) -> bool;

    /// Whether a wallet is currently connected.
    fn connected(&self) -> bool;

    /// Subscribe to lifecycle and error events. Dropping the receiver
    /// unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<WalletAdapterEvent>;

    /// Establish a session with the wallet. No-op when already connected or
    /// connecting.
    async fn connect(&self) -> Result<()>;

    /// End the session. Emits [`WalletAdapterEvent::Disconnect`]
    /// unconditionally, even when no session was held.
    async fn disconnect(&self) -> Result<()>;

    /// Sign a single transaction with the connected account.
    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction>;

    /// Sign a batch of transactions. All-or-nothing: one failure fails the
    /// batch.
    async fn sign_all_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>>;

    /// Sign an opaque message with the connected account.
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Sign a transaction and broadcast it through `connection`, with any
    /// additional `signers` the transaction requires.
    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
        connection: &RpcClient,
        signers: &[Keypair],
    ) -> Result<VersionedTransaction>;

    /// Encrypt a batch of items from the connected account.
    async fn encrypt(&self, inputs: Vec<EncryptInput>) -> Result<Vec<EncryptOutput>>;

    /// Decrypt a batch of items addressed to the connected account. `None`
    /// entries are per-item failures reported by the wallet and passed
    /// through as-is.
    async fn decrypt(&self, inputs: Vec<DecryptInput>) -> Result<Vec<Option<String>>>;
}
