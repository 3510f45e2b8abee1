use solana_sdk::pubkey::ParsePubkeyError;

use crate::provider::ProviderError;

/// Errors surfaced by the adapter.
///
/// Every failure is reported on both channels: emitted as a
/// [`WalletAdapterEvent::Error`](crate::WalletAdapterEvent::Error)
/// and returned to the caller, which is why this type is `Clone`. The wallet
/// extension's original message is preserved as the `source`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletAdapterError {
    /// The capability has not been detected; `connect` requires
    /// [`ReadyState::Installed`](crate::ReadyState::Installed).
    #[error("wallet not ready")]
    NotReady,
    /// An operation that requires a session was invoked before `connect`.
    /// Caller misuse, not a wallet malfunction: no `Error` event is emitted
    /// and the capability is never contacted.
    #[error("wallet not connected")]
    NotConnected,
    /// The extension's connect call failed (e.g. the user rejected it).
    #[error("account access failed: {0}")]
    Account(#[source] ProviderError),
    /// The extension handed back a malformed account identifier.
    #[error("invalid public key: {0}")]
    PublicKey(#[source] ParsePubkeyError),
    /// Transaction signing or sending failed in the extension.
    #[error("failed to sign transaction: {0}")]
    SignTransaction(#[source] ProviderError),
    /// Message signing failed in the extension.
    #[error("failed to sign message: {0}")]
    SignMessage(#[source] ProviderError),
    /// An encrypt/decrypt request failed in the extension.
    #[error("wallet request failed: {0}")]
    Wallet(#[source] ProviderError),
    /// The extension dropped the connection on its own.
    #[error("wallet disconnected")]
    Disconnected,
}
