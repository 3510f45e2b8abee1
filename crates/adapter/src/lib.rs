//! # Demon Wallet Adapter
//!
//! Exposes the Demon browser-extension wallet through a standardized
//! [`WalletAdapter`] interface, interchangeable with adapters for other
//! wallet extensions.
//!
//! ## Architecture
//!
//! The adapter is a stateful façade over an injected capability it does not
//! own:
//! 1. A [`ProviderSource`] is polled until the extension injects the wallet
//!    object ([`ReadyState`] goes `NotDetected -> Installed`, once).
//! 2. `connect`/`disconnect` manage the session: the wallet handle and the
//!    connected account's [`Pubkey`](solana_sdk::pubkey::Pubkey), stored and
//!    cleared together.
//! 3. Signing, sending, and encrypt/decrypt requests are forwarded to the
//!    extension with the connected identity attached; all cryptography
//!    happens extension-side.
//! 4. Lifecycle and error events go out on a broadcast channel, and pushed
//!    extension events (account change, external disconnect) are folded back
//!    into adapter state.
//!
//! Failures are dual-reported: every error is emitted as a
//! [`WalletAdapterEvent::Error`] and returned to the caller.

mod adapter;
mod demon;
mod error;
mod provider;
mod types;

pub use adapter::{
    DemonWalletAdapterConfig, ReadyState, Result, WalletAdapter, WalletAdapterEvent,
};
pub use demon::{DEMON_WALLET_NAME, DemonWalletAdapter};
pub use error::WalletAdapterError;
pub use provider::{DemonWallet, ProviderError, ProviderEvent, ProviderSource};
pub use types::{DecryptInput, EncryptInput, EncryptOutput};
