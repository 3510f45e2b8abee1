//! Adapter implementation for the Demon browser-extension wallet.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, transaction::VersionedTransaction};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::{
    adapter::{
        DemonWalletAdapterConfig, ReadyState, Result, WalletAdapter, WalletAdapterEvent,
    },
    error::WalletAdapterError,
    provider::{DemonWallet, ProviderEvent, ProviderSource},
    types::{DecryptInput, EncryptInput, EncryptOutput},
};

/// Wallet name reported to applications.
pub const DEMON_WALLET_NAME: &str = "Demon";

const DEMON_WALLET_URL: &str = "https://renec.foundation/";

const DEMON_WALLET_ICON: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAADAAAAAwCAYAAABXAvmHAAAACXBIWXMAAAsTAAALEwEAmpwYAAAAAXNSR0IArs4c6QAAAARnQU1BAACxjwv8YQUAAAOCSURBVHgB7ZpNbxJBGMefmQWKLcb1JYrWROrBa/FqtMFbb9rEe2vixcTEHv0I9UYTP0C9eWhSvfUmxmq8Fe8kYrQptRo3lhYouzPOM3RxoQuBWbYwib+EBma34f+f52VnmSXQBdPMmPRUfQEInQYOGTGUghOB5DnwIuXwxoF6zip9KnY8029QCh9nT4HzRfwIw8UCQrLsgC5bVs5qP3jMgDl5K02ZsQYnNts9U2S2M2ftfsx7B6n3gzk5My/Ev4XRE4+kaMTYNJMz897BZgSOZn4TRh9LROKuGwlpoFGsDopPgR4UWcW4iTUhU0gWrD7ikRSN29hggJjJTIoSOfvD7jb9YokoTFEDnAzoJx6R1yjKCL8HusLpNCV65X4rBDKiiEka9CVFQXO0NxABBaKzJsRmz0K/2Pl9qG/8AVaowqAg5y7f4aDA+LOr0ogKaKSytAWsdAhBUU6hg6XvUogKkfQEnH51A8YWLkJQlFLIpTGDE/K9I9IC06MTNBmVwmky1hyLHxmorfwAVQIZ8OIUKk0hJGHIl1+KYO3EnyTlcQRNOCKSqtEMpQuRBIWJ7FTLbLscrv+G8qMC8LLTHDsl6kmV0NoopkwnE6xUl0XsPRfTS+l7IER42ZYvPxNYL960Ue1ooRnAmthf/CLy/UrHSHgNRNIJUCEUA7zMmuJjYmY7pRMXqeSCdaNCSAacpnjP6NFrsIRiALuKVzy2U4wI88w4QkRk/p1TBxUGZgDTBulVPOJdT2HNqDAQA42L2E6f4hu14WJv7IEKgQ14u02v4rGY8Xzvud2WId0IthYq1KD6Yrsv8bEH58Xy4VJL1/Fe1PolkIHa6s9jaYNgf4+23S9gukRvnznWLnH9pLoOQgIZ8BOP9Hqzg9Grrf6CICgb6CS+F3DGg868i5IBnGFMiX4E4MUNbyXtAEtnP5RvKUeF/z+rDBs0UARN4WIzkIq/70Bb+Ffx6zTLg6ZwDq8pjEVXALcy9UNorueoVRR7r5wvg24IzbgBLrsQi0eyXKNiRq2sGsnie2kAo8CpMweapBJqdXftDXewuvetNJa4tkMI3IfRxWIcHlvbH9bdAd9HDQgz1kZt6wnTRs78VuujBkb7iRiJ+IXrL4nNakDk9lMchgs2mee8Gnlo7b4vth8k3f4T95DFTWOGNHYyU+Sk9tO4bCg5cY36DJXoit9TKi5/AS5nmrBU1kcEAAAAAElFTkSuQmCC";

struct Session {
    wallet: Arc<dyn DemonWallet>,
    public_key: Pubkey,
}

struct Inner {
    provider: Option<ProviderSource>,
    ready_state: Mutex<ReadyState>,
    /// `Some` exactly while connected: the wallet handle and the identity
    /// are stored and cleared together.
    session: Mutex<Option<Session>>,
    connecting: AtomicBool,
    events: broadcast::Sender<WalletAdapterEvent>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn emit(&self, event: WalletAdapterEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn ready_state(&self) -> ReadyState {
        *self.ready_state.lock()
    }

    /// Probe the provider source once; on first success, flip to
    /// `Installed` and notify subscribers.
    fn probe(&self) -> bool {
        let found = self
            .provider
            .as_ref()
            .is_some_and(|provider| provider().is_some());
        if found {
            *self.ready_state.lock() = ReadyState::Installed;
            debug!("demon wallet detected");
            self.emit(WalletAdapterEvent::ReadyStateChange(ReadyState::Installed));
        }
        found
    }

    /// Handle an `accountChanged` push from the extension.
    fn account_changed(&self, raw: Option<String>) {
        let Some(raw) = raw else { return };
        if self.session.lock().is_none() {
            return;
        }

        let new_key = match raw.parse::<Pubkey>() {
            Ok(key) => key,
            Err(source) => {
                // Keep the previous identity: stale-but-valid beats tearing
                // down a working session over a malformed push.
                warn!(%raw, "ignoring account change with malformed public key");
                self.emit(WalletAdapterEvent::Error(WalletAdapterError::PublicKey(source)));
                return;
            }
        };

        {
            let mut session = self.session.lock();
            let Some(session) = session.as_mut() else { return };
            if session.public_key == new_key {
                return;
            }
            session.public_key = new_key;
        }

        debug!(%new_key, "active account changed");
        self.emit(WalletAdapterEvent::Connect(new_key));
    }

    /// Handle a `disconnect` push from the extension. Error-first event
    /// ordering: subscribers see the `Disconnected` error before the
    /// `Disconnect` itself.
    async fn provider_disconnected(&self) {
        // Clear the session before any await so a reentrant observer sees
        // torn-down state and cannot double-act.
        let Some(session) = self.session.lock().take() else { return };

        if let Err(error) = session.wallet.disconnect().await {
            warn!(%error, "wallet disconnect failed during teardown");
        }

        self.emit(WalletAdapterEvent::Error(WalletAdapterError::Disconnected));
        self.emit(WalletAdapterEvent::Disconnect);
    }
}

/// Resets the `connecting` flag on every exit path of `connect`, including
/// early returns.
struct ConnectingGuard<'a>(&'a AtomicBool);

impl<'a> ConnectingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// [`WalletAdapter`] implementation backed by the Demon extension.
///
/// The injected capability is reached through a [`ProviderSource`] supplied
/// at construction; passing `None` means the runtime has no host environment
/// and the adapter stays [`ReadyState::Unsupported`] forever. Otherwise a
/// background task polls the source until the capability appears.
///
/// Must be constructed inside a tokio runtime.
pub struct DemonWalletAdapter {
    inner: Arc<Inner>,
    detection: Mutex<Option<JoinHandle<()>>>,
}

impl DemonWalletAdapter {
    /// Create an adapter with the default configuration.
    pub fn new(provider: Option<ProviderSource>) -> Self {
        Self::with_config(provider, DemonWalletAdapterConfig::default())
    }

    pub fn with_config(
        provider: Option<ProviderSource>,
        config: DemonWalletAdapterConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        let initial = if provider.is_some() {
            ReadyState::NotDetected
        } else {
            ReadyState::Unsupported
        };
        let inner = Arc::new(Inner {
            provider,
            ready_state: Mutex::new(initial),
            session: Mutex::new(None),
            connecting: AtomicBool::new(false),
            events,
            pump: Mutex::new(None),
        });

        let adapter = Self { inner, detection: Mutex::new(None) };
        if initial == ReadyState::NotDetected {
            adapter.start_detection(config.detection_interval);
        }
        adapter
    }

    /// Handle to the connected wallet capability, if any.
    pub fn wallet(&self) -> Option<Arc<dyn DemonWallet>> {
        self.inner.session.lock().as_ref().map(|session| session.wallet.clone())
    }

    /// Poll the provider source until the capability shows up. One-shot: the
    /// task ends after the first detection and is never restarted.
    fn start_detection(&self, period: std::time::Duration) {
        // Probe once synchronously so an already-injected capability is
        // visible before the first poll tick.
        if self.inner.probe() {
            return;
        }

        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it, the constructor
            // already probed.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if inner.probe() {
                    break;
                }
            }
        });
        *self.detection.lock() = Some(task);
    }

    /// The connect sequence proper; `connect` wraps it to add the
    /// emit-and-return error reporting.
    async fn try_connect(&self) -> Result<()> {
        if self.inner.ready_state() != ReadyState::Installed {
            return Err(WalletAdapterError::NotReady);
        }

        let _connecting = ConnectingGuard::set(&self.inner.connecting);

        let wallet = self
            .inner
            .provider
            .as_ref()
            .and_then(|provider| provider())
            .ok_or(WalletAdapterError::NotReady)?;

        let account = wallet
            .connect()
            .await
            .map_err(WalletAdapterError::Account)?;
        debug!(%account, "wallet approved connection");

        let public_key = account
            .parse::<Pubkey>()
            .map_err(WalletAdapterError::PublicKey)?;

        // Subscribe before publishing the session so no pushed event can
        // slip between the two.
        let pump = Self::spawn_pump(self.inner.clone(), wallet.subscribe());
        if let Some(stale) = self.inner.pump.lock().replace(pump) {
            stale.abort();
        }
        *self.inner.session.lock() = Some(Session { wallet, public_key });

        self.inner.emit(WalletAdapterEvent::Connect(public_key));
        Ok(())
    }

    /// Forwards extension-pushed events into the adapter's handlers. Runs
    /// from the first successful connect until teardown or until the
    /// extension drops its event channel.
    fn spawn_pump(
        inner: Arc<Inner>,
        mut events: broadcast::Receiver<ProviderEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ProviderEvent::AccountChanged(raw)) => inner.account_changed(raw),
                    Ok(ProviderEvent::Disconnect) => {
                        inner.provider_disconnected().await;
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed wallet events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Look up the current session or fail the precondition.
    fn session(&self) -> Result<(Arc<dyn DemonWallet>, Pubkey)> {
        self.inner
            .session
            .lock()
            .as_ref()
            .map(|session| (session.wallet.clone(), session.public_key))
            .ok_or(WalletAdapterError::NotConnected)
    }

    /// Emit the error to subscribers and hand the same value back to the
    /// caller.
    fn fail<T>(&self, error: WalletAdapterError) -> Result<T> {
        self.inner.emit(WalletAdapterEvent::Error(error.clone()));
        Err(error)
    }
}

impl Drop for DemonWalletAdapter {
    fn drop(&mut self) {
        if let Some(task) = self.detection.lock().take() {
            task.abort();
        }
        if let Some(task) = self.inner.pump.lock().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl WalletAdapter for DemonWalletAdapter {
    fn name(&self) -> &str {
        DEMON_WALLET_NAME
    }

    fn url(&self) -> &str {
        DEMON_WALLET_URL
    }

    fn icon(&self) -> &str {
        DEMON_WALLET_ICON
    }

    fn ready_state(&self) -> ReadyState {
        self.inner.ready_state()
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.inner.session.lock().as_ref().map(|session| session.public_key)
    }

    fn connecting(&self) -> bool {
        self.inner.connecting.load(Ordering::SeqCst)
    }

    fn connected(&self) -> bool {
        self.inner
            .session
            .lock()
            .as_ref()
            .is_some_and(|session| session.wallet.is_connected())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletAdapterEvent> {
        self.inner.events.subscribe()
    }

    async fn connect(&self) -> Result<()> {
        if self.connected() || self.connecting() {
            return Ok(());
        }
        match self.try_connect().await {
            Ok(()) => Ok(()),
            Err(error) => self.fail(error),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        // Clear state and stop the pump before awaiting the extension, so a
        // disconnect pushed mid-teardown finds nothing left to act on.
        let session = self.inner.session.lock().take();
        if let Some(pump) = self.inner.pump.lock().take() {
            pump.abort();
        }

        let mut result = Ok(());
        if let Some(session) = session {
            if let Err(source) = session.wallet.disconnect().await {
                let error = WalletAdapterError::Wallet(source);
                self.inner.emit(WalletAdapterEvent::Error(error.clone()));
                result = Err(error);
            }
        }

        self.inner.emit(WalletAdapterEvent::Disconnect);
        result
    }

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction> {
        let (wallet, public_key) = self.session()?;
        match wallet.sign_transaction(transaction, &public_key).await {
            Ok(signed) => Ok(signed),
            Err(source) => self.fail(WalletAdapterError::SignTransaction(source)),
        }
    }

    async fn sign_all_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>> {
        let (wallet, public_key) = self.session()?;
        match wallet.sign_all_transactions(transactions, &public_key).await {
            Ok(signed) => Ok(signed),
            Err(source) => self.fail(WalletAdapterError::SignTransaction(source)),
        }
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        let (wallet, public_key) = self.session()?;
        match wallet.sign_message(message, &public_key).await {
            Ok(signature) => Ok(signature),
            Err(source) => self.fail(WalletAdapterError::SignMessage(source)),
        }
    }

    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
        connection: &RpcClient,
        signers: &[Keypair],
    ) -> Result<VersionedTransaction> {
        let (wallet, public_key) = self.session()?;
        match wallet
            .send_transaction(transaction, connection, signers, &public_key)
            .await
        {
            Ok(sent) => Ok(sent),
            Err(source) => self.fail(WalletAdapterError::SignTransaction(source)),
        }
    }

    async fn encrypt(&self, inputs: Vec<EncryptInput>) -> Result<Vec<EncryptOutput>> {
        let (wallet, public_key) = self.session()?;
        match wallet.encrypt(inputs, &public_key).await {
            Ok(outputs) => Ok(outputs),
            Err(source) => self.fail(WalletAdapterError::Wallet(source)),
        }
    }

    async fn decrypt(&self, inputs: Vec<DecryptInput>) -> Result<Vec<Option<String>>> {
        let (wallet, public_key) = self.session()?;
        match wallet.decrypt(inputs, &public_key).await {
            Ok(cleartexts) => Ok(cleartexts),
            Err(source) => self.fail(WalletAdapterError::Wallet(source)),
        }
    }
}
