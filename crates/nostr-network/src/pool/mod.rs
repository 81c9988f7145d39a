// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Pool
//!
//! Registry of connections keyed by normalized relay URL. `get` is the only
//! insertion point and housekeeping the only removal point.

use atomic_destructor::AtomicDestructor;
use nostr::Timestamp;
use tokio::sync::broadcast;

pub mod constants;
mod inner;
pub mod options;

use self::inner::InnerPool;
pub use self::options::PoolOptions;
use crate::connection::Connection;
use crate::error::Error;
use crate::network::{AuthHandler, NetworkNotification};
use crate::shared::SharedState;
use crate::transport::{DefaultWebsocketTransport, WebSocketTransport};
use crate::url::RelayUrl;

/// Outcome of a housekeeping pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HousekeepingReport {
    /// Idle connections closed and removed
    pub closed: Vec<RelayUrl>,
    /// Connections whose stale error was cleared
    pub cleared: Vec<RelayUrl>,
    /// Connections below the quality threshold
    pub slow: Vec<RelayUrl>,
}

/// Connection pool
#[derive(Debug, Clone)]
pub struct Pool {
    inner: AtomicDestructor<InnerPool>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(PoolOptions::default())
    }
}

impl Pool {
    /// New pool using websocket connections
    #[inline]
    pub fn new(opts: PoolOptions) -> Self {
        Self::with_transport(DefaultWebsocketTransport, opts)
    }

    /// New pool with a custom transport
    pub fn with_transport<T>(transport: T, opts: PoolOptions) -> Self
    where
        T: WebSocketTransport + 'static,
    {
        let state = SharedState::new(transport, None, opts.notification_channel_size);
        Self {
            inner: AtomicDestructor::new(InnerPool::new(state, opts)),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> &SharedState {
        &self.inner.state
    }

    /// Set the handler answering relay AUTH challenges
    #[inline]
    pub async fn set_auth_handler<T>(&self, handler: T)
    where
        T: AuthHandler + 'static,
    {
        self.inner.state.set_auth_handler(handler).await
    }

    /// Get new notification listener
    #[inline]
    pub fn notifications(&self) -> broadcast::Receiver<NetworkNotification> {
        self.inner.state.notifications()
    }

    /// Get the connection for `url`, creating it if missing
    ///
    /// The connection is not opened.
    #[inline]
    pub async fn get(&self, url: &RelayUrl) -> Connection {
        self.inner.get(url).await
    }

    /// Parse `url`, get its connection and open it
    pub async fn connect(&self, url: &str) -> Result<Connection, Error> {
        let url: RelayUrl = RelayUrl::parse(url)?;
        let connection: Connection = self.inner.get(&url).await;
        connection.connect().await?;
        Ok(connection)
    }

    /// Check if a connection for `url` is registered
    #[inline]
    pub async fn has(&self, url: &RelayUrl) -> bool {
        self.inner.find(url).await.is_some()
    }

    /// Get the connection for `url`, if registered
    #[inline]
    pub async fn find(&self, url: &RelayUrl) -> Option<Connection> {
        self.inner.find(url).await
    }

    /// All registered connections
    #[inline]
    pub async fn connections(&self) -> Vec<Connection> {
        self.inner.connections().await
    }

    /// Run a housekeeping pass now
    #[inline]
    pub async fn housekeep(&self) -> HousekeepingReport {
        self.inner.housekeep(Timestamp::now()).await
    }

    /// Run a housekeeping pass as if the current time were `now`
    #[inline]
    pub async fn housekeep_at(&self, now: Timestamp) -> HousekeepingReport {
        self.inner.housekeep(now).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{MockRelay, MockTransport};

    fn url(url: &str) -> RelayUrl {
        RelayUrl::parse(url).unwrap()
    }

    fn pool(transport: &MockTransport) -> Pool {
        Pool::with_transport(transport.clone(), PoolOptions::new().housekeeping(false))
    }

    #[tokio::test]
    async fn test_get_is_insert_if_absent() {
        let pool = pool(&MockTransport::new());

        assert!(!pool.has(&url("wss://relay.example")).await);

        let a = pool.get(&url("wss://relay.example")).await;
        let b = pool.get(&url("WSS://Relay.Example/")).await;
        let c = pool.get(&url("wss://other.example")).await;

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(pool.has(&url("wss://relay.example/")).await);
        assert_eq!(pool.connections().await.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_by_url() {
        let transport = MockTransport::new();
        transport.relay("wss://relay.example", MockRelay::Silent);
        transport.relay("wss://down.example", MockRelay::Unreachable);
        let pool = pool(&transport);

        let conn = pool.connect("wss://relay.example/").await.unwrap();
        assert!(conn.status().is_open());
        assert_eq!(conn, pool.get(&url("wss://relay.example")).await);

        assert!(matches!(
            pool.connect("https://relay.example").await,
            Err(Error::RelayUrl(..))
        ));
        assert!(matches!(
            pool.connect("wss://down.example").await,
            Err(Error::Connection(..))
        ));
    }

    #[tokio::test]
    async fn test_housekeeping_closes_idle() {
        let transport = MockTransport::new();
        transport.relay("wss://relay.example", MockRelay::Silent);
        let pool = pool(&transport);

        let conn = pool.get(&url("wss://relay.example")).await;
        conn.connect().await.unwrap();

        // Fresh connection
        let report = pool.housekeep().await;
        assert!(report.closed.is_empty());

        let later = Timestamp::from(Timestamp::now().as_u64() + 120);
        let report = pool.housekeep_at(later).await;
        assert_eq!(report.closed, vec![url("wss://relay.example")]);
        assert!(conn.status().is_closed());
        assert!(!pool.has(&url("wss://relay.example")).await);
    }

    #[tokio::test]
    async fn test_housekeeping_clears_stale_errors() {
        let transport = MockTransport::new();
        transport.relay("wss://down.example", MockRelay::Unreachable);
        let pool = pool(&transport);

        let conn = pool.get(&url("wss://down.example")).await;
        assert!(conn.connect().await.is_err());
        assert!(conn.has_error());

        // Error still fresh
        let report = pool.housekeep().await;
        assert!(report.cleared.is_empty());
        assert!(conn.has_error());

        let later = Timestamp::from(Timestamp::now().as_u64() + 30);
        let report = pool.housekeep_at(later).await;
        assert_eq!(report.cleared, vec![url("wss://down.example")]);
        assert!(!conn.has_error());
        assert!(pool.has(&url("wss://down.example")).await);
    }

    #[tokio::test]
    async fn test_housekeeping_reports_slow() {
        let transport = MockTransport::new();
        transport.relay("wss://slow.example", MockRelay::Silent);
        let pool = pool(&transport);
        let mut notifications = pool.notifications();

        let conn = pool.get(&url("wss://slow.example")).await;
        conn.connect().await.unwrap();
        conn.stats().save_latency(Duration::from_secs(10)).await;

        let report = pool.housekeep().await;
        assert_eq!(report.slow, vec![url("wss://slow.example")]);

        assert_eq!(
            notifications.recv().await.unwrap(),
            NetworkNotification::SlowConnections {
                relays: vec![url("wss://slow.example")]
            }
        );
    }

    #[tokio::test]
    async fn test_background_housekeeping() {
        let transport = MockTransport::new();
        transport.relay("wss://relay.example", MockRelay::Silent);
        let pool = Pool::with_transport(
            transport.clone(),
            PoolOptions::new()
                .housekeeping_interval(Duration::from_millis(20))
                .idle_timeout(Duration::ZERO),
        );

        let conn = pool.get(&url("wss://relay.example")).await;
        conn.stats().set_last_activity(Timestamp::from(1));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!pool.has(&url("wss://relay.example")).await);
    }
}
