// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_utility::{task, time};
use atomic_destructor::AtomicDestroyer;
use nostr::Timestamp;
use tokio::sync::{Notify, RwLock};

use super::options::PoolOptions;
use super::HousekeepingReport;
use crate::connection::Connection;
use crate::network::NetworkNotification;
use crate::shared::SharedState;
use crate::url::RelayUrl;

type Connections = HashMap<RelayUrl, Connection>;

#[derive(Debug, Clone)]
pub(super) struct InnerPool {
    connections: Arc<RwLock<Connections>>,
    pub(super) state: SharedState,
    opts: PoolOptions,
    housekeeping_started: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl AtomicDestroyer for InnerPool {
    fn on_destroy(&self) {
        self.shutdown.notify_one();
        self.disconnect_all();
    }
}

impl InnerPool {
    pub(super) fn new(state: SharedState, opts: PoolOptions) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            state,
            opts,
            housekeeping_started: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub(super) async fn get(&self, url: &RelayUrl) -> Connection {
        self.ensure_housekeeping();

        {
            let connections = self.connections.read().await;
            if let Some(connection) = connections.get(url) {
                return connection.clone();
            }
        }

        // Someone may have inserted it in the meantime
        let mut connections = self.connections.write().await;
        connections
            .entry(url.clone())
            .or_insert_with(|| {
                tracing::debug!(url = %url, "New connection registered.");
                Connection::new(url.clone(), self.state.clone(), self.opts.connection.clone())
            })
            .clone()
    }

    pub(super) async fn find(&self, url: &RelayUrl) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(url).cloned()
    }

    pub(super) async fn connections(&self) -> Vec<Connection> {
        let connections = self.connections.read().await;
        connections.values().cloned().collect()
    }

    fn disconnect_all(&self) {
        match self.connections.try_read() {
            Ok(connections) => {
                for connection in connections.values() {
                    connection.disconnect();
                }
            }
            Err(..) => tracing::warn!("Can't disconnect connections: pool is locked."),
        }
    }

    /// Spawn the housekeeping loop, once
    ///
    /// Deferred to the first `get` so that a pool can be built outside a runtime.
    fn ensure_housekeeping(&self) {
        if !self.opts.housekeeping {
            return;
        }

        if self.housekeeping_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let pool = self.clone();
        task::spawn(async move {
            tracing::debug!("Housekeeping started.");

            loop {
                tokio::select! {
                    _ = time::sleep(pool.opts.housekeeping_interval) => {
                        pool.housekeep(Timestamp::now()).await;
                    }
                    _ = pool.shutdown.notified() => break,
                }
            }

            tracing::debug!("Housekeeping stopped.");
        });
    }

    pub(super) async fn housekeep(&self, now: Timestamp) -> HousekeepingReport {
        let mut report = HousekeepingReport::default();

        let idle_timeout: u64 = self.opts.idle_timeout.as_secs();
        let error_ttl: u64 = self.opts.error_ttl.as_secs();

        for connection in self.connections().await.into_iter() {
            let url: RelayUrl = connection.url().clone();

            let last_activity: u64 = connection
                .last_activity()
                .map(|t| t.as_u64())
                .unwrap_or_else(|| now.as_u64());
            if now.as_u64().saturating_sub(last_activity) > idle_timeout {
                tracing::debug!(url = %url, "Closing idle connection.");
                connection.disconnect();
                report.closed.push(url);
                continue;
            }

            if let Some(last_error) = connection.stats().last_error() {
                if now.as_u64().saturating_sub(last_error.as_u64()) > error_ttl {
                    tracing::debug!(url = %url, "Clearing connection error.");
                    connection.clear_error();
                    report.cleared.push(url);
                }
                continue;
            }

            if connection.stats().quality().await < self.opts.slow_quality_threshold {
                report.slow.push(url);
            }
        }

        if !report.closed.is_empty() {
            let mut connections = self.connections.write().await;
            for url in report.closed.iter() {
                connections.remove(url);
            }
        }

        if !report.slow.is_empty() {
            tracing::warn!(count = %report.slow.len(), "Slow relay connections detected.");
            self.state.notify(NetworkNotification::SlowConnections {
                relays: report.slow.clone(),
            });
        }

        report
    }
}
