// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::network::{AuthFlag, AuthHandler, NetworkNotification};
use crate::transport::{DefaultWebsocketTransport, WebSocketTransport};
use crate::url::RelayUrl;

const DEFAULT_NOTIFICATION_CHANNEL_SIZE: usize = 4096;

/// State shared by the pool, its connections and the network
#[derive(Debug, Clone)]
pub(crate) struct SharedState {
    pub(crate) transport: Arc<dyn WebSocketTransport>,
    auth_handler: Arc<RwLock<Option<Arc<dyn AuthHandler>>>>,
    auth_flags: Arc<RwLock<HashMap<RelayUrl, AuthFlag>>>,
    notification_sender: broadcast::Sender<NetworkNotification>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(
            DefaultWebsocketTransport,
            None,
            DEFAULT_NOTIFICATION_CHANNEL_SIZE,
        )
    }
}

impl SharedState {
    pub(crate) fn new<T>(
        transport: T,
        auth_handler: Option<Arc<dyn AuthHandler>>,
        notification_channel_size: usize,
    ) -> Self
    where
        T: WebSocketTransport + 'static,
    {
        let (notification_sender, ..) = broadcast::channel(notification_channel_size);

        Self {
            transport: Arc::new(transport),
            auth_handler: Arc::new(RwLock::new(auth_handler)),
            auth_flags: Arc::new(RwLock::new(HashMap::new())),
            notification_sender,
        }
    }

    pub(crate) async fn auth_handler(&self) -> Option<Arc<dyn AuthHandler>> {
        let handler = self.auth_handler.read().await;
        handler.clone()
    }

    pub(crate) async fn set_auth_handler<T>(&self, handler: T)
    where
        T: AuthHandler + 'static,
    {
        let mut h = self.auth_handler.write().await;
        *h = Some(Arc::new(handler));
    }

    pub(crate) async fn auth_flag(&self, relay_url: &RelayUrl) -> Option<AuthFlag> {
        let flags = self.auth_flags.read().await;
        flags.get(relay_url).copied()
    }

    /// Set or clear the auth flag of a relay
    ///
    /// Emits [`NetworkNotification::RelayAuth`] only on change.
    pub(crate) async fn set_auth_flag(&self, relay_url: &RelayUrl, flag: Option<AuthFlag>) {
        let changed: bool = {
            let mut flags = self.auth_flags.write().await;
            let previous: Option<AuthFlag> = match flag {
                Some(flag) => flags.insert(relay_url.clone(), flag),
                None => flags.remove(relay_url),
            };
            previous != flag
        };

        if changed {
            self.notify(NetworkNotification::RelayAuth {
                relay_url: relay_url.clone(),
                flag,
            });
        }
    }

    #[inline]
    pub(crate) fn notify(&self, notification: NetworkNotification) {
        let _ = self.notification_sender.send(notification);
    }

    #[inline]
    pub(crate) fn notifications(&self) -> broadcast::Receiver<NetworkNotification> {
        self.notification_sender.subscribe()
    }
}
