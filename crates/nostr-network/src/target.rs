// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Target
//!
//! Where the bytes of an operation go: one connection per relay, or a single
//! multiplexer connection tagging every message with its relays.

use crate::connection::Connection;
use crate::url::RelayUrl;

/// Operation target
#[derive(Debug, Clone)]
pub enum Target {
    /// One connection per relay
    Direct {
        /// Connections, in relay order
        connections: Vec<Connection>,
    },
    /// One multiplexer connection carrying every relay
    Multiplexed {
        /// Multiplexer connection
        proxy: Connection,
        /// Relays reached through the multiplexer
        relays: Vec<RelayUrl>,
    },
}

impl Target {
    /// Check if is [`Target::Multiplexed`]
    #[inline]
    pub fn is_multiplexed(&self) -> bool {
        matches!(self, Self::Multiplexed { .. })
    }

    /// Relays reached by this target
    pub fn relays(&self) -> Vec<RelayUrl> {
        match self {
            Self::Direct { connections } => connections.iter().map(|c| c.url().clone()).collect(),
            Self::Multiplexed { relays, .. } => relays.clone(),
        }
    }

    /// Underlying connections
    pub fn connections(&self) -> Vec<Connection> {
        match self {
            Self::Direct { connections } => connections.clone(),
            Self::Multiplexed { proxy, .. } => vec![proxy.clone()],
        }
    }

    /// Each underlying connection with the relays it carries
    pub fn routes(&self) -> Vec<(Connection, Vec<RelayUrl>)> {
        match self {
            Self::Direct { connections } => connections
                .iter()
                .map(|c| (c.clone(), vec![c.url().clone()]))
                .collect(),
            Self::Multiplexed { proxy, relays } => vec![(proxy.clone(), relays.clone())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionOptions;
    use crate::shared::SharedState;

    fn connection(url: &str) -> Connection {
        Connection::new(
            RelayUrl::parse(url).unwrap(),
            SharedState::default(),
            ConnectionOptions::default(),
        )
    }

    #[test]
    fn test_direct_routes() {
        let target = Target::Direct {
            connections: vec![connection("wss://a.example"), connection("wss://b.example")],
        };

        assert!(!target.is_multiplexed());
        assert_eq!(target.connections().len(), 2);

        let routes = target.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1].1, vec![RelayUrl::parse("wss://b.example").unwrap()]);
    }

    #[test]
    fn test_multiplexed_routes() {
        let relays = vec![
            RelayUrl::parse("wss://a.example").unwrap(),
            RelayUrl::parse("wss://b.example").unwrap(),
        ];
        let target = Target::Multiplexed {
            proxy: connection("wss://proxy.example"),
            relays: relays.clone(),
        };

        assert!(target.is_multiplexed());
        assert_eq!(target.relays(), relays);

        let routes = target.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].0.url().as_str(), "wss://proxy.example");
        assert_eq!(routes[0].1, relays);
    }
}
