// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Prelude

#![allow(unknown_lints)]
#![allow(ambiguous_glob_reexports)]
#![doc(hidden)]

// External crates
pub use nostr::prelude::*;

// Internal modules
pub use crate::connection::*;
pub use crate::executor::*;
pub use crate::network::*;
pub use crate::pool::*;
pub use crate::*;
