// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Discovery host.
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                    Caller thread (sync)                      |
//! |   DiscoveryHost::start / stop / set_metadata_version         |
//! |        | cmd_tx (Stop, SetMetadataVersion)                   |
//! +--------|-----------------------------------------------------+
//!          v
//! +--------------------------------------------------------------+
//! |            sdc-discovery thread (tokio current_thread)       |
//! |   reactor loop: recv_from -> Responder::handle -> send_to    |
//! |   owns: UdpSocket, Responder (identity + MessagingContext)   |
//! +--------------------------------------------------------------+
//! ```
//!
//! The [`Responder`] is the pure part: bytes in, optional reply envelope out.
//! The [`DiscoveryHost`] wraps it with the socket, the thread and the
//! lifecycle state machine.

mod host;
mod responder;
mod socket;

pub use host::DiscoveryHost;
pub use responder::{DiscoveryIdentity, Responder};
pub use socket::create_discovery_socket;

/// Lifecycle of a [`DiscoveryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Stopped,
    Starting,
    Running,
    Stopping,
}
