// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery socket setup.

use std::io;
use std::net::{SocketAddrV4, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;

/// Bind the WS-Discovery socket and join the multicast group.
///
/// The socket is returned non-blocking, ready for `tokio::net::UdpSocket::from_std`.
/// A failed group join is logged and the socket still serves unicast Probe
/// and Resolve traffic.
pub fn create_discovery_socket(config: &DiscoveryConfig) -> io::Result<UdpSocket> {
    // SO_REUSEADDR: several DPWS stacks on one host share port 3702.
    let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket2.set_reuse_address(true)?;

    let bind_addr = SocketAddrV4::new(config.bind_address, config.port);
    socket2.bind(&bind_addr.into())?;

    let socket: UdpSocket = socket2.into();

    match socket.join_multicast_v4(&config.multicast_address, &config.bind_address) {
        Ok(()) => debug!(
            "[discovery] joined {} on {}",
            config.multicast_address, config.bind_address
        ),
        Err(e) => warn!(
            "[discovery] join_multicast_v4({}) on {} failed (non-fatal): {}",
            config.multicast_address, config.bind_address, e
        ),
    }

    if let Err(e) = socket.set_multicast_loop_v4(config.multicast_loop) {
        debug!("[discovery] set_multicast_loop_v4 failed: {}", e);
    }
    if let Err(e) = socket.set_multicast_ttl_v4(config.multicast_ttl) {
        debug!("[discovery] set_multicast_ttl_v4 failed: {}", e);
    }

    socket.set_nonblocking(true)?;
    debug!("[discovery] socket bound to {}", socket.local_addr()?);
    Ok(socket)
}
