// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery host lifecycle and reactor thread.

use std::net::{SocketAddr, UdpSocket as StdUdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::responder::{DiscoveryIdentity, Responder};
use super::socket::create_discovery_socket;
use super::HostState;
use crate::config::DiscoveryConfig;
use crate::constants::MAX_ENVELOPE_SIZE;
use crate::error::HostError;
use crate::soap::{serialize, Envelope};

/// Commands from the owning thread to the reactor.
#[derive(Debug)]
enum ReactorCommand {
    SetMetadataVersion(u32),
    Stop,
}

/// Startup report from the reactor.
#[derive(Debug)]
enum ReactorEvent {
    Ready,
    Failed(String),
}

struct Reactor {
    cmd_tx: mpsc::UnboundedSender<ReactorCommand>,
    thread: JoinHandle<Responder>,
    local_addr: SocketAddr,
}

/// WS-Discovery target service.
///
/// Owns one UDP socket and one reactor thread while running. The
/// [`Responder`] (identity and sequence numbering) moves into the reactor on
/// `start()` and comes back on `stop()`, so instance ids keep growing across
/// restarts of the same host.
pub struct DiscoveryHost {
    identity: DiscoveryIdentity,
    config: DiscoveryConfig,
    state: HostState,
    running: Arc<AtomicBool>,
    responder: Option<Responder>,
    reactor: Option<Reactor>,
}

impl DiscoveryHost {
    pub fn new(identity: DiscoveryIdentity, config: DiscoveryConfig) -> Self {
        Self {
            responder: Some(Responder::new(identity.clone())),
            identity,
            config,
            state: HostState::Stopped,
            running: Arc::new(AtomicBool::new(false)),
            reactor: None,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    /// True while the reactor is serving the socket.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn identity(&self) -> &DiscoveryIdentity {
        &self.identity
    }

    /// Bound socket address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.reactor.as_ref().map(|r| r.local_addr)
    }

    /// Open the socket, announce Hello and serve Probe/Resolve until `stop()`.
    pub fn start(&mut self) -> Result<(), HostError> {
        if self.state != HostState::Stopped {
            return Err(HostError::InvalidState(self.state));
        }

        let socket = create_discovery_socket(&self.config)?;
        let local_addr = socket.local_addr()?;
        // Port 0 binds an ephemeral port; announce on that port as well.
        let announce_port = match self.config.port {
            0 => local_addr.port(),
            port => port,
        };
        let announce_to = SocketAddr::from((self.config.multicast_address, announce_port));

        let responder = self
            .responder
            .take()
            .unwrap_or_else(|| Responder::new(self.identity.clone()));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = std_mpsc::channel();

        self.state = HostState::Starting;
        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name("sdc-discovery".to_string())
            .spawn(move || run_reactor(socket, announce_to, responder, cmd_rx, event_tx, running));
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.running.store(false, Ordering::Relaxed);
                self.state = HostState::Stopped;
                return Err(HostError::Socket(e));
            }
        };

        let failure = match event_rx.recv() {
            Ok(ReactorEvent::Ready) => None,
            Ok(ReactorEvent::Failed(message)) => Some(message),
            Err(_) => Some("reactor exited before reporting readiness".to_string()),
        };
        if let Some(message) = failure {
            self.responder = thread.join().ok();
            self.running.store(false, Ordering::Relaxed);
            self.state = HostState::Stopped;
            return Err(HostError::Reactor(message));
        }

        self.reactor = Some(Reactor {
            cmd_tx,
            thread,
            local_addr,
        });
        self.state = HostState::Running;
        info!(
            "[discovery] {} running on {}",
            self.identity.endpoint_reference, local_addr
        );
        Ok(())
    }

    /// Send Bye, stop the reactor and wait for its thread.
    pub fn stop(&mut self) -> Result<(), HostError> {
        if self.state != HostState::Running {
            return Err(HostError::InvalidState(self.state));
        }
        self.running.store(false, Ordering::Relaxed);
        self.state = HostState::Stopping;

        if let Some(reactor) = self.reactor.take() {
            // A send error means the reactor already exited; join still reaps it.
            let _ = reactor.cmd_tx.send(ReactorCommand::Stop);
            match reactor.thread.join() {
                Ok(responder) => self.responder = Some(responder),
                Err(_) => error!("[discovery] reactor thread panicked"),
            }
        }

        self.state = HostState::Stopped;
        info!("[discovery] {} stopped", self.identity.endpoint_reference);
        Ok(())
    }

    /// Change the metadata version; a running host re-announces with Hello.
    pub fn set_metadata_version(&mut self, version: u32) -> Result<(), HostError> {
        self.identity.metadata_version = version;
        if let Some(reactor) = &self.reactor {
            return reactor
                .cmd_tx
                .send(ReactorCommand::SetMetadataVersion(version))
                .map_err(|_| HostError::Reactor("reactor is not running".to_string()));
        }
        if let Some(responder) = self.responder.as_mut() {
            responder.set_metadata_version(version);
        }
        Ok(())
    }
}

impl Drop for DiscoveryHost {
    fn drop(&mut self) {
        if self.state == HostState::Running {
            let _ = self.stop();
        }
    }
}

fn run_reactor(
    socket: StdUdpSocket,
    announce_to: SocketAddr,
    responder: Responder,
    cmd_rx: mpsc::UnboundedReceiver<ReactorCommand>,
    events: std_mpsc::Sender<ReactorEvent>,
    running: Arc<AtomicBool>,
) -> Responder {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = events.send(ReactorEvent::Failed(format!(
                "failed to create tokio runtime: {}",
                e
            )));
            running.store(false, Ordering::Relaxed);
            return responder;
        }
    };

    rt.block_on(reactor_loop(
        socket,
        announce_to,
        responder,
        cmd_rx,
        events,
        running,
    ))
}

async fn reactor_loop(
    socket: StdUdpSocket,
    announce_to: SocketAddr,
    mut responder: Responder,
    mut cmd_rx: mpsc::UnboundedReceiver<ReactorCommand>,
    events: std_mpsc::Sender<ReactorEvent>,
    running: Arc<AtomicBool>,
) -> Responder {
    let socket = match UdpSocket::from_std(socket) {
        Ok(socket) => socket,
        Err(e) => {
            let _ = events.send(ReactorEvent::Failed(format!(
                "failed to register socket: {}",
                e
            )));
            running.store(false, Ordering::Relaxed);
            return responder;
        }
    };

    responder.reset_instance();
    let hello = responder.hello();
    send(&socket, &hello, announce_to).await;
    let _ = events.send(ReactorEvent::Ready);

    // One extra byte so an oversized datagram is seen as oversized.
    let mut buf = vec![0u8; MAX_ENVELOPE_SIZE + 1];
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(ReactorCommand::SetMetadataVersion(version)) => {
                    responder.set_metadata_version(version);
                    let hello = responder.hello();
                    send(&socket, &hello, announce_to).await;
                }
                Some(ReactorCommand::Stop) | None => break,
            },
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, sender)) => match responder.handle_datagram(&buf[..len]) {
                    Ok(Some(reply)) => send(&socket, &reply, sender).await,
                    Ok(None) => {}
                    Err(e) => debug!("[discovery] dropped datagram from {}: {}", sender, e),
                },
                Err(e) => warn!("[discovery] recv_from failed: {}", e),
            },
        }
    }

    let bye = responder.bye();
    send(&socket, &bye, announce_to).await;
    running.store(false, Ordering::Relaxed);
    responder
}

async fn send(socket: &UdpSocket, envelope: &Envelope, destination: SocketAddr) {
    let action = envelope.header.action.as_deref().unwrap_or_default();
    let wire = serialize(envelope);
    match socket.send_to(wire.as_bytes(), destination).await {
        Ok(_) => debug!("[discovery] sent {} to {}", action, destination),
        Err(e) => warn!(
            "[discovery] send {} to {} failed (non-fatal): {}",
            action, destination, e
        ),
    }
}
