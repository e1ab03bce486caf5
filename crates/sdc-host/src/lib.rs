// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # sdc-host - SDC network control plane
//!
//! The network-facing side of an IEEE 11073 SDC provider: WS-Discovery
//! announcement and lookup over UDP multicast, and WS-Eventing subscriptions
//! with HTTP push delivery of clinical reports.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sdc_host::{DeviceConfig, DiscoveryHost, Report, ReportAction, SubscriptionManager};
//!
//! # async fn run() -> sdc_host::Result<()> {
//! let config = DeviceConfig::default();
//! let mut host = DiscoveryHost::new(config.identity(), config.discovery.clone());
//! host.start()?;
//!
//! let manager = SubscriptionManager::new(config.eventing.clone())?;
//! manager.fire_event(&Report::new(
//!     ReportAction::EpisodicMetric,
//!     "<msg:EpisodicMetricReport/>",
//! ));
//!
//! host.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   DiscoveryHost (reactor thread)    |   SubscriptionManager (Sync)  |
//! |   Hello / Bye / Probe / Resolve     |   Subscribe / Renew / ...     |
//! |                                     |   fire_event -> channels      |
//! +---------------------------------------------------------------------+
//! |         soap: Envelope codec (roxmltree in, escaping writer out)    |
//! +---------------------------------------------------------------------+
//! |      UDP multicast 239.255.255.250:3702    |    HTTP POST (reqwest)  |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`discovery`] - WS-Discovery target service
//! - [`eventing`] - WS-Eventing subscription manager and delivery
//! - [`soap`] - envelope model and codec
//! - [`messaging`] - message ids and `AppSequence`
//! - [`config`] - JSON device configuration

pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod eventing;
pub mod messaging;
pub mod soap;

pub use config::{ConfigError, DeviceConfig, DiscoveryConfig, EventingConfig};
pub use discovery::{DiscoveryHost, DiscoveryIdentity, HostState, Responder};
pub use error::{CodecError, DeliveryError, Error, HostError, Result};
pub use eventing::{
    EventingFault, HttpTransport, Report, ReportAction, SubscriptionInfo, SubscriptionManager,
    Transport,
};
pub use messaging::MessagingContext;
pub use soap::{Envelope, QName};
