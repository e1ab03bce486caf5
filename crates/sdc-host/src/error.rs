// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the SDC host.

use thiserror::Error;

use crate::config::ConfigError;
use crate::discovery::HostState;

/// Envelope decoding failures.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Envelope exceeds {limit} bytes ({len} received)")]
    TooLarge { len: usize, limit: usize },

    #[error("Envelope is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// A structurally required element is absent.
    #[error("Expected element {namespace}:{name} not encountered")]
    MissingElement {
        namespace: &'static str,
        name: &'static str,
    },

    /// Element present but its content is not acceptable.
    #[error("Invalid content in {element}: {message}")]
    InvalidContent {
        element: &'static str,
        message: String,
    },
}

impl CodecError {
    pub(crate) fn missing(namespace: &'static str, name: &'static str) -> Self {
        CodecError::MissingElement { namespace, name }
    }
}

/// Discovery host lifecycle errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Operation not valid in state {0:?}")]
    InvalidState(HostState),

    #[error("Socket error: {0}")]
    Socket(#[from] std::io::Error),

    #[error("Reactor failed to start: {0}")]
    Reactor(String),
}

/// Outbound notification transport errors.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Subscriber {destination} answered with status {status}")]
    Status { destination: String, status: u16 },

    #[error("Delivery queue for {0} is full")]
    QueueFull(String),

    #[error("Delivery channel for {0} is closed")]
    Closed(String),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Discovery host error: {0}")]
    Host(#[from] HostError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No tokio runtime available: {0}")]
    Runtime(String),
}

/// Result type for SDC host operations.
pub type Result<T> = std::result::Result<T, Error>;
