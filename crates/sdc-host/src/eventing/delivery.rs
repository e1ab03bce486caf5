// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-destination notification delivery.
//!
//! Each subscriber address gets one [`DeliveryChannel`]: a bounded queue and
//! a tokio task that drains it through the [`Transport`]. A slow or dead
//! subscriber fills its own queue and nothing else.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::DeliveryError;

const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Outbound message transport.
pub trait Transport: Send + Sync + 'static {
    /// POST one serialized envelope to `destination`.
    fn post(
        &self,
        destination: &str,
        body: String,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// HTTP transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, DeliveryError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    async fn post(&self, destination: &str, body: String) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(destination)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryError::Status {
                destination: destination.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Queue plus drain task for one subscriber address.
///
/// Dropping the channel closes the queue; the task delivers what is still
/// queued and exits.
#[derive(Debug)]
pub(crate) struct DeliveryChannel {
    destination: String,
    sender: mpsc::Sender<String>,
    task: JoinHandle<()>,
    /// Subscriptions currently using this channel.
    pub refs: usize,
}

impl DeliveryChannel {
    pub fn spawn<T: Transport>(
        runtime: &Handle,
        destination: String,
        transport: Arc<T>,
        depth: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(depth);
        let task = runtime.spawn(drain(destination.clone(), receiver, transport));
        debug!("[eventing] delivery channel opened for {}", destination);
        Self {
            destination,
            sender,
            task,
            refs: 0,
        }
    }

    /// Close the queue; the returned task ends once the backlog is delivered.
    pub fn close(self) -> JoinHandle<()> {
        self.task
    }

    pub fn sender(&self) -> QueueSender {
        QueueSender {
            destination: self.destination.clone(),
            sender: self.sender.clone(),
        }
    }
}

/// Cloneable enqueue handle, usable without holding the manager lock.
#[derive(Debug, Clone)]
pub(crate) struct QueueSender {
    destination: String,
    sender: mpsc::Sender<String>,
}

impl QueueSender {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Enqueue without waiting; a full queue drops the message.
    pub fn enqueue(&self, body: String) -> Result<(), DeliveryError> {
        self.sender.try_send(body).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                DeliveryError::QueueFull(self.destination.clone())
            }
            mpsc::error::TrySendError::Closed(_) => {
                DeliveryError::Closed(self.destination.clone())
            }
        })
    }
}

async fn drain<T: Transport>(
    destination: String,
    mut receiver: mpsc::Receiver<String>,
    transport: Arc<T>,
) {
    while let Some(body) = receiver.recv().await {
        if let Err(e) = transport.post(&destination, body).await {
            warn!("[eventing] delivery to {} failed: {}", destination, e);
        }
    }
    debug!("[eventing] delivery channel for {} closed", destination);
}
