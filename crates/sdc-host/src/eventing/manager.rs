// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Eventing subscription manager.

use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::actions::ReportAction;
use super::clock::{Clock, SystemClock};
use super::delivery::{DeliveryChannel, HttpTransport, QueueSender, Transport};
use super::fault::EventingFault;
use super::subscription::{Subscription, SubscriptionInfo};
use crate::config::EventingConfig;
use crate::constants::{
    DPWS_FILTER_DIALECT_ACTION, WS_ADDRESSING_ANONYMOUS, WS_EVENTING_DELIVERY_PUSH,
    WS_EVENTING_GET_STATUS_RESPONSE, WS_EVENTING_RENEW_RESPONSE,
    WS_EVENTING_SOURCE_SHUTTING_DOWN, WS_EVENTING_SUBSCRIBE_RESPONSE,
    WS_EVENTING_SUBSCRIPTION_END, WS_EVENTING_UNSUBSCRIBE_RESPONSE,
};
use crate::error::{Error, Result};
use crate::messaging::new_message_id;
use crate::soap::{
    format_duration, parse_duration, serialize, Body, EndpointReference, Envelope, Filter,
    GetStatusResponse, Renew, RenewResponse, Subscribe, SubscribeResponse, SubscriptionEnd,
};

/// A report to push to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub action: ReportAction,
    /// Serialized report element, placed verbatim in the notification body.
    pub payload: String,
}

impl Report {
    pub fn new(action: ReportAction, payload: impl Into<String>) -> Self {
        Self {
            action,
            payload: payload.into(),
        }
    }
}

#[derive(Default)]
struct Tables {
    subscriptions: BTreeMap<String, Subscription>,
    /// Keyed by NotifyTo address.
    channels: HashMap<String, DeliveryChannel>,
}

impl Tables {
    fn release(&mut self, address: &str) {
        let Some(channel) = self.channels.get_mut(address) else {
            return;
        };
        channel.refs = channel.refs.saturating_sub(1);
        if channel.refs == 0 {
            self.channels.remove(address);
            debug!("[eventing] delivery channel for {} released", address);
        }
    }
}

/// Notification target captured under the lock.
struct Target {
    notify_to: EndpointReference,
    queue: QueueSender,
}

/// Subscription table plus delivery channels.
///
/// `Send + Sync`; every operation takes `&self`. One mutex guards both
/// tables and is never held across I/O: notifications are serialized and
/// queued after the lock is released.
pub struct SubscriptionManager<T: Transport = HttpTransport, C: Clock = SystemClock> {
    config: EventingConfig,
    transport: Arc<T>,
    clock: C,
    runtime: Handle,
    tables: Mutex<Tables>,
}

impl SubscriptionManager {
    /// HTTP delivery and the system clock. Must be called inside a tokio runtime.
    pub fn new(config: EventingConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.delivery_timeout())?;
        Self::with_transport(config, transport, SystemClock)
    }
}

impl<T: Transport, C: Clock> SubscriptionManager<T, C> {
    pub fn with_transport(config: EventingConfig, transport: T, clock: C) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
            clock,
            runtime,
            tables: Mutex::new(Tables::default()),
        })
    }

    pub fn config(&self) -> &EventingConfig {
        &self.config
    }

    fn manager_reference(&self, identifier: &str) -> EndpointReference {
        EndpointReference::with_identifier(
            self.config.subscription_manager_address.clone(),
            identifier,
        )
    }

    fn granted(&self, expires: Option<&str>) -> std::result::Result<Duration, EventingFault> {
        let requested = match expires {
            None => self.config.default_expiration(),
            Some(raw) => parse_duration(raw.trim())
                .filter(|d| !d.is_zero())
                .ok_or_else(|| EventingFault::InvalidExpirationTime(raw.to_string()))?,
        };
        Ok(requested.min(self.config.max_expiration()))
    }

    /// `now + granted`, or a fault when that instant is not representable.
    fn expiration(
        now: Instant,
        granted: Duration,
        expires: Option<&str>,
    ) -> std::result::Result<Instant, EventingFault> {
        now.checked_add(granted).ok_or_else(|| {
            EventingFault::InvalidExpirationTime(expires.unwrap_or_default().to_string())
        })
    }

    /// Create a subscription.
    ///
    /// Every check runs before any state is touched, so a fault leaves the
    /// table exactly as it was.
    pub fn subscribe(
        &self,
        request: &Subscribe,
    ) -> std::result::Result<SubscribeResponse, EventingFault> {
        if let Some(mode) = &request.delivery.mode {
            if mode != WS_EVENTING_DELIVERY_PUSH {
                return Err(EventingFault::DeliveryModeRequestedUnavailable(mode.clone()));
            }
        }
        let notify_to = request.delivery.notify_to.clone();
        if notify_to.address.trim().is_empty() {
            return Err(EventingFault::InvalidMessage("empty NotifyTo address".into()));
        }
        let filter = requested_actions(request.filter.as_ref())?;
        let granted = self.granted(request.expires.as_deref())?;

        let expiration =
            Self::expiration(self.clock.now(), granted, request.expires.as_deref())?;

        let identifier = new_message_id();
        let count = {
            let mut tables = self.tables.lock();
            let channel = tables
                .channels
                .entry(notify_to.address.clone())
                .or_insert_with(|| {
                    DeliveryChannel::spawn(
                        &self.runtime,
                        notify_to.address.clone(),
                        Arc::clone(&self.transport),
                        self.config.delivery_queue_depth,
                    )
                });
            channel.refs += 1;

            let previous = tables.subscriptions.insert(
                identifier.clone(),
                Subscription {
                    notify_to,
                    end_to: request.end_to.clone(),
                    filter,
                    expiration,
                },
            );
            debug_assert!(previous.is_none(), "duplicate subscription {identifier}");
            tables.subscriptions.len()
        };

        info!(
            "[eventing] subscribed {} for {:?} ({} active)",
            identifier, granted, count
        );
        Ok(SubscribeResponse {
            subscription_manager: self.manager_reference(&identifier),
            expires: format_duration(granted),
        })
    }

    /// Extend a live subscription; NotifyTo and filter stay as they are.
    pub fn renew(
        &self,
        request: &Renew,
        identifier: &str,
    ) -> std::result::Result<RenewResponse, EventingFault> {
        let granted = self.granted(request.expires.as_deref())?;
        let now = self.clock.now();
        let expiration = Self::expiration(now, granted, request.expires.as_deref())?;

        let mut tables = self.tables.lock();
        match tables.subscriptions.get_mut(identifier) {
            Some(subscription) if !subscription.is_expired(now) => {
                subscription.expiration = expiration;
            }
            _ => return Err(EventingFault::UnableToRenew(identifier.to_string())),
        }
        drop(tables);

        debug!("[eventing] renewed {} for {:?}", identifier, granted);
        Ok(RenewResponse {
            expires: format_duration(granted),
        })
    }

    /// Remove a subscription. Unknown identifiers are ignored.
    pub fn unsubscribe(&self, identifier: &str) {
        let mut tables = self.tables.lock();
        if let Some(subscription) = tables.subscriptions.remove(identifier) {
            tables.release(&subscription.notify_to.address);
            let count = tables.subscriptions.len();
            drop(tables);
            info!("[eventing] unsubscribed {} ({} active)", identifier, count);
        }
    }

    /// Remaining lifetime of a live subscription.
    pub fn get_status(
        &self,
        identifier: &str,
    ) -> std::result::Result<GetStatusResponse, EventingFault> {
        let now = self.clock.now();
        let remaining = self
            .tables
            .lock()
            .subscriptions
            .get(identifier)
            .and_then(|s| s.remaining(now));
        remaining
            .map(|d| GetStatusResponse {
                expires: format_duration(d),
            })
            .ok_or_else(|| EventingFault::InvalidSubscription(identifier.to_string()))
    }

    /// Queue `report` for every live subscription whose filter names its
    /// action. Returns the number of notifications queued.
    ///
    /// Expired entries are skipped and left for [`sweep_expired`](Self::sweep_expired).
    pub fn fire_event(&self, report: &Report) -> usize {
        let now = self.clock.now();
        let targets: Vec<Target> = {
            let tables = self.tables.lock();
            tables
                .subscriptions
                .values()
                .filter(|s| !s.is_expired(now) && s.wants(report.action))
                .filter_map(|s| {
                    tables.channels.get(&s.notify_to.address).map(|c| Target {
                        notify_to: s.notify_to.clone(),
                        queue: c.sender(),
                    })
                })
                .collect()
        };

        let mut queued = 0;
        for target in targets {
            let mut envelope = Envelope::new(
                report.action.uri(),
                Body::Notification(report.payload.clone()),
            );
            envelope.header.message_id = Some(new_message_id());
            envelope.header.to = Some(target.notify_to.address.clone());
            envelope.header.identifier = target.notify_to.identifier.clone();

            match target.queue.enqueue(serialize(&envelope)) {
                Ok(()) => queued += 1,
                Err(e) => warn!(
                    "[eventing] dropping {} for {}: {}",
                    report.action,
                    target.queue.destination(),
                    e
                ),
            }
        }
        queued
    }

    /// Remove expired subscriptions and release their channels.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut tables = self.tables.lock();
        let expired: Vec<String> = tables
            .subscriptions
            .iter()
            .filter(|(_, s)| s.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            if let Some(subscription) = tables.subscriptions.remove(id) {
                tables.release(&subscription.notify_to.address);
            }
        }
        drop(tables);

        if !expired.is_empty() {
            debug!("[eventing] swept {} expired subscriptions", expired.len());
        }
        expired.len()
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `interval` until the
    /// manager is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.sweep_expired();
            }
        })
    }

    /// Snapshot of the table, ordered by identifier.
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        let now = self.clock.now();
        self.tables
            .lock()
            .subscriptions
            .iter()
            .map(|(id, s)| s.info(id, now))
            .collect()
    }

    /// Send `SubscriptionEnd` (SourceShuttingDown) to every live subscriber,
    /// clear the table and wait up to `grace` for queued deliveries to finish.
    /// Returns the number of subscribers notified.
    ///
    /// The end message goes to `EndTo` when the subscriber gave one, otherwise
    /// to its `NotifyTo` address. Expired entries are dropped silently.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let now = self.clock.now();
        let (subscriptions, channels) = {
            let mut tables = self.tables.lock();
            (
                mem::take(&mut tables.subscriptions),
                mem::take(&mut tables.channels),
            )
        };

        let mut ended = 0;
        let mut direct = Vec::new();
        for (identifier, subscription) in subscriptions {
            if subscription.is_expired(now) {
                continue;
            }
            ended += 1;
            let destination = subscription
                .end_to
                .as_ref()
                .unwrap_or(&subscription.notify_to);
            let mut envelope = Envelope::new(
                WS_EVENTING_SUBSCRIPTION_END,
                Body::SubscriptionEnd(SubscriptionEnd {
                    subscription_manager: self.manager_reference(&identifier),
                    status: WS_EVENTING_SOURCE_SHUTTING_DOWN.to_string(),
                    reason: Some("Event source shutting down".to_string()),
                }),
            );
            envelope.header.message_id = Some(new_message_id());
            envelope.header.to = Some(destination.address.clone());
            envelope.header.identifier = destination.identifier.clone();
            let body = serialize(&envelope);

            // Same address as a NotifyTo: queue behind pending notifications.
            match channels.get(&destination.address) {
                Some(channel) => {
                    if let Err(e) = channel.sender().enqueue(body) {
                        warn!("[eventing] SubscriptionEnd for {} lost: {}", identifier, e);
                    }
                }
                None => {
                    let transport = Arc::clone(&self.transport);
                    let address = destination.address.clone();
                    direct.push(self.runtime.spawn(async move {
                        if let Err(e) = transport.post(&address, body).await {
                            warn!("[eventing] SubscriptionEnd to {} failed: {}", address, e);
                        }
                    }));
                }
            }
        }

        let drains: Vec<JoinHandle<()>> = channels
            .into_values()
            .map(DeliveryChannel::close)
            .chain(direct)
            .collect();
        let flushed = tokio::time::timeout(grace, async {
            for task in drains {
                let _ = task.await;
            }
        })
        .await;
        if flushed.is_err() {
            warn!("[eventing] pending deliveries abandoned after {:?}", grace);
        }

        info!("[eventing] shut down, {} subscriptions ended", ended);
        ended
    }

    /// Answer one eventing request envelope with its response or a fault.
    ///
    /// Renew, Unsubscribe and GetStatus address the subscription through the
    /// `wse:Identifier` header.
    pub fn handle_request(&self, request: &Envelope) -> Envelope {
        let identifier = move || {
            request
                .header
                .identifier
                .as_deref()
                .ok_or_else(|| EventingFault::InvalidMessage("missing Identifier header".into()))
        };

        let result = match &request.body {
            Body::Subscribe(subscribe) => self.subscribe(subscribe).map(|r| {
                Envelope::new(WS_EVENTING_SUBSCRIBE_RESPONSE, Body::SubscribeResponse(r))
            }),
            Body::Renew(renew) => identifier()
                .and_then(|id| self.renew(renew, id))
                .map(|r| Envelope::new(WS_EVENTING_RENEW_RESPONSE, Body::RenewResponse(r))),
            Body::Unsubscribe => identifier().map(|id| {
                self.unsubscribe(id);
                Envelope::new(WS_EVENTING_UNSUBSCRIBE_RESPONSE, Body::UnsubscribeResponse)
            }),
            Body::GetStatus => identifier().and_then(|id| self.get_status(id)).map(|r| {
                Envelope::new(WS_EVENTING_GET_STATUS_RESPONSE, Body::GetStatusResponse(r))
            }),
            other => Err(EventingFault::InvalidMessage(format!(
                "{} is not an eventing request",
                other.kind()
            ))),
        };

        let mut response = result.unwrap_or_else(|fault| {
            debug!("[eventing] request rejected: {}", fault);
            fault.to_envelope()
        });
        response.header.message_id = Some(new_message_id());
        response.header.to = Some(WS_ADDRESSING_ANONYMOUS.to_string());
        response.header.relates_to = request.header.message_id.clone();
        response
    }
}

/// Validate a Subscribe filter against the allow-list.
///
/// No filter means every report and an empty action list means none;
/// duplicates collapse, order is kept.
fn requested_actions(
    filter: Option<&Filter>,
) -> std::result::Result<Vec<ReportAction>, EventingFault> {
    let Some(filter) = filter else {
        return Ok(ReportAction::ALL.to_vec());
    };
    if let Some(dialect) = &filter.dialect {
        if dialect != DPWS_FILTER_DIALECT_ACTION {
            return Err(EventingFault::FilteringNotSupported(dialect.clone()));
        }
    }
    let mut actions = Vec::with_capacity(filter.actions.len());
    for uri in &filter.actions {
        let action = ReportAction::from_uri(uri)
            .ok_or_else(|| EventingFault::FilteringRequestedUnavailable(uri.clone()))?;
        if !actions.contains(&action) {
            actions.push(action);
        }
    }
    Ok(actions)
}
