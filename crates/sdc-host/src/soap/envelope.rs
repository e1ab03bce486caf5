// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed SOAP envelope tree.
//!
//! Only the message shapes exchanged by an SDC provider are modelled. Every
//! field is plain owned data so envelopes can be moved between the reactor
//! thread, delivery tasks and tests without lifetimes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace-qualified XML name (used for discovery `Types`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local)
    }
}

/// WS-Addressing endpoint reference.
///
/// The only reference parameter understood is the WS-Eventing `Identifier`
/// carried by subscription manager references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointReference {
    pub address: String,
    pub identifier: Option<String>,
}

impl EndpointReference {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            identifier: None,
        }
    }

    pub fn with_identifier(address: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            identifier: Some(identifier.into()),
        }
    }
}

/// WS-Discovery `AppSequence` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSequence {
    pub instance_id: u64,
    pub message_number: u64,
}

/// SOAP header blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub action: Option<String>,
    pub message_id: Option<String>,
    pub to: Option<String>,
    pub reply_to: Option<EndpointReference>,
    pub relates_to: Option<String>,
    pub app_sequence: Option<AppSequence>,
    /// WS-Eventing subscription identifier echoed from the manager reference.
    pub identifier: Option<String>,
}

/// Discovery metadata shared by Hello, ProbeMatch and ResolveMatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMatch {
    pub endpoint_reference: EndpointReference,
    pub types: Vec<QName>,
    pub scopes: Vec<String>,
    pub xaddrs: Vec<String>,
    pub metadata_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bye {
    pub endpoint_reference: EndpointReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probe {
    pub types: Vec<QName>,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolve {
    pub endpoint_reference: EndpointReference,
}

/// WS-Eventing `Filter`; `actions` is the whitespace separated content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub dialect: Option<String>,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub mode: Option<String>,
    pub notify_to: EndpointReference,
}

/// WS-Eventing `Subscribe`. `expires` keeps the raw lexical value; its
/// validity is a protocol decision made by the subscription manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribe {
    pub end_to: Option<EndpointReference>,
    pub delivery: Delivery,
    pub expires: Option<String>,
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeResponse {
    pub subscription_manager: EndpointReference,
    pub expires: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renew {
    pub expires: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewResponse {
    pub expires: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetStatusResponse {
    pub expires: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionEnd {
    pub subscription_manager: EndpointReference,
    pub status: String,
    pub reason: Option<String>,
}

/// SOAP 1.2 fault code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    Sender,
    Receiver,
}

impl FaultCode {
    pub fn local_name(self) -> &'static str {
        match self {
            FaultCode::Sender => "Sender",
            FaultCode::Receiver => "Receiver",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: FaultCode,
    pub subcode: Option<QName>,
    pub reason: String,
}

/// SOAP body content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Body {
    Hello(DiscoveryMatch),
    Bye(Bye),
    Probe(Probe),
    ProbeMatches(Vec<DiscoveryMatch>),
    Resolve(Resolve),
    ResolveMatches(Vec<DiscoveryMatch>),
    Subscribe(Subscribe),
    SubscribeResponse(SubscribeResponse),
    Renew(Renew),
    RenewResponse(RenewResponse),
    Unsubscribe,
    UnsubscribeResponse,
    GetStatus,
    GetStatusResponse(GetStatusResponse),
    SubscriptionEnd(SubscriptionEnd),
    /// Event payload, already serialized XML inserted verbatim into the body.
    Notification(String),
    Fault(Fault),
    #[default]
    Empty,
    /// First body element of a message this crate does not model.
    Unknown(QName),
}

impl Body {
    /// Short variant name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Body::Hello(_) => "Hello",
            Body::Bye(_) => "Bye",
            Body::Probe(_) => "Probe",
            Body::ProbeMatches(_) => "ProbeMatches",
            Body::Resolve(_) => "Resolve",
            Body::ResolveMatches(_) => "ResolveMatches",
            Body::Subscribe(_) => "Subscribe",
            Body::SubscribeResponse(_) => "SubscribeResponse",
            Body::Renew(_) => "Renew",
            Body::RenewResponse(_) => "RenewResponse",
            Body::Unsubscribe => "Unsubscribe",
            Body::UnsubscribeResponse => "UnsubscribeResponse",
            Body::GetStatus => "GetStatus",
            Body::GetStatusResponse(_) => "GetStatusResponse",
            Body::SubscriptionEnd(_) => "SubscriptionEnd",
            Body::Notification(_) => "Notification",
            Body::Fault(_) => "Fault",
            Body::Empty => "Empty",
            Body::Unknown(_) => "Unknown",
        }
    }
}

/// SOAP 1.2 envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub header: Header,
    pub body: Body,
}

impl Envelope {
    pub fn new(action: impl Into<String>, body: Body) -> Self {
        Self {
            header: Header {
                action: Some(action.into()),
                ..Header::default()
            },
            body,
        }
    }
}
