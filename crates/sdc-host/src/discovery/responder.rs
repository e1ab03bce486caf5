// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datagram dispatch and discovery message construction.
//!
//! No I/O happens here: the reactor feeds raw datagrams in and sends whatever
//! envelope comes back. Keeping the socket out makes every WS-Discovery rule
//! testable without a network.

use tracing::{debug, info, trace, warn};

use crate::constants::{
    WS_ACTION_BYE, WS_ACTION_HELLO, WS_ACTION_PROBE_MATCHES, WS_ACTION_RESOLVE_MATCHES,
    WS_ADDRESSING_ANONYMOUS, WS_DISCOVERY_URN,
};
use crate::error::CodecError;
use crate::messaging::{new_message_id, MessagingContext};
use crate::soap::{
    self, Body, Bye, DiscoveryMatch, EndpointReference, Envelope, Header, Probe, QName,
};

/// What this device announces about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryIdentity {
    pub endpoint_reference: String,
    pub types: Vec<QName>,
    pub scopes: Vec<String>,
    pub xaddrs: Vec<String>,
    pub metadata_version: u32,
}

impl DiscoveryIdentity {
    pub fn new(endpoint_reference: impl Into<String>) -> Self {
        Self {
            endpoint_reference: endpoint_reference.into(),
            types: Vec::new(),
            scopes: Vec::new(),
            xaddrs: Vec::new(),
            metadata_version: 1,
        }
    }

    fn as_match(&self) -> DiscoveryMatch {
        DiscoveryMatch {
            endpoint_reference: EndpointReference::new(self.endpoint_reference.clone()),
            types: self.types.clone(),
            scopes: self.scopes.clone(),
            xaddrs: self.xaddrs.clone(),
            metadata_version: self.metadata_version,
        }
    }

    /// A probe matches when each requested type and scope is one of ours.
    pub fn matches(&self, probe: &Probe) -> bool {
        probe.types.iter().all(|t| self.types.contains(t))
            && probe
                .scopes
                .iter()
                .all(|requested| self.scopes.iter().any(|s| scope_matches(s, requested)))
    }
}

/// RFC 3986 style prefix match on whole path segments.
fn scope_matches(ours: &str, requested: &str) -> bool {
    let ours = ours.trim_end_matches('/');
    let requested = requested.trim_end_matches('/');
    if ours == requested {
        return true;
    }
    ours.strip_prefix(requested)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Discovery protocol state of one host: identity plus sequence numbering.
#[derive(Debug)]
pub struct Responder {
    identity: DiscoveryIdentity,
    context: MessagingContext,
}

impl Responder {
    pub fn new(identity: DiscoveryIdentity) -> Self {
        Self {
            identity,
            context: MessagingContext::new(),
        }
    }

    pub fn identity(&self) -> &DiscoveryIdentity {
        &self.identity
    }

    pub fn context(&self) -> &MessagingContext {
        &self.context
    }

    pub fn set_metadata_version(&mut self, version: u32) {
        self.identity.metadata_version = version;
    }

    /// Begin a new run; called once per host start.
    pub fn reset_instance(&mut self) {
        self.context.reset_instance_id();
        debug!(
            "[discovery] instance id {} for {}",
            self.context.instance_id(),
            self.identity.endpoint_reference
        );
    }

    pub fn hello(&mut self) -> Envelope {
        let body = Body::Hello(self.identity.as_match());
        self.announcement(WS_ACTION_HELLO, body)
    }

    pub fn bye(&mut self) -> Envelope {
        let body = Body::Bye(Bye {
            endpoint_reference: EndpointReference::new(self.identity.endpoint_reference.clone()),
        });
        self.announcement(WS_ACTION_BYE, body)
    }

    fn announcement(&mut self, action: &str, body: Body) -> Envelope {
        Envelope {
            header: Header {
                action: Some(action.to_string()),
                message_id: Some(new_message_id()),
                to: Some(WS_DISCOVERY_URN.to_string()),
                app_sequence: Some(self.context.next_app_sequence()),
                ..Header::default()
            },
            body,
        }
    }

    fn reply(&mut self, request: &Header, action: &str, body: Body) -> Envelope {
        let to = request
            .reply_to
            .as_ref()
            .map(|epr| epr.address.clone())
            .unwrap_or_else(|| WS_ADDRESSING_ANONYMOUS.to_string());
        Envelope {
            header: Header {
                action: Some(action.to_string()),
                message_id: Some(new_message_id()),
                to: Some(to),
                relates_to: request.message_id.clone(),
                app_sequence: Some(self.context.next_app_sequence()),
                ..Header::default()
            },
            body,
        }
    }

    /// Decode a datagram and build the reply, if any.
    pub fn handle_datagram(&mut self, bytes: &[u8]) -> Result<Option<Envelope>, CodecError> {
        let envelope = soap::parse_datagram(bytes)?;
        Ok(self.handle(envelope))
    }

    pub fn handle(&mut self, envelope: Envelope) -> Option<Envelope> {
        let Envelope { header, body } = envelope;
        match body {
            Body::Probe(probe) => {
                if !self.identity.matches(&probe) {
                    trace!("[discovery] probe does not match, ignored");
                    return None;
                }
                let body = Body::ProbeMatches(vec![self.identity.as_match()]);
                Some(self.reply(&header, WS_ACTION_PROBE_MATCHES, body))
            }
            Body::Resolve(resolve) => {
                if resolve.endpoint_reference.address != self.identity.endpoint_reference {
                    trace!(
                        "[discovery] resolve for {} ignored",
                        resolve.endpoint_reference.address
                    );
                    return None;
                }
                let body = Body::ResolveMatches(vec![self.identity.as_match()]);
                Some(self.reply(&header, WS_ACTION_RESOLVE_MATCHES, body))
            }
            Body::Hello(hello) => {
                info!(
                    "[discovery] hello from {} (metadata version {})",
                    hello.endpoint_reference.address, hello.metadata_version
                );
                None
            }
            Body::Bye(bye) => {
                info!("[discovery] bye from {}", bye.endpoint_reference.address);
                None
            }
            Body::ProbeMatches(matches) | Body::ResolveMatches(matches) => {
                for m in &matches {
                    debug!(
                        "[discovery] match {} at {:?}",
                        m.endpoint_reference.address, m.xaddrs
                    );
                }
                None
            }
            other => {
                warn!(
                    "[discovery] unhandled message {} (action {:?})",
                    other.kind(),
                    header.action
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NS_DPWS, NS_MDPWS, WS_ACTION_PROBE, WS_ACTION_RESOLVE};
    use crate::soap::{serialize, Resolve};

    fn identity() -> DiscoveryIdentity {
        DiscoveryIdentity {
            endpoint_reference: "urn:uuid:pump-1".into(),
            types: vec![QName::new(NS_DPWS, "Device"), QName::new(NS_MDPWS, "MedicalDevice")],
            scopes: vec!["sdc.ctxt.loc:/sdc.ctxt.loc.detail/ICU%2F%2F%2F3".into()],
            xaddrs: vec!["http://192.168.0.10:8080/pump".into()],
            metadata_version: 3,
        }
    }

    fn running() -> Responder {
        let mut responder = Responder::new(identity());
        responder.reset_instance();
        responder
    }

    fn probe(types: Vec<QName>, scopes: Vec<String>) -> Envelope {
        let mut env = Envelope::new(WS_ACTION_PROBE, Body::Probe(Probe { types, scopes }));
        env.header.message_id = Some("urn:uuid:probe-1".into());
        env.header.reply_to = Some(EndpointReference::new("http://consumer/reply"));
        env
    }

    #[test]
    fn test_probe_reply_addressing() {
        let mut responder = running();
        let reply = responder
            .handle(probe(vec![], vec![]))
            .expect("empty probe matches");

        assert_eq!(reply.header.action.as_deref(), Some(WS_ACTION_PROBE_MATCHES));
        assert_eq!(reply.header.to.as_deref(), Some("http://consumer/reply"));
        assert_eq!(reply.header.relates_to.as_deref(), Some("urn:uuid:probe-1"));
        match reply.body {
            Body::ProbeMatches(matches) => {
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].endpoint_reference.address, "urn:uuid:pump-1");
                assert_eq!(matches[0].metadata_version, 3);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_probe_without_reply_to_uses_anonymous() {
        let mut responder = running();
        let mut request = probe(vec![], vec![]);
        request.header.reply_to = None;
        let reply = responder.handle(request).expect("reply");
        assert_eq!(reply.header.to.as_deref(), Some(WS_ADDRESSING_ANONYMOUS));
    }

    #[test]
    fn test_probe_type_filtering() {
        let mut responder = running();
        let ours = responder.handle(probe(vec![QName::new(NS_MDPWS, "MedicalDevice")], vec![]));
        assert!(ours.is_some());

        let foreign = responder.handle(probe(vec![QName::new("urn:other", "Printer")], vec![]));
        assert!(foreign.is_none());
    }

    #[test]
    fn test_probe_scope_filtering() {
        let mut responder = running();
        assert!(responder
            .handle(probe(vec![], vec!["sdc.ctxt.loc:/sdc.ctxt.loc.detail".into()]))
            .is_some());
        assert!(responder
            .handle(probe(vec![], vec!["sdc.ctxt.loc:/sdc.ctxt.loc.det".into()]))
            .is_none());
    }

    #[test]
    fn test_resolve_matching_and_mismatch() {
        let mut responder = running();
        let resolve = |address: &str| {
            let mut env = Envelope::new(
                WS_ACTION_RESOLVE,
                Body::Resolve(Resolve {
                    endpoint_reference: EndpointReference::new(address),
                }),
            );
            env.header.message_id = Some("urn:uuid:resolve-1".into());
            env
        };

        assert!(responder.handle(resolve("urn:uuid:someone-else")).is_none());

        let reply = responder.handle(resolve("urn:uuid:pump-1")).expect("reply");
        assert_eq!(reply.header.action.as_deref(), Some(WS_ACTION_RESOLVE_MATCHES));
        assert_eq!(reply.header.relates_to.as_deref(), Some("urn:uuid:resolve-1"));
        assert!(matches!(reply.body, Body::ResolveMatches(ref m) if m.len() == 1));
    }

    #[test]
    fn test_sequence_numbers_across_messages() {
        let mut responder = running();
        let hello = responder.hello();
        let reply = responder.handle(probe(vec![], vec![])).expect("reply");
        let bye = responder.bye();

        let seqs: Vec<_> = [hello, reply, bye]
            .iter()
            .map(|e| e.header.app_sequence.expect("sequence"))
            .collect();
        assert!(seqs.iter().all(|s| s.instance_id == seqs[0].instance_id));
        assert_eq!(
            seqs.iter().map(|s| s.message_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_hello_targets_discovery_urn() {
        let mut responder = running();
        let hello = responder.hello();
        assert_eq!(hello.header.to.as_deref(), Some(WS_DISCOVERY_URN));
        assert!(hello.header.relates_to.is_none());
    }

    #[test]
    fn test_malformed_datagrams_are_errors() {
        let mut responder = running();
        assert!(responder.handle_datagram(b"").is_err());
        assert!(responder.handle_datagram(b"<not-soap/>").is_err());
        assert!(responder.handle_datagram(&[0xff, 0xfe, 0x00]).is_err());
        assert!(responder.handle_datagram(&vec![b' '; 5000]).is_err());
    }

    #[test]
    fn test_datagram_round_trip() {
        let mut responder = running();
        let wire = serialize(&probe(vec![QName::new(NS_DPWS, "Device")], vec![]));
        let reply = responder
            .handle_datagram(wire.as_bytes())
            .expect("parse")
            .expect("reply");
        assert!(matches!(reply.body, Body::ProbeMatches(_)));
    }

    #[test]
    fn test_incoming_hello_and_bye_are_not_answered() {
        let mut other = Responder::new(DiscoveryIdentity::new("urn:uuid:other"));
        other.reset_instance();
        let mut responder = running();
        assert!(responder.handle(other.hello()).is_none());
        assert!(responder.handle(other.bye()).is_none());
    }

    #[test]
    fn test_metadata_version_bump() {
        let mut responder = running();
        responder.set_metadata_version(9);
        match responder.hello().body {
            Body::Hello(m) => assert_eq!(m.metadata_version, 9),
            other => panic!("unexpected body {other:?}"),
        }
    }
}
