// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Envelope decoding on top of `roxmltree`.
//!
//! Decoding never panics on untrusted input: every failure is reported as a
//! [`CodecError`], with structurally required elements reported as
//! [`CodecError::MissingElement`]. DTDs are rejected by `roxmltree`'s default
//! parsing options.

use roxmltree::{Document, Node};

use super::envelope::*;
use crate::constants::{
    MAX_ENVELOPE_SIZE, NS_ADDRESSING, NS_DISCOVERY, NS_EVENTING, NS_SOAP_ENVELOPE,
};
use crate::error::CodecError;

/// Decode a UDP datagram, enforcing the discovery envelope size limit.
pub fn parse_datagram(bytes: &[u8]) -> Result<Envelope, CodecError> {
    if bytes.len() > MAX_ENVELOPE_SIZE {
        return Err(CodecError::TooLarge {
            len: bytes.len(),
            limit: MAX_ENVELOPE_SIZE,
        });
    }
    parse_bytes(bytes)
}

/// Decode an envelope of arbitrary size (HTTP request bodies).
pub fn parse_bytes(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let text = std::str::from_utf8(bytes)?;
    parse(text)
}

/// Decode an envelope from text.
pub fn parse(text: &str) -> Result<Envelope, CodecError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if !is(root, NS_SOAP_ENVELOPE, "Envelope") {
        return Err(CodecError::missing(NS_SOAP_ENVELOPE, "Envelope"));
    }

    let header = match child(root, NS_SOAP_ENVELOPE, "Header") {
        Some(node) => parse_header(node)?,
        None => Header::default(),
    };
    let body_node = required(root, NS_SOAP_ENVELOPE, "Body")?;
    let body = parse_body(body_node)?;

    Ok(Envelope { header, body })
}

// ============================================================================
// Helpers
// ============================================================================

fn is(node: Node, namespace: &str, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(namespace)
}

fn child<'a, 'input>(
    node: Node<'a, 'input>,
    namespace: &str,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is(*n, namespace, name))
}

fn required<'a, 'input>(
    node: Node<'a, 'input>,
    namespace: &'static str,
    name: &'static str,
) -> Result<Node<'a, 'input>, CodecError> {
    child(node, namespace, name).ok_or(CodecError::missing(namespace, name))
}

fn text(node: Node) -> String {
    node.text().map(str::trim).unwrap_or_default().to_string()
}

fn list(node: Node) -> Vec<String> {
    node.text()
        .map(|t| t.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Resolve `prefix:local` against the namespaces in scope at `node`.
fn resolve_qname(node: Node, raw: &str, element: &'static str) -> Result<QName, CodecError> {
    let (prefix, local) = match raw.split_once(':') {
        Some((p, l)) => (Some(p), l),
        None => (None, raw),
    };
    let namespace = node
        .lookup_namespace_uri(prefix)
        .ok_or_else(|| CodecError::InvalidContent {
            element,
            message: format!("unbound prefix in '{}'", raw),
        })?;
    Ok(QName::new(namespace, local))
}

fn qname_list(node: Node, element: &'static str) -> Result<Vec<QName>, CodecError> {
    list(node)
        .iter()
        .map(|raw| resolve_qname(node, raw, element))
        .collect()
}

fn parse_u64_attr(node: Node, attr: &'static str) -> Result<u64, CodecError> {
    let raw = node
        .attribute(attr)
        .ok_or(CodecError::missing(NS_DISCOVERY, attr))?;
    raw.trim()
        .parse()
        .map_err(|_| CodecError::InvalidContent {
            element: "AppSequence",
            message: format!("attribute {}='{}' is not an unsigned integer", attr, raw),
        })
}

// ============================================================================
// Header
// ============================================================================

fn parse_endpoint_reference(node: Node) -> Result<EndpointReference, CodecError> {
    let address = text(required(node, NS_ADDRESSING, "Address")?);
    let identifier = child(node, NS_ADDRESSING, "ReferenceParameters")
        .and_then(|params| child(params, NS_EVENTING, "Identifier"))
        .map(text);
    Ok(EndpointReference {
        address,
        identifier,
    })
}

fn parse_header(node: Node) -> Result<Header, CodecError> {
    let mut header = Header::default();
    for block in node.children().filter(Node::is_element) {
        let ns = block.tag_name().namespace();
        match (ns, block.tag_name().name()) {
            (Some(NS_ADDRESSING), "Action") => header.action = Some(text(block)),
            (Some(NS_ADDRESSING), "MessageID") => header.message_id = Some(text(block)),
            (Some(NS_ADDRESSING), "To") => header.to = Some(text(block)),
            (Some(NS_ADDRESSING), "RelatesTo") => header.relates_to = Some(text(block)),
            (Some(NS_ADDRESSING), "ReplyTo") => {
                header.reply_to = Some(parse_endpoint_reference(block)?)
            }
            (Some(NS_DISCOVERY), "AppSequence") => {
                header.app_sequence = Some(AppSequence {
                    instance_id: parse_u64_attr(block, "InstanceId")?,
                    message_number: parse_u64_attr(block, "MessageNumber")?,
                })
            }
            (Some(NS_EVENTING), "Identifier") => header.identifier = Some(text(block)),
            _ => {}
        }
    }
    Ok(header)
}

// ============================================================================
// Body
// ============================================================================

fn parse_body(node: Node) -> Result<Body, CodecError> {
    let Some(content) = node.children().find(Node::is_element) else {
        return Ok(Body::Empty);
    };

    let ns = content.tag_name().namespace();
    let body = match (ns, content.tag_name().name()) {
        (Some(NS_DISCOVERY), "Hello") => Body::Hello(parse_discovery_match(content)?),
        (Some(NS_DISCOVERY), "Bye") => Body::Bye(Bye {
            endpoint_reference: parse_endpoint_reference(required(
                content,
                NS_ADDRESSING,
                "EndpointReference",
            )?)?,
        }),
        (Some(NS_DISCOVERY), "Probe") => Body::Probe(Probe {
            types: match child(content, NS_DISCOVERY, "Types") {
                Some(t) => qname_list(t, "Types")?,
                None => Vec::new(),
            },
            scopes: child(content, NS_DISCOVERY, "Scopes")
                .map(list)
                .unwrap_or_default(),
        }),
        (Some(NS_DISCOVERY), "ProbeMatches") => Body::ProbeMatches(
            content
                .children()
                .filter(|n| is(*n, NS_DISCOVERY, "ProbeMatch"))
                .map(parse_discovery_match)
                .collect::<Result<_, _>>()?,
        ),
        (Some(NS_DISCOVERY), "Resolve") => Body::Resolve(Resolve {
            endpoint_reference: parse_endpoint_reference(required(
                content,
                NS_ADDRESSING,
                "EndpointReference",
            )?)?,
        }),
        (Some(NS_DISCOVERY), "ResolveMatches") => Body::ResolveMatches(
            content
                .children()
                .filter(|n| is(*n, NS_DISCOVERY, "ResolveMatch"))
                .map(parse_discovery_match)
                .collect::<Result<_, _>>()?,
        ),
        (Some(NS_EVENTING), "Subscribe") => Body::Subscribe(parse_subscribe(content)?),
        (Some(NS_EVENTING), "SubscribeResponse") => {
            Body::SubscribeResponse(SubscribeResponse {
                subscription_manager: parse_endpoint_reference(required(
                    content,
                    NS_EVENTING,
                    "SubscriptionManager",
                )?)?,
                expires: text(required(content, NS_EVENTING, "Expires")?),
            })
        }
        (Some(NS_EVENTING), "Renew") => Body::Renew(Renew {
            expires: child(content, NS_EVENTING, "Expires").map(text),
        }),
        (Some(NS_EVENTING), "RenewResponse") => Body::RenewResponse(RenewResponse {
            expires: text(required(content, NS_EVENTING, "Expires")?),
        }),
        (Some(NS_EVENTING), "Unsubscribe") => Body::Unsubscribe,
        (Some(NS_EVENTING), "UnsubscribeResponse") => Body::UnsubscribeResponse,
        (Some(NS_EVENTING), "GetStatus") => Body::GetStatus,
        (Some(NS_EVENTING), "GetStatusResponse") => {
            Body::GetStatusResponse(GetStatusResponse {
                expires: text(required(content, NS_EVENTING, "Expires")?),
            })
        }
        (Some(NS_EVENTING), "SubscriptionEnd") => Body::SubscriptionEnd(SubscriptionEnd {
            subscription_manager: parse_endpoint_reference(required(
                content,
                NS_EVENTING,
                "SubscriptionManager",
            )?)?,
            status: text(required(content, NS_EVENTING, "Status")?),
            reason: child(content, NS_EVENTING, "Reason").map(text),
        }),
        (Some(NS_SOAP_ENVELOPE), "Fault") => Body::Fault(parse_fault(content)?),
        (namespace, local) => Body::Unknown(QName::new(namespace.unwrap_or_default(), local)),
    };
    Ok(body)
}

fn parse_discovery_match(node: Node) -> Result<DiscoveryMatch, CodecError> {
    let endpoint_reference =
        parse_endpoint_reference(required(node, NS_ADDRESSING, "EndpointReference")?)?;
    let types = match child(node, NS_DISCOVERY, "Types") {
        Some(t) => qname_list(t, "Types")?,
        None => Vec::new(),
    };
    let scopes = child(node, NS_DISCOVERY, "Scopes")
        .map(list)
        .unwrap_or_default();
    let xaddrs = child(node, NS_DISCOVERY, "XAddrs")
        .map(list)
        .unwrap_or_default();
    let raw_version = text(required(node, NS_DISCOVERY, "MetadataVersion")?);
    let metadata_version = raw_version
        .parse()
        .map_err(|_| CodecError::InvalidContent {
            element: "MetadataVersion",
            message: format!("'{}' is not an unsigned integer", raw_version),
        })?;

    Ok(DiscoveryMatch {
        endpoint_reference,
        types,
        scopes,
        xaddrs,
        metadata_version,
    })
}

fn parse_subscribe(node: Node) -> Result<Subscribe, CodecError> {
    let delivery_node = required(node, NS_EVENTING, "Delivery")?;
    let delivery = Delivery {
        mode: delivery_node.attribute("Mode").map(str::to_string),
        notify_to: parse_endpoint_reference(required(delivery_node, NS_EVENTING, "NotifyTo")?)?,
    };
    let end_to = child(node, NS_EVENTING, "EndTo")
        .map(parse_endpoint_reference)
        .transpose()?;
    let filter = child(node, NS_EVENTING, "Filter").map(|f| Filter {
        dialect: f.attribute("Dialect").map(str::to_string),
        actions: list(f),
    });

    Ok(Subscribe {
        end_to,
        delivery,
        expires: child(node, NS_EVENTING, "Expires").map(text),
        filter,
    })
}

fn parse_fault(node: Node) -> Result<Fault, CodecError> {
    let code_node = required(node, NS_SOAP_ENVELOPE, "Code")?;
    let code = match text(required(code_node, NS_SOAP_ENVELOPE, "Value")?).as_str() {
        v if v.ends_with("Receiver") => FaultCode::Receiver,
        _ => FaultCode::Sender,
    };
    let subcode = child(code_node, NS_SOAP_ENVELOPE, "Subcode")
        .and_then(|s| child(s, NS_SOAP_ENVELOPE, "Value"))
        .map(|v| resolve_qname(v, &text(v), "Subcode"))
        .transpose()?;
    let reason_node = required(node, NS_SOAP_ENVELOPE, "Reason")?;
    let reason = text(required(reason_node, NS_SOAP_ENVELOPE, "Text")?);

    Ok(Fault {
        code,
        subcode,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<s12:Envelope xmlns:s12="http://www.w3.org/2003/05/soap-envelope"
    xmlns:wsa="http://www.w3.org/2005/08/addressing"
    xmlns:wsd="http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01"
    xmlns:dpws="http://docs.oasis-open.org/ws-dd/ns/dpws/2009/01">
  <s12:Header>
    <wsa:Action>http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/Probe</wsa:Action>
    <wsa:MessageID>urn:uuid:0a6dc791-2be6-4991-9af1-454778a1917a</wsa:MessageID>
    <wsa:ReplyTo><wsa:Address>soap.udp://192.168.1.20:3702</wsa:Address></wsa:ReplyTo>
    <wsa:To>urn:docs-oasis-open-org:ws-dd:ns:discovery:2009:01</wsa:To>
  </s12:Header>
  <s12:Body>
    <wsd:Probe><wsd:Types>dpws:Device</wsd:Types></wsd:Probe>
  </s12:Body>
</s12:Envelope>"#;

    #[test]
    fn test_parse_probe() {
        let env = parse(PROBE).expect("probe parses");
        assert_eq!(
            env.header.message_id.as_deref(),
            Some("urn:uuid:0a6dc791-2be6-4991-9af1-454778a1917a")
        );
        assert_eq!(
            env.header.reply_to.map(|r| r.address).as_deref(),
            Some("soap.udp://192.168.1.20:3702")
        );
        match env.body {
            Body::Probe(probe) => {
                assert_eq!(
                    probe.types,
                    vec![QName::new(crate::constants::NS_DPWS, "Device")]
                );
                assert!(probe.scopes.is_empty());
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_resolve_without_address_reports_missing_element() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:a="http://www.w3.org/2005/08/addressing"
            xmlns:d="http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01">
            <s:Body><d:Resolve><a:EndpointReference/></d:Resolve></s:Body></s:Envelope>"#;
        match parse(xml) {
            Err(CodecError::MissingElement { namespace, name }) => {
                assert_eq!(namespace, NS_ADDRESSING);
                assert_eq!(name, "Address");
            }
            other => panic!("expected missing element, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_body() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Header/></s:Envelope>"#;
        assert!(matches!(
            parse(xml),
            Err(CodecError::MissingElement { name: "Body", .. })
        ));
    }

    #[test]
    fn test_wrong_root_namespace() {
        let xml = r#"<Envelope><Body/></Envelope>"#;
        assert!(matches!(
            parse(xml),
            Err(CodecError::MissingElement {
                name: "Envelope",
                ..
            })
        ));
    }

    #[test]
    fn test_truncated_and_garbage_input() {
        assert!(matches!(
            parse_bytes(&PROBE.as_bytes()[..PROBE.len() / 2]),
            Err(CodecError::Xml(_))
        ));
        assert!(matches!(
            parse_bytes(&[0xff, 0xfe, 0x00]),
            Err(CodecError::Utf8(_))
        ));
        assert!(parse_bytes(b"").is_err());
    }

    #[test]
    fn test_oversized_datagram_rejected() {
        let big = vec![b' '; MAX_ENVELOPE_SIZE + 1];
        assert!(matches!(
            parse_datagram(&big),
            Err(CodecError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_doctype_rejected() {
        let xml = r#"<!DOCTYPE x [<!ENTITY e "boom">]><s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body/></s:Envelope>"#;
        assert!(parse(xml).is_err());
    }

    #[test]
    fn test_parse_subscribe() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:a="http://www.w3.org/2005/08/addressing"
            xmlns:e="http://schemas.xmlsoap.org/ws/2004/08/eventing">
          <s:Header><a:Action>http://schemas.xmlsoap.org/ws/2004/08/eventing/Subscribe</a:Action></s:Header>
          <s:Body><e:Subscribe>
            <e:Delivery Mode="http://schemas.xmlsoap.org/ws/2004/08/eventing/DeliveryModes/Push">
              <e:NotifyTo><a:Address>http://10.0.0.7:6464/events</a:Address></e:NotifyTo>
            </e:Delivery>
            <e:Expires>PT60S</e:Expires>
            <e:Filter Dialect="http://docs.oasis-open.org/ws-dd/ns/dpws/2009/01/Action">
              http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/EpisodicMetricReport
            </e:Filter>
          </e:Subscribe></s:Body></s:Envelope>"#;
        let env = parse(xml).expect("subscribe parses");
        let Body::Subscribe(sub) = env.body else {
            panic!("expected subscribe");
        };
        assert_eq!(sub.delivery.notify_to.address, "http://10.0.0.7:6464/events");
        assert_eq!(sub.expires.as_deref(), Some("PT60S"));
        let filter = sub.filter.expect("filter");
        assert_eq!(filter.actions.len(), 1);
        assert_eq!(filter.actions[0], crate::constants::ACTION_EPISODIC_METRIC_REPORT);
    }

    #[test]
    fn test_app_sequence_requires_numeric_attributes() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:d="http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01">
            <s:Header><d:AppSequence InstanceId="x" MessageNumber="1"/></s:Header>
            <s:Body/></s:Envelope>"#;
        assert!(matches!(
            parse(xml),
            Err(CodecError::InvalidContent { .. })
        ));

        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:d="http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01">
            <s:Header><d:AppSequence InstanceId="7"/></s:Header>
            <s:Body/></s:Envelope>"#;
        assert!(matches!(
            parse(xml),
            Err(CodecError::MissingElement {
                name: "MessageNumber",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_body() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
            <s:Body><x:Thing xmlns:x="urn:x"/></s:Body></s:Envelope>"#;
        let env = parse(xml).expect("parses");
        assert_eq!(env.body, Body::Unknown(QName::new("urn:x", "Thing")));
    }
}
