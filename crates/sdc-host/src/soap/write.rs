// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Envelope serialization.
//!
//! Produces compact SOAP 1.2 XML with fixed prefixes declared once on the
//! `Envelope` element. Text and attribute content is always escaped; the
//! only verbatim content is a [`Body::Notification`] payload, which is
//! produced by the report serializer.

use std::fmt::Write;

use super::envelope::*;
use crate::constants::{
    NS_ADDRESSING, NS_DISCOVERY, NS_DPWS, NS_EVENTING, NS_MDPWS, NS_SOAP_ENVELOPE,
};

const KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("s12", NS_SOAP_ENVELOPE),
    ("wsa", NS_ADDRESSING),
    ("wsd", NS_DISCOVERY),
    ("wse", NS_EVENTING),
    ("dpws", NS_DPWS),
    ("mdpws", NS_MDPWS),
];

/// Serialize an envelope to XML text.
pub fn serialize(envelope: &Envelope) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str("<s12:Envelope");
    for (prefix, ns) in KNOWN_PREFIXES {
        let _ = write!(out, r#" xmlns:{}="{}""#, prefix, ns);
    }
    out.push('>');
    write_header(&mut out, &envelope.header);
    out.push_str("<s12:Body>");
    write_body(&mut out, &envelope.body);
    out.push_str("</s12:Body></s12:Envelope>");
    out
}

/// Escape text for element content or a double-quoted attribute value.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn element(out: &mut String, name: &str, content: &str) {
    let _ = write!(out, "<{name}>{}</{name}>", escape(content));
}

fn write_list(out: &mut String, name: &str, items: &[String]) {
    if !items.is_empty() {
        element(out, name, &items.join(" "));
    }
}

fn write_endpoint_reference(out: &mut String, name: &str, epr: &EndpointReference) {
    let _ = write!(out, "<{}>", name);
    element(out, "wsa:Address", &epr.address);
    if let Some(id) = &epr.identifier {
        out.push_str("<wsa:ReferenceParameters>");
        element(out, "wse:Identifier", id);
        out.push_str("</wsa:ReferenceParameters>");
    }
    let _ = write!(out, "</{}>", name);
}

fn write_header(out: &mut String, header: &Header) {
    out.push_str("<s12:Header>");
    if let Some(action) = &header.action {
        element(out, "wsa:Action", action);
    }
    if let Some(id) = &header.message_id {
        element(out, "wsa:MessageID", id);
    }
    if let Some(to) = &header.to {
        element(out, "wsa:To", to);
    }
    if let Some(reply_to) = &header.reply_to {
        write_endpoint_reference(out, "wsa:ReplyTo", reply_to);
    }
    if let Some(relates_to) = &header.relates_to {
        element(out, "wsa:RelatesTo", relates_to);
    }
    if let Some(seq) = header.app_sequence {
        let _ = write!(
            out,
            r#"<wsd:AppSequence InstanceId="{}" MessageNumber="{}"/>"#,
            seq.instance_id, seq.message_number
        );
    }
    if let Some(id) = &header.identifier {
        element(out, "wse:Identifier", id);
    }
    out.push_str("</s12:Header>");
}

/// Write `wsd:Types`, declaring ad-hoc prefixes for unknown namespaces.
fn write_types(out: &mut String, types: &[QName]) {
    if types.is_empty() {
        return;
    }
    let mut extra: Vec<&str> = Vec::new();
    let mut names = Vec::with_capacity(types.len());
    for qname in types {
        let prefix = match KNOWN_PREFIXES.iter().find(|(_, ns)| *ns == qname.namespace) {
            Some((prefix, _)) => (*prefix).to_string(),
            None => {
                let idx = match extra.iter().position(|ns| *ns == qname.namespace) {
                    Some(idx) => idx,
                    None => {
                        extra.push(&qname.namespace);
                        extra.len() - 1
                    }
                };
                format!("ns{}", idx)
            }
        };
        names.push(format!("{}:{}", prefix, qname.local));
    }
    out.push_str("<wsd:Types");
    for (idx, ns) in extra.iter().enumerate() {
        let _ = write!(out, r#" xmlns:ns{}="{}""#, idx, escape(ns));
    }
    let _ = write!(out, ">{}</wsd:Types>", escape(&names.join(" ")));
}

fn write_discovery_match(out: &mut String, name: &str, m: &DiscoveryMatch) {
    let _ = write!(out, "<{}>", name);
    write_endpoint_reference(out, "wsa:EndpointReference", &m.endpoint_reference);
    write_types(out, &m.types);
    write_list(out, "wsd:Scopes", &m.scopes);
    write_list(out, "wsd:XAddrs", &m.xaddrs);
    element(out, "wsd:MetadataVersion", &m.metadata_version.to_string());
    let _ = write!(out, "</{}>", name);
}

fn write_body(out: &mut String, body: &Body) {
    match body {
        Body::Hello(m) => write_discovery_match(out, "wsd:Hello", m),
        Body::Bye(bye) => {
            out.push_str("<wsd:Bye>");
            write_endpoint_reference(out, "wsa:EndpointReference", &bye.endpoint_reference);
            out.push_str("</wsd:Bye>");
        }
        Body::Probe(probe) => {
            out.push_str("<wsd:Probe>");
            write_types(out, &probe.types);
            write_list(out, "wsd:Scopes", &probe.scopes);
            out.push_str("</wsd:Probe>");
        }
        Body::ProbeMatches(matches) => {
            out.push_str("<wsd:ProbeMatches>");
            for m in matches {
                write_discovery_match(out, "wsd:ProbeMatch", m);
            }
            out.push_str("</wsd:ProbeMatches>");
        }
        Body::Resolve(resolve) => {
            out.push_str("<wsd:Resolve>");
            write_endpoint_reference(out, "wsa:EndpointReference", &resolve.endpoint_reference);
            out.push_str("</wsd:Resolve>");
        }
        Body::ResolveMatches(matches) => {
            out.push_str("<wsd:ResolveMatches>");
            for m in matches {
                write_discovery_match(out, "wsd:ResolveMatch", m);
            }
            out.push_str("</wsd:ResolveMatches>");
        }
        Body::Subscribe(sub) => {
            out.push_str("<wse:Subscribe>");
            if let Some(end_to) = &sub.end_to {
                write_endpoint_reference(out, "wse:EndTo", end_to);
            }
            match &sub.delivery.mode {
                Some(mode) => {
                    let _ = write!(out, r#"<wse:Delivery Mode="{}">"#, escape(mode));
                }
                None => out.push_str("<wse:Delivery>"),
            }
            write_endpoint_reference(out, "wse:NotifyTo", &sub.delivery.notify_to);
            out.push_str("</wse:Delivery>");
            if let Some(expires) = &sub.expires {
                element(out, "wse:Expires", expires);
            }
            if let Some(filter) = &sub.filter {
                match &filter.dialect {
                    Some(dialect) => {
                        let _ = write!(out, r#"<wse:Filter Dialect="{}">"#, escape(dialect));
                    }
                    None => out.push_str("<wse:Filter>"),
                }
                out.push_str(&escape(&filter.actions.join(" ")));
                out.push_str("</wse:Filter>");
            }
            out.push_str("</wse:Subscribe>");
        }
        Body::SubscribeResponse(resp) => {
            out.push_str("<wse:SubscribeResponse>");
            write_endpoint_reference(out, "wse:SubscriptionManager", &resp.subscription_manager);
            element(out, "wse:Expires", &resp.expires);
            out.push_str("</wse:SubscribeResponse>");
        }
        Body::Renew(renew) => {
            out.push_str("<wse:Renew>");
            if let Some(expires) = &renew.expires {
                element(out, "wse:Expires", expires);
            }
            out.push_str("</wse:Renew>");
        }
        Body::RenewResponse(resp) => {
            out.push_str("<wse:RenewResponse>");
            element(out, "wse:Expires", &resp.expires);
            out.push_str("</wse:RenewResponse>");
        }
        Body::Unsubscribe => out.push_str("<wse:Unsubscribe/>"),
        Body::UnsubscribeResponse => out.push_str("<wse:UnsubscribeResponse/>"),
        Body::GetStatus => out.push_str("<wse:GetStatus/>"),
        Body::GetStatusResponse(resp) => {
            out.push_str("<wse:GetStatusResponse>");
            element(out, "wse:Expires", &resp.expires);
            out.push_str("</wse:GetStatusResponse>");
        }
        Body::SubscriptionEnd(end) => {
            out.push_str("<wse:SubscriptionEnd>");
            write_endpoint_reference(out, "wse:SubscriptionManager", &end.subscription_manager);
            element(out, "wse:Status", &end.status);
            if let Some(reason) = &end.reason {
                let _ = write!(
                    out,
                    r#"<wse:Reason xml:lang="en">{}</wse:Reason>"#,
                    escape(reason)
                );
            }
            out.push_str("</wse:SubscriptionEnd>");
        }
        Body::Notification(payload) => out.push_str(payload),
        Body::Fault(fault) => {
            out.push_str("<s12:Fault><s12:Code>");
            element(out, "s12:Value", &format!("s12:{}", fault.code.local_name()));
            if let Some(subcode) = &fault.subcode {
                let _ = write!(
                    out,
                    r#"<s12:Subcode><s12:Value xmlns:fc="{}">fc:{}</s12:Value></s12:Subcode>"#,
                    escape(&subcode.namespace),
                    escape(&subcode.local)
                );
            }
            let _ = write!(
                out,
                r#"</s12:Code><s12:Reason><s12:Text xml:lang="en">{}</s12:Text></s12:Reason></s12:Fault>"#,
                escape(&fault.reason)
            );
        }
        Body::Empty => {}
        Body::Unknown(qname) => {
            let _ = write!(
                out,
                r#"<u:{} xmlns:u="{}"/>"#,
                escape(&qname.local),
                escape(&qname.namespace)
            );
        }
    }
}
