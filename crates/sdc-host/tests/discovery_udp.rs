// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery host over real UDP sockets.
//!
//! Hosts bind an ephemeral loopback port; probes are sent unicast, which is
//! how a consumer with a directed probe or a discovery proxy reaches us.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use sdc_host::constants::{
    NS_DPWS, WS_ACTION_PROBE, WS_ACTION_PROBE_MATCHES, WS_ACTION_RESOLVE,
    WS_ACTION_RESOLVE_MATCHES,
};
use sdc_host::soap::{
    parse_bytes, serialize, AppSequence, Body, EndpointReference, Envelope, Probe, Resolve,
};
use sdc_host::{DeviceConfig, DiscoveryConfig, DiscoveryHost, DiscoveryIdentity, QName};

const EPR: &str = "urn:uuid:0b5a1c1e-5d3f-4f7e-9a55-2f4f3c1d9e01";

fn host() -> DiscoveryHost {
    let identity = DiscoveryIdentity {
        endpoint_reference: EPR.to_string(),
        types: vec![QName::new(NS_DPWS, "Device")],
        scopes: Vec::new(),
        xaddrs: vec!["http://127.0.0.1:8080/device".to_string()],
        metadata_version: 1,
    };
    let config = DiscoveryConfig {
        port: 0,
        bind_address: Ipv4Addr::LOCALHOST,
        ..Default::default()
    };
    DiscoveryHost::new(identity, config)
}

fn client() -> UdpSocket {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind client");
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .expect("read timeout");
    socket
}

fn probe(message_id: &str) -> Envelope {
    let mut envelope = Envelope::new(WS_ACTION_PROBE, Body::Probe(Probe::default()));
    envelope.header.message_id = Some(message_id.to_string());
    envelope.header.reply_to = Some(EndpointReference::new("urn:example:consumer-reply"));
    envelope
}

fn resolve(address: &str) -> Envelope {
    let mut envelope = Envelope::new(
        WS_ACTION_RESOLVE,
        Body::Resolve(Resolve {
            endpoint_reference: EndpointReference::new(address),
        }),
    );
    envelope.header.message_id = Some("urn:uuid:resolve".to_string());
    envelope
}

fn exchange(socket: &UdpSocket, to: SocketAddr, request: &Envelope) -> Option<Envelope> {
    socket
        .send_to(serialize(request).as_bytes(), to)
        .expect("send");
    let mut buf = [0u8; 8192];
    match socket.recv_from(&mut buf) {
        Ok((len, from)) => {
            assert_eq!(from, to, "reply must come from the discovery socket");
            Some(parse_bytes(&buf[..len]).expect("reply parses"))
        }
        Err(_) => None,
    }
}

fn sequence(envelope: &Envelope) -> AppSequence {
    envelope.header.app_sequence.expect("AppSequence header")
}

#[test]
fn test_probe_round_trip() {
    let mut host = host();
    host.start().expect("start");
    let addr = host.local_addr().expect("bound");
    let client = client();

    let reply = exchange(&client, addr, &probe("urn:uuid:probe-1")).expect("ProbeMatches");
    assert_eq!(
        reply.header.action.as_deref(),
        Some(WS_ACTION_PROBE_MATCHES)
    );
    assert_eq!(
        reply.header.to.as_deref(),
        Some("urn:example:consumer-reply")
    );
    assert_eq!(reply.header.relates_to.as_deref(), Some("urn:uuid:probe-1"));
    match reply.body {
        Body::ProbeMatches(matches) => {
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].endpoint_reference.address, EPR);
            assert_eq!(matches[0].xaddrs, vec!["http://127.0.0.1:8080/device"]);
        }
        other => panic!("unexpected body {other:?}"),
    }

    // Exactly one reply.
    let mut buf = [0u8; 8192];
    assert!(client.recv_from(&mut buf).is_err());

    host.stop().expect("stop");
}

#[test]
fn test_default_identity_answers_plain_and_device_probes() {
    let config = DeviceConfig {
        endpoint_reference: Some(EPR.to_string()),
        discovery: DiscoveryConfig {
            port: 0,
            bind_address: Ipv4Addr::LOCALHOST,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut host = DiscoveryHost::new(config.identity(), config.discovery.clone());
    host.start().expect("start");
    let addr = host.local_addr().expect("bound");
    let client = client();

    let plain = probe("urn:uuid:plain");
    let mut device = probe("urn:uuid:device");
    if let Body::Probe(request) = &mut device.body {
        request.types = vec![QName::new(NS_DPWS, "Device")];
    }

    for request in [plain, device] {
        let reply = exchange(&client, addr, &request).expect("ProbeMatches");
        assert_eq!(
            reply.header.relates_to,
            request.header.message_id,
            "reply answers its own request"
        );
        match reply.body {
            Body::ProbeMatches(matches) => {
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].endpoint_reference.address, EPR);
            }
            other => panic!("unexpected body {other:?}"),
        }
        let mut buf = [0u8; 8192];
        assert!(client.recv_from(&mut buf).is_err(), "exactly one reply");
    }

    host.stop().expect("stop");
}

#[test]
fn test_resolve_only_answers_own_endpoint() {
    let mut host = host();
    host.start().expect("start");
    let addr = host.local_addr().expect("bound");
    let client = client();

    assert!(exchange(&client, addr, &resolve("urn:uuid:somebody-else")).is_none());

    let reply = exchange(&client, addr, &resolve(EPR)).expect("ResolveMatches");
    assert_eq!(
        reply.header.action.as_deref(),
        Some(WS_ACTION_RESOLVE_MATCHES)
    );
    assert_eq!(
        reply.header.to.as_deref(),
        Some(sdc_host::constants::WS_ADDRESSING_ANONYMOUS)
    );

    host.stop().expect("stop");
}

#[test]
fn test_sequence_is_monotonic_and_restart_changes_instance() {
    let mut host = host();
    host.start().expect("start");
    let client = client();

    let addr = host.local_addr().expect("bound");
    let first: Vec<AppSequence> = (0..5)
        .map(|i| {
            let reply = exchange(&client, addr, &probe(&format!("urn:uuid:p{i}"))).expect("reply");
            sequence(&reply)
        })
        .collect();
    assert!(first
        .windows(2)
        .all(|w| w[1].instance_id == w[0].instance_id
            && w[1].message_number == w[0].message_number + 1));

    host.stop().expect("stop");
    host.start().expect("restart");

    let addr = host.local_addr().expect("bound again");
    let after = sequence(&exchange(&client, addr, &probe("urn:uuid:after")).expect("reply"));
    assert!(after.instance_id > first[0].instance_id);
    // Hello took message number 1.
    assert_eq!(after.message_number, 2);

    host.stop().expect("stop");
}

#[test]
fn test_malformed_datagrams_are_dropped() {
    let mut host = host();
    host.start().expect("start");
    let addr = host.local_addr().expect("bound");
    let client = client();

    let oversized = format!(
        "{}{}",
        serialize(&probe("urn:uuid:big")),
        " ".repeat(5000)
    );
    let garbage: [&[u8]; 5] = [
        b"",
        b"\xff\xfe\xfd",
        b"<s12:Envelope xmlns:s12=\"http://www.w3.org/2003/05/soap-envelope\">",
        b"<Envelope><Body/></Envelope>",
        oversized.as_bytes(),
    ];
    for datagram in garbage {
        client.send_to(datagram, addr).expect("send");
    }
    let mut buf = [0u8; 8192];
    assert!(client.recv_from(&mut buf).is_err(), "no reply to garbage");

    // Still serving.
    assert!(exchange(&client, addr, &probe("urn:uuid:still-alive")).is_some());
    host.stop().expect("stop");
}
