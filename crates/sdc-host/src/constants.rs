// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol constants: namespaces, action URIs and well-known transport values.
//!
//! WS-Discovery values follow the OASIS 2009/01 standard as profiled by
//! DPWS 1.1 and MDPWS (IEEE 11073-20702). WS-Eventing values follow the
//! 2004/08 member submission used by DPWS.

use std::net::Ipv4Addr;

// ============================================================================
// Transport
// ============================================================================

/// WS-Discovery IPv4 multicast group.
pub const UDP_MULTICAST_DISCOVERY_IP_V4: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// WS-Discovery UDP port.
pub const UDP_MULTICAST_DISCOVERY_PORT: u16 = 3702;

/// Maximum size of a SOAP envelope carried over UDP (DPWS R0029).
pub const MAX_ENVELOPE_SIZE: usize = 4096;

// ============================================================================
// Namespaces
// ============================================================================

pub const NS_SOAP_ENVELOPE: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const NS_ADDRESSING: &str = "http://www.w3.org/2005/08/addressing";
pub const NS_DISCOVERY: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01";
pub const NS_EVENTING: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing";
pub const NS_DPWS: &str = "http://docs.oasis-open.org/ws-dd/ns/dpws/2009/01";
pub const NS_MDPWS: &str = "http://standards.ieee.org/downloads/11073/11073-20702-2016";

// ============================================================================
// WS-Addressing
// ============================================================================

/// Anonymous reply address.
pub const WS_ADDRESSING_ANONYMOUS: &str = "http://www.w3.org/2005/08/addressing/anonymous";

/// Fault action used for every SOAP fault this crate emits.
pub const WS_ADDRESSING_FAULT: &str = "http://www.w3.org/2005/08/addressing/soap/fault";

// ============================================================================
// WS-Discovery
// ============================================================================

/// `To` header of multicast Hello/Bye/Probe messages.
pub const WS_DISCOVERY_URN: &str = "urn:docs-oasis-open-org:ws-dd:ns:discovery:2009:01";

pub const WS_ACTION_HELLO: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/Hello";
pub const WS_ACTION_BYE: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/Bye";
pub const WS_ACTION_PROBE: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/Probe";
pub const WS_ACTION_PROBE_MATCHES: &str =
    "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/ProbeMatches";
pub const WS_ACTION_RESOLVE: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/Resolve";
pub const WS_ACTION_RESOLVE_MATCHES: &str =
    "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/ResolveMatches";

// ============================================================================
// WS-Eventing
// ============================================================================

pub const WS_EVENTING_SUBSCRIBE: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing/Subscribe";
pub const WS_EVENTING_SUBSCRIBE_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/SubscribeResponse";
pub const WS_EVENTING_RENEW: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing/Renew";
pub const WS_EVENTING_RENEW_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/RenewResponse";
pub const WS_EVENTING_UNSUBSCRIBE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/Unsubscribe";
pub const WS_EVENTING_UNSUBSCRIBE_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/UnsubscribeResponse";
pub const WS_EVENTING_GET_STATUS: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing/GetStatus";
pub const WS_EVENTING_GET_STATUS_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/GetStatusResponse";
pub const WS_EVENTING_SUBSCRIPTION_END: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/SubscriptionEnd";

/// Delivery mode for pushed notifications.
pub const WS_EVENTING_DELIVERY_PUSH: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/DeliveryModes/Push";

/// SubscriptionEnd status sent when the event source shuts down.
pub const WS_EVENTING_SOURCE_SHUTTING_DOWN: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/SourceShuttingDown";

/// Filter dialect listing action URIs (DPWS R3008).
pub const DPWS_FILTER_DIALECT_ACTION: &str =
    "http://docs.oasis-open.org/ws-dd/ns/dpws/2009/01/Action";

// ============================================================================
// SDC report actions
// ============================================================================

pub const ACTION_OPERATION_INVOKED_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/SetService/OperationInvokedReport";
pub const ACTION_PERIODIC_ALERT_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/PeriodicAlertReport";
pub const ACTION_EPISODIC_ALERT_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/EpisodicAlertReport";
pub const ACTION_EPISODIC_COMPONENT_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/EpisodicComponentReport";
pub const ACTION_PERIODIC_COMPONENT_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/PeriodicComponentReport";
pub const ACTION_EPISODIC_METRIC_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/EpisodicMetricReport";
pub const ACTION_PERIODIC_METRIC_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/PeriodicMetricReport";
pub const ACTION_EPISODIC_OPERATIONAL_STATE_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/EpisodicOperationalStateReport";
pub const ACTION_PERIODIC_OPERATIONAL_STATE_REPORT: &str =
    "http://standards.ieee.org/downloads/11073/11073-20701-2018/StateEventService/PeriodicOperationalStateReport";
