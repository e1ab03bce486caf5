// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Eventing protocol faults.

use thiserror::Error;

use crate::constants::{NS_EVENTING, WS_ADDRESSING_FAULT};
use crate::soap::{Body, Envelope, Fault, FaultCode, QName};

/// A rejected eventing request. No subscription state changes when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventingFault {
    #[error("Requested filter is not available: {0}")]
    FilteringRequestedUnavailable(String),

    #[error("Filter dialect not supported: {0}")]
    FilteringNotSupported(String),

    #[error("Invalid expiration time: {0}")]
    InvalidExpirationTime(String),

    #[error("Delivery mode not supported: {0}")]
    DeliveryModeRequestedUnavailable(String),

    #[error("Unable to renew subscription {0}")]
    UnableToRenew(String),

    #[error("Unknown subscription {0}")]
    InvalidSubscription(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl EventingFault {
    /// WS-Eventing fault subcode (local name in the eventing namespace).
    pub fn subcode(&self) -> &'static str {
        match self {
            EventingFault::FilteringRequestedUnavailable(_) => "FilteringRequestedUnavailable",
            EventingFault::FilteringNotSupported(_) => "FilteringNotSupported",
            EventingFault::InvalidExpirationTime(_) => "InvalidExpirationTime",
            EventingFault::DeliveryModeRequestedUnavailable(_) => {
                "DeliveryModeRequestedUnavailable"
            }
            EventingFault::UnableToRenew(_) => "UnableToRenew",
            // 2004/08 has no dedicated code for an unknown identifier.
            EventingFault::InvalidSubscription(_) | EventingFault::InvalidMessage(_) => {
                "InvalidMessage"
            }
        }
    }

    /// SOAP 1.2 Fault envelope (Sender code, eventing subcode).
    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(
            WS_ADDRESSING_FAULT,
            Body::Fault(Fault {
                code: FaultCode::Sender,
                subcode: Some(QName::new(NS_EVENTING, self.subcode())),
                reason: self.to_string(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soap::{parse, serialize};

    #[test]
    fn test_fault_envelope_survives_the_wire() {
        let fault = EventingFault::FilteringRequestedUnavailable("urn:not-allowed".into());
        let parsed = parse(&serialize(&fault.to_envelope())).expect("parse");

        assert_eq!(parsed.header.action.as_deref(), Some(WS_ADDRESSING_FAULT));
        match parsed.body {
            Body::Fault(f) => {
                assert_eq!(f.code, FaultCode::Sender);
                assert_eq!(
                    f.subcode,
                    Some(QName::new(NS_EVENTING, "FilteringRequestedUnavailable"))
                );
                assert!(f.reason.contains("urn:not-allowed"));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
