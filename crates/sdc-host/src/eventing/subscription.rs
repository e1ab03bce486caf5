// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription records.

use std::time::{Duration, Instant};

use super::actions::ReportAction;
use crate::soap::EndpointReference;

/// One active WS-Eventing subscription.
#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    pub notify_to: EndpointReference,
    pub end_to: Option<EndpointReference>,
    pub filter: Vec<ReportAction>,
    pub expiration: Instant,
}

impl Subscription {
    /// Inactive once strictly past its expiration.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expiration
    }

    pub fn wants(&self, action: ReportAction) -> bool {
        self.filter.contains(&action)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.is_expired(now) {
            None
        } else {
            Some(self.expiration.saturating_duration_since(now))
        }
    }

    pub fn info(&self, identifier: &str, now: Instant) -> SubscriptionInfo {
        SubscriptionInfo {
            identifier: identifier.to_string(),
            notify_to: self.notify_to.address.clone(),
            filter: self.filter.clone(),
            remaining: self.remaining(now),
        }
    }
}

/// Owned view of a subscription, for inspection and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub identifier: String,
    pub notify_to: String,
    pub filter: Vec<ReportAction>,
    /// `None` once expired (the entry stays until swept).
    pub remaining: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Instant::now();
        let sub = Subscription {
            notify_to: EndpointReference::new("http://consumer/events"),
            end_to: None,
            filter: vec![ReportAction::EpisodicMetric],
            expiration: now,
        };
        assert!(!sub.is_expired(now));
        assert_eq!(sub.remaining(now), Some(Duration::ZERO));
        assert!(sub.is_expired(now + Duration::from_millis(1)));
        assert!(sub.wants(ReportAction::EpisodicMetric));
        assert!(!sub.wants(ReportAction::EpisodicAlert));
    }
}
