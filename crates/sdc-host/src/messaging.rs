// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message identity and WS-Discovery `AppSequence` generation.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::soap::AppSequence;

/// Generates `AppSequence` values for one discovery host.
///
/// The instance id must change every time the host (re)starts so receivers
/// can tell a restarted device from replayed traffic. It is derived from the
/// wall clock (seconds) and forced to grow even when two restarts fall into
/// the same second.
#[derive(Debug, Default)]
pub struct MessagingContext {
    instance_id: u64,
    message_counter: u64,
}

impl MessagingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new instance; the message counter restarts at zero.
    pub fn reset_instance_id(&mut self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.instance_id = now.max(self.instance_id.saturating_add(1));
        self.message_counter = 0;
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Next sequence value; message numbers start at 1.
    pub fn next_app_sequence(&mut self) -> AppSequence {
        self.message_counter += 1;
        AppSequence {
            instance_id: self.instance_id,
            message_number: self.message_counter,
        }
    }
}

/// Fresh `urn:uuid:` message id.
pub fn new_message_id() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequence_is_strictly_increasing() {
        let mut ctx = MessagingContext::new();
        ctx.reset_instance_id();
        let instance = ctx.instance_id();

        let numbers: Vec<u64> = (0..50)
            .map(|_| {
                let seq = ctx.next_app_sequence();
                assert_eq!(seq.instance_id, instance);
                seq.message_number
            })
            .collect();
        assert_eq!(numbers.first(), Some(&1));
        assert!(numbers.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_reset_always_changes_instance_id() {
        let mut ctx = MessagingContext::new();
        ctx.reset_instance_id();
        let first = ctx.instance_id();
        ctx.next_app_sequence();
        ctx.reset_instance_id();
        assert!(ctx.instance_id() > first);
        assert_eq!(ctx.next_app_sequence().message_number, 1);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_message_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("urn:uuid:")));
    }
}
