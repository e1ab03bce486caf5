// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Eventing event source.
//!
//! The [`SubscriptionManager`] answers Subscribe, Renew, Unsubscribe and
//! GetStatus requests handed over by the HTTP layer, and pushes reports to
//! subscribers through per-address delivery channels.

mod actions;
mod clock;
mod delivery;
mod fault;
mod manager;
mod subscription;

pub use actions::ReportAction;
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use delivery::{HttpTransport, Transport};
pub use fault::EventingFault;
pub use manager::{Report, SubscriptionManager};
pub use subscription::SubscriptionInfo;
