// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Report actions a consumer may subscribe to.

use std::fmt;

use crate::constants::{
    ACTION_EPISODIC_ALERT_REPORT, ACTION_EPISODIC_COMPONENT_REPORT, ACTION_EPISODIC_METRIC_REPORT,
    ACTION_EPISODIC_OPERATIONAL_STATE_REPORT, ACTION_OPERATION_INVOKED_REPORT,
    ACTION_PERIODIC_ALERT_REPORT, ACTION_PERIODIC_COMPONENT_REPORT, ACTION_PERIODIC_METRIC_REPORT,
    ACTION_PERIODIC_OPERATIONAL_STATE_REPORT,
};

/// One of the report actions this device can emit.
///
/// The enum is the allow-list: a filter URI that does not map to a variant
/// is not subscribable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportAction {
    OperationInvoked,
    PeriodicAlert,
    EpisodicAlert,
    EpisodicComponent,
    PeriodicComponent,
    EpisodicMetric,
    PeriodicMetric,
    EpisodicOperationalState,
    PeriodicOperationalState,
}

impl ReportAction {
    pub const ALL: [ReportAction; 9] = [
        ReportAction::OperationInvoked,
        ReportAction::PeriodicAlert,
        ReportAction::EpisodicAlert,
        ReportAction::EpisodicComponent,
        ReportAction::PeriodicComponent,
        ReportAction::EpisodicMetric,
        ReportAction::PeriodicMetric,
        ReportAction::EpisodicOperationalState,
        ReportAction::PeriodicOperationalState,
    ];

    pub fn uri(self) -> &'static str {
        match self {
            ReportAction::OperationInvoked => ACTION_OPERATION_INVOKED_REPORT,
            ReportAction::PeriodicAlert => ACTION_PERIODIC_ALERT_REPORT,
            ReportAction::EpisodicAlert => ACTION_EPISODIC_ALERT_REPORT,
            ReportAction::EpisodicComponent => ACTION_EPISODIC_COMPONENT_REPORT,
            ReportAction::PeriodicComponent => ACTION_PERIODIC_COMPONENT_REPORT,
            ReportAction::EpisodicMetric => ACTION_EPISODIC_METRIC_REPORT,
            ReportAction::PeriodicMetric => ACTION_PERIODIC_METRIC_REPORT,
            ReportAction::EpisodicOperationalState => ACTION_EPISODIC_OPERATIONAL_STATE_REPORT,
            ReportAction::PeriodicOperationalState => ACTION_PERIODIC_OPERATIONAL_STATE_REPORT,
        }
    }

    /// Exact URI lookup; `None` for anything outside the allow-list.
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.uri() == uri)
    }
}

impl fmt::Display for ReportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}
