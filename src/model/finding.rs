//! Savings findings produced by the analysis engine.

use crate::model::Usd;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of cost-optimization finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Underutilized,
    Orphan,
    Anomaly,
}

serde_plain::derive_display_from_serialize!(FindingKind);
serde_plain::derive_fromstr_from_deserialize!(FindingKind);

/// Severity of a finding. Ordering is from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

serde_plain::derive_display_from_serialize!(Severity);
serde_plain::derive_fromstr_from_deserialize!(Severity);

/// One actionable cost-optimization finding, ranked by estimated savings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub finding_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub title: String,
    pub severity: Severity,
    pub monthly_savings_usd_est: Usd,
    /// Free-form supporting data, e.g. the utilization numbers behind the call.
    pub evidence: serde_json::Value,
    pub suggested_action: String,
    /// Copy-paste commands for acting on the finding.
    pub commands: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Finding {
    /// Creates a finding with a fresh id and the current timestamp.
    pub fn new(
        kind: FindingKind,
        title: impl Into<String>,
        severity: Severity,
        monthly_savings_usd_est: Usd,
    ) -> Self {
        Self {
            finding_id: uuid::Uuid::new_v4().to_string(),
            resource_id: None,
            kind,
            title: title.into(),
            severity,
            monthly_savings_usd_est,
            evidence: serde_json::Value::Object(Default::default()),
            suggested_action: String::new(),
            commands: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn evidence(mut self, evidence: serde_json::Value) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn action(mut self, suggested_action: impl Into<String>) -> Self {
        self.suggested_action = suggested_action.into();
        self
    }

    pub fn commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }
}
