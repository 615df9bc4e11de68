//! Cloud resources and their utilization samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

serde_plain::derive_display_from_serialize!(CloudProvider);
serde_plain::derive_fromstr_from_deserialize!(CloudProvider);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Ec2,
    Ebs,
    Elb,
    Eip,
    Gce,
    Pd,
    Lb,
}

serde_plain::derive_display_from_serialize!(ResourceKind);
serde_plain::derive_fromstr_from_deserialize!(ResourceKind);

impl ResourceKind {
    /// True for kinds that run general-purpose compute.
    pub fn is_compute(&self) -> bool {
        matches!(self, ResourceKind::Ec2 | ResourceKind::Gce)
    }
}

/// A cloud resource as inventoried by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_id: String,
    pub cloud: CloudProvider,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub name: String,
    pub account: String,
    /// Provider-reported lifecycle state, e.g. `running` or `available`.
    pub state: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// One hourly utilization sample for a resource metric (cpu, gpu, elb_req, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilSample {
    pub resource_id: String,
    pub metric: String,
    pub ts_hour: DateTime<Utc>,
    pub p50: f64,
    pub p95: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_compute() {
        assert!(ResourceKind::Ec2.is_compute());
        assert!(ResourceKind::Gce.is_compute());
        assert!(!ResourceKind::Ebs.is_compute());
        assert!(!ResourceKind::Elb.is_compute());
    }

    #[test]
    fn test_resource_kind_serializes_as_type() {
        let resource = Resource {
            resource_id: "vol-01".to_string(),
            cloud: CloudProvider::Aws,
            kind: ResourceKind::Ebs,
            name: "backup-volume".to_string(),
            account: "123456789012".to_string(),
            state: "available".to_string(),
            tags: BTreeMap::new(),
            owner: None,
        };
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "ebs");
        assert_eq!(json["cloud"], "aws");
    }
}
