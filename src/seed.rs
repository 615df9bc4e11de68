//! Deterministic demo dataset.
//!
//! The whole app can run without a network against this data, which stands in
//! for the upstream cost API. It is built once at startup from a configurable
//! RNG seed and held immutable; the same seed always produces the same
//! amounts. Shapes and magnitudes mirror a typical small AWS footprint: seven
//! products across two accounts, 35 days of daily spend with weekday
//! patterning, one injected EC2 cost spike, and a handful of resources whose
//! utilization makes the findings engine light up.

use crate::model::{
    CloudProvider, DailyCost, Resource, ResourceKind, UtilSample, Usd,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

pub const DEFAULT_SEED: u64 = 42;

const ACCOUNTS: [&str; 2] = ["123456789012", "987654321098"];

/// Products with their baseline daily cost in USD.
const PRODUCTS: [(&str, f64); 7] = [
    ("EC2-Instance", 850.0),
    ("RDS", 420.0),
    ("S3", 75.0),
    ("CloudWatch", 45.0),
    ("ELB", 120.0),
    ("EBS", 180.0),
    ("Lambda", 25.0),
];

/// The day (counting from the start of the 35-day range) that carries the
/// injected EC2 cost spike.
const ANOMALY_DAY: i64 = 28;
const ANOMALY_FACTOR: f64 = 2.5;

pub const UNDERUTILIZED_INSTANCE: &str = "i-0123456789abcdef0";
const NORMAL_INSTANCE: &str = "i-0987654321fedcba0";
const LOW_GPU_INSTANCE: &str = "i-0555666777888999a";
const IDLE_ELB: &str = "elb-idle-load-balancer";

/// Friendly display label for a product/service identifier.
pub fn display_name(service: &str) -> &str {
    match service {
        "EC2-Instance" => "Compute (EC2)",
        "RDS" => "Relational DB (RDS)",
        "S3" => "Object Storage (S3)",
        "CloudWatch" => "Monitoring (CloudWatch)",
        "ELB" => "Load Balancing (ELB)",
        "EBS" => "Block Storage (EBS)",
        "Lambda" => "Functions (Lambda)",
        other => other,
    }
}

/// The immutable in-memory demo dataset.
#[derive(Debug, Clone)]
pub struct DemoData {
    pub resources: Vec<Resource>,
    pub utilization: Vec<UtilSample>,
    pub daily_costs: Vec<DailyCost>,
    pub today: NaiveDate,
}

impl DemoData {
    /// Builds the dataset anchored at the current time.
    pub fn build(seed: u64) -> Self {
        Self::build_at(seed, Utc::now())
    }

    /// Builds the dataset anchored at `now`. Identical `seed` and `now` yield
    /// identical data.
    pub fn build_at(seed: u64, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let mut rng = StdRng::seed_from_u64(seed);

        let daily_costs = build_daily_costs(&mut rng, today);
        let resources = build_resources();
        let utilization = build_utilization(now);

        Self {
            resources,
            utilization,
            daily_costs,
            today,
        }
    }
}

fn build_daily_costs(rng: &mut StdRng, today: NaiveDate) -> Vec<DailyCost> {
    let base_date = today - Duration::days(35);
    let mut costs = Vec::with_capacity(35 * ACCOUNTS.len() * PRODUCTS.len());
    for i in 0..35i64 {
        let date = base_date + Duration::days(i);
        // Weekday spend runs hotter than weekends.
        let weekly_factor = if date.weekday().number_from_monday() <= 5 {
            1.2
        } else {
            0.8
        };
        for account in ACCOUNTS {
            for (product, base_cost) in PRODUCTS {
                let noise: f64 = rng.gen_range(-0.20..0.20);
                let anomaly_factor = if i == ANOMALY_DAY && product == "EC2-Instance" {
                    ANOMALY_FACTOR
                } else {
                    1.0
                };
                let amount = base_cost * weekly_factor * (1.0 + noise) * anomaly_factor;
                costs.push(DailyCost {
                    account: account.to_string(),
                    product: product.to_string(),
                    resource_id: instance_for(account, product),
                    date,
                    amount_usd: Usd::from_f64(amount).unwrap_or(Usd::ZERO).rounded(),
                });
            }
        }
    }
    costs
}

/// Attributes EC2 spend to a concrete instance so the findings engine can
/// price its rightsizing recommendations.
fn instance_for(account: &str, product: &str) -> Option<String> {
    if product != "EC2-Instance" {
        return None;
    }
    if account == ACCOUNTS[0] {
        Some(UNDERUTILIZED_INSTANCE.to_string())
    } else {
        Some(NORMAL_INSTANCE.to_string())
    }
}

fn build_resources() -> Vec<Resource> {
    let entries: [(&str, ResourceKind, &str, &str); 7] = [
        (UNDERUTILIZED_INSTANCE, ResourceKind::Ec2, "web-server-1", "running"),
        (NORMAL_INSTANCE, ResourceKind::Ec2, "analytics-worker", "running"),
        (LOW_GPU_INSTANCE, ResourceKind::Ec2, "test-instance", "running"),
        ("vol-0123456789abcdef0", ResourceKind::Ebs, "unattached-volume", "available"),
        ("vol-0987654321fedcba0", ResourceKind::Ebs, "backup-volume", "available"),
        (IDLE_ELB, ResourceKind::Elb, "idle-elb", "active"),
        ("eipalloc-0123456789", ResourceKind::Eip, "unused-eip", "available"),
    ];
    entries
        .into_iter()
        .map(|(resource_id, kind, name, state)| Resource {
            resource_id: resource_id.to_string(),
            cloud: CloudProvider::Aws,
            kind,
            name: name.to_string(),
            account: ACCOUNTS[0].to_string(),
            state: state.to_string(),
            tags: BTreeMap::from([
                ("Environment".to_string(), "production".to_string()),
                ("Team".to_string(), "platform".to_string()),
            ]),
            owner: Some("team-alpha".to_string()),
        })
        .collect()
}

fn build_utilization(now: DateTime<Utc>) -> Vec<UtilSample> {
    let mut samples = Vec::with_capacity(7 * 24 * 4);
    for i in 0..(7 * 24) {
        let ts_hour = now - Duration::hours(i);
        // A box idling well below the rightsizing thresholds.
        samples.push(sample(UNDERUTILIZED_INSTANCE, "cpu", ts_hour, 8.5, 22.3));
        // A healthy instance.
        samples.push(sample(NORMAL_INSTANCE, "cpu", ts_hour, 65.2, 89.1));
        // A GPU box doing almost nothing.
        samples.push(sample(LOW_GPU_INSTANCE, "gpu", ts_hour, 5.1, 12.8));
        // A load balancer with nearly no traffic.
        samples.push(sample(IDLE_ELB, "elb_req", ts_hour, 0.1, 2.3));
    }
    samples
}

fn sample(resource_id: &str, metric: &str, ts_hour: DateTime<Utc>, p50: f64, p95: f64) -> UtilSample {
    UtilSample {
        resource_id: resource_id.to_string(),
        metric: metric.to_string(),
        ts_hour,
        p50,
        p95,
    }
}
