//! The findings engine: pure analysis passes over in-memory cost, resource
//! and utilization data. Each pass returns zero or more `Finding`s; `run`
//! concatenates them all and ranks by estimated monthly savings.

use crate::model::{DailyCost, Finding, FindingKind, Resource, Severity, UtilSample, Usd};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

/// Median p50 CPU below this percentage marks a compute instance as a
/// rightsizing candidate...
const UNDERUTILIZED_P50_CPU: f64 = 15.0;
/// ...provided its p95 also stays below this.
const UNDERUTILIZED_P95_CPU: f64 = 30.0;
/// Rightsizing is assumed to recover half of the instance's spend.
const RIGHTSIZE_SAVINGS_FACTOR: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
/// Robust z-score threshold for cost anomalies.
const ANOMALY_Z_THRESHOLD: f64 = 3.0;
/// Ignore anomalies that move the daily spend by less than this many dollars.
const ANOMALY_MIN_DELTA: f64 = 50.0;
/// Daily deltas at or above this are critical.
const ANOMALY_CRITICAL_DELTA: f64 = 500.0;
/// An ELB whose median request rate is below this is considered idle.
const IDLE_ELB_REQ_PER_SEC: f64 = 1.0;

/// Runs every analysis pass and returns the findings ranked by estimated
/// savings descending (ties broken by title for determinism).
pub fn run(
    resources: &[Resource],
    utilization: &[UtilSample],
    daily_costs: &[DailyCost],
    today: NaiveDate,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(underutilized_compute(resources, utilization, daily_costs, today));
    findings.extend(orphaned_resources(resources));
    findings.extend(idle_load_balancers(resources, utilization));
    findings.extend(cost_anomalies(daily_costs, today));
    findings.sort_by(|a, b| {
        b.monthly_savings_usd_est
            .cmp(&a.monthly_savings_usd_est)
            .then_with(|| a.title.cmp(&b.title))
    });
    findings
}

/// Finds running compute instances whose 7-day CPU profile is far below
/// capacity: median p50 under 15% and median p95 under 30%.
pub fn underutilized_compute(
    resources: &[Resource],
    utilization: &[UtilSample],
    daily_costs: &[DailyCost],
    today: NaiveDate,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for resource in resources {
        if !resource.kind.is_compute() || resource.state != "running" {
            continue;
        }
        let cpu: Vec<&UtilSample> = utilization
            .iter()
            .filter(|u| u.resource_id == resource.resource_id && u.metric == "cpu")
            .collect();
        if cpu.is_empty() {
            continue;
        }
        let median_p50 = median(cpu.iter().map(|u| u.p50));
        let median_p95 = median(cpu.iter().map(|u| u.p95));
        if median_p50 >= UNDERUTILIZED_P50_CPU || median_p95 >= UNDERUTILIZED_P95_CPU {
            continue;
        }

        let monthly_cost: Usd = daily_costs
            .iter()
            .filter(|c| {
                c.resource_id.as_deref() == Some(resource.resource_id.as_str())
                    && c.date >= today - Duration::days(30)
            })
            .map(|c| c.amount_usd)
            .sum();
        let savings = Usd::new(monthly_cost.value() * RIGHTSIZE_SAVINGS_FACTOR);
        let severity = if savings > Usd::from(200) {
            Severity::High
        } else {
            Severity::Medium
        };

        findings.push(
            Finding::new(
                FindingKind::Underutilized,
                format!(
                    "{} {} under {median_p50:.1}% median CPU (7d)",
                    resource.kind.to_string().to_uppercase(),
                    resource.name
                ),
                severity,
                savings,
            )
            .resource(&resource.resource_id)
            .evidence(json!({
                "p50_cpu": median_p50,
                "p95_cpu": median_p95,
                "hours_analyzed": cpu.len(),
                "monthly_cost": monthly_cost.rounded().to_f64(),
            }))
            .action("Consider downsizing to a smaller instance type or schedule off-hours stop")
            .commands(vec![
                format!(
                    "aws ec2 describe-instances --instance-ids {}",
                    resource.resource_id
                ),
                "# Consider resizing or stopping during off-hours".to_string(),
            ]),
        );
    }
    findings
}

/// Finds orphaned resources: unattached volumes and unused elastic IPs.
pub fn orphaned_resources(resources: &[Resource]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for resource in resources {
        if resource.state != "available" {
            continue;
        }
        match resource.kind {
            crate::model::ResourceKind::Ebs | crate::model::ResourceKind::Pd => {
                findings.push(
                    Finding::new(
                        FindingKind::Orphan,
                        format!("Unattached volume {}", resource.name),
                        Severity::Medium,
                        // Typical 100 GB volume at ~$0.10/GB/month.
                        Usd::from(10),
                    )
                    .resource(&resource.resource_id)
                    .evidence(json!({ "state": resource.state }))
                    .action("Delete the unused volume or attach it to an instance")
                    .commands(vec![
                        format!(
                            "aws ec2 describe-volumes --volume-ids {}",
                            resource.resource_id
                        ),
                        format!("aws ec2 delete-volume --volume-id {}", resource.resource_id),
                    ]),
                );
            }
            crate::model::ResourceKind::Eip => {
                findings.push(
                    Finding::new(
                        FindingKind::Orphan,
                        format!("Unused Elastic IP {}", resource.name),
                        Severity::Low,
                        // $0.005/hour * 24 * 30.
                        Usd::from_f64(3.65).unwrap_or(Usd::ZERO),
                    )
                    .resource(&resource.resource_id)
                    .evidence(json!({ "state": resource.state }))
                    .action("Release the unused Elastic IP")
                    .commands(vec![
                        format!(
                            "aws ec2 describe-addresses --allocation-ids {}",
                            resource.resource_id
                        ),
                        format!(
                            "aws ec2 release-address --allocation-id {}",
                            resource.resource_id
                        ),
                    ]),
                );
            }
            _ => {}
        }
    }
    findings
}

/// Finds active load balancers whose median request rate over 7 days is below
/// one request per second.
pub fn idle_load_balancers(resources: &[Resource], utilization: &[UtilSample]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for resource in resources {
        let is_lb = matches!(
            resource.kind,
            crate::model::ResourceKind::Elb | crate::model::ResourceKind::Lb
        );
        if !is_lb || resource.state != "active" {
            continue;
        }
        let requests: Vec<&UtilSample> = utilization
            .iter()
            .filter(|u| u.resource_id == resource.resource_id && u.metric == "elb_req")
            .collect();
        if requests.is_empty() {
            continue;
        }
        let median_requests = median(requests.iter().map(|u| u.p50));
        if median_requests >= IDLE_ELB_REQ_PER_SEC {
            continue;
        }
        findings.push(
            Finding::new(
                FindingKind::Underutilized,
                format!("Idle load balancer {}", resource.name),
                Severity::Medium,
                Usd::from(25),
            )
            .resource(&resource.resource_id)
            .evidence(json!({
                "median_requests_per_sec": median_requests,
                "hours_analyzed": requests.len(),
            }))
            .action("Consider removing the unused load balancer")
            .commands(vec![
                format!(
                    "aws elbv2 describe-load-balancers --names {}",
                    resource.name
                ),
                "# Review and consider deleting if truly unused".to_string(),
            ]),
        );
    }
    findings
}

/// Detects per-product cost anomalies over the last 30 days using a robust
/// z-score (median absolute deviation): the most recent day is compared to
/// the median of the preceding days, flagged when `|z| >= 3` and the dollar
/// move is at least $50.
pub fn cost_anomalies(daily_costs: &[DailyCost], today: NaiveDate) -> Vec<Finding> {
    let start = today - Duration::days(30);
    // product -> date -> total across accounts
    let mut by_product: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for cost in daily_costs.iter().filter(|c| c.date >= start) {
        *by_product
            .entry(cost.product.as_str())
            .or_default()
            .entry(cost.date)
            .or_default() += cost.amount_usd.to_f64();
    }

    let mut findings = Vec::new();
    for (product, by_date) in by_product {
        if by_date.len() < 10 {
            continue;
        }
        let series: Vec<f64> = by_date.values().copied().collect();
        let (history, recent) = series.split_at(series.len() - 1);
        let recent = recent[0];
        let median_cost = median(history.iter().copied());
        let mad = median(history.iter().map(|c| (c - median_cost).abs()));
        if mad <= 0.0 {
            continue;
        }
        let z_score = 0.6745 * (recent - median_cost) / mad;
        let delta = recent - median_cost;
        if z_score.abs() < ANOMALY_Z_THRESHOLD || delta.abs() < ANOMALY_MIN_DELTA {
            continue;
        }
        let severity = if delta.abs() >= ANOMALY_CRITICAL_DELTA {
            Severity::Critical
        } else {
            Severity::High
        };
        // Only an upward move represents recoverable spend.
        let savings = if delta > 0.0 {
            Usd::from_f64(delta * 30.0).unwrap_or(Usd::ZERO).rounded()
        } else {
            Usd::ZERO
        };
        findings.push(
            Finding::new(
                FindingKind::Anomaly,
                format!("Cost anomaly detected in {product}"),
                severity,
                savings,
            )
            .evidence(json!({
                "z_score": z_score,
                "recent_cost": recent,
                "median_cost": median_cost,
                "delta_usd": delta,
                "product": product,
            }))
            .action("Investigate the sudden cost change and identify the root cause")
            .commands(vec![
                format!("# Review {product} usage patterns"),
                "# Check for new resources or configuration changes".to_string(),
            ]),
        );
    }
    findings
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CloudProvider, ResourceKind};
    use chrono::{TimeZone, Utc};

    fn resource(id: &str, kind: ResourceKind, state: &str) -> Resource {
        Resource {
            resource_id: id.to_string(),
            cloud: CloudProvider::Aws,
            kind,
            name: format!("{id}-name"),
            account: "123456789012".to_string(),
            state: state.to_string(),
            tags: Default::default(),
            owner: None,
        }
    }

    fn cpu_samples(id: &str, p50: f64, p95: f64, hours: i64) -> Vec<UtilSample> {
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap();
        (0..hours)
            .map(|i| UtilSample {
                resource_id: id.to_string(),
                metric: "cpu".to_string(),
                ts_hour: now - Duration::hours(i),
                p50,
                p95,
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
    }

    fn daily(product: &str, resource_id: Option<&str>, days_ago: i64, amount: i64) -> DailyCost {
        DailyCost {
            account: "123456789012".to_string(),
            product: product.to_string(),
            resource_id: resource_id.map(str::to_string),
            date: today() - Duration::days(days_ago),
            amount_usd: Usd::from(amount),
        }
    }

    #[test]
    fn test_underutilized_instance_is_flagged_with_priced_savings() {
        let resources = vec![resource("i-low", ResourceKind::Ec2, "running")];
        let utilization = cpu_samples("i-low", 8.0, 20.0, 24);
        let costs: Vec<DailyCost> =
            (1..=30).map(|d| daily("EC2-Instance", Some("i-low"), d, 20)).collect();

        let findings = underutilized_compute(&resources, &utilization, &costs, today());
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.kind, FindingKind::Underutilized);
        // 30 days * $20 = $600 monthly, half recoverable.
        assert_eq!(f.monthly_savings_usd_est, Usd::from(300));
        assert_eq!(f.severity, Severity::High);
        assert_eq!(f.resource_id.as_deref(), Some("i-low"));
    }

    #[test]
    fn test_healthy_instance_is_not_flagged() {
        let resources = vec![resource("i-ok", ResourceKind::Ec2, "running")];
        let utilization = cpu_samples("i-ok", 65.0, 89.0, 24);
        let findings = underutilized_compute(&resources, &utilization, &[], today());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_low_p50_but_spiky_p95_is_not_flagged() {
        let resources = vec![resource("i-spiky", ResourceKind::Ec2, "running")];
        let utilization = cpu_samples("i-spiky", 8.0, 75.0, 24);
        let findings = underutilized_compute(&resources, &utilization, &[], today());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_stopped_or_metricless_instances_are_skipped() {
        let resources = vec![
            resource("i-stopped", ResourceKind::Ec2, "stopped"),
            resource("i-silent", ResourceKind::Ec2, "running"),
        ];
        let utilization = cpu_samples("i-stopped", 1.0, 2.0, 24);
        let findings = underutilized_compute(&resources, &utilization, &[], today());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_orphans() {
        let resources = vec![
            resource("vol-1", ResourceKind::Ebs, "available"),
            resource("vol-2", ResourceKind::Ebs, "in-use"),
            resource("eip-1", ResourceKind::Eip, "available"),
        ];
        let findings = orphaned_resources(&resources);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].monthly_savings_usd_est, Usd::from(10));
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[1].severity, Severity::Low);
    }

    #[test]
    fn test_idle_load_balancer() {
        let resources = vec![resource("elb-1", ResourceKind::Elb, "active")];
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap();
        let utilization: Vec<UtilSample> = (0..24)
            .map(|i| UtilSample {
                resource_id: "elb-1".to_string(),
                metric: "elb_req".to_string(),
                ts_hour: now - Duration::hours(i),
                p50: 0.1,
                p95: 2.0,
            })
            .collect();
        let findings = idle_load_balancers(&resources, &utilization);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].monthly_savings_usd_est, Usd::from(25));

        // A busy one is left alone.
        let busy: Vec<UtilSample> = utilization
            .iter()
            .map(|u| UtilSample { p50: 120.0, ..u.clone() })
            .collect();
        assert!(idle_load_balancers(&resources, &busy).is_empty());
    }

    #[test]
    fn test_anomaly_detected_on_spike() {
        // 28 alternating days around $100, then a $400 spike on the last day.
        let mut costs: Vec<DailyCost> = (2..=29)
            .map(|d| daily("EC2-Instance", None, d, if d % 2 == 0 { 90 } else { 110 }))
            .collect();
        costs.push(daily("EC2-Instance", None, 1, 400));

        let findings = cost_anomalies(&costs, today());
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.kind, FindingKind::Anomaly);
        // delta = $300/day over the median, annualized to 30 days.
        assert_eq!(f.monthly_savings_usd_est, Usd::from(9000));
        assert_eq!(f.severity, Severity::High);
    }

    #[test]
    fn test_anomaly_needs_sufficient_history() {
        let mut costs: Vec<DailyCost> = (2..=5)
            .map(|d| daily("S3", None, d, if d % 2 == 0 { 90 } else { 110 }))
            .collect();
        costs.push(daily("S3", None, 1, 4000));
        assert!(cost_anomalies(&costs, today()).is_empty());
    }

    #[test]
    fn test_anomaly_ignores_flat_series() {
        // Constant history: MAD is zero, no division, no finding.
        let mut costs: Vec<DailyCost> =
            (2..=29).map(|d| daily("RDS", None, d, 100)).collect();
        costs.push(daily("RDS", None, 1, 400));
        assert!(cost_anomalies(&costs, today()).is_empty());
    }

    #[test]
    fn test_downward_anomaly_has_no_savings_estimate() {
        let mut costs: Vec<DailyCost> = (2..=29)
            .map(|d| daily("ELB", None, d, if d % 2 == 0 { 590 } else { 610 }))
            .collect();
        costs.push(daily("ELB", None, 1, 0));
        let findings = cost_anomalies(&costs, today());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].monthly_savings_usd_est, Usd::ZERO);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_run_ranks_by_savings() {
        let resources = vec![
            resource("vol-1", ResourceKind::Ebs, "available"),
            resource("eip-1", ResourceKind::Eip, "available"),
            resource("i-low", ResourceKind::Ec2, "running"),
        ];
        let utilization = cpu_samples("i-low", 8.0, 20.0, 24);
        let costs: Vec<DailyCost> =
            (1..=30).map(|d| daily("EC2-Instance", Some("i-low"), d, 20)).collect();

        let findings = run(&resources, &utilization, &costs, today());
        let savings: Vec<Usd> = findings.iter().map(|f| f.monthly_savings_usd_est).collect();
        let mut sorted = savings.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(savings, sorted);
        assert_eq!(findings[0].monthly_savings_usd_est, Usd::from(300));
    }

    #[test]
    fn test_median() {
        assert_eq!(median([1.0, 3.0, 2.0].into_iter()), 2.0);
        assert_eq!(median([1.0, 2.0, 3.0, 4.0].into_iter()), 2.5);
        assert_eq!(median(std::iter::empty()), 0.0);
    }
}
