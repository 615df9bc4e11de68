//! The "top movers" computation: given cost-by-service rows for a current
//! window and a longer comparison window, derive per-service dollar and
//! percentage deltas and return a ranked, capped list of the biggest changes.
//!
//! The comparison window is assumed to fully contain the current window, so
//! the prior-period spend for a service is recovered by subtraction:
//! `previous = comparison_total - current`, clamped at zero. Everything here
//! is a pure function of its inputs; fetching is the caller's concern.

use crate::model::{CostRow, Mover, Usd, Window};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Default maximum number of movers returned.
pub const DEFAULT_LIMIT: usize = 7;

/// Two amounts within a cent of each other count as equal when deciding
/// whether the comparison data is degenerate. Exact equality would be fragile
/// against floating-point noise in upstream payloads.
fn degenerate_epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Maps loosely-shaped upstream rows onto `CostRow`.
///
/// The upstream response shape is not guaranteed stable, so several common
/// field-name spellings are accepted: `service`, `name` or `key` for the
/// identifier and `amount_usd`, `amount` or `cost` for the value (numbers or
/// numeric strings). Rows without any identifier are skipped; unparseable or
/// negative amounts become zero.
pub fn normalize_rows(rows: &[Value]) -> Vec<CostRow> {
    rows.iter().filter_map(normalize_row).collect()
}

fn normalize_row(row: &Value) -> Option<CostRow> {
    let obj = row.as_object()?;
    let service = ["service", "name", "key"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&service)
        .to_string();
    let amount = ["amount_usd", "amount", "cost"]
        .iter()
        .find_map(|k| obj.get(*k))
        .map(parse_amount)
        .unwrap_or(Usd::ZERO);
    Some(CostRow::new(service, name, amount.max(Usd::ZERO)))
}

fn parse_amount(value: &Value) -> Usd {
    match value {
        Value::Number(n) => n.as_f64().and_then(Usd::from_f64).unwrap_or(Usd::ZERO),
        Value::String(s) => Usd::from_str(s).unwrap_or(Usd::ZERO),
        _ => Usd::ZERO,
    }
}

/// Indexes rows by service with deterministic last-write-wins on duplicates.
fn index(rows: &[CostRow]) -> BTreeMap<&str, (&str, Usd)> {
    let mut map = BTreeMap::new();
    for row in rows {
        map.insert(row.service.as_str(), (row.name.as_str(), row.amount));
    }
    map
}

/// Computes the ranked mover list for `window`.
///
/// Output is sorted by `abs(delta_usd)` descending with ties broken by service
/// name ascending, rounded to two decimal places at this boundary only, and
/// truncated to `limit` (at least one). Never returns a negative `prev_usd`
/// and never produces a NaN or infinite percentage; empty inputs yield an
/// empty list.
pub fn compute(
    current: &[CostRow],
    comparison: &[CostRow],
    window: Window,
    limit: usize,
) -> Vec<Mover> {
    let limit = limit.max(1);
    let current_index = index(current);
    let comparison_index = index(comparison);

    let services: BTreeSet<&str> = current_index
        .keys()
        .chain(comparison_index.keys())
        .copied()
        .collect();

    let hundred = Decimal::ONE_HUNDRED;
    let mut movers: Vec<Mover> = services
        .into_iter()
        .map(|service| {
            // The display name comes from whichever window saw the service,
            // preferring the current one.
            let (name, current_amount) = match current_index.get(service) {
                Some(&(name, amount)) => (name, amount),
                None => {
                    let name = comparison_index
                        .get(service)
                        .map(|&(name, _)| name)
                        .unwrap_or(service);
                    (name, Usd::ZERO)
                }
            };
            let comparison_total = comparison_index
                .get(service)
                .map(|(_, amount)| *amount)
                .unwrap_or(Usd::ZERO);

            // The comparison window contains the current one; clamping guards
            // against upstream inconsistency producing a negative prior cost.
            let previous = (comparison_total - current_amount).max(Usd::ZERO);
            let delta = current_amount - previous;
            let delta_pct = if previous.is_positive() {
                (delta.value() / previous.value()) * hundred
            } else if current_amount.is_positive() {
                // A new service with no prior spend is a full increase.
                hundred
            } else {
                Decimal::ZERO
            };

            Mover {
                service: service.to_string(),
                name: name.to_string(),
                window,
                current_usd: current_amount.rounded(),
                prev_usd: previous.rounded(),
                delta_usd: delta.rounded(),
                delta_pct: delta_pct.round_dp(2),
            }
        })
        .collect();

    movers.sort_by(|a, b| {
        b.delta_usd
            .abs()
            .cmp(&a.delta_usd.abs())
            .then_with(|| a.service.cmp(&b.service))
    });
    movers.truncate(limit);
    movers
}

/// True when the comparison data is indistinguishable from the current data:
/// the two sets share at least one service and every shared service's amounts
/// agree within a cent. This signals an upstream that ignored the window
/// parameter; the caller should prefer a wider aggregate if one is available.
pub fn comparison_is_degenerate(current: &[CostRow], comparison: &[CostRow]) -> bool {
    let current_index = index(current);
    let comparison_index = index(comparison);
    let epsilon = degenerate_epsilon();

    let mut shared = 0usize;
    for (service, (_, current_amount)) in &current_index {
        if let Some((_, comparison_amount)) = comparison_index.get(service) {
            shared += 1;
            if (current_amount.value() - comparison_amount.value()).abs() > epsilon {
                return false;
            }
        }
    }
    shared > 0
}

/// The two-tier comparison policy: use `primary` unless it is degenerate and a
/// `fallback` aggregate exists. With no usable fallback the degenerate data is
/// used as-is rather than failing.
pub fn resolve_comparison<'a>(
    current: &[CostRow],
    primary: &'a [CostRow],
    fallback: Option<&'a [CostRow]>,
) -> &'a [CostRow] {
    if comparison_is_degenerate(current, primary) {
        if let Some(fallback) = fallback {
            tracing::debug!("comparison window is degenerate, using fallback aggregate");
            return fallback;
        }
    }
    primary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(service: &str, amount: i64) -> CostRow {
        CostRow::new(service, service, Usd::from(amount))
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_prior_period_by_subtraction() {
        // 30d costs 100, 60d costs 180 => prior period spent 80, up 25%.
        let movers = compute(
            &[row("EC2", 100)],
            &[row("EC2", 180)],
            Window::default(),
            DEFAULT_LIMIT,
        );
        assert_eq!(movers.len(), 1);
        let m = &movers[0];
        assert_eq!(m.prev_usd, Usd::from(80));
        assert_eq!(m.delta_usd, Usd::from(20));
        assert_eq!(m.delta_pct, dec("25"));
    }

    #[test]
    fn test_new_service_is_full_increase() {
        let movers = compute(&[row("Lambda", 50)], &[], Window::default(), DEFAULT_LIMIT);
        assert_eq!(movers.len(), 1);
        let m = &movers[0];
        assert_eq!(m.prev_usd, Usd::ZERO);
        assert_eq!(m.delta_usd, Usd::from(50));
        assert_eq!(m.delta_pct, dec("100"));
    }

    #[test]
    fn test_vanished_service_is_full_decrease() {
        let movers = compute(&[], &[row("S3", 40)], Window::default(), DEFAULT_LIMIT);
        assert_eq!(movers.len(), 1);
        let m = &movers[0];
        assert_eq!(m.current_usd, Usd::ZERO);
        assert_eq!(m.prev_usd, Usd::from(40));
        assert_eq!(m.delta_usd, Usd::from(-40));
        assert_eq!(m.delta_pct, dec("-100"));
    }

    #[test]
    fn test_vanished_service_keeps_display_name() {
        let comparison = vec![CostRow::new("S3", "Object Storage (S3)", Usd::from(40))];
        let movers = compute(&[], &comparison, Window::default(), DEFAULT_LIMIT);
        assert_eq!(movers[0].name, "Object Storage (S3)");

        // The current window's label wins when both windows saw the service.
        let current = vec![CostRow::new("S3", "Storage", Usd::from(10))];
        let movers = compute(&current, &comparison, Window::default(), DEFAULT_LIMIT);
        assert_eq!(movers[0].name, "Storage");
    }

    #[test]
    fn test_equal_windows_clamp_previous_to_zero() {
        // Comparison total equals current spend: the subtraction would say the
        // prior period spent nothing, which the clamp keeps at exactly zero.
        let movers = compute(
            &[row("EBS", 30)],
            &[row("EBS", 30)],
            Window::default(),
            DEFAULT_LIMIT,
        );
        let m = &movers[0];
        assert_eq!(m.prev_usd, Usd::ZERO);
        assert_eq!(m.delta_usd, Usd::from(30));
        assert_eq!(m.delta_pct, dec("100"));
    }

    #[test]
    fn test_previous_never_negative_for_adversarial_input() {
        // Comparison total smaller than current spend is upstream nonsense.
        let movers = compute(
            &[row("RDS", 500)],
            &[row("RDS", 120)],
            Window::default(),
            DEFAULT_LIMIT,
        );
        let m = &movers[0];
        assert_eq!(m.prev_usd, Usd::ZERO);
        assert_eq!(m.delta_usd, Usd::from(500));
        assert_eq!(m.delta_pct, dec("100"));
    }

    #[test]
    fn test_both_zero_is_zero_percent() {
        let movers = compute(
            &[row("EKS", 0)],
            &[row("EKS", 0)],
            Window::default(),
            DEFAULT_LIMIT,
        );
        let m = &movers[0];
        assert_eq!(m.delta_usd, Usd::ZERO);
        assert_eq!(m.delta_pct, Decimal::ZERO);
    }

    #[test]
    fn test_empty_inputs_yield_empty_output() {
        assert!(compute(&[], &[], Window::default(), DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn test_duplicate_service_last_write_wins() {
        let movers = compute(
            &[row("EC2", 10), row("EC2", 100)],
            &[row("EC2", 150), row("EC2", 180)],
            Window::default(),
            DEFAULT_LIMIT,
        );
        assert_eq!(movers.len(), 1);
        assert_eq!(movers[0].current_usd, Usd::from(100));
        assert_eq!(movers[0].prev_usd, Usd::from(80));
    }

    #[test]
    fn test_limit_keeps_largest_absolute_deltas() {
        let current: Vec<CostRow> = (1..=10).map(|i| row(&format!("svc-{i:02}"), i * 10)).collect();
        let movers = compute(&current, &[], Window::default(), 3);
        assert_eq!(movers.len(), 3);
        let services: Vec<&str> = movers.iter().map(|m| m.service.as_str()).collect();
        assert_eq!(services, vec!["svc-10", "svc-09", "svc-08"]);
    }

    #[test]
    fn test_sorted_by_abs_delta_with_service_tie_break() {
        // B decreases by 70, A and C both increase by 50.
        let current = vec![row("C", 50), row("A", 50)];
        let comparison = vec![row("B", 70)];
        let movers = compute(&current, &comparison, Window::default(), DEFAULT_LIMIT);
        let services: Vec<&str> = movers.iter().map(|m| m.service.as_str()).collect();
        assert_eq!(services, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_idempotent() {
        let current = vec![row("EC2", 100), row("S3", 40), row("RDS", 7)];
        let comparison = vec![row("EC2", 180), row("Lambda", 12)];
        let a = compute(&current, &comparison, Window::default(), DEFAULT_LIMIT);
        let b = compute(&current, &comparison, Window::default(), DEFAULT_LIMIT);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rounding_happens_at_output_boundary() {
        let current = vec![CostRow::new("EC2", "EC2", Usd::from_f64(100.456).unwrap())];
        let comparison = vec![CostRow::new("EC2", "EC2", Usd::from_f64(180.123).unwrap())];
        let movers = compute(&current, &comparison, Window::default(), DEFAULT_LIMIT);
        let m = &movers[0];
        // previous = 79.667 -> 79.67; delta = 20.789 -> 20.79
        assert_eq!(m.prev_usd.value(), dec("79.67"));
        assert_eq!(m.delta_usd.value(), dec("20.79"));
        // Percent computed from unrounded intermediates, rounded once.
        assert_eq!(m.delta_pct, dec("26.09"));
    }

    #[test]
    fn test_zero_limit_is_treated_as_one() {
        let movers = compute(&[row("EC2", 1)], &[], Window::default(), 0);
        assert_eq!(movers.len(), 1);
    }

    #[test]
    fn test_normalize_accepts_field_aliases() {
        let rows = vec![
            json!({"service": "EC2", "name": "Compute (EC2)", "amount_usd": 120.5}),
            json!({"key": "S3", "cost": "40.25"}),
            json!({"name": "Lambda", "amount": "$1,250.75"}),
        ];
        let normalized = normalize_rows(&rows);
        assert_eq!(
            normalized,
            vec![
                CostRow::new("EC2", "Compute (EC2)", Usd::from_f64(120.5).unwrap()),
                CostRow::new("S3", "S3", Usd::from_f64(40.25).unwrap()),
                CostRow::new("Lambda", "Lambda", Usd::from_f64(1250.75).unwrap()),
            ]
        );
    }

    #[test]
    fn test_normalize_skips_and_defaults_malformed_rows() {
        let rows = vec![
            json!({"amount_usd": 99.0}),
            json!({"service": "", "amount": 1}),
            json!({"service": "EC2", "amount": "not a number"}),
            json!({"service": "S3", "amount": -12.0}),
            json!({"service": "RDS"}),
            json!("not an object"),
        ];
        let normalized = normalize_rows(&rows);
        assert_eq!(
            normalized,
            vec![
                CostRow::new("EC2", "EC2", Usd::ZERO),
                CostRow::new("S3", "S3", Usd::ZERO),
                CostRow::new("RDS", "RDS", Usd::ZERO),
            ]
        );
    }

    #[test]
    fn test_degenerate_detection() {
        let current = vec![row("EC2", 100), row("S3", 40)];
        let same = current.clone();
        assert!(comparison_is_degenerate(&current, &same));

        let different = vec![row("EC2", 180), row("S3", 40)];
        assert!(!comparison_is_degenerate(&current, &different));

        // No shared services: nothing to compare, not degenerate.
        assert!(!comparison_is_degenerate(&current, &[row("RDS", 100)]));
        assert!(!comparison_is_degenerate(&current, &[]));
    }

    #[test]
    fn test_degenerate_tolerates_sub_cent_noise() {
        let current = vec![CostRow::new("EC2", "EC2", Usd::from_f64(100.001).unwrap())];
        let comparison = vec![CostRow::new("EC2", "EC2", Usd::from_f64(100.004).unwrap())];
        assert!(comparison_is_degenerate(&current, &comparison));
    }

    #[test]
    fn test_resolve_comparison_prefers_fallback_when_degenerate() {
        let current = vec![row("EC2", 100)];
        let degenerate = vec![row("EC2", 100)];
        let wider = vec![row("EC2", 250)];

        let chosen = resolve_comparison(&current, &degenerate, Some(&wider));
        assert_eq!(chosen, wider.as_slice());

        // Without a fallback the degenerate data is used as-is and the
        // computation still proceeds (clamped previous, full increase).
        let chosen = resolve_comparison(&current, &degenerate, None);
        assert_eq!(chosen, degenerate.as_slice());
        let movers = compute(&current, chosen, Window::default(), DEFAULT_LIMIT);
        assert_eq!(movers[0].prev_usd, Usd::ZERO);
        assert_eq!(movers[0].delta_pct, dec("100"));

        // A healthy primary is never overridden.
        let healthy = vec![row("EC2", 180)];
        let chosen = resolve_comparison(&current, &healthy, Some(&wider));
        assert_eq!(chosen, healthy.as_slice());
    }
}
