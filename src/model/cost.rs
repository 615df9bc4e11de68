//! Cost-by-service rows and the ranked "top mover" output shape.

use crate::model::Usd;
use anyhow::{anyhow, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trailing time range over which costs are aggregated, e.g. `30d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Window {
    days: u32,
}

impl Window {
    /// Creates a window of `days` trailing days. `days` must be positive.
    pub fn new(days: u32) -> crate::Result<Self> {
        if days == 0 {
            bail!("a window must span at least one day");
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// The conventional comparison window: twice the length of this one.
    pub fn doubled(&self) -> Self {
        Self {
            days: self.days.saturating_mul(2),
        }
    }

    /// A wider aggregate used as the secondary comparison tier.
    pub fn tripled(&self) -> Self {
        Self {
            days: self.days.saturating_mul(3),
        }
    }
}

impl Default for Window {
    /// The default dashboard window is the trailing 30 days.
    fn default() -> Self {
        Self { days: 30 }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days)
    }
}

impl FromStr for Window {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_suffix('d')
            .ok_or_else(|| anyhow!("expected a window like '30d', got '{s}'"))?;
        let days: u32 = digits
            .parse()
            .map_err(|_| anyhow!("expected a window like '30d', got '{s}'"))?;
        Window::new(days)
    }
}

serde_plain::derive_serialize_from_display!(Window);
serde_plain::derive_deserialize_from_fromstr!(Window, "a trailing window such as '30d'");

/// One cost-by-service data point from the upstream source for some window.
///
/// `service` is the join key across windows and is unique within one window's
/// row set (last-write-wins when the upstream sends duplicates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRow {
    pub service: String,
    /// Display label; defaults to `service` when the upstream omits it.
    pub name: String,
    pub amount: Usd,
}

impl CostRow {
    pub fn new(service: impl Into<String>, name: impl Into<String>, amount: Usd) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            amount,
        }
    }
}

/// One day of spend for one product in one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCost {
    pub account: String,
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub date: NaiveDate,
    pub amount_usd: Usd,
}

/// One ranked entry of the "top movers" computation: a service whose cost
/// changed between the current window and the derived prior period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub service: String,
    pub name: String,
    pub window: Window,
    pub current_usd: Usd,
    pub prev_usd: Usd,
    pub delta_usd: Usd,
    #[serde(with = "rust_decimal::serde::float")]
    pub delta_pct: Decimal,
}
