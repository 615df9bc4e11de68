//! Implements the `CostSource` trait using the in-memory demo dataset.
//!
//! Note: this is compiled even in the "production" version of this app so that
//! we can run the whole app, top-to-bottom, without an upstream cost API.

use crate::api::CostSource;
use crate::model::{CostRow, DailyCost, Resource, UtilSample, Window};
use crate::seed::DemoData;
use crate::{summary, Result};
use chrono::{Duration, NaiveDate};

/// A `CostSource` over the seeded demo dataset. The dataset is built once at
/// construction and held immutable; requests only read from it.
pub struct DemoSource {
    data: DemoData,
}

impl DemoSource {
    pub fn new(seed: u64) -> Self {
        Self {
            data: DemoData::build(seed),
        }
    }

    /// Builds the source from an already-constructed dataset.
    pub fn with_data(data: DemoData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &DemoData {
        &self.data
    }
}

#[async_trait::async_trait]
impl CostSource for DemoSource {
    async fn costs_by_service(&self, window: Window) -> Result<Vec<CostRow>> {
        Ok(summary::costs_by_service(
            &self.data.daily_costs,
            window,
            self.data.today,
        ))
    }

    async fn daily_costs(&self, window: Window) -> Result<Vec<DailyCost>> {
        let start = self.data.today - Duration::days(i64::from(window.days()));
        Ok(self
            .data
            .daily_costs
            .iter()
            .filter(|c| c.date >= start)
            .cloned()
            .collect())
    }

    async fn resources(&self) -> Result<Vec<Resource>> {
        Ok(self.data.resources.clone())
    }

    async fn utilization(&self) -> Result<Vec<UtilSample>> {
        Ok(self.data.utilization.clone())
    }

    fn today(&self) -> NaiveDate {
        self.data.today
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movers;
    use crate::seed::DEFAULT_SEED;

    #[tokio::test]
    async fn test_costs_by_service_covers_all_products() {
        let source = DemoSource::new(DEFAULT_SEED);
        let rows = source.costs_by_service(Window::default()).await.unwrap();
        assert_eq!(rows.len(), 7);
        // Sorted by spend; EC2 carries the largest baseline.
        assert_eq!(rows[0].service, "EC2-Instance");
    }

    #[tokio::test]
    async fn test_wider_window_never_shrinks_totals() {
        let source = DemoSource::new(DEFAULT_SEED);
        let narrow = source.costs_by_service("30d".parse().unwrap()).await.unwrap();
        let wide = source.costs_by_service("60d".parse().unwrap()).await.unwrap();
        for row in &narrow {
            let wider = wide.iter().find(|r| r.service == row.service).unwrap();
            assert!(wider.amount >= row.amount);
        }
    }

    #[tokio::test]
    async fn test_demo_movers_end_to_end() {
        // The analyzer over demo data: windows differ, so the comparison is
        // not degenerate and every service gets a mover entry.
        let source = DemoSource::new(DEFAULT_SEED);
        let window: Window = "30d".parse().unwrap();
        let current = source.costs_by_service(window).await.unwrap();
        let comparison = source.costs_by_service(window.doubled()).await.unwrap();
        assert!(!movers::comparison_is_degenerate(&current, &comparison));

        let result = movers::compute(&current, &comparison, window, movers::DEFAULT_LIMIT);
        assert_eq!(result.len(), 7);
        assert!(result.iter().all(|m| !m.prev_usd.is_negative()));
    }
}
