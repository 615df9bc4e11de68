//! Types that represent the core data model, such as `CostRow` and `Finding`.
mod cost;
mod finding;
mod resource;
mod summary;
mod usd;

pub use cost::{CostRow, DailyCost, Mover, Window};
pub use finding::{Finding, FindingKind, Severity};
pub use resource::{CloudProvider, Resource, ResourceKind, UtilSample};
pub use summary::{Kpis, ProductCost, Summary};
pub use usd::{Usd, UsdError};
