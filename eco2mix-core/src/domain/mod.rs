//! Domain types: cells, canonical records, and the price series that flow
//! through forecasting and reconciliation.

pub mod cell;
pub mod record;
pub mod series;

pub use cell::{Cell, NOT_AVAILABLE};
pub use record::{CanonicalFrame, CanonicalRecord};
pub use series::{ActualPricePoint, AlignedComparison, ForecastPoint};
