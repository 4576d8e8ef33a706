//! éCO2mix core: schema mapping, source normalization, model artifacts,
//! forecasting and reconciliation.
//!
//! - Schema mapper (remote field names → RTE display columns)
//! - Upload and remote normalizers producing one canonical frame
//! - Artifact store for pre-fit predictor/scaler pairs
//! - Forecast engine over the canonical frame
//! - Reconciliation of predictions with realized prices under a clock policy

pub mod clock;
pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod forecast;
pub mod model;
pub mod reconcile;
pub mod schema;

pub use clock::ClockPolicy;
pub use domain::{
    ActualPricePoint, AlignedComparison, CanonicalFrame, CanonicalRecord, Cell, ForecastPoint,
};
pub use error::PipelineError;
pub use forecast::forecast;
pub use model::{ArtifactStore, DirectoryStore, ModelArtifact, ModelError};
pub use reconcile::reconcile;
