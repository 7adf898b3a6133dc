mod detect;
mod error;
mod sidecar;
mod transformer;

pub use detect::is_geographic;
pub use error::ProjectionError;
pub use sidecar::write_projection_sidecar;
pub use transformer::{CatalogEngine, PointTransformer, ProjectionEngine};
