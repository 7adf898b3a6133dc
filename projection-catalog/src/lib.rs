pub mod catalog;
pub mod crs;
pub mod ellipsoid;
pub mod tmerc;

pub use catalog::{is_geographic_code, lookup, CatalogError};
pub use crs::{EpsgCode, Projection};
pub use ellipsoid::Ellipsoid;
pub use tmerc::TransverseMercator;
