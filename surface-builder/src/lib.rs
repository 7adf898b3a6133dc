mod error;
mod style;
mod surface;

pub use error::SurfaceError;
pub use style::{apply_elevation_colors, elevation_color};
pub use surface::{build_surface, SurfaceParams, SurfaceStats, Triangle, TriangulatedSurface};
