use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("triangulation needs at least 3 points, got {0}")]
    InsufficientData(usize),
}
