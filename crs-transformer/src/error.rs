use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error(transparent)]
    Catalog(#[from] projection_catalog::CatalogError),

    #[error("projection produced a non-finite coordinate for point {index}")]
    NonFinite { index: usize },

    #[error("failed to write projection sidecar: {0}")]
    Sidecar(#[from] std::io::Error),
}
