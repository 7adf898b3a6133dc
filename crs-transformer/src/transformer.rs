use cloud_core::pointcloud::point::{Point, PointCloud};
use projection_catalog::{EpsgCode, Projection};

use crate::error::ProjectionError;

/// The projection engine seam. The pipeline only ever asks for a forward
/// projection of a longitude/latitude pair; everything else (definition
/// parsing, datum handling) stays behind this trait.
pub trait ProjectionEngine: Send + Sync {
    fn forward(&self, lng: f64, lat: f64) -> Result<(f64, f64), ProjectionError>;
}

/// Engine evaluating catalog definitions. Constructing one validates the
/// definition, so failures surface before any point is touched.
pub struct CatalogEngine {
    projection: Projection,
}

impl CatalogEngine {
    pub fn from_code(code: EpsgCode) -> Result<Self, ProjectionError> {
        let definition = projection_catalog::lookup(code)?;
        Self::from_definition(&definition)
    }

    pub fn from_definition(definition: &str) -> Result<Self, ProjectionError> {
        let projection = Projection::parse(definition)?;
        Ok(CatalogEngine { projection })
    }
}

impl ProjectionEngine for CatalogEngine {
    fn forward(&self, lng: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        Ok(self.projection.project_forward(lng, lat))
    }
}

pub enum PointTransformer {
    Identity,
    Engine(Box<dyn ProjectionEngine>),
}

impl PointTransformer {
    /// Builds a transformer from source to target catalog codes. Identical
    /// codes collapse to the identity; otherwise the target definition is
    /// resolved and validated up front.
    pub fn from_codes(source: EpsgCode, target: EpsgCode) -> Result<Self, ProjectionError> {
        if source == target {
            return Ok(PointTransformer::Identity);
        }
        Ok(PointTransformer::Engine(Box::new(CatalogEngine::from_code(
            target,
        )?)))
    }

    pub fn from_engine(engine: Box<dyn ProjectionEngine>) -> Self {
        PointTransformer::Engine(engine)
    }

    /// Projects every point's X/Y, leaving Z untouched. The input cloud is
    /// not modified; on error nothing is published, so a partially
    /// transformed cloud can never escape.
    pub fn transform_cloud(&self, cloud: &PointCloud) -> Result<PointCloud, ProjectionError> {
        match self {
            PointTransformer::Identity => Ok(cloud.clone()),
            PointTransformer::Engine(engine) => {
                let mut points = Vec::with_capacity(cloud.points.len());
                for (index, point) in cloud.points.iter().enumerate() {
                    let (x, y) = engine.forward(point.x, point.y)?;
                    if !x.is_finite() || !y.is_finite() {
                        return Err(ProjectionError::NonFinite { index });
                    }
                    points.push(Point {
                        x,
                        y,
                        z: point.z,
                        color: point.color,
                        attributes: point.attributes.clone(),
                    });
                }
                Ok(PointCloud::new(points))
            }
        }
    }
}
