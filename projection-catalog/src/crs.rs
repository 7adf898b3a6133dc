//! Definition-string parsing. A definition is a PROJ-style string; the
//! supported projections are exactly the ones the catalog emits.

use crate::catalog::CatalogError;
use crate::ellipsoid::Ellipsoid;
use crate::tmerc::TransverseMercator;

pub type EpsgCode = u16;

/// A parsed, evaluable coordinate-system definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Geographic coordinates; projecting is the identity.
    Geographic,
    TransverseMercator(TransverseMercator),
}

impl Projection {
    /// Parses a PROJ-style definition string. Fails fast on anything the
    /// engine cannot evaluate.
    pub fn parse(definition: &str) -> Result<Projection, CatalogError> {
        let mut proj = None;
        let mut zone = None;
        let mut south = false;
        let mut ellipsoid = None;
        let mut lat_origin = 0.0;
        let mut central_meridian = 0.0;
        let mut k0 = 1.0;
        let mut false_easting = 0.0;
        let mut false_northing = 0.0;

        let invalid = |reason: &str| CatalogError::InvalidDefinition {
            definition: definition.to_string(),
            reason: reason.to_string(),
        };

        for token in definition.split_whitespace() {
            let Some(token) = token.strip_prefix('+') else {
                continue;
            };
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (token, None),
            };
            let number = || -> Result<f64, CatalogError> {
                value
                    .and_then(|v| v.parse::<f64>().ok())
                    .ok_or_else(|| invalid(&format!("parameter {} needs a numeric value", key)))
            };
            match key {
                "proj" => proj = value.map(str::to_string),
                "zone" => {
                    zone = Some(
                        value
                            .and_then(|v| v.parse::<u8>().ok())
                            .filter(|z| (1..=60).contains(z))
                            .ok_or_else(|| invalid("zone must be an integer in 1..=60"))?,
                    )
                }
                "south" => south = true,
                "datum" => {
                    ellipsoid = Some(match value {
                        Some("WGS84") => Ellipsoid::wgs84(),
                        Some("NAD83") => Ellipsoid::grs80(),
                        _ => return Err(invalid("unknown datum")),
                    })
                }
                "ellps" => {
                    ellipsoid = Some(match value {
                        Some("WGS84") => Ellipsoid::wgs84(),
                        Some("GRS80") => Ellipsoid::grs80(),
                        _ => return Err(invalid("unknown ellipsoid")),
                    })
                }
                "lat_0" => lat_origin = number()?,
                "lon_0" => central_meridian = number()?,
                "k" | "k_0" => k0 = number()?,
                "x_0" => false_easting = number()?,
                "y_0" => false_northing = number()?,
                // units, axis order and grid hints are irrelevant here
                _ => {}
            }
        }

        match proj.as_deref() {
            Some("longlat") => Ok(Projection::Geographic),
            Some("utm") => {
                let zone = zone.ok_or_else(|| invalid("utm requires a zone"))?;
                let ellipsoid = ellipsoid.unwrap_or_else(Ellipsoid::wgs84);
                Ok(Projection::TransverseMercator(TransverseMercator::utm(
                    ellipsoid, zone, south,
                )))
            }
            Some("tmerc") => Ok(Projection::TransverseMercator(TransverseMercator {
                ellipsoid: ellipsoid.unwrap_or_else(Ellipsoid::wgs84),
                lat_origin,
                central_meridian,
                k0,
                false_easting,
                false_northing,
            })),
            Some(other) => Err(CatalogError::UnsupportedProjection(other.to_string())),
            None => Err(invalid("missing +proj parameter")),
        }
    }

    pub fn project_forward(&self, lng: f64, lat: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (lng, lat),
            Projection::TransverseMercator(tm) => tm.project_forward(lng, lat),
        }
    }
}
