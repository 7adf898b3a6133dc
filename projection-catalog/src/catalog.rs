//! Catalog-code to definition-string resolution. This is a data table, not
//! algorithmic logic: the pipeline looks definitions up here and hands them
//! to the parser in `crs`.

use thiserror::Error;

use crate::crs::EpsgCode;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog code {0} is not in the projection catalog")]
    UnknownCode(EpsgCode),

    #[error("invalid projection definition {definition:?}: {reason}")]
    InvalidDefinition { definition: String, reason: String },

    #[error("projection {0:?} is not supported by this engine")]
    UnsupportedProjection(String),
}

/// Geographic systems with fixed definitions.
const GEOGRAPHIC: &[(EpsgCode, &str)] = &[
    (4326, "+proj=longlat +datum=WGS84 +no_defs"),
    (4979, "+proj=longlat +datum=WGS84 +no_defs"),
    (4258, "+proj=longlat +ellps=GRS80 +no_defs"),
    (4269, "+proj=longlat +ellps=GRS80 +no_defs"),
];

/// Resolves a catalog code to its definition string.
///
/// WGS84 UTM zones (326xx north / 327xx south), ETRS89 UTM zones
/// (258xx, zones 28-38) and NAD83 UTM zones (269xx, zones 1-23) are
/// synthesized; the geographic systems come from the fixed table.
pub fn lookup(code: EpsgCode) -> Result<String, CatalogError> {
    if let Some((_, definition)) = GEOGRAPHIC.iter().find(|(c, _)| *c == code) {
        return Ok((*definition).to_string());
    }

    match code {
        32601..=32660 => Ok(format!(
            "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
            code - 32600
        )),
        32701..=32760 => Ok(format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            code - 32700
        )),
        25828..=25838 => Ok(format!(
            "+proj=utm +zone={} +ellps=GRS80 +units=m +no_defs",
            code - 25800
        )),
        26901..=26923 => Ok(format!(
            "+proj=utm +zone={} +ellps=GRS80 +units=m +no_defs",
            code - 26900
        )),
        _ => Err(CatalogError::UnknownCode(code)),
    }
}

/// Whether a catalog code names a geographic (degree-based) system.
pub fn is_geographic_code(code: EpsgCode) -> bool {
    GEOGRAPHIC.iter().any(|(c, _)| *c == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Projection;

    #[test]
    fn utm_codes_resolve_and_parse() {
        let definition = lookup(32633).unwrap();
        assert!(definition.contains("+zone=33"));
        assert!(Projection::parse(&definition).is_ok());
    }

    #[test]
    fn southern_utm_codes_carry_the_south_flag() {
        let definition = lookup(32719).unwrap();
        assert!(definition.contains("+south"));
    }

    #[test]
    fn geographic_codes_resolve() {
        assert!(lookup(4326).unwrap().contains("+proj=longlat"));
        assert!(is_geographic_code(4979));
        assert!(!is_geographic_code(32633));
    }

    #[test]
    fn every_catalog_entry_is_evaluable() {
        let mut codes: Vec<EpsgCode> = vec![4326, 4979, 4258, 4269];
        codes.extend(32601..=32660);
        codes.extend(32701..=32760);
        codes.extend(25828..=25838);
        codes.extend(26901..=26923);
        for code in codes {
            let definition = lookup(code).unwrap();
            Projection::parse(&definition)
                .unwrap_or_else(|e| panic!("code {} failed to parse: {}", code, e));
        }
    }

    #[test]
    fn unknown_codes_are_errors() {
        assert!(matches!(lookup(9999), Err(CatalogError::UnknownCode(9999))));
    }
}
