//! Variable-length records. Decode keeps every record; only the two
//! `LASF_Projection` payloads this pipeline cares about are interpreted
//! (the GeoKey directory and the WKT coordinate-system definition). The
//! encode side builds the same two records for georeferenced exports.

use crate::error::{DecodeWarning, FormatError};
use crate::header::LasHeader;
use crate::raw::{ByteWriter, SliceReader};

pub const VLR_HEADER_LEN: usize = 54;
pub const LASF_PROJECTION: &str = "LASF_Projection";
pub const RECORD_ID_GEOKEY_DIRECTORY: u16 = 34735;
pub const RECORD_ID_WKT_CRS: u16 = 2112;

// GeoKey ids used by the directory builders.
const KEY_GT_MODEL_TYPE: u16 = 1024;
const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const KEY_PROJECTED_CS_TYPE: u16 = 3072;
const KEY_PROJ_LINEAR_UNITS: u16 = 3076;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const LINEAR_UNIT_METER: u16 = 9001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeyDirectory {
    pub key_directory_version: u16,
    pub key_revision: u16,
    pub minor_revision: u16,
    pub keys: Vec<GeoKeyEntry>,
}

impl GeoKeyDirectory {
    pub fn decode(payload: &[u8]) -> Result<GeoKeyDirectory, FormatError> {
        let mut r = SliceReader::new(payload, "GeoKey directory");
        let key_directory_version = r.read_u16()?;
        let key_revision = r.read_u16()?;
        let minor_revision = r.read_u16()?;
        let number_of_keys = r.read_u16()?;
        let mut keys = Vec::with_capacity(number_of_keys as usize);
        for _ in 0..number_of_keys {
            keys.push(GeoKeyEntry {
                key_id: r.read_u16()?,
                tiff_tag_location: r.read_u16()?,
                count: r.read_u16()?,
                value_offset: r.read_u16()?,
            });
        }
        Ok(GeoKeyDirectory {
            key_directory_version,
            key_revision,
            minor_revision,
            keys,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(8 + self.keys.len() * 8);
        w.write_u16(self.key_directory_version);
        w.write_u16(self.key_revision);
        w.write_u16(self.minor_revision);
        w.write_u16(self.keys.len() as u16);
        for key in &self.keys {
            w.write_u16(key.key_id);
            w.write_u16(key.tiff_tag_location);
            w.write_u16(key.count);
            w.write_u16(key.value_offset);
        }
        w.into_bytes()
    }

    fn directory(keys: Vec<GeoKeyEntry>) -> GeoKeyDirectory {
        GeoKeyDirectory {
            key_directory_version: 1,
            key_revision: 1,
            minor_revision: 0,
            keys,
        }
    }

    fn short_key(key_id: u16, value: u16) -> GeoKeyEntry {
        GeoKeyEntry {
            key_id,
            tiff_tag_location: 0,
            count: 1,
            value_offset: value,
        }
    }

    /// Directory for a projected, meter-based coordinate system.
    pub fn for_projected_epsg(code: u16) -> GeoKeyDirectory {
        GeoKeyDirectory::directory(vec![
            GeoKeyDirectory::short_key(KEY_GT_MODEL_TYPE, MODEL_TYPE_PROJECTED),
            GeoKeyDirectory::short_key(KEY_PROJECTED_CS_TYPE, code),
            GeoKeyDirectory::short_key(KEY_PROJ_LINEAR_UNITS, LINEAR_UNIT_METER),
        ])
    }

    /// Directory for a geographic (degree-based) coordinate system.
    pub fn for_geographic_epsg(code: u16) -> GeoKeyDirectory {
        GeoKeyDirectory::directory(vec![
            GeoKeyDirectory::short_key(KEY_GT_MODEL_TYPE, MODEL_TYPE_GEOGRAPHIC),
            GeoKeyDirectory::short_key(KEY_GEOGRAPHIC_TYPE, code),
        ])
    }

    fn short_value(&self, key_id: u16) -> Option<u16> {
        self.keys
            .iter()
            .find(|k| k.key_id == key_id && k.tiff_tag_location == 0)
            .map(|k| k.value_offset)
    }

    pub fn projected_epsg(&self) -> Option<u16> {
        self.short_value(KEY_PROJECTED_CS_TYPE)
    }

    pub fn geographic_epsg(&self) -> Option<u16> {
        self.short_value(KEY_GEOGRAPHIC_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VlrInterpretation {
    GeoKeys(GeoKeyDirectory),
    WktCrs(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vlr {
    pub reserved: u16,
    pub user_id: String,
    pub record_id: u16,
    pub description: String,
    pub payload: Vec<u8>,
    /// Parsed form of the payload, present only for the recognized
    /// `LASF_Projection` records.
    pub interpretation: Option<VlrInterpretation>,
}

impl Vlr {
    pub fn total_len(&self) -> usize {
        VLR_HEADER_LEN + self.payload.len()
    }

    pub fn encode_into(&self, w: &mut ByteWriter) {
        w.write_u16(self.reserved);
        w.write_string(&self.user_id, 16);
        w.write_u16(self.record_id);
        w.write_u16(self.payload.len() as u16);
        w.write_string(&self.description, 32);
        w.write_bytes(&self.payload);
    }
}

/// Builds the GeoKey directory VLR for the encode path.
pub fn geokey_directory_vlr(directory: &GeoKeyDirectory) -> Vlr {
    Vlr {
        reserved: 0,
        user_id: LASF_PROJECTION.to_string(),
        record_id: RECORD_ID_GEOKEY_DIRECTORY,
        description: "GeoKey directory".to_string(),
        payload: directory.encode(),
        interpretation: Some(VlrInterpretation::GeoKeys(directory.clone())),
    }
}

/// Builds the WKT coordinate-system VLR for the encode path. The payload is
/// NUL-terminated as consumers expect.
pub fn wkt_crs_vlr(wkt: &str) -> Vlr {
    let mut payload = wkt.as_bytes().to_vec();
    payload.push(0);
    Vlr {
        reserved: 0,
        user_id: LASF_PROJECTION.to_string(),
        record_id: RECORD_ID_WKT_CRS,
        description: "WKT coordinate system".to_string(),
        payload,
        interpretation: Some(VlrInterpretation::WktCrs(wkt.to_string())),
    }
}

fn interpret(
    user_id: &str,
    record_id: u16,
    payload: &[u8],
    index: u32,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<VlrInterpretation> {
    if user_id != LASF_PROJECTION {
        return None;
    }
    match record_id {
        RECORD_ID_GEOKEY_DIRECTORY => match GeoKeyDirectory::decode(payload) {
            Ok(directory) => Some(VlrInterpretation::GeoKeys(directory)),
            Err(e) => {
                warnings.push(DecodeWarning::file_level(format!(
                    "VLR {}: unreadable GeoKey directory kept as raw bytes: {}",
                    index, e
                )));
                None
            }
        },
        RECORD_ID_WKT_CRS => {
            let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
            let wkt = String::from_utf8_lossy(&payload[..end]).trim().to_string();
            Some(VlrInterpretation::WktCrs(wkt))
        }
        _ => None,
    }
}

/// Reads `header.number_of_vlrs` records starting at `header.header_size`.
/// Unknown records are kept with their raw payload; a truncated VLR block is
/// a fatal `FormatError`.
pub fn decode_all(
    buf: &[u8],
    header: &LasHeader,
) -> Result<(Vec<Vlr>, Vec<DecodeWarning>), FormatError> {
    let mut warnings = Vec::new();
    let mut vlrs = Vec::with_capacity(header.number_of_vlrs as usize);
    let mut pos = header.header_size as usize;

    for index in 0..header.number_of_vlrs {
        if pos + VLR_HEADER_LEN > buf.len() {
            return Err(FormatError::Truncated {
                context: "VLR header",
                needed: pos + VLR_HEADER_LEN,
                available: buf.len(),
            });
        }
        let mut r = SliceReader::new(&buf[pos..], "VLR header");
        let reserved = r.read_u16()?;
        let user_id = r.read_string(16)?;
        let record_id = r.read_u16()?;
        let payload_len = r.read_u16()? as usize;
        let description = r.read_string(32)?;
        pos += VLR_HEADER_LEN;

        if pos + payload_len > buf.len() {
            return Err(FormatError::Truncated {
                context: "VLR payload",
                needed: pos + payload_len,
                available: buf.len(),
            });
        }
        let payload = buf[pos..pos + payload_len].to_vec();
        pos += payload_len;

        let interpretation = interpret(&user_id, record_id, &payload, index, &mut warnings);
        vlrs.push(Vlr {
            reserved,
            user_id,
            record_id,
            description,
            payload,
            interpretation,
        });
    }

    if pos > header.offset_to_point_data as usize {
        warnings.push(DecodeWarning::file_level(format!(
            "VLR block ends at byte {} but the header places point data at {}",
            pos, header.offset_to_point_data
        )));
    }

    Ok((vlrs, warnings))
}
