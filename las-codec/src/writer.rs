//! Encode orchestration: scale/offset derivation, header, optional
//! georeferencing VLRs, then the point records. A pure function of its
//! inputs; the cloud passed in is never mutated.

use std::fs;
use std::path::Path;

use cloud_core::pointcloud::point::{BoundingVolume, Point};

use crate::error::FormatError;
use crate::header::{coerce_version_format, Coercion, LasHeader, Version};
use crate::point::{self, PointFormat};
use crate::quantize;
use crate::raw::ByteWriter;
use crate::vlr::{self, GeoKeyDirectory, Vlr};

/// Global-encoding bit signalling that the CRS is described by a WKT VLR
/// (meaningful from LAS 1.4 on).
const GLOBAL_ENCODING_WKT: u16 = 0x0010;

/// Georeferencing to embed in the output file. Emitted through the VLR
/// codec in the primary encode pass.
#[derive(Debug, Clone)]
pub struct GeoReference {
    pub geokeys: GeoKeyDirectory,
    pub wkt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub version: Version,
    pub point_format: u8,
    pub system_identifier: String,
    pub generating_software: String,
    pub file_creation_day: u16,
    pub file_creation_year: u16,
    pub georeference: Option<GeoReference>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            version: Version::V1_2,
            point_format: 0,
            system_identifier: "EXTRACTION".to_string(),
            generating_software: format!("las-codec {}", env!("CARGO_PKG_VERSION")),
            file_creation_day: 0,
            file_creation_year: 0,
            georeference: None,
        }
    }
}

/// The encoded file plus the header that was written and the coercion
/// decision, so callers can assert on (or log) what actually happened.
#[derive(Debug)]
pub struct EncodedFile {
    pub bytes: Vec<u8>,
    pub header: LasHeader,
    pub coercion: Coercion,
}

pub fn encode(points: &[Point], options: &EncodeOptions) -> Result<EncodedFile, FormatError> {
    let coercion =
        coerce_version_format(options.version, options.point_format, points.len() as u64);
    let version = coercion.version;
    let format = PointFormat::new(coercion.point_format)?;

    let bounds = BoundingVolume::from_points(points);
    let axes = quantize::compute(&bounds);
    let scale = [axes[0].scale, axes[1].scale, axes[2].scale];
    let offset = [axes[0].offset, axes[1].offset, axes[2].offset];

    let mut points_by_return = [0u64; 15];
    for point in points {
        let slot = point.attributes.return_number as usize;
        if (1..=15).contains(&slot) {
            points_by_return[slot - 1] += 1;
        }
    }

    let mut vlrs: Vec<Vlr> = Vec::new();
    let mut global_encoding = 0u16;
    if let Some(georeference) = &options.georeference {
        vlrs.push(vlr::geokey_directory_vlr(&georeference.geokeys));
        if let Some(wkt) = &georeference.wkt {
            vlrs.push(vlr::wkt_crs_vlr(wkt));
            if version >= Version::V1_4 {
                global_encoding |= GLOBAL_ENCODING_WKT;
            }
        }
    }
    let vlr_bytes: usize = vlrs.iter().map(Vlr::total_len).sum();

    let point_count = points.len() as u64;
    let use_legacy_counts = !format.is_extended() && point_count <= u32::MAX as u64;
    let mut legacy_points_by_return = [0u32; 5];
    if use_legacy_counts {
        for i in 0..5 {
            legacy_points_by_return[i] = points_by_return[i].min(u32::MAX as u64) as u32;
        }
    }

    let header_size = version.header_size();
    let header = LasHeader {
        file_source_id: 0,
        global_encoding,
        project_id: [0; 16],
        version,
        system_identifier: options.system_identifier.clone(),
        generating_software: options.generating_software.clone(),
        file_creation_day: options.file_creation_day,
        file_creation_year: options.file_creation_year,
        header_size,
        offset_to_point_data: header_size as u32 + vlr_bytes as u32,
        number_of_vlrs: vlrs.len() as u32,
        point_format: format.id(),
        point_record_length: format.record_length(),
        legacy_point_count: if use_legacy_counts { point_count as u32 } else { 0 },
        legacy_points_by_return,
        scale,
        offset,
        max_x: bounds.max[0],
        min_x: bounds.min[0],
        max_y: bounds.max[1],
        min_y: bounds.min[1],
        max_z: bounds.max[2],
        min_z: bounds.min[2],
        waveform_data_start: 0,
        first_evlr_offset: 0,
        evlr_count: 0,
        point_count,
        points_by_return,
    };

    let total = header_size as usize
        + vlr_bytes
        + points.len() * format.record_length() as usize;
    let mut w = ByteWriter::with_capacity(total);
    w.write_bytes(&header.encode());
    for vlr in &vlrs {
        vlr.encode_into(&mut w);
    }
    for point in points {
        point::encode_record(point, format, &scale, &offset, &mut w)?;
    }

    Ok(EncodedFile {
        bytes: w.into_bytes(),
        header,
        coercion,
    })
}

/// Encodes and writes in one step; the filesystem is only touched here.
pub fn write_file(
    path: impl AsRef<Path>,
    points: &[Point],
    options: &EncodeOptions,
) -> Result<EncodedFile, FormatError> {
    let encoded = encode(points, options)?;
    fs::write(path, &encoded.bytes)?;
    Ok(encoded)
}
