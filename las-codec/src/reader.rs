//! Decode orchestration: header, VLR block, then the point records.

use std::fs;
use std::path::Path;

use rayon::prelude::*;

use cloud_core::pointcloud::point::PointCloud;

use crate::error::{DecodeWarning, FormatError};
use crate::header::LasHeader;
use crate::point::{self, PointFormat, PointRecord};
use crate::vlr::{self, GeoKeyDirectory, Vlr, VlrInterpretation};

/// Caller-side decode knobs.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Hard cap on the number of records read (the first N records). This
    /// is a truncation, not a sampling decision.
    pub max_points: Option<u64>,
}

/// A fully decoded file plus the ordered warnings accumulated on the way.
#[derive(Debug)]
pub struct LasDocument {
    pub header: LasHeader,
    pub vlrs: Vec<Vlr>,
    pub points: Vec<PointRecord>,
    pub warnings: Vec<DecodeWarning>,
}

impl LasDocument {
    /// The WKT coordinate-system definition, if the file carried one.
    pub fn wkt(&self) -> Option<&str> {
        self.vlrs.iter().find_map(|v| match &v.interpretation {
            Some(VlrInterpretation::WktCrs(wkt)) => Some(wkt.as_str()),
            _ => None,
        })
    }

    /// The GeoKey directory, if the file carried one.
    pub fn geokeys(&self) -> Option<&GeoKeyDirectory> {
        self.vlrs.iter().find_map(|v| match &v.interpretation {
            Some(VlrInterpretation::GeoKeys(directory)) => Some(directory),
            _ => None,
        })
    }

    pub fn into_point_cloud(self) -> PointCloud {
        PointCloud::new(self.points.into_iter().map(PointRecord::into_point).collect())
    }
}

/// Decodes an in-memory LAS file. The buffer is never mutated; every call
/// returns fresh structures. Malformed individual records are skipped and
/// reported as warnings; structural problems (bad signature, truncated
/// header or VLR block, impossible record length) abort the decode.
pub fn decode(buffer: &[u8], options: &DecodeOptions) -> Result<LasDocument, FormatError> {
    let header = LasHeader::decode(buffer)?;
    let (vlrs, mut warnings) = vlr::decode_all(buffer, &header)?;

    let format = PointFormat::new(header.point_format)?;
    if header.point_record_length < format.record_length() {
        return Err(FormatError::RecordLengthMismatch {
            format: format.id(),
            expected: format.record_length(),
            found: header.point_record_length,
        });
    }
    if header.point_record_length > format.record_length() {
        warnings.push(DecodeWarning::file_level(format!(
            "records are {} bytes but format {} needs {}; ignoring {} trailing bytes per record",
            header.point_record_length,
            format.id(),
            format.record_length(),
            header.point_record_length - format.record_length()
        )));
    }

    let record_length = header.point_record_length as usize;
    let start = header.offset_to_point_data as usize;
    if start > buffer.len() {
        return Err(FormatError::Truncated {
            context: "point data offset",
            needed: start,
            available: buffer.len(),
        });
    }

    let mut count = header.point_count;
    if let Some(cap) = options.max_points {
        count = count.min(cap);
    }
    let available = ((buffer.len() - start) / record_length.max(1)) as u64;
    if available < count {
        warnings.push(DecodeWarning::file_level(format!(
            "file ends after {} of {} point records",
            available, count
        )));
        count = available;
    }

    let scale = header.scale;
    let offset = header.offset;
    let decoded: Vec<Result<PointRecord, FormatError>> = (0..count as usize)
        .into_par_iter()
        .map(|i| {
            let at = start + i * record_length;
            point::decode_record(&buffer[at..at + record_length], format, &scale, &offset)
        })
        .collect();

    let mut points = Vec::with_capacity(decoded.len());
    for (i, result) in decoded.into_iter().enumerate() {
        match result {
            Ok(record) => points.push(record),
            Err(e) => warnings.push(DecodeWarning::for_record(
                i as u64,
                format!("skipping malformed point record: {}", e),
            )),
        }
    }

    for warning in &warnings {
        log::warn!("{}", warning);
    }

    Ok(LasDocument {
        header,
        vlrs,
        points,
        warnings,
    })
}

/// Reads the whole file into memory and decodes it. The filesystem is only
/// touched here; everything past this call is pure in-memory work.
pub fn read_file(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<LasDocument, FormatError> {
    let buffer = fs::read(path)?;
    decode(&buffer, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{encode, EncodeOptions};
    use cloud_core::pointcloud::point::Point;

    fn sample_points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(i as f64, i as f64 * 2.0, 10.0 + i as f64))
            .collect()
    }

    #[test]
    fn max_points_truncates_hard() {
        let encoded = encode(&sample_points(20), &EncodeOptions::default()).unwrap();
        let options = DecodeOptions { max_points: Some(5) };
        let doc = decode(&encoded.bytes, &options).unwrap();
        assert_eq!(doc.points.len(), 5);
        // the first N records, in file order
        assert_eq!(doc.points[4].x, 4.0);
    }

    #[test]
    fn truncated_point_block_degrades_to_warning() {
        let encoded = encode(&sample_points(10), &EncodeOptions::default()).unwrap();
        let cut = encoded.bytes.len() - 25;
        let doc = decode(&encoded.bytes[..cut], &DecodeOptions::default()).unwrap();
        assert_eq!(doc.points.len(), 8);
        assert_eq!(doc.warnings.len(), 1);
        assert!(doc.warnings[0].message.contains("8 of 10"));
    }

    #[test]
    fn garbage_is_rejected() {
        let noise = vec![0u8; 400];
        assert!(matches!(
            decode(&noise, &DecodeOptions::default()),
            Err(FormatError::BadSignature { .. })
        ));
    }
}
