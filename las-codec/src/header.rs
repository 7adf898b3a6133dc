//! Fixed-layout LAS file header, revisions 1.2 through 1.4.

use crate::error::FormatError;
use crate::point::PointFormat;
use crate::raw::{ByteWriter, SliceReader};

pub const SIGNATURE: [u8; 4] = *b"LASF";

/// LAS format revision. Ordering follows (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const V1_2: Version = Version { major: 1, minor: 2 };
    pub const V1_3: Version = Version { major: 1, minor: 3 };
    pub const V1_4: Version = Version { major: 1, minor: 4 };

    pub fn new(major: u8, minor: u8) -> Self {
        Version { major, minor }
    }

    /// Size of the fixed header block for this revision.
    pub fn header_size(&self) -> u16 {
        match self.minor {
            2 => 227,
            3 => 235,
            _ => 375,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.major == 1 && (2..=4).contains(&self.minor)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LasHeader {
    pub file_source_id: u16,
    pub global_encoding: u16,
    pub project_id: [u8; 16],
    pub version: Version,
    pub system_identifier: String,
    pub generating_software: String,
    pub file_creation_day: u16,
    pub file_creation_year: u16,
    pub header_size: u16,
    pub offset_to_point_data: u32,
    pub number_of_vlrs: u32,
    pub point_format: u8,
    pub point_record_length: u16,
    pub legacy_point_count: u32,
    pub legacy_points_by_return: [u32; 5],
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub max_x: f64,
    pub min_x: f64,
    pub max_y: f64,
    pub min_y: f64,
    pub max_z: f64,
    pub min_z: f64,
    /// Offset to the waveform data packet record (1.3+).
    pub waveform_data_start: u64,
    /// Offset to the first extended VLR (1.4+).
    pub first_evlr_offset: u64,
    pub evlr_count: u32,
    /// Canonical point count, valid for every revision. For files older
    /// than 1.4 this is back-filled from the legacy 32-bit field.
    pub point_count: u64,
    pub points_by_return: [u64; 15],
}

impl LasHeader {
    /// Reads the fixed header from the start of `buf`. Field offsets branch
    /// on the minor version: the base 227-byte block is common, 1.3 appends
    /// the waveform offset, 1.4 appends the EVLR block and 64-bit counts.
    pub fn decode(buf: &[u8]) -> Result<LasHeader, FormatError> {
        let mut r = SliceReader::new(buf, "file header");

        let signature = r.read_bytes(4)?;
        if signature != &SIGNATURE[..] {
            return Err(FormatError::BadSignature {
                found: [signature[0], signature[1], signature[2], signature[3]],
            });
        }

        let file_source_id = r.read_u16()?;
        let global_encoding = r.read_u16()?;
        let mut project_id = [0u8; 16];
        project_id.copy_from_slice(r.read_bytes(16)?);
        let version = Version::new(r.read_u8()?, r.read_u8()?);
        if !version.is_supported() {
            return Err(FormatError::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
            });
        }

        let system_identifier = r.read_string(32)?;
        let generating_software = r.read_string(32)?;
        let file_creation_day = r.read_u16()?;
        let file_creation_year = r.read_u16()?;
        let header_size = r.read_u16()?;
        let offset_to_point_data = r.read_u32()?;
        let number_of_vlrs = r.read_u32()?;
        let point_format = r.read_u8()?;
        let point_record_length = r.read_u16()?;
        let legacy_point_count = r.read_u32()?;
        let mut legacy_points_by_return = [0u32; 5];
        for slot in legacy_points_by_return.iter_mut() {
            *slot = r.read_u32()?;
        }
        let scale = [r.read_f64()?, r.read_f64()?, r.read_f64()?];
        let offset = [r.read_f64()?, r.read_f64()?, r.read_f64()?];
        let max_x = r.read_f64()?;
        let min_x = r.read_f64()?;
        let max_y = r.read_f64()?;
        let min_y = r.read_f64()?;
        let max_z = r.read_f64()?;
        let min_z = r.read_f64()?;

        let mut waveform_data_start = 0;
        let mut first_evlr_offset = 0;
        let mut evlr_count = 0;
        let mut point_count = 0;
        let mut points_by_return = [0u64; 15];

        if version.minor >= 3 {
            waveform_data_start = r.read_u64()?;
        }
        if version.minor >= 4 {
            first_evlr_offset = r.read_u64()?;
            evlr_count = r.read_u32()?;
            point_count = r.read_u64()?;
            for slot in points_by_return.iter_mut() {
                *slot = r.read_u64()?;
            }
        }

        // One canonical count regardless of revision: older files only carry
        // the 32-bit fields, and some 1.4 writers still leave the 64-bit
        // count zeroed while populating the legacy one.
        if version.minor < 4 || (point_count == 0 && legacy_point_count != 0) {
            point_count = legacy_point_count as u64;
            for (i, &legacy) in legacy_points_by_return.iter().enumerate() {
                points_by_return[i] = legacy as u64;
            }
        }

        if (header_size as usize) < r.position() {
            return Err(FormatError::InvalidHeader(format!(
                "declared header size {} is smaller than the {} layout ({} bytes)",
                header_size,
                version,
                r.position()
            )));
        }
        if offset_to_point_data < header_size as u32 {
            return Err(FormatError::InvalidHeader(format!(
                "point data offset {} lies inside the {}-byte header",
                offset_to_point_data, header_size
            )));
        }

        Ok(LasHeader {
            file_source_id,
            global_encoding,
            project_id,
            version,
            system_identifier,
            generating_software,
            file_creation_day,
            file_creation_year,
            header_size,
            offset_to_point_data,
            number_of_vlrs,
            point_format,
            point_record_length,
            legacy_point_count,
            legacy_points_by_return,
            scale,
            offset,
            max_x,
            min_x,
            max_y,
            min_y,
            max_z,
            min_z,
            waveform_data_start,
            first_evlr_offset,
            evlr_count,
            point_count,
            points_by_return,
        })
    }

    /// Writes the fixed header for this header's own revision. The layout is
    /// the exact mirror of [`LasHeader::decode`].
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(self.header_size as usize);
        w.write_bytes(&SIGNATURE);
        w.write_u16(self.file_source_id);
        w.write_u16(self.global_encoding);
        w.write_bytes(&self.project_id);
        w.write_u8(self.version.major);
        w.write_u8(self.version.minor);
        w.write_string(&self.system_identifier, 32);
        w.write_string(&self.generating_software, 32);
        w.write_u16(self.file_creation_day);
        w.write_u16(self.file_creation_year);
        w.write_u16(self.header_size);
        w.write_u32(self.offset_to_point_data);
        w.write_u32(self.number_of_vlrs);
        w.write_u8(self.point_format);
        w.write_u16(self.point_record_length);
        w.write_u32(self.legacy_point_count);
        for &count in &self.legacy_points_by_return {
            w.write_u32(count);
        }
        for &value in &self.scale {
            w.write_f64(value);
        }
        for &value in &self.offset {
            w.write_f64(value);
        }
        w.write_f64(self.max_x);
        w.write_f64(self.min_x);
        w.write_f64(self.max_y);
        w.write_f64(self.min_y);
        w.write_f64(self.max_z);
        w.write_f64(self.min_z);

        if self.version.minor >= 3 {
            w.write_u64(self.waveform_data_start);
        }
        if self.version.minor >= 4 {
            w.write_u64(self.first_evlr_offset);
            w.write_u32(self.evlr_count);
            w.write_u64(self.point_count);
            for &count in &self.points_by_return {
                w.write_u64(count);
            }
        }

        w.into_bytes()
    }
}

/// Outcome of reconciling a requested (version, point format) pair with what
/// the format family actually allows. Never fails: mismatches are resolved
/// and reported as notes the caller can inspect or log.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercion {
    pub version: Version,
    pub point_format: u8,
    pub notes: Vec<String>,
}

impl Coercion {
    pub fn was_coerced(&self) -> bool {
        !self.notes.is_empty()
    }
}

/// Resolves version/format mismatches in favor of upgrading the version:
/// extended formats (6+) force 1.4, as does a point count beyond the legacy
/// 32-bit field. Formats this writer cannot produce (the waveform formats
/// 4/5/9/10, or unknown ids) fall back to format 0.
pub fn coerce_version_format(version: Version, point_format: u8, point_count: u64) -> Coercion {
    let mut notes = Vec::new();
    let mut version = version;
    let mut format = point_format;

    if !version.is_supported() {
        let clamped = if version < Version::V1_2 {
            Version::V1_2
        } else {
            Version::V1_4
        };
        notes.push(format!(
            "LAS version {} is not writable; using {}",
            version, clamped
        ));
        version = clamped;
    }

    let writable = PointFormat::new(format)
        .map(|f| f.is_writable())
        .unwrap_or(false);
    if !writable {
        notes.push(format!(
            "point format {} is not writable; falling back to format 0",
            format
        ));
        format = 0;
    }

    if format >= 6 && version < Version::V1_4 {
        notes.push(format!(
            "point format {} requires LAS 1.4; upgrading from {}",
            format, version
        ));
        version = Version::V1_4;
    }

    if point_count > u32::MAX as u64 && version < Version::V1_4 {
        notes.push(format!(
            "{} points exceed the legacy 32-bit count; upgrading from {} to 1.4",
            point_count, version
        ));
        version = Version::V1_4;
    }

    for note in &notes {
        log::warn!("{}", note);
    }

    Coercion {
        version,
        point_format: format,
        notes,
    }
}
