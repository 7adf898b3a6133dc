//! Point record codec for formats 0 through 10.
//!
//! Every record starts with the quantized i32 coordinate triple and the
//! intensity. Formats 0-5 then use the legacy packed layout (3-bit return
//! fields, 5-bit classification, i8 scan angle); formats 6-10 use the
//! extended layout (4-bit return fields, flag/channel byte, full-byte
//! classification, 0.006-degree i16 scan angle, mandatory GPS time).
//! Optional trailing groups follow in fixed order: GPS time, RGB, NIR,
//! waveform packet. Which groups are present is decided by the format id
//! alone, never by inspecting the payload.

use cloud_core::pointcloud::point::{Color, Point, PointAttributes};

use crate::error::FormatError;
use crate::raw::{ByteWriter, SliceReader};

/// On-disk record length per format id. Read-only; some producers append
/// extra per-record bytes on top of these.
pub const RECORD_LENGTHS: [u16; 11] = [20, 28, 26, 34, 57, 63, 30, 36, 38, 59, 67];

/// Scale applied to the extended (formats 6+) i16 scan angle field.
pub const SCAN_ANGLE_SCALE: f32 = 0.006;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFormat {
    id: u8,
}

impl PointFormat {
    pub fn new(id: u8) -> Result<Self, FormatError> {
        if id as usize >= RECORD_LENGTHS.len() {
            return Err(FormatError::UnsupportedFormat(id));
        }
        Ok(PointFormat { id })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn record_length(&self) -> u16 {
        RECORD_LENGTHS[self.id as usize]
    }

    pub fn is_extended(&self) -> bool {
        self.id >= 6
    }

    pub fn has_gps_time(&self) -> bool {
        self.id != 0 && self.id != 2
    }

    pub fn has_rgb(&self) -> bool {
        matches!(self.id, 2 | 3 | 5 | 7 | 8 | 10)
    }

    pub fn has_nir(&self) -> bool {
        matches!(self.id, 8 | 10)
    }

    pub fn has_waveform(&self) -> bool {
        matches!(self.id, 4 | 5 | 9 | 10)
    }

    /// The encoder does not produce waveform data, so the waveform formats
    /// are read-only.
    pub fn is_writable(&self) -> bool {
        !self.has_waveform()
    }
}

/// Waveform packet descriptor fields carried by formats 4, 5, 9 and 10.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformPacket {
    pub descriptor_index: u8,
    pub byte_offset: u64,
    pub packet_size: u32,
    pub return_point_location: f32,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

/// A fully decoded point record: the raw quantized triple plus the
/// de-quantized real-world coordinates and every attribute the format
/// carries.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub raw: [i32; 3],
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Option<Color>,
    pub waveform: Option<WaveformPacket>,
    pub attributes: PointAttributes,
}

impl PointRecord {
    pub fn into_point(self) -> Point {
        Point {
            x: self.x,
            y: self.y,
            z: self.z,
            color: self.color,
            attributes: self.attributes,
        }
    }
}

/// Decodes one record. `buf` must hold at least the format's record length;
/// trailing extra bytes (producer-specific padding) are ignored.
pub fn decode_record(
    buf: &[u8],
    format: PointFormat,
    scale: &[f64; 3],
    offset: &[f64; 3],
) -> Result<PointRecord, FormatError> {
    let mut r = SliceReader::new(buf, "point record");
    let mut record = if format.is_extended() {
        read_extended_core(&mut r, scale, offset)?
    } else {
        read_legacy_core(&mut r, scale, offset)?
    };

    // Trailing groups in fixed order; presence is a pure function of the
    // format id. The extended core has already consumed its GPS time.
    if !format.is_extended() && format.has_gps_time() {
        record.attributes.gps_time = Some(r.read_f64()?);
    }
    if format.has_rgb() {
        record.color = Some(Color {
            r: r.read_u16()?,
            g: r.read_u16()?,
            b: r.read_u16()?,
        });
    }
    if format.has_nir() {
        record.attributes.nir = Some(r.read_u16()?);
    }
    if format.has_waveform() {
        record.waveform = Some(WaveformPacket {
            descriptor_index: r.read_u8()?,
            byte_offset: r.read_u64()?,
            packet_size: r.read_u32()?,
            return_point_location: r.read_f32()?,
            dx: r.read_f32()?,
            dy: r.read_f32()?,
            dz: r.read_f32()?,
        });
    }

    Ok(record)
}

fn read_coordinates(
    r: &mut SliceReader<'_>,
    scale: &[f64; 3],
    offset: &[f64; 3],
) -> Result<([i32; 3], [f64; 3]), FormatError> {
    let raw = [r.read_i32()?, r.read_i32()?, r.read_i32()?];
    let real = [
        raw[0] as f64 * scale[0] + offset[0],
        raw[1] as f64 * scale[1] + offset[1],
        raw[2] as f64 * scale[2] + offset[2],
    ];
    Ok((raw, real))
}

fn read_legacy_core(
    r: &mut SliceReader<'_>,
    scale: &[f64; 3],
    offset: &[f64; 3],
) -> Result<PointRecord, FormatError> {
    let (raw, real) = read_coordinates(r, scale, offset)?;
    let intensity = r.read_u16()?;

    let packed = r.read_u8()?;
    let class_byte = r.read_u8()?;
    let scan_angle_rank = r.read_i8()?;
    let user_data = r.read_u8()?;
    let point_source_id = r.read_u16()?;

    let attributes = PointAttributes {
        intensity,
        return_number: packed & 0x07,
        number_of_returns: (packed >> 3) & 0x07,
        scan_direction: packed & 0x40 != 0,
        edge_of_flight_line: packed & 0x80 != 0,
        classification: class_byte & 0x1F,
        synthetic: class_byte & 0x20 != 0,
        key_point: class_byte & 0x40 != 0,
        withheld: class_byte & 0x80 != 0,
        overlap: false,
        scanner_channel: 0,
        scan_angle: scan_angle_rank as f32,
        user_data,
        point_source_id,
        gps_time: None,
        nir: None,
    };

    Ok(PointRecord {
        raw,
        x: real[0],
        y: real[1],
        z: real[2],
        color: None,
        waveform: None,
        attributes,
    })
}

fn read_extended_core(
    r: &mut SliceReader<'_>,
    scale: &[f64; 3],
    offset: &[f64; 3],
) -> Result<PointRecord, FormatError> {
    let (raw, real) = read_coordinates(r, scale, offset)?;
    let intensity = r.read_u16()?;

    let returns = r.read_u8()?;
    let flags = r.read_u8()?;
    let classification = r.read_u8()?;
    let user_data = r.read_u8()?;
    let scan_angle = r.read_i16()?;
    let point_source_id = r.read_u16()?;
    let gps_time = r.read_f64()?;

    let attributes = PointAttributes {
        intensity,
        return_number: returns & 0x0F,
        number_of_returns: returns >> 4,
        scan_direction: flags & 0x40 != 0,
        edge_of_flight_line: flags & 0x80 != 0,
        classification,
        synthetic: flags & 0x01 != 0,
        key_point: flags & 0x02 != 0,
        withheld: flags & 0x04 != 0,
        overlap: flags & 0x08 != 0,
        scanner_channel: (flags >> 4) & 0x03,
        scan_angle: scan_angle as f32 * SCAN_ANGLE_SCALE,
        user_data,
        point_source_id,
        gps_time: Some(gps_time),
        nir: None,
    };

    Ok(PointRecord {
        raw,
        x: real[0],
        y: real[1],
        z: real[2],
        color: None,
        waveform: None,
        attributes,
    })
}

fn quantize(value: f64, scale: f64, offset: f64) -> i32 {
    ((value - offset) / scale)
        .round()
        .clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Encodes one record. Waveform formats are rejected (the writer's coercion
/// step never requests them).
pub fn encode_record(
    point: &Point,
    format: PointFormat,
    scale: &[f64; 3],
    offset: &[f64; 3],
    w: &mut ByteWriter,
) -> Result<(), FormatError> {
    if !format.is_writable() {
        return Err(FormatError::UnwritableFormat(format.id()));
    }

    w.write_i32(quantize(point.x, scale[0], offset[0]));
    w.write_i32(quantize(point.y, scale[1], offset[1]));
    w.write_i32(quantize(point.z, scale[2], offset[2]));
    let a = &point.attributes;
    w.write_u16(a.intensity);

    if format.is_extended() {
        let returns = (a.return_number & 0x0F) | ((a.number_of_returns & 0x0F) << 4);
        let mut flags = 0u8;
        flags |= a.synthetic as u8;
        flags |= (a.key_point as u8) << 1;
        flags |= (a.withheld as u8) << 2;
        flags |= (a.overlap as u8) << 3;
        flags |= (a.scanner_channel & 0x03) << 4;
        flags |= (a.scan_direction as u8) << 6;
        flags |= (a.edge_of_flight_line as u8) << 7;
        let scan_angle = (a.scan_angle / SCAN_ANGLE_SCALE)
            .round()
            .clamp(-30000.0, 30000.0) as i16;

        w.write_u8(returns);
        w.write_u8(flags);
        w.write_u8(a.classification);
        w.write_u8(a.user_data);
        w.write_i16(scan_angle);
        w.write_u16(a.point_source_id);
        w.write_f64(a.gps_time.unwrap_or(0.0));
    } else {
        let mut packed = a.return_number & 0x07;
        packed |= (a.number_of_returns & 0x07) << 3;
        packed |= (a.scan_direction as u8) << 6;
        packed |= (a.edge_of_flight_line as u8) << 7;
        // the legacy layout only has 5 bits of classification
        let mut class_byte = a.classification & 0x1F;
        class_byte |= (a.synthetic as u8) << 5;
        class_byte |= (a.key_point as u8) << 6;
        class_byte |= (a.withheld as u8) << 7;
        let scan_angle_rank = a.scan_angle.round().clamp(-90.0, 90.0) as i8;

        w.write_u8(packed);
        w.write_u8(class_byte);
        w.write_i8(scan_angle_rank);
        w.write_u8(a.user_data);
        w.write_u16(a.point_source_id);

        if format.has_gps_time() {
            w.write_f64(a.gps_time.unwrap_or(0.0));
        }
    }

    if format.has_rgb() {
        let color = point.color.unwrap_or_default();
        w.write_u16(color.r);
        w.write_u16(color.g);
        w.write_u16(color.b);
    }
    if format.has_nir() {
        w.write_u16(a.nir.unwrap_or(0));
    }

    Ok(())
}
