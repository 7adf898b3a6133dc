use cloud_core::pointcloud::point::{Color, Point};
use las_codec::reader::{decode, read_file, DecodeOptions};
use las_codec::writer::{encode, write_file, EncodeOptions};
use las_codec::{GeoReference, PointRecord, Version};

fn survey_cloud() -> Vec<Point> {
    let mut points = Vec::new();
    for i in 0..200 {
        let mut point = Point::new(
            412_000.0 + (i % 20) as f64 * 0.75,
            6_543_000.0 + (i / 20) as f64 * 0.5,
            87.0 + (i % 7) as f64 * 1.25,
        );
        point.attributes.intensity = (i * 31 % 4096) as u16;
        point.attributes.return_number = (i % 3 + 1) as u8;
        point.attributes.number_of_returns = 3;
        point.attributes.classification = (i % 5 + 1) as u8;
        point.attributes.point_source_id = 12;
        point.attributes.gps_time = Some(300_000.0 + i as f64 * 0.01);
        point.color = Some(Color {
            r: (i * 300 % 65536) as u16,
            g: 20_000,
            b: (65535 - i * 100) as u16,
        });
        points.push(point);
    }
    points
}

fn decoded_points(bytes: &[u8]) -> Vec<PointRecord> {
    decode(bytes, &DecodeOptions::default()).unwrap().points
}

#[test]
fn format7_round_trip_preserves_everything() {
    let points = survey_cloud();
    let options = EncodeOptions {
        version: Version::V1_4,
        point_format: 7,
        ..EncodeOptions::default()
    };
    let encoded = encode(&points, &options).unwrap();
    assert!(!encoded.coercion.was_coerced());

    let decoded = decoded_points(&encoded.bytes);
    assert_eq!(decoded.len(), points.len());
    for (original, restored) in points.iter().zip(&decoded) {
        // geometry within one quantization step
        assert!((original.x - restored.x).abs() <= encoded.header.scale[0]);
        assert!((original.y - restored.y).abs() <= encoded.header.scale[1]);
        assert!((original.z - restored.z).abs() <= encoded.header.scale[2]);
        // everything non-geometric must survive exactly
        assert_eq!(original.color, restored.color);
        assert_eq!(original.attributes.intensity, restored.attributes.intensity);
        assert_eq!(
            original.attributes.return_number,
            restored.attributes.return_number
        );
        assert_eq!(
            original.attributes.number_of_returns,
            restored.attributes.number_of_returns
        );
        assert_eq!(
            original.attributes.classification,
            restored.attributes.classification
        );
        assert_eq!(original.attributes.gps_time, restored.attributes.gps_time);
    }
}

#[test]
fn format1_round_trip_on_legacy_version() {
    let points = survey_cloud();
    let options = EncodeOptions {
        version: Version::V1_2,
        point_format: 1,
        ..EncodeOptions::default()
    };
    let encoded = encode(&points, &options).unwrap();
    assert!(!encoded.coercion.was_coerced());
    assert_eq!(encoded.header.version, Version::V1_2);

    let decoded = decoded_points(&encoded.bytes);
    for (original, restored) in points.iter().zip(&decoded) {
        assert!((original.x - restored.x).abs() <= encoded.header.scale[0]);
        assert_eq!(original.attributes.gps_time, restored.attributes.gps_time);
        // format 1 has no color channel
        assert_eq!(restored.color, None);
    }
}

#[test]
fn format0_and_format7_agree_except_for_color() {
    // a small triangle-pair cloud with color attached
    let mut points = vec![
        Point::new(10.0, 10.0, 1.0),
        Point::new(20.0, 10.0, 2.0),
        Point::new(20.0, 20.0, 3.0),
        Point::new(10.0, 20.0, 4.0),
    ];
    for (i, point) in points.iter_mut().enumerate() {
        point.attributes.classification = (i + 2) as u8;
        point.color = Some(Color {
            r: 11_111 * (i as u16 + 1),
            g: 222,
            b: 33,
        });
    }

    let narrow = encode(
        &points,
        &EncodeOptions {
            version: Version::V1_2,
            point_format: 0,
            ..EncodeOptions::default()
        },
    )
    .unwrap();
    let rich = encode(
        &points,
        &EncodeOptions {
            version: Version::V1_4,
            point_format: 7,
            ..EncodeOptions::default()
        },
    )
    .unwrap();

    let narrow_points = decoded_points(&narrow.bytes);
    let rich_points = decoded_points(&rich.bytes);
    for ((original, a), b) in points.iter().zip(&narrow_points).zip(&rich_points) {
        assert!((a.x - b.x).abs() <= narrow.header.scale[0] + rich.header.scale[0]);
        assert!((a.y - b.y).abs() <= narrow.header.scale[1] + rich.header.scale[1]);
        assert!((a.z - b.z).abs() <= narrow.header.scale[2] + rich.header.scale[2]);
        assert_eq!(a.attributes.classification, b.attributes.classification);
        // only the rich format restores the color
        assert_eq!(a.color, None);
        assert_eq!(b.color, original.color);
    }
}

#[test]
fn encode_decode_through_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloud.las");

    let points = survey_cloud();
    let options = EncodeOptions {
        version: Version::V1_4,
        point_format: 7,
        georeference: Some(GeoReference {
            geokeys: las_codec::GeoKeyDirectory::for_projected_epsg(32633),
            wkt: None,
        }),
        ..EncodeOptions::default()
    };
    write_file(&path, &points, &options).unwrap();

    let doc = read_file(&path, &DecodeOptions::default()).unwrap();
    assert_eq!(doc.points.len(), points.len());
    assert_eq!(doc.geokeys().unwrap().projected_epsg(), Some(32633));
    assert!(doc.warnings.is_empty());
}

#[test]
fn decoded_counts_match_per_return_histogram() {
    let points = survey_cloud();
    let encoded = encode(
        &points,
        &EncodeOptions {
            version: Version::V1_2,
            point_format: 1,
            ..EncodeOptions::default()
        },
    )
    .unwrap();
    let doc = decode(&encoded.bytes, &DecodeOptions::default()).unwrap();

    let mut histogram = [0u64; 15];
    for point in &points {
        histogram[point.attributes.return_number as usize - 1] += 1;
    }
    assert_eq!(doc.header.points_by_return, histogram);
    assert_eq!(doc.header.point_count, points.len() as u64);
}
