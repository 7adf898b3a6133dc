use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::{Datelike, Local};
use clap::Parser;
use env_logger::Builder;
use glob::glob;
use log::LevelFilter;

use cloud_core::pointcloud::point::{Point, PointCloud};
use cloud_core::pointcloud::postprocess;
use crs_transformer::{is_geographic, write_projection_sidecar, PointTransformer};
use las_codec::reader::{read_file, DecodeOptions};
use las_codec::writer::{write_file, EncodeOptions, GeoReference};
use las_codec::{GeoKeyDirectory, Version};
use surface_builder::{apply_elevation_colors, build_surface, SurfaceParams};

#[derive(Parser, Debug)]
#[command(
    name = "Point Mesher",
    about = "A tool for converting LAS point clouds into cleaned clouds and surface meshes",
    version = "0.1.0"
)]
struct Cli {
    #[arg(short, long, required = true, num_args = 1.., value_name = "FILE")]
    input: Vec<String>,

    #[arg(short, long, required = true, value_name = "DIR")]
    output: String,

    /// Hard cap on the number of records read per file (first N records).
    #[arg(long, value_name = "COUNT")]
    limit: Option<u64>,

    /// Collapse points closer than this planar distance.
    #[arg(long, value_name = "DISTANCE")]
    xy_tolerance: Option<f64>,

    /// Thin the cloud to at most this many points (uniform stride).
    #[arg(long, value_name = "COUNT")]
    target_points: Option<usize>,

    /// Reproject geographic input into this projected catalog code.
    #[arg(long, value_name = "CODE")]
    target_epsg: Option<u16>,

    /// Also triangulate the cloud and write a surface mesh.
    #[arg(long)]
    surface: bool,

    /// Discard triangles with an edge longer than this (0 disables).
    #[arg(long, default_value_t = 0.0, value_name = "LENGTH")]
    max_edge_length: f64,

    /// Discard triangles with an internal angle smaller than this (0 disables).
    #[arg(long, default_value_t = 0.0, value_name = "DEGREES")]
    min_angle: f64,

    /// Measure edge lengths in 3D instead of the XY plane.
    #[arg(long)]
    edge_3d: bool,

    /// Measure cull angles in 3D instead of the XY plane.
    #[arg(long)]
    angle_3d: bool,

    /// LAS minor version to write (1.2, 1.3 or 1.4).
    #[arg(long, default_value_t = 4)]
    las_minor: u8,

    /// LAS point record format to write.
    #[arg(long, default_value_t = 7)]
    point_format: u8,
}

fn expand_globs(input_patterns: Vec<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for pattern in input_patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            for entry in glob(&pattern).expect("Failed to read glob pattern") {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => eprintln!("Error: {:?}", e),
                }
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    paths
}

fn main() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .init();

    let args = Cli::parse();

    log::info!("input files: {:?}", args.input);
    log::info!("output folder: {}", args.output);

    let start = std::time::Instant::now();

    let input_files = expand_globs(args.input);
    if input_files.is_empty() {
        log::error!("no input files matched");
        return;
    }

    let output_path = PathBuf::from(&args.output);
    std::fs::create_dir_all(&output_path).unwrap();

    log::info!("start decoding...");
    let start_local = std::time::Instant::now();
    let options = DecodeOptions {
        max_points: args.limit,
    };
    let mut points: Vec<Point> = Vec::new();
    for file in &input_files {
        let document = match read_file(file, &options) {
            Ok(document) => document,
            Err(e) => {
                log::error!("failed to decode {:?}: {}", file, e);
                return;
            }
        };
        log::info!(
            "{:?}: LAS {} format {} with {} points, {} warnings",
            file,
            document.header.version,
            document.header.point_format,
            document.points.len(),
            document.warnings.len()
        );
        if let Some(wkt) = document.wkt() {
            log::info!("embedded coordinate system: {}", wkt);
        }
        points.extend(document.into_point_cloud().points);
    }
    let mut cloud = PointCloud::new(points);
    log::info!(
        "finish decoding {} points in {:?}",
        cloud.len(),
        start_local.elapsed()
    );

    let geographic = is_geographic(&cloud.bounds);
    log::info!(
        "bounds look {}",
        if geographic { "geographic (degrees)" } else { "projected (linear units)" }
    );

    let mut reprojected_to: Option<u16> = None;
    if let Some(code) = args.target_epsg {
        if geographic {
            log::info!("start reprojecting to {}...", code);
            let start_local = std::time::Instant::now();
            let transformer = match PointTransformer::from_codes(4326, code) {
                Ok(transformer) => transformer,
                Err(e) => {
                    log::error!("cannot build projection for {}: {}", code, e);
                    return;
                }
            };
            cloud = match transformer.transform_cloud(&cloud) {
                Ok(cloud) => cloud,
                Err(e) => {
                    log::error!("reprojection failed: {}", e);
                    return;
                }
            };
            reprojected_to = Some(code);
            log::info!("finish reprojecting in {:?}", start_local.elapsed());
        } else {
            log::warn!("input is already projected; ignoring --target-epsg {}", code);
        }
    }

    if let Some(tolerance) = args.xy_tolerance {
        let result = postprocess::deduplicate(&cloud.points, tolerance);
        log::info!(
            "deduplicated {} -> {} points (tolerance {})",
            result.original_count,
            result.unique_count,
            tolerance
        );
        cloud = PointCloud::new(result.points);
    }
    if let Some(target) = args.target_points {
        let before = cloud.len();
        let thinned = postprocess::decimate(&cloud.points, target);
        log::info!("decimated {} -> {} points (target {})", before, thinned.len(), target);
        cloud = PointCloud::new(thinned);
    }

    log::info!("start encoding...");
    let start_local = std::time::Instant::now();
    let now = Local::now();
    let georeference = reprojected_to.map(|code| GeoReference {
        geokeys: GeoKeyDirectory::for_projected_epsg(code),
        wkt: None,
    });
    let encode_options = EncodeOptions {
        version: Version::new(1, args.las_minor),
        point_format: args.point_format,
        file_creation_day: now.ordinal() as u16,
        file_creation_year: now.year() as u16,
        georeference,
        ..EncodeOptions::default()
    };
    let las_path = output_path.join("cloud.las");
    let encoded = match write_file(&las_path, &cloud.points, &encode_options) {
        Ok(encoded) => encoded,
        Err(e) => {
            log::error!("failed to encode {:?}: {}", las_path, e);
            return;
        }
    };
    for note in &encoded.coercion.notes {
        log::warn!("encoder: {}", note);
    }
    log::info!(
        "wrote {:?} (LAS {} format {}, {} bytes) in {:?}",
        las_path,
        encoded.header.version,
        encoded.header.point_format,
        encoded.bytes.len(),
        start_local.elapsed()
    );

    if let Some(code) = reprojected_to {
        match write_projection_sidecar(&las_path, code) {
            Ok(path) => log::info!("projection sidecar: {:?}", path),
            Err(e) => {
                log::error!("failed to write projection sidecar: {}", e);
                return;
            }
        }
    }

    if args.surface {
        log::info!("start triangulating...");
        let start_local = std::time::Instant::now();
        let styled =
            apply_elevation_colors(&cloud.points, cloud.bounds.min[2], cloud.bounds.max[2]);
        let params = SurfaceParams {
            max_edge_length: args.max_edge_length,
            min_angle: args.min_angle,
            consider_3d_length: args.edge_3d,
            consider_3d_angle: args.angle_3d,
        };
        let surface = match build_surface(&styled, &params) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("triangulation failed: {}", e);
                return;
            }
        };
        log::info!(
            "{} triangles from {} points ({} culled by edge length, {} by angle)",
            surface.stats.triangle_count,
            surface.stats.point_count,
            surface.stats.culled_by_edge,
            surface.stats.culled_by_angle
        );

        let mesh_path = output_path.join("surface.json");
        fs::write(&mesh_path, serde_json::to_string_pretty(&surface).unwrap()).unwrap();
        log::info!(
            "wrote {:?} in {:?}",
            mesh_path,
            start_local.elapsed()
        );
    }

    log::info!("Elapsed: {:?}", start.elapsed());
    log::info!("Finish processing");
}
