//! Route artifact exporters: CSV waypoint table, map deep links, KML/KMZ
//! polyline, SVG overlay.
//!
//! Each exporter is independent so that one failing artifact never discards
//! the others; the pipeline reports them per artifact.

use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::geo::Coordinate;

/// Base of the Google Maps directions deep link.
pub const MAPS_DIR_BASE: &str = "https://www.google.com/maps/dir/";

pub const CSV_FILE_NAME: &str = "waypoints.csv";
pub const KMZ_FILE_NAME: &str = "route.kmz";
pub const OVERLAY_FILE_NAME: &str = "overlay.svg";

/// One row of the exported waypoint table. Address fields are best-effort
/// and stay empty when enrichment is off or failed for the point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointRow {
    pub point: usize,
    pub street: String,
    pub neighbourhood: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

/// Write the waypoint table as CSV with a header row.
pub fn write_waypoint_csv(path: &Path, rows: &[WaypointRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// One directions deep link per waypoint batch, in path order.
pub fn maps_deep_links(batches: &[Vec<Coordinate>]) -> Vec<String> {
    batches
        .iter()
        .filter(|batch| !batch.is_empty())
        .map(|batch| {
            let mut link = String::from(MAPS_DIR_BASE);
            for point in batch {
                link.push_str(&format!("{:.6},{:.6}/", point.lat, point.lon));
            }
            link
        })
        .collect()
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// KML document with a single `LineString` of the full, non-sampled route.
pub fn route_kml(name: &str, coords: &[Coordinate]) -> String {
    let mut line = String::new();
    for point in coords {
        line.push_str(&format!("{:.6},{:.6},0 ", point.lon, point.lat));
    }
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n",
            "  <Document>\n",
            "    <name>{name}</name>\n",
            "    <Placemark>\n",
            "      <name>{name}</name>\n",
            "      <LineString>\n",
            "        <tessellate>1</tessellate>\n",
            "        <coordinates>{line}</coordinates>\n",
            "      </LineString>\n",
            "    </Placemark>\n",
            "  </Document>\n",
            "</kml>\n",
        ),
        name = xml_escape(name),
        line = line.trim_end(),
    )
}

/// Package the route KML as a KMZ archive (a zip holding `doc.kml`).
pub fn write_kmz(path: &Path, name: &str, coords: &[Coordinate]) -> Result<()> {
    let file = File::create(path)?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file("doc.kml", options)?;
    archive.write_all(route_kml(name, coords).as_bytes())?;
    archive.finish()?;
    Ok(())
}

/// Render the route polyline as a standalone SVG overlay.
///
/// Equirectangular projection with the horizontal axis compressed by the
/// cosine of the mid latitude, which keeps street geometry visually square
/// at city scale.
pub fn render_route_svg(coords: &[Coordinate], width: u32) -> String {
    const PADDING: f64 = 16.0;
    let width = f64::from(width.max(64));

    if coords.is_empty() {
        return format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{width}\" \
             viewBox=\"0 0 {width} {width}\"><rect width=\"100%\" height=\"100%\" \
             fill=\"#f5f2eb\"/></svg>\n"
        );
    }

    let mid_lat = coords.iter().map(|c| c.lat).sum::<f64>() / coords.len() as f64;
    let stretch = mid_lat.to_radians().cos().max(0.01);
    let xs: Vec<f64> = coords.iter().map(|c| c.lon * stretch).collect();
    let ys: Vec<f64> = coords.iter().map(|c| -c.lat).collect();

    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let span_x = (max_x - min_x).max(1e-9);
    let span_y = (max_y - min_y).max(1e-9);
    let scale = (width - 2.0 * PADDING) / span_x.max(span_y);
    let height = span_y * scale + 2.0 * PADDING;

    let mut points = String::new();
    for (x, y) in xs.iter().zip(&ys) {
        points.push_str(&format!(
            "{:.2},{:.2} ",
            (x - min_x) * scale + PADDING,
            (y - min_y) * scale + PADDING,
        ));
    }
    let start_x = (xs[0] - min_x) * scale + PADDING;
    let start_y = (ys[0] - min_y) * scale + PADDING;

    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" ",
            "viewBox=\"0 0 {w:.0} {h:.0}\">\n",
            "  <rect width=\"100%\" height=\"100%\" fill=\"#f5f2eb\"/>\n",
            "  <polyline points=\"{points}\" fill=\"none\" stroke=\"#c0392b\" ",
            "stroke-width=\"2.5\" stroke-linejoin=\"round\" stroke-linecap=\"round\"/>\n",
            "  <circle cx=\"{sx:.2}\" cy=\"{sy:.2}\" r=\"5\" fill=\"#27ae60\"/>\n",
            "</svg>\n",
        ),
        w = width,
        h = height,
        points = points.trim_end(),
        sx = start_x,
        sy = start_y,
    )
}

/// Write the SVG overlay to disk at a fixed 1024px width.
pub fn write_overlay_svg(path: &Path, coords: &[Coordinate]) -> Result<()> {
    std::fs::write(path, render_route_svg(coords, 1024))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    fn sample_coords() -> Vec<Coordinate> {
        vec![
            Coordinate::new(-23.5505, -46.6333),
            Coordinate::new(-23.5510, -46.6340),
            Coordinate::new(-23.5520, -46.6335),
            Coordinate::new(-23.5505, -46.6333),
        ]
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);
        let rows = vec![WaypointRow {
            point: 1,
            street: "Rua Augusta".to_string(),
            neighbourhood: "Consolação".to_string(),
            city: "São Paulo".to_string(),
            lat: -23.5505,
            lon: -46.6333,
        }];
        write_waypoint_csv(&path, &rows).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("point,street,neighbourhood,city,lat,lon"));
        assert!(contents.contains("Rua Augusta"));
    }

    #[test]
    fn deep_links_one_per_batch() {
        let batches = vec![sample_coords(), sample_coords()[..2].to_vec()];
        let links = maps_deep_links(&batches);
        assert_eq!(links.len(), 2);
        for link in &links {
            assert!(link.starts_with(MAPS_DIR_BASE));
            assert!(link.ends_with('/'));
        }
        assert!(links[0].contains("-23.550500,-46.633300/"));
    }

    #[test]
    fn empty_batches_produce_no_links() {
        assert!(maps_deep_links(&[Vec::new()]).is_empty());
    }

    #[test]
    fn kml_is_lon_lat_ordered() {
        let kml = route_kml("coverage", &sample_coords());
        assert!(kml.contains("<coordinates>-46.633300,-23.550500,0"));
        assert!(kml.contains("<name>coverage</name>"));
    }

    #[test]
    fn kml_name_is_escaped() {
        let kml = route_kml("a & b <c>", &sample_coords());
        assert!(kml.contains("a &amp; b &lt;c&gt;"));
    }

    #[test]
    fn kmz_round_trips_through_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(KMZ_FILE_NAME);
        write_kmz(&path, "coverage", &sample_coords()).unwrap();

        let file = File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut doc = archive.by_name("doc.kml").unwrap();
        let mut contents = String::new();
        doc.read_to_string(&mut contents).unwrap();
        assert!(contents.contains("<kml"));
        assert!(contents.contains("LineString"));
    }

    #[test]
    fn svg_contains_route_polyline() {
        let svg = render_route_svg(&sample_coords(), 1024);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn svg_handles_empty_route() {
        let svg = render_route_svg(&[], 1024);
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("polyline"));
    }
}
