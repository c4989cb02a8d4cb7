/// GPX track reader feeding the projection stage
use crate::error::{BuildError, Result};
use crate::geo::GeoPoint;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Parse every track point of every track segment, in document order.
/// Points without an elevation get 0.0.
pub fn parse_gpx_track<R: Read>(reader: R) -> Result<Vec<GeoPoint>> {
    let gpx = gpx::read(reader).map_err(|e| BuildError::GpxParse(e.to_string()))?;

    let mut points = Vec::new();
    for track in gpx.tracks {
        for segment in track.segments {
            for waypoint in segment.points {
                let geo = waypoint.point();
                points.push(GeoPoint::new(
                    geo.y(),
                    geo.x(),
                    waypoint.elevation.unwrap_or(0.0),
                ));
            }
        }
    }
    Ok(points)
}

/// Open and parse a GPX file from disk.
pub fn read_gpx_file(path: &Path) -> Result<Vec<GeoPoint>> {
    let file = File::open(path)?;
    parse_gpx_track(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>loop</name>
    <trkseg>
      <trkpt lat="46.5000" lon="7.5000"><ele>1200.5</ele></trkpt>
      <trkpt lat="46.5010" lon="7.5005"><ele>1204.0</ele></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="46.5020" lon="7.5010"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn reads_points_across_segments() {
        let points = parse_gpx_track(SAMPLE.as_bytes()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], GeoPoint::new(46.5, 7.5, 1200.5));
        assert_eq!(points[1].elevation, 1204.0);
    }

    #[test]
    fn missing_elevation_defaults_to_zero() {
        let points = parse_gpx_track(SAMPLE.as_bytes()).unwrap();
        assert_eq!(points[2].elevation, 0.0);
        assert!((points[2].lat - 46.502).abs() < 1e-12);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = parse_gpx_track("<gpx><trk>".as_bytes()).unwrap_err();
        assert!(matches!(err, BuildError::GpxParse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_gpx_file(Path::new("/nonexistent/track.gpx")).unwrap_err();
        assert!(matches!(err, BuildError::Io(_)));
    }
}
