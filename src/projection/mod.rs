//! TWD97 grid to WGS84 geographic coordinate conversion
//!
//! The road feed reports positions in the TWD97 Transverse Mercator grid
//! (GRS80 ellipsoid, central meridian 121°E, scale factor 0.9999, false
//! easting 250 km). [`twd97_to_wgs84`] implements the closed-form inverse
//! projection via the footprint-latitude series expansion.

/// Semi-major axis of the GRS80 ellipsoid in meters
const A: f64 = 6_378_137.0;
/// Semi-minor axis of the GRS80 ellipsoid in meters
const B: f64 = 6_356_752.314_245;
/// Central meridian of the TWD97 TM2 zone in radians
const LON_ORIGIN: f64 = 121.0 * std::f64::consts::PI / 180.0;
/// Scale factor along the central meridian
const K0: f64 = 0.9999;
/// False easting in meters
const DX: f64 = 250_000.0;
/// False northing in meters
const DY: f64 = 0.0;

/// Convert a TWD97 planar coordinate to WGS84 latitude/longitude in degrees.
///
/// Pure numeric function; the domain is unrestricted, callers are expected
/// to supply valid grid coordinates.
pub fn twd97_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let e = (1.0 - B.powi(2) / A.powi(2)).sqrt();

    let x = x - DX;
    let y = y - DY;

    // Footprint latitude from the meridional arc length
    let m = y / K0;
    let mu = m / (A * (1.0 - e.powi(2) / 4.0 - 3.0 * e.powi(4) / 64.0 - 5.0 * e.powi(6) / 256.0));
    let e1 = (1.0 - (1.0 - e.powi(2)).sqrt()) / (1.0 + (1.0 - e.powi(2)).sqrt());

    let j1 = 3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0;
    let j2 = 21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0;
    let j3 = 151.0 * e1.powi(3) / 96.0;
    let j4 = 1097.0 * e1.powi(4) / 512.0;
    let fp = mu
        + j1 * (2.0 * mu).sin()
        + j2 * (4.0 * mu).sin()
        + j3 * (6.0 * mu).sin()
        + j4 * (8.0 * mu).sin();

    // Radii of curvature and auxiliary terms at the footprint latitude
    let e2 = (e * A / B).powi(2);
    let c1 = (e2 * fp.cos()).powi(2);
    let t1 = fp.tan().powi(2);
    let r1 = A * (1.0 - e.powi(2)) / (1.0 - e.powi(2) * fp.sin().powi(2)).powf(1.5);
    let n1 = A / (1.0 - e.powi(2) * fp.sin().powi(2)).sqrt();
    let d = x / (n1 * K0);

    // Inverse-TM correction series
    let q1 = n1 * fp.tan() / r1;
    let q2 = d.powi(2) / 2.0;
    let q3 = (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * e2) * d.powi(4) / 24.0;
    let q4 = (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 3.0 * c1.powi(2) - 252.0 * e2)
        * d.powi(6)
        / 720.0;
    let latitude = fp - q1 * (q2 - q3 + q4);

    let q5 = d;
    let q6 = (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0;
    let q7 = (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * e2 + 24.0 * t1.powi(2))
        * d.powi(5)
        / 120.0;
    let longitude = LON_ORIGIN + (q5 - q6 + q7) / fp.cos();

    (latitude.to_degrees(), longitude.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_meridian_fixed_point() {
        // At the false easting the point lies on the central meridian.
        let (_, lon) = twd97_to_wgs84(250_000.0, 2_774_899.7146);
        assert!((lon - 121.0).abs() < 1e-9, "lon = {lon}");
    }

    #[test]
    fn test_equator_fixed_point() {
        let (lat, _) = twd97_to_wgs84(250_000.0, 0.0);
        assert!(lat.abs() < 1e-9, "lat = {lat}");
    }

    #[test]
    fn test_taipei_worked_example() {
        // Documented worked example from the survey-grid reference.
        let (lat, lon) = twd97_to_wgs84(298_978.8217, 2_774_899.7146);
        assert!((lat - 25.0).abs() < 0.2, "lat = {lat}");
        assert!((lon - 121.5).abs() < 0.2, "lon = {lon}");
    }

    #[test]
    fn test_monotonic_in_grid_axes() {
        let (lat0, lon0) = twd97_to_wgs84(250_000.0, 2_700_000.0);
        let (lat_east, lon_east) = twd97_to_wgs84(260_000.0, 2_700_000.0);
        let (lat_north, _) = twd97_to_wgs84(250_000.0, 2_710_000.0);
        assert!(lon_east > lon0);
        assert!(lat_north > lat0);
        assert!((lat_east - lat0).abs() < 0.01);
        assert!((lon_east - lon0).abs() > 0.05);
    }
}
