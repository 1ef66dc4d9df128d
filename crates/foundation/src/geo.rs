/// Geographic position in decimal degrees (WGS84) and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPosition {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
}

impl GeoPosition {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m: 0.0,
        }
    }

    pub fn with_altitude(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }
}

/// Initial great-circle bearing from `from` to `to`, in radians.
///
/// The raw `atan2` value in `(-π, π]` is the viewer yaw: 0 points north,
/// positive values rotate eastward. It is deliberately not converted to
/// degrees or wrapped into `[0, 2π)`; a rendering backend with a different
/// yaw convention must convert at its own boundary.
///
/// Identical inputs yield exactly 0 (`atan2(+0, +0)` is `+0`). Altitude does
/// not participate; the bearing is over the horizontal plane.
pub fn initial_bearing(from: GeoPosition, to: GeoPosition) -> f64 {
    let lat1 = from.lat_deg.to_radians();
    let lat2 = to.lat_deg.to_radians();
    let d_lon = (to.lon_deg - from.lon_deg).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    y.atan2(x)
}
