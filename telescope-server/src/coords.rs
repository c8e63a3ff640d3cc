use chrono::{DateTime, Utc};
use telescope_config::ObserverLocation;

/// Equatorial coordinates derived from an alt-az reading.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RaDec {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Converts horizontal (alt/az) coordinates to equatorial (RA/Dec) given an
/// observer location and time. Kept behind a trait so the position endpoint
/// can be tested against a fixed, injected converter instead of real-time
/// sidereal calculations.
pub trait CoordinateConverter: Send + Sync {
    fn alt_az_to_ra_dec(&self, altitude_deg: f64, azimuth_deg: f64, observer: &ObserverLocation, at: DateTime<Utc>) -> RaDec;
}

/// Standard spherical-astronomy conversion using Greenwich Mean Sidereal
/// Time approximated from the Julian date.
pub struct StandardConverter;

impl CoordinateConverter for StandardConverter {
    fn alt_az_to_ra_dec(&self, altitude_deg: f64, azimuth_deg: f64, observer: &ObserverLocation, at: DateTime<Utc>) -> RaDec {
        let lat = observer.lat.to_radians();
        let alt = altitude_deg.to_radians();
        let az = azimuth_deg.to_radians();

        let sin_dec = alt.sin() * lat.sin() + alt.cos() * lat.cos() * az.cos();
        let dec = sin_dec.asin();

        let cos_h = (alt.sin() - lat.sin() * sin_dec) / (lat.cos() * dec.cos());
        let cos_h = cos_h.clamp(-1.0, 1.0);
        let mut hour_angle = cos_h.acos();
        if az.sin() > 0.0 {
            hour_angle = std::f64::consts::TAU - hour_angle;
        }

        let lst_deg = local_sidereal_time_deg(at, observer.lon);
        let ra_deg = normalize_deg(lst_deg - hour_angle.to_degrees());

        RaDec { ra_deg, dec_deg: dec.to_degrees() }
    }
}

fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Julian date for a UTC instant.
fn julian_date(at: DateTime<Utc>) -> f64 {
    let unix_days = at.timestamp() as f64 / 86400.0;
    2440587.5 + unix_days
}

/// Local sidereal time in degrees at `lon_deg` (east-positive), via the
/// standard GMST polynomial referenced to J2000.0.
fn local_sidereal_time_deg(at: DateTime<Utc>, lon_deg: f64) -> f64 {
    let jd = julian_date(at);
    let t = (jd - 2451545.0) / 36525.0;
    let gmst_deg = 280.46061837 + 360.98564736629 * (jd - 2451545.0) + 0.000387933 * t * t - t * t * t / 38_710_000.0;
    normalize_deg(gmst_deg + lon_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zenith_points_to_observer_latitude_declination() {
        let observer = ObserverLocation { lat: 45.0, lon: 0.0, elevation_m: 0.0 };
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let result = StandardConverter.alt_az_to_ra_dec(90.0, 0.0, &observer, at);
        assert!((result.dec_deg - 45.0).abs() < 0.5);
    }
}
