use chrono::Utc;
use telescope_types::{SensorReading, Vec3};

/// Lines the Arduino firmware emits that are not data records. Matched by
/// prefix, per the wire protocol: informational/ack/error/echo lines the
/// parser must skip rather than attempt to split into fields.
const IGNORED_PREFIXES: &[&str] = &["INFO:", "OK:", "ERROR:", "CMD:", "===", "---"];

/// Parses one CRLF-stripped ASCII line from the sensor into a reading.
///
/// Accepts two tab-separated schemes:
/// - 8 fields: `aX aY aZ mX mY mZ temp humidity`
/// - 6 fields (legacy): `aX aZ aY mX mZ mY` (note the swapped Y/Z order)
///
/// Returns `None` for ignorable protocol lines (acks, info, echoes) rather
/// than an error, since the caller should simply keep reading.
pub fn parse_line(line: &str) -> anyhow::Result<Option<SensorReading>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Ok(None);
    }
    if IGNORED_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('\t').collect();
    let parsed: anyhow::Result<Vec<f64>> = fields
        .iter()
        .map(|f| f.trim().parse::<f64>().map_err(anyhow::Error::from))
        .collect();
    let values = match parsed {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let (accel, mag, temperature_c, humidity_pct) = match values.as_slice() {
        [a_x, a_y, a_z, m_x, m_y, m_z, temp, hum] => (
            Vec3 { x: *a_x, y: *a_y, z: *a_z },
            Vec3 { x: *m_x, y: *m_y, z: *m_z },
            *temp,
            *hum,
        ),
        // legacy 6-field scheme: aX aZ aY mX mZ mY
        [a_x, a_z, a_y, m_x, m_z, m_y] => (
            Vec3 { x: *a_x, y: *a_y, z: *a_z },
            Vec3 { x: *m_x, y: *m_y, z: *m_z },
            0.0,
            0.0,
        ),
        _ => anyhow::bail!("unrecognized sensor record: {line}"),
    };

    let azimuth_deg = mag.y.atan2(mag.x).to_degrees().rem_euclid(360.0);
    let altitude_deg = accel.z.atan2((accel.x.powi(2) + accel.y.powi(2)).sqrt()).to_degrees();

    Ok(Some(SensorReading {
        accel,
        mag,
        altitude_deg,
        azimuth_deg,
        temperature_c,
        humidity_pct,
        timestamp_utc: Utc::now(),
        raw_values: line.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_eight_field_record() {
        let reading = parse_line("0.1\t0.2\t9.8\t20.0\t5.0\t1.0\t21.5\t45.0\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(reading.temperature_c, 21.5);
        assert_eq!(reading.humidity_pct, 45.0);
    }

    #[test]
    fn ignores_protocol_lines() {
        assert!(parse_line("OK: ready").unwrap().is_none());
        assert!(parse_line("INFO: booted").unwrap().is_none());
        assert!(parse_line("=== STATUS ===").unwrap().is_none());
    }

    #[test]
    fn parses_legacy_six_field_record() {
        let reading = parse_line("0.1\t9.8\t0.2\t20.0\t1.0\t5.0").unwrap().unwrap();
        assert_eq!(reading.temperature_c, 0.0);
    }
}
