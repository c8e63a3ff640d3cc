use std::io::Write;
use std::path::{Path, PathBuf};

use telescope_types::SessionArchive;
use zip::write::FileOptions;
use zip::ZipWriter;

/// File extension for the session archive container.
pub const ARCHIVE_EXT: &str = "telescope-session.zip";

fn session_path(data_dir: &Path, archive: &SessionArchive) -> PathBuf {
    let start = archive.meta.start_time;
    data_dir
        .join(format!("{:04}", start.format("%Y")))
        .join(format!("{:02}", start.format("%m")))
        .join(format!("{:02}", start.format("%d")))
        .join(format!("{}.{}", archive.meta.session_id, ARCHIVE_EXT))
}

/// Writes a self-describing archive for the session to
/// `data_dir/YYYY/MM/DD/<session_id>.<ext>`. Frame bytes are stored as
/// individual zip entries alongside a small per-frame metadata sidecar so
/// the array dtype and dimensions survive without relying on any
/// particular numeric container format.
pub fn write_archive(data_dir: &Path, archive: &SessionArchive) -> anyhow::Result<PathBuf> {
    let path = session_path(data_dir, archive);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(&path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    write_json(&mut zip, options, "meta.json", &archive.meta)?;
    write_json(&mut zip, options, "observability.json", &archive.observability)?;
    write_json(&mut zip, options, "telemetry.json", &archive.telemetry)?;
    write_json(&mut zip, options, "calibration.json", &archive.calibration)?;

    for (camera_key, entry) in &archive.cameras {
        write_json(&mut zip, options, &format!("cameras/{camera_key}/info.json"), &entry.info)?;
        write_json(&mut zip, options, &format!("cameras/{camera_key}/settings.json"), &entry.settings)?;
        for (frame_type, frames) in [
            ("light", &entry.light),
            ("dark", &entry.dark),
            ("flat", &entry.flat),
            ("bias", &entry.bias),
        ] {
            for (idx, frame) in frames.iter().enumerate() {
                let base = format!("cameras/{camera_key}/{frame_type}/{idx:05}");
                zip.start_file(format!("{base}.bin"), options)?;
                zip.write_all(&frame.data)?;
                let sidecar = serde_json::json!({
                    "dtype": frame.dtype,
                    "width": frame.width,
                    "height": frame.height,
                    "meta": frame.meta,
                });
                write_json(&mut zip, options, &format!("{base}.json"), &sidecar)?;
            }
        }
    }

    zip.finish()?;
    Ok(path)
}

fn write_json<T: serde::Serialize>(
    zip: &mut ZipWriter<std::fs::File>,
    options: FileOptions,
    name: &str,
    value: &T,
) -> anyhow::Result<()> {
    zip.start_file(name, options)?;
    let bytes = serde_json::to_vec_pretty(value)?;
    zip.write_all(&bytes)?;
    Ok(())
}

/// Re-opens a previously written archive and reconstructs the
/// [`SessionArchive`] payload. Used by tests and any offline tooling that
/// needs to inspect a closed session.
pub fn read_archive(path: &Path) -> anyhow::Result<SessionArchive> {
    let file = std::fs::File::open(path)?;
    let mut zip = zip::ZipArchive::new(file)?;

    let meta = read_json(&mut zip, "meta.json")?;
    let observability = read_json(&mut zip, "observability.json")?;
    let telemetry = read_json(&mut zip, "telemetry.json")?;
    let calibration = read_json(&mut zip, "calibration.json")?;

    let mut cameras = std::collections::HashMap::new();
    let names: Vec<String> = zip.file_names().map(|s| s.to_string()).collect();
    let mut camera_keys = std::collections::HashSet::new();
    for name in &names {
        if let Some(rest) = name.strip_prefix("cameras/") {
            if let Some((key, _)) = rest.split_once('/') {
                camera_keys.insert(key.to_string());
            }
        }
    }

    for key in camera_keys {
        let info = read_json(&mut zip, &format!("cameras/{key}/info.json")).unwrap_or_default();
        let settings = read_json(&mut zip, &format!("cameras/{key}/settings.json")).unwrap_or_default();
        let mut entry = telescope_types::CameraSessionEntry { info, settings, ..Default::default() };

        for frame_type_name in ["light", "dark", "flat", "bias"] {
            let mut idx = 0;
            loop {
                let base = format!("cameras/{key}/{frame_type_name}/{idx:05}");
                let Ok(sidecar) = read_json::<serde_json::Value>(&mut zip, &format!("{base}.json")) else {
                    break;
                };
                let data = read_bytes(&mut zip, &format!("{base}.bin"))?;
                let record = telescope_types::FrameRecord {
                    data,
                    dtype: sidecar["dtype"].as_str().unwrap_or("uint8").to_string(),
                    width: sidecar["width"].as_u64().unwrap_or(0) as u32,
                    height: sidecar["height"].as_u64().unwrap_or(0) as u32,
                    meta: serde_json::from_value(sidecar["meta"].clone()).unwrap_or_default(),
                };
                let list = match frame_type_name {
                    "light" => &mut entry.light,
                    "dark" => &mut entry.dark,
                    "flat" => &mut entry.flat,
                    _ => &mut entry.bias,
                };
                list.push(record);
                idx += 1;
            }
        }
        cameras.insert(key, entry);
    }

    Ok(SessionArchive { meta, observability, telemetry, calibration, cameras })
}

fn read_json<T: serde::de::DeserializeOwned>(zip: &mut zip::ZipArchive<std::fs::File>, name: &str) -> anyhow::Result<T> {
    let mut file = zip.by_name(name)?;
    let value = serde_json::from_reader(&mut file)?;
    Ok(value)
}

fn read_bytes(zip: &mut zip::ZipArchive<std::fs::File>, name: &str) -> anyhow::Result<Vec<u8>> {
    use std::io::Read;
    let mut file = zip.by_name(name)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
