use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use telescope_types::{AxisConfig, CameraConfig, MotorConfig};

use crate::error::{Error, Result};

fn fixup_relative_path(path: &str, base_dir: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).map_err(|e| Error::ShellExpandLookupVarError {
        path: path.to_string(),
        source: e,
    })?;
    let expanded = Path::new(expanded.as_ref());
    if expanded.is_absolute() {
        Ok(expanded.to_path_buf())
    } else {
        Ok(base_dir.join(expanded))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObserverFile {
    lat: f64,
    lon: f64,
    elevation_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct CameraFile {
    name: Option<String>,
    #[serde(default)]
    default_gain: i32,
    default_exposure_us: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AxisFile {
    min_steps: i64,
    max_steps: i64,
    #[serde(default)]
    home_steps: i64,
    steps_per_degree: f64,
    max_speed_steps_per_s: f64,
    accel_time_s: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct MotorFile {
    altitude: AxisFile,
    azimuth: AxisFile,
    #[serde(default = "default_true")]
    simulate_timing: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    cameras: HashMap<String, CameraFile>,
    motor: MotorFile,
    observer: ObserverFile,
    data_dir: String,
    #[serde(default = "default_http_addr")]
    http_addr: String,
    sdk_library_path: Option<String>,
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "telescope-server")]
pub struct Cli {
    #[arg(long, default_value = "./telescope.toml")]
    pub config: PathBuf,

    #[arg(long)]
    pub finder_exposure_us: Option<u64>,
    #[arg(long)]
    pub finder_gain: Option<i32>,
    #[arg(long)]
    pub main_exposure_us: Option<u64>,
    #[arg(long)]
    pub main_gain: Option<i32>,

    #[arg(long)]
    pub observer_lat: Option<f64>,
    #[arg(long)]
    pub observer_lon: Option<f64>,
    #[arg(long)]
    pub observer_elevation_m: Option<f64>,

    #[arg(long)]
    pub data_dir: Option<String>,
    #[arg(long)]
    pub http_addr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObserverLocation {
    pub lat: f64,
    pub lon: f64,
    pub elevation_m: f64,
}

/// Fully resolved, immutable configuration built once at process startup
/// from compiled-in defaults, a TOML file, and CLI overrides, in that
/// priority order.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub cameras: HashMap<String, CameraConfig>,
    pub motor: MotorConfig,
    pub observer: ObserverLocation,
    pub data_dir: PathBuf,
    pub http_addr: String,
    pub sdk_library_path: Option<PathBuf>,
}

fn axis_config(file: AxisFile) -> AxisConfig {
    AxisConfig {
        min_steps: file.min_steps,
        max_steps: file.max_steps,
        home_steps: file.home_steps,
        steps_per_degree: file.steps_per_degree,
        max_speed_steps_per_s: file.max_speed_steps_per_s,
        accel_time_s: file.accel_time_s,
    }
}

/// Loads a TOML config file and layers CLI overrides on top. Relative paths
/// inside the file (`data_dir`, `sdk_library_path`) resolve relative to the
/// config file's own directory. Fails fast on malformed TOML or an
/// out-of-range field rather than starting with a partially valid config.
pub fn load(cli: &Cli) -> Result<AppConfig> {
    let raw = std::fs::read_to_string(&cli.config).map_err(|e| Error::Io { path: cli.config.clone(), source: e })?;
    let file: ConfigFile = toml::from_str(&raw).map_err(|e| Error::TomlDe { path: cli.config.clone(), source: e })?;

    let base_dir = cli
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut cameras = HashMap::new();
    for (key, camera_file) in file.cameras {
        let mut camera_config = CameraConfig {
            camera_id: key.clone(),
            name: camera_file.name,
            default_gain: camera_file.default_gain,
            default_exposure_us: camera_file.default_exposure_us,
        };
        match key.as_str() {
            "finder" => {
                if let Some(v) = cli.finder_exposure_us {
                    camera_config.default_exposure_us = v;
                }
                if let Some(v) = cli.finder_gain {
                    camera_config.default_gain = v;
                }
            }
            "main" => {
                if let Some(v) = cli.main_exposure_us {
                    camera_config.default_exposure_us = v;
                }
                if let Some(v) = cli.main_gain {
                    camera_config.default_gain = v;
                }
            }
            _ => {}
        }
        cameras.insert(key, camera_config);
    }

    let motor = MotorConfig {
        altitude: axis_config(file.motor.altitude),
        azimuth: axis_config(file.motor.azimuth),
        simulate_timing: file.motor.simulate_timing,
    };

    let observer = ObserverLocation {
        lat: cli.observer_lat.unwrap_or(file.observer.lat),
        lon: cli.observer_lon.unwrap_or(file.observer.lon),
        elevation_m: cli.observer_elevation_m.unwrap_or(file.observer.elevation_m),
    };
    if !(-90.0..=90.0).contains(&observer.lat) {
        return Err(Error::Invalid { field: "observer.lat".into(), detail: "must be in [-90, 90]".into() });
    }
    if !(-180.0..=180.0).contains(&observer.lon) {
        return Err(Error::Invalid { field: "observer.lon".into(), detail: "must be in [-180, 180]".into() });
    }

    let data_dir_raw = cli.data_dir.clone().unwrap_or(file.data_dir);
    let data_dir = fixup_relative_path(&data_dir_raw, &base_dir)?;

    let http_addr = cli.http_addr.clone().unwrap_or(file.http_addr);

    let sdk_library_path = file
        .sdk_library_path
        .map(|p| fixup_relative_path(&p, &base_dir))
        .transpose()?;

    Ok(AppConfig { cameras, motor, observer, data_dir, http_addr, sdk_library_path })
}
