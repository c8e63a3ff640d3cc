use std::collections::HashMap;

use rand::Rng;
use telescope_types::{CameraInfo, ControlInfo};

use super::{CameraDescriptor, CameraDriverModule, CameraInstance, ImageType};

#[derive(Debug, Clone)]
pub struct TwinCameraConfig {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub is_color: bool,
}

impl Default for TwinCameraConfig {
    fn default() -> Self {
        TwinCameraConfig {
            id: "twin0".into(),
            name: "Digital Twin Camera".into(),
            width: 1280,
            height: 960,
            is_color: false,
        }
    }
}

/// Deterministic stand-in for a vendor SDK camera: generates synthetic noise
/// frames instead of reading a sensor. Used for tests and for development
/// without hardware attached.
pub struct TwinCameraDriver {
    config: TwinCameraConfig,
}

impl TwinCameraDriver {
    pub fn new(config: TwinCameraConfig) -> Self {
        TwinCameraDriver { config }
    }
}

impl CameraDriverModule for TwinCameraDriver {
    fn discover(&self) -> anyhow::Result<Vec<CameraDescriptor>> {
        Ok(vec![CameraDescriptor {
            id: self.config.id.clone(),
            device_type: "digital_twin".into(),
            name: self.config.name.clone(),
        }])
    }

    fn open(&self, id: &str) -> anyhow::Result<Box<dyn CameraInstance>> {
        if id != self.config.id {
            anyhow::bail!("no such camera: {id}");
        }
        Ok(Box::new(TwinCameraInstance::new(self.config.clone())))
    }
}

struct TwinCameraInstance {
    config: TwinCameraConfig,
    gain: i32,
    exposure_us: i32,
    video_active: bool,
    roi_width: u32,
    roi_height: u32,
}

impl TwinCameraInstance {
    fn new(config: TwinCameraConfig) -> Self {
        let (w, h) = (config.width, config.height);
        TwinCameraInstance {
            config,
            gain: 0,
            exposure_us: 10_000,
            video_active: false,
            roi_width: w,
            roi_height: h,
        }
    }

    fn synthesize(&self, len: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let base = (self.gain.max(0) as u8).saturating_add(20);
        (0..len)
            .map(|_| base.saturating_add(rng.gen_range(0..40)))
            .collect()
    }
}

impl CameraInstance for TwinCameraInstance {
    fn get_info(&self) -> CameraInfo {
        let mut controls = HashMap::new();
        controls.insert(
            "Gain".to_string(),
            ControlInfo { min: 0, max: 600, default: 0, current: self.gain },
        );
        controls.insert(
            "Exposure".to_string(),
            ControlInfo { min: 1, max: 60_000_000, default: 10_000, current: self.exposure_us },
        );
        CameraInfo {
            camera_id: self.config.id.clone(),
            name: self.config.name.clone(),
            max_width: self.config.width,
            max_height: self.config.height,
            is_color: self.config.is_color,
            bayer_pattern: None,
            supported_bins: vec![1, 2, 4],
            controls,
        }
    }

    fn get_control(&self, name: &str) -> anyhow::Result<(i32, bool)> {
        match name {
            "Gain" => Ok((self.gain, false)),
            "Exposure" => Ok((self.exposure_us, false)),
            other => anyhow::bail!("unknown control: {other}"),
        }
    }

    fn set_control(&mut self, name: &str, value: i32) -> anyhow::Result<()> {
        match name {
            "Gain" => self.gain = value,
            "Exposure" => self.exposure_us = value,
            other => anyhow::bail!("unknown control: {other}"),
        }
        Ok(())
    }

    fn capture(&mut self, exposure_us: u64) -> anyhow::Result<Vec<u8>> {
        self.exposure_us = exposure_us as i32;
        let len = (self.roi_width * self.roi_height) as usize;
        Ok(self.synthesize(len))
    }

    fn start_video_capture(&mut self, _image_type: ImageType) -> anyhow::Result<()> {
        self.video_active = true;
        Ok(())
    }

    fn capture_video_frame(&mut self, buf: &mut [u8], _timeout_ms: u64) -> anyhow::Result<()> {
        if !self.video_active {
            anyhow::bail!("video capture not started");
        }
        let data = self.synthesize(buf.len());
        buf.copy_from_slice(&data);
        Ok(())
    }

    fn stop_video_capture(&mut self) -> anyhow::Result<()> {
        self.video_active = false;
        Ok(())
    }

    fn set_roi(&mut self, width: u32, height: u32, _bins: u32, _image_type: ImageType) -> anyhow::Result<()> {
        self.roi_width = width;
        self.roi_height = height;
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.video_active = false;
        Ok(())
    }
}
