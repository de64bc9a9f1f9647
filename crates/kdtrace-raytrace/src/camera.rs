//! Pinhole camera looking down `-z`.

use kdtrace_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError};
use crate::Ray;

/// Camera and image parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Image width over image height.
    pub aspect_ratio: f64,
    /// Image width in pixels.
    pub image_width: u32,
    /// Jittered samples averaged per pixel.
    pub samples_per_pixel: u32,
    /// Height of the viewport in scene units.
    pub viewport_height: f64,
    /// Distance from the camera center to the viewport.
    pub focal_length: f64,
    /// Camera position.
    pub center: [f64; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 16.0 / 9.0,
            image_width: 400,
            samples_per_pixel: 1,
            viewport_height: 2.0,
            focal_length: 1.0,
            center: [0.0, 0.0, 0.0],
        }
    }
}

impl CameraSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(TraceError::InvalidSettings(format!(
                "aspect_ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(TraceError::InvalidSettings(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if !(self.viewport_height > 0.0) || !(self.focal_length > 0.0) {
            return Err(TraceError::InvalidSettings(
                "viewport_height and focal_length must be positive".into(),
            ));
        }
        if self.center.iter().any(|c| !c.is_finite()) {
            return Err(TraceError::InvalidSettings("camera center must be finite".into()));
        }
        Ok(())
    }
}

/// Derived camera geometry.
#[derive(Debug, Clone)]
pub struct Camera {
    image_width: u32,
    image_height: u32,
    samples_per_pixel: u32,
    center: Point3,
    pixel00: Point3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
}

impl Camera {
    /// Derive the viewport from `settings`.
    ///
    /// The image height is `width / aspect_ratio`, at least 1. The viewport
    /// width follows the real pixel ratio rather than the requested aspect.
    pub fn new(settings: &CameraSettings) -> Result<Self> {
        settings.validate()?;
        let image_width = settings.image_width;
        let image_height = ((image_width as f64 / settings.aspect_ratio) as u32).max(1);
        if image_width == 0 {
            return Err(TraceError::EmptyImage {
                width: image_width,
                height: image_height,
            });
        }

        let viewport_height = settings.viewport_height;
        let viewport_width = viewport_height * image_width as f64 / image_height as f64;
        let center = Point3::from(settings.center);

        // u runs left to right, v runs top to bottom
        let viewport_u = Vec3::new(viewport_width, 0.0, 0.0);
        let viewport_v = Vec3::new(0.0, -viewport_height, 0.0);
        let pixel_delta_u = viewport_u / image_width as f64;
        let pixel_delta_v = viewport_v / image_height as f64;

        let upper_left = center
            - Vec3::new(0.0, 0.0, settings.focal_length)
            - viewport_u / 2.0
            - viewport_v / 2.0;
        let pixel00 = upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        Ok(Self {
            image_width,
            image_height,
            samples_per_pixel: settings.samples_per_pixel,
            center,
            pixel00,
            pixel_delta_u,
            pixel_delta_v,
        })
    }

    /// Image width in pixels.
    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    /// Image height in pixels.
    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// Samples per pixel.
    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    /// Center of pixel `(0, 0)`, the top-left pixel.
    pub fn pixel00(&self) -> Point3 {
        self.pixel00
    }

    /// Ray through pixel `(i, j)`, displaced by `offset` pixels in
    /// `[-0.5, 0.5]^2` for jittered sampling.
    pub fn ray(&self, i: u32, j: u32, offset: (f64, f64)) -> Ray {
        let sample = self.pixel00
            + (i as f64 + offset.0) * self.pixel_delta_u
            + (j as f64 + offset.1) * self.pixel_delta_v;
        Ray::towards(self.center, sample)
    }
}
