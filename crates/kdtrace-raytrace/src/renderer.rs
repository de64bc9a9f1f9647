//! Row-parallel normal-shading renderer.

use kdtrace_math::{Interval, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::camera::Camera;
use crate::error::{Result, TraceError};
use crate::{Hittable, Ray};

/// Shadow-acne offset for the start of every primary ray.
const RAY_T_MIN: f64 = 0.001;

/// Linear RGB image, row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height` colors in `[0, 1]`.
    pub pixels: Vec<[f64; 3]>,
}

impl Image {
    /// Color at pixel `(i, j)`.
    pub fn pixel(&self, i: u32, j: u32) -> [f64; 3] {
        self.pixels[j as usize * self.width as usize + i as usize]
    }

    /// 8-bit RGB bytes: each channel clamped to `[0, 0.999]` and scaled by 256.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let intensity = Interval::new(0.0, 0.999);
        self.pixels
            .iter()
            .flat_map(|px| px.map(|c| (256.0 * intensity.clamp(c)) as u8))
            .collect()
    }
}

/// Color seen along `ray`: the hit normal mapped to RGB, or the sky.
pub fn shade<S: Hittable + ?Sized>(scene: &S, ray: &Ray) -> Vec3 {
    if let Some(hit) = scene.hit(ray, Interval::new(RAY_T_MIN, f64::INFINITY)) {
        return 0.5 * (hit.normal.into_inner() + Vec3::new(1.0, 1.0, 1.0));
    }

    let a = 0.5 * (ray.direction.y + 1.0);
    (1.0 - a) * Vec3::new(1.0, 1.0, 1.0) + a * Vec3::new(0.5, 0.7, 1.0)
}

/// Render `scene` through `camera`.
///
/// Rows are traced in parallel; row `j` draws its jitter from a generator
/// seeded with `seed + j`, so the output depends only on the inputs. With a
/// single sample per pixel the ray goes through the pixel center.
#[tracing::instrument(skip_all, fields(width = camera.image_width(), height = camera.image_height()))]
pub fn render<S: Hittable + Sync + ?Sized>(camera: &Camera, scene: &S, seed: u64) -> Result<Image> {
    let width = camera.image_width();
    let height = camera.image_height();
    if width == 0 || height == 0 {
        return Err(TraceError::EmptyImage { width, height });
    }
    let samples = camera.samples_per_pixel().max(1);
    let scale = 1.0 / samples as f64;

    let pixels: Vec<[f64; 3]> = (0..height)
        .into_par_iter()
        .flat_map_iter(|j| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(j as u64));
            let row: Vec<[f64; 3]> = (0..width)
                .map(|i| {
                    let mut color = Vec3::zeros();
                    for _ in 0..samples {
                        let offset = if samples == 1 {
                            (0.0, 0.0)
                        } else {
                            (rng.random_range(-0.5..0.5), rng.random_range(-0.5..0.5))
                        };
                        color += shade(scene, &camera.ray(i, j, offset));
                    }
                    color *= scale;
                    [color.x, color.y, color.z]
                })
                .collect();
            row
        })
        .collect();

    Ok(Image {
        width,
        height,
        pixels,
    })
}
