//! TOML scene files.
//!
//! ```toml
//! [tree]
//! max_prims_per_leaf = 2
//!
//! [camera]
//! image_width = 800
//! samples_per_pixel = 4
//!
//! [[spheres]]
//! center = [0.0, 0.0, -1.0]
//! radius = 0.5
//!
//! [[triangles]]
//! vertices = [[-1.0, -0.5, -2.0], [1.0, -0.5, -2.0], [0.0, 1.0, -2.0]]
//! material = 3
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use kdtrace_math::Point3;
use kdtrace_raytrace::shapes::{Sphere, Triangle};
use kdtrace_raytrace::{CameraSettings, KdTreeSettings, MaterialId, World};
use serde::Deserialize;

/// Parsed scene file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneFile {
    pub tree: KdTreeSettings,
    pub camera: CameraSettings,
    pub spheres: Vec<SphereEntry>,
    pub triangles: Vec<TriangleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SphereEntry {
    pub center: [f64; 3],
    pub radius: f64,
    #[serde(default)]
    pub material: Option<MaterialId>,
}

#[derive(Debug, Deserialize)]
pub struct TriangleEntry {
    pub vertices: [[f64; 3]; 3],
    #[serde(default)]
    pub material: Option<MaterialId>,
}

impl SceneFile {
    /// Read and parse a scene file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scene {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let scene: SceneFile = toml::from_str(text)?;
        scene.tree.validate()?;
        scene.camera.validate()?;
        Ok(scene)
    }

    /// Spheres first, then triangles, each in file order.
    pub fn world(&self) -> World {
        let mut world = World::new();
        for entry in &self.spheres {
            let mut sphere = Sphere::new(Point3::from(entry.center), entry.radius);
            sphere.material = entry.material;
            world.add(sphere);
        }
        for entry in &self.triangles {
            let [a, b, c] = entry.vertices.map(Point3::from);
            let mut triangle = Triangle::new(a, b, c);
            triangle.material = entry.material;
            world.add(triangle);
        }
        world
    }
}
