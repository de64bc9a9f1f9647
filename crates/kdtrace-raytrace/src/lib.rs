#![warn(missing_docs)]

//! Kd-tree accelerated ray tracing.
//!
//! Scenes are flat lists of spheres and triangles. A kd-tree built with the
//! surface area heuristic answers closest-hit queries against them, and a
//! small pinhole renderer turns those queries into images.
//!
//! # Architecture
//!
//! - [`Aabb`] - Axis-aligned boxes with the ray slab test
//! - [`Ray`] / [`HitRecord`] - Query and result types
//! - [`Hittable`] - The primitive contract; implemented by [`shapes`],
//!   [`World`] and [`KdTree`]
//! - [`kdtree`] - SAH construction and near-to-far traversal
//! - [`Camera`] / [`render`] - Parallel normal-shading renderer
//!
//! # Example
//!
//! ```
//! use kdtrace_math::{Interval, Point3, Vec3};
//! use kdtrace_raytrace::shapes::Sphere;
//! use kdtrace_raytrace::{KdTreeSettings, Ray, World};
//!
//! let mut world = World::new();
//! world.add(Sphere::new(Point3::new(0.0, 0.0, -3.0), 1.0));
//!
//! let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();
//! let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
//! let hit = tree.intersect(&ray, Interval::new(0.0, f64::INFINITY)).unwrap();
//! assert!((hit.t - 2.0).abs() < 1e-9);
//! ```

mod aabb;
mod camera;
mod error;
mod hittable;
pub mod kdtree;
pub mod random;
mod ray;
mod renderer;
mod settings;
pub mod shapes;
mod world;

pub use aabb::Aabb;
pub use camera::{Camera, CameraSettings};
pub use error::{Result, TraceError};
pub use hittable::Hittable;
pub use kdtree::{KdTree, TreeStats};
pub use ray::{HitRecord, MaterialId, Ray};
pub use renderer::{render, shade, Image};
pub use settings::{auto_max_depth, KdTreeSettings, MAX_TREE_DEPTH};
pub use world::World;
