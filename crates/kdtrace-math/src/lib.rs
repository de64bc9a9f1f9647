#![warn(missing_docs)]

//! Math types for the kdtrace ray tracer.
//!
//! Thin wrappers around nalgebra providing the point, vector and direction
//! types used throughout the tracer, plus the coordinate [`Axis`] and the
//! parametric [`Interval`].

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A coordinate axis of 3D space.
///
/// Axes are ordered `X < Y < Z`; that order breaks ties wherever an axis is
/// picked by extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    /// The x axis (index 0).
    X,
    /// The y axis (index 1).
    Y,
    /// The z axis (index 2).
    Z,
}

impl Axis {
    /// All three axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis (`0`, `1` or `2`).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis for a component index.
    ///
    /// # Panics
    ///
    /// Panics if `index > 2`. Passing any other value is a caller bug, not a
    /// recoverable condition.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => panic!("invalid axis index: {index}"),
        }
    }

    /// The next axis in cyclic order (`X -> Y -> Z -> X`).
    #[inline]
    pub fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    /// The two axes orthogonal to this one, in cyclic order.
    #[inline]
    pub fn others(self) -> (Axis, Axis) {
        let a = self.next();
        (a, a.next())
    }
}

/// A closed range of ray parameters `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Interval {
    /// The interval containing nothing.
    pub const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    /// The interval containing every value.
    pub const UNIVERSE: Self = Self {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Create an interval from its bounds.
    #[inline]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `max - min`.
    #[inline]
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    /// `min <= x <= max`.
    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    /// `min < x < max`.
    #[inline]
    pub fn surrounds(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }

    /// Clamp `x` into the interval.
    #[inline]
    pub fn clamp(&self, x: f64) -> f64 {
        if x < self.min {
            self.min
        } else if x > self.max {
            self.max
        } else {
            x
        }
    }

    /// Same lower bound, new upper bound.
    #[inline]
    pub fn with_max(&self, max: f64) -> Self {
        Self { min: self.min, max }
    }
}
