//! Kd-tree construction parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError};

/// Capacity of the traversal work stack. Explicit depths above this are
/// rejected, automatic depths are clamped to it.
pub const MAX_TREE_DEPTH: u32 = 64;

/// Kd-tree construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdTreeSettings {
    /// Estimated cost of one ray-primitive test.
    pub intersection_cost: f64,
    /// Estimated cost of stepping through one interior node.
    pub traversal_cost: f64,
    /// Candidate sets smaller than this become leaves without evaluating
    /// any split.
    pub max_prims_per_leaf: usize,
    /// Maximum tree depth; `None` derives it from the primitive count.
    pub max_depth: Option<u32>,
    /// Fraction in `[0, 1)` discounting splits that leave one side empty.
    /// Zero scores every split with the plain SAH formula.
    pub empty_bonus: f64,
}

impl Default for KdTreeSettings {
    fn default() -> Self {
        Self {
            intersection_cost: 80.0,
            traversal_cost: 1.0,
            max_prims_per_leaf: 1,
            max_depth: None,
            empty_bonus: 0.0,
        }
    }
}

impl KdTreeSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.intersection_cost.is_finite() || self.intersection_cost <= 0.0 {
            return Err(TraceError::InvalidSettings(format!(
                "intersection_cost must be positive and finite, got {}",
                self.intersection_cost
            )));
        }
        if !self.traversal_cost.is_finite() || self.traversal_cost < 0.0 {
            return Err(TraceError::InvalidSettings(format!(
                "traversal_cost must be non-negative and finite, got {}",
                self.traversal_cost
            )));
        }
        if self.max_prims_per_leaf == 0 {
            return Err(TraceError::InvalidSettings(
                "max_prims_per_leaf must be at least 1".into(),
            ));
        }
        if let Some(depth) = self.max_depth {
            if depth > MAX_TREE_DEPTH {
                return Err(TraceError::InvalidSettings(format!(
                    "max_depth {depth} exceeds the traversal stack capacity {MAX_TREE_DEPTH}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.empty_bonus) {
            return Err(TraceError::InvalidSettings(format!(
                "empty_bonus must lie in [0, 1), got {}",
                self.empty_bonus
            )));
        }
        Ok(())
    }

    /// Depth limit for a tree over `prim_count` primitives.
    pub fn resolve_max_depth(&self, prim_count: usize) -> u32 {
        self.max_depth.unwrap_or_else(|| auto_max_depth(prim_count))
    }
}

/// `round(8 + 1.3 * log2(n))`, clamped to [`MAX_TREE_DEPTH`].
///
/// Empty and single-primitive worlds get the base depth of 8.
pub fn auto_max_depth(prim_count: usize) -> u32 {
    let n = prim_count.max(1) as f64;
    let depth = (8.0 + 1.3 * n.log2()).round() as u32;
    depth.min(MAX_TREE_DEPTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = KdTreeSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.intersection_cost, 80.0);
        assert_eq!(settings.traversal_cost, 1.0);
        assert_eq!(settings.max_prims_per_leaf, 1);
        assert_eq!(settings.max_depth, None);
    }

    #[test]
    fn test_auto_max_depth() {
        assert_eq!(auto_max_depth(0), 8);
        assert_eq!(auto_max_depth(1), 8);
        assert_eq!(auto_max_depth(2), 9);
        // 8 + 1.3 * log2(1000) = 20.95...
        assert_eq!(auto_max_depth(1000), 21);
        assert_eq!(auto_max_depth(usize::MAX), MAX_TREE_DEPTH);
    }

    #[test]
    fn test_explicit_depth_wins() {
        let settings = KdTreeSettings {
            max_depth: Some(3),
            ..Default::default()
        };
        assert_eq!(settings.resolve_max_depth(1_000_000), 3);
    }

    #[test]
    fn test_invalid_settings() {
        let bad = [
            KdTreeSettings {
                intersection_cost: 0.0,
                ..Default::default()
            },
            KdTreeSettings {
                traversal_cost: f64::NAN,
                ..Default::default()
            },
            KdTreeSettings {
                max_prims_per_leaf: 0,
                ..Default::default()
            },
            KdTreeSettings {
                max_depth: Some(MAX_TREE_DEPTH + 1),
                ..Default::default()
            },
            KdTreeSettings {
                empty_bonus: 1.0,
                ..Default::default()
            },
        ];
        for settings in bad {
            assert!(
                matches!(settings.validate(), Err(TraceError::InvalidSettings(_))),
                "{settings:?} should be rejected"
            );
        }
    }
}
