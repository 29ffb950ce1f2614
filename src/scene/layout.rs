//! Deterministic placement of primitives.

use glam::Vec3;

use crate::params::{GridLayout, LineLayout};

/// How primitives are arranged in the scene
#[derive(Debug, Clone)]
pub enum Layout {
    /// A single row along X, centered on the origin
    Line(LineLayout),

    /// Rows along X stacked along Z on the ground plane
    Grid(GridLayout),
}

impl Layout {
    /// Position of primitive `index` out of `count`; a pure function of both
    pub fn position(&self, index: usize, count: usize) -> Vec3 {
        match self {
            Layout::Line(p) => {
                let n = index as f32 - (count / 2) as f32;
                Vec3::new(n + n * p.gap_fraction, 0.0, 0.0)
            }
            Layout::Grid(p) => {
                let rows = p.rows.max(1);
                let columns = count.div_ceil(rows).max(1);
                let column = (index % columns) as f32;
                let row = (index / columns) as f32;

                let x = column * p.spacing - (columns as f32 - 1.0) / 2.0 * p.spacing;
                let z = row * p.spacing - (rows / 2) as f32 * p.spacing;
                Vec3::new(x, 0.0, z)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_line_position_example() {
        let layout = Layout::Line(LineLayout::default());
        let p = layout.position(5, 32);
        assert_relative_eq!(p.x, -12.1, epsilon = 1e-5);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_line_is_centered_on_middle_index() {
        let layout = Layout::Line(LineLayout::default());
        assert_eq!(layout.position(16, 32), Vec3::ZERO);
        assert_relative_eq!(layout.position(0, 32).x, -17.6, epsilon = 1e-5);
        assert_relative_eq!(layout.position(31, 32).x, 16.5, epsilon = 1e-5);
    }

    #[test]
    fn test_grid_matches_eight_by_four_arrangement() {
        let layout = Layout::Grid(GridLayout::default());
        for i in 0..32 {
            let p = layout.position(i, 32);
            assert_relative_eq!(p.x, (i % 8) as f32 * 4.0 - 14.0);
            assert_eq!(p.y, 0.0);
            assert_relative_eq!(p.z, (i / 8) as f32 * 4.0 - 8.0);
        }
    }
}
