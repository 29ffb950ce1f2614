//! Scene layout, geometry detail and motion parameters.

/// Number of cubes/spheres in every variant (one per frequency bin)
pub const NUM_PRIMITIVES: usize = 32;

/// Primitives in a row along X
#[derive(Debug, Clone)]
pub struct LineLayout {
    /// Gap between neighbours as a fraction of the unit cube width
    /// 0.1 → centers 1.1 apart
    pub gap_fraction: f32,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self { gap_fraction: 0.1 }
    }
}

/// Primitives on an XZ grid centered on the origin
#[derive(Debug, Clone)]
pub struct GridLayout {
    /// Number of rows along Z (columns = ceil(count / rows))
    pub rows: usize,

    /// Distance between neighbouring centers (world units)
    pub spacing: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: 4,
            spacing: 4.0,
        }
    }
}

/// UV sphere tessellation
#[derive(Debug, Clone)]
pub struct SphereDetail {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereDetail {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 128,
            height_segments: 64,
        }
    }
}

/// Time-dependent motion of shader uniforms and vertex displacement
#[derive(Debug, Clone)]
pub struct MotionParams {
    /// Animation time units per second
    /// 10.0 → the `time` uniform advances by 1 every 100 ms
    pub time_scale: f32,

    /// Phase step between consecutive vertices in `sin(step * i + t)`
    pub vertex_phase_step: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            time_scale: 10.0,
            vertex_phase_step: 0.1,
        }
    }
}
