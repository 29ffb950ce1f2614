//! Static scene setup: N primitives with shared geometry and fixed positions.

mod layout;
mod mesh;

// Re-export public types
pub use layout::Layout;
pub use mesh::{Mesh, Vertex};

use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::SphereDetail;

/// Geometry shared by all primitives
#[derive(Debug, Clone)]
pub enum Shape {
    /// Unit cube
    Cube,
    Sphere(SphereDetail),
}

impl Shape {
    pub fn mesh(&self) -> Mesh {
        match self {
            Shape::Cube => Mesh::cube(1.0),
            Shape::Sphere(d) => Mesh::sphere(d.radius, d.width_segments, d.height_segments),
        }
    }
}

/// Everything needed to build a scene
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub count: usize,
    pub layout: Layout,
    pub shape: Shape,

    /// Give every primitive a per-vertex displacement buffer
    pub displaced: bool,

    /// Seed for the initial displacement noise (random when `None`)
    pub seed: Option<u64>,
}

/// One cube or sphere
#[derive(Debug, Clone)]
pub struct VisualPrimitive {
    index: usize,
    position: Vec3,

    /// Per-axis scale, rewritten every frame by scale-driven variants
    pub scale: Vec3,

    /// Per-vertex offsets along the normal (displacement variants only)
    pub displacement: Option<Vec<f32>>,
}

impl VisualPrimitive {
    pub fn new(index: usize, position: Vec3) -> Self {
        Self {
            index,
            position,
            scale: Vec3::ONE,
            displacement: None,
        }
    }

    /// Index of the frequency bin driving this primitive
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position assigned at construction; never changes
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, Quat::IDENTITY, self.position)
    }
}

/// The shared mesh plus every primitive placed in the world
#[derive(Debug, Clone)]
pub struct Scene {
    pub mesh: Mesh,
    pub primitives: Vec<VisualPrimitive>,
}

impl Scene {
    /// Build `config.count` primitives laid out by `config.layout`
    pub fn build(config: &SceneConfig) -> Self {
        let mesh = config.shape.mesh();
        let vertex_count = mesh.vertex_count();
        let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));

        let primitives = (0..config.count)
            .map(|i| {
                let mut primitive =
                    VisualPrimitive::new(i, config.layout.position(i, config.count));
                if config.displaced {
                    // Uniform noise in [0, 1); overwritten by the first animated frame
                    primitive.displacement =
                        Some((0..vertex_count).map(|_| rng.random::<f32>()).collect());
                }
                primitive
            })
            .collect();

        log::debug!(
            "Built scene: {} primitives, {} vertices each",
            config.count,
            vertex_count
        );

        Self { mesh, primitives }
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{GridLayout, LineLayout};

    fn config(layout: Layout, shape: Shape, displaced: bool) -> SceneConfig {
        SceneConfig {
            count: 32,
            layout,
            shape,
            displaced,
            seed: Some(7),
        }
    }

    #[test]
    fn test_build_yields_count_distinct_positions() {
        let scene = Scene::build(&config(
            Layout::Line(LineLayout::default()),
            Shape::Cube,
            false,
        ));
        assert_eq!(scene.len(), 32);

        for (i, a) in scene.primitives.iter().enumerate() {
            assert_eq!(a.index(), i);
            assert_eq!(a.scale, Vec3::ONE);
            assert!(a.displacement.is_none());
            for b in &scene.primitives[i + 1..] {
                assert_ne!(a.position(), b.position());
            }
        }
    }

    #[test]
    fn test_positions_are_deterministic() {
        let cfg = config(Layout::Grid(GridLayout::default()), Shape::Cube, false);
        let first = Scene::build(&cfg);
        let second = Scene::build(&SceneConfig { seed: None, ..cfg });
        for (a, b) in first.primitives.iter().zip(&second.primitives) {
            assert_eq!(a.position(), b.position());
        }
    }

    #[test]
    fn test_displacement_noise_is_unit_range_and_unique() {
        let detail = SphereDetail {
            radius: 1.0,
            width_segments: 8,
            height_segments: 4,
        };
        let scene = Scene::build(&config(
            Layout::Grid(GridLayout::default()),
            Shape::Sphere(detail),
            true,
        ));

        let buffers: Vec<&Vec<f32>> = scene
            .primitives
            .iter()
            .map(|p| p.displacement.as_ref().unwrap())
            .collect();
        for buf in &buffers {
            assert_eq!(buf.len(), scene.mesh.vertex_count());
            assert!(buf.iter().all(|d| (0.0..1.0).contains(d)));
        }
        assert_ne!(buffers[0], buffers[1]);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let detail = SphereDetail {
            radius: 1.0,
            width_segments: 8,
            height_segments: 4,
        };
        let cfg = config(Layout::Grid(GridLayout::default()), Shape::Sphere(detail), true);
        let a = Scene::build(&cfg);
        let b = Scene::build(&cfg);
        assert_eq!(a.primitives[3].displacement, b.primitives[3].displacement);
    }

    #[test]
    fn test_model_matrix_applies_scale_then_translation() {
        let mut primitive = VisualPrimitive::new(0, Vec3::new(2.0, 0.0, 0.0));
        primitive.scale = Vec3::new(1.0, 2.0, 1.0);
        let top = primitive.model_matrix().transform_point3(Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(top, Vec3::new(2.0, 1.0, 0.0));
    }
}
