//! The demo variants and what each one wires together.

use clap::ValueEnum;

use crate::params::{GridLayout, LineLayout, SphereDetail, NUM_PRIMITIVES};
use crate::scene::{Layout, SceneConfig, Shape};

/// Which demo to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Row of normal-colored cubes stretching with their frequency bin
    Cubes,

    /// Row of cubes drawn with the shader material and a `time` uniform
    ShaderCubes,

    /// Grid of spheres whose vertices ripple with their frequency bin
    Spheres,
}

/// Surface shading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    /// Built-in shading colored by surface normal
    Normal,

    /// Vertex + fragment shader loaded at startup
    Shader,
}

/// What the per-frame mapping writes into each primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMapping {
    /// `scale.y = 1 + f`
    Scale,

    /// `displacement[v] = f * sin(step * v + t)`
    Displacement,
}

impl Variant {
    pub fn material(&self) -> Material {
        match self {
            Variant::Cubes => Material::Normal,
            Variant::ShaderCubes | Variant::Spheres => Material::Shader,
        }
    }

    pub fn mapping(&self) -> FrameMapping {
        match self {
            Variant::Cubes | Variant::ShaderCubes => FrameMapping::Scale,
            Variant::Spheres => FrameMapping::Displacement,
        }
    }

    /// Scene for this variant with the standard primitive count
    pub fn scene_config(&self, seed: Option<u64>) -> SceneConfig {
        let (layout, shape) = match self {
            Variant::Cubes | Variant::ShaderCubes => {
                (Layout::Line(LineLayout::default()), Shape::Cube)
            }
            Variant::Spheres => (
                Layout::Grid(GridLayout::default()),
                Shape::Sphere(SphereDetail::default()),
            ),
        };

        SceneConfig {
            count: NUM_PRIMITIVES,
            layout,
            shape,
            displaced: self.mapping() == FrameMapping::Displacement,
            seed,
        }
    }

    /// Window title for this variant
    pub fn title(&self) -> &'static str {
        match self {
            Variant::Cubes => "freqdance - cubes",
            Variant::ShaderCubes => "freqdance - shader cubes",
            Variant::Spheres => "freqdance - spheres",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_spheres_are_displaced() {
        assert!(!Variant::Cubes.scene_config(None).displaced);
        assert!(!Variant::ShaderCubes.scene_config(None).displaced);
        assert!(Variant::Spheres.scene_config(None).displaced);
    }

    #[test]
    fn test_variant_wiring() {
        assert_eq!(Variant::Cubes.material(), Material::Normal);
        assert_eq!(Variant::ShaderCubes.material(), Material::Shader);
        assert_eq!(Variant::Spheres.mapping(), FrameMapping::Displacement);

        let config = Variant::Spheres.scene_config(Some(1));
        assert_eq!(config.count, 32);
        assert!(matches!(config.layout, Layout::Grid(_)));
        assert!(matches!(config.shape, Shape::Sphere(_)));
    }

    #[test]
    fn test_cli_names() {
        assert_eq!(
            Variant::from_str("shader-cubes", false).unwrap(),
            Variant::ShaderCubes
        );
        assert_eq!(Variant::from_str("spheres", false).unwrap(), Variant::Spheres);
    }
}
