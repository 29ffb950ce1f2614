//! Per-frame mapping from spectrum bins to primitive state.

use glam::Vec3;

use crate::audio::FrequencySpectrum;
use crate::mapping::MagnitudeRange;
use crate::params::MotionParams;
use crate::scene::VisualPrimitive;
use crate::variant::FrameMapping;

/// Stretch along Y: baseline 1, up to 2 at full magnitude
pub fn apply_scale(primitive: &mut VisualPrimitive, f: f32) {
    primitive.scale = Vec3::new(1.0, 1.0 + f, 1.0);
}

/// Rewrite every vertex offset as `f * sin(phase_step * i + t)`
pub fn apply_displacement(displacement: &mut [f32], f: f32, phase_step: f32, t: f32) {
    for (i, d) in displacement.iter_mut().enumerate() {
        *d = f * (phase_step * i as f32 + t).sin();
    }
}

/// Drive every primitive from its own bin (primitive i reads bin i).
///
/// `t` is animation time (elapsed seconds already multiplied by the time scale).
pub fn animate_primitives(
    primitives: &mut [VisualPrimitive],
    spectrum: &FrequencySpectrum,
    range: &MagnitudeRange,
    mapping: FrameMapping,
    motion: &MotionParams,
    t: f32,
) {
    for primitive in primitives.iter_mut() {
        let f = range.normalize(spectrum.bin(primitive.index()) as f32);

        match mapping {
            FrameMapping::Scale => apply_scale(primitive, f),
            FrameMapping::Displacement => {
                if let Some(displacement) = primitive.displacement.as_mut() {
                    apply_displacement(displacement, f, motion.vertex_phase_step, t);
                }
            }
        }
    }
}
