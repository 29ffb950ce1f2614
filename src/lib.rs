//! freqdance library - audio-reactive 3D spectrum visualizer

pub mod animation;
pub mod audio;
pub mod camera;
pub mod cli;
pub mod clock;
pub mod error;
pub mod mapping;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod variant;
