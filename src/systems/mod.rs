pub mod assets;
pub mod renderer;
pub mod sound;

pub use assets::MovieAssets;
pub use renderer::{RecordingRenderer, Renderer};
