mod heightfield;
mod mesh;
mod plugin;

pub use heightfield::HeightField;
pub use plugin::{TerrainPlugin, TerrainStats};
