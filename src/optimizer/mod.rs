pub mod culling;
pub mod detail;
pub mod lod;
pub mod quality;
pub mod stats;

mod plugin;

pub use detail::{ImpostorPool, PartDef, ShapeSpec};
pub use lod::{create_levels_for, ForceLodUpdate, LodRegistry};
pub use plugin::OptimizerPlugin;
pub use stats::PerfSnapshot;

use bevy::prelude::*;

/// Which optimization the host is toggling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizationKind {
    Lod,
    Culling,
}

/// Host-facing optimizer switches.
#[derive(Resource, Clone, Copy, Debug)]
pub struct OptimizerSettings {
    pub lod_enabled: bool,
    pub culling_enabled: bool,
    /// Culling cadence in frames; 1 = every frame.
    pub cull_interval_frames: u32,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            lod_enabled: true,
            culling_enabled: true,
            cull_interval_frames: 1,
        }
    }
}

impl OptimizerSettings {
    pub fn toggle(&mut self, kind: OptimizationKind, enabled: bool) {
        match kind {
            OptimizationKind::Lod => self.lod_enabled = enabled,
            OptimizationKind::Culling => self.culling_enabled = enabled,
        }
    }

    pub fn enabled(&self, kind: OptimizationKind) -> bool {
        match kind {
            OptimizationKind::Lod => self.lod_enabled,
            OptimizationKind::Culling => self.culling_enabled,
        }
    }
}
