// src/optimizer/plugin.rs

use bevy::prelude::*;

use crate::optimizer::culling::{update_frustum_culling, CullingStats};
use crate::optimizer::detail::ImpostorPool;
use crate::optimizer::lod::{face_billboards, update_lod_groups, ForceLodUpdate, LodRegistry, LodThresholds};
use crate::optimizer::quality::{
    accumulate_fps_sample, apply_resolution_scale, capture_native_scale, run_quality_controller,
    FpsSamples, QualityState, QualityTimer,
};
use crate::optimizer::stats::{collect_performance_stats, PerfSnapshot};
use crate::optimizer::OptimizerSettings;
use crate::FrameSet;

pub struct OptimizerPlugin;

impl Plugin for OptimizerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OptimizerSettings>()
            .init_resource::<LodRegistry>()
            .init_resource::<ImpostorPool>()
            .init_resource::<LodThresholds>()
            .init_resource::<CullingStats>()
            .init_resource::<FpsSamples>()
            .init_resource::<QualityState>()
            .init_resource::<QualityTimer>()
            .init_resource::<PerfSnapshot>()
            .add_event::<ForceLodUpdate>()
            .add_systems(Startup, capture_native_scale)
            // Quality: sample, fold the window, push the scale to the renderer.
            .add_systems(
                Update,
                (
                    accumulate_fps_sample,
                    run_quality_controller,
                    apply_resolution_scale,
                )
                    .chain()
                    .in_set(FrameSet::Adapt),
            )
            // LOD + culling against the post-navigation camera pose.
            .add_systems(
                Update,
                (
                    update_lod_groups,
                    face_billboards.after(update_lod_groups),
                    update_frustum_culling,
                    collect_performance_stats
                        .after(update_lod_groups)
                        .after(update_frustum_culling),
                )
                    .in_set(FrameSet::Optimize),
            );
    }
}
