// src/optimizer/stats.rs
//! Aggregated per-frame observability for the host/UI.

use bevy::prelude::*;

use crate::optimizer::culling::CullingStats;
use crate::optimizer::detail::ImpostorPool;
use crate::optimizer::lod::{LodGroup, LodRegistry, VisibilityRecord};
use crate::optimizer::quality::{FpsSamples, QualityState};
use crate::terrain::TerrainStats;

/// The `getPerformanceStats` surface: one readable snapshot per frame.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct PerfSnapshot {
    pub visible_objects: u32,
    pub culled_objects: u32,
    pub average_fps: f32,
    pub lod_object_count: usize,
    pub pooled_object_count: usize,
    pub resolution_scale: f32,
    pub draw_calls: u32,
    pub triangles: u32,
}

/// Fold the optimizer's counters into the snapshot. Draw calls and
/// triangles are estimated from the active representation of every
/// currently visible managed object, plus the terrain.
pub fn collect_performance_stats(
    culling: Res<CullingStats>,
    samples: Res<FpsSamples>,
    registry: Res<LodRegistry>,
    pool: Res<ImpostorPool>,
    quality: Res<QualityState>,
    terrain: Option<Res<TerrainStats>>,
    groups: Query<(Entity, &LodGroup, &VisibilityRecord)>,
    mut snapshot: ResMut<PerfSnapshot>,
) {
    let mut draw_calls = 0u32;
    let mut triangles = 0u32;

    for (root, group, record) in &groups {
        if !(record.culling_visible && record.originally_visible) {
            continue;
        }
        let Some(managed) = registry.get(root) else {
            continue;
        };
        let ix = group.active_ix.min(managed.levels.len().saturating_sub(1));
        if let Some(level) = managed.levels.get(ix) {
            draw_calls += level.draws;
            triangles += level.triangles;
        }
    }

    if let Some(terrain) = terrain {
        draw_calls += 1;
        triangles += terrain.triangles;
    }

    *snapshot = PerfSnapshot {
        visible_objects: culling.visible,
        culled_objects: culling.culled,
        average_fps: samples.average,
        lod_object_count: registry.len(),
        pooled_object_count: pool.len(),
        resolution_scale: quality.resolution_scale,
        draw_calls,
        triangles,
    };
}
