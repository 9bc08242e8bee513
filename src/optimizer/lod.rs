// src/optimizer/lod.rs
//! Distance-banded representation selection for managed objects.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::optimizer::detail::{
    build_detail_levels, bounds_of, BuiltLevel, ImpostorPool, LodRole, PartDef,
};
use crate::optimizer::OptimizerSettings;
use crate::props::PropKind;
use crate::setup::MainCamera;

/// The three LOD distance boundaries (where medium, low and impostor begin),
/// written by the quality controller and read by the selector every frame.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct LodThresholds(pub [f32; 3]);

impl LodThresholds {
    /// Relaxed preset: finer detail kept longer.
    pub const RELAXED: Self = Self([50.0, 150.0, 300.0]);
    /// Tight preset: coarser detail sooner, for struggling frame rates.
    pub const TIGHT: Self = Self([25.0, 75.0, 150.0]);
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self::RELAXED
    }
}

/// Request to re-evaluate every managed object on the next update, even
/// where the chosen level has not changed.
#[derive(Event, Default)]
pub struct ForceLodUpdate;

// ---------- Registry ----------

pub struct DetailLevel {
    pub role: LodRole,
    pub entity: Entity,
    pub triangles: u32,
    pub draws: u32,
}

pub struct ManagedObject {
    pub kind: PropKind,
    pub levels: Vec<DetailLevel>,
}

/// Explicit optimizer-owned store of managed objects; no ambient statics.
#[derive(Resource, Default)]
pub struct LodRegistry {
    managed: HashMap<Entity, ManagedObject>,
}

impl LodRegistry {
    pub fn is_managed(&self, root: Entity) -> bool {
        self.managed.contains_key(&root)
    }

    pub fn get(&self, root: Entity) -> Option<&ManagedObject> {
        self.managed.get(&root)
    }

    pub fn len(&self) -> usize {
        self.managed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managed.is_empty()
    }

    pub fn remove(&mut self, root: Entity) -> Option<ManagedObject> {
        self.managed.remove(&root)
    }
}

// ---------- Components ----------

/// Per-object LOD state: index of the representation currently attached.
/// `usize::MAX` marks "not yet evaluated" so the first update always swaps.
#[derive(Component, Debug)]
pub struct LodGroup {
    pub active_ix: usize,
}

impl Default for LodGroup {
    fn default() -> Self {
        Self {
            active_ix: usize::MAX,
        }
    }
}

/// Local bounding sphere of a managed object, for culling and probes.
#[derive(Component, Clone, Copy, Debug)]
pub struct ManagedBounds {
    pub center_offset: Vec3,
    pub radius: f32,
}

/// Split visibility flags with one writer each: the culler owns
/// `culling_visible` (and the root `Visibility`); the selector owns which
/// child representation is shown. `originally_visible` is captured once at
/// registration and never overridden by culling.
#[derive(Component, Clone, Copy, Debug)]
pub struct VisibilityRecord {
    pub originally_visible: bool,
    pub culling_visible: bool,
}

/// Impostor quads that turn to face the camera.
#[derive(Component)]
pub struct Billboard;

// ---------- Registration ----------

/// Build detail levels for `root` and register it with the optimizer.
/// Idempotent: a root that is already managed is left untouched.
#[allow(clippy::too_many_arguments)]
pub fn create_levels_for(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    images: &mut Assets<Image>,
    pool: &mut ImpostorPool,
    registry: &mut LodRegistry,
    root: Entity,
    kind: PropKind,
    parts: &[PartDef],
    originally_visible: bool,
) {
    if registry.is_managed(root) {
        debug!("LOD: {root:?} already managed, skipping re-registration");
        return;
    }

    let built = build_detail_levels(kind, parts, meshes, materials, images, pool);
    let mut levels = Vec::with_capacity(built.len());

    for (ix, level) in built.into_iter().enumerate() {
        let BuiltLevel {
            role,
            parts,
            billboard,
        } = level;
        let draws = parts.len() as u32;
        let triangles: u32 = parts.iter().map(|p| p.triangles).sum();

        // Level 0 starts attached; everything else waits for the selector.
        let visibility = if ix == 0 {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };

        let level_entity = commands
            .spawn((
                Transform::IDENTITY,
                GlobalTransform::IDENTITY,
                visibility,
                InheritedVisibility::VISIBLE,
                ViewVisibility::default(),
                ChildOf(root),
            ))
            .id();
        if billboard {
            commands.entity(level_entity).insert(Billboard);
        }

        for part in parts {
            commands.spawn((
                Transform::from_translation(part.offset),
                GlobalTransform::IDENTITY,
                Visibility::Inherited,
                InheritedVisibility::VISIBLE,
                ViewVisibility::default(),
                Mesh3d(part.mesh),
                MeshMaterial3d(part.material),
                ChildOf(level_entity),
            ));
        }

        levels.push(DetailLevel {
            role,
            entity: level_entity,
            triangles,
            draws,
        });
    }

    let (center_offset, radius, _) = bounds_of(parts);
    commands.entity(root).insert((
        LodGroup::default(),
        ManagedBounds {
            center_offset,
            radius,
        },
        VisibilityRecord {
            originally_visible,
            culling_visible: true,
        },
    ));

    registry.managed.insert(
        root,
        ManagedObject { kind, levels },
    );
}

// ---------- Selection ----------

/// Pick the largest-index level whose minimum distance is at or below the
/// camera distance.
pub fn select_level(roles: &[LodRole], thresholds: &LodThresholds, distance: f32) -> usize {
    let mut chosen = 0;
    for (ix, role) in roles.iter().enumerate() {
        if role.min_distance(thresholds) <= distance {
            chosen = ix;
        } else {
            break;
        }
    }
    chosen
}

/// Per-frame LOD evaluation against the latest thresholds. Swaps child
/// visibility so exactly one representation is attached per object.
pub fn update_lod_groups(
    settings: Res<OptimizerSettings>,
    thresholds: Res<LodThresholds>,
    registry: Res<LodRegistry>,
    mut force_events: EventReader<ForceLodUpdate>,
    cam_q: Query<&GlobalTransform, With<MainCamera>>,
    mut groups: Query<(Entity, &GlobalTransform, &mut LodGroup)>,
    mut vis_q: Query<&mut Visibility, Without<LodGroup>>,
) {
    let force = force_events.read().count() > 0;
    let Ok(cam_gt) = cam_q.single() else {
        return;
    };
    let cam_pos = cam_gt.translation();

    for (root, gt, mut group) in &mut groups {
        let Some(managed) = registry.get(root) else {
            continue;
        };
        if managed.levels.len() < 2 {
            // Nothing to swap to; the object always renders level 0.
            continue;
        }

        let chosen = if settings.lod_enabled {
            let distance = gt.translation().distance(cam_pos);
            let roles: Vec<LodRole> = managed.levels.iter().map(|l| l.role).collect();
            select_level(&roles, &thresholds, distance)
        } else {
            0
        };

        if chosen == group.active_ix && !force {
            continue;
        }
        group.active_ix = chosen;

        for (ix, level) in managed.levels.iter().enumerate() {
            if let Ok(mut vis) = vis_q.get_mut(level.entity) {
                if ix == chosen {
                    vis.set_if_neq(Visibility::Visible);
                } else {
                    vis.set_if_neq(Visibility::Hidden);
                }
            }
        }
    }
}

/// Turn active impostor quads toward the camera (yaw only).
pub fn face_billboards(
    cam_q: Query<&GlobalTransform, With<MainCamera>>,
    mut billboards: Query<(&ChildOf, &mut Transform, &Visibility), With<Billboard>>,
    parents: Query<&GlobalTransform, Without<Billboard>>,
) {
    let Ok(cam_gt) = cam_q.single() else {
        return;
    };
    let cam_pos = cam_gt.translation();

    for (child_of, mut tf, vis) in &mut billboards {
        if *vis != Visibility::Visible {
            continue;
        }
        let Ok(parent_gt) = parents.get(child_of.parent()) else {
            continue;
        };
        let to_cam = cam_pos - parent_gt.translation();
        let yaw = to_cam.x.atan2(to_cam.z);
        let (_, parent_rot, _) = parent_gt.to_scale_rotation_translation();
        tf.rotation = parent_rot.inverse() * Quat::from_rotation_y(yaw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LodRole; 4] = [LodRole::Full, LodRole::Medium, LodRole::Low, LodRole::Impostor];

    #[test]
    fn selection_picks_largest_threshold_at_or_below_distance() {
        let thresholds = LodThresholds([50.0, 150.0, 300.0]);
        assert_eq!(select_level(&ALL, &thresholds, 0.0), 0);
        assert_eq!(select_level(&ALL, &thresholds, 49.9), 0);
        assert_eq!(select_level(&ALL, &thresholds, 50.0), 1);
        // Camera at distance 200 shows the "low" level: 150 <= 200 < 300.
        assert_eq!(select_level(&ALL, &thresholds, 200.0), 2);
        assert_eq!(select_level(&ALL, &thresholds, 1000.0), 3);
    }

    #[test]
    fn selection_is_monotonic_in_distance() {
        let thresholds = LodThresholds::RELAXED;
        let mut last = 0;
        for step in 0..400 {
            let distance = step as f32 * 2.0;
            let level = select_level(&ALL, &thresholds, distance);
            assert!(level >= last, "level reverted at distance {distance}");
            last = level;
        }
    }

    #[test]
    fn threshold_change_takes_effect_immediately() {
        let distance = 100.0;
        assert_eq!(select_level(&ALL, &LodThresholds::RELAXED, distance), 1);
        assert_eq!(select_level(&ALL, &LodThresholds::TIGHT, distance), 2);
    }

    #[test]
    fn degraded_objects_fall_back_to_the_next_coarser_level() {
        // A cuboid-only object keeps just the original and the impostor.
        let roles = [LodRole::Full, LodRole::Impostor];
        let thresholds = LodThresholds([50.0, 150.0, 300.0]);
        // Between 50 and 300 there is no medium/low level to show.
        assert_eq!(select_level(&roles, &thresholds, 200.0), 0);
        assert_eq!(select_level(&roles, &thresholds, 300.0), 1);
    }

    #[test]
    fn registry_guard_makes_registration_idempotent() {
        let mut registry = LodRegistry::default();
        let root = Entity::from_raw(1);
        registry.managed.insert(
            root,
            ManagedObject {
                kind: PropKind::Tree,
                levels: Vec::new(),
            },
        );
        assert!(registry.is_managed(root));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_managed(Entity::from_raw(2)));
    }
}
