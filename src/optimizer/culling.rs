// src/optimizer/culling.rs
//! Per-frame sphere-vs-frustum visibility classification for managed objects.

use bevy::prelude::*;
use bevy::render::camera::CameraProjection;

use crate::optimizer::lod::{LodGroup, ManagedBounds, VisibilityRecord};
use crate::optimizer::OptimizerSettings;
use crate::setup::MainCamera;

const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Six inward-pointing planes extracted from a clip-from-world matrix.
#[derive(Clone, Debug)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Gribb–Hartmann extraction. The camera projection is reverse-Z, so
    /// the geometric near plane is `row3 + row2` and the far plane is
    /// `row2` on its own (an infinite projection leaves it degenerate,
    /// which the normalization guard turns into an always-pass plane).
    pub fn from_clip_from_world(m: &Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[3] + rows[2];
        planes[FAR] = rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// True when the sphere is at least partially inside the frustum.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        for plane in &self.planes {
            if plane.truncate().dot(center) + plane.w < -radius {
                return false;
            }
        }
        true
    }
}

/// Running visible/culled counts, recomputed every culling pass.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct CullingStats {
    pub visible: u32,
    pub culled: u32,
}

/// World-space bounding sphere of a managed object.
pub fn world_sphere(gt: &GlobalTransform, bounds: &ManagedBounds) -> (Vec3, f32) {
    let (scale, _, _) = gt.to_scale_rotation_translation();
    let center = gt.transform_point(bounds.center_offset);
    (center, bounds.radius * scale.abs().max_element())
}

/// Per-frame culling pass. Rendered visibility is
/// `intersects(frustum, sphere) && originally_visible`; the culler is the
/// only writer of the root `Visibility` flag. The cadence is configurable
/// (`cull_interval_frames`, default every frame).
pub fn update_frustum_culling(
    mut frame: Local<u32>,
    settings: Res<OptimizerSettings>,
    mut stats: ResMut<CullingStats>,
    cam_q: Query<(&Projection, &GlobalTransform), With<MainCamera>>,
    mut objects: Query<
        (
            &GlobalTransform,
            &ManagedBounds,
            &mut VisibilityRecord,
            &mut Visibility,
        ),
        With<LodGroup>,
    >,
) {
    if !settings.culling_enabled {
        let mut visible = 0;
        for (_, _, mut record, mut vis) in &mut objects {
            record.culling_visible = true;
            let shown = record.originally_visible;
            vis.set_if_neq(if shown {
                Visibility::Visible
            } else {
                Visibility::Hidden
            });
            if shown {
                visible += 1;
            }
        }
        stats.visible = visible;
        stats.culled = 0;
        return;
    }

    *frame = frame.wrapping_add(1);
    let interval = settings.cull_interval_frames.max(1);
    if *frame % interval != 0 {
        return;
    }

    let Ok((projection, cam_gt)) = cam_q.single() else {
        return;
    };
    let clip_from_world = projection.get_clip_from_view() * cam_gt.compute_matrix().inverse();
    let frustum = Frustum::from_clip_from_world(&clip_from_world);

    let mut visible = 0;
    let mut culled = 0;
    for (gt, bounds, mut record, mut vis) in &mut objects {
        let (center, radius) = world_sphere(gt, bounds);
        record.culling_visible = frustum.intersects_sphere(center, radius);

        let shown = record.culling_visible && record.originally_visible;
        vis.set_if_neq(if shown {
            Visibility::Visible
        } else {
            Visibility::Hidden
        });

        if shown {
            visible += 1;
        } else {
            culled += 1;
        }
    }

    stats.visible = visible;
    stats.culled = culled;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera_clip_from_world() -> Mat4 {
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        // Reverse-Z: near/far swapped, matching the runtime projection.
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 1000.0, 0.1);
        proj * view
    }

    #[test]
    fn sphere_in_front_of_camera_is_visible() {
        let frustum = Frustum::from_clip_from_world(&default_camera_clip_from_world());
        assert!(frustum.intersects_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0));
    }

    #[test]
    fn sphere_at_camera_position_is_visible() {
        let frustum = Frustum::from_clip_from_world(&default_camera_clip_from_world());
        assert!(frustum.intersects_sphere(Vec3::ZERO, 0.5));
    }

    #[test]
    fn sphere_fully_outside_every_plane_is_culled() {
        let frustum = Frustum::from_clip_from_world(&default_camera_clip_from_world());
        // Behind the camera
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, 50.0), 1.0));
        // Far to each side
        assert!(!frustum.intersects_sphere(Vec3::new(-1000.0, 0.0, -10.0), 1.0));
        assert!(!frustum.intersects_sphere(Vec3::new(1000.0, 0.0, -10.0), 1.0));
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 1000.0, -10.0), 1.0));
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, -1000.0, -10.0), 1.0));
    }

    #[test]
    fn large_sphere_straddling_a_plane_is_visible() {
        let frustum = Frustum::from_clip_from_world(&default_camera_clip_from_world());
        // Center outside the left plane, but the radius reaches in.
        assert!(frustum.intersects_sphere(Vec3::new(-30.0, 0.0, -10.0), 40.0));
    }

    #[test]
    fn planes_are_normalized() {
        let frustum = Frustum::from_clip_from_world(&default_camera_clip_from_world());
        for plane in &frustum.planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                assert!((len - 1.0).abs() < 1e-4, "plane normal length {len}");
            }
        }
    }

    #[test]
    fn world_sphere_scales_with_the_transform() {
        let bounds = ManagedBounds {
            center_offset: Vec3::new(0.0, 1.0, 0.0),
            radius: 2.0,
        };
        let gt = GlobalTransform::from(
            Transform::from_xyz(10.0, 0.0, 0.0).with_scale(Vec3::splat(3.0)),
        );
        let (center, radius) = world_sphere(&gt, &bounds);
        assert!((center - Vec3::new(10.0, 3.0, 0.0)).length() < 1e-5);
        assert!((radius - 6.0).abs() < 1e-5);
    }
}
