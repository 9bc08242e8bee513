// src/navigation/controller.rs
//! First/third-person pose integration with terrain and object collision.

use bevy::prelude::*;

use crate::terrain::HeightField;

/// Camera height above whatever the player stands on.
pub const EYE_HEIGHT: f32 = 2.0;
/// Never integrate a step larger than this (stalls, tab switches).
pub const MAX_NAV_DT: f32 = 0.1;
/// Keep-away from the poles to avoid gimbal flip.
pub const PITCH_MARGIN: f32 = 0.01;

pub const THIRD_PERSON_DISTANCE: f32 = 8.0;
pub const THIRD_PERSON_HEIGHT: f32 = 3.0;
pub const THIRD_PERSON_AIM_UP: f32 = 1.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

impl NavMode {
    pub fn toggled(self) -> Self {
        match self {
            NavMode::FirstPerson => NavMode::ThirdPerson,
            NavMode::ThirdPerson => NavMode::FirstPerson,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NavMode::FirstPerson => "first-person",
            NavMode::ThirdPerson => "third-person",
        }
    }
}

/// The tracked pose: world position, bounded look angles, mode, and the
/// displacement applied on the last tick.
#[derive(Resource, Clone, Copy, Debug)]
pub struct NavState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub mode: NavMode,
    pub velocity: Vec3,
    pub is_moving: bool,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, EYE_HEIGHT, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            mode: NavMode::FirstPerson,
            velocity: Vec3::ZERO,
            is_moving: false,
        }
    }
}

/// Movement parameters, sourced from settings.
#[derive(Resource, Clone, Copy, Debug)]
pub struct NavParams {
    pub base_speed: f32,
    pub run_multiplier: f32,
    pub look_sensitivity: f32,
}

impl Default for NavParams {
    fn default() -> Self {
        Self {
            base_speed: 12.0,
            run_multiplier: 2.5,
            look_sensitivity: 0.002,
        }
    }
}

/// Snapshot of the held movement intents for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub ascend: bool,
    pub descend: bool,
    pub run: bool,
}

/// A standable object surface (world-space bounding sphere) for the
/// downward probe; the terrain is queried separately.
#[derive(Clone, Copy, Debug)]
pub struct SupportSphere {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Resource, Default)]
pub struct SupportSurfaces {
    pub spheres: Vec<SupportSphere>,
}

impl SupportSurfaces {
    pub fn push(&mut self, sphere: SupportSphere) {
        self.spheres.push(sphere);
    }
}

/// The `getNavigationInfo` surface.
#[derive(Resource, Clone, Copy, Debug)]
pub struct NavInfo {
    pub position: Vec3,
    pub mode: NavMode,
    pub is_moving: bool,
}

impl Default for NavInfo {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            mode: NavMode::FirstPerson,
            is_moving: false,
        }
    }
}

// ---------- Pure pose math ----------

/// Apply a mouse delta to the look angles. Pitch stays strictly inside
/// the polar margins.
pub fn apply_look(state: &mut NavState, dx: f32, dy: f32, sensitivity: f32) {
    state.yaw -= dx * sensitivity;
    state.pitch -= dy * sensitivity;
    state.pitch = state.pitch.clamp(
        -std::f32::consts::FRAC_PI_2 + PITCH_MARGIN,
        std::f32::consts::FRAC_PI_2 - PITCH_MARGIN,
    );
}

/// Horizontal movement basis. First person flattens the camera's facing
/// direction; third person derives it from the stored yaw directly.
pub fn movement_basis(state: &NavState) -> (Vec3, Vec3) {
    let forward = match state.mode {
        NavMode::FirstPerson => {
            let facing = Quat::from_euler(EulerRot::YXZ, state.yaw, state.pitch, 0.0) * Vec3::NEG_Z;
            Vec3::new(facing.x, 0.0, facing.z).normalize_or_zero()
        }
        NavMode::ThirdPerson => Vec3::new(-state.yaw.sin(), 0.0, -state.yaw.cos()),
    };
    let right = forward.cross(Vec3::Y);
    (forward, right)
}

/// Straight-down probe against the support spheres. Returns the highest
/// surface point at or below the origin, if any sphere sits underfoot.
pub fn probe_down(origin: Vec3, supports: &[SupportSphere]) -> Option<f32> {
    let mut best: Option<f32> = None;
    for sphere in supports {
        let dx = origin.x - sphere.center.x;
        let dz = origin.z - sphere.center.z;
        let d2 = dx * dx + dz * dz;
        let r2 = sphere.radius * sphere.radius;
        if d2 > r2 {
            continue;
        }
        let hit_y = sphere.center.y + (r2 - d2).sqrt();
        if hit_y > origin.y {
            continue;
        }
        best = Some(match best {
            Some(b) => b.max(hit_y),
            None => hit_y,
        });
    }
    best
}

/// One navigation tick: clamp the step, accumulate intent-scaled velocity,
/// integrate, and resolve collisions against the heightfield and supports.
///
/// Vertical policy: ascend wins when both vertical intents are held. With
/// no vertical intent the pose snaps to the standing height; while flying
/// the standing height is only a lower bound.
pub fn tick(
    state: &mut NavState,
    intent: MoveIntent,
    dt_raw: f32,
    params: &NavParams,
    field: &HeightField,
    supports: &[SupportSphere],
) {
    // 1) Clamp the step
    let dt = dt_raw.min(MAX_NAV_DT);

    // 2) Movement basis from the current angles
    let (forward, right) = movement_basis(state);

    // 3) Intent-scaled velocity
    let speed = params.base_speed * if intent.run { params.run_multiplier } else { 1.0 };
    let mut dir = Vec3::ZERO;
    if intent.forward {
        dir += forward;
    }
    if intent.backward {
        dir -= forward;
    }
    if intent.left {
        dir -= right;
    }
    if intent.right {
        dir += right;
    }
    let mut velocity = dir.normalize_or_zero() * speed * dt;

    let flying = intent.ascend || intent.descend;
    if intent.ascend {
        velocity.y = speed * dt;
    } else if intent.descend {
        velocity.y = -speed * dt;
    }

    // 4) Euler integration
    state.position += velocity;

    // 5) Collision: terrain first, then the object probe
    let mut floor = field.height_at(state.position.x, state.position.z) + EYE_HEIGHT;
    if let Some(hit_y) = probe_down(state.position, supports) {
        floor = floor.max(hit_y + EYE_HEIGHT);
    }
    if flying {
        if state.position.y < floor {
            state.position.y = floor;
        }
    } else {
        state.position.y = floor;
    }

    state.velocity = velocity;
    state.is_moving = velocity.length_squared() > 1e-10;
}

/// Camera transform for the current pose. First person sits at the pose;
/// third person trails behind-and-above along the yaw and aims slightly
/// above the tracked point.
pub fn camera_pose(state: &NavState) -> Transform {
    match state.mode {
        NavMode::FirstPerson => Transform::from_translation(state.position)
            .with_rotation(Quat::from_euler(EulerRot::YXZ, state.yaw, state.pitch, 0.0)),
        NavMode::ThirdPerson => {
            let facing = Vec3::new(-state.yaw.sin(), 0.0, -state.yaw.cos());
            let eye =
                state.position - facing * THIRD_PERSON_DISTANCE + Vec3::Y * THIRD_PERSON_HEIGHT;
            Transform::from_translation(eye)
                .looking_at(state.position + Vec3::Y * THIRD_PERSON_AIM_UP, Vec3::Y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_field(size: f32, segments: u32, h: f32) -> HeightField {
        let verts = (segments as usize + 1) * (segments as usize + 1);
        HeightField::from_samples(size, segments, vec![h; verts])
    }

    fn still() -> MoveIntent {
        MoveIntent::default()
    }

    #[test]
    fn camera_settles_at_eye_height_above_terrain() {
        let field = flat_field(100.0, 10, 3.0);
        let params = NavParams::default();
        let mut state = NavState {
            position: Vec3::new(0.0, 10.0, 0.0),
            ..default()
        };

        tick(&mut state, still(), 0.016, &params, &field, &[]);
        assert_eq!(state.position.y, 5.0);

        // Never below, from underneath either.
        state.position.y = 4.0;
        tick(&mut state, still(), 0.016, &params, &field, &[]);
        assert_eq!(state.position.y, 5.0);

        for _ in 0..20 {
            tick(&mut state, still(), 0.016, &params, &field, &[]);
            assert!(state.position.y >= 5.0);
        }
        assert_eq!(state.position.y, 5.0);
    }

    #[test]
    fn outside_the_terrain_the_floor_is_eye_height_over_zero() {
        let field = flat_field(100.0, 10, 3.0);
        let params = NavParams::default();
        let mut state = NavState {
            position: Vec3::new(500.0, 9.0, 500.0),
            ..default()
        };
        tick(&mut state, still(), 0.016, &params, &field, &[]);
        assert_eq!(state.position.y, EYE_HEIGHT);
    }

    #[test]
    fn large_deltas_are_clamped() {
        let field = flat_field(1000.0, 10, 0.0);
        let params = NavParams {
            base_speed: 10.0,
            run_multiplier: 1.0,
            look_sensitivity: 0.002,
        };
        let mut state = NavState::default();
        let intent = MoveIntent {
            forward: true,
            ..default()
        };
        // A 5 second stall still moves at most base_speed * MAX_NAV_DT.
        tick(&mut state, intent, 5.0, &params, &field, &[]);
        let moved = Vec2::new(state.position.x, state.position.z).length();
        assert!((moved - 10.0 * MAX_NAV_DT).abs() < 1e-4);
    }

    #[test]
    fn run_scales_horizontal_speed() {
        let field = flat_field(1000.0, 10, 0.0);
        let params = NavParams {
            base_speed: 10.0,
            run_multiplier: 2.0,
            look_sensitivity: 0.002,
        };
        let mut walk = NavState::default();
        let mut run = NavState::default();
        tick(
            &mut walk,
            MoveIntent {
                forward: true,
                ..default()
            },
            0.05,
            &params,
            &field,
            &[],
        );
        tick(
            &mut run,
            MoveIntent {
                forward: true,
                run: true,
                ..default()
            },
            0.05,
            &params,
            &field,
            &[],
        );
        assert!((run.position.z.abs() - 2.0 * walk.position.z.abs()).abs() < 1e-5);
    }

    #[test]
    fn ascend_wins_vertical_intent_ties() {
        let field = flat_field(1000.0, 10, 0.0);
        let params = NavParams::default();
        let mut state = NavState::default();
        let both = MoveIntent {
            ascend: true,
            descend: true,
            ..default()
        };
        let before = state.position.y;
        tick(&mut state, both, 0.05, &params, &field, &[]);
        assert!(state.position.y > before);
    }

    #[test]
    fn pitch_clamps_inside_the_polar_margins() {
        let mut state = NavState::default();
        apply_look(&mut state, 0.0, -10_000.0, 0.002);
        assert!(state.pitch <= std::f32::consts::FRAC_PI_2 - PITCH_MARGIN + 1e-6);
        apply_look(&mut state, 0.0, 10_000.0, 0.002);
        assert!(state.pitch >= -std::f32::consts::FRAC_PI_2 + PITCH_MARGIN - 1e-6);
    }

    #[test]
    fn support_sphere_raises_the_standing_height() {
        let field = flat_field(100.0, 10, 0.0);
        let params = NavParams::default();
        // A sphere of radius 3 at y=2: top surface reaches y=5 underfoot.
        let supports = [SupportSphere {
            center: Vec3::new(0.0, 2.0, 0.0),
            radius: 3.0,
        }];
        let mut state = NavState {
            position: Vec3::new(0.0, 6.0, 0.0),
            ..default()
        };
        tick(&mut state, still(), 0.016, &params, &field, &supports);
        assert_eq!(state.position.y, 7.0);

        // Off to the side the sphere is out of reach; terrain rules again.
        state.position = Vec3::new(10.0, 6.0, 0.0);
        tick(&mut state, still(), 0.016, &params, &field, &supports);
        assert_eq!(state.position.y, EYE_HEIGHT);
    }

    #[test]
    fn probe_ignores_spheres_above_the_origin() {
        let supports = [SupportSphere {
            center: Vec3::new(0.0, 50.0, 0.0),
            radius: 3.0,
        }];
        assert!(probe_down(Vec3::new(0.0, 10.0, 0.0), &supports).is_none());
    }

    #[test]
    fn third_person_camera_trails_the_pose() {
        let state = NavState {
            position: Vec3::new(0.0, 5.0, 0.0),
            yaw: 0.0,
            mode: NavMode::ThirdPerson,
            ..default()
        };
        let tf = camera_pose(&state);
        // Yaw 0 faces -Z, so the camera hangs back at +Z and above.
        assert!(tf.translation.z > state.position.z);
        assert!(tf.translation.y > state.position.y);
        let to_target = (state.position + Vec3::Y * THIRD_PERSON_AIM_UP) - tf.translation;
        assert!(tf.forward().dot(to_target.normalize()) > 0.99);
    }

    #[test]
    fn first_person_moves_along_the_flattened_facing() {
        let field = flat_field(1000.0, 10, 0.0);
        let params = NavParams::default();
        let mut state = NavState {
            pitch: -1.2, // looking steeply down must not slow the walk
            ..default()
        };
        tick(
            &mut state,
            MoveIntent {
                forward: true,
                ..default()
            },
            0.05,
            &params,
            &field,
            &[],
        );
        let expected = params.base_speed * 0.05;
        assert!((state.position.z + expected).abs() < 1e-4);
        assert_eq!(state.position.x, 0.0);
    }
}
