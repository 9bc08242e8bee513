// src/navigation/plugin.rs

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::actions::{ActionState, PlayerAction};
use crate::navigation::controller::{
    apply_look, camera_pose, tick, MoveIntent, NavInfo, NavMode, NavParams, NavState,
    SupportSurfaces,
};
use crate::settings::WorldSettings;
use crate::setup::MainCamera;
use crate::terrain::HeightField;
use crate::FrameSet;

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavState>()
            .init_resource::<NavParams>()
            .init_resource::<NavInfo>()
            .init_resource::<SupportSurfaces>()
            .add_systems(Startup, init_nav_params)
            .add_systems(
                Update,
                (toggle_view_mode, mouse_look, navigation_tick)
                    .chain()
                    .in_set(FrameSet::Navigate)
                    .run_if(resource_exists::<HeightField>),
            );
    }
}

fn init_nav_params(mut params: ResMut<NavParams>, settings: Res<WorldSettings>) {
    *params = NavParams {
        base_speed: settings.navigation.base_speed,
        run_multiplier: settings.navigation.run_multiplier,
        look_sensitivity: settings.navigation.look_sensitivity,
    };
}

/// KeyV switches between first- and third-person.
fn toggle_view_mode(keys: Res<ButtonInput<KeyCode>>, mut state: ResMut<NavState>) {
    if keys.just_pressed(KeyCode::KeyV) {
        state.mode = state.mode.toggled();
        info!("Navigation: {} view", state.mode.label());
    }
}

/// Mouse-look: active while the pointer is captured, or always in
/// third-person.
fn mouse_look(
    mut motion_evr: EventReader<MouseMotion>,
    params: Res<NavParams>,
    mut state: ResMut<NavState>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let grabbed = windows
        .single()
        .map(|w| w.cursor_options.grab_mode != CursorGrabMode::None)
        .unwrap_or(false);
    let active = grabbed || state.mode == NavMode::ThirdPerson;

    for ev in motion_evr.read() {
        if !active {
            continue;
        }
        apply_look(&mut state, ev.delta.x, ev.delta.y, params.look_sensitivity);
    }
}

/// Integrate the pose from the held intents, then write the camera
/// transform for this frame.
fn navigation_tick(
    time: Res<Time>,
    actions: Res<ActionState>,
    params: Res<NavParams>,
    field: Res<HeightField>,
    supports: Res<SupportSurfaces>,
    mut state: ResMut<NavState>,
    mut info: ResMut<NavInfo>,
    mut cam_q: Query<&mut Transform, With<MainCamera>>,
) {
    let intent = MoveIntent {
        forward: actions.pressed(PlayerAction::MoveForward),
        backward: actions.pressed(PlayerAction::MoveBackward),
        left: actions.pressed(PlayerAction::MoveLeft),
        right: actions.pressed(PlayerAction::MoveRight),
        ascend: actions.pressed(PlayerAction::Ascend),
        descend: actions.pressed(PlayerAction::Descend),
        run: actions.pressed(PlayerAction::Run),
    };

    tick(
        &mut state,
        intent,
        time.delta_secs(),
        &params,
        &field,
        &supports.spheres,
    );

    if let Ok(mut tf) = cam_q.single_mut() {
        *tf = camera_pose(&state);
    }

    *info = NavInfo {
        position: state.position,
        mode: state.mode,
        is_moving: state.is_moving,
    };
}
