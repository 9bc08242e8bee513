// src/input.rs

use bevy::input::mouse::MouseButton;
use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::actions::{ActionState, PlayerAction};
use crate::navigation::{NavMode, NavState};
use crate::optimizer::{ForceLodUpdate, OptimizationKind, OptimizerSettings};
use crate::state::GameState;
use crate::ui::StatsOverlayVisible;

pub fn input_mapping_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut action_state: ResMut<ActionState>,
) {
    action_state.set(PlayerAction::MoveForward, keys.pressed(KeyCode::KeyW));
    action_state.set(PlayerAction::MoveBackward, keys.pressed(KeyCode::KeyS));
    action_state.set(PlayerAction::MoveLeft, keys.pressed(KeyCode::KeyA));
    action_state.set(PlayerAction::MoveRight, keys.pressed(KeyCode::KeyD));
    action_state.set(PlayerAction::Ascend, keys.pressed(KeyCode::Space));
    action_state.set(PlayerAction::Descend, keys.pressed(KeyCode::ControlLeft));
    action_state.set(PlayerAction::Run, keys.pressed(KeyCode::ShiftLeft));
}

pub fn pause_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
    current_state: Res<State<GameState>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        if current_state.get() == &GameState::Running {
            next_state.set(GameState::Paused);
            if let Ok(mut window) = windows.single_mut() {
                set_cursor_grab(&mut window, false);
            }
            info!("Paused");
        } else if current_state.get() == &GameState::Paused {
            next_state.set(GameState::Running);
            info!("Resumed");
        }
    }
}

/// First-person look needs pointer capture; clicking the window grabs it.
pub fn grab_on_click(
    buttons: Res<ButtonInput<MouseButton>>,
    nav: Res<NavState>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !buttons.just_pressed(MouseButton::Left) || nav.mode != NavMode::FirstPerson {
        return;
    }
    if let Ok(mut window) = windows.single_mut() {
        set_cursor_grab(&mut window, true);
    }
}

/// Host toggles: KeyL (LOD), KeyC (culling), KeyF (forced LOD refresh).
pub fn optimization_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<OptimizerSettings>,
    mut force: EventWriter<ForceLodUpdate>,
) {
    if keys.just_pressed(KeyCode::KeyL) {
        let enabled = !settings.enabled(OptimizationKind::Lod);
        settings.toggle(OptimizationKind::Lod, enabled);
        info!("LOD optimization {}", if enabled { "on" } else { "off" });
    }
    if keys.just_pressed(KeyCode::KeyC) {
        let enabled = !settings.enabled(OptimizationKind::Culling);
        settings.toggle(OptimizationKind::Culling, enabled);
        info!("Frustum culling {}", if enabled { "on" } else { "off" });
    }
    if keys.just_pressed(KeyCode::KeyF) {
        force.write(ForceLodUpdate);
        info!("Forcing LOD re-evaluation");
    }
}

pub fn stats_overlay_toggle(
    keys: Res<ButtonInput<KeyCode>>,
    mut visible: ResMut<StatsOverlayVisible>,
) {
    if keys.just_pressed(KeyCode::F3) {
        visible.0 = !visible.0;
    }
}

fn set_cursor_grab(window: &mut Window, grab: bool) {
    if grab {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    } else {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    }
}
