use bevy::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Ascend,
    Descend,
    Run,
}

/// Per-frame snapshot of which movement intents are held down.
#[derive(Default, Resource)]
pub struct ActionState {
    pressed: HashMap<PlayerAction, bool>,
}

impl ActionState {
    pub fn set(&mut self, action: PlayerAction, is_pressed: bool) {
        self.pressed.insert(action, is_pressed);
    }

    pub fn pressed(&self, action: PlayerAction) -> bool {
        *self.pressed.get(&action).unwrap_or(&false)
    }

    /// True if any directional or vertical intent is held.
    pub fn any_movement(&self) -> bool {
        use PlayerAction::*;
        [MoveForward, MoveBackward, MoveLeft, MoveRight, Ascend, Descend]
            .iter()
            .any(|a| self.pressed(*a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_actions_read_as_released() {
        let state = ActionState::default();
        assert!(!state.pressed(PlayerAction::MoveForward));
        assert!(!state.any_movement());
    }

    #[test]
    fn run_alone_is_not_movement() {
        let mut state = ActionState::default();
        state.set(PlayerAction::Run, true);
        assert!(state.pressed(PlayerAction::Run));
        assert!(!state.any_movement());

        state.set(PlayerAction::Ascend, true);
        assert!(state.any_movement());
    }
}
