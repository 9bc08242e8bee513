use bevy::prelude::*;

/// Top-level app state. Paused halts the frame-driven systems entirely
/// (navigation, quality sampling, LOD/culling updates).
#[derive(States, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Running,
    Paused,
}
