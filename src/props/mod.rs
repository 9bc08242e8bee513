// src/props/mod.rs
//! Procedurally placed scene objects: the optimizer's managed population.

use bevy::prelude::*;

mod placement;
mod spawn;

use spawn::spawn_props;

use crate::terrain::HeightField;

/// Closed set of object kinds. Impostor rendering and archetype lookup are
/// total matches over this enum; `Generic` is the explicit fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropKind {
    Tree,
    Rock,
    Building,
    Npc,
    Generic,
}

impl PropKind {
    /// Kinds populated into the world at startup.
    pub const SPAWNED: [PropKind; 4] = [
        PropKind::Tree,
        PropKind::Rock,
        PropKind::Building,
        PropKind::Npc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PropKind::Tree => "tree",
            PropKind::Rock => "rock",
            PropKind::Building => "building",
            PropKind::Npc => "npc",
            PropKind::Generic => "generic",
        }
    }

    /// Stable per-kind salt folded into the placement RNG seed.
    pub fn placement_salt(self) -> u64 {
        match self {
            PropKind::Tree => 1,
            PropKind::Rock => 2,
            PropKind::Building => 3,
            PropKind::Npc => 4,
            PropKind::Generic => 5,
        }
    }
}

pub struct PropsPlugin;

impl Plugin for PropsPlugin {
    fn build(&self, app: &mut App) {
        // The heightfield lands during Startup; the population follows.
        app.add_systems(
            PostStartup,
            spawn_props.run_if(resource_exists::<HeightField>),
        );
    }
}
