// src/settings.rs
//! World configuration loaded from `assets/world.ron`.
//! A missing or malformed file logs a warning and falls back to defaults;
//! startup never fails on configuration.

use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

pub const SETTINGS_PATH: &str = "assets/world.ron";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("I/O while reading settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(String),
}

/// How the terrain heightfield is sourced.
#[derive(Clone, Debug, Deserialize)]
pub enum TerrainSource {
    /// Seeded multi-octave simplex fBm.
    Noise {
        octaves: u32,
        lacunarity: f64,
        persistence: f64,
        base_frequency: f64,
    },
    /// Grayscale image sampled onto the grid.
    Image { path: String },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Side length of the square terrain domain in world units.
    pub size: f32,
    /// Grid cells per axis (the sample grid has `segments + 1` points per axis).
    pub segments: u32,
    /// World height corresponding to a full-amplitude sample.
    pub height_scale: f32,
    pub source: TerrainSource,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            size: 1000.0,
            segments: 128,
            height_scale: 18.0,
            source: TerrainSource::Noise {
                octaves: 5,
                lacunarity: 2.0,
                persistence: 0.5,
                base_frequency: 0.004,
            },
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NavSettings {
    pub base_speed: f32,
    pub run_multiplier: f32,
    pub look_sensitivity: f32,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            base_speed: 12.0,
            run_multiplier: 2.5,
            look_sensitivity: 0.002,
        }
    }
}

/// Placement cell sizes (meters) per archetype: smaller cell = denser.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PropSettings {
    pub tree_cell: f32,
    pub rock_cell: f32,
    pub building_cell: f32,
    pub npc_cell: f32,
    /// Jitter fraction of a cell, 0..=0.5.
    pub jitter: f32,
}

impl Default for PropSettings {
    fn default() -> Self {
        Self {
            tree_cell: 45.0,
            rock_cell: 60.0,
            building_cell: 140.0,
            npc_cell: 220.0,
            jitter: 0.4,
        }
    }
}

#[derive(Resource, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub seed: u64,
    pub terrain: TerrainSettings,
    pub navigation: NavSettings,
    pub props: PropSettings,
    /// Real-time seconds for one full day/night cycle.
    pub day_length_secs: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: 1337,
            terrain: TerrainSettings::default(),
            navigation: NavSettings::default(),
            props: PropSettings::default(),
            day_length_secs: 240.0,
        }
    }
}

pub fn load_settings(path: impl AsRef<Path>) -> Result<WorldSettings, SettingsError> {
    let text = std::fs::read_to_string(path)?;
    parse_settings(&text)
}

pub fn parse_settings(text: &str) -> Result<WorldSettings, SettingsError> {
    ron::de::from_str(text).map_err(|e| SettingsError::Parse(e.to_string()))
}

/// (PreStartup) Insert the settings resource, defaulting on any load failure.
pub fn init_settings(mut commands: Commands) {
    let settings = match load_settings(SETTINGS_PATH) {
        Ok(s) => {
            info!("Settings: loaded '{}', seed={}", SETTINGS_PATH, s.seed);
            s
        }
        Err(e) => {
            warn!("Settings: '{}' unusable ({e}); using defaults", SETTINGS_PATH);
            WorldSettings::default()
        }
    };
    commands.insert_resource(settings);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let s = WorldSettings::default();
        assert!(s.terrain.size > 0.0);
        assert!(s.terrain.segments >= 2);
        assert!(s.navigation.run_multiplier >= 1.0);
        assert!((0.0..=0.5).contains(&s.props.jitter));
        assert!(s.day_length_secs > 0.0);
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let err = parse_settings("(seed: \"not a number\")").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn partial_settings_fill_from_defaults() {
        let s = parse_settings("(seed: 7)").expect("partial settings should parse");
        assert_eq!(s.seed, 7);
        assert_eq!(s.terrain.segments, TerrainSettings::default().segments);
    }

    #[test]
    fn image_source_parses() {
        let s = parse_settings(
            "(terrain: (source: Image(path: \"heightmaps/island.png\")))",
        )
        .expect("image source should parse");
        match s.terrain.source {
            TerrainSource::Image { ref path } => assert_eq!(path, "heightmaps/island.png"),
            _ => panic!("expected image source"),
        }
    }
}
