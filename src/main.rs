use bevy::prelude::*;
use bevy::render::{settings::WgpuSettings, RenderPlugin};

mod actions;
mod input;
mod navigation;
mod optimizer;
mod props;
mod settings;
mod setup;
mod sky;
mod state;
mod terrain;
mod ui;

use actions::ActionState;
use input::{
    grab_on_click, input_mapping_system, optimization_toggle_system, pause_toggle_system,
    stats_overlay_toggle,
};
use navigation::NavigationPlugin;
use optimizer::OptimizerPlugin;
use props::PropsPlugin;
use sky::SkyPlugin;
use state::GameState;
use terrain::TerrainPlugin;
use ui::{despawn_pause_overlay, spawn_pause_overlay, spawn_stats_readout, update_stats_readout};

/// Per-frame ordering: navigation first (the camera pose everything else
/// reads), then quality adaptation, then LOD/culling.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum FrameSet {
    Navigate,
    Adapt,
    Optimize,
}

fn main() {
    // Start with Bevy's default settings, but raise the max 2D texture size.
    let mut wgpu_settings = WgpuSettings::default();
    wgpu_settings.limits.max_texture_dimension_2d = 16_384;

    App::new()
        .add_plugins(DefaultPlugins.set(RenderPlugin {
            render_creation: wgpu_settings.into(),
            ..Default::default()
        }))
        // domain plugins
        .add_plugins(TerrainPlugin)
        .add_plugins(SkyPlugin)
        .add_plugins(PropsPlugin)
        .add_plugins(OptimizerPlugin)
        .add_plugins(NavigationPlugin)
        // resources & game state
        .init_resource::<ActionState>()
        .init_resource::<ui::StatsOverlayVisible>()
        .init_state::<GameState>()
        .configure_sets(
            Update,
            (FrameSet::Navigate, FrameSet::Adapt, FrameSet::Optimize)
                .chain()
                .run_if(in_state(GameState::Running)),
        )
        // configuration, camera, stats overlay
        .add_systems(PreStartup, settings::init_settings)
        .add_systems(Startup, (setup::setup, spawn_stats_readout))
        // pause-menu UI
        .add_systems(OnEnter(GameState::Paused), spawn_pause_overlay)
        .add_systems(OnExit(GameState::Paused), despawn_pause_overlay)
        // host input surface
        .add_systems(Update, (pause_toggle_system, stats_overlay_toggle))
        .add_systems(
            Update,
            (
                input_mapping_system,
                grab_on_click,
                optimization_toggle_system,
            )
                .before(FrameSet::Navigate)
                .run_if(in_state(GameState::Running)),
        )
        .add_systems(Update, update_stats_readout)
        .run();
}
