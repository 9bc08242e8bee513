// src/terrain/plugin.rs

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use crate::settings::{TerrainSource, WorldSettings};
use crate::terrain::heightfield::HeightField;
use crate::terrain::mesh::{build_terrain_mesh, triangle_count};

/// Marker for the terrain entity.
#[derive(Component)]
pub struct Terrain;

/// Triangle count the terrain contributes to the frame statistics.
#[derive(Resource, Clone, Copy, Default)]
pub struct TerrainStats {
    pub triangles: u32,
}

/// In-flight async mesh build, polled until ready.
#[derive(Resource, Default)]
pub struct PendingTerrainMesh {
    pub task: Option<Task<Mesh>>,
}

pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingTerrainMesh>()
            // The heightfield is ready before anything that queries it;
            // the render mesh trails in asynchronously.
            .add_systems(Startup, build_height_field)
            .add_systems(Update, receive_terrain_mesh);
    }
}

/// (Startup) Build the heightfield from settings and kick off the mesh task.
pub fn build_height_field(
    mut commands: Commands,
    settings: Res<WorldSettings>,
    mut pending: ResMut<PendingTerrainMesh>,
) {
    let field = match &settings.terrain.source {
        TerrainSource::Noise { .. } => HeightField::from_noise(&settings.terrain, settings.seed),
        TerrainSource::Image { path } => match HeightField::from_image(&settings.terrain, path) {
            Ok(field) => field,
            Err(e) => {
                warn!("Terrain: image source '{path}' unusable ({e}); falling back to noise");
                HeightField::from_noise(&settings.terrain, settings.seed)
            }
        },
    };

    info!(
        "Terrain: heightfield ready, {}x{} cells over {:.0}m",
        field.segments(),
        field.segments(),
        field.size()
    );

    // Snapshot is cheap: the sample buffer is Arc-backed.
    let snapshot = field.clone();
    let task = AsyncComputeTaskPool::get().spawn(async move { build_terrain_mesh(&snapshot) });
    pending.task = Some(task);

    commands.insert_resource(field);
}

/// Poll the mesh task; spawn the terrain entity once it completes.
pub fn receive_terrain_mesh(
    mut commands: Commands,
    mut pending: ResMut<PendingTerrainMesh>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(task) = pending.task.as_mut() else {
        return;
    };
    let Some(mesh) = future::block_on(future::poll_once(task)) else {
        return;
    };
    pending.task = None;

    let triangles = triangle_count(&mesh);
    let mesh_handle = meshes.add(mesh);
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.42, 0.55, 0.32),
        perceptual_roughness: 0.95,
        metallic: 0.0,
        ..default()
    });

    commands.spawn((
        Terrain,
        Mesh3d(mesh_handle),
        MeshMaterial3d(material),
        Transform::default(),
        GlobalTransform::default(),
        Visibility::Visible,
        InheritedVisibility::VISIBLE,
        ViewVisibility::default(),
        Name::new("Terrain"),
    ));
    commands.insert_resource(TerrainStats { triangles });

    info!("Terrain: mesh spawned ({triangles} triangles)");
}
