// src/props/spawn.rs
//! Archetype definitions and the startup population pass.

use bevy::prelude::*;

use crate::navigation::{SupportSphere, SupportSurfaces};
use crate::optimizer::detail::bounds_of;
use crate::optimizer::{create_levels_for, ImpostorPool, LodRegistry, PartDef, ShapeSpec};
use crate::props::placement::{jittered_grid, PlacementParams};
use crate::props::PropKind;
use crate::settings::WorldSettings;
use crate::terrain::HeightField;

const MAX_PER_KIND: usize = 4096;
/// Keep placements this far inside the terrain edge.
const EDGE_MARGIN: f32 = 12.0;

/// Everything needed to instantiate one kind of object.
pub struct PropArchetype {
    pub parts: Vec<PartDef>,
    /// Standable objects publish a support sphere for the navigation probe.
    pub support: bool,
}

fn color_material(color: Color, roughness: f32) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        perceptual_roughness: roughness,
        metallic: 0.0,
        ..default()
    }
}

/// Total archetype table over the closed kind set.
pub fn archetype(kind: PropKind) -> PropArchetype {
    match kind {
        PropKind::Tree => PropArchetype {
            parts: vec![
                PartDef {
                    shape: ShapeSpec::Cylinder {
                        radius: 0.25,
                        height: 2.4,
                        radial_segments: 12,
                        height_segments: 4,
                    },
                    offset: Vec3::new(0.0, 1.2, 0.0),
                    material: color_material(Color::srgb(0.38, 0.26, 0.13), 0.9),
                },
                PartDef {
                    shape: ShapeSpec::Cone {
                        radius: 1.6,
                        height: 3.4,
                        radial_segments: 16,
                    },
                    offset: Vec3::new(0.0, 4.1, 0.0),
                    material: color_material(Color::srgb(0.16, 0.43, 0.18), 0.95),
                },
            ],
            support: false,
        },
        PropKind::Rock => PropArchetype {
            parts: vec![PartDef {
                shape: ShapeSpec::Sphere {
                    radius: 1.1,
                    sectors: 18,
                    stacks: 12,
                },
                offset: Vec3::new(0.0, 0.55, 0.0),
                material: color_material(Color::srgb(0.47, 0.46, 0.44), 1.0),
            }],
            support: true,
        },
        PropKind::Building => PropArchetype {
            parts: vec![PartDef {
                shape: ShapeSpec::Cuboid {
                    half_extents: Vec3::new(3.0, 3.5, 3.0),
                },
                offset: Vec3::new(0.0, 3.5, 0.0),
                material: color_material(Color::srgb(0.77, 0.70, 0.58), 0.85),
            }],
            support: true,
        },
        PropKind::Npc => PropArchetype {
            parts: vec![PartDef {
                shape: ShapeSpec::Capsule {
                    radius: 0.4,
                    length: 1.0,
                    longitudes: 16,
                    latitudes: 8,
                },
                offset: Vec3::new(0.0, 0.9, 0.0),
                material: color_material(Color::srgb_u8(124, 144, 255), 0.7),
            }],
            support: false,
        },
        PropKind::Generic => PropArchetype {
            parts: vec![PartDef {
                shape: ShapeSpec::Sphere {
                    radius: 0.6,
                    sectors: 12,
                    stacks: 8,
                },
                offset: Vec3::new(0.0, 0.6, 0.0),
                material: color_material(Color::srgb(0.8, 0.8, 0.8), 0.8),
            }],
            support: false,
        },
    }
}

fn cell_for(kind: PropKind, settings: &WorldSettings) -> f32 {
    match kind {
        PropKind::Tree => settings.props.tree_cell,
        PropKind::Rock => settings.props.rock_cell,
        PropKind::Building => settings.props.building_cell,
        PropKind::Npc => settings.props.npc_cell,
        PropKind::Generic => settings.props.npc_cell,
    }
}

/// (PostStartup) Place and spawn the world population, registering every
/// object with the optimizer and publishing support spheres.
#[allow(clippy::too_many_arguments)]
pub fn spawn_props(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut pool: ResMut<ImpostorPool>,
    mut registry: ResMut<LodRegistry>,
    mut supports: ResMut<SupportSurfaces>,
    settings: Res<WorldSettings>,
    field: Res<HeightField>,
) {
    let half = (field.half_extent() - EDGE_MARGIN).max(0.0);

    for kind in PropKind::SPAWNED {
        let arch = archetype(kind);
        let params = PlacementParams {
            cell: cell_for(kind, &settings),
            jitter: settings.props.jitter,
            cap: MAX_PER_KIND,
        };
        let placements = jittered_grid(settings.seed, kind.placement_salt(), half, &params);
        let count = placements.len();

        for p in placements {
            let ground = field.height_at(p.x, p.z);
            let translation = Vec3::new(p.x, ground, p.z);

            let root = commands
                .spawn((
                    Transform {
                        translation,
                        rotation: Quat::from_rotation_y(p.rot_y),
                        scale: Vec3::splat(p.scale),
                    },
                    GlobalTransform::default(),
                    Visibility::Visible,
                    InheritedVisibility::VISIBLE,
                    ViewVisibility::default(),
                    Name::new(format!("{} ({:.0}, {:.0})", kind.label(), p.x, p.z)),
                ))
                .id();

            create_levels_for(
                &mut commands,
                &mut meshes,
                &mut materials,
                &mut images,
                &mut pool,
                &mut registry,
                root,
                kind,
                &arch.parts,
                true,
            );

            if arch.support {
                let (center, radius, _) = bounds_of(&arch.parts);
                supports.push(SupportSphere {
                    center: translation + center * p.scale,
                    radius: radius * p.scale,
                });
            }
        }

        info!("Props: spawned {count} {}s", kind.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_an_archetype_with_parts() {
        for kind in [
            PropKind::Tree,
            PropKind::Rock,
            PropKind::Building,
            PropKind::Npc,
            PropKind::Generic,
        ] {
            let arch = archetype(kind);
            assert!(!arch.parts.is_empty(), "{kind:?} has no parts");
            let (_, radius, extent) = bounds_of(&arch.parts);
            assert!(radius > 0.0);
            assert!(extent > 0.0);
        }
    }

    #[test]
    fn standable_kinds_are_the_solid_ones() {
        assert!(archetype(PropKind::Rock).support);
        assert!(archetype(PropKind::Building).support);
        assert!(!archetype(PropKind::Tree).support);
        assert!(!archetype(PropKind::Npc).support);
    }
}
