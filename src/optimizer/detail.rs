// src/optimizer/detail.rs
//! Derives cheaper representations of a managed object: reduced-segment
//! geometry, simplified materials, and a per-kind impostor sprite.

use bevy::prelude::*;
use bevy::render::mesh::{MeshBuilder, Meshable};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use std::collections::HashMap;

use crate::optimizer::lod::LodThresholds;
use crate::props::PropKind;

/// Segment scale factors for the two reduced levels.
pub const REDUCTION_MEDIUM: f32 = 0.5;
pub const REDUCTION_LOW: f32 = 0.25;

const MIN_RADIAL_SEGMENTS: u32 = 3;
const MIN_RING_SEGMENTS: u32 = 1;

const SPRITE_SIZE: u32 = 32;

/// Ordered representation roles. Each maps to a minimum viewing distance
/// derived from the current thresholds, so threshold changes apply without
/// re-registering objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LodRole {
    Full,
    Medium,
    Low,
    Impostor,
}

impl LodRole {
    pub fn min_distance(self, thresholds: &LodThresholds) -> f32 {
        match self {
            LodRole::Full => 0.0,
            LodRole::Medium => thresholds.0[0],
            LodRole::Low => thresholds.0[1],
            LodRole::Impostor => thresholds.0[2],
        }
    }
}

// ---------- Parametric shapes ----------

/// Reconstructible geometry parameters. Reduction scales the segment
/// counts; a shape without any (cuboid) cannot be reduced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeSpec {
    Cylinder {
        radius: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
    },
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
    Sphere {
        radius: f32,
        sectors: u32,
        stacks: u32,
    },
    Capsule {
        radius: f32,
        length: f32,
        longitudes: u32,
        latitudes: u32,
    },
    Cuboid {
        half_extents: Vec3,
    },
}

impl ShapeSpec {
    /// Radius of the local-space bounding sphere around the shape's origin.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            ShapeSpec::Cylinder { radius, height, .. } | ShapeSpec::Cone { radius, height, .. } => {
                (radius * radius + height * height * 0.25).sqrt()
            }
            ShapeSpec::Sphere { radius, .. } => radius,
            ShapeSpec::Capsule { radius, length, .. } => radius + length * 0.5,
            ShapeSpec::Cuboid { half_extents } => half_extents.length(),
        }
    }
}

/// Scale a shape's segment counts by `factor`, clamped to the degeneracy
/// floors. Returns `None` when the shape has no reconstructible segment
/// parameters.
pub fn reduce_shape(spec: &ShapeSpec, factor: f32) -> Option<ShapeSpec> {
    let f = factor.clamp(0.05, 1.0);
    let radial = |n: u32| ((n as f32 * f).round() as u32).max(MIN_RADIAL_SEGMENTS);
    let rings = |n: u32| ((n as f32 * f).round() as u32).max(MIN_RING_SEGMENTS);

    match *spec {
        ShapeSpec::Cylinder {
            radius,
            height,
            radial_segments,
            height_segments,
        } => Some(ShapeSpec::Cylinder {
            radius,
            height,
            radial_segments: radial(radial_segments),
            height_segments: rings(height_segments),
        }),
        ShapeSpec::Cone {
            radius,
            height,
            radial_segments,
        } => Some(ShapeSpec::Cone {
            radius,
            height,
            radial_segments: radial(radial_segments),
        }),
        ShapeSpec::Sphere {
            radius,
            sectors,
            stacks,
        } => Some(ShapeSpec::Sphere {
            radius,
            sectors: radial(sectors),
            stacks: rings(stacks),
        }),
        ShapeSpec::Capsule {
            radius,
            length,
            longitudes,
            latitudes,
        } => Some(ShapeSpec::Capsule {
            radius,
            length,
            longitudes: radial(longitudes),
            // Hemisphere caps need one ring each.
            latitudes: ((latitudes as f32 * f).round() as u32).max(2),
        }),
        ShapeSpec::Cuboid { .. } => None,
    }
}

pub fn build_shape_mesh(spec: &ShapeSpec) -> Mesh {
    match *spec {
        ShapeSpec::Cylinder {
            radius,
            height,
            radial_segments,
            height_segments,
        } => Cylinder::new(radius, height)
            .mesh()
            .resolution(radial_segments)
            .segments(height_segments)
            .build(),
        ShapeSpec::Cone {
            radius,
            height,
            radial_segments,
        } => Cone { radius, height }
            .mesh()
            .resolution(radial_segments)
            .build(),
        ShapeSpec::Sphere {
            radius,
            sectors,
            stacks,
        } => Sphere::new(radius)
            .mesh()
            .uv(sectors, stacks),
        ShapeSpec::Capsule {
            radius,
            length,
            longitudes,
            latitudes,
        } => Capsule3d::new(radius, length)
            .mesh()
            .longitudes(longitudes)
            .latitudes(latitudes)
            .build(),
        ShapeSpec::Cuboid { half_extents } => Mesh::from(Cuboid::new(
            half_extents.x * 2.0,
            half_extents.y * 2.0,
            half_extents.z * 2.0,
        )),
    }
}

/// Clone of the full material with distance-appropriate simplification:
/// below factor 0.5 the normal and metallic-roughness maps are stripped.
pub fn simplify_material(full: &StandardMaterial, factor: f32) -> StandardMaterial {
    let mut mat = full.clone();
    if factor < 0.5 {
        mat.normal_map_texture = None;
        mat.metallic_roughness_texture = None;
    }
    mat
}

// ---------- Object descriptions ----------

/// One solid part of a managed object, positioned relative to its root.
#[derive(Clone, Debug)]
pub struct PartDef {
    pub shape: ShapeSpec,
    pub offset: Vec3,
    pub material: StandardMaterial,
}

/// Local bounding volume over all parts: (center offset, radius), plus the
/// largest axis extent for impostor sizing.
pub fn bounds_of(parts: &[PartDef]) -> (Vec3, f32, f32) {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for part in parts {
        let r = part.shape.bounding_radius();
        min = min.min(part.offset - Vec3::splat(r));
        max = max.max(part.offset + Vec3::splat(r));
    }
    if min.x > max.x {
        return (Vec3::ZERO, 0.0, 0.0);
    }
    let center = (min + max) * 0.5;
    let radius = (max - center).length();
    (center, radius, (max - min).max_element())
}

// ---------- Impostor sprites ----------

/// Cache of generated sprite textures, one per kind, shared by every
/// impostor of that kind.
#[derive(Resource, Default)]
pub struct ImpostorPool {
    textures: HashMap<PropKind, Handle<Image>>,
}

impl ImpostorPool {
    pub fn get_or_create(&mut self, kind: PropKind, images: &mut Assets<Image>) -> Handle<Image> {
        self.textures
            .entry(kind)
            .or_insert_with(|| images.add(impostor_image(kind)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn sprite(paint: impl Fn(f32, f32) -> [u8; 4]) -> Image {
    let mut data = Vec::with_capacity((SPRITE_SIZE * SPRITE_SIZE * 4) as usize);
    for y in 0..SPRITE_SIZE {
        for x in 0..SPRITE_SIZE {
            // v runs top (0) to bottom (1), matching texture space
            let u = (x as f32 + 0.5) / SPRITE_SIZE as f32;
            let v = (y as f32 + 0.5) / SPRITE_SIZE as f32;
            data.extend_from_slice(&paint(u, v));
        }
    }
    Image::new(
        Extent3d {
            width: SPRITE_SIZE,
            height: SPRITE_SIZE,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// Sprite glyph for a kind. Total over the closed kind set; `Generic` is
/// the explicit fallback glyph.
pub fn impostor_image(kind: PropKind) -> Image {
    match kind {
        PropKind::Tree => sprite(|u, v| {
            let trunk = (u - 0.5).abs() < 0.06 && v > 0.68 && v < 0.98;
            let canopy_half = ((v - 0.06) / 0.64).clamp(0.0, 1.0) * 0.44;
            let canopy = v >= 0.06 && v <= 0.70 && (u - 0.5).abs() < canopy_half;
            if trunk {
                [96, 64, 32, 255]
            } else if canopy {
                [40, 110, 45, 255]
            } else {
                CLEAR
            }
        }),
        PropKind::Rock => sprite(|u, v| {
            let du = (u - 0.5) / 0.44;
            let dv = (v - 0.62) / 0.32;
            if du * du + dv * dv < 1.0 {
                [120, 118, 112, 255]
            } else {
                CLEAR
            }
        }),
        PropKind::Building => sprite(|u, v| {
            let body = (u - 0.5).abs() < 0.38 && v > 0.22 && v < 0.98;
            if body {
                if v < 0.34 {
                    [90, 58, 48, 255]
                } else {
                    [196, 178, 148, 255]
                }
            } else {
                CLEAR
            }
        }),
        PropKind::Npc => sprite(|u, v| {
            let du = u - 0.5;
            let head = du * du + (v - 0.2) * (v - 0.2) < 0.12 * 0.12;
            let body = du.abs() < 0.13 && v > 0.32 && v < 0.95;
            if head || body {
                [124, 144, 255, 255]
            } else {
                CLEAR
            }
        }),
        PropKind::Generic => sprite(|u, v| {
            if (u - 0.5).abs() + (v - 0.5).abs() < 0.4 {
                [220, 220, 220, 255]
            } else {
                CLEAR
            }
        }),
    }
}

// ---------- Level assembly ----------

/// A representation ready to attach under a managed root.
pub struct BuiltLevel {
    pub role: LodRole,
    pub parts: Vec<BuiltPart>,
    /// Impostor levels face the camera each frame.
    pub billboard: bool,
}

pub struct BuiltPart {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub offset: Vec3,
    pub triangles: u32,
}

fn mesh_triangles(mesh: &Mesh) -> u32 {
    mesh.indices().map(|ix| ix.len() as u32 / 3).unwrap_or(0)
}

fn build_reduced(
    parts: &[PartDef],
    factor: f32,
    role: LodRole,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> Option<BuiltLevel> {
    if !parts.iter().any(|p| reduce_shape(&p.shape, factor).is_some()) {
        return None;
    }

    let mut built = Vec::with_capacity(parts.len());
    for part in parts {
        // Irreducible parts are reused at full geometry.
        let shape = reduce_shape(&part.shape, factor).unwrap_or(part.shape);
        let mesh = build_shape_mesh(&shape);
        let triangles = mesh_triangles(&mesh);
        built.push(BuiltPart {
            mesh: meshes.add(mesh),
            material: materials.add(simplify_material(&part.material, factor)),
            offset: part.offset,
            triangles,
        });
    }
    Some(BuiltLevel {
        role,
        parts: built,
        billboard: false,
    })
}

fn build_impostor(
    kind: PropKind,
    parts: &[PartDef],
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    images: &mut Assets<Image>,
    pool: &mut ImpostorPool,
) -> BuiltLevel {
    let (center, _, extent) = bounds_of(parts);
    let extent = extent.max(0.5);
    let texture = pool.get_or_create(kind, images);

    let mesh = Mesh::from(Rectangle::new(extent, extent));
    let material = StandardMaterial {
        base_color_texture: Some(texture),
        alpha_mode: AlphaMode::Mask(0.5),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    };

    BuiltLevel {
        role: LodRole::Impostor,
        parts: vec![BuiltPart {
            mesh: meshes.add(mesh),
            material: materials.add(material),
            offset: Vec3::new(center.x, extent * 0.5, center.z),
            triangles: 2,
        }],
        billboard: true,
    }
}

/// Build the ordered representation list for an object: the original at
/// level 0, whichever reduced levels could be derived, and the impostor.
/// Missing reduced levels are skipped (logged), never an error.
pub fn build_detail_levels(
    kind: PropKind,
    parts: &[PartDef],
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    images: &mut Assets<Image>,
    pool: &mut ImpostorPool,
) -> Vec<BuiltLevel> {
    let mut levels = Vec::with_capacity(4);

    let full_parts = parts
        .iter()
        .map(|part| {
            let mesh = build_shape_mesh(&part.shape);
            let triangles = mesh_triangles(&mesh);
            BuiltPart {
                mesh: meshes.add(mesh),
                material: materials.add(part.material.clone()),
                offset: part.offset,
                triangles,
            }
        })
        .collect();
    levels.push(BuiltLevel {
        role: LodRole::Full,
        parts: full_parts,
        billboard: false,
    });

    for (factor, role) in [
        (REDUCTION_MEDIUM, LodRole::Medium),
        (REDUCTION_LOW, LodRole::Low),
    ] {
        match build_reduced(parts, factor, role, meshes, materials) {
            Some(level) => levels.push(level),
            None => debug!("Detail: no reducible geometry for {kind:?} at factor {factor}"),
        }
    }

    levels.push(build_impostor(kind, parts, meshes, materials, images, pool));
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_respects_segment_floors() {
        let spec = ShapeSpec::Cylinder {
            radius: 1.0,
            height: 2.0,
            radial_segments: 16,
            height_segments: 4,
        };
        let reduced = reduce_shape(&spec, 0.05).unwrap();
        match reduced {
            ShapeSpec::Cylinder {
                radial_segments,
                height_segments,
                ..
            } => {
                assert_eq!(radial_segments, MIN_RADIAL_SEGMENTS);
                assert_eq!(height_segments, MIN_RING_SEGMENTS);
            }
            _ => panic!("reduction must not change the shape family"),
        }
    }

    #[test]
    fn half_reduction_halves_segments() {
        let spec = ShapeSpec::Cone {
            radius: 1.0,
            height: 3.0,
            radial_segments: 16,
        };
        match reduce_shape(&spec, 0.5).unwrap() {
            ShapeSpec::Cone { radial_segments, .. } => assert_eq!(radial_segments, 8),
            _ => panic!("shape family changed"),
        }
    }

    #[test]
    fn cuboids_have_no_reduced_form() {
        let spec = ShapeSpec::Cuboid {
            half_extents: Vec3::splat(1.0),
        };
        assert!(reduce_shape(&spec, 0.5).is_none());
    }

    #[test]
    fn low_factor_strips_texture_maps() {
        let full = StandardMaterial {
            normal_map_texture: Some(Handle::default()),
            metallic_roughness_texture: Some(Handle::default()),
            ..default()
        };
        let medium = simplify_material(&full, 0.5);
        assert!(medium.normal_map_texture.is_some());
        let low = simplify_material(&full, 0.25);
        assert!(low.normal_map_texture.is_none());
        assert!(low.metallic_roughness_texture.is_none());
    }

    #[test]
    fn bounds_cover_all_parts() {
        let parts = [
            PartDef {
                shape: ShapeSpec::Sphere {
                    radius: 1.0,
                    sectors: 8,
                    stacks: 4,
                },
                offset: Vec3::ZERO,
                material: StandardMaterial::default(),
            },
            PartDef {
                shape: ShapeSpec::Sphere {
                    radius: 1.0,
                    sectors: 8,
                    stacks: 4,
                },
                offset: Vec3::new(0.0, 4.0, 0.0),
                material: StandardMaterial::default(),
            },
        ];
        let (center, radius, extent) = bounds_of(&parts);
        assert_eq!(center, Vec3::new(0.0, 2.0, 0.0));
        assert!(radius >= 3.0);
        assert_eq!(extent, 6.0);
    }

    #[test]
    fn impostor_role_distance_tracks_thresholds() {
        let thresholds = LodThresholds([50.0, 150.0, 300.0]);
        assert_eq!(LodRole::Full.min_distance(&thresholds), 0.0);
        assert_eq!(LodRole::Medium.min_distance(&thresholds), 50.0);
        assert_eq!(LodRole::Low.min_distance(&thresholds), 150.0);
        assert_eq!(LodRole::Impostor.min_distance(&thresholds), 300.0);
    }

    #[test]
    fn every_kind_has_a_sprite() {
        for kind in [
            PropKind::Tree,
            PropKind::Rock,
            PropKind::Building,
            PropKind::Npc,
            PropKind::Generic,
        ] {
            let image = impostor_image(kind);
            let data = image.data.expect("sprite images carry CPU-side data");
            assert_eq!(data.len(), (SPRITE_SIZE * SPRITE_SIZE * 4) as usize);
            assert!(
                data.chunks_exact(4).any(|px| px[3] == 255),
                "{kind:?} sprite should have opaque texels"
            );
        }
    }
}
