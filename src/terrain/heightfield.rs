// src/terrain/heightfield.rs
//! The immutable terrain heightfield: a square grid of sampled heights
//! shared read-only by navigation, prop placement and mesh building.

use bevy::prelude::*;
use noise::{NoiseFn, Simplex};
use std::sync::Arc;

use crate::settings::{TerrainSettings, TerrainSource};

/// Sampled heights over the bounded square domain `[-size/2, size/2]^2`,
/// `segments + 1` samples per axis. Built once at world creation and
/// never mutated; the buffer is `Arc`-backed so async mesh building can
/// snapshot it without copying.
#[derive(Resource, Clone)]
pub struct HeightField {
    size: f32,
    segments: u32,
    heights: Arc<Vec<f32>>, // row-major, (segments + 1)^2
}

impl HeightField {
    /// Wrap an existing sample grid. `heights` must hold exactly
    /// `(segments + 1)^2` row-major values.
    pub fn from_samples(size: f32, segments: u32, heights: Vec<f32>) -> Self {
        let verts = (segments as usize + 1) * (segments as usize + 1);
        debug_assert_eq!(heights.len(), verts, "sample grid size mismatch");
        Self {
            size,
            segments,
            heights: Arc::new(heights),
        }
    }

    /// Build from seeded multi-octave simplex fBm.
    pub fn from_noise(settings: &TerrainSettings, seed: u64) -> Self {
        let (octaves, lacunarity, persistence, base_frequency) = match settings.source {
            TerrainSource::Noise {
                octaves,
                lacunarity,
                persistence,
                base_frequency,
            } => (octaves, lacunarity, persistence, base_frequency),
            // Callers pick this constructor for noise sources only, but the
            // fallback keeps it total.
            _ => (5, 2.0, 0.5, 0.004),
        };

        let noise = Simplex::new(seed as u32);
        let segments = settings.segments.max(1);
        let size = settings.size;
        let half = size * 0.5;
        let verts = segments as usize + 1;

        let mut heights = Vec::with_capacity(verts * verts);
        for j in 0..verts {
            let z = -half + (j as f32 / segments as f32) * size;
            for i in 0..verts {
                let x = -half + (i as f32 / segments as f32) * size;
                let h = fbm(
                    &noise,
                    x as f64,
                    z as f64,
                    octaves,
                    lacunarity,
                    persistence,
                    base_frequency,
                );
                heights.push(h as f32 * settings.height_scale);
            }
        }

        Self::from_samples(size, segments, heights)
    }

    /// Build from a grayscale image: luma 0..255 maps to 0..height_scale.
    pub fn from_image(
        settings: &TerrainSettings,
        path: &str,
    ) -> Result<Self, image::ImageError> {
        let luma = image::open(path)?.to_luma8();
        let segments = settings.segments.max(1);
        let verts = segments as usize + 1;
        let max_px = luma.width().saturating_sub(1);
        let max_pz = luma.height().saturating_sub(1);

        let mut heights = Vec::with_capacity(verts * verts);
        for j in 0..verts {
            let v = j as f32 / segments as f32;
            let pz = (v * max_pz as f32).round() as u32;
            for i in 0..verts {
                let u = i as f32 / segments as f32;
                let px = (u * max_px as f32).round() as u32;
                let raw = luma.get_pixel(px, pz)[0] as f32 / 255.0;
                heights.push(raw * settings.height_scale);
            }
        }

        Ok(Self::from_samples(settings.size, segments, heights))
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn half_extent(&self) -> f32 {
        self.size * 0.5
    }

    /// Height query for any world (x, z): nearest-cell lookup. Coordinates
    /// mapping outside the grid index range `[0, segments)` return 0.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let half = self.size * 0.5;
        let ix = (((x + half) / self.size) * self.segments as f32).floor();
        let iz = (((z + half) / self.size) * self.segments as f32).floor();
        if ix < 0.0 || iz < 0.0 || ix >= self.segments as f32 || iz >= self.segments as f32 {
            return 0.0;
        }
        self.vertex_height(ix as u32, iz as u32)
    }

    /// Raw grid sample at vertex (i, j), both in `0..=segments`.
    /// Used by mesh building; indices are clamped into range.
    #[inline]
    pub fn vertex_height(&self, i: u32, j: u32) -> f32 {
        let verts = self.segments + 1;
        let i = i.min(self.segments);
        let j = j.min(self.segments);
        self.heights[(j * verts + i) as usize]
    }
}

/// Multi-octave fractal Brownian motion over simplex noise. Each octave
/// doubles frequency (by `lacunarity`) and damps amplitude (by
/// `persistence`); the sum is normalized back into roughly [-1, 1].
fn fbm(
    noise: &Simplex,
    x: f64,
    z: f64,
    octaves: u32,
    lacunarity: f64,
    persistence: f64,
    base_frequency: f64,
) -> f64 {
    let mut total = 0.0;
    let mut frequency = base_frequency;
    let mut amplitude = 1.0;
    let mut max_amplitude = 0.0;

    for _ in 0..octaves.max(1) {
        total += noise.get([x * frequency, z * frequency]) * amplitude;
        max_amplitude += amplitude;
        frequency *= lacunarity;
        amplitude *= persistence;
    }

    total / max_amplitude
}
