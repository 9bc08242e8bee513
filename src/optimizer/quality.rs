// src/optimizer/quality.rs
//! Closed-loop quality control: a once-per-second sample of the mean frame
//! rate drives the render resolution scale (in 10% steps) and the LOD
//! distance thresholds (preset switch with a hysteresis band).

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::optimizer::lod::LodThresholds;

pub const MIN_RESOLUTION_SCALE: f32 = 0.5;
pub const SAMPLE_WINDOW_SECS: f32 = 1.0;

const FPS_SCALE_DOWN_BELOW: f32 = 30.0;
const FPS_SCALE_UP_ABOVE: f32 = 55.0;
const FPS_TIGHTEN_BELOW: f32 = 25.0;
const FPS_RELAX_ABOVE: f32 = 50.0;

/// Instantaneous per-frame FPS samples accumulated since the last window,
/// plus the last window's mean for observability.
#[derive(Resource, Default)]
pub struct FpsSamples {
    samples: Vec<f32>,
    pub average: f32,
}

impl FpsSamples {
    pub fn push(&mut self, fps: f32) {
        self.samples.push(fps);
    }

    /// Mean of the window, clearing it; `None` when no frames arrived
    /// (backgrounded window), in which case the update is skipped.
    pub fn drain_window(&mut self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let mean = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        self.samples.clear();
        self.average = mean;
        Some(mean)
    }
}

/// Current render resolution scale, bounded `[0.5, native scale factor]`.
#[derive(Resource, Clone, Copy, Debug)]
pub struct QualityState {
    pub resolution_scale: f32,
    pub native_scale: f32,
}

impl Default for QualityState {
    fn default() -> Self {
        Self {
            resolution_scale: 1.0,
            native_scale: 1.0,
        }
    }
}

#[derive(Resource)]
pub struct QualityTimer(pub Timer);

impl Default for QualityTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(SAMPLE_WINDOW_SECS, TimerMode::Repeating))
    }
}

/// One control step. Resolution scale moves by 10% at a time and clamps at
/// the bounds; thresholds switch preset outside the 25–50 FPS band and
/// hold inside it.
pub fn quality_step(mean_fps: f32, state: &mut QualityState, thresholds: &mut LodThresholds) {
    if mean_fps < FPS_SCALE_DOWN_BELOW && state.resolution_scale > MIN_RESOLUTION_SCALE {
        state.resolution_scale = (state.resolution_scale * 0.9).max(MIN_RESOLUTION_SCALE);
    } else if mean_fps > FPS_SCALE_UP_ABOVE && state.resolution_scale < state.native_scale {
        state.resolution_scale = (state.resolution_scale * 1.1).min(state.native_scale);
    }

    if mean_fps < FPS_TIGHTEN_BELOW {
        *thresholds = LodThresholds::TIGHT;
    } else if mean_fps > FPS_RELAX_ABOVE {
        *thresholds = LodThresholds::RELAXED;
    }
}

// ---------- Systems ----------

/// (Startup) The window's native scale factor stands in for the device
/// pixel ratio and caps the resolution scale.
pub fn capture_native_scale(
    mut state: ResMut<QualityState>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    state.native_scale = window.resolution.base_scale_factor().max(MIN_RESOLUTION_SCALE);
    state.resolution_scale = state.native_scale;
}

/// Every frame: record the instantaneous FPS for this frame's delta.
pub fn accumulate_fps_sample(time: Res<Time>, mut samples: ResMut<FpsSamples>) {
    let delta_ms = time.delta_secs() * 1000.0;
    if delta_ms > 0.0 {
        samples.push(1000.0 / delta_ms);
    }
}

/// Once per sampling window: fold the mean FPS into scale and thresholds.
pub fn run_quality_controller(
    time: Res<Time>,
    mut timer: ResMut<QualityTimer>,
    mut samples: ResMut<FpsSamples>,
    mut state: ResMut<QualityState>,
    mut thresholds: ResMut<LodThresholds>,
) {
    timer.0.tick(time.delta());
    if !timer.0.just_finished() {
        return;
    }

    let Some(mean) = samples.drain_window() else {
        debug!("Quality: no frame samples this window, skipping update");
        return;
    };

    let before = state.resolution_scale;
    quality_step(mean, &mut state, &mut thresholds);
    if (state.resolution_scale - before).abs() > f32::EPSILON {
        info!(
            "Quality: mean {mean:.1} FPS, resolution scale {:.2} -> {:.2}",
            before, state.resolution_scale
        );
    }
}

/// Push a changed resolution scale to the renderer via the window's
/// scale-factor override.
pub fn apply_resolution_scale(
    state: Res<QualityState>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !state.is_changed() {
        return;
    }
    let Ok(mut window) = windows.single_mut() else {
        return;
    };
    window
        .resolution
        .set_scale_factor_override(Some(state.resolution_scale));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(scale: f32, native: f32) -> QualityState {
        QualityState {
            resolution_scale: scale,
            native_scale: native,
        }
    }

    #[test]
    fn forty_five_fps_changes_nothing() {
        let mut st = state(1.0, 1.0);
        let mut thresholds = LodThresholds::RELAXED;
        for _ in 0..100 {
            quality_step(45.0, &mut st, &mut thresholds);
        }
        assert_eq!(st.resolution_scale, 1.0);
        assert_eq!(thresholds, LodThresholds::RELAXED);
    }

    #[test]
    fn twenty_fps_steps_down_to_the_floor_and_stays() {
        let mut st = state(1.0, 1.0);
        let mut thresholds = LodThresholds::RELAXED;
        let mut last = st.resolution_scale;
        for _ in 0..40 {
            quality_step(20.0, &mut st, &mut thresholds);
            assert!(st.resolution_scale <= last, "scale must fall monotonically");
            assert!(st.resolution_scale >= MIN_RESOLUTION_SCALE);
            last = st.resolution_scale;
        }
        assert_eq!(st.resolution_scale, MIN_RESOLUTION_SCALE);
        assert_eq!(thresholds, LodThresholds::TIGHT);
        quality_step(20.0, &mut st, &mut thresholds);
        assert_eq!(st.resolution_scale, MIN_RESOLUTION_SCALE);
    }

    #[test]
    fn steps_are_ten_percent_not_jumps() {
        let mut st = state(1.0, 1.0);
        let mut thresholds = LodThresholds::RELAXED;
        quality_step(20.0, &mut st, &mut thresholds);
        assert!((st.resolution_scale - 0.9).abs() < 1e-6);
        quality_step(20.0, &mut st, &mut thresholds);
        assert!((st.resolution_scale - 0.81).abs() < 1e-6);
    }

    #[test]
    fn high_fps_recovers_up_to_the_native_cap() {
        let mut st = state(0.5, 2.0);
        let mut thresholds = LodThresholds::TIGHT;
        for _ in 0..60 {
            quality_step(60.0, &mut st, &mut thresholds);
            assert!(st.resolution_scale <= 2.0);
        }
        assert_eq!(st.resolution_scale, 2.0);
        assert_eq!(thresholds, LodThresholds::RELAXED);
    }

    #[test]
    fn hysteresis_band_leaves_thresholds_alone() {
        let mut st = state(1.0, 1.0);
        let mut thresholds = LodThresholds::TIGHT;
        quality_step(40.0, &mut st, &mut thresholds);
        assert_eq!(thresholds, LodThresholds::TIGHT);
        let mut thresholds = LodThresholds::RELAXED;
        quality_step(30.0, &mut st, &mut thresholds);
        assert_eq!(thresholds, LodThresholds::RELAXED);
    }

    #[test]
    fn empty_window_skips_the_update() {
        let mut samples = FpsSamples::default();
        assert!(samples.drain_window().is_none());
        samples.push(30.0);
        samples.push(60.0);
        assert_eq!(samples.drain_window(), Some(45.0));
        assert_eq!(samples.average, 45.0);
        // Window cleared after the drain.
        assert!(samples.drain_window().is_none());
    }
}
