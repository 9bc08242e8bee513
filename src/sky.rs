// src/sky.rs
//! Day/night cycle: normalized clock, sun light, ambient and clear-color ramps.

use bevy::prelude::*;

use crate::settings::WorldSettings;
use crate::state::GameState;

const NOON_LUX: f32 = 32_000.0;
const NIGHT_AMBIENT: f32 = 12.0;
const DAY_AMBIENT: f32 = 90.0;

const NIGHT_SKY: Vec3 = Vec3::new(0.015, 0.025, 0.07);
const DAY_SKY: Vec3 = Vec3::new(0.45, 0.66, 0.93);
const HORIZON_SKY: Vec3 = Vec3::new(0.88, 0.48, 0.28);

/// Normalized time of day in `[0, 1]`: 0.0 midnight, 0.25 dawn, 0.5 noon.
#[derive(Resource, Clone, Debug)]
pub struct DayCycle {
    time_of_day: f32,
    pub day_length_secs: f32,
    pub animate: bool,
}

impl DayCycle {
    pub fn new(day_length_secs: f32) -> Self {
        Self {
            time_of_day: 0.35, // mid-morning start
            day_length_secs: day_length_secs.max(1.0),
            animate: true,
        }
    }

    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    /// External set requests clamp out-of-range values rather than reject them.
    pub fn set_time_of_day(&mut self, t: f32) {
        self.time_of_day = t.clamp(0.0, 1.0);
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.animate {
            return;
        }
        self.time_of_day = (self.time_of_day + dt / self.day_length_secs).fract();
    }

    /// Unit vector pointing toward the sun. +Y at noon, -Y at midnight.
    pub fn sun_direction(&self) -> Vec3 {
        let angle = self.time_of_day * std::f32::consts::TAU;
        Vec3::new(angle.sin() * 0.4, -angle.cos(), angle.sin() * 0.25).normalize()
    }
}

impl Default for DayCycle {
    fn default() -> Self {
        Self::new(240.0)
    }
}

/// Daylight factor in `[0, 1]` from the sun's elevation, smooth through
/// dawn and dusk.
pub fn daylight_factor(sun_direction: Vec3) -> f32 {
    let low = (-10.0_f32).to_radians().sin();
    let high = (15.0_f32).to_radians().sin();
    smoothstep(low, high, sun_direction.y)
}

/// Sky clear color for the current sun direction: night/day blend with a
/// warm tint near the horizon.
pub fn sky_color(sun_direction: Vec3) -> Color {
    let day = daylight_factor(sun_direction);
    let base = NIGHT_SKY.lerp(DAY_SKY, day);
    // Horizon tint peaks when the sun sits near the horizon.
    let horizon = 1.0 - (sun_direction.y.abs() * 4.0).min(1.0);
    let rgb = base.lerp(HORIZON_SKY, horizon * 0.6);
    Color::srgb(rgb.x, rgb.y, rgb.z)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Component)]
pub struct Sun;

pub struct SkyPlugin;

impl Plugin for SkyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_sky)
            .add_systems(Update, update_sky.run_if(in_state(GameState::Running)));
    }
}

fn spawn_sky(mut commands: Commands, settings: Res<WorldSettings>) {
    let cycle = DayCycle::new(settings.day_length_secs);
    let sun_dir = cycle.sun_direction();

    commands.spawn((
        Sun,
        DirectionalLight {
            illuminance: NOON_LUX * daylight_factor(sun_dir),
            shadows_enabled: true,
            ..default()
        },
        Transform::default().looking_to(-sun_dir, Vec3::Y),
        Name::new("Sun"),
    ));

    commands.insert_resource(ClearColor(sky_color(sun_dir)));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: DAY_AMBIENT,
        ..default()
    });
    commands.insert_resource(cycle);
}

fn update_sky(
    time: Res<Time>,
    mut cycle: ResMut<DayCycle>,
    mut clear: ResMut<ClearColor>,
    mut ambient: ResMut<AmbientLight>,
    mut sun_q: Query<(&mut DirectionalLight, &mut Transform), With<Sun>>,
) {
    cycle.advance(time.delta_secs());
    let sun_dir = cycle.sun_direction();
    let day = daylight_factor(sun_dir);

    clear.0 = sky_color(sun_dir);
    ambient.brightness = NIGHT_AMBIENT + (DAY_AMBIENT - NIGHT_AMBIENT) * day;

    if let Ok((mut light, mut tf)) = sun_q.single_mut() {
        light.illuminance = NOON_LUX * day;
        *tf = Transform::default().looking_to(-sun_dir, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_time_is_clamped() {
        let mut cycle = DayCycle::new(120.0);
        cycle.set_time_of_day(1.6);
        assert_eq!(cycle.time_of_day(), 1.0);
        cycle.set_time_of_day(-0.4);
        assert_eq!(cycle.time_of_day(), 0.0);
        cycle.set_time_of_day(0.5);
        assert_eq!(cycle.time_of_day(), 0.5);
    }

    #[test]
    fn noon_sun_is_highest() {
        let mut cycle = DayCycle::new(120.0);
        cycle.set_time_of_day(0.5);
        let noon = cycle.sun_direction().y;
        for t in [0.0, 0.2, 0.35, 0.65, 0.8] {
            cycle.set_time_of_day(t);
            assert!(cycle.sun_direction().y <= noon);
        }
        assert!(noon > 0.9);
    }

    #[test]
    fn daylight_fades_through_the_night() {
        let mut cycle = DayCycle::new(120.0);
        cycle.set_time_of_day(0.5);
        assert!(daylight_factor(cycle.sun_direction()) > 0.99);
        cycle.set_time_of_day(0.0);
        assert!(daylight_factor(cycle.sun_direction()) < 0.01);
    }

    #[test]
    fn paused_cycle_does_not_advance() {
        let mut cycle = DayCycle::new(120.0);
        cycle.animate = false;
        let before = cycle.time_of_day();
        cycle.advance(10.0);
        assert_eq!(cycle.time_of_day(), before);
    }
}
