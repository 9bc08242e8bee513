use bevy::prelude::*;

#[derive(Component)]
pub struct MainCamera;

/// Spawn the camera rig. Pose and rotation are overwritten every frame by
/// the navigation controller.
pub fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: 60.0_f32.to_radians(),
            ..default()
        }),
        Transform::from_xyz(0.0, 6.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
    ));
}
