use bevy::prelude::*;
use bevy::ui::BackgroundColor;

use crate::navigation::NavInfo;
use crate::optimizer::PerfSnapshot;

#[derive(Component)]
pub struct PauseOverlay;

#[derive(Component)]
pub struct StatsReadout;

/// F3 toggles the stats readout.
#[derive(Resource)]
pub struct StatsOverlayVisible(pub bool);

impl Default for StatsOverlayVisible {
    fn default() -> Self {
        Self(true)
    }
}

pub fn spawn_pause_overlay(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::linear_rgba(0.0, 0.0, 0.0, 0.7)),
            PauseOverlay,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Paused"),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextLayout::new_with_justify(JustifyText::Center),
                TextColor(Color::WHITE),
            ));
        });
}

pub fn despawn_pause_overlay(mut commands: Commands, query: Query<Entity, With<PauseOverlay>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

pub fn spawn_stats_readout(mut commands: Commands) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            padding: UiRect::all(Val::Px(6.0)),
            ..default()
        },
        BackgroundColor(Color::linear_rgba(0.0, 0.0, 0.0, 0.45)),
        Text::new(""),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::WHITE),
        StatsReadout,
    ));
}

pub fn update_stats_readout(
    snapshot: Res<PerfSnapshot>,
    nav: Res<NavInfo>,
    overlay: Res<StatsOverlayVisible>,
    mut query: Query<(&mut Text, &mut Visibility), With<StatsReadout>>,
) {
    let Ok((mut text, mut visibility)) = query.single_mut() else {
        return;
    };

    if !overlay.0 {
        visibility.set_if_neq(Visibility::Hidden);
        return;
    }
    visibility.set_if_neq(Visibility::Visible);

    text.0 = format!(
        "fps (avg): {:.1}\n\
         resolution scale: {:.2}\n\
         visible / culled: {} / {}\n\
         managed objects: {}\n\
         pooled impostors: {}\n\
         draw calls: {}\n\
         triangles: {}\n\
         pos: ({:.1}, {:.1}, {:.1})  [{}{}]",
        snapshot.average_fps,
        snapshot.resolution_scale,
        snapshot.visible_objects,
        snapshot.culled_objects,
        snapshot.lod_object_count,
        snapshot.pooled_object_count,
        snapshot.draw_calls,
        snapshot.triangles,
        nav.position.x,
        nav.position.y,
        nav.position.z,
        nav.mode.label(),
        if nav.is_moving { ", moving" } else { "" },
    );
}
