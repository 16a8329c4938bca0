use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};
use bevy::math::primitives::Rectangle;

use crate::simulation::scenario::Scenario;

#[derive(Component)]
struct MassIndex(pub usize);

/// Set once the integrator reports a divergence; the last valid frame stays on screen
#[derive(Resource, Default)]
struct Halted(bool);

// Window layout in pixels, origin top-left, y down
const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 500.0;
const TRACK_Y: f32 = 400.0;
const HALF_SIZE: f32 = 50.0;
const OFFSETS: [f32; 2] = [200.0, 400.0]; // rest offset of each mass
const PIXEL_SCALE: f32 = 1.5;

const PINK: Color = Color::srgb(245.0 / 255.0, 5.0 / 255.0, 150.0 / 255.0);
const BLUE: Color = Color::srgb(0.0, 0.0, 1.0);

/// Window pixel -> Bevy world coordinates (origin centre, y up)
fn to_world(px: f32, py: f32) -> Vec2 {
    Vec2::new(px - 0.5 * WIDTH, 0.5 * HEIGHT - py)
}

/// Horizontal pixel of mass `i` at displacement `x`
fn mass_pixel_x(i: usize, x: f64) -> f32 {
    (x as f32 + OFFSETS[i]) * PIXEL_SCALE
}

pub fn run_2d(scenario: Scenario) {
    println!("run_2d: starting Bevy 2D viewer, dt = {}", scenario.parameters.dt);

    App::new()
        .insert_resource(scenario)
        .insert_resource(ClearColor(Color::BLACK))
        .init_resource::<Halted>()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Eigen value problem for coupled oscillators".into(),
                resolution: (WIDTH, HEIGHT).into(),
                resizable: false,
                ..default()
            }),
            ..default()
        }))
        .add_systems(Startup, setup_masses_system)
        .add_systems(
            Update,
            (physics_step_system, sync_transforms_system, draw_springs_system).chain(),
        )
        .run();
}

fn setup_masses_system(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    // 2D camera
    commands.spawn(Camera2dBundle::default());

    for (i, color) in [PINK, BLUE].into_iter().enumerate() {
        let pos = to_world(mass_pixel_x(i, 0.0), TRACK_Y);

        commands.spawn((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(meshes.add(Rectangle::new(2.0 * HALF_SIZE, 2.0 * HALF_SIZE))),
                material: materials.add(ColorMaterial::from(color)),
                transform: Transform::from_xyz(pos.x, pos.y, 0.0),
                ..Default::default()
            },
            MassIndex(i),
        ));
    }
}

fn physics_step_system(mut scenario: ResMut<Scenario>, mut halted: ResMut<Halted>) {
    if halted.0 {
        return;
    }

    // One RK4 step per rendered frame
    if let Err(e) = scenario.integrator.advance() {
        log::error!("viewer stopped advancing: {}", e);
        halted.0 = true;
    }
}

fn sync_transforms_system(scenario: Res<Scenario>, mut query: Query<(&MassIndex, &mut Transform)>) {
    let Some(state) = scenario.integrator.state() else {
        return;
    };
    let x = state.positions();

    for (MassIndex(i), mut transform) in &mut query {
        transform.translation.x = to_world(mass_pixel_x(*i, x[*i]), TRACK_Y).x;
    }
}

fn draw_springs_system(scenario: Res<Scenario>, mut gizmos: Gizmos) {
    let Some(state) = scenario.integrator.state() else {
        return;
    };

    let left_wall = to_world(0.0, TRACK_Y);
    let right_wall = to_world(WIDTH, TRACK_Y);
    let p1 = to_world(mass_pixel_x(0, state.x1()), TRACK_Y);
    let p2 = to_world(mass_pixel_x(1, state.x2()), TRACK_Y);

    gizmos.line_2d(left_wall, p1, PINK);
    gizmos.line_2d(right_wall, p2, BLUE);
    gizmos.line_2d(p1, p2, Color::WHITE);
}
