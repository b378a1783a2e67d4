// Canned bench scene: a ground slab, a thin wall, a stack of falling
// spheres, and a four-wheeled car under throttle. Steps N frames through
// the real scheduler and prints per-second stats.

use anyhow::{Context, Result};
use clap::Parser;

use gritphys_core::{vec3, Mat3, PhysicsEngineConfig, Vec3};
use gritphys_dynamics::RigidBodyPulses;
use gritphys_geom::{BevelBox, CapsuleHull, Hull, MassProps};
use gritphys_materials::{
    PhysicsMaterial, SurfaceContactDb, SurfaceContactRecord,
};
use gritphys_vehicles::{
    EnginePower, RigidBodyVehicle, ShockAbsorberParams, Tire, TireParams,
};
use gritphys_world::{PhysicsEngine, StaticSceneBuilder};
use gritphys_sched::PhysicsLoop;

#[derive(Parser, Debug)]
#[command(name = "grit-bench", about = "gritphys bench scene driver")]
struct Args {
    /// Frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Substeps per frame.
    #[arg(long, default_value_t = 8)]
    nsubsteps: u32,

    /// Spheres to drop onto the slab.
    #[arg(long, default_value_t = 16)]
    spheres: u32,

    /// Print contact events while running.
    #[arg(long, default_value_t = false)]
    events: bool,
}

fn surface_db() -> Result<SurfaceContactDb> {
    let records = vec![
        SurfaceContactRecord {
            surface0: "metal".into(),
            surface1: "tarmac".into(),
            stiction_coefficient: 1.1,
            friction_coefficient: 0.9,
            min_smoke_velocity: 12.0,
            smoke_particle: Some("tire_smoke".into()),
        },
        SurfaceContactRecord {
            surface0: "metal".into(),
            surface1: "stone".into(),
            stiction_coefficient: 0.8,
            friction_coefficient: 0.6,
            min_smoke_velocity: 0.0,
            smoke_particle: None,
        },
    ];
    SurfaceContactDb::from_records(&records).context("building surface db")
}

fn build_car(engine: &mut PhysicsEngine) -> Result<()> {
    let chassis_half = vec3(1.7, 0.25, 0.9);
    let pulses = RigidBodyPulses::new(
        vec3(0.0, 0.9, -8.0),
        Mat3::IDENTITY,
        MassProps::cuboid(chassis_half, 400.0),
    );
    let car = RigidBodyVehicle::new(
        pulses,
        Hull::BevelBox(BevelBox::new(chassis_half, 0.1)),
        PhysicsMaterial::ATTR_COLLIDE
            | PhysicsMaterial::OBJ_CHASSIS
            | PhysicsMaterial::SURFACE_BASE_METAL,
    );
    let power = EnginePower::new(
        vec![(0.0, 15_000.0), (250.0, 70_000.0), (500.0, 95_000.0), (700.0, 60_000.0)],
        vec![9.0, 6.0, 4.0, 2.8],
    )
    .context("engine power table")?;
    let mut tires = Vec::new();
    // front axle (+x) steers, rear axle drives
    for (x, z, steered) in [
        (1.3, -0.8, true),
        (1.3, 0.8, true),
        (-1.3, -0.8, false),
        (-1.3, 0.8, false),
    ] {
        tires.push(Tire::new(TireParams {
            local_position: vec3(x, -0.25, z),
            axis: -Vec3::Y,
            radius: 0.32,
            shock: ShockAbsorberParams::default(),
            driven: !steered,
            steered,
        }));
    }
    let mut car = car.with_tires(tires, power);
    car.controller.throttle = 0.6;
    engine.add_body(car);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = PhysicsEngineConfig {
        nsubsteps: args.nsubsteps,
        nframes: Some(args.frames),
        ..Default::default()
    };

    let mut builder = StaticSceneBuilder::new();
    builder
        .add_quad(
            [
                vec3(-60.0, 0.0, -60.0),
                vec3(-60.0, 0.0, 60.0),
                vec3(60.0, 0.0, 60.0),
                vec3(60.0, 0.0, -60.0),
            ],
            PhysicsMaterial::ATTR_COLLIDE | PhysicsMaterial::SURFACE_BASE_TARMAC,
        )
        .context("ground slab")?;
    builder
        .add_quad(
            [
                vec3(12.0, -2.0, -6.0),
                vec3(12.0, -2.0, 6.0),
                vec3(12.0, 4.0, 6.0),
                vec3(12.0, 4.0, -6.0),
            ],
            PhysicsMaterial::ATTR_COLLIDE | PhysicsMaterial::SURFACE_BASE_STONE,
        )
        .context("wall")?;
    let statics = builder.build(&config).context("freezing static scene")?;

    let mut engine = PhysicsEngine::new(config, statics, surface_db()?);
    for i in 0..args.spheres {
        let x = (i % 4) as f32 * 1.2 - 1.8;
        let z = (i / 4) as f32 * 1.2 - 1.8;
        let y = 3.0 + (i % 3) as f32 * 1.5;
        let mut ball = RigidBodyVehicle::new(
            RigidBodyPulses::new(vec3(x, y, z), Mat3::IDENTITY, MassProps::sphere(0.4, 800.0)),
            Hull::Sphere { radius: 0.4 },
            PhysicsMaterial::ATTR_COLLIDE | PhysicsMaterial::SURFACE_BASE_METAL,
        );
        ball.pulses.v = vec3(0.1 * (i as f32 - 8.0), 0.0, 0.0);
        engine.add_body(ball);
    }
    // a tipped-over bollard exercising the capsule hull
    engine.add_body(RigidBodyVehicle::new(
        RigidBodyPulses::new(vec3(-6.0, 2.0, 4.0), Mat3::IDENTITY, MassProps::capsule(0.25, 0.6, 600.0)),
        Hull::Capsule(CapsuleHull::new(0.6, 0.25)),
        PhysicsMaterial::ATTR_COLLIDE | PhysicsMaterial::SURFACE_BASE_METAL,
    ));
    build_car(&mut engine)?;

    let started = std::time::Instant::now();
    let lp = PhysicsLoop::spawn(engine);
    let mut done = lp.join();
    let wall = started.elapsed();

    let events = done.drain_events();
    println!(
        "simulated {} frames in {:.2}s wall ({} contact events)",
        done.tick(),
        wall.as_secs_f32(),
        events.len(),
    );
    if args.events {
        for e in events.iter().take(50) {
            println!(
                "tick {:5}  n=({:+.2},{:+.2},{:+.2})  jn={:.3}  slip={:.2}{}",
                e.tick,
                e.normal.x,
                e.normal.y,
                e.normal.z,
                e.normal_impulse,
                e.tangential_speed,
                if e.ridge { "  [ridge]" } else { "" },
            );
        }
    }
    for (h, iso) in done.poses() {
        println!(
            "body {h}  pos=({:+.3},{:+.3},{:+.3})",
            iso.pos.x, iso.pos.y, iso.pos.z
        );
    }
    Ok(())
}
