use gritphys_core::{vec3, Mat3, PhysicsEngineConfig, Vec3};
use gritphys_dynamics::RigidBodyPulses;
use gritphys_geom::{BevelBox, Hull, MassProps};
use gritphys_materials::{
    PhysicsMaterial, SurfaceContactDb, SurfaceContactInfo,
};
use gritphys_vehicles::{
    EnginePower, RigidBodyVehicle, ShockAbsorberParams, Tire, TireParams,
};
use gritphys_world::{PhysicsEngine, StaticSceneBuilder};

fn collide_mat(surface: PhysicsMaterial) -> PhysicsMaterial {
    PhysicsMaterial::ATTR_COLLIDE | surface
}

fn sphere_body(center: Vec3, r: f32) -> RigidBodyVehicle {
    RigidBodyVehicle::new(
        RigidBodyPulses::new(center, Mat3::IDENTITY, MassProps::sphere(r, 1000.0)),
        Hull::Sphere { radius: r },
        collide_mat(PhysicsMaterial::SURFACE_BASE_METAL),
    )
}

fn immovable_sphere(center: Vec3, r: f32) -> RigidBodyVehicle {
    RigidBodyVehicle::new(
        RigidBodyPulses::new(center, Mat3::IDENTITY, MassProps::infinite()),
        Hull::Sphere { radius: r },
        collide_mat(PhysicsMaterial::SURFACE_BASE_STONE),
    )
}

fn ground_scene(config: &PhysicsEngineConfig) -> gritphys_world::StaticScene {
    let mut b = StaticSceneBuilder::new();
    b.add_quad(
        [
            vec3(-50.0, 0.0, -50.0),
            vec3(-50.0, 0.0, 50.0),
            vec3(50.0, 0.0, 50.0),
            vec3(50.0, 0.0, -50.0),
        ],
        collide_mat(PhysicsMaterial::SURFACE_BASE_TARMAC),
    )
    .unwrap();
    b.build(config).unwrap()
}

fn zero_g_config() -> PhysicsEngineConfig {
    PhysicsEngineConfig {
        gravity: [0.0, 0.0, 0.0],
        dt: 1.0,
        nsubsteps: 1,
        ..Default::default()
    }
}

#[test]
fn approaching_spheres_first_touch_at_center_distance_two() {
    let config = zero_g_config();
    let statics = ground_scene(&config); // far below, never involved
    let mut engine = PhysicsEngine::new(config.clone(), statics, SurfaceContactDb::new());

    let mut a = sphere_body(vec3(-1.5, 10.0, 0.0), 1.0);
    a.pulses.v = vec3(0.25, 0.0, 0.0);
    let mut b = sphere_body(vec3(1.5, 10.0, 0.0), 1.0);
    b.pulses.v = vec3(-0.25, 0.0, 0.0);
    let ha = engine.add_body(a);
    let hb = engine.add_body(b);

    // substep 1: centers at +-1.25, distance 2.5 -> no contact
    engine.step_frame();
    assert!(engine.drain_events().is_empty());

    // substep 2: centers at +-1.0, distance exactly 2.0 -> first contact
    engine.step_frame();
    let events = engine.drain_events();
    assert_eq!(events.len(), 1);
    let parties = [events[0].a.body().unwrap(), events[0].b.body().unwrap()];
    assert!(parties.contains(&ha) && parties.contains(&hb));
}

#[test]
fn immovable_pair_produces_no_impulse_and_no_contact() {
    let config = zero_g_config();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());

    let a = engine.add_body(immovable_sphere(vec3(0.0, 10.0, 0.0), 1.0));
    let b = engine.add_body(immovable_sphere(vec3(1.0, 10.0, 0.0), 1.0));
    for _ in 0..5 {
        engine.step_frame();
    }
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.body(a).unwrap().pulses.abs_position(), vec3(0.0, 10.0, 0.0));
    assert_eq!(engine.body(b).unwrap().pulses.abs_position(), vec3(1.0, 10.0, 0.0));
}

#[test]
fn dropped_sphere_comes_to_rest_on_the_ground() {
    let config = PhysicsEngineConfig::default();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    let h = engine.add_body(sphere_body(vec3(0.0, 3.0, 0.0), 0.5));

    for _ in 0..240 {
        engine.step_frame();
    }
    let b = engine.body(h).unwrap();
    let y = b.pulses.abs_position().y;
    assert!((y - 0.5).abs() < 0.05, "resting height {y}");
    assert!(b.pulses.v.length() < 0.2);
    assert!(engine.events().any(|e| e.normal_impulse > 0.0));
}

#[test]
fn bounding_sphere_separation_means_no_narrow_phase_contact() {
    let config = zero_g_config();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    engine.add_body(sphere_body(vec3(0.0, 10.0, 0.0), 1.0));
    engine.add_body(sphere_body(vec3(5.0, 10.0, 0.0), 1.0));
    let stats = engine.step_frame();
    assert_eq!(stats.contacts, 0);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn fast_body_is_clamped_by_swept_sphere_heuristic() {
    // a thin wall the mover would tunnel through in one substep
    let config = PhysicsEngineConfig {
        gravity: [0.0, 0.0, 0.0],
        dt: 1.0 / 60.0,
        nsubsteps: 1,
        ..Default::default()
    };
    let mut b = StaticSceneBuilder::new();
    b.add_quad(
        [
            vec3(5.0, -5.0, -5.0),
            vec3(5.0, -5.0, 5.0),
            vec3(5.0, 5.0, 5.0),
            vec3(5.0, 5.0, -5.0),
        ],
        collide_mat(PhysicsMaterial::SURFACE_BASE_STONE),
    )
    .unwrap();
    let statics = b.build(&config).unwrap();
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());

    let mut bullet = sphere_body(vec3(0.0, 0.0, 0.0), 0.2);
    bullet.pulses.v = vec3(200.0, 0.0, 0.0);
    let h = engine.add_body(bullet);

    let mut swept = 0;
    for _ in 0..10 {
        swept += engine.step_frame().swept_hits;
    }
    let x = engine.body(h).unwrap().pulses.abs_position().x;
    assert!(swept > 0, "sweep never triggered");
    assert!(x < 5.0, "tunneled through the wall to x = {x}");
    assert!(engine.body(h).unwrap().pulses.v.x.abs() < 1.0);
}

#[test]
fn substep_stage_order_is_stable() {
    use gritphys_core::StepStage;
    let config = zero_g_config();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    engine.add_body(sphere_body(vec3(0.0, 1.0, 0.0), 0.5));
    engine.step_frame();
    assert_eq!(
        engine.last_schedule(),
        [
            StepStage::Integrate,
            StepStage::RefreshVolumes,
            StepStage::Broadphase,
            StepStage::Narrowphase,
            StepStage::Solve,
            StepStage::Tires,
        ]
    );
}

#[test]
fn registered_non_collider_pair_is_skipped() {
    let config = zero_g_config();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    let a = engine.add_body(sphere_body(vec3(0.0, 10.0, 0.0), 1.0));
    let b = engine.add_body(sphere_body(vec3(1.0, 10.0, 0.0), 1.0));
    engine.body_mut(a).unwrap().non_colliders.insert(b);
    for _ in 0..3 {
        engine.step_frame();
    }
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.body(a).unwrap().pulses.v, Vec3::ZERO);
    assert_eq!(engine.body(b).unwrap().pulses.v, Vec3::ZERO);
}

#[test]
fn sliding_sphere_slows_and_spins_up() {
    let config = PhysicsEngineConfig::default();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    let mut ball = sphere_body(vec3(0.0, 0.5, 0.0), 0.5);
    ball.pulses.v = vec3(5.0, 0.0, 0.0);
    let h = engine.add_body(ball);
    for _ in 0..60 {
        engine.step_frame();
    }
    let b = engine.body(h).unwrap();
    // kinetic friction sheds linear speed into spin until the contact rolls
    assert!(b.pulses.v.x < 4.5, "never decelerated: v = {:?}", b.pulses.v);
    assert!(b.pulses.v.x > 0.5, "friction overshot: v = {:?}", b.pulses.v);
    assert!(b.pulses.w.z < -0.5, "never spun up: w = {:?}", b.pulses.w);
}

#[test]
fn stale_handle_resolves_to_none_after_removal() {
    let config = zero_g_config();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    let h = engine.add_body(sphere_body(vec3(0.0, 1.0, 0.0), 0.5));
    assert!(engine.body(h).is_some());
    assert!(engine.remove_body(h));
    assert!(engine.body(h).is_none());
    assert!(!engine.remove_body(h));
    engine.step_frame(); // stepping with a freed slot must be harmless
}

#[test]
fn removal_from_wrong_thread_aborts() {
    let config = zero_g_config();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    let h = engine.add_body(sphere_body(vec3(0.0, 1.0, 0.0), 0.5));
    engine.register_deleter_thread();

    let result = std::thread::scope(|s| {
        s.spawn(|| {
            // not the registered deleter thread
            let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                engine.remove_body(h);
            }));
            caught.is_err()
        })
        .join()
        .unwrap()
    });
    assert!(result, "wrong-thread removal did not abort");
}

#[test]
fn car_tires_carry_load_and_compress_shocks() {
    let config = PhysicsEngineConfig::default();
    let statics = ground_scene(&config);
    let mut db = SurfaceContactDb::new();
    db.insert(
        PhysicsMaterial::SURFACE_BASE_METAL,
        PhysicsMaterial::SURFACE_BASE_TARMAC,
        SurfaceContactInfo {
            stiction_coefficient: 1.1,
            friction_coefficient: 0.9,
            min_smoke_velocity: 15.0,
            smoke_particle: Some("tire_smoke".into()),
        },
    );
    let mut engine = PhysicsEngine::new(config, statics, db);

    let chassis_half = vec3(1.7, 0.25, 0.9);
    let pulses = RigidBodyPulses::new(
        vec3(0.0, 0.9, 0.0),
        Mat3::IDENTITY,
        MassProps::cuboid(chassis_half, 400.0),
    );
    let hull = Hull::BevelBox(BevelBox::new(chassis_half, 0.1));
    let mut car = RigidBodyVehicle::new(
        pulses,
        hull,
        collide_mat(PhysicsMaterial::OBJ_CHASSIS | PhysicsMaterial::SURFACE_BASE_METAL),
    );
    let engine_power = EnginePower::new(
        vec![(0.0, 20_000.0), (300.0, 80_000.0), (600.0, 50_000.0)],
        vec![8.0, 5.0, 3.0],
    )
    .unwrap();
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
    car = car.with_tires(tires, engine_power);
    car.controller.throttle = 0.5;
    let h = engine.add_body(car);

    for _ in 0..120 {
        engine.step_frame();
    }
    let car = engine.body(h).unwrap();
    let grounded: Vec<&Tire> = car
        .tires
        .iter()
        .filter(|t| t.normal_impulse.is_some())
        .collect();
    assert!(!grounded.is_empty(), "no tire touched down");
    for t in &grounded {
        assert!(t.shock.position > 0.0, "shock never compressed");
    }
    // driven rear wheels under throttle move the car forward (+x)
    assert!(car.pulses.v.x > 0.1, "car never accelerated: v = {:?}", car.pulses.v);
}

#[test]
fn contact_group_lists_participants() {
    let config = PhysicsEngineConfig::default();
    let statics = ground_scene(&config);
    let mut engine = PhysicsEngine::new(config, statics, SurfaceContactDb::new());
    let h = engine.add_body(sphere_body(vec3(0.0, 0.4, 0.0), 0.5));
    engine.step_frame();
    assert!(engine.last_collision_group().members.contains(&h));
}
