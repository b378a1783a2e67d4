pub mod sync;

pub use sync::{RealtimeSync, SyncDecision};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use gritphys_world::PhysicsEngine;
use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

type Deferred = Box<dyn FnOnce(&mut PhysicsEngine) + Send + 'static>;

struct Shared {
    engine: Mutex<PhysicsEngine>,
    deferred: Mutex<Vec<Deferred>>,
    paused: Mutex<bool>,
    pause_cv: Condvar,
    stop: AtomicBool,
}

/// Handle to the physics thread. Readers lock the engine between ticks, so
/// every pose they observe is the result of a fully completed substep.
pub struct PhysicsLoop {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl PhysicsLoop {
    /// Start the dedicated physics thread. The engine's own config supplies
    /// the frame interval, residual-time bound, and the optional bounded
    /// frame count.
    pub fn spawn(engine: PhysicsEngine) -> Self {
        let shared = Arc::new(Shared {
            engine: Mutex::new(engine),
            deferred: Mutex::new(Vec::new()),
            paused: Mutex::new(false),
            pause_cv: Condvar::new(),
            stop: AtomicBool::new(false),
        });
        let thread_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("gritphys".to_owned())
            .spawn(move || run_loop(&thread_shared))
            .expect("spawning the physics thread");
        Self { shared, thread: Some(thread) }
    }

    /// Lock the engine for inspection or mutation between ticks.
    pub fn lock_engine(&self) -> parking_lot::MutexGuard<'_, PhysicsEngine> {
        self.shared.engine.lock()
    }

    /// Queue a closure for the physics thread. Runs at the next loop
    /// iteration, even while paused, so cross-thread requests are never
    /// starved by a pause.
    pub fn defer(&self, f: impl FnOnce(&mut PhysicsEngine) + Send + 'static) {
        self.shared.deferred.lock().push(Box::new(f));
        self.shared.pause_cv.notify_all();
    }

    pub fn pause(&self) {
        *self.shared.paused.lock() = true;
    }

    pub fn resume(&self) {
        *self.shared.paused.lock() = false;
        self.shared.pause_cv.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.shared.paused.lock()
    }

    /// Request a cooperative stop and join. The loop finishes its current
    /// tick; nothing is terminated mid-substep.
    pub fn stop(mut self) -> PhysicsEngine {
        self.request_stop();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        Self::recover_engine(self)
    }

    /// Wait for a bounded (`nframes`) run to finish on its own.
    pub fn join(mut self) -> PhysicsEngine {
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        Self::recover_engine(self)
    }

    fn recover_engine(lp: PhysicsLoop) -> PhysicsEngine {
        debug_assert!(lp.thread.is_none());
        let shared = Arc::clone(&lp.shared);
        drop(lp);
        match Arc::try_unwrap(shared) {
            Ok(s) => {
                let mut engine = s.engine.into_inner();
                // the loop thread is gone; deletion moves to the recovering
                // thread
                engine.register_deleter_thread();
                engine
            }
            Err(_) => panic!("engine still referenced after join"),
        }
    }

    fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.pause_cv.notify_all();
    }
}

impl Drop for PhysicsLoop {
    fn drop(&mut self) {
        if let Some(t) = self.thread.take() {
            self.shared.stop.store(true, Ordering::Release);
            self.shared.pause_cv.notify_all();
            let _ = t.join();
        }
    }
}

fn run_loop(shared: &Shared) {
    let (frame, max_residual, nframes) = {
        let mut e = shared.engine.lock();
        // this thread owns body removal from now on; other threads route
        // removals through `defer`
        e.register_deleter_thread();
        (
            Duration::from_secs_f32(e.config().dt),
            Duration::from_secs_f32(e.config().max_residual_time),
            e.config().nframes,
        )
    };
    let mut sync = RealtimeSync::new(frame, max_residual, Instant::now());
    let mut frames_done: u64 = 0;
    info!(frame_ms = frame.as_millis() as u64, "physics loop started");

    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        // deferred functions run first so a pause cannot starve them
        let pending: Vec<Deferred> = std::mem::take(&mut *shared.deferred.lock());
        if !pending.is_empty() {
            let mut engine = shared.engine.lock();
            for f in pending {
                f(&mut engine);
            }
        }

        {
            let mut paused = shared.paused.lock();
            if *paused {
                // woken by resume, stop, or new deferred work
                let _ = shared
                    .pause_cv
                    .wait_for(&mut paused, Duration::from_millis(10));
                sync.reset(Instant::now());
                continue;
            }
        }

        if let Some(limit) = nframes {
            if frames_done >= limit {
                info!(frames = frames_done, "bounded run complete");
                break;
            }
        }

        {
            let mut engine = shared.engine.lock();
            engine.step_frame();
        }
        frames_done += 1;

        match sync.advance(Instant::now()) {
            SyncDecision::WaitUntil(deadline) => {
                // busy-wait to the frame boundary; coarse yields first
                while Instant::now() < deadline {
                    if shared.stop.load(Ordering::Acquire) {
                        break;
                    }
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining > Duration::from_millis(2) {
                        std::thread::yield_now();
                    } else {
                        std::hint::spin_loop();
                    }
                }
            }
            SyncDecision::DropBacklog { behind } => {
                warn!(behind_ms = behind.as_millis() as u64, "dropping simulation backlog");
            }
        }
    }
    info!(frames = frames_done, "physics loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritphys_core::{vec3, Mat3, PhysicsEngineConfig};
    use gritphys_dynamics::RigidBodyPulses;
    use gritphys_geom::{Hull, MassProps};
    use gritphys_materials::{PhysicsMaterial, SurfaceContactDb};
    use gritphys_vehicles::RigidBodyVehicle;
    use gritphys_world::{StaticScene, StaticSceneBuilder};
    use std::sync::atomic::AtomicUsize;

    fn scene(config: &PhysicsEngineConfig) -> StaticScene {
        let mut b = StaticSceneBuilder::new();
        b.add_quad(
            [
                vec3(-20.0, 0.0, -20.0),
                vec3(-20.0, 0.0, 20.0),
                vec3(20.0, 0.0, 20.0),
                vec3(20.0, 0.0, -20.0),
            ],
            PhysicsMaterial::ATTR_COLLIDE | PhysicsMaterial::SURFACE_BASE_TARMAC,
        )
        .unwrap();
        b.build(config).unwrap()
    }

    fn engine_with(nframes: Option<u64>) -> PhysicsEngine {
        let config = PhysicsEngineConfig {
            dt: 1.0 / 240.0,
            nsubsteps: 2,
            nframes,
            ..Default::default()
        };
        let statics = scene(&config);
        PhysicsEngine::new(config, statics, SurfaceContactDb::new())
    }

    fn ball(y: f32) -> RigidBodyVehicle {
        RigidBodyVehicle::new(
            RigidBodyPulses::new(vec3(0.0, y, 0.0), Mat3::IDENTITY, MassProps::sphere(0.5, 1000.0)),
            Hull::Sphere { radius: 0.5 },
            PhysicsMaterial::ATTR_COLLIDE | PhysicsMaterial::SURFACE_BASE_METAL,
        )
    }

    #[test] fn bounded_run_terminates_with_exact_frame_count() {
        let mut engine = engine_with(Some(24));
        engine.add_body(ball(5.0));
        let done = PhysicsLoop::spawn(engine).join();
        assert_eq!(done.tick(), 24);
    }

    #[test] fn stop_joins_cooperatively() {
        let engine = engine_with(None);
        let lp = PhysicsLoop::spawn(engine);
        std::thread::sleep(Duration::from_millis(30));
        let done = lp.stop();
        assert!(done.tick() > 0, "loop never ticked");
    }

    #[test] fn pause_halts_ticking_but_drains_deferred() {
        let engine = engine_with(None);
        let lp = PhysicsLoop::spawn(engine);
        std::thread::sleep(Duration::from_millis(20));
        lp.pause();
        std::thread::sleep(Duration::from_millis(20));
        let tick_at_pause = lp.lock_engine().tick();

        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        lp.defer(move |e| {
            e.add_body(RigidBodyVehicle::new(
                RigidBodyPulses::new(vec3(3.0, 4.0, 0.0), Mat3::IDENTITY, MassProps::sphere(0.5, 500.0)),
                Hull::Sphere { radius: 0.5 },
                PhysicsMaterial::ATTR_COLLIDE,
            ));
            ran2.fetch_add(1, Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(ran.load(Ordering::SeqCst), 1, "deferred work starved by pause");
        assert_eq!(lp.lock_engine().tick(), tick_at_pause, "ticked while paused");

        lp.resume();
        std::thread::sleep(Duration::from_millis(30));
        assert!(lp.lock_engine().tick() > tick_at_pause, "never resumed");
        drop(lp.stop());
    }

    #[test] fn observed_poses_are_substep_complete() {
        let engine = {
            let mut e = engine_with(None);
            e.add_body(ball(10.0));
            e
        };
        let lp = PhysicsLoop::spawn(engine);
        // any locked read sees a consistent, fully integrated pose
        for _ in 0..20 {
            let e = lp.lock_engine();
            for (_h, iso) in e.poses() {
                assert!(iso.pos.y.is_finite());
            }
            drop(e);
            std::thread::sleep(Duration::from_millis(2));
        }
        drop(lp.stop());
    }
}
