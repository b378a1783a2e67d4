pub mod history;
pub mod narrow;
pub mod solver;
pub mod statics;

pub use history::{CollisionGroup, CollisionHistory, ContactEvent, ContactLedger, ContactParty};
pub use narrow::{Contact, ContactKind};
pub use statics::{StaticPolygon, StaticScene, StaticSceneBuilder};

use std::collections::BTreeMap;
use std::thread::ThreadId;

use gritphys_collision::DynamicGrid;
use gritphys_core::{
    BodyHandle, Isometry, PhysicsEngineConfig, Scalar, ScheduleRecorder, StepStage, StepStats,
    Vec3,
};
use gritphys_dynamics::BodyArena;
use gritphys_geom::{sweep_sphere_aabb, Aabb};
use gritphys_materials::{can_collide, SurfaceContactDb};
use gritphys_vehicles::RigidBodyVehicle;
use tracing::{debug, warn};

use solver::WarmStartCache;

/// The collision/resolution core. One instance owns every simulated body,
/// the frozen static scene, and the per-substep pipeline:
/// integrate -> refresh volumes -> broad phase -> narrow phase -> solve.
pub struct PhysicsEngine {
    config: PhysicsEngineConfig,
    bodies: BodyArena<RigidBodyVehicle>,
    statics: StaticScene,
    grid: DynamicGrid<BodyHandle>,
    grid_order: Vec<BodyHandle>,
    surface_db: SurfaceContactDb,
    warm: WarmStartCache,
    ledger: ContactLedger,
    schedule: ScheduleRecorder,
    tick: u64,
    deleter_thread: Option<ThreadId>,
    last_group: CollisionGroup,
}

impl PhysicsEngine {
    pub fn new(
        config: PhysicsEngineConfig,
        statics: StaticScene,
        surface_db: SurfaceContactDb,
    ) -> Self {
        let cell = (2.0 * config.static_radius / config.ncells.max(1) as Scalar).max(1.0);
        let grid = DynamicGrid::new(cell, config.dilation_radius);
        Self {
            config,
            bodies: BodyArena::new(),
            statics,
            grid,
            grid_order: Vec::new(),
            surface_db,
            warm: WarmStartCache::default(),
            ledger: ContactLedger::new(4096),
            schedule: ScheduleRecorder::new(),
            tick: 0,
            deleter_thread: None,
            last_group: CollisionGroup::default(),
        }
    }

    /// Bodies that participated in the last substep's resolution.
    pub fn last_collision_group(&self) -> &CollisionGroup {
        &self.last_group
    }

    pub fn config(&self) -> &PhysicsEngineConfig { &self.config }
    pub fn tick(&self) -> u64 { self.tick }
    pub fn statics(&self) -> &StaticScene { &self.statics }
    pub fn surface_db(&self) -> &SurfaceContactDb { &self.surface_db }

    pub fn add_body(&mut self, body: RigidBodyVehicle) -> BodyHandle {
        self.bodies.insert(body)
    }

    pub fn body(&self, h: BodyHandle) -> Option<&RigidBodyVehicle> {
        self.bodies.get(h)
    }

    pub fn body_mut(&mut self, h: BodyHandle) -> Option<&mut RigidBodyVehicle> {
        self.bodies.get_mut(h)
    }

    /// Pose of a body after its last completed substep.
    pub fn abs_transformation(&self, h: BodyHandle) -> Option<Isometry> {
        self.bodies.get(h).map(|b| b.pulses.abs_transformation())
    }

    pub fn poses(&self) -> Vec<(BodyHandle, Isometry)> {
        self.bodies
            .iter()
            .map(|(h, b)| (h, b.pulses.abs_transformation()))
            .collect()
    }

    /// Restrict body removal to the calling thread. Removing from any other
    /// thread afterwards is a caller bug and aborts loudly.
    pub fn register_deleter_thread(&mut self) {
        self.deleter_thread = Some(std::thread::current().id());
    }

    /// Remove a body; its hitbox ridges and tires go with it, and every
    /// outstanding handle to it resolves to `None` from now on.
    ///
    /// # Panics
    /// If a deleter thread is registered and this is not it.
    pub fn remove_body(&mut self, h: BodyHandle) -> bool {
        if let Some(owner) = self.deleter_thread {
            assert_eq!(
                owner,
                std::thread::current().id(),
                "body removal from a non-deleter thread"
            );
        }
        self.bodies.remove(h).is_some()
    }

    /// Drain the resolved-contact event stream accumulated so far.
    pub fn drain_events(&mut self) -> Vec<ContactEvent> {
        self.ledger.drain()
    }

    pub fn events(&self) -> impl Iterator<Item = &ContactEvent> {
        self.ledger.iter()
    }

    /// Stage order of the most recent substep.
    pub fn last_schedule(&self) -> &[StepStage] {
        self.schedule.stages()
    }

    /// Advance one logical frame: the dynamic grid is rebuilt once, then
    /// every substep re-runs narrow phase and the solver on that shared
    /// broad-phase partition.
    pub fn step_frame(&mut self) -> StepStats {
        self.tick = self.tick.wrapping_add(1);
        self.rebuild_grid();
        let dt = self.config.dt_substep();
        let mut stats = StepStats::default();
        for _ in 0..self.config.nsubsteps {
            stats.accumulate(self.step_substep(dt));
        }
        stats
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        self.grid_order.clear();
        for (h, b) in self.bodies.iter() {
            let r = b.bounding_radius();
            let aabb = Aabb::from_center_half_extents(b.pulses.abs_position(), Vec3::splat(r));
            self.grid.insert(aabb, h);
            self.grid_order.push(h);
        }
    }

    fn step_substep(&mut self, dt: Scalar) -> StepStats {
        let mut stats = StepStats::default();
        self.schedule.clear();

        // ---- integrate ----
        self.schedule.push(StepStage::Integrate);
        let gravity = self.config.gravity_vec();
        let handles = self.bodies.handles();
        for &h in &handles {
            let Some(b) = self.bodies.get_mut(h) else { continue };
            b.begin_substep();
            if b.is_immovable() {
                b.pulses.advance_time(dt);
                continue;
            }
            let mass = b.pulses.mass.mass;
            b.pulses.apply_force(gravity * mass);
            let p_old = b.pulses.abs_position();
            b.pulses.advance_time(dt);

            // swept-sphere anti-tunneling: bodies outrunning half their own
            // radius in one substep are clamped to the earliest static TOI
            let r = b.hull.bounding_radius();
            let p_new = b.pulses.abs_position();
            let travel = (p_new - p_old).length();
            if travel > 0.5 * r {
                let region = Aabb::from_points(&[p_old, p_new]).expanded(r);
                let candidates = self.statics.polygons_near_aabbs(&region);
                let v = (p_new - p_old) / dt;
                let mut best: Option<(Scalar, Vec3)> = None;
                for aabb in &candidates {
                    if let Some((t, n)) = sweep_sphere_aabb(p_old, v, r, aabb, dt) {
                        if best.map_or(true, |(bt, _)| t < bt) {
                            best = Some((t, n));
                        }
                    }
                }
                if let Some((t, n)) = best {
                    let b = self.bodies.get_mut(h).expect("body vanished mid-substep");
                    b.pulses.position = p_old + (p_new - p_old) * t;
                    let vn = b.pulses.v.dot(n);
                    if vn < 0.0 {
                        b.pulses.v -= n * vn;
                    }
                    stats.swept_hits += 1;
                    debug!(body = %h, toi = t, "swept-sphere clamp");
                }
            }
        }

        // ---- refresh volumes ----
        self.schedule.push(StepStage::RefreshVolumes);
        let spheres: BTreeMap<BodyHandle, (Vec3, Scalar)> = self
            .bodies
            .iter()
            .map(|(h, b)| (h, (b.pulses.abs_position(), b.bounding_radius())))
            .collect();

        // ---- broad phase ----
        self.schedule.push(StepStage::Broadphase);
        let mut pairs: Vec<(BodyHandle, BodyHandle)> = Vec::new();
        for (ia, ib) in self.grid.overlapping_pairs() {
            let (ha, hb) = (self.grid_order[ia as usize], self.grid_order[ib as usize]);
            let (Some(a), Some(b)) = (self.bodies.get(ha), self.bodies.get(hb)) else {
                continue;
            };
            if a.is_immovable() && b.is_immovable() {
                continue;
            }
            if !can_collide(a.material, b.material) {
                continue;
            }
            if a.non_colliders.contains(&hb) || b.non_colliders.contains(&ha) {
                continue;
            }
            let (ca, ra) = spheres[&ha];
            let (cb, rb) = spheres[&hb];
            let rsum = ra + rb;
            if (ca - cb).length_squared() > rsum * rsum {
                continue;
            }
            pairs.push((ha, hb));
        }
        stats.pairs_tested = pairs.len() as u32;

        // ---- narrow phase ----
        self.schedule.push(StepStage::Narrowphase);
        let mut contacts: Vec<Contact> = Vec::new();
        for &(ha, hb) in &pairs {
            let (Some(a), Some(b)) = (self.bodies.get(ha), self.bodies.get(hb)) else {
                continue;
            };
            if let Some(c) = narrow::hull_vs_hull(ha, a, hb, b) {
                contacts.push(c);
            }
        }
        for &h in &handles {
            let Some(b) = self.bodies.get(h) else { continue };
            if b.is_immovable() {
                continue;
            }
            let (c, r) = spheres[&h];
            let region =
                Aabb::from_center_half_extents(c, Vec3::splat(r + self.config.overlap_tolerance));

            self.statics.polygons_near(&region, |poly| {
                stats.pairs_tested += 1;
                if !can_collide(b.material, poly.material()) {
                    return;
                }
                if let Some(ct) =
                    narrow::hull_vs_polygon(h, b, poly, self.config.overlap_tolerance)
                {
                    contacts.push(ct);
                }
                for (ridge, _owner) in b.hitbox_ridges.ridges() {
                    if let Some(ct) = narrow::vehicle_ridge_vs_polygon(h, b, ridge, poly) {
                        contacts.push(ct);
                    }
                }
            });

            // tire suspension rays against the level
            for ti in 0..b.tires.len() {
                let seg = b.tire_line_world(&b.tires[ti]);
                let line_region = seg.bounding_sphere.aabb().expanded(self.config.overlap_tolerance);
                let mut deepest: Option<Contact> = None;
                self.statics.polygons_near(&line_region, |poly| {
                    if !can_collide(b.material, poly.material()) {
                        return;
                    }
                    if let Some(ct) = narrow::tire_line_vs_polygon(h, b, ti, poly) {
                        if deepest.as_ref().map_or(true, |d| ct.depth > d.depth) {
                            deepest = Some(ct);
                        }
                    }
                });
                if let Some(ct) = deepest {
                    contacts.push(ct);
                }
            }

            // sharp static edges against the hull
            self.statics.ridges_near(&region, |ridge| {
                match narrow::ridge_vs_hull(ridge, h, b, self.config.overlap_tolerance) {
                    Ok(Some(ct)) => contacts.push(ct),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "ridge candidate skipped"),
                }
            });
        }
        stats.ridge_contacts = contacts
            .iter()
            .filter(|c| c.kind == ContactKind::Ridge)
            .count() as u32;

        let contacts = cull_contacts(contacts);
        stats.contacts = contacts.len() as u32;

        // ---- solve ----
        self.schedule.push(StepStage::Solve);
        let mut history = CollisionHistory::new(&self.surface_db);
        solver::solve_contacts(
            &mut self.bodies,
            &contacts,
            &mut history,
            &self.config,
            &mut self.warm,
            &mut self.ledger,
            self.tick,
            dt,
        );
        self.last_group = history.group;
        self.schedule.push(StepStage::Tires);
        stats
    }
}

/// Deterministic cull: per unordered pair, every tire line plus at most
/// four further contacts, deepest first, stable tie-break on contact kind.
fn cull_contacts(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut buckets: BTreeMap<((u8, u32, u32), (u8, u32, u32)), Vec<Contact>> = BTreeMap::new();
    let key = |p: ContactParty| match p {
        ContactParty::Body(h) => (0u8, h.index, h.generation),
        ContactParty::Static => (1u8, 0, 0),
    };
    for c in contacts {
        let (ka, kb) = (key(c.a), key(c.b));
        let k = if ka <= kb { (ka, kb) } else { (kb, ka) };
        buckets.entry(k).or_default().push(c);
    }
    let kind_rank = |k: ContactKind| match k {
        ContactKind::TireLine { tire_index } => tire_index as u8,
        ContactKind::Hull => 64,
        ContactKind::Ridge => 128,
    };
    let mut out = Vec::new();
    for (_k, mut v) in buckets {
        v.sort_by(|c1, c2| {
            kind_rank(c1.kind)
                .cmp(&kind_rank(c2.kind))
                .then_with(|| c2.depth.total_cmp(&c1.depth))
        });
        // tire lines are load-bearing and sort first; cull only the rest
        let tire_lines = v
            .iter()
            .filter(|c| matches!(c.kind, ContactKind::TireLine { .. }))
            .count();
        v.truncate(4 + tire_lines);
        out.extend(v);
    }
    out
}
