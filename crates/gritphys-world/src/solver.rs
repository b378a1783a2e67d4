use std::collections::BTreeMap;

use glam::Quat;
use gritphys_core::{BodyHandle, PhysicsEngineConfig, Scalar, Vec3};
use gritphys_dynamics::BodyArena;
use gritphys_materials::SurfaceContactInfo;
use gritphys_vehicles::{magic_formula, NormalImpulse, RigidBodyVehicle};
use tracing::trace;

use crate::history::{CollisionHistory, ContactEvent, ContactLedger, ContactParty};
use crate::narrow::{Contact, ContactKind};

const SOLVER_ITERATIONS: u32 = 8;
const PENETRATION_SLOP: Scalar = 0.005;
const BAUMGARTE_BETA: Scalar = 0.2;

/// Warm-start cache key: unordered pair of parties plus contact kind, so a
/// tire line and a hull contact between the same pair warm independently.
type WarmKey = ((u8, u32, u32), (u8, u32, u32), u8);

fn party_key(p: ContactParty) -> (u8, u32, u32) {
    match p {
        ContactParty::Body(h) => (0, h.index, h.generation),
        ContactParty::Static => (1, 0, 0),
    }
}

fn warm_key(c: &Contact) -> WarmKey {
    let (ka, kb) = (party_key(c.a), party_key(c.b));
    let (lo, hi) = if ka <= kb { (ka, kb) } else { (kb, ka) };
    let kind = match c.kind {
        ContactKind::Hull => 0,
        ContactKind::TireLine { tire_index } => 1 + tire_index as u8,
        ContactKind::Ridge => 128,
    };
    (lo, hi, kind)
}

/// Accumulated normal impulses carried across substeps.
#[derive(Default)]
pub struct WarmStartCache {
    jn: BTreeMap<WarmKey, Scalar>,
}

/// Per-contact accumulator state for one solve pass. Tangential impulses
/// accumulate in the contact's (longitudinal, lateral) frame so the cone
/// clamp bounds the substep total, not each iteration.
struct Accum {
    jn: Scalar,
    jt_long: Scalar,
    jt_lat: Scalar,
    applied_warm: bool,
}

pub struct SolveStats {
    pub resolved: u32,
}

struct Ctx<'a> {
    bodies: &'a mut BodyArena<RigidBodyVehicle>,
}

impl Ctx<'_> {
    fn inv_mass(&self, p: ContactParty) -> Scalar {
        p.body()
            .and_then(|h| self.bodies.get(h))
            .map(|b| b.pulses.mass.inv_mass)
            .unwrap_or(0.0)
    }

    fn velocity_at(&self, p: ContactParty, point: Vec3) -> Vec3 {
        p.body()
            .and_then(|h| self.bodies.get(h))
            .map(|b| b.pulses.velocity_at(point))
            .unwrap_or(Vec3::ZERO)
    }

    /// Angular contribution to the effective mass along `n` at `point`.
    fn angular_term(&self, p: ContactParty, n: Vec3, point: Vec3) -> Scalar {
        let Some(b) = p.body().and_then(|h| self.bodies.get(h)) else {
            return 0.0;
        };
        if b.pulses.is_immovable() {
            return 0.0;
        }
        let r = point - b.pulses.abs_position();
        let rn = r.cross(n);
        n.dot((b.pulses.inv_inertia_world() * rn).cross(r))
    }

    fn effective_mass(&self, c: &Contact, n: Vec3) -> Scalar {
        self.inv_mass(c.a)
            + self.inv_mass(c.b)
            + self.angular_term(c.a, n, c.point)
            + self.angular_term(c.b, n, c.point)
    }

    fn apply_impulse_at(&mut self, p: ContactParty, j: Vec3, point: Vec3) {
        if let Some(b) = p.body().and_then(|h| self.bodies.get_mut(h)) {
            b.pulses.apply_impulse_at(j, point);
        }
    }

    fn apply_position_delta(&mut self, p: ContactParty, dp: Vec3) {
        if let Some(b) = p.body().and_then(|h| self.bodies.get_mut(h)) {
            b.pulses.apply_position_delta(dp);
        }
    }
}

fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let a = n.abs();
    let base = if a.x <= a.y && a.x <= a.z {
        Vec3::X
    } else if a.y <= a.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let t1 = base.cross(n).normalize();
    let t2 = n.cross(t1);
    (t1, t2)
}

/// Tangent frame for a tire contact: longitudinal along the steered wheel
/// forward projected into the contact plane, lateral completing the frame.
fn tire_tangent_frame(body: &RigidBodyVehicle, steered: bool, n: Vec3) -> (Vec3, Vec3) {
    let xf = body.pulses.abs_transformation();
    let steer = if steered { body.controller.steer } else { 0.0 };
    let forward_local = Quat::from_rotation_y(steer) * Vec3::X;
    let forward_world = xf.transform_vector(forward_local);
    let t_long = (forward_world - n * forward_world.dot(n)).try_normalize();
    match t_long {
        Some(t_long) => (t_long, n.cross(t_long)),
        None => orthonormal_basis(n),
    }
}

/// Resolve the substep's contacts with iterated accumulated impulses:
/// warm-started normal impulses with Baumgarte positional bias, then
/// tangential impulses picked between the stiction and sliding regimes.
#[allow(clippy::too_many_arguments)]
pub fn solve_contacts(
    bodies: &mut BodyArena<RigidBodyVehicle>,
    contacts: &[Contact],
    history: &mut CollisionHistory<'_>,
    config: &PhysicsEngineConfig,
    warm: &mut WarmStartCache,
    ledger: &mut ContactLedger,
    tick: u64,
    dt: Scalar,
) -> SolveStats {
    let mut ctx = Ctx { bodies };
    let mut accum: Vec<Accum> = contacts
        .iter()
        .map(|c| Accum {
            jn: warm.jn.get(&warm_key(c)).copied().unwrap_or(0.0),
            jt_long: 0.0,
            jt_lat: 0.0,
            applied_warm: false,
        })
        .collect();
    let mut resolved = 0u32;

    for it in 0..SOLVER_ITERATIONS {
        for (idx, c) in contacts.iter().enumerate() {
            let k = ctx.effective_mass(c, c.normal);
            if k <= 0.0 {
                // both parties immovable; nothing to resolve
                continue;
            }
            if it == 0 {
                if let Some(h) = c.a.body() {
                    history.group.note(h);
                }
                if let Some(h) = c.b.body() {
                    history.group.note(h);
                }
                let warm_jn = accum[idx].jn;
                if warm_jn > 0.0 && !accum[idx].applied_warm {
                    accum[idx].applied_warm = true;
                    let j = c.normal * warm_jn;
                    ctx.apply_impulse_at(c.a, j, c.point);
                    ctx.apply_impulse_at(c.b, -j, c.point);
                }
            }

            // ---- normal impulse ----
            let v_rel = ctx.velocity_at(c.a, c.point) - ctx.velocity_at(c.b, c.point);
            let vn = v_rel.dot(c.normal).max(config.velocity_lambda_min);
            let bias = (c.depth.min(config.max_penetration) - PENETRATION_SLOP).max(0.0)
                * (BAUMGARTE_BETA / dt);
            let target = bias;
            let jn_delta = (target - vn) / k;
            let jn_old = accum[idx].jn;
            accum[idx].jn = (jn_old + jn_delta).max(0.0);
            let jn_applied = accum[idx].jn - jn_old;
            if jn_applied != 0.0 {
                let j = c.normal * jn_applied;
                ctx.apply_impulse_at(c.a, j, c.point);
                ctx.apply_impulse_at(c.b, -j, c.point);
            }

            // ---- friction ----
            let info = history.surface_info(c.materials.0, c.materials.1);
            let (mu_s, mu_k) = friction_coefficients(config, info);
            let jn_total = accum[idx].jn;
            if jn_total <= 0.0 {
                continue;
            }
            // Tangent frame plus, for tires, the wheel surface speed: tire
            // friction acts on the slip velocity (contact velocity minus
            // rolling), so a rolling wheel feels no longitudinal drag.
            let (t_long, t_lat, wheel_surface_speed, hand_braking) = match c.kind {
                ContactKind::TireLine { tire_index } => {
                    let Some(body) = c.a.body().and_then(|h| ctx.bodies.get(h)) else {
                        continue;
                    };
                    let t = &body.tires[tire_index];
                    let (tl, tlat) = tire_tangent_frame(body, t.params.steered, c.normal);
                    (
                        tl,
                        tlat,
                        t.angular_velocity * t.params.radius,
                        body.controller.hand_brake,
                    )
                }
                _ => {
                    let (t1, t2) = orthonormal_basis(c.normal);
                    (t1, t2, 0.0, false)
                }
            };

            let v_rel = ctx.velocity_at(c.a, c.point) - ctx.velocity_at(c.b, c.point);
            let vt_long = v_rel.dot(t_long) - wheel_surface_speed;
            let vt_lat = v_rel.dot(t_lat);
            let vt_mag = (vt_long * vt_long + vt_lat * vt_lat).sqrt();

            let k_long = ctx.effective_mass(c, t_long);
            let k_lat = ctx.effective_mass(c, t_lat);
            if k_long <= 0.0 || k_lat <= 0.0 {
                continue;
            }
            // candidate total: the accumulated impulse plus what would
            // cancel the remaining slip this iteration
            let cand_long = accum[idx].jt_long - vt_long / k_long;
            let cand_lat = accum[idx].jt_lat - vt_lat / k_lat;
            let cand_mag = (cand_long * cand_long + cand_lat * cand_lat).sqrt();

            let hand_brake_locked = hand_braking && vt_mag > config.hand_brake_velocity;

            let stick_limit = mu_s * jn_total;
            let stick = !hand_brake_locked && (config.no_slip || cand_mag <= stick_limit);
            let (new_long, new_lat) = if stick {
                // stiction: hold the contact still, capped by the static cone
                if cand_mag <= stick_limit || cand_mag <= 1.0e-12 {
                    (cand_long, cand_lat)
                } else {
                    let s = stick_limit / cand_mag;
                    (cand_long * s, cand_lat * s)
                }
            } else {
                // sliding: the substep total tracks the Pacejka-shaped
                // kinetic value, independent longitudinal/lateral steepness
                let denom = vt_mag.max(1.0e-6);
                let slip_long = vt_long / denom;
                let slip_lat = vt_lat / denom;
                (
                    -magic_formula(
                        slip_long,
                        mu_k * jn_total,
                        config.longitudinal_friction_steepness,
                    ),
                    -magic_formula(slip_lat, mu_k * jn_total, config.lateral_friction_steepness),
                )
            };
            let jt =
                t_long * (new_long - accum[idx].jt_long) + t_lat * (new_lat - accum[idx].jt_lat);
            accum[idx].jt_long = new_long;
            accum[idx].jt_lat = new_lat;
            ctx.apply_impulse_at(c.a, jt, c.point);
            ctx.apply_impulse_at(c.b, -jt, c.point);

            // ---- positional correction (split impulse) ----
            if it == SOLVER_ITERATIONS - 1 {
                let corr =
                    (c.depth.min(config.max_penetration) - PENETRATION_SLOP).max(0.0) * 0.5;
                if corr > 0.0 {
                    let inv_a = ctx.inv_mass(c.a);
                    let inv_b = ctx.inv_mass(c.b);
                    let denom = inv_a + inv_b;
                    if denom > 0.0 {
                        let dp = c.normal * (corr / denom);
                        ctx.apply_position_delta(c.a, dp * inv_a);
                        ctx.apply_position_delta(c.b, -dp * inv_b);
                    }
                }
            }
        }
    }

    // ---- tire coupling + events + warm cache ----
    let mut new_cache: BTreeMap<WarmKey, Scalar> = BTreeMap::new();
    for (idx, c) in contacts.iter().enumerate() {
        let jn_total = accum[idx].jn;
        let k = ctx.effective_mass(c, c.normal);
        if k <= 0.0 {
            continue;
        }
        resolved += 1;
        new_cache.insert(warm_key(c), jn_total);

        if let ContactKind::TireLine { tire_index } = c.kind {
            if let Some(h) = c.a.body() {
                couple_tire(&mut ctx, h, tire_index, c, jn_total, config, dt);
            }
        }

        let v_rel = ctx.velocity_at(c.a, c.point) - ctx.velocity_at(c.b, c.point);
        let vt = v_rel - c.normal * v_rel.dot(c.normal);
        let tangential_speed = vt.length();
        let info = history.surface_info(c.materials.0, c.materials.1);
        let smoke = info.and_then(|i| {
            (i.min_smoke_velocity > 0.0 && tangential_speed >= i.min_smoke_velocity)
                .then(|| i.smoke_particle.clone())
                .flatten()
        });
        ledger.push(ContactEvent {
            tick,
            a: c.a,
            b: c.b,
            point: c.point,
            normal: c.normal,
            normal_impulse: jn_total,
            tangential_speed,
            ridge: c.kind == ContactKind::Ridge,
            smoke_particle: smoke,
        });
    }
    warm.jn = new_cache;
    trace!(contacts = contacts.len(), resolved, "substep solved");
    SolveStats { resolved }
}

fn friction_coefficients(
    config: &PhysicsEngineConfig,
    info: Option<&SurfaceContactInfo>,
) -> (Scalar, Scalar) {
    match info {
        Some(i) => (i.stiction_coefficient, i.friction_coefficient),
        None => (config.stiction_coefficient, config.friction_coefficient),
    }
}

/// Feed the resolved normal impulse into the tire: cache it for the
/// friction model, advance the shock absorber under the implied load, and
/// apply engine drive / brake along the wheel's longitudinal axis.
fn couple_tire(
    ctx: &mut Ctx<'_>,
    h: BodyHandle,
    tire_index: usize,
    c: &Contact,
    jn_total: Scalar,
    config: &PhysicsEngineConfig,
    dt: Scalar,
) {
    let Some(body) = ctx.bodies.get_mut(h) else { return };
    let (steered, driven) = {
        let t = &body.tires[tire_index];
        (t.params.steered, t.params.driven)
    };
    let (t_long, _t_lat) = tire_tangent_frame(body, steered, c.normal);
    let v_long = body.pulses.velocity_at(c.point).dot(t_long);
    let load = (jn_total / dt).max(0.0);

    let tire = &mut body.tires[tire_index];
    tire.normal_impulse = Some(NormalImpulse { lambda_total: jn_total, normal: c.normal });
    let shock_params = tire.params.shock;
    tire.shock.advance(&shock_params, load, dt);
    let radius = tire.params.radius;
    let rolling = v_long / radius;

    let throttle = body.controller.throttle;
    let brake = body.controller.brake;
    let hand_brake = body.controller.hand_brake;

    if brake > 0.0 || hand_brake {
        let t = &mut body.tires[tire_index];
        t.angular_velocity = if hand_brake { 0.0 } else { rolling * (1.0 - brake) };
        return;
    }

    if driven && throttle > 0.0 {
        let mut drive_impulse = 0.0;
        if let Some(engine) = body.engine.as_mut() {
            let w = body.tires[tire_index].angular_velocity.max(rolling.abs());
            engine.auto_set_gear(w);
            let power = engine.get_power(w) * throttle;
            // force = P / v, floored so standing starts get finite force
            let force = power / v_long.abs().max(1.0);
            let mut cap = config.stiction_coefficient * load;
            if config.avoid_burnout {
                // stay below the static peak so the wheel does not spin up
                cap *= 0.9;
            }
            drive_impulse = force.min(cap) * dt;
        }
        if drive_impulse > 0.0 {
            let j = t_long * drive_impulse;
            body.pulses.apply_impulse_at(j, c.point);
            let t = &mut body.tires[tire_index];
            // under burnout avoidance the wheel tracks the ground; otherwise
            // surplus throttle spins it past rolling speed
            let slip_w = if config.avoid_burnout { 0.0 } else { throttle * 5.0 / radius };
            t.angular_velocity = rolling + slip_w;
        }
    } else {
        let t = &mut body.tires[tire_index];
        t.angular_velocity = rolling;
    }
}
