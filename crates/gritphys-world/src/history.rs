use gritphys_core::{BodyHandle, Scalar, Vec3};
use gritphys_materials::{PhysicsMaterial, SurfaceContactDb};

/// One side of a contact: a dynamic body or the static level mesh.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum ContactParty {
    Body(BodyHandle),
    Static,
}

impl ContactParty {
    #[inline] pub fn body(self) -> Option<BodyHandle> {
        match self {
            ContactParty::Body(h) => Some(h),
            ContactParty::Static => None,
        }
    }
}

/// Resolved-contact record appended once per solved contact per substep.
/// Gameplay observers (bullet damage, smoke, audio) consume these; debug
/// visualization reads the ridge flag.
#[derive(Clone, Debug)]
pub struct ContactEvent {
    pub tick: u64,
    pub a: ContactParty,
    pub b: ContactParty,
    pub point: Vec3,
    pub normal: Vec3,
    pub normal_impulse: Scalar,
    pub tangential_speed: Scalar,
    pub ridge: bool,
    /// Smoke resource when the pair's slip exceeded its threshold.
    pub smoke_particle: Option<String>,
}

/// Bounded event buffer, drained by observers between frames; overflow
/// drops the oldest events rather than growing without bound.
pub struct ContactLedger {
    events: std::collections::VecDeque<ContactEvent>,
    capacity: usize,
    dropped: u64,
}

impl ContactLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: std::collections::VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, e: ContactEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(e);
    }

    pub fn drain(&mut self) -> Vec<ContactEvent> {
        self.events.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }
    pub fn dropped(&self) -> u64 { self.dropped }
}

/// Island of bodies participating in this substep's resolution.
#[derive(Clone, Debug, Default)]
pub struct CollisionGroup {
    pub members: Vec<BodyHandle>,
}

impl CollisionGroup {
    pub fn note(&mut self, h: BodyHandle) {
        if !self.members.contains(&h) {
            self.members.push(h);
        }
    }
}

/// Per-substep context threaded through the resolution pass: the active
/// body group plus the material-pair contact database. Explicit parameter,
/// not ambient state.
pub struct CollisionHistory<'a> {
    pub group: CollisionGroup,
    pub surface_db: &'a SurfaceContactDb,
}

impl<'a> CollisionHistory<'a> {
    pub fn new(surface_db: &'a SurfaceContactDb) -> Self {
        Self { group: CollisionGroup::default(), surface_db }
    }

    pub fn surface_info(
        &self,
        a: PhysicsMaterial,
        b: PhysicsMaterial,
    ) -> Option<&'a gritphys_materials::SurfaceContactInfo> {
        self.surface_db.lookup(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritphys_core::Vec3;

    fn event(tick: u64) -> ContactEvent {
        ContactEvent {
            tick,
            a: ContactParty::Static,
            b: ContactParty::Static,
            point: Vec3::ZERO,
            normal: Vec3::Y,
            normal_impulse: 1.0,
            tangential_speed: 0.0,
            ridge: false,
            smoke_particle: None,
        }
    }

    #[test] fn ledger_caps_and_counts_drops() {
        let mut l = ContactLedger::new(2);
        l.push(event(1));
        l.push(event(2));
        l.push(event(3));
        assert_eq!(l.len(), 2);
        assert_eq!(l.dropped(), 1);
        let ticks: Vec<u64> = l.drain().into_iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![2, 3]);
        assert!(l.is_empty());
    }

    #[test] fn group_dedups_members() {
        let mut g = CollisionGroup::default();
        let h = BodyHandle { index: 4, generation: 0 };
        g.note(h);
        g.note(h);
        assert_eq!(g.members.len(), 1);
    }
}
