pub mod surface;

pub use surface::{SurfaceContactDb, SurfaceContactInfo, SurfaceContactRecord, MaterialError};

use bitflags::bitflags;

bitflags! {
    /// Per-primitive tags deciding which pairs are collision candidates at
    /// all. `ATTR_*` bits describe the primitive, `OBJ_*` bits the owner,
    /// `SURFACE_BASE_*` bits select the surface-pair contact row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct PhysicsMaterial: u32 {
        const NONE                = 0;
        const ATTR_COLLIDE        = 1 << 0;
        const ATTR_TWO_SIDED      = 1 << 1;
        const ATTR_CONVEX         = 1 << 2;

        const OBJ_CHASSIS         = 1 << 8;
        const OBJ_TIRE_LINE       = 1 << 9;
        const OBJ_BULLET_LINE     = 1 << 10;
        const OBJ_HITBOX          = 1 << 11;
        const OBJ_ALIGNMENT_PLANE = 1 << 12;

        const SURFACE_BASE_TARMAC = 1 << 16;
        const SURFACE_BASE_GRAVEL = 1 << 17;
        const SURFACE_BASE_SNOW   = 1 << 18;
        const SURFACE_BASE_ICE    = 1 << 19;
        const SURFACE_BASE_SAND   = 1 << 20;
        const SURFACE_BASE_GRASS  = 1 << 21;
        const SURFACE_BASE_METAL  = 1 << 22;
        const SURFACE_BASE_STONE  = 1 << 23;
    }
}

impl PhysicsMaterial {
    pub const SURFACE_MASK: PhysicsMaterial = PhysicsMaterial::SURFACE_BASE_TARMAC
        .union(PhysicsMaterial::SURFACE_BASE_GRAVEL)
        .union(PhysicsMaterial::SURFACE_BASE_SNOW)
        .union(PhysicsMaterial::SURFACE_BASE_ICE)
        .union(PhysicsMaterial::SURFACE_BASE_SAND)
        .union(PhysicsMaterial::SURFACE_BASE_GRASS)
        .union(PhysicsMaterial::SURFACE_BASE_METAL)
        .union(PhysicsMaterial::SURFACE_BASE_STONE);

    #[inline] pub fn surface_base(self) -> PhysicsMaterial {
        self & Self::SURFACE_MASK
    }

    #[inline] pub fn two_sided(self) -> bool {
        self.contains(Self::ATTR_TWO_SIDED)
    }
}

/// Broad-phase mask test; pairs failing this are never candidates.
#[inline]
pub fn can_collide(a: PhysicsMaterial, b: PhysicsMaterial) -> bool {
    a.contains(PhysicsMaterial::ATTR_COLLIDE) && b.contains(PhysicsMaterial::ATTR_COLLIDE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn collide_needs_both_bits() {
        let road = PhysicsMaterial::ATTR_COLLIDE | PhysicsMaterial::SURFACE_BASE_TARMAC;
        let decal = PhysicsMaterial::SURFACE_BASE_TARMAC;
        assert!(can_collide(road, road));
        assert!(!can_collide(road, decal));
    }

    #[test] fn surface_base_strips_object_bits() {
        let tire = PhysicsMaterial::ATTR_COLLIDE
            | PhysicsMaterial::OBJ_TIRE_LINE
            | PhysicsMaterial::SURFACE_BASE_GRAVEL;
        assert_eq!(tire.surface_base(), PhysicsMaterial::SURFACE_BASE_GRAVEL);
    }
}
