use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PhysicsMaterial;

/// Load-time configuration errors. These fail fast; an unknown surface name
/// in content is a content bug, not a runtime condition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MaterialError {
    #[error("unknown surface name `{0}`")]
    UnknownSurface(String),
    #[error("record for `{0}`/`{1}` carries no surface-base bits")]
    NotASurface(String, String),
    #[error("duplicate surface pair `{0}`/`{1}`")]
    DuplicatePair(String, String),
}

/// Contact parameters for one unordered surface pair.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceContactInfo {
    pub stiction_coefficient: f32,
    pub friction_coefficient: f32,
    /// Slip speed above which smoke particles are emitted.
    pub min_smoke_velocity: f32,
    pub smoke_particle: Option<String>,
}

/// Serde-facing record; surfaces are referenced by name so content files
/// stay readable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceContactRecord {
    pub surface0: String,
    pub surface1: String,
    pub stiction_coefficient: f32,
    pub friction_coefficient: f32,
    #[serde(default)]
    pub min_smoke_velocity: f32,
    #[serde(default)]
    pub smoke_particle: Option<String>,
}

pub fn surface_base_from_name(name: &str) -> Result<PhysicsMaterial, MaterialError> {
    match name {
        "tarmac" => Ok(PhysicsMaterial::SURFACE_BASE_TARMAC),
        "gravel" => Ok(PhysicsMaterial::SURFACE_BASE_GRAVEL),
        "snow" => Ok(PhysicsMaterial::SURFACE_BASE_SNOW),
        "ice" => Ok(PhysicsMaterial::SURFACE_BASE_ICE),
        "sand" => Ok(PhysicsMaterial::SURFACE_BASE_SAND),
        "grass" => Ok(PhysicsMaterial::SURFACE_BASE_GRASS),
        "metal" => Ok(PhysicsMaterial::SURFACE_BASE_METAL),
        "stone" => Ok(PhysicsMaterial::SURFACE_BASE_STONE),
        other => Err(MaterialError::UnknownSurface(other.to_owned())),
    }
}

#[inline]
fn ordered_pair(a: PhysicsMaterial, b: PhysicsMaterial) -> (u32, u32) {
    let (a, b) = (a.bits(), b.bits());
    if a <= b { (a, b) } else { (b, a) }
}

/// Friction/smoke parameters keyed by unordered `(surface, surface)` pair.
/// Lookup is symmetric; a missing pair means the candidate is skipped.
#[derive(Clone, Debug, Default)]
pub struct SurfaceContactDb {
    table: BTreeMap<(u32, u32), SurfaceContactInfo>,
}

impl SurfaceContactDb {
    pub fn new() -> Self { Self::default() }

    pub fn from_records(records: &[SurfaceContactRecord]) -> Result<Self, MaterialError> {
        let mut db = Self::new();
        for r in records {
            let s0 = surface_base_from_name(&r.surface0)?;
            let s1 = surface_base_from_name(&r.surface1)?;
            let key = ordered_pair(s0, s1);
            let info = SurfaceContactInfo {
                stiction_coefficient: r.stiction_coefficient,
                friction_coefficient: r.friction_coefficient,
                min_smoke_velocity: r.min_smoke_velocity,
                smoke_particle: r.smoke_particle.clone(),
            };
            if db.table.insert(key, info).is_some() {
                return Err(MaterialError::DuplicatePair(r.surface0.clone(), r.surface1.clone()));
            }
        }
        Ok(db)
    }

    pub fn insert(
        &mut self,
        a: PhysicsMaterial,
        b: PhysicsMaterial,
        info: SurfaceContactInfo,
    ) {
        self.table.insert(ordered_pair(a.surface_base(), b.surface_base()), info);
    }

    pub fn lookup(&self, a: PhysicsMaterial, b: PhysicsMaterial) -> Option<&SurfaceContactInfo> {
        self.table.get(&ordered_pair(a.surface_base(), b.surface_base()))
    }

    pub fn len(&self) -> usize { self.table.len() }
    pub fn is_empty(&self) -> bool { self.table.is_empty() }
}
