use glam::{Vec3A, Mat3A, Quat};
use crate::Scalar;

pub type Vec3 = Vec3A;
pub type Mat3 = Mat3A;

#[inline] pub fn vec3(x: Scalar, y: Scalar, z: Scalar) -> Vec3 { Vec3::new(x, y, z) }
#[inline] pub fn iso(pos: Vec3, rot: Quat) -> Isometry { Isometry { pos, rot } }

/// Rigid placement: translation + rotation, no scale.
#[derive(Copy, Clone, Debug)]
pub struct Isometry { pub pos: Vec3, pub rot: Quat }

impl Isometry {
    #[inline] pub fn transform_point(&self, p: Vec3) -> Vec3 { self.rot * p + self.pos }
    #[inline] pub fn transform_vector(&self, v: Vec3) -> Vec3 { self.rot * v }
    #[inline] pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.rot.inverse() * (p - self.pos)
    }
}

impl Default for Isometry {
    fn default() -> Self { Self { pos: Vec3::ZERO, rot: Quat::IDENTITY } }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Velocity { pub lin: Vec3, pub ang: Vec3 }
