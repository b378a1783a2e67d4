use gritphys_core::{Scalar, Mat3, Vec3};

/// Mass and inertia of a body. `infinite()` marks immovable geometry:
/// `mass == INFINITY`, zero inverse mass/inertia.
#[derive(Copy, Clone, Debug)]
pub struct MassProps {
    pub mass: Scalar,
    pub inv_mass: Scalar,
    pub inertia: Mat3,
    pub inv_inertia: Mat3,
}

impl MassProps {
    pub fn infinite() -> Self {
        Self {
            mass: Scalar::INFINITY,
            inv_mass: 0.0,
            inertia: Mat3::IDENTITY,
            inv_inertia: Mat3::ZERO,
        }
    }

    #[inline] pub fn is_infinite(&self) -> bool { self.inv_mass == 0.0 }

    fn from_diagonal(mass: Scalar, diag: Vec3) -> Self {
        let inertia = Mat3::from_diagonal(diag.into());
        let inv_inertia = Mat3::from_diagonal(
            Vec3::new(1.0 / diag.x, 1.0 / diag.y, 1.0 / diag.z).into(),
        );
        Self { mass, inv_mass: 1.0 / mass, inertia, inv_inertia }
    }

    pub fn sphere(radius: Scalar, density: Scalar) -> Self {
        let vol = (4.0 / 3.0) * core::f32::consts::PI * radius * radius * radius;
        let m = density * vol;
        let i = 0.4 * m * radius * radius;
        Self::from_diagonal(m, Vec3::splat(i))
    }

    pub fn cuboid(half_extents: Vec3, density: Scalar) -> Self {
        let dims = half_extents * 2.0;
        let m = density * dims.x * dims.y * dims.z;
        let (x2, y2, z2) = (dims.x * dims.x, dims.y * dims.y, dims.z * dims.z);
        Self::from_diagonal(
            m,
            Vec3::new(
                m * (y2 + z2) / 12.0,
                m * (x2 + z2) / 12.0,
                m * (x2 + y2) / 12.0,
            ),
        )
    }

    pub fn capsule(radius: Scalar, half_length: Scalar, density: Scalar) -> Self {
        let h = half_length * 2.0;
        let vol = core::f32::consts::PI * radius * radius * h
            + (4.0 / 3.0) * core::f32::consts::PI * radius * radius * radius;
        let m = density * vol;
        let ix = 0.25 * m * radius * radius + m * h * h / 12.0;
        let iy = 0.5 * m * radius * radius;
        Self::from_diagonal(m, Vec3::new(ix, iy, ix))
    }
}
