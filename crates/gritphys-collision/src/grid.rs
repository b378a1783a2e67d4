use std::collections::BTreeMap;

use gritphys_core::Scalar;
use gritphys_geom::Aabb;

/// Uniform grid over the dynamic region, rebuilt once per frame and shared
/// by that frame's substeps. Inserted boxes are dilated by
/// `dilation_radius` so candidates stay sound for the whole frame's
/// travel. Cell keys are quantized world coordinates; a `BTreeMap` keeps
/// iteration deterministic.
pub struct DynamicGrid<T> {
    cell_size: Scalar,
    dilation_radius: Scalar,
    cells: BTreeMap<(i32, i32, i32), Vec<u32>>,
    items: Vec<(Aabb, T)>,
}

impl<T> DynamicGrid<T> {
    pub fn new(cell_size: Scalar, dilation_radius: Scalar) -> Self {
        assert!(cell_size > 0.0, "grid cell size must be positive");
        Self {
            cell_size,
            dilation_radius,
            cells: BTreeMap::new(),
            items: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.items.clear();
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    #[inline]
    fn cell_of(&self, v: Scalar) -> i32 {
        (v / self.cell_size).floor() as i32
    }

    fn cell_range(&self, aabb: &Aabb) -> ((i32, i32, i32), (i32, i32, i32)) {
        (
            (
                self.cell_of(aabb.min.x),
                self.cell_of(aabb.min.y),
                self.cell_of(aabb.min.z),
            ),
            (
                self.cell_of(aabb.max.x),
                self.cell_of(aabb.max.y),
                self.cell_of(aabb.max.z),
            ),
        )
    }

    pub fn insert(&mut self, aabb: Aabb, payload: T) {
        let dilated = aabb.expanded(self.dilation_radius);
        let id = self.items.len() as u32;
        self.items.push((dilated, payload));
        let ((x0, y0, z0), (x1, y1, z1)) = self.cell_range(&dilated);
        for x in x0..=x1 {
            for y in y0..=y1 {
                for z in z0..=z1 {
                    self.cells.entry((x, y, z)).or_default().push(id);
                }
            }
        }
    }

    /// Visit every item whose dilated box intersects `region`, each exactly
    /// once, in insertion order.
    pub fn query<F: FnMut(&Aabb, &T)>(&self, region: &Aabb, mut visit: F) {
        let ((x0, y0, z0), (x1, y1, z1)) = self.cell_range(region);
        let mut candidates: Vec<u32> = Vec::new();
        for x in x0..=x1 {
            for y in y0..=y1 {
                for z in z0..=z1 {
                    if let Some(ids) = self.cells.get(&(x, y, z)) {
                        candidates.extend_from_slice(ids);
                    }
                }
            }
        }
        candidates.sort_unstable();
        candidates.dedup();
        for id in candidates {
            let (aabb, payload) = &self.items[id as usize];
            if aabb.intersects(region) {
                visit(aabb, payload);
            }
        }
    }

    /// Deterministic candidate pairs among the inserted items: each
    /// unordered pair with intersecting dilated boxes appears once, sorted.
    pub fn overlapping_pairs(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for ids in self.cells.values() {
            for (k, &i) in ids.iter().enumerate() {
                for &j in &ids[k + 1..] {
                    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
                    if self.items[lo as usize].0.intersects(&self.items[hi as usize].0) {
                        out.push((lo, hi));
                    }
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}
