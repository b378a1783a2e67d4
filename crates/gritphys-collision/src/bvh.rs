use gritphys_core::Scalar;
use gritphys_geom::{Aabb, BoundingSphere};

#[derive(Clone, Debug)]
enum BvhNode {
    Internal { aabb: Aabb, left: u32, right: u32 },
    Leaf { aabb: Aabb, start: u32, count: u32 },
}

/// Bounding-volume hierarchy over static level geometry. Built once at load
/// by top-down median split along the longest axis; never mutated after.
/// Queries return every true overlap (no false negatives); false positives
/// are re-verified by narrow phase.
pub struct Bvh<T> {
    nodes: Vec<BvhNode>,
    items: Vec<(Aabb, T)>,
}

impl<T> Bvh<T> {
    pub fn build(mut items: Vec<(Aabb, T)>, max_leaf_size: usize, max_levels: u32) -> Self {
        let mut nodes = Vec::new();
        if !items.is_empty() {
            let n = items.len();
            build_node(&mut nodes, &mut items, 0, n, max_leaf_size.max(1), max_levels);
        }
        Self { nodes, items }
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Visit every item whose box intersects `region`.
    pub fn query_aabb<F: FnMut(&Aabb, &T)>(&self, region: &Aabb, mut visit: F) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0u32];
        while let Some(ni) = stack.pop() {
            match &self.nodes[ni as usize] {
                BvhNode::Internal { aabb, left, right } => {
                    if aabb.intersects(region) {
                        stack.push(*left);
                        stack.push(*right);
                    }
                }
                BvhNode::Leaf { aabb, start, count } => {
                    if aabb.intersects(region) {
                        for (ib, item) in
                            &self.items[*start as usize..(*start + *count) as usize]
                        {
                            if ib.intersects(region) {
                                visit(ib, item);
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn query_sphere<F: FnMut(&Aabb, &T)>(&self, sphere: &BoundingSphere, mut visit: F) {
        let region = sphere.aabb();
        self.query_aabb(&region, |aabb, item| {
            if sphere.intersects_aabb(aabb) {
                visit(aabb, item);
            }
        });
    }

    /// Box enclosing the whole hierarchy; `EMPTY` when no items.
    pub fn root_aabb(&self) -> Aabb {
        match self.nodes.first() {
            Some(BvhNode::Internal { aabb, .. }) | Some(BvhNode::Leaf { aabb, .. }) => *aabb,
            None => Aabb::EMPTY,
        }
    }
}

fn enclosing(items: &[(Aabb, impl Sized)]) -> Aabb {
    let mut a = Aabb::EMPTY;
    for (b, _) in items {
        a = a.union(b);
    }
    a
}

fn build_node<T>(
    nodes: &mut Vec<BvhNode>,
    items: &mut Vec<(Aabb, T)>,
    start: usize,
    count: usize,
    max_leaf_size: usize,
    levels_left: u32,
) -> u32 {
    let aabb = enclosing(&items[start..start + count]);
    let index = nodes.len() as u32;
    if count <= max_leaf_size || levels_left == 0 {
        nodes.push(BvhNode::Leaf { aabb, start: start as u32, count: count as u32 });
        return index;
    }
    let axis = aabb.longest_axis();
    items[start..start + count].sort_by(|(a, _), (b, _)| {
        let ca: Scalar = a.center()[axis];
        let cb: Scalar = b.center()[axis];
        ca.total_cmp(&cb)
    });
    let mid = count / 2;
    // placeholder, patched after children are laid out
    nodes.push(BvhNode::Leaf { aabb, start: 0, count: 0 });
    let left = build_node(nodes, items, start, mid, max_leaf_size, levels_left - 1);
    let right = build_node(nodes, items, start + mid, count - mid, max_leaf_size, levels_left - 1);
    nodes[index as usize] = BvhNode::Internal { aabb, left, right };
    index
}
