/// Ray and proximity queries against triangulated meshes
use crate::mesh::Mesh;
use glam::DVec3;

/// Nearest intersection along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub position: DVec3,
    /// Unit geometric normal of the hit triangle, wound as in the source mesh.
    pub normal: DVec3,
    /// Distance from the ray origin in units of the (normalized) direction.
    pub distance: f64,
}

/// Nearest point on a surface to a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: DVec3,
    pub normal: DVec3,
    pub distance: f64,
}

/// Anything that can answer "where does this ray first meet the surface?"
pub trait RaySurface {
    /// First hit within `max_len` of `origin` along `direction`, or `None`.
    fn ray_cast(&self, origin: DVec3, direction: DVec3, max_len: f64) -> Option<RayHit>;
}

pub trait ClosestPoint {
    fn closest_point(&self, point: DVec3) -> Option<SurfacePoint>;
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    a: DVec3,
    b: DVec3,
    c: DVec3,
}

impl Triangle {
    fn centroid(&self) -> DVec3 {
        (self.a + self.b + self.c) / 3.0
    }

    fn normal(&self) -> DVec3 {
        (self.b - self.a)
            .cross(self.c - self.a)
            .try_normalize()
            .unwrap_or(DVec3::Z)
    }
}

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: DVec3,
    max: DVec3,
}

impl Aabb {
    const EMPTY: Aabb = Aabb {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    fn grow_triangle(&mut self, t: &Triangle) {
        self.min = self.min.min(t.a).min(t.b).min(t.c);
        self.max = self.max.max(t.a).max(t.b).max(t.c);
    }

    fn distance_sq(&self, p: DVec3) -> f64 {
        let d = (self.min - p).max(p - self.max).max(DVec3::ZERO);
        d.length_squared()
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { start: usize, count: usize },
    Inner { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    kind: NodeKind,
}

const LEAF_SIZE: usize = 4;
const HIT_EPSILON: f64 = 1e-9;

/// Bounding volume hierarchy over a mesh's triangles, built once and queried many times.
pub struct TriangleBvh {
    triangles: Vec<Triangle>,
    nodes: Vec<BvhNode>,
}

impl TriangleBvh {
    /// Median-split build over the triangulated quads of `mesh`.
    pub fn build(mesh: &Mesh) -> Self {
        let mut triangles: Vec<Triangle> = mesh
            .triangles()
            .map(|[a, b, c]| Triangle {
                a: mesh.positions[a as usize],
                b: mesh.positions[b as usize],
                c: mesh.positions[c as usize],
            })
            .collect();

        let mut nodes = Vec::new();
        if !triangles.is_empty() {
            let count = triangles.len();
            build_node(&mut triangles, 0, count, &mut nodes);
        }
        Self { triangles, nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

fn build_node(triangles: &mut [Triangle], start: usize, end: usize, nodes: &mut Vec<BvhNode>) -> usize {
    let mut bounds = Aabb::EMPTY;
    for t in &triangles[start..end] {
        bounds.grow_triangle(t);
    }

    let index = nodes.len();
    nodes.push(BvhNode {
        bounds,
        kind: NodeKind::Leaf {
            start,
            count: end - start,
        },
    });
    if end - start <= LEAF_SIZE {
        return index;
    }

    // Split on the longest centroid axis
    let (mut cmin, mut cmax) = (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY));
    for t in &triangles[start..end] {
        let c = t.centroid();
        cmin = cmin.min(c);
        cmax = cmax.max(c);
    }
    let extent = cmax - cmin;
    let axis = if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    };

    let mid = start + (end - start) / 2;
    triangles[start..end].select_nth_unstable_by(mid - start, |a, b| {
        a.centroid()[axis].total_cmp(&b.centroid()[axis])
    });

    let left = build_node(triangles, start, mid, nodes);
    let right = build_node(triangles, mid, end, nodes);
    nodes[index].kind = NodeKind::Inner { left, right };
    index
}

/// Slab test. Returns the entry distance, or zero when the origin is inside the box.
/// Axes the ray runs parallel to only accept origins within that slab.
pub fn ray_aabb_hit_t(origin: DVec3, direction: DVec3, min: DVec3, max: DVec3) -> Option<f64> {
    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);
        if d == 0.0 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((min[axis] - o) * inv, (max[axis] - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmin > tmax {
            return None;
        }
    }

    if tmax < 0.0 {
        return None;
    }
    Some(tmin.max(0.0))
}

/// Möller–Trumbore, two-sided. Returns the ray parameter of the hit.
fn ray_triangle_t(origin: DVec3, direction: DVec3, tri: &Triangle) -> Option<f64> {
    let e1 = tri.b - tri.a;
    let e2 = tri.c - tri.a;
    let p = direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-14 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - tri.a;
    let u = s.dot(p) * inv_det;
    if !(-HIT_EPSILON..=1.0 + HIT_EPSILON).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = direction.dot(q) * inv_det;
    if v < -HIT_EPSILON || u + v > 1.0 + HIT_EPSILON {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Closest point on a triangle (Ericson, Real-Time Collision Detection 5.1.5)
fn closest_point_on_triangle(p: DVec3, tri: &Triangle) -> DVec3 {
    let (a, b, c) = (tri.a, tri.b, tri.c);
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

impl RaySurface for TriangleBvh {
    fn ray_cast(&self, origin: DVec3, direction: DVec3, max_len: f64) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        if self.nodes.is_empty() || max_len < 0.0 {
            return None;
        }

        let mut best: Option<(f64, usize)> = None;
        let mut stack = vec![0usize];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            let limit = best.map_or(max_len, |(t, _)| t);
            match ray_aabb_hit_t(origin, direction, node.bounds.min, node.bounds.max) {
                Some(t) if t <= limit => {}
                _ => continue,
            }
            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for i in start..start + count {
                        if let Some(t) = ray_triangle_t(origin, direction, &self.triangles[i]) {
                            let limit = best.map_or(max_len, |(bt, _)| bt);
                            if t <= limit && best.is_none_or(|(bt, bi)| t < bt || (t == bt && i < bi)) {
                                best = Some((t, i));
                            }
                        }
                    }
                }
                NodeKind::Inner { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        best.map(|(t, i)| RayHit {
            position: origin + direction * t,
            normal: self.triangles[i].normal(),
            distance: t,
        })
    }
}

impl ClosestPoint for TriangleBvh {
    fn closest_point(&self, point: DVec3) -> Option<SurfacePoint> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best: Option<(f64, DVec3, usize)> = None;
        let mut stack = vec![0usize];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            let bound = node.bounds.distance_sq(point);
            if best.is_some_and(|(d2, _, _)| bound > d2) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for i in start..start + count {
                        let q = closest_point_on_triangle(point, &self.triangles[i]);
                        let d2 = (q - point).length_squared();
                        if best.is_none_or(|(bd2, _, _)| d2 < bd2) {
                            best = Some((d2, q, i));
                        }
                    }
                }
                NodeKind::Inner { left, right } => {
                    // Visit the nearer child first
                    let dl = self.nodes[left].bounds.distance_sq(point);
                    let dr = self.nodes[right].bounds.distance_sq(point);
                    if dl <= dr {
                        stack.push(right);
                        stack.push(left);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }

        best.map(|(d2, q, i)| SurfacePoint {
            position: q,
            normal: self.triangles[i].normal(),
            distance: d2.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_road_mesh;

    fn sloped_road() -> Mesh {
        let route: Vec<DVec3> = (0..=20)
            .map(|i| DVec3::new(i as f64 * 5.0, (i as f64 * 0.2).sin() * 10.0, i as f64 * 0.5))
            .collect();
        build_road_mesh(&route, 6.0)
    }

    fn brute_ray(mesh: &Mesh, origin: DVec3, dir: DVec3, max_len: f64) -> Option<f64> {
        mesh.triangles()
            .filter_map(|[a, b, c]| {
                let tri = Triangle {
                    a: mesh.positions[a as usize],
                    b: mesh.positions[b as usize],
                    c: mesh.positions[c as usize],
                };
                ray_triangle_t(origin, dir, &tri)
            })
            .filter(|t| *t <= max_len)
            .min_by(|a, b| a.total_cmp(b))
    }

    #[test]
    fn slab_test_handles_axis_parallel_rays() {
        let (min, max) = (DVec3::ZERO, DVec3::ONE);
        let down = DVec3::NEG_Z;
        assert_eq!(ray_aabb_hit_t(DVec3::new(0.5, 0.5, 3.0), down, min, max), Some(2.0));
        // Origin exactly on a face of the box
        assert_eq!(ray_aabb_hit_t(DVec3::new(0.0, 1.0, 3.0), down, min, max), Some(2.0));
        assert_eq!(ray_aabb_hit_t(DVec3::new(1.5, 0.5, 3.0), down, min, max), None);
        assert_eq!(ray_aabb_hit_t(DVec3::new(0.5, 0.5, -1.0), down, min, max), None);
        assert_eq!(ray_aabb_hit_t(DVec3::new(0.5, 0.5, 0.5), down, min, max), Some(0.0));
    }

    #[test]
    fn vertical_ray_hits_flat_quad() {
        let mesh = build_road_mesh(&[DVec3::new(0.0, 0.0, 2.0), DVec3::new(10.0, 0.0, 2.0)], 4.0);
        let bvh = TriangleBvh::build(&mesh);
        let hit = bvh
            .ray_cast(DVec3::new(5.0, 1.0, 10.0), DVec3::NEG_Z, 100.0)
            .expect("hit");
        assert!((hit.position - DVec3::new(5.0, 1.0, 2.0)).length() < 1e-12);
        assert!((hit.distance - 8.0).abs() < 1e-12);
        assert!((hit.normal - DVec3::Z).length() < 1e-12);
        assert!(bvh.ray_cast(DVec3::new(5.0, 1.0, 10.0), DVec3::NEG_Z, 7.0).is_none());
        assert!(bvh.ray_cast(DVec3::new(5.0, 3.0, 10.0), DVec3::NEG_Z, 100.0).is_none());
    }

    #[test]
    fn bvh_matches_brute_force() {
        let mesh = sloped_road();
        let bvh = TriangleBvh::build(&mesh);
        assert_eq!(bvh.triangle_count(), 40);
        for i in 0..60 {
            for j in 0..15 {
                let origin = DVec3::new(i as f64 * 1.7 - 1.0, j as f64 * 1.9 - 14.0, 50.0);
                let expected = brute_ray(&mesh, origin, DVec3::NEG_Z, 100.0);
                let got = bvh.ray_cast(origin, DVec3::NEG_Z, 100.0).map(|h| h.distance);
                match (got, expected) {
                    (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9, "origin {origin:?}"),
                    (None, None) => {}
                    other => panic!("mismatch {other:?} at {origin:?}"),
                }
            }
        }
    }

    #[test]
    fn closest_point_on_flat_ribbon() {
        let mesh = build_road_mesh(&[DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)], 4.0);
        let bvh = TriangleBvh::build(&mesh);
        let above = bvh.closest_point(DVec3::new(3.0, 1.0, 5.0)).expect("point");
        assert!((above.position - DVec3::new(3.0, 1.0, 0.0)).length() < 1e-12);
        assert!((above.distance - 5.0).abs() < 1e-12);
        let beside = bvh.closest_point(DVec3::new(4.0, 7.0, 0.0)).expect("point");
        assert!((beside.position - DVec3::new(4.0, 2.0, 0.0)).length() < 1e-12);
        let corner = bvh.closest_point(DVec3::new(-3.0, -6.0, 0.0)).expect("point");
        assert!((corner.position - DVec3::new(0.0, -2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn empty_mesh_never_hits() {
        let bvh = TriangleBvh::build(&Mesh::new());
        assert!(bvh.is_empty());
        assert!(bvh.ray_cast(DVec3::ZERO, DVec3::NEG_Z, 10.0).is_none());
        assert!(bvh.closest_point(DVec3::ZERO).is_none());
    }
}
