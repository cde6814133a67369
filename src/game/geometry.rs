//! Pure computational geometry for territories and trails
//!
//! Every function here is side-effect free and operates on plain vertex
//! slices. Polygons are closed implicitly (last vertex connects back to the
//! first) and indexed cyclically with `(i + 1) % n`. Positive signed area
//! denotes clockwise winding in the y-down world convention.

use crate::util::vec2::Vec2;

/// Result of intersecting a movement segment with a polygon boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryHit {
    pub point: Vec2,
    pub edge_index: usize,
}

/// Even-odd ray cast from `p` along the +x axis.
///
/// The strict `>` asymmetry on the vertex y tests breaks ties so a ray
/// passing exactly through a vertex is counted once.
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (poly[i], poly[j]);
        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Intersection point of segments `a->b` and `c->d` in parametric form.
///
/// Parallel and collinear segments report no intersection.
pub fn segment_intersection(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> Option<Vec2> {
    let denom = (d.y - c.y) * (b.x - a.x) - (d.x - c.x) * (b.y - a.y);
    if denom == 0.0 {
        return None;
    }
    let ua = ((d.x - c.x) * (a.y - c.y) - (d.y - c.y) * (a.x - c.x)) / denom;
    let ub = ((b.x - a.x) * (a.y - c.y) - (b.y - a.y) * (a.x - c.x)) / denom;
    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(a + (b - a) * ua)
    } else {
        None
    }
}

/// First polygon edge (in index order) crossed by the segment `p1->p2`
pub fn find_boundary_intersection(p1: Vec2, p2: Vec2, poly: &[Vec2]) -> Option<BoundaryHit> {
    let n = poly.len();
    for i in 0..n {
        let e1 = poly[i];
        let e2 = poly[(i + 1) % n];
        if let Some(point) = segment_intersection(p1, p2, e1, e2) {
            return Some(BoundaryHit {
                point,
                edge_index: i,
            });
        }
    }
    None
}

/// Boundary vertices walked forward from `(start_edge + 1) % n` up to and
/// including the vertex at `end_edge`.
///
/// With `start_edge == end_edge` this yields a full tour of all `n`
/// vertices, ending on the start edge's origin vertex.
pub fn extract_boundary_arc(poly: &[Vec2], start_edge: usize, end_edge: usize) -> Vec<Vec2> {
    let n = poly.len();
    if n == 0 {
        return Vec::new();
    }
    let mut arc = Vec::new();
    let mut i = (start_edge + 1) % n;
    loop {
        arc.push(poly[i]);
        if i == end_edge % n {
            break;
        }
        i = (i + 1) % n;
    }
    arc
}

/// Shoelace signed area; positive = clockwise in the y-down convention
pub fn signed_area(poly: &[Vec2]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Absolute polygon area
#[inline]
pub fn polygon_area(poly: &[Vec2]) -> f64 {
    signed_area(poly).abs()
}

/// Reverse the vertex order when the winding is counter-clockwise
pub fn ensure_clockwise(mut poly: Vec<Vec2>) -> Vec<Vec2> {
    if signed_area(&poly) < 0.0 {
        poly.reverse();
    }
    poly
}

/// Greedy vertex thinning: keep `poly[0]`, then keep each subsequent vertex
/// only if its squared distance from the last kept vertex exceeds `tol²`.
pub fn simplify_polygon(poly: &[Vec2], tol: f64) -> Vec<Vec2> {
    if poly.is_empty() {
        return Vec::new();
    }
    let tol_sq = tol * tol;
    let mut kept = Vec::with_capacity(poly.len());
    let mut last = poly[0];
    kept.push(last);
    for &p in &poly[1..] {
        if p.distance_sq_to(last) > tol_sq {
            kept.push(p);
            last = p;
        }
    }
    kept
}

/// Arithmetic mean of the vertices
pub fn polygon_centroid(poly: &[Vec2]) -> Vec2 {
    if poly.is_empty() {
        return Vec2::ZERO;
    }
    let mut sum = Vec2::ZERO;
    for &p in poly {
        sum += p;
    }
    sum * (1.0 / poly.len() as f64)
}

/// Index of the polygon vertex nearest to `p`
pub fn nearest_vertex_index(p: Vec2, poly: &[Vec2]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &v) in poly.iter().enumerate() {
        let d = p.distance_sq_to(v);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// True when every vertex is finite
pub fn polygon_is_finite(poly: &[Vec2]) -> bool {
    poly.iter().all(Vec2::is_finite)
}

/// Build the captured polygon from a trail and the two boundary crossings.
///
/// Two candidate polygons are formed by closing the trail along opposite
/// boundary arcs; the one with the larger absolute area is the capture.
/// Selecting by absolute area keeps the builder agnostic to winding order.
pub fn compute_capture(
    territory: &[Vec2],
    trail: &[Vec2],
    exit_point: Vec2,
    exit_edge: usize,
    entry_point: Vec2,
    entry_edge: usize,
) -> Vec<Vec2> {
    let mut base = Vec::with_capacity(trail.len() + 2 + territory.len());
    base.push(exit_point);
    base.extend_from_slice(trail);
    base.push(entry_point);

    if exit_edge == entry_edge {
        // Loop-only vs full boundary tour
        let loop_only = base.clone();
        let mut expansion = base;
        expansion.extend(extract_boundary_arc(territory, exit_edge, exit_edge));
        if polygon_area(&expansion) > polygon_area(&loop_only) {
            expansion
        } else {
            loop_only
        }
    } else {
        let arc_a = extract_boundary_arc(territory, exit_edge, entry_edge);
        let arc_b = extract_boundary_arc(territory, entry_edge, exit_edge);

        let mut candidate_a = base.clone();
        candidate_a.extend(arc_a.iter().rev());

        let mut candidate_b = base;
        candidate_b.extend(arc_b);

        if polygon_area(&candidate_a) > polygon_area(&candidate_b) {
            candidate_a
        } else {
            candidate_b
        }
    }
}
