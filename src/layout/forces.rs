//! Force kernels. Each one adds to node velocities; integration happens in
//! [`Simulation::step`](super::Simulation::step).

use super::{LayoutLink, LayoutNode};

/// Many-body distances are floored at 1 unit to keep close pairs finite
const DISTANCE_MIN2: f64 = 1.0;

/// Tiny deterministic offset used to separate coincident points
pub(crate) fn jiggle(seed: usize) -> f64 {
    ((seed as f64 * 0.618_034).fract() - 0.5) * 1e-6
}

/// Pull linked nodes toward `distance` apart.
///
/// Uses predicted positions (position + velocity) and splits the correction by
/// link bias, so a hub moves less than its leaves.
pub(crate) fn apply_links(nodes: &mut [LayoutNode], links: &[LayoutLink], distance: f64, alpha: f64) {
    for (k, link) in links.iter().enumerate() {
        let (s, t) = (link.source, link.target);
        if s == t {
            continue;
        }
        let mut dx = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
        let mut dy = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
        if dx == 0.0 {
            dx = jiggle(k);
        }
        if dy == 0.0 {
            dy = jiggle(k + 1);
        }
        let len = (dx * dx + dy * dy).sqrt();
        let l = (len - distance) / len * alpha * link.strength;
        dx *= l;
        dy *= l;

        nodes[t].vx -= dx * link.bias;
        nodes[t].vy -= dy * link.bias;
        nodes[s].vx += dx * (1.0 - link.bias);
        nodes[s].vy += dy * (1.0 - link.bias);
    }
}

/// Pairwise charge. Negative `strength` repels with magnitude falling off as 1/distance.
pub(crate) fn apply_many_body(nodes: &mut [LayoutNode], strength: f64, alpha: f64) {
    let n = nodes.len();
    let mut dv = vec![(0.0, 0.0); n];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut dx = nodes[j].x - nodes[i].x;
            let mut dy = nodes[j].y - nodes[i].y;
            let mut l = dx * dx + dy * dy;
            if dx == 0.0 {
                dx = jiggle(i * n + j);
                l += dx * dx;
            }
            if dy == 0.0 {
                dy = jiggle(j * n + i);
                l += dy * dy;
            }
            if l < DISTANCE_MIN2 {
                l = (DISTANCE_MIN2 * l).sqrt();
            }
            let w = strength * alpha / l;
            dv[i].0 += dx * w;
            dv[i].1 += dy * w;
        }
    }

    for (node, (dvx, dvy)) in nodes.iter_mut().zip(dv) {
        node.vx += dvx;
        node.vy += dvy;
    }
}

/// Weak spring from every node toward `(cx, cy)`
pub(crate) fn apply_centering(nodes: &mut [LayoutNode], cx: f64, cy: f64, strength: f64, alpha: f64) {
    let k = strength * alpha;
    for node in nodes.iter_mut() {
        node.vx += (cx - node.x) * k;
        node.vy += (cy - node.y) * k;
    }
}

/// Push apart any pair closer than the sum of their sizes.
///
/// Not scaled by alpha: overlap is a hard constraint, resolved at
/// `strength` per step and shared in proportion to the other node's area.
pub(crate) fn apply_collision(nodes: &mut [LayoutNode], strength: f64) {
    let n = nodes.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let ri = nodes[i].size;
            let rj = nodes[j].size;
            let r = ri + rj;
            let mut dx = nodes[i].x + nodes[i].vx - nodes[j].x - nodes[j].vx;
            let mut dy = nodes[i].y + nodes[i].vy - nodes[j].y - nodes[j].vy;
            let mut l2 = dx * dx + dy * dy;
            if l2 >= r * r {
                continue;
            }
            if dx == 0.0 {
                dx = jiggle(i * n + j);
                l2 += dx * dx;
            }
            if dy == 0.0 {
                dy = jiggle(j * n + i);
                l2 += dy * dy;
            }
            let len = l2.sqrt();
            let l = (r - len) / len * strength;
            dx *= l;
            dy *= l;

            let (ri2, rj2) = (ri * ri, rj * rj);
            let share_i = rj2 / (ri2 + rj2);
            nodes[i].vx += dx * share_i;
            nodes[i].vy += dy * share_i;
            nodes[j].vx -= dx * (1.0 - share_i);
            nodes[j].vy -= dy * (1.0 - share_i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DragPhase;

    fn body(id: &str, x: f64, y: f64, size: f64) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            size,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
            drag: DragPhase::Idle,
        }
    }

    #[test]
    fn test_link_pulls_far_nodes_together() {
        let mut nodes = vec![body("a", 0.0, 0.0, 1.0), body("b", 400.0, 0.0, 1.0)];
        let links = [LayoutLink { source: 0, target: 1, strength: 1.0, bias: 0.5 }];
        apply_links(&mut nodes, &links, 150.0, 1.0);
        assert!(nodes[0].vx > 0.0);
        assert!(nodes[1].vx < 0.0);
    }

    #[test]
    fn test_link_pushes_close_nodes_apart() {
        let mut nodes = vec![body("a", 0.0, 0.0, 1.0), body("b", 10.0, 0.0, 1.0)];
        let links = [LayoutLink { source: 0, target: 1, strength: 1.0, bias: 0.5 }];
        apply_links(&mut nodes, &links, 150.0, 1.0);
        assert!(nodes[0].vx < 0.0);
        assert!(nodes[1].vx > 0.0);
    }

    #[test]
    fn test_negative_charge_repels() {
        let mut nodes = vec![body("a", 0.0, 0.0, 1.0), body("b", 50.0, 0.0, 1.0)];
        apply_many_body(&mut nodes, -400.0, 1.0);
        assert!(nodes[0].vx < 0.0);
        assert!(nodes[1].vx > 0.0);
        assert!((nodes[0].vx + nodes[1].vx).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_nodes_still_separate() {
        let mut nodes = vec![body("a", 5.0, 5.0, 10.0), body("b", 5.0, 5.0, 10.0)];
        apply_collision(&mut nodes, 0.7);
        assert!(nodes[0].vx.is_finite() && nodes[1].vx.is_finite());
        assert!(nodes[0].vx != 0.0 || nodes[0].vy != 0.0);
    }

    #[test]
    fn test_collision_ignores_distant_pairs() {
        let mut nodes = vec![body("a", 0.0, 0.0, 10.0), body("b", 25.0, 0.0, 10.0)];
        apply_collision(&mut nodes, 0.7);
        assert_eq!(nodes[0].vx, 0.0);
        assert_eq!(nodes[1].vx, 0.0);
    }

    #[test]
    fn test_centering_scales_with_alpha() {
        let mut hot = vec![body("a", 0.0, 0.0, 1.0)];
        let mut cold = hot.clone();
        apply_centering(&mut hot, 100.0, 0.0, 0.05, 1.0);
        apply_centering(&mut cold, 100.0, 0.0, 0.05, 0.1);
        assert!(hot[0].vx > cold[0].vx);
        assert!(cold[0].vx > 0.0);
    }
}
