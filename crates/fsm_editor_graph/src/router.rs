// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge routing: vertical S-curves from a state's bottom to the next state's top.

use crate::edge::EdgeId;
use crate::graph::Graph;
use crate::node::{Node, NODE_HEIGHT, NODE_WIDTH};
use egui::Pos2;
use std::fmt::Write as _;

/// A routed edge in graph space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgePath {
    /// One endpoint is missing; draw nothing
    Empty,
    /// Cubic bezier with its label anchor
    Cubic {
        /// Start, two control points, end
        points: [Pos2; 4],
        /// Midpoint of the straight line between the anchors
        label_anchor: Pos2,
    },
}

impl EdgePath {
    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Label position, if any
    pub fn label_anchor(&self) -> Option<Pos2> {
        match self {
            Self::Empty => None,
            Self::Cubic { label_anchor, .. } => Some(*label_anchor),
        }
    }

    /// Flatten the curve into `segments + 1` points
    pub fn sample(&self, segments: usize) -> Vec<Pos2> {
        match self {
            Self::Empty => Vec::new(),
            Self::Cubic { points, .. } => bezier_points(points, segments.max(1)),
        }
    }

    /// SVG path data (`M x y C ...`); empty for [`EdgePath::Empty`]
    pub fn to_svg(&self) -> String {
        let Self::Cubic { points: [p0, p1, p2, p3], .. } = self else {
            return String::new();
        };
        let mut out = String::new();
        let _ = write!(
            out,
            "M {} {} C {} {}, {} {}, {} {}",
            p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y
        );
        out
    }
}

/// Route one edge. Missing endpoints yield [`EdgePath::Empty`].
pub fn route(source: Option<&Node>, target: Option<&Node>) -> EdgePath {
    let (Some(source), Some(target)) = (source, target) else {
        return EdgePath::Empty;
    };

    let start = Pos2::new(source.x + NODE_WIDTH / 2.0, source.y + NODE_HEIGHT);
    let end = Pos2::new(target.x + NODE_WIDTH / 2.0, target.y);
    let mid_y = (start.y + end.y) / 2.0;

    EdgePath::Cubic {
        points: [start, Pos2::new(start.x, mid_y), Pos2::new(end.x, mid_y), end],
        label_anchor: Pos2::new((start.x + end.x) / 2.0, mid_y),
    }
}

/// Route every edge of the graph, in edge order
pub fn route_edges(graph: &Graph) -> Vec<(EdgeId, EdgePath)> {
    graph
        .edges()
        .map(|edge| {
            let path = route(graph.node(&edge.source), graph.node(&edge.target));
            (edge.id.clone(), path)
        })
        .collect()
}

/// Generate points along a cubic bezier curve
fn bezier_points([p0, p1, p2, p3]: &[Pos2; 4], segments: usize) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::NodeId;

    #[test]
    fn test_route_anchors_and_controls() {
        let a = Node::new("a", "A", NodeKind::Input).with_position(0.0, 0.0);
        let b = Node::new("b", "B", NodeKind::Output).with_position(200.0, 150.0);

        let EdgePath::Cubic { points, label_anchor } = route(Some(&a), Some(&b)) else {
            panic!("expected a curve");
        };
        assert_eq!(points[0], Pos2::new(70.0, 50.0));
        assert_eq!(points[3], Pos2::new(270.0, 150.0));
        assert_eq!(points[1], Pos2::new(70.0, 100.0));
        assert_eq!(points[2], Pos2::new(270.0, 100.0));
        assert_eq!(label_anchor, Pos2::new(170.0, 100.0));
    }

    #[test]
    fn test_missing_endpoint_is_empty() {
        let a = Node::new("a", "A", NodeKind::Input);
        assert!(route(Some(&a), None).is_empty());
        assert!(route(None, Some(&a)).is_empty());
        assert!(route(None, None).sample(8).is_empty());
        assert_eq!(EdgePath::Empty.to_svg(), "");
    }

    #[test]
    fn test_sample_hits_endpoints() {
        let a = Node::new("a", "A", NodeKind::Input);
        let b = Node::new("b", "B", NodeKind::Output).with_position(0.0, 200.0);
        let path = route(Some(&a), Some(&b));
        let samples = path.sample(16);
        assert_eq!(samples.len(), 17);
        assert_eq!(samples[0], Pos2::new(70.0, 50.0));
        assert_eq!(samples[16], Pos2::new(70.0, 200.0));
        assert!(path.to_svg().starts_with("M 70 50 C"));
    }

    #[test]
    fn test_route_edges_tolerates_stale_reference() {
        let mut graph = Graph::seed();
        let stale: Vec<_> = graph.edges().cloned().collect();
        let kept: Vec<_> = graph
            .nodes()
            .filter(|n| n.id != NodeId::from("end"))
            .cloned()
            .collect();
        graph.set_nodes(kept);
        graph.set_edges(stale);

        let routes = route_edges(&graph);
        assert_eq!(routes.len(), 3);
        assert!(routes[2].1.is_empty());
        assert!(!routes[0].1.is_empty());
    }
}
