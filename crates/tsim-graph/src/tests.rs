//! Unit tests for tsim-graph.
//!
//! All tests use hand-crafted networks so they are fully deterministic.

#[cfg(test)]
mod helpers {
    use tsim_core::Point;
    use crate::{RoadGraph, RoadGraphBuilder};

    /// Straight line A → B → C → D, unit costs, nodes spaced 1 apart on the
    /// x-axis.
    pub fn line_graph() -> RoadGraph {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node("A", Some(Point::new(0.0, 0.0)));
        let n1 = b.add_node("B", Some(Point::new(1.0, 0.0)));
        let n2 = b.add_node("C", Some(Point::new(2.0, 0.0)));
        let d = b.add_node("D", Some(Point::new(3.0, 0.0)));
        b.add_edge(a, n1, 1.0);
        b.add_edge(n1, n2, 1.0);
        b.add_edge(n2, d, 1.0);
        b.build()
    }

    /// Diamond with a short arm through B (cost 1+1) and a long arm through
    /// C (cost 2+2):
    ///
    /// ```text
    ///       B
    ///      / \
    ///     A   D
    ///      \ /
    ///       C
    /// ```
    pub fn diamond_graph() -> RoadGraph {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node("A", Some(Point::new(0.0, 0.0)));
        let nb = b.add_node("B", Some(Point::new(1.0, 0.0)));
        let nc = b.add_node("C", Some(Point::new(1.0, 1.0)));
        let d = b.add_node("D", Some(Point::new(2.0, 0.0)));
        b.add_edge(a, nb, 1.0);
        b.add_edge(nb, d, 1.0);
        b.add_edge(a, nc, 2.0);
        b.add_edge(nc, d, 2.0);
        b.build()
    }
}

// ── Builder & graph structure ─────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use tsim_core::{AgentKind, Point};
    use crate::RoadGraphBuilder;

    #[test]
    fn empty_build() {
        let graph = RoadGraphBuilder::new().build();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn name_interning_round_trip() {
        let graph = super::helpers::line_graph();
        for name in ["A", "B", "C", "D"] {
            let id = graph.node_id(name).unwrap();
            assert_eq!(graph.node_name(id), name);
        }
        assert!(graph.node_id("Z").is_none());
        assert!(matches!(
            graph.require_node("Z"),
            Err(crate::GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn csr_out_edges() {
        let graph = super::helpers::diamond_graph();
        let a = graph.node_id("A").unwrap();
        let d = graph.node_id("D").unwrap();

        assert_eq!(graph.out_degree(a), 2);
        assert_eq!(graph.out_degree(d), 0);

        // Every outgoing edge from A has A as its source.
        for e in graph.out_edges(a) {
            assert_eq!(graph.edge_from(e), a);
        }
    }

    #[test]
    fn edge_between_lookup() {
        let graph = super::helpers::diamond_graph();
        let a = graph.node_id("A").unwrap();
        let b = graph.node_id("B").unwrap();
        let d = graph.node_id("D").unwrap();

        let e = graph.edge_between(a, b).unwrap();
        assert_eq!(graph.edge_endpoints(e), (a, b));
        // The diamond has no direct A → D edge.
        assert!(graph.edge_between(a, d).is_none());
        assert!(matches!(
            graph.require_edge(a, d),
            Err(crate::GraphError::UnknownEdge { .. })
        ));
        // Edges are directed: B → A does not exist.
        assert!(graph.edge_between(b, a).is_none());
    }

    #[test]
    fn per_kind_costs() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node("X", None);
        let y = b.add_node("Y", None);
        b.add_edge_per_kind(x, y, [1.0, 2.0, 3.0]);
        let graph = b.build();

        let e = graph.edge_between(x, y).unwrap();
        assert_eq!(graph.base_cost(e, AgentKind::Car), 1.0);
        assert_eq!(graph.base_cost(e, AgentKind::Bike), 2.0);
        assert_eq!(graph.base_cost(e, AgentKind::Pedestrian), 3.0);
    }

    #[test]
    fn lex_rank_follows_name_order() {
        // Intern out of alphabetical order; ranks must still be alphabetical.
        let mut b = RoadGraphBuilder::new();
        let z = b.add_node("zulu", None);
        let a = b.add_node("alpha", None);
        let m = b.add_node("mike", None);
        b.add_road(z, a, 1.0);
        b.add_road(a, m, 1.0);
        let graph = b.build();

        assert!(graph.lex_rank(a) < graph.lex_rank(m));
        assert!(graph.lex_rank(m) < graph.lex_rank(z));
    }

    #[test]
    fn missing_coordinates_allowed() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node("X", None);
        let y = b.add_node("Y", Some(Point::new(1.0, 1.0)));
        b.add_edge(x, y, 1.0);
        let graph = b.build();
        assert!(graph.node_pos(x).is_none());
        assert!(graph.node_pos(y).is_some());
    }
}

// ── Weight field ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod weights {
    use tsim_core::{EdgeId, SimRng};
    use crate::{Severity, WeightField, BLOCKED_MULTIPLIER, HOTSPOT_CEILING};

    #[test]
    fn defaults_to_one() {
        let field = WeightField::new(4);
        for (_, m) in field.iter() {
            assert_eq!(m, 1.0);
        }
    }

    #[test]
    fn incident_round_trip_exact() {
        let mut field = WeightField::new(1);
        let e = EdgeId(0);

        field.apply_incident(e, Severity::Moderate);
        assert_eq!(field.multiplier(e), 4.0);
        field.clear_incident(e, Severity::Moderate);
        assert_eq!(field.multiplier(e), 1.0);
    }

    #[test]
    fn incidents_compose_multiplicatively() {
        let mut field = WeightField::new(1);
        let e = EdgeId(0);

        field.apply_incident(e, Severity::Minor);
        field.apply_incident(e, Severity::Severe);
        assert_eq!(field.multiplier(e), 20.0);

        // Clearing in any order restores the prior value.
        field.clear_incident(e, Severity::Minor);
        field.clear_incident(e, Severity::Severe);
        assert!((field.multiplier(e) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn severity_factors_exact() {
        assert_eq!(Severity::Minor.factor(), 2.0);
        assert_eq!(Severity::Moderate.factor(), 4.0);
        assert_eq!(Severity::Severe.factor(), 10.0);
    }

    #[test]
    fn block_overrides_and_unblock_restores() {
        let mut field = WeightField::new(1);
        let e = EdgeId(0);

        field.apply_incident(e, Severity::Minor);
        field.block(e);
        assert_eq!(field.multiplier(e), BLOCKED_MULTIPLIER);
        field.unblock(e);
        assert_eq!(field.multiplier(e), 1.0);
    }

    #[test]
    fn drift_bounded_and_growing() {
        // Single hotspot edge under full congestion for 10 000 samples:
        // the multiplier must never exceed the ceiling, and must have risen
        // above neutral almost immediately.
        let mut field = WeightField::new(1);
        let mut rng = SimRng::new(7);
        let e = EdgeId(0);

        for step in 0..10_000 {
            field.hotspot_drift(e, 1.0, &mut rng);
            assert!(
                field.multiplier(e) <= HOTSPOT_CEILING + 1e-9,
                "ceiling exceeded at step {step}: {}",
                field.multiplier(e)
            );
        }
        assert!(field.multiplier(e) > 1.0);
    }

    #[test]
    fn drift_scales_with_congestion_factor() {
        let mut field = WeightField::new(2);
        let mut rng = SimRng::new(7);

        // With zero congestion the penalty term vanishes: candidate == mult,
        // so the EMA is a fixed point.
        field.hotspot_drift(EdgeId(0), 0.0, &mut rng);
        assert_eq!(field.multiplier(EdgeId(0)), 1.0);

        field.hotspot_drift(EdgeId(1), 1.0, &mut rng);
        assert!(field.multiplier(EdgeId(1)) > 1.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut field = WeightField::new(3);
        field.apply_incident(EdgeId(0), Severity::Severe);
        field.block(EdgeId(2));
        field.reset();
        for (_, m) in field.iter() {
            assert_eq!(m, 1.0);
        }
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use tsim_core::{AgentKind, Point};
    use crate::{AStarRouter, GraphError, RoadGraphBuilder, Router, Severity, WeightField};

    #[test]
    fn trivial_same_node() {
        let graph = super::helpers::line_graph();
        let a = graph.node_id("A").unwrap();
        let weights = WeightField::new(graph.edge_count());

        let route = AStarRouter.route(&graph, &weights, a, a, AgentKind::Car).unwrap();
        assert!(route.is_trivial());
        assert_eq!(route.nodes, vec![a]);
        assert_eq!(route.total_cost, 0.0);
    }

    #[test]
    fn line_path_in_order() {
        let graph = super::helpers::line_graph();
        let weights = WeightField::new(graph.edge_count());
        let a = graph.node_id("A").unwrap();
        let d = graph.node_id("D").unwrap();

        let route = AStarRouter.route(&graph, &weights, a, d, AgentKind::Car).unwrap();
        let names: Vec<&str> = route.nodes.iter().map(|&n| graph.node_name(n)).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
        assert_eq!(route.total_cost, 3.0);
    }

    #[test]
    fn prefers_cheap_arm() {
        let graph = super::helpers::diamond_graph();
        let weights = WeightField::new(graph.edge_count());
        let a = graph.node_id("A").unwrap();
        let d = graph.node_id("D").unwrap();

        let route = AStarRouter.route(&graph, &weights, a, d, AgentKind::Car).unwrap();
        let names: Vec<&str> = route.nodes.iter().map(|&n| graph.node_name(n)).collect();
        assert_eq!(names, ["A", "B", "D"]);
        assert_eq!(route.total_cost, 2.0);
    }

    #[test]
    fn multiplier_diverts_to_long_arm() {
        let graph = super::helpers::diamond_graph();
        let mut weights = WeightField::new(graph.edge_count());
        let a = graph.node_id("A").unwrap();
        let b = graph.node_id("B").unwrap();
        let d = graph.node_id("D").unwrap();

        // A severe accident on B → D makes the short arm cost 1 + 10 = 11,
        // so the long arm (cost 4) wins.
        let bd = graph.edge_between(b, d).unwrap();
        weights.apply_incident(bd, Severity::Severe);

        let route = AStarRouter.route(&graph, &weights, a, d, AgentKind::Car).unwrap();
        let names: Vec<&str> = route.nodes.iter().map(|&n| graph.node_name(n)).collect();
        assert_eq!(names, ["A", "C", "D"]);
        assert_eq!(route.total_cost, 4.0);
    }

    #[test]
    fn blocked_edge_diverts() {
        let graph = super::helpers::diamond_graph();
        let mut weights = WeightField::new(graph.edge_count());
        let a = graph.node_id("A").unwrap();
        let b = graph.node_id("B").unwrap();
        let d = graph.node_id("D").unwrap();

        weights.block(graph.edge_between(b, d).unwrap());

        let route = AStarRouter.route(&graph, &weights, a, d, AgentKind::Car).unwrap();
        let names: Vec<&str> = route.nodes.iter().map(|&n| graph.node_name(n)).collect();
        assert_eq!(names, ["A", "C", "D"]);
    }

    #[test]
    fn equal_cost_tie_breaks_lexicographically() {
        // Two arms of identical cost and no coordinates (heuristic 0):
        // the route must go through the lexicographically smaller midpoint.
        let mut builder = RoadGraphBuilder::new();
        let a = builder.add_node("A", None);
        let q = builder.add_node("Q", None);
        let m = builder.add_node("M", None);
        let d = builder.add_node("D", None);
        builder.add_edge(a, q, 1.0);
        builder.add_edge(q, d, 1.0);
        builder.add_edge(a, m, 1.0);
        builder.add_edge(m, d, 1.0);
        let graph = builder.build();
        let weights = WeightField::new(graph.edge_count());

        let route = AStarRouter.route(&graph, &weights, a, d, AgentKind::Car).unwrap();
        let names: Vec<&str> = route.nodes.iter().map(|&n| graph.node_name(n)).collect();
        assert_eq!(names, ["A", "M", "D"]);
    }

    #[test]
    fn no_path_reported() {
        let mut builder = RoadGraphBuilder::new();
        let a = builder.add_node("A", Some(Point::new(0.0, 0.0)));
        let b = builder.add_node("B", Some(Point::new(1.0, 0.0)));
        // No edges at all.
        let graph = builder.build();
        let weights = WeightField::new(graph.edge_count());

        let result = AStarRouter.route(&graph, &weights, a, b, AgentKind::Car);
        assert!(matches!(result, Err(GraphError::NoPath { .. })));
    }

    #[test]
    fn one_way_blocks_return() {
        let mut builder = RoadGraphBuilder::new();
        let a = builder.add_node("A", None);
        let b = builder.add_node("B", None);
        builder.add_edge(a, b, 1.0);
        let graph = builder.build();
        let weights = WeightField::new(graph.edge_count());

        assert!(AStarRouter.route(&graph, &weights, a, b, AgentKind::Car).is_ok());
        assert!(AStarRouter.route(&graph, &weights, b, a, AgentKind::Car).is_err());
    }

    #[test]
    fn missing_coordinates_fall_back_to_zero_heuristic() {
        // Same line topology but without coordinates: routing still works.
        let mut builder = RoadGraphBuilder::new();
        let a = builder.add_node("A", None);
        let b = builder.add_node("B", None);
        let c = builder.add_node("C", None);
        builder.add_edge(a, b, 1.0);
        builder.add_edge(b, c, 1.0);
        let graph = builder.build();
        let weights = WeightField::new(graph.edge_count());

        let route = AStarRouter.route(&graph, &weights, a, c, AgentKind::Car).unwrap();
        assert_eq!(route.total_cost, 2.0);
        assert_eq!(route.nodes.len(), 3);
    }

    #[test]
    fn per_kind_costs_steer_modes_apart() {
        // Car prefers the X arm, pedestrian the Y arm.
        let mut builder = RoadGraphBuilder::new();
        let a = builder.add_node("A", None);
        let x = builder.add_node("X", None);
        let y = builder.add_node("Y", None);
        let d = builder.add_node("D", None);
        builder.add_edge_per_kind(a, x, [1.0, 1.0, 9.0]);
        builder.add_edge_per_kind(x, d, [1.0, 1.0, 9.0]);
        builder.add_edge_per_kind(a, y, [5.0, 5.0, 1.0]);
        builder.add_edge_per_kind(y, d, [5.0, 5.0, 1.0]);
        let graph = builder.build();
        let weights = WeightField::new(graph.edge_count());

        let car = AStarRouter.route(&graph, &weights, a, d, AgentKind::Car).unwrap();
        let walk = AStarRouter.route(&graph, &weights, a, d, AgentKind::Pedestrian).unwrap();
        assert_eq!(car.nodes[1], x);
        assert_eq!(walk.nodes[1], y);
    }
}
