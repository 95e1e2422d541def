//! Unit tests for tsim-agent.

#[cfg(test)]
mod helpers {
    use tsim_core::{AgentId, AgentKind, NodeId};
    use crate::Agent;

    /// A car with a fresh 4-node path 0 → 1 → 2 → 3.
    pub fn car_on_path() -> Agent {
        let mut a = Agent::new(AgentId(1), AgentKind::Car, NodeId(0), NodeId(3), 0.0);
        a.set_path(vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
        a
    }
}

// ── Path cursor ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod path_cursor {
    use tsim_core::{AgentId, AgentKind, NodeId};
    use crate::{Agent, AgentStatus};

    #[test]
    fn set_path_rewinds_cursor() {
        let mut a = super::helpers::car_on_path();
        a.position_on_edge = 0.7;
        a.path_index = 1;

        a.set_path(vec![NodeId(1), NodeId(4), NodeId(3)]);
        assert_eq!(a.path_index, 0);
        assert_eq!(a.current(), NodeId(1));
        assert_eq!(a.next, Some(NodeId(4)));
        assert_eq!(a.position_on_edge, 0.0);
        assert_eq!(a.status, AgentStatus::Moving);
    }

    #[test]
    fn short_path_has_no_next() {
        let mut a = Agent::new(AgentId(1), AgentKind::Car, NodeId(0), NodeId(0), 0.0);
        a.set_path(vec![NodeId(0)]);
        assert_eq!(a.next, None);
        assert_eq!(a.status, AgentStatus::Waiting);
    }

    #[test]
    fn advance_walks_to_arrival() {
        let mut a = super::helpers::car_on_path();

        assert!(a.advance_node(1.0));
        assert_eq!(a.current(), NodeId(1));
        assert_eq!(a.next, Some(NodeId(2)));
        assert_eq!(a.position_on_edge, 0.0);
        assert_eq!(a.status, AgentStatus::Moving);

        assert!(a.advance_node(2.0));
        assert!(a.advance_node(3.0));
        assert_eq!(a.current(), NodeId(3));
        assert_eq!(a.next, None);
        assert_eq!(a.status, AgentStatus::Arrived);
        assert_eq!(a.arrival_time, Some(3.0));
        assert_eq!(a.path_index, a.path.len() - 1);

        // A further advance is a no-op and keeps the first arrival time.
        assert!(!a.advance_node(9.0));
        assert_eq!(a.arrival_time, Some(3.0));
    }

    #[test]
    fn advance_with_empty_path_arrives_in_place() {
        let mut a = Agent::new(AgentId(1), AgentKind::Bike, NodeId(0), NodeId(5), 0.0);
        assert!(!a.advance_node(1.0));
        assert_eq!(a.status, AgentStatus::Arrived);
    }

    #[test]
    fn current_edge_pairs_cursor_and_next() {
        let a = super::helpers::car_on_path();
        assert_eq!(a.current_edge(), Some((NodeId(0), NodeId(1))));
    }

    #[test]
    fn external_name_format() {
        let car = Agent::new(AgentId(1), AgentKind::Car, NodeId(0), NodeId(1), 0.0);
        let bike = Agent::new(AgentId(2), AgentKind::Bike, NodeId(0), NodeId(1), 0.0);
        let ped = Agent::new(AgentId(3), AgentKind::Pedestrian, NodeId(0), NodeId(1), 0.0);
        assert_eq!(car.name(), "car_1");
        assert_eq!(bike.name(), "bicycle_2");
        assert_eq!(ped.name(), "pedestrian_3");
    }
}

// ── Kinematics ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod kinematics {
    use crate::AgentStatus;

    #[test]
    fn accelerates_without_overshoot() {
        let mut a = super::helpers::car_on_path();
        a.target_speed = 30.0;

        // 1.5 px/s² × 1 s steps: 1.5, 3.0, …
        a.update_position(1.0, 1_000.0);
        assert_eq!(a.current_speed, 1.5);
        a.update_position(1.0, 1_000.0);
        assert_eq!(a.current_speed, 3.0);

        // From 29.5 the remaining gap (0.5) is below one step (1.5):
        // the slew clamps exactly onto the target.
        a.current_speed = 29.5;
        a.update_position(1.0, 1_000.0);
        assert_eq!(a.current_speed, 30.0);
    }

    #[test]
    fn decelerates_toward_lower_target() {
        let mut a = super::helpers::car_on_path();
        a.current_speed = 10.0;
        a.target_speed = 0.0;
        a.update_position(1.0, 1_000.0);
        assert_eq!(a.current_speed, 8.5);
    }

    #[test]
    fn position_clips_at_edge_end() {
        let mut a = super::helpers::car_on_path();
        a.current_speed = 50.0;
        a.target_speed = 50.0;

        // 50 px in 1 s on a 40 px edge overshoots: clipped to exactly 1.0.
        let reached = a.update_position(1.0, 40.0);
        assert!(reached);
        assert_eq!(a.position_on_edge, 1.0);
    }

    #[test]
    fn inert_unless_moving_or_stuck() {
        let mut a = super::helpers::car_on_path();
        a.status = AgentStatus::Arrived;
        a.current_speed = 30.0;
        assert!(!a.update_position(1.0, 10.0));
        assert_eq!(a.position_on_edge, 0.0);

        a.status = AgentStatus::Stuck;
        assert!(a.update_position(1.0, 10.0));
    }

    #[test]
    fn distance_accumulates() {
        let mut a = super::helpers::car_on_path();
        a.current_speed = 10.0;
        a.target_speed = 10.0;
        a.update_position(1.0, 1_000.0);
        a.update_position(1.0, 1_000.0);
        assert_eq!(a.total_distance, 20.0);
    }
}

// ── Gap keeping ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod gap_keeping {
    use crate::AgentStatus;

    #[test]
    fn close_leader_stops_follower() {
        let mut a = super::helpers::car_on_path();
        a.slow_for_leader(10.0);
        assert_eq!(a.target_speed, 0.0);
        assert_eq!(a.status, AgentStatus::Stuck);
    }

    #[test]
    fn mid_gap_scales_speed() {
        let mut a = super::helpers::car_on_path();
        a.slow_for_leader(45.0);
        assert_eq!(a.target_speed, 30.0 * 45.0 / 60.0);
        assert_eq!(a.status, AgentStatus::Stuck);
    }

    #[test]
    fn open_road_resumes() {
        let mut a = super::helpers::car_on_path();
        a.slow_for_leader(10.0);
        assert_eq!(a.status, AgentStatus::Stuck);

        a.slow_for_leader(100.0);
        assert_eq!(a.target_speed, 30.0);
        assert_eq!(a.status, AgentStatus::Moving);
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use tsim_core::{AgentKind, NodeId};
    use crate::{Agent, AgentRegistry, AgentStatus};

    fn spawn_car(reg: &mut AgentRegistry, path: Vec<NodeId>) -> tsim_core::AgentId {
        let id = reg.next_id();
        let mut a = Agent::new(id, AgentKind::Car, path[0], *path.last().unwrap(), 0.0);
        a.set_path(path);
        reg.add(a)
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let mut reg = AgentRegistry::new();
        let a = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        let b = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        assert_eq!(a.0, 1);
        assert_eq!(b.0, 2);
    }

    #[test]
    fn occupancy_rebuild_is_exact() {
        let mut reg = AgentRegistry::new();
        let a = spawn_car(&mut reg, vec![NodeId(0), NodeId(1), NodeId(2)]);
        let b = spawn_car(&mut reg, vec![NodeId(0), NodeId(1), NodeId(2)]);
        let c = spawn_car(&mut reg, vec![NodeId(1), NodeId(2)]);

        reg.update_occupancy();
        assert_eq!(reg.agents_on_edge(NodeId(0), NodeId(1)), &[a, b]);
        assert_eq!(reg.agents_on_edge(NodeId(1), NodeId(2)), &[c]);
        assert_eq!(reg.edge_agent_count(NodeId(2), NodeId(3)), 0);

        // Advancing an agent and rebuilding moves it wholesale.
        reg.get_mut(a).unwrap().advance_node(1.0);
        reg.update_occupancy();
        assert_eq!(reg.agents_on_edge(NodeId(0), NodeId(1)), &[b]);
        assert_eq!(reg.agents_on_edge(NodeId(1), NodeId(2)), &[a, c]);
    }

    #[test]
    fn arrived_agents_leave_occupancy() {
        let mut reg = AgentRegistry::new();
        let a = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        reg.get_mut(a).unwrap().advance_node(1.0);
        reg.mark_arrived(a);
        reg.update_occupancy();
        assert_eq!(reg.edge_agent_count(NodeId(0), NodeId(1)), 0);
        assert_eq!(reg.active_count(), 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_scrubs_occupancy() {
        let mut reg = AgentRegistry::new();
        let a = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        reg.update_occupancy();
        assert_eq!(reg.edge_agent_count(NodeId(0), NodeId(1)), 1);

        assert!(reg.remove(a));
        assert_eq!(reg.edge_agent_count(NodeId(0), NodeId(1)), 0);
        assert!(!reg.remove(a));
    }

    #[test]
    fn clear_arrived_reaps_only_arrived() {
        let mut reg = AgentRegistry::new();
        let a = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        let _b = spawn_car(&mut reg, vec![NodeId(0), NodeId(1), NodeId(2)]);
        reg.get_mut(a).unwrap().advance_node(1.0);
        reg.mark_arrived(a);

        assert_eq!(reg.clear_arrived(), 1);
        assert_eq!(reg.len(), 1);
        assert!(reg.get(a).is_none());
    }

    #[test]
    fn leader_gap_finds_nearest_ahead() {
        let mut reg = AgentRegistry::new();
        let follower = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        let near = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        let far = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);

        reg.get_mut(follower).unwrap().position_on_edge = 0.10;
        reg.get_mut(near).unwrap().position_on_edge = 0.30;
        reg.get_mut(far).unwrap().position_on_edge = 0.90;
        reg.update_occupancy();

        // 100 px edge: nearest leader is 20 px ahead.
        let gap = reg.leader_gap_px(follower, 100.0).unwrap();
        assert!((gap - 20.0).abs() < 1e-9);

        // The front agent has nobody ahead.
        assert!(reg.leader_gap_px(far, 100.0).is_none());
    }

    #[test]
    fn statistics_aggregate() {
        let mut reg = AgentRegistry::new();
        let a = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        let b = spawn_car(&mut reg, vec![NodeId(0), NodeId(1), NodeId(2)]);

        reg.get_mut(a).unwrap().advance_node(10.0);
        reg.mark_arrived(a);
        reg.get_mut(b).unwrap().note_reroute();
        reg.get_mut(b).unwrap().add_wait_time(4.0);

        let stats = reg.statistics();
        assert_eq!(stats.total_vehicles, 2);
        assert_eq!(stats.active_vehicles, 1);
        assert_eq!(stats.arrived_vehicles, 1);
        assert_eq!(stats.average_travel_time, 10.0);
        assert_eq!(stats.average_wait_time, 2.0);
        assert_eq!(stats.total_reroutes, 1);
        assert_eq!(stats.vehicles_by_type.car, 2);
    }

    #[test]
    fn reset_rewinds_id_counter() {
        let mut reg = AgentRegistry::new();
        spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        reg.reset();

        assert!(reg.is_empty());
        assert_eq!(reg.active_count(), 0);
        let id = spawn_car(&mut reg, vec![NodeId(0), NodeId(1)]);
        assert_eq!(id.0, 1);
    }

    #[test]
    fn statuses_serialize_with_stable_labels() {
        assert_eq!(AgentStatus::Waiting.as_str(), "waiting");
        assert_eq!(AgentStatus::Rerouting.as_str(), "rerouting");
    }
}
