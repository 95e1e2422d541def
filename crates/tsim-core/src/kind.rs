//! Agent kind enum shared across all crates.
//!
//! Each kind carries its kinematic and footprint constants.  The router's
//! cost modes correspond one-to-one with these kinds, so `index()` doubles
//! as the column index into per-edge base-cost triples.

/// The kind of a mobile agent.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AgentKind {
    /// Private vehicle.
    Car,
    /// Bicycle.
    Bike,
    /// On foot.
    Pedestrian,
}

impl AgentKind {
    /// All kinds, in the order used for cost columns and mix draws.
    pub const ALL: [AgentKind; 3] = [AgentKind::Car, AgentKind::Bike, AgentKind::Pedestrian];

    /// Column index into per-edge base-cost triples.
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            AgentKind::Car        => 0,
            AgentKind::Bike       => 1,
            AgentKind::Pedestrian => 2,
        }
    }

    /// Free-flow speed in pixels per second.
    #[inline]
    pub fn max_speed(self) -> f64 {
        match self {
            AgentKind::Car        => 30.0,
            AgentKind::Bike       => 20.0,
            AgentKind::Pedestrian => 10.0,
        }
    }

    /// How much edge capacity one agent of this kind occupies.
    #[inline]
    pub fn capacity_usage(self) -> f64 {
        match self {
            AgentKind::Car        => 1.0,
            AgentKind::Bike       => 0.5,
            AgentKind::Pedestrian => 0.2,
        }
    }

    /// Acceleration magnitude in px/s².  Uniform across kinds.
    #[inline]
    pub fn acceleration(self) -> f64 {
        1.5
    }

    /// Human-readable label, used in external names and serialized payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Car        => "car",
            AgentKind::Bike       => "bicycle",
            AgentKind::Pedestrian => "pedestrian",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
