//! Live per-edge weight multipliers.
//!
//! Effective traversal cost during search is `base_cost(edge, kind) ×
//! multiplier(edge)`, and the kernel scales agent target speeds by the
//! inverse multiplier, so one table drives both routing and kinematics.
//!
//! Three effects mutate the table:
//!
//! - **Incidents** compose multiplicatively and are exactly reversible:
//!   applying then clearing a severity restores the prior value bit-for-bit.
//! - **Blocks** are a hard override to 100.0; while blocked, all other
//!   contributions are suppressed, and unblocking restores the default 1.0.
//! - **Hotspot drift** nudges selected edges with an exponentially smoothed
//!   congestion penalty, capped at [`HOTSPOT_CEILING`].  The cap applies to
//!   drift only, never to incident or block contributions.

use tsim_core::{EdgeId, SimRng};

/// Multiplier forced onto an edge while it is blocked.
pub const BLOCKED_MULTIPLIER: f64 = 100.0;

/// Upper bound on the multiplier reachable through hotspot drift alone.
pub const HOTSPOT_CEILING: f64 = 5.0;

/// Smoothing factor for hotspot drift (weight of the new candidate).
const DRIFT_ALPHA: f64 = 0.3;

// ── Severity ──────────────────────────────────────────────────────────────────

/// How badly an accident obstructs its edge.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    /// All severities, in the order used for uniform draws.
    pub const ALL: [Severity; 3] = [Severity::Minor, Severity::Moderate, Severity::Severe];

    /// Multiplier contribution of an accident of this severity.
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            Severity::Minor    => 2.0,
            Severity::Moderate => 4.0,
            Severity::Severe   => 10.0,
        }
    }

    /// Serialized label.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Minor    => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe   => "severe",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── WeightField ───────────────────────────────────────────────────────────────

/// Per-edge multiplier table, indexed by `EdgeId`, default 1.0 everywhere.
///
/// Lives for the lifetime of the kernel; never re-created, only mutated
/// (and [`reset`](Self::reset) on simulation reset).
pub struct WeightField {
    mult: Vec<f64>,
}

impl WeightField {
    /// All multipliers start at the neutral 1.0.
    pub fn new(edge_count: usize) -> Self {
        Self { mult: vec![1.0; edge_count] }
    }

    /// Restore every multiplier to the neutral 1.0.
    pub fn reset(&mut self) {
        self.mult.fill(1.0);
    }

    pub fn edge_count(&self) -> usize {
        self.mult.len()
    }

    /// Current multiplier of `edge`.
    #[inline]
    pub fn multiplier(&self, edge: EdgeId) -> f64 {
        self.mult[edge.index()]
    }

    /// Overwrite the multiplier of `edge`.  Exposed for traffic analyzers
    /// that maintain density-derived contributions on top of the field.
    #[inline]
    pub fn set(&mut self, edge: EdgeId, value: f64) {
        self.mult[edge.index()] = value;
    }

    /// Compose an accident's contribution onto `edge`.
    pub fn apply_incident(&mut self, edge: EdgeId, severity: Severity) {
        self.mult[edge.index()] *= severity.factor();
    }

    /// Remove an accident's contribution from `edge` — the exact inverse of
    /// [`apply_incident`](Self::apply_incident).
    pub fn clear_incident(&mut self, edge: EdgeId, severity: Severity) {
        self.mult[edge.index()] /= severity.factor();
    }

    /// Force the blocked override onto `edge`.
    pub fn block(&mut self, edge: EdgeId) {
        self.mult[edge.index()] = BLOCKED_MULTIPLIER;
    }

    /// Lift the blocked override, restoring the neutral multiplier.
    pub fn unblock(&mut self, edge: EdgeId) {
        self.mult[edge.index()] = 1.0;
    }

    /// One smoothed congestion step on a hotspot edge.
    ///
    /// `candidate = min(mult · (1 + congestion_factor · U(0.5, 2.0)), 5.0)`,
    /// then `mult ← 0.7·mult + 0.3·candidate`.  The caller samples this only
    /// every 30th tick; the EMA keeps route costs from oscillating between
    /// samples.
    pub fn hotspot_drift(&mut self, edge: EdgeId, congestion_factor: f64, rng: &mut SimRng) {
        let current = self.mult[edge.index()];
        let time_penalty = 1.0 + congestion_factor * rng.gen_range(0.5..2.0);
        let candidate = (current * time_penalty).min(HOTSPOT_CEILING);
        self.mult[edge.index()] = current * (1.0 - DRIFT_ALPHA) + candidate * DRIFT_ALPHA;
    }

    /// Iterator over `(edge, multiplier)` pairs in edge order.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, f64)> + '_ {
        self.mult
            .iter()
            .enumerate()
            .map(|(i, &m)| (EdgeId(i as u32), m))
    }
}
