//! Turn scoring: behavior vector -> role-weighted raw score -> Insight Points.
//!
//! Raw scores are normalized against the running mean raw score of the same
//! role, so a role with a low structural ceiling (Listener) earns Insight
//! Points at the same rate as one with a high ceiling. The running means live
//! in a [`RunningNormalizer`] owned by a [`ScoringEngine`]; whoever owns the
//! engine decides whether calibration is shared across sessions.

use crate::archetype::{Archetype, ArchetypeVector};
use crate::behavior::{self, BehaviorVector};
use crate::logging;
use crate::memory::TokenMemory;
use crate::roles::{Role, EVIDENCE_COEFFICIENTS, ROLE_EVIDENCE_BONUS};
use serde::{Deserialize, Serialize};

pub const MAX_NORM: f64 = 2.5;
pub const MAX_INSIGHT_POINTS: u32 = 30;

/// Per-role count and cumulative raw score.
#[derive(Debug, Clone, Default)]
pub struct RunningNormalizer {
    count: [u64; 5],
    sum: [u64; 5],
}

impl RunningNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw score and return the expected score for the role,
    /// including this observation. Never below 1.0.
    pub fn observe(&mut self, role: Role, raw: u32) -> f64 {
        let idx = role.index();
        self.count[idx] += 1;
        self.sum[idx] += u64::from(raw);
        self.expected(role)
    }

    /// `max(1, sum / count)` for the role (1.0 before any turn).
    pub fn expected(&self, role: Role) -> f64 {
        let idx = role.index();
        if self.count[idx] == 0 {
            return 1.0;
        }
        (self.sum[idx] as f64 / self.count[idx] as f64).max(1.0)
    }

    /// Unclamped mean raw score, 0.0 before any turn.
    pub fn mean_raw(&self, role: Role) -> f64 {
        let idx = role.index();
        if self.count[idx] == 0 {
            return 0.0;
        }
        self.sum[idx] as f64 / self.count[idx] as f64
    }

    pub fn turns_scored(&self, role: Role) -> u64 {
        self.count[role.index()]
    }
}

/// Stat XP earned by one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatXp {
    pub clarity: u32,
    pub integration: u32,
    pub depth: u32,
    pub adaptability: u32,
}

impl StatXp {
    pub fn from_behavior(b: &BehaviorVector) -> Self {
        let (oc, inn, iq, rf) = (
            u32::from(b.openness),
            u32::from(b.engagement),
            u32::from(b.inquiry),
            u32::from(b.reflection),
        );
        Self {
            clarity: 3 * (oc + iq),
            integration: 4 * inn,
            depth: 4 * rf,
            adaptability: 3 * (inn + iq),
        }
    }

    /// The same amount for every stat.
    pub fn uniform(amount: u32) -> Self {
        Self {
            clarity: amount,
            integration: amount,
            depth: amount,
            adaptability: amount,
        }
    }
}

/// Everything derived from one scored turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub behavior: BehaviorVector,
    pub raw: u32,
    /// raw / expected, clamped to [0, 2.5].
    pub norm: f64,
    /// round(10 * norm), clamped to [0, 30].
    pub insight_points: u32,
    pub stat_xp: StatXp,
    pub evidence: ArchetypeVector,
}

/// Evidence a behavior vector contributes to every archetype when acting in `role`.
pub fn archetype_evidence(role: Role, behavior: &BehaviorVector) -> ArchetypeVector {
    let role_archetype = role.archetype();
    let mut values = [0.0; 5];
    for archetype in Archetype::ALL {
        let bonus = if archetype == role_archetype {
            ROLE_EVIDENCE_BONUS
        } else {
            0.0
        };
        values[archetype.index()] = bonus + EVIDENCE_COEFFICIENTS[archetype.index()].apply(behavior);
    }
    ArchetypeVector::from_array(values)
}

/// Insight Points for a normalized score. Halves round to even.
pub fn insight_points(norm: f64) -> u32 {
    (10.0 * norm)
        .round_ties_even()
        .clamp(0.0, f64::from(MAX_INSIGHT_POINTS)) as u32
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    normalizer: RunningNormalizer,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalizer(&self) -> &RunningNormalizer {
        &self.normalizer
    }

    /// Score one turn. Updates the role's running mean, nothing else.
    pub fn score_turn(
        &mut self,
        role: Role,
        message: &str,
        partner_last: &str,
        memory: &TokenMemory,
    ) -> ScoringResult {
        let behavior = behavior::extract(message, partner_last, memory);
        let raw = role.weights().raw_score(&behavior);

        let expected = self.normalizer.observe(role, raw);
        let norm = (f64::from(raw) / expected).clamp(0.0, MAX_NORM);

        let result = ScoringResult {
            behavior,
            raw,
            norm,
            insight_points: insight_points(norm),
            stat_xp: StatXp::from_behavior(&behavior),
            evidence: archetype_evidence(role, &behavior),
        };

        logging::log_scoring(
            None,
            &format!(
                "role={} OC={} IN={} IQ={} RF={} raw={} expected={:.2} norm={:.2} ip={}",
                role,
                behavior.openness,
                behavior.engagement,
                behavior.inquiry,
                behavior.reflection,
                raw,
                expected,
                norm,
                result.insight_points
            ),
        );

        result
    }
}
