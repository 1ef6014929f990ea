//! Per-session turn log and evidence accumulator.

use crate::archetype::ArchetypeVector;
use crate::behavior::BehaviorVector;
use crate::roles::Role;
use crate::scoring::{ScoringResult, StatXp};
use serde::{Deserialize, Serialize};

/// Snapshot of one scored turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub speaker: String,
    pub text: String,
    pub role: Role,
    pub behavior: BehaviorVector,
    pub raw: u32,
    pub norm: f64,
    pub insight_points: u32,
    pub stat_xp: StatXp,
    pub evidence: ArchetypeVector,
}

/// Append-only record of a session. Never merged across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    turns: Vec<TurnRecord>,
    total_ip: u32,
    evidence: ArchetypeVector,
}

impl Default for SessionReport {
    fn default() -> Self {
        Self {
            turns: Vec::new(),
            total_ip: 0,
            evidence: ArchetypeVector::ZERO,
        }
    }
}

impl SessionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, speaker: &str, text: &str, role: Role, result: &ScoringResult) {
        self.turns.push(TurnRecord {
            speaker: speaker.to_string(),
            text: text.to_string(),
            role,
            behavior: result.behavior,
            raw: result.raw,
            norm: result.norm,
            insight_points: result.insight_points,
            stat_xp: result.stat_xp,
            evidence: result.evidence,
        });

        self.total_ip += result.insight_points;
        self.evidence.accumulate(&result.evidence);
    }

    /// Turns in insertion order.
    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&TurnRecord> {
        self.turns.last()
    }

    pub fn total_ip(&self) -> u32 {
        self.total_ip
    }

    /// Raw evidence sums.
    pub fn evidence_sums(&self) -> &ArchetypeVector {
        &self.evidence
    }

    /// Evidence sums normalized to 1, neutral when there is no evidence.
    pub fn archetype_vector(&self) -> ArchetypeVector {
        self.evidence.normalized()
    }
}
