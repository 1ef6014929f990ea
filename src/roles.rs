//! Conversational roles and their data tables.
//!
//! Role-specific scoring is table driven: `ROLE_WEIGHTS` maps each role to a
//! weight per behavior dimension, `EVIDENCE_COEFFICIENTS` maps each archetype
//! to the behavior coefficients that feed its evidence scalar. Adding a role
//! means adding a variant plus one row in each table.

use crate::archetype::Archetype;
use crate::behavior::BehaviorVector;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Initiator,
    Listener,
    Challenger,
    Synthesizer,
    Explorer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Initiator,
        Role::Listener,
        Role::Challenger,
        Role::Synthesizer,
        Role::Explorer,
    ];

    /// Roles usable in Musical Chairs matches.
    pub const PLAYABLE: [Role; 3] = [Role::Initiator, Role::Listener, Role::Challenger];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Initiator => "Initiator",
            Role::Listener => "Listener",
            Role::Challenger => "Challenger",
            Role::Synthesizer => "Synthesizer",
            Role::Explorer => "Explorer",
        }
    }

    /// Position in `Role::ALL`, used to index the role tables.
    pub fn index(&self) -> usize {
        match self {
            Role::Initiator => 0,
            Role::Listener => 1,
            Role::Challenger => 2,
            Role::Synthesizer => 3,
            Role::Explorer => 4,
        }
    }

    pub fn is_playable(&self) -> bool {
        Role::PLAYABLE.contains(self)
    }

    /// The archetype a role earns its base evidence toward.
    pub fn archetype(&self) -> Archetype {
        Archetype::ALL[self.index()]
    }

    pub fn weights(&self) -> RoleWeights {
        ROLE_WEIGHTS[self.index()]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidRole(wanted.to_string()))
    }
}

/// Integer weight per behavior dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleWeights {
    pub openness: u32,
    pub engagement: u32,
    pub inquiry: u32,
    pub reflection: u32,
}

impl RoleWeights {
    const fn new(openness: u32, engagement: u32, inquiry: u32, reflection: u32) -> Self {
        Self {
            openness,
            engagement,
            inquiry,
            reflection,
        }
    }

    /// Dot product of the weights with a behavior vector.
    pub fn raw_score(&self, behavior: &BehaviorVector) -> u32 {
        u32::from(behavior.openness) * self.openness
            + u32::from(behavior.engagement) * self.engagement
            + u32::from(behavior.inquiry) * self.inquiry
            + u32::from(behavior.reflection) * self.reflection
    }
}

/// Indexed by `Role::index`. Columns are (OC, IN, IQ, RF).
pub const ROLE_WEIGHTS: [RoleWeights; 5] = [
    RoleWeights::new(3, 1, 2, 1), // Initiator
    RoleWeights::new(0, 3, 2, 3), // Listener
    RoleWeights::new(2, 1, 3, 1), // Challenger
    RoleWeights::new(1, 3, 1, 3), // Synthesizer
    RoleWeights::new(2, 1, 3, 1), // Explorer
];

/// Coefficients turning a behavior vector into one archetype's evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvidenceCoefficients {
    pub openness: f64,
    pub engagement: f64,
    pub inquiry: f64,
    pub reflection: f64,
}

impl EvidenceCoefficients {
    const fn new(openness: f64, engagement: f64, inquiry: f64, reflection: f64) -> Self {
        Self {
            openness,
            engagement,
            inquiry,
            reflection,
        }
    }

    pub fn apply(&self, behavior: &BehaviorVector) -> f64 {
        self.openness * f64::from(behavior.openness)
            + self.engagement * f64::from(behavior.engagement)
            + self.inquiry * f64::from(behavior.inquiry)
            + self.reflection * f64::from(behavior.reflection)
    }
}

/// Evidence earned by acting in the role matching an archetype.
pub const ROLE_EVIDENCE_BONUS: f64 = 1.0;

/// Indexed by `Archetype::index`. Columns are (OC, IN, IQ, RF).
pub const EVIDENCE_COEFFICIENTS: [EvidenceCoefficients; 5] = [
    EvidenceCoefficients::new(0.5, 0.0, 0.25, 0.0), // Initiator
    EvidenceCoefficients::new(0.0, 0.6, 0.0, 0.4),  // Listener
    EvidenceCoefficients::new(0.2, 0.0, 0.6, 0.0),  // Challenger
    EvidenceCoefficients::new(0.0, 0.4, 0.0, 0.7),  // Synthesizer
    EvidenceCoefficients::new(0.2, 0.0, 0.7, 0.0),  // Explorer
];
