//! Archetype vectors and class naming.

use serde::{Deserialize, Serialize};
use std::fmt;

const SUM_EPSILON: f64 = 1e-9;
const NEUTRAL_COMPONENT: f64 = 0.2;
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Initiator,
    Listener,
    Challenger,
    Synthesizer,
    Explorer,
}

impl Archetype {
    /// Fixed scan order used for tie-breaking.
    pub const ALL: [Archetype; 5] = [
        Archetype::Initiator,
        Archetype::Listener,
        Archetype::Challenger,
        Archetype::Synthesizer,
        Archetype::Explorer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Initiator => "Initiator",
            Archetype::Listener => "Listener",
            Archetype::Challenger => "Challenger",
            Archetype::Synthesizer => "Synthesizer",
            Archetype::Explorer => "Explorer",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Archetype::Initiator => 0,
            Archetype::Listener => 1,
            Archetype::Challenger => 2,
            Archetype::Synthesizer => 3,
            Archetype::Explorer => 4,
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named hybrids for an unordered pair of top archetypes.
const HYBRIDS: [(Archetype, Archetype, &str); 5] = [
    (Archetype::Initiator, Archetype::Explorer, "Trailblazer"),
    (Archetype::Listener, Archetype::Synthesizer, "Harmonizer"),
    (Archetype::Challenger, Archetype::Synthesizer, "Dialectician"),
    (Archetype::Explorer, Archetype::Listener, "Curious Companion"),
    (Archetype::Initiator, Archetype::Challenger, "Provocateur"),
];

/// Five archetype scalars. Used both for raw evidence sums and for
/// normalized tendencies (components summing to 1).
///
/// Serialized field names match the persisted profile layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeVector {
    #[serde(rename = "Initiator")]
    pub initiator: f64,
    #[serde(rename = "Listener")]
    pub listener: f64,
    #[serde(rename = "Challenger")]
    pub challenger: f64,
    #[serde(rename = "Synthesizer")]
    pub synthesizer: f64,
    #[serde(rename = "Explorer")]
    pub explorer: f64,
}

impl Default for ArchetypeVector {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl ArchetypeVector {
    pub const NEUTRAL: ArchetypeVector = ArchetypeVector {
        initiator: NEUTRAL_COMPONENT,
        listener: NEUTRAL_COMPONENT,
        challenger: NEUTRAL_COMPONENT,
        synthesizer: NEUTRAL_COMPONENT,
        explorer: NEUTRAL_COMPONENT,
    };

    pub const ZERO: ArchetypeVector = ArchetypeVector {
        initiator: 0.0,
        listener: 0.0,
        challenger: 0.0,
        synthesizer: 0.0,
        explorer: 0.0,
    };

    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            initiator: values[0],
            listener: values[1],
            challenger: values[2],
            synthesizer: values[3],
            explorer: values[4],
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [
            self.initiator,
            self.listener,
            self.challenger,
            self.synthesizer,
            self.explorer,
        ]
    }

    pub fn get(&self, archetype: Archetype) -> f64 {
        self.to_array()[archetype.index()]
    }

    pub fn sum(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// Component-wise accumulation.
    pub fn accumulate(&mut self, other: &ArchetypeVector) {
        self.initiator += other.initiator;
        self.listener += other.listener;
        self.challenger += other.challenger;
        self.synthesizer += other.synthesizer;
        self.explorer += other.explorer;
    }

    /// Scale to sum to 1. A vector with (near) zero mass becomes `NEUTRAL`.
    pub fn normalized(&self) -> ArchetypeVector {
        let sum = self.sum();
        if sum <= SUM_EPSILON {
            return Self::NEUTRAL;
        }
        Self::from_array(self.to_array().map(|v| v / sum))
    }

    /// Move every component `alpha` of the way toward `target`.
    pub fn lerp_toward(&self, target: &ArchetypeVector, alpha: f64) -> ArchetypeVector {
        let from = self.to_array();
        let to = target.to_array();
        let mut out = [0.0; 5];
        for i in 0..5 {
            out[i] = from[i] + alpha * (to[i] - from[i]);
        }
        Self::from_array(out)
    }

    /// The two largest components. Ties go to the earlier archetype in
    /// `Archetype::ALL` for both places (strictly-greater comparisons).
    pub fn top_two(&self) -> (Archetype, Archetype) {
        let v = self.to_array();
        let (mut top1, mut top2) = (0usize, 1usize);

        for k in 0..v.len() {
            if v[k] > v[top1] {
                top2 = top1;
                top1 = k;
            } else if k != top1 && v[k] > v[top2] {
                top2 = k;
            }
        }

        (Archetype::ALL[top1], Archetype::ALL[top2])
    }

    pub fn dominant(&self) -> Archetype {
        self.top_two().0
    }

    /// Class label for this vector, see [`class_name`].
    pub fn class_name(&self) -> &'static str {
        class_name(self)
    }

    /// `[#####...............]` bar for one component, clamped to [0, 1].
    pub fn bar(&self, archetype: Archetype) -> String {
        let value = self.get(archetype).clamp(0.0, 1.0);
        let fill = (BAR_WIDTH as f64 * value).round() as usize;
        format!("[{}{}]", "#".repeat(fill), ".".repeat(BAR_WIDTH - fill))
    }
}

/// Hybrid name for the top two archetypes, or the dominant archetype's
/// own name when the pair has no hybrid.
pub fn class_name(vector: &ArchetypeVector) -> &'static str {
    let (a, b) = vector.top_two();
    HYBRIDS
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, name)| *name)
        .unwrap_or_else(|| a.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(values: [f64; 5]) -> ArchetypeVector {
        ArchetypeVector::from_array(values)
    }

    #[test]
    fn test_hybrid_names() {
        assert_eq!(class_name(&v([0.4, 0.1, 0.1, 0.1, 0.3])), "Trailblazer");
        assert_eq!(class_name(&v([0.1, 0.3, 0.1, 0.4, 0.1])), "Harmonizer");
        assert_eq!(class_name(&v([0.1, 0.1, 0.4, 0.3, 0.1])), "Dialectician");
        assert_eq!(class_name(&v([0.1, 0.3, 0.1, 0.1, 0.4])), "Curious Companion");
        assert_eq!(class_name(&v([0.3, 0.1, 0.4, 0.1, 0.1])), "Provocateur");
    }

    #[test]
    fn test_non_hybrid_pair_uses_dominant_name() {
        assert_eq!(class_name(&v([0.1, 0.5, 0.3, 0.05, 0.05])), "Listener");
        assert_eq!(class_name(&v([0.1, 0.1, 0.1, 0.5, 0.2])), "Synthesizer");
    }

    #[test]
    fn test_neutral_vector_prefers_earliest() {
        assert_eq!(
            ArchetypeVector::NEUTRAL.top_two(),
            (Archetype::Initiator, Archetype::Listener)
        );
        assert_eq!(class_name(&ArchetypeVector::NEUTRAL), "Initiator");
    }

    #[test]
    fn test_tie_for_second_goes_to_earlier() {
        let (a, b) = v([0.4, 0.15, 0.15, 0.15, 0.15]).top_two();
        assert_eq!(a, Archetype::Initiator);
        assert_eq!(b, Archetype::Listener);

        let (a, b) = v([0.1, 0.1, 0.1, 0.35, 0.35]).top_two();
        assert_eq!(a, Archetype::Synthesizer);
        assert_eq!(b, Archetype::Explorer);
    }

    #[test]
    fn test_normalized_zero_is_neutral() {
        assert_eq!(ArchetypeVector::ZERO.normalized(), ArchetypeVector::NEUTRAL);
    }

    #[test]
    fn test_bar_rendering() {
        let vector = v([1.0, 0.5, 0.0, 2.0, 0.0]);
        assert_eq!(vector.bar(Archetype::Initiator), format!("[{}]", "#".repeat(20)));
        assert_eq!(vector.bar(Archetype::Challenger), format!("[{}]", ".".repeat(20)));
        assert_eq!(
            vector.bar(Archetype::Listener),
            format!("[{}{}]", "#".repeat(10), ".".repeat(10))
        );
        assert_eq!(vector.bar(Archetype::Synthesizer), format!("[{}]", "#".repeat(20)));
    }

    proptest! {
        #[test]
        fn prop_normalized_is_on_simplex(values in prop::array::uniform5(0.0f64..10.0)) {
            let n = v(values).normalized();
            prop_assert!((n.sum() - 1.0).abs() < 1e-9);
            prop_assert!(n.to_array().iter().all(|c| *c >= 0.0));
        }
    }
}
