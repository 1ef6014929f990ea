//! Persistent player progression: level, XP and archetype tendency.

use crate::archetype::ArchetypeVector;
use crate::scoring::StatXp;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BLEND_ALPHA: f64 = 0.15;

/// Field names follow the on-disk profile layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    #[serde(rename = "Level")]
    pub level: u32,
    #[serde(rename = "TotalXP")]
    pub total_xp: u32,
    #[serde(rename = "ClarityXP")]
    pub clarity_xp: u32,
    #[serde(rename = "IntegrationXP")]
    pub integration_xp: u32,
    #[serde(rename = "DepthXP")]
    pub depth_xp: u32,
    #[serde(rename = "AdaptabilityXP")]
    pub adaptability_xp: u32,
    /// Always on the probability simplex after any mutation.
    #[serde(flatten)]
    pub archetype: ArchetypeVector,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            level: 1,
            total_xp: 0,
            clarity_xp: 0,
            integration_xp: 0,
            depth_xp: 0,
            adaptability_xp: 0,
            archetype: ArchetypeVector::NEUTRAL,
        }
    }
}

impl PlayerProfile {
    /// Total XP needed to reach `target_level`: `100 + (target_level - 1)^2 * 60`.
    pub fn xp_required_for(target_level: u32) -> u32 {
        let d = target_level.saturating_sub(1);
        d.saturating_mul(d).saturating_mul(60).saturating_add(100)
    }

    pub fn next_level_xp(&self) -> u32 {
        Self::xp_required_for(self.level + 1)
    }

    /// Add XP and stat XP, then level up as many times as the total allows.
    /// Returns the number of levels gained.
    pub fn add_xp(&mut self, xp: u32, stats: StatXp) -> u32 {
        self.total_xp = self.total_xp.saturating_add(xp);
        self.clarity_xp = self.clarity_xp.saturating_add(stats.clarity);
        self.integration_xp = self.integration_xp.saturating_add(stats.integration);
        self.depth_xp = self.depth_xp.saturating_add(stats.depth);
        self.adaptability_xp = self.adaptability_xp.saturating_add(stats.adaptability);
        self.recompute_level()
    }

    fn recompute_level(&mut self) -> u32 {
        let before = self.level.max(1);
        self.level = before;
        // Saturated thresholds stop the ramp at u32::MAX
        while self.total_xp >= self.next_level_xp() && self.next_level_xp() < u32::MAX {
            self.level += 1;
        }
        self.level - before
    }

    /// Exponentially smooth the archetype toward a session's vector.
    pub fn blend_archetype(&mut self, session: &ArchetypeVector, alpha: f64) {
        self.archetype = self.archetype.lerp_toward(session, alpha);
        self.normalize_archetype();
    }

    /// Clamp negatives, then rescale to sum to 1 (neutral when empty).
    pub fn normalize_archetype(&mut self) {
        let clamped = ArchetypeVector::from_array(self.archetype.to_array().map(|v| {
            if v.is_finite() {
                v.max(0.0)
            } else {
                0.0
            }
        }));
        self.archetype = clamped.normalized();
    }

    pub fn class_name(&self) -> &'static str {
        self.archetype.class_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xp_required_for() {
        assert_eq!(PlayerProfile::xp_required_for(1), 100);
        assert_eq!(PlayerProfile::xp_required_for(2), 160);
        assert_eq!(PlayerProfile::xp_required_for(3), 340);
    }

    #[test]
    fn test_default_profile() {
        let profile = PlayerProfile::default();
        assert_eq!(profile.level, 1);
        assert_eq!(profile.total_xp, 0);
        assert_eq!(profile.archetype, ArchetypeVector::NEUTRAL);
        assert_eq!(profile.next_level_xp(), 160);
    }

    #[test]
    fn test_add_xp_levels_up() {
        let mut profile = PlayerProfile::default();
        assert_eq!(profile.add_xp(159, StatXp::default()), 0);
        assert_eq!(profile.level, 1);

        assert_eq!(profile.add_xp(1, StatXp::uniform(2)), 1);
        assert_eq!(profile.level, 2);
        assert_eq!(profile.clarity_xp, 2);
    }

    #[test]
    fn test_add_xp_can_jump_levels() {
        let mut profile = PlayerProfile::default();
        // level 4 needs 640, level 5 needs 1060
        let gained = profile.add_xp(700, StatXp::uniform(175));
        assert_eq!(gained, 3);
        assert_eq!(profile.level, 4);
        assert_eq!(profile.adaptability_xp, 175);
    }

    #[test]
    fn test_blend_moves_toward_session() {
        let mut profile = PlayerProfile::default();
        let session = ArchetypeVector::from_array([1.0, 0.0, 0.0, 0.0, 0.0]);
        profile.blend_archetype(&session, DEFAULT_BLEND_ALPHA);

        assert!((profile.archetype.initiator - 0.32).abs() < 1e-9);
        assert!((profile.archetype.listener - 0.17).abs() < 1e-9);
        assert!((profile.archetype.sum() - 1.0).abs() < 1e-9);
        assert_eq!(profile.class_name(), "Initiator");
    }

    #[test]
    fn test_normalize_recovers_from_degenerate_values() {
        let mut profile = PlayerProfile {
            archetype: ArchetypeVector::ZERO,
            ..PlayerProfile::default()
        };
        profile.normalize_archetype();
        assert_eq!(profile.archetype, ArchetypeVector::NEUTRAL);

        profile.archetype = ArchetypeVector::from_array([2.0, -1.0, 2.0, 0.0, f64::NAN]);
        profile.normalize_archetype();
        assert_eq!(profile.archetype.to_array(), [0.5, 0.0, 0.5, 0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn prop_level_is_monotonic(xps in prop::collection::vec(0u32..500, 1..40)) {
            let mut profile = PlayerProfile::default();
            let mut last_level = profile.level;
            for xp in xps {
                profile.add_xp(xp, StatXp::uniform(xp / 4));
                prop_assert!(profile.level >= last_level);
                prop_assert!(profile.total_xp < profile.next_level_xp());
                last_level = profile.level;
            }
        }

        #[test]
        fn prop_blend_stays_on_simplex(
            session in prop::array::uniform5(0.0f64..1.0),
            alpha in 0.01f64..1.0,
            rounds in 1usize..20,
        ) {
            let mut profile = PlayerProfile::default();
            let session = ArchetypeVector::from_array(session).normalized();
            for _ in 0..rounds {
                profile.blend_archetype(&session, alpha);
                prop_assert!((profile.archetype.sum() - 1.0).abs() < 1e-9);
                prop_assert!(profile.archetype.to_array().iter().all(|c| *c >= 0.0));
            }
        }
    }
}
