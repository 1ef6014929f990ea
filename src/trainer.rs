//! Free training session: one player against a partner (second human or AI).

use crate::archetype::ArchetypeVector;
use crate::logging;
use crate::memory::TokenMemory;
use crate::openai::ChatMessage;
use crate::profile::PlayerProfile;
use crate::roles::Role;
use crate::scoring::{ScoringEngine, ScoringResult, StatXp};
use crate::session::SessionReport;
use uuid::Uuid;

pub const PLAYER_SPEAKER: &str = "You";
pub const PARTNER_SPEAKER: &str = "Partner";

/// True for the sentinel that ends a session or match.
pub fn is_end_command(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("end")
}

/// Result of finishing a session and applying it to the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub turns: usize,
    pub total_ip: u32,
    pub archetype: ArchetypeVector,
    pub class_name: &'static str,
    pub xp_awarded: u32,
    pub level_before: u32,
    pub level_after: u32,
    pub total_xp: u32,
    pub next_level_xp: u32,
}

impl SessionSummary {
    pub fn levels_gained(&self) -> u32 {
        self.level_after.saturating_sub(self.level_before)
    }
}

pub struct TrainingSession {
    id: String,
    player_role: Role,
    partner_role: Role,
    report: SessionReport,
    memory: TokenMemory,
    player_last: String,
    partner_last: String,
    history: Vec<ChatMessage>,
}

impl TrainingSession {
    pub const DEFAULT_PLAYER_ROLE: Role = Role::Initiator;
    pub const DEFAULT_PARTNER_ROLE: Role = Role::Listener;

    pub fn new(player_role: Role, partner_role: Role, memory_capacity: usize) -> Self {
        let id = Uuid::new_v4().to_string();
        logging::log_session(
            Some(&id),
            &format!("Session started: player={} partner={}", player_role, partner_role),
        );
        Self {
            id,
            player_role,
            partner_role,
            report: SessionReport::new(),
            memory: TokenMemory::new(memory_capacity),
            player_last: String::new(),
            partner_last: String::new(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn player_role(&self) -> Role {
        self.player_role
    }

    pub fn partner_role(&self) -> Role {
        self.partner_role
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn player_last(&self) -> &str {
        &self.player_last
    }

    /// Prior exchanges as user/assistant messages, oldest first. Excludes the
    /// player's latest message so it can be appended by the caller.
    pub fn history(&self) -> &[ChatMessage] {
        match self.history.last() {
            Some(last) if last.role == "user" => &self.history[..self.history.len() - 1],
            _ => &self.history,
        }
    }

    /// Score the player's message against the partner's last message.
    pub fn score_player_turn(&mut self, engine: &mut ScoringEngine, text: &str) -> ScoringResult {
        let result = engine.score_turn(self.player_role, text, &self.partner_last, &self.memory);
        self.report.add(PLAYER_SPEAKER, text, self.player_role, &result);
        self.memory.observe(text);
        self.player_last = text.to_string();
        self.history.push(ChatMessage::user(text));
        result
    }

    /// Score the partner's reply against the player's last message.
    pub fn score_partner_turn(&mut self, engine: &mut ScoringEngine, text: &str) -> ScoringResult {
        let result = engine.score_turn(self.partner_role, text, &self.player_last, &self.memory);
        self.report.add(PARTNER_SPEAKER, text, self.partner_role, &result);
        self.memory.observe(text);
        self.partner_last = text.to_string();
        self.history.push(ChatMessage::assistant(text));
        result
    }

    /// Apply the session to the profile: XP equals total IP, split evenly
    /// into the four stats, and the archetype is blended toward this session.
    /// Persisting the profile is left to the caller.
    pub fn finish(self, profile: &mut PlayerProfile, alpha: f64) -> SessionSummary {
        let archetype = self.report.archetype_vector();
        let xp = self.report.total_ip();
        let level_before = profile.level;

        let gained = profile.add_xp(xp, StatXp::uniform(xp / 4));
        profile.blend_archetype(&archetype, alpha);

        logging::log_session(
            Some(&self.id),
            &format!(
                "Session finished: turns={} ip={} class={}",
                self.report.turns().len(),
                xp,
                archetype.class_name()
            ),
        );
        if gained > 0 {
            logging::log_profile(
                Some(&self.id),
                &format!("Level up: {} -> {}", level_before, profile.level),
            );
        }

        SessionSummary {
            session_id: self.id,
            turns: self.report.turns().len(),
            total_ip: xp,
            archetype,
            class_name: archetype.class_name(),
            xp_awarded: xp,
            level_before,
            level_after: profile.level,
            total_xp: profile.total_xp,
            next_level_xp: profile.next_level_xp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DEFAULT_BLEND_ALPHA;

    #[test]
    fn test_end_command() {
        assert!(is_end_command("end"));
        assert!(is_end_command("  END \n"));
        assert!(!is_end_command("the end"));
        assert!(!is_end_command(""));
    }

    #[test]
    fn test_turns_are_scored_against_the_other_side() {
        let mut engine = ScoringEngine::new();
        let mut session = TrainingSession::new(Role::Initiator, Role::Listener, 200);

        session.score_player_turn(&mut engine, "What do you like to cook?");
        let reply = session.score_partner_turn(&mut engine, "I like pasta because it's quick.");

        // Partner answered a question: IN and the answer bonus on OC.
        assert_eq!(reply.behavior.engagement, 1);
        assert!(reply.behavior.openness >= 2);

        let turns = session.report().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, PLAYER_SPEAKER);
        assert_eq!(turns[0].role, Role::Initiator);
        assert_eq!(turns[1].speaker, PARTNER_SPEAKER);
        assert_eq!(turns[1].role, Role::Listener);
    }

    #[test]
    fn test_history_excludes_pending_player_message() {
        let mut engine = ScoringEngine::new();
        let mut session = TrainingSession::new(Role::Initiator, Role::Listener, 200);

        session.score_player_turn(&mut engine, "hello there");
        assert!(session.history().is_empty());
        assert_eq!(session.player_last(), "hello there");

        session.score_partner_turn(&mut engine, "hi!");
        session.score_player_turn(&mut engine, "how are you?");
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatMessage::user("hello there"));
        assert_eq!(history[1], ChatMessage::assistant("hi!"));
    }

    #[test]
    fn test_finish_applies_xp_and_blend() {
        let mut engine = ScoringEngine::new();
        let mut session = TrainingSession::new(Role::Initiator, Role::Listener, 200);
        session.score_player_turn(
            &mut engine,
            "I think pizza is the best because it's versatile, and what do you think?",
        );
        let total_ip = session.report().total_ip();
        assert_eq!(total_ip, 10);

        let mut profile = PlayerProfile::default();
        let summary = session.finish(&mut profile, DEFAULT_BLEND_ALPHA);

        assert_eq!(summary.turns, 1);
        assert_eq!(summary.xp_awarded, 10);
        assert_eq!(profile.total_xp, 10);
        assert_eq!(profile.clarity_xp, 2);
        assert_eq!(profile.adaptability_xp, 2);
        assert_eq!(summary.level_before, 1);
        assert_eq!(summary.level_after, 1);
        assert_eq!(summary.levels_gained(), 0);
        assert_eq!(summary.next_level_xp, 160);
        assert!((profile.archetype.sum() - 1.0).abs() < 1e-9);
        assert!(profile.archetype.initiator > 0.2);
    }

    #[test]
    fn test_finish_crossing_threshold_gains_a_level() {
        let mut engine = ScoringEngine::new();
        let mut session = TrainingSession::new(Role::Initiator, Role::Listener, 200);
        session.score_player_turn(
            &mut engine,
            "I think pizza is the best because it's versatile, and what do you think?",
        );

        let mut profile = PlayerProfile {
            total_xp: 150,
            ..PlayerProfile::default()
        };
        let summary = session.finish(&mut profile, DEFAULT_BLEND_ALPHA);

        assert_eq!(summary.total_xp, 160);
        assert_eq!(summary.level_before, 1);
        assert_eq!(summary.level_after, 2);
        assert_eq!(summary.levels_gained(), 1);
        assert_eq!(summary.next_level_xp, 340);
    }

    #[test]
    fn test_empty_session_keeps_neutral_profile() {
        let session = TrainingSession::new(Role::Challenger, Role::Explorer, 200);
        let mut profile = PlayerProfile::default();
        let summary = session.finish(&mut profile, DEFAULT_BLEND_ALPHA);

        assert_eq!(summary.total_ip, 0);
        assert_eq!(summary.archetype, ArchetypeVector::NEUTRAL);
        assert_eq!(profile.level, 1);
        for (got, want) in profile
            .archetype
            .to_array()
            .iter()
            .zip(ArchetypeVector::NEUTRAL.to_array())
        {
            assert!((got - want).abs() < 1e-12);
        }
    }
}
