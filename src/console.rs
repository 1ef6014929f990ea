//! Line-oriented shells for the trainer and Musical Chairs modes.
//!
//! Both shells read one line per prompt and treat end of input like `end`.
//! They are generic over the reader and writer so they can be driven from a
//! script as well as a terminal.

use crate::archetype::{Archetype, ArchetypeVector};
use crate::config::GameConfig;
use crate::db::{self, ProfileStore};
use crate::error::Result;
use crate::musical_chairs::{
    Advance, DecidedBy, MatchController, MatchResult, RoundSummary, TurnEvent, PLAYER_COUNT,
};
use crate::partner::{Partner, ReplySource};
use crate::profile::PlayerProfile;
use crate::roles::Role;
use crate::scoring::{ScoringEngine, ScoringResult};
use crate::trainer::{is_end_command, SessionSummary, TrainingSession};
use rand::Rng;
use std::io::Write;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

const RHYTHM_WIDTH: usize = 24;
const RHYTHM_BEAT_MS: u64 = 180;
const DEFAULT_MUSIC_MS: RangeInclusive<u64> = 2500..=6500;

/// `  => You Role=Initiator Beh[OC=2,IN=0,IQ=1,RF=0] Raw=8 Norm=1.00 IP=+10`
pub fn format_turn_line(who: &str, role: Role, r: &ScoringResult) -> String {
    format!(
        "  => {} Role={} Beh[OC={},IN={},IQ={},RF={}] Raw={} Norm={:.2} IP=+{}",
        who,
        role,
        r.behavior.openness,
        r.behavior.engagement,
        r.behavior.inquiry,
        r.behavior.reflection,
        r.raw,
        r.norm,
        r.insight_points
    )
}

/// One line per archetype: name, value and bar.
pub fn format_archetype_wheel(vector: &ArchetypeVector) -> Vec<String> {
    Archetype::ALL
        .iter()
        .map(|a| {
            format!(
                "  {:<12} {:.2}  {}",
                format!("{}:", a.name()),
                vector.get(*a),
                vector.bar(*a)
            )
        })
        .collect()
}

fn describe_decision(decided_by: DecidedBy) -> &'static str {
    match decided_by {
        DecidedBy::InsightPoints => "higher round IP",
        DecidedBy::AverageNorm => "tie-breaker: higher average Norm",
        DecidedBy::CoinFlip => "tie-breaker: coin flip",
    }
}

pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
    music_ms: Option<RangeInclusive<u64>>,
}

impl<R: AsyncBufRead + Unpin, W: Write> Console<R, W> {
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
            music_ms: Some(DEFAULT_MUSIC_MS),
        }
    }

    /// Skip the rhythm cue between Musical Chairs rounds.
    pub fn without_music(mut self) -> Self {
        self.music_ms = None;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Print `label`, then read one line. `None` at end of input.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        Ok(self.lines.next_line().await?)
    }

    async fn read_or_default(&mut self, label: &str, default: &str) -> Result<String> {
        let line = self
            .prompt(&format!("{} [{}]: ", label, default))
            .await?
            .unwrap_or_default();
        let line = line.trim();
        Ok(if line.is_empty() {
            default.to_string()
        } else {
            line.to_string()
        })
    }

    async fn read_role(&mut self, label: &str, default: Role) -> Result<Role> {
        writeln!(
            self.out,
            "{} options: Initiator, Listener, Challenger, Synthesizer, Explorer",
            label
        )?;
        let input = self.read_or_default(label, default.as_str()).await?;
        match input.parse::<Role>() {
            Ok(role) => Ok(role),
            Err(e) => {
                writeln!(self.out, "{}; using default.", e)?;
                Ok(default)
            }
        }
    }

    // ============ Trainer ============

    /// Run one training session and apply it to the stored profile.
    pub async fn run_trainer<G: Rng>(
        &mut self,
        engine: &mut ScoringEngine,
        game: &GameConfig,
        store: &dyn ProfileStore,
        partner: &mut Partner<G>,
    ) -> Result<SessionSummary> {
        writeln!(self.out, "=== Chatter's Guild: Conversation Lab ===")?;
        let mut profile = db::load_or_create(store);
        writeln!(
            self.out,
            "Loaded Profile: Level {}, TotalXP {}",
            profile.level, profile.total_xp
        )?;
        writeln!(self.out, "Current Class: {}", profile.class_name())?;
        writeln!(self.out)?;

        writeln!(self.out, "Choose mode:")?;
        writeln!(self.out, "  1) You type BOTH sides (manual sparring)")?;
        writeln!(self.out, "  2) You vs AI partner")?;
        let mode = self.prompt("Enter 1 or 2: ").await?.unwrap_or_default();
        let manual = mode.trim() == "1";
        if !manual {
            if let Some(label) = partner.llm_label() {
                writeln!(self.out, "AI partner: {}", label)?;
            }
        }

        writeln!(self.out)?;
        writeln!(
            self.out,
            "Choose session roles (optional). Press Enter to accept defaults."
        )?;
        let player_role = self
            .read_role("Your role", TrainingSession::DEFAULT_PLAYER_ROLE)
            .await?;
        let partner_role = self
            .read_role("Partner role", TrainingSession::DEFAULT_PARTNER_ROLE)
            .await?;

        writeln!(self.out)?;
        writeln!(
            self.out,
            "Session Roles: You={}  Partner={}",
            player_role, partner_role
        )?;
        writeln!(self.out, "Type 'end' to finish session.\n")?;

        let mut session =
            TrainingSession::new(player_role, partner_role, game.token_memory_capacity);

        loop {
            let Some(you) = self.prompt("You: ").await? else {
                break;
            };
            if is_end_command(&you) {
                break;
            }
            let result = session.score_player_turn(engine, &you);
            writeln!(self.out, "{}", format_turn_line("You", player_role, &result))?;

            let reply = if manual {
                match self.prompt("Partner: ").await? {
                    Some(text) if !is_end_command(&text) => text,
                    _ => break,
                }
            } else {
                let reply = partner
                    .reply(
                        partner_role,
                        session.player_last(),
                        session.history(),
                        Some(session.id()),
                    )
                    .await;
                let tag = match reply.source {
                    ReplySource::Llm | ReplySource::Local => "",
                    ReplySource::Fallback => " (offline)",
                };
                writeln!(self.out, "Partner{}: {}", tag, reply.text)?;
                reply.text
            };

            let result = session.score_partner_turn(engine, &reply);
            writeln!(
                self.out,
                "{}",
                format_turn_line("Partner", partner_role, &result)
            )?;
            writeln!(
                self.out,
                "--- Session IP so far: {} ---\n",
                session.report().total_ip()
            )?;
        }

        self.print_session_report(&session)?;
        let summary = session.finish(&mut profile, game.blend_alpha);
        self.print_profile(&profile, &summary, store)?;
        Ok(summary)
    }

    fn print_session_report(&mut self, session: &TrainingSession) -> Result<()> {
        let report = session.report();
        let vector = report.archetype_vector();
        writeln!(self.out, "\n=== SESSION REPORT ===")?;
        writeln!(
            self.out,
            "Turns: {}  |  Total IP: {}",
            report.turns().len(),
            report.total_ip()
        )?;
        writeln!(self.out, "\nArchetype Evidence (this session):")?;
        for line in format_archetype_wheel(&vector) {
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out, "\nClass (session evidence): {}", vector.class_name())?;
        Ok(())
    }

    fn print_profile(
        &mut self,
        profile: &PlayerProfile,
        summary: &SessionSummary,
        store: &dyn ProfileStore,
    ) -> Result<()> {
        writeln!(self.out, "\n=== UPDATED PROFILE ===")?;
        writeln!(self.out, "XP earned: +{}", summary.xp_awarded)?;
        if summary.levels_gained() > 0 {
            writeln!(
                self.out,
                "Level up! +{} ({} -> {})",
                summary.levels_gained(),
                summary.level_before,
                summary.level_after
            )?;
        }
        writeln!(
            self.out,
            "Level: {}  | TotalXP: {}  | NextLevelXP: {}",
            profile.level,
            profile.total_xp,
            profile.next_level_xp()
        )?;
        writeln!(self.out, "Class: {}", profile.class_name())?;
        if db::save_profile(store, profile) {
            writeln!(self.out, "Saved to: {}", store.location())?;
        } else {
            writeln!(self.out, "Profile could not be saved; progress kept for this run only.")?;
        }
        Ok(())
    }

    // ============ Musical Chairs ============

    /// Run a full match. The persisted profile is not touched.
    pub async fn run_musical_chairs<G: Rng>(
        &mut self,
        engine: &mut ScoringEngine,
        game: &GameConfig,
        rng: G,
    ) -> Result<MatchResult> {
        writeln!(self.out, "=== Chatter's Guild: Musical Chairs ===")?;
        writeln!(
            self.out,
            "2 users | 3 roles | strict turn-taking | random role shifts"
        )?;
        writeln!(self.out, "Type 'end' at any prompt to stop.\n")?;

        let name1 = self.read_or_default("Player 1 name", "U1").await?;
        let name2 = self.read_or_default("Player 2 name", "U2").await?;
        let mut chairs = MatchController::new([name1.as_str(), name2.as_str()], game, rng)?;
        self.print_round_header(&chairs)?;

        let result = loop {
            let actor = match chairs.current_player() {
                Some(actor) => actor,
                None => break chairs.result(),
            };
            let name = chairs.players()[actor].name.clone();
            writeln!(
                self.out,
                "\n--- Turn {}/{} | {} typing (Role={}) ---",
                chairs.turns_taken() + 1,
                chairs.turns_per_round(),
                name,
                chairs.players()[actor].role
            )?;
            let text = self
                .prompt(&format!("{}: ", name))
                .await?
                .unwrap_or_else(|| "end".to_string());

            match chairs.submit_turn(engine, &text)? {
                TurnEvent::Scored(score) => {
                    writeln!(self.out, "{}", format_turn_line(&name, score.role, &score.result))?;
                }
                TurnEvent::RoundScored(score, summary) => {
                    writeln!(self.out, "{}", format_turn_line(&name, score.role, &score.result))?;
                    self.print_round_summary(&chairs, &summary)?;
                    match chairs.advance()? {
                        Advance::MatchOver(result) => break result,
                        Advance::RoleShift(_) => {
                            self.music_cue().await?;
                            chairs.start_round()?;
                            self.print_round_header(&chairs)?;
                        }
                    }
                }
                TurnEvent::Aborted(result) => break result,
            }
        };

        self.print_match_over(&result, engine)?;
        Ok(result)
    }

    fn print_round_header<G: Rng>(&mut self, chairs: &MatchController<G>) -> Result<()> {
        writeln!(self.out, "=== ROUND {} (Musical Chairs) ===", chairs.round())?;
        for player in chairs.players() {
            writeln!(self.out, "  {} -> {}", player.name, player.role)?;
        }
        writeln!(
            self.out,
            "Turns per round: {} | Sets to win: {}\n",
            chairs.turns_per_round(),
            chairs.sets_to_win()
        )?;
        Ok(())
    }

    fn print_round_summary<G: Rng>(
        &mut self,
        chairs: &MatchController<G>,
        summary: &RoundSummary,
    ) -> Result<()> {
        let players = chairs.players();
        writeln!(self.out, "\n=== ROUND {} SUMMARY ===", summary.round)?;
        for p in 0..PLAYER_COUNT {
            writeln!(
                self.out,
                "{} RoundIP={} AvgNorm={:.2}",
                players[p].name, summary.round_ip[p], summary.avg_norm[p]
            )?;
        }
        if summary.decided_by == DecidedBy::CoinFlip {
            writeln!(self.out, "Tie-breaker coin flip awarded the set.")?;
        }
        writeln!(
            self.out,
            "\nROUND {} WINNER: {} ({})",
            summary.round,
            players[summary.winner].name,
            describe_decision(summary.decided_by)
        )?;
        self.print_board(players.iter().map(|p| (p.name.as_str(), p.sets_won, p.total_ip)))
    }

    fn print_board<'a>(&mut self, rows: impl Iterator<Item = (&'a str, u32, u32)>) -> Result<()> {
        writeln!(self.out, "\n=== BOARD ===")?;
        for (name, sets, ip) in rows {
            writeln!(self.out, "{} Sets={} TotalIP={}", name, sets, ip)?;
        }
        Ok(())
    }

    async fn music_cue(&mut self) -> Result<()> {
        let Some(range) = self.music_ms.clone() else {
            writeln!(self.out, "\nMUSIC STOPS - ROLE SHIFT\n")?;
            return Ok(());
        };

        writeln!(self.out, "\nThe music starts...")?;
        let duration_ms = rand::rng().random_range(range);
        let mut elapsed = 0;
        let mut beat = 0;
        while elapsed < duration_ms {
            beat += 1;
            let bar: String = (0..RHYTHM_WIDTH)
                .map(|i| if i == beat % RHYTHM_WIDTH { 'o' } else { '.' })
                .collect();
            let left = (duration_ms - elapsed) as f64 / 1000.0;
            write!(self.out, "\r  [{}] ~ {:.1}s   ", bar, left)?;
            self.out.flush()?;
            tokio::time::sleep(Duration::from_millis(RHYTHM_BEAT_MS)).await;
            elapsed += RHYTHM_BEAT_MS;
        }
        writeln!(self.out)?;
        writeln!(self.out, "MUSIC STOPS - ROLE SHIFT INCOMING")?;
        writeln!(self.out, "Locking turns until the next speaker begins...\n")?;
        Ok(())
    }

    fn print_match_over(&mut self, result: &MatchResult, engine: &ScoringEngine) -> Result<()> {
        writeln!(
            self.out,
            "\nMATCH {}",
            if result.completed { "OVER" } else { "STOPPED" }
        )?;
        let winner = match result.winner {
            Some(w) => result.standings[w].name.as_str(),
            None if result.completed => "TIE",
            None => "none (match stopped)",
        };
        writeln!(self.out, "Winner: {}", winner)?;
        self.print_board(
            result
                .standings
                .iter()
                .map(|s| (s.name.as_str(), s.sets_won, s.total_ip)),
        )?;

        writeln!(self.out, "\n=== ROLE NORMALIZATION (mean raw) ===")?;
        for role in Role::PLAYABLE {
            writeln!(
                self.out,
                "{:<11} meanRaw={:.2}  samples={}",
                role.as_str(),
                engine.normalizer().mean_raw(role),
                engine.normalizer().turns_scored(role)
            )?;
        }

        writeln!(self.out, "\n=== ARCHETYPE TENDENCIES ===")?;
        for standing in &result.standings {
            writeln!(
                self.out,
                "\n{} Archetype Wheel ({}):",
                standing.name, standing.class_name
            )?;
            for line in format_archetype_wheel(&standing.archetype) {
                writeln!(self.out, "{}", line)?;
            }
        }
        Ok(())
    }
}
