//! Musical Chairs: a two-player match of fixed-length rounds with role shifts.
//!
//! ```text
//! RoundInProgress --(last turn)--> RoundScored --advance--> RoleShift --start_round--> RoundInProgress
//!        |                               |
//!        +--("end")--> MatchOver         +--(sets_to_win reached)--> MatchOver
//! ```
//!
//! Player 1 always opens a round and turns strictly alternate. Both players
//! draw distinct roles from the playable subset at the start of every round,
//! never repeating their previous role unless the bounded redraw gives up.

use crate::archetype::ArchetypeVector;
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::logging;
use crate::memory::TokenMemory;
use crate::roles::Role;
use crate::scoring::{ScoringEngine, ScoringResult};
use crate::trainer::is_end_command;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

pub const PLAYER_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    RoundInProgress,
    RoundScored,
    RoleShift,
    MatchOver { completed: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub name: String,
    pub role: Role,
    pub sets_won: u32,
    pub total_ip: u32,
    /// Raw archetype evidence summed over the whole match.
    pub evidence: ArchetypeVector,
}

impl Player {
    fn new(name: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            role,
            sets_won: 0,
            total_ip: 0,
            evidence: ArchetypeVector::ZERO,
        }
    }

    pub fn archetype(&self) -> ArchetypeVector {
        self.evidence.normalized()
    }
}

/// How a round winner was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecidedBy {
    InsightPoints,
    AverageNorm,
    CoinFlip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub roles: [Role; PLAYER_COUNT],
    pub round_ip: [u32; PLAYER_COUNT],
    pub avg_norm: [f64; PLAYER_COUNT],
    /// Index of the player awarded the set.
    pub winner: usize,
    pub decided_by: DecidedBy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnScore {
    pub round: u32,
    /// 1-based turn number within the round.
    pub turn: u32,
    pub player: usize,
    pub role: Role,
    pub result: ScoringResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Scored(TurnScore),
    /// The last turn of the round was scored and a set was awarded.
    RoundScored(TurnScore, RoundSummary),
    /// An `end` command stopped the match. The round in progress awards no set.
    Aborted(MatchResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    RoleShift(RoleDraw),
    MatchOver(MatchResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStanding {
    pub name: String,
    pub sets_won: u32,
    pub total_ip: u32,
    pub archetype: ArchetypeVector,
    pub class_name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub match_id: String,
    pub completed: bool,
    /// None when aborted or when sets are level.
    pub winner: Option<usize>,
    pub rounds_completed: u32,
    pub standings: [PlayerStanding; PLAYER_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDraw {
    pub roles: [Role; PLAYER_COUNT],
    /// Every redraw repeated a previous role, so table order was used.
    pub used_fallback: bool,
}

/// Draw two distinct roles from `playable` for the two players.
///
/// Shuffles and takes the first two, rejecting any draw where a player would
/// keep its `previous` role. After `attempts` rejections the first two roles
/// in table order are assigned regardless.
pub fn assign_roles<R: Rng + ?Sized>(
    playable: &[Role],
    previous: Option<[Role; PLAYER_COUNT]>,
    attempts: u32,
    rng: &mut R,
) -> Result<RoleDraw> {
    if playable.len() < PLAYER_COUNT {
        return Err(Error::config(format!(
            "need at least {} playable roles, got {}",
            PLAYER_COUNT,
            playable.len()
        )));
    }

    let mut shuffled = playable.to_vec();
    for _ in 0..attempts {
        shuffled.shuffle(rng);
        let roles = [shuffled[0], shuffled[1]];
        let repeats = previous.is_some_and(|prev| roles[0] == prev[0] || roles[1] == prev[1]);
        if !repeats {
            return Ok(RoleDraw {
                roles,
                used_fallback: false,
            });
        }
    }

    Ok(RoleDraw {
        roles: [playable[0], playable[1]],
        used_fallback: true,
    })
}

/// Higher round IP wins; on a tie, higher average Norm; then a coin flip.
pub fn decide_round<R: Rng + ?Sized>(
    round_ip: [u32; PLAYER_COUNT],
    avg_norm: [f64; PLAYER_COUNT],
    rng: &mut R,
) -> (usize, DecidedBy) {
    if round_ip[0] != round_ip[1] {
        let winner = if round_ip[0] > round_ip[1] { 0 } else { 1 };
        return (winner, DecidedBy::InsightPoints);
    }
    if avg_norm[0] > avg_norm[1] {
        return (0, DecidedBy::AverageNorm);
    }
    if avg_norm[1] > avg_norm[0] {
        return (1, DecidedBy::AverageNorm);
    }
    (rng.random_range(0..PLAYER_COUNT), DecidedBy::CoinFlip)
}

#[derive(Debug, Clone, Default)]
struct RoundTally {
    ip: [u32; PLAYER_COUNT],
    norm_sum: [f64; PLAYER_COUNT],
    turns: [u32; PLAYER_COUNT],
}

impl RoundTally {
    fn add(&mut self, player: usize, result: &ScoringResult) {
        self.ip[player] += result.insight_points;
        self.norm_sum[player] += result.norm;
        self.turns[player] += 1;
    }

    fn avg_norm(&self) -> [f64; PLAYER_COUNT] {
        [0, 1].map(|p| {
            if self.turns[p] == 0 {
                0.0
            } else {
                self.norm_sum[p] / f64::from(self.turns[p])
            }
        })
    }
}

pub struct MatchController<R: Rng> {
    id: String,
    config: GameConfig,
    players: [Player; PLAYER_COUNT],
    state: MatchState,
    round: u32,
    rounds_completed: u32,
    turn: u32,
    tally: RoundTally,
    memory: TokenMemory,
    last_message: [String; PLAYER_COUNT],
    rng: R,
}

impl<R: Rng> MatchController<R> {
    /// Start a match with round 1 in progress and freshly drawn roles.
    pub fn new(names: [&str; PLAYER_COUNT], config: &GameConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let draw = assign_roles(&Role::PLAYABLE, None, config.role_draw_attempts, &mut rng)?;
        let id = Uuid::new_v4().to_string();

        logging::log_match(
            Some(&id),
            &format!(
                "Match started: {}={} {}={}",
                names[0], draw.roles[0], names[1], draw.roles[1]
            ),
        );

        Ok(Self {
            id,
            config: config.clone(),
            players: [
                Player::new(names[0], draw.roles[0]),
                Player::new(names[1], draw.roles[1]),
            ],
            state: MatchState::RoundInProgress,
            round: 1,
            rounds_completed: 0,
            turn: 0,
            tally: RoundTally::default(),
            memory: TokenMemory::new(config.token_memory_capacity),
            last_message: [String::new(), String::new()],
            rng,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn players(&self) -> &[Player; PLAYER_COUNT] {
        &self.players
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turns_per_round(&self) -> u32 {
        self.config.turns_per_round
    }

    pub fn sets_to_win(&self) -> u32 {
        self.config.sets_to_win
    }

    /// Number of turns already scored in the current round.
    pub fn turns_taken(&self) -> u32 {
        self.turn
    }

    /// Index of the player whose turn it is, if a round is in progress.
    pub fn current_player(&self) -> Option<usize> {
        match self.state {
            MatchState::RoundInProgress => Some((self.turn % PLAYER_COUNT as u32) as usize),
            _ => None,
        }
    }

    fn require(&self, expected: MatchState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::MatchState(format!(
                "cannot {} while {:?}",
                action, self.state
            )));
        }
        Ok(())
    }

    /// Score the current player's message, or stop the match on `end`.
    pub fn submit_turn(&mut self, engine: &mut ScoringEngine, text: &str) -> Result<TurnEvent> {
        self.require(MatchState::RoundInProgress, "submit a turn")?;

        if is_end_command(text) {
            self.state = MatchState::MatchOver { completed: false };
            logging::log_match(
                Some(&self.id),
                &format!("Match stopped during round {} turn {}", self.round, self.turn + 1),
            );
            return Ok(TurnEvent::Aborted(self.result()));
        }

        let actor = (self.turn % PLAYER_COUNT as u32) as usize;
        let role = self.players[actor].role;
        let result = engine.score_turn(role, text, &self.last_message[1 - actor], &self.memory);

        self.tally.add(actor, &result);
        let player = &mut self.players[actor];
        player.total_ip += result.insight_points;
        player.evidence.accumulate(&result.evidence);

        self.memory.observe(text);
        self.last_message[actor] = text.to_string();
        self.turn += 1;

        let score = TurnScore {
            round: self.round,
            turn: self.turn,
            player: actor,
            role,
            result,
        };

        if self.turn < self.config.turns_per_round {
            return Ok(TurnEvent::Scored(score));
        }

        let summary = self.score_round();
        Ok(TurnEvent::RoundScored(score, summary))
    }

    fn score_round(&mut self) -> RoundSummary {
        let avg_norm = self.tally.avg_norm();
        let (winner, decided_by) = decide_round(self.tally.ip, avg_norm, &mut self.rng);
        self.players[winner].sets_won += 1;
        self.rounds_completed += 1;
        self.state = MatchState::RoundScored;

        let summary = RoundSummary {
            round: self.round,
            roles: [self.players[0].role, self.players[1].role],
            round_ip: self.tally.ip,
            avg_norm,
            winner,
            decided_by,
        };

        logging::log_match(
            Some(&self.id),
            &format!(
                "Round {} to {} by {:?}: ip={}/{} avg_norm={:.2}/{:.2} sets={}/{}",
                summary.round,
                self.players[winner].name,
                decided_by,
                summary.round_ip[0],
                summary.round_ip[1],
                avg_norm[0],
                avg_norm[1],
                self.players[0].sets_won,
                self.players[1].sets_won
            ),
        );

        summary
    }

    /// After a scored round: end the match if a player reached the set
    /// target, otherwise shift roles for the next round.
    pub fn advance(&mut self) -> Result<Advance> {
        self.require(MatchState::RoundScored, "advance")?;

        if self
            .players
            .iter()
            .any(|p| p.sets_won >= self.config.sets_to_win)
        {
            self.state = MatchState::MatchOver { completed: true };
            let result = self.result();
            logging::log_match(
                Some(&self.id),
                &format!(
                    "Match over after {} rounds, winner={}",
                    self.rounds_completed,
                    result
                        .winner
                        .map(|w| self.players[w].name.as_str())
                        .unwrap_or("none")
                ),
            );
            return Ok(Advance::MatchOver(result));
        }

        let previous = [self.players[0].role, self.players[1].role];
        let draw = assign_roles(
            &Role::PLAYABLE,
            Some(previous),
            self.config.role_draw_attempts,
            &mut self.rng,
        )?;
        self.players[0].role = draw.roles[0];
        self.players[1].role = draw.roles[1];
        self.round += 1;
        self.state = MatchState::RoleShift;

        logging::log_match(
            Some(&self.id),
            &format!(
                "Role shift for round {}: {}={} {}={}{}",
                self.round,
                self.players[0].name,
                draw.roles[0],
                self.players[1].name,
                draw.roles[1],
                if draw.used_fallback { " (fallback)" } else { "" }
            ),
        );

        Ok(Advance::RoleShift(draw))
    }

    /// Begin the next round with fresh token memory and no prior messages.
    pub fn start_round(&mut self) -> Result<()> {
        self.require(MatchState::RoleShift, "start a round")?;
        self.tally = RoundTally::default();
        self.memory.clear();
        self.last_message = [String::new(), String::new()];
        self.turn = 0;
        self.state = MatchState::RoundInProgress;
        Ok(())
    }

    /// Standings so far. The winner is only set once the match completed.
    pub fn result(&self) -> MatchResult {
        let completed = self.state == MatchState::MatchOver { completed: true };
        let [a, b] = [&self.players[0], &self.players[1]];
        let winner = if !completed || a.sets_won == b.sets_won {
            None
        } else if a.sets_won > b.sets_won {
            Some(0)
        } else {
            Some(1)
        };

        MatchResult {
            match_id: self.id.clone(),
            completed,
            winner,
            rounds_completed: self.rounds_completed,
            standings: [0, 1].map(|p| {
                let player = &self.players[p];
                let archetype = player.archetype();
                PlayerStanding {
                    name: player.name.clone(),
                    sets_won: player.sets_won,
                    total_ip: player.total_ip,
                    archetype,
                    class_name: archetype.class_name(),
                }
            }),
        }
    }
}
