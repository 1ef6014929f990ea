use chatter_guild_lib::musical_chairs::{Advance, DecidedBy, TurnEvent};
use chatter_guild_lib::{GameConfig, MatchController, MatchState, Role, ScoringEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;

const STRONG: &str = "Why do you think cities feel lonely, because I noticed it in my experience?";
const WEAK: &str = "ok";
// Raw score is the same for every playable role on every repeat (no question, few tokens)
const STEADY: &str = "So I hear you because";

#[test]
fn test_short_match_driven_by_config() {
    let config = GameConfig {
        turns_per_round: 4,
        sets_to_win: 2,
        ..GameConfig::default()
    };
    let mut engine = ScoringEngine::new();
    let mut chairs = MatchController::new(["Ana", "Ben"], &config, StdRng::seed_from_u64(21)).unwrap();

    let mut rounds = Vec::new();
    let mut role_history = vec![[chairs.players()[0].role, chairs.players()[1].role]];
    let mut turns = 0;

    let result = loop {
        let actor = chairs.current_player().unwrap();
        // Ben plays well, Ana does not
        let text = if actor == 1 { STRONG } else { WEAK };
        turns += 1;
        match chairs.submit_turn(&mut engine, text).unwrap() {
            TurnEvent::Scored(score) => assert_eq!(score.player, actor),
            TurnEvent::RoundScored(_, summary) => {
                rounds.push(summary);
                match chairs.advance().unwrap() {
                    Advance::MatchOver(result) => break result,
                    Advance::RoleShift(draw) => {
                        role_history.push(draw.roles);
                        chairs.start_round().unwrap();
                    }
                }
            }
            TurnEvent::Aborted(_) => panic!("no end command was sent"),
        }
    };

    assert_eq!(turns, 8);
    assert_eq!(rounds.len(), 2);
    assert!(rounds
        .iter()
        .all(|r| r.winner == 1 && r.decided_by == DecidedBy::InsightPoints));
    assert_eq!(result.winner, Some(1));
    assert_eq!(result.standings[1].sets_won, 2);
    assert_eq!(result.standings[0].total_ip, 0);
    assert_eq!(chairs.state(), MatchState::MatchOver { completed: true });

    for pair in role_history.windows(2) {
        assert!(pair[1].iter().all(|r| r.is_playable()));
        assert_ne!(pair[1][0], pair[1][1]);
        assert_ne!(pair[1][0], pair[0][0]);
        assert_ne!(pair[1][1], pair[0][1]);
    }

    // Every turn was scored under a playable role
    let scored: u64 = Role::PLAYABLE
        .iter()
        .map(|r| engine.normalizer().turns_scored(*r))
        .sum();
    assert_eq!(scored, 8);
}

#[test]
fn test_match_stopped_mid_round_has_no_winner() {
    let mut engine = ScoringEngine::new();
    let mut chairs =
        MatchController::new(["Ana", "Ben"], &GameConfig::default(), StdRng::seed_from_u64(3)).unwrap();

    for _ in 0..8 {
        chairs.submit_turn(&mut engine, STRONG).unwrap();
    }
    assert_eq!(chairs.state(), MatchState::RoundScored);
    chairs.advance().unwrap();
    chairs.start_round().unwrap();
    chairs.submit_turn(&mut engine, STRONG).unwrap();

    let TurnEvent::Aborted(result) = chairs.submit_turn(&mut engine, "END").unwrap() else {
        panic!("expected the match to stop");
    };
    assert!(!result.completed);
    assert_eq!(result.winner, None);
    assert_eq!(result.rounds_completed, 1);
    let sets: u32 = result.standings.iter().map(|s| s.sets_won).sum();
    assert_eq!(sets, 1);
}

#[test]
fn test_tied_round_goes_to_higher_average_norm() {
    let config = GameConfig {
        turns_per_round: 12,
        ..GameConfig::default()
    };
    let mut engine = ScoringEngine::new();
    let mut chairs = MatchController::new(["Ana", "Ben"], &config, StdRng::seed_from_u64(8)).unwrap();

    // Ana: 10, 10, -, -, 17, 15. Ben: 10, 10, 10, 10, -, 12.
    let ana = [STEADY, STEADY, WEAK, WEAK, STEADY, STEADY];
    let ben = [STEADY, STEADY, STEADY, STEADY, WEAK, STEADY];

    let mut ana_ip = Vec::new();
    let mut summary = None;
    for (a, b) in ana.iter().zip(ben.iter()) {
        match chairs.submit_turn(&mut engine, a).unwrap() {
            TurnEvent::Scored(score) => ana_ip.push(score.result.insight_points),
            other => panic!("unexpected event {:?}", other),
        }
        match chairs.submit_turn(&mut engine, b).unwrap() {
            TurnEvent::Scored(_) => {}
            TurnEvent::RoundScored(_, round) => summary = Some(round),
            TurnEvent::Aborted(_) => panic!("no end command was sent"),
        }
    }

    assert_eq!(ana_ip, vec![10, 10, 0, 0, 17, 15]);
    let summary = summary.expect("round should be scored after twelve turns");
    assert_eq!(summary.round_ip, [52, 52]);
    assert!(summary.avg_norm[1] > summary.avg_norm[0]);
    assert_eq!(summary.winner, 1);
    assert_eq!(summary.decided_by, DecidedBy::AverageNorm);
    assert_eq!(chairs.players()[1].sets_won, 1);
}
