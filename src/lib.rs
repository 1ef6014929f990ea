pub mod anthropic;
pub mod archetype;
pub mod behavior;
pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod logging;
pub mod memory;
pub mod musical_chairs;
pub mod openai;
pub mod partner;
pub mod profile;
pub mod roles;
pub mod scoring;
pub mod session;
pub mod trainer;

pub use archetype::{class_name, Archetype, ArchetypeVector};
pub use behavior::BehaviorVector;
pub use config::{AppConfig, GameConfig, LlmConfig};
pub use error::{Error, Result};
pub use memory::TokenMemory;
pub use musical_chairs::{MatchController, MatchResult, MatchState, RoundSummary};
pub use partner::{LocalResponder, Partner, PartnerReply};
pub use profile::PlayerProfile;
pub use roles::Role;
pub use scoring::{ScoringEngine, ScoringResult};
pub use session::{SessionReport, TurnRecord};
pub use trainer::{SessionSummary, TrainingSession};

use console::Console;
use db::{JsonProfileStore, ProfileStore};
use partner::LlmConnector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::io::BufReader;

const USAGE: &str = "Usage: chatter-guild [trainer | chairs]";

/// Which shell to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Trainer,
    MusicalChairs,
}

impl Mode {
    /// No argument selects the trainer.
    pub fn parse(arg: Option<&str>) -> Result<Mode> {
        match arg.map(|a| a.trim().to_lowercase()) {
            None => Ok(Mode::Trainer),
            Some(a) => match a.as_str() {
                "" | "trainer" | "train" => Ok(Mode::Trainer),
                "chairs" | "musical-chairs" | "match" => Ok(Mode::MusicalChairs),
                other => Err(Error::config(format!("Unknown mode '{}'", other))),
            },
        }
    }
}

fn open_profile_store(config: &AppConfig) -> Box<dyn ProfileStore> {
    let path = config.profile_path();
    match db::open_store(&path) {
        Ok(store) => store,
        Err(e) => {
            let fallback = logging::data_dir().join("player_profile.json");
            logging::log_error(
                None,
                &format!(
                    "Failed to open profile store at {}: {}. Using {}",
                    path.display(),
                    e,
                    fallback.display()
                ),
            );
            Box::new(JsonProfileStore::new(fallback))
        }
    }
}

fn connect_llm(config: &AppConfig) -> Option<LlmConnector> {
    let llm_config = LlmConfig::load(config.llm_config_path.as_deref())?;
    let timeout = Duration::from_secs(config.game.partner_timeout_secs);
    match LlmConnector::new(llm_config, timeout) {
        Ok(connector) => {
            logging::log_partner(
                None,
                &format!("LLM partner enabled: {}", connector.provider_label()),
            );
            Some(connector)
        }
        Err(e) => {
            logging::log_error(None, &format!("LLM partner disabled: {}", e));
            None
        }
    }
}

/// Run one mode against stdin/stdout with a process-wide scoring engine.
pub async fn run_mode(mode: Mode, config: &AppConfig) -> Result<()> {
    let mut engine = ScoringEngine::new();
    let mut console = Console::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    match mode {
        Mode::Trainer => {
            let store = open_profile_store(config);
            let timeout = Duration::from_secs(config.game.partner_timeout_secs);
            let mut partner = Partner::new(LocalResponder::from_entropy(), connect_llm(config), timeout);
            console
                .run_trainer(&mut engine, &config.game, store.as_ref(), &mut partner)
                .await?;
        }
        Mode::MusicalChairs => {
            console
                .run_musical_chairs(&mut engine, &config.game, StdRng::from_os_rng())
                .await?;
        }
    }
    Ok(())
}

pub fn run() {
    if let Err(e) = logging::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    // Keep the last 7 days of logs
    let _ = logging::cleanup_old_logs();

    let arg = std::env::args().nth(1);
    let mode = match Mode::parse(arg.as_deref()) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            return;
        }
    };

    let config = AppConfig::load();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return;
        }
    };

    if let Err(e) = runtime.block_on(run_mode(mode, &config)) {
        logging::log_error(None, &format!("{:?} mode failed: {}", mode, e));
        eprintln!("Error: {}", e);
    }
}
