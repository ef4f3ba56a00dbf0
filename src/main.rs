//! Board Persist entry point
//!
//! On the web this only installs logging; the game UI drives the managers.
//! Natively it inspects or resets a file-backed store.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Board persistence ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use board_persist::{Difficulty, Partition, PersistConfig, Persistence, SettingsPatch};
    use clap::{Parser, Subcommand, ValueEnum};

    #[derive(Parser)]
    #[command(name = "board-persist", about = "Inspect a board game save store")]
    pub struct Cli {
        /// Store file
        #[arg(long, env = "BOARD_PERSIST_STORE", default_value = "board-store.json")]
        store: PathBuf,

        #[command(subcommand)]
        command: Option<Command>,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Summarise every partition
        Show,
        /// List accounts and their stats
        Users,
        /// List completed games, newest first
        History {
            #[arg(long, default_value_t = 10)]
            limit: usize,
        },
        /// Show settings, optionally changing them first
        Settings {
            #[arg(long)]
            sound: Option<bool>,
            #[arg(long)]
            auto_save: Option<bool>,
            #[arg(long, value_enum)]
            difficulty: Option<Level>,
        },
        /// Delete one partition
        Reset {
            #[arg(value_enum)]
            partition: Target,
        },
    }

    #[derive(Clone, Copy, ValueEnum)]
    enum Level {
        Easy,
        Medium,
        Hard,
    }

    impl From<Level> for Difficulty {
        fn from(level: Level) -> Self {
            match level {
                Level::Easy => Difficulty::Easy,
                Level::Medium => Difficulty::Medium,
                Level::Hard => Difficulty::Hard,
            }
        }
    }

    #[derive(Clone, Copy, ValueEnum)]
    enum Target {
        Game,
        History,
    }

    pub fn run(cli: Cli) -> Result<(), board_persist::StoreError> {
        let p: Persistence = Persistence::open_file(&cli.store, &PersistConfig::default())?;

        match cli.command.unwrap_or(Command::Show) {
            Command::Show => {
                println!("store: {}", cli.store.display());
                println!("users: {}", p.users.get_all_users().len());
                match p.games.load_game_state() {
                    Some(saved) => println!(
                        "saved game: v{} at {} ({} fields)",
                        saved.version,
                        saved.timestamp,
                        saved.state.len()
                    ),
                    None if p.games.has_saved_game() => println!("saved game: unreadable"),
                    None => println!("saved game: none"),
                }
                println!("history: {} games", p.history.get_history().len());
                let settings = p.settings.load_settings();
                println!(
                    "settings: sound={} autoSave={} difficulty={}",
                    settings.sound_enabled,
                    settings.auto_save,
                    settings.difficulty.as_str()
                );
            }
            Command::Users => {
                for user in p.users.get_all_users() {
                    let stats: Vec<String> = user
                        .stats
                        .iter()
                        .flatten()
                        .map(|(name, value)| format!("{}={}", name, value))
                        .collect();
                    println!("{} [{}]", user.username, stats.join(", "));
                }
            }
            Command::History { limit } => {
                for entry in p.history.get_history().into_iter().take(limit) {
                    println!(
                        "#{} {} {}",
                        entry.id,
                        entry.completed_at,
                        serde_json::Value::Object(entry.game)
                    );
                }
            }
            Command::Settings {
                sound,
                auto_save,
                difficulty,
            } => {
                let patch = SettingsPatch {
                    sound_enabled: sound,
                    auto_save,
                    difficulty: difficulty.map(Difficulty::from),
                };
                let settings = if patch == SettingsPatch::default() {
                    p.settings.load_settings()
                } else {
                    p.settings.update_settings(&patch)
                };
                println!("{}", serde_json::to_string_pretty(&settings).unwrap_or_default());
            }
            Command::Reset { partition } => {
                let cleared = match partition {
                    Target::Game => {
                        p.games.clear_game_state();
                        Partition::GameState
                    }
                    Target::History => {
                        p.history.clear_history();
                        Partition::GameHistory
                    }
                };
                println!("cleared {}", cleared);
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::init();
    if let Err(e) = cli::run(cli::Cli::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
