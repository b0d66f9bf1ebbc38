//! Terminal front end for the AI Dungeon Master text adventure.
//!
//! A line-oriented interface: the title menu and character creation are
//! numbered prompts, then every line is a player action. Lines starting
//! with `#` are client commands.
//!
//! ```bash
//! ANTHROPIC_API_KEY=... cargo run -p aventura
//! ```
//!
//! Optional environment:
//! - `AVENTURA_SAVE_DIR` - where the saved game lives (default `partidas`)
//! - `AVENTURA_MODEL` - Claude model override
//! - `OPENAI_API_KEY` - enables spoken narration through `#voz`

mod repl;

use anyhow::Context;
use aventura_core::{
    ClaudeNarrator, FileStore, GameSession, NarratorConfig, OpenAiSpeech,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SAVE_DIR: &str = "partidas";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aventura=info,aventura_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Error: ANTHROPIC_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export ANTHROPIC_API_KEY=your_key_here");
        std::process::exit(1);
    }

    let mut config = NarratorConfig::default();
    if let Ok(model) = std::env::var("AVENTURA_MODEL") {
        config = config.with_model(model);
    }
    let narrator = ClaudeNarrator::from_env()
        .context("could not create the narrator")?
        .with_config(config);

    let save_dir = std::env::var("AVENTURA_SAVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SAVE_DIR));
    let store = FileStore::new(&save_dir);
    tracing::info!(path = %store.path().display(), "Using save file");

    let mut session = GameSession::new(narrator, store);
    if let Some(speech) = OpenAiSpeech::from_env() {
        session = session.with_speech(speech);
    }

    repl::run(session, save_dir.join("narracion.mp3")).await
}

fn print_help() {
    println!("Dungeon Master IA - aventura de texto");
    println!();
    println!("USO:");
    println!("  aventura");
    println!();
    println!("VARIABLES DE ENTORNO:");
    println!("  ANTHROPIC_API_KEY   Clave de la API de Claude (obligatoria)");
    println!("  AVENTURA_SAVE_DIR   Carpeta de la partida guardada (por defecto: partidas)");
    println!("  AVENTURA_MODEL      Modelo de Claude a usar");
    println!("  OPENAI_API_KEY      Activa la narración por voz (#voz)");
    println!("  RUST_LOG            Filtro de registro (por defecto: aventura=info)");
}
