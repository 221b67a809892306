//! `anima-cli` – Anima Command Line Interface
//!
//! This binary is the entry point for the Anima stack. It:
//!
//! 1. Boots structured logging (and optional OTLP export) via
//!    `anima-runtime::telemetry`.
//! 2. Checks for `~/.anima/config.toml`; runs a **First-Run Wizard** when
//!    the file is absent.
//! 3. Probes the local Ollama instance and reports available models.
//! 4. Wires up the [`Engine`] with its Ollama collaborators and drops the
//!    user into an interactive REPL.
//! 5. Saves affect state and persona on exit (including Ctrl-C).

mod config;
mod ollama;
mod repl;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use tracing::warn;

use anima_runtime::{Engine, EngineConfig, OllamaEmbedder, OllamaGenerator};

fn main() {
    // Hold the guard for the whole process so pending spans flush on exit.
    // Set ANIMA_LOG_FORMAT=json for newline-delimited JSON logs.
    let _telemetry = anima_runtime::init_tracing("anima");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_ctrlc = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "Ctrl-C received – finishing up and saving state …".yellow().bold());
        shutdown_ctrlc.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── Config vault / First-Run Wizard ───────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Ollama discovery ──────────────────────────────────────────────────
    print!("\n  Probing Ollama at {} … ", cfg.ollama_url.dimmed());
    io::stdout().flush().ok();
    match ollama::fetch_model_names(&cfg.ollama_url) {
        Ok(models) => {
            println!("{} ({} model(s) available)", "online".green(), models.len());
            if !models.iter().any(|m| m.starts_with(&cfg.chat_model)) {
                println!(
                    "  {} chat model '{}' not found locally; try: ollama pull {}",
                    "note:".yellow(),
                    cfg.chat_model.bold(),
                    cfg.chat_model
                );
            }
        }
        Err(e) => {
            println!("{}", "offline".yellow());
            println!("  {}", e.dimmed());
            println!("  Replies will degrade to fallback lines until Ollama is running.");
        }
    }

    // ── Engine wiring ─────────────────────────────────────────────────────
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Failed to start async runtime".red(), e);
            return;
        }
    };

    let embedder = Arc::new(OllamaEmbedder::new(
        cfg.ollama_url.clone(),
        cfg.embed_model.clone(),
        cfg.embed_dim,
    ));
    let generator = Arc::new(OllamaGenerator::new(
        cfg.ollama_url.clone(),
        cfg.chat_model.clone(),
        Duration::from_secs(cfg.generation_timeout_secs),
    ));

    let mut engine = match Engine::new(
        EngineConfig {
            data_dir: cfg.data_dir.clone(),
            session_id: None,
            min_importance: cfg.min_importance,
            retrieval_k: cfg.retrieval_k,
            short_term_capacity: cfg.short_term_capacity,
        },
        embedder,
        generator,
    ) {
        Ok(engine) => engine,
        Err(e) => {
            println!("{}: {}", "Failed to initialise the memory engine".red(), e);
            println!(
                "  The memory files under {} may need repair or removal.",
                cfg.data_dir.display().to_string().bold()
            );
            return;
        }
    };

    println!(
        "\n  Session {}. Type {} for commands; anything else is a message.\n",
        engine.session_id().bold(),
        "/help".bold().cyan()
    );

    // ── REPL ──────────────────────────────────────────────────────────────
    repl::run(&rt, &mut engine, shutdown);

    // ── Graceful exit ─────────────────────────────────────────────────────
    match engine.save() {
        Ok(()) => println!("{}", "State saved. Goodbye.".green()),
        Err(e) => println!("{}: {}", "Failed to save state".red(), e),
    }
}

fn print_banner() {
    println!();
    println!("{}", "  ╔══════════════════════════════════════════╗".cyan());
    println!("{}", "  ║   ANIMA · emotional memory engine        ║".cyan().bold());
    println!("{}", "  ║   local · persistent · affect-weighted   ║".cyan());
    println!("{}", "  ╚══════════════════════════════════════════╝".cyan());
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!("{}", "First run – let's set up Anima.".bold());
    let mut cfg = config::Config::default();

    cfg.ollama_url = prompt_str(
        &format!("  Ollama URL      [{}]: ", cfg.ollama_url),
        &cfg.ollama_url,
    );
    cfg.chat_model = prompt_str(
        &format!("  Chat model      [{}]: ", cfg.chat_model),
        &cfg.chat_model,
    );
    cfg.embed_model = prompt_str(
        &format!("  Embedding model [{}]: ", cfg.embed_model),
        &cfg.embed_model,
    );

    match config::save(&cfg) {
        Ok(()) => println!(
            "{} {}",
            "✓ Settings saved to".green(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    config::apply_env_overrides(&mut cfg);
    cfg
}

fn prompt_str(prompt: &str, default: &str) -> String {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return default.to_string();
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
