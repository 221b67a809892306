//! REPL – Read-Eval-Print Loop for the Anima interactive shell.
//!
//! Anything that does not start with `/` is sent to the engine as a
//! conversational message. Supported slash-commands:
//!
//!   /help                       – show this list
//!   /status                     – session, memory, and persona overview
//!   /affect                     – the six affect dimensions
//!   /memories                   – most recent long-term memories
//!   /teach <content>            – store content with high importance
//!   /correct <input> | <fix>    – store a correction
//!   /reset                      – clear the short-term window
//!   /save                       – persist affect state and persona
//!   /quit | /exit               – gracefully exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anima_runtime::Engine;
use anima_types::MemoryRecord;

/// Entry point for the interactive REPL.
///
/// The REPL is single-threaded, so the engine's single-writer discipline is
/// structural: one cognitive cycle at a time, driven to completion on the
/// supplied runtime. `shutdown` is polled each iteration; when set (Ctrl-C)
/// the loop exits cleanly.
pub fn run(rt: &tokio::runtime::Runtime, engine: &mut Engine, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let label = engine.status().affect.label();
        print!("{} {} ", format!("[{label}]").dimmed(), "anima>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/help" => cmd_help(),
            "/status" => cmd_status(engine),
            "/affect" => cmd_affect(engine),
            "/memories" => cmd_memories(engine),
            "/reset" => {
                engine.reset_conversation();
                println!("{}", "Short-term context cleared.".green());
            }
            "/save" => match engine.save() {
                Ok(()) => println!("{}", "State saved.".green()),
                Err(e) => println!("{}: {}", "Save failed".red(), e),
            },
            "/quit" | "/exit" => {
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            other if other.starts_with("/teach") => {
                let content = other.trim_start_matches("/teach").trim();
                if content.is_empty() {
                    println!("{} /teach <content>", "Usage:".yellow());
                } else {
                    let reply = rt.block_on(engine.teach(content));
                    println!("\n{reply}\n");
                }
            }
            other if other.starts_with("/correct") => {
                let rest = other.trim_start_matches("/correct").trim();
                match rest.split_once('|') {
                    Some((input, correction))
                        if !input.trim().is_empty() && !correction.trim().is_empty() =>
                    {
                        let reply =
                            rt.block_on(engine.correct(input.trim(), correction.trim()));
                        println!("\n{reply}\n");
                    }
                    _ => println!("{} /correct <input> | <correction>", "Usage:".yellow()),
                }
            }
            other if other.starts_with('/') => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
            message => {
                let reply = rt.block_on(engine.process_interaction(message));
                println!("\n{reply}\n");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Anima Commands".bold().underline());
    println!("  {}                    – session, memory, and persona overview", "/status".bold().cyan());
    println!("  {}                    – the six affect dimensions", "/affect".bold().cyan());
    println!("  {}                  – most recent long-term memories", "/memories".bold().cyan());
    println!("  {}           – store content with high importance", "/teach <content>".bold().cyan());
    println!("  {}  – store a correction", "/correct <input> | <fix>".bold().cyan());
    println!("  {}                     – clear the short-term window", "/reset".bold().cyan());
    println!("  {}                      – persist affect state and persona", "/save".bold().cyan());
    println!("  {}                – exit", "/quit  /exit".bold().cyan());
    println!("  Anything else is a message to Anima.");
    println!();
}

fn cmd_status(engine: &Engine) {
    let status = engine.status();
    println!();
    println!("{}", "Session".bold().underline());
    println!("  Id              : {}", status.session_id.bold());
    println!(
        "  Mood            : {} (intensity {:.2})",
        status.affect.label().to_string().yellow(),
        status.affect.intensity()
    );
    println!("  Interactions    : {}", status.interactions);
    println!(
        "  Memories        : {} long-term ({} this session), {} short-term turns",
        status.long_term_count, status.memories_stored, status.short_term_len
    );
    let dominant: Vec<&str> = status.persona.dominant().iter().map(|(name, _)| *name).collect();
    if !dominant.is_empty() {
        println!("  Dominant traits : {}", dominant.join(", "));
    }
    println!();
}

fn cmd_affect(engine: &Engine) {
    let affect = engine.status().affect;
    println!();
    println!("{}", "Affect".bold().underline());
    println!("  valence    : {:.3}", affect.valence());
    println!("  arousal    : {:.3}", affect.arousal());
    println!("  dominance  : {:.3}", affect.dominance());
    println!("  confidence : {:.3}", affect.confidence());
    println!("  curiosity  : {:.3}", affect.curiosity());
    println!("  attachment : {:.3}", affect.attachment());
    println!(
        "  intensity  : {:.3}  →  {}",
        affect.intensity(),
        affect.label().to_string().yellow()
    );
    println!();
}

fn cmd_memories(engine: &Engine) {
    let recent = engine.recent_memories(5);
    if recent.is_empty() {
        println!("{}", "No long-term memories yet.".dimmed());
        return;
    }
    println!();
    println!("{}", "Recent memories".bold().underline());
    for record in &recent {
        println!("{}", render_memory(record));
    }
    println!();
}

fn render_memory(record: &MemoryRecord) -> String {
    format!(
        "  [{}] ({:.2}) {}",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.importance,
        truncate(&record.text, 80).dimmed()
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
