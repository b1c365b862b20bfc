//! Terminal output. Everything user-facing goes through here so commands stay
//! free of formatting details.

use colored::Colorize;
use cs_core::{PACKAGE_NAME, UpdateProgress, UpdateState};
use tokio::sync::mpsc::UnboundedReceiver;

pub fn intro(title: &str) {
    println!("{}", format!(" {title} ").black().on_cyan());
}

pub fn success(message: &str) {
    println!("{} {message}", "✔".green());
}

pub fn info(message: &str) {
    println!("{} {message}", "ℹ".blue());
}

pub fn warn(message: &str) {
    println!("{} {}", "▲".yellow(), message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✖".red(), message.red());
}

pub fn step(message: &str) {
    println!("{} {message}", "◒".cyan());
}

pub fn step_done(message: &str) {
    println!("{} {message}", "◇".green());
}

pub fn step_failed(message: &str) {
    println!("{} {}", "■".red(), message.red());
}

pub fn detail(message: &str) {
    println!("  {}", message.dimmed());
}

fn progress_line(event: &UpdateProgress) -> (LineKind, String) {
    match event {
        UpdateProgress::Installing { version } => {
            (LineKind::Step, format!("Installing {PACKAGE_NAME}@{version}..."))
        }
        UpdateProgress::Installed { version } => {
            (LineKind::Done, format!("Installed {PACKAGE_NAME}@{version}"))
        }
        UpdateProgress::Verifying { .. } => {
            (LineKind::Step, "Verifying installation...".to_string())
        }
        UpdateProgress::Verified { version } => {
            (LineKind::Done, format!("Verified version {version}"))
        }
        UpdateProgress::StepFailed { state, reason } => {
            let step = match state {
                UpdateState::Verifying => "Verification failed",
                _ => "Installation failed",
            };
            (LineKind::Failed, format!("{step}: {reason}"))
        }
        UpdateProgress::RollingBack { version } => {
            (LineKind::Step, format!("Rolling back to {version}..."))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Step,
    Done,
    Failed,
}

/// Prints update progress until every sender is dropped.
pub async fn print_progress(mut events: UnboundedReceiver<UpdateProgress>) {
    while let Some(event) = events.recv().await {
        let (kind, line) = progress_line(&event);
        match kind {
            LineKind::Step => step(&line),
            LineKind::Done => step_done(&line),
            LineKind::Failed => step_failed(&line),
        }
    }
}
