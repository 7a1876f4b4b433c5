//! Converge command implementation

use colored::Colorize;
use dnr_core::{ConfigName, SyncOutcome};

use crate::context::EngineContext;
use crate::error::{CliError, Result};

/// Deliver one update notification for `name`.
///
/// Without an explicit tag the SHA-256 of the dataset file is used, so
/// converging twice on an unchanged file is a no-op.
pub async fn run_converge(ctx: &EngineContext, name: ConfigName, etag: Option<String>) -> Result<()> {
    let etag = match etag {
        Some(etag) => etag,
        None => ctx.cache.content_etag(name)?,
    };

    println!(
        "{} Converging {} to {}",
        "=>".blue().bold(),
        name.as_str().cyan(),
        etag.dimmed()
    );

    if ctx.registrations == 0 {
        println!(
            "{} Declarative rules are disabled for manifest version {}.",
            "SKIP".yellow().bold(),
            u8::from(ctx.config.manifest_version)
        );
        return Ok(());
    }

    let report = ctx.notifier.notify(name, &etag).await;
    for outcome in &report.outcomes {
        print_outcome(name, outcome);
    }

    if !report.is_success() {
        return Err(CliError::user(format!(
            "Convergence of {name} failed: {}",
            report.errors.join("; ")
        )));
    }
    Ok(())
}

fn print_outcome(name: ConfigName, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::AlreadyCurrent => {
            println!("{} {} is already current.", "OK".green().bold(), name);
        }
        SyncOutcome::Synchronized { rules_installed } => {
            println!(
                "{} Installed {} rules for {}.",
                "SYNCED".green().bold(),
                rules_installed,
                name
            );
        }
        SyncOutcome::TagRecorded => {
            println!(
                "{} Recorded version tag for {} (no generator).",
                "TAGGED".green().bold(),
                name
            );
        }
        SyncOutcome::Skipped => {
            println!(
                "{} {} has no ruleset generator; skipped.",
                "SKIP".yellow().bold(),
                name
            );
        }
    }
}
