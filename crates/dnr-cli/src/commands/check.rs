//! Check command implementation

use colored::Colorize;
use dnr_core::{CheckReport, CheckStatus, ConfigName, DriftItem};

use crate::context::EngineContext;
use crate::error::Result;

/// Compare version records with installed sentinels.
pub async fn run_check(ctx: &EngineContext, name: Option<ConfigName>, json: bool) -> Result<()> {
    let report = match name {
        Some(name) => ctx.engine.check(name).await?,
        None => ctx.engine.check_all().await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} Checking installed rules...", "=>".blue().bold());
    print_report(&report);
    Ok(())
}

fn print_report(report: &CheckReport) {
    match report.status {
        CheckStatus::Healthy => {
            println!("{} Rules are in sync. No drift detected.", "OK".green().bold());
        }
        CheckStatus::Missing => {
            println!("{} Some state is missing:", "MISSING".yellow().bold());
            print_items(&report.missing, "-");
            println!();
            println!("Run {} to repair.", "dnr converge <name>".cyan());
        }
        CheckStatus::Drifted => {
            println!("{} Installed rules have drifted:", "DRIFTED".red().bold());
            print_items(&report.drifted, "!");
            if !report.missing.is_empty() {
                println!();
                println!("{} Also missing:", "MISSING".yellow().bold());
                print_items(&report.missing, "-");
            }
            println!();
            println!("Run {} to repair.", "dnr converge <name>".cyan());
        }
        CheckStatus::Broken => {
            println!("{} Version records are unreadable:", "BROKEN".red().bold());
            for msg in &report.messages {
                println!("   {} {}", "!".red(), msg);
            }
            println!();
            println!("The next notification rewrites the record.");
            return;
        }
    }
    for msg in &report.messages {
        println!("   {}", msg.dimmed());
    }
}

fn print_items(items: &[DriftItem], marker: &str) {
    for item in items {
        let config = item.config.map_or("-", ConfigName::as_str);
        let rule = item
            .rule_id
            .map(|id| format!("rule {id}"))
            .unwrap_or_default();
        println!(
            "   {} {} {}: {}",
            marker.yellow(),
            config.cyan(),
            rule.dimmed(),
            item.description
        );
    }
}
