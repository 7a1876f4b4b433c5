//! Status command implementation

use colored::Colorize;
use dnr_core::ConfigName;
use serde::Serialize;

use crate::context::EngineContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ConfigStatus {
    config: ConfigName,
    tracked: bool,
    range: String,
    record_etag: Option<String>,
    sentinel_etag: Option<String>,
    installed_rules: usize,
}

/// Show each configuration's tags and installed rule count.
pub async fn run_status(ctx: &EngineContext, json: bool) -> Result<()> {
    let report = ctx.engine.check_all().await?;
    let statuses: Vec<ConfigStatus> = report
        .partitions
        .iter()
        .map(|p| ConfigStatus {
            config: p.config,
            tracked: ctx.engine.has_generator(p.config),
            range: p.config.rule_id_range().to_string(),
            record_etag: p.record_etag.clone(),
            sentinel_etag: p.sentinel_etag.clone(),
            installed_rules: p.installed_rules,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!(
        "{} manifest v{}, rules at {}",
        "dnr".green().bold(),
        u8::from(ctx.config.manifest_version),
        ctx.state().rules.display()
    );
    for status in &statuses {
        let tag = |t: &Option<String>| t.clone().unwrap_or_else(|| "-".to_string());
        println!();
        println!(
            "{} {}{}",
            status.config.as_str().cyan().bold(),
            status.range.dimmed(),
            if status.tracked { "" } else { " (no generator)" }
        );
        println!("   record:   {}", tag(&status.record_etag));
        println!("   sentinel: {}", tag(&status.sentinel_etag));
        println!("   rules:    {}", status.installed_rules);
    }
    Ok(())
}
