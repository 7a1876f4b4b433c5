//! Rules command implementation

use dnr_core::ConfigName;
use dnr_rules::Rule;

use crate::context::EngineContext;
use crate::error::Result;

/// Print the rules installed in `name`'s partition as a JSON array.
pub async fn run_rules(ctx: &EngineContext, name: ConfigName) -> Result<()> {
    let range = name.rule_id_range();
    let rules: Vec<Rule> = ctx
        .engine
        .rule_table()
        .dynamic_rules()
        .await?
        .into_iter()
        .filter(|rule| range.contains(rule.id))
        .collect();

    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}
