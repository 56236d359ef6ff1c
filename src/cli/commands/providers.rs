//! Providers Command
//!
//! List registered LLM providers and configured credential ids.

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::Result;

pub fn run(ctx: &CommandContext, format: &str) -> Result<()> {
    let providers = ctx.runner.providers().names();
    let credentials: Vec<_> = ctx
        .config
        .credentials
        .iter()
        .map(|c| serde_json::json!({"id": c.id, "name": c.name, "provider": c.provider}))
        .collect();

    if format == "json" {
        let report = serde_json::json!({
            "providers": providers,
            "credentials": credentials,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let output = Output::new();
    output.section("Providers");
    for name in &providers {
        println!("  {}", name);
    }

    output.section("Credentials");
    if ctx.config.credentials.is_empty() {
        output.warning("No credentials configured. Add [[credentials]] to config.toml.");
    }
    for entry in &ctx.config.credentials {
        output.field(&entry.id, format!("{} ({})", entry.name, entry.provider));
    }
    Ok(())
}
