//! Prompt Commands
//!
//! `prepare-prompt` renders what would be sent; `tokens` estimates its size.

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, load_agent};
use crate::types::Result;

/// Print the markdown view and provider payload for a run, without sending it
pub fn prepare(
    ctx: &CommandContext,
    root: &Path,
    agent_path: &Path,
    prompt: &str,
    paths: &[String],
    format: &str,
) -> Result<()> {
    let agent = load_agent(agent_path)?;
    let contents = ctx.gather_contents(root, &agent, paths)?;
    let prepared = ctx
        .runner
        .prepare_prompt(&agent.run_request(prompt), &contents)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&prepared)?),
        "payload" => println!("{}", prepared.json_prompt),
        _ => println!("{}", prepared.markdown_prompt),
    }
    Ok(())
}

/// Print a token estimate for a run
pub fn tokens(
    ctx: &CommandContext,
    root: &Path,
    agent_path: &Path,
    prompt: &str,
    paths: &[String],
    format: &str,
) -> Result<()> {
    let agent = load_agent(agent_path)?;
    let contents = ctx.gather_contents(root, &agent, paths)?;
    let count = ctx.runner.estimate_tokens(&agent, prompt, &contents);

    if format == "json" {
        let report = serde_json::json!({
            "provider": agent.llm_config.provider,
            "model": agent.llm_config.model,
            "files": contents.len(),
            "tokens": count,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let output = Output::new();
        output.section("Token estimate");
        output.field("Provider", &agent.llm_config.provider);
        output.field("Model", &agent.llm_config.model);
        output.field("Files", contents.len());
        output.field("Tokens", count);
    }
    Ok(())
}
