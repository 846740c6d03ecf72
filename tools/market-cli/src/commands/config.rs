//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let backend = &ctx.config.backend;
    ctx.output.info("[backend]");
    ctx.output.kv("url", &backend.url);
    let key = match (&backend.api_key, backend.resolve_api_key()) {
        (Some(_), _) => "set".to_string(),
        (None, Some(_)) => format!("from {}", market_data::BackendConfig::API_KEY_ENV),
        (None, None) => "not set".to_string(),
    };
    ctx.output.kv("api_key", &key);
    ctx.output.kv("table", &backend.table);
    ctx.output.kv("select", &backend.select);
    ctx.output.kv("timeout_ms", &backend.timeout_ms.to_string());
    ctx.output.kv("max_retries", &backend.max_retries.to_string());

    let search = &ctx.config.search;
    ctx.output.info("[search]");
    ctx.output.kv("page_size", &search.page_size.to_string());
    ctx.output.kv("debounce_ms", &search.debounce_ms.to_string());
    ctx.output.kv("history_mode", &format!("{:?}", search.history_mode).to_lowercase());
    ctx.output.kv("path", &search.path);

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = ctx.config.check();

    for warning in &warnings {
        ctx.output.warn(warning);
    }

    if !errors.is_empty() {
        for error in &errors {
            ctx.output.error(error);
        }
        bail!("Configuration has {} error(s)", errors.len());
    }

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "valid": true, "warnings": warnings }));
    } else {
        ctx.output.success("Configuration is valid");
    }
    Ok(())
}
