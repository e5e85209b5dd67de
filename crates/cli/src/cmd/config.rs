//! Configuration management command

use crate::config;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let cfg = config::load()?;
    let config_path = config::config_file_path()?;

    println!("{}", "Keepsake Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[sync]".yellow());
    println!(
        "  {} = {} {}",
        "debounce_delay_ms".cyan(),
        cfg.sync.debounce_delay_ms,
        format!("({}s after the last edit)", cfg.sync.debounce_delay_ms as f64 / 1000.0).dimmed()
    );
    println!(
        "  {} = {}",
        "suppression_window_ms".cyan(),
        cfg.sync.suppression_window_ms
    );
    println!(
        "  {} = {}",
        "close_timeout_ms".cyan(),
        cfg.sync.close_timeout_ms
    );

    println!("\n{}", "[store]".yellow());
    match &cfg.store.path {
        Some(path) => println!("  {} = {}", "path".cyan(), path.display()),
        None => println!("  {} = {}", "path".cyan(), "(platform default)".dimmed()),
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  debounce_delay_ms: 100-60000");
    println!("  suppression_window_ms: 0-10000");
    println!("  close_timeout_ms: 500-120000");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let cfg = config::load()?;

    let value = match key {
        "sync.debounce_delay_ms" => cfg.sync.debounce_delay_ms.to_string(),
        "sync.suppression_window_ms" => cfg.sync.suppression_window_ms.to_string(),
        "sync.close_timeout_ms" => cfg.sync.close_timeout_ms.to_string(),
        "store.path" => cfg
            .store
            .path
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'keep config list' to see available keys.",
            key
        ),
    };

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut cfg = config::load()?;

    match key {
        "sync.debounce_delay_ms" => {
            cfg.sync.debounce_delay_ms = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "sync.suppression_window_ms" => {
            cfg.sync.suppression_window_ms = value
                .parse()
                .context("Invalid value: must be a non-negative integer")?;
        }
        "sync.close_timeout_ms" => {
            cfg.sync.close_timeout_ms = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "store.path" => {
            cfg.store.path = Some(value.into());
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'keep config list' to see available keys.",
            key
        ),
    }

    // Validate before saving
    cfg.validate().context("Invalid configuration value")?;
    config::save(&cfg)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path
pub async fn run_path() -> Result<()> {
    let config_path = config::config_file_path()?;
    println!("{}", config_path.display());
    if !config_path.exists() {
        println!("{}", "File does not exist. 'keep init' will create it.".yellow());
    }
    Ok(())
}
