//! Initialize the journal store and default configuration

use crate::{config, util};
use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let cfg = config::load()?;
    let config_path = config::config_file_path()?;

    if !config_path.exists() {
        config::save(&cfg)?;
        println!("{} Created config at {}", "✓".green(), config_path.display());
    } else {
        println!("Config already present at {}", config_path.display());
    }

    let store = util::open_store(&cfg)?;
    let store_path = cfg.store_path()?;
    println!(
        "{} Journal store ready at {} ({} entities)",
        "✓".green(),
        store_path.display(),
        store.count()
    );
    println!();
    println!("Next steps:");
    println!("  - 'keep new memory --set title=...' to record a memory");
    println!("  - 'keep list' to browse the timeline");
    println!("  - 'keep edit <id> --set field=value' to edit with auto-save");

    Ok(())
}
