//! List entities in the journal

use crate::{config, util};
use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn run(limit: Option<usize>) -> Result<()> {
    let cfg = config::load()?;
    let store = util::open_store(&cfg)?;

    let entities = store.list()?;
    let total = entities.len();
    let shown = limit.unwrap_or(total);

    println!("{}", "Timeline".bold());
    if entities.is_empty() {
        println!("  {}", "No entities yet. Try 'keep new memory'".dimmed());
        return Ok(());
    }

    for entity in entities.iter().take(shown) {
        println!(
            "  {}  {:7}  {}",
            entity.id.to_string().yellow(),
            entity.kind.to_string().cyan(),
            util::title_of(entity)
        );
    }
    if shown < total {
        println!("  ... and {} more", total - shown);
    }

    Ok(())
}
