//! Show one entity in detail

use crate::{config, util};
use anyhow::{bail, Result};
use owo_colors::OwoColorize;

pub async fn run(id: &str) -> Result<()> {
    let cfg = config::load()?;
    let store = util::open_store(&cfg)?;

    let id = util::parse_id(id)?;
    let Some(entity) = store.get(id)? else {
        bail!("No entity with ID {id}");
    };

    println!("{} {}", entity.kind.to_string().cyan().bold(), id.to_string().yellow());
    if entity.fields.is_empty() {
        println!("  {}", "(no fields)".dimmed());
    }
    for (name, value) in &entity.fields {
        println!("  {:14} {}", name.cyan(), util::format_field_value(value));
    }

    Ok(())
}
