//! Create a new memory or chapter

use crate::{config, util};
use anyhow::Result;
use keepsake_core::{Entity, EntityKind};
use owo_colors::OwoColorize;

pub async fn run(kind: &str, set: &[String]) -> Result<()> {
    let cfg = config::load()?;
    let store = util::open_store(&cfg)?;

    let kind = match kind {
        "chapter" => EntityKind::Chapter,
        _ => EntityKind::Memory,
    };

    let mut entity = Entity::new(kind);
    for pair in set {
        let (field, value) = util::parse_pair(pair)?;
        entity.fields.insert(field, util::parse_field_value(&value));
    }

    store.create(&entity)?;

    println!(
        "{} Created {} {}",
        "✓".green(),
        kind,
        entity.id.to_string().yellow()
    );
    if !entity.fields.is_empty() {
        for (name, value) in &entity.fields {
            println!("  {} = {}", name.cyan(), util::format_field_value(value));
        }
    }

    Ok(())
}
