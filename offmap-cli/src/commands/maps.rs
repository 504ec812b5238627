//! `offmap list`, `delete`, `clear` and `stats`

use console::style;
use dialoguer::Confirm;
use offmap::config::ConfigFile;
use offmap::store::NEARLY_FULL_FRACTION;

use super::open_maps;
use crate::error::CliError;

/// Lists downloaded maps.
pub fn list(config: &ConfigFile) -> Result<(), CliError> {
    let maps = open_maps(config)?;
    let stored = maps.stored_maps();

    if stored.is_empty() {
        println!("No maps downloaded.");
        return Ok(());
    }

    for map in &stored {
        println!(
            "  {:<12} {:<24} {:>4} tiles  zoom {:<2}  {}",
            style(&map.id).bold(),
            map.name,
            map.tile_count(),
            map.zoom,
            map.downloaded_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    Ok(())
}

pub fn delete(config: &ConfigFile, area_id: &str) -> Result<(), CliError> {
    let maps = open_maps(config)?;
    if !maps.is_downloaded(area_id) {
        println!("{} is not downloaded.", area_id);
        return Ok(());
    }

    maps.delete_map(area_id)?;
    println!("{} Deleted {}", style("✓").green().bold(), area_id);
    Ok(())
}

pub fn clear(config: &ConfigFile, yes: bool) -> Result<(), CliError> {
    let maps = open_maps(config)?;
    let count = maps.stored_maps().len();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete all {} downloaded maps?", count))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    maps.clear_maps()?;
    println!("{} Cleared {} maps", style("✓").green().bold(), count);
    Ok(())
}

pub fn stats(config: &ConfigFile) -> Result<(), CliError> {
    let maps = open_maps(config)?;
    let stats = maps.storage_stats();

    println!("Maps:     {}", stats.map_count);
    println!(
        "Storage:  {:.2} MB of {:.2} MB ({:.0}%)",
        stats.used_mb(),
        stats.capacity_mb(),
        stats.fraction() * 100.0
    );

    if stats.is_nearly_full() {
        println!(
            "{}",
            style(format!(
                "Storage is over {:.0}% full. Delete maps you no longer need.",
                NEARLY_FULL_FRACTION * 100.0
            ))
            .yellow()
        );
    }
    Ok(())
}
