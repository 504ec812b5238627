//! `offmap areas`

use console::style;
use offmap::config::ConfigFile;

use super::open_maps;
use crate::error::CliError;

pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let maps = open_maps(config)?;

    println!("Available areas (zoom {})", maps.zoom());
    println!();
    for area in maps.catalog().areas() {
        let tiles = maps.plan(&area.id).map(|r| r.len()).unwrap_or(0);
        let marker = if maps.is_downloaded(&area.id) {
            style("✓ offline").green().to_string()
        } else {
            style("not downloaded").dim().to_string()
        };

        println!(
            "  {:<12} {:<24} ${:<6.2} {:>4} tiles  {}",
            style(&area.id).bold(),
            area.name,
            area.price,
            tiles,
            marker
        );
        println!("  {:<12} {}", "", style(&area.description).dim());
        if !area.landmarks.is_empty() {
            println!("  {:<12} Landmarks: {}", "", area.landmarks.join(", "));
        }
    }
    Ok(())
}
