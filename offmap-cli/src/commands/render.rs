//! `offmap render`

use std::path::PathBuf;

use console::style;
use offmap::app::{AppConfig, ConfiguredMaps};
use offmap::compositor::CanvasExtent;
use offmap::config::ConfigFile;

use crate::error::CliError;

pub fn run(
    config: &ConfigFile,
    area_id: &str,
    output: Option<PathBuf>,
    extent: Option<&str>,
) -> Result<(), CliError> {
    let mut app_config = AppConfig::from_config_file(config);
    if let Some(extent) = extent {
        let extent: CanvasExtent = extent
            .parse()
            .map_err(|e| CliError::Config(format!("{}", e)))?;
        app_config.compositor = app_config.compositor.with_extent(extent);
    }
    let maps = ConfiguredMaps::from_config(&app_config)?;

    let image = maps.render(area_id)?;
    let png = image.encode_png().map_err(offmap::app::AppError::from)?;
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.png", area_id)));
    std::fs::write(&output, png)
        .map_err(|e| CliError::Output(format!("{}: {}", output.display(), e)))?;

    println!(
        "{} Wrote {}x{} map to {}",
        style("✓").green().bold(),
        image.width(),
        image.height(),
        output.display()
    );
    if !image.skipped.is_empty() {
        println!(
            "{}",
            style(format!("{} tiles could not be decoded", image.skipped.len())).yellow()
        );
    }
    Ok(())
}
