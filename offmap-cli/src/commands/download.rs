//! `offmap download`

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use offmap::app::{AppConfig, ConfiguredMaps};
use offmap::config::ConfigFile;
use offmap::download::DownloadTracker;

use crate::error::CliError;

/// Bar length; progress arrives as a fraction.
const BAR_LENGTH: u64 = 1000;

pub async fn run(config: &ConfigFile, area_id: &str, zoom: Option<u8>) -> Result<(), CliError> {
    let mut app_config = AppConfig::from_config_file(config);
    if let Some(zoom) = zoom {
        app_config = app_config.with_zoom(zoom);
    }
    let maps = ConfiguredMaps::from_config(&app_config)?;

    let area = maps.area(area_id)?;
    let range = maps.plan(area_id)?;
    println!(
        "Downloading {} ({} tiles at zoom {})",
        style(&area.name).bold(),
        range.len(),
        maps.zoom()
    );

    let bar = progress_bar();
    let mut tracker = DownloadTracker::new();
    let result = maps
        .download_tracked(&mut tracker, area_id, |fraction| {
            bar.set_position((fraction * BAR_LENGTH as f64).round() as u64);
        })
        .await;

    match result {
        Ok(report) => {
            bar.finish_and_clear();
            println!(
                "{} {} available offline: {} tiles, store now {:.2} MB",
                style("✓").green().bold(),
                area.name,
                report.tiles,
                report.usage_mb
            );
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            Err(e.into())
        }
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(BAR_LENGTH);
    let style = ProgressStyle::default_bar()
        .template("[{bar:40.cyan/blue}] {percent}% {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    bar.set_style(style);
    bar
}
