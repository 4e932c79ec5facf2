use anyhow::{Context, Result};

use racecard::config::Config;
use racecard::render::format_datetime;
use racecard::resolver::ManifestResolver;
use racecard::selection::{QueryState, SelectionCoordinator};

/// Resolve the manifest and print every race
pub async fn races(config: Config) -> Result<()> {
    let resolver = ManifestResolver::from_config(&config).context("Failed to create resolver")?;
    let resolution = resolver.resolve_detailed().await;

    for failure in &resolution.failures {
        println!("  skipped {}: {}", failure.location, failure.error);
    }

    let Some(source) = &resolution.source else {
        println!("{}", config.site.empty_message);
        return Ok(());
    };

    println!("Source: {} (candidate #{})", source.location, source.index + 1);
    println!("{:-<60}", "");
    for race in resolution.manifest.iter() {
        let when = race.datetime.as_deref().map(format_datetime).unwrap_or_default();
        println!(
            "{:<16} {:<16} {} ({} attachments, {} predictions)",
            race.id,
            when,
            race.label(),
            race.attachments.len(),
            race.predictions.len()
        );
    }
    println!("{:-<60}", "");
    println!("Total: {} races", resolution.manifest.len());

    Ok(())
}

/// Print the race that `race_id` selects
pub async fn show(config: Config, race_id: Option<String>) -> Result<()> {
    let resolver = ManifestResolver::from_config(&config).context("Failed to create resolver")?;
    let manifest = resolver.resolve().await;

    let query = match &race_id {
        Some(id) => QueryState::new().with_param(&config.selection.query_param, id),
        None => QueryState::new(),
    };
    let coordinator =
        SelectionCoordinator::new(manifest, query, config.selection.query_param.as_str());

    let Some(race) = coordinator.active() else {
        println!("{}", config.site.empty_message);
        return Ok(());
    };

    if let Some(requested) = race_id.as_deref().filter(|id| *id != race.id) {
        println!("Unknown race {requested}, showing the first race");
    }

    println!("{} [{}]", race.label(), race.id);
    if let Some(datetime) = &race.datetime {
        println!("  Date: {}", format_datetime(datetime));
    }
    if let Some(track) = &race.track {
        println!("  Track: {track}");
    }
    if let Some(distance) = &race.distance {
        println!("  Distance: {distance}");
    }

    for attachment in &race.attachments {
        println!(
            "  [{}] {} -> {}",
            attachment.kind.as_str(),
            attachment.label,
            attachment.src
        );
    }

    for (rank, prediction) in race.predictions.iter().enumerate() {
        let draw = prediction
            .draw
            .map(|d| format!("（枠{d}）"))
            .unwrap_or_default();
        println!(
            "  {}. {}{}  勝率 {}%",
            rank + 1,
            prediction.horse_name,
            draw,
            prediction.win_percent()
        );
    }

    Ok(())
}
