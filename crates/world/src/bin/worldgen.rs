//! Headless world generation driver.
//!
//! Generates the chunk neighbourhood around the origin for a preset (or
//! `world.ron` when present) and reports what the pipeline produced:
//! water classification, lake basins, biome distribution, mesh sizes.
//!
//! Usage: `worldgen [preset-name] [seed]`

use anyhow::{bail, Result};
use glam::Vec3;
use procgen::{find_preset, WaterType, ALL_BIOMES, PRESETS};
use world::{ChunkManager, WorldSettings};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut settings = if std::path::Path::new("world.ron").exists() {
        WorldSettings::load("world.ron")
    } else {
        WorldSettings::default()
    };

    if let Some(name) = args.first() {
        let Some(preset) = find_preset(name) else {
            let names: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
            bail!("unknown preset '{}' (available: {})", name, names.join(", "));
        };
        settings.intent = preset.intent;
        log::info!("preset: {} - {}", preset.name, preset.description);
    }

    if let Some(seed) = args.get(1) {
        settings.seed = seed.parse()?;
    }

    log::info!(
        "generating world (seed {}, chunk size {}, view distance {})",
        settings.seed,
        settings.chunk_size,
        settings.view_distance
    );

    let mut manager = ChunkManager::new(settings);
    manager.update(Vec3::ZERO);

    let mut total_rivers = 0usize;
    let mut total_lakes = 0usize;
    let mut total_vertices = 0usize;
    let mut water_cells = [0usize; 5];
    let mut biome_cells = vec![0usize; ALL_BIOMES.len()];

    for chunk in manager.loaded_chunks() {
        total_rivers += chunk.rivers().network().rivers.len();
        total_lakes += chunk.lakes().network().lakes.len();
        total_vertices += chunk.terrain_mesh().vertices.len()
            + chunk.river_mesh().vertices.len()
            + chunk.lake_mesh().vertices.len();

        let cells = manager.settings().chunk_size as i32;
        for z in 0..cells {
            for x in 0..cells {
                water_cells[chunk.water_type_at(x, z) as usize] += 1;
                biome_cells[chunk.dominant_biome_at(x, z) as usize] += 1;
            }
        }
    }

    log::info!(
        "{} chunks, {} river paths, {} lake basins, {} mesh vertices",
        manager.loaded_chunk_count(),
        total_rivers,
        total_lakes,
        total_vertices
    );
    log::info!(
        "water cells: {} stream, {} river, {} lake, {} ocean",
        water_cells[WaterType::Stream as usize],
        water_cells[WaterType::River as usize],
        water_cells[WaterType::Lake as usize],
        water_cells[WaterType::Ocean as usize]
    );

    let total: usize = biome_cells.iter().sum();
    for (biome, &count) in ALL_BIOMES.iter().zip(&biome_cells) {
        if count > 0 {
            log::info!(
                "  {:<14} {:>5.1}%",
                biome.name(),
                count as f32 / total as f32 * 100.0
            );
        }
    }

    if let Some(height) = manager.height_at(0.0, 0.0) {
        log::info!("height at origin: {:.2} (sea level {:.2})", height, manager.sea_level());
    }

    // Dump debug colormaps for the origin chunk so field problems are
    // inspectable without a renderer attached.
    if let Some(chunk) = manager.chunk_at_coord(0, 0) {
        let views = [
            ("moisture", procgen::debug::moisture_view(chunk.hydrology().data())),
            ("water", procgen::debug::water_type_view(chunk.hydrology().data())),
            ("biomes", procgen::debug::biome_view(chunk.biomes())),
            ("materials", procgen::debug::material_view(chunk.materials())),
        ];
        for (name, view) in views {
            let path = format!("debug_{name}.rgba");
            if let Err(e) = std::fs::write(&path, view.to_bytes()) {
                log::warn!("could not write {path}: {e}");
            } else {
                log::info!("wrote {path} ({}x{} RGBA)", view.width, view.height);
            }
        }
    }

    Ok(())
}
