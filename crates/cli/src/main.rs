use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use herdgen_core::{HerdIdAllocator, RegistryKey};
use herdgen_testkit::{EventRecord, JsonlSink, SpawnMetrics};
use herdgen_world::{
    load_creature_defs, BlockDescriptor, BlockRegistry, ChunkPos, ChunkStorage, ColumnContext,
    CreatureSpawnRule, CreatureTypeDef, DistributionKind, EntityClassRegistry,
    GenerationBuffer, GenerationPass, LiveEntities, NatFloat, PendingEntities, PlayStyleFlags,
    SpawnCatalog, SpawnConfig, SpawnPlanner, SpawnTargets, WorldView, WorldgenSpawnConditions,
};
use tracing::{info, warn};

mod terrain;

use terrain::NoiseTerrain;

#[derive(Parser, Debug)]
#[command(author, version, about = "Preview worldgen creature groups over noise terrain", long_about = None)]
struct Args {
    /// World seed
    #[arg(long, default_value_t = 1337)]
    seed: u64,
    /// World play style (creative, survival, automate, wilderness)
    #[arg(long, default_value = "survival")]
    play_style: String,
    /// Columns processed in each direction from the origin column
    #[arg(long, default_value_t = 4)]
    radius: i32,
    /// JSON creature definitions (defaults to a built-in set)
    #[arg(long)]
    creatures: Option<PathBuf>,
    /// JSON block definitions (defaults to the preview terrain blocks)
    #[arg(long)]
    blocks: Option<PathBuf>,
    /// TOML spawn config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write every emitted group to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,
    /// Write aggregate metrics as JSON
    #[arg(long)]
    metrics: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let play_style = PlayStyleFlags::from_play_style_name(&args.play_style)
        .with_context(|| format!("unknown play style {}", args.play_style))?;
    let spawn_pass = SpawnPlanner::runs_for(GenerationPass::PreDone, play_style);
    if !spawn_pass {
        warn!(play_style = %args.play_style, "Play style has no worldgen spawn pass");
    }
    let config = match &args.config {
        Some(path) => SpawnConfig::load_strict(path)
            .with_context(|| format!("failed to load spawn config from {}", path.display()))?,
        None => SpawnConfig::default(),
    };
    let blocks = match &args.blocks {
        Some(path) => BlockRegistry::load_from_path(path)
            .with_context(|| format!("failed to load blocks from {}", path.display()))?,
        None => default_blocks()?,
    };
    let defs = match &args.creatures {
        Some(path) => load_creature_defs(path)
            .with_context(|| format!("failed to load creatures from {}", path.display()))?,
        None => default_creatures()?,
    };

    let catalog = Arc::new(SpawnCatalog::build(&defs, &EntityClassRegistry::standard()));
    if catalog.is_empty() {
        warn!("No creature has worldgen spawn conditions; nothing will spawn");
    }
    info!(
        seed = args.seed,
        radius = args.radius,
        groups = catalog.len(),
        "Starting spawn preview"
    );

    let radius = args.radius.max(0);
    let mut terrain = NoiseTerrain::new(args.seed, config.sea_level, config.region_size);
    let mut generating = GenerationBuffer::new();
    for x in -radius - 1..=radius + 1 {
        for z in -radius - 1..=radius + 1 {
            generating.insert(terrain.generate_chunk(ChunkPos::new(x, z)));
        }
    }

    let side = (2 * radius + 1) as usize;
    let mut live = ChunkStorage::new(side * side);
    let mut pending = PendingEntities::new();
    let mut live_entities = LiveEntities::new();
    let mut planner = SpawnPlanner::new(
        args.seed,
        config.clone(),
        catalog,
        Arc::new(HerdIdAllocator::new()),
    );
    let mut sink = args.events.as_ref().map(JsonlSink::create).transpose()?;
    let mut metrics = SpawnMetrics::default();
    let mut seq = 0u64;

    for x in -radius..=radius {
        for z in -radius..=radius {
            let pos = ChunkPos::new(x, z);
            if !spawn_pass {
                generating.promote(pos, &mut live);
                continue;
            }
            let climate = terrain.climate_for(pos);
            let Some(chunk) = generating.get(pos) else {
                continue;
            };
            let ctx = ColumnContext::new(chunk, climate);
            let world = WorldView::new(&generating, &live, &blocks, config.world_bounds);
            let mut targets = SpawnTargets::new(&mut pending, &mut live_entities);
            let report = planner.on_chunk_column_ready(&ctx, &world, &mut targets);

            metrics.record(&report);
            if let Some(sink) = sink.as_mut() {
                for emission in &report.emissions {
                    sink.write(&EventRecord {
                        seq,
                        kind: "SpawnGroup",
                        payload: emission,
                    })?;
                    seq += 1;
                }
            }

            // The column is finished: its chunk and entities go live.
            generating.promote(pos, &mut live);
            live_entities.extend(pending.take(pos));
        }
    }

    if let Some(sink) = sink.as_mut() {
        sink.flush()?;
    }
    if let Some(path) = &args.metrics {
        metrics
            .write_json(path)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    }

    info!(
        columns = metrics.columns,
        tries = metrics.tries,
        groups = metrics.groups,
        discarded = metrics.discarded,
        entities = metrics.entities,
        live = live_entities.len(),
        pending = pending.len(),
        "Spawn preview finished"
    );
    for (code, count) in &metrics.by_code {
        println!("{code:<24} {count}");
    }
    Ok(())
}

fn key(code: &str) -> Result<RegistryKey> {
    RegistryKey::parse(code).with_context(|| format!("invalid registry key {code}"))
}

/// Blocks matching the ids in [`terrain`].
fn default_blocks() -> Result<BlockRegistry> {
    Ok(BlockRegistry::new(vec![
        BlockDescriptor::passable(key("air")?),
        BlockDescriptor::solid(key("stone")?),
        BlockDescriptor::solid(key("soil-medium")?),
        BlockDescriptor::solid(key("sand")?),
        BlockDescriptor::passable(key("water")?).with_spawn_rule(CreatureSpawnRule::Never),
    ]))
}

fn default_creatures() -> Result<Vec<CreatureTypeDef>> {
    let surface = |tries: f32, group_size: NatFloat| WorldgenSpawnConditions {
        min_light_level: 7,
        try_only_surface: true,
        tries_per_chunk: NatFloat::constant(tries),
        group_size,
        ..Default::default()
    };

    Ok(vec![
        CreatureTypeDef::new(key("wolf-male")?)
            .with_hitbox(0.9, 1.2)
            .with_worldgen(WorldgenSpawnConditions {
                min_temp: -15.0,
                max_temp: 20.0,
                companions: vec![key("wolf-female")?, key("wolf-pup")?],
                ..surface(0.03, NatFloat::new(3.0, 1.0, DistributionKind::Uniform))
            }),
        CreatureTypeDef::new(key("wolf-female")?).with_hitbox(0.9, 1.1),
        CreatureTypeDef::new(key("wolf-pup")?).with_hitbox(0.6, 0.7),
        CreatureTypeDef::new(key("deer")?)
            .with_hitbox(1.0, 1.5)
            .with_worldgen(WorldgenSpawnConditions {
                min_temp: -5.0,
                max_temp: 30.0,
                min_rain: 0.3,
                ..surface(0.05, NatFloat::new(4.0, 2.0, DistributionKind::Gaussian))
            }),
        CreatureTypeDef::new(key("hare")?)
            .with_hitbox(0.5, 0.5)
            .with_worldgen(surface(0.1, NatFloat::new(1.5, 0.5, DistributionKind::Uniform))),
    ])
}
