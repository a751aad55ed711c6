#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line driver that runs a headless grove simulation.
//!
//! Scatters a seeded starting population over the grid, advances the
//! scheduler in fixed steps for the requested duration and prints the final
//! entity log, one `name x y image_index` line per entity.

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use grove_core::{EntityKind, Point, WELCOME_BANNER};
use grove_system_behavior::{advance_to, schedule_initial_actions, GARDEN_BACKGROUND_KEY};
use grove_system_scheduler::EventScheduler;
use grove_world::factory::{self, EntityTemplate};
use grove_world::{query, SpriteCatalog, WorldModel};

const STEP: Duration = Duration::from_millis(100);
const PLACEMENT_ATTEMPTS: u32 = 100;

const PERSON_ACTION_PERIOD: Duration = Duration::from_millis(600);
const PERSON_ANIMATION_PERIOD: Duration = Duration::from_millis(150);
const PERSON_RESOURCE_LIMIT: u32 = 4;
const FAIRY_ACTION_PERIOD: Duration = Duration::from_millis(400);
const FAIRY_ANIMATION_PERIOD: Duration = Duration::from_millis(100);
const CAT_ACTION_PERIOD: Duration = Duration::from_millis(700);
const CAT_ANIMATION_PERIOD: Duration = Duration::from_millis(180);
const DOG_ACTION_PERIOD: Duration = Duration::from_millis(500);
const DOG_ANIMATION_PERIOD: Duration = Duration::from_millis(120);
const OBSTACLE_ANIMATION_PERIOD: Duration = Duration::from_millis(900);

/// Headless grove simulation runner.
#[derive(Parser, Debug)]
#[command(name = "grove", about = "Runs a headless grove simulation")]
struct Args {
    /// Number of grid rows.
    #[arg(long, default_value_t = 20)]
    rows: u32,

    /// Number of grid columns.
    #[arg(long, default_value_t = 30)]
    cols: u32,

    /// Wall-clock seconds worth of steps to run.
    #[arg(long, default_value_t = 30)]
    duration: u64,

    /// Seed for the starting population scatter.
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Clock preset scaling how fast simulated time passes.
    #[arg(long, value_enum, default_value_t = Speed::Normal)]
    speed: Speed,

    /// Cell painted as garden ground, given as `x,y`.
    #[arg(long, value_parser = parse_cell)]
    garden: Option<Point>,
}

/// Speed-up presets for the simulated clock.
///
/// Wall-clock step time is divided by the scale, so smaller scales advance
/// simulated time faster.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Speed {
    /// Simulated time tracks the step clock one to one.
    Normal,
    /// Twice as fast.
    Fast,
    /// Four times as fast.
    Faster,
    /// Ten times as fast.
    Fastest,
}

impl Speed {
    const fn time_scale(self) -> f64 {
        match self {
            Self::Normal => 1.0,
            Self::Fast => 0.5,
            Self::Faster => 0.25,
            Self::Fastest => 0.10,
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Normal => "normal",
            Self::Fast => "fast",
            Self::Faster => "faster",
            Self::Fastest => "fastest",
        };
        f.write_str(label)
    }
}

fn parse_cell(raw: &str) -> Result<Point, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{raw}`"))?;
    let x = x.trim().parse::<i32>().map_err(|err| err.to_string())?;
    let y = y.trim().parse::<i32>().map_err(|err| err.to_string())?;
    Ok(Point::new(x, y))
}

/// Entry point for the grove command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("grove=info")
        .init();

    let args = Args::parse();
    println!("{WELCOME_BANNER}");
    tracing::info!(
        rows = args.rows,
        cols = args.cols,
        seed = args.seed,
        speed = %args.speed,
        "starting simulation"
    );

    let catalog = SpriteCatalog::new()
        .with_frames(EntityKind::Tree, 4)
        .with_frames(EntityKind::Sapling, 2)
        .with_frames(EntityKind::Fairy, 4)
        .with_frames(EntityKind::PersonSearching, 4)
        .with_frames(EntityKind::PersonFull, 4)
        .with_frames(EntityKind::Cat, 3)
        .with_frames(EntityKind::Orange, 3)
        .with_frames(EntityKind::Pink, 2)
        .with_frames(EntityKind::Dog, 3)
        .with_frames(EntityKind::Obstacle, 6);
    let mut world = WorldModel::new(args.rows, args.cols, catalog);
    let mut scheduler = EventScheduler::new();

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    populate_scene(&mut world, &mut scheduler, &mut rng);
    if let Some(cell) = args.garden {
        if !world.within_bounds(cell) {
            bail!("garden cell {cell} lies outside the {}x{} grid", args.cols, args.rows);
        }
        plant_garden(&mut world, &mut scheduler, cell);
        tracing::info!(%cell, "garden ground painted");
    }
    tracing::info!(entities = world.entities().count(), "scene populated");

    let scale = args.speed.time_scale();
    let total = Duration::from_secs(args.duration);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        elapsed = (elapsed + STEP).min(total);
        advance_to(&mut world, &mut scheduler, elapsed.div_f64(scale));
    }
    tracing::info!(
        simulated_ms = scheduler.current_time().as_millis() as u64,
        entities = world.entities().count(),
        "simulation finished"
    );

    for line in query::entity_log(&world) {
        println!("{line}");
    }
    Ok(())
}

/// Scatters the demo population over free cells, arming each entity's
/// initial actions as it lands.
fn populate_scene(world: &mut WorldModel, scheduler: &mut EventScheduler, rng: &mut ChaCha8Rng) {
    let area = world.num_rows() * world.num_cols();
    let tree_count = (area / 50).max(3);
    let stump_count = (area / 120).max(1);
    let obstacle_count = area / 80;

    for index in 0..tree_count {
        if let Some(cell) = random_free_cell(world, rng) {
            let defaults = world.tree_defaults();
            let frames = world.catalog().frames(EntityKind::Tree);
            place(
                world,
                scheduler,
                factory::tree_with_defaults(format!("tree_{index}"), cell, defaults, frames),
            );
        }
    }
    for index in 0..stump_count {
        if let Some(cell) = random_free_cell(world, rng) {
            let frames = world.catalog().frames(EntityKind::Stump);
            place(
                world,
                scheduler,
                factory::stump(format!("stump_{index}"), cell, frames),
            );
        }
    }
    for index in 0..obstacle_count {
        if let Some(cell) = random_free_cell(world, rng) {
            let frames = world.catalog().frames(EntityKind::Obstacle);
            place(
                world,
                scheduler,
                factory::obstacle(
                    format!("rock_{index}"),
                    cell,
                    OBSTACLE_ANIMATION_PERIOD,
                    frames,
                ),
            );
        }
    }
    for index in 0..2 {
        if let Some(cell) = random_free_cell(world, rng) {
            let frames = world.catalog().frames(EntityKind::House);
            place(
                world,
                scheduler,
                factory::house(format!("house_{index}"), cell, frames),
            );
        }
    }
    for index in 0..2 {
        if let Some(cell) = random_free_cell(world, rng) {
            let frames = world.catalog().frames(EntityKind::PersonSearching);
            place(
                world,
                scheduler,
                factory::person_searching(
                    format!("person_{index}"),
                    cell,
                    PERSON_ACTION_PERIOD,
                    PERSON_ANIMATION_PERIOD,
                    PERSON_RESOURCE_LIMIT,
                    frames,
                ),
            );
        }
    }
    if let Some(cell) = random_free_cell(world, rng) {
        let frames = world.catalog().frames(EntityKind::Fairy);
        place(
            world,
            scheduler,
            factory::fairy(
                "fairy_0".into(),
                cell,
                FAIRY_ACTION_PERIOD,
                FAIRY_ANIMATION_PERIOD,
                frames,
            ),
        );
    }
    if let Some(cell) = random_free_cell(world, rng) {
        let frames = world.catalog().frames(EntityKind::Cat);
        place(
            world,
            scheduler,
            factory::cat(
                "cat_0".into(),
                cell,
                CAT_ACTION_PERIOD,
                CAT_ANIMATION_PERIOD,
                frames,
            ),
        );
    }
    if let Some(cell) = random_free_cell(world, rng) {
        let frames = world.catalog().frames(EntityKind::Dog);
        place(
            world,
            scheduler,
            factory::dog(
                "dog_0".into(),
                cell,
                DOG_ACTION_PERIOD,
                DOG_ANIMATION_PERIOD,
                frames,
            ),
        );
    }
}

/// Paints a 3x3 garden patch around `center` and drops a pair of cats on
/// the free cells beside it.
fn plant_garden(world: &mut WorldModel, scheduler: &mut EventScheduler, center: Point) {
    let garden = world.register_background(GARDEN_BACKGROUND_KEY, 1);
    for dy in -1..=1 {
        for dx in -1..=1 {
            world.set_background_cell(Point::new(center.x() + dx, center.y() + dy), garden);
        }
    }

    let free_cells: Vec<Point> = [
        Point::new(center.x(), center.y() - 1),
        Point::new(center.x() + 1, center.y()),
        Point::new(center.x(), center.y() + 1),
        Point::new(center.x() - 1, center.y()),
    ]
    .into_iter()
    .filter(|cell| world.within_bounds(*cell) && world.occupant(*cell).is_none())
    .take(2)
    .collect();
    let mut cells = free_cells.into_iter();

    if let Some(cell) = cells.next() {
        let frames = world.catalog().frames(EntityKind::Cat);
        place(
            world,
            scheduler,
            factory::cat(
                "garden_cat".into(),
                cell,
                CAT_ACTION_PERIOD,
                CAT_ANIMATION_PERIOD,
                frames,
            ),
        );
    }
    if let Some(cell) = cells.next() {
        let frames = world.catalog().frames(EntityKind::Orange);
        place(
            world,
            scheduler,
            factory::orange(
                "garden_orange".into(),
                cell,
                CAT_ACTION_PERIOD,
                CAT_ANIMATION_PERIOD,
                frames,
            ),
        );
    }
}

fn place(world: &mut WorldModel, scheduler: &mut EventScheduler, template: EntityTemplate) {
    match world.try_add_entity(template) {
        Ok(id) => schedule_initial_actions(world, scheduler, id),
        Err(err) => tracing::warn!(%err, "skipped a blocked placement"),
    }
}

fn random_free_cell(world: &WorldModel, rng: &mut ChaCha8Rng) -> Option<Point> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let cell = Point::new(
            rng.gen_range(0..world.num_cols() as i32),
            rng.gen_range(0..world.num_rows() as i32),
        );
        if world.occupant(cell).is_none() {
            return Some(cell);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_argument_parses_coordinates() {
        assert_eq!(parse_cell("3,7"), Ok(Point::new(3, 7)));
        assert_eq!(parse_cell(" 3 , 7 "), Ok(Point::new(3, 7)));
        assert!(parse_cell("3;7").is_err());
        assert!(parse_cell("3,").is_err());
    }

    #[test]
    fn speed_presets_accelerate_the_simulated_clock() {
        let wall = Duration::from_secs(30);
        assert_eq!(wall.div_f64(Speed::Normal.time_scale()), wall);
        assert_eq!(
            wall.div_f64(Speed::Fast.time_scale()),
            Duration::from_secs(60)
        );
        assert_eq!(
            wall.div_f64(Speed::Faster.time_scale()),
            Duration::from_secs(120)
        );
        assert_eq!(
            wall.div_f64(Speed::Fastest.time_scale()),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn garden_patch_paints_background_and_drops_cats() {
        let mut world = WorldModel::new(6, 6, SpriteCatalog::default());
        let mut scheduler = EventScheduler::new();
        plant_garden(&mut world, &mut scheduler, Point::new(3, 3));

        assert_eq!(
            world.background_key(Point::new(2, 2)),
            Some(GARDEN_BACKGROUND_KEY)
        );
        assert_eq!(
            world.background_key(Point::new(4, 4)),
            Some(GARDEN_BACKGROUND_KEY)
        );
        let kinds: Vec<EntityKind> = world.entities().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EntityKind::Cat, EntityKind::Orange]);
    }

    #[test]
    fn scatter_respects_occupancy() {
        let mut world = WorldModel::new(4, 4, SpriteCatalog::default());
        let mut scheduler = EventScheduler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        populate_scene(&mut world, &mut scheduler, &mut rng);

        for entity in world.entities() {
            assert_eq!(world.occupant(entity.position()), Some(entity.id()));
        }
    }
}
