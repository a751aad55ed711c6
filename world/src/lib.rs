#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Grove simulation.
//!
//! The world owns the grid bounds, the per-cell background, the occupancy
//! grid and the live entity set, and enforces at-most-one-entity-per-cell.
//! All mutation goes through its add/move/remove operations so the entity
//! set always mirrors the non-empty occupancy cells. The entity set keeps
//! stable insertion order, which makes nearest-entity tie-breaks and the
//! debug log deterministic.

mod entity;
pub mod factory;

use std::collections::HashMap;

use grove_core::{EntityId, EntityKind, PlacementError, Point};
use grove_system_scheduler::EventScheduler;

pub use entity::Entity;
use factory::EntityTemplate;

/// Sentinel position assigned to removed entities; out of bounds for every
/// grid.
pub const RETIRED_POSITION: Point = Point::new(-1, -1);

const SPAWN_RANDOMNESS_SEED: u64 = 0x9e37_79b9_7f4a_7c15;
const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

const DEFAULT_BACKGROUND_KEY: &str = "background_default";

/// Per-kind image list lengths, opaque to the simulation core.
///
/// Only the length matters here; the renderer owns the pixels. Kinds without
/// a registered list fall back to a single frame.
#[derive(Clone, Debug, Default)]
pub struct SpriteCatalog {
    frames: HashMap<EntityKind, u32>,
}

impl SpriteCatalog {
    /// Creates an empty catalog where every kind has a single frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the image list length for a kind.
    #[must_use]
    pub fn with_frames(mut self, kind: EntityKind, frame_count: u32) -> Self {
        let _ = self.frames.insert(kind, frame_count.max(1));
        self
    }

    /// Image list length for a kind.
    #[must_use]
    pub fn frames(&self, kind: EntityKind) -> u32 {
        self.frames.get(&kind).copied().unwrap_or(1)
    }
}

/// Identifier of a registered background within the world's palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BackgroundId(u32);

impl BackgroundId {
    /// Retrieves the palette index of the background.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Terrain identity of a cell, independent of occupancy.
#[derive(Clone, Debug)]
pub struct Background {
    key: String,
    frame_count: u32,
}

impl Background {
    /// Image key the renderer resolves to pixels.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of frames in the background's image list.
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.frame_count
    }
}

/// Represents the 2D grid world in which the simulation runs.
#[derive(Debug)]
pub struct WorldModel {
    rows: u32,
    cols: u32,
    background: Vec<BackgroundId>,
    palette: Vec<Background>,
    occupancy: Vec<Option<EntityId>>,
    entities: Vec<Entity>,
    catalog: SpriteCatalog,
    next_entity: u32,
    rng_state: u64,
}

impl WorldModel {
    /// Creates an empty world with the given bounds and sprite catalog.
    ///
    /// Every cell starts with the default background.
    #[must_use]
    pub fn new(rows: u32, cols: u32, catalog: SpriteCatalog) -> Self {
        let capacity = rows as usize * cols as usize;
        Self {
            rows,
            cols,
            background: vec![BackgroundId(0); capacity],
            palette: vec![Background {
                key: DEFAULT_BACKGROUND_KEY.to_owned(),
                frame_count: 1,
            }],
            occupancy: vec![None; capacity],
            entities: Vec::new(),
            catalog,
            next_entity: 0,
            rng_state: SPAWN_RANDOMNESS_SEED,
        }
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn num_rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn num_cols(&self) -> u32 {
        self.cols
    }

    /// Per-kind image list lengths supplied at construction.
    #[must_use]
    pub const fn catalog(&self) -> &SpriteCatalog {
        &self.catalog
    }

    /// Reports whether a position lies inside the grid.
    #[must_use]
    pub fn within_bounds(&self, pos: Point) -> bool {
        pos.x() >= 0 && pos.y() >= 0 && (pos.x() as u32) < self.cols && (pos.y() as u32) < self.rows
    }

    fn index(&self, pos: Point) -> Option<usize> {
        if self.within_bounds(pos) {
            Some(pos.y() as usize * self.cols as usize + pos.x() as usize)
        } else {
            None
        }
    }

    /// Returns the entity occupying the cell, if any.
    #[must_use]
    pub fn occupant(&self, pos: Point) -> Option<EntityId> {
        self.index(pos)
            .and_then(|index| self.occupancy.get(index).copied().flatten())
    }

    /// Reports whether a mover blocked by `blocked` kinds may enter the
    /// cell: in bounds and either empty or held by a non-blocking kind.
    #[must_use]
    pub fn is_passable(&self, pos: Point, blocked: &[EntityKind]) -> bool {
        if !self.within_bounds(pos) {
            return false;
        }
        match self.occupant(pos).and_then(|id| self.kind_of(id)) {
            Some(kind) => !blocked.contains(&kind),
            None => true,
        }
    }

    fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.entity(id).map(Entity::kind)
    }

    /// Read access to a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    /// Write access to a live entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    /// Iterates the live entity set in stable insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Adds an entity, rejecting occupied or out-of-bounds destinations.
    pub fn try_add_entity(&mut self, template: EntityTemplate) -> Result<EntityId, PlacementError> {
        if !self.within_bounds(template.position) {
            return Err(PlacementError::OutOfBounds);
        }
        if self.occupant(template.position).is_some() {
            return Err(PlacementError::Occupied);
        }
        match self.add_entity(template) {
            Some(id) => Ok(id),
            None => Err(PlacementError::OutOfBounds),
        }
    }

    /// Adds an entity assuming the caller already validated the cell.
    ///
    /// Out-of-bounds placements are silently ignored.
    pub fn add_entity(&mut self, template: EntityTemplate) -> Option<EntityId> {
        let index = self.index(template.position)?;
        debug_assert!(
            self.occupancy[index].is_none(),
            "unchecked add onto an occupied cell"
        );

        let id = EntityId::new(self.next_entity);
        self.next_entity += 1;
        self.occupancy[index] = Some(id);
        self.entities.push(Entity::from_template(id, template));
        Some(id)
    }

    /// Moves an entity, evicting any occupant of the destination cell.
    ///
    /// Out-of-bounds and unchanged destinations are no-ops. The evicted
    /// occupant is fully removed: its pending events are cancelled and it
    /// leaves the entity set.
    pub fn move_entity(&mut self, scheduler: &mut EventScheduler, id: EntityId, pos: Point) {
        let Some(old_pos) = self.entity(id).map(Entity::position) else {
            return;
        };
        if !self.within_bounds(pos) || pos == old_pos {
            return;
        }

        if let Some(occupant) = self.occupant(pos) {
            let _ = self.remove_entity(scheduler, occupant);
        }

        if let Some(index) = self.index(old_pos) {
            self.occupancy[index] = None;
        }
        if let Some(index) = self.index(pos) {
            self.occupancy[index] = Some(id);
        }
        if let Some(entity) = self.entity_mut(id) {
            entity.set_position(pos);
        }
    }

    /// Removes an entity: cancels its pending events, clears its occupancy
    /// cell and drops it from the entity set.
    ///
    /// The removed entity is returned with its position parked at
    /// [`RETIRED_POSITION`]; removing an unknown id is a no-op.
    pub fn remove_entity(&mut self, scheduler: &mut EventScheduler, id: EntityId) -> Option<Entity> {
        scheduler.unschedule_all_events(id);

        let position = self.entities.iter().position(|entity| entity.id() == id)?;
        let mut entity = self.entities.remove(position);
        if let Some(index) = self.index(entity.position()) {
            if self.occupancy[index] == Some(id) {
                self.occupancy[index] = None;
            }
        }
        entity.set_position(RETIRED_POSITION);
        Some(entity)
    }

    /// Finds the live entity of one of the requested kinds nearest to `pos`
    /// by squared Euclidean distance.
    ///
    /// Ties keep the earliest-inserted entity.
    #[must_use]
    pub fn find_nearest(&self, pos: Point, kinds: &[EntityKind]) -> Option<EntityId> {
        let mut best: Option<(EntityId, i64)> = None;
        for entity in &self.entities {
            if !kinds.contains(&entity.kind()) {
                continue;
            }
            let distance = entity.position().distance_squared(pos);
            match best {
                Some((_, nearest)) if distance >= nearest => {}
                _ => best = Some((entity.id(), distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Registers a background in the palette, reusing an existing entry
    /// with the same key.
    pub fn register_background(&mut self, key: &str, frame_count: u32) -> BackgroundId {
        if let Some(index) = self.palette.iter().position(|entry| entry.key == key) {
            return BackgroundId(index as u32);
        }
        self.palette.push(Background {
            key: key.to_owned(),
            frame_count: frame_count.max(1),
        });
        BackgroundId((self.palette.len() - 1) as u32)
    }

    /// Sets the background of a cell; out-of-bounds positions are ignored.
    pub fn set_background_cell(&mut self, pos: Point, background: BackgroundId) {
        if (background.0 as usize) >= self.palette.len() {
            return;
        }
        if let Some(index) = self.index(pos) {
            self.background[index] = background;
        }
    }

    /// Terrain identity of a cell.
    #[must_use]
    pub fn background(&self, pos: Point) -> Option<&Background> {
        let index = self.index(pos)?;
        self.palette.get(self.background[index].0 as usize)
    }

    /// Image key of a cell's background.
    #[must_use]
    pub fn background_key(&self, pos: Point) -> Option<&str> {
        self.background(pos).map(Background::key)
    }

    pub(crate) fn next_random(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Entity, WorldModel};
    use grove_core::{EntityId, EntityKind, Point};

    /// Immutable representation of a single entity's state used for queries.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct EntitySnapshot {
        /// World-allocated identifier.
        pub id: EntityId,
        /// Human-readable identifier.
        pub name: String,
        /// Kind tag.
        pub kind: EntityKind,
        /// Cell occupied by the entity.
        pub position: Point,
        /// Frame currently displayed.
        pub current_frame: u32,
        /// Current health value.
        pub health: i32,
        /// Resources gathered so far.
        pub resource_count: u32,
    }

    /// Captures a read-only view of the live entities, sorted by id.
    #[must_use]
    pub fn entity_snapshots(world: &WorldModel) -> Vec<EntitySnapshot> {
        let mut snapshots: Vec<EntitySnapshot> = world
            .entities()
            .map(|entity| EntitySnapshot {
                id: entity.id(),
                name: entity.name().to_owned(),
                kind: entity.kind(),
                position: entity.position(),
                current_frame: entity.current_frame(),
                health: entity.health(),
                resource_count: entity.resource_count(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Deterministic debug log: one `name x y image_index` line per named
    /// entity, sorted by id.
    #[must_use]
    pub fn entity_log(world: &WorldModel) -> Vec<String> {
        let mut entities: Vec<&Entity> = world.entities().collect();
        entities.sort_by_key(|entity| entity.id());
        entities
            .iter()
            .filter_map(|entity| entity.log_line())
            .collect()
    }

    /// Frame currently displayed for an entity.
    #[must_use]
    pub fn current_image(world: &WorldModel, id: EntityId) -> Option<u32> {
        world.entity(id).map(Entity::current_frame)
    }

    /// Image key and frame count of a cell's background.
    #[must_use]
    pub fn background_image(world: &WorldModel, pos: Point) -> Option<(&str, u32)> {
        world
            .background(pos)
            .map(|background| (background.key(), background.frame_count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn world() -> WorldModel {
        WorldModel::new(6, 8, SpriteCatalog::default())
    }

    fn scheduler() -> EventScheduler {
        EventScheduler::new()
    }

    fn house_at(pos: Point) -> EntityTemplate {
        factory::house(format!("house_{}_{}", pos.x(), pos.y()), pos, 1)
    }

    fn assert_occupancy_matches_entity_set(world: &WorldModel) {
        for entity in world.entities() {
            assert_eq!(
                world.occupant(entity.position()),
                Some(entity.id()),
                "entity {} not tracked by its occupancy cell",
                entity.name()
            );
            assert!(world.within_bounds(entity.position()));
        }
        let occupied = world
            .occupancy
            .iter()
            .filter(|slot| slot.is_some())
            .count();
        assert_eq!(occupied, world.entities().count());
    }

    #[test]
    fn add_places_entity_and_tracks_occupancy() {
        let mut world = world();
        let id = world
            .try_add_entity(house_at(Point::new(2, 3)))
            .expect("free cell");

        assert_eq!(world.occupant(Point::new(2, 3)), Some(id));
        assert_occupancy_matches_entity_set(&world);
    }

    #[test]
    fn try_add_rejects_occupied_cell() {
        let mut world = world();
        let _ = world
            .try_add_entity(house_at(Point::new(2, 3)))
            .expect("free cell");

        let result = world.try_add_entity(house_at(Point::new(2, 3)));
        assert_eq!(result.unwrap_err(), PlacementError::Occupied);
        assert_occupancy_matches_entity_set(&world);
    }

    #[test]
    fn try_add_rejects_out_of_bounds_cell() {
        let mut world = world();
        let result = world.try_add_entity(house_at(Point::new(-1, 0)));
        assert_eq!(result.unwrap_err(), PlacementError::OutOfBounds);
    }

    #[test]
    fn move_vacates_old_cell_and_occupies_new_cell() {
        let mut world = world();
        let mut scheduler = scheduler();
        let id = world
            .try_add_entity(house_at(Point::new(1, 1)))
            .expect("free cell");

        world.move_entity(&mut scheduler, id, Point::new(4, 2));

        assert_eq!(world.occupant(Point::new(1, 1)), None);
        assert_eq!(world.occupant(Point::new(4, 2)), Some(id));
        assert_eq!(
            world.entity(id).map(Entity::position),
            Some(Point::new(4, 2))
        );
        assert_occupancy_matches_entity_set(&world);
    }

    #[test]
    fn move_out_of_bounds_or_in_place_is_a_no_op() {
        let mut world = world();
        let mut scheduler = scheduler();
        let id = world
            .try_add_entity(house_at(Point::new(1, 1)))
            .expect("free cell");

        world.move_entity(&mut scheduler, id, Point::new(-3, 1));
        world.move_entity(&mut scheduler, id, Point::new(1, 1));

        assert_eq!(world.occupant(Point::new(1, 1)), Some(id));
        assert_occupancy_matches_entity_set(&world);
    }

    #[test]
    fn move_evicts_and_unschedules_the_destination_occupant() {
        let mut world = world();
        let mut scheduler = scheduler();
        let mover = world
            .try_add_entity(house_at(Point::new(0, 0)))
            .expect("free cell");
        let victim = world
            .try_add_entity(house_at(Point::new(3, 0)))
            .expect("free cell");
        scheduler.schedule_event(
            victim,
            grove_core::Action::Activity,
            Duration::from_millis(10),
        );

        world.move_entity(&mut scheduler, mover, Point::new(3, 0));

        assert_eq!(world.occupant(Point::new(3, 0)), Some(mover));
        assert!(world.entity(victim).is_none());
        assert!(!scheduler.has_pending(victim));
        assert_occupancy_matches_entity_set(&world);
    }

    #[test]
    fn remove_cancels_events_and_parks_the_entity_at_the_sentinel() {
        let mut world = world();
        let mut scheduler = scheduler();
        let id = world
            .try_add_entity(house_at(Point::new(5, 4)))
            .expect("free cell");
        scheduler.schedule_event(id, grove_core::Action::Activity, Duration::from_millis(10));

        let removed = world.remove_entity(&mut scheduler, id).expect("removed");

        assert_eq!(removed.position(), RETIRED_POSITION);
        assert!(world.entity(id).is_none());
        assert_eq!(world.occupant(Point::new(5, 4)), None);
        assert!(!scheduler.has_pending(id));
        assert_occupancy_matches_entity_set(&world);

        // Removing again is a no-op.
        assert!(world.remove_entity(&mut scheduler, id).is_none());
    }

    #[test]
    fn find_nearest_minimizes_squared_distance() {
        let mut world = world();
        let near = world
            .try_add_entity(factory::stump("stump_near".into(), Point::new(2, 0), 1))
            .expect("free cell");
        let _far = world
            .try_add_entity(factory::stump("stump_far".into(), Point::new(7, 5), 1))
            .expect("free cell");

        assert_eq!(
            world.find_nearest(Point::new(0, 0), &[EntityKind::Stump]),
            Some(near)
        );
    }

    #[test]
    fn find_nearest_breaks_ties_by_insertion_order() {
        let mut world = world();
        let first = world
            .try_add_entity(factory::stump("stump_a".into(), Point::new(2, 0), 1))
            .expect("free cell");
        let _second = world
            .try_add_entity(factory::stump("stump_b".into(), Point::new(0, 2), 1))
            .expect("free cell");

        assert_eq!(
            world.find_nearest(Point::new(0, 0), &[EntityKind::Stump]),
            Some(first)
        );
    }

    #[test]
    fn find_nearest_ignores_other_kinds() {
        let mut world = world();
        let _ = world
            .try_add_entity(house_at(Point::new(1, 0)))
            .expect("free cell");

        assert_eq!(world.find_nearest(Point::new(0, 0), &[EntityKind::Tree]), None);
    }

    #[test]
    fn passability_applies_the_blocking_table() {
        let mut world = world();
        let _ = world
            .try_add_entity(house_at(Point::new(1, 1)))
            .expect("free cell");

        assert!(!world.is_passable(Point::new(-1, 0), &[]));
        assert!(world.is_passable(Point::new(0, 0), &[EntityKind::House]));
        assert!(!world.is_passable(Point::new(1, 1), &[EntityKind::House]));
        // A house does not block kinds whose table omits it.
        assert!(world.is_passable(Point::new(1, 1), &[EntityKind::Stump]));
    }

    #[test]
    fn background_cells_default_and_register() {
        let mut world = world();
        assert_eq!(
            world.background_key(Point::new(0, 0)),
            Some(DEFAULT_BACKGROUND_KEY)
        );

        let garden = world.register_background("garden", 3);
        world.set_background_cell(Point::new(2, 2), garden);

        assert_eq!(world.background_key(Point::new(2, 2)), Some("garden"));
        assert_eq!(
            query::background_image(&world, Point::new(2, 2)),
            Some(("garden", 3))
        );
        assert_eq!(world.background_key(Point::new(0, 0)), Some(DEFAULT_BACKGROUND_KEY));

        // Re-registering the same key reuses the palette entry.
        assert_eq!(world.register_background("garden", 3), garden);
    }

    #[test]
    fn log_reports_the_raw_image_cursor_past_the_wrap() {
        let mut world = world();
        let id = world
            .try_add_entity(factory::stump("stump".into(), Point::new(2, 2), 2))
            .expect("free cell");

        let entity = world.entity_mut(id).expect("live");
        entity.next_image();
        entity.next_image();
        entity.next_image();

        assert_eq!(entity.image_index(), 3);
        assert_eq!(entity.frame_count(), 2);
        assert_eq!(entity.current_frame(), 1);
        // The displayed frame wraps; the logged cursor does not.
        assert_eq!(entity.log_line(), Some("stump 2 2 3".to_owned()));
    }

    #[test]
    fn entity_log_is_sorted_and_skips_anonymous_entities() {
        let mut world = world();
        let _ = world
            .try_add_entity(factory::stump("stump_1".into(), Point::new(4, 4), 1))
            .expect("free cell");
        let _ = world
            .try_add_entity(factory::stump(String::new(), Point::new(5, 5), 1))
            .expect("free cell");
        let _ = world
            .try_add_entity(factory::stump("stump_2".into(), Point::new(3, 3), 1))
            .expect("free cell");

        assert_eq!(
            query::entity_log(&world),
            vec!["stump_1 4 4 0".to_owned(), "stump_2 3 3 0".to_owned()]
        );
    }
}
