//! Creation logic for entity templates.
//!
//! Templates carry every per-kind default; the world assigns identity when a
//! template is added. Tree defaults are randomized within fixed ranges using
//! the world's deterministic spawn randomness.

use std::time::Duration;

use grove_core::{EntityKind, Point};

use crate::WorldModel;

const TREE_ACTION_MIN_MS: u64 = 1_000;
const TREE_ACTION_MAX_MS: u64 = 1_400;
const TREE_ANIMATION_MIN_MS: u64 = 50;
const TREE_ANIMATION_MAX_MS: u64 = 600;
const TREE_HEALTH_MIN: i32 = 1;
const TREE_HEALTH_MAX: i32 = 3;

// Saplings grow and gain health at the same cadence, so the two periods
// stay in sync.
const SAPLING_PERIOD: Duration = Duration::from_millis(1_000);
const SAPLING_HEALTH_LIMIT: i32 = 5;

const PINK_PERIOD: Duration = Duration::from_millis(1_000);
const PINK_HEALTH_LIMIT: i32 = 5;

/// Blueprint for a new entity, consumed by the world's add operations.
#[derive(Clone, Debug)]
pub struct EntityTemplate {
    /// Human-readable identifier used by the debug log.
    pub name: String,
    /// Kind tag dispatched on by the behavior state machine.
    pub kind: EntityKind,
    /// Cell the entity should occupy on insertion.
    pub position: Point,
    /// Number of frames in the entity's image list.
    pub frame_count: u32,
    /// Resource threshold for person transformations.
    pub resource_limit: u32,
    /// Resources already gathered; always zero for fresh spawns.
    pub resource_count: u32,
    /// Delay between successive activity ticks.
    pub action_period: Duration,
    /// Delay between successive animation ticks.
    pub animation_period: Duration,
    /// Starting health.
    pub health: i32,
    /// Health threshold at which a sapling matures.
    pub health_limit: i32,
}

fn passive(name: String, kind: EntityKind, position: Point, frame_count: u32) -> EntityTemplate {
    EntityTemplate {
        name,
        kind,
        position,
        frame_count,
        resource_limit: 0,
        resource_count: 0,
        action_period: Duration::ZERO,
        animation_period: Duration::ZERO,
        health: 0,
        health_limit: 0,
    }
}

fn mover(
    name: String,
    kind: EntityKind,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    frame_count: u32,
) -> EntityTemplate {
    EntityTemplate {
        name,
        kind,
        position,
        frame_count,
        resource_limit: 0,
        resource_count: 0,
        action_period,
        animation_period,
        health: 0,
        health_limit: 0,
    }
}

/// Destination for full people; never acts.
#[must_use]
pub fn house(name: String, position: Point, frame_count: u32) -> EntityTemplate {
    passive(name, EntityKind::House, position, frame_count)
}

/// Treat dropped by a dog; inert.
#[must_use]
pub fn treat(name: String, position: Point, frame_count: u32) -> EntityTemplate {
    passive(name, EntityKind::Treat, position, frame_count)
}

/// Remains of a felled tree; inert until replanted.
#[must_use]
pub fn stump(name: String, position: Point, frame_count: u32) -> EntityTemplate {
    passive(name, EntityKind::Stump, position, frame_count)
}

/// Immovable blocker that only animates.
#[must_use]
pub fn obstacle(
    name: String,
    position: Point,
    animation_period: Duration,
    frame_count: u32,
) -> EntityTemplate {
    EntityTemplate {
        animation_period,
        ..passive(name, EntityKind::Obstacle, position, frame_count)
    }
}

/// Young tree; health starts at zero and builds toward the maturity limit.
#[must_use]
pub fn sapling(name: String, position: Point, frame_count: u32) -> EntityTemplate {
    EntityTemplate {
        action_period: SAPLING_PERIOD,
        animation_period: SAPLING_PERIOD,
        health: 0,
        health_limit: SAPLING_HEALTH_LIMIT,
        ..passive(name, EntityKind::Sapling, position, frame_count)
    }
}

/// Pink flora left behind by cats; re-arms every tick with no other effect.
#[must_use]
pub fn pink(name: String, position: Point, frame_count: u32) -> EntityTemplate {
    EntityTemplate {
        action_period: PINK_PERIOD,
        animation_period: PINK_PERIOD,
        health_limit: PINK_HEALTH_LIMIT,
        ..passive(name, EntityKind::Pink, position, frame_count)
    }
}

/// Mature tree with explicit periods and health.
#[must_use]
pub fn tree(
    name: String,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    health: i32,
    frame_count: u32,
) -> EntityTemplate {
    EntityTemplate {
        health,
        ..mover(
            name,
            EntityKind::Tree,
            position,
            action_period,
            animation_period,
            frame_count,
        )
    }
}

/// Mature tree with randomized periods and health.
#[must_use]
pub fn tree_with_defaults(
    name: String,
    position: Point,
    defaults: TreeDefaults,
    frame_count: u32,
) -> EntityTemplate {
    tree(
        name,
        position,
        defaults.action_period,
        defaults.animation_period,
        defaults.health,
        frame_count,
    )
}

/// Fairy that replants stumps.
#[must_use]
pub fn fairy(
    name: String,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    frame_count: u32,
) -> EntityTemplate {
    mover(
        name,
        EntityKind::Fairy,
        position,
        action_period,
        animation_period,
        frame_count,
    )
}

/// Cat that fells trees.
#[must_use]
pub fn cat(
    name: String,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    frame_count: u32,
) -> EntityTemplate {
    mover(
        name,
        EntityKind::Cat,
        position,
        action_period,
        animation_period,
        frame_count,
    )
}

/// Orange cat; same habits as [`cat`].
#[must_use]
pub fn orange(
    name: String,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    frame_count: u32,
) -> EntityTemplate {
    mover(
        name,
        EntityKind::Orange,
        position,
        action_period,
        animation_period,
        frame_count,
    )
}

/// Dog that delivers treats to houses.
#[must_use]
pub fn dog(
    name: String,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    frame_count: u32,
) -> EntityTemplate {
    mover(
        name,
        EntityKind::Dog,
        position,
        action_period,
        animation_period,
        frame_count,
    )
}

/// Person in the searching state; resource count starts at zero.
#[must_use]
pub fn person_searching(
    name: String,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    resource_limit: u32,
    frame_count: u32,
) -> EntityTemplate {
    EntityTemplate {
        resource_limit,
        ..mover(
            name,
            EntityKind::PersonSearching,
            position,
            action_period,
            animation_period,
            frame_count,
        )
    }
}

/// Person carrying a full load back to a house.
#[must_use]
pub fn person_full(
    name: String,
    position: Point,
    action_period: Duration,
    animation_period: Duration,
    resource_limit: u32,
    frame_count: u32,
) -> EntityTemplate {
    EntityTemplate {
        resource_limit,
        ..mover(
            name,
            EntityKind::PersonFull,
            position,
            action_period,
            animation_period,
            frame_count,
        )
    }
}

/// Randomized periods and health rolled for a freshly matured tree.
#[derive(Clone, Copy, Debug)]
pub struct TreeDefaults {
    /// Delay between the tree's activity ticks.
    pub action_period: Duration,
    /// Delay between the tree's animation ticks.
    pub animation_period: Duration,
    /// Starting health.
    pub health: i32,
}

impl WorldModel {
    /// Rolls randomized tree defaults from the world's deterministic spawn
    /// randomness.
    #[must_use]
    pub fn tree_defaults(&mut self) -> TreeDefaults {
        let action_ms = roll_range(self.next_random(), TREE_ACTION_MIN_MS, TREE_ACTION_MAX_MS);
        let animation_ms = roll_range(
            self.next_random(),
            TREE_ANIMATION_MIN_MS,
            TREE_ANIMATION_MAX_MS,
        );
        let health_span = (TREE_HEALTH_MAX - TREE_HEALTH_MIN) as u64;
        let health = TREE_HEALTH_MIN + (self.next_random() % health_span) as i32;

        TreeDefaults {
            action_period: Duration::from_millis(action_ms),
            animation_period: Duration::from_millis(animation_ms),
            health,
        }
    }
}

fn roll_range(roll: u64, min: u64, max: u64) -> u64 {
    min + roll % (max - min)
}
