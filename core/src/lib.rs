#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grove simulation.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the pathing and scheduling systems, and the behavior state machine:
//! grid coordinates, entity identity and kinds, the action variants fired by
//! the scheduler, and the per-kind passability tables that parameterize
//! path searches.

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the simulation boots.
pub const WELCOME_BANNER: &str = "Welcome to the Grove.";

/// Location of a single grid cell expressed as signed column and row indices.
///
/// Coordinates are signed so that retired entities can be parked at an
/// always-out-of-bounds sentinel position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Reports whether two cells touch along exactly one axis.
    #[must_use]
    pub fn adjacent(&self, other: Point) -> bool {
        (self.x == other.x && self.y.abs_diff(other.y) == 1)
            || (self.y == other.y && self.x.abs_diff(other.x) == 1)
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(&self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the squared Euclidean distance between two cells.
    ///
    /// Widened to `i64` so distant sentinel positions never overflow.
    #[must_use]
    pub fn distance_squared(&self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unique identifier assigned to an entity by the world.
///
/// Identifiers are allocated sequentially and never reused, so identity-based
/// event cancellation stays unambiguous across entity lifetimes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Kinds of entities that populate the grove.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Mature tree; decays into a stump when its health is exhausted.
    Tree,
    /// Young tree; gains health each tick until it matures or dies.
    Sapling,
    /// Remains of a felled tree; inert until a fairy replants it.
    Stump,
    /// Replants stumps as saplings; becomes a dog on garden ground.
    Fairy,
    /// Person harvesting wood from trees and saplings.
    PersonSearching,
    /// Person carrying a full load back to a house.
    PersonFull,
    /// Cat that fells trees, leaving pink flora behind.
    Cat,
    /// Orange cat with the same habits as [`EntityKind::Cat`].
    Orange,
    /// Pink flora left where a cat felled a tree; idles forever.
    Pink,
    /// Dog that delivers treats to houses.
    Dog,
    /// Destination for full people; never acts.
    House,
    /// Immovable blocker; animated but inert.
    Obstacle,
    /// Treat dropped by a dog; never acts.
    Treat,
}

impl EntityKind {
    /// Reports whether this kind runs activity logic.
    ///
    /// Passive kinds (house, obstacle, stump, treat) only ever animate; the
    /// scheduler must never fire an activity tick for them.
    #[must_use]
    pub const fn has_activity(&self) -> bool {
        match self {
            Self::Tree
            | Self::Sapling
            | Self::Fairy
            | Self::PersonSearching
            | Self::PersonFull
            | Self::Cat
            | Self::Orange
            | Self::Pink
            | Self::Dog => true,
            Self::Stump | Self::House | Self::Obstacle | Self::Treat => false,
        }
    }

    /// Reports whether this kind advances an image cursor over time.
    ///
    /// Houses, stumps and treats carry a single static image and are never
    /// scheduled for animation.
    #[must_use]
    pub const fn is_animated(&self) -> bool {
        match self {
            Self::Tree
            | Self::Sapling
            | Self::Fairy
            | Self::PersonSearching
            | Self::PersonFull
            | Self::Cat
            | Self::Orange
            | Self::Pink
            | Self::Dog
            | Self::Obstacle => true,
            Self::Stump | Self::House | Self::Treat => false,
        }
    }

    /// Occupant kinds that block this kind's movement.
    ///
    /// The table parameterizes path searches: a cell is passable for a mover
    /// when it is in bounds and either empty or occupied by a kind absent
    /// from the mover's table. Non-moving kinds have an empty table.
    #[must_use]
    pub const fn blocking_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::Fairy => &[Self::House],
            Self::PersonSearching | Self::PersonFull => &[Self::Stump],
            Self::Cat | Self::Orange => &[Self::Tree, Self::Obstacle],
            Self::Dog => &[Self::House, Self::Obstacle],
            Self::Tree
            | Self::Sapling
            | Self::Stump
            | Self::Pink
            | Self::House
            | Self::Obstacle
            | Self::Treat => &[],
        }
    }
}

/// Work item fired by the scheduler against an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// One step of the entity's behavior logic.
    Activity,
    /// One advance of the entity's image cursor.
    Animation {
        /// Remaining plays; zero loops forever, one stops after this tick.
        repeat_count: u32,
    },
}

/// Reasons an entity placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The destination cell already holds a live entity.
    #[error("destination cell is occupied")]
    Occupied,
    /// The requested position lies outside the configured grid bounds.
    #[error("position lies outside the grid bounds")]
    OutOfBounds,
}
