//! Live entity state owned by the world.

use std::time::Duration;

use grove_core::{EntityId, EntityKind, Point};

use crate::factory::EntityTemplate;

/// An entity that exists in the world.
///
/// Entities hold only their own mutable state; they never reference the
/// world or the scheduler. Behavior functions receive those explicitly.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    name: String,
    kind: EntityKind,
    position: Point,
    frame_count: u32,
    image_index: u32,
    resource_limit: u32,
    resource_count: u32,
    action_period: Duration,
    animation_period: Duration,
    health: i32,
    health_limit: i32,
}

impl Entity {
    pub(crate) fn from_template(id: EntityId, template: EntityTemplate) -> Self {
        Self {
            id,
            name: template.name,
            kind: template.kind,
            position: template.position,
            frame_count: template.frame_count.max(1),
            image_index: 0,
            resource_limit: template.resource_limit,
            resource_count: template.resource_count,
            action_period: template.action_period,
            animation_period: template.animation_period,
            health: template.health,
            health_limit: template.health_limit,
        }
    }

    /// World-allocated identifier of the entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Human-readable identifier used by the debug log.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind tag dispatched on by the behavior state machine.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Current grid position.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Number of frames in the entity's image list.
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Raw animation cursor; monotonically increasing.
    #[must_use]
    pub const fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Frame currently displayed, wrapped by the image list length.
    #[must_use]
    pub const fn current_frame(&self) -> u32 {
        self.image_index % self.frame_count
    }

    /// Advances the animation cursor by one frame.
    pub fn next_image(&mut self) {
        self.image_index = self.image_index.wrapping_add(1);
    }

    /// Resources gathered so far.
    #[must_use]
    pub const fn resource_count(&self) -> u32 {
        self.resource_count
    }

    /// Resource threshold that triggers a person's searching-to-full switch.
    #[must_use]
    pub const fn resource_limit(&self) -> u32 {
        self.resource_limit
    }

    /// Records one gathered resource.
    pub fn increment_resource_count(&mut self) {
        self.resource_count += 1;
    }

    /// Delay between successive activity ticks.
    #[must_use]
    pub const fn action_period(&self) -> Duration {
        self.action_period
    }

    /// Delay between successive animation ticks.
    #[must_use]
    pub const fn animation_period(&self) -> Duration {
        self.animation_period
    }

    /// Current health value.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Health threshold at which a sapling matures into a tree.
    #[must_use]
    pub const fn health_limit(&self) -> i32 {
        self.health_limit
    }

    /// Adjusts health by the given delta; negative values wound.
    pub fn adjust_health(&mut self, delta: i32) {
        self.health += delta;
    }

    /// Debug log line in the `name x y image_index` format, or `None` for
    /// anonymous entities.
    #[must_use]
    pub fn log_line(&self) -> Option<String> {
        if self.name.is_empty() {
            return None;
        }
        Some(format!(
            "{} {} {} {}",
            self.name,
            self.position.x(),
            self.position.y(),
            self.image_index
        ))
    }
}
