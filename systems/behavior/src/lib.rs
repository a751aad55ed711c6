#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-kind behavior state machines driven by scheduled actions.
//!
//! Every entity kind maps to at most one activity behavior. An activity tick
//! reads and writes the world (movement, harvesting, spawning, removal) and
//! re-arms its own next tick unless the entity transformed into a different
//! one, in which case removal already cancelled its schedule and the new
//! entity was armed in its place. Animation ticks advance the image cursor
//! independently and carry their own repeat bookkeeping.
//!
//! Behaviors never store references to the world or scheduler; both arrive
//! as call parameters on every tick.

use std::time::Duration;

use grove_core::{Action, EntityId, EntityKind, Point};
use grove_system_pathing::{cardinal_neighbors, AStarPathing, PathingStrategy};
use grove_system_scheduler::{EventScheduler, ScheduledEvent};
use grove_world::factory::{self, EntityTemplate};
use grove_world::{Entity, WorldModel};

/// Background key marking garden ground, where fairies turn into dogs.
pub const GARDEN_BACKGROUND_KEY: &str = "garden";

/// Drains every event due at or before `target` and runs its behavior.
///
/// Behaviors executed during the drain may schedule follow-ups; those fire
/// within the same call when still due. Afterwards the scheduler's clock
/// sits exactly at `target`, so periodic behaviors keyed on elapsed time
/// stay aligned across successive calls.
pub fn advance_to(world: &mut WorldModel, scheduler: &mut EventScheduler, target: Duration) {
    while let Some(event) = scheduler.pop_due(target) {
        execute_action(world, scheduler, &event);
    }
    scheduler.align_to(target);
}

/// Arms a freshly inserted entity's first activity and animation ticks.
///
/// Passive kinds get no activity tick; kinds with a single static image get
/// no animation tick. Looping animations are armed with a repeat count of
/// zero, which never expires.
pub fn schedule_initial_actions(
    world: &WorldModel,
    scheduler: &mut EventScheduler,
    id: EntityId,
) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    let kind = entity.kind();
    if kind.has_activity() {
        scheduler.schedule_event(id, Action::Activity, entity.action_period());
    }
    if kind.is_animated() {
        scheduler.schedule_event(
            id,
            Action::Animation { repeat_count: 0 },
            entity.animation_period(),
        );
    }
}

fn execute_action(world: &mut WorldModel, scheduler: &mut EventScheduler, event: &ScheduledEvent) {
    match event.action {
        Action::Activity => execute_activity(world, scheduler, event.entity),
        Action::Animation { repeat_count } => {
            execute_animation(world, scheduler, event.entity, repeat_count);
        }
    }
}

fn execute_animation(
    world: &mut WorldModel,
    scheduler: &mut EventScheduler,
    id: EntityId,
    repeat_count: u32,
) {
    let Some(entity) = world.entity_mut(id) else {
        return;
    };
    entity.next_image();
    if repeat_count != 1 {
        let period = entity.animation_period();
        scheduler.schedule_event(
            id,
            Action::Animation {
                repeat_count: repeat_count.saturating_sub(1),
            },
            period,
        );
    }
}

fn execute_activity(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    match entity.kind() {
        EntityKind::Sapling => execute_sapling_activity(world, scheduler, id),
        EntityKind::Tree => execute_tree_activity(world, scheduler, id),
        EntityKind::Fairy => execute_fairy_activity(world, scheduler, id),
        EntityKind::PersonSearching => execute_person_searching_activity(world, scheduler, id),
        EntityKind::PersonFull => execute_person_full_activity(world, scheduler, id),
        EntityKind::Cat | EntityKind::Orange => execute_cat_activity(world, scheduler, id),
        EntityKind::Dog => execute_dog_activity(world, scheduler, id),
        EntityKind::Pink => rearm_activity(world, scheduler, id),
        EntityKind::Stump | EntityKind::House | EntityKind::Obstacle | EntityKind::Treat => {
            unreachable!("activity tick fired for a passive kind")
        }
    }
}

fn rearm_activity(world: &WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    if let Some(entity) = world.entity(id) {
        scheduler.schedule_event(id, Action::Activity, entity.action_period());
    }
}

/// Replaces one entity with another at the same moment, cancelling the old
/// entity's schedule and arming the replacement.
fn transform_entity(
    world: &mut WorldModel,
    scheduler: &mut EventScheduler,
    id: EntityId,
    template: EntityTemplate,
) {
    if world.remove_entity(scheduler, id).is_none() {
        return;
    }
    spawn_entity(world, scheduler, template);
}

fn spawn_entity(world: &mut WorldModel, scheduler: &mut EventScheduler, template: EntityTemplate) {
    if let Some(id) = world.add_entity(template) {
        schedule_initial_actions(world, scheduler, id);
    }
}

fn execute_sapling_activity(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    let Some(entity) = world.entity_mut(id) else {
        return;
    };
    entity.adjust_health(1);
    if !transform_plant(world, scheduler, id) {
        rearm_activity(world, scheduler, id);
    }
}

fn execute_tree_activity(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    if !transform_plant(world, scheduler, id) {
        rearm_activity(world, scheduler, id);
    }
}

/// Applies the plant transitions: exhausted health decays to a stump, and a
/// sapling that reached its health limit matures into a tree.
fn transform_plant(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) -> bool {
    let Some(entity) = world.entity(id) else {
        return false;
    };
    let kind = entity.kind();
    let name = entity.name().to_owned();
    let position = entity.position();
    let health = entity.health();
    let health_limit = entity.health_limit();

    if health <= 0 {
        let frames = world.catalog().frames(EntityKind::Stump);
        transform_entity(world, scheduler, id, factory::stump(name, position, frames));
        return true;
    }
    if kind == EntityKind::Sapling && health >= health_limit {
        let defaults = world.tree_defaults();
        let frames = world.catalog().frames(EntityKind::Tree);
        transform_entity(
            world,
            scheduler,
            id,
            factory::tree_with_defaults(name, position, defaults, frames),
        );
        return true;
    }
    false
}

/// Steps a mover toward a target cell along its kind's passability policy.
///
/// Returns true when the mover already stands adjacent to the target, in
/// which case no step is taken and the caller performs its adjacency action.
/// An empty path leaves the mover in place for this tick.
fn approach(
    world: &mut WorldModel,
    scheduler: &mut EventScheduler,
    id: EntityId,
    target: Point,
) -> bool {
    let Some(entity) = world.entity(id) else {
        return false;
    };
    let position = entity.position();
    if position.adjacent(target) {
        return true;
    }

    let blocked = entity.kind().blocking_kinds();
    let path = AStarPathing.compute_path(
        position,
        target,
        |point| world.is_passable(point, blocked),
        |point, goal| point.adjacent(goal),
        cardinal_neighbors,
    );
    if let Some(&step) = path.first() {
        world.move_entity(scheduler, id, step);
    }
    false
}

fn execute_fairy_activity(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    let name = entity.name().to_owned();
    let position = entity.position();
    let action_period = entity.action_period();
    let animation_period = entity.animation_period();

    if world.background_key(position) == Some(GARDEN_BACKGROUND_KEY) {
        let frames = world.catalog().frames(EntityKind::Dog);
        transform_entity(
            world,
            scheduler,
            id,
            factory::dog(name, position, action_period, animation_period, frames),
        );
        return;
    }

    if let Some(stump) = world.find_nearest(position, &[EntityKind::Stump]) {
        if let Some(stump_pos) = world.entity(stump).map(Entity::position) {
            if approach(world, scheduler, id, stump_pos) {
                let stump_name = world
                    .entity(stump)
                    .map(|entity| entity.name().to_owned())
                    .unwrap_or_default();
                let _ = world.remove_entity(scheduler, stump);
                let frames = world.catalog().frames(EntityKind::Sapling);
                spawn_entity(
                    world,
                    scheduler,
                    factory::sapling(stump_name, stump_pos, frames),
                );
            }
        }
    }
    rearm_activity(world, scheduler, id);
}

fn execute_person_searching_activity(
    world: &mut WorldModel,
    scheduler: &mut EventScheduler,
    id: EntityId,
) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    let position = entity.position();

    let target = world.find_nearest(position, &[EntityKind::Tree, EntityKind::Sapling]);
    if let Some(target) = target {
        if let Some(target_pos) = world.entity(target).map(Entity::position) {
            if approach(world, scheduler, id, target_pos) {
                if let Some(plant) = world.entity_mut(target) {
                    plant.adjust_health(-1);
                }
                if harvest_fills_load(world, id) {
                    transform_to_person_full(world, scheduler, id);
                    return;
                }
            }
        }
    }
    rearm_activity(world, scheduler, id);
}

fn harvest_fills_load(world: &mut WorldModel, id: EntityId) -> bool {
    let Some(person) = world.entity_mut(id) else {
        return false;
    };
    person.increment_resource_count();
    person.resource_count() >= person.resource_limit()
}

fn transform_to_person_full(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    let Some(person) = world.entity(id) else {
        return;
    };
    let template = factory::person_full(
        person.name().to_owned(),
        person.position(),
        person.action_period(),
        person.animation_period(),
        person.resource_limit(),
        world.catalog().frames(EntityKind::PersonFull),
    );
    transform_entity(world, scheduler, id, template);
}

fn execute_person_full_activity(
    world: &mut WorldModel,
    scheduler: &mut EventScheduler,
    id: EntityId,
) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    let position = entity.position();

    if let Some(house) = world.find_nearest(position, &[EntityKind::House]) {
        if let Some(house_pos) = world.entity(house).map(Entity::position) {
            if approach(world, scheduler, id, house_pos) {
                transform_to_person_searching(world, scheduler, id);
                return;
            }
        }
    }
    rearm_activity(world, scheduler, id);
}

fn transform_to_person_searching(
    world: &mut WorldModel,
    scheduler: &mut EventScheduler,
    id: EntityId,
) {
    let Some(person) = world.entity(id) else {
        return;
    };
    let template = factory::person_searching(
        person.name().to_owned(),
        person.position(),
        person.action_period(),
        person.animation_period(),
        person.resource_limit(),
        world.catalog().frames(EntityKind::PersonSearching),
    );
    transform_entity(world, scheduler, id, template);
}

fn execute_cat_activity(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    let position = entity.position();

    if let Some(tree) = world.find_nearest(position, &[EntityKind::Tree]) {
        if let Some(tree_pos) = world.entity(tree).map(Entity::position) {
            if approach(world, scheduler, id, tree_pos) {
                let tree_name = world
                    .entity(tree)
                    .map(|entity| entity.name().to_owned())
                    .unwrap_or_default();
                let _ = world.remove_entity(scheduler, tree);
                let frames = world.catalog().frames(EntityKind::Pink);
                spawn_entity(world, scheduler, factory::pink(tree_name, tree_pos, frames));
            }
        }
    }
    rearm_activity(world, scheduler, id);
}

fn execute_dog_activity(world: &mut WorldModel, scheduler: &mut EventScheduler, id: EntityId) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    let name = entity.name().to_owned();
    let position = entity.position();

    if let Some(house) = world.find_nearest(position, &[EntityKind::House]) {
        if let Some(house_pos) = world.entity(house).map(Entity::position) {
            if approach(world, scheduler, id, house_pos) {
                // The house persists; the treat lands on the first free cell
                // around it so the one-entity-per-cell rule holds.
                if let Some(drop) = treat_drop_cell(world, house_pos) {
                    let frames = world.catalog().frames(EntityKind::Treat);
                    spawn_entity(
                        world,
                        scheduler,
                        factory::treat(format!("treat_{name}"), drop, frames),
                    );
                }
            }
        }
    }
    rearm_activity(world, scheduler, id);
}

/// First free cell for a dropped treat: the house cell itself when vacant,
/// otherwise the first empty cardinal neighbor in N/E/S/W order.
fn treat_drop_cell(world: &WorldModel, house_pos: Point) -> Option<Point> {
    if world.occupant(house_pos).is_none() {
        return Some(house_pos);
    }
    cardinal_neighbors(house_pos)
        .find(|&cell| world.within_bounds(cell) && world.occupant(cell).is_none())
}
