#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Policy-parameterized A* search shared by every mobile entity kind.
//!
//! Movement policies differ per kind only in their passability predicate, so
//! the search itself is written once against caller-supplied closures: which
//! cells can be entered, when a node satisfies the goal, and how neighbors
//! are generated. An empty result means "no path" and is a normal outcome.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use grove_core::Point;

/// Strategy contract for computing a path between two cells.
pub trait PathingStrategy {
    /// Computes an ordered path from `start` toward `goal`.
    ///
    /// The search terminates on the first expanded node satisfying
    /// `within_reach` against the goal, so movers stop short of the goal
    /// cell itself. The returned path excludes `start`; an empty path means
    /// no reachable node satisfied the goal test.
    fn compute_path<P, W, N, I>(
        &self,
        start: Point,
        goal: Point,
        can_pass_through: P,
        within_reach: W,
        neighbors: N,
    ) -> Vec<Point>
    where
        P: Fn(Point) -> bool,
        W: Fn(Point, Point) -> bool,
        N: Fn(Point) -> I,
        I: IntoIterator<Item = Point>;
}

/// Classic A* over unit-cost grid steps with a Manhattan heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct AStarPathing;

/// Entry in the A* open heap.
///
/// Ordered so the binary heap pops the lowest f-cost first; equal f-costs
/// fall back to insertion sequence, keeping expansion order deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    point: Point,
    f: u32,
    g: u32,
    sequence: u64,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Copy, Debug)]
struct NodeRecord {
    g: u32,
    parent: Option<Point>,
}

impl PathingStrategy for AStarPathing {
    fn compute_path<P, W, N, I>(
        &self,
        start: Point,
        goal: Point,
        can_pass_through: P,
        within_reach: W,
        neighbors: N,
    ) -> Vec<Point>
    where
        P: Fn(Point) -> bool,
        W: Fn(Point, Point) -> bool,
        N: Fn(Point) -> I,
        I: IntoIterator<Item = Point>,
    {
        let mut open = BinaryHeap::new();
        let mut records: HashMap<Point, NodeRecord> = HashMap::new();
        let mut closed: HashSet<Point> = HashSet::new();
        let mut sequence: u64 = 0;

        let _ = records.insert(
            start,
            NodeRecord {
                g: 0,
                parent: None,
            },
        );
        open.push(OpenNode {
            point: start,
            f: start.manhattan_distance(goal),
            g: 0,
            sequence,
        });

        while let Some(current) = open.pop() {
            // Lazy decrease-key: a cheaper route may have superseded this
            // entry after it was pushed.
            if closed.contains(&current.point) {
                continue;
            }
            match records.get(&current.point) {
                Some(record) if record.g == current.g => {}
                _ => continue,
            }

            if within_reach(current.point, goal) {
                return reconstruct(&records, current.point);
            }

            let _ = closed.insert(current.point);

            for neighbor in neighbors(current.point) {
                if closed.contains(&neighbor) || !can_pass_through(neighbor) {
                    continue;
                }

                let tentative_g = current.g + 1;
                let known_g = records.get(&neighbor).map(|record| record.g);
                if known_g.is_some_and(|g| g <= tentative_g) {
                    continue;
                }

                let _ = records.insert(
                    neighbor,
                    NodeRecord {
                        g: tentative_g,
                        parent: Some(current.point),
                    },
                );
                sequence += 1;
                open.push(OpenNode {
                    point: neighbor,
                    f: tentative_g + neighbor.manhattan_distance(goal),
                    g: tentative_g,
                    sequence,
                });
            }
        }

        Vec::new()
    }
}

/// Walks parent links from the terminal node back to the start, excluding
/// the start cell itself.
fn reconstruct(records: &HashMap<Point, NodeRecord>, terminal: Point) -> Vec<Point> {
    let mut path = Vec::new();
    let mut current = terminal;

    while let Some(record) = records.get(&current) {
        let Some(parent) = record.parent else {
            break;
        };
        path.push(current);
        current = parent;
    }

    path.reverse();
    path
}

/// Generates the four cardinal neighbors of a cell in N/E/S/W order.
#[must_use]
pub fn cardinal_neighbors(point: Point) -> NeighborIter {
    let mut neighbors = NeighborIter::default();
    neighbors.push(Point::new(point.x(), point.y() - 1));
    neighbors.push(Point::new(point.x() + 1, point.y()));
    neighbors.push(Point::new(point.x(), point.y() + 1));
    neighbors.push(Point::new(point.x() - 1, point.y()));
    neighbors
}

/// Fixed-capacity iterator over a cell's cardinal neighbors.
#[derive(Clone, Debug, Default)]
pub struct NeighborIter {
    buffer: [Option<Point>; 4],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, point: Point) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(point);
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Point;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(width: i32, height: i32) -> impl Fn(Point) -> bool {
        move |point: Point| {
            point.x() >= 0 && point.x() < width && point.y() >= 0 && point.y() < height
        }
    }

    #[test]
    fn stops_on_the_cell_adjacent_to_the_goal() {
        let path = AStarPathing.compute_path(
            Point::new(0, 0),
            Point::new(3, 0),
            |_| true,
            |point, goal| point.adjacent(goal),
            cardinal_neighbors,
        );

        assert_eq!(path, vec![Point::new(1, 0), Point::new(2, 0)]);
    }

    #[test]
    fn returns_empty_path_when_start_is_already_within_reach() {
        let path = AStarPathing.compute_path(
            Point::new(2, 0),
            Point::new(3, 0),
            |_| true,
            |point, goal| point.adjacent(goal),
            cardinal_neighbors,
        );

        assert!(path.is_empty());
    }

    #[test]
    fn enclosed_goal_yields_empty_path() {
        let goal = Point::new(2, 2);
        let in_grid = bounded(5, 5);
        let walls = [
            Point::new(2, 1),
            Point::new(3, 2),
            Point::new(2, 3),
            Point::new(1, 2),
        ];
        let can_pass = |point: Point| in_grid(point) && !walls.contains(&point);

        let path = AStarPathing.compute_path(
            Point::new(0, 0),
            goal,
            can_pass,
            |point, goal| point.adjacent(goal),
            cardinal_neighbors,
        );

        assert!(path.is_empty());
    }

    #[test]
    fn routes_around_obstacles_optimally() {
        let in_grid = bounded(4, 3);
        let walls = [Point::new(1, 0), Point::new(1, 1)];
        let can_pass = |point: Point| in_grid(point) && !walls.contains(&point);

        let path = AStarPathing.compute_path(
            Point::new(0, 0),
            Point::new(3, 0),
            can_pass,
            |point, goal| point.adjacent(goal),
            cardinal_neighbors,
        );

        assert_eq!(path.len(), 6);
        assert_eq!(path.last(), Some(&Point::new(2, 0)));

        let mut previous = Point::new(0, 0);
        for step in &path {
            assert!(previous.adjacent(*step), "{previous} -> {step} not a step");
            assert!(can_pass(*step));
            previous = *step;
        }
    }

    #[test]
    fn search_is_deterministic_across_runs() {
        let in_grid = bounded(8, 8);
        let walls = [Point::new(3, 1), Point::new(3, 2), Point::new(3, 3)];
        let can_pass = |point: Point| in_grid(point) && !walls.contains(&point);

        let first = AStarPathing.compute_path(
            Point::new(0, 2),
            Point::new(6, 2),
            can_pass,
            |point, goal| point.adjacent(goal),
            cardinal_neighbors,
        );
        let second = AStarPathing.compute_path(
            Point::new(0, 2),
            Point::new(6, 2),
            can_pass,
            |point, goal| point.adjacent(goal),
            cardinal_neighbors,
        );

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn exact_goal_test_reaches_the_goal_cell() {
        let path = AStarPathing.compute_path(
            Point::new(0, 0),
            Point::new(2, 2),
            bounded(3, 3),
            |point, goal| point == goal,
            cardinal_neighbors,
        );

        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&Point::new(2, 2)));
    }
}
