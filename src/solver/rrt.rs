//! Goal-biased [Rapidly-exploring Random Tree](https://en.wikipedia.org/wiki/Rapidly-exploring_random_tree)
//! planning in the continuous plane covered by an [ObstacleField].
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use crate::error::{Endpoint, PlanError, Result};
use crate::field::ObstacleField;
use crate::line::segment_clear_vec2;
use crate::optimizer::shortcut_polyline;
use crate::point::Vec2;
use crate::solver::{Plan, Planner, SearchStats};

/// Tuning of [RrtSolver]. Distances are in cells.
#[derive(Clone, Debug, PartialEq)]
pub struct RrtConfig {
    /// Longest edge added to the tree.
    pub step_size: f64,
    pub max_iterations: usize,
    /// Probability of sampling the goal instead of a uniform position.
    pub goal_bias: f64,
    /// A node this close to the goal with a clear segment to it ends the search.
    pub goal_radius: f64,
    /// The tree is checked for collisions every this many iterations.
    pub prune_interval: usize,
    /// Fixed seed for reproducible trees; [None] seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RrtConfig {
    fn default() -> RrtConfig {
        RrtConfig {
            step_size: 2.5,
            max_iterations: 5000,
            goal_bias: 0.3,
            goal_radius: 2.5,
            prune_interval: 100,
            seed: None,
        }
    }
}

impl RrtConfig {
    pub fn with_seed(mut self, seed: u64) -> RrtConfig {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(PlanError::Config(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }
        if self.max_iterations == 0 {
            return Err(PlanError::Config("max_iterations must be positive".to_owned()));
        }
        if !(0.0..=1.0).contains(&self.goal_bias) {
            return Err(PlanError::Config(format!(
                "goal_bias must lie in [0, 1], got {}",
                self.goal_bias
            )));
        }
        if !self.goal_radius.is_finite() || self.goal_radius <= 0.0 {
            return Err(PlanError::Config(format!(
                "goal_radius must be positive, got {}",
                self.goal_radius
            )));
        }
        if self.prune_interval == 0 {
            return Err(PlanError::Config("prune_interval must be positive".to_owned()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RrtNode {
    pub position: Vec2,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Length of the tree path from the root.
    pub cost: f64,
    pub alive: bool,
}

/// Arena of tree nodes. The root has index 0 and every child is inserted after
/// its parent, so indices increase away from the root.
#[derive(Clone, Debug, Default)]
pub struct RrtTree {
    nodes: Vec<RrtNode>,
}

impl RrtTree {
    pub fn new(root: Vec2) -> RrtTree {
        RrtTree {
            nodes: vec![RrtNode {
                position: root,
                parent: None,
                children: Vec::new(),
                cost: 0.0,
                alive: true,
            }],
        }
    }

    /// Number of nodes ever inserted, pruned ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    pub fn node(&self, index: usize) -> Option<&RrtNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[RrtNode] {
        &self.nodes
    }

    pub fn is_alive(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(|n| n.alive)
    }

    /// Adds `position` as a child of `parent` and returns its index.
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn insert(&mut self, parent: usize, position: Vec2) -> usize {
        let parent_node = &self.nodes[parent];
        let cost = parent_node.cost + parent_node.position.distance(&position);
        let index = self.nodes.len();
        self.nodes.push(RrtNode {
            position,
            parent: Some(parent),
            children: Vec::new(),
            cost,
            alive: true,
        });
        self.nodes[parent].children.push(index);
        index
    }

    /// The alive node closest to `target`.
    pub fn nearest(&self, target: &Vec2) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, n)| (i, n.position.distance(target)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Positions from the root to the node at `index`.
    pub fn path_to(&self, index: usize) -> Vec<Vec2> {
        let mut path: Vec<Vec2> = std::iter::successors(Some(index), |&i| {
            self.nodes.get(i).and_then(|n| n.parent)
        })
        .filter_map(|i| self.nodes.get(i).map(|n| n.position))
        .collect();
        path.reverse();
        path
    }

    /// Cuts the node at `index` from its parent and marks its whole subtree as
    /// dead. Returns how many nodes died.
    pub fn detach(&mut self, index: usize) -> usize {
        let Some(parent) = self.nodes.get(index).and_then(|n| n.parent) else {
            return 0;
        };
        self.nodes[parent].children.retain(|&c| c != index);
        let mut killed = 0;
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            let node = &mut self.nodes[i];
            if node.alive {
                node.alive = false;
                killed += 1;
                stack.extend(node.children.iter().copied());
            }
        }
        killed
    }

    /// Detaches every node whose cell or incoming edge now collides, with its
    /// subtree. The root is kept. Returns how many nodes died.
    pub fn prune_collisions<F: ObstacleField>(&mut self, field: &F) -> usize {
        let mut killed = 0;
        for index in 1..self.nodes.len() {
            let node = &self.nodes[index];
            if !node.alive {
                continue;
            }
            let collides = match node.parent.and_then(|p| self.nodes.get(p)) {
                Some(parent) => !segment_clear_vec2(field, parent.position, node.position),
                None => field.is_blocked_point(node.position.cell()),
            };
            if collides {
                killed += self.detach(index);
            }
        }
        killed
    }
}

/// A grown tree, with the index of the goal node if the goal was reached.
#[derive(Clone, Debug)]
pub struct RrtRun {
    pub tree: RrtTree,
    pub goal: Option<usize>,
    pub stats: SearchStats,
}

impl RrtRun {
    /// The tree path to the goal, before smoothing.
    pub fn raw_path(&self) -> Option<Vec<Vec2>> {
        self.goal.map(|g| self.tree.path_to(g))
    }
}

fn validate_position<F: ObstacleField>(
    field: &F,
    position: Vec2,
    endpoint: Endpoint,
) -> Result<()> {
    // Written so NaN coordinates fail the check as well.
    let in_bounds = position.x >= 0.0
        && position.y >= 0.0
        && position.x < field.width() as f64
        && position.y < field.height() as f64;
    if !in_bounds {
        return Err(PlanError::OutOfBounds {
            endpoint,
            position: position.to_string(),
            width: field.width(),
            height: field.height(),
        });
    }
    if field.is_blocked_point(position.cell()) {
        return Err(PlanError::Blocked {
            endpoint,
            position: position.to_string(),
        });
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RrtSolver {
    config: RrtConfig,
}

impl RrtSolver {
    pub fn new(config: RrtConfig) -> Result<RrtSolver> {
        config.validate()?;
        Ok(RrtSolver { config })
    }

    pub fn config(&self) -> &RrtConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Grows a tree from `start` until it connects to `goal` or the iteration
    /// budget runs out. The path in the returned tree is not smoothed.
    pub fn grow_tree<F: ObstacleField>(
        &self,
        field: &F,
        start: Vec2,
        goal: Vec2,
    ) -> Result<RrtRun> {
        validate_position(field, start, Endpoint::Start)?;
        validate_position(field, goal, Endpoint::Goal)?;
        let config = &self.config;
        let timer = Instant::now();
        let mut stats = SearchStats::default();
        let mut tree = RrtTree::new(start);
        debug!("RRT: growing from {start} to {goal}");

        let mut found = None;
        if start.distance(&goal) <= config.goal_radius && segment_clear_vec2(field, start, goal) {
            found = Some(if start == goal { 0 } else { tree.insert(0, goal) });
        } else {
            let mut rng = self.rng();
            let (width, height) = (field.width() as f64, field.height() as f64);
            for iteration in 1..=config.max_iterations {
                stats.iterations = iteration;
                if iteration % config.prune_interval == 0 {
                    let killed = tree.prune_collisions(field);
                    if killed > 0 {
                        debug!("RRT: pruned {killed} nodes at iteration {iteration}");
                    }
                }
                let sample = if rng.gen_bool(config.goal_bias) {
                    goal
                } else {
                    Vec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height))
                };
                let Some(nearest) = tree.nearest(&sample) else {
                    break;
                };
                let from = tree.nodes[nearest].position;
                let distance = from.distance(&sample);
                // Nothing to steer towards.
                if distance <= f64::EPSILON {
                    continue;
                }
                let t = config.step_size.min(distance) / distance;
                let new = Vec2::new(
                    from.x + (sample.x - from.x) * t,
                    from.y + (sample.y - from.y) * t,
                );
                if !segment_clear_vec2(field, from, new) {
                    continue;
                }
                let index = tree.insert(nearest, new);
                if new.distance(&goal) <= config.goal_radius
                    && segment_clear_vec2(field, new, goal)
                {
                    found = Some(tree.insert(index, goal));
                    break;
                }
            }
            if found.is_none() {
                warn!(
                    "RRT: goal {goal} not reached within {} iterations",
                    config.max_iterations
                );
            }
        }
        stats.nodes_explored = tree.len();
        stats.elapsed = timer.elapsed();
        Ok(RrtRun {
            tree,
            goal: found,
            stats,
        })
    }
}

impl<F: ObstacleField> Planner<F> for RrtSolver {
    type Position = Vec2;

    /// Grows a tree and shortcuts the path through it.
    fn find_path(&self, field: &F, start: Vec2, goal: Vec2) -> Result<Plan<Vec2>> {
        let run = self.grow_tree(field, start, goal)?;
        let path = run.raw_path().map(|raw| shortcut_polyline(field, &raw));
        Ok(Plan::new(path, run.stats))
    }
}
