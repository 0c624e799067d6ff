//! Open/closed bookkeeping shared by the grid planners.
//!
//! Nodes live in an [IndexMap] keyed by position, so a node is addressed by its
//! insertion index and parents are plain indices. The frontier is a
//! [BinaryHeap] with lazy deletion: improved nodes are pushed again and stale
//! entries are skipped when popped. The generic search loop is a variant of
//! [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html)
//! which lets successor generation see the parent of the node being expanded,
//! as Jump Point Search needs.
use fxhash::FxBuildHasher;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use num_traits::Zero;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Marks the root of a search tree.
pub const NO_PARENT: usize = usize::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchNode<C> {
    pub parent: usize,
    pub g: C,
    pub h: C,
    pub closed: bool,
}

impl<C: Zero + Copy> SearchNode<C> {
    pub fn f(&self) -> C {
        self.g + self.h
    }
}

struct SmallestCostHolder<K> {
    estimated_cost: K,
    cost: K,
    sequence: usize,
    index: usize,
}

impl<K: PartialEq> Eq for SmallestCostHolder<K> {}

impl<K: PartialEq> PartialEq for SmallestCostHolder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost) && self.sequence == other.sequence
    }
}

impl<K: Ord> PartialOrd for SmallestCostHolder<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for SmallestCostHolder<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lowest estimated cost first, then first in first out.
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            s => s,
        }
    }
}

/// Per-run search state: node arena, frontier and counters. Created when a
/// query starts and dropped when it returns.
pub struct SearchContext<N, C> {
    frontier: BinaryHeap<SmallestCostHolder<C>>,
    nodes: FxIndexMap<N, SearchNode<C>>,
    sequence: usize,
    max_expansions: usize,
    expanded: usize,
    iterations: usize,
    capped: bool,
}

impl<N, C> SearchContext<N, C>
where
    N: Eq + Hash + Clone,
    C: Zero + Ord + Copy,
{
    /// A context that gives up after closing `max_expansions` nodes.
    pub fn new(max_expansions: usize) -> SearchContext<N, C> {
        SearchContext {
            frontier: BinaryHeap::new(),
            nodes: FxIndexMap::default(),
            sequence: 0,
            max_expansions,
            expanded: 0,
            iterations: 0,
            capped: false,
        }
    }

    fn push(&mut self, index: usize, cost: C, h: C) {
        self.frontier.push(SmallestCostHolder {
            estimated_cost: cost + h,
            cost,
            sequence: self.sequence,
            index,
        });
        self.sequence += 1;
    }

    /// Seeds the search with its root and returns the root's index.
    pub fn push_start(&mut self, start: N, h: C) -> usize {
        let (index, _) = self.nodes.insert_full(
            start,
            SearchNode {
                parent: NO_PARENT,
                g: Zero::zero(),
                h,
                closed: false,
            },
        );
        self.push(index, Zero::zero(), h);
        index
    }

    /// Pops the open node with the lowest f, closes it and returns its index.
    /// Returns [None] when the frontier is exhausted or the expansion cap is hit.
    pub fn pop(&mut self) -> Option<usize> {
        while let Some(SmallestCostHolder { cost, index, .. }) = self.frontier.pop() {
            self.iterations += 1;
            let node = &self.nodes[index];
            // Nodes are pushed again when a cheaper route is found, skip the
            // outdated entries.
            if node.closed || cost > node.g {
                continue;
            }
            if self.expanded >= self.max_expansions {
                self.capped = true;
                return None;
            }
            self.nodes[index].closed = true;
            self.expanded += 1;
            return Some(index);
        }
        None
    }

    /// Offers `successor` at cost `g` through `parent`. Closed nodes are final and
    /// are never reopened. Returns whether the successor was (re)queued.
    pub fn relax<FH>(&mut self, successor: N, parent: usize, g: C, heuristic: FH) -> bool
    where
        FH: FnOnce(&N) -> C,
    {
        let (index, h) = match self.nodes.entry(successor) {
            Vacant(e) => {
                let h = heuristic(e.key());
                let index = e.index();
                e.insert(SearchNode {
                    parent,
                    g,
                    h,
                    closed: false,
                });
                (index, h)
            }
            Occupied(mut e) => {
                let index = e.index();
                let node = e.get_mut();
                if node.closed || node.g <= g {
                    return false;
                }
                node.g = g;
                node.parent = parent;
                (index, node.h)
            }
        };
        self.push(index, g, h);
        true
    }

    pub fn key(&self, index: usize) -> Option<&N> {
        self.nodes.get_index(index).map(|(key, _)| key)
    }

    pub fn node(&self, index: usize) -> Option<&SearchNode<C>> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    /// Position of the parent of the node at `index`, [None] for the root.
    pub fn parent_of(&self, index: usize) -> Option<&N> {
        self.node(index).and_then(|node| self.key(node.parent))
    }

    /// Index of `key` if it has been closed.
    pub fn closed_index(&self, key: &N) -> Option<usize> {
        self.nodes
            .get_full(key)
            .filter(|(_, _, node)| node.closed)
            .map(|(index, _, _)| index)
    }

    /// Walks from the node at `index` up to the root.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = &N> + '_ {
        std::iter::successors(Some(index), move |&i| {
            self.node(i)
                .map(|node| node.parent)
                .filter(|&p| p != NO_PARENT)
        })
        .filter_map(move |i| self.key(i))
    }

    /// The root to node chain ending at `index`.
    pub fn reverse_path(&self, index: usize) -> Vec<N> {
        let mut path: Vec<N> = self.ancestors(index).cloned().collect();
        path.reverse();
        path
    }

    /// Number of nodes closed so far.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Number of frontier pops, stale entries included.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the search stopped on the expansion cap.
    pub fn capped(&self) -> bool {
        self.capped
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs a best-first search from `start` until `success` holds for a popped
    /// node. `successors` receives the parent of the expanded node (if any).
    pub fn astar_jps<FN, IN, FH, FS>(
        &mut self,
        start: &N,
        mut successors: FN,
        mut heuristic: FH,
        mut success: FS,
    ) -> Option<(Vec<N>, C)>
    where
        FN: FnMut(Option<&N>, &N) -> IN,
        IN: IntoIterator<Item = (N, C)>,
        FH: FnMut(&N) -> C,
        FS: FnMut(&N) -> bool,
    {
        let h = heuristic(start);
        self.push_start(start.clone(), h);
        while let Some(index) = self.pop() {
            let (successors, cost) = {
                let node = self.key(index)?;
                let cost = self.nodes[index].g;
                if success(node) {
                    return Some((self.reverse_path(index), cost));
                }
                (successors(self.parent_of(index), node), cost)
            };
            for (successor, move_cost) in successors {
                self.relax(successor, index, cost + move_cost, &mut heuristic);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Line graph 0 - 1 - ... - 9 with unit costs.
    fn line_successors(_parent: Option<&i32>, n: &i32) -> Vec<(i32, u32)> {
        [n - 1, n + 1]
            .into_iter()
            .filter(|m| (0..10).contains(m))
            .map(|m| (m, 1))
            .collect()
    }

    #[test]
    fn finds_shortest_chain() {
        let mut ctx: SearchContext<i32, u32> = SearchContext::new(100);
        let (path, cost) = ctx
            .astar_jps(&2, line_successors, |n| (7 - n).unsigned_abs(), |n| *n == 7)
            .unwrap();
        assert_eq!(path, vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(cost, 5);
        assert_eq!(ctx.expanded(), 6);
    }

    #[test]
    fn start_is_goal() {
        let mut ctx: SearchContext<i32, u32> = SearchContext::new(100);
        let (path, cost) = ctx.astar_jps(&4, line_successors, |_| 0, |n| *n == 4).unwrap();
        assert_eq!(path, vec![4]);
        assert_eq!(cost, 0);
        assert_eq!(ctx.expanded(), 1);
    }

    #[test]
    fn expansion_cap_stops_search() {
        let mut ctx: SearchContext<i32, u32> = SearchContext::new(3);
        let result = ctx.astar_jps(&0, line_successors, |_| 0, |n| *n == 9);
        assert!(result.is_none());
        assert!(ctx.capped());
        assert_eq!(ctx.expanded(), 3);
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut ctx: SearchContext<char, u32> = SearchContext::new(10);
        let root = ctx.push_start('r', 0);
        assert_eq!(ctx.pop(), Some(root));
        for c in ['a', 'b', 'c'] {
            assert!(ctx.relax(c, root, 1, |_| 1));
        }
        let mut order = Vec::new();
        while let Some(i) = ctx.pop() {
            order.extend(ctx.key(i).copied());
        }
        assert_eq!(order, vec!['a', 'b', 'c']);
    }

    #[test]
    fn closed_nodes_are_not_reopened() {
        let mut ctx: SearchContext<char, u32> = SearchContext::new(10);
        let root = ctx.push_start('r', 0);
        ctx.pop();
        assert!(ctx.relax('a', root, 5, |_| 0));
        assert!(ctx.relax('a', root, 3, |_| 0), "cheaper route updates an open node");
        assert!(!ctx.relax('a', root, 4, |_| 0));
        let a = ctx.pop().unwrap();
        assert_eq!(ctx.node(a).unwrap().g, 3);
        assert!(!ctx.relax('a', root, 1, |_| 0));
        assert_eq!(ctx.closed_index(&'a'), Some(a));
        // The stale entry at cost 5 is skipped.
        assert_eq!(ctx.pop(), None);
        assert_eq!(ctx.reverse_path(a), vec!['r', 'a']);
    }
}
