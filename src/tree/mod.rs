//! The Hoeffding tree: training, prediction, pruning and locking.
//!
//! [`HoeffdingTree`] owns a single readers–writer lock around the node
//! arena. [`train`](HoeffdingTree::train) holds the exclusive lock for its
//! whole body, so statistics updates, split promotion and pruning form one
//! atomic step; predictions and renderings share the read lock and never
//! observe a half-promoted split.

mod node;
mod render;
mod trace;

pub use node::{LeafNode, Node, NodeId, SplitNode};
pub use trace::{PossibleSplit, Trace};

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, trace};
use rayon::prelude::*;

use crate::config::{ConfigError, ResolvedConfig, TreeConfig};
use crate::data::{Instance, Model, Prediction};
use crate::persist::PersistError;
use crate::split::SplitCondition;
use crate::stats::ObservationStats;

use node::FoundNode;

/// Aggregate information about the tree's structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeInfo {
    pub num_nodes: usize,
    pub num_active_leaves: usize,
    pub num_inactive_leaves: usize,
    pub max_depth: usize,
}

/// An incrementally trained Hoeffding decision tree.
///
/// Training consumes labelled instances one at a time; once a leaf has
/// accumulated enough evidence that one predictor's split merit separates
/// from the runner-up by more than the Hoeffding bound, the leaf is promoted
/// to a split node. Many threads may predict concurrently while one trains.
pub struct HoeffdingTree {
    model: Arc<Model>,
    state: RwLock<TreeState>,
}

impl HoeffdingTree {
    /// Start a new tree from a model descriptor.
    pub fn new(model: Model, config: TreeConfig) -> Result<Self, ConfigError> {
        let resolved = config.normalize(model.is_regression())?;
        let is_regression = model.is_regression();
        Ok(Self {
            model: Arc::new(model),
            state: RwLock::new(TreeState::new(is_regression, resolved)),
        })
    }

    /// Load a tree previously written with [`dump_to`](Self::dump_to).
    pub fn load(reader: impl io::Read, config: TreeConfig) -> Result<Self, PersistError> {
        crate::persist::load(reader, config)
    }

    pub(crate) fn from_parts(model: Model, nodes: Vec<Node>, root: NodeId, config: ResolvedConfig) -> Self {
        let is_regression = model.is_regression();
        Self {
            model: Arc::new(model),
            state: RwLock::new(TreeState {
                nodes,
                root,
                config,
                is_regression,
                cycles: 0,
                scratch: Vec::new(),
            }),
        }
    }

    /// The model descriptor this tree was built against.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Swap hyperparameters on a live tree.
    pub fn set_config(&self, config: TreeConfig) -> Result<(), ConfigError> {
        let resolved = config.normalize(self.model.is_regression())?;
        self.write_state().config = resolved;
        Ok(())
    }

    /// Train on one labelled instance.
    ///
    /// Returns a [`Trace`] of the split decision when tracing is enabled and
    /// the landed leaf was due for evaluation.
    pub fn train(&self, instance: &dyn Instance) -> Option<Trace> {
        let mut guard = self.write_state();
        let state = &mut *guard;

        let found = state.filter(instance);
        let leaf_id = match (found.node, found.parent) {
            (Some(id), _) => id,
            (None, Some((parent, branch))) => state.materialize_leaf(parent, branch),
            (None, None) => unreachable!("filter always yields a node or a parent"),
        };
        if !state.nodes[leaf_id as usize].is_leaf() {
            // A split node with an unknown branch learns nothing.
            return None;
        }

        let weight = instance.get_weight();
        let split_points = state.config.split_points;
        if let Node::Leaf(leaf) = &mut state.nodes[leaf_id as usize] {
            leaf.stats.update(&self.model, instance, weight, split_points);
        }

        state.cycles += 1;
        if state.config.prune_period > 0 && state.cycles % state.config.prune_period == 0 {
            state.prune_to_target(&self.model);
        }

        let (leaf_weight, last_eval) = match &state.nodes[leaf_id as usize] {
            Node::Leaf(leaf) => (leaf.stats.total_weight(), leaf.weight_on_last_eval),
            Node::Split(_) => unreachable!("promotion cannot happen mid-update"),
        };
        if leaf_weight - last_eval < state.config.grace_period {
            return None;
        }

        let (promotion, trace) = attempt_split(state, &self.model, leaf_id, leaf_weight);
        match promotion {
            Some((condition, fallback, post)) => {
                debug!(
                    "promoting leaf at depth {} on {:?} (weight {:.1})",
                    state.depth_of(leaf_id),
                    condition.predictor_name(),
                    leaf_weight,
                );
                state.promote(leaf_id, condition, fallback, post);
            }
            None => {
                if let Node::Leaf(leaf) = &mut state.nodes[leaf_id as usize] {
                    if leaf_weight > leaf.weight_on_last_eval {
                        leaf.weight_on_last_eval = leaf_weight;
                    }
                }
            }
        }
        trace
    }

    /// Predict the target for an instance.
    ///
    /// Routes from the root to a leaf; an instance whose branch is unknown at
    /// some split is answered from that split's fallback distribution.
    pub fn predict(&self, instance: &dyn Instance) -> Prediction {
        self.read_state().predict(&self.model, instance)
    }

    /// Predict a batch of instances under a single read lock.
    pub fn predict_batch<I: Instance>(&self, instances: &[I]) -> Vec<Prediction> {
        let state = self.read_state();
        instances
            .iter()
            .map(|instance| state.predict(&self.model, instance))
            .collect()
    }

    /// Like [`predict_batch`](Self::predict_batch), parallelised over the
    /// batch. Readers share the lock.
    pub fn par_predict_batch<I: Instance + Sync>(&self, instances: &[I]) -> Vec<Prediction> {
        let state = self.read_state();
        instances
            .par_iter()
            .map(|instance| state.predict(&self.model, instance))
            .collect()
    }

    /// Structure statistics of the current tree.
    pub fn info(&self) -> TreeInfo {
        let state = self.read_state();
        let mut info = TreeInfo::default();
        state.read_info(state.root, 0, &mut info);
        info
    }

    /// Estimated size of the tree in bytes.
    pub fn byte_size(&self) -> usize {
        let state = self.read_state();
        state.byte_size(state.root)
    }

    /// Remove leaves judged obsolete by the evaluator.
    ///
    /// Each leaf with a known parent is offered to `is_obsolete`; leaves it
    /// accepts are replaced by fresh empty leaves.
    pub fn prune<F>(&self, mut is_obsolete: F)
    where
        F: FnMut(&LeafNode, &SplitNode) -> bool,
    {
        let mut guard = self.write_state();
        let state = &mut *guard;

        let mut pairs = Vec::new();
        state.collect_leaf_parents(state.root, None, &mut pairs);

        let mut obsolete = Vec::new();
        for (leaf_id, parent) in pairs {
            let Some((parent_id, _)) = parent else {
                continue;
            };
            if let (Node::Leaf(leaf), Node::Split(split)) = (
                &state.nodes[leaf_id as usize],
                &state.nodes[parent_id as usize],
            ) {
                if is_obsolete(leaf, split) {
                    obsolete.push(leaf_id);
                }
            }
        }

        let is_regression = state.is_regression;
        for id in obsolete {
            let depth = state.depth_of(id);
            state.nodes[id as usize] =
                Node::Leaf(LeafNode::new(ObservationStats::new(is_regression), depth));
        }
    }

    /// Write the tree as a DOT graph.
    pub fn write_graph(&self, writer: &mut impl io::Write) -> io::Result<()> {
        self.read_state().write_graph(writer)
    }

    /// Write an indented text rendering of the tree.
    pub fn write_text(&self, writer: &mut impl io::Write) -> io::Result<()> {
        self.read_state().write_text(writer)
    }

    /// Serialise the tree, including its model, to a writer.
    pub fn dump_to(&self, writer: impl io::Write) -> Result<(), PersistError> {
        let state = self.read_state();
        crate::persist::dump(&self.model, &state.nodes, state.root, writer)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TreeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// ε = sqrt(R² · ln(1/δ) / 2w)
pub(crate) fn hoeffding_bound(range: f64, confidence: f64, weight: f64) -> f64 {
    (range * range * (1.0 / confidence).ln() / (2.0 * weight)).sqrt()
}

type Promotion = (
    SplitCondition,
    ObservationStats,
    BTreeMap<usize, ObservationStats>,
);

fn attempt_split(
    state: &TreeState,
    model: &Model,
    leaf_id: NodeId,
    weight: f64,
) -> (Option<Promotion>, Option<Trace>) {
    let Node::Leaf(leaf) = &state.nodes[leaf_id as usize] else {
        return (None, None);
    };
    if leaf.is_inactive || !leaf.stats.is_sufficient() {
        return (None, None);
    }

    let cfg = &state.config;
    let mut suggestions = leaf.stats.best_splits(model, cfg);
    let mut trace_rec = cfg.enable_tracing.then(Trace::default);

    let best_merit = suggestions[0].merit();
    let merit_gain = best_merit - suggestions.get(1).map_or(0.0, |s| s.merit());
    let bound = hoeffding_bound(suggestions[0].range(), cfg.split_confidence, weight);

    if let Some(rec) = trace_rec.as_mut() {
        rec.merit_gain = merit_gain;
        rec.hoeffding_bound = bound;
        rec.possible_splits = suggestions
            .iter()
            .filter_map(|s| {
                s.condition().map(|c| PossibleSplit {
                    predictor: c.predictor_name().to_owned(),
                    merit: s.merit(),
                })
            })
            .collect();
    }

    // Split when the gain clears the bound, or when the bound itself has
    // shrunk below the tie threshold and the best split carries real merit.
    let should_split = suggestions[0].condition().is_some()
        && best_merit > 0.0
        && (merit_gain > bound || bound < cfg.tie_threshold);
    if !should_split {
        trace!(
            "deferring split: gain {merit_gain:.4} <= bound {bound:.4} (weight {weight:.1})"
        );
        return (None, trace_rec);
    }

    if let Some(rec) = trace_rec.as_mut() {
        rec.split = true;
    }
    (suggestions.swap_remove(0).into_parts(), trace_rec)
}

/// The lock-protected tree state: the node arena plus training bookkeeping.
pub(crate) struct TreeState {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) config: ResolvedConfig,
    is_regression: bool,
    cycles: u64,
    // Reused by the pruning pass to avoid per-prune allocation.
    scratch: Vec<NodeId>,
}

impl TreeState {
    fn new(is_regression: bool, config: ResolvedConfig) -> Self {
        Self {
            nodes: vec![Node::Leaf(LeafNode::new(
                ObservationStats::new(is_regression),
                0,
            ))],
            root: 0,
            config,
            is_regression,
            cycles: 0,
            scratch: Vec::new(),
        }
    }

    /// Descend from the root by evaluating each split condition.
    fn filter(&self, instance: &dyn Instance) -> FoundNode {
        let mut current = self.root;
        let mut parent = None;
        loop {
            match &self.nodes[current as usize] {
                Node::Leaf(_) => {
                    return FoundNode {
                        node: Some(current),
                        parent,
                    }
                }
                Node::Split(split) => match split.condition.branch(instance) {
                    None => {
                        // Unknown branch: the split node itself answers.
                        return FoundNode {
                            node: Some(current),
                            parent,
                        };
                    }
                    Some(branch) => match split.child(branch) {
                        Some(child) => {
                            parent = Some((current, branch));
                            current = child;
                        }
                        None => {
                            return FoundNode {
                                node: None,
                                parent: Some((current, branch)),
                            }
                        }
                    },
                },
            }
        }
    }

    /// Create a fresh leaf in an empty child slot.
    fn materialize_leaf(&mut self, parent: NodeId, branch: usize) -> NodeId {
        let depth = self.depth_of(parent) + 1;
        let leaf = Node::Leaf(LeafNode::new(ObservationStats::new(self.is_regression), depth));
        let id = self.push(leaf);
        match &mut self.nodes[parent as usize] {
            Node::Split(split) => split.set_child(branch, id),
            Node::Leaf(_) => unreachable!("a leaf has no child slots"),
        }
        id
    }

    /// Replace a leaf with a split node, one seeded child leaf per known
    /// branch.
    fn promote(
        &mut self,
        leaf_id: NodeId,
        condition: SplitCondition,
        fallback: ObservationStats,
        post: BTreeMap<usize, ObservationStats>,
    ) {
        let depth = self.depth_of(leaf_id);
        let arity = condition
            .arity()
            .max(post.keys().next_back().map_or(0, |&branch| branch + 1));
        let mut children = vec![None; arity];
        for (branch, stats) in post {
            let child = self.push(Node::Leaf(LeafNode::new(stats, depth + 1)));
            children[branch] = Some(child);
        }
        self.nodes[leaf_id as usize] = Node::Split(SplitNode {
            condition,
            children,
            fallback,
            depth,
        });
    }

    fn predict(&self, model: &Model, instance: &dyn Instance) -> Prediction {
        let found = self.filter(instance);
        match found.node.or(found.parent.map(|(parent, _)| parent)) {
            Some(id) => self.nodes[id as usize].predict(model),
            None => Prediction::default(),
        }
    }

    fn read_info(&self, id: NodeId, depth: usize, info: &mut TreeInfo) {
        info.num_nodes += 1;
        if depth > info.max_depth {
            info.max_depth = depth;
        }
        match &self.nodes[id as usize] {
            Node::Leaf(leaf) => {
                if leaf.is_inactive {
                    info.num_inactive_leaves += 1;
                } else {
                    info.num_active_leaves += 1;
                }
            }
            Node::Split(split) => {
                for child in split.children.iter().flatten() {
                    self.read_info(*child, depth + 1, info);
                }
            }
        }
    }

    fn find_leaves(&self, id: NodeId, buf: &mut Vec<NodeId>) {
        match &self.nodes[id as usize] {
            Node::Leaf(_) => buf.push(id),
            Node::Split(split) => {
                for child in split.children.iter().flatten() {
                    self.find_leaves(*child, buf);
                }
            }
        }
    }

    fn collect_leaf_parents(
        &self,
        id: NodeId,
        parent: Option<(NodeId, usize)>,
        out: &mut Vec<(NodeId, Option<(NodeId, usize)>)>,
    ) {
        match &self.nodes[id as usize] {
            Node::Leaf(_) => out.push((id, parent)),
            Node::Split(split) => {
                for (branch, child) in split.children.iter().enumerate() {
                    if let Some(child) = child {
                        self.collect_leaf_parents(*child, Some((id, branch)), out);
                    }
                }
            }
        }
    }

    /// Cumulative byte-size estimate of a subtree.
    fn byte_size(&self, id: NodeId) -> usize {
        let node = &self.nodes[id as usize];
        let mut size = node.byte_size();
        if let Node::Split(split) = node {
            for child in split.children.iter().flatten() {
                size += self.byte_size(*child);
            }
        }
        size
    }

    fn depth_of(&self, id: NodeId) -> u32 {
        match &self.nodes[id as usize] {
            Node::Leaf(leaf) => leaf.depth,
            Node::Split(split) => split.depth,
        }
    }

    /// Deactivate the least promising leaves until the estimated byte size
    /// fits the configured budget; reactivate past the pivot while the
    /// budget allows.
    fn prune_to_target(&mut self, model: &Model) {
        let target = self.config.prune_mem_target;
        let mut size = self.byte_size(self.root);
        if size <= target {
            return;
        }
        let start_size = size;

        let mut leaves = std::mem::take(&mut self.scratch);
        leaves.clear();
        self.find_leaves(self.root, &mut leaves);

        // Ascending promise: the first leaves in the ordering are the first
        // to deactivate.
        let mut keyed: Vec<(NodeId, f64, f64)> = leaves
            .iter()
            .map(|&id| {
                let Node::Leaf(leaf) = &self.nodes[id as usize] else {
                    unreachable!("find_leaves yields leaves only");
                };
                let promise = if leaf.is_inactive || !leaf.stats.is_sufficient() {
                    0.0
                } else {
                    leaf.stats.best_splits(model, &self.config)[0].merit()
                };
                (id, promise, leaf.weight_on_last_eval)
            })
            .collect();
        keyed.sort_by(|a, b| {
            (a.1, a.2)
                .partial_cmp(&(b.1, b.2))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut pivot = keyed.len();
        for (i, &(id, _, _)) in keyed.iter().enumerate() {
            let node_size = self.nodes[id as usize].byte_size();
            let Node::Leaf(leaf) = &mut self.nodes[id as usize] else {
                unreachable!();
            };
            if leaf.is_inactive {
                continue;
            }
            leaf.deactivate();
            size = size.saturating_sub(node_size);
            if size <= target {
                pivot = i;
                break;
            }
        }

        // The most promising leaves sort last; give previously deactivated
        // ones their statistics back while the budget holds.
        let mut reactivated = Vec::new();
        for &(id, _, _) in keyed.iter().skip(pivot + 1) {
            let Node::Leaf(leaf) = &mut self.nodes[id as usize] else {
                unreachable!();
            };
            if !leaf.is_inactive {
                continue;
            }
            leaf.activate();
            size += self.nodes[id as usize].byte_size();
            reactivated.push(id);
            if size > target {
                break;
            }
        }
        while size > target {
            let Some(id) = reactivated.pop() else {
                break;
            };
            let node_size = self.nodes[id as usize].byte_size();
            let Node::Leaf(leaf) = &mut self.nodes[id as usize] else {
                unreachable!();
            };
            leaf.deactivate();
            size = size.saturating_sub(node_size);
        }

        self.scratch = leaves;
        debug!(
            "pruning pass: {start_size}B -> {}B (target {target}B)",
            self.byte_size(self.root)
        );
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }
}

// =============================================================================
// Tests
// =============================================================================
