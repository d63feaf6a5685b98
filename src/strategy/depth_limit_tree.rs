//! The depth-limited tree strategy: branches fill downward until the depth
//! cap, and mirrors beyond the structural capacity stay unplaced.

use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::arena::{MirrorId, NodeId};
use crate::builder;
use crate::config::SimProps;
use crate::network::Network;
use crate::strategy::{spawn_head, TopologyStrategy};
use crate::structure::{depth_limit_tree, tree, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::DepthLimitTree;

#[derive(Debug)]
pub struct DepthLimitTreeStrategy {
  max_depth: usize,
  max_children: Option<usize>,
}

impl DepthLimitTreeStrategy {
  /// `max_children = None` means an unbounded branching factor.
  pub fn new(max_depth: usize, max_children: Option<usize>) -> Self {
    DepthLimitTreeStrategy { max_depth, max_children }
  }

  pub fn max_depth(&self) -> usize {
    self.max_depth
  }
}

impl TopologyStrategy for DepthLimitTreeStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "depth_limit_tree"
  }

  fn init_network(
    &mut self, net: &mut Network, pool: &[MirrorId], props: &SimProps, rng: &mut StdRng,
    now: Tick,
  ) -> Option<NodeId> {
    let (&first, rest) = pool.split_first()?;
    let head = spawn_head(net, first, T);
    self.init_network_sub(net, head, rest, props, rng, now);
    Some(head)
  }

  fn init_network_sub(
    &mut self, net: &mut Network, anchor: NodeId, pool: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    let (edges, unplaced) = builder::grow_depth_limit_tree(
      &mut net.graph,
      anchor,
      pool,
      self.max_depth,
      self.max_children,
    );
    for (parent, child) in edges {
      net.wire(parent, child, &[T], now, props, rng);
    }
    if !unplaced.is_empty() {
      warn!(
        unplaced = unplaced.len(),
        max_depth = self.max_depth,
        "degenerate strategy: capacity exceeded"
      );
    }
  }

  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    self.init_network_sub(net, head, added, props, rng, now);
  }

  fn handle_remove_mirrors(
    &mut self, net: &mut Network, head: NodeId, count: usize, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> Vec<MirrorId> {
    let mut retired = Vec::new();
    for _ in 0..count {
      let members = net.graph.collect_members(T, head);
      let order = tree::removal_order(&net.graph, T, &members, head);
      let victim = order
        .first()
        .and_then(|n| net.graph.get(*n).and_then(|node| node.mirror()))
        .or_else(|| net.graph.get(head).and_then(|n| n.mirror()));
      let Some(mirror) = victim else { break };
      net.retire_mirror(mirror, now, props, rng);
      retired.push(mirror);
    }
    retired
  }

  fn predicted_link_count(&self, members: usize) -> usize {
    let placed = match depth_limit_tree::capacity(self.max_depth, self.max_children) {
      Some(cap) => members.min(cap),
      None => members,
    };
    placed.saturating_sub(1)
  }

  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize {
    net.graph.get(node).map(|n| n.degree_for(T)).unwrap_or(0)
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let members = net.graph.collect_members(T, head);
    if members.len() <= 1 {
      debug!(members = members.len(), "depth-limited tree below regular size");
      return Ok(());
    }
    depth_limit_tree::is_valid_structure(
      &net.graph,
      &members,
      head,
      self.max_depth,
      self.max_children,
    )
  }
}
