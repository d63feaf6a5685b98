//! The snowflake strategy: several hosted substructures woven together by
//! a central bridge tree.
//!
//! The rotation sequence decides the type of each substructure, the
//! density parameter how many of them the mirror pool splits into, and the
//! bridge distance how many intermediate mirrors sit between the central
//! bridge member and each substructure's anchor. Substructures are built
//! and maintained by their own strategy instances through the composable
//! `init_network_sub` entry point.

use std::fmt;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::error::{SimError, SimResult};
use crate::network::Network;
use crate::strategy::{
  spawn_head, BalancedTreeStrategy, DepthLimitTreeStrategy, FullyConnectedStrategy,
  NConnectedStrategy, StarStrategy, TopologyStrategy,
};
use crate::structure::{snowflake, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::Snowflake;

/// The structure types a snowflake rotation may draw from.
pub const ROTATION_TYPES: [StructureType; 5] = [
  StructureType::Star,
  StructureType::FullyConnected,
  StructureType::NConnected,
  StructureType::DepthLimitTree,
  StructureType::BalancedTree,
];

type StrategyBuilder = Box<dyn Fn() -> Box<dyn TopologyStrategy>>;

/// Maps a rotation tag to a zero-argument constructor of the matching
/// strategy, yielding a fresh instance per hosted substructure.
pub struct SubstructureFactory {
  builders: IndexMap<StructureType, StrategyBuilder>,
}

impl SubstructureFactory {
  pub fn empty() -> Self {
    SubstructureFactory { builders: IndexMap::new() }
  }

  pub fn register(
    &mut self, t: StructureType, f: impl Fn() -> Box<dyn TopologyStrategy> + 'static,
  ) {
    self.builders.insert(t, Box::new(f));
  }

  pub fn supports(&self, t: StructureType) -> bool {
    self.builders.contains_key(&t)
  }

  pub fn build(&self, t: StructureType) -> Option<Box<dyn TopologyStrategy>> {
    self.builders.get(&t).map(|f| f())
  }

  fn minimum_members(&self, t: StructureType) -> usize {
    self.build(t).map(|s| s.minimum_members()).unwrap_or_else(|| t.minimum_members())
  }
}

impl Default for SubstructureFactory {
  fn default() -> Self {
    let mut f = SubstructureFactory::empty();
    f.register(StructureType::Star, || Box::new(StarStrategy::new()));
    f.register(StructureType::FullyConnected, || Box::new(FullyConnectedStrategy::new()));
    f.register(StructureType::NConnected, || {
      Box::new(NConnectedStrategy::new(2).expect("n = 2 is always admissible"))
    });
    f.register(StructureType::DepthLimitTree, || {
      Box::new(DepthLimitTreeStrategy::new(3, Some(3)))
    });
    f.register(StructureType::BalancedTree, || Box::new(BalancedTreeStrategy::new(2)));
    f
  }
}

impl fmt::Debug for SubstructureFactory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SubstructureFactory")
      .field("types", &self.builders.keys().collect::<Vec<_>>())
      .finish()
  }
}

struct Substructure {
  kind: StructureType,
  head: NodeId,
  strategy: Box<dyn TopologyStrategy>,
}

pub struct SnowflakeStrategy {
  rotation: Vec<StructureType>,
  density: f64,
  bridge_distance: usize,
  factory: SubstructureFactory,
  subs: Vec<Substructure>,
  center: Option<NodeId>,
}

impl SnowflakeStrategy {
  pub fn new(
    rotation: Vec<StructureType>, density: f64, bridge_distance: usize,
    factory: SubstructureFactory,
  ) -> SimResult<Self> {
    if rotation.is_empty() {
      return Err(SimError::InvalidConstruction("snowflake rotation is empty".into()));
    }
    for t in &rotation {
      if !ROTATION_TYPES.contains(t) {
        return Err(SimError::InvalidConstruction(format!(
          "{t} cannot be hosted in a snowflake rotation"
        )));
      }
      if !factory.supports(*t) {
        return Err(SimError::InvalidConstruction(format!(
          "the substructure factory cannot build {t}"
        )));
      }
    }
    if !(0.0..=1.0).contains(&density) {
      return Err(SimError::InvalidConstruction(format!(
        "density {density} outside [0, 1]"
      )));
    }
    if bridge_distance < 1 {
      return Err(SimError::InvalidConstruction("bridge distance must be >= 1".into()));
    }
    Ok(SnowflakeStrategy {
      rotation,
      density,
      bridge_distance,
      factory,
      subs: Vec::new(),
      center: None,
    })
  }

  pub fn substructure_heads(&self) -> Vec<(StructureType, NodeId)> {
    self.subs.iter().map(|s| (s.kind, s.head)).collect()
  }

  fn plan(&self, total_mirrors: usize) -> snowflake::Partition {
    snowflake::plan_partition(
      &self.rotation,
      self.density,
      total_mirrors,
      self.bridge_distance,
      |t| self.factory.minimum_members(t),
    )
  }

  fn sub_member_count(&self, net: &Network, i: usize) -> usize {
    let s = &self.subs[i];
    net.graph.collect_members(s.kind, s.head).len()
  }

  /// Bridge members that currently have no bridge children, center
  /// excluded, latest first.
  fn bridge_leaves(&self, net: &Network, center: NodeId) -> Vec<NodeId> {
    snowflake::bridge_members(&net.graph, center)
      .into_iter()
      .rev()
      .filter(|&n| n != center)
      .filter(|&n| {
        net.graph.get(n).map(|node| node.children_for(T).next().is_none()).unwrap_or(false)
      })
      .collect()
  }
}

impl fmt::Debug for SnowflakeStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SnowflakeStrategy")
      .field("rotation", &self.rotation)
      .field("density", &self.density)
      .field("bridge_distance", &self.bridge_distance)
      .field("substructures", &self.subs.len())
      .finish()
  }
}

impl TopologyStrategy for SnowflakeStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "snowflake"
  }

  fn init_network(
    &mut self, net: &mut Network, pool: &[MirrorId], props: &SimProps, rng: &mut StdRng,
    now: Tick,
  ) -> Option<NodeId> {
    self.subs.clear();
    let (&first, _) = pool.split_first()?;
    let center = spawn_head(net, first, T);
    self.center = Some(center);
    self.init_network_sub(net, center, &pool[1..], props, rng, now);
    Some(center)
  }

  fn init_network_sub(
    &mut self, net: &mut Network, anchor: NodeId, pool: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    let center = anchor;
    self.center = Some(center);
    let partition = self.plan(pool.len() + 1);
    let mut cursor = 0;

    for &(kind, share) in &partition.substructures {
      // The line of intermediates between the center and the anchor.
      let mut prev = center;
      for _ in 0..partition.intermediates_per_sub {
        let node = net.graph.insert_bound([T], pool[cursor]);
        cursor += 1;
        net.wire(prev, node, &[T], now, props, rng);
        prev = node;
      }
      let sub_anchor = net.graph.insert_bound([T, kind], pool[cursor]);
      cursor += 1;
      net.graph.set_head(sub_anchor, kind, true);
      net.wire(prev, sub_anchor, &[T], now, props, rng);

      let mut strategy =
        self.factory.build(kind).expect("rotation types are validated at construction");
      strategy.init_network_sub(net, sub_anchor, &pool[cursor..cursor + share - 1], props, rng, now);
      cursor += share - 1;
      self.subs.push(Substructure { kind, head: sub_anchor, strategy });
    }

    if cursor < pool.len() {
      warn!(
        leftover = pool.len() - cursor,
        "degenerate snowflake: mirrors left over after partitioning, parking them on the bridge"
      );
      while cursor < pool.len() {
        let node = net.graph.insert_bound([T], pool[cursor]);
        cursor += 1;
        net.wire(center, node, &[T], now, props, rng);
      }
    }
  }

  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    for &mirror in added {
      let smallest = (0..self.subs.len())
        .map(|i| (self.sub_member_count(net, i), i))
        .min()
        .map(|(_, i)| i);
      match smallest {
        Some(i) => {
          let sub_head = self.subs[i].head;
          self.subs[i]
            .strategy
            .handle_add_new_mirrors(net, sub_head, &[mirror], props, rng, now);
        }
        None => {
          debug!(%mirror, "snowflake without substructures, parking on the bridge");
          let node = net.graph.insert_bound([T], mirror);
          net.wire(head, node, &[T], now, props, rng);
        }
      }
    }
  }

  fn handle_remove_mirrors(
    &mut self, net: &mut Network, head: NodeId, count: usize, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> Vec<MirrorId> {
    let mut retired = Vec::new();
    while retired.len() < count {
      // The fullest substructure gives up a member; a substructure down to
      // its anchor is dissolved instead, leaving its bridge line to be
      // reclaimed leaf by leaf.
      let largest = (0..self.subs.len())
        .map(|i| (self.sub_member_count(net, i), i))
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(len, i)| (len, i));
      match largest {
        Some((len, i)) if len > 1 => {
          let sub_head = self.subs[i].head;
          let r = self.subs[i]
            .strategy
            .handle_remove_mirrors(net, sub_head, 1, props, rng, now);
          if r.is_empty() {
            break;
          }
          retired.extend(r);
        }
        Some((_, i)) => {
          let sub_head = self.subs[i].head;
          if let Some(mirror) = net.graph.get(sub_head).and_then(|n| n.mirror()) {
            net.retire_mirror(mirror, now, props, rng);
            retired.push(mirror);
          }
          self.subs.remove(i);
        }
        None => {
          let victim = self
            .bridge_leaves(net, head)
            .first()
            .copied()
            .or(if net.graph.contains(head) { Some(head) } else { None });
          let Some(mirror) = victim.and_then(|n| net.graph.get(n).and_then(|n| n.mirror()))
          else {
            break;
          };
          net.retire_mirror(mirror, now, props, rng);
          retired.push(mirror);
        }
      }
    }
    retired
  }

  fn predicted_link_count(&self, members: usize) -> usize {
    let partition = self.plan(members);
    let hosted: usize = partition
      .substructures
      .iter()
      .filter_map(|&(kind, share)| {
        self.factory.build(kind).map(|s| s.predicted_link_count(share))
      })
      .sum();
    hosted + partition.bridge_edge_count(self.bridge_distance)
  }

  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize {
    for sub in &self.subs {
      if net.graph.collect_members(sub.kind, sub.head).contains(&node) {
        return sub.strategy.target_links_per_node(net, node);
      }
    }
    net.graph.get(node).map(|n| n.degree_for(T)).unwrap_or(0)
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let subs: Vec<(StructureType, NodeId)> = self.substructure_heads();
    snowflake::is_valid_structure(&net.graph, head, &subs, |_, _, sub_head| {
      self
        .subs
        .iter()
        .find(|s| s.head == sub_head)
        .map(|s| s.strategy.validate(net, sub_head))
        .unwrap_or_else(|| Err(format!("no strategy for substructure at {sub_head}")))
    })
  }
}
