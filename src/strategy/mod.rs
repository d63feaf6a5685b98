//! Topology strategies.
//!
//! A strategy both constructs and incrementally maintains one topology
//! class over the mirror pool. Every strategy speaks the same contract, so
//! the reconfiguration engine can swap them at runtime and the snowflake
//! can host them as substructures:
//!
//! + [`init_network`](TopologyStrategy::init_network) builds planning graph
//!   and links from scratch over a pool of mirrors.
//! + [`init_network_sub`](TopologyStrategy::init_network_sub) does the same
//!   under an externally supplied anchor node, which is what makes
//!   strategies composable.
//! + [`handle_add_new_mirrors`](TopologyStrategy::handle_add_new_mirrors) /
//!   [`handle_remove_mirrors`](TopologyStrategy::handle_remove_mirrors)
//!   grow and shrink incrementally, disturbing existing wiring only as far
//!   as the invariant forces.
//! + [`restart_network`](TopologyStrategy::restart_network) tears down and
//!   rebuilds; switching strategies never tries to preserve wiring.
//!
//! Strategies are pure with respect to the tick: `now` only stamps newly
//! created links.

use rand::rngs::StdRng;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::network::Network;
use crate::structure::{StructureCheck, StructureType};
use crate::Tick;

mod balanced_tree;
mod depth_limit_tree;
mod fully_connected;
mod line;
mod n_connected;
mod ring;
mod snowflake;
mod star;
mod tree;

pub use balanced_tree::BalancedTreeStrategy;
pub use depth_limit_tree::DepthLimitTreeStrategy;
pub use fully_connected::FullyConnectedStrategy;
pub use line::LineStrategy;
pub use n_connected::NConnectedStrategy;
pub use ring::RingStrategy;
pub use snowflake::{SnowflakeStrategy, SubstructureFactory};
pub use star::StarStrategy;
pub use tree::TreeStrategy;

pub trait TopologyStrategy {
  /// The structure tag this strategy maintains.
  fn structure_type(&self) -> StructureType;

  fn name(&self) -> &'static str;

  /// Smallest member count at which the full invariant is satisfiable;
  /// below it the strategy runs in degenerate mode.
  fn minimum_members(&self) -> usize {
    self.structure_type().minimum_members()
  }

  /// Build the topology from scratch over `pool`. Returns the head node,
  /// `None` for an empty pool.
  fn init_network(
    &mut self, net: &mut Network, pool: &[MirrorId], props: &SimProps, rng: &mut StdRng,
    now: Tick,
  ) -> Option<NodeId>;

  /// Build the topology under an externally chosen `anchor` node, which is
  /// already bound to a mirror and flagged as this structure's head.
  fn init_network_sub(
    &mut self, net: &mut Network, anchor: NodeId, pool: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  );

  /// Integrate freshly created mirrors without disturbing existing links
  /// beyond what the invariant forces.
  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  );

  /// Select and retire `count` mirrors in the strategy's deterministic
  /// removal order. Returns the retired mirrors.
  fn handle_remove_mirrors(
    &mut self, net: &mut Network, head: NodeId, count: usize, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> Vec<MirrorId>;

  /// The link count this strategy converges to at `members` mirrors.
  fn predicted_link_count(&self, members: usize) -> usize;

  /// The degree this strategy intends for one specific node.
  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize;

  /// Interpret the effector's links-per-mirror setting. Returns false when
  /// the setting is meaningless for this strategy and was ignored.
  fn set_target_links_per_node(&mut self, n: usize) -> bool {
    let _ = n;
    false
  }

  /// Check the realised structure against the invariant.
  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck;

  /// Tear down the current topology and rebuild over the surviving
  /// mirrors. Invoked when the engine switches from a foreign strategy;
  /// the old and new invariants are in general incompatible, so no wiring
  /// is preserved.
  fn restart_network(
    &mut self, net: &mut Network, props: &SimProps, rng: &mut StdRng, now: Tick,
  ) -> Option<NodeId> {
    let pool = net.alive_mirrors();
    net.teardown_topology();
    self.init_network(net, &pool, props, rng, now)
  }
}

/// Create the head node for a structure over the first mirror of a pool.
pub(crate) fn spawn_head(net: &mut Network, mirror: MirrorId, t: StructureType) -> NodeId {
  let head = net.graph.insert_bound([t], mirror);
  net.graph.set_head(head, t, true);
  head
}

/// Retire mirrors that no planning node is bound to, before touching the
/// structure itself. Returns the retired mirrors, at most `count`.
pub(crate) fn retire_unplaced(
  net: &mut Network, count: usize, now: Tick, props: &SimProps, rng: &mut StdRng,
) -> Vec<MirrorId> {
  let victims: Vec<MirrorId> = net.unplaced_mirrors().into_iter().rev().take(count).collect();
  for &m in &victims {
    net.retire_mirror(m, now, props, rng);
  }
  victims
}

/// Latest-added-first retirement over a member list: the LIFO order used
/// by the strategies without a structural preference.
pub(crate) fn lifo_members(net: &Network, members: &[NodeId], skip: NodeId) -> Vec<MirrorId> {
  members
    .iter()
    .rev()
    .filter(|&&n| n != skip)
    .filter_map(|&n| net.graph.get(n).and_then(|node| node.mirror()))
    .collect()
}
