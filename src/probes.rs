//! Read-only probe views over the realised network.
//!
//! Probes are snapshot-consistent at tick boundaries; the engine hands
//! them out borrowing itself, so they cannot outlive or observe a tick in
//! progress.

use crate::arena::{LinkId, MirrorId};
use crate::network::Network;
use crate::strategy::TopologyStrategy;

pub struct MirrorProbe<'a> {
  net: &'a Network,
  strategy: &'a dyn TopologyStrategy,
  target_mirrors: usize,
}

impl<'a> MirrorProbe<'a> {
  pub(crate) fn new(
    net: &'a Network, strategy: &'a dyn TopologyStrategy, target_mirrors: usize,
  ) -> Self {
    MirrorProbe { net, strategy, target_mirrors }
  }

  pub fn num_mirrors(&self) -> usize {
    self.net.num_alive_mirrors()
  }

  pub fn num_ready_mirrors(&self) -> usize {
    self.net.num_ready_mirrors()
  }

  pub fn num_target_mirrors(&self) -> usize {
    self.target_mirrors
  }

  /// Realised over target, clamped into [0, 1]. A zero target counts as
  /// reached.
  pub fn mirror_ratio(&self) -> f64 {
    if self.target_mirrors == 0 {
      return 1.0;
    }
    self.num_mirrors().min(self.target_mirrors) as f64 / self.target_mirrors as f64
  }

  /// The degree the active strategy intends for this mirror's node.
  pub fn num_target_links_per_mirror(&self, mirror: MirrorId) -> usize {
    self
      .net
      .graph
      .node_for_mirror(mirror)
      .map(|node| self.strategy.target_links_per_node(self.net, node))
      .unwrap_or(0)
  }

  pub fn mirrors(&self) -> Vec<MirrorId> {
    self.net.alive_mirrors()
  }

  pub fn total_received_data(&self) -> u64 {
    self.net.total_received_data()
  }
}

pub struct LinkProbe<'a> {
  net: &'a Network,
  strategy: &'a dyn TopologyStrategy,
  target_mirrors: usize,
}

impl<'a> LinkProbe<'a> {
  pub(crate) fn new(
    net: &'a Network, strategy: &'a dyn TopologyStrategy, target_mirrors: usize,
  ) -> Self {
    LinkProbe { net, strategy, target_mirrors }
  }

  pub fn num_links(&self) -> usize {
    self.net.num_links()
  }

  pub fn num_active_links(&self) -> usize {
    self.net.num_active_links()
  }

  /// The link count the active strategy converges to at the target mirror
  /// count.
  pub fn num_target_links(&self) -> usize {
    self.strategy.predicted_link_count(self.target_mirrors)
  }

  pub fn link_ratio(&self) -> f64 {
    let target = self.num_target_links();
    if target == 0 {
      return 1.0;
    }
    self.num_links().min(target) as f64 / target as f64
  }

  pub fn links(&self) -> Vec<LinkId> {
    self.net.links().map(|(id, _)| id).collect()
  }
}
