//! Snowflake composition rules.
//!
//! A snowflake wires several substructures to a central bridge member.
//! Each substructure hangs off the bridge behind a short line of
//! intermediate mirrors (`bridge_distance` edges from the center to the
//! substructure's anchor); the bridge edges themselves form a tree rooted
//! at the center.

use ordermap::OrderSet;

use crate::arena::NodeId;
use crate::structure::{tree, StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::Snowflake;

/// The share of mirrors a planned snowflake hands to each substructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
  /// (structure type, member count) per substructure, rotation order.
  pub substructures: Vec<(StructureType, usize)>,
  /// Intermediate bridge mirrors consumed per substructure.
  pub intermediates_per_sub: usize,
}

impl Partition {
  pub fn mirrors_used(&self) -> usize {
    1 + self
      .substructures
      .iter()
      .map(|(_, m)| m + self.intermediates_per_sub)
      .sum::<usize>()
  }

  /// Bridge edges: one line of `bridge_distance` edges per substructure.
  pub fn bridge_edge_count(&self, bridge_distance: usize) -> usize {
    self.substructures.len() * bridge_distance
  }
}

/// Split `total_mirrors` into a center, per-substructure shares and bridge
/// intermediates.
///
/// The substructure count is
/// `k = max(|rotation|, round(density * (N-1) / min_members))` where
/// `min_members` is the largest minimum across the rotation types; higher
/// density yields more, smaller substructures. When the mirrors cannot
/// cover k substructures at their minimum sizes, k shrinks (degenerate
/// mode, the caller logs it).
pub fn plan_partition(
  rotation: &[StructureType], density: f64, total_mirrors: usize, bridge_distance: usize,
  min_of: impl Fn(StructureType) -> usize,
) -> Partition {
  let intermediates = bridge_distance.saturating_sub(1);
  let empty = Partition { substructures: Vec::new(), intermediates_per_sub: intermediates };
  if rotation.is_empty() || total_mirrors < 2 {
    return empty;
  }
  let remaining = total_mirrors - 1;
  let largest_min = rotation.iter().map(|t| min_of(*t)).max().unwrap_or(1).max(1);
  let wanted = ((density * remaining as f64) / largest_min as f64).round() as usize;
  let mut k = wanted.max(rotation.len());

  let cost = |k: usize| -> usize {
    (0..k).map(|i| intermediates + min_of(rotation[i % rotation.len()])).sum()
  };
  while k > 0 && cost(k) > remaining {
    k -= 1;
  }
  if k == 0 {
    return empty;
  }

  let mut shares: Vec<(StructureType, usize)> =
    (0..k).map(|i| (rotation[i % rotation.len()], min_of(rotation[i % rotation.len()]))).collect();
  let mut leftover = remaining - cost(k);
  let mut i = 0;
  while leftover > 0 {
    shares[i % k].1 += 1;
    leftover -= 1;
    i += 1;
  }
  Partition { substructures: shares, intermediates_per_sub: intermediates }
}

/// Bridge members of the snowflake rooted at `center`, traversal order.
pub fn bridge_members(graph: &StructureGraph, center: NodeId) -> Vec<NodeId> {
  graph.collect_members(T, center)
}

/// The composite invariant: the bridge is a tree rooted at the center,
/// every hosted substructure validates on its own, and no mirror belongs
/// to two substructures.
pub fn is_valid_structure(
  graph: &StructureGraph, center: NodeId, subs: &[(StructureType, NodeId)],
  validate_sub: impl Fn(StructureType, &[NodeId], NodeId) -> StructureCheck,
) -> StructureCheck {
  let bridge = bridge_members(graph, center);
  if bridge.is_empty() {
    return Err("bridge has no members".into());
  }
  tree::is_valid_structure(graph, T, &bridge, center)
    .map_err(|e| format!("bridge: {e}"))?;

  let mut seen_mirrors: OrderSet<crate::arena::MirrorId> = OrderSet::new();
  for (t, sub_head) in subs {
    let members = graph.collect_members(*t, *sub_head);
    if members.is_empty() {
      return Err(format!("substructure {t} at {sub_head} has no members"));
    }
    validate_sub(*t, &members, *sub_head).map_err(|e| format!("substructure {t}: {e}"))?;
    for &m in &members {
      if let Some(mirror) = graph.get(m).and_then(|n| n.mirror()) {
        if !seen_mirrors.insert(mirror) {
          return Err(format!("mirror {mirror} appears in two substructures"));
        }
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::structure::StructureType::*;

  #[test]
  fn partition_honors_rotation_minimums() {
    let rotation = [DepthLimitTree, BalancedTree, Star];
    let p = plan_partition(&rotation, 0.3, 30, 2, |t| t.minimum_members());
    assert_eq!(p.substructures.len(), 3);
    assert_eq!(p.intermediates_per_sub, 1);
    assert_eq!(p.mirrors_used(), 30);
    let kinds: Vec<_> = p.substructures.iter().map(|(t, _)| *t).collect();
    assert_eq!(kinds, vec![DepthLimitTree, BalancedTree, Star]);
    for (t, m) in &p.substructures {
      assert!(*m >= t.minimum_members());
    }
  }

  #[test]
  fn density_grows_substructure_count() {
    let rotation = [Star, FullyConnected];
    let low = plan_partition(&rotation, 0.1, 40, 1, |t| t.minimum_members());
    let high = plan_partition(&rotation, 0.9, 40, 1, |t| t.minimum_members());
    assert!(high.substructures.len() > low.substructures.len());
  }

  #[test]
  fn shortfall_degrades_gracefully() {
    let rotation = [Star, Star];
    let p = plan_partition(&rotation, 0.5, 5, 2, |t| t.minimum_members());
    // 4 mirrors after the center cannot host two stars behind bridges.
    assert!(p.substructures.len() < 2);
    assert!(p.mirrors_used() <= 5);
  }
}
