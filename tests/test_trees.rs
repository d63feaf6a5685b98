//! End-to-end expectations for the bounded tree strategies.

#[cfg(test)]
mod tests_trees {
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use rdmsim::strategy::{BalancedTreeStrategy, DepthLimitTreeStrategy, TopologyStrategy};
  use rdmsim::structure::{balanced_tree, tree};
  use rdmsim::{MirrorId, Network, SimProps, StructureType};

  fn setup(n: usize) -> (Network, Vec<MirrorId>, SimProps, StdRng) {
    let props = SimProps::default();
    let mut rng = StdRng::seed_from_u64(3);
    let mut net = Network::new();
    let pool: Vec<MirrorId> = (0..n).map(|_| net.create_mirror(0, &props, &mut rng)).collect();
    (net, pool, props, rng)
  }

  #[test]
  fn balanced_tree_of_15_with_two_links_per_node() {
    let (mut net, pool, props, mut rng) = setup(15);
    let mut s = BalancedTreeStrategy::new(2);
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    let t = StructureType::BalancedTree;
    let members = net.graph.collect_members(t, head);

    assert_eq!(members.len(), 15);
    assert_eq!(net.num_links(), 14);
    // 15 nodes at 2 children each fill a binary tree of ceil(log2(16)) = 4
    // levels exactly.
    assert_eq!(tree::tree_depth(&net.graph, t, &members, head), 4);
    assert!(s.is_balanced(&net, head));
    assert!(s.validate(&net, head).is_ok());

    let metric = balanced_tree::balance_metric(&net.graph, &members, head);
    assert!(metric <= 3.0, "balance metric {metric} above tolerance");
  }

  #[test]
  fn depth_limited_tree_with_unbounded_branching_places_everything() {
    let (mut net, pool, props, mut rng) = setup(100);
    let mut s = DepthLimitTreeStrategy::new(3, None);
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    let t = StructureType::DepthLimitTree;
    let members = net.graph.collect_members(t, head);

    assert_eq!(members.len(), 100);
    assert!(net.unplaced_mirrors().is_empty());
    for &m in &members {
      let depth = tree::depth_of(&net.graph, t, m, head).unwrap();
      assert!(depth <= 3, "member at depth {depth}");
    }
    assert!(s.validate(&net, head).is_ok());
  }

  #[test]
  fn depth_limited_tree_capacity_leaves_overflow_unplaced() {
    let (mut net, pool, props, mut rng) = setup(100);
    let mut s = DepthLimitTreeStrategy::new(3, Some(3));
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    let t = StructureType::DepthLimitTree;
    let members = net.graph.collect_members(t, head);

    // 1 + 3 + 9 + 27 members fit; the remaining 60 mirrors stay unplaced.
    assert_eq!(members.len(), 40);
    assert_eq!(net.num_links(), 39);
    assert_eq!(net.unplaced_mirrors().len(), 60);
    assert_eq!(s.predicted_link_count(100), 39);
    for &m in &members {
      let node = net.graph.get(m).unwrap();
      assert!(node.child_count_for(t) <= 3);
    }
    assert!(s.validate(&net, head).is_ok());
  }

  #[test]
  fn depth_limited_growth_halts_at_the_depth_cap() {
    let (mut net, pool, props, mut rng) = setup(4);
    let mut s = DepthLimitTreeStrategy::new(2, Some(2));
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    // Capacity is 1 + 2 + 4 = 7: three more fit, the rest do not.
    let added: Vec<MirrorId> =
      (0..6).map(|_| net.create_mirror(1, &props, &mut rng)).collect();
    s.handle_add_new_mirrors(&mut net, head, &added, &props, &mut rng, 1);
    let members = net.graph.collect_members(StructureType::DepthLimitTree, head);
    assert_eq!(members.len(), 7);
    assert_eq!(net.unplaced_mirrors().len(), 3);
    assert!(s.validate(&net, head).is_ok());
  }
}
