//! Incremental maintenance: predicted link counts stay exact through
//! growth and shrink for every strategy.

#[cfg(test)]
mod tests_strategies {
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use rdmsim::strategy::*;
  use rdmsim::{MirrorId, Network, SimProps};

  fn setup(n: usize) -> (Network, Vec<MirrorId>, SimProps, StdRng) {
    let props = SimProps::default();
    let mut rng = StdRng::seed_from_u64(11);
    let mut net = Network::new();
    let pool: Vec<MirrorId> = (0..n).map(|_| net.create_mirror(0, &props, &mut rng)).collect();
    (net, pool, props, rng)
  }

  fn grow(
    s: &mut dyn TopologyStrategy, net: &mut Network, head: rdmsim::NodeId, count: usize,
    props: &SimProps, rng: &mut StdRng,
  ) {
    let added: Vec<MirrorId> = (0..count).map(|_| net.create_mirror(1, props, rng)).collect();
    s.handle_add_new_mirrors(net, head, &added, props, rng, 1);
  }

  fn check_converged(s: &dyn TopologyStrategy, net: &Network, head: rdmsim::NodeId) {
    let members = net.graph.collect_members(s.structure_type(), head);
    assert_eq!(
      net.num_links(),
      s.predicted_link_count(members.len()),
      "{} at m={}",
      s.name(),
      members.len()
    );
    assert!(s.validate(net, head).is_ok(), "{}: {:?}", s.name(), s.validate(net, head));
  }

  #[test]
  fn every_strategy_converges_through_growth_and_shrink() {
    let cases: Vec<Box<dyn TopologyStrategy>> = vec![
      Box::new(TreeStrategy::new()),
      Box::new(BalancedTreeStrategy::new(2)),
      Box::new(DepthLimitTreeStrategy::new(5, Some(3))),
      Box::new(LineStrategy::new()),
      Box::new(RingStrategy::new()),
      Box::new(StarStrategy::new()),
      Box::new(FullyConnectedStrategy::new()),
      Box::new(NConnectedStrategy::new(2).unwrap()),
      Box::new(NConnectedStrategy::new(4).unwrap()),
    ];
    for mut s in cases {
      let (mut net, pool, props, mut rng) = setup(8);
      let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
      check_converged(s.as_ref(), &net, head);

      grow(s.as_mut(), &mut net, head, 5, &props, &mut rng);
      check_converged(s.as_ref(), &net, head);

      let retired = s.handle_remove_mirrors(&mut net, head, 4, &props, &mut rng, 2);
      assert_eq!(retired.len(), 4, "{}", s.name());
      check_converged(s.as_ref(), &net, head);
    }
  }

  #[test]
  fn growth_preserves_existing_wiring_where_the_invariant_allows() {
    let (mut net, pool, props, mut rng) = setup(6);
    let mut s = StarStrategy::new();
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    let before: Vec<_> = net.links().map(|(id, _)| id).collect();
    grow(&mut s, &mut net, head, 3, &props, &mut rng);
    // A star only ever gains spokes; nothing built earlier is touched.
    for id in before {
      assert!(net.link(id).is_some());
    }
    assert_eq!(net.num_links(), 8);
  }

  #[test]
  fn ring_growth_only_rewires_the_closing_edge() {
    let (mut net, pool, props, mut rng) = setup(5);
    let mut s = RingStrategy::new();
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    let before: Vec<_> = net.links().map(|(id, _)| id).collect();
    grow(&mut s, &mut net, head, 1, &props, &mut rng);
    let surviving = before.iter().filter(|id| net.link(**id).is_some()).count();
    assert_eq!(surviving, before.len() - 1);
    assert_eq!(net.num_links(), 6);
  }

  #[test]
  fn n_connected_beyond_network_size_runs_fully_connected() {
    // A degree parameter exceeding the pool degenerates to the complete
    // graph: 4 mirrors, 6 links, implemented degree 3 everywhere.
    let (mut net, pool, props, mut rng) = setup(4);
    let mut s = NConnectedStrategy::new(10).unwrap();
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    assert_eq!(net.num_links(), 6);
    for &m in &pool {
      assert_eq!(net.mirror(m).unwrap().num_links(), 3);
    }
    assert!(s.validate(&net, head).is_ok());
  }

  #[test]
  fn balanced_tree_honors_links_per_node_update() {
    let (mut net, pool, props, mut rng) = setup(10);
    let mut s = BalancedTreeStrategy::new(2);
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    assert!(s.set_target_links_per_node(3));
    grow(&mut s, &mut net, head, 5, &props, &mut rng);
    assert!(s.validate(&net, head).is_ok());
    assert_eq!(s.target_links(), 3);
  }

  #[test]
  fn links_per_node_is_ignored_where_meaningless() {
    let mut ring = RingStrategy::new();
    assert!(!TopologyStrategy::set_target_links_per_node(&mut ring, 5));
    let mut nc = NConnectedStrategy::new(2).unwrap();
    assert!(TopologyStrategy::set_target_links_per_node(&mut nc, 3));
    assert!(!TopologyStrategy::set_target_links_per_node(&mut nc, 1));
  }

  #[test]
  fn line_grows_and_shrinks_at_the_far_endpoint() {
    let (mut net, pool, props, mut rng) = setup(4);
    let mut s = LineStrategy::new();
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    grow(&mut s, &mut net, head, 2, &props, &mut rng);
    let members = net.graph.collect_members(rdmsim::StructureType::Line, head);
    assert_eq!(members.len(), 6);
    let retired = s.handle_remove_mirrors(&mut net, head, 3, &props, &mut rng, 2);
    assert_eq!(retired.len(), 3);
    // The head endpoint stays; the chain got shorter from the far side.
    let members = net.graph.collect_members(rdmsim::StructureType::Line, head);
    assert_eq!(members.len(), 3);
    assert_eq!(members[0], head);
    assert!(s.validate(&net, head).is_ok());
  }

  #[test]
  fn tree_shrink_retires_leaves_first() {
    let (mut net, pool, props, mut rng) = setup(7);
    let mut s = BalancedTreeStrategy::new(2);
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    let retired = s.handle_remove_mirrors(&mut net, head, 2, &props, &mut rng, 1);
    assert_eq!(retired.len(), 2);
    // The head still anchors a valid tree of five.
    let members = net.graph.collect_members(rdmsim::StructureType::BalancedTree, head);
    assert_eq!(members.len(), 5);
    assert!(s.validate(&net, head).is_ok());
  }
}
