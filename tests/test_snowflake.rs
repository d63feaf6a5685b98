//! Snowflake composition: rotation, partitioning, bridge wiring and the
//! independence of hosted substructures.

#[cfg(test)]
mod tests_snowflake {
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use ordermap::OrderSet;
  use rdmsim::strategy::{SnowflakeStrategy, SubstructureFactory, TopologyStrategy};
  use rdmsim::structure::snowflake;
  use rdmsim::{Engine, MirrorId, Network, SimProps, StructureType};

  fn rotation1() -> Vec<StructureType> {
    vec![StructureType::DepthLimitTree, StructureType::BalancedTree, StructureType::Star]
  }

  fn build(total: usize) -> (Network, SnowflakeStrategy, rdmsim::NodeId) {
    let props = SimProps::default();
    let mut rng = StdRng::seed_from_u64(21);
    let mut net = Network::new();
    let pool: Vec<MirrorId> =
      (0..total).map(|_| net.create_mirror(0, &props, &mut rng)).collect();
    let mut s =
      SnowflakeStrategy::new(rotation1(), 0.3, 2, SubstructureFactory::default()).unwrap();
    let head = s.init_network(&mut net, &pool, &props, &mut rng, 0).unwrap();
    (net, s, head)
  }

  #[test]
  fn rejects_bad_parameters() {
    assert!(SnowflakeStrategy::new(vec![], 0.3, 2, SubstructureFactory::default()).is_err());
    assert!(
      SnowflakeStrategy::new(rotation1(), 1.5, 2, SubstructureFactory::default()).is_err()
    );
    assert!(
      SnowflakeStrategy::new(rotation1(), 0.3, 0, SubstructureFactory::default()).is_err()
    );
    assert!(SnowflakeStrategy::new(
      vec![StructureType::Ring],
      0.3,
      2,
      SubstructureFactory::default()
    )
    .is_err());
  }

  #[test]
  fn thirty_mirrors_with_rotation1() {
    let (net, s, head) = build(30);

    let subs = s.substructure_heads();
    assert_eq!(subs.len(), 3);
    let kinds: Vec<StructureType> = subs.iter().map(|(t, _)| *t).collect();
    assert_eq!(kinds, rotation1());

    // Every mirror is placed and no mirror serves two substructures.
    let mut seen: OrderSet<MirrorId> = OrderSet::new();
    for (t, sub_head) in &subs {
      for member in net.graph.collect_members(*t, *sub_head) {
        let mirror = net.graph.get(member).unwrap().mirror().unwrap();
        assert!(seen.insert(mirror), "mirror {mirror} in two substructures");
      }
    }
    assert!(net.unplaced_mirrors().is_empty());

    // The bridge is a tree rooted at the single central member; with
    // bridge distance 2 each substructure sits behind one intermediate.
    let bridge = snowflake::bridge_members(&net.graph, head);
    assert_eq!(bridge.len(), 1 + 3 * 2);
    assert!(s.validate(&net, head).is_ok(), "{:?}", s.validate(&net, head));

    // Total links: the hosted predictions plus the bridge edges.
    assert_eq!(net.num_links(), s.predicted_link_count(30));
    assert_eq!(net.num_links(), 29);
  }

  #[test]
  fn substructures_validate_independently() {
    let (net, s, _head) = build(30);
    for (t, sub_head) in s.substructure_heads() {
      let members = net.graph.collect_members(t, sub_head);
      assert!(
        members.len() >= t.minimum_members(),
        "{t} substructure of {} members",
        members.len()
      );
      assert!(net.graph.is_head(sub_head, t));
    }
  }

  #[test]
  fn growth_flows_into_the_smallest_substructure() {
    let props = SimProps::default();
    let mut rng = StdRng::seed_from_u64(5);
    let (mut net, mut s, head) = build(30);
    let before: Vec<usize> = s
      .substructure_heads()
      .iter()
      .map(|(t, h)| net.graph.collect_members(*t, *h).len())
      .collect();
    let added: Vec<MirrorId> =
      (0..3).map(|_| net.create_mirror(1, &props, &mut rng)).collect();
    s.handle_add_new_mirrors(&mut net, head, &added, &props, &mut rng, 1);
    let after: Vec<usize> = s
      .substructure_heads()
      .iter()
      .map(|(t, h)| net.graph.collect_members(*t, *h).len())
      .collect();
    assert_eq!(after.iter().sum::<usize>(), before.iter().sum::<usize>() + 3);
    assert!(s.validate(&net, head).is_ok());
  }

  #[test]
  fn shrink_drains_the_fullest_substructure() {
    let props = SimProps::default();
    let mut rng = StdRng::seed_from_u64(5);
    let (mut net, mut s, head) = build(30);
    let retired = s.handle_remove_mirrors(&mut net, head, 4, &props, &mut rng, 1);
    assert_eq!(retired.len(), 4);
    assert!(s.validate(&net, head).is_ok(), "{:?}", s.validate(&net, head));
  }

  #[test]
  fn runs_under_the_engine() {
    let props = SimProps { num_mirrors: 30, sim_time: 30, seed: 4, ..Default::default() };
    let strategy =
      SnowflakeStrategy::new(rotation1(), 0.3, 2, SubstructureFactory::default()).unwrap();
    let mut engine = Engine::new(props, Box::new(strategy)).unwrap();
    engine.set_mirrors(33, 10).unwrap();
    engine.run_to_end();
    assert_eq!(engine.mirror_probe().num_mirrors(), 33);
    assert!(engine.validate().is_ok(), "{:?}", engine.validate());
  }
}
