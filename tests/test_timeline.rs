//! A long mixed timeline: repeated strategy switches and target changes,
//! with the realised network checked for convergence after each phase.

#[cfg(test)]
mod tests_timeline {
  use rdmsim::strategy::{
    BalancedTreeStrategy, FullyConnectedStrategy, LineStrategy, NConnectedStrategy,
    RingStrategy, StarStrategy, TopologyStrategy, TreeStrategy,
  };
  use rdmsim::{Engine, SimProps};

  #[test]
  fn every_strategy_survives_a_switch_chain() {
    let props = SimProps { num_mirrors: 12, sim_time: 200, seed: 17, ..Default::default() };
    let mut engine = Engine::new(props, Box::new(RingStrategy::new())).unwrap();

    let switches: Vec<(u64, Box<dyn TopologyStrategy>)> = vec![
      (20, Box::new(StarStrategy::new())),
      (50, Box::new(FullyConnectedStrategy::new())),
      (80, Box::new(LineStrategy::new())),
      (110, Box::new(NConnectedStrategy::new(3).unwrap())),
      (140, Box::new(BalancedTreeStrategy::new(2))),
      (170, Box::new(TreeStrategy::new())),
    ];
    let mut expectations = vec![(19u64, "ring", 12usize)];
    for (t, s) in switches {
      expectations.push((t + 25, s.name(), 12));
      engine.set_strategy(s, t).unwrap();
    }

    for (checkpoint, name, mirrors) in expectations {
      while engine.now() < checkpoint {
        engine.run_step();
      }
      assert_eq!(engine.strategy().name(), name, "at tick {checkpoint}");
      assert_eq!(engine.mirror_probe().num_mirrors(), mirrors, "at tick {checkpoint}");
      assert_eq!(
        engine.link_probe().num_links(),
        engine.strategy().predicted_link_count(mirrors),
        "{name} at tick {checkpoint}"
      );
      assert!(engine.validate().is_ok(), "{name}: {:?}", engine.validate());
    }
  }

  #[test]
  fn grow_shrink_oscillation_converges_each_time() {
    let props = SimProps { num_mirrors: 6, sim_time: 120, seed: 23, ..Default::default() };
    let mut engine = Engine::new(props, Box::new(RingStrategy::new())).unwrap();
    for (t, target) in [(10, 15), (30, 4), (50, 20), (70, 9), (90, 9)] {
      engine.set_mirrors(target, t).unwrap();
    }

    for (checkpoint, target) in [(25u64, 15usize), (45, 4), (65, 20), (85, 9), (120, 9)] {
      while engine.now() < checkpoint {
        engine.run_step();
      }
      assert_eq!(engine.mirror_probe().num_mirrors(), target, "at tick {checkpoint}");
      assert_eq!(
        engine.link_probe().num_links(),
        engine.strategy().predicted_link_count(target),
        "at tick {checkpoint}"
      );
      assert!(engine.validate().is_ok(), "at tick {checkpoint}: {:?}", engine.validate());
    }
  }

  #[test]
  fn links_per_mirror_action_retunes_the_degree() {
    let props = SimProps { num_mirrors: 10, sim_time: 60, seed: 31, ..Default::default() };
    let mut engine =
      Engine::new(props, Box::new(NConnectedStrategy::new(2).unwrap())).unwrap();
    assert_eq!(engine.link_probe().num_links(), 10);
    // Raising n only binds future reconfiguration; force one by growing.
    engine.set_target_links_per_mirror(4, 10).unwrap();
    engine.set_mirrors(14, 20).unwrap();
    engine.run_to_end();
    assert_eq!(engine.mirror_probe().num_mirrors(), 14);
    assert_eq!(engine.link_probe().num_target_links(), 28);
    assert!(engine.validate().is_ok(), "{:?}", engine.validate());
  }
}
