//! Simulation properties.
//!
//! All timing in the simulator is expressed in ticks. Delay bounds come in
//! `*_min`/`*_max` pairs and are sampled per entity with a uniform integer
//! distribution from the engine's seeded RNG, so a run is reproducible from
//! its property file alone.

use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::Tick;

/// The recognised property set.
///
/// Unknown keys in the property file are rejected, missing keys take the
/// defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimProps {
  /// Initial target number of mirrors.
  pub num_mirrors: usize,
  /// Total tick count of the run.
  pub sim_time: Tick,
  /// Bounds of the startup delay (`down`/`starting` -> `up`).
  pub startup_time_min: Tick,
  pub startup_time_max: Tick,
  /// Bounds of the delay from `up` to `ready`.
  pub ready_time_min: Tick,
  pub ready_time_max: Tick,
  /// Bounds of the link construction delay (`pending` -> `active`).
  pub link_activation_time_min: Tick,
  pub link_activation_time_max: Tick,
  /// Bounds of the shutdown delay (`stopping` -> `stopped`).
  pub stop_time_min: Tick,
  pub stop_time_max: Tick,
  /// Size of the mirrored data set, observable through the probes.
  pub file_data_size: u64,
  /// Bounds of the interval between data refreshes on a ready mirror.
  pub file_update_interval_min: Tick,
  pub file_update_interval_max: Tick,
  /// RNG seed; two runs with equal props and actions are identical.
  pub seed: u64,
}

impl Default for SimProps {
  fn default() -> Self {
    SimProps {
      num_mirrors: 10,
      sim_time: 100,
      startup_time_min: 5,
      startup_time_max: 10,
      ready_time_min: 2,
      ready_time_max: 5,
      link_activation_time_min: 2,
      link_activation_time_max: 10,
      stop_time_min: 2,
      stop_time_max: 5,
      file_data_size: 200,
      file_update_interval_min: 10,
      file_update_interval_max: 20,
      seed: 42,
    }
  }
}

impl SimProps {
  /// Load properties from a JSON file and validate them.
  pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
    let text = std::fs::read_to_string(path)?;
    let props: SimProps = serde_json::from_str(&text)?;
    props.validate()?;
    Ok(props)
  }

  pub fn validate(&self) -> SimResult<()> {
    if self.sim_time == 0 {
      return Err(SimError::Config("sim_time must be positive".into()));
    }
    for (name, lo, hi) in [
      ("startup_time", self.startup_time_min, self.startup_time_max),
      ("ready_time", self.ready_time_min, self.ready_time_max),
      ("link_activation_time", self.link_activation_time_min, self.link_activation_time_max),
      ("stop_time", self.stop_time_min, self.stop_time_max),
      ("file_update_interval", self.file_update_interval_min, self.file_update_interval_max),
    ] {
      if lo > hi {
        return Err(SimError::Config(format!("{name}_min {lo} exceeds {name}_max {hi}")));
      }
    }
    Ok(())
  }

  pub fn sample_startup_time(&self, rng: &mut StdRng) -> Tick {
    sample(rng, self.startup_time_min, self.startup_time_max)
  }

  pub fn sample_ready_time(&self, rng: &mut StdRng) -> Tick {
    sample(rng, self.ready_time_min, self.ready_time_max)
  }

  pub fn sample_link_activation_time(&self, rng: &mut StdRng) -> Tick {
    sample(rng, self.link_activation_time_min, self.link_activation_time_max)
  }

  pub fn sample_stop_time(&self, rng: &mut StdRng) -> Tick {
    sample(rng, self.stop_time_min, self.stop_time_max)
  }

  pub fn sample_file_update_interval(&self, rng: &mut StdRng) -> Tick {
    sample(rng, self.file_update_interval_min, self.file_update_interval_max)
  }
}

fn sample(rng: &mut StdRng, lo: Tick, hi: Tick) -> Tick {
  rng.gen_range(lo..=hi)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  #[test]
  fn defaults_validate() {
    SimProps::default().validate().unwrap();
  }

  #[test]
  fn inverted_range_is_rejected() {
    let props = SimProps { startup_time_min: 9, startup_time_max: 3, ..Default::default() };
    assert!(matches!(props.validate(), Err(SimError::Config(_))));
  }

  #[test]
  fn zero_sim_time_is_rejected() {
    let props = SimProps { sim_time: 0, ..Default::default() };
    assert!(matches!(props.validate(), Err(SimError::Config(_))));
  }

  #[test]
  fn samples_stay_in_bounds() {
    let props = SimProps::default();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..64 {
      let t = props.sample_link_activation_time(&mut rng);
      assert!(t >= props.link_activation_time_min && t <= props.link_activation_time_max);
    }
  }

  #[test]
  fn partial_json_takes_defaults() {
    let props: SimProps = serde_json::from_str(r#"{"num_mirrors": 3, "seed": 1}"#).unwrap();
    assert_eq!(props.num_mirrors, 3);
    assert_eq!(props.sim_time, SimProps::default().sim_time);
  }
}
