//! The planning graph: typed structure nodes and the algorithms that keep
//! each topology class valid.
//!
//! The planning layer is deliberately separate from the physical network.
//! A [`StructureNode`] records *planned* topology (tag-labelled edges to
//! other nodes); the mirror it is bound to owns the *implemented* links.
//! One node may participate in several overlapping substructures at once,
//! e.g. the anchor of a star hosted inside a snowflake is a member of
//! {STAR, SNOWFLAKE}, with a distinct parent per tag.

use serde::{Deserialize, Serialize};

mod node;
pub use node::StructureNode;

mod graph;
pub use graph::StructureGraph;

mod display;

pub mod balanced_tree;
pub mod depth_limit_tree;
pub mod fully_connected;
pub mod line;
pub mod n_connected;
pub mod ring;
pub mod snowflake;
pub mod star;
pub mod tree;

/// The closed set of structure-type tags.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum StructureType {
  Mirror,
  Tree,
  BalancedTree,
  DepthLimitTree,
  Line,
  Ring,
  Star,
  FullyConnected,
  NConnected,
  Snowflake,
}

impl StructureType {
  /// The smallest member count at which the structure's full invariant is
  /// satisfiable. Below this the owning strategy operates in degenerate
  /// mode. For n-connected the bound depends on `n`; the value here is the
  /// floor over all admissible `n` (n = 2).
  pub fn minimum_members(&self) -> usize {
    match self {
      StructureType::Mirror => 1,
      StructureType::Tree | StructureType::BalancedTree | StructureType::DepthLimitTree => 1,
      StructureType::Line => 2,
      StructureType::Ring => 3,
      StructureType::Star => 3,
      StructureType::FullyConnected => 2,
      StructureType::NConnected => 3,
      StructureType::Snowflake => 1,
    }
  }
}

impl std::fmt::Display for StructureType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      StructureType::Mirror => "mirror",
      StructureType::Tree => "tree",
      StructureType::BalancedTree => "balanced_tree",
      StructureType::DepthLimitTree => "depth_limit_tree",
      StructureType::Line => "line",
      StructureType::Ring => "ring",
      StructureType::Star => "star",
      StructureType::FullyConnected => "fully_connected",
      StructureType::NConnected => "n_connected",
      StructureType::Snowflake => "snowflake",
    };
    f.write_str(s)
  }
}

/// Outcome of a structure validation, in the style of a named check: `Ok`
/// or the first reason the structure is not in shape.
pub type StructureCheck = Result<(), String>;
