use std::fmt::Display;

use crate::structure::{StructureGraph, StructureNode};

impl Display for StructureNode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "StructureNode {{ types: ")?;
    let mut dl = f.debug_list();
    for t in self.node_types() {
      dl.entry(&format_args!("{t}"));
    }
    dl.finish()?;
    if let Some(m) = self.mirror() {
      write!(f, ", mirror: {m}")?;
    }
    let heads: Vec<_> = self.head_types().collect();
    if !heads.is_empty() {
      write!(f, ", head_of: ")?;
      let mut dl = f.debug_list();
      for t in heads {
        dl.entry(&format_args!("{t}"));
      }
      dl.finish()?;
    }
    write!(f, ", children: ")?;
    let mut dl = f.debug_list();
    for (c, _) in self.children() {
      dl.entry(&c.0);
    }
    dl.finish()?;
    write!(f, " }}")
  }
}

impl Display for StructureGraph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "StructureGraph {{")?;
    for (id, n) in self.iter() {
      writeln!(f, "  {id}: {n},")?;
    }
    write!(f, "}}")
  }
}
