//! Exhaustive deduction over a handful of boolean variables.
//!
//! A local rule (a cell's wall count, a cell's enclosure size) depends on the
//! regions of a few neighboring cells.  Each distinct region root becomes one
//! variable, and every assignment is tested against the rule.  Whatever all
//! surviving assignments agree on, whether a variable's value relative to the
//! reference or the parity between two variables, is a forced union.

use crate::core::*;
use static_assertions::const_assert;

/// The most variables that fit in an assignment mask.
pub const MAX_VARS: usize = 32;

// The reference variable takes bit 0, and the rest are enumerated by
// shifting a counter up one bit.
const_assert!(MAX_VARS <= u32::BITS as usize);

/// The distinct region roots a rule depends on.  Variable 0 is the
/// reference, whose value is fixed at `false`.
#[derive(Debug)]
pub struct Vars {
  roots: Vec<usize>,
}

impl Vars {
  /// Starts a variable set whose reference is the given region.
  pub fn new(reference: Region) -> Vars {
    Vars { roots: vec![reference.id()] }
  }

  /// The variable and polarity standing for `region`, adding a new variable
  /// if its root hasn't been seen yet.
  pub fn term(&mut self, region: Region) -> Term {
    let var = match self.roots.iter().position(|&r| r == region.id()) {
      Some(var) => var,
      None => {
        self.roots.push(region.id());
        self.roots.len() - 1
      }
    };
    Term { var, inverted: region.is_inverted() }
  }

  pub fn len(&self) -> usize {
    self.roots.len()
  }

  /// The region root a variable stands for.
  pub fn root(&self, var: usize) -> Region {
    Region::of(self.roots[var])
  }
}

/// One region expressed in terms of a variable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Term {
  var: usize,
  inverted: bool,
}

impl Term {
  /// This term's value under the given assignment.
  pub fn eval(self, assignment: u32) -> bool {
    ((assignment >> self.var) & 1 != 0) ^ self.inverted
  }
}

/// The two edges running straight out of a vertex in one direction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arm {
  pub near: Option<HalfedgeId>,
  pub far: Option<HalfedgeId>,
}

impl Arm {
  /// The arm leaving `v` in direction `dir`.  Either edge is missing where
  /// the lattice ends.
  pub fn of(grid: &Grid, v: VertexId, dir: Dir) -> Arm {
    let near = grid.vertex(v).outgoing(dir);
    let far = near.and_then(|h| grid.straight(h));
    Arm { near, far }
  }

  /// The vertex between the near and far edges.
  pub fn elbow(self, grid: &Grid) -> Option<VertexId> {
    self.near.map(|h| grid.halfedge(h).vert())
  }
}

/// What every satisfying assignment agrees on.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Implications {
  /// `(var, value)`: the variable always has this value, relative to the
  /// reference.
  pub units: Vec<(usize, bool)>,
  /// `(a, b, differ)`: the two variables always agree, or always differ.
  pub pairs: Vec<(usize, usize, bool)>,
}

impl Implications {
  pub fn is_empty(&self) -> bool {
    self.units.is_empty() && self.pairs.is_empty()
  }
}

/// Tries every assignment of `num_vars` variables with variable 0 held at
/// `false`, keeping the ones `satisfied` accepts.  Returns `None` if none
/// survive.
pub fn implications(num_vars: usize, satisfied: impl Fn(u32) -> bool) -> Option<Implications> {
  assert!((1..=MAX_VARS).contains(&num_vars));
  let free = num_vars - 1;
  let survivors: Vec<u32> = (0..1u64 << free)
    .map(|m| (m as u32) << 1)
    .filter(|&a| satisfied(a))
    .collect();
  if survivors.is_empty() {
    return None;
  }
  let all = survivors.iter().fold(u32::MAX, |acc, &a| acc & a);
  let any = survivors.iter().fold(0, |acc, &a| acc | a);
  let bit = |a: u32, var: usize| (a >> var) & 1 != 0;
  let mut result = Implications::default();
  let mut fixed = vec![false; num_vars];
  for var in 1..num_vars {
    if bit(all, var) {
      result.units.push((var, true));
      fixed[var] = true;
    } else if !bit(any, var) {
      result.units.push((var, false));
      fixed[var] = true;
    }
  }
  for a in 1..num_vars {
    for b in a + 1..num_vars {
      if fixed[a] || fixed[b] {
        continue;
      }
      let differ = bit(survivors[0], a) != bit(survivors[0], b);
      if survivors.iter().all(|&s| (bit(s, a) != bit(s, b)) == differ) {
        result.pairs.push((a, b, differ));
      }
    }
  }
  Some(result)
}
