//! Defines the core fencepost types.
//!
//! Among these are:
//!
//! - PArray: a persistent array, the backing store for everything else
//! - PersistentUnionFind and PersistentBinaryUnionFind: versioned partitions
//! - Region: a signed component of a two-way partition
//! - Grid: the half-edge mesh that every puzzle is drawn on

mod dir;
mod grid;
mod id_types;
mod parray;
mod pbuf;
mod puf;

pub use dir::*;
pub use grid::*;
pub use parray::PArray;
pub use pbuf::*;
pub use puf::PersistentUnionFind;

use std::fmt;

/// Everything that can go wrong while deducing a solution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
  /// The puzzle's state is inconsistent: two regions known to be opposite
  /// were declared the same, a local rule was broken, or a clue has no
  /// satisfying arrangement.
  Contradiction(String),
  /// A fixed-point loop ran for its whole allotment without settling.
  NonConvergence { limit: usize },
  /// Deduction stopped with some cells still uncolored.
  Unsolved { unknown: usize },
  /// A constraint doesn't fit the grid it was given with.
  InvalidConstraint(String),
}

impl Error {
  /// Tells whether this is a contradiction, the only kind of error a
  /// speculative trial may recover from.
  pub fn is_contradiction(&self) -> bool {
    matches!(self, Error::Contradiction(_))
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Contradiction(reason) => write!(f, "contradiction: {}", reason),
      Error::NonConvergence { limit } => write!(f, "gave up after {} iterations", limit),
      Error::Unsolved { unknown } => write!(f, "unable to solve: {} cells undetermined", unknown),
      Error::InvalidConstraint(reason) => write!(f, "invalid constraint: {}", reason),
    }
  }
}

impl std::error::Error for Error {}
