//! Defines the Dir and Orientation types, which describe how half-edges run
//! across the grid.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::Serialize;

/// One of the four directions of travel along the grid's lattice lines, in
/// screen terms: row numbers grow downward.
///
/// The discriminants run clockwise, so turning is modular arithmetic.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[repr(u8)]
pub enum Dir {
  Right = 0,
  Down,
  Left,
  Up,
}

impl Dir {
  /// How many distinct directions there are.
  pub const COUNT: usize = 4;

  /// Iterates all directions, clockwise from `Right`.
  pub fn all() -> impl Iterator<Item = Dir> {
    (0..Self::COUNT).map(Dir::from_index)
  }

  /// Converts an index in 0..4 (taken modulo 4) into a direction.
  pub fn from_index(i: usize) -> Dir {
    // Safe because every value modulo 4 is a discriminant.
    Dir::from_usize(i % Self::COUNT).unwrap()
  }

  /// Returns the index of this direction, for use with per-direction arrays.
  pub const fn index(self) -> usize {
    self as usize
  }

  /// The direction pointing the other way.
  pub fn opposite(self) -> Dir {
    Dir::from_index(self.index() + 2)
  }

  /// The direction you face after a quarter turn to the left.
  pub fn left(self) -> Dir {
    Dir::from_index(self.index() + 3)
  }

  /// The direction you face after a quarter turn to the right.
  pub fn right(self) -> Dir {
    Dir::from_index(self.index() + 1)
  }

  /// The row and column deltas of one step in this direction.
  pub const fn delta(self) -> (isize, isize) {
    match self {
      Dir::Right => (0, 1),
      Dir::Down => (1, 0),
      Dir::Left => (0, -1),
      Dir::Up => (-1, 0),
    }
  }

  /// The orientation of lattice lines running in this direction.
  pub const fn orientation(self) -> Orientation {
    match self {
      Dir::Right | Dir::Left => Orientation::Horizontal,
      Dir::Down | Dir::Up => Orientation::Vertical,
    }
  }
}

/// Whether an edge lies along a row or a column of the lattice.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum Orientation {
  Horizontal,
  Vertical,
}
