//! Defines the puzzle constraints: the loose `(row, col, value)` lists a
//! puzzle is described with, and the `Clues` tables they're indexed into.

use crate::core::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Masyu circle at a lattice vertex.  A bare position is an open circle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MasyuClue {
  Circle(usize, usize, bool),
  Open(usize, usize),
}

impl MasyuClue {
  /// The vertex row, column, and whether the circle is filled.
  pub fn parts(self) -> (usize, usize, bool) {
    match self {
      MasyuClue::Circle(y, x, filled) => (y, x, filled),
      MasyuClue::Open(y, x) => (y, x, false),
    }
  }
}

/// A Corral clue: either the number of cells visible from this one inside
/// the enclosure, or a bare statement of which side of the fence the cell
/// is on (`true` for inside).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CorralValue {
  Size(usize),
  Region(bool),
}

/// A puzzle's constraints, as positions and values.  Any mix of the three
/// puzzle types may be combined on one grid.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Constraints {
  /// `(row, col, count)`: the number of the cell's sides the loop runs
  /// along.
  pub slitherlink: Vec<(usize, usize, u8)>,
  /// Circles on lattice vertices, `(row, col[, filled])`.
  pub masyu: Vec<MasyuClue>,
  /// `(row, col, value)` enclosure clues.
  pub corral: Vec<(usize, usize, CorralValue)>,
}

/// The constraints indexed by grid entity.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Clues {
  slitherlink: BTreeMap<CellId, u8>,
  masyu: BTreeMap<VertexId, bool>,
  enclosure: BTreeMap<CellId, usize>,
  initial: BTreeMap<CellId, bool>,
}

impl Clues {
  /// Indexes `constraints` against `grid`.  Fails if any position is off
  /// the grid, or if one position is given two different values of the
  /// same kind.
  pub fn index(grid: &Grid, constraints: &Constraints) -> Result<Clues, Error> {
    let mut clues = Clues::default();
    for &(y, x, count) in &constraints.slitherlink {
      let cell = cell_id(grid, y, x, "slitherlink")?;
      insert(&mut clues.slitherlink, cell, count, || format!("slitherlink ({}, {})", y, x))?;
    }
    for clue in &constraints.masyu {
      let (y, x, filled) = clue.parts();
      let vertex = grid.vertex_at(y, x).ok_or_else(|| {
        Error::InvalidConstraint(format!("masyu vertex ({}, {}) is off the grid", y, x))
      })?;
      insert(&mut clues.masyu, vertex, filled, || format!("masyu ({}, {})", y, x))?;
    }
    for &(y, x, value) in &constraints.corral {
      let cell = cell_id(grid, y, x, "corral")?;
      let what = || format!("corral ({}, {})", y, x);
      match value {
        CorralValue::Size(0) => {
          return Err(Error::InvalidConstraint(format!("{} has size 0", what())))
        }
        CorralValue::Size(size) => insert(&mut clues.enclosure, cell, size, what)?,
        CorralValue::Region(inside) => insert(&mut clues.initial, cell, inside, what)?,
      }
    }
    Ok(clues)
  }

  /// The slitherlink wall count for a cell, if it has one.
  pub fn slitherlink(&self, cell: CellId) -> Option<u8> {
    self.slitherlink.get(&cell).copied()
  }

  /// All slitherlink-clued cells and their counts.
  pub fn slitherlinks(&self) -> impl Iterator<Item = (CellId, u8)> + '_ {
    self.slitherlink.iter().map(|(&c, &n)| (c, n))
  }

  /// Whether a vertex has a Masyu circle, and if so whether it's filled.
  pub fn masyu(&self, vertex: VertexId) -> Option<bool> {
    self.masyu.get(&vertex).copied()
  }

  /// All Masyu-clued vertices and whether each is filled.
  pub fn masyus(&self) -> impl Iterator<Item = (VertexId, bool)> + '_ {
    self.masyu.iter().map(|(&v, &f)| (v, f))
  }

  /// The enclosure size for a cell, if it has one.
  pub fn enclosure(&self, cell: CellId) -> Option<usize> {
    self.enclosure.get(&cell).copied()
  }

  /// All enclosure-clued cells and their sizes.
  pub fn enclosures(&self) -> impl Iterator<Item = (CellId, usize)> + '_ {
    self.enclosure.iter().map(|(&c, &n)| (c, n))
  }

  /// Whether a cell was given as inside (`true`) or outside the loop.
  pub fn initial(&self, cell: CellId) -> Option<bool> {
    self.initial.get(&cell).copied()
  }

  /// All cells whose side of the loop was given outright.
  pub fn initials(&self) -> impl Iterator<Item = (CellId, bool)> + '_ {
    self.initial.iter().map(|(&c, &i)| (c, i))
  }
}

fn cell_id(grid: &Grid, y: usize, x: usize, kind: &str) -> Result<CellId, Error> {
  if y < grid.height() && x < grid.width() {
    Ok(grid.cell_at(y as isize, x as isize))
  } else {
    Err(Error::InvalidConstraint(format!("{} cell ({}, {}) is off the grid", kind, y, x)))
  }
}

fn insert<K: Ord, V: PartialEq>(
  table: &mut BTreeMap<K, V>,
  key: K,
  value: V,
  what: impl Fn() -> String,
) -> Result<(), Error> {
  match table.get(&key) {
    Some(existing) if *existing != value => Err(Error::InvalidConstraint(format!(
      "{} is given twice with different values",
      what()
    ))),
    Some(_) => Ok(()),
    None => {
      table.insert(key, value);
      Ok(())
    }
  }
}
