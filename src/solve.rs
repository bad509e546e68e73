//! Defines the solver, which drives a Fence from its clues to a full
//! coloring.

use crate::core::*;
use crate::fence::{Constraints, Fence};
use serde::Serialize;
use tracing::debug;
use wasm_bindgen::prelude::*;

/// Caps on how much work deduction may do before giving up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
  /// Passes of the local rules before `iterate_to_fixed_point` gives up.
  pub max_passes: usize,
  /// Rounds of local plus speculative deduction before the solver gives up.
  pub max_rounds: usize,
  /// The most distinct regions a single clue check will enumerate over.
  /// Clues touching more are skipped until more is known.
  pub max_exhaustive_vars: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Limits {
      max_passes: 100,
      max_rounds: 100,
      max_exhaustive_vars: 12,
    }
  }
}

/// Alternates local and speculative deduction until a puzzle is solved or
/// neither makes progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct Solver {
  limits: Limits,
}

impl Solver {
  pub fn new(limits: Limits) -> Solver {
    Solver { limits }
  }

  pub fn limits(&self) -> Limits {
    self.limits
  }

  /// Solves the puzzle `fence` describes.  Fails with `Error::Unsolved` if
  /// deduction runs dry with cells still undetermined, and with
  /// `Error::Contradiction` if the puzzle has no solution.
  pub fn solve(&self, fence: &Fence) -> Result<Fence, Error> {
    let mut fence = fence.with_limits(self.limits).handle_initial_cases()?;
    let mut round = 0;
    loop {
      if round == self.limits.max_rounds {
        return Err(Error::NonConvergence {
          limit: self.limits.max_rounds,
        });
      }
      round += 1;
      let before = fence.merges();
      fence = fence.iterate_to_fixed_point()?;
      fence.check_rules()?;
      let (next, speculated) = fence.slow_checks()?;
      fence = next;
      debug!(round, merges = fence.merges(), unknown = fence.unknown_cells(), "solver round");
      if !speculated && fence.merges() == before {
        break;
      }
    }
    match fence.unknown_cells() {
      0 => Ok(fence),
      unknown => Err(Error::Unsolved { unknown }),
    }
  }
}

/// A solved puzzle, as handed back to JavaScript.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Solution {
  pub height: usize,
  pub width: usize,
  /// Whether each cell is inside the loop, in row-major order.
  pub inside: Vec<bool>,
}

impl Solution {
  /// Reads off a fully-colored fence.
  pub fn from_fence(fence: &Fence) -> Solution {
    let grid = fence.grid();
    let inside = grid
      .cells()
      .iter()
      .filter(|c| !c.is_outside())
      .map(|c| fence.region(c.id()) == Region::INSIDE)
      .collect();
    Solution {
      height: grid.height(),
      width: grid.width(),
      inside,
    }
  }
}

/// Solves a puzzle given as a `Constraints` object, returning a `Solution`.
#[wasm_bindgen(js_name = "solvePuzzle")]
pub fn solve_puzzle(height: usize, width: usize, constraints: JsValue) -> Result<JsValue, String> {
  #[cfg(feature = "console_error_panic_hook")]
  console_error_panic_hook::set_once();

  let constraints: Constraints =
    serde_wasm_bindgen::from_value(constraints).map_err(|e| e.to_string())?;
  let fence = Fence::create(height, width, &constraints).map_err(|e| e.to_string())?;
  let solved = Solver::default().solve(&fence).map_err(|e| e.to_string())?;
  serde_wasm_bindgen::to_value(&Solution::from_fence(&solved)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fence::{CorralValue, MasyuClue};
  use paste::paste;

  fn solve(height: usize, width: usize, constraints: Constraints) -> Result<Vec<bool>, Error> {
    let fence = Fence::create(height, width, &constraints)?;
    let solved = Solver::default().solve(&fence)?;
    let solution = Solution::from_fence(&solved);
    assert_eq!((height, width), (solution.height, solution.width));
    Ok(solution.inside)
  }

  /// Parses a picture of which cells are inside: `#` for inside, `.` for
  /// outside, one string per row.
  fn picture(rows: &[&str]) -> Vec<bool> {
    rows.iter().flat_map(|r| r.chars().map(|c| c == '#')).collect()
  }

  macro_rules! solve_test {
    ($name:ident, $height:expr, $width:expr, $constraints:expr, $expected:expr) => {
      paste! {
          #[test]
          fn [<test_solve_ $name>]() {
              let constraints: Constraints = serde_json::from_str($constraints).unwrap();
              let expected: Result<&[&str], Error> = $expected;
              match (solve($height, $width, constraints), expected) {
                  (Ok(inside), Ok(rows)) => assert_eq!(picture(rows), inside),
                  (Err(e), Err(want)) => assert_eq!(
                      std::mem::discriminant(&want),
                      std::mem::discriminant(&e),
                      "{}",
                      e
                  ),
                  (got, want) => panic!("expected {:?}, got {:?}", want, got),
              }
          }
      }
    };
  }

  solve_test!(single_four, 1, 1, r#"{"slitherlink": [[0, 0, 4]]}"#, Ok(&["#"]));
  solve_test!(single_zero, 1, 1, r#"{"slitherlink": [[0, 0, 0]]}"#, Ok(&["."]));
  solve_test!(
    all_twos,
    2,
    2,
    r#"{"slitherlink": [[0, 0, 2], [0, 1, 2], [1, 0, 2], [1, 1, 2]]}"#,
    Ok(&["##", "##"])
  );
  solve_test!(
    three_beside_a_blank,
    1,
    2,
    r#"{"slitherlink": [[0, 0, 3]]}"#,
    Ok(&["##"])
  );
  solve_test!(
    corral_gap,
    1,
    3,
    r#"{"corral": [[0, 0, true], [0, 2, true]]}"#,
    Ok(&["###"])
  );
  solve_test!(
    corral_size,
    1,
    3,
    r#"{"corral": [[0, 1, 1]]}"#,
    Ok(&[".#."])
  );
  solve_test!(
    masyu_seven,
    7,
    7,
    r#"{"masyu": [[1, 1], [1, 3], [2, 2], [2, 3], [2, 6], [2, 7], [3, 1], [3, 3],
                  [3, 6], [4, 0, true], [5, 7], [6, 1], [6, 2], [6, 3], [6, 4], [6, 5]]}"#,
    Ok(&[
      "#.###..",
      "#...#.#",
      "#####.#",
      "....#.#",
      "#######",
      "#.#.#.#",
      "#.#.#..",
    ])
  );
  solve_test!(
    no_clues,
    2,
    2,
    "{}",
    Err(Error::Unsolved { unknown: 4 })
  );
  solve_test!(
    impossible_two,
    1,
    1,
    r#"{"slitherlink": [[0, 0, 2]]}"#,
    Err(Error::Contradiction(String::new()))
  );
  solve_test!(
    cornered_circle,
    2,
    2,
    r#"{"masyu": [[0, 0]]}"#,
    Err(Error::Contradiction(String::new()))
  );
  solve_test!(
    off_the_grid,
    2,
    2,
    r#"{"corral": [[5, 5, 2]]}"#,
    Err(Error::InvalidConstraint(String::new()))
  );

  #[test]
  fn single_four_walls_every_side() {
    let constraints = Constraints {
      slitherlink: vec![(0, 0, 4)],
      ..Default::default()
    };
    let fence = Fence::create(1, 1, &constraints).unwrap();
    let solved = Solver::default().solve(&fence).unwrap();
    let cell = solved.grid().cell_at(0, 0);
    for &h in solved.grid().cell(cell).incident() {
      assert_eq!(Some(true), solved.edge_type(h));
    }
    assert_eq!(!solved.region(Grid::OUTSIDE), solved.region(cell));
  }

  #[test]
  fn solving_twice_changes_nothing() {
    let constraints = Constraints {
      slitherlink: vec![(0, 0, 2), (0, 1, 2), (1, 0, 2), (1, 1, 2)],
      ..Default::default()
    };
    let fence = Fence::create(2, 2, &constraints).unwrap();
    let solver = Solver::default();
    let once = solver.solve(&fence).unwrap();
    let twice = solver.solve(&once).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.merges(), twice.merges());
  }

  #[test]
  fn unsolved_reports_the_count() {
    let constraints = Constraints {
      corral: vec![(0, 0, CorralValue::Region(false))],
      ..Default::default()
    };
    let fence = Fence::create(2, 3, &constraints).unwrap();
    assert_eq!(
      Err(Error::Unsolved { unknown: 5 }),
      Solver::default().solve(&fence)
    );
  }

  #[test]
  fn masyu_contradiction_is_fatal() {
    let constraints = Constraints {
      masyu: vec![MasyuClue::Circle(1, 1, true)],
      ..Default::default()
    };
    let fence = Fence::create(2, 2, &constraints).unwrap();
    assert!(Solver::default().solve(&fence).unwrap_err().is_contradiction());
  }

  #[test]
  fn round_limit() {
    let constraints = Constraints {
      slitherlink: vec![(0, 0, 4)],
      ..Default::default()
    };
    let fence = Fence::create(1, 1, &constraints).unwrap();
    let solver = Solver::new(Limits {
      max_rounds: 0,
      ..Limits::default()
    });
    assert_eq!(
      Err(Error::NonConvergence { limit: 0 }),
      solver.solve(&fence)
    );
  }

  #[test]
  fn solution_serializes() {
    let solution = Solution {
      height: 1,
      width: 2,
      inside: vec![true, false],
    };
    assert_eq!(
      r#"{"height":1,"width":2,"inside":[true,false]}"#,
      serde_json::to_string(&solution).unwrap()
    );
  }
}
