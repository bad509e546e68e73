use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fencepost::fence::{Constraints, CorralValue, Fence};
use fencepost::solve::Solver;

fn criterion_benchmark(c: &mut Criterion) {
  let twos = constraints(&[(0, 0, 2), (0, 1, 2), (1, 0, 2), (1, 1, 2)], &[]);
  c.bench_function("solve 2x2 twos", |b| {
    b.iter(|| solve(black_box(2), black_box(2), &twos))
  });
  let gap = constraints(
    &[],
    &[
      (0, 0, CorralValue::Region(true)),
      (0, 4, CorralValue::Region(true)),
    ],
  );
  c.bench_function("solve 1x5 corral gap", |b| {
    b.iter(|| solve(black_box(1), black_box(5), &gap))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

fn constraints(slitherlink: &[(usize, usize, u8)], corral: &[(usize, usize, CorralValue)]) -> Constraints {
  Constraints {
    slitherlink: slitherlink.to_vec(),
    corral: corral.to_vec(),
    ..Default::default()
  }
}

/// Solves a puzzle from scratch, grid construction included.
fn solve(height: usize, width: usize, constraints: &Constraints) -> Fence {
  let fence = Fence::create(height, width, constraints).unwrap();
  Solver::default().solve(&fence).unwrap()
}
