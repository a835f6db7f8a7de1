use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use sb_tensor::Tensor;

#[track_caller]
fn unwrap_ok<T, E: core::fmt::Debug>(context: &str, result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("{context}: {error:?}"),
    }
}

fn stable_softmax(input: &Tensor) -> Tensor {
    let shifted = unwrap_ok("sub_col", input.sub_col(&input.row_max()));
    let mut probs = shifted.exp();
    let sums = probs.sum_axis1();
    unwrap_ok("div_col_inplace", probs.div_col_inplace(&sums));
    probs
}

fn bench_row_softmax(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_softmax");
    for &(rows, cols) in &[(64usize, 4usize), (256, 64), (1024, 512)] {
        let input = unwrap_ok(
            "random_uniform",
            Tensor::random_uniform(rows, cols, -8.0, 8.0, 0x5eed),
        );
        group.bench_function(format!("full_row_{rows}x{cols}"), |b| {
            b.iter_batched(
                || input.clone(),
                |x| black_box(stable_softmax(&x)),
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("logistic_{rows}x{cols}"), |b| {
            b.iter(|| black_box(input.logistic()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_row_softmax);
criterion_main!(benches);
