use criterion::{black_box, criterion_group, criterion_main, Criterion};
use primacert::{bpsw, Context};
use rug::ops::Pow;
use rug::Integer;

fn bench_is_prob_prime_large(c: &mut Criterion) {
    let n = Integer::from(10u32).pow(49) + 9u32;
    c.bench_function("is_prob_prime(10^49+9)", |b| {
        b.iter(|| primacert::is_prob_prime(black_box(&n)));
    });
}

fn bench_miller_rabin_m127(c: &mut Criterion) {
    let n = Integer::from(2u32).pow(127) - 1u32;
    let base = Integer::from(2u32);
    c.bench_function("miller_rabin(M127, 2)", |b| {
        b.iter(|| bpsw::miller_rabin(black_box(&n), black_box(&base)));
    });
}

fn bench_strong_lucas_m127(c: &mut Criterion) {
    let n = Integer::from(2u32).pow(127) - 1u32;
    c.bench_function("strong_lucas(M127)", |b| {
        b.iter(|| bpsw::is_strong_lucas_pseudoprime(black_box(&n)));
    });
}

fn bench_factor_small(c: &mut Criterion) {
    let n = Integer::from(600851475143u64);
    c.bench_function("factor(600851475143)", |b| {
        b.iter(|| {
            let mut ctx = Context::with_seed(1);
            primacert::factor::factor(black_box(&n), &mut ctx)
        });
    });
}

fn bench_holf_balanced(c: &mut Criterion) {
    let n = Integer::from(10000019u64) * Integer::from(10000079u64);
    c.bench_function("holf(balanced 15-digit)", |b| {
        b.iter(|| primacert::factor::holf_factor(black_box(&n), 1 << 21));
    });
}

fn bench_ecpp_small_proof(c: &mut Criterion) {
    let p = Integer::parse("18446744073709551629").map(Integer::from).unwrap();
    c.bench_function("ecpp_prove(2^64+13)", |b| {
        b.iter(|| {
            let mut ctx = Context::with_seed(42);
            primacert::ecpp::ecpp_prove(black_box(&p), &mut ctx, true)
        });
    });
}

criterion_group!(
    benches,
    bench_is_prob_prime_large,
    bench_miller_rabin_m127,
    bench_strong_lucas_m127,
    bench_factor_small,
    bench_holf_balanced,
    bench_ecpp_small_proof,
);
criterion_main!(benches);
