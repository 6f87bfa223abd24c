//! Property-based tests using proptest.
//!
//! These tests verify mathematical invariants hold across random inputs.
//! Run with: cargo test --test property_tests

use primacert::context::Context;
use primacert::{arith, bpsw, cornacchia, factor, Primality};
use proptest::prelude::*;
use rug::Integer;

/// Trial-division reference for the probable-prime gate.
fn is_prime_naive(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

proptest! {
    /// is_prob_prime agrees with trial division everywhere below 10^6.
    #[test]
    fn prop_bpsw_matches_trial_division(n in 0u64..1_000_000) {
        let verdict = bpsw::is_prob_prime(&Integer::from(n));
        let expect = is_prime_naive(n);
        prop_assert_eq!(
            verdict != Primality::Composite,
            expect,
            "is_prob_prime({}) disagrees with trial division", n
        );
    }

    /// Below 2^64 the verdict is always decided, never Probable.
    #[test]
    fn prop_bpsw_deterministic_in_word_range(n in any::<u64>()) {
        let verdict = bpsw::is_prob_prime(&Integer::from(n));
        prop_assert_ne!(verdict, Primality::Probable, "n = {}", n);
    }

    /// Miller-Rabin never rejects a prime, for any base.
    #[test]
    fn prop_mr_accepts_primes(idx in 0usize..1000, a in 2u64..10_000) {
        let primes = factor::sieve_primes(10_000);
        let p = primes[idx % primes.len()];
        let n = Integer::from(p);
        prop_assert!(
            bpsw::miller_rabin(&n, &Integer::from(a)),
            "miller_rabin({}, {}) rejected a prime", p, a
        );
    }

    /// The strong Lucas test never rejects a prime.
    #[test]
    fn prop_strong_lucas_accepts_primes(idx in 0usize..1000) {
        let primes = factor::sieve_primes(100_000);
        let p = primes[idx % primes.len()];
        prop_assert!(
            bpsw::is_strong_lucas_pseudoprime(&Integer::from(p)),
            "strong Lucas rejected prime {}", p
        );
    }

    /// sqrtmod returns a root whose square is the input, for all residues.
    #[test]
    fn prop_sqrtmod_roundtrip(x in 1u64..1_000_000) {
        let p = Integer::from(1_000_033u32); // prime ≡ 1 mod 8
        let x = Integer::from(x);
        let sq = arith::mulmod(&x, &x, &p);
        let y = arith::sqrtmod(&sq, &p).unwrap();
        prop_assert_eq!(arith::mulmod(&y, &y, &p), sq);
    }

    /// factor() output is sorted, multiplies back, and is all prime.
    #[test]
    fn prop_factor_roundtrip(n in 2u64..10_000_000_000u64) {
        let mut ctx = Context::with_seed(n);
        let n = Integer::from(n);
        let factors = factor::factor(&n, &mut ctx);
        let mut prod = Integer::from(1u32);
        for f in &factors {
            prop_assert_ne!(
                bpsw::is_prob_prime(f), Primality::Composite,
                "composite element {} in factor({})", f, &n
            );
            prod *= f;
        }
        prop_assert_eq!(&prod, &n, "factor({}) product mismatch", &n);
        for w in factors.windows(2) {
            prop_assert!(w[0] <= w[1], "factor({}) not sorted", &n);
        }
    }

    /// Any Cornacchia solution actually solves u² + |D|v² = 4N.
    #[test]
    fn prop_cornacchia_solutions_verify(
        pidx in 0usize..500,
        d in prop::sample::select(vec![-3i64, -4, -7, -8, -11, -15, -20, -23, -24]),
    ) {
        let primes = factor::sieve_primes(100_000);
        // Odd primes comfortably above |D|.
        let p = primes[10 + pidx % (primes.len() - 10)];
        let n = Integer::from(p);
        if let Some((u, v)) = cornacchia::modified_cornacchia(d, &n) {
            let lhs = Integer::from(&u * &u)
                + Integer::from(d.unsigned_abs()) * Integer::from(&v * &v);
            prop_assert_eq!(lhs, Integer::from(&n << 2u32));
        }
    }

    /// Curve scalar multiplication distributes: (j+k)P = jP + kP.
    #[test]
    fn prop_curve_multiply_distributes(j in 1u64..50, k in 1u64..50) {
        use primacert::curve;
        let n = Integer::from(1_000_003u32);
        let a = Integer::from(5u32);
        // y² = x³ + 5x + b through (2, 3): b = 9 − 8 − 10 = −9
        let b = Integer::from(&n - 9u32);
        let p = curve::Point::new(Integer::from(2u32), Integer::from(3u32));
        prop_assert!(p.on_curve(&a, &b, &n));

        let jp = curve::multiply(&Integer::from(j), &p, &a, &n).unwrap();
        let kp = curve::multiply(&Integer::from(k), &p, &a, &n).unwrap();
        let sum = curve::add(&jp, &kp, &a, &n).unwrap();
        let direct = curve::multiply(&Integer::from(j + k), &p, &a, &n).unwrap();
        prop_assert_eq!(sum, direct, "j = {}, k = {}", j, k);
    }
}
