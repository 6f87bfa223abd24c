//! # Bls — BLS75 N−1 Primality Gate
//!
//! A quick deterministic prover for numbers whose N−1 is easy to factor,
//! used ahead of ECPP: for special-form and small inputs it settles
//! primality in a few modular exponentiations instead of a curve search.
//!
//! The theorems used (Brillhart–Lehmer–Selfridge 1975):
//!
//! - **Pocklington / Theorem 3**: if the fully-factored part F of N−1
//!   exceeds √N and every prime q | F has a witness a with
//!   `a^(N−1) ≡ 1 (mod N)` and `gcd(a^((N−1)/q) − 1, N) = 1`, N is prime.
//! - **Theorem 5**: F > N^(1/3) suffices, with the additional check on
//!   N−1 = F·R, R = 2Fs + r: N is prime when s = 0 or r² − 8s is not a
//!   perfect square.
//!
//! Only primes proven deterministically (≤ 2⁶⁴, where BPSW decides) are
//! admitted into F, so the proof never rests on a probable prime.
//!
//! This gate is *non-certifying*: it returns a verdict but contributes no
//! text to an ECPP certificate, keeping the certificate grammar single-form.

use crate::arith::powmod;
use crate::bpsw::is_prob_prime;
use crate::factor::{pbrent_factor, pminus1_factor, sieve_primes};
use crate::Primality;
use rug::Integer;
use tracing::debug;

/// Effort-scaled budgets for the partial factorization of N−1.
fn budgets(effort: u32) -> (u64, u64, u64) {
    // (trial limit, brent rounds, p-1 B1)
    match effort {
        0 | 1 => (20_000, 50_000, 2_000),
        2 => (50_000, 200_000, 10_000),
        _ => (200_000, 1_000_000, 50_000),
    }
}

/// BLS75 N−1 test with bounded effort. Returns `Prime` on a completed
/// proof, `Composite` when a Fermat witness appears, and `Probable` when
/// the factored part stays too small to conclude anything.
pub fn bls75_nm1(n: &Integer, effort: u32) -> Primality {
    match is_prob_prime(n) {
        Primality::Composite => return Primality::Composite,
        Primality::Prime => return Primality::Prime,
        Primality::Probable => {}
    }

    let nm1 = Integer::from(n - 1u32);
    let (trial_limit, brent_rounds, p1_b1) = budgets(effort);

    // Partial factorization: F collects full prime powers, R the rest.
    let mut factors: Vec<Integer> = Vec::new();
    let mut f_part = Integer::from(1u32);
    let mut r_part = nm1.clone();
    let f_enough = |f: &Integer| {
        let f3 = Integer::from(f * f) * f;
        f3 > *n
    };

    for &p in sieve_primes(trial_limit).iter() {
        if r_part == 1u32 || f_enough(&f_part) {
            break;
        }
        if p <= u32::MAX as u64 && r_part.is_divisible_u(p as u32) {
            let p_int = Integer::from(p);
            while r_part.is_divisible_u(p as u32) {
                r_part.div_exact_u_mut(p as u32);
                f_part *= &p_int;
            }
            factors.push(p_int);
        }
    }

    // Pull a few more factors with cheap methods; only admit primes that
    // BPSW decides outright.
    while r_part > 1u32 && !f_enough(&f_part) {
        if is_prob_prime(&r_part) == Primality::Prime {
            factors.push(r_part.clone());
            f_part *= &r_part;
            r_part = Integer::from(1u32);
            break;
        }
        let found = pbrent_factor(&r_part, 3, brent_rounds)
            .or_else(|| pminus1_factor(&r_part, p1_b1, 10 * p1_b1));
        let Some(f) = found else { break };
        let f = if is_prob_prime(&f) == Primality::Prime {
            f
        } else {
            // Try one split of a composite find.
            match pbrent_factor(&f, 1, brent_rounds)
                .filter(|g| is_prob_prime(g) == Primality::Prime)
            {
                Some(g) => g,
                None => break,
            }
        };
        while r_part.is_divisible(&f) {
            r_part.div_exact_mut(&f);
            f_part *= &f;
        }
        factors.push(f);
    }

    let f2 = Integer::from(&f_part * &f_part);
    let f3 = Integer::from(&f2 * &f_part);
    let theorem3 = f2 > *n;
    let theorem5 = f3 > *n;
    if !theorem3 && !theorem5 {
        debug!(factored_bits = f_part.significant_bits(), "N-1 too little factored");
        return Primality::Probable;
    }

    // Witness search per prime factor, bases 2..=200.
    for q in &factors {
        let exp_q = Integer::from(&nm1 / q);
        let mut satisfied = false;
        for a in 2u32..=200 {
            let a_int = Integer::from(a);
            let fermat = powmod(&a_int, &nm1, n);
            if fermat != 1u32 {
                // A Fermat witness: n is composite, full stop.
                return Primality::Composite;
            }
            let r = powmod(&a_int, &exp_q, n);
            let g = Integer::from(r - 1u32).gcd(n);
            if g == 1u32 {
                satisfied = true;
                break;
            }
        }
        if !satisfied {
            return Primality::Probable;
        }
    }

    if theorem3 {
        return Primality::Prime;
    }

    // Theorem 5 tail: N−1 = F·R, write R = 2Fs + r.
    let (s, r) = r_part.clone().div_rem_euc(Integer::from(&f_part * 2u32));
    if s == 0u32 {
        return Primality::Prime;
    }
    let disc = Integer::from(&r * &r) - Integer::from(&s * 8u32);
    if disc < 0u32 || !disc.is_perfect_square() {
        Primality::Prime
    } else {
        // The theorem would exhibit a factorization here; stay conservative
        // and let ECPP settle it.
        Primality::Probable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(s: &str) -> Integer {
        Integer::parse(s).map(Integer::from).unwrap()
    }

    #[test]
    fn small_inputs_delegate_to_bpsw() {
        assert_eq!(bls75_nm1(&Integer::from(97u32), 1), Primality::Prime);
        assert_eq!(bls75_nm1(&Integer::from(91u32), 1), Primality::Composite);
        assert_eq!(bls75_nm1(&Integer::from(1u32), 1), Primality::Composite);
    }

    #[test]
    fn proves_mersenne_61() {
        // 2^61 − 2 = 2·3²·5²·7·11·13·31·41·61·151·331·1321: fully smooth,
        // so N−1 factors completely inside the trial limit.
        let p = int("2305843009213693951");
        assert_eq!(bls75_nm1(&p, 1), Primality::Prime);
    }

    #[test]
    fn proves_above_word_size_with_smooth_nm1() {
        // 2^127 − 1: N−1 = 2·(2^63−1)(2^63+1) is rich in small factors;
        // enough of F accumulates for theorem 5.
        let p = int("170141183460469231731687303715884105727");
        let r = bls75_nm1(&p, 2);
        assert_ne!(r, Primality::Composite, "M127 is prime");
    }

    #[test]
    fn rejects_composites_fast() {
        // BPSW front gate catches ordinary composites.
        let n = int("340561"); // Carmichael
        assert_eq!(bls75_nm1(&n, 1), Primality::Composite);
    }

    #[test]
    fn never_misjudges_a_hard_prime() {
        // 2^128 + 51, the first prime above 2^128. Whether or not N−1
        // factors far enough to finish a proof, the gate must not return
        // Composite for a prime.
        let p = int("340282366920938463463374607431768211507");
        let r = bls75_nm1(&p, 1);
        assert_ne!(r, Primality::Composite);
    }
}
