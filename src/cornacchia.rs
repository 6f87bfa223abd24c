//! # Cornacchia — Solving u² + |D|v² = 4N
//!
//! The modified Cornacchia algorithm (Cohen, *A Course in Computational
//! Algebraic Number Theory*, 1.5.3) used by ECPP to turn an accepted
//! discriminant into curve-order candidates: the solution (u, v) gives the
//! trace, and the possible curve orders are N+1±u (plus the extra twists for
//! D = −3, −4).
//!
//! Preconditions the caller establishes: N odd and believed prime, D < 0,
//! `(D/N) = 1`. The square root and the lattice reduction can still fail for
//! a legitimate reason — N does not split in the order of discriminant D —
//! and that is reported as `None`, not an error.

use crate::arith::{jacobi, sqrtmod};
use rug::ops::RemRounding;
use rug::Integer;

/// Find (u, v) with `u² + |D|·v² = 4N`, or `None` when no solution exists.
pub fn modified_cornacchia(d: i64, n: &Integer) -> Option<(Integer, Integer)> {
    debug_assert!(d < 0);
    let abs_d = Integer::from(d.unsigned_abs());
    let four_n = Integer::from(n << 2u32);

    if jacobi(&Integer::from(d), n) != 1 {
        return None;
    }

    // Square root of D mod N, adjusted so x0 ≡ D (mod 2); then x0² ≡ D
    // holds mod 4N as required for the half-gcd descent on 2N.
    let d_mod = Integer::from(d).rem_euc(n);
    let mut x0 = sqrtmod(&d_mod, n).ok()?;
    if x0.is_odd() != (d.rem_euclid(2) == 1) {
        x0 = Integer::from(n - &x0);
    }

    let mut a = Integer::from(n << 1u32);
    let mut b = x0;
    let limit = Integer::from(four_n.sqrt_ref());
    while b > limit {
        let r = a.rem_euc(&b);
        a = b;
        b = r;
    }

    let t = Integer::from(&four_n - &Integer::from(&b * &b));
    if !t.is_divisible(&abs_d) {
        return None;
    }
    let v2 = t / abs_d;
    if !v2.is_perfect_square() {
        return None;
    }
    Some((b, v2.sqrt()))
}
