//! # Ecm — Elliptic Curve Method Factoring
//!
//! Lenstra's ECM on Montgomery curves `By² = x³ + Ax² + x (mod n)` with
//! x-only projective coordinates `(X : Z)`, so no modular inversions occur in
//! the inner loop. Curves are generated by Suyama's σ parametrization, which
//! guarantees the group order is divisible by 12 and gives a known starting
//! point.
//!
//! Stage 1 multiplies the starting point by every prime power up to B1; a
//! factor p is caught when the point becomes the identity mod p but not mod
//! n, i.e. `gcd(Z, n)` turns non-trivial. Stage 2 extends the reach to a
//! single prime in (B1, B2] by accumulating Z-products with periodic gcds.
//!
//! The one place an inversion *is* needed — normalizing the Suyama curve
//! constant — is itself a factoring opportunity: a failed inversion hands
//! back `gcd`, which is returned like any other hit.

use crate::arith::{invmod, mulmod};
use crate::context::Context;
use crate::factor::sieve_primes;
use rug::ops::RemRounding;
use rug::Integer;

/// x-only projective point on a Montgomery curve.
#[derive(Clone, Debug)]
struct MontPoint {
    x: Integer,
    z: Integer,
}

/// `2P`, using the curve constant `a24 = (A+2)/4`.
fn mont_double(p: &MontPoint, a24: &Integer, n: &Integer) -> MontPoint {
    let u = Integer::from(&p.x + &p.z).rem_euc(n);
    let v = Integer::from(&p.x - &p.z).rem_euc(n);
    let u2 = mulmod(&u, &u, n);
    let v2 = mulmod(&v, &v, n);
    let diff = Integer::from(&u2 - &v2).rem_euc(n);
    let x = mulmod(&u2, &v2, n);
    let t = Integer::from(&v2 + &mulmod(a24, &diff, n)).rem_euc(n);
    let z = mulmod(&diff, &t, n);
    MontPoint { x, z }
}

/// Differential addition: `P + Q` given `diff = P − Q`.
fn mont_add(p: &MontPoint, q: &MontPoint, diff: &MontPoint, n: &Integer) -> MontPoint {
    let a = mulmod(
        &Integer::from(&p.x + &p.z).rem_euc(n),
        &Integer::from(&q.x - &q.z).rem_euc(n),
        n,
    );
    let b = mulmod(
        &Integer::from(&p.x - &p.z).rem_euc(n),
        &Integer::from(&q.x + &q.z).rem_euc(n),
        n,
    );
    let sum = Integer::from(&a + &b).rem_euc(n);
    let dif = Integer::from(&a - &b).rem_euc(n);
    let x = mulmod(&diff.z, &mulmod(&sum, &sum, n), n);
    let z = mulmod(&diff.x, &mulmod(&dif, &dif, n), n);
    MontPoint { x, z }
}

/// `k·P` by the Montgomery ladder.
fn mont_ladder(k: u64, p: &MontPoint, a24: &Integer, n: &Integer) -> MontPoint {
    if k == 0 {
        return MontPoint {
            x: Integer::new(),
            z: Integer::new(),
        };
    }
    if k == 1 {
        return p.clone();
    }
    let mut r0 = p.clone();
    let mut r1 = mont_double(p, a24, n);
    let bits = 64 - k.leading_zeros();
    for i in (0..bits - 1).rev() {
        if (k >> i) & 1 == 0 {
            r1 = mont_add(&r0, &r1, p, n);
            r0 = mont_double(&r0, a24, n);
        } else {
            r0 = mont_add(&r0, &r1, p, n);
            r1 = mont_double(&r1, a24, n);
        }
    }
    r0
}

fn nontrivial(g: Integer, n: &Integer) -> Option<Integer> {
    if g > 1u32 && g < *n {
        Some(g)
    } else {
        None
    }
}

/// Try one Suyama curve with bounds (B1, B2). Returns a non-trivial factor
/// or `None` when the curve misses.
fn one_curve(n: &Integer, b1_primes: &[u64], b2_primes: &[u64], b1: u64, ctx: &mut Context) -> Option<Integer> {
    // Suyama parametrization from σ ≥ 6:
    //   u = σ² − 5, v = 4σ, X0 = u³, Z0 = v³,
    //   a24 = (v−u)³(3u+v) / (16u³v)
    let sigma = Integer::from(6u32) + ctx.random_bits(31);
    let sigma = sigma.rem_euc(n);
    let u = Integer::from(Integer::from(&sigma * &sigma) - 5u32).rem_euc(n);
    let v = Integer::from(&sigma * 4u32).rem_euc(n);
    let u3 = mulmod(&mulmod(&u, &u, n), &u, n);
    let v3 = mulmod(&mulmod(&v, &v, n), &v, n);

    let vmu = Integer::from(&v - &u).rem_euc(n);
    let vmu3 = mulmod(&mulmod(&vmu, &vmu, n), &vmu, n);
    let t = Integer::from(Integer::from(&u * 3u32) + &v).rem_euc(n);
    let num = mulmod(&vmu3, &t, n);
    let den = mulmod(&Integer::from(&u3 * 16u32).rem_euc(n), &v, n);
    let a24 = match invmod(&den, n) {
        Ok(inv) => mulmod(&num, &inv, n),
        // The inversion failing IS the factor (or a degenerate curve).
        Err(w) => return nontrivial(w.0, n),
    };

    let mut p = MontPoint { x: u3, z: v3 };

    // Stage 1: multiply by every prime power ≤ B1.
    for &q in b1_primes {
        let mut k = q;
        let kmax = b1 / q;
        while k <= kmax {
            k *= q;
        }
        p = mont_ladder(k, &p, &a24, n);
    }
    let g = Integer::from(p.z.gcd_ref(n));
    if g == *n {
        return None;
    }
    if let Some(f) = nontrivial(g, n) {
        return Some(f);
    }

    // Stage 2: one prime in (B1, B2], batched Z-product with periodic gcds.
    let mut product = Integer::from(1u32);
    for (i, &q) in b2_primes.iter().enumerate() {
        let pq = mont_ladder(q, &p, &a24, n);
        product = mulmod(&product, &pq.z, n);
        if i % 64 == 63 {
            let g = Integer::from(product.gcd_ref(n));
            if let Some(f) = nontrivial(g, n) {
                return Some(f);
            }
        }
    }
    let g = product.gcd(n);
    nontrivial(g, n)
}

/// ECM with stage-1 bound `b1` (stage 2 runs to 100·b1) across `curves`
/// random Suyama curves. Returns a non-trivial factor of `n` or `None`.
pub fn ecm_factor(n: &Integer, b1: u64, curves: u32, ctx: &mut Context) -> Option<Integer> {
    for &f in &[2u32, 3, 5, 7] {
        if n.is_divisible_u(f) && *n != f {
            return Some(Integer::from(f));
        }
    }
    if *n < 121u32 {
        return None;
    }

    let b1 = b1.max(100);
    let b2 = b1.saturating_mul(100);
    let primes = sieve_primes(b2);
    let split = primes.partition_point(|&p| p <= b1);
    let (b1_primes, b2_primes) = primes.split_at(split);

    for _ in 0..curves {
        if let Some(f) = one_curve(n, b1_primes, b2_primes, b1, ctx) {
            return Some(f);
        }
    }
    None
}
