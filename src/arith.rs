//! # Arith — Modular Arithmetic Kernel
//!
//! Thin wrappers over `rug::Integer` for the handful of modular operations the
//! rest of the crate is written in terms of: `mulmod`, `powmod`, `invmod`,
//! `jacobi`, and `sqrtmod` (Tonelli–Shanks).
//!
//! Two conventions set here propagate through the whole crate:
//!
//! 1. All inputs are reduced to non-negative residues below the modulus before
//!    use; all outputs are in `[0, n)`.
//! 2. A non-invertible element discovered while working modulo a supposed
//!    prime `n` is not an error to swallow — it is a [`CompositeWitness`]
//!    carrying `gcd(a, n)`. Downstream (polynomial gcd, curve-slope inversion)
//!    this witness short-circuits an entire primality proof with a COMPOSITE
//!    verdict, which is exactly what we want from a proof attempt on a
//!    composite input.

use rug::ops::RemRounding;
use rug::Integer;
use std::fmt;

/// A zero divisor found while doing arithmetic modulo a supposed prime.
///
/// Carries `gcd(a, n)` for the offending element `a`. The gcd may equal `n`
/// itself (e.g. inverting zero); callers that want a *non-trivial* divisor
/// must check, but either way the modulus has been revealed composite or the
/// operation was degenerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeWitness(pub Integer);

impl fmt::Display for CompositeWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zero divisor witness: gcd = {}", self.0)
    }
}

/// `a * b mod n`, result in `[0, n)`.
pub fn mulmod(a: &Integer, b: &Integer, n: &Integer) -> Integer {
    Integer::from(a * b).rem_euc(n)
}

/// `a^e mod n` for non-negative `e`, result in `[0, n)`.
pub fn powmod(a: &Integer, e: &Integer, n: &Integer) -> Integer {
    debug_assert!(*e >= 0u32, "powmod requires a non-negative exponent");
    let base = a.clone().rem_euc(n);
    match base.pow_mod_ref(e, n) {
        Some(p) => Integer::from(p),
        None => Integer::new(),
    }
}

/// `a^e mod n` with a machine-word exponent.
pub fn powmod_u(a: &Integer, e: u64, n: &Integer) -> Integer {
    powmod(a, &Integer::from(e), n)
}

/// Modular inverse of `a` mod `n`, or the zero-divisor witness `gcd(a, n)`.
pub fn invmod(a: &Integer, n: &Integer) -> Result<Integer, CompositeWitness> {
    let a = a.clone().rem_euc(n);
    match a.invert(n) {
        Ok(inv) => Ok(inv),
        Err(a) => Err(CompositeWitness(Integer::from(a.gcd_ref(n)))),
    }
}

/// Jacobi symbol `(a/n)` for odd positive `n`; `a` may be negative.
pub fn jacobi(a: &Integer, n: &Integer) -> i32 {
    a.jacobi(n)
}

/// Failure modes of [`sqrtmod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqrtmodError {
    /// `(a/n) != 1`: no square root exists (or gcd(a, n) > 1).
    NotASquare,
    /// The computed root failed the `y^2 ≡ a (mod n)` re-check, which can
    /// only happen when `n` is composite.
    BadRoot,
}

/// Square root of `a` modulo an odd prime `n` via Tonelli–Shanks.
///
/// The returned root is always re-verified against `y^2 ≡ a (mod n)`; when
/// the check fails the modulus was not prime and [`SqrtmodError::BadRoot`] is
/// returned so the caller can turn it into a composite verdict.
pub fn sqrtmod(a: &Integer, n: &Integer) -> Result<Integer, SqrtmodError> {
    let a = a.clone().rem_euc(n);
    if a == 0u32 {
        return Ok(Integer::new());
    }
    if jacobi(&a, n) != 1 {
        return Err(SqrtmodError::NotASquare);
    }

    let y = if n.mod_u(4) == 3 {
        // n ≡ 3 (mod 4): a^((n+1)/4)
        let e = Integer::from(n + 1u32) >> 1u32 >> 1u32;
        powmod(&a, &e, n)
    } else if n.mod_u(8) == 5 {
        // n ≡ 5 (mod 8): Atkin's form
        let e = Integer::from(n + 3u32) >> 3u32;
        let mut y = powmod(&a, &e, n);
        if mulmod(&y, &y, n) != a {
            let e2 = Integer::from(n - 1u32) >> 2u32;
            let two_pow = powmod(&Integer::from(2u32), &e2, n);
            y = mulmod(&y, &two_pow, n);
        }
        y
    } else {
        tonelli_shanks(&a, n)?
    };

    // The re-check upgrades a silent wrong root on composite n into a
    // reportable failure.
    if mulmod(&y, &y, n) != a {
        return Err(SqrtmodError::BadRoot);
    }
    Ok(y)
}

/// Full Tonelli–Shanks for `n ≡ 1 (mod 8)`.
fn tonelli_shanks(a: &Integer, n: &Integer) -> Result<Integer, SqrtmodError> {
    // n - 1 = q * 2^s with q odd
    let nm1 = Integer::from(n - 1u32);
    let s = nm1.find_one(0).unwrap_or(0);
    let q = Integer::from(&nm1 >> s);

    // Smallest non-residue. For prime n one appears almost immediately; the
    // cap keeps us from spinning forever on a composite modulus.
    let mut z = Integer::from(2u32);
    let mut found = false;
    for _ in 0..10_000 {
        if jacobi(&z, n) == -1 {
            found = true;
            break;
        }
        z += 1u32;
    }
    if !found {
        return Err(SqrtmodError::BadRoot);
    }

    let mut m = s;
    let mut c = powmod(&z, &q, n);
    let mut t = powmod(a, &q, n);
    let mut r = powmod(a, &Integer::from(Integer::from(&q + 1u32) >> 1u32), n);

    while t != 1u32 {
        // least i with t^(2^i) == 1
        let mut i = 0u32;
        let mut t2 = t.clone();
        while t2 != 1u32 {
            t2 = mulmod(&t2, &t2, n);
            i += 1;
            if i >= m {
                return Err(SqrtmodError::BadRoot);
            }
        }
        let mut b = c;
        for _ in 0..(m - i - 1) {
            b = mulmod(&b, &b, n);
        }
        m = i;
        c = mulmod(&b, &b, n);
        t = mulmod(&t, &c, n);
        r = mulmod(&r, &b, n);
    }
    Ok(r)
}
