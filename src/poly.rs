//! # Poly — Polynomial Arithmetic Modulo N
//!
//! Dense coefficient-vector polynomials over ℤ/N, sized for class-polynomial
//! root finding: degrees stay small (the class number h), while exponents run
//! to N itself. `coeffs[i]` is the coefficient of `x^i`; the zero polynomial
//! is `[0]`.
//!
//! ## Root finding
//!
//! [`roots_mod_p`] isolates the product of linear factors of T by computing
//! `gcd(T, x^N − x)` mod N, then splits it by the standard equal-degree
//! probabilistic method: pick a random shift r and take
//! `gcd(T, (x + r)^((N−1)/2) − 1)` until only linear pieces remain. The
//! smaller factor is recursed into first.
//!
//! ## Composite moduli
//!
//! Every division inside the Euclidean loop inverts a leading coefficient
//! mod N. When N is secretly composite this inversion can fail, and the
//! failure is a gift: the [`CompositeWitness`] gcd propagates out through
//! `Result` instead of being swallowed, so a primality prover calling into
//! this module gets a composite verdict for free.

use crate::arith::{invmod, mulmod, sqrtmod, CompositeWitness, SqrtmodError};
use crate::context::Context;
use rug::ops::RemRounding;
use rug::Integer;

/// Dense polynomial: `coeffs[i]` multiplies `x^i`.
pub type Poly = Vec<Integer>;

/// Degree of a trimmed polynomial (zero polynomial reports 0).
pub fn degree(p: &Poly) -> usize {
    p.len().saturating_sub(1)
}

pub fn is_zero(p: &Poly) -> bool {
    p.iter().all(|c| *c == 0u32)
}

/// Drop leading zero coefficients, keeping at least one entry.
fn trim(p: &mut Poly) {
    while p.len() > 1 && *p.last().unwrap() == 0u32 {
        p.pop();
    }
    if p.is_empty() {
        p.push(Integer::new());
    }
}

/// Reduce every coefficient into `[0, n)` and shrink leading zeros.
pub fn poly_mod_n(t: &[Integer], n: &Integer) -> Poly {
    let mut out: Poly = t.iter().map(|c| c.clone().rem_euc(n)).collect();
    trim(&mut out);
    out
}

/// Schoolbook product mod n. Operand degrees are class-number sized, so no
/// fast multiplication is warranted.
pub fn poly_mulmod(a: &Poly, b: &Poly, n: &Integer) -> Poly {
    if is_zero(a) || is_zero(b) {
        return vec![Integer::new()];
    }
    let mut out = vec![Integer::new(); a.len() + b.len() - 1];
    for (i, ca) in a.iter().enumerate() {
        if *ca == 0u32 {
            continue;
        }
        for (j, cb) in b.iter().enumerate() {
            out[i + j] += Integer::from(ca * cb);
        }
    }
    poly_mod_n(&out, n)
}

/// Euclidean division: `num = quot * den + rem` with `deg rem < deg den`.
///
/// Fails with the zero-divisor witness when the leading coefficient of `den`
/// is not invertible mod n.
pub fn poly_divrem(num: &Poly, den: &Poly, n: &Integer) -> Result<(Poly, Poly), CompositeWitness> {
    let den = poly_mod_n(den, n);
    if is_zero(&den) {
        return Err(CompositeWitness(n.clone()));
    }
    let mut rem = poly_mod_n(num, n);
    let dd = degree(&den);
    if degree(&rem) < dd || is_zero(&rem) {
        return Ok((vec![Integer::new()], rem));
    }
    let lead_inv = invmod(&den[dd], n)?;
    let mut quot = vec![Integer::new(); degree(&rem) - dd + 1];
    while !is_zero(&rem) && degree(&rem) >= dd {
        let dr = degree(&rem);
        let coef = mulmod(&rem[dr], &lead_inv, n);
        quot[dr - dd] = coef.clone();
        for i in 0..=dd {
            let sub = mulmod(&coef, &den[i], n);
            rem[dr - dd + i] = Integer::from(&rem[dr - dd + i] - &sub).rem_euc(n);
        }
        trim(&mut rem);
        if dr == 0 {
            break;
        }
    }
    trim(&mut quot);
    Ok((quot, rem))
}

/// Monic gcd of two polynomials mod n.
pub fn poly_gcd(a: &Poly, b: &Poly, n: &Integer) -> Result<Poly, CompositeWitness> {
    let mut a = poly_mod_n(a, n);
    let mut b = poly_mod_n(b, n);
    while !is_zero(&b) {
        let (_, r) = poly_divrem(&a, &b, n)?;
        a = b;
        b = r;
    }
    make_monic(&mut a, n)?;
    Ok(a)
}

fn make_monic(p: &mut Poly, n: &Integer) -> Result<(), CompositeWitness> {
    if is_zero(p) {
        return Ok(());
    }
    let d = degree(p);
    if p[d] == 1u32 {
        return Ok(());
    }
    let inv = invmod(&p[d], n)?;
    for c in p.iter_mut() {
        *c = mulmod(c, &inv, n);
    }
    Ok(())
}

/// `base^e mod (modpoly, n)` by binary exponentiation.
pub fn poly_powmod(
    base: &Poly,
    e: &Integer,
    modpoly: &Poly,
    n: &Integer,
) -> Result<Poly, CompositeWitness> {
    let mut result = vec![Integer::from(1u32)];
    let (_, mut b) = poly_divrem(base, modpoly, n)?;
    let bits = e.significant_bits();
    for i in 0..bits {
        if e.get_bit(i) {
            let prod = poly_mulmod(&result, &b, n);
            result = poly_divrem(&prod, modpoly, n)?.1;
        }
        if i + 1 < bits {
            let sq = poly_mulmod(&b, &b, n);
            b = poly_divrem(&sq, modpoly, n)?.1;
        }
    }
    Ok(result)
}

/// All roots of `t` in ℤ/N, assuming N prime. If N is composite, either a
/// zero-divisor witness surfaces or the (possibly bogus) roots are caught by
/// the caller's own verification.
pub fn roots_mod_p(
    t: &[Integer],
    n: &Integer,
    ctx: &mut Context,
) -> Result<Vec<Integer>, CompositeWitness> {
    let mut t = poly_mod_n(t, n);
    if degree(&t) == 0 {
        return Ok(vec![]);
    }
    make_monic(&mut t, n)?;

    // gcd(T, x^N − x) keeps exactly the linear factors.
    let x = vec![Integer::new(), Integer::from(1u32)];
    let mut xn = poly_powmod(&x, n, &t, n)?;
    // x^N − x
    while xn.len() < 2 {
        xn.push(Integer::new());
    }
    xn[1] = Integer::from(&xn[1] - 1u32).rem_euc(n);
    trim(&mut xn);
    let linear_part = poly_gcd(&t, &xn, n)?;
    if degree(&linear_part) == 0 {
        return Ok(vec![]);
    }

    let mut roots = Vec::with_capacity(degree(&linear_part));
    split_linear(&linear_part, n, ctx, &mut roots)?;
    roots.sort();
    roots.dedup();
    Ok(roots)
}

/// Equal-degree splitting of a product of distinct linear factors.
fn split_linear(
    g: &Poly,
    n: &Integer,
    ctx: &mut Context,
    roots: &mut Vec<Integer>,
) -> Result<(), CompositeWitness> {
    match degree(g) {
        0 => Ok(()),
        1 => {
            // monic x + c0: root is -c0
            let root = Integer::from(n - &g[0]).rem_euc(n);
            roots.push(root);
            Ok(())
        }
        2 => {
            // monic x^2 + bx + c via the quadratic formula
            let b = &g[1];
            let c = &g[0];
            let disc =
                Integer::from(Integer::from(b * b) - Integer::from(4u32) * c).rem_euc(n);
            let y = match sqrtmod(&disc, n) {
                Ok(y) => y,
                // A split product of linear factors must have a square
                // discriminant; failure here means the modulus lied.
                Err(SqrtmodError::NotASquare) | Err(SqrtmodError::BadRoot) => {
                    return Err(CompositeWitness(n.clone()))
                }
            };
            let inv2 = invmod(&Integer::from(2u32), n)?;
            let negb = Integer::from(n - b).rem_euc(n);
            let r1 = mulmod(&Integer::from(&negb + &y), &inv2, n).rem_euc(n);
            let r2 = mulmod(&Integer::from(&negb - &y).rem_euc(n), &inv2, n);
            roots.push(r1);
            roots.push(r2);
            Ok(())
        }
        _ => {
            let half = Integer::from(n - 1u32) >> 1u32;
            for _ in 0..200 {
                let r = ctx.random_below(n);
                // (x + r)^((N-1)/2) − 1 splits off the factors whose roots
                // land on the residue side of the shift.
                let shifted = vec![r, Integer::from(1u32)];
                let mut h = poly_powmod(&shifted, &half, g, n)?;
                h[0] = Integer::from(&h[0] - 1u32).rem_euc(n);
                trim(&mut h);
                let d = poly_gcd(g, &h, n)?;
                let dd = degree(&d);
                if dd == 0 || dd == degree(g) {
                    continue;
                }
                let (q, _) = poly_divrem(g, &d, n)?;
                // Smaller-degree factor first.
                let (first, second) = if dd <= degree(&q) { (d, q) } else { (q, d) };
                split_linear(&first, n, ctx, roots)?;
                split_linear(&second, n, ctx, roots)?;
                return Ok(());
            }
            // Exhausted the retry budget without a split; with a prime
            // modulus this is vanishingly unlikely.
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(vals: &[i64]) -> Poly {
        vals.iter().map(|&v| Integer::from(v)).collect()
    }

    #[test]
    fn mod_n_reduces_and_trims() {
        let n = Integer::from(7u32);
        let t = poly_mod_n(&p(&[10, -3, 14]), &n);
        assert_eq!(t, p(&[3, 4])); // 14 ≡ 0 trims away
    }

    #[test]
    fn mulmod_small() {
        let n = Integer::from(97u32);
        // (x + 2)(x + 3) = x^2 + 5x + 6
        let prod = poly_mulmod(&p(&[2, 1]), &p(&[3, 1]), &n);
        assert_eq!(prod, p(&[6, 5, 1]));
    }

    #[test]
    fn divrem_exact_and_remainder() {
        let n = Integer::from(97u32);
        let num = p(&[6, 5, 1]); // (x+2)(x+3)
        let (q, r) = poly_divrem(&num, &p(&[2, 1]), &n).unwrap();
        assert_eq!(q, p(&[3, 1]));
        assert!(is_zero(&r));

        let (_, r) = poly_divrem(&p(&[1, 0, 1]), &p(&[1, 1]), &n).unwrap();
        // x^2 + 1 = (x-1)(x+1) + 2
        assert_eq!(r, p(&[2]));
    }

    #[test]
    fn divrem_surfaces_zero_divisor() {
        // Leading coefficient 7 is not invertible mod 21.
        let n = Integer::from(21u32);
        let err = poly_divrem(&p(&[1, 0, 1]), &p(&[1, 7]), &n).unwrap_err();
        assert_eq!(err.0, Integer::from(7u32));
    }

    #[test]
    fn gcd_of_shared_factor() {
        let n = Integer::from(101u32);
        // gcd((x+2)(x+3), (x+2)(x+5)) = x + 2
        let a = poly_mulmod(&p(&[2, 1]), &p(&[3, 1]), &n);
        let b = poly_mulmod(&p(&[2, 1]), &p(&[5, 1]), &n);
        let g = poly_gcd(&a, &b, &n).unwrap();
        assert_eq!(g, p(&[2, 1]));
    }

    #[test]
    fn roots_of_split_cubic() {
        let n = Integer::from(101u32);
        let mut ctx = Context::with_seed(12345);
        // (x - 2)(x - 5)(x - 11)
        let t = poly_mulmod(
            &poly_mulmod(&p(&[-2, 1]), &p(&[-5, 1]), &n),
            &p(&[-11, 1]),
            &n,
        );
        let mut roots = roots_mod_p(&t, &n, &mut ctx).unwrap();
        roots.sort();
        assert_eq!(roots, vec![Integer::from(2u32), Integer::from(5u32), Integer::from(11u32)]);
    }

    #[test]
    fn roots_ignores_irreducible_part() {
        let n = Integer::from(103u32);
        let mut ctx = Context::with_seed(99);
        // x^2 + 1 is irreducible mod 103 (103 ≡ 3 mod 4); (x - 7) splits.
        let t = poly_mulmod(&p(&[1, 0, 1]), &p(&[-7, 1]), &n);
        let roots = roots_mod_p(&t, &n, &mut ctx).unwrap();
        assert_eq!(roots, vec![Integer::from(7u32)]);
    }

    #[test]
    fn no_roots_for_irreducible() {
        let n = Integer::from(103u32);
        let mut ctx = Context::with_seed(5);
        let roots = roots_mod_p(&p(&[1, 0, 1]), &n, &mut ctx).unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn quadratic_split_via_sqrtmod() {
        let n = Integer::from(1000003u32);
        let mut ctx = Context::with_seed(7);
        // (x - 123456)(x - 654321)
        let t = poly_mulmod(&p(&[-123456, 1]), &p(&[-654321, 1]), &n);
        let mut roots = roots_mod_p(&t, &n, &mut ctx).unwrap();
        roots.sort();
        assert_eq!(
            roots,
            vec![Integer::from(123456u32), Integer::from(654321u32)]
        );
    }
}
