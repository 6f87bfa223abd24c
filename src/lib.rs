//! # Primacert — Core Library
//!
//! Arbitrary-precision primality proving and integer factoring built on GMP
//! (via `rug`). The centerpiece is an ECPP ("Atkin–Morain") prover that
//! produces line-oriented certificates; around it sit the probable-prime
//! gate (BPSW), a cascade of factoring methods, and the certificate
//! verifier.
//!
//! ## Module Organization
//!
//! **Arithmetic primitives**:
//! - [`arith`] — modular kernel: `mulmod`, `powmod`, `invmod`, `jacobi`,
//!   `sqrtmod` (Tonelli–Shanks), and the zero-divisor witness type
//! - [`poly`] — polynomials mod N, root finding via `gcd(T, x^N − x)`
//! - [`curve`] — affine elliptic curve ops over ℤ/N with factor reporting
//!
//! **Primality tests**:
//! - [`bpsw`] — Miller–Rabin base 2 + strong Lucas–Selfridge (deterministic
//!   to 2⁶⁴), extra-strong Lucas, random-base Miller–Rabin
//! - [`bls`] — BLS75 N−1 quick prover (non-certifying gate)
//! - [`ecpp`] — the FAS ECPP recursion driver and certificate emitter
//!
//! **Factoring**:
//! - [`factor`] — trial, Pollard ρ (Floyd and Brent), two-stage p−1, Hart
//!   OLF, SQUFOF, perfect powers, the escalation ladder, `check_for_factor`
//! - [`ecm`] — Montgomery-curve ECM with Suyama parametrization
//!
//! **Supporting data and plumbing**:
//! - [`classpoly`] — static discriminant/class-polynomial dataset
//! - [`cornacchia`] — the 4N norm-equation solver
//! - [`cert`] — certificate grammar, parsing, parallel verification
//! - [`context`] — seeded PRNG + verbosity, threaded explicitly
//!
//! ## Design Philosophy
//!
//! The prover is single-threaded and synchronous: every public call runs to
//! completion, with all probabilistic state in an explicit [`Context`]
//! value rather than process globals. Arithmetic on a modulus that is
//! secretly composite is never an "error" — non-invertible denominators
//! propagate as composite witnesses and collapse a proof attempt into the
//! correct COMPOSITE verdict. Verification (the consumer side) is where
//! parallelism lives.

pub mod arith;
pub mod bls;
pub mod bpsw;
pub mod cert;
pub mod classpoly;
pub mod context;
pub mod cornacchia;
pub mod curve;
pub mod ecm;
pub mod ecpp;
pub mod factor;
pub mod poly;

pub use arith::CompositeWitness;
pub use context::Context;

use rug::Integer;
use std::fmt;
use tracing::debug;

/// Three-valued primality verdict, numerically 0 / 1 / 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Primality {
    Composite,
    /// Probable prime: no compositeness witness found, no proof completed.
    Probable,
    /// Proven (or, below 2⁶⁴, deterministically tested) prime.
    Prime,
}

impl Primality {
    /// The conventional numeric code: 0 composite, 1 probable, 2 prime.
    pub fn code(self) -> u8 {
        match self {
            Primality::Composite => 0,
            Primality::Probable => 1,
            Primality::Prime => 2,
        }
    }
}

impl fmt::Display for Primality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Primality::Composite => "composite",
            Primality::Probable => "probably prime",
            Primality::Prime => "prime",
        };
        f.write_str(s)
    }
}

/// Rejected input at the string boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidInput(pub String);

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input: {}", self.0)
    }
}

impl std::error::Error for InvalidInput {}

/// Parse a non-negative decimal string. Empty strings, signs, leading
/// zeros, and non-digits are rejected here so the core never sees them.
pub fn parse_decimal(s: &str) -> Result<Integer, InvalidInput> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidInput(format!("{s:?} is not a non-negative integer")));
    }
    if s.len() > 1 && s.starts_with('0') {
        return Err(InvalidInput(format!("{s:?} has a leading zero")));
    }
    Integer::parse(s)
        .map(Integer::from)
        .map_err(|e| InvalidInput(e.to_string()))
}

/// BPSW probable-prime test: 0 composite, 2 prime (deterministic ≤ 2⁶⁴),
/// 1 probable prime above.
pub fn is_prob_prime(n: &Integer) -> Primality {
    bpsw::is_prob_prime(n)
}

/// BPSW plus extra random-base Miller–Rabin (2–5 rounds by size) and, for
/// inputs of at most 200 bits, a quick BLS75 N−1 proof attempt.
pub fn is_prime(n: &Integer) -> Primality {
    let mut ctx = Context::new();
    is_prime_with(n, &mut ctx)
}

/// [`is_prime`] with an injected context (reproducible runs, tests).
pub fn is_prime_with(n: &Integer, ctx: &mut Context) -> Primality {
    let mut verdict = bpsw::is_prob_prime(n);
    if verdict == Primality::Probable {
        let bits = n.significant_bits();
        let ntests = if bits < 80 {
            5
        } else if bits < 115 {
            4
        } else if bits < 200 {
            3
        } else {
            2
        };
        if !bpsw::miller_rabin_random(n, ntests, ctx) {
            return Primality::Composite;
        }
        if bits <= 200 {
            verdict = bls::bls75_nm1(n, 1);
        }
    }
    verdict
}

/// Prove primality. Returns the verdict and, when `want_proof` is set and
/// the verdict is [`Primality::Prime`], the ECPP certificate text (empty
/// when the input is small enough for the deterministic BPSW tail).
pub fn is_provable_prime(n: &Integer, want_proof: bool) -> (Primality, Option<String>) {
    let mut ctx = Context::new();
    is_provable_prime_with(n, want_proof, &mut ctx)
}

/// [`is_provable_prime`] with an injected context.
pub fn is_provable_prime_with(
    n: &Integer,
    want_proof: bool,
    ctx: &mut Context,
) -> (Primality, Option<String>) {
    match bpsw::is_prob_prime(n) {
        Primality::Composite => return (Primality::Composite, None),
        Primality::Prime => return (Primality::Prime, want_proof.then(String::new)),
        Primality::Probable => {}
    }
    // Proving a composite is extremely slow; spend two more MR rounds first.
    if !bpsw::miller_rabin_random(n, 2, ctx) {
        return (Primality::Composite, None);
    }
    // The N−1 gate is consulted only when no certificate is requested: the
    // certificate grammar stays pure ECPP.
    if !want_proof && bls::bls75_nm1(n, 2) == Primality::Prime {
        debug!(%n, "settled by the N-1 gate");
        return (Primality::Prime, None);
    }
    ecpp::ecpp_prove(n, ctx, want_proof)
}

/// Full prime decomposition, non-decreasing. 0 and 1 factor to themselves.
pub fn factor(n: &Integer) -> Vec<Integer> {
    let mut ctx = Context::new();
    factor::factor(n, &mut ctx)
}

/// Miller–Rabin to a fixed base a ≥ 2.
pub fn miller_rabin(n: &Integer, a: &Integer) -> bool {
    bpsw::miller_rabin(n, a)
}

/// Miller–Rabin with `count` random bases.
pub fn miller_rabin_random(n: &Integer, count: u32) -> bool {
    let mut ctx = Context::new();
    bpsw::miller_rabin_random(n, count, &mut ctx)
}

/// Strong Lucas–Selfridge test (the Lucas half of BPSW).
pub fn is_strong_lucas_pseudoprime(n: &Integer) -> bool {
    bpsw::is_strong_lucas_pseudoprime(n)
}

/// Re-run the ECPP point test for one certificate line's worth of data.
pub fn ecpp_validate_curve(
    a: &Integer,
    b: &Integer,
    n: &Integer,
    px: &Integer,
    py: &Integer,
    m: &Integer,
    q: &Integer,
) -> bool {
    cert::validate_curve(a, b, n, px, py, m, q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_boundary() {
        assert!(parse_decimal("0").is_ok());
        assert!(parse_decimal("18446744073709551629").is_ok());
        assert!(parse_decimal("  42  ").is_ok());
        for bad in ["", "-5", "+5", "12a", "0x10", "007", " "] {
            assert!(parse_decimal(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn primality_codes() {
        assert_eq!(Primality::Composite.code(), 0);
        assert_eq!(Primality::Probable.code(), 1);
        assert_eq!(Primality::Prime.code(), 2);
    }

    #[test]
    fn facade_agrees_on_small_values() {
        let mut ctx = Context::with_seed(9);
        for (v, expect) in [
            (0u64, Primality::Composite),
            (1, Primality::Composite),
            (2, Primality::Prime),
            (7, Primality::Prime),
            (9, Primality::Composite),
            (104729, Primality::Prime),
        ] {
            let n = Integer::from(v);
            assert_eq!(is_prob_prime(&n), expect, "is_prob_prime({v})");
            assert_eq!(is_prime_with(&n, &mut ctx), expect, "is_prime({v})");
        }
    }

    #[test]
    fn is_prime_upgrades_small_probables() {
        // 2^89-1 is 89 bits: BPSW says Probable, the N-1 gate proves it.
        let p = parse_decimal("618970019642690137449562111").unwrap();
        let mut ctx = Context::with_seed(10);
        assert_eq!(is_prime_with(&p, &mut ctx), Primality::Prime);
    }

    #[test]
    fn provable_prime_without_proof_text() {
        let p = parse_decimal("18446744073709551629").unwrap();
        let mut ctx = Context::with_seed(11);
        let (r, proof) = is_provable_prime_with(&p, false, &mut ctx);
        assert_eq!(r, Primality::Prime);
        assert!(proof.is_none());
    }

    #[test]
    fn provable_prime_certificate_verifies() {
        let p = parse_decimal("618970019642690137449562111").unwrap();
        let mut ctx = Context::with_seed(12);
        let (r, proof) = is_provable_prime_with(&p, true, &mut ctx);
        assert_eq!(r, Primality::Prime);
        let text = proof.expect("certificate requested");
        cert::verify_certificate(&p, &text).unwrap();
    }

    #[test]
    fn provable_prime_rejects_composite() {
        let n = parse_decimal("3825123056546413051").unwrap();
        let mut ctx = Context::with_seed(13);
        let (r, proof) = is_provable_prime_with(&n, true, &mut ctx);
        assert_eq!(r, Primality::Composite);
        assert!(proof.is_none());
    }
}
