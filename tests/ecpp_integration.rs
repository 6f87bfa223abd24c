//! End-to-end scenarios: prove, emit, re-verify.
//!
//! These exercise the full pipeline the way a caller would: BPSW gate,
//! ECPP chain construction, certificate emission, and independent
//! re-verification of every line.

use primacert::{cert, is_prob_prime, is_provable_prime_with, Context, Primality};
use rug::ops::Pow;
use rug::Integer;

fn int(s: &str) -> Integer {
    Integer::parse(s).map(Integer::from).unwrap()
}

#[test]
fn ten_to_49_plus_9_is_probably_prime() {
    let n = Integer::from(10u32).pow(49) + 9u32;
    assert_ne!(is_prob_prime(&n), Primality::Composite);
}

#[test]
fn prove_first_prime_above_word_range() {
    let mut ctx = Context::with_seed(2024);
    let p = int("18446744073709551629");
    let (verdict, proof) = is_provable_prime_with(&p, true, &mut ctx);
    assert_eq!(verdict, Primality::Prime);
    cert::verify_certificate(&p, &proof.unwrap()).unwrap();
}

#[test]
fn prove_ten_to_49_plus_9_with_certificate() {
    let mut ctx = Context::with_seed(49);
    let p = Integer::from(10u32).pow(49) + 9u32;
    let (verdict, proof) = is_provable_prime_with(&p, true, &mut ctx);
    assert_eq!(verdict, Primality::Prime, "10^49+9 is prime");
    let text = proof.expect("certificate requested");
    assert!(!text.is_empty(), "a 49-digit prime needs a real chain");

    // Every line independently, then the chain as a whole.
    let lines = cert::parse_certificate(&text).unwrap();
    assert_eq!(lines[0].n, p);
    for l in &lines {
        assert!(
            primacert::ecpp_validate_curve(&l.a, &l.b, &l.n, &l.x, &l.y, &l.m, &l.q),
            "line for N = {} fails validation",
            l.n
        );
    }
    cert::verify_certificate(&p, &text).unwrap();
}

#[test]
fn certificates_chain_downward() {
    let mut ctx = Context::with_seed(7);
    let p = int("618970019642690137449562111"); // 2^89 − 1
    let (verdict, proof) = is_provable_prime_with(&p, true, &mut ctx);
    assert_eq!(verdict, Primality::Prime);
    let lines = cert::parse_certificate(&proof.unwrap()).unwrap();
    // Subjects strictly decrease and each q links to the next subject.
    for w in lines.windows(2) {
        assert_eq!(w[0].q, w[1].n);
        assert!(w[1].n < w[0].n);
    }
    // The tail is in deterministic BPSW range.
    let tail = &lines.last().unwrap().q;
    assert_eq!(is_prob_prime(tail), Primality::Prime);
}

#[test]
fn composite_with_no_small_factor_is_rejected() {
    let mut ctx = Context::with_seed(99);
    // Strong pseudoprime to bases 2..23; ECPP must return composite and
    // discard any in-progress proof.
    let n = int("3825123056546413051");
    let (verdict, proof) = is_provable_prime_with(&n, true, &mut ctx);
    assert_eq!(verdict, Primality::Composite);
    assert!(proof.is_none());
    assert_eq!(primacert::is_prime(&n), Primality::Composite);
}

#[test]
fn factor_scenario_product_and_order() {
    // A 20-digit mix of small and large factors.
    let n = Integer::from(2u32).pow(4)
        * Integer::from(3u32)
        * Integer::from(104729u32)
        * int("10000000019");
    let factors = primacert::factor(&n);
    let mut prod = Integer::from(1u32);
    for f in &factors {
        assert_ne!(is_prob_prime(f), Primality::Composite, "{f} must be prime");
        prod *= f;
    }
    assert_eq!(prod, n);
    assert_eq!(factors.len(), 7);
}
