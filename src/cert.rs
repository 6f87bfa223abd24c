//! # Cert — Certificate Parsing and Verification
//!
//! The certificate is line-oriented text, one line per ECPP recursion level,
//! outermost first:
//!
//! ```text
//! <N> : ECPP : <a> <b> <m> <q> (<Px>:<Py>)
//! ```
//!
//! All numbers are base 10 with no leading zeros. A chain is accepted when
//! every line passes [`validate_curve`] and the links agree: line i's q is
//! line i+1's N, and the final q is small enough for BPSW to decide
//! deterministically (≤ 2⁶⁴).
//!
//! Verification is where we are allowed to be parallel: each line is an
//! independent computation, so the per-line work fans out over rayon while
//! the chain-linkage pass stays sequential. This mirrors how the prover's
//! own witness checks are re-run — nothing here trusts the prover.

use crate::bpsw::is_prob_prime;
use crate::curve::{check_point, CheckPoint, Point};
use crate::Primality;
use anyhow::{anyhow, bail, Result};
use rayon::prelude::*;
use rug::ops::RemRounding;
use rug::Integer;
use serde::{Deserialize, Serialize};

/// One parsed certificate line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofLine {
    pub n: Integer,
    pub a: Integer,
    pub b: Integer,
    pub m: Integer,
    pub q: Integer,
    pub x: Integer,
    pub y: Integer,
}

/// Parse a decimal token: digits only, no leading zeros (except "0" itself).
fn parse_num(tok: &str) -> Result<Integer> {
    if tok.is_empty() || !tok.bytes().all(|b| b.is_ascii_digit()) {
        bail!("malformed number {tok:?}");
    }
    if tok.len() > 1 && tok.starts_with('0') {
        bail!("leading zero in number {tok:?}");
    }
    Ok(Integer::parse(tok).map(Integer::from)?)
}

/// Parse certificate text into lines, enforcing the grammar strictly.
pub fn parse_certificate(text: &str) -> Result<Vec<ProofLine>> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parse = || -> Result<ProofLine> {
            let mut parts = line.splitn(3, " : ");
            let n = parse_num(parts.next().ok_or_else(|| anyhow!("missing N"))?)?;
            let tag = parts.next().ok_or_else(|| anyhow!("missing method tag"))?;
            if tag != "ECPP" {
                bail!("unsupported method {tag:?}");
            }
            let rest = parts.next().ok_or_else(|| anyhow!("missing witness data"))?;
            let mut toks = rest.split_whitespace();
            let a = parse_num(toks.next().ok_or_else(|| anyhow!("missing a"))?)?;
            let b = parse_num(toks.next().ok_or_else(|| anyhow!("missing b"))?)?;
            let m = parse_num(toks.next().ok_or_else(|| anyhow!("missing m"))?)?;
            let q = parse_num(toks.next().ok_or_else(|| anyhow!("missing q"))?)?;
            let point = toks.next().ok_or_else(|| anyhow!("missing point"))?;
            if toks.next().is_some() {
                bail!("trailing tokens");
            }
            let inner = point
                .strip_prefix('(')
                .and_then(|p| p.strip_suffix(')'))
                .ok_or_else(|| anyhow!("point not parenthesized"))?;
            let (xs, ys) = inner
                .split_once(':')
                .ok_or_else(|| anyhow!("point not colon-separated"))?;
            Ok(ProofLine {
                n,
                a,
                b,
                m,
                q,
                x: parse_num(xs)?,
                y: parse_num(ys)?,
            })
        };
        out.push(parse().map_err(|e| anyhow!("line {}: {e}", lineno + 1))?);
    }
    Ok(out)
}

/// Re-run every condition one certificate line asserts:
/// q > (⌊N^¼⌋+1)², q | m, the Hasse bound on m, P on the curve, and the
/// witness-point order test.
pub fn validate_curve(
    a: &Integer,
    b: &Integer,
    n: &Integer,
    px: &Integer,
    py: &Integer,
    m: &Integer,
    q: &Integer,
) -> bool {
    if *n < 2u32 || n.is_even() {
        return false;
    }
    // Atkin–Morain factor bound.
    let fmin = {
        let mut r = n.clone().root(4);
        r += 1u32;
        Integer::from(&r * &r)
    };
    if *q <= fmin {
        return false;
    }
    if !m.is_divisible(q) {
        return false;
    }
    // Hasse: (m − (N+1))² ≤ 4N.
    let t = Integer::from(m - &Integer::from(n + 1u32));
    if Integer::from(&t * &t) > Integer::from(n << 2u32) {
        return false;
    }
    let point = Point::new(px.clone().rem_euc(n), py.clone().rem_euc(n));
    if !point.on_curve(a, b, n) {
        return false;
    }
    check_point(&point, m, q, a, n) == CheckPoint::Success
}

/// Verify a full certificate chain for `claimed`. Lines are checked in
/// parallel; linkage and the deterministic tail are checked afterwards.
pub fn verify_certificate(claimed: &Integer, text: &str) -> Result<()> {
    let lines = parse_certificate(text)?;
    if lines.is_empty() {
        // An empty certificate is only acceptable when BPSW decides.
        if is_prob_prime(claimed) == Primality::Prime {
            return Ok(());
        }
        bail!("empty certificate for a number BPSW cannot decide");
    }
    if lines[0].n != *claimed {
        bail!("certificate opens with {} but {} was claimed", lines[0].n, claimed);
    }

    let bad: Vec<usize> = lines
        .par_iter()
        .enumerate()
        .filter(|(_, l)| !validate_curve(&l.a, &l.b, &l.n, &l.x, &l.y, &l.m, &l.q))
        .map(|(i, _)| i)
        .collect();
    if let Some(&i) = bad.first() {
        bail!("line {} fails curve validation", i + 1);
    }

    for w in lines.windows(2) {
        if w[0].q != w[1].n {
            bail!("chain break: q = {} is not the next subject {}", w[0].q, w[1].n);
        }
    }
    let tail = &lines.last().unwrap().q;
    if is_prob_prime(tail) != Primality::Prime {
        bail!("final factor {tail} is not settled by the deterministic tail");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::ecpp::ecpp_prove;

    fn int(s: &str) -> Integer {
        Integer::parse(s).map(Integer::from).unwrap()
    }

    fn sample_certificate() -> (Integer, String) {
        let mut ctx = Context::with_seed(77);
        let p = int("18446744073709551629"); // first prime above 2^64
        let (r, proof) = ecpp_prove(&p, &mut ctx, true);
        assert_eq!(r, Primality::Prime);
        (p, proof.unwrap())
    }

    #[test]
    fn roundtrip_emitted_certificate() {
        let (p, text) = sample_certificate();
        let lines = parse_certificate(&text).unwrap();
        assert!(!lines.is_empty());
        assert_eq!(lines[0].n, p);
        verify_certificate(&p, &text).unwrap();
    }

    #[test]
    fn rejects_wrong_claim() {
        let (_, text) = sample_certificate();
        let wrong = int("18446744073709551631");
        assert!(verify_certificate(&wrong, &text).is_err());
    }

    #[test]
    fn rejects_tampered_fields() {
        let (p, text) = sample_certificate();
        let mut lines = parse_certificate(&text).unwrap();
        let l = &mut lines[0];

        // m no longer divisible by q
        let good_m = l.m.clone();
        l.m += 1u32;
        assert!(!validate_curve(&l.a, &l.b, &l.n, &l.x, &l.y, &l.m, &l.q));
        l.m = good_m;

        // point off the curve
        let good_x = l.x.clone();
        l.x += 1u32;
        assert!(!validate_curve(&l.a, &l.b, &l.n, &l.x, &l.y, &l.m, &l.q));
        l.x = good_x;

        // q below the fourth-root bound
        let small_q = Integer::from(3u32);
        assert!(!validate_curve(&l.a, &l.b, &l.n, &l.x, &l.y, &l.m, &small_q));

        // untouched line still validates
        assert!(validate_curve(&l.a, &l.b, &l.n, &l.x, &l.y, &l.m, &l.q));
        assert_eq!(lines[0].n, p);
    }

    #[test]
    fn parser_enforces_grammar() {
        assert!(parse_certificate("junk").is_err());
        assert!(parse_certificate("12 : ECPP : 1 2 3 4 (5:6) extra").is_err());
        assert!(parse_certificate("12 : RSA : 1 2 3 4 (5:6)").is_err());
        assert!(parse_certificate("012 : ECPP : 1 2 3 4 (5:6)").is_err());
        assert!(parse_certificate("12 : ECPP : 1 2 3 4 (5;6)").is_err());
        // a syntactically fine line parses (semantics are not the parser's job)
        let lines = parse_certificate("12 : ECPP : 1 2 3 4 (5:6)\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].q, 4u32);
    }

    #[test]
    fn empty_certificate_only_for_deterministic_range() {
        let p = int("4294967311");
        verify_certificate(&p, "").unwrap();
        let big = int("618970019642690137449562111");
        assert!(verify_certificate(&big, "").is_err());
    }

    #[test]
    fn proof_lines_serialize_to_json() {
        let (_, text) = sample_certificate();
        let lines = parse_certificate(&text).unwrap();
        let json = serde_json::to_string(&lines).unwrap();
        let back: Vec<ProofLine> = serde_json::from_str(&json).unwrap();
        assert_eq!(lines, back);
    }
}
