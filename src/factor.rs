//! # Factor — Integer Factoring Cascade
//!
//! The factoring sub-methods and the two drivers built on them:
//!
//! - [`factor`]: full prime decomposition via trial peeling, perfect-power
//!   peeling, and an escalation ladder of p−1 and ECM budgets.
//! - [`check_for_factor`]: the ECPP driver's workhorse — find one *prime*
//!   factor exceeding a floor `fmin`, with budgets that grow with the
//!   backtracking stage, or strip what small factors exist and report back.
//!
//! Every sub-method returns `Option<Integer>` with the guarantee that a
//! returned factor f satisfies `1 < f < n`. Methods that internally hit the
//! trivial gcd (all factors collected at once) back up and retry at a finer
//! grain rather than reporting failure, following the reference
//! implementations of Pollard ρ and p−1 with batched gcds.
//!
//! A returned factor is *not* necessarily prime: ρ and ECM can hand back
//! composite divisors, which the drivers recurse on.

use crate::arith::{mulmod, powmod, powmod_u};
use crate::bpsw::is_prob_prime;
use crate::context::Context;
use crate::ecm::ecm_factor;
use crate::Primality;
use rug::ops::{Pow, RemRounding};
use rug::Integer;
use tracing::debug;

/// Cap on the saved-factors cache shared across one ECPP proof.
pub const MAX_SFACS: usize = 1000;

/// All primes up to `limit` by a plain odd-only sieve of Eratosthenes.
pub fn sieve_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }
    let half = (limit as usize + 1) / 2;
    let mut comp = vec![false; half]; // comp[i] marks 2i+1
    let mut primes = vec![2u64];
    let mut i = 1usize;
    while {
        let p = 2 * i + 1;
        p * p <= limit as usize
    } {
        if !comp[i] {
            let p = 2 * i + 1;
            let mut m = (p * p) / 2;
            while m < half {
                comp[m] = true;
                m += p;
            }
        }
        i += 1;
    }
    for (i, &c) in comp.iter().enumerate().skip(1) {
        if !c {
            let p = 2 * i as u64 + 1;
            if p <= limit {
                primes.push(p);
            }
        }
    }
    primes
}

/// Check the cheapest divisors 2, 3, 5, 7; below 121 there is nothing else.
fn tiny_factor(n: &Integer) -> Option<Integer> {
    for &f in &[2u32, 3, 5, 7] {
        if n.is_divisible_u(f) && *n != f {
            return Some(Integer::from(f));
        }
    }
    None
}

fn nontrivial(g: Integer, n: &Integer) -> Option<Integer> {
    if g > 1u32 && g < *n {
        Some(g)
    } else {
        None
    }
}

/// Smallest prime divisor of n up to `limit`, honoring the `f² ≤ n` cutoff.
pub fn trial_factor(n: &Integer, limit: u64) -> Option<u64> {
    if *n < 4u32 {
        return None;
    }
    if n.is_even() {
        return Some(2);
    }
    for &f in sieve_primes(limit).iter().skip(1) {
        if Integer::from(f) * f > *n {
            return None;
        }
        if f <= u32::MAX as u64 && n.is_divisible_u(f as u32) {
            return Some(f);
        }
    }
    None
}

/// Pollard ρ with Floyd cycle detection and x² + a iteration.
///
/// Differences are accumulated as a running product with one gcd per 256
/// steps; when that gcd collapses to n, the inner loop is replayed one step
/// at a time from a checkpoint to recover the individual factor.
pub fn prho_factor(n: &Integer, a: u64, rounds: u64) -> Option<Integer> {
    if let Some(f) = tiny_factor(n) {
        return Some(f);
    }
    if *n < 121u32 {
        return None;
    }
    const INNER: u64 = 256;
    let mut outer = rounds.div_ceil(INNER);
    let mut u = Integer::from(7u32);
    let mut v = Integer::from(7u32);

    while outer > 0 {
        outer -= 1;
        let old_u = u.clone();
        let old_v = v.clone();
        let mut m = Integer::from(1u32);
        for _ in 0..INNER {
            u = (Integer::from(&u * &u) + a).rem_euc(n);
            v = (Integer::from(&v * &v) + a).rem_euc(n);
            v = (Integer::from(&v * &v) + a).rem_euc(n);
            let d = Integer::from(&u - &v).abs();
            m = mulmod(&m, &d, n);
        }
        let f = Integer::from(m.gcd_ref(n));
        if f == 1u32 {
            continue;
        }
        if f == *n {
            // Several factors collapsed into one gcd; replay stepwise.
            u = old_u;
            v = old_v;
            let mut left = INNER;
            let f = loop {
                u = (Integer::from(&u * &u) + a).rem_euc(n);
                v = (Integer::from(&v * &v) + a).rem_euc(n);
                v = (Integer::from(&v * &v) + a).rem_euc(n);
                let d = Integer::from(&u - &v).abs();
                let f = d.gcd(n);
                if f != 1u32 || left == 0 {
                    break f;
                }
                left -= 1;
            };
            return nontrivial(f, n);
        }
        return Some(f);
    }
    None
}

/// Pollard ρ, Brent variant: one squaring per step and power-of-two
/// checkpoint spacing, with the same batched-gcd/backtrack discipline.
pub fn pbrent_factor(n: &Integer, a: u64, mut rounds: u64) -> Option<Integer> {
    if let Some(f) = tiny_factor(n) {
        return Some(f);
    }
    if *n < 121u32 {
        return None;
    }
    const INNER: u64 = 256;
    let mut xi = Integer::from(2u32);
    let mut xm = Integer::from(2u32);
    let mut r: u64 = 1;

    while rounds > 0 {
        let mut rleft = r.min(rounds);
        let mut save_xi = xi.clone();
        let mut f = Integer::from(1u32);
        while rleft > 0 {
            let dorounds = rleft.min(INNER);
            let mut m = Integer::from(1u32);
            save_xi = xi.clone();
            for _ in 0..dorounds {
                xi = (Integer::from(&xi * &xi) + a).rem_euc(n);
                let d = Integer::from(&xi - &xm).abs();
                m = mulmod(&m, &d, n);
            }
            rleft -= dorounds;
            rounds -= dorounds;
            f = Integer::from(m.gcd_ref(n));
            if f != 1u32 {
                break;
            }
        }
        if f == 1u32 {
            r *= 2;
            xm = xi.clone();
            continue;
        }
        if f == *n {
            xi = save_xi;
            let mut left = r;
            loop {
                xi = (Integer::from(&xi * &xi) + a).rem_euc(n);
                let d = Integer::from(&xi - &xm).abs();
                f = d.gcd(n);
                if f != 1u32 || left == 0 {
                    break;
                }
                left -= 1;
            }
            return nontrivial(f, n);
        }
        return Some(f);
    }
    None
}

/// Pollard p−1, stage 1 + standard stage 2 continuation.
///
/// Stage 1 exponentiates base 2 by prime powers up to `b1`, batching 32
/// primes between gcds with a checkpoint for one-at-a-time replay when the
/// gcd collapses. Stage 2 walks primes in (b1, b2] with one mulmod per
/// prime, drawing gap powers from a lazily-filled cache of the 111 even gaps
/// up to 222 (enough for any gap below a 189-million bound).
pub fn pminus1_factor(n: &Integer, b1: u64, b2: u64) -> Option<Integer> {
    if let Some(f) = tiny_factor(n) {
        return Some(f);
    }
    if b1 < 7 || *n < 121u32 {
        return None;
    }
    debug!(%n, b1, b2, "p-1 attempt");

    let primes = sieve_primes(b1.max(b2));
    let b1_count = primes.partition_point(|&p| p <= b1);

    // Stage 1
    let mut a = Integer::from(2u32);
    let mut save_a = a.clone();
    let mut save_idx = 0usize;
    let mut t = Integer::from(1u32);
    let mut f = Integer::from(1u32);
    for (i, &q) in primes[..b1_count].iter().enumerate() {
        let mut k = q;
        let kmax = b1 / q;
        while k <= kmax {
            k *= q;
        }
        t *= k;
        if (i + 1) % 32 == 0 {
            a = powmod(&a, &t, n);
            t = Integer::from(1u32);
            let base = if a != 0u32 {
                Integer::from(&a - 1u32)
            } else {
                Integer::from(n - 1u32)
            };
            f = base.gcd(n);
            if f == *n {
                break;
            }
            if f != 1u32 {
                return Some(f);
            }
            save_idx = i;
            save_a = a.clone();
        }
    }
    if f != *n {
        a = powmod(&a, &t, n);
        let base = if a != 0u32 {
            Integer::from(&a - 1u32)
        } else {
            Integer::from(n - 1u32)
        };
        f = base.gcd(n);
    }
    if f == *n {
        // All remaining factors were smooth at once; replay prime by prime.
        a = save_a;
        for &q in &primes[save_idx..b1_count] {
            let mut k = q;
            let kmax = b1 / q;
            while k <= kmax {
                k *= q;
            }
            a = powmod_u(&a, k, n);
            let g = Integer::from(&a - 1u32).gcd(n);
            if g == *n {
                return None;
            }
            if g != 1u32 {
                return Some(g);
            }
        }
        return None;
    }
    if f != 1u32 {
        return Some(f);
    }

    // Stage 2
    if b2 > b1 && b1_count < primes.len() {
        let bm = a.clone();
        let mut b = Integer::from(1u32);
        let mut precomp: Vec<Option<Integer>> = vec![None; 111];
        let mut bmdiff = powmod_u(&bm, 2, n);
        precomp[0] = Some(bmdiff.clone());
        for slot in precomp.iter_mut().take(22).skip(1) {
            bmdiff = mulmod(&mulmod(&bmdiff, &bm, n), &bm, n);
            *slot = Some(bmdiff.clone());
        }

        let mut i = b1_count;
        a = powmod_u(&a, primes[i], n);
        let mut j = 31u64;
        while i + 1 < primes.len() && primes[i] <= b2 {
            let gap = primes[i + 1] - primes[i];
            let slot = (gap / 2 - 1) as usize;
            let mult = if slot < 111 {
                match &precomp[slot] {
                    Some(m) => m.clone(),
                    None => {
                        let m = powmod_u(&bm, gap, n);
                        precomp[slot] = Some(m.clone());
                        m
                    }
                }
            } else {
                powmod_u(&bm, gap, n)
            };
            a = mulmod(&a, &mult, n);
            let am1 = if a != 0u32 {
                Integer::from(&a - 1u32)
            } else {
                Integer::from(n - 1u32)
            };
            b *= am1;
            if j % 2 == 0 {
                b = b.rem_euc(n);
            }
            j += 1;
            if j % 64 == 0 {
                let g = Integer::from(b.gcd_ref(n));
                if let Some(found) = nontrivial(g, n) {
                    return Some(found);
                }
            }
            i += 1;
        }
        let g = b.gcd(n);
        if let Some(found) = nontrivial(g, n) {
            return Some(found);
        }
    }
    None
}

/// Hart's One-Line Factorization with premultiplier 480.
///
/// Searches for i with `⌈√(480·n·i)⌉² − 480·n·i` a perfect square, which
/// yields a congruence of squares. Fast when n = p·q with p/q close to a
/// ratio a/b where a·b divides 480·i for small i — in particular for
/// near-balanced semiprimes.
pub fn holf_factor(n: &Integer, rounds: u64) -> Option<Integer> {
    const PREMULT: u32 = 480;
    if let Some(f) = tiny_factor(n) {
        return Some(f);
    }
    if *n < 121u32 {
        return None;
    }
    if n.is_perfect_square() {
        return Some(Integer::from(n.sqrt_ref()));
    }
    let nn = Integer::from(n * PREMULT);
    for i in 1..=rounds {
        let f = Integer::from(&nn * i);
        if f.is_perfect_square() {
            // s² = 480·n·i exactly, so gcd(s, n) splits n.
            let s = f.sqrt();
            let g = s.gcd(n);
            return nontrivial(g, n);
        }
        let s = Integer::from(f.sqrt_ref()) + 1u32;
        let m = Integer::from(&s * &s) - &f;
        if m.is_perfect_square() {
            let t = m.sqrt();
            let g = Integer::from(&s - &t).gcd(n);
            return nontrivial(g, n);
        }
    }
    None
}

enum Shanks {
    Found(Integer),
    NotFound,
    Stuck,
}

/// Core SQUFOF iteration on n ≡ 3 (mod 4).
fn shanks_mult(n: &Integer, round_cap: u64) -> Shanks {
    if *n <= 3u32 {
        return Shanks::NotFound;
    }
    if n.is_perfect_square() {
        return Shanks::Found(Integer::from(n.sqrt_ref()));
    }
    debug_assert_eq!(n.mod_u(4), 3);

    let b0 = Integer::from(n.sqrt_ref());
    let imax = Integer::from(b0.sqrt_ref())
        .to_u64()
        .map_or(round_cap, |v| (3 * v).min(round_cap));

    let mut q0 = Integer::from(1u32);
    let mut p = b0.clone();
    let mut qn = Integer::from(n - &Integer::from(&b0 * &b0));
    if qn == 0u32 {
        return Shanks::NotFound;
    }
    let mut bn = Integer::from(&b0 + &p) / &qn;

    let mut i: u64 = 0;
    loop {
        // Forward cycle until Q_n is square on an even index.
        loop {
            let t1 = p.clone();
            p = Integer::from(&bn * &qn) - &p;
            let t2 = qn.clone();
            qn = Integer::from(&q0 + &Integer::from(&bn * &Integer::from(&t1 - &p)));
            q0 = t2;
            if qn <= 0u32 {
                return Shanks::NotFound;
            }
            bn = Integer::from(&b0 + &p) / &qn;

            if i % 2 == 0 && qn.is_perfect_square() {
                i += 1;
                break;
            }
            i += 1;
            if i >= imax {
                return Shanks::NotFound;
            }
        }

        // Reduce to the principal cycle and search for the symmetry point.
        let mut s = Integer::from(qn.sqrt_ref());
        let mut ro = Integer::from(&p + &Integer::from(&s * &Integer::from(Integer::from(&b0 - &p) / &s)));
        let t = Integer::from(n - &Integer::from(&ro * &ro));
        if s == 0u32 {
            return Shanks::NotFound;
        }
        let mut so = t / &s;
        if so == 0u32 {
            return Shanks::NotFound;
        }
        let mut bbn = Integer::from(&b0 + &ro) / &so;

        let mut j: u64 = 0;
        loop {
            let t1 = ro.clone();
            ro = Integer::from(&bbn * &so) - &ro;
            let t2 = so.clone();
            so = Integer::from(&s + &Integer::from(&bbn * &Integer::from(&t1 - &ro)));
            s = t2;
            if so == 0u32 {
                return Shanks::NotFound;
            }
            bbn = Integer::from(&b0 + &ro) / &so;
            if ro == t1 {
                break;
            }
            j += 1;
            // The symmetry search gets stuck very rarely, but it happens.
            if j > 1_000_000_000 {
                return Shanks::Stuck;
            }
        }

        let g = Integer::from(ro.gcd_ref(n));
        if g > 1u32 {
            return Shanks::Found(g);
        }
    }
}

/// Shanks' SQUFOF, racing the classic sixteen multipliers. Each multiplier m
/// runs only when n·m ≡ 3 (mod 4) and 64·m³ < n.
pub fn squfof_factor(n: &Integer, rounds: u64) -> Option<Integer> {
    const MULTIPLIERS: [u32; 16] = [
        3 * 5 * 7 * 11,
        3 * 5 * 7,
        3 * 5 * 11,
        3 * 5,
        3 * 7 * 11,
        3 * 7,
        5 * 7 * 11,
        5 * 7,
        3 * 11,
        3,
        5 * 11,
        5,
        7 * 11,
        7,
        11,
        1,
    ];
    if let Some(f) = tiny_factor(n) {
        return Some(f);
    }
    if *n < 121u32 {
        return None;
    }
    let nmod4 = n.mod_u(4);

    for &mult in &MULTIPLIERS {
        // n odd: picking mult with the opposite residue makes n·m ≡ 3 mod 4.
        if nmod4 == mult % 4 {
            continue;
        }
        let guard = Integer::from(mult).pow(3) * 64u32;
        if guard >= *n {
            continue;
        }
        let nm = Integer::from(n * mult);
        match shanks_mult(&nm, rounds) {
            Shanks::Stuck => break,
            Shanks::Found(mut f) => {
                if f != mult {
                    let g = Integer::from(f.gcd_ref(&Integer::from(mult)));
                    f /= g;
                    if f > 1u32 {
                        return nontrivial(f, n);
                    }
                }
            }
            Shanks::NotFound => {}
        }
    }
    None
}

/// Exact perfect-power split: `n = r^k` with the smallest prime-power-style
/// exponent found first.
pub fn power_factor(n: &Integer) -> Option<(Integer, u32)> {
    if *n < 4u32 || !n.is_perfect_power() {
        return None;
    }
    for k in 2..=n.significant_bits() {
        let r = Integer::from(n.root_ref(k));
        if r < 2u32 {
            break;
        }
        if Integer::from((&r).pow(k)) == *n {
            return Some((r, k));
        }
    }
    None
}

/// Integration point for an external quadratic sieve, the method of choice
/// for hard 30–90 digit cofactors. No QS backend is wired into this build,
/// so the escalation ladder falls through to ECM.
pub fn qs_factor(_n: &Integer) -> Option<Integer> {
    None
}

/// Outcome of [`check_for_factor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactorSearch {
    /// A probable-prime factor strictly above the floor.
    Found(Integer),
    /// Nothing above the floor exists (m is fully small-smooth or itself
    /// a prime at or below the floor).
    NoLargeFactor,
    /// Budgets exhausted: the carried value is m stripped of all factors
    /// found so far, still composite and above the floor.
    Reduced(Integer),
}

/// Find a probable-prime factor of `inputn` strictly greater than `fmin`.
///
/// Budgets grow with `stage` (the ECPP backtracking level). Prime factors
/// discovered at stage ≥ 2 are recorded in `sfacs` and tried by divisibility
/// in later calls before any real factoring work is spent.
pub fn check_for_factor(
    inputn: &Integer,
    fmin: &Integer,
    stage: u32,
    sfacs: &mut Vec<Integer>,
    ctx: &mut Context,
) -> FactorSearch {
    let mut n = inputn.clone();
    if n <= *fmin {
        return FactorSearch::NoLargeFactor;
    }

    if stage == 1 {
        // Fast path: strip 2 and 3, then let one bigint gcd against a packed
        // product decide whether any of its primes divide n at all.
        // 2850092245 = 5·7·11·13·17·19·41·43, 2392308223 = 23·29·31·37·53·59.
        while n.is_divisible_u(2) {
            n.div_exact_u_mut(2);
        }
        while n.is_divisible_u(3) {
            n.div_exact_u_mut(3);
        }
        if Integer::from(n.gcd_ref(&Integer::from(2850092245u32))) != 1u32 {
            for p in [5u32, 7, 11, 13, 17, 19, 41, 43] {
                while n.is_divisible_u(p) {
                    n.div_exact_u_mut(p);
                }
            }
        }
        if Integer::from(n.gcd_ref(&Integer::from(2392308223u32))) != 1u32 {
            for p in [23u32, 29, 31, 37, 53, 59] {
                while n.is_divisible_u(p) {
                    n.div_exact_u_mut(p);
                }
            }
        }
    }

    // Per-prime strip of everything below 3000.
    for &tf in sieve_primes(3000).iter() {
        if Integer::from(tf) * tf > n {
            break;
        }
        if tf <= u32::MAX as u64 {
            while n.is_divisible_u(tf as u32) {
                n.div_exact_u_mut(tf as u32);
            }
        }
    }

    let mut sfaci = 0usize;
    loop {
        if n <= *fmin {
            return FactorSearch::NoLargeFactor;
        }
        if is_prob_prime(&n) != Primality::Composite {
            return if n > *fmin {
                FactorSearch::Found(n)
            } else {
                FactorSearch::NoLargeFactor
            };
        }

        let b1 = 300 + 3 * n.significant_bits() as u64;
        let mut found: Option<Integer> = None;
        if stage >= 1 {
            // Push harder up front: avoids backtracking and keeps later
            // class polynomial degrees down.
            found = pminus1_factor(&n, b1, 10 * b1);
        }
        // Factors remembered from earlier stage-2+ work are free to test.
        while found.is_none() && sfaci < sfacs.len() {
            if sfacs[sfaci] < n && n.is_divisible(&sfacs[sfaci]) {
                found = Some(sfacs[sfaci].clone());
            }
            sfaci += 1;
        }
        if stage > 1 && found.is_none() {
            found = match stage {
                2 => pminus1_factor(&n, 5 * b1, 100 * b1)
                    .or_else(|| ecm_factor(&n, 250, 4, ctx)),
                3 => pminus1_factor(&n, 25 * b1, 500 * b1)
                    .or_else(|| ecm_factor(&n, 500, 4, ctx)),
                4 => pminus1_factor(&n, 200 * b1, 4000 * b1)
                    .or_else(|| ecm_factor(&n, 1000, 10, ctx)),
                s => {
                    let b = 8000u64 * (s as u64 - 4).pow(3);
                    ecm_factor(&n, b, 5 + s, ctx)
                }
            };
        }

        match found {
            Some(f) => {
                debug_assert!(f != 1u32 && f != n, "factoring returned a trivial divisor");
                if stage > 1 && sfacs.len() < MAX_SFACS && !sfacs.contains(&f) {
                    sfacs.push(f.clone());
                }
                if f > *fmin && is_prob_prime(&f) != Primality::Composite {
                    return FactorSearch::Found(f);
                }
                n.div_exact_mut(&f);
            }
            None => break,
        }
    }
    // n is above the floor and still composite.
    FactorSearch::Reduced(n)
}

/// One non-trivial factor of a composite m, escalating budgets until a split
/// lands. Never returns a trivial divisor.
fn find_one_factor(m: &Integer, ctx: &mut Context) -> Integer {
    // Word-sized composites fall to ρ/SQUFOF almost immediately.
    if m.significant_bits() <= 63 {
        if let Some(f) = pbrent_factor(m, 3, 512 * 1024) {
            return f;
        }
        if let Some(f) = prho_factor(m, 5, 512 * 1024) {
            return f;
        }
        if let Some(f) = squfof_factor(m, 1 << 22) {
            return f;
        }
    }

    let digits = m.to_string().len();
    if let Some(f) = pminus1_factor(m, 10_000, 100_000) {
        return f;
    }
    if let Some(f) = ecm_factor(m, 150, 50, ctx) {
        return f;
    }
    if let Some(f) = ecm_factor(m, 500, 30, ctx) {
        return f;
    }
    if let Some(f) = ecm_factor(m, 2_000, 10, ctx) {
        return f;
    }
    if let Some(f) = pminus1_factor(m, 200_000, 2_000_000) {
        return f;
    }

    // Size-tuned ECM before surrendering to the geometric tail.
    let mut b1 = match digits {
        0..=29 => 10_000u64,
        30..=44 => 50_000,
        45..=59 => 250_000,
        _ => 1_000_000,
    };
    if let Some(f) = ecm_factor(m, b1, 20, ctx) {
        return f;
    }
    if (30..91).contains(&digits) {
        if let Some(f) = qs_factor(m) {
            return f;
        }
    }
    loop {
        b1 *= 2;
        debug!(b1, "escalating ECM");
        if let Some(f) = ecm_factor(m, b1, 20, ctx) {
            return f;
        }
    }
}

/// Full prime decomposition of n ≥ 0, in non-decreasing order. By
/// convention 0 and 1 decompose to themselves.
pub fn factor(n: &Integer, ctx: &mut Context) -> Vec<Integer> {
    if *n < 4u32 {
        return vec![n.clone()];
    }
    let mut out: Vec<Integer> = Vec::new();
    let mut n = n.clone();

    // Peel small primes first.
    for &p in sieve_primes(10_000).iter() {
        if n == 1u32 {
            break;
        }
        while n.is_divisible_u(p as u32) {
            out.push(Integer::from(p));
            n.div_exact_u_mut(p as u32);
        }
    }

    let mut pending = Vec::new();
    if n > 1u32 {
        pending.push(n);
    }
    while let Some(m) = pending.pop() {
        if m == 1u32 {
            continue;
        }
        if is_prob_prime(&m) != Primality::Composite {
            out.push(m);
            continue;
        }
        if let Some((root, k)) = power_factor(&m) {
            for _ in 0..k {
                pending.push(root.clone());
            }
            continue;
        }
        let f = find_one_factor(&m, ctx);
        let rest = Integer::from(&m / &f);
        pending.push(f);
        pending.push(rest);
    }

    out.sort();
    out
}
