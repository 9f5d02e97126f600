//! Number theory helpers behind the `fibonacci`, `prime`, `lcm` and `hcf`
//! operations. All pure and allocation-light.

/// First `n` Fibonacci terms starting from F(0) = 0.
///
/// Returns `None` when a term would not fit in `u128`, which happens for
/// any `n` above 187. The loop stops at that point, so huge `n` is cheap.
pub fn fibonacci(n: u64) -> Option<Vec<u128>> {
    let mut terms: Vec<u128> = Vec::new();
    for i in 0..n {
        let next = match i {
            0 => 0,
            1 => 1,
            _ => {
                let len = terms.len();
                terms[len - 1].checked_add(terms[len - 2])?
            }
        };
        terms.push(next);
    }
    Some(terms)
}

/// Trial division up to the square root.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let n_wide = u128::from(n);
    let mut divisor: u64 = 3;
    while u128::from(divisor) * u128::from(divisor) <= n_wide {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Euclid. `gcd(a, 0) == a`.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Pairwise LCM; zero if either side is zero, `None` on overflow.
pub fn lcm(a: u128, b: u128) -> Option<u128> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Left fold of [`lcm`] over absolute values.
pub fn lcm_of(values: &[i128]) -> Option<u128> {
    values
        .iter()
        .map(|v| v.unsigned_abs())
        .try_fold(1, lcm)
}

/// Left fold of [`gcd`] over absolute values.
///
/// Signs are dropped before folding, so both this and [`lcm_of`] are never
/// negative: `hcf_of(&[12, -18]) == 6`.
pub fn hcf_of(values: &[i128]) -> u128 {
    values.iter().map(|v| v.unsigned_abs()).fold(0, gcd)
}
