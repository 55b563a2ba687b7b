//! Deterministic integer apportionment (largest-remainder method).

use crate::domain::Decimal;

/// Split `total` units across slots proportionally to `weights`.
///
/// Each slot first receives `floor(total * w / W)`; leftover units go to the
/// largest remainders, ties broken by the lower index. All-zero weights
/// allocate nothing. Callers that need `share <= weight` must pass
/// `total <= W`.
pub fn allocate_largest_remainder(total: u32, weights: &[u32]) -> Vec<u32> {
    let weight_sum: u64 = weights.iter().map(|&w| u64::from(w)).sum();
    if weight_sum == 0 || total == 0 {
        return vec![0; weights.len()];
    }

    let total = u64::from(total);
    let mut shares: Vec<u64> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(u64, usize)> = Vec::with_capacity(weights.len());
    for (idx, &w) in weights.iter().enumerate() {
        let scaled = total * u64::from(w);
        shares.push(scaled / weight_sum);
        remainders.push((scaled % weight_sum, idx));
    }

    let assigned: u64 = shares.iter().sum();
    let leftover = (total - assigned) as usize;

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, idx) in remainders.iter().take(leftover) {
        shares[idx] += 1;
    }

    shares.into_iter().map(|s| s as u32).collect()
}

/// Rescale `amounts` so they sum to `target`, a whole number of cents.
///
/// Each amount is floored to cents and the leftover cents go to the largest
/// remainders, ties broken by the lower index. Non-negative inputs therefore
/// never produce a negative share. Amounts summing to zero are returned
/// unchanged.
pub fn rescale_amounts(amounts: &[Decimal], target: Decimal) -> Vec<Decimal> {
    let current: Decimal = amounts.iter().sum();
    if current.is_zero() || amounts.is_empty() {
        return amounts.to_vec();
    }

    let mut scaled: Vec<Decimal> = Vec::with_capacity(amounts.len());
    let mut remainders: Vec<(Decimal, usize)> = Vec::with_capacity(amounts.len());
    for (idx, &amount) in amounts.iter().enumerate() {
        let exact = amount * target / current;
        let floored = exact.floor_cents();
        scaled.push(floored);
        remainders.push((exact - floored, idx));
    }

    let assigned: Decimal = scaled.iter().sum();
    let leftover = ((target - assigned) * Decimal::hundred())
        .round_dp(0)
        .floor_count() as usize;

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let cent = Decimal::one() / Decimal::hundred();
    for &(_, idx) in remainders.iter().take(leftover) {
        scaled[idx] += cent;
    }
    scaled
}
