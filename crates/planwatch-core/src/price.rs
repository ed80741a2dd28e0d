//! Price drift detection between an accepted trade and a refreshed plan.

use crate::models::Amount;

/// Output drop, in basis points, tolerated as ordinary quote jitter.
pub const PRICE_CHANGE_THRESHOLD_BPS: u128 = 100;

const BPS_DENOMINATOR: u128 = 10_000;

/// Returns true when the refreshed output is worse than the original by more
/// than [`PRICE_CHANGE_THRESHOLD_BPS`], meaning the user has to accept the
/// new trade before execution continues.
///
/// ```rust
/// use planwatch_core::{models::Amount, price::require_accept_new_trade};
///
/// let original = Amount::new(100_000_000);
/// assert!(!require_accept_new_trade(original, Amount::new(105_000_000)));
/// assert!(!require_accept_new_trade(original, Amount::new(99_500_000)));
/// assert!(require_accept_new_trade(original, Amount::new(98_000_000)));
/// ```
pub fn require_accept_new_trade(original_output: Amount, new_output: Amount) -> bool {
    let (original, new) = (original_output.get(), new_output.get());
    if new >= original {
        return false;
    }
    let drop = original - new;
    // drop / original > threshold / denominator, without dividing
    match (
        drop.checked_mul(BPS_DENOMINATOR),
        original.checked_mul(PRICE_CHANGE_THRESHOLD_BPS),
    ) {
        (Some(lhs), Some(rhs)) => lhs > rhs,
        _ => drop > original / BPS_DENOMINATOR * PRICE_CHANGE_THRESHOLD_BPS,
    }
}
