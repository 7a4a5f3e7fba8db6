//! USD amounts. Amounts travel as `f64` dollars; budget checks run on
//! integer cents so a stack can never cost more than its budget.

/// Upper bound for any monthly budget or price accepted at the edge.
pub const MAX_MONTHLY_AMOUNT: f64 = 1_000_000.0;

const MAX_CENTS: i64 = 100_000_000;

/// Budget in whole cents, rounded down so that `from_cents` of the result
/// never exceeds `budget`.
pub fn budget_cents(budget: f64) -> i64 {
    if !budget.is_finite() || budget <= 0.0 {
        return 0;
    }

    let mut cents = (budget * 100.0).round().min(MAX_CENTS as f64) as i64;
    while cents > 0 && from_cents(cents) > budget {
        cents -= 1;
    }
    cents
}

/// Price in whole cents, rounded up so that a sub-cent price is never
/// undercharged. Non-finite or oversized prices become unaffordable.
pub fn price_cents(price: f64) -> i64 {
    if !price.is_finite() || price > MAX_MONTHLY_AMOUNT {
        return i64::MAX;
    }
    if price <= 0.0 {
        return 0;
    }

    let mut cents = (price * 100.0).round() as i64;
    if from_cents(cents) < price {
        cents += 1;
    }
    cents
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn is_whole_cents(amount: f64) -> bool {
    amount.is_finite() && from_cents((amount * 100.0).round() as i64) == amount
}
