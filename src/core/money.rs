use rust_decimal::Decimal;

/// Fractional digits of every stored amount column (`DECIMAL(20, 4)`).
///
/// MySQL rounds extra digits on write instead of failing, so amounts are
/// checked against this before they reach a repository.
pub const MONEY_SCALE: u32 = 4;

/// Fractional digits of the accumulated order subtotal (`DECIMAL(28, 8)`).
///
/// A line total is a 4-digit price times a 4-digit discount rate times a whole
/// quantity, so it never needs more than this.
pub const SUBTOTAL_SCALE: u32 = 8;

/// Validates that an amount fits a money column
pub fn validate_scale(field: &str, amount: Decimal) -> Result<(), String> {
    validate_scale_within(field, amount, MONEY_SCALE)
}

/// Validates that an amount has at most `max_scale` decimal places
pub fn validate_scale_within(field: &str, amount: Decimal, max_scale: u32) -> Result<(), String> {
    // 1.50000 carries scale 5 but stores exactly
    let scale = amount.normalize().scale();
    if scale > max_scale {
        return Err(format!(
            "{} must have at most {} decimal places, got {}",
            field, max_scale, amount
        ));
    }
    Ok(())
}

/// Sum that reports overflow instead of panicking
pub fn checked_sum<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}
