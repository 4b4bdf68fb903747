use rust_decimal::Decimal;

/// Flat fee per delivery, in currency units.
pub const BASE_AMOUNT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
/// Share of the order total paid to the agent (0.02).
pub const PERCENTAGE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Commission earned by the delivering agent, rounded to cents.
pub fn agent_earnings(total_amount: Decimal) -> Decimal {
    (BASE_AMOUNT + total_amount * PERCENTAGE).round_dp(2)
}
