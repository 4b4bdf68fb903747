//! Arithmetic on a credit line. Callers hold the account row lock while
//! applying the result.

use rust_decimal::Decimal;

use crate::{
    entity::enums::CreditStatus,
    error::{AppError, AppResult},
};

pub fn available(credit_limit: Decimal, credit_used: Decimal) -> Decimal {
    (credit_limit - credit_used).max(Decimal::ZERO)
}

/// New `credit_used` after reserving `amount` against an account.
pub fn reserve(
    status: CreditStatus,
    credit_limit: Decimal,
    credit_used: Decimal,
    amount: Decimal,
) -> AppResult<Decimal> {
    if status != CreditStatus::Approved {
        return Err(AppError::CreditNotApproved);
    }
    let available = available(credit_limit, credit_used);
    if amount > available {
        return Err(AppError::InsufficientCredit {
            available,
            required: amount,
        });
    }
    Ok(credit_used + amount)
}

/// Money columns hold cents; finer amounts would be rounded away on write.
fn fits_cents(amount: Decimal) -> bool {
    amount.normalize().scale() <= 2
}

/// A repayment must be positive and expressible in cents.
pub fn check_amount(amount: Decimal) -> AppResult<()> {
    if amount <= Decimal::ZERO || !fits_cents(amount) {
        return Err(AppError::InvalidAmount);
    }
    Ok(())
}

/// New `credit_used` after a repayment of `amount`.
pub fn settle(credit_used: Decimal, amount: Decimal) -> AppResult<Decimal> {
    check_amount(amount)?;
    if amount > credit_used {
        return Err(AppError::ExceedsUsed);
    }
    Ok(credit_used - amount)
}

/// Give back a reservation when the order it backed is rejected. Partial
/// settlements may already have reduced `credit_used`, so this floors at zero.
pub fn release(credit_used: Decimal, amount: Decimal) -> Decimal {
    (credit_used - amount).max(Decimal::ZERO)
}

/// Validate a limit for (re-)approval against what is already drawn.
pub fn check_limit(credit_limit: Decimal, credit_used: Decimal) -> AppResult<()> {
    if credit_limit <= Decimal::ZERO {
        return Err(AppError::InvalidRequest(
            "creditLimit must be greater than 0".into(),
        ));
    }
    if !fits_cents(credit_limit) {
        return Err(AppError::InvalidRequest(
            "creditLimit cannot have more than two decimals".into(),
        ));
    }
    if credit_limit < credit_used {
        return Err(AppError::InvalidRequest(format!(
            "creditLimit {credit_limit} is below outstanding credit {credit_used}"
        )));
    }
    Ok(())
}
