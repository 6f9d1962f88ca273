use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, TermsViolation};
use crate::terms::{LoanTerms, RepaymentMethod, check_terms};

/// Represents the payment details for a single month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based period index.
    pub month: u32,
    /// The portion of the payment that goes towards reducing the principal.
    pub principal_component: Decimal,
    /// The portion of the payment that covers interest.
    pub interest_component: Decimal,
    /// `principal_component + interest_component`.
    pub payment: Decimal,
    /// The outstanding principal after the payment, never below zero.
    pub remaining_balance: Decimal,
}

/// A complete repayment schedule together with its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub method: RepaymentMethod,
    /// The amount financed.
    pub principal: Decimal,
    /// The first period's payment. Constant for declining balance; for flat
    /// rate later payments are smaller, see [`AmortizationResult::last_payment`].
    pub monthly_payment: Decimal,
    /// Sum of the interest component of every period.
    pub total_interest: Decimal,
    /// `principal + total_interest`.
    pub total_repayment: Decimal,
    /// One entry per month, in order.
    pub schedule: Vec<ScheduleEntry>,
}

impl AmortizationResult {
    /// The payment due in the final period.
    pub fn last_payment(&self) -> Decimal {
        self.schedule
            .last()
            .map(|entry| entry.payment)
            .unwrap_or_default()
    }

    /// `total_repayment` spread evenly over the term.
    pub fn average_payment(&self) -> Decimal {
        if self.schedule.is_empty() {
            return Decimal::ZERO;
        }
        self.total_repayment / Decimal::from(self.schedule.len())
    }

    /// The outstanding balance after the last payment.
    pub fn final_balance(&self) -> Decimal {
        self.schedule
            .last()
            .map(|entry| entry.remaining_balance)
            .unwrap_or(self.principal)
    }
}

/// Builds the full repayment schedule for a set of loan terms.
///
/// This is the single entry point used by both the loan application flow and
/// the simulator. The terms are validated before anything is computed, so the
/// result is either complete or an [`AmortizationError::InvalidTerms`].
///
/// No currency rounding is applied; callers round for display.
///
/// # Errors
///
/// Returns an error if the principal is not positive, the duration is zero,
/// the rate is negative, or an amount in the schedule overflows a `Decimal`.
pub fn compute(terms: &LoanTerms) -> Result<AmortizationResult, AmortizationError> {
    if let Err(err) = terms.validate() {
        tracing::debug!(
            principal = %terms.principal,
            rate = %terms.annual_interest_rate_percent,
            months = terms.duration_months,
            violation = %err.violation(),
            "rejected loan terms"
        );
        return Err(err);
    }

    let monthly_rate = terms.monthly_rate();
    let result = match terms.method {
        RepaymentMethod::DecliningBalance => {
            declining_balance(terms.principal, monthly_rate, terms.duration_months)
        }
        RepaymentMethod::FlatRate => flat_rate(terms.principal, monthly_rate, terms.duration_months),
    }?;

    tracing::debug!(
        method = %result.method,
        principal = %result.principal,
        months = terms.duration_months,
        monthly_payment = %result.monthly_payment,
        total_interest = %result.total_interest,
        "computed amortization schedule"
    );

    Ok(result)
}

/// Computes the constant payment of an annuity.
///
/// The formula is: PMT = P * [i(1 + i)^n] / [(1 + i)^n – 1], evaluated as
/// `P * i * (f / (f - 1))` with `f = (1 + i)^n` so long terms stay inside the
/// `Decimal` range. A zero rate degrades to `P / n`.
///
/// # Errors
///
/// Returns an error if the inputs are invalid or the payment does not fit in a
/// `Decimal`.
pub fn annuity_payment(
    principal: Decimal,
    monthly_rate: Decimal,
    months: u32,
) -> Result<Decimal, AmortizationError> {
    check_terms(principal, monthly_rate, months)?;

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let growth = fits(dec!(1).checked_add(monthly_rate))?;
    let growth = fits(growth.checked_powu(months.into()))?;
    // `growth - 1` is at least one unit in the last place for any positive rate.
    let ratio = fits(growth.checked_div(growth - dec!(1)))?;

    fits(principal.checked_mul(monthly_rate).and_then(|p| p.checked_mul(ratio)))
}

/// Calculates the schedule using the declining balance (annuity) method.
///
/// The payment is fixed; each month the interest on the outstanding balance is
/// taken out of it first and the rest reduces the principal.
///
/// # Arguments
///
/// * `principal` - The amount financed.
/// * `monthly_rate` - The monthly interest rate as a decimal (not percentage).
/// * `months` - The number of payments.
///
/// # Errors
///
/// Returns an error if the inputs are invalid or any amount overflows.
pub fn declining_balance(
    principal: Decimal,
    monthly_rate: Decimal,
    months: u32,
) -> Result<AmortizationResult, AmortizationError> {
    let monthly_payment = annuity_payment(principal, monthly_rate, months)?;

    let mut balance = principal;
    let mut total_interest = dec!(0);
    let mut schedule = Vec::with_capacity(months as usize);

    for month in 1..=months {
        let interest = fits(balance.checked_mul(monthly_rate))?;
        let principal_component = fits(monthly_payment.checked_sub(interest))?;
        balance = fits(balance.checked_sub(principal_component))?;
        total_interest = fits(total_interest.checked_add(interest))?;
        schedule.push(ScheduleEntry {
            month,
            principal_component,
            interest_component: interest,
            payment: monthly_payment,
            remaining_balance: balance.max(dec!(0)),
        });
    }

    Ok(AmortizationResult {
        method: RepaymentMethod::DecliningBalance,
        principal,
        monthly_payment,
        total_interest,
        total_repayment: fits(principal.checked_add(total_interest))?,
        schedule,
    })
}

/// Calculates the schedule using the flat rate method.
///
/// The principal portion is constant (`principal / months`) and interest is
/// charged on the balance before each payment, so payments decline over time.
/// The reported `monthly_payment` is the first (largest) payment.
///
/// # Errors
///
/// Returns an error if the inputs are invalid or any amount overflows.
pub fn flat_rate(
    principal: Decimal,
    monthly_rate: Decimal,
    months: u32,
) -> Result<AmortizationResult, AmortizationError> {
    check_terms(principal, monthly_rate, months)?;

    let monthly_principal = principal / Decimal::from(months);
    let mut balance = principal;
    let mut total_interest = dec!(0);
    let mut schedule = Vec::with_capacity(months as usize);

    for month in 1..=months {
        let interest = fits(balance.checked_mul(monthly_rate))?;
        let payment = fits(monthly_principal.checked_add(interest))?;
        balance -= monthly_principal;
        total_interest = fits(total_interest.checked_add(interest))?;
        schedule.push(ScheduleEntry {
            month,
            principal_component: monthly_principal,
            interest_component: interest,
            payment,
            remaining_balance: balance.max(dec!(0)),
        });
    }

    let monthly_payment = schedule
        .first()
        .map(|entry| entry.payment)
        .unwrap_or_default();

    Ok(AmortizationResult {
        method: RepaymentMethod::FlatRate,
        principal,
        monthly_payment,
        total_interest,
        total_repayment: fits(principal.checked_add(total_interest))?,
        schedule,
    })
}

fn fits(amount: Option<Decimal>) -> Result<Decimal, AmortizationError> {
    amount.ok_or_else(|| TermsViolation::RateTermOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPSILON: Decimal = dec!(0.01);

    fn terms(principal: Decimal, rate: Decimal, months: u32, method: RepaymentMethod) -> LoanTerms {
        LoanTerms::new(principal, rate, months, method)
    }

    #[test]
    fn test_declining_balance_simulator_default() {
        let result = compute(&LoanTerms::default()).unwrap();

        assert_eq!(result.schedule.len(), 12);
        assert_eq!(result.monthly_payment.round_dp(2), dec!(88848.79));
        assert_eq!(result.total_interest.round_dp(2), dec!(66185.46));
        assert_eq!(result.total_repayment.round_dp(2), dec!(1066185.46));
        assert!(result.final_balance() < EPSILON);
        assert_eq!(result.schedule[0].interest_component, dec!(10000));
    }

    #[test]
    fn test_flat_rate_simulator_default() {
        let input = terms(dec!(1000000), dec!(12), 12, RepaymentMethod::FlatRate);
        let result = compute(&input).unwrap();

        assert_eq!(result.schedule.len(), 12);
        assert_eq!(result.schedule[0].principal_component.round_dp(2), dec!(83333.33));
        assert_eq!(result.schedule[0].interest_component, dec!(10000));
        assert_eq!(result.monthly_payment.round_dp(2), dec!(93333.33));
        assert_eq!(result.schedule[11].interest_component.round_dp(2), dec!(833.33));
        assert_eq!(result.last_payment().round_dp(2), dec!(84166.67));
        assert_eq!(result.total_interest.round_dp(2), dec!(65000.00));
        assert!(result.final_balance() < EPSILON);
    }

    #[test]
    fn test_zero_rate_declining_balance() {
        let input = terms(dec!(500000), dec!(0), 10, RepaymentMethod::DecliningBalance);
        let result = compute(&input).unwrap();

        assert_eq!(result.monthly_payment, dec!(50000));
        assert_eq!(result.total_interest, dec!(0));
        assert_eq!(result.total_repayment, dec!(500000));
        assert!(result.schedule.iter().all(|e| e.interest_component.is_zero()));
        assert_eq!(result.final_balance(), dec!(0));
    }

    #[rstest]
    #[case(dec!(0), 12)]
    #[case(dec!(-100), 12)]
    #[case(dec!(100000), 0)]
    fn test_invalid_terms_for_every_method(
        #[case] principal: Decimal,
        #[case] months: u32,
        #[values(RepaymentMethod::DecliningBalance, RepaymentMethod::FlatRate)]
        method: RepaymentMethod,
    ) {
        let result = compute(&terms(principal, dec!(12), months, method));
        assert!(matches!(result, Err(AmortizationError::InvalidTerms { .. })));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let result = compute(&terms(dec!(1000), dec!(-3), 12, RepaymentMethod::FlatRate));
        assert_eq!(result.unwrap_err().violation(), TermsViolation::NegativeRate);
    }

    #[test]
    fn test_single_month_declining_balance() {
        let input = terms(dec!(10000), dec!(12), 1, RepaymentMethod::DecliningBalance);
        let result = compute(&input).unwrap();

        assert_eq!(result.schedule.len(), 1);
        assert_eq!(result.monthly_payment.round_dp(10), dec!(10100));
        assert!(result.final_balance() < EPSILON);
    }

    #[test]
    fn test_small_loan_both_methods() {
        let declining = compute(&terms(dec!(12000), dec!(12), 12, RepaymentMethod::DecliningBalance))
            .unwrap();
        assert_eq!(declining.monthly_payment.round_dp(2), dec!(1066.19));

        let flat = compute(&terms(dec!(12000), dec!(12), 12, RepaymentMethod::FlatRate)).unwrap();
        assert_eq!(flat.monthly_payment, dec!(1120));
        assert_eq!(flat.last_payment(), dec!(1010));
        assert_eq!(flat.total_interest, dec!(780));
        assert_eq!(flat.total_repayment, dec!(12780));
        assert_eq!(flat.average_payment(), dec!(1065));
    }

    #[rstest]
    #[case(dec!(1000000), dec!(12), 12)]
    #[case(dec!(360000), dec!(10.5), 420)]
    #[case(dec!(250000), dec!(24), 6)]
    #[case(dec!(75000.50), dec!(7.25), 37)]
    #[case(dec!(500000), dec!(0), 10)]
    #[case(dec!(1), dec!(36), 1)]
    fn test_schedule_invariants(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] months: u32,
        #[values(RepaymentMethod::DecliningBalance, RepaymentMethod::FlatRate)]
        method: RepaymentMethod,
    ) {
        let result = compute(&terms(principal, rate, months, method)).unwrap();

        assert_eq!(result.schedule.len(), months as usize);
        assert!(result.final_balance() < EPSILON);
        assert_eq!(result.total_repayment, principal + result.total_interest);

        let summed: Decimal = result.schedule.iter().map(|e| e.interest_component).sum();
        assert_eq!(summed, result.total_interest);

        for (index, entry) in result.schedule.iter().enumerate() {
            assert_eq!(entry.month, index as u32 + 1);
            let split = entry.principal_component + entry.interest_component;
            assert!((entry.payment - split).abs() < dec!(0.000001));
        }
        for pair in result.schedule.windows(2) {
            assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
        }
    }

    #[rstest]
    #[case(dec!(1000000), dec!(12), 12)]
    #[case(dec!(360000), dec!(10.5), 420)]
    #[case(dec!(500000), dec!(0), 10)]
    fn test_declining_balance_payment_is_constant(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] months: u32,
    ) {
        let result = compute(&terms(principal, rate, months, RepaymentMethod::DecliningBalance))
            .unwrap();
        assert!(result.schedule.iter().all(|e| e.payment == result.monthly_payment));
        for pair in result.schedule.windows(2) {
            assert!(pair[1].interest_component <= pair[0].interest_component);
        }
    }

    #[rstest]
    #[case(dec!(1000000), dec!(12), 12)]
    #[case(dec!(360000), dec!(10.5), 420)]
    #[case(dec!(90000), dec!(30), 9)]
    fn test_flat_rate_principal_constant_interest_decreasing(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] months: u32,
    ) {
        let result = compute(&terms(principal, rate, months, RepaymentMethod::FlatRate)).unwrap();
        let expected_principal = principal / Decimal::from(months);

        assert!(result.schedule.iter().all(|e| e.principal_component == expected_principal));
        for pair in result.schedule.windows(2) {
            assert!(pair[1].interest_component < pair[0].interest_component);
        }
        assert_eq!(result.monthly_payment, result.schedule[0].payment);
    }

    #[test]
    fn test_flat_rate_zero_interest_is_flat() {
        let result = compute(&terms(dec!(6000), dec!(0), 6, RepaymentMethod::FlatRate)).unwrap();
        assert!(result.schedule.iter().all(|e| e.payment == dec!(1000)));
        assert_eq!(result.total_interest, dec!(0));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let input = terms(dec!(742500), dec!(19.5), 18, RepaymentMethod::DecliningBalance);
        assert_eq!(compute(&input).unwrap(), compute(&input).unwrap());

        let input = LoanTerms { method: RepaymentMethod::FlatRate, ..input };
        assert_eq!(compute(&input).unwrap(), compute(&input).unwrap());
    }

    #[test]
    fn test_annuity_factor_overflow_is_invalid_terms() {
        let input = terms(dec!(1000), dec!(1000), 10000, RepaymentMethod::DecliningBalance);
        let err = compute(&input).unwrap_err();
        assert_eq!(err.violation(), TermsViolation::RateTermOverflow);

        // Flat rate never raises the factor, so the same terms still amortize.
        let flat = compute(&LoanTerms { method: RepaymentMethod::FlatRate, ..input }).unwrap();
        assert_eq!(flat.schedule.len(), 10000);
    }

    #[rstest]
    fn test_amount_overflow_is_invalid_terms(
        #[values(RepaymentMethod::DecliningBalance, RepaymentMethod::FlatRate)]
        method: RepaymentMethod,
    ) {
        let input = terms(dec!(50_000_000_000_000_000_000_000_000_000), dec!(2400), 2, method);
        let err = compute(&input).unwrap_err();
        assert_eq!(err.violation(), TermsViolation::RateTermOverflow);
        assert_eq!(
            err.violation().to_string(),
            "amounts are too large for the interest rate and duration"
        );
    }

    #[test]
    fn test_smallest_rate_amortizes_like_equal_principal() {
        // 1.2e-25 % a year is a monthly rate of 1e-28.
        let input = terms(
            dec!(1200),
            dec!(0.00000000000000000000000012),
            12,
            RepaymentMethod::DecliningBalance,
        );
        assert_eq!(input.monthly_rate(), dec!(0.0000000000000000000000000001));

        let result = compute(&input).unwrap();
        assert!((result.monthly_payment - dec!(100)).abs() < dec!(0.000001));
        assert!(result.total_interest < EPSILON);
        assert!(result.final_balance() < EPSILON);
    }

    #[test]
    fn test_result_serializes_with_snake_case_method() {
        let result = compute(&terms(dec!(1200), dec!(0), 2, RepaymentMethod::FlatRate)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["method"], "flat_rate");
        assert_eq!(json["schedule"].as_array().unwrap().len(), 2);
    }
}
