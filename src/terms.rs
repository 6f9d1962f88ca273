use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, TermsViolation};

/// How a loan is repaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentMethod {
    /// Constant payment from the annuity formula; interest is charged on the
    /// outstanding balance, so the principal share grows every month.
    #[default]
    DecliningBalance,
    /// Constant principal share (`principal / months`) plus interest on the
    /// balance before the payment, so the payment shrinks every month.
    FlatRate,
}

impl RepaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepaymentMethod::DecliningBalance => "declining_balance",
            RepaymentMethod::FlatRate => "flat_rate",
        }
    }
}

impl fmt::Display for RepaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "declining_balance" => Ok(RepaymentMethod::DecliningBalance),
            "flat_rate" => Ok(RepaymentMethod::FlatRate),
            other => Err(format!("unknown repayment method '{other}'")),
        }
    }
}

/// Input parameters for an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// The amount financed.
    pub principal: Decimal,
    /// The annual interest rate as a percentage (e.g., 12 for 12%).
    pub annual_interest_rate_percent: Decimal,
    /// The number of monthly repayment periods.
    pub duration_months: u32,
    #[serde(default)]
    pub method: RepaymentMethod,
}

impl Default for LoanTerms {
    fn default() -> Self {
        LoanTerms {
            principal: dec!(1_000_000),
            annual_interest_rate_percent: dec!(12),
            duration_months: 12,
            method: RepaymentMethod::DecliningBalance,
        }
    }
}

impl LoanTerms {
    pub fn new(
        principal: Decimal,
        annual_interest_rate_percent: Decimal,
        duration_months: u32,
        method: RepaymentMethod,
    ) -> Self {
        LoanTerms {
            principal,
            annual_interest_rate_percent,
            duration_months,
            method,
        }
    }

    /// Checks the terms before any schedule is built.
    pub fn validate(&self) -> Result<(), AmortizationError> {
        check_terms(
            self.principal,
            self.annual_interest_rate_percent,
            self.duration_months,
        )
    }

    /// Nominal monthly rate as a decimal fraction: `annual / 100 / 12`.
    pub fn monthly_rate(&self) -> Decimal {
        monthly_rate_from_annual_percent(self.annual_interest_rate_percent)
    }
}

/// Converts an annual percentage (12 for 12%) into the nominal monthly rate
/// used by both repayment methods (0.01 for 12%).
pub fn monthly_rate_from_annual_percent(annual_percent: Decimal) -> Decimal {
    annual_percent / dec!(100) / dec!(12)
}

pub(crate) fn check_terms(
    principal: Decimal,
    rate: Decimal,
    months: u32,
) -> Result<(), AmortizationError> {
    if principal <= Decimal::ZERO {
        return Err(TermsViolation::NonPositivePrincipal.into());
    }
    if months == 0 {
        return Err(TermsViolation::ZeroDuration.into());
    }
    if rate < Decimal::ZERO {
        return Err(TermsViolation::NegativeRate.into());
    }
    Ok(())
}
