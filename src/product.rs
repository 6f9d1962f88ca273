use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;
use crate::schedule::{AmortizationResult, compute};
use crate::terms::{LoanTerms, RepaymentMethod};

/// A lending product as configured by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub name: String,
    pub code: String,
    /// Annual interest rate as a percentage.
    pub interest_rate: Decimal,
    /// Annual late-payment penalty rate as a percentage.
    #[serde(default)]
    pub penalty_rate: Decimal,
    pub min_principal: Decimal,
    pub max_principal: Decimal,
    pub min_duration_months: u32,
    pub max_duration_months: u32,
    /// Upfront fee as a percentage of the principal.
    #[serde(default)]
    pub processing_fee_percent: Decimal,
    #[serde(default)]
    pub interest_calculation_method: RepaymentMethod,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// The outcome of pricing an application against a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub product_code: String,
    pub terms: LoanTerms,
    pub processing_fee: Decimal,
    pub amortization: AmortizationResult,
}

/// The scalar values stored on a loan when an application is created.
/// The schedule itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub product_code: String,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub duration_months: u32,
    pub interest_calculation_method: RepaymentMethod,
    pub monthly_payment: Decimal,
    pub processing_fee: Decimal,
}

impl LoanProduct {
    /// Checks that the product's own bounds make sense.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let invalid = |reason: &str| Err(ApplicationError::InvalidProduct(reason.to_string()));

        if self.interest_rate < Decimal::ZERO {
            return invalid("interest rate cannot be negative");
        }
        if self.penalty_rate < Decimal::ZERO {
            return invalid("penalty rate cannot be negative");
        }
        if self.processing_fee_percent < Decimal::ZERO {
            return invalid("processing fee cannot be negative");
        }
        if self.min_principal <= Decimal::ZERO || self.min_principal > self.max_principal {
            return invalid("principal range is empty or not positive");
        }
        if self.min_duration_months == 0 || self.min_duration_months > self.max_duration_months {
            return invalid("duration range is empty or starts at zero months");
        }
        Ok(())
    }

    /// Prices a loan application for this product.
    ///
    /// The requested principal and duration must fall inside the product's
    /// bounds; the rate and repayment method always come from the product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is inactive or misconfigured, if the
    /// request falls outside its bounds, or if the schedule cannot be built.
    pub fn quote(&self, principal: Decimal, duration_months: u32) -> Result<LoanQuote, ApplicationError> {
        if !self.is_active {
            return Err(ApplicationError::ProductInactive {
                code: self.code.clone(),
            });
        }
        self.validate()?;

        if principal < self.min_principal || principal > self.max_principal {
            return Err(ApplicationError::PrincipalOutOfRange {
                principal,
                min: self.min_principal,
                max: self.max_principal,
            });
        }
        if duration_months < self.min_duration_months || duration_months > self.max_duration_months {
            return Err(ApplicationError::DurationOutOfRange {
                months: duration_months,
                min: self.min_duration_months,
                max: self.max_duration_months,
            });
        }

        let terms = LoanTerms::new(
            principal,
            self.interest_rate,
            duration_months,
            self.interest_calculation_method,
        );
        let amortization = compute(&terms)?;
        let processing_fee = principal * self.processing_fee_percent / dec!(100);

        tracing::debug!(
            product = %self.code,
            principal = %principal,
            months = duration_months,
            monthly_payment = %amortization.monthly_payment,
            processing_fee = %processing_fee,
            "quoted loan application"
        );

        Ok(LoanQuote {
            product_code: self.code.clone(),
            terms,
            processing_fee,
            amortization,
        })
    }
}

impl LoanQuote {
    pub fn monthly_payment(&self) -> Decimal {
        self.amortization.monthly_payment
    }

    /// Principal minus the upfront processing fee.
    pub fn net_disbursement(&self) -> Decimal {
        self.terms.principal - self.processing_fee
    }

    pub fn to_record(&self) -> LoanRecord {
        LoanRecord {
            product_code: self.product_code.clone(),
            principal: self.terms.principal,
            interest_rate: self.terms.annual_interest_rate_percent,
            duration_months: self.terms.duration_months,
            interest_calculation_method: self.terms.method,
            monthly_payment: self.monthly_payment(),
            processing_fee: self.processing_fee,
        }
    }
}
