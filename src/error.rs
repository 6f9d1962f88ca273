use rust_decimal::Decimal;
use thiserror::Error;

/// The specific rule a set of loan terms broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TermsViolation {
    #[error("principal must be greater than zero")]
    NonPositivePrincipal,
    #[error("duration must be at least one month")]
    ZeroDuration,
    #[error("interest rate cannot be negative")]
    NegativeRate,
    /// An amount in the schedule does not fit in a `Decimal`.
    #[error("amounts are too large for the interest rate and duration")]
    RateTermOverflow,
}

/// Errors raised by the amortization engine.
///
/// The engine never hands back a partial schedule: either a complete result
/// or this error comes back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmortizationError {
    #[error("loan parameters are invalid")]
    InvalidTerms { violation: TermsViolation },
}

impl AmortizationError {
    pub fn violation(&self) -> TermsViolation {
        match self {
            AmortizationError::InvalidTerms { violation } => *violation,
        }
    }
}

impl From<TermsViolation> for AmortizationError {
    fn from(violation: TermsViolation) -> Self {
        AmortizationError::InvalidTerms { violation }
    }
}

/// Errors raised while quoting a loan application against a product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    #[error("loan product '{code}' is not active")]
    ProductInactive { code: String },

    #[error("principal {principal} is outside the product range {min}..={max}")]
    PrincipalOutOfRange {
        principal: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("duration of {months} months is outside the product range {min}..={max}")]
    DurationOutOfRange { months: u32, min: u32, max: u32 },

    #[error("loan product is misconfigured: {0}")]
    InvalidProduct(String),

    #[error(transparent)]
    Terms(#[from] AmortizationError),
}
