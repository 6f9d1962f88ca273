//! `mf_loans` is a Rust library for building loan repayment schedules in a
//! microfinance lending back office.
//!
//! It supports the two repayment methods offered on loan products:
//! - **Declining balance**: a constant monthly payment from the annuity formula,
//!   with interest charged on the outstanding balance.
//! - **Flat rate**: a constant principal share every month plus interest on the
//!   balance before the payment, leading to decreasing payments over time.
//!
//! Amounts are `Decimal` and are never rounded by the library; round when
//! displaying.
//!
//! ## Usage
//!
//! Add `mf_loans` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mf_loans = "0.1.0"
//! rust_decimal = "1.39.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then, use the `compute` function to get the schedule and its totals:
//!
//! ```rust
//! use mf_loans::{compute, LoanTerms, RepaymentMethod};
//! use rust_decimal_macros::dec;
//!
//! fn main() {
//!     let terms = LoanTerms::new(dec!(1_000_000), dec!(12), 12, RepaymentMethod::DecliningBalance);
//!
//!     match compute(&terms) {
//!         Ok(result) => {
//!             println!("Monthly Payment: {:.2}", result.monthly_payment);
//!             println!("Total Interest:  {:.2}", result.total_interest);
//!             println!("Total Amount:    {:.2}", result.total_repayment);
//!
//!             for entry in &result.schedule {
//!                 println!("{:>3} {:.0} {:.0}", entry.month, entry.payment, entry.remaining_balance);
//!             }
//!         }
//!         Err(e) => {
//!             eprintln!("Error calculating schedule: {}", e);
//!         }
//!     }
//! }
//! ```
//!
//! Loan applications are priced against a [`LoanProduct`], which supplies the
//! rate and method and bounds the principal and duration. Only the scalar
//! [`LoanRecord`] is meant to be persisted.

pub mod error;
pub mod product;
pub mod schedule;
pub mod terms;

pub use error::{AmortizationError, ApplicationError, TermsViolation};
pub use product::{LoanProduct, LoanQuote, LoanRecord};
pub use schedule::{
    AmortizationResult, ScheduleEntry, annuity_payment, compute, declining_balance, flat_rate,
};
pub use terms::{LoanTerms, RepaymentMethod, monthly_rate_from_annual_percent};
