use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::json;
use tabled::{Table, builder::Builder};
use tracing_subscriber::EnvFilter;

use mf_loans::{AmortizationResult, LoanProduct, LoanQuote, LoanTerms, RepaymentMethod, compute};

/// Loan repayment simulator
#[derive(Parser)]
#[command(
    name = "loan-sim",
    version,
    about = "Simulate loan repayment schedules and quote loan applications"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a repayment schedule from loan terms
    Simulate(SimulateArgs),
    /// Price a loan application against a loan product
    Quote(QuoteArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Path to a JSON file with loan terms (overrides individual flags)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Principal amount
    #[arg(long, default_value = "1000000")]
    principal: Decimal,

    /// Annual interest rate in percent
    #[arg(long, default_value = "12")]
    rate: Decimal,

    /// Duration in months
    #[arg(long, default_value_t = 12)]
    months: u32,

    /// Calculation method
    #[arg(long, default_value = "declining_balance")]
    method: MethodArg,
}

#[derive(Args)]
struct QuoteArgs {
    /// Path to a JSON file describing the loan product
    #[arg(long)]
    product: PathBuf,

    /// Requested principal
    #[arg(long)]
    principal: Decimal,

    /// Requested duration in months
    #[arg(long)]
    months: u32,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    #[value(name = "declining_balance")]
    DecliningBalance,
    #[value(name = "flat_rate")]
    FlatRate,
}

impl From<MethodArg> for RepaymentMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::DecliningBalance => RepaymentMethod::DecliningBalance,
            MethodArg::FlatRate => RepaymentMethod::FlatRate,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Simulate(args) => run_simulate(args, &cli.output),
        Commands::Quote(args) => run_quote(args, &cli.output),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_simulate(args: SimulateArgs, output: &OutputFormat) -> Result<()> {
    let terms = match &args.input {
        Some(path) => read_json::<LoanTerms>(path)?,
        None => LoanTerms::new(args.principal, args.rate, args.months, args.method.into()),
    };
    tracing::info!(
        principal = %terms.principal,
        rate = %terms.annual_interest_rate_percent,
        months = terms.duration_months,
        method = %terms.method,
        "simulating loan"
    );

    let result = compute(&terms)?;

    match output {
        OutputFormat::Json => print_json(&json!({ "terms": terms, "result": result }))?,
        OutputFormat::Table => {
            print_summary(&result);
            println!();
            print_schedule(&result);
        }
    }
    Ok(())
}

fn run_quote(args: QuoteArgs, output: &OutputFormat) -> Result<()> {
    let product = read_json::<LoanProduct>(&args.product)?;
    let quote = product
        .quote(args.principal, args.months)
        .with_context(|| format!("cannot quote product '{}'", product.code))?;

    match output {
        OutputFormat::Json => print_json(&json!({
            "quote": quote,
            "record": quote.to_record(),
        }))?,
        OutputFormat::Table => {
            print_quote(&product, &quote);
            println!();
            print_summary(&quote.amortization);
            println!();
            print_schedule(&quote.amortization);
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse '{}'", path.display()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Whole currency units, for display only.
fn whole(amount: Decimal) -> String {
    amount.round_dp(0).to_string()
}

fn print_summary(result: &AmortizationResult) {
    let mut builder = Builder::default();
    builder.push_record(["Monthly Payment", "Total Interest", "Total Amount"]);
    builder.push_record([
        whole(result.monthly_payment),
        whole(result.total_interest),
        whole(result.total_repayment),
    ]);
    println!("{}", Table::from(builder));

    if result.method == RepaymentMethod::FlatRate {
        println!(
            "Flat rate payments decline to {} in the final month.",
            whole(result.last_payment())
        );
    }
}

fn print_schedule(result: &AmortizationResult) {
    let mut builder = Builder::default();
    builder.push_record(["Month", "Principal", "Interest", "Payment", "Balance"]);
    for entry in &result.schedule {
        builder.push_record([
            entry.month.to_string(),
            whole(entry.principal_component),
            whole(entry.interest_component),
            whole(entry.payment),
            whole(entry.remaining_balance),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_quote(product: &LoanProduct, quote: &LoanQuote) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    builder.push_record(["Product".to_string(), format!("{} ({})", product.name, product.code)]);
    builder.push_record(["Method".to_string(), quote.terms.method.to_string()]);
    builder.push_record(["Rate (%/year)".to_string(), quote.terms.annual_interest_rate_percent.to_string()]);
    builder.push_record(["Principal".to_string(), whole(quote.terms.principal)]);
    builder.push_record(["Processing Fee".to_string(), whole(quote.processing_fee)]);
    builder.push_record(["Net Disbursement".to_string(), whole(quote.net_disbursement())]);
    println!("{}", Table::from(builder));
}
