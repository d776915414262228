//! Fund IRR CLI
//!
//! Runs IRR calculations over a CSV ledger snapshot directory
//! (activities.csv, valuations.csv, holdings.csv).
//! Solver conventions can be overridden with IRR_* environment variables.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fund_irr::ledger::{load_snapshot, FundId, PortfolioId};
use fund_irr::{partition, EngineConfig, IrrCalculator, IrrResult, LedgerSource, PortfolioEntry};

#[derive(Parser)]
#[command(name = "fund-irr", version, about = "Money-weighted IRR for fund ledgers")]
struct Cli {
    /// Directory holding the CSV snapshot
    #[arg(long, default_value = "data/sample")]
    data_dir: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// IRR for a single fund
    Fund {
        #[arg(long)]
        fund_id: FundId,
        /// Valuation date to calculate at (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// IRR for several funds treated as one pot
    Funds {
        #[arg(long, value_delimiter = ',', required = true)]
        fund_ids: Vec<FundId>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Per-fund IRR for every fund in a portfolio valued on a date
    Date {
        #[arg(long)]
        portfolio_id: PortfolioId,
        #[arg(long)]
        date: NaiveDate,
        /// Write converged rates to this CSV file
        #[arg(long)]
        write_rates: Option<PathBuf>,
    },
    /// Holdings table with the inactive-fund rollup
    Partition {
        #[arg(long)]
        portfolio_id: PortfolioId,
    },
}

fn format_rate(result: &IrrResult) -> String {
    match result.rate_percent {
        Some(rate) => format!("{:.2}% ({:?})", rate, result.status),
        None => format!("n/a ({:?})", result.status),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let snapshot = load_snapshot(&cli.data_dir)
        .with_context(|| format!("loading snapshot from {}", cli.data_dir.display()))?;
    let calculator = IrrCalculator::with_config(&snapshot, EngineConfig::from_env());

    match cli.command {
        Command::Fund { fund_id, as_of } => {
            let result = calculator
                .calculate_single_fund(fund_id, as_of)
                .with_context(|| format!("calculating IRR for fund {}", fund_id))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Fund {}: {}", fund_id, format_rate(&result));
                if let Some(date) = result.as_of_date {
                    println!("  As of: {}", date);
                }
            }
        }
        Command::Funds { fund_ids, as_of } => {
            let result = calculator
                .calculate_fund_set(&fund_ids, as_of)
                .with_context(|| format!("calculating IRR for funds {:?}", fund_ids))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Funds {:?}: {}", fund_ids, format_rate(&result));
            }
        }
        Command::Date {
            portfolio_id,
            date,
            write_rates,
        } => {
            let bulk = calculator
                .calculate_for_date(portfolio_id, date)
                .with_context(|| format!("calculating portfolio {} on {}", portfolio_id, date))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&bulk)?);
            } else {
                println!("Portfolio {} on {}", portfolio_id, date);
                println!("{:>8} {:>8} {:>12}  {}", "Fund", "Status", "Rate", "Message");
                println!("{}", "-".repeat(60));
                for outcome in &bulk.results {
                    let rate = outcome
                        .rate_percent
                        .map(|r| format!("{:.2}%", r))
                        .unwrap_or_else(|| "n/a".to_string());
                    println!(
                        "{:>8} {:>8} {:>12}  {}",
                        outcome.fund_id,
                        format!("{:?}", outcome.status),
                        rate,
                        outcome.message
                    );
                }
                if !bulk.missing.is_empty() {
                    println!("\nNo valuation on {} for funds: {:?}", date, bulk.missing);
                }
                println!(
                    "\nSuccessful: {}  Failed: {}  Total: {}",
                    bulk.successful, bulk.failed, bulk.total
                );
                println!("Active value: {:.2}", bulk.active_total_value);
                println!("Combined IRR: {}", format_rate(&bulk.combined));
            }

            if let Some(path) = write_rates {
                let records = bulk.rate_records();
                let mut writer = csv::Writer::from_path(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                for record in &records {
                    writer.serialize(record)?;
                }
                writer.flush()?;
                if !cli.json {
                    println!("\n{} rates written to {}", records.len(), path.display());
                }
            }
        }
        Command::Partition { portfolio_id } => {
            let holdings = snapshot.holdings(portfolio_id);
            let split = partition(&holdings);

            // Live "previous funds" rate over the rollup's real members
            let previous = if split.inactive.is_empty() {
                None
            } else {
                Some(calculator.calculate_fund_set(&split.inactive_fund_ids(), None)?)
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&split)?);
                return Ok(());
            }

            println!("Portfolio {}", portfolio_id);
            println!("{:>10} {:>14} {:>14}  {}", "Fund", "Invested", "Value", "IRR");
            println!("{}", "-".repeat(60));
            for row in split.display_rows() {
                let (label, rate) = match &row {
                    PortfolioEntry::Real(h) => {
                        let rate = calculator
                            .calculate_single_fund(h.fund_id, None)
                            .map(|r| format_rate(&r))
                            .unwrap_or_else(|e| e.to_string());
                        (h.fund_id.to_string(), rate)
                    }
                    PortfolioEntry::Aggregate(a) => (
                        "Previous".to_string(),
                        match a.rate_percent() {
                            Some(rate) => format!("{:.2}%", rate),
                            None => "n/a".to_string(),
                        },
                    ),
                };
                println!(
                    "{:>10} {:>14.2} {:>14.2}  {}",
                    label,
                    row.amount_invested(),
                    row.market_value(),
                    rate
                );
            }
            println!("{}", "-".repeat(60));
            println!(
                "{:>10} {:>14.2} {:>14.2}",
                "Total",
                split.total_invested(),
                split.active_total_value()
            );
            if let Some(previous) = previous {
                println!("\nPrevious funds (live): {}", format_rate(&previous));
            }
        }
    }

    Ok(())
}
