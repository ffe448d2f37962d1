use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{AnalyticsReport, Dashboard, NewTransaction, Store, TransactionPatch};
use crate::domain::{
    Category, Cents, DEFAULT_RECENT_LIMIT, MonthChange, Transaction, TransactionType, Wallet,
    WalletType, format_cents, format_signed_cents, parse_cents, parse_time_of_day,
};
use crate::io::Exporter;
use crate::storage::{KeyValueStore, SqliteKv};

/// Pocketbook - Personal Wallet Tracker
#[derive(Parser)]
#[command(name = "pocketbook")]
#[command(about = "Track wallets, income and expenses from the command line")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "POCKETBOOK_DB", default_value = "pocketbook.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Wallet management commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Record an income or expense
    Add {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Wallet name or ID
        #[arg(short, long)]
        wallet: String,

        /// Transaction type: income, expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        transaction_type: String,

        /// Category: food, shopping, transport, entertainment, bills, health, smoke-drink, other
        #[arg(short, long)]
        category: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Time of day (HH:MM, defaults to now)
        #[arg(long)]
        time: Option<String>,

        /// Free-text note shown instead of the category name
        #[arg(long)]
        comment: Option<String>,
    },

    /// Change fields of a recorded transaction
    Edit {
        /// Transaction ID
        id: String,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// Move to another wallet (name or ID)
        #[arg(short, long)]
        wallet: Option<String>,

        /// New type: income, expense
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New time of day (HH:MM)
        #[arg(long)]
        time: Option<String>,

        /// New comment
        #[arg(long, conflicts_with = "clear_comment")]
        comment: Option<String>,

        /// Remove the comment
        #[arg(long)]
        clear_comment: bool,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// List transactions, newest first
    Transactions {
        /// Only show the N most recent transactions (5 when N is omitted)
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5")]
        recent: Option<usize>,
    },

    /// Show total balance, wallet balances and recent activity
    Balance,

    /// Show income, spending and category analytics
    Analytics {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, wallets, snapshot
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet
    Create {
        /// Wallet name
        name: String,

        /// Wallet type: cash, bank, card, digital, savings
        #[arg(short = 't', long = "type", default_value = "cash")]
        wallet_type: String,

        /// Starting balance (e.g., "1000" or "-25.50")
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        balance: String,
    },

    /// Edit name, type or starting balance of a wallet
    Edit {
        /// Wallet name or ID
        wallet: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New type
        #[arg(short = 't', long = "type")]
        wallet_type: Option<String>,

        /// New starting balance
        #[arg(short, long, allow_hyphen_values = true)]
        balance: Option<String>,
    },

    /// Delete a wallet and all of its transactions
    Delete {
        /// Wallet name or ID
        wallet: String,
    },

    /// List all wallets with their balances
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let command = match self.command {
            Commands::Init => {
                let kv = SqliteKv::init(&format!("sqlite:{}?mode=rwc", self.database)).await?;
                let store = Store::load(kv).await;
                store.save().await?;
                println!("Database initialized: {}", self.database);
                return Ok(());
            }
            command => command,
        };

        let kv = SqliteKv::connect(&format!("sqlite:{}", self.database))
            .await
            .with_context(|| {
                format!(
                    "Could not open '{}'. Run `pocketbook init` first",
                    self.database
                )
            })?;
        let mut store = Store::load(kv).await;
        let today = Local::now().date_naive();

        match command {
            Commands::Init => {} // handled above

            Commands::Wallet(wallet_cmd) => {
                run_wallet_command(&mut store, wallet_cmd, today).await?;
            }

            Commands::Add {
                amount,
                wallet,
                transaction_type,
                category,
                date,
                time,
                comment,
            } => {
                let wallet_id = resolve_wallet(&store, &wallet)?.id;
                let now = Local::now();
                let new = NewTransaction {
                    wallet_id,
                    transaction_type: parse_transaction_type(&transaction_type)?,
                    amount: parse_amount(&amount)?,
                    category: parse_category(&category)?,
                    date: match date {
                        Some(date_str) => parse_date(&date_str)?,
                        None => now.date_naive(),
                    },
                    time: match time {
                        Some(time_str) => parse_time(&time_str)?,
                        None => now.format("%H:%M").to_string(),
                    },
                    comment: comment.filter(|c| !c.trim().is_empty()),
                };

                let transaction = store.create_transaction(new).await?;
                println!(
                    "Recorded {}: {} {} ({})",
                    transaction.transaction_type,
                    format_cents(transaction.amount),
                    transaction.label(),
                    transaction.id
                );
            }

            Commands::Edit {
                id,
                amount,
                wallet,
                transaction_type,
                category,
                date,
                time,
                comment,
                clear_comment,
            } => {
                let transaction_id = parse_id(&id)?;
                let patch = TransactionPatch {
                    wallet_id: wallet
                        .map(|w| resolve_wallet(&store, &w).map(|w| w.id))
                        .transpose()?,
                    transaction_type: transaction_type
                        .map(|t| parse_transaction_type(&t))
                        .transpose()?,
                    amount: amount.map(|a| parse_amount(&a)).transpose()?,
                    category: category.map(|c| parse_category(&c)).transpose()?,
                    date: date.map(|d| parse_date(&d)).transpose()?,
                    time: time.map(|t| parse_time(&t)).transpose()?,
                    comment: if clear_comment {
                        Some(None)
                    } else {
                        comment.map(Some)
                    },
                };

                match store.update_transaction(transaction_id, patch).await? {
                    Some(transaction) => println!("Updated transaction: {}", transaction.id),
                    None => println!("No transaction with ID {}", transaction_id),
                }
            }

            Commands::Delete { id } => {
                let transaction_id = parse_id(&id)?;
                match store.delete_transaction(transaction_id).await? {
                    Some(transaction) => println!(
                        "Deleted transaction: {} {}",
                        format_cents(transaction.amount),
                        transaction.label()
                    ),
                    None => println!("No transaction with ID {}", transaction_id),
                }
            }

            Commands::Transactions { recent } => {
                let ledger = store.ledger();
                let transactions = match recent {
                    Some(limit) => ledger.recent_transactions(limit),
                    None => ledger.sorted_transactions(),
                };
                print_transactions(store.wallets(), &transactions);
            }

            Commands::Balance => {
                let ledger = store.ledger();
                let dashboard = Dashboard::build(&ledger, today, DEFAULT_RECENT_LIMIT);
                print_dashboard(store.wallets(), &dashboard);
            }

            Commands::Analytics { format } => {
                let report = AnalyticsReport::build(&store.ledger());
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                    "table" => print_analytics(&report),
                    other => anyhow::bail!("Unknown format '{}'. Use table or json", other),
                }
            }

            Commands::Export {
                export_type,
                output,
            } => {
                run_export_command(&store, &export_type, output.as_deref())?;
            }
        }

        Ok(())
    }
}

async fn run_wallet_command<K: KeyValueStore>(
    store: &mut Store<K>,
    cmd: WalletCommands,
    today: NaiveDate,
) -> Result<()> {
    match cmd {
        WalletCommands::Create {
            name,
            wallet_type,
            balance,
        } => {
            let wt: WalletType = wallet_type.parse()?;
            let initial_balance = parse_cents(&balance)
                .with_context(|| format!("Invalid balance '{}'. Use '50.00' or '50'", balance))?;

            let wallet = store.create_wallet(name, wt, initial_balance).await?;
            println!(
                "Created wallet: {} ({}, {}) {}",
                wallet.name,
                wallet.wallet_type,
                format_cents(wallet.initial_balance),
                wallet.id
            );
        }

        WalletCommands::Edit {
            wallet,
            name,
            wallet_type,
            balance,
        } => {
            let current = resolve_wallet(store, &wallet)?.clone();
            let wallet_type = match wallet_type {
                Some(wt) => wt.parse()?,
                None => current.wallet_type,
            };
            let initial_balance = match balance {
                Some(b) => parse_cents(&b)
                    .with_context(|| format!("Invalid balance '{}'. Use '50.00' or '50'", b))?,
                None => current.initial_balance,
            };
            let name = name.unwrap_or(current.name);

            if let Some(updated) = store
                .update_wallet(current.id, name, wallet_type, initial_balance)
                .await?
            {
                println!(
                    "Updated wallet: {} ({}, starting balance {})",
                    updated.name,
                    updated.wallet_type,
                    format_cents(updated.initial_balance)
                );
            }
        }

        WalletCommands::Delete { wallet } => {
            let id = resolve_wallet(store, &wallet)?.id;
            if let Some(removal) = store.delete_wallet(id).await? {
                println!(
                    "Deleted wallet: {} ({} transaction(s) removed)",
                    removal.wallet.name,
                    removal.removed_transactions.len()
                );
            }
        }

        WalletCommands::List => {
            let summaries = store.ledger().wallet_summaries(today);
            if summaries.is_empty() {
                println!("No wallets found.");
            } else {
                println!(
                    "{:<36} {:<20} {:<8} {:>12} {:>12}",
                    "ID", "WALLET", "TYPE", "BALANCE", "THIS MONTH"
                );
                println!("{}", "-".repeat(92));
                for summary in summaries {
                    println!(
                        "{:<36} {:<20} {:<8} {:>12} {:>12}",
                        summary.wallet.id,
                        truncate(&summary.wallet.name, 20),
                        summary.wallet.wallet_type,
                        format_cents(summary.balance),
                        format_signed_cents(summary.month_change)
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_export_command<K: KeyValueStore>(
    store: &Store<K>,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create file: {}", path))?,
        ),
        None => Box::new(io::stdout()),
    };

    let exporter = Exporter::new(store.ledger());
    let summary = match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer)?;
            format!("Exported {} transaction(s)", count)
        }
        "wallets" => {
            let count = exporter.export_wallets_csv(writer)?;
            format!("Exported {} wallet(s)", count)
        }
        "snapshot" => {
            let snapshot = exporter.export_snapshot_json(writer)?;
            format!(
                "Exported snapshot: {} wallet(s), {} transaction(s)",
                snapshot.wallets.len(),
                snapshot.transactions.len()
            )
        }
        other => anyhow::bail!(
            "Unknown export type '{}'. Valid types: transactions, wallets, snapshot",
            other
        ),
    };

    if output.is_some() {
        eprintln!("{}", summary);
    }
    Ok(())
}

fn print_dashboard(wallets: &[Wallet], dashboard: &Dashboard<'_>) {
    println!("Total balance: {}", format_cents(dashboard.total_balance));
    println!("{}", describe_month_change(dashboard.month_change));
    println!();

    if dashboard.wallets.is_empty() {
        println!("No wallets yet. Create one with `pocketbook wallet create`.");
    } else {
        println!("{:<20} {:<8} {:>12} {:>12}", "WALLET", "TYPE", "BALANCE", "THIS MONTH");
        println!("{}", "-".repeat(55));
        for summary in &dashboard.wallets {
            println!(
                "{:<20} {:<8} {:>12} {:>12}",
                truncate(&summary.wallet.name, 20),
                summary.wallet.wallet_type,
                format_cents(summary.balance),
                format_signed_cents(summary.month_change)
            );
        }
    }

    if !dashboard.recent_transactions.is_empty() {
        println!();
        println!("Recent transactions:");
        print_transactions(wallets, &dashboard.recent_transactions);
    }
}

fn describe_month_change(change: MonthChange) -> String {
    match change {
        MonthChange::None => "No change from last month".to_string(),
        MonthChange::Absolute(cents) => {
            format!("{} from last month", format_signed_cents(cents))
        }
        MonthChange::Percentage(pct) if pct > 0.0 => format!("+{:.1}% from last month", pct),
        MonthChange::Percentage(pct) if pct < 0.0 => format!("{:.1}% from last month", pct),
        MonthChange::Percentage(_) => "No change from last month".to_string(),
    }
}

fn print_transactions(wallets: &[Wallet], transactions: &[&Transaction]) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<12} {:<6} {:>12} {:<15} {:<30} ID",
        "DATE", "TIME", "AMOUNT", "WALLET", "DESCRIPTION"
    );
    println!("{}", "-".repeat(115));

    for transaction in transactions {
        let wallet_name = wallets
            .iter()
            .find(|w| w.id == transaction.wallet_id)
            .map(|w| w.name.as_str())
            .unwrap_or("?");

        println!(
            "{:<12} {:<6} {:>12} {:<15} {:<30} {}",
            transaction.date.format("%Y-%m-%d"),
            transaction.time,
            format_signed_cents(transaction.signed_amount()),
            truncate(wallet_name, 15),
            truncate(transaction.label(), 30),
            transaction.id
        );
    }
}

fn print_analytics(report: &AnalyticsReport) {
    println!("Total income:   {:>12}", format_cents(report.total_income));
    println!("Total spending: {:>12}", format_cents(report.total_spending));
    println!("Net:            {:>12}", format_signed_cents(report.net));
    println!("Savings rate:   {:>11.1}%", report.savings_rate);
    match &report.top_category {
        Some(top) => println!(
            "Top category:   {} ({})",
            top.category.display_name(),
            format_cents(top.amount)
        ),
        None => println!("Top category:   -"),
    }
    println!(
        "Wallets: {}  Transactions: {}",
        report.wallet_count, report.transaction_count
    );

    if !report.spending_by_category.is_empty() {
        println!();
        println!("{:<20} {:>12} {:>8}", "CATEGORY", "SPENT", "SHARE");
        println!("{}", "-".repeat(42));
        for entry in &report.spending_by_category {
            println!(
                "{:<20} {:>12} {:>7.1}%",
                entry.category,
                format_cents(entry.total),
                entry.percentage
            );
        }
    }
}

/// Find a wallet by ID, or by name if the input is not an ID.
fn resolve_wallet<'a, K: KeyValueStore>(store: &'a Store<K>, input: &str) -> Result<&'a Wallet> {
    if let Ok(id) = Uuid::parse_str(input.trim()) {
        if let Some(wallet) = store.wallet(id) {
            return Ok(wallet);
        }
    }

    let mut matches = store
        .wallets()
        .iter()
        .filter(|w| w.name.eq_ignore_ascii_case(input.trim()));
    match (matches.next(), matches.next()) {
        (Some(wallet), None) => Ok(wallet),
        (Some(_), Some(_)) => {
            anyhow::bail!("Several wallets are named '{}'. Use the wallet ID", input)
        }
        (None, _) => anyhow::bail!("Wallet not found: {}", input),
    }
}

fn parse_id(input: &str) -> Result<Uuid> {
    Uuid::parse_str(input.trim()).context("Invalid ID format (expected UUID)")
}

fn parse_amount(input: &str) -> Result<Cents> {
    parse_cents(input).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn parse_transaction_type(input: &str) -> Result<TransactionType> {
    Ok(input.parse()?)
}

fn parse_category(input: &str) -> Result<Category> {
    Ok(input.parse()?)
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

/// Validate a time of day and normalize it to HH:MM.
fn parse_time(time_str: &str) -> Result<String> {
    parse_time_of_day(time_str)
        .map(|t| t.format("%H:%M").to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid time format '{}'. Use HH:MM", time_str))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
