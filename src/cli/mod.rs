use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::application::{FetchPolicy, FinanceService, LoadOutcome, PublishedPage, TransactionsScreen};
use crate::config::Config;
use crate::domain::{
    enumerate_recent_periods, format_cents, parse_cents, resolve, CategoryUpdate, FilterChange,
    FilterMode, FiscalPeriod, NewCategory, TransactionStatus, TransactionType, UnitId, ViewMode,
    DEFAULT_PAGE_SIZE,
};
use crate::io::{export_categories_csv, export_page_json, export_rows_csv, export_units_csv};

/// Condofin - condominium finance client
#[derive(Parser)]
#[command(name = "condofin")]
#[command(about = "Browse condominium transactions, categories and unit balances")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./condofin.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List selectable fiscal periods around the current month
    Periods {
        /// Months before the current one (defaults to config)
        #[arg(long)]
        back: Option<u32>,

        /// Months after the current one (defaults to config)
        #[arg(long)]
        forward: Option<u32>,
    },

    /// Show the date range a fiscal period covers
    Resolve {
        /// Period token (YYYY-MM)
        period: String,
    },

    /// List transactions with the role-based summary
    Transactions(TransactionArgs),

    /// Show one transaction
    Transaction {
        /// Transaction ID
        id: String,

        /// Serve from the local cache only
        #[arg(long)]
        offline: bool,
    },

    /// Category management commands
    #[command(subcommand)]
    Categories(CategoryCommands),

    /// Unit (household) commands
    #[command(subcommand)]
    Units(UnitCommands),

    /// Local response cache commands
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(clap::Args)]
pub struct TransactionArgs {
    /// Filter by type: income, expense
    #[arg(long = "type")]
    pub transaction_type: Option<String>,

    /// Filter by category ID
    #[arg(long)]
    pub category: Option<String>,

    /// Filter by unit ID (residents default to session.unit_id)
    #[arg(long)]
    pub unit: Option<String>,

    /// Filter by status: pending, confirmed, cancelled, refunded
    #[arg(long)]
    pub status: Option<String>,

    /// Fiscal period (YYYY-MM); takes precedence over --from/--to
    #[arg(long)]
    pub period: Option<String>,

    /// From date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// To date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Minimum amount (e.g., "100.00")
    #[arg(long)]
    pub min: Option<String>,

    /// Maximum amount
    #[arg(long)]
    pub max: Option<String>,

    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Income lens: normal, late, advance
    #[arg(long, default_value = "normal")]
    pub mode: String,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Serve from the local cache only
    #[arg(long)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List active categories
    List {
        /// Filter by type: income, expense
        #[arg(long = "type")]
        category_type: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Serve from the local cache only
        #[arg(long)]
        offline: bool,
    },

    /// Show one category
    Show {
        /// Category ID
        id: String,

        /// Serve from the local cache only
        #[arg(long)]
        offline: bool,
    },

    /// Create a category
    Create {
        /// Category name
        name: String,

        /// Type: income, expense
        #[arg(long = "type")]
        category_type: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Hex color, e.g. "#10B981"
        #[arg(long)]
        color: Option<String>,
    },

    /// Update a category
    Update {
        /// Category ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a category
    Delete {
        /// Category ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum UnitCommands {
    /// List units with the occupancy and debt summary
    List {
        /// Search by unit number or owner
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(short, long, default_value = "20")]
        limit: u32,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Serve from the local cache only
        #[arg(long)]
        offline: bool,
    },

    /// Show a unit's account statement
    Balance {
        /// Unit ID
        id: String,

        /// Fiscal period (YYYY-MM)
        #[arg(long)]
        period: Option<String>,

        /// Serve from the local cache only
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show how many responses are stored
    Status,

    /// Remove every cached response
    Clear,
}

fn policy(offline: bool) -> FetchPolicy {
    if offline {
        FetchPolicy::CacheOnly
    } else {
        FetchPolicy::Network
    }
}

impl Cli {
    pub async fn run(self, config: Config) -> Result<()> {
        match self.command {
            Commands::Periods { back, forward } => {
                let back = back.unwrap_or(config.filters.months_back);
                let forward = forward.unwrap_or(config.filters.months_forward);
                run_periods_command(back, forward);
            }

            Commands::Resolve { period } => {
                let range = resolve(Some(&period))?
                    .ok_or_else(|| anyhow!("No period given"))?;
                let label = period
                    .trim()
                    .parse::<FiscalPeriod>()
                    .map(|p| p.label())
                    .unwrap_or_default();
                println!(
                    "{}: {} .. {}",
                    label,
                    range.from_string(),
                    range.to_string_inclusive()
                );
            }

            Commands::Transactions(args) => {
                let service = FinanceService::from_config(&config, policy(args.offline)).await?;
                run_transactions_command(Arc::new(service), &config, args).await?;
            }

            Commands::Transaction { id, offline } => {
                let service = FinanceService::from_config(&config, policy(offline)).await?;
                let id = Uuid::parse_str(&id).context("Invalid transaction ID")?;
                run_show_transaction_command(&service, id).await?;
            }

            Commands::Categories(cmd) => {
                let offline = matches!(
                    cmd,
                    CategoryCommands::List { offline: true, .. }
                        | CategoryCommands::Show { offline: true, .. }
                );
                let service = FinanceService::from_config(&config, policy(offline)).await?;
                run_category_command(&service, cmd).await?;
            }

            Commands::Units(cmd) => {
                let offline = match &cmd {
                    UnitCommands::List { offline, .. } | UnitCommands::Balance { offline, .. } => {
                        *offline
                    }
                };
                let service = FinanceService::from_config(&config, policy(offline)).await?;
                run_unit_command(&service, cmd).await?;
            }

            Commands::Cache(CacheCommands::Status) => {
                let service = FinanceService::from_config(&config, FetchPolicy::CacheOnly).await?;
                match service.cached_responses().await? {
                    Some(count) => println!(
                        "{} cached responses in {}",
                        count,
                        config.cache.path.display()
                    ),
                    None => println!("Response cache is disabled"),
                }
            }

            Commands::Cache(CacheCommands::Clear) => {
                let service = FinanceService::from_config(&config, FetchPolicy::CacheOnly).await?;
                let removed = service.clear_cache().await?;
                println!("Removed {} cached responses", removed);
            }
        }

        Ok(())
    }
}

fn run_periods_command(back: u32, forward: u32) {
    let current = FiscalPeriod::current();
    for period in enumerate_recent_periods(back, forward) {
        let marker = if period == current { "*" } else { " " };
        println!("{} {}  {}", marker, period, period.label());
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}

fn parse_type(value: &str) -> Result<TransactionType> {
    TransactionType::from_str(value)
        .ok_or_else(|| anyhow!("Invalid type '{}'. Use income or expense", value))
}

fn parse_id(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid {} ID", what))
}

/// Translate command-line flags into filter writes. `default_unit` applies
/// when no `--unit` is given.
fn filter_changes(
    args: &TransactionArgs,
    default_unit: Option<UnitId>,
) -> Result<Vec<FilterChange>> {
    let mut changes = Vec::new();

    if let Some(kind) = &args.transaction_type {
        changes.push(FilterChange::Type(Some(parse_type(kind)?)));
    }
    if let Some(category) = &args.category {
        changes.push(FilterChange::Category(Some(parse_id(category, "category")?)));
    }
    match &args.unit {
        Some(unit) => changes.push(FilterChange::Unit(Some(parse_id(unit, "unit")?))),
        None => {
            if let Some(unit) = default_unit {
                changes.push(FilterChange::Unit(Some(unit)));
            }
        }
    }
    if let Some(status) = &args.status {
        let status = TransactionStatus::from_str(status)
            .ok_or_else(|| anyhow!("Invalid status '{}'", status))?;
        changes.push(FilterChange::Status(Some(status)));
    }
    if let Some(from) = &args.from {
        changes.push(FilterChange::DateFrom(Some(
            parse_date(from).context("Invalid --from")?,
        )));
    }
    if let Some(to) = &args.to {
        changes.push(FilterChange::DateTo(Some(parse_date(to).context("Invalid --to")?)));
    }
    if let Some(period) = &args.period {
        changes.push(FilterChange::FiscalPeriod(Some(period.clone())));
    }
    if let Some(min) = &args.min {
        let cents = parse_cents(min).context("Invalid --min. Use '100.00' or '100'")?;
        changes.push(FilterChange::AmountMin(Some(cents)));
    }
    if let Some(max) = &args.max {
        let cents = parse_cents(max).context("Invalid --max. Use '100.00' or '100'")?;
        changes.push(FilterChange::AmountMax(Some(cents)));
    }
    if let Some(search) = &args.search {
        changes.push(FilterChange::Search(Some(search.clone())));
    }
    changes.push(FilterChange::PageSize(args.limit.unwrap_or(DEFAULT_PAGE_SIZE)));

    Ok(changes)
}

async fn run_transactions_command(
    service: Arc<FinanceService>,
    config: &Config,
    args: TransactionArgs,
) -> Result<()> {
    let mode: FilterMode = args.mode.parse().map_err(anyhow::Error::msg)?;
    let view_mode = config.session.view_mode();
    let default_unit = match view_mode {
        ViewMode::Resident => config.session.unit_id,
        ViewMode::Administrator => None,
    };
    let changes = filter_changes(&args, default_unit)?;

    let screen = TransactionsScreen::new(service, view_mode);
    screen.set_mode(mode);
    screen.set_filters(changes);
    if let Some(page) = args.page {
        screen.set_filter(FilterChange::Page(page));
    }

    let page = match screen.load().await? {
        LoadOutcome::Published(page) => page,
        LoadOutcome::Superseded { key } => {
            return Err(anyhow!("Response for {} was superseded", key));
        }
    };

    match args.format {
        OutputFormat::Table => print_page(&page, screen.filters().active_count()),
        OutputFormat::Json => {
            export_page_json(&page, std::io::stdout().lock())?;
            println!();
        }
        OutputFormat::Csv => {
            export_rows_csv(&page.rows, std::io::stdout().lock())?;
        }
    }
    Ok(())
}

fn print_page(page: &PublishedPage, active_filters: usize) {
    if page.from_cache {
        println!(
            "(cached {})",
            page.fetched_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    if active_filters > 0 {
        println!("{} filter(s) applied", active_filters);
    }

    for card in &page.view.cards {
        println!("{:<20} {:>14}", card.kind.title(), format_cents(card.amount));
    }

    if let Some(breakdown) = &page.view.breakdown {
        println!();
        println!("{:<20} {:>14}", "On time", format_cents(breakdown.on_time));
        println!(
            "{:<20} {:>14}  ({})",
            "Late",
            format_cents(breakdown.late),
            breakdown.late_count
        );
        println!(
            "{:<20} {:>14}  ({})",
            "Advance",
            format_cents(breakdown.advance),
            breakdown.advance_count
        );
    }

    if let Some(banner) = &page.view.banner {
        println!();
        println!("[{}]", banner.message());
    }

    println!();
    if page.rows.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<12} {:>12} {:<20} {:<8} {:<8} DESCRIPTION",
        "DATE", "AMOUNT", "CATEGORY", "UNIT", "TIMING"
    );
    println!("{}", "-".repeat(80));
    for row in &page.rows {
        println!(
            "{:<12} {:>12} {:<20} {:<8} {:<8} {}",
            row.date,
            row.amount,
            truncate(&row.category, 20),
            row.unit.as_deref().unwrap_or("-"),
            row.badge.map(|b| b.as_str()).unwrap_or(""),
            truncate(&row.description, 30)
        );
    }

    if let Some(p) = &page.page.pagination {
        println!();
        println!("Page {} of {} ({} total)", p.page, p.total_pages, p.total_items);
    }
}

async fn run_show_transaction_command(service: &FinanceService, id: Uuid) -> Result<()> {
    let tx = service.transaction(id).await?.value;

    println!("Transaction {}", tx.id);
    println!("  Type:        {}", tx.transaction_type);
    println!("  Amount:      {}", format_cents(tx.amount));
    println!("  Date:        {}", tx.transaction_date.format("%Y-%m-%d"));
    println!("  Description: {}", tx.description);
    if !tx.category_name.is_empty() {
        println!("  Category:    {}", tx.category_name);
    }
    if let Some(unit) = &tx.unit_number {
        println!("  Unit:        {}", unit);
    }
    if let Some(status) = tx.status {
        println!("  Status:      {}", status);
    }
    if let Some(period) = tx.fiscal_period {
        println!("  Period:      {} ({})", period, period.label());
    }
    if let Some(timing) = tx.timing() {
        println!("  Timing:      {}", timing.as_str());
    }
    if let Some(reference) = &tx.reference_number {
        println!("  Reference:   {}", reference);
    }
    if let Some(notes) = &tx.notes {
        println!("  Notes:       {}", notes);
    }
    Ok(())
}

async fn run_category_command(service: &FinanceService, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::List {
            category_type,
            format,
            ..
        } => {
            let kind = category_type.as_deref().map(parse_type).transpose()?;
            let categories = service.categories(kind).await?.value;

            match format {
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(std::io::stdout().lock(), &categories)?;
                    println!();
                }
                OutputFormat::Csv => {
                    export_categories_csv(&categories, std::io::stdout().lock())?;
                }
                OutputFormat::Table if categories.is_empty() => println!("No categories found."),
                OutputFormat::Table => {
                    println!("{:<36} {:<8} {:<24} {:>6}", "ID", "TYPE", "NAME", "USES");
                    println!("{}", "-".repeat(78));
                    for category in categories {
                        println!(
                            "{:<36} {:<8} {:<24} {:>6}",
                            category.id,
                            category.category_type.as_str(),
                            truncate(&category.name, 24),
                            category.transaction_count
                        );
                    }
                }
            }
        }

        CategoryCommands::Show { id, .. } => {
            let id = parse_id(&id, "category")?;
            let category = service.category(id).await?.value;

            println!("Category {}", category.id);
            println!("  Name:         {}", category.name);
            println!("  Type:         {}", category.category_type.as_str());
            if let Some(description) = &category.description {
                println!("  Description:  {}", description);
            }
            println!("  Color:        {}", category.color);
            println!("  Transactions: {}", category.transaction_count);
        }

        CategoryCommands::Create {
            name,
            category_type,
            description,
            color,
        } => {
            let mut category = NewCategory::new(name, parse_type(&category_type)?);
            if let Some(description) = description {
                category = category.with_description(description);
            }
            if let Some(color) = color {
                category = category.with_color(color);
            }
            let created = service.create_category(category).await?;
            println!("Created category '{}' ({})", created.name, created.id);
        }

        CategoryCommands::Update {
            id,
            name,
            description,
            color,
        } => {
            let id = parse_id(&id, "category")?;
            let update = CategoryUpdate {
                name,
                description,
                color,
                ..Default::default()
            };
            let updated = service.update_category(id, update).await?;
            println!("Updated category '{}'", updated.name);
        }

        CategoryCommands::Delete { id } => {
            let id = parse_id(&id, "category")?;
            service.delete_category(id).await?;
            println!("Deleted category {}", id);
        }
    }
    Ok(())
}

async fn run_unit_command(service: &FinanceService, cmd: UnitCommands) -> Result<()> {
    match cmd {
        UnitCommands::List {
            search,
            page,
            limit,
            format,
            ..
        } => {
            let units = service.units(page, limit, search.as_deref()).await?.value;

            match format {
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(std::io::stdout().lock(), &units.units)?;
                    println!();
                }
                OutputFormat::Csv => {
                    export_units_csv(&units.units, std::io::stdout().lock())?;
                }
                OutputFormat::Table => {
                    let s = &units.summary;
                    println!(
                        "Units: {} (occupied {}, vacant {}, maintenance {})",
                        s.total_units, s.occupied, s.vacant, s.maintenance
                    );
                    println!(
                        "Debt:  {} across {} units",
                        format_cents(s.total_debt),
                        s.units_with_debt
                    );
                    println!();
                    println!(
                        "{:<14} {:<12} {:>12} {:>12} OWNER",
                        "UNIT", "STATUS", "FEE", "BALANCE"
                    );
                    println!("{}", "-".repeat(70));
                    for unit in &units.units {
                        let flag = if unit.has_debt() { "!" } else { " " };
                        println!(
                            "{:<14} {:<12} {:>12} {:>11}{} {}",
                            truncate(&unit.display_name(), 14),
                            unit.status.as_str(),
                            format_cents(unit.monthly_fee),
                            format_cents(unit.balance),
                            flag,
                            unit.owner_name.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
        }

        UnitCommands::Balance { id, period, .. } => {
            let id = parse_id(&id, "unit")?;
            let balance = service.unit_balance(id, period.as_deref()).await?.value;

            println!("Unit {}", balance.unit_number);
            println!("  Current balance: {}", format_cents(balance.current_balance));
            println!("  Charges:         {}", format_cents(balance.total_charges));
            println!("  Payments:        {}", format_cents(balance.total_payments));
            println!("  Net:             {}", format_cents(balance.period_net()));

            if !balance.transactions.is_empty() {
                println!();
                for tx in &balance.transactions {
                    println!(
                        "  {:<12} {:>12} {}",
                        tx.transaction_date.format("%Y-%m-%d"),
                        format_cents(tx.signed_amount()),
                        truncate(&tx.description, 40)
                    );
                }
            }
        }
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> TransactionArgs {
        let mut argv = vec!["condofin", "transactions"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Transactions(args) => args,
            _ => panic!("expected transactions command"),
        }
    }

    #[test]
    fn test_flags_to_filter_changes() {
        let changes = filter_changes(
            &args(&[
                "--type", "income", "--period", "2024-02", "--min", "100", "--limit", "50",
            ]),
            None,
        )
        .unwrap();
        assert!(changes.contains(&FilterChange::Type(Some(TransactionType::Income))));
        assert!(changes.contains(&FilterChange::FiscalPeriod(Some("2024-02".into()))));
        assert!(changes.contains(&FilterChange::AmountMin(Some(10000))));
        assert!(changes.contains(&FilterChange::PageSize(50)));
    }

    #[test]
    fn test_bad_flags_rejected() {
        assert!(filter_changes(&args(&["--type", "refund"]), None).is_err());
        assert!(filter_changes(&args(&["--from", "02/01/2024"]), None).is_err());
        assert!(filter_changes(&args(&["--unit", "101"]), None).is_err());
    }

    #[test]
    fn test_session_unit_is_default_only() {
        let home = Uuid::new_v4();
        let changes = filter_changes(&args(&[]), Some(home)).unwrap();
        assert!(changes.contains(&FilterChange::Unit(Some(home))));

        let other = Uuid::new_v4();
        let flag = other.to_string();
        let changes = filter_changes(&args(&["--unit", &flag]), Some(home)).unwrap();
        assert!(changes.contains(&FilterChange::Unit(Some(other))));
        assert!(!changes.contains(&FilterChange::Unit(Some(home))));
    }

    #[test]
    fn test_category_show_parses() {
        let cli = Cli::parse_from(["condofin", "categories", "show", "abc", "--offline"]);
        assert!(matches!(
            cli.command,
            Commands::Categories(CategoryCommands::Show { offline: true, .. })
        ));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Mantenimiento áreas comunes", 10), "Manteni...");
        assert_eq!(truncate("Agua", 10), "Agua");
    }
}
