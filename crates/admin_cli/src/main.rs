use std::error::Error;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::{
    Engine, ExpenditureKind, ExpenditureListFilter, MoneyCents, MonthWindow, NewExpenditure,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub name: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "prospetto_admin")]
#[command(about = "Admin utilities for Prospetto (bootstrap users/ledgers, run reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./prospetto.db?mode=rwc"
    )]
    database_url: String,

    /// Timezone used to resolve month boundaries.
    #[arg(long, default_value = "Europe/Rome")]
    timezone: String,

    /// Persist synthesized carry-forward snapshots during reports.
    #[arg(long)]
    carry_forward: bool,

    /// Log filter, e.g. `engine=debug`.
    #[arg(long, default_value = "engine=info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Ledger(Ledger),
    Category(Category),
    Cash(Cash),
    Expenditure(Expenditure),
    /// Print the monthly prospect of a ledger as JSON.
    Prospect(ProspectArgs),
    /// Print the multi-month report of a ledger as JSON.
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct Ledger {
    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    Create(LedgerCreateArgs),
    AddMember(LedgerAddMemberArgs),
    List(AsUser),
}

#[derive(Args, Debug)]
struct LedgerCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct LedgerAddMemberArgs {
    #[arg(long)]
    ledger_id: String,
    #[arg(long)]
    member: String,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct AsUser {
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
    List(LedgerScoped),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    ledger_id: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct LedgerScoped {
    #[arg(long)]
    ledger_id: String,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct Cash {
    #[command(subcommand)]
    command: CashCommand,
}

#[derive(Subcommand, Debug)]
enum CashCommand {
    Record(CashRecordArgs),
    List(CashListArgs),
}

#[derive(Args, Debug)]
struct CashRecordArgs {
    #[arg(long)]
    ledger_id: String,
    #[arg(long)]
    name: Option<String>,
    /// Amount like `1234.56` (negatives allowed).
    #[arg(long)]
    value: MoneyCents,
    /// RFC 3339 timestamp; defaults to the start of the current month.
    #[arg(long)]
    reference_date: Option<DateTime<Utc>>,
    /// Record an income event instead of a money snapshot.
    #[arg(long)]
    income: bool,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct CashListArgs {
    #[arg(long)]
    ledger_id: String,
    /// Restrict to one month, `MM-YYYY`.
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    income: Option<bool>,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct Expenditure {
    #[command(subcommand)]
    command: ExpenditureCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenditureCommand {
    Record(ExpenditureRecordArgs),
    List(ExpenditureListArgs),
    /// Copy the previous month's expected lines into a month.
    CopyPrevious(MonthScoped),
}

#[derive(Args, Debug)]
struct ExpenditureRecordArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    value: MoneyCents,
    #[arg(long)]
    category_id: Uuid,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    date: Option<DateTime<Utc>>,
    /// Record an expected line instead of an actual one.
    #[arg(long)]
    expected: bool,
    /// Link this actual line to an expected one.
    #[arg(long)]
    expected_expenditure_id: Option<Uuid>,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct ExpenditureListArgs {
    #[arg(long)]
    ledger_id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    from: Option<DateTime<Utc>>,
    #[arg(long)]
    to: Option<DateTime<Utc>>,
    #[arg(long)]
    min_value: Option<MoneyCents>,
    #[arg(long)]
    max_value: Option<MoneyCents>,
    /// `actual`, `expected` or `both`.
    #[arg(long, default_value = "both")]
    kind: String,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct MonthScoped {
    #[arg(long)]
    ledger_id: String,
    /// `MM-YYYY`; defaults to the current month.
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct ProspectArgs {
    #[arg(long)]
    ledger_id: String,
    /// `MM-YYYY`; defaults to the current month.
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    as_user: String,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    ledger_id: String,
    /// `MM-YYYY`; defaults to the current month.
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    as_user: String,
}

fn parse_kind(raw: &str) -> Result<ExpenditureKind, String> {
    match raw {
        "both" => Ok(ExpenditureKind::Both),
        "actual" => Ok(ExpenditureKind::Actual),
        "expected" => Ok(ExpenditureKind::Expected),
        other => Err(format!("unsupported kind: {other}")),
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_env_filter(&cli.log).init();

    let timezone: Tz = cli
        .timezone
        .parse()
        .map_err(|_| format!("unknown timezone: {}", cli.timezone))?;

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db.clone())
        .timezone(timezone)
        .carry_forward(cli.carry_forward)
        .build()
        .await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                name: Set(args.name),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {}", args.username);
        }
        Command::Ledger(Ledger { command }) => match command {
            LedgerCommand::Create(args) => {
                let ledger_id = engine.new_ledger(&args.name, &args.owner).await?;
                println!("created ledger: {} ({ledger_id})", args.name);
            }
            LedgerCommand::AddMember(args) => {
                engine
                    .add_ledger_member(&args.ledger_id, &args.member, &args.as_user)
                    .await?;
                println!("added member: {}", args.member);
            }
            LedgerCommand::List(args) => {
                let ledgers = engine.ledgers_for_user(&args.as_user).await?;
                println!("{}", serde_json::to_string_pretty(&ledgers)?);
            }
        },
        Command::Category(Category { command }) => match command {
            CategoryCommand::Create(args) => {
                let category_id = engine
                    .new_category(&args.ledger_id, &args.name, &args.as_user)
                    .await?;
                println!("created category: {} ({category_id})", args.name);
            }
            CategoryCommand::List(args) => {
                let categories = engine.list_categories(&args.ledger_id, &args.as_user).await?;
                println!("{}", serde_json::to_string_pretty(&categories)?);
            }
        },
        Command::Cash(Cash { command }) => match command {
            CashCommand::Record(args) => {
                let cash_id = engine
                    .record_cash(
                        &args.ledger_id,
                        args.name.as_deref(),
                        args.value,
                        args.reference_date,
                        args.income,
                        &args.as_user,
                    )
                    .await?;
                println!("recorded cash: {cash_id}");
            }
            CashCommand::List(args) => {
                let window = match args.month.as_deref() {
                    Some(spec) => Some(MonthWindow::resolve(
                        engine.timezone(),
                        Some(spec),
                        Utc::now(),
                    )?),
                    None => None,
                };
                let cashes = engine
                    .list_cashes(&args.ledger_id, window.as_ref(), args.income, &args.as_user)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&cashes)?);
            }
        },
        Command::Expenditure(Expenditure { command }) => match command {
            ExpenditureCommand::Record(args) => {
                let expenditure_id = engine
                    .new_expenditure(
                        NewExpenditure {
                            name: args.name,
                            value: args.value,
                            category_id: args.category_id,
                            date: args.date,
                            is_expected: args.expected,
                            expected_expenditure_id: args.expected_expenditure_id,
                        },
                        &args.as_user,
                    )
                    .await?;
                println!("recorded expenditure: {expenditure_id}");
            }
            ExpenditureCommand::List(args) => {
                let kind = match parse_kind(&args.kind) {
                    Ok(kind) => kind,
                    Err(err) => {
                        eprintln!("{err}");
                        std::process::exit(2);
                    }
                };
                let filter = ExpenditureListFilter {
                    name_query: args.name,
                    from: args.from,
                    to: args.to,
                    min_value: args.min_value,
                    max_value: args.max_value,
                    kind,
                };
                let expenditures = engine
                    .list_expenditures(&args.ledger_id, &filter, &args.as_user)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&expenditures)?);
            }
            ExpenditureCommand::CopyPrevious(args) => {
                let window =
                    MonthWindow::resolve(engine.timezone(), args.month.as_deref(), Utc::now())?;
                let copied = engine
                    .copy_expected_from_previous_month(&args.ledger_id, &window, &args.as_user)
                    .await?;
                println!("copied {copied} expected lines into {}", window.spec());
            }
        },
        Command::Prospect(args) => {
            let window =
                MonthWindow::resolve(engine.timezone(), args.month.as_deref(), Utc::now())?;
            let prospect = engine
                .monthly_prospect(&args.ledger_id, &window, &args.as_user)
                .await?;
            println!("{}", serde_json::to_string_pretty(&prospect)?);
        }
        Command::Report(args) => {
            let window =
                MonthWindow::resolve(engine.timezone(), args.month.as_deref(), Utc::now())?;
            let report = engine
                .monthly_report(&args.ledger_id, &window, &args.as_user)
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
