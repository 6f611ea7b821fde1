mod config;
mod error;

use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use ledger::{JournaledChain, Operation, Outcome, Provenance, RoleKind, Transition, UnitId};
use policy::Identity;
use storage::{Entry, Journal};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "provenance.toml";
const DB_FILE: &str = "ledger.db";

#[derive(Parser)]
#[command(name = "provenance")]
#[command(about = "Supply chain provenance ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./provenance.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Caller identity for mutating commands
    #[arg(long = "as", global = true, value_name = "IDENTITY")]
    caller: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap a new ledger
    Init {
        /// Initial administrator (defaults to the caller)
        #[arg(long)]
        admin: Option<String>,
    },
    /// Register a participant (administrator only)
    Register {
        /// rms, manufacturer, distributor or retailer
        role: RoleKind,
        identity: String,
        name: String,
        location: String,
    },
    /// Hand administration to another identity
    TransferAdmin { identity: String },
    /// Order a new unit
    Order {
        name: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Supply raw material for a unit (raw material supplier)
    Supply { unit: u64 },
    /// Manufacture a unit (manufacturer)
    Manufacture { unit: u64 },
    /// Distribute a unit (distributor)
    Distribute { unit: u64 },
    /// Take a unit into retail (retailer)
    Retail { unit: u64 },
    /// Mark a unit sold (retailer of record)
    Sell { unit: u64 },
    /// Show the current stage of a unit
    Stage { unit: u64 },
    /// Show the full provenance chain of a unit
    Track { unit: u64 },
    /// Print the portable JSON summary of a unit
    Export { unit: u64 },
    /// List all units
    Units,
    /// List registered participants
    Participants {
        /// Only this role
        role: Option<RoleKind>,
    },
    /// Show the journal of committed operations
    History {
        /// Filter by operation kind (order, register, sell, ...)
        #[arg(short, long)]
        kind: Option<String>,
        /// Show only the last N entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Resolved command-line and file configuration.
struct Context {
    config: Config,
    caller: Option<String>,
    db_path: PathBuf,
}

impl Context {
    fn caller(&self) -> Result<Identity> {
        Ok(self.config.caller(self.caller.as_deref())?)
    }

    fn open(&self) -> Result<JournaledChain> {
        if !self.db_path.exists() {
            return Err(Error::DatabaseNotFound {
                path: self.db_path.clone(),
            });
        }
        Ok(JournaledChain::open(Journal::open(&self.db_path)?)?)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log.level);

    let db_path = cli
        .db
        .or_else(|| config.ledger.path.clone())
        .or_else(|| dirs_data_dir().map(|d| d.join(DB_FILE)))
        .ok_or(Error::NoDataDir)?;
    debug!(path = %db_path.display(), "ledger path resolved");
    let ctx = Context {
        config,
        caller: cli.caller,
        db_path,
    };

    match cli.command {
        Commands::Init { admin } => cmd_init(&ctx, admin),
        Commands::Register {
            role,
            identity,
            name,
            location,
        } => cmd_execute(
            &ctx,
            Operation::Register {
                role,
                identity: Identity::new(identity),
                display_name: name,
                location,
            },
        ),
        Commands::TransferAdmin { identity } => cmd_execute(
            &ctx,
            Operation::TransferAdministration {
                new_administrator: Identity::new(identity),
            },
        ),
        Commands::Order { name, description } => {
            cmd_execute(&ctx, Operation::Order { name, description })
        }
        Commands::Supply { unit } => cmd_advance(&ctx, Transition::SupplyRawMaterial, unit),
        Commands::Manufacture { unit } => cmd_advance(&ctx, Transition::Manufacture, unit),
        Commands::Distribute { unit } => cmd_advance(&ctx, Transition::Distribute, unit),
        Commands::Retail { unit } => cmd_advance(&ctx, Transition::Retail, unit),
        Commands::Sell { unit } => cmd_advance(&ctx, Transition::Sell, unit),
        Commands::Stage { unit } => cmd_stage(&ctx, unit),
        Commands::Track { unit } => cmd_track(&ctx, unit),
        Commands::Export { unit } => cmd_export(&ctx, unit),
        Commands::Units => cmd_units(&ctx),
        Commands::Participants { role } => cmd_participants(&ctx, role),
        Commands::History { kind, limit } => cmd_history(&ctx, kind.as_deref(), limit),
    }
}

fn cmd_init(ctx: &Context, admin: Option<String>) -> Result<()> {
    let admin = match admin {
        Some(admin) => Identity::new(admin),
        None => ctx.caller()?,
    };
    if let Some(dir) = ctx.db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let chain = JournaledChain::bootstrap(Journal::open(&ctx.db_path)?, admin)?;
    println!("Ledger created at: {}", ctx.db_path.display());
    println!("Administrator: {}", chain.chain().administrator());
    Ok(())
}

fn cmd_execute(ctx: &Context, operation: Operation) -> Result<()> {
    let caller = ctx.caller()?;
    let mut chain = ctx.open()?;
    let outcome = chain.execute(&caller, operation)?;
    print_outcome(&outcome);
    Ok(())
}

fn cmd_advance(ctx: &Context, transition: Transition, unit: u64) -> Result<()> {
    cmd_execute(ctx, Operation::advance(transition, UnitId(unit)))
}

fn cmd_stage(ctx: &Context, unit: u64) -> Result<()> {
    let chain = ctx.open()?;
    let stage = chain.chain().show_stage(UnitId(unit))?;
    println!("{}", stage.label());
    Ok(())
}

fn cmd_track(ctx: &Context, unit: u64) -> Result<()> {
    let chain = ctx.open()?;
    let provenance = chain.chain().provenance(UnitId(unit))?;
    print_provenance(&provenance);
    Ok(())
}

fn cmd_export(ctx: &Context, unit: u64) -> Result<()> {
    let chain = ctx.open()?;
    let summary = chain.chain().summary(UnitId(unit))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_units(ctx: &Context) -> Result<()> {
    let chain = ctx.open()?;
    let state = chain.chain();

    if state.unit_count() == 0 {
        println!("No units ordered.");
        return Ok(());
    }

    println!("{:<6}  {:<24}  {:<28}  DESCRIPTION", "ID", "NAME", "STAGE");
    println!("{}", "-".repeat(80));
    for unit in state.units() {
        println!(
            "{:<6}  {:<24}  {:<28}  {}",
            unit.unit_id,
            truncate(&unit.name, 24),
            unit.stage.label(),
            unit.description
        );
    }
    Ok(())
}

fn cmd_participants(ctx: &Context, role: Option<RoleKind>) -> Result<()> {
    let chain = ctx.open()?;
    let state = chain.chain();
    let roles: Vec<RoleKind> = match role {
        Some(role) => vec![role],
        None => RoleKind::ALL.to_vec(),
    };

    println!("Administrator: {}\n", state.administrator());
    for role in roles {
        println!("{} ({})", role, state.count_by_role(role));
        for participant in state.participants(role) {
            println!(
                "  #{:<4} {:<24} {:<20} {}",
                participant.sequence_id,
                truncate(&participant.display_name, 24),
                truncate(&participant.location, 20),
                participant.identity
            );
        }
    }
    Ok(())
}

fn cmd_history(ctx: &Context, kind: Option<&str>, limit: Option<usize>) -> Result<()> {
    let chain = ctx.open()?;
    let entries = select_history(&chain, kind, limit)?;

    if entries.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

/// Journal entries of `kind` (or all), keeping only the last `limit`.
fn select_history(chain: &JournaledChain, kind: Option<&str>, limit: Option<usize>) -> Result<Vec<Entry>> {
    let mut entries = match kind {
        Some(kind) => chain.history_of(kind)?,
        None => chain.history()?,
    };
    if let Some(limit) = limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }
    Ok(entries)
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Registered { role, sequence_id } => {
            println!("Registered {role} #{sequence_id}");
        }
        Outcome::AdministrationTransferred { administrator } => {
            println!("Administrator is now {administrator}");
        }
        Outcome::Ordered { unit_id } => {
            println!("Ordered unit {unit_id}");
        }
        Outcome::Advanced { unit_id, stage } => {
            println!("Unit {unit_id}: {}", stage.label());
        }
    }
}

fn print_provenance(provenance: &Provenance) {
    let unit = &provenance.unit;
    println!("Unit {}: {}", unit.unit_id, unit.name);
    if !unit.description.is_empty() {
        println!("Description: {}", unit.description);
    }
    println!("Current stage: {}\n", provenance.current_stage);

    for step in &provenance.steps {
        let mark = if step.reached { "x" } else { " " };
        match &step.participant {
            Some(p) => println!(
                "  [{mark}] {:<28} {} #{}: {} ({}) {}",
                step.stage.label(),
                step.role,
                p.sequence_id,
                p.display_name,
                p.location,
                p.identity
            ),
            None => println!("  [{mark}] {}", step.stage.label()),
        }
    }
}

fn print_entry(entry: &Entry) {
    let time = Local
        .from_utc_datetime(&entry.timestamp.naive_utc())
        .format("%Y-%m-%d %H:%M:%S");
    println!(
        "#{:<5} [{time}] {:<24} by {}  {}",
        entry.sequence, entry.kind, entry.caller, entry.data
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/provenance"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("provenance"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("provenance"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}
