// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use employee_dashboard::{
    compute_all, import_snapshot, load_coordinates_csv, load_employees_csv, setup_database,
    verify_counts, DataArgs, SelectionState,
};

#[derive(Debug, Parser)]
#[command(name = "employee-dashboard", version, about = "Employee demography dashboard")]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load both CSVs and write them to a SQLite snapshot
    Import {
        /// Snapshot to (re)write
        #[arg(long, default_value = "dashboard.db")]
        output: PathBuf,
    },
    /// Interactive terminal dashboard (default)
    Ui,
    /// Print one pass as JSON
    Report {
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        age_low: Option<u32>,
        #[arg(long)]
        age_high: Option<u32>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Import { output }) => run_import(&cli.data, &output),
        Some(Command::Report {
            department,
            age_low,
            age_high,
        }) => run_report(&cli.data, department, age_low, age_high),
        Some(Command::Ui) | None => run_ui_mode(&cli.data),
    }
}

fn run_import(data: &DataArgs, output: &Path) -> Result<()> {
    println!("🗄️  Data Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSVs
    println!("\n📂 Loading CSV...");
    let employees = load_employees_csv(&data.employees)?;
    let coordinates = load_coordinates_csv(&data.coordinates)?;
    println!(
        "✓ Loaded {} employees and {} province coordinates",
        employees.len(),
        coordinates.len()
    );

    // 2. Setup database
    println!("\n🔧 Setting up database...");
    let mut conn = Connection::open(output)
        .with_context(|| format!("Failed to open database {}", output.display()))?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    // 3. Replace snapshot
    println!("\n💾 Writing snapshot...");
    import_snapshot(&mut conn, &employees, &coordinates)?;

    // 4. Verify counts
    println!("\n🔍 Verifying database...");
    let (employee_count, coordinate_count) = verify_counts(&conn)?;
    println!(
        "✓ Database contains {} employees and {} province coordinates",
        employee_count, coordinate_count
    );

    if employee_count != employees.len() as i64 || coordinate_count != coordinates.len() as i64 {
        anyhow::bail!("Snapshot row counts do not match the imported CSVs");
    }

    println!("\n✅ Snapshot written to {}", output.display());
    Ok(())
}

fn run_report(
    data: &DataArgs,
    department: Option<String>,
    age_low: Option<u32>,
    age_high: Option<u32>,
) -> Result<()> {
    let tables = data.load_tables()?;
    let defaults = SelectionState::default_for(&tables);

    let department = department.unwrap_or_else(|| defaults.department().to_string());
    let low = age_low.unwrap_or(defaults.age_range().low());
    let high = age_high.unwrap_or(defaults.age_range().high());
    let selection = SelectionState::new(&tables, &department, low, high)?;

    let pass = compute_all(&tables, &selection)?;
    println!("{}", serde_json::to_string_pretty(&pass)?);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(data: &DataArgs) -> Result<()> {
    println!("🖥️  Loading Employee Demography Dashboard...\n");

    let tables = data.load_tables()?;
    println!(
        "✓ Loaded {} employees across {} departments\n",
        tables.employees().len(),
        tables.departments().len()
    );
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(std::sync::Arc::new(tables))?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_data: &DataArgs) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin dashboard-server --features server");
    std::process::exit(1);
}
