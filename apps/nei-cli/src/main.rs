mod error;

use clap::{Parser, Subcommand};
use error::{AppError, AppResult};
use nei_atomic::{Element, HydrogenicRates, RateCatalog, RateSource};
use nei_core::timing::{self, engine_timing};
use nei_sim::{Nei, SimProgress, SimulationRecord};
use nei_tables::{GridQuery, RateTable};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nei")]
#[command(about = "Non-equilibrium ionization of plasmas with time-dependent drivers", long_about = None)]
struct Cli {
    /// Print table-build and stepping time at the end
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a run file
    Validate {
        /// Path to the run file (YAML, or JSON by extension)
        run_path: PathBuf,
    },
    /// Run a simulation
    Run {
        /// Path to the run file (YAML, or JSON by extension)
        run_path: PathBuf,
        /// Write the full record as JSON to stdout
        #[arg(long)]
        json: bool,
        /// Print every n-th row of the summary table
        #[arg(long, default_value_t = 1)]
        every: usize,
    },
    /// Equilibrium charge-state distribution of one element
    Equilibrium {
        /// Element symbol, name or atomic number
        #[arg(long)]
        element: String,
        /// Electron temperature in kelvin
        #[arg(long)]
        temperature: f64,
        /// JSON rate catalog (defaults to the hydrogenic model)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Inspect one node of an element's rate table
    Table {
        /// Element symbol, name or atomic number
        #[arg(long)]
        element: String,
        /// Grid node index
        #[arg(long, conflicts_with = "temperature", required_unless_present = "temperature")]
        index: Option<usize>,
        /// Temperature in kelvin; the nearest node is used
        #[arg(long)]
        temperature: Option<f64>,
        /// JSON rate catalog (defaults to the hydrogenic model)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.timing {
        timing::enable_timing();
    }

    let result = match cli.command {
        Commands::Validate { run_path } => cmd_validate(&run_path),
        Commands::Run {
            run_path,
            json,
            every,
        } => cmd_run(&run_path, json, every),
        Commands::Equilibrium {
            element,
            temperature,
            catalog,
        } => cmd_equilibrium(&element, temperature, catalog.as_deref()),
        Commands::Table {
            element,
            index,
            temperature,
            catalog,
        } => {
            let query = match (index, temperature) {
                (Some(i), _) => GridQuery::Index(i),
                (None, Some(t)) => GridQuery::Temperature(t),
                (None, None) => {
                    return Err(AppError::Argument(
                        "either --index or --temperature is required".into(),
                    ));
                }
            };
            cmd_table(&element, query, catalog.as_deref())
        }
    };

    if let Some(summary) = engine_timing::summary() {
        eprintln!("\n=== Timing ===\n{summary}");
    }
    result
}

fn cmd_validate(run_path: &Path) -> AppResult<()> {
    println!("Validating run: {}", run_path.display());
    let run = nei_project::load(run_path)?;
    let config = nei_project::to_config(&run)?;
    println!("✓ Run is valid");
    println!(
        "  Elements: {}",
        config
            .elements()
            .map(|e| e.symbol())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  Time: {} s to {} s, dt = {} s, max_steps = {}",
        config.time_start(),
        config.time_max(),
        config.dt(),
        config.max_steps()
    );
    Ok(())
}

fn cmd_run(run_path: &Path, json: bool, every: usize) -> AppResult<()> {
    let run = nei_project::load(run_path)?;
    let config = nei_project::to_config(&run)?;
    let base_dir = run_path.parent().unwrap_or_else(|| Path::new("."));
    let source = nei_project::rate_source(&run, base_dir)?;

    info!(run = %run.name, path = %run_path.display(), "loaded run");
    eprintln!("Running: {}", run.name);
    let started = Instant::now();
    let mut nei = Nei::build(config, source.as_ref())?;
    eprintln!(
        "  Rate tables ready ({} from {}) in {:.2}s",
        nei.elements().count(),
        source.name(),
        started.elapsed().as_secs_f64()
    );

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let record = nei.simulate_with_progress(Some(&mut |p: SimProgress| {
        let emit_now =
            (p.fraction_complete - last_fraction).abs() >= 0.005 || last_emit.elapsed().as_millis() >= 100;
        if emit_now {
            render_progress(&p);
            last_fraction = p.fraction_complete;
            last_emit = Instant::now();
        }
    }))?;
    clear_progress_line();
    eprintln!(
        "✓ Simulation completed: {} rows in {:.2}s",
        record.len(),
        started.elapsed().as_secs_f64()
    );

    if json {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, record)?;
        writeln!(out)?;
    } else {
        print_summary(record, every.max(1));
        let final_state = nei.final_state()?;
        println!("\nFinal state: {final_state}");
        for vector in final_state.iter() {
            println!("  {vector}");
        }
    }
    Ok(())
}

fn print_summary(record: &SimulationRecord, every: usize) {
    print!("{:>12} {:>12} {:>12}", "time_s", "T_e_K", "n_e_cm3");
    for element in record.elements() {
        print!(" {:>10}", format!("<Z> {}", element.symbol()));
    }
    println!();

    let last = record.last_step().unwrap_or(0);
    for row in (0..record.len()).filter(|r| r % every == 0 || *r == last) {
        print!(
            "{:>12.4e} {:>12.4e} {:>12.4e}",
            record.time()[row],
            record.temperature()[row],
            record.electron_density()[row]
        );
        for &element in record.elements() {
            let mean = record
                .fractions_at(element, row)
                .map(|f| f.iter().enumerate().map(|(k, v)| k as f64 * v).sum::<f64>())
                .unwrap_or(f64::NAN);
            print!(" {mean:>10.4}");
        }
        println!();
    }
}

fn clear_progress_line() {
    eprint!("\r{}\r", " ".repeat(100));
    let _ = io::stderr().flush();
}

fn render_progress(p: &SimProgress) {
    let width = 28usize;
    let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
    eprint!(
        "\r[{}{}] {:>6.2}%  t={:.3e}/{:.3e}s  step={}/{}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        p.fraction_complete * 100.0,
        p.time,
        p.time_max,
        p.step,
        p.max_steps
    );
    let _ = io::stderr().flush();
}

fn open_source(catalog: Option<&Path>) -> AppResult<Box<dyn RateSource>> {
    let source: Box<dyn RateSource> = match catalog {
        Some(path) => Box::new(RateCatalog::from_json_file(path)?),
        None => Box::new(HydrogenicRates::default()),
    };
    Ok(source)
}

fn element_table(element: &str, catalog: Option<&Path>) -> AppResult<RateTable> {
    let element: Element = nei_project::resolve_element(element)
        .map_err(|e| AppError::Argument(e.to_string()))?;
    let source = open_source(catalog)?;
    Ok(RateTable::from_source(source.as_ref(), element)?)
}

fn cmd_equilibrium(element: &str, temperature: f64, catalog: Option<&Path>) -> AppResult<()> {
    let table = element_table(element, catalog)?;
    let grid = table.lookup(temperature)?;
    let entry = table.entry(grid.index)?;
    if grid.is_clamped() {
        eprintln!(
            "note: {temperature} K lies outside the table, using the boundary node at {:.4e} K",
            entry.temperature
        );
    }
    println!(
        "{} equilibrium at {:.4e} K (node {})",
        table.element().name(),
        entry.temperature,
        grid.index
    );
    for (charge, f) in entry.equilibrium.iter().enumerate() {
        println!("  {:<8} {:.6e}", table.element().ion_label(charge), f);
    }
    Ok(())
}

fn cmd_table(element: &str, query: GridQuery, catalog: Option<&Path>) -> AppResult<()> {
    let table = element_table(element, catalog)?;
    let entry = table.resolve(query)?;
    println!(
        "{} rate table: {} nodes from {:.3e} K to {:.3e} K",
        table.element().name(),
        table.len(),
        table.temperature_grid().first().copied().unwrap_or(f64::NAN),
        table.temperature_grid().last().copied().unwrap_or(f64::NAN)
    );
    println!("Node at {:.4e} K", entry.temperature);
    println!(
        "  {:<8} {:>12} {:>12} {:>12} {:>12}",
        "ion", "ionize", "recombine", "equilib", "eigenvalue"
    );
    for charge in 0..table.nstates() {
        println!(
            "  {:<8} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e}",
            table.element().ion_label(charge),
            entry.ionization[charge],
            entry.recombination[charge],
            entry.equilibrium[charge],
            entry.eigenvalues[charge]
        );
    }
    Ok(())
}
