//! latticegen command line interface
//!
//! Generates and checks the particle/parameter artifact pair for SPH-style solvers.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use latticegen::io::{self, DirectorySink};
use latticegen::{pipeline, GeneratorConfig};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Lattice initial conditions for SPH-style particle solvers
#[derive(Parser)]
#[command(name = "latticegen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate lattice particle inputs and solver parameter files", long_about = None)]
struct Cli {
    /// Log level
    #[arg(short, long, value_enum, ignore_case = true, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write `<name>.in` and `<name>.par` for a scenario
    Generate(GenerateArgs),
    /// Print lattice counts and derived parameters without writing files
    Show(ScenarioArgs),
    /// Check that a parameter file and its particle file agree
    Verify(VerifyArgs),
}

/// Scenario selection: a TOML file or a built-in preset.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ScenarioArgs {
    /// Scenario TOML file
    scenario: Option<PathBuf>,

    /// Built-in scenario (dam_coarse, dam_miles)
    #[arg(short, long)]
    preset: Option<String>,
}

impl ScenarioArgs {
    fn load(&self) -> Result<GeneratorConfig> {
        match (&self.scenario, &self.preset) {
            (Some(path), _) => GeneratorConfig::load(path)
                .with_context(|| format!("failed to load scenario '{}'", path.display())),
            (None, Some(name)) => GeneratorConfig::preset(name).with_context(|| {
                format!(
                    "unknown preset '{name}', expected one of {:?}",
                    GeneratorConfig::PRESETS
                )
            }),
            (None, None) => bail!("either a scenario file or --preset is required"),
        }
    }
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    scenario: ScenarioArgs,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

#[derive(Args)]
struct VerifyArgs {
    /// Parameter file (.par); its particle file is resolved next to it
    parameter_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Show(args) => show(args),
        Commands::Verify(args) => verify(args),
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let config = args.scenario.load()?;
    let mut sink = DirectorySink::new(&args.output)
        .with_context(|| format!("cannot use output directory '{}'", args.output.display()))?;
    let plan = pipeline::run(&config, &mut sink)
        .with_context(|| format!("generation of '{}' failed", config.name))?;
    info!(
        particles = plan.particle_count(),
        particle_file = %sink.path_of(&plan.particle_file).display(),
        parameter_file = %sink.path_of(&plan.parameter_file).display(),
        "done"
    );
    Ok(())
}

fn show(args: ScenarioArgs) -> Result<()> {
    let config = args.load()?;
    let plan = pipeline::prepare(&config)
        .with_context(|| format!("scenario '{}' is invalid", config.name))?;
    let [nx, ny, nz] = plan.lattice_counts();
    println!("lattice               {nx} x {ny} x {nz}");
    println!("particles             {}", plan.particle_count());
    println!("spacing               {:?}", config.spacing());
    println!("density_mode          {:?}", config.density_mode);
    println!();
    for line in io::parameter_lines(&plan.params) {
        println!("{line}");
    }
    Ok(())
}

fn verify(args: VerifyArgs) -> Result<()> {
    let report = io::verify(&args.parameter_file)
        .with_context(|| format!("cannot verify '{}'", args.parameter_file.display()))?;
    let [nx, ny, nz] = report.lattice_counts;
    println!("particle_file         {}", report.particle_file.display());
    println!("particles             {}", report.particle_count);
    println!("lattice               {nx} x {ny} x {nz}");
    match report.density_mode {
        Some(mode) => println!("density_mode          {mode:?}"),
        None => println!("density_mode          unknown"),
    }
    for issue in &report.issues {
        warn!("{issue}");
    }
    if !report.is_consistent() {
        bail!(
            "'{}' and '{}' are inconsistent ({} issue(s))",
            report.parameter_file.display(),
            report.particle_file.display(),
            report.issues.len()
        );
    }
    info!("artifact pair is consistent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_level_is_parsed() -> Result<()> {
        let cli = Cli::try_parse_from(["latticegen", "--log-level", "DEBUG", "show", "-p", "dam_coarse"])?;
        assert_eq!(cli.log_level, LogLevel::Debug);
        let cli = Cli::try_parse_from(["latticegen", "show", "-p", "dam_coarse"])?;
        assert_eq!(cli.log_level, LogLevel::Info);
        Ok(())
    }

    #[test]
    fn unknown_log_level_rejected() {
        let parsed = Cli::try_parse_from(["latticegen", "--log-level", "loud", "show", "-p", "dam_coarse"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn scenario_file_and_preset_are_exclusive() {
        let parsed = Cli::try_parse_from(["latticegen", "show", "dam.toml", "-p", "dam_coarse"]);
        assert!(parsed.is_err());
        assert!(Cli::try_parse_from(["latticegen", "show"]).is_err());
    }
}
