//! Main entry point for the cohortvar CLI.

use clap::{command, Args, Parser, Subcommand};

use cohortvar::{common, filter, higlass, regenie, variants};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Case-control statistics and HiGlass files for annotated cohort VCFs"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Variant filtering commands.
    Filter(Filter),
    /// Variant level result commands.
    Variants(Variants),
    /// Regenie input preparation commands.
    Regenie(Regenie),
    /// HiGlass file commands.
    Higlass(Higlass),
}

/// Parsing of "filter *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Filter {
    /// The sub command to run
    #[command(subcommand)]
    command: FilterCommands,
}

/// Enum supporting the parsing of "filter *" sub commands.
#[derive(Debug, Subcommand)]
enum FilterCommands {
    Gatk(filter::gatk::Args),
}

/// Parsing of "variants *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Variants {
    /// The sub command to run
    #[command(subcommand)]
    command: VariantsCommands,
}

/// Enum supporting the parsing of "variants *" sub commands.
#[derive(Debug, Subcommand)]
enum VariantsCommands {
    Results(variants::results::Args),
    Details(variants::details::Args),
}

/// Parsing of "regenie *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Regenie {
    /// The sub command to run
    #[command(subcommand)]
    command: RegenieCommands,
}

/// Enum supporting the parsing of "regenie *" sub commands.
#[derive(Debug, Subcommand)]
enum RegenieCommands {
    Masks(regenie::masks::Args),
    Phenotype(regenie::phenotype::Args),
    Popmap(regenie::popmap::Args),
}

/// Parsing of "higlass *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Higlass {
    /// The sub command to run
    #[command(subcommand)]
    command: HiglassCommands,
}

/// Enum supporting the parsing of "higlass *" sub commands.
#[derive(Debug, Subcommand)]
enum HiglassCommands {
    Genes(higlass::genes::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    tracing::subscriber::with_default(collector, || {
        tracing::info!("cohortvar {} startup", common::version());

        match &cli.command {
            Commands::Filter(cmd) => match &cmd.command {
                FilterCommands::Gatk(args) => filter::gatk::run(&cli.common, args)?,
            },
            Commands::Variants(cmd) => match &cmd.command {
                VariantsCommands::Results(args) => variants::results::run(&cli.common, args)?,
                VariantsCommands::Details(args) => variants::details::run(&cli.common, args)?,
            },
            Commands::Regenie(cmd) => match &cmd.command {
                RegenieCommands::Masks(args) => regenie::masks::run(&cli.common, args)?,
                RegenieCommands::Phenotype(args) => regenie::phenotype::run(&cli.common, args)?,
                RegenieCommands::Popmap(args) => regenie::popmap::run(&cli.common, args)?,
            },
            Commands::Higlass(cmd) => match &cmd.command {
                HiglassCommands::Genes(args) => higlass::genes::run(&cli.common, args)?,
            },
        }

        tracing::info!("All done. Have a nice day!");

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
