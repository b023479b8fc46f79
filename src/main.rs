use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use research_merge::config::{find_config_file, get_config, load_config, Config, ConfigFile};
use research_merge::dedup::{classify, deduplicate_table, resolve_keys};
use research_merge::io;
use research_merge::models::MergeReport;
use research_merge::pipeline::{merge, stack};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Research Merge - Merge literature-search exports and collapse duplicate records
#[derive(Parser, Debug)]
#[command(name = "research-merge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge literature-search exports, collapsing duplicates while keeping per-source provenance", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format for run summaries
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge datasets into one, collapsing duplicate records
    #[command(alias = "m")]
    Merge {
        /// Output file (records without abstract go to a sibling file)
        output_path: PathBuf,

        /// Datasets to merge, earlier files win when records are duplicated
        #[arg(required = true)]
        datasets: Vec<PathBuf>,

        /// Persistent identifier column (default from config: doi)
        #[arg(long)]
        pid: Option<String>,
    },

    /// Remove duplicate records from a single dataset
    #[command(alias = "dedup")]
    Dedupe {
        /// Input dataset
        input: PathBuf,

        /// Output file (default: overwrite input)
        #[arg(long = "out")]
        out: Option<PathBuf>,

        /// Persistent identifier column (default from config: doi)
        #[arg(long)]
        pid: Option<String>,

        /// Show duplicate groups without removing
        #[arg(long, short)]
        show: bool,
    },

    /// Stack datasets, listing every source a record was found in
    Stack {
        /// Output file
        output_path: PathBuf,

        /// Datasets to stack, earlier files win when records are duplicated
        #[arg(required = true)]
        datasets: Vec<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        /// Subcommand
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a configuration file with default settings
    Init {
        /// Where to write the file
        #[arg(default_value = research_merge::config::CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => get_config(),
    };

    // Initialize tracing; RUST_LOG wins over flags and the configured level
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| log_filter(cli.verbose, cli.quiet, &config.logging.level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command {
        Some(Commands::Merge {
            output_path,
            datasets,
            pid,
        }) => {
            let config = with_pid(config, pid);
            let report = merge(&output_path, &datasets, &config)?;
            if !cli.quiet {
                output_report(&report, cli.output)?;
            }
        }

        Some(Commands::Dedupe {
            input,
            out,
            pid,
            show,
        }) => {
            let config = with_pid(config, pid);
            let settings = &config.merge;
            let mut table = io::load(&input, &config.columns, &settings.mother_id_column)?;

            if show {
                let classification = classify(&resolve_keys(
                    &table,
                    &settings.pid,
                    &settings.text_fields,
                ));
                let groups: Vec<Vec<usize>> = classification
                    .clusters()
                    .into_iter()
                    .filter(|g| g.len() > 1)
                    .collect();
                if groups.is_empty() {
                    println!("No duplicates found");
                } else {
                    println!("Found {} duplicate groups:", groups.len());
                    for (i, group) in groups.iter().enumerate() {
                        println!("  Group {}: {} records", i + 1, group.len());
                        for &row in group {
                            println!(
                                "    - [{}] {}",
                                row,
                                table.get(row, "title").unwrap_or("<untitled>")
                            );
                        }
                    }
                }
            } else {
                let before = table.len();
                deduplicate_table(&mut table, &settings.pid, &settings.text_fields);
                let output_path = out.as_ref().unwrap_or(&input);
                io::write(&table, output_path)?;
                if !cli.quiet {
                    eprintln!(
                        "Deduplicated: {} -> {} records ({})",
                        before,
                        table.len(),
                        output_path.display()
                    );
                }
            }
        }

        Some(Commands::Stack {
            output_path,
            datasets,
        }) => {
            let report = stack(&output_path, &datasets, &config)?;
            if !cli.quiet {
                output_report(&report, cli.output)?;
            }
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Init { path, force } => {
                if path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                ConfigFile::from(Config::default()).save(&path)?;
                if !cli.quiet {
                    eprintln!("Wrote default configuration to {}", path.display());
                }
            }
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&ConfigFile::from(config))?);
            }
        },

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Filter directive for the crate's logs: `-q` and `-v` override the configured level
fn log_filter(verbose: u8, quiet: bool, configured: &str) -> String {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => configured,
            1 => "debug",
            _ => "trace",
        }
    };
    format!("research_merge={}", level)
}

fn with_pid(mut config: Config, pid: Option<String>) -> Config {
    if let Some(pid) = pid {
        config.merge.pid = pid;
    }
    config
}

fn output_report(report: &MergeReport, format: OutputFormat) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    match actual_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};

            let mut inputs = Table::new();
            inputs.load_preset(comfy_table::presets::UTF8_FULL);
            inputs.set_header(vec!["Input", "Records"]);
            for input in &report.inputs {
                inputs.add_row(vec![
                    Cell::new(input.path.display()).add_attribute(Attribute::Bold),
                    Cell::new(input.records),
                ]);
            }
            println!("Statistics about input sets:");
            println!("{inputs}");

            let mut merged = Table::new();
            merged.load_preset(comfy_table::presets::UTF8_FULL);
            merged.set_header(vec!["", "Records"]);
            merged.add_row(vec![Cell::new("Stacked"), Cell::new(report.stacked_records)]);
            merged.add_row(vec![
                Cell::new("Duplicates removed"),
                Cell::new(report.duplicates_removed),
            ]);
            merged.add_row(vec![Cell::new("Unique"), Cell::new(report.unique_records)]);
            merged.add_row(vec![
                Cell::new(format!("Complete ({})", report.output.display())),
                Cell::new(report.complete_records),
            ]);
            if let Some(path) = &report.incomplete_output {
                merged.add_row(vec![
                    Cell::new(format!("Missing abstract ({})", path.display())),
                    Cell::new(report.incomplete_records),
                ]);
            }
            merged.add_row(vec![Cell::new("New mother-IDs"), Cell::new(report.minted_ids)]);
            println!("Statistics after merging:");
            println!("{merged}");
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(!version.is_empty());
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["research-merge"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["research-merge", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["research-merge", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["research-merge", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);

        let cli = Cli::parse_from(["research-merge", "--output", "table"]);
        assert_eq!(cli.output, OutputFormat::Table);
    }

    #[test]
    fn test_cli_merge_command() {
        let cli = Cli::parse_from([
            "research-merge",
            "merge",
            "merged.csv",
            "scopus.csv",
            "wos.csv",
            "--pid",
            "pmid",
        ]);
        match &cli.command {
            Some(Commands::Merge {
                output_path,
                datasets,
                pid,
            }) => {
                assert_eq!(output_path, &PathBuf::from("merged.csv"));
                assert_eq!(
                    datasets,
                    &vec![PathBuf::from("scopus.csv"), PathBuf::from("wos.csv")]
                );
                assert_eq!(pid.as_deref(), Some("pmid"));
            }
            _ => panic!("Expected Merge command"),
        }
    }

    #[test]
    fn test_cli_merge_requires_inputs() {
        assert!(Cli::try_parse_from(["research-merge", "merge", "merged.csv"]).is_err());
    }

    #[test]
    fn test_cli_dedupe_command() {
        let cli = Cli::parse_from(["research-merge", "dedup", "in.csv", "--out", "out.csv", "-s"]);
        match &cli.command {
            Some(Commands::Dedupe {
                input, out, show, ..
            }) => {
                assert_eq!(input, &PathBuf::from("in.csv"));
                assert_eq!(out, &Some(PathBuf::from("out.csv")));
                assert!(*show);
            }
            _ => panic!("Expected Dedupe command"),
        }
    }

    #[test]
    fn test_cli_config_init() {
        let cli = Cli::parse_from(["research-merge", "config", "init"]);
        match &cli.command {
            Some(Commands::Config {
                command: ConfigCommands::Init { path, force },
            }) => {
                assert_eq!(path, &PathBuf::from("research-merge.toml"));
                assert!(!force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_with_pid_override() {
        let config = with_pid(Config::default(), Some("pmid".to_string()));
        assert_eq!(config.merge.pid, "pmid");
        let config = with_pid(Config::default(), None);
        assert_eq!(config.merge.pid, "doi");
    }

    #[test]
    fn test_log_filter_uses_configured_level() {
        assert_eq!(log_filter(0, false, "warn"), "research_merge=warn");
        assert_eq!(log_filter(1, false, "warn"), "research_merge=debug");
        assert_eq!(log_filter(2, false, "warn"), "research_merge=trace");
        assert_eq!(log_filter(2, true, "warn"), "research_merge=error");
    }
}
