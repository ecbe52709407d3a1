use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};

use collabscope_core::CollabConfig;
use collabscope_engine::export::{render, ExportOptions};
use collabscope_engine::{analyze, AnalyzeOptions};
use collabscope_store::AnalysisStore;

#[derive(Parser)]
#[command(
    name = "collabscope",
    version,
    about = "Git collaboration analysis — who really built this repository?",
    long_about = "Collabscope reconstructs a repository's commit history and answers who\n\
                   actually built it: deduplicated contributors, co-author credit splitting,\n\
                   bot detection, weighted collaboration scores, and shared-account flags.\n\n\
                   Examples:\n  \
                     collabscope analyze --path .             Analyze the current repository\n  \
                     collabscope analyze --format csv         Spreadsheet-friendly output\n  \
                     collabscope project add api ~/src/api    Register a project\n  \
                     collabscope refresh                      Re-analyze all registered projects\n  \
                     collabscope export api --format json     Export the stored analysis\n  \
                     collabscope init                         Create a .collabscope.toml config"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .collabscope.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the project database (default: .collabscope.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a repository's collaboration history
    #[command(long_about = "Analyze a repository's collaboration history.\n\n\
        Walks non-merge commits, splits credit across co-authored commits, detects\n\
        bot accounts, and computes normalized weighted collaboration scores.\n\n\
        Examples:\n  collabscope analyze --path .\n  collabscope analyze --all-branches --format csv\n  collabscope analyze --main-email lead@example.com --include-bots")]
    Analyze {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Output format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,

        /// Walk history reachable from all branches instead of HEAD only
        #[arg(long)]
        all_branches: bool,

        /// Only include commits at or after this epoch timestamp
        #[arg(long)]
        since: Option<i64>,

        /// Only include commits at or before this epoch timestamp
        #[arg(long)]
        until: Option<i64>,

        /// Preferred main-author email (repeatable, in priority order)
        #[arg(long = "main-email")]
        main_emails: Vec<String>,

        /// Extra bot-name pattern (repeatable, case-insensitive regex)
        #[arg(long = "bot-pattern")]
        bot_patterns: Vec<String>,

        /// Include bot contributors in CSV output
        #[arg(long)]
        include_bots: bool,

        /// Write output to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Manage the project registry
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Re-analyze every registered project and store the results
    #[command(long_about = "Re-analyze every registered project and store the results.\n\n\
        Runs the full analysis for each project in the registry and replaces its\n\
        stored result. A project that fails (moved repository, bad permissions)\n\
        is reported and skipped; the remaining projects still refresh.\n\n\
        Example:\n  collabscope refresh")]
    Refresh,
    /// Export the stored analysis for a registered project
    #[command(long_about = "Export the stored analysis for a registered project.\n\n\
        Reads the latest stored result without re-analyzing the repository.\n\n\
        Examples:\n  collabscope export api\n  collabscope export api --format csv --output api.csv")]
    Export {
        /// Project name
        name: String,

        /// Output format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,

        /// Include bot contributors in CSV output
        #[arg(long)]
        include_bots: bool,

        /// Write output to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Create a default .collabscope.toml configuration file
    #[command(long_about = "Create a default .collabscope.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .collabscope.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Register a repository under a project name
    Add {
        /// Unique project name
        name: String,

        /// Repository path
        path: PathBuf,

        /// Preferred main-author email for this project
        #[arg(long)]
        main_email: Option<String>,
    },
    /// List registered projects and their latest analysis
    List,
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("collabscope v{version} — who really built this repository?\n");

    println!("Quick start:");
    println!("  collabscope init                  Create a .collabscope.toml config file");
    println!("  collabscope analyze --path .      Analyze the current repository");
    println!("  collabscope project add api .     Register a project for batch refresh\n");

    println!("All commands:");
    println!("  analyze   Contributor attribution, scoring, and classification");
    println!("  project   Register and list projects");
    println!("  refresh   Re-analyze all registered projects");
    println!("  export    Export a stored analysis as JSON or CSV");
    println!("  init      Create default configuration\n");

    println!("Run 'collabscope <command> --help' for details.");
}

const DEFAULT_CONFIG: &str = r#"# Collabscope Configuration
# See: https://github.com/collabscope/collabscope

[analysis]
# Extra bot-name patterns (case-insensitive regexes, unioned with built-ins)
# bot_patterns = ["internal-ci", "ops-robot"]

# Preferred main-author emails, in priority order
# main_author_emails = ["lead@example.com"]

# Walk all branches instead of HEAD only
# all_branches = false

# Ceiling for captured git output, in bytes
# max_output_bytes = 10485760

[analysis.weights]
# Relative score weights; normalized to sum to 1.0
# commits = 0.4
# linesChanged = 0.4
# reviews = 0.2

[export]
# Include bot contributors in CSV output
# include_bots = false

# JSON indent width
# pretty = 2
"#;

fn load_config(cli: &Cli) -> Result<CollabConfig> {
    match &cli.config {
        Some(path) => CollabConfig::from_file(path)
            .into_diagnostic()
            .wrap_err(format!("loading {}", path.display())),
        None => {
            let default_path = Path::new(".collabscope.toml");
            if default_path.exists() {
                CollabConfig::from_file(default_path)
                    .into_diagnostic()
                    .wrap_err("loading .collabscope.toml")
            } else {
                Ok(CollabConfig::default())
            }
        }
    }
}

fn open_store(cli: &Cli) -> Result<AnalysisStore> {
    let path = cli
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(".collabscope.db"));
    AnalysisStore::open(&path)
        .into_diagnostic()
        .wrap_err(format!("opening {}", path.display()))
}

/// Merge config-file settings with CLI overrides into engine options.
fn analyze_options(
    config: &CollabConfig,
    all_branches: bool,
    since: Option<i64>,
    until: Option<i64>,
    main_emails: &[String],
    bot_patterns: &[String],
) -> AnalyzeOptions {
    let analysis = &config.analysis;
    let mut preferred_emails = main_emails.to_vec();
    preferred_emails.extend(analysis.main_author_emails.iter().cloned());
    let mut patterns = analysis.bot_patterns.clone();
    patterns.extend(bot_patterns.iter().cloned());
    AnalyzeOptions {
        all_branches: all_branches || analysis.all_branches,
        preferred_emails,
        bot_patterns: patterns,
        weights: Some(analysis.weights),
        since,
        until,
        max_output_bytes: analysis.max_output_bytes,
    }
}

fn write_output(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .into_diagnostic()
                .wrap_err(format!("writing {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        None => {
            print_welcome();
            Ok(())
        }
        Some(Command::Analyze {
            ref path,
            ref format,
            all_branches,
            since,
            until,
            ref main_emails,
            ref bot_patterns,
            include_bots,
            ref output,
        }) => {
            let options = analyze_options(
                &config,
                all_branches,
                since,
                until,
                main_emails,
                bot_patterns,
            );
            let result = analyze(path, &options)
                .into_diagnostic()
                .wrap_err(format!("analyzing {}", path.display()))?;

            if cli.verbose {
                eprintln!(
                    "{}: {} commits, {} human / {} bot contributors ({})",
                    path.display(),
                    result.totals.total_commits,
                    result.human_contributor_count,
                    result.bot_contributor_count,
                    result.classification,
                );
            }

            let export_opts = ExportOptions {
                include_bots: include_bots || config.export.include_bots,
                pretty: config.export.pretty,
            };
            let rendered = render(&result, format, &export_opts).into_diagnostic()?;
            write_output(&rendered, output.as_deref())
        }
        Some(Command::Project(ProjectCommand::Add {
            ref name,
            ref path,
            ref main_email,
        })) => {
            if !path.exists() {
                miette::bail!(miette::miette!(
                    help = "Check the path, or clone the repository first",
                    "Repository path does not exist: {}",
                    path.display()
                ));
            }
            let store = open_store(&cli)?;
            let project = store
                .add_project(
                    name,
                    &path.to_string_lossy(),
                    main_email.as_deref(),
                )
                .into_diagnostic()
                .wrap_err(format!("registering project '{name}'"))?;
            println!("Registered '{}' -> {}", project.name, project.repo_path);
            Ok(())
        }
        Some(Command::Project(ProjectCommand::List)) => {
            let store = open_store(&cli)?;
            let projects = store.list_projects().into_diagnostic()?;
            if projects.is_empty() {
                println!("No projects registered. Use 'collabscope project add <name> <path>'.");
                return Ok(());
            }
            for project in &projects {
                let status = match store.latest_analysis(project.id).into_diagnostic()? {
                    Some(stored) => format!(
                        "{} ({} commits, main: {})",
                        stored.classification,
                        stored.total_commits,
                        stored
                            .main_author_name
                            .as_deref()
                            .unwrap_or("unknown"),
                    ),
                    None => "not analyzed".to_string(),
                };
                println!("  {:<20} {:<40} {status}", project.name, project.repo_path);
            }
            Ok(())
        }
        Some(Command::Refresh) => {
            let store = open_store(&cli)?;
            let projects = store.list_projects().into_diagnostic()?;
            if projects.is_empty() {
                println!("No projects registered; nothing to refresh.");
                return Ok(());
            }

            let is_tty = std::io::stderr().is_terminal();
            let bar = if is_tty {
                let pb = indicatif::ProgressBar::new(projects.len() as u64);
                pb.set_style(
                    indicatif::ProgressStyle::with_template(
                        "{bar:30.cyan/blue} {pos}/{len} {msg}",
                    )
                    .into_diagnostic()?,
                );
                Some(pb)
            } else {
                None
            };

            let mut refreshed = 0usize;
            let mut failed = 0usize;
            for project in &projects {
                if let Some(pb) = &bar {
                    pb.set_message(project.name.clone());
                }
                let mut options =
                    analyze_options(&config, false, None, None, &[], &[]);
                if let Some(email) = &project.main_author_email {
                    options.preferred_emails.insert(0, email.clone());
                }
                // One bad project must not abort the batch.
                match analyze(Path::new(&project.repo_path), &options)
                    .and_then(|result| store.upsert_analysis(project.id, &result))
                {
                    Ok(()) => refreshed += 1,
                    Err(err) => {
                        failed += 1;
                        tracing::warn!(project = %project.name, %err, "refresh failed");
                        eprintln!("  failed: {} — {err}", project.name);
                    }
                }
                if let Some(pb) = &bar {
                    pb.inc(1);
                }
            }
            if let Some(pb) = bar {
                pb.finish_and_clear();
            }
            println!("Refreshed {refreshed} projects, {failed} failed");
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Export {
            ref name,
            ref format,
            include_bots,
            ref output,
        }) => {
            let store = open_store(&cli)?;
            let Some(project) = store.project_by_name(name).into_diagnostic()? else {
                miette::bail!(miette::miette!(
                    help = "Register it with 'collabscope project add', then 'collabscope refresh'",
                    "Unknown project: {name}"
                ));
            };
            let Some(stored) = store.latest_analysis(project.id).into_diagnostic()? else {
                miette::bail!(miette::miette!(
                    help = "Run 'collabscope refresh' to analyze registered projects",
                    "Project '{name}' has not been analyzed yet"
                ));
            };
            let Some(result) = stored.details else {
                miette::bail!(miette::miette!(
                    help = "Run 'collabscope refresh' to replace the stored result",
                    "Stored analysis for '{name}' could not be decoded"
                ));
            };
            let export_opts = ExportOptions {
                include_bots: include_bots || config.export.include_bots,
                pretty: config.export.pretty,
            };
            let rendered = render(&result, format, &export_opts).into_diagnostic()?;
            write_output(&rendered, output.as_deref())
        }
        Some(Command::Init) => {
            let path = Path::new(".collabscope.toml");
            if path.exists() {
                miette::bail!(".collabscope.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .collabscope.toml with default configuration");
            Ok(())
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "collabscope", &mut std::io::stdout());
            Ok(())
        }
    }
}
