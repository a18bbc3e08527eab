mod check;
mod edit;
mod export;
mod fmt;
mod stats;
mod view;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use propbundle::Preferences;
use propbundle_cli::validation::{parse_locale, validate_file_path};
use propbundle_cli::{Family, expand_inputs, family_sources, load_preferences};
use tracing_subscriber::EnvFilter;

use crate::check::run_check_command;
use crate::edit::{EditAction, run_edit_command};
use crate::export::run_export_command;
use crate::fmt::run_fmt_command;
use crate::stats::print_stats;
use crate::view::{print_tree, print_view};

#[derive(Parser, Debug)]
#[command(name = "propbundle", author, version, about, long_about = None)]
struct Args {
    /// Preferences file (defaults to propbundle.toml next to the bundle files)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log more details (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show every key with its value in each locale.
    View {
        /// Any file of the bundle family
        #[arg(short, long)]
        input: String,

        /// Only show this locale (`default` for the root bundle)
        #[arg(short, long)]
        locale: Option<String>,

        /// Display full values without truncation
        #[arg(long)]
        full: bool,
    },

    /// Show the key tree.
    Tree {
        /// Any file of the bundle family
        #[arg(short, long)]
        input: String,

        /// List keys flat instead of grouping them on the separator
        #[arg(long)]
        flat: bool,

        /// Only show keys missing a value in some locale
        #[arg(long)]
        incomplete: bool,

        /// Only show keys containing this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show per-locale statistics.
    Stats {
        /// Any file of the bundle family
        #[arg(short, long)]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report missing, duplicate, and similar values; fails if any are found.
    Check {
        /// Bundle files or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Also report similar values
        #[arg(long)]
        similar: bool,
    },

    /// Add an empty key to every locale.
    Add {
        #[arg(short, long)]
        input: String,
        key: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Set the value of a key in one locale.
    Set {
        #[arg(short, long)]
        input: String,
        /// Target locale (`default` for the root bundle); created if missing
        #[arg(short, long, default_value = "default")]
        locale: String,
        key: String,
        value: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Rename a key in every locale.
    Rename {
        #[arg(short, long)]
        input: String,
        from: String,
        to: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Copy a key in every locale.
    Copy {
        #[arg(short, long)]
        input: String,
        from: String,
        to: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove a key from every locale.
    Remove {
        #[arg(short, long)]
        input: String,
        key: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Comment a key out in every locale.
    Comment {
        #[arg(short, long)]
        input: String,
        key: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore a commented-out key in every locale.
    Uncomment {
        #[arg(short, long)]
        input: String,
        key: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Rewrite bundle files with the configured layout.
    Fmt {
        /// Bundle files or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Only report files that would change; fails if any would
        #[arg(long)]
        check: bool,
    },

    /// Export a bundle family as CSV, one column per locale.
    Export {
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the effective preferences as TOML.
    Config {
        /// Any file of a bundle family; its directory is searched for propbundle.toml
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_families(
    inputs: &[String],
    config: Option<&Path>,
    adjust: impl Fn(&mut Preferences),
) -> Result<Vec<Family>, String> {
    let paths = expand_inputs(inputs)?;
    family_sources(&paths)?
        .into_iter()
        .map(|source| Family::from_source_with(source, config, &adjust))
        .collect()
}

fn edit(input: &str, config: Option<&Path>, action: EditAction, dry_run: bool) -> Result<(), String> {
    let mut family = Family::open(input, config)?;
    run_edit_command(&mut family, action, dry_run)
}

fn run(args: Args) -> Result<(), String> {
    let config = args.config.as_deref();
    match args.commands {
        Commands::View { input, locale, full } => {
            let family = Family::open(&input, config)?;
            let locale = locale.as_deref().map(parse_locale).transpose()?;
            print_view(&family.session, locale.as_ref(), full)
        }
        Commands::Tree {
            input,
            flat,
            incomplete,
            filter,
        } => {
            let mut family = Family::open(&input, config)?;
            let session = &mut family.session;
            if flat {
                session.set_grouped(false);
            }
            if incomplete {
                session.show_incomplete_only(true);
            }
            if let Some(filter) = filter {
                session.filter_keys(&filter);
            }
            print_tree(session);
            Ok(())
        }
        Commands::Stats { input, json } => {
            let family = Family::open(&input, config)?;
            print_stats(&family.session, json)
        }
        Commands::Check {
            inputs,
            json,
            similar,
        } => {
            let families = open_families(&inputs, config, |preferences| {
                preferences.report_similar_values |= similar;
            })?;
            run_check_command(&families, json)
        }
        Commands::Add { input, key, dry_run } => edit(&input, config, EditAction::Add { key }, dry_run),
        Commands::Set {
            input,
            locale,
            key,
            value,
            dry_run,
        } => edit(&input, config, EditAction::Set { locale, key, value }, dry_run),
        Commands::Rename {
            input,
            from,
            to,
            dry_run,
        } => edit(&input, config, EditAction::Rename { from, to }, dry_run),
        Commands::Copy {
            input,
            from,
            to,
            dry_run,
        } => edit(&input, config, EditAction::Copy { from, to }, dry_run),
        Commands::Remove { input, key, dry_run } => {
            edit(&input, config, EditAction::Remove { key }, dry_run)
        }
        Commands::Comment { input, key, dry_run } => {
            edit(&input, config, EditAction::Comment { key }, dry_run)
        }
        Commands::Uncomment { input, key, dry_run } => {
            edit(&input, config, EditAction::Uncomment { key }, dry_run)
        }
        Commands::Fmt { inputs, check } => {
            let mut families = open_families(&inputs, config, |_| {})?;
            run_fmt_command(&mut families, check)
        }
        Commands::Export { input, output } => {
            let family = Family::open(&input, config)?;
            run_export_command(&family, output.as_deref())
        }
        Commands::Config { input } => {
            let dir = match &input {
                Some(input) => {
                    validate_file_path(input)?;
                    Path::new(input)
                        .parent()
                        .filter(|parent| !parent.as_os_str().is_empty())
                        .unwrap_or(Path::new("."))
                        .to_path_buf()
                }
                None => PathBuf::from("."),
            };
            let preferences = load_preferences(config, &dir)?;
            let text = toml::to_string_pretty(&preferences)
                .map_err(|e| format!("Error serializing preferences: {}", e))?;
            print!("{}", text);
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut command = Args::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
