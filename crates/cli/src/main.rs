mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use dairyops_core::{FilterCriteria, RecordKind, Role};
use time::Date;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Dairy farm records from the command line.
#[derive(Parser)]
#[command(name = "dairyops", version, about = "Dairy farm operations records")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to the configuration file (default: ./dairyops.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by the record commands.
#[derive(clap::Args, Debug, Clone)]
struct FilterArgs {
    /// Case-insensitive text matched against the kind's search fields
    #[arg(long, default_value = "")]
    search: String,
    /// Earliest date, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Option<Date>,
    /// Latest date, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    to: Option<Date>,
    /// Facet value to match exactly ("All" disables)
    #[arg(long)]
    facet: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            free_text: self.search.clone(),
            date_from: self.from,
            date_to: self.to,
            facet: self.facet.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Password policy tools
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },

    /// List records of one kind, newest first
    List {
        /// Record kind (milk-yield, feed-stock, purchase-request, milking-hygiene, attendance, record-backup)
        kind: RecordKind,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Summary totals for the filtered records
    Summary {
        /// Record kind
        kind: RecordKind,
        #[command(flatten)]
        filter: FilterArgs,
        /// Break totals down by calendar month
        #[arg(long)]
        monthly: bool,
    },

    /// Delete one record after confirmation
    Delete {
        /// Record kind
        kind: RecordKind,
        /// Record id
        id: String,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Download a spreadsheet of the filtered records
    Export {
        /// Record kind
        kind: RecordKind,
        #[command(flatten)]
        filter: FilterArgs,
        /// Where to write the file (default: the name suggested by the server)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Create a user account (admin only)
    CreateAccount {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Role of the new account
        #[arg(long, default_value = "supervisor")]
        role: Role,
    },
}

#[derive(Subcommand)]
enum PasswordCommands {
    /// Check a candidate password against the policy
    Check {
        /// The candidate password
        candidate: String,
    },
}

fn parse_date(s: &str) -> Result<Date, String> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(s, &format).map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing();

    if let Commands::Password {
        command: PasswordCommands::Check { candidate },
    } = &cli.command
    {
        commands::password::cmd_check(candidate, cli.output, cli.quiet);
        return;
    }

    let settings = match config::load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            report_error(&e, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                cli.output,
                cli.quiet,
            );
            process::exit(1);
        }
    };

    let (output, quiet) = (cli.output, cli.quiet);
    match cli.command {
        Commands::Password { .. } => {}
        Commands::List { kind, filter } => {
            rt.block_on(commands::records::cmd_list(
                &settings,
                kind,
                filter.criteria(),
                output,
                quiet,
            ));
        }
        Commands::Summary {
            kind,
            filter,
            monthly,
        } => {
            rt.block_on(commands::records::cmd_summary(
                &settings,
                kind,
                filter.criteria(),
                monthly,
                output,
                quiet,
            ));
        }
        Commands::Delete { kind, id, yes } => {
            rt.block_on(commands::records::cmd_delete(
                &settings, kind, &id, yes, output, quiet,
            ));
        }
        Commands::Export { kind, filter, out } => {
            rt.block_on(commands::records::cmd_export(
                &settings,
                kind,
                filter.criteria(),
                out.as_deref(),
                output,
                quiet,
            ));
        }
        Commands::CreateAccount {
            username,
            password,
            confirm_password,
            role,
        } => {
            rt.block_on(commands::account::cmd_create_account(
                &settings,
                commands::account::NewAccount {
                    username,
                    password,
                    confirm_password,
                    role,
                },
                output,
                quiet,
            ));
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
