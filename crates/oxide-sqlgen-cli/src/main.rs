//! oxide-sqlgen CLI
//!
//! Command-line tool for inspecting dialects and trying out SQL templates.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_sqlgen_core::dialect::{get, DialectDescriptor, DialectKind, DialectRegistry};
use oxide_sqlgen_core::template::{self, Record, SqlTemplate};

/// Dialect-aware SQL generation diagnostics.
#[derive(Parser)]
#[command(name = "oxide-sqlgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target SQL dialect.
    #[arg(
        short,
        long,
        value_enum,
        env = "OXIDE_SQLGEN_DIALECT",
        default_value_t = Dialect::Postgresql
    )]
    dialect: Dialect,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dialect {
    Sqlserver,
    Mysql,
    Postgresql,
    Oracle,
    Sqlite,
}

impl From<Dialect> for DialectKind {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Sqlserver => Self::SqlServer,
            Dialect::Mysql => Self::MySql,
            Dialect::Postgresql => Self::PostgreSql,
            Dialect::Oracle => Self::Oracle,
            Dialect::Sqlite => Self::Sqlite,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in dialect descriptors.
    Dialects,

    /// Parse a template and list its placeholders.
    Placeholders {
        #[command(flatten)]
        input: TemplateInput,
    },

    /// Bind a template against a JSON parameter object.
    Template {
        #[command(flatten)]
        input: TemplateInput,

        /// Parameters as a JSON object, e.g. '{"id": 7}'.
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Also print the SQL with values inlined (diagnostics only).
        #[arg(short, long)]
        render: bool,

        /// Fail if markers and bindings do not correspond.
        #[arg(long)]
        check: bool,
    },
}

#[derive(clap::Args)]
struct TemplateInput {
    /// Template text.
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    sql: Option<String>,

    /// File containing the template text.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl TemplateInput {
    fn load(&self) -> anyhow::Result<SqlTemplate> {
        let text = match (&self.sql, &self.file) {
            (Some(sql), _) => sql.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("reading template {}", path.display()))?,
            (None, None) => bail!("either --sql or --file is required"),
        };
        Ok(template::parse(text.trim_end())?)
    }
}

fn parse_params(json: &str) -> anyhow::Result<Record> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("--params is not valid JSON")?;
    Ok(Record::from_json(&value)?)
}

fn print_dialect(descriptor: &DialectDescriptor) {
    println!(
        " {:<12} {}{}  {}p0  {:?}  {:?}  {:?}  {:?}  {}  max params {}",
        descriptor.name,
        descriptor.identifier_open,
        descriptor.identifier_close,
        descriptor.parameter_prefix,
        descriptor.limit_syntax,
        descriptor.concat_operator,
        descriptor.upsert_kind,
        descriptor.batch_update,
        descriptor.length_function,
        descriptor.max_parameters,
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dialect = get(cli.dialect.into());
    debug!(dialect = dialect.name, "selected dialect");

    match cli.command {
        Commands::Dialects => {
            println!("\nBuilt-in dialects:");
            println!("{:-<60}", "");
            for descriptor in DialectRegistry::global().iter() {
                print_dialect(descriptor);
            }
            println!();
        }

        Commands::Placeholders { input } => {
            let tpl = input.load()?;
            if tpl.is_pure() {
                info!("Template has no placeholders.");
            } else {
                for (position, name) in tpl.placeholder_names().iter().enumerate() {
                    println!("{position}\t{name}");
                }
            }
        }

        Commands::Template {
            input,
            params,
            render,
            check,
        } => {
            let tpl = input.load()?;
            let record = parse_params(&params)?;
            let stmt = tpl.execute(dialect, &record)?;

            println!("{}", stmt.sql());
            for (name, value) in stmt.parameters() {
                let tag = if stmt.passthrough().contains(name) {
                    "  (unreferenced)"
                } else {
                    ""
                };
                println!(
                    "  {}{name} = {} [{}]{tag}",
                    dialect.parameter_prefix,
                    value.to_sql_inline(),
                    value.kind()
                );
            }

            if check {
                stmt.check_bindings(dialect)?;
                info!("Markers and bindings correspond.");
            }
            if render {
                println!("\n-- rendered for diagnostics only, never execute");
                println!("{}", stmt.render(dialect));
            }
        }
    }

    Ok(())
}
