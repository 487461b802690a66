//! `propdesk`: browse, export and bulk-edit back-office records from the terminal

mod grid_args;
mod logging;
mod render;
mod source;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use grid_args::GridArgs;
use propdesk_core::{RecordId, ResourceKind, Value};
use propdesk_grid::Density;
use propdesk_interchange::{ExportFormat, FileExporter};
use propdesk_services::{BulkActionService, BulkOperation, BulkOutcome, RestBulkExecutor};
use propdesk_settings::{EngineConfig, PreferenceStore, engine_config_file, exports_dir, view_key};
use source::{ApiArgs, SourceArgs};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "propdesk", version, about)]
struct Cli {
    /// Engine config file (default: <config dir>/propdesk/engine.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose console logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to the log directory
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of records as a table
    View {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        grid: GridArgs,

        /// Name under which view preferences (density) are stored;
        /// defaults to the source's resource or file name
        #[arg(long)]
        view: Option<String>,
    },

    /// Export every record matching the search and filters
    Export {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        grid: GridArgs,

        #[arg(long, default_value = "csv", value_parser = parse_format)]
        format: ExportFormat,

        /// Output directory (default: <data dir>/propdesk/exports)
        #[arg(long)]
        out: Option<PathBuf>,

        /// File name; the extension is added when missing
        #[arg(long)]
        name: Option<String>,
    },

    /// Archive, delete or edit records through the API
    Bulk {
        action: BulkAction,

        /// Collection path, e.g. `/v1/tasks/`
        path: String,

        /// Ids to act on
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Assignment for `edit`, `field=value`
        #[arg(long, value_parser = parse_assignment, required_if_eq("action", "edit"))]
        set: Option<(String, Value)>,

        #[arg(long, default_value = "id")]
        id_field: String,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Manage persisted view preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },

    /// Show or create the engine config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BulkAction {
    Archive,
    Delete,
    Edit,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum PrefsCommand {
    Get { key: String },
    Set { key: String, value: String },
    List,
    Remove { key: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration unless the file exists
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.verbose {
        logging::LoggingConfig::development()
    } else {
        logging::LoggingConfig::production()
    };
    log_config.enable_json_logs = cli.log_json;
    let _guard = logging::init(log_config)?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => engine_config_file()?,
    };
    let config = EngineConfig::load_from(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    match cli.command {
        Command::View { source, grid, view } => {
            let records = source.load(&config).await?;
            let view_name = view.unwrap_or_else(|| default_view_name(&source.source));
            let density = view_density(&view_name, grid.density);

            let data_grid = grid.build_grid(records, config.pagination(density));
            let state = data_grid.view();
            println!("{}", render::grid_table(&state));
            println!("{}", render::status_line(&state));
        }
        Command::Export {
            source,
            grid,
            format,
            out,
            name,
        } => {
            let records = source.load(&config).await?;
            let data_grid = grid.build_grid(records, config.pagination(None));
            let ids = data_grid.filtered_ids();
            if ids.is_empty() {
                bail!("no records match, nothing to export");
            }

            let out = match out {
                Some(dir) => dir,
                None => exports_dir()?,
            };
            let service = BulkActionService::export_only(Arc::new(FileExporter::new(out)))
                .with_display_delay(config.display_delay());
            let outcome = service
                .run(
                    BulkOperation::Export {
                        format,
                        filename: name,
                    },
                    &ids,
                    data_grid.records(),
                    &print_progress,
                )
                .await?;
            eprintln!();
            report(&outcome);
        }
        Command::Bulk {
            action,
            path,
            ids,
            set,
            id_field,
            api,
        } => {
            let resource = ResourceKind::from_path(&path)
                .ok_or_else(|| anyhow!("'{}' is not a known collection path", path))?;
            let operation = match (action, set) {
                (BulkAction::Archive, _) => BulkOperation::Archive,
                (BulkAction::Delete, _) => BulkOperation::Delete,
                (BulkAction::Edit, Some((field, value))) => BulkOperation::Edit { field, value },
                (BulkAction::Edit, None) => bail!("edit needs --set field=value"),
            };

            let fetch = api.fetch_service(&config)?;
            let records = fetch
                .read_records(&path, &Default::default(), &id_field)
                .await
                .with_context(|| format!("failed to read {}", path))?;

            let service = BulkActionService::new(
                Arc::new(RestBulkExecutor::new(fetch.clone(), resource)),
                Arc::new(FileExporter::new(exports_dir()?)),
            )
            .with_display_delay(config.display_delay());
            let ids: Vec<RecordId> = ids.into_iter().map(RecordId::from).collect();
            let outcome = service
                .run(operation, &ids, &records, &print_progress)
                .await?;
            eprintln!();
            report(&outcome);
        }
        Command::Prefs { command } => {
            let mut store = PreferenceStore::open_default()?;
            for line in run_prefs(&mut store, command)? {
                println!("{}", line);
            }
        }
        Command::Config { command } => match command {
            ConfigCommand::Show => {
                print!(
                    "{}",
                    toml::to_string_pretty(&config).context("failed to render config")?
                );
            }
            ConfigCommand::Init => {
                if config_path.exists() {
                    println!("{} already exists", config_path.display());
                } else {
                    EngineConfig::default().save_to(&config_path)?;
                    println!("wrote {}", config_path.display());
                }
            }
        },
    }

    Ok(())
}

/// Density for a view: an explicit flag is stored, otherwise the stored
/// preference applies. Preference I/O problems never block viewing.
fn view_density(view: &str, requested: Option<Density>) -> Option<Density> {
    let key = view_key(view, "density");
    let mut store = match PreferenceStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "preferences unavailable");
            return requested;
        }
    };

    match requested {
        Some(density) => {
            if let Err(e) = store.set(key, density.label()) {
                tracing::warn!(error = %e, "failed to store density preference");
            }
            Some(density)
        }
        None => store.get(&key).and_then(Density::parse),
    }
}

fn default_view_name(source: &str) -> String {
    if let Some(kind) = ResourceKind::from_path(source) {
        return kind.label().to_lowercase().replace(' ', "_");
    }
    std::path::Path::new(source)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string())
}

fn run_prefs(store: &mut PreferenceStore, command: PrefsCommand) -> Result<Vec<String>> {
    let lines = match command {
        PrefsCommand::Get { key } => {
            let value = store
                .get(&key)
                .ok_or_else(|| anyhow!("no preference named '{}'", key))?;
            vec![value.to_string()]
        }
        PrefsCommand::Set { key, value } => {
            store.set(key, value)?;
            Vec::new()
        }
        PrefsCommand::List => store.iter().map(|(k, v)| format!("{} = {}", k, v)).collect(),
        PrefsCommand::Remove { key } => match store.remove(&key)? {
            Some(_) => Vec::new(),
            None => bail!("no preference named '{}'", key),
        },
    };
    Ok(lines)
}

fn print_progress(percent: u8, message: &str) {
    eprint!("\r{:>3}% {:<60}", percent, message);
}

fn report(outcome: &BulkOutcome) {
    println!(
        "{:?}: {} succeeded, {} failed",
        outcome.status,
        outcome.succeeded.len(),
        outcome.failures.len()
    );
    if let Some(path) = outcome.export.as_ref().and_then(|r| r.path.as_ref()) {
        println!("wrote {}", path.display());
    }
    for failure in &outcome.failures {
        println!("  {}: {}", failure.id.as_str(), failure.message);
    }
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(raw).ok_or_else(|| format!("unknown format '{}', expected csv or json", raw))
}

fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    if field.trim().is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    Ok((field.trim().to_string(), grid_args::parse_scalar(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_view_command() {
        let cli = Cli::try_parse_from([
            "propdesk",
            "view",
            "invoices.json",
            "--search",
            "muster",
            "--sort",
            "amount:desc",
            "--density",
            "compact",
        ])
        .unwrap();
        let Command::View { source, grid, view } = cli.command else {
            panic!("expected view");
        };
        assert_eq!(source.source, "invoices.json");
        assert!(!source.remote);
        assert_eq!(grid.search.as_deref(), Some("muster"));
        assert_eq!(grid.density, Some(Density::Compact));
        assert_eq!(view, None);
    }

    #[test]
    fn test_density_conflicts_with_page_size() {
        let result = Cli::try_parse_from([
            "propdesk",
            "view",
            "x.json",
            "--density",
            "ultra",
            "--page-size",
            "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_requires_assignment() {
        let result = Cli::try_parse_from(["propdesk", "bulk", "edit", "/v1/tasks/", "--ids", "1,2"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "propdesk",
            "bulk",
            "edit",
            "/v1/tasks/",
            "--ids",
            "1,2",
            "--set",
            "priority=3",
        ])
        .unwrap();
        let Command::Bulk { ids, set, .. } = cli.command else {
            panic!("expected bulk");
        };
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(set, Some(("priority".to_string(), Value::Int(3))));
    }

    #[test]
    fn test_default_view_name() {
        assert_eq!(default_view_name("/v1/invoices/?status=open"), "invoices");
        assert_eq!(default_view_name("data/tenants.json"), "tenants");
    }

    #[test]
    fn test_prefs_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path().join("preferences.json")).unwrap();

        run_prefs(
            &mut store,
            PrefsCommand::Set {
                key: "invoices_density".into(),
                value: "compact".into(),
            },
        )
        .unwrap();
        assert_eq!(
            run_prefs(
                &mut store,
                PrefsCommand::Get {
                    key: "invoices_density".into()
                }
            )
            .unwrap(),
            vec!["compact"]
        );
        assert_eq!(
            run_prefs(&mut store, PrefsCommand::List).unwrap(),
            vec!["invoices_density = compact"]
        );

        run_prefs(
            &mut store,
            PrefsCommand::Remove {
                key: "invoices_density".into(),
            },
        )
        .unwrap();
        assert!(
            run_prefs(
                &mut store,
                PrefsCommand::Get {
                    key: "invoices_density".into()
                }
            )
            .is_err()
        );
    }
}
