//! `lsurvey` - CLI for laundry-survey
//!
//! This binary provides the command-line interface for submitting survey
//! entries, browsing them, and exporting them to Excel.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};

use laundry_survey::cli::{
    Cli, Command, ConfigCommand, ExportCommand, ListCommand, OutputFormat, SubmitCommand,
};
use laundry_survey::dashboard::{ColumnFilter, SortSpec};
use laundry_survey::form::{LocationStatus, SubmitOutcome};
use laundry_survey::{
    connect, init_logging, BackendKind, Config, Coordinates, Error, ExportOutcome,
    ExportTransform, FixedLocator, FormController, Gateway, GridQuery, GridView, MemoryGateway,
    Result, UnavailableLocator,
};

const NO_POSITION: &str =
    "No position available; pass --lat and --lon or set [location] in the configuration";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{e:?}");
            if let Error::Validation(errors) = &e {
                eprintln!("Please correct the following fields:");
                for error in errors.iter() {
                    eprintln!("  {}: {}", error.field, error.message);
                }
            } else {
                eprintln!("{}", e.user_message());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    let load = || Config::load_from(config_path.clone());

    match cli.command {
        Command::Status(status_cmd) => handle_status(&load()?, status_cmd.json).await,
        Command::Submit(submit_cmd) => handle_submit(&load()?, &submit_cmd).await,
        Command::List(list_cmd) => handle_list(&load()?, &list_cmd).await,
        Command::Export(export_cmd) => handle_export(&load()?, &export_cmd).await,
        // Config subcommands report load errors themselves
        Command::Config(config_cmd) => handle_config(config_path.clone(), config_cmd),
    }
}

async fn handle_status(config: &Config, json: bool) -> Result<()> {
    let gateway = connect(config)?;
    let entries = gateway.select_all().await.map(|rows| rows.len());

    if json {
        let status = serde_json::json!({
            "backend": config.backend.kind,
            "table": config.backend.table,
            "bucket": config.backend.bucket,
            "url": config.backend.url,
            "database_path": (config.backend.kind == BackendKind::Local)
                .then(|| config.database_path()),
            "entries": entries.as_ref().ok(),
            "error": entries.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("lsurvey status");
        println!("--------------");
        println!("Backend:       {}", gateway.name());
        println!("Table:         {}", config.backend.table);
        println!("Bucket:        {}", config.backend.bucket);
        match config.backend.kind {
            BackendKind::Rest => {
                println!(
                    "URL:           {}",
                    config.backend.url.as_deref().unwrap_or_default()
                );
            }
            BackendKind::Local => {
                println!("Database:      {}", config.database_path().display());
                println!("Objects:       {}", config.objects_dir().display());
            }
            BackendKind::Memory => {}
        }
        match &entries {
            Ok(count) => println!("Entries:       {count}"),
            Err(e) => println!("Entries:       unavailable ({e})"),
        }
    }
    Ok(())
}

async fn handle_submit(config: &Config, cmd: &SubmitCommand) -> Result<()> {
    let gateway: Box<dyn Gateway> = if cmd.dry_run {
        info!("Dry run: nothing will be stored");
        Box::new(MemoryGateway::with_bucket(&config.backend.bucket))
    } else {
        connect(config)?
    };

    let coordinates = match (cmd.lat, cmd.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
        _ => config.location.coordinates()?,
    };
    let controller = match coordinates {
        Some(coordinates) => FormController::new(gateway.as_ref(), FixedLocator::new(coordinates)),
        None => FormController::new(
            gateway.as_ref(),
            UnavailableLocator::with_reason(NO_POSITION),
        ),
    };
    let mut controller = controller.with_photo_prefix(config.backend.photo_prefix.as_str());

    *controller.form_mut() = cmd.to_form().await?;

    match controller.refresh_location().await {
        LocationStatus::Updated(link) => info!("Location: {}", link),
        LocationStatus::Unavailable(message) => eprintln!("Warning: {message}"),
    }

    let SubmitOutcome { entry, photo_path } = controller.submit().await?;
    if cmd.dry_run {
        println!("Entry is valid (dry run, not saved):");
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("Saved entry for {}", entry.establishment_name);
        if let Some(path) = photo_path {
            println!("Photo stored at {path}");
            println!("Photo URL: {}", entry.photo_url);
        }
    }
    Ok(())
}

async fn handle_list(config: &Config, cmd: &ListCommand) -> Result<()> {
    let view = match &cmd.columns {
        Some(columns) => GridView::with_columns(columns.as_slice())?,
        None => GridView::default(),
    };
    let query = GridQuery {
        filters: cmd
            .filters
            .iter()
            .map(|f| ColumnFilter::parse(f))
            .collect::<Result<Vec<_>>>()?,
        sort: cmd.sort.as_deref().map(SortSpec::parse).transpose()?,
        page: cmd.page,
        page_size: cmd.page_size.unwrap_or(config.dashboard.page_size),
    };

    let gateway = connect(config)?;
    let rows = gateway.select_all().await?;
    let page = view.apply(rows, &query)?;

    match cmd.format {
        OutputFormat::Table => print!("{}", view.render_table(&page)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.to_json(&page))?),
    }
    Ok(())
}

async fn handle_export(config: &Config, cmd: &ExportCommand) -> Result<()> {
    let output = cmd.output.clone().unwrap_or_else(|| config.export_path());
    let gateway = connect(config)?;

    match ExportTransform::from_config(&config.export)
        .run(gateway.as_ref(), &output)
        .await?
    {
        ExportOutcome::Empty => println!("No entries to export."),
        ExportOutcome::Written { path, rows } => {
            println!("Exported {rows} entries to {}", path.display());
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_config(&config);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Backend]");
    println!("  Kind:               {}", config.backend.kind);
    println!(
        "  URL:                {}",
        config.backend.url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  API key:            {}",
        if config.backend.api_key.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!("  Table:              {}", config.backend.table);
    println!("  Bucket:             {}", config.backend.bucket);
    println!("  Photo prefix:       {}", config.backend.photo_prefix);
    println!("  Timeout (secs):     {}", config.backend.timeout_secs);
    println!("  Database path:      {}", config.database_path().display());
    println!("  Objects dir:        {}", config.objects_dir().display());
    println!();
    println!("[Export]");
    println!("  Sheet name:         {}", config.export.sheet_name);
    println!("  Output path:        {}", config.export_path().display());
    println!();
    println!("[Dashboard]");
    println!("  Page size:          {}", config.dashboard.page_size);
    println!();
    println!("[Location]");
    match (config.location.latitude, config.location.longitude) {
        (Some(lat), Some(lon)) => println!("  Position:           {lat}, {lon}"),
        _ => println!("  Position:           (not set)"),
    }
}
