//! `toppharma` - CLI for the pharmaceutical directory
//!
//! This binary runs the JSON API server and manages the directory database
//! and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use toppharma::cli::{Cli, Command, ConfigCommand, DbCommand};
use toppharma::diagnostics::ConnectionReport;
use toppharma::{init_logging, Config, Dataset, FeatureFlags, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd.addr),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Db(db_cmd) => handle_db(&config, &db_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_serve(mut config: Config, addr: Option<String>) -> anyhow::Result<()> {
    if let Some(addr) = addr {
        config.server.bind_address = addr;
        config.validate()?;
    }
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(toppharma::server::serve(config))?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let path = config.database_path();
    let stats = if path.exists() {
        Some(Storage::open(&path)?.stats()?)
    } else {
        None
    };

    if json {
        let status = serde_json::json!({
            "database_path": path,
            "database_exists": stats.is_some(),
            "bind_address": config.server.bind_address,
            "environment": config.server.environment,
            "default_source": config.default_source(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("toppharma status");
        println!("----------------");
        println!("Database:      {}", path.display());
        match &stats {
            Some(stats) => {
                println!("Schema:        v{}", stats.schema_version);
                println!("Companies:     {}", stats.companies);
                println!("Products:      {}", stats.products);
                println!("Websites:      {}", stats.websites);
                println!("Areas:         {}", stats.therapeutic_areas);
                println!("Size:          {} bytes", stats.db_size_bytes);
            }
            None => println!("               not initialized (run `toppharma db init`)"),
        }
        println!("Data source:   {}", config.default_source());
        println!("Environment:   {:?}", config.server.environment);
        println!("Bind address:  {}", config.server.bind_address);
    }
    Ok(())
}

fn handle_db(config: &Config, cmd: &DbCommand) -> anyhow::Result<()> {
    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    match cmd {
        DbCommand::Init => {
            println!("Database ready at {}", path.display());
            println!("Schema version: {}", storage.schema_version()?);
        }
        DbCommand::Seed => {
            let summary = storage.import(&Dataset::demo())?;
            println!("Seeded {}", path.display());
            println!("  Companies:          {}", summary.companies);
            println!("  Products:           {}", summary.products);
            println!("  Websites:           {}", summary.websites);
            println!("  Therapeutic areas:  {}", summary.therapeutic_areas);
            println!("  Links:              {}", summary.links);
        }
        DbCommand::Check { json } => {
            let report = ConnectionReport::run(&storage, config.admin.service_key.as_deref());
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.message);
                println!("  Database:    {}", report.credentials.database_path);
                match &report.companies.error {
                    None => println!("  Companies:   {} rows", report.companies.count),
                    Some(e) => println!("  Companies:   failed ({e})"),
                }
                match &report.schema.error {
                    None => println!("  Tables:      {}", report.schema.tables.join(", ")),
                    Some(e) => println!("  Tables:      failed ({e})"),
                }
                if report.admin.tested {
                    match &report.admin.error {
                        None => println!("  Admin check: ok"),
                        Some(e) => println!("  Admin check: failed ({e})"),
                    }
                } else {
                    println!("  Admin check: skipped (no service key)");
                }
            }
            if !report.success {
                bail!("database check failed");
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                if shown.admin.service_key.is_some() {
                    shown.admin.service_key = Some("********".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_address);
                println!("  Environment:        {:?}", config.server.environment);
                println!(
                    "  CORS origins:       {}",
                    config.server.cors_origins.join(", ")
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Sources]");
                println!("  Default:            {}", config.default_source());
                println!();
                println!("[Flags]");
                for (name, value) in FeatureFlags::new(&config.flags).snapshot() {
                    println!("  {name:<24}{value}");
                }
                println!();
                println!("[Admin]");
                println!(
                    "  Service key:        {}",
                    if config.admin.service_key.is_some() {
                        "configured"
                    } else {
                        "not set"
                    }
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
