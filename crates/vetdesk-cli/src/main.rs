// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::{DemoRuntime, HttpRuntime};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use time::{Date, OffsetDateTime};
use tracing::info;
use vetdesk_app::AppState;
use vetdesk_app::validation::parse_date;
use vetdesk_tui::HostConfig;
use vetdesk_ui::{UiConfig, WheelOptions};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `vetdesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let client = vetdesk_api::Client::new(config.base_url(), config.timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        return check(&config, &client, options.demo);
    }

    init_logging(&config)?;
    let start_date = options
        .start_date
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let host = HostConfig {
        ui: UiConfig {
            wheel: WheelOptions {
                fade: config.wheel_fade(),
                ..WheelOptions::default()
            },
            ..UiConfig::default()
        },
        start_date,
    };
    let mut state = AppState {
        active_page: config.start_page(),
        ..AppState::default()
    };
    info!(demo = options.demo, server = config.base_url(), %start_date, "starting vetdesk");

    if options.demo {
        let mut runtime = DemoRuntime::new();
        vetdesk_tui::run_app(&mut state, &mut runtime, host)
    } else {
        let mut runtime = HttpRuntime::new(client, config.catalog_path());
        vetdesk_tui::run_app(&mut state, &mut runtime, host)
    }
}

/// Validates everything startup depends on without opening the terminal.
fn check(config: &Config, client: &vetdesk_api::Client, demo: bool) -> Result<()> {
    if let Some(path) = config.catalog_path() {
        let catalog = runtime::load_catalog_file(&path)?;
        println!(
            "catalog ok: {} products, {} services, {} pets",
            catalog.products.len(),
            catalog.services.len(),
            catalog.pets.len()
        );
    }
    if !demo {
        client.ping()?;
        println!("server ok: {}", client.base_url());
    }
    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log] file to a writable path",
                path.display()
            )
        })?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(config.log_level())
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    start_date: Option<Date>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        start_date: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--date" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--date requires a YYYY-MM-DD value"))?;
                let date = parse_date(value.as_ref()).map_err(|_| {
                    anyhow!(
                        "--date {:?} is not a date; use YYYY-MM-DD, for example 2026-03-09",
                        value.as_ref()
                    )
                })?;
                options.start_date = Some(date);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("vetdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with the seeded demo catalog and agenda");
    println!("  --check                  Validate config, catalog and server, then exit");
    println!("  --date <YYYY-MM-DD>      Open the agenda on this day");
    println!("  --help                   Show this help");
}
