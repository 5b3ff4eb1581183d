// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use enlace_app::{Workspace, WorkspaceCommand, WorkspaceOptions};
use runtime::CsvRuntime;
use std::env;
use std::path::PathBuf;

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
            "load config {}; run `enlace --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let mut workspace = Workspace::with_options(WorkspaceOptions {
        log_capacity: config.log_capacity(),
        max_tables: config.max_tables(),
    });

    for outcome in enlace_ingest::read_csv_files(&options.csv_paths, config.preview_rows()) {
        let command = match outcome.result {
            Ok(source) => WorkspaceCommand::LoadTable(source),
            Err(error) => WorkspaceCommand::IngestFailed {
                name: outcome.name,
                message: format!("{error:#}"),
            },
        };
        workspace.dispatch(command);
    }

    if options.check_only {
        return Ok(());
    }

    let mut runtime = CsvRuntime::new(config.preview_rows());
    enlace_tui::run_app_with_options(
        &mut workspace,
        &mut runtime,
        enlace_tui::TuiOptions {
            show_markers: config.show_markers(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    csv_paths: Vec<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        csv_paths: Vec::new(),
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            flag if flag.starts_with('-') => {
                return Err(anyhow::anyhow!(
                    "unknown argument {flag:?}; run with --help to see supported options"
                ));
            }
            path => {
                options.csv_paths.push(PathBuf::from(path));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("enlace");
    println!("  usage: enlace [options] [file.csv ...]");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and CSV arguments, then exit");
    println!("  --help                   Show this help");
}
