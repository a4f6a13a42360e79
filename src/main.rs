mod action;
mod commands;
mod config;
mod dispatcher;
mod error;
mod fallback;
mod gear;
mod handlers;
mod host;
mod interpreter;
mod openai;
mod schema;
mod session;
mod types;
mod ui;

use commands::{cmd_bridge, cmd_config, cmd_doctor, cmd_query, cmd_repl, cmd_schema};
use config::load_config;
use std::env;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn print_usage() {
    eprintln!("usage: cadprompt [-v] [--json] <command text>");
    eprintln!("       cadprompt [-v] repl | bridge");
    eprintln!("       cadprompt schema | config | doctor");
}

/// Logs go to stderr; stdout carries results and bridge traffic.
fn init_logging(verbose: bool) -> reload::Handle<LevelFilter, tracing_subscriber::Registry> {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let (filter, handle) = reload::Layer::new(level);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
    handle
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut verbose = false;
    let mut as_json = false;
    let mut rest = Vec::new();
    for a in &args {
        match a.as_str() {
            "-v" | "--verbose" => verbose = true,
            "--json" => as_json = true,
            _ => rest.push(a.as_str()),
        }
    }

    let log_level = init_logging(verbose);
    let config = load_config();
    if config.behavior.debug {
        log_level.modify(|filter| *filter = LevelFilter::DEBUG).ok();
    }

    let Some(first) = rest.first().copied() else {
        print_usage();
        return;
    };

    let result = match first {
        "repl" => cmd_repl(&config),
        "bridge" => cmd_bridge(&config),
        "schema" => cmd_schema(&config),
        "config" => cmd_config(),
        "doctor" => cmd_doctor(&config),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        _ => cmd_query(&rest.join(" "), &config, as_json),
    };

    if let Err(e) = result {
        eprintln!("cadprompt: {}", e);
        std::process::exit(1);
    }
}
