use std::env;
use std::io::{self, Stdout};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;

use wsds::app::App;
use wsds::config::{self, CatalogSource};
use wsds::logging;
use wsds::source::Connection;

fn print_version() {
    println!("wsds {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("wsds - Associate data source connections with a workspace");
    eprintln!();
    eprintln!("Usage: wsds [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("      --catalog-file <PATH>  Read candidates from a TOML or JSON catalog file");
    eprintln!("      --url <URL>            OpenSearch Dashboards base URL");
    eprintln!("      --assigned <JSON>      Initially assigned connections (JSON array)");
    eprintln!("      --no-dqc               Hide the direct query assign button");
    eprintln!("  -h, --help                 Print this help message");
    eprintln!("  -V, --version              Print version information");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  WSDS_CONFIG_DIR            Override the configuration directory");
    eprintln!("  WSDS_LOG                   Log filter (falls back to RUST_LOG)");
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file: {}", path.display());
    }
    eprintln!();
    eprintln!("On exit the final assigned connections are printed to stdout as JSON.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  wsds --url http://localhost:5601");
    eprintln!("  wsds --catalog-file catalog.toml --assigned '[]' > assigned.json");
}

#[derive(Debug, Default)]
struct Args {
    catalog_file: Option<PathBuf>,
    url: Option<String>,
    assigned: Option<String>,
    no_dqc: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{} requires a value", flag))
        };
        match arg.as_str() {
            "--catalog-file" => parsed.catalog_file = Some(PathBuf::from(value("--catalog-file")?)),
            "--url" => parsed.url = Some(value("--url")?),
            "--assigned" => parsed.assigned = Some(value("--assigned")?),
            "--no-dqc" => parsed.no_dqc = true,
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    if args.iter().any(|a| a == "-V" || a == "--version") {
        print_version();
        return Ok(());
    }

    let args = parse_args(&args)?;

    // Load configuration from ~/.config/wsds/config.toml
    let mut cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        config::Config::default()
    });

    if let Some(file) = cfg.logging.file.clone().or_else(config::log_path) {
        if let Err(e) = logging::init(&cfg.logging.level, &file) {
            eprintln!("Warning: Logging disabled: {:#}", e);
        }
    }

    // Catalog source priority: CLI flag > config file
    if let Some(file) = args.catalog_file {
        cfg.catalog.source = CatalogSource::File;
        cfg.catalog.file = Some(file);
    } else if let Some(url) = args.url {
        cfg.catalog.source = CatalogSource::Http;
        cfg.catalog.url = url;
    }
    if args.no_dqc {
        cfg.panel.show_data_source_management = false;
    }

    let assigned: Vec<Connection> = match &args.assigned {
        Some(json) => serde_json::from_str(json).context("--assigned is not a connection list")?,
        None => Vec::new(),
    };

    let loader = config::build_loader(&cfg.catalog)?;
    let rt = Runtime::new().context("failed to initialize tokio runtime")?;

    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;

    let mut app = App::new(loader, rt.handle().clone(), assigned, cfg.panel);
    let res = app.run(&mut terminal);

    restore_terminal(terminal)?;
    res?;

    let output = serde_json::to_string_pretty(&app.into_assigned())?;
    println!("{}", output);
    Ok(())
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("wsds")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&argv(&[
            "--catalog-file",
            "catalog.toml",
            "--assigned",
            "[]",
            "--no-dqc",
        ]))
        .unwrap();
        assert_eq!(args.catalog_file, Some(PathBuf::from("catalog.toml")));
        assert_eq!(args.assigned.as_deref(), Some("[]"));
        assert!(args.no_dqc);
        assert!(args.url.is_none());
    }

    #[test]
    fn test_parse_args_missing_value() {
        assert!(parse_args(&argv(&["--url"])).is_err());
    }

    #[test]
    fn test_parse_args_unknown_flag() {
        assert!(parse_args(&argv(&["--bogus"])).is_err());
    }
}
