//! Stubtape CLI

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use stubtape::config::{Config, FixtureNamingConfig};
use stubtape::fixture::fixture_name;
use stubtape::storage::SnapshotStore;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    let result = match (command.as_str(), args.get(2)) {
        ("inspect", Some(path)) => inspect(Path::new(path)),
        ("fixture-name", Some(spec)) => {
            let naming = match args.get(3) {
                Some(config) => Config::from_file(Path::new(config))
                    .map(|c| c.fixture_naming)
                    .context("loading config"),
                None => Ok(FixtureNamingConfig::default()),
            };
            naming.map(|naming| println!("{}", fixture_name(spec, &naming)))
        }
        ("check", Some(path)) => check(Path::new(path)),
        ("inspect" | "fixture-name" | "check", None) => {
            eprintln!("Missing argument for '{command}'");
            print_usage();
            process::exit(1);
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'stubtape' for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Stubtape v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: stubtape <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  inspect <fixture.json>               List recorded test cases");
    eprintln!("  fixture-name <spec-path> [config]    Print the fixture file for a spec");
    eprintln!("  check <config.toml>                  Validate a configuration file");
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")
}

fn inspect(path: &Path) -> Result<()> {
    let root = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
    let name = path
        .file_name()
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let store = SnapshotStore::new(root);

    let file = runtime()?
        .block_on(store.read(name))
        .with_context(|| format!("reading {}", path.display()))?
        .with_context(|| format!("fixture not found: {}", path.display()))?;

    println!("Fixture: {}", path.display());
    println!("Test cases: {}", file.len());
    println!();

    for (title, snapshot) in file.iter() {
        println!("{title}");
        println!("  recorded:  {}", snapshot.timestamp);
        println!("  exchanges: {}", snapshot.records.len());
        for record in &snapshot.records {
            println!(
                "    {:<6} {} (host {})",
                record.method, record.url, record.match_host_index
            );
        }
    }

    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let config = Config::from_file(path).context("loading config")?;
    let hosts = config.host_registry()?;
    stubtape::network::compile_patterns(config.stub_patterns())?;

    println!("Mode: {:?}", config.mode());
    println!("Fixtures: {}", config.fixtures_dir.display());
    println!("Hosts:");
    for (i, host) in hosts.iter().enumerate() {
        println!("  [{i}] {host}");
    }
    println!("Stub patterns:");
    for pattern in config.stub_patterns() {
        println!("  {pattern}");
    }

    Ok(())
}
