use std::{
    io::{self, BufRead},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use rowdb::{Config, MetaCommand, Result, Statement, TABLE_MAX_PAGES, Table, statement::print_prompt};
use tracing_subscriber::{EnvFilter, fmt};

/// Interactive shell over a single-table row store
#[derive(Parser, Debug)]
#[command(name = "rowdb")]
#[command(version)]
struct Args {
    /// Database file, created if it does not exist
    db_path: PathBuf,

    /// Maximum number of 4 KiB pages the table may use
    #[arg(long, default_value_t = TABLE_MAX_PAGES)]
    max_pages: usize,
}

fn run(config: &Config) -> Result<()> {
    let mut table = Table::open(config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print_prompt(&mut stdout)?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            tracing::debug!("end of input, closing");
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(meta) = MetaCommand::parse(input) {
            match meta {
                MetaCommand::Exit => break,
                MetaCommand::Unrecognized(command) => {
                    println!("Unrecognized meta-command: {command}");
                }
            }
            continue;
        }

        match Statement::prepare(input) {
            Ok(statement) => statement.execute(&mut table, &mut stdout)?,
            Err(e) => println!("{e}"),
        }
    }

    table.close()
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();
    let config = Config::builder()
        .db_path(&args.db_path)
        .max_pages(args.max_pages)
        .build();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
