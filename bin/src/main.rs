mod cli;
mod error;
mod panic_hook;
mod render;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use chrono::Utc;
use clap::Parser;
use console::style;
use log::{error, info};
use statement_utils::{
    address::parse_addresses,
    config::Config,
    disk_storage::DiskStorageInterface,
    etherscan::Etherscan,
    session::{Session, StatementParams},
};

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Config { action }) = &cli.cmd {
        return action.handle();
    }

    let config = Config::load()?;

    let input = match &cli.addresses {
        Some(input) => input.clone(),
        None => config.addresses.clone(),
    };
    let addresses = parse_addresses(&input)?;
    let (start, end) = cli.period(Utc::now().date_naive())?;
    let params = StatementParams::new(addresses, start, end)?;

    let api_key = match cli.etherscan_api_key.clone().filter(|key| !key.is_empty()) {
        Some(key) => key,
        None => config.get_etherscan_api_key()?,
    };

    if cli.addresses.is_some() {
        Config::set_addresses(input)?;
    }

    info!(
        "statement for {} addresses on chain {} from {start} to {end}",
        params.addresses.len(),
        config.chain_id
    );

    let source = Arc::new(Etherscan::new(api_key, config.chain_id));
    let mut session = Session::new(config.native_asset());
    session.set_params(params);

    if !cli.json {
        eprintln!("{}", style("Loading transactions...").dim());
    }

    let Some(statement) = session.run(source).await? else {
        return Ok(());
    };

    if cli.json {
        render::print_json(statement)
    } else {
        render::print_statement(statement)
    }
}

fn report(err: &error::Error, log_path: Option<&PathBuf>) {
    error!("{err:?}");

    if err.is_integrity() {
        eprintln!("{} {err}", style("error:").red());
        eprintln!("This is a bug! Please report it along with the log file.");
    } else if err.is_fetch_failure() {
        eprintln!(
            "{} could not load transactions, please retry.",
            style("error:").red()
        );
        eprintln!("{}", style(err).dim());
    } else {
        eprintln!("{} {err}", style("error:").red());
    }

    if let Some(path) = log_path {
        eprintln!("{}", style(format!("log: {}", path.display())).dim());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    panic_hook::set();

    let cli = Cli::parse();

    let log_path = match statement_utils::log::init(cli.log_level) {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("{} {err}", style("warning:").yellow());
            None
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, log_path.as_ref());
            ExitCode::FAILURE
        }
    }
}
