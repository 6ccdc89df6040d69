use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use console::style;
use log::LevelFilter;
use statement_utils::{config::Config, disk_storage::DiskStorageInterface};

use crate::error::{Error, Result};

#[derive(Parser, Debug)]
#[command(name = "statement", bin_name = "statement", version)]
#[command(about = "Account statement across a set of Ethereum addresses")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// Addresses to combine, comma or space separated. Defaults to the last used ones.
    #[arg(long, short)]
    pub addresses: Option<String>,

    /// First day of the period (YYYY-MM-DD), defaults to the start of last month
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD), defaults to the end of last month
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Print the statement as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigActions {
    /// Store the Etherscan API key, an empty key removes it
    #[command(alias = "etherscan")]
    SetApiKey { key: String },

    /// Print the configuration file
    Show,
}

impl ConfigActions {
    pub fn handle(&self) -> Result<()> {
        match self {
            ConfigActions::SetApiKey { key } => {
                let key = key.trim().to_string();
                if key.is_empty() {
                    let mut config = Config::load()?;
                    config.etherscan_api_key = None;
                    config.save()?;
                    println!("Etherscan API key removed.");
                } else {
                    Config::set_etherscan_api_key(key)?;
                    println!("Etherscan API key saved.");
                }
            }
            ConfigActions::Show => {
                let config = Config::load()?;
                println!("{}", style(Config::path()?.display()).dim());
                println!(
                    "etherscan_api_key = {}",
                    match &config.etherscan_api_key {
                        Some(key) if !key.is_empty() => mask(key),
                        _ => "None".to_string(),
                    }
                );
                println!("chain_id = {}", config.chain_id);
                println!(
                    "native = {} ({}, {} decimals)",
                    config.native_symbol, config.native_name, config.native_decimals
                );
                println!("addresses = {}", config.addresses);
            }
        }
        Ok(())
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{visible}***")
}

/// First and last day of the calendar month before `today`.
pub fn previous_month(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let last = today.with_day(1)?.pred_opt()?;
    Some((last.with_day(1)?, last))
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|end| end.and_utc())
        .ok_or(Error::InvalidDate(date))
}

impl Cli {
    /// Statement period, from the start of `start` to the last millisecond of `end`.
    pub fn period(&self, today: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (default_start, default_end) =
            previous_month(today).ok_or(Error::InvalidDate(today))?;
        let start = self.start.unwrap_or(default_start);
        let end = self.end.unwrap_or(default_end);
        Ok((start_of_day(start), end_of_day(end)?))
    }
}
