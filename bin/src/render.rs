use console::style;
use statement_common::{aggregate::AssetData, format::format_value, transaction::Direction};
use statement_utils::session::Statement;

use crate::error::Result;

fn print_assets(title: &str, assets: &AssetData) {
    println!(
        "{} {}",
        style(title).bold(),
        style(assets.date.format("%Y-%m-%d %H:%M:%S UTC")).dim()
    );

    let mut empty = true;
    for (token, holding) in assets.non_zero() {
        empty = false;
        println!(
            "  {:>24} {:<8} {}",
            holding.data.value_in_rounded_decimals,
            holding.data.symbol,
            style(format!("{} ({token})", holding.data.name)).dim()
        );
    }
    if empty {
        println!("  {}", style("no holdings").dim());
    }
    println!();
}

pub fn print_statement(statement: &Statement) -> Result<()> {
    let params = &statement.params;
    println!(
        "{} {} to {}",
        style("Statement").bold().underlined(),
        params.start.format("%Y-%m-%d"),
        params.end.format("%Y-%m-%d")
    );
    for address in &params.addresses {
        println!("  {}", style(address).cyan());
    }
    println!();

    print_assets("Opening balances", &statement.start_assets);

    let transactions = statement.transactions();
    println!("{} ({})", style("Transactions").bold(), transactions.len());
    for entry in transactions {
        let amount = format_value(entry.signed_amount()?, entry.asset.decimals, true)?;
        let amount = match entry.direction {
            Direction::Credit => style(format!("+{amount}")).green(),
            Direction::Debit => style(amount).red(),
        };
        let counterparty = match entry.direction {
            Direction::Credit => format!("from {}", entry.counterparty),
            Direction::Debit => format!("to {}", entry.counterparty),
        };

        print!(
            "  {} {:>24} {:<8} {}",
            entry.date.format("%Y-%m-%d %H:%M:%S"),
            amount,
            entry.asset.symbol,
            style(counterparty).dim()
        );
        if let Some(debit) = statement.debit_balance(entry)? {
            print!(
                "  balance {} {}",
                debit.balance.value_in_rounded_decimals, debit.balance.symbol
            );
        }
        println!();
        println!("    {}", style(entry.hash).dim());
    }
    println!();

    print_assets("Closing balances", &statement.end_assets);

    Ok(())
}

pub fn print_json(statement: &Statement) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&statement.report()?)?);
    Ok(())
}
