pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::inventory::InventoryCommand;
use commands::order::OrderCommand;
use commands::payment::PaymentCommand;
use commands::quotation::QuotationCommand;

#[derive(Debug, Parser)]
#[command(
    name = "starbags",
    about = "Starbags back-office CLI",
    long_about = "Manage quotations, orders, payments and inventory for the Starbags bag store.",
    after_help = "Examples:\n  starbags quotation create --file request.json\n  starbags quotation approve QT-001\n  starbags inventory low-stock\n  starbags doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo payments and saved payment methods (idempotent)")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, storage connectivity and inventory service reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Quotation lifecycle: create, review, convert")]
    Quotation(QuotationCommand),
    #[command(subcommand, about = "Orders created from converted quotations")]
    Order(OrderCommand),
    #[command(subcommand, about = "Payment history and saved payment methods")]
    Payment(PaymentCommand),
    #[command(subcommand, about = "Stock levels held by the inventory service")]
    Inventory(InventoryCommand),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Quotation(command) => commands::quotation::run(command),
        Command::Order(command) => commands::order::run(command),
        Command::Payment(command) => commands::payment::run(command),
        Command::Inventory(command) => commands::inventory::run(command),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
