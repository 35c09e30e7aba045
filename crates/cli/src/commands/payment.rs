use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;
use starbags_core::pricing::round_currency;
use starbags_core::{NewPayment, PaymentFilter, PaymentPatch, PaymentStatus};
use starbags_stores::Application;

use crate::commands::{
    execute, input_failure, read_json_file, store_failure, to_data, CommandResult, Failure, Outcome,
};

#[derive(Debug, Subcommand)]
pub enum PaymentCommand {
    #[command(about = "Payment history, newest first, with optional filters")]
    List {
        #[arg(long, help = "Match on payment id, order id, customer or transaction reference")]
        search: Option<String>,
        #[arg(long, help = "pending, completed or failed")]
        status: Option<String>,
        #[arg(long, help = "Inclusive start date (YYYY-MM-DD)")]
        from: Option<String>,
        #[arg(long, help = "Inclusive end date (YYYY-MM-DD)")]
        to: Option<String>,
    },
    #[command(about = "Record a payment from a JSON file")]
    Add {
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Set the status of a payment")]
    Status { id: String, status: String },
    #[command(about = "Delete a payment")]
    Delete { id: String },
    #[command(about = "Revenue from completed payments and counts per status")]
    Stats,
    #[command(about = "List saved payment methods")]
    Methods,
}

pub fn run(command: PaymentCommand) -> CommandResult {
    match command {
        PaymentCommand::List { search, status, from, to } => {
            let filter = match build_filter(search, status, from, to) {
                Ok(filter) => filter,
                Err((error_class, message, exit_code)) => {
                    return CommandResult::failure("payment.list", error_class, message, exit_code);
                }
            };
            execute("payment.list", |app| list(app, filter))
        }
        PaymentCommand::Add { file } => execute("payment.add", |app| add(app, file)),
        PaymentCommand::Status { id, status } => {
            execute("payment.status", |app| set_status(app, id, status))
        }
        PaymentCommand::Delete { id } => execute("payment.delete", |app| delete(app, id)),
        PaymentCommand::Stats => execute("payment.stats", stats),
        PaymentCommand::Methods => execute("payment.methods", methods),
    }
}

fn build_filter(
    search: Option<String>,
    status: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Result<PaymentFilter, Failure> {
    Ok(PaymentFilter {
        search,
        status: status.as_deref().map(parse_status).transpose()?,
        date_from: from.as_deref().map(parse_date).transpose()?,
        date_to: to.as_deref().map(parse_date).transpose()?,
    })
}

async fn list(app: Application, filter: PaymentFilter) -> Outcome {
    let payments = app.payments.history(&filter).await;
    Ok((format!("{} payment(s)", payments.len()), to_data(&payments)?))
}

async fn add(app: Application, file: PathBuf) -> Outcome {
    let payment: NewPayment = read_json_file(&file)?;
    let payment = app.payments.add_payment(payment).await.map_err(store_failure)?;
    Ok((format!("recorded payment {}", payment.id), to_data(&payment)?))
}

async fn set_status(app: Application, id: String, status: String) -> Outcome {
    let patch = PaymentPatch { status: Some(parse_status(&status)?), ..PaymentPatch::default() };
    let payment = app.payments.update_payment(&id, patch).await.map_err(store_failure)?;
    Ok((format!("payment {} is {}", payment.id, payment.status.as_str()), to_data(&payment)?))
}

async fn delete(app: Application, id: String) -> Outcome {
    app.payments.delete_payment(&id).await.map_err(store_failure)?;
    Ok((format!("deleted payment {id}"), None))
}

async fn stats(app: Application) -> Outcome {
    let stats = app.payments.stats().await;
    Ok((format!("total revenue {}", round_currency(stats.total_revenue)), to_data(&stats)?))
}

async fn methods(app: Application) -> Outcome {
    let methods = app.payments.list_saved_methods().await;
    Ok((format!("{} saved method(s)", methods.len()), to_data(&methods)?))
}

fn parse_status(raw: &str) -> Result<PaymentStatus, Failure> {
    raw.parse::<PaymentStatus>().map_err(|error| input_failure(error.to_string()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, Failure> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|error| input_failure(format!("invalid date `{raw}`: {error}")))
}
