use std::path::PathBuf;

use clap::Subcommand;
use starbags_core::pricing::round_currency;
use starbags_core::{QuotationPatch, QuotationRequest, QuotationStatus};
use starbags_stores::Application;

use crate::commands::{execute, read_json_file, store_failure, to_data, CommandResult, Outcome};

#[derive(Debug, Subcommand)]
pub enum QuotationCommand {
    #[command(about = "Create a draft quotation from a JSON request file")]
    Create {
        #[arg(long, help = "Path to a JSON quotation request")]
        file: PathBuf,
    },
    #[command(about = "List quotations, optionally for one user or matching a search term")]
    List {
        #[arg(long, help = "Only quotations belonging to this user id")]
        user: Option<String>,
        #[arg(long, help = "Case-insensitive match on id, company or contact person")]
        search: Option<String>,
    },
    #[command(about = "Show one quotation")]
    Show { id: String },
    #[command(about = "Edit a draft or rejected quotation from a JSON patch file")]
    Update {
        id: String,
        #[arg(long, help = "Path to a JSON quotation patch")]
        file: PathBuf,
    },
    #[command(about = "Approve a draft quotation")]
    Approve { id: String },
    #[command(about = "Reject a draft quotation, or replace the reason of a rejected one")]
    Reject {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    #[command(about = "Convert an approved quotation into an order")]
    Convert { id: String },
    #[command(about = "Delete a rejected quotation")]
    Delete { id: String },
    #[command(about = "Count quotations per status")]
    Stats,
}

pub fn run(command: QuotationCommand) -> CommandResult {
    match command {
        QuotationCommand::Create { file } => execute("quotation.create", |app| create(app, file)),
        QuotationCommand::List { user, search } => {
            execute("quotation.list", |app| list(app, user, search))
        }
        QuotationCommand::Show { id } => execute("quotation.show", |app| show(app, id)),
        QuotationCommand::Update { id, file } => {
            execute("quotation.update", |app| update(app, id, file))
        }
        QuotationCommand::Approve { id } => {
            execute("quotation.approve", |app| set_status(app, id, QuotationStatus::Approved, None))
        }
        QuotationCommand::Reject { id, reason } => {
            execute("quotation.reject", |app| set_status(app, id, QuotationStatus::Rejected, reason))
        }
        QuotationCommand::Convert { id } => execute("quotation.convert", |app| convert(app, id)),
        QuotationCommand::Delete { id } => execute("quotation.delete", |app| delete(app, id)),
        QuotationCommand::Stats => execute("quotation.stats", stats),
    }
}

async fn create(app: Application, file: PathBuf) -> Outcome {
    let request: QuotationRequest = read_json_file(&file)?;
    let quotation = app.quotations.create_quotation(request).await.map_err(store_failure)?;
    let message = format!(
        "created quotation {} totalling {}",
        quotation.id,
        round_currency(quotation.total_amount)
    );
    Ok((message, to_data(&quotation)?))
}

async fn list(app: Application, user: Option<String>, search: Option<String>) -> Outcome {
    let quotations = match (&user, &search) {
        (_, Some(term)) => app
            .quotations
            .search(term)
            .await
            .into_iter()
            .filter(|hit| user.as_ref().map_or(true, |user| &hit.user_id == user))
            .collect(),
        (Some(user), None) => app.quotations.get_quotations_by_user(user).await,
        (None, None) => app.quotations.list_quotations().await,
    };
    Ok((format!("{} quotation(s)", quotations.len()), to_data(&quotations)?))
}

async fn show(app: Application, id: String) -> Outcome {
    let quotation = app.quotations.get_quotation(&id).await.map_err(store_failure)?;
    Ok((format!("quotation {} is {}", quotation.id, quotation.status), to_data(&quotation)?))
}

async fn update(app: Application, id: String, file: PathBuf) -> Outcome {
    let patch: QuotationPatch = read_json_file(&file)?;
    let quotation = app.quotations.update_quotation(&id, patch).await.map_err(store_failure)?;
    Ok((format!("updated quotation {}", quotation.id), to_data(&quotation)?))
}

async fn set_status(
    app: Application,
    id: String,
    status: QuotationStatus,
    reason: Option<String>,
) -> Outcome {
    let quotation = app
        .quotations
        .update_quotation_status(&id, status, reason.as_deref())
        .await
        .map_err(store_failure)?;
    Ok((format!("quotation {} is {}", quotation.id, quotation.status), to_data(&quotation)?))
}

async fn convert(app: Application, id: String) -> Outcome {
    let order_id = app.quotations.convert_to_order(&id).await.map_err(store_failure)?;
    let order = app.orders.get_order(&order_id.0).await.map_err(store_failure)?;
    Ok((format!("converted quotation {id} into order {order_id}"), to_data(&order)?))
}

async fn delete(app: Application, id: String) -> Outcome {
    app.quotations.delete_quotation(&id).await.map_err(store_failure)?;
    Ok((format!("deleted quotation {id}"), None))
}

async fn stats(app: Application) -> Outcome {
    let stats = app.quotations.stats().await;
    Ok((format!("{} quotation(s)", stats.total), to_data(&stats)?))
}
