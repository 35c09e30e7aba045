use clap::Subcommand;
use starbags_core::OrderStatus;
use starbags_stores::Application;

use crate::commands::{execute, input_failure, store_failure, to_data, CommandResult, Outcome};

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    #[command(about = "List orders, newest first")]
    List,
    #[command(about = "Move an order forward: processing, shipped, delivered")]
    Status { id: String, status: String },
}

pub fn run(command: OrderCommand) -> CommandResult {
    match command {
        OrderCommand::List => execute("order.list", list),
        OrderCommand::Status { id, status } => execute("order.status", |app| set_status(app, id, status)),
    }
}

async fn list(app: Application) -> Outcome {
    let orders = app.orders.list_recent().await;
    Ok((format!("{} order(s)", orders.len()), to_data(&orders)?))
}

async fn set_status(app: Application, id: String, status: String) -> Outcome {
    let status = status.parse::<OrderStatus>().map_err(|error| input_failure(error.to_string()))?;
    let order = app.orders.update_order_status(&id, status).await.map_err(store_failure)?;
    Ok((format!("order {} is {}", order.id, order.status), to_data(&order)?))
}
