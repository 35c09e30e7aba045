use clap::Subcommand;
use starbags_core::ProductId;
use starbags_stores::Application;

use crate::commands::{execute, store_failure, to_data, CommandResult, Outcome};

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    #[command(about = "List stock levels from the inventory service")]
    List,
    #[command(about = "List items at or below their reorder level")]
    LowStock,
    #[command(about = "Register stock for a product")]
    Add {
        #[arg(long)]
        product: String,
        #[arg(long)]
        stock: u32,
        #[arg(long)]
        reorder: u32,
    },
    #[command(about = "Add units to an item")]
    Increase { id: String, amount: u32 },
    #[command(about = "Remove units from an item, stopping at zero")]
    Reduce { id: String, amount: u32 },
    #[command(about = "Remove an item from the inventory service")]
    Delete { id: String },
}

#[derive(Clone, Copy)]
enum Adjustment {
    Increase,
    Reduce,
}

pub fn run(command: InventoryCommand) -> CommandResult {
    match command {
        InventoryCommand::List => execute("inventory.list", |app| list(app, false)),
        InventoryCommand::LowStock => execute("inventory.low_stock", |app| list(app, true)),
        InventoryCommand::Add { product, stock, reorder } => {
            execute("inventory.add", |app| add(app, product, stock, reorder))
        }
        InventoryCommand::Increase { id, amount } => {
            execute("inventory.increase", |app| adjust(app, id, amount, Adjustment::Increase))
        }
        InventoryCommand::Reduce { id, amount } => {
            execute("inventory.reduce", |app| adjust(app, id, amount, Adjustment::Reduce))
        }
        InventoryCommand::Delete { id } => execute("inventory.delete", |app| delete(app, id)),
    }
}

// Every invocation is a fresh process, so the cache is filled before use.
async fn list(app: Application, low_stock_only: bool) -> Outcome {
    app.inventory.refresh().await.map_err(store_failure)?;
    let items = if low_stock_only {
        app.inventory.low_stock_items().await
    } else {
        app.inventory.list_items().await
    };
    Ok((format!("{} inventory item(s)", items.len()), to_data(&items)?))
}

async fn add(app: Application, product: String, stock: u32, reorder: u32) -> Outcome {
    app.inventory.refresh().await.map_err(store_failure)?;
    let item =
        app.inventory.add_item(&ProductId(product), stock, reorder).await.map_err(store_failure)?;
    Ok((format!("added inventory item {}", item.id), to_data(&item)?))
}

async fn adjust(app: Application, id: String, amount: u32, adjustment: Adjustment) -> Outcome {
    app.inventory.refresh().await.map_err(store_failure)?;
    let item = match adjustment {
        Adjustment::Increase => app.inventory.increase_stock(&id, amount).await,
        Adjustment::Reduce => app.inventory.reduce_stock(&id, amount).await,
    }
    .map_err(store_failure)?;
    Ok((format!("item {} now holds {}", item.id, item.quantity_in_stock), to_data(&item)?))
}

async fn delete(app: Application, id: String) -> Outcome {
    app.inventory.refresh().await.map_err(store_failure)?;
    app.inventory.delete_item(&id).await.map_err(store_failure)?;
    Ok((format!("deleted inventory item {id}"), None))
}
