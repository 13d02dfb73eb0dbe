//! Store CLI commands

use clap::Subcommand;

use crate::config::catalog::Catalog;
use crate::display::store::{format_item_list, format_receipt};
use crate::error::StoreResult;
use crate::events::EventSink;
use crate::services::PurchaseService;
use crate::storage::Storage;

use super::parse_user;

/// Store subcommands
#[derive(Subcommand)]
pub enum StoreCommands {
    /// List catalog items
    Items,
    /// Buy an item for a user
    Buy {
        /// User ID
        user: String,
        /// Catalog item ID, e.g. "memory-1g"
        item: String,
    },
}

/// Handle a store command
pub fn handle_store_command(
    storage: &Storage,
    catalog: &Catalog,
    events: &dyn EventSink,
    cmd: StoreCommands,
) -> StoreResult<()> {
    match cmd {
        StoreCommands::Items => {
            print!("{}", format_item_list(catalog));
        }

        StoreCommands::Buy { user, item } => {
            let service = PurchaseService::new(storage, catalog, events);
            let receipt = service.purchase(parse_user(&user)?, &item)?;
            print!("{}", format_receipt(&receipt));
        }
    }

    Ok(())
}
