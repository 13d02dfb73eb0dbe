//! Account CLI commands
//!
//! Implements CLI commands for account management.

use clap::Subcommand;

use crate::display::account::{format_account_details, format_account_list};
use crate::error::StoreResult;
use crate::events::EventSink;
use crate::models::Credits;
use crate::services::AccountService;
use crate::storage::Storage;

use super::{parse_credits, parse_user};

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open an account for a new user
    Create {
        /// Opening balance in credits
        #[arg(short, long, default_value = "0")]
        balance: String,
    },
    /// List all accounts
    List,
    /// Show an account and its quotas
    Show {
        /// User ID
        user: String,
    },
    /// Add credits to an account
    Grant {
        /// User ID
        user: String,
        /// Credits to add
        amount: String,
    },
    /// Close an account and drop its quotas
    Delete {
        /// User ID
        user: String,
    },
}

/// Handle an account command
pub fn handle_account_command(
    storage: &Storage,
    events: &dyn EventSink,
    cmd: AccountCommands,
) -> StoreResult<()> {
    let service = AccountService::new(storage, events);

    match cmd {
        AccountCommands::Create { balance } => {
            let balance: Credits = parse_credits(&balance)?;
            let account = service.create(balance)?;

            println!("Created account: {}", account.user_id);
            println!("  User ID: {}", account.user_id.as_uuid());
            println!("  Balance: {}", account.balance);
        }

        AccountCommands::List => {
            let accounts = service.list()?;
            print!("{}", format_account_list(&accounts));
        }

        AccountCommands::Show { user } => {
            let summary = service.summary(parse_user(&user)?)?;
            print!("{}", format_account_details(&summary));
        }

        AccountCommands::Grant { user, amount } => {
            let user_id = parse_user(&user)?;
            let amount = parse_credits(&amount)?;
            let balance = service.grant(user_id, amount)?;
            println!("Granted {} credits to {}", amount, user_id);
            println!("  Balance: {}", balance);
        }

        AccountCommands::Delete { user } => {
            let deleted = service.delete(parse_user(&user)?)?;
            println!(
                "Deleted account: {} (forfeited {} credits)",
                deleted.user_id, deleted.balance
            );
        }
    }

    Ok(())
}
