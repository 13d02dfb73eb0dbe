//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Account;
use crate::services::account::AccountSummary;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Version")]
    version: u64,
    #[tabled(rename = "Created")]
    created: String,
}

#[derive(Tabled)]
struct QuotaRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Current")]
    current: u64,
}

/// Format a list of accounts as a table
pub fn format_account_list(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let rows = accounts.iter().map(|a| AccountRow {
        user: a.user_id.as_uuid().to_string(),
        balance: a.balance.to_string(),
        version: a.version,
        created: a.created_at.format("%Y-%m-%d %H:%M").to_string(),
    });
    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}

/// Format a single account's details
pub fn format_account_details(summary: &AccountSummary) -> String {
    let account = &summary.account;

    let mut output = String::new();
    output.push_str(&format!("Account: {}\n", account.user_id));
    output.push_str(&format!("  User ID:  {}\n", account.user_id.as_uuid()));
    output.push_str(&format!("  Balance:  {}\n", account.balance));
    output.push_str(&format!("  Version:  {}\n", account.version));
    output.push_str(&format!(
        "  Created:  {}\n",
        account.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push('\n');

    if summary.quotas.is_empty() {
        output.push_str("  No quotas purchased.\n");
        return output;
    }

    let rows = summary.quotas.iter().map(|q| QuotaRow {
        resource: q.resource.to_string(),
        current: q.current,
    });
    let mut table = Table::new(rows);
    table.with(Style::psql());
    output.push_str(&format!("{}\n", table));
    output
}
