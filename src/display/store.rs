//! Store display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config::catalog::{Catalog, ConfigProvider};
use crate::services::PurchaseReceipt;

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Item")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Adds")]
    adds: String,
    #[tabled(rename = "Max")]
    max: u64,
    #[tabled(rename = "")]
    status: &'static str,
}

/// Format the catalog as a table
pub fn format_item_list(catalog: &Catalog) -> String {
    if catalog.items.is_empty() {
        return "No items in the catalog.\n".to_string();
    }

    let rows = catalog.items.iter().map(|item| ItemRow {
        id: item.id.clone(),
        name: item.name.clone(),
        price: item.price.to_string(),
        adds: format!("{} {}", item.effect.amount(), item.effect.resource()),
        max: catalog.get_max(item.effect.resource()),
        status: if item.blocked { "blocked" } else { "" },
    });
    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}

/// Format the result of a purchase
pub fn format_receipt(receipt: &PurchaseReceipt) -> String {
    format!(
        "Purchased {} for {} credits\n  Balance:  {}\n  {}:  {}\n",
        receipt.item_id,
        receipt.price,
        receipt.remaining_balance,
        receipt.resource,
        receipt.new_current
    )
}
