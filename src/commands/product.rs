use crate::api::{Inventory, TxReceipt};
use crate::args::{AddArgs, UpdateArgs};
use crate::commands::Out;
use crate::export::group_thousands;
use crate::model::Product;
use crate::Result;
use anyhow::ensure;

/// Adds one product after checking that the name is non-empty and both numbers are positive.
pub async fn add(inventory: &Inventory, args: &AddArgs) -> Result<Out<TxReceipt>> {
    validate(args)?;
    let receipt = inventory
        .add_product(args.name().trim(), args.quantity(), args.price())
        .await?;
    Ok(Out::new(
        format!(
            "Product '{}' added in block {}",
            args.name().trim(),
            receipt.block_number
        ),
        receipt,
    ))
}

pub async fn update(inventory: &Inventory, args: &UpdateArgs) -> Result<Out<TxReceipt>> {
    let product = args.product();
    validate(product)?;
    let receipt = inventory
        .update_product(
            args.id(),
            product.name().trim(),
            product.quantity(),
            product.price(),
        )
        .await?;
    Ok(Out::new(
        format!("Product {} updated in block {}", args.id(), receipt.block_number),
        receipt,
    ))
}

pub async fn delete(inventory: &Inventory, id: u64) -> Result<Out<TxReceipt>> {
    let receipt = inventory.delete_product(id).await?;
    Ok(Out::new(
        format!("Product {id} deleted in block {}", receipt.block_number),
        receipt,
    ))
}

/// Shows one product, including whether it is active or deleted.
pub async fn product(inventory: &Inventory, id: u64) -> Result<Out<Product>> {
    let product = inventory.get_product(id).await?;
    Ok(Out::new(describe(&product), product))
}

/// Lists the active products.
pub async fn products(inventory: &Inventory) -> Result<Out<Vec<Product>>> {
    let products = inventory.active_products().await?;
    let mut lines = vec![format!("{} active products", products.len())];
    lines.extend(products.iter().map(describe));
    Ok(Out::new(lines.join("\n"), products))
}

fn validate(args: &AddArgs) -> Result<()> {
    ensure!(!args.name().trim().is_empty(), "Product name cannot be empty");
    ensure!(args.quantity() > 0, "Quantity must be greater than zero");
    ensure!(args.price() > 0, "Price must be greater than zero");
    Ok(())
}

fn describe(p: &Product) -> String {
    format!(
        "ID: {} - {} (Qty: {}, Price: {}, Value: {}) {}",
        p.id(),
        p.name(),
        p.quantity(),
        p.price(),
        group_thousands(p.total_value()),
        if p.is_active() { "Active" } else { "Deleted" }
    )
}
