//! Terminal rendering.
//!
//! Everything the shopper reads goes through here; logs go to stderr via
//! tracing.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use greenshoes_client::api::types::{
    Address, CartItem, CartSummary, Order, OrderConfirmation, Product, ProductDetail, SavedCard,
    StockStatus, WishlistItem,
};
use greenshoes_core::UserProfile;

use super::CommandError;

pub fn line(text: impl std::fmt::Display) {
    println!("{text}");
}

pub fn failure(err: &CommandError) {
    eprintln!("error: {err}");
}

pub fn user(user: &UserProfile) {
    println!("{} <{}>", user.name, user.email);
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for p in products {
        let sale = if p.on_sale { " (sale)" } else { "" };
        println!(
            "{}  {:<32} {:>10}{sale}  {}",
            p.id,
            p.name,
            p.current_price().display(),
            p.category
        );
    }
}

pub fn product(detail: &ProductDetail) {
    let p = &detail.product;
    println!("{}  {}", p.name, p.current_price().display());
    if let Some(description) = &p.description {
        println!("{description}");
    }
    for color in &detail.colors {
        println!("  {}", color.value);
        for size in detail.sizes_for(color.id) {
            let stock = match StockStatus::from_quantity(size.quantity) {
                StockStatus::InStock => "in stock".to_string(),
                StockStatus::RunningOut(left) => format!("only {left} left"),
                StockStatus::OutOfStock => "out of stock".to_string(),
            };
            println!("    size {:<6} {stock}", size.size_value);
        }
    }
}

pub fn cart(items: &[CartItem], summary: Option<&CartSummary>) {
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in items {
        println!(
            "{}  {} x{}  {} / {}  {}",
            item.cart_item_id,
            item.name,
            item.quantity,
            item.color,
            item.size,
            item.line_total.display()
        );
    }
    if let Some(summary) = summary {
        println!("Subtotal  {}", summary.subtotal.display());
        println!("Tax       {}", summary.tax.display());
        println!("Shipping  {}", summary.shipping.display());
        println!("Total     {}", summary.total.display());
    }
}

pub fn wishlist(items: &[WishlistItem]) {
    if items.is_empty() {
        println!("Your wishlist is empty.");
        return;
    }
    for item in items {
        println!(
            "{}  {:<32} {:>10}",
            item.product_id,
            item.name,
            item.current_price().display()
        );
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in orders {
        let date = order
            .created_at
            .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string());
        println!(
            "{}  {:<12} {date:<10} {:>10}  {}",
            order.id,
            order.reference(),
            order.total.display(),
            order.status
        );
    }
}

pub fn order(order: &Order) {
    println!("Order {}  {}", order.reference(), order.status);
    for item in &order.items {
        println!(
            "  {} x{}  {}",
            item.name,
            item.quantity,
            item.price_at_purchase.display()
        );
    }
    println!("Total {}", order.total.display());
}

pub fn confirmation(confirmation: &OrderConfirmation) {
    match confirmation.order_number() {
        Some(number) => println!("Order placed: {number}"),
        None => println!("Order placed."),
    }
}

pub fn addresses(addresses: &[Address]) {
    if addresses.is_empty() {
        println!("No saved addresses.");
        return;
    }
    for a in addresses {
        let default = if a.is_default { " (default)" } else { "" };
        println!(
            "{}  {}, {}, {} {} {}{default}",
            a.id, a.full_name, a.address1, a.city, a.state, a.postal_code
        );
    }
}

pub fn saved_card(card: Option<&SavedCard>) {
    match card {
        Some(card) => println!(
            "{} {}",
            card.card_type.as_deref().unwrap_or("Card"),
            card.masked_number
        ),
        None => println!("No saved card."),
    }
}
