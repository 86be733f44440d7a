//! Cart commands.

use clap::Subcommand;
use greenshoes_client::Storefront;
use greenshoes_client::api::types::{AddToCart, VariantChange};
use greenshoes_core::{CartItemId, ProductId};

use super::{CommandError, output};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart (default)
    Show,
    /// Add a product variant
    Add {
        product: ProductId,

        #[arg(short, long)]
        color: String,

        #[arg(short, long)]
        size: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Add one unit to a line
    Inc { item: CartItemId },
    /// Remove one unit from a line
    Dec { item: CartItemId },
    /// Remove a line
    Remove { item: CartItemId },
    /// Switch a line to another color or size
    Variant {
        item: CartItemId,

        #[arg(short, long)]
        color: Option<String>,

        #[arg(short, long)]
        size: Option<String>,
    },
    /// Move a line to the wishlist (signed-in only)
    Save { item: CartItemId },
}

pub async fn run(store: &Storefront, action: Option<CartAction>) -> Result<(), CommandError> {
    let cart = store.cart();
    match action.unwrap_or(CartAction::Show) {
        CartAction::Show => cart.fetch().await?,
        CartAction::Add {
            product,
            color,
            size,
            quantity,
        } => {
            cart.add_item(&AddToCart {
                product_id: product,
                color,
                size,
                quantity,
            })
            .await?;
        }
        CartAction::Inc { item } => cart.increase_quantity(item).await?,
        CartAction::Dec { item } => cart.decrease_quantity(item).await?,
        CartAction::Remove { item } => cart.remove_item(item).await?,
        CartAction::Variant { item, color, size } => {
            cart.change_variant(item, &VariantChange { color, size }).await?;
        }
        CartAction::Save { item } => {
            store.move_cart_item_to_wishlist(item).await?;
            output::line("Moved to wishlist.");
        }
    }

    let state = cart.snapshot();
    output::cart(&state.items, state.summary.as_ref());
    Ok(())
}
