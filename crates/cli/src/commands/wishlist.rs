//! Wishlist commands.

use clap::Subcommand;
use greenshoes_client::Storefront;
use greenshoes_client::api::types::VariantChange;
use greenshoes_core::ProductId;

use super::{CommandError, output};

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show the wishlist (default)
    Show,
    /// Save a product
    Add { product: ProductId },
    /// Unsave a product
    Remove { product: ProductId },
    /// Move a saved product into the cart
    Move {
        product: ProductId,

        #[arg(short, long)]
        size: String,

        #[arg(short, long)]
        color: Option<String>,
    },
}

pub async fn run(store: &Storefront, action: Option<WishlistAction>) -> Result<(), CommandError> {
    let wishlist = store.wishlist();
    match action.unwrap_or(WishlistAction::Show) {
        WishlistAction::Show => wishlist.fetch().await?,
        WishlistAction::Add { product } => wishlist.add(product).await?,
        WishlistAction::Remove { product } => wishlist.remove(product).await?,
        WishlistAction::Move {
            product,
            size,
            color,
        } => {
            let variant = VariantChange {
                color,
                size: Some(size),
            };
            store.move_wishlist_to_cart(product, &variant).await?;
            output::line("Moved to cart.");
        }
    }

    output::wishlist(&wishlist.items());
    Ok(())
}
