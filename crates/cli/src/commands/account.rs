//! Orders, addresses and the saved card.

use clap::Subcommand;
use greenshoes_client::Storefront;
use greenshoes_client::api::types::AddressForm;
use greenshoes_core::{AddressId, OrderId};

use super::{CommandError, output};

#[derive(Subcommand)]
pub enum OrderAction {
    /// List orders (default)
    List,
    /// Show one order
    Show { id: OrderId },
    /// Put an order's items back in the cart
    Reorder { id: OrderId },
}

#[derive(Subcommand)]
pub enum AddressAction {
    /// List saved addresses (default)
    List,
    /// Save a new address
    Add {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address1: String,
        #[arg(long)]
        address2: Option<String>,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        country: Option<String>,
        /// Make it the default shipping address
        #[arg(long)]
        default: bool,
    },
    /// Delete an address
    Delete { id: AddressId },
    /// Make an address the default
    Default { id: AddressId },
}

#[derive(Subcommand)]
pub enum CardAction {
    /// Show the saved card (default)
    Show,
    /// Save a card, replacing the current one
    Save {
        #[arg(long)]
        number: String,
        /// MM/YY
        #[arg(long)]
        expiry: String,
        #[arg(long)]
        cvc: String,
    },
    /// Remove the saved card
    Delete,
}

pub async fn orders(store: &Storefront, action: Option<OrderAction>) -> Result<(), CommandError> {
    match action.unwrap_or(OrderAction::List) {
        OrderAction::List => output::orders(&store.orders().await?),
        OrderAction::Show { id } => output::order(&store.order(id).await?),
        OrderAction::Reorder { id } => {
            store.reorder(id).await?;
            let state = store.cart().snapshot();
            output::cart(&state.items, state.summary.as_ref());
        }
    }
    Ok(())
}

pub async fn addresses(
    store: &Storefront,
    action: Option<AddressAction>,
) -> Result<(), CommandError> {
    match action.unwrap_or(AddressAction::List) {
        AddressAction::List => {}
        AddressAction::Add {
            full_name,
            phone,
            address1,
            address2,
            city,
            state,
            postal_code,
            country,
            default,
        } => {
            let form = AddressForm {
                full_name,
                phone,
                address1,
                address2,
                city,
                state,
                postal_code,
                country,
                is_default: default,
            };
            let address = store.add_address(&form).await?;
            output::line(format_args!("Saved address {}", address.id));
        }
        AddressAction::Delete { id } => store.delete_address(id).await?,
        AddressAction::Default { id } => store.set_default_address(id).await?,
    }
    output::addresses(&store.addresses().await?);
    Ok(())
}

pub async fn card(store: &Storefront, action: Option<CardAction>) -> Result<(), CommandError> {
    match action.unwrap_or(CardAction::Show) {
        CardAction::Show => {}
        CardAction::Save {
            number,
            expiry,
            cvc,
        } => store.save_card(&number, &expiry, &cvc).await?,
        CardAction::Delete => store.delete_saved_card().await?,
    }
    output::saved_card(store.saved_card().await?.as_ref());
    Ok(())
}
