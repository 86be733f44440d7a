//! Checkout commands.

use clap::{Args, Subcommand};
use greenshoes_client::Storefront;
use greenshoes_client::api::{
    CheckoutRequest, GuestCheckout, NewCardCheckout, SavedCardCheckout, ShippingDetails,
};
use greenshoes_core::AddressId;

use super::{CommandError, output};

#[derive(Subcommand)]
pub enum CheckoutFlow {
    /// Check out as a guest with inline shipping and card details
    Guest {
        #[command(flatten)]
        shipping: ShippingArgs,

        #[command(flatten)]
        card: CardArgs,
    },
    /// Pay with the saved card
    SavedCard {
        /// Shipping address ID
        #[arg(long)]
        address: AddressId,

        /// Billing address ID (defaults to the shipping address)
        #[arg(long)]
        billing: Option<AddressId>,

        #[arg(long)]
        cvc: String,
    },
    /// Pay with a new card
    NewCard {
        /// Shipping address ID
        #[arg(long)]
        address: AddressId,

        /// Billing address ID (defaults to the shipping address)
        #[arg(long)]
        billing: Option<AddressId>,

        #[command(flatten)]
        card: CardArgs,

        /// Keep the card for next time
        #[arg(long)]
        save_card: bool,
    },
}

#[derive(Args)]
pub struct ShippingArgs {
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
}

#[derive(Args)]
pub struct CardArgs {
    #[arg(long)]
    card_number: String,
    /// MM/YY
    #[arg(long)]
    expiry: String,
    #[arg(long)]
    cvc: String,
}

impl From<ShippingArgs> for ShippingDetails {
    fn from(args: ShippingArgs) -> Self {
        Self {
            full_name: args.full_name,
            phone: args.phone,
            address1: args.address1,
            address2: args.address2,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            country: args.country,
        }
    }
}

impl From<CheckoutFlow> for CheckoutRequest {
    fn from(flow: CheckoutFlow) -> Self {
        match flow {
            CheckoutFlow::Guest { shipping, card } => Self::Guest(GuestCheckout {
                shipping: shipping.into(),
                card_number: card.card_number,
                expiry: card.expiry,
                cvc: card.cvc,
            }),
            CheckoutFlow::SavedCard {
                address,
                billing,
                cvc,
            } => Self::SavedCard(SavedCardCheckout {
                shipping_address_id: Some(address),
                billing_address_id: billing,
                cvc,
            }),
            CheckoutFlow::NewCard {
                address,
                billing,
                card,
                save_card,
            } => Self::NewCard(NewCardCheckout {
                shipping_address_id: Some(address),
                billing_address_id: billing,
                card_number: card.card_number,
                expiry: card.expiry,
                cvc: card.cvc,
                save_card,
            }),
        }
    }
}

pub async fn run(store: &Storefront, flow: CheckoutFlow) -> Result<(), CommandError> {
    let request = CheckoutRequest::from(flow);
    let confirmation = store.checkout(&request).await?;
    output::confirmation(&confirmation);
    Ok(())
}
