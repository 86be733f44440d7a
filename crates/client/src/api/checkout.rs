//! `/checkout` endpoints.
//!
//! Three flows exist: guests enter shipping and card details inline, while
//! signed-in accounts ship to a saved address and pay with either the
//! stored card (re-entering only the CVC) or a new card. Every request is
//! checked locally first; an incomplete form or a card number failing the
//! Luhn checksum never reaches the API.

use greenshoes_core::{AddressId, CardNumber, CardNumberError};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use super::ApiClient;
use super::types::{CheckoutResponse, OrderConfirmation};
use crate::error::ApiError;

/// Why a checkout did not go through.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please select a shipping address")]
    MissingShippingAddress,

    #[error("Please fill in all shipping address fields")]
    IncompleteShipping,

    #[error("Please enter your CVC")]
    MissingCvc,

    #[error("Please fill in all payment fields")]
    IncompletePayment,

    #[error(transparent)]
    InvalidCard(#[from] CardNumberError),

    /// The API refused the order or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The API accepted the order but returned neither an order nor a summary.
    #[error("Checkout response contained no order")]
    MissingOrder,
}

impl CheckoutError {
    /// Whether the request was stopped before reaching the network.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        !matches!(self, Self::Api(_) | Self::MissingOrder)
    }
}

/// Shipping details typed in at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingDetails {
    pub full_name: String,
    pub phone: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: Option<String>,
}

impl ShippingDetails {
    fn is_complete(&self) -> bool {
        [
            &self.full_name,
            &self.phone,
            &self.address1,
            &self.city,
            &self.state,
            &self.postal_code,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// Guest checkout: everything entered inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestCheckout {
    pub shipping: ShippingDetails,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

/// Account checkout paying with the stored card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedCardCheckout {
    pub shipping_address_id: Option<AddressId>,
    /// Defaults to the shipping address.
    pub billing_address_id: Option<AddressId>,
    pub cvc: String,
}

/// Account checkout paying with a newly entered card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCardCheckout {
    pub shipping_address_id: Option<AddressId>,
    /// Defaults to the shipping address.
    pub billing_address_id: Option<AddressId>,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
    /// Store the card on the account for next time.
    pub save_card: bool,
}

/// One of the three checkout flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutRequest {
    Guest(GuestCheckout),
    SavedCard(SavedCardCheckout),
    NewCard(NewCardCheckout),
}

// =============================================================================
// Wire bodies
// =============================================================================

#[derive(Serialize)]
struct GuestBody<'a> {
    shipping_full_name: &'a str,
    shipping_phone: &'a str,
    shipping_address1: &'a str,
    shipping_address2: Option<&'a str>,
    shipping_city: &'a str,
    shipping_state: &'a str,
    shipping_postal_code: &'a str,
    shipping_country: Option<&'a str>,
    card_number: &'a str,
    expiry: &'a str,
    cvc: &'a str,
}

#[derive(Serialize)]
struct SavedCardBody<'a> {
    shipping_address_id: AddressId,
    billing_address_id: AddressId,
    cvc: &'a str,
}

#[derive(Serialize)]
struct NewCardBody<'a> {
    shipping_address_id: AddressId,
    billing_address_id: AddressId,
    card_number: &'a str,
    expiry: &'a str,
    cvc: &'a str,
    save_card: bool,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn payment_fields(card_number: &str, expiry: &str, cvc: &str) -> Result<CardNumber, CheckoutError> {
    if blank(card_number) || blank(expiry) || blank(cvc) {
        return Err(CheckoutError::IncompletePayment);
    }
    Ok(CardNumber::parse(card_number)?)
}

impl CheckoutRequest {
    pub(crate) const fn flow(&self) -> &'static str {
        match self {
            Self::Guest(_) => "guest",
            Self::SavedCard(_) => "saved-card",
            Self::NewCard(_) => "new-card",
        }
    }

    /// Check the request without sending it.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in form order: shipping, then
    /// payment.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        match self {
            Self::Guest(guest) => {
                if !guest.shipping.is_complete() {
                    return Err(CheckoutError::IncompleteShipping);
                }
                payment_fields(&guest.card_number, &guest.expiry, &guest.cvc).map(drop)
            }
            Self::SavedCard(saved) => {
                if saved.shipping_address_id.is_none() {
                    return Err(CheckoutError::MissingShippingAddress);
                }
                if blank(&saved.cvc) {
                    return Err(CheckoutError::MissingCvc);
                }
                Ok(())
            }
            Self::NewCard(new) => {
                if new.shipping_address_id.is_none() {
                    return Err(CheckoutError::MissingShippingAddress);
                }
                payment_fields(&new.card_number, &new.expiry, &new.cvc).map(drop)
            }
        }
    }
}

impl ApiClient {
    /// Validate `request` locally, then place the order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the form is incomplete, the card number is
    /// invalid, or the API refuses the order.
    #[instrument(skip_all, fields(flow = request.flow()))]
    pub async fn checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<OrderConfirmation, CheckoutError> {
        request.validate()?;

        let response: CheckoutResponse = match request {
            CheckoutRequest::Guest(guest) => {
                let card = CardNumber::parse(&guest.card_number)?;
                let s = &guest.shipping;
                let body = GuestBody {
                    shipping_full_name: s.full_name.trim(),
                    shipping_phone: s.phone.trim(),
                    shipping_address1: s.address1.trim(),
                    shipping_address2: s.address2.as_deref(),
                    shipping_city: s.city.trim(),
                    shipping_state: s.state.trim(),
                    shipping_postal_code: s.postal_code.trim(),
                    shipping_country: s.country.as_deref(),
                    card_number: card.as_str(),
                    expiry: guest.expiry.trim(),
                    cvc: guest.cvc.trim(),
                };
                self.post("/checkout/guest", &body).await?
            }
            CheckoutRequest::SavedCard(saved) => {
                let shipping = saved
                    .shipping_address_id
                    .ok_or(CheckoutError::MissingShippingAddress)?;
                let body = SavedCardBody {
                    shipping_address_id: shipping,
                    billing_address_id: saved.billing_address_id.unwrap_or(shipping),
                    cvc: saved.cvc.trim(),
                };
                self.post("/checkout/saved-card", &body).await?
            }
            CheckoutRequest::NewCard(new) => {
                let shipping = new
                    .shipping_address_id
                    .ok_or(CheckoutError::MissingShippingAddress)?;
                let card = CardNumber::parse(&new.card_number)?;
                let body = NewCardBody {
                    shipping_address_id: shipping,
                    billing_address_id: new.billing_address_id.unwrap_or(shipping),
                    card_number: card.as_str(),
                    expiry: new.expiry.trim(),
                    cvc: new.cvc.trim(),
                    save_card: new.save_card,
                };
                self.post("/checkout/new-card", &body).await?
            }
        };

        let confirmation = match (response.order, response.order_summary) {
            (Some(order), _) => OrderConfirmation::Order(Box::new(order)),
            (None, Some(summary)) => OrderConfirmation::Summary(summary),
            (None, None) => return Err(CheckoutError::MissingOrder),
        };
        info!(order_number = ?confirmation.order_number(), "Order placed");
        Ok(confirmation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Ada Lovelace".to_string(),
            phone: "555-0100".to_string(),
            address1: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "LN".to_string(),
            postal_code: "12345".to_string(),
            ..ShippingDetails::default()
        }
    }

    #[test]
    fn test_guest_requires_shipping_fields() {
        let request = CheckoutRequest::Guest(GuestCheckout {
            shipping: ShippingDetails {
                city: "  ".to_string(),
                ..shipping()
            },
            card_number: "4242 4242 4242 4242".to_string(),
            expiry: "12/2030".to_string(),
            cvc: "123".to_string(),
        });
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please fill in all shipping address fields");
        assert!(err.is_local());
    }

    #[test]
    fn test_guest_rejects_bad_checksum() {
        let request = CheckoutRequest::Guest(GuestCheckout {
            shipping: shipping(),
            card_number: "4242 4242 4242 4241".to_string(),
            expiry: "12/2030".to_string(),
            cvc: "123".to_string(),
        });
        assert!(matches!(
            request.validate(),
            Err(CheckoutError::InvalidCard(CardNumberError::Checksum))
        ));
    }

    #[test]
    fn test_guest_valid() {
        let request = CheckoutRequest::Guest(GuestCheckout {
            shipping: shipping(),
            card_number: "4242 4242 4242 4242".to_string(),
            expiry: "12/2030".to_string(),
            cvc: "123".to_string(),
        });
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_saved_card_requires_address_then_cvc() {
        let mut saved = SavedCardCheckout::default();
        assert!(matches!(
            CheckoutRequest::SavedCard(saved.clone()).validate(),
            Err(CheckoutError::MissingShippingAddress)
        ));

        saved.shipping_address_id = Some(AddressId::new(uuid::Uuid::new_v4()));
        assert_eq!(
            CheckoutRequest::SavedCard(saved).validate().unwrap_err().to_string(),
            "Please enter your CVC"
        );
    }

    #[test]
    fn test_new_card_requires_payment_fields() {
        let request = CheckoutRequest::NewCard(NewCardCheckout {
            shipping_address_id: Some(AddressId::new(uuid::Uuid::new_v4())),
            card_number: "4242424242424242".to_string(),
            ..NewCardCheckout::default()
        });
        assert!(matches!(
            request.validate(),
            Err(CheckoutError::IncompletePayment)
        ));
    }
}
