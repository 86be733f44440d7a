//! Account endpoints: saved addresses and the stored payment card.

use greenshoes_core::{AddressId, CardNumber};
use serde::de::IgnoredAny;
use tracing::instrument;

use super::ApiClient;
use super::types::{
    Address, AddressEnvelope, AddressForm, AddressList, SaveCardRequest, SavedCard,
    SavedCardResponse,
};
use crate::error::ApiError;

impl ApiClient {
    // =========================================================================
    // Addresses
    // =========================================================================

    /// `GET /addresses`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_addresses(&self) -> Result<Vec<Address>, ApiError> {
        let list: Option<AddressList> = self.get("/addresses").await?;
        Ok(list.unwrap_or_default().addresses)
    }

    /// `GET /addresses/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the address does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_address(&self, id: AddressId) -> Result<Address, ApiError> {
        let envelope: AddressEnvelope = self.get(&format!("/addresses/{id}")).await?;
        Ok(envelope.address)
    }

    /// `POST /addresses`: save a new address and return it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the API refuses the address or the request fails.
    #[instrument(skip(self, form))]
    pub async fn add_address(&self, form: &AddressForm) -> Result<Address, ApiError> {
        let envelope: AddressEnvelope = self.post("/addresses", form).await?;
        Ok(envelope.address)
    }

    /// `PUT /addresses/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the API refuses the address or the request fails.
    #[instrument(skip(self, form))]
    pub async fn update_address(&self, id: AddressId, form: &AddressForm) -> Result<(), ApiError> {
        self.put::<IgnoredAny, _>(&format!("/addresses/{id}"), form)
            .await
            .map(drop)
    }

    /// `DELETE /addresses/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        self.delete(&format!("/addresses/{id}")).await.map(drop)
    }

    /// `PATCH /addresses/{id}/set-default`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn set_default_address(&self, id: AddressId) -> Result<(), ApiError> {
        self.patch(&format!("/addresses/{id}/set-default"), None::<&()>)
            .await
            .map(drop)
    }

    // =========================================================================
    // Payment card
    // =========================================================================

    /// `GET /payment-cards`: the stored card, if the account has one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_saved_card(&self) -> Result<Option<SavedCard>, ApiError> {
        let response: Option<SavedCardResponse> = self.get("/payment-cards").await?;
        Ok(response
            .filter(|r| r.has_saved_card)
            .and_then(|r| r.card))
    }

    /// `POST /payment-cards`: store a card, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the API refuses the card or the request fails.
    #[instrument(skip_all, fields(last_four = %number.last_four()))]
    pub async fn save_card(
        &self,
        number: &CardNumber,
        expiry: &str,
        cvc: &str,
    ) -> Result<(), ApiError> {
        let body = SaveCardRequest {
            card_number: number.as_str(),
            expiry,
            cvc,
        };
        self.post::<IgnoredAny, _>("/payment-cards", &body)
            .await
            .map(drop)
    }

    /// `DELETE /payment-cards`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_saved_card(&self) -> Result<(), ApiError> {
        self.delete("/payment-cards").await.map(drop)
    }
}
