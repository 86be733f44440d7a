//! Core types for the Greenshoes storefront client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod card;
pub mod credential;
pub mod email;
pub mod id;
pub mod password;
pub mod price;
pub mod status;

pub use card::{CardNumber, CardNumberError, format_card_number, format_expiry, luhn_valid};
pub use credential::{BearerToken, Credential, GuestId, UserProfile};
pub use email::{Email, EmailError, LoginId};
pub use id::*;
pub use password::{PasswordPolicyError, PasswordRule, validate_password};
pub use price::Price;
pub use status::OrderStatus;
