//! Session identity against the fake storefront API.
//!
//! Covers which identity header each request carries, how sign-in, sign-up,
//! sign-out and expired tokens move a session between guest and account, and
//! how a sign-in in one tab reaches the others.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use greenshoes_client::api::types::AddToCart;
use greenshoes_client::{FailureKind, RegisterForm, Session};
use greenshoes_integration_tests::{FakeApi, eventually, settle_after_login};

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "Abcdef1!";

fn add(api: &FakeApi) -> AddToCart {
    AddToCart {
        product_id: api.product(0),
        color: "Blue".to_string(),
        size: "9".to_string(),
        quantity: 1,
    }
}

#[tokio::test]
async fn test_every_request_carries_exactly_one_identity() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);
    let store = api.storefront(Session::in_memory());

    store.cart().add_item(&add(&api)).await.unwrap();
    store.login(EMAIL, PASSWORD).await.unwrap();
    store.cart().fetch().await.unwrap();
    store.wishlist().fetch().await.unwrap();

    let calls = api.calls();
    assert!(!calls.is_empty());
    assert!(calls.iter().all(|c| c.identity_headers() == 1));

    let login = calls.iter().position(|c| c.path == "/auth/login").unwrap();
    let (before, after) = calls.split_at(login + 1);
    assert!(before.iter().all(|c| c.guest_id.is_some()));
    assert!(after.iter().all(|c| c
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Bearer "))));
}

#[tokio::test]
async fn test_guest_id_is_stable_until_logout() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());

    store.cart().fetch().await.unwrap();
    store.cart().fetch().await.unwrap();
    let first = store.session().guest_id().to_string();

    let calls = api.calls_to(&Method::GET, "/cart");
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.guest_id.as_deref() == Some(first.as_str())));

    let rotated = store.logout().to_string();
    assert_ne!(first, rotated);

    api.clear_calls();
    store.cart().fetch().await.unwrap();
    let calls = api.calls_to(&Method::GET, "/cart");
    assert!(calls.iter().all(|c| c.guest_id.as_deref() == Some(rotated.as_str())));
}

#[tokio::test]
async fn test_login_picks_up_merged_guest_cart() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);
    let store = api.storefront(Session::in_memory());

    store.cart().add_item(&add(&api)).await.unwrap();
    assert_eq!(store.cart().item_count(), 1);

    let user = store.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(user.name, "Ada");
    assert_eq!(api.account_cart(EMAIL), vec![1]);

    // The sync task refetches under the new credential.
    assert!(
        eventually(|| !api
            .calls_to(&Method::GET, "/cart")
            .iter()
            .all(|c| c.authorization.is_none()))
        .await
    );
    assert!(eventually(|| store.cart().item_count() == 1).await);
    assert!(store.session().is_authenticated());
}

#[tokio::test]
async fn test_wrong_password_keeps_guest_session() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);
    let store = api.storefront(Session::in_memory());

    let err = store.login(EMAIL, "nope").await.unwrap_err();
    assert_eq!(err.message(), "Invalid credentials");
    assert_eq!(err.kind(), FailureKind::Rejected);
    assert!(!store.session().is_authenticated());
    assert!(!store.session().needs_login());
}

#[tokio::test]
async fn test_weak_password_never_reaches_the_api() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());

    let mut form = RegisterForm {
        full_name: "Ada Lovelace".to_string(),
        email: EMAIL.to_string(),
        password: "abc".to_string(),
        confirm_password: "abc".to_string(),
    };
    let err = store.register(&form).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(api.calls_to(&Method::POST, "/auth/register").is_empty());

    form.password = PASSWORD.to_string();
    form.confirm_password = PASSWORD.to_string();
    let user = store.register(&form).await.unwrap();
    assert_eq!(user.name, "Ada Lovelace");
    assert_eq!(api.calls_to(&Method::POST, "/auth/register").len(), 1);
    assert!(store.session().is_authenticated());
}

#[tokio::test]
async fn test_rejected_token_signs_out_and_raises_login_prompt() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);
    let store = api.storefront(Session::in_memory());
    let mut prompt = store.session().login_required();

    store.login(EMAIL, PASSWORD).await.unwrap();
    settle_after_login(&api, &store).await;
    api.expire_tokens();

    let err = store.cart().fetch().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Unauthorized);
    assert!(!store.session().is_authenticated());
    assert!(store.session().current_user().is_none());
    assert!(store.session().needs_login());
    assert!(prompt.has_changed().unwrap());
    assert!(*prompt.borrow_and_update());

    // The next request falls back to the guest identity.
    api.clear_calls();
    store.cart().fetch().await.unwrap();
    let calls = api.calls_to(&Method::GET, "/cart");
    assert!(calls.iter().all(|c| c.guest_id.is_some() && c.authorization.is_none()));
}

#[tokio::test]
async fn test_rejected_token_drops_account_data_from_every_container() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);
    let store = api.storefront(Session::in_memory());

    store.login(EMAIL, PASSWORD).await.unwrap();
    settle_after_login(&api, &store).await;
    let saved = api.product(1);
    store.wishlist().add(saved).await.unwrap();
    assert!(store.wishlist().is_saved(saved));
    api.expire_tokens();

    let err = store.cart().fetch().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Unauthorized);
    assert_eq!(store.wishlist().item_count(), 0);
    assert!(!store.wishlist().is_saved(saved));

    // Both containers resync as the guest, whose wishlist is empty.
    assert!(
        eventually(|| api
            .calls_to(&Method::GET, "/wishlist")
            .iter()
            .any(|c| c.guest_id.is_some()))
        .await
    );
    assert!(eventually(|| !store.wishlist().is_loading()).await);
    assert!(!store.wishlist().is_saved(saved));
    assert_eq!(api.account_wishlist(EMAIL), vec![saved]);
}

#[tokio::test]
async fn test_login_in_one_tab_refreshes_the_other() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);

    let first_session = Session::in_memory();
    let second_session = first_session.new_tab();
    let first = api.storefront(first_session);
    let second = api.storefront(second_session);

    // Tabs have their own guest carts.
    second.cart().add_item(&add(&api)).await.unwrap();
    first.cart().fetch().await.unwrap();
    assert_eq!(first.cart().item_count(), 0);
    assert_ne!(first.session().guest_id(), second.session().guest_id());

    second.login(EMAIL, PASSWORD).await.unwrap();

    // The first tab sees the shared token change and refetches as the account.
    assert!(first.session().is_authenticated());
    assert!(eventually(|| first.cart().item_count() == 1).await);
}

#[tokio::test]
async fn test_logout_empties_containers_before_returning() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);
    let store = api.storefront(Session::in_memory());

    store.login(EMAIL, PASSWORD).await.unwrap();
    settle_after_login(&api, &store).await;
    store.cart().add_item(&add(&api)).await.unwrap();
    store.wishlist().add(api.product(1)).await.unwrap();
    assert_eq!(store.cart().item_count(), 1);
    assert_eq!(store.wishlist().item_count(), 1);

    let guest = store.logout();

    assert_eq!(store.cart().item_count(), 0);
    assert_eq!(store.wishlist().item_count(), 0);
    assert!(!store.session().is_authenticated());

    // Containers then resync for the new guest, whose cart is empty.
    let guest = guest.to_string();
    assert!(
        eventually(|| api
            .calls_to(&Method::GET, "/cart")
            .iter()
            .any(|c| c.guest_id.as_deref() == Some(guest.as_str())))
        .await
    );
    assert_eq!(store.cart().item_count(), 0);
    assert_eq!(api.account_cart(EMAIL), vec![1]);
}
