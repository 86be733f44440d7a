//! Cart and wishlist containers against the fake storefront API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::Method;
use greenshoes_client::api::types::{AddToCart, VariantChange};
use greenshoes_client::api::{CheckoutRequest, GuestCheckout, ShippingDetails};
use greenshoes_client::state::{BUSY_MESSAGE, WISHLIST_LOGIN_MESSAGE};
use greenshoes_client::{FailureKind, Session};
use greenshoes_core::ProductId;
use greenshoes_integration_tests::{FakeApi, settle_after_login};

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "Abcdef1!";

fn add(product: ProductId) -> AddToCart {
    AddToCart {
        product_id: product,
        color: "Blue".to_string(),
        size: "9".to_string(),
        quantity: 1,
    }
}

#[tokio::test]
async fn test_successful_mutation_is_followed_by_refetch() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());

    store.cart().add_item(&add(api.product(0))).await.unwrap();

    let paths: Vec<_> = api
        .calls()
        .into_iter()
        .map(|c| (c.method, c.path))
        .collect();
    assert_eq!(
        paths,
        vec![
            (Method::POST, "/cart/add".to_string()),
            (Method::GET, "/cart".to_string()),
        ]
    );
    let items = store.cart().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, api.product(0));
    assert_eq!(items[0].line_total.to_string(), "$129.99");
}

#[tokio::test]
async fn test_rejected_mutation_still_refetches() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();
    api.clear_calls();

    let err = store
        .cart()
        .add_item(&add(ProductId::new(uuid::Uuid::new_v4())))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Rejected);
    assert_eq!(err.message(), "Product not found");
    assert_eq!(api.calls_to(&Method::GET, "/cart").len(), 1);
    assert_eq!(store.cart().item_count(), 1);
}

#[tokio::test]
async fn test_failed_fetch_shows_empty_cart() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();
    assert_eq!(store.cart().item_count(), 1);

    api.fail_cart_fetch(true);
    let err = store.cart().fetch().await.unwrap_err();

    assert_eq!(err.message(), "Database unavailable");
    assert_eq!(store.cart().item_count(), 0);
    assert!(store.cart().snapshot().summary.is_none());
    assert!(!store.cart().is_loading());
}

#[tokio::test]
async fn test_concurrent_updates_to_one_line_are_refused() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();
    store.cart().add_item(&add(api.product(1))).await.unwrap();
    let items = store.cart().items();
    let (first, second) = (items[0].cart_item_id, items[1].cart_item_id);

    api.delay_mutations(Duration::from_millis(200));
    let cart = store.cart();
    let (a, b, c, d) = tokio::join!(
        cart.increase_quantity(first),
        cart.increase_quantity(first),
        cart.increase_quantity(second),
        cart.increase_quantity(first),
    );

    assert!(a.is_ok());
    let refused = b.unwrap_err();
    assert_eq!(refused.kind(), FailureKind::Busy);
    assert_eq!(refused.message(), BUSY_MESSAGE);
    assert!(c.is_ok(), "other lines are not blocked");
    assert_eq!(d.unwrap_err().kind(), FailureKind::Busy, "a refusal keeps the line busy");

    assert!(!cart.is_busy(first));
    assert_eq!(
        api.calls_to(&Method::PATCH, &format!("/cart/{first}/increase")).len(),
        1
    );
    let line = cart
        .items()
        .into_iter()
        .find(|i| i.cart_item_id == first)
        .unwrap();
    assert_eq!(line.quantity, 2);
}

#[tokio::test]
async fn test_decrease_to_zero_removes_line() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    let cart = store.cart();
    cart.add_item(&AddToCart {
        quantity: 2,
        ..add(api.product(0))
    })
    .await
    .unwrap();
    let item = cart.items()[0].cart_item_id;

    cart.decrease_quantity(item).await.unwrap();
    assert_eq!(cart.items()[0].quantity, 1);

    cart.decrease_quantity(item).await.unwrap();
    assert_eq!(cart.item_count(), 0);
    assert_eq!(
        api.calls_to(&Method::PATCH, &format!("/cart/{item}/decrease")).len(),
        2
    );
}

#[tokio::test]
async fn test_change_variant_moves_line_to_new_size() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();
    let item = store.cart().items()[0].cart_item_id;

    store
        .cart()
        .change_variant(item, &VariantChange::size("11").with_color("Black"))
        .await
        .unwrap();

    let line = &store.cart().items()[0];
    assert_eq!(line.cart_item_id, item);
    assert_eq!((line.color.as_str(), line.size.as_str()), ("Black", "11"));
}

#[tokio::test]
async fn test_change_variant_to_sold_out_combination_is_rejected() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();
    let item = store.cart().items()[0].cart_item_id;
    api.sell_out(api.product(0), "Blue", "12");
    api.clear_calls();

    let err = store
        .cart()
        .change_variant(item, &VariantChange::size("12"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Rejected);
    assert_eq!(
        err.message(),
        "No stock available for this color and size combination"
    );
    assert_eq!(api.calls_to(&Method::GET, "/cart").len(), 1);
    assert_eq!(store.cart().items()[0].size, "9");
    assert!(!store.cart().is_busy(item));
}

#[tokio::test]
async fn test_remove_item_drops_only_that_line() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();
    store.cart().add_item(&add(api.product(1))).await.unwrap();
    let items = store.cart().items();
    let (gone, kept) = (items[0].cart_item_id, items[1].cart_item_id);
    api.clear_calls();

    store.cart().remove_item(gone).await.unwrap();

    let paths: Vec<_> = api
        .calls()
        .into_iter()
        .map(|c| (c.method, c.path))
        .collect();
    assert_eq!(
        paths,
        vec![
            (Method::DELETE, format!("/cart/{gone}")),
            (Method::GET, "/cart".to_string()),
        ]
    );
    let items = store.cart().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].cart_item_id, kept);
}

#[tokio::test]
async fn test_wishlist_remove_unsaves_product() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    let (first, second) = (api.product(0), api.product(1));
    store.wishlist().add(first).await.unwrap();
    store.wishlist().add(second).await.unwrap();

    store.wishlist().remove(first).await.unwrap();

    assert!(!store.wishlist().is_saved(first));
    assert!(store.wishlist().is_saved(second));
    assert_eq!(store.wishlist().item_count(), 1);
    assert_eq!(
        api.calls_to(&Method::DELETE, &format!("/wishlist/{first}")).len(),
        1
    );
}

#[tokio::test]
async fn test_signed_in_move_to_wishlist_refreshes_both_containers() {
    let api = FakeApi::start().await;
    api.add_account(EMAIL, "Ada", PASSWORD);
    let store = api.storefront(Session::in_memory());
    store.login(EMAIL, PASSWORD).await.unwrap();
    settle_after_login(&api, &store).await;
    let product = api.product(0);
    store.cart().add_item(&add(product)).await.unwrap();
    let item = store.cart().items()[0].cart_item_id;

    store.move_cart_item_to_wishlist(item).await.unwrap();

    assert_eq!(store.cart().item_count(), 0);
    assert!(store.wishlist().is_saved(product));
    assert_eq!(api.account_wishlist(EMAIL), vec![product]);
    assert!(api.account_cart(EMAIL).is_empty());
}

#[tokio::test]
async fn test_wishlist_holds_each_product_once() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    let product = api.product(0);

    store.wishlist().add(product).await.unwrap();
    let err = store.wishlist().add(product).await.unwrap_err();

    assert_eq!(err.message(), "Product already in wishlist");
    assert_eq!(store.wishlist().item_count(), 1);
    assert!(store.wishlist().is_saved(product));
    assert!(!store.wishlist().is_saved(api.product(1)));
}

#[tokio::test]
async fn test_move_from_wishlist_refreshes_both_containers() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    let product = api.product(1);
    store.wishlist().add(product).await.unwrap();

    let missing_size = store
        .move_wishlist_to_cart(product, &VariantChange::default())
        .await
        .unwrap_err();
    assert_eq!(missing_size.kind(), FailureKind::Validation);

    store
        .move_wishlist_to_cart(product, &VariantChange::size("10"))
        .await
        .unwrap();

    assert_eq!(store.wishlist().item_count(), 0);
    let items = store.cart().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].size, "10");
    assert_eq!(items[0].quantity, 1);
}

#[tokio::test]
async fn test_guest_cannot_move_cart_line_to_wishlist() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();
    let item = store.cart().items()[0].cart_item_id;
    api.clear_calls();

    let err = store.move_cart_item_to_wishlist(item).await.unwrap_err();

    assert_eq!(err.message(), WISHLIST_LOGIN_MESSAGE);
    assert!(api.calls().is_empty());
    assert_eq!(store.cart().item_count(), 1);
}

#[tokio::test]
async fn test_checkout_empties_cart() {
    let api = FakeApi::start().await;
    let store = api.storefront(Session::in_memory());
    store.cart().add_item(&add(api.product(0))).await.unwrap();

    let mut guest = GuestCheckout {
        shipping: ShippingDetails {
            full_name: "Ada Lovelace".to_string(),
            phone: "555-0100".to_string(),
            address1: "12 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "LDN".to_string(),
            postal_code: "N1 9GU".to_string(),
            ..ShippingDetails::default()
        },
        card_number: "4242 4242 4242 4241".to_string(),
        expiry: "12/30".to_string(),
        cvc: "123".to_string(),
    };

    let err = store
        .checkout(&CheckoutRequest::Guest(guest.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(api.calls_to(&Method::POST, "/checkout/guest").is_empty());
    assert_eq!(store.cart().item_count(), 1);

    guest.card_number = "4242 4242 4242 4242".to_string();
    let confirmation = store
        .checkout(&CheckoutRequest::Guest(guest))
        .await
        .unwrap();

    assert_eq!(confirmation.order_number().as_deref(), Some("GS-1001"));
    assert_eq!(store.cart().item_count(), 0);
}
