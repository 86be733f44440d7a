//! Request and response shapes of the storefront REST API.
//!
//! Response types are lenient: optional display fields default when absent
//! so a partially populated record still renders. Identifiers are never
//! defaulted.

use chrono::{DateTime, Utc};
use greenshoes_core::{
    AddressId, CartItemId, ColorId, OrderId, OrderStatus, Price, ProductId, UserProfile,
    WishlistItemId,
};
use serde::{Deserialize, Serialize};

/// Stock level below which a variant is shown as running out.
pub const RUNNING_OUT_THRESHOLD: u32 = 10;

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    /// Email or username; the API accepts either in this field.
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "fullName")]
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login or registration.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Body of `POST /auth/check-email`.
#[derive(Debug, Serialize)]
pub(crate) struct CheckEmailRequest<'a> {
    pub email: &'a str,
}

/// Response of `POST /auth/check-email`.
#[derive(Debug, Deserialize)]
pub(crate) struct CheckEmailResponse {
    #[serde(default)]
    pub exists: bool,
}

// =============================================================================
// Cart
// =============================================================================

/// A color or size a line item can be switched to.
///
/// The API sends either `{ "id": ..., "value": "Blue" }` objects or bare
/// strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantOption {
    Labeled { value: String },
    Plain(String),
}

impl VariantOption {
    /// The option's display value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Labeled { value } | Self::Plain(value) => value,
        }
    }
}

/// One cart line: a product variant and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub color: String,
    pub size: String,
    pub quantity: u32,
    pub selling_price: Price,
    /// Sale price when on sale, else the selling price.
    pub effective_price: Price,
    /// `effective_price * quantity`, computed by the API.
    pub line_total: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub available_colors: Vec<VariantOption>,
    #[serde(default)]
    pub available_sizes: Vec<VariantOption>,
}

/// Cart totals, computed and owned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub total: Price,
}

/// Response of `GET /cart`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub summary: Option<CartSummary>,
}

/// Body of `POST /cart/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddToCart {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

/// Requested variant for a line item or a wishlist move.
///
/// Absent fields keep their current value server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl VariantChange {
    /// Pick a size, keeping the color.
    #[must_use]
    pub fn size(size: impl Into<String>) -> Self {
        Self {
            color: None,
            size: Some(size.into()),
        }
    }

    /// Also pick a color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// A saved product. Carries no variant and no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub wishlist_item_id: WishlistItemId,
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub selling_price: Price,
    #[serde(default)]
    pub sale_price: Option<Price>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub available_sizes: Vec<VariantOption>,
    #[serde(default)]
    pub available_colors: Vec<VariantOption>,
}

impl WishlistItem {
    /// Price the shopper would pay today.
    #[must_use]
    pub fn current_price(&self) -> Price {
        match self.sale_price {
            Some(sale) if self.on_sale => sale,
            _ => self.selling_price,
        }
    }
}

/// Response of `GET /wishlist`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WishlistResponse {
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}

/// Body of `POST /wishlist/add`.
#[derive(Debug, Serialize)]
pub(crate) struct AddToWishlist {
    pub product_id: ProductId,
}

/// Body of `POST /wishlist/move-to-cart/{productId}`.
#[derive(Debug, Serialize)]
pub(crate) struct MoveToCart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    pub size: &'a str,
    pub quantity: u32,
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Name,
    Price,
    CreatedAt,
}

/// Catalog sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters of `GET /catalog`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub on_sale: bool,
}

impl ProductQuery {
    /// Apply a storefront sort keyword: `name-asc`, `name-desc`,
    /// `price-asc`, `price-desc` or `newest`. Unknown keywords sort by name.
    #[must_use]
    pub fn sorted(mut self, keyword: &str) -> Self {
        let (by, order) = match keyword {
            "name-desc" => (SortBy::Name, SortOrder::Desc),
            "price-asc" => (SortBy::Price, SortOrder::Asc),
            "price-desc" => (SortBy::Price, SortOrder::Desc),
            "newest" => (SortBy::CreatedAt, SortOrder::Desc),
            _ => (SortBy::Name, SortOrder::Asc),
        };
        self.sort_by = Some(by);
        self.sort_order = Some(order);
        self
    }
}

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub selling_price: Price,
    #[serde(default)]
    pub sale_price: Option<Price>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default)]
    pub variants_out_of_stock: u32,
    #[serde(default)]
    pub variants_running_out: u32,
}

impl Product {
    /// Price the shopper would pay today.
    #[must_use]
    pub fn current_price(&self) -> Price {
        match self.sale_price {
            Some(sale) if self.on_sale => sale,
            _ => self.selling_price,
        }
    }
}

/// Response of `GET /catalog`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProductList {
    #[serde(default)]
    pub products: Vec<Product>,
}

/// A color a product is made in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductColor {
    pub id: ColorId,
    pub value: String,
}

/// A product photo, optionally tied to one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub color_id: Option<ColorId>,
    pub image_url: String,
}

/// Inventory for one color/size combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    pub color_id: ColorId,
    pub size_value: String,
    #[serde(default)]
    pub quantity: u32,
}

/// Availability of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    /// Fewer than [`RUNNING_OUT_THRESHOLD`] left.
    RunningOut(u32),
    OutOfStock,
}

impl StockStatus {
    /// Classify a stock quantity.
    #[must_use]
    pub const fn from_quantity(quantity: u32) -> Self {
        match quantity {
            0 => Self::OutOfStock,
            q if q < RUNNING_OUT_THRESHOLD => Self::RunningOut(q),
            _ => Self::InStock,
        }
    }
}

/// Response of `GET /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    #[serde(default)]
    pub colors: Vec<ProductColor>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
}

impl ProductDetail {
    /// Availability of `size` in `color`. Unknown variants are out of stock.
    #[must_use]
    pub fn stock_status(&self, color: ColorId, size: &str) -> StockStatus {
        let quantity = self
            .sizes
            .iter()
            .find(|s| s.color_id == color && s.size_value == size)
            .map_or(0, |s| s.quantity);
        StockStatus::from_quantity(quantity)
    }

    /// Sizes offered in `color`, in API order.
    #[must_use]
    pub fn sizes_for(&self, color: ColorId) -> Vec<&SizeStock> {
        self.sizes.iter().filter(|s| s.color_id == color).collect()
    }

    /// Look up a color by display value, ignoring case.
    #[must_use]
    pub fn color_named(&self, value: &str) -> Option<&ProductColor> {
        self.colors
            .iter()
            .find(|c| c.value.eq_ignore_ascii_case(value))
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub full_name: String,
    pub phone: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Fields of a new or edited address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressForm {
    pub full_name: String,
    pub phone: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Response of `GET /addresses`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddressList {
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// Response of `POST /addresses`, `GET/PUT /addresses/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct AddressEnvelope {
    pub address: Address,
}

// =============================================================================
// Payment card
// =============================================================================

/// The account's stored card, as the API exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCard {
    pub masked_number: String,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Response of `GET /payment-cards`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SavedCardResponse {
    #[serde(default)]
    pub has_saved_card: bool,
    #[serde(default)]
    pub card: Option<SavedCard>,
}

/// Body of `POST /payment-cards`.
#[derive(Debug, Serialize)]
pub(crate) struct SaveCardRequest<'a> {
    pub card_number: &'a str,
    pub expiry: &'a str,
    pub cvc: &'a str,
}

// =============================================================================
// Orders
// =============================================================================

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOrderItem")]
pub struct OrderItem {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub price_at_purchase: Price,
    pub image_url: Option<String>,
}

/// Wire shape of an order line; older endpoints send `price` and
/// `main_image` instead.
#[derive(Deserialize)]
struct RawOrderItem {
    #[serde(default)]
    product_id: Option<ProductId>,
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    size: Option<String>,
    quantity: u32,
    #[serde(default)]
    price_at_purchase: Option<Price>,
    #[serde(default)]
    price: Option<Price>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    main_image: Option<String>,
}

impl From<RawOrderItem> for OrderItem {
    fn from(raw: RawOrderItem) -> Self {
        Self {
            product_id: raw.product_id,
            name: raw.name,
            color: raw.color,
            size: raw.size,
            quantity: raw.quantity,
            price_at_purchase: raw.price_at_purchase.or(raw.price).unwrap_or_default(),
            image_url: raw.image_url.or(raw.main_image),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOrder")]
pub struct Order {
    pub id: OrderId,
    pub order_number: Option<String>,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub subtotal: Option<Price>,
    pub tax: Option<Price>,
    pub shipping_fee: Option<Price>,
    pub total: Price,
    pub items: Vec<OrderItem>,
    pub shipping_full_name: Option<String>,
    pub shipping_city: Option<String>,
    pub card_last_four: Option<String>,
}

/// Wire shape of an order. List, detail and checkout responses name the
/// same values differently, sometimes several at once.
#[derive(Deserialize)]
struct RawOrder {
    #[serde(default)]
    id: Option<OrderId>,
    #[serde(default)]
    order_id: Option<OrderId>,
    #[serde(default)]
    order_number: Option<String>,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    subtotal: Option<Price>,
    #[serde(default)]
    tax: Option<Price>,
    #[serde(default)]
    shipping_fee: Option<Price>,
    #[serde(default)]
    shipping: Option<Price>,
    #[serde(default)]
    total: Option<Price>,
    #[serde(default)]
    total_amount: Option<Price>,
    #[serde(default)]
    items: Vec<OrderItem>,
    #[serde(default)]
    shipping_full_name: Option<String>,
    #[serde(default)]
    shipping_city: Option<String>,
    #[serde(default)]
    card_last_four: Option<String>,
}

impl TryFrom<RawOrder> for Order {
    type Error = &'static str;

    fn try_from(raw: RawOrder) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.order_id).ok_or("order has no id")?,
            order_number: raw.order_number,
            status: raw.status,
            created_at: raw.created_at.or(raw.order_date),
            subtotal: raw.subtotal,
            tax: raw.tax,
            shipping_fee: raw.shipping_fee.or(raw.shipping),
            total: raw.total.or(raw.total_amount).unwrap_or_default(),
            items: raw.items,
            shipping_full_name: raw.shipping_full_name,
            shipping_city: raw.shipping_city,
            card_last_four: raw.card_last_four,
        })
    }
}

impl Order {
    /// Reference shown to the shopper: the order number when assigned,
    /// else the ID.
    #[must_use]
    pub fn reference(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Response of `GET /orders`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OrderList {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Response of `GET /orders/{id}`: wrapped or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OrderEnvelope {
    Wrapped { order: Order },
    Bare(Order),
}

impl OrderEnvelope {
    pub fn into_order(self) -> Order {
        match self {
            Self::Wrapped { order } | Self::Bare(order) => order,
        }
    }
}

/// Summary returned by guest checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_number: String,
    #[serde(default, alias = "total_amount")]
    pub total: Option<Price>,
    #[serde(default)]
    pub email_sent: Option<bool>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderConfirmation {
    /// Account checkout: the full order.
    Order(Box<Order>),
    /// Guest checkout: a summary only.
    Summary(OrderSummary),
}

impl OrderConfirmation {
    /// Order number to show the shopper, when one was returned.
    #[must_use]
    pub fn order_number(&self) -> Option<String> {
        match self {
            Self::Order(order) => Some(order.reference()),
            Self::Summary(summary) => Some(summary.order_number.clone()),
        }
    }
}

/// Response of the `/checkout/*` endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct CheckoutResponse {
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub order_summary: Option<OrderSummary>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cart_item_accepts_both_option_shapes() {
        let item: CartItem = serde_json::from_value(json!({
            "cart_item_id": "6f8d1c1e-4a84-4a55-9d4b-7e0c8a2a6d10",
            "product_id": "0b8f3d8e-1111-4c2a-9a35-3d1e5b6c7d8e",
            "name": "Ocean Drift",
            "category": "sneakers",
            "color": "Blue",
            "size": "8",
            "quantity": 2,
            "selling_price": "129.99",
            "effective_price": "99.99",
            "line_total": "199.98",
            "available_colors": [{ "id": "c1", "value": "Blue" }, "Green"],
            "available_sizes": ["8", "9"]
        }))
        .unwrap();

        let colors: Vec<_> = item.available_colors.iter().map(VariantOption::value).collect();
        assert_eq!(colors, ["Blue", "Green"]);
        assert_eq!(item.line_total.display(), "$199.98");
        assert!(item.image_url.is_none());
    }

    #[test]
    fn test_empty_cart_body() {
        let cart: Cart = serde_json::from_value(json!({})).unwrap();
        assert!(cart.items.is_empty());
        assert!(cart.summary.is_none());
    }

    #[test]
    fn test_add_to_cart_wire_names() {
        let body = AddToCart {
            product_id: ProductId::new(uuid::Uuid::nil()),
            color: "Blue".to_string(),
            size: "9".to_string(),
            quantity: 1,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("productId").is_some());
        assert!(value.get("product_id").is_none());
    }

    #[test]
    fn test_variant_change_omits_unset_fields() {
        let value = serde_json::to_value(VariantChange::size("10")).unwrap();
        assert_eq!(value, json!({ "size": "10" }));
    }

    #[test]
    fn test_product_query_params() {
        let query = ProductQuery {
            category: Some("boots".to_string()),
            on_sale: true,
            ..ProductQuery::default()
        }
        .sorted("price-desc");
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "category": "boots",
                "sortBy": "price",
                "sortOrder": "desc",
                "onSale": true
            })
        );
        let plain = serde_json::to_value(ProductQuery::default()).unwrap();
        assert_eq!(plain, json!({}));
    }

    #[test]
    fn test_stock_status_thresholds() {
        assert_eq!(StockStatus::from_quantity(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(9), StockStatus::RunningOut(9));
        assert_eq!(StockStatus::from_quantity(10), StockStatus::InStock);
    }

    #[test]
    fn test_product_detail_stock_lookup() {
        let color = ColorId::new(uuid::Uuid::new_v4());
        let detail = ProductDetail {
            product: serde_json::from_value(json!({
                "id": "0b8f3d8e-1111-4c2a-9a35-3d1e5b6c7d8e",
                "name": "Trail Runner",
                "selling_price": 140
            }))
            .unwrap(),
            colors: vec![ProductColor {
                id: color,
                value: "Moss".to_string(),
            }],
            images: vec![],
            sizes: vec![SizeStock {
                color_id: color,
                size_value: "9".to_string(),
                quantity: 3,
            }],
        };
        assert_eq!(detail.stock_status(color, "9"), StockStatus::RunningOut(3));
        assert_eq!(detail.stock_status(color, "12"), StockStatus::OutOfStock);
        assert_eq!(detail.color_named("moss").map(|c| c.id), Some(color));
    }

    #[test]
    fn test_order_envelope_shapes() {
        let order = json!({
            "id": "2c7c2b55-9e0b-4f0e-8a1d-0c5a4b3e2f10",
            "order_number": "GS-1001",
            "status": "shipped",
            "total_amount": "223.93"
        });
        let wrapped: OrderEnvelope = serde_json::from_value(json!({ "order": order })).unwrap();
        let bare: OrderEnvelope = serde_json::from_value(order).unwrap();
        assert_eq!(wrapped.into_order(), bare.into_order());
    }

    #[test]
    fn test_wishlist_current_price() {
        let item: WishlistItem = serde_json::from_value(json!({
            "wishlist_item_id": "6f8d1c1e-4a84-4a55-9d4b-7e0c8a2a6d10",
            "product_id": "0b8f3d8e-1111-4c2a-9a35-3d1e5b6c7d8e",
            "name": "Ocean Drift",
            "selling_price": "129.99",
            "sale_price": "99.99",
            "on_sale": false
        }))
        .unwrap();
        assert_eq!(item.current_price(), item.selling_price);
    }
}
