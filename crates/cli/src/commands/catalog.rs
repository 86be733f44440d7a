//! Product browsing.

use greenshoes_client::Storefront;
use greenshoes_client::api::types::ProductQuery;
use greenshoes_core::ProductId;

use super::{CommandError, output};

pub async fn list(
    store: &Storefront,
    category: Option<String>,
    search: Option<String>,
    sort: Option<&str>,
    on_sale: bool,
) -> Result<(), CommandError> {
    let mut query = ProductQuery {
        category,
        search,
        on_sale,
        ..ProductQuery::default()
    };
    if let Some(sort) = sort {
        query = query.sorted(sort);
    }
    let products = store.products(&query).await?;
    output::products(&products);
    Ok(())
}

pub async fn show(store: &Storefront, id: ProductId) -> Result<(), CommandError> {
    let detail = store.product(id).await?;
    output::product(&detail);
    Ok(())
}
