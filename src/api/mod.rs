use crate::{
    models::{CatalogEntry, ExtractedMedia, MediaKind, MediaRecord},
    suppliers::{ContentSupplier, Registry},
};

pub fn avalaible_suppliers(registry: &Registry) -> Vec<String> {
    registry.avalaible_suppliers()
}

pub fn get_channels(registry: &Registry, supplier: &str) -> anyhow::Result<Vec<String>> {
    let sup = registry.get_supplier(supplier)?;
    Ok(sup.get_channels())
}

pub fn get_supported_types(registry: &Registry, supplier: &str) -> anyhow::Result<Vec<MediaKind>> {
    let sup = registry.get_supplier(supplier)?;
    Ok(sup.get_supported_types())
}

pub fn get_supported_languages(registry: &Registry, supplier: &str) -> anyhow::Result<Vec<String>> {
    let sup = registry.get_supplier(supplier)?;
    Ok(sup.get_supported_languages())
}

pub async fn search(
    registry: &Registry,
    supplier: &str,
    query: String,
) -> anyhow::Result<Vec<CatalogEntry>> {
    let sup = registry.get_supplier(supplier)?;
    ContentSupplier::search(sup, query).await
}

pub async fn load_channel(
    registry: &Registry,
    supplier: &str,
    channel: String,
    page: u16,
) -> anyhow::Result<Vec<CatalogEntry>> {
    let sup = registry.get_supplier(supplier)?;
    ContentSupplier::load_channel(sup, channel, page).await
}

pub async fn get_content_details(
    registry: &Registry,
    supplier: &str,
    id: String,
) -> anyhow::Result<Option<MediaRecord>> {
    let sup = registry.get_supplier(supplier)?;
    ContentSupplier::get_content_details(sup, id).await
}

pub async fn load_links(
    registry: &Registry,
    supplier: &str,
    id: String,
) -> anyhow::Result<ExtractedMedia> {
    let sup = registry.get_supplier(supplier)?;
    ContentSupplier::load_links(sup, id).await
}
