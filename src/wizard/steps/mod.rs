//! Concrete wizard steps, in wizard order

mod configure_download;
mod custom_mpack_repos;
mod custom_product_repos;
mod download_mpacks;
mod install_options;
mod review;
pub mod select_mpacks;
mod verify_products;

pub use configure_download::ConfigureDownloadStep;
pub use custom_mpack_repos::CustomMpackReposStep;
pub use custom_product_repos::CustomProductReposStep;
pub use download_mpacks::DownloadMpacksStep;
pub use install_options::InstallOptionsStep;
pub use review::{GroupSummary, MpackSummary, ReviewStep, ReviewSummary};
pub use select_mpacks::SelectMpacksStep;
pub use verify_products::VerifyProductsStep;

use crate::error::Result;
use crate::registry::RegistrySource;
use crate::repos::{load_catalog, CatalogSnapshot};
use crate::wizard::WizardContent;

/// Fetch the repository catalog for every mpack persisted in `content`
pub async fn load_catalog_for(source: &dyn RegistrySource, content: &WizardContent) -> Result<CatalogSnapshot> {
    load_catalog(
        source,
        content
            .selected_mpacks
            .iter()
            .map(|m| (m.name.as_str(), m.version.as_str())),
    )
    .await
}
