//! service-b: product catalog and batch processing.

use meridian_infra::config::ServiceKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    meridian_api::run(ServiceKind::Catalog).await
}
