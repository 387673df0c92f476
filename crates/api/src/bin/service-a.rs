//! service-a: user management.

use meridian_infra::config::ServiceKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    meridian_api::run(ServiceKind::Users).await
}
