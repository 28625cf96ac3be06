use async_trait::async_trait;
use flowc_types::ServiceMetadata;

use crate::error::RegistryError;

/// Lookup contract for service signatures; the compiler never discovers
/// services itself, it is handed the set it needs per `Compiler::new`.
#[async_trait]
pub trait ServiceMetadataRegistry: Send + Sync {
    async fn find_services(&self, service_ids: &[String]) -> Result<Vec<ServiceMetadata>, RegistryError>;
}
