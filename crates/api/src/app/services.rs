use std::sync::Arc;

use codecamp_infra::{AppConfig, CampStore, ConfigHandle, InMemoryCampStore, RepositoryError, demo_data};

use crate::app::links::{LinkGenerator, RouteLinkGenerator};
use crate::app::mapping::{DefaultMapper, EntityMapper};

/// Collaborators shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn CampStore>,
    pub mapper: Arc<dyn EntityMapper>,
    pub links: Arc<dyn LinkGenerator>,
    pub config: Arc<ConfigHandle>,
}

impl AppServices {
    /// Default mapper and links around the given store.
    pub fn new(store: Arc<dyn CampStore>, config: Arc<ConfigHandle>) -> Self {
        Self {
            store,
            mapper: Arc::new(DefaultMapper),
            links: Arc::new(RouteLinkGenerator::default()),
            config,
        }
    }
}

/// Pick and prepare the store named by `config`.
pub async fn build_services(
    config: &AppConfig,
    handle: Arc<ConfigHandle>,
) -> Result<AppServices, RepositoryError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            return build_postgres_services(url, config.seed_data, handle).await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            tracing::warn!("DATABASE_URL set but postgres feature not enabled, falling back to in-memory");
        }
    }

    Ok(build_in_memory_services(config.seed_data, handle))
}

pub fn build_in_memory_services(seed: bool, handle: Arc<ConfigHandle>) -> AppServices {
    let store = if seed {
        InMemoryCampStore::seeded(demo_data())
    } else {
        InMemoryCampStore::new()
    };
    tracing::info!(seed, "using in-memory camp store");
    AppServices::new(Arc::new(store), handle)
}

#[cfg(feature = "postgres")]
async fn build_postgres_services(
    url: &str,
    seed: bool,
    handle: Arc<ConfigHandle>,
) -> Result<AppServices, RepositoryError> {
    let store = codecamp_infra::PostgresCampStore::connect(url).await?;
    store.ensure_schema().await?;
    if seed && store.seed_if_empty(&demo_data()).await? {
        tracing::info!("seeded empty database with demo data");
    }
    tracing::info!("using postgres camp store");
    Ok(AppServices::new(Arc::new(store), handle))
}
