// Módulos de la aplicación
mod api;
mod app_state;
mod config;
mod error;
mod models;
mod neo4j_client;
mod queries;
mod recommendation;
mod response;
mod store;

use crate::app_state::AppState;
use crate::config::StoreBackend;
use crate::store::{EntityStore, MemoryStore};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        error!("El servidor terminó con error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env()?;

    // 3. Abrir el almacén de entidades
    let store = open_store(&cfg.store).await?;

    // 4. Elegir la fuente de recomendaciones de leads
    let leads = recommendation::provider_from_config(&cfg, store.clone());

    let app_state = AppState {
        config: cfg.clone(),
        store,
        leads,
    };

    // 5. Configurar el router de la API
    let app = Router::new()
        .merge(api::create_router(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 6. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr).await?;
    info!("🚀 Servidor escuchando en http://{}", &cfg.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}

async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn EntityStore>> {
    match backend {
        StoreBackend::Neo4j(neo) => {
            let graph = neo4j_client::connect_from_config(neo).await?;
            neo4j_client::ensure_schema(&graph).await?;
            Ok(Arc::new(neo4j_client::Neo4jStore::new(Arc::new(graph))))
        }
        StoreBackend::Memory { seed_path: Some(path) } => Ok(Arc::new(MemoryStore::load(path).await?)),
        StoreBackend::Memory { seed_path: None } => {
            info!("Almacén en memoria sin seed: todas las consultas devolverán vacío o 404.");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}
