//! Carga y gestión de configuración de la aplicación (almacén + fuente de leads).

use std::env;
use std::path::PathBuf;
use anyhow::{anyhow, Result};

/// Origen de las recomendaciones de leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeadSource {
    /// Leads persistidos en el almacén de entidades.
    Relational,
    /// Dataset plano precalculado, barajado y truncado.
    Sampling,
}

impl LeadSource {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "relational" => Ok(Self::Relational),
            "sampling" => Ok(Self::Sampling),
            other => Err(anyhow!("Fuente de leads no soportada: {other}")),
        }
    }
}

/// Credenciales de conexión a Neo4j.
#[derive(Clone, Debug)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub enum StoreBackend {
    Neo4j(Neo4jConfig),
    /// Almacén en memoria, opcionalmente precargado desde un JSON.
    Memory { seed_path: Option<PathBuf> },
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub store: StoreBackend,

    pub lead_source: LeadSource,
    pub recommendation_dataset: PathBuf,
    pub recommendation_limit: usize,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de claves.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "neo4j".to_string());
        let store = match backend.to_lowercase().as_str() {
            "neo4j" => StoreBackend::Neo4j(Neo4jConfig {
                uri: lookup("NEO4J_URI").ok_or_else(|| anyhow!("Falta NEO4J_URI en el entorno"))?,
                user: lookup("NEO4J_USER").ok_or_else(|| anyhow!("Falta NEO4J_USER en el entorno"))?,
                password: lookup("NEO4J_PASSWORD")
                    .ok_or_else(|| anyhow!("Falta NEO4J_PASSWORD en el entorno"))?,
            }),
            "memory" => StoreBackend::Memory {
                seed_path: lookup("MEMORY_SEED_PATH").map(PathBuf::from),
            },
            other => return Err(anyhow!("Backend de almacenamiento no soportado: {other}")),
        };

        let lead_source_str = lookup("LEAD_SOURCE").unwrap_or_else(|| "relational".to_string());
        let lead_source = LeadSource::from_str(&lead_source_str)?;

        let recommendation_dataset = lookup("RECOMMENDATION_DATASET")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/recommendations.json"));

        let recommendation_limit = match lookup("RECOMMENDATION_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow!("RECOMMENDATION_LIMIT inválido ({raw}): {e}"))?,
            None => 30,
        };

        Ok(Self {
            server_addr,
            store,
            lead_source,
            recommendation_dataset,
            recommendation_limit,
        })
    }
}
