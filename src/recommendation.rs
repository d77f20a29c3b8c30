//! Proveedores de recomendaciones de leads.
//!
//! API pública:
//!   - `LeadRecommendationProvider`: listado de leads para una empresa.
//!   - `RelationalLeadProvider`: leads del almacén de entidades.
//!   - `SampledLeadProvider`: dataset plano precalculado, barajado y truncado.
//!   - `provider_from_config(&AppConfig, Arc<dyn EntityStore>)`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, LeadSource};
use crate::error::AppError;
use crate::store::EntityStore;

/// Estado fijo con el que se marcan los leads del dataset plano.
pub const RECOMMENDED_STATUS: &str = "RECOMMENDED";

/// Proyección de un lead tal y como la ve el cliente.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadView {
    pub id: i64,
    pub lead_company_name: String,
    pub lead_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_at: Option<NaiveDateTime>,
}

#[async_trait]
pub trait LeadRecommendationProvider: Send + Sync {
    async fn recommend(&self, company_id: i64) -> Result<Vec<LeadView>, AppError>;
}

/// Construye el proveedor indicado por `LEAD_SOURCE`.
pub fn provider_from_config(
    cfg: &AppConfig,
    store: Arc<dyn EntityStore>,
) -> Arc<dyn LeadRecommendationProvider> {
    match cfg.lead_source {
        LeadSource::Relational => {
            info!("Fuente de leads: almacén de entidades.");
            Arc::new(RelationalLeadProvider::new(store))
        }
        LeadSource::Sampling => {
            info!(
                "Fuente de leads: dataset plano {} (máx. {}).",
                cfg.recommendation_dataset.display(),
                cfg.recommendation_limit
            );
            Arc::new(SampledLeadProvider::new(
                cfg.recommendation_dataset.clone(),
                cfg.recommendation_limit,
            ))
        }
    }
}

// --- Variante relacional ---

pub struct RelationalLeadProvider {
    store: Arc<dyn EntityStore>,
}

impl RelationalLeadProvider {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LeadRecommendationProvider for RelationalLeadProvider {
    async fn recommend(&self, company_id: i64) -> Result<Vec<LeadView>, AppError> {
        let leads = self.store.find_leads_by_source(company_id).await?;
        if leads.is_empty() {
            return Ok(Vec::new());
        }

        let mut target_ids: Vec<i64> = leads.iter().map(|l| l.lead_company_id).collect();
        target_ids.sort_unstable();
        target_ids.dedup();
        let targets = self.store.find_companies(&target_ids).await?;

        leads
            .into_iter()
            .map(|lead| -> Result<LeadView, AppError> {
                let target = targets.get(&lead.lead_company_id).ok_or_else(|| {
                    anyhow!(
                        "El lead {} apunta a una empresa inexistente ({})",
                        lead.id,
                        lead.lead_company_id
                    )
                })?;
                Ok(LeadView {
                    id: lead.id,
                    lead_company_name: target.company_name.clone(),
                    lead_score: lead.lead_score,
                    status: None,
                    create_at: None,
                    update_at: None,
                })
            })
            .collect()
    }
}

// --- Variante de muestreo sobre dataset plano ---

/// Registro del dataset precalculado.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRecord {
    pub id: i64,
    pub name: String,
    pub score: f64,
}

pub struct SampledLeadProvider {
    dataset: PathBuf,
    limit: usize,
}

impl SampledLeadProvider {
    pub fn new(dataset: PathBuf, limit: usize) -> Self {
        Self { dataset, limit }
    }
}

#[async_trait]
impl LeadRecommendationProvider for SampledLeadProvider {
    async fn recommend(&self, company_id: i64) -> Result<Vec<LeadView>, AppError> {
        // El dataset no está indexado por empresa: todas ven el mismo conjunto.
        debug!("Dataset plano: se ignora company_id={company_id} al muestrear.");

        let records = match load_dataset(&self.dataset).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Dataset de recomendaciones no disponible, se devuelve lista vacía: {:#}", e);
                return Ok(Vec::new());
            }
        };

        let stamp = first_of_month_at_noon(Local::now().date_naive());
        let mut views: Vec<LeadView> = records
            .into_iter()
            .map(|r| LeadView {
                id: r.id,
                lead_company_name: r.name,
                lead_score: Some(r.score),
                status: Some(RECOMMENDED_STATUS.to_string()),
                create_at: Some(stamp),
                update_at: Some(stamp),
            })
            .collect();

        views.shuffle(&mut rand::thread_rng());
        views.truncate(self.limit);
        Ok(views)
    }
}

async fn load_dataset(path: &Path) -> Result<Vec<RecommendationRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("No se pudo leer {}", path.display()))?;
    let records: Vec<RecommendationRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Formato inválido en {}", path.display()))?;
    Ok(records)
}

/// Día 1 del mes de `today`, a las 12:00:00.
pub fn first_of_month_at_noon(today: NaiveDate) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_else(|| today.and_time(chrono::NaiveTime::MIN))
}
