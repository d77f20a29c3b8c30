//! Acceso de solo lectura al almacén de entidades.
//!
//! `EntityStore` expone búsquedas puntuales y por clave foránea; las uniones
//! (nombres de empresa, etc.) se hacen en `queries`. Implementaciones:
//!   - `neo4j_client::Neo4jStore` (producción).
//!   - `MemoryStore` (ejecución local y tests), cargado desde un seed JSON.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::models::{Chat, ChatRoom, Company, Lead};

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_company(&self, id: i64) -> Result<Option<Company>>;

    /// Búsqueda por lotes. Los ids inexistentes simplemente no aparecen.
    async fn find_companies(&self, ids: &[i64]) -> Result<HashMap<i64, Company>>;

    async fn find_leads_by_source(&self, company_id: i64) -> Result<Vec<Lead>>;

    async fn find_chat_room_by_lead(&self, lead_id: i64) -> Result<Option<ChatRoom>>;

    async fn find_chats_by_room(&self, room_id: i64) -> Result<Vec<Chat>>;

    /// Comprueba que el almacén responde.
    async fn ping(&self) -> Result<()>;
}

/// Contenido de un fichero seed para `MemoryStore`.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub chat_rooms: Vec<ChatRoom>,
    #[serde(default)]
    pub chats: Vec<Chat>,
}

/// Almacén en memoria. Conserva el orden de inserción del seed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    companies: HashMap<i64, Company>,
    leads: Vec<Lead>,
    chat_rooms: Vec<ChatRoom>,
    chats: Vec<Chat>,
}

impl MemoryStore {
    /// Construye el almacén validando las referencias entre registros.
    pub fn from_seed(seed: Seed) -> Result<Self> {
        let mut companies = HashMap::new();
        for company in seed.companies {
            let id = company.id;
            if companies.insert(id, company).is_some() {
                return Err(anyhow!("Empresa {id} duplicada en el seed"));
            }
        }

        let mut lead_ids = HashSet::new();
        for lead in &seed.leads {
            if !lead_ids.insert(lead.id) {
                return Err(anyhow!("Lead {} duplicado en el seed", lead.id));
            }
            for company_id in [lead.source_company_id, lead.lead_company_id] {
                if !companies.contains_key(&company_id) {
                    return Err(anyhow!(
                        "El lead {} referencia una empresa inexistente ({company_id})",
                        lead.id
                    ));
                }
            }
        }

        let mut room_ids = HashSet::new();
        let mut rooms_per_lead = HashSet::new();
        for room in &seed.chat_rooms {
            if !room_ids.insert(room.id) {
                return Err(anyhow!("Sala {} duplicada en el seed", room.id));
            }
            if let Some(lead_id) = room.lead_id {
                if !lead_ids.contains(&lead_id) {
                    return Err(anyhow!("La sala {} referencia un lead inexistente ({lead_id})", room.id));
                }
                if !rooms_per_lead.insert(lead_id) {
                    return Err(anyhow!("El lead {lead_id} tiene más de una sala de chat"));
                }
            }
        }

        for chat in &seed.chats {
            if !room_ids.contains(&chat.chat_room_id) {
                return Err(anyhow!(
                    "El chat {} referencia una sala inexistente ({})",
                    chat.id,
                    chat.chat_room_id
                ));
            }
            let referenced = chat.from_company_id.into_iter().chain([chat.to_company_id]);
            for company_id in referenced {
                if !companies.contains_key(&company_id) {
                    return Err(anyhow!(
                        "El chat {} referencia una empresa inexistente ({company_id})",
                        chat.id
                    ));
                }
            }
        }

        Ok(Self {
            companies,
            leads: seed.leads,
            chat_rooms: seed.chat_rooms,
            chats: seed.chats,
        })
    }

    /// Carga un seed JSON desde disco.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("No se pudo leer el seed {}", path.display()))?;
        let seed: Seed = serde_json::from_str(&raw)
            .with_context(|| format!("Seed con formato inválido: {}", path.display()))?;
        let store = Self::from_seed(seed)?;
        info!(
            "Almacén en memoria cargado: {} empresas, {} leads, {} salas, {} chats.",
            store.companies.len(),
            store.leads.len(),
            store.chat_rooms.len(),
            store.chats.len()
        );
        Ok(store)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_company(&self, id: i64) -> Result<Option<Company>> {
        Ok(self.companies.get(&id).cloned())
    }

    async fn find_companies(&self, ids: &[i64]) -> Result<HashMap<i64, Company>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.companies.get(id).map(|c| (*id, c.clone())))
            .collect())
    }

    async fn find_leads_by_source(&self, company_id: i64) -> Result<Vec<Lead>> {
        Ok(self
            .leads
            .iter()
            .filter(|l| l.source_company_id == company_id)
            .cloned()
            .collect())
    }

    async fn find_chat_room_by_lead(&self, lead_id: i64) -> Result<Option<ChatRoom>> {
        Ok(self
            .chat_rooms
            .iter()
            .find(|r| r.lead_id == Some(lead_id))
            .cloned())
    }

    async fn find_chats_by_room(&self, room_id: i64) -> Result<Vec<Chat>> {
        Ok(self
            .chats
            .iter()
            .filter(|c| c.chat_room_id == room_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Datos de prueba compartidos por los tests de los distintos módulos.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    pub fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(hour, min, 0))
            .unwrap()
    }

    pub fn company(id: i64, name: &str) -> Company {
        Company {
            id,
            company_name: name.to_string(),
            industry: Some("SaaS".to_string()),
            sales: Some(1_200.5),
            total_funding: None,
            address: Some("Seúl".to_string()),
            email: Some(format!("contacto@{}.com", name.to_lowercase())),
            phone_number: None,
            homepage: None,
            key_executive: Some("Kim".to_string()),
            created_at: at(9, 0),
            updated_at: at(9, 0),
        }
    }

    pub fn lead(id: i64, source: i64, target: i64, score: f64) -> Lead {
        Lead {
            id,
            lead_score: Some(score),
            source_company_id: source,
            lead_company_id: target,
            created_at: at(10, 0),
            updated_at: at(10, 0),
        }
    }

    pub fn chat(id: i64, room: i64, from: Option<i64>, to: i64, text: &str, created: NaiveDateTime) -> Chat {
        Chat {
            id,
            contents: Some(text.to_string()),
            chat_room_id: room,
            from_company_id: from,
            to_company_id: to,
            created_at: created,
            updated_at: created,
        }
    }

    /// Empresa 7 con leads hacia 3 y 9; lead 41 con sala 5 y dos mensajes;
    /// lead 42 sin sala.
    pub fn seed() -> Seed {
        Seed {
            companies: vec![
                company(3, "Acme"),
                company(7, "Bravo"),
                company(9, "Cosmos"),
                company(11, "Delta"),
            ],
            leads: vec![
                lead(41, 7, 3, 0.8),
                lead(43, 7, 9, 0.6),
                lead(42, 11, 7, 0.5),
            ],
            chat_rooms: vec![ChatRoom {
                id: 5,
                lead_id: Some(41),
                created_at: at(10, 30),
                updated_at: at(10, 30),
            }],
            chats: vec![
                chat(1, 5, Some(7), 3, "hello", at(11, 0)),
                chat(2, 5, Some(3), 7, "hi", at(11, 5)),
            ],
        }
    }

    pub fn store() -> MemoryStore {
        MemoryStore::from_seed(seed()).unwrap()
    }
}
