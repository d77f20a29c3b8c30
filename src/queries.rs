//! Consultas de lectura: ficha de empresa e historial de chat de un lead.
//!
//! Aquí se hacen las uniones que el almacén no guarda: los nombres de las
//! empresas de cada mensaje se resuelven en una sola búsqueda por lotes.

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::models::Company;
use crate::store::EntityStore;

/// Ficha plana de una empresa.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
    pub id: i64,
    pub company_name: String,
    pub industry: Option<String>,
    pub sales: Option<f64>,
    pub total_funding: Option<f64>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub homepage: Option<String>,
    pub key_executive: Option<String>,
}

impl From<Company> for CompanyView {
    fn from(c: Company) -> Self {
        Self {
            id: c.id,
            company_name: c.company_name,
            industry: c.industry,
            sales: c.sales,
            total_funding: c.total_funding,
            address: c.address,
            email: c.email,
            phone_number: c.phone_number,
            homepage: c.homepage,
            key_executive: c.key_executive,
        }
    }
}

/// Mensaje con los nombres de las empresas ya resueltos.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub id: i64,
    pub from_id: Option<i64>,
    pub to_id: i64,
    pub from_company_name: Option<String>,
    pub to_company_name: String,
    pub contents: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListView {
    pub room_id: i64,
    pub chats: Vec<ChatView>,
}

pub async fn company_profile(store: &dyn EntityStore, id: i64) -> Result<CompanyView, AppError> {
    store
        .find_company(id)
        .await?
        .map(CompanyView::from)
        .ok_or_else(|| AppError::not_found("company not found"))
}

/// Historial de la sala asociada a `lead_id`, en orden de creación.
pub async fn chat_history(store: &dyn EntityStore, lead_id: i64) -> Result<ChatListView, AppError> {
    let room = store
        .find_chat_room_by_lead(lead_id)
        .await?
        .ok_or_else(|| AppError::not_found("chat room not found for lead"))?;

    let mut chats = store.find_chats_by_room(room.id).await?;
    chats.sort_by_key(|c| (c.created_at, c.id));
    debug!("Sala {} del lead {lead_id}: {} mensajes.", room.id, chats.len());

    let mut company_ids: Vec<i64> = chats
        .iter()
        .flat_map(|c| c.from_company_id.into_iter().chain([c.to_company_id]))
        .collect();
    company_ids.sort_unstable();
    company_ids.dedup();
    let companies = store.find_companies(&company_ids).await?;

    let mut views = Vec::with_capacity(chats.len());
    for chat in chats {
        let to = companies.get(&chat.to_company_id).ok_or_else(|| {
            anyhow!(
                "El chat {} va dirigido a una empresa inexistente ({})",
                chat.id,
                chat.to_company_id
            )
        })?;
        let from = chat.from_company_id.and_then(|id| companies.get(&id));

        views.push(ChatView {
            id: chat.id,
            from_id: from.map(|c| c.id),
            to_id: to.id,
            from_company_name: from.map(|c| c.company_name.clone()),
            to_company_name: to.company_name.clone(),
            contents: chat.contents,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        });
    }

    Ok(ChatListView {
        room_id: room.id,
        chats: views,
    })
}
