//! Modelos de dominio: los cuatro registros normalizados del almacén.
//!
//! Las relaciones se guardan como identificadores; los nombres de empresa que
//! necesitan las vistas se resuelven en la capa de consultas.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Representa una empresa (:Company). Es la entidad raíz del grafo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub company_name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub sales: Option<f64>,
    #[serde(default)]
    pub total_funding: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub key_executive: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Representa un lead (:Lead): `lead_company_id` es una empresa recomendada
/// para `source_company_id`, con una puntuación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    #[serde(default)]
    pub lead_score: Option<f64>,
    pub source_company_id: i64,
    pub lead_company_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Sala de chat (:ChatRoom), como mucho una por lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: i64,
    #[serde(default)]
    pub lead_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mensaje (:Chat) dentro de una sala. `from_company_id` puede faltar
/// (mensajes generados por el sistema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub contents: Option<String>,
    pub chat_room_id: i64,
    #[serde(default)]
    pub from_company_id: Option<i64>,
    pub to_company_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
