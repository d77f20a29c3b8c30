//! Conexión a Neo4j y la implementación de `EntityStore` sobre el grafo.
//!
//! Modelo en el grafo:
//!   (:Company)-[:SOURCE_OF]->(:Lead)-[:RECOMMENDS]->(:Company)
//!   (:ChatRoom)-[:FOR_LEAD]->(:Lead)
//!   (:Chat)-[:IN_ROOM]->(:ChatRoom)
//!   (:Chat)-[:SENT_BY]->(:Company)   (opcional)
//!   (:Chat)-[:SENT_TO]->(:Company)
//!
//! Las marcas de tiempo se guardan como cadenas ISO-8601.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use neo4rs::{query, Graph, Row};
use tracing::{info, warn};
use url::Url;

use crate::config::Neo4jConfig;
use crate::models::{Chat, ChatRoom, Company, Lead};
use crate::store::EntityStore;

pub async fn connect_from_config(cfg: &Neo4jConfig) -> Result<Graph> {
    let url = Url::parse(&cfg.uri)?;
    let addr = bolt_address(&url);

    if requests_tls(url.scheme()) {
        warn!(
            "El esquema '{}' pide TLS, pero el driver abre una conexión sin cifrar a {addr}.",
            url.scheme()
        );
    }
    info!("Conectando a Neo4j en {addr} (esquema {})...", url.scheme());
    let graph = Graph::new(&addr, &cfg.user, &cfg.password).await?;
    info!("Conexión a Neo4j OK");
    Ok(graph)
}

fn bolt_address(url: &Url) -> String {
    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(7687);
    format!("{host}:{port}")
}

/// `neo4j+s`, `bolt+s`, `neo4j+ssc`, `bolt+ssc`.
fn requests_tls(scheme: &str) -> bool {
    scheme.ends_with("+s") || scheme.ends_with("+ssc")
}

/// Crea constraints de unicidad para las etiquetas del modelo:
/// :Company, :Lead, :ChatRoom y :Chat
pub async fn ensure_schema(graph: &Graph) -> Result<()> {
    let statements = [
        "CREATE CONSTRAINT company_id IF NOT EXISTS
         FOR (c:Company)
         REQUIRE c.id IS UNIQUE",
        "CREATE CONSTRAINT lead_id IF NOT EXISTS
         FOR (l:Lead)
         REQUIRE l.id IS UNIQUE",
        "CREATE CONSTRAINT chat_room_id IF NOT EXISTS
         FOR (r:ChatRoom)
         REQUIRE r.id IS UNIQUE",
        "CREATE CONSTRAINT chat_id IF NOT EXISTS
         FOR (m:Chat)
         REQUIRE m.id IS UNIQUE",
    ];

    for stmt in statements {
        graph.run(query(stmt)).await?;
    }

    info!("Esquema de Neo4j asegurado (constraints de unicidad creados).");
    Ok(())
}

// Destino y destinatario van en OPTIONAL MATCH: si faltan, la fila llega con
// null y la lectura falla en vez de perder el registro.
const LEADS_BY_SOURCE: &str = "MATCH (s:Company {id: $company_id})-[:SOURCE_OF]->(l:Lead)
     OPTIONAL MATCH (l)-[:RECOMMENDS]->(t:Company)
     RETURN l.id AS id, l.lead_score AS lead_score, s.id AS source_company_id,
            t.id AS lead_company_id, l.created_at AS created_at, l.updated_at AS updated_at
     ORDER BY l.id";

const CHATS_BY_ROOM: &str = "MATCH (m:Chat)-[:IN_ROOM]->(r:ChatRoom {id: $room_id})
     OPTIONAL MATCH (m)-[:SENT_TO]->(to:Company)
     OPTIONAL MATCH (m)-[:SENT_BY]->(from:Company)
     RETURN m.id AS id, m.contents AS contents, r.id AS chat_room_id,
            from.id AS from_company_id, to.id AS to_company_id,
            m.created_at AS created_at, m.updated_at AS updated_at
     ORDER BY m.created_at, m.id";

const COMPANY_FIELDS: &str = "c.id AS id, c.company_name AS company_name, c.industry AS industry,
     c.sales AS sales, c.total_funding AS total_funding, c.address AS address,
     c.email AS email, c.phone_number AS phone_number, c.homepage AS homepage,
     c.key_executive AS key_executive, c.created_at AS created_at, c.updated_at AS updated_at";

/// `EntityStore` respaldado por Neo4j.
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Arc<Graph>,
}

impl Neo4jStore {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl EntityStore for Neo4jStore {
    async fn find_company(&self, id: i64) -> Result<Option<Company>> {
        let cypher = format!("MATCH (c:Company {{id: $id}}) RETURN {COMPANY_FIELDS} LIMIT 1");
        let mut cursor = self.graph.execute(query(&cypher).param("id", id)).await?;

        match cursor.next().await? {
            Some(row) => Ok(Some(company_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_companies(&self, ids: &[i64]) -> Result<HashMap<i64, Company>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let cypher = format!("MATCH (c:Company) WHERE c.id IN $ids RETURN {COMPANY_FIELDS}");
        let mut cursor = self
            .graph
            .execute(query(&cypher).param("ids", ids.to_vec()))
            .await?;

        let mut companies = HashMap::new();
        while let Some(row) = cursor.next().await? {
            let company = company_from_row(&row)?;
            companies.insert(company.id, company);
        }
        Ok(companies)
    }

    async fn find_leads_by_source(&self, company_id: i64) -> Result<Vec<Lead>> {
        let mut cursor = self
            .graph
            .execute(query(LEADS_BY_SOURCE).param("company_id", company_id))
            .await?;

        let mut leads = Vec::new();
        while let Some(row) = cursor.next().await? {
            leads.push(Lead {
                id: required(row.get::<i64>("id"), "id")?,
                lead_score: row.get("lead_score"),
                source_company_id: required(row.get::<i64>("source_company_id"), "source_company_id")?,
                lead_company_id: required(row.get::<i64>("lead_company_id"), "lead_company_id")?,
                created_at: timestamp(row.get("created_at"), "created_at")?,
                updated_at: timestamp(row.get("updated_at"), "updated_at")?,
            });
        }
        Ok(leads)
    }

    async fn find_chat_room_by_lead(&self, lead_id: i64) -> Result<Option<ChatRoom>> {
        let mut cursor = self
            .graph
            .execute(
                query(
                    "MATCH (r:ChatRoom)-[:FOR_LEAD]->(l:Lead {id: $lead_id})
                     RETURN r.id AS id, l.id AS lead_id, r.created_at AS created_at, r.updated_at AS updated_at
                     LIMIT 1",
                )
                .param("lead_id", lead_id),
            )
            .await?;

        match cursor.next().await? {
            Some(row) => Ok(Some(ChatRoom {
                id: required(row.get::<i64>("id"), "id")?,
                lead_id: row.get("lead_id"),
                created_at: timestamp(row.get("created_at"), "created_at")?,
                updated_at: timestamp(row.get("updated_at"), "updated_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_chats_by_room(&self, room_id: i64) -> Result<Vec<Chat>> {
        let mut cursor = self
            .graph
            .execute(query(CHATS_BY_ROOM).param("room_id", room_id))
            .await?;

        let mut chats = Vec::new();
        while let Some(row) = cursor.next().await? {
            chats.push(Chat {
                id: required(row.get::<i64>("id"), "id")?,
                contents: row.get("contents"),
                chat_room_id: required(row.get::<i64>("chat_room_id"), "chat_room_id")?,
                from_company_id: row.get("from_company_id"),
                to_company_id: required(row.get::<i64>("to_company_id"), "to_company_id")?,
                created_at: timestamp(row.get("created_at"), "created_at")?,
                updated_at: timestamp(row.get("updated_at"), "updated_at")?,
            });
        }
        Ok(chats)
    }

    async fn ping(&self) -> Result<()> {
        self.graph.run(query("RETURN 1")).await?;
        Ok(())
    }
}

fn company_from_row(row: &Row) -> Result<Company> {
    Ok(Company {
        id: required(row.get::<i64>("id"), "id")?,
        company_name: required(row.get::<String>("company_name"), "company_name")?,
        industry: row.get("industry"),
        sales: row.get("sales"),
        total_funding: row.get("total_funding"),
        address: row.get("address"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        homepage: row.get("homepage"),
        key_executive: row.get("key_executive"),
        created_at: timestamp(row.get("created_at"), "created_at")?,
        updated_at: timestamp(row.get("updated_at"), "updated_at")?,
    })
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("Falta campo '{key}' en resultado de Neo4j"))
}

fn timestamp(value: Option<String>, key: &str) -> Result<NaiveDateTime> {
    let raw = required(value, key)?;
    parse_timestamp(&raw).with_context(|| format!("Campo '{key}' con fecha inválida"))
}

/// Acepta RFC 3339 (se descarta el offset) o fecha local `YYYY-MM-DDTHH:MM:SS[.f]`.
pub(crate) fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| anyhow!("Fecha no reconocida '{raw}': {e}"))
}
