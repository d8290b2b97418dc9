//! PostgreSQL implementation of the dialer repositories
//!
//! Claims are single `UPDATE ... WHERE id IN (SELECT ... FOR UPDATE SKIP LOCKED)`
//! statements, so two dialer processes sharing the database never take the
//! same contact or agent.

use crate::domain::agent::{Agent, AgentRepository, AgentStatus};
use crate::domain::call::{Call, CallRepository, CallStatus, CallStatusCount};
use crate::domain::caller_id::{CallerId, CallerIdRepository};
use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::contact::repository::ContactCounts;
use crate::domain::contact::{Contact, ContactRepository};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{
    AgentId, CallId, CallerIdId, CampaignId, ContactId, PhoneNumber,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(FromRow)]
struct CampaignRow {
    id: Uuid,
    name: String,
    product_type: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<CampaignRow> for Campaign {
    fn from(r: CampaignRow) -> Self {
        Campaign {
            id: CampaignId::from_uuid(r.id),
            name: r.name,
            product_type: r.product_type,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct ContactRow {
    id: Uuid,
    seq: i64,
    campaign_id: Uuid,
    name: String,
    phone: String,
    outstanding_balance: Option<f64>,
    penalty: Option<f64>,
    extra: Json<serde_json::Map<String, serde_json::Value>>,
    was_dialed: bool,
}

impl TryFrom<ContactRow> for Contact {
    type Error = DomainError;

    fn try_from(r: ContactRow) -> Result<Self> {
        let phone = PhoneNumber::parse(&r.phone).map_err(DomainError::ValidationError)?;
        Ok(Contact {
            id: ContactId::from_uuid(r.id),
            campaign_id: CampaignId::from_uuid(r.campaign_id),
            name: r.name,
            phone,
            outstanding_balance: r.outstanding_balance,
            penalty: r.penalty,
            extra: r.extra.0,
            was_dialed: r.was_dialed,
        })
    }
}

#[derive(FromRow)]
struct AgentRow {
    id: Uuid,
    name: String,
    extension: String,
    status: String,
}

impl From<AgentRow> for Agent {
    fn from(r: AgentRow) -> Self {
        Agent {
            id: AgentId::from_uuid(r.id),
            name: r.name,
            extension: r.extension,
            status: r.status.parse().unwrap_or(AgentStatus::Busy),
        }
    }
}

#[derive(FromRow)]
struct CallerIdRow {
    id: Uuid,
    number: String,
    is_active: bool,
}

#[derive(FromRow)]
struct CallRow {
    id: Uuid,
    campaign_id: Uuid,
    contact_id: Uuid,
    caller_id: Uuid,
    agent_id: Option<Uuid>,
    status: String,
    call_started_at: DateTime<Utc>,
    call_ended_at: Option<DateTime<Utc>>,
}

impl TryFrom<CallRow> for Call {
    type Error = DomainError;

    fn try_from(r: CallRow) -> Result<Self> {
        let status: CallStatus = r
            .status
            .parse()
            .map_err(|_| DomainError::Repository(format!("Unknown call status: {}", r.status)))?;

        Ok(Call::restore(
            CallId::from_uuid(r.id),
            CampaignId::from_uuid(r.campaign_id),
            ContactId::from_uuid(r.contact_id),
            CallerIdId::from_uuid(r.caller_id),
            r.agent_id.map(AgentId::from_uuid),
            status,
            r.call_started_at,
            r.call_ended_at,
        ))
    }
}

const CALL_COLUMNS: &str =
    "id, campaign_id, contact_id, caller_id, agent_id, status, call_started_at, call_ended_at";

pub struct PgDialerStore {
    pool: PgPool,
}

impl PgDialerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for PgDialerStore {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(
            "SELECT id, name, product_type, is_active, created_at FROM campaigns WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_active(&self) -> Result<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, CampaignRow>(
            "SELECT id, name, product_type, is_active, created_at FROM campaigns
             WHERE is_active = TRUE ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AgentRepository for PgDialerStore {
    async fn count_by_status(&self, status: AgentStatus) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn claim_idle(&self, selection_key: u64) -> Result<Option<Agent>> {
        // md5(id || key) gives a key-dependent but stable shuffle of the idle set
        let row = sqlx::query_as::<_, AgentRow>(
            r#"
            UPDATE agents SET status = 'busy', updated_at = NOW()
            WHERE id = (
                SELECT id FROM agents
                WHERE status = 'idle'
                ORDER BY md5(id::text || $1::text)
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, name, extension, status
            "#,
        )
        .bind(selection_key.to_string())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref agent) = row {
            debug!("Claimed agent {}", agent.id);
        }

        Ok(row.map(Into::into))
    }

    async fn release(&self, id: &AgentId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE agents SET status = 'idle', updated_at = NOW() WHERE id = $1 AND status = 'busy'",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        match AgentRepository::find_by_id(self, id).await? {
            Some(_) => Ok(false),
            None => Err(DomainError::NotFound(format!("Agent {}", id))),
        }
    }

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<Agent>> {
        let row = sqlx::query_as::<_, AgentRow>(
            "SELECT id, name, extension, status FROM agents WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl ContactRepository for PgDialerStore {
    async fn claim_undialed(&self, campaign_id: &CampaignId, limit: usize) -> Result<Vec<Contact>> {
        let mut tx = self.pool.begin().await?;

        let mut rows = sqlx::query_as::<_, ContactRow>(
            r#"
            UPDATE contacts SET was_dialed = TRUE, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM contacts
                WHERE campaign_id = $1 AND was_dialed = FALSE AND unreachable = FALSE
                ORDER BY seq
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, seq, campaign_id, name, phone, outstanding_balance, penalty, extra, was_dialed
            "#,
        )
        .bind(campaign_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&mut *tx)
        .await?;

        // RETURNING order is unspecified
        rows.sort_by_key(|r| r.seq);

        let mut contacts = Vec::with_capacity(rows.len());
        let mut unreachable = Vec::new();
        for row in rows {
            let id = row.id;
            match Contact::try_from(row) {
                Ok(contact) => contacts.push(contact),
                Err(e) => {
                    warn!(contact_id = %id, error = %e, "Contact cannot be dialed, flagging it");
                    unreachable.push(id);
                }
            }
        }

        // An undecodable row must not stay claimed without a call
        if !unreachable.is_empty() {
            sqlx::query(
                r#"
                UPDATE contacts SET was_dialed = FALSE, unreachable = TRUE, updated_at = NOW()
                WHERE id = ANY($1)
                "#,
            )
            .bind(&unreachable)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(contacts)
    }

    async fn release_claim(&self, id: &ContactId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contacts SET was_dialed = FALSE, updated_at = NOW()
            WHERE id = $1
              AND was_dialed = TRUE
              AND NOT EXISTS (SELECT 1 FROM calls WHERE calls.contact_id = $1)
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn counts(&self, campaign_id: &CampaignId) -> Result<ContactCounts> {
        let (total, dialed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE NOT unreachable), COUNT(*) FILTER (WHERE was_dialed)
            FROM contacts WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(ContactCounts {
            total: total as u64,
            dialed: dialed as u64,
        })
    }

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>> {
        let row = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT id, seq, campaign_id, name, phone, outstanding_balance, penalty, extra, was_dialed
            FROM contacts WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Contact::try_from).transpose()
    }
}

#[async_trait]
impl CallerIdRepository for PgDialerStore {
    async fn list_active(&self) -> Result<Vec<CallerId>> {
        let rows = sqlx::query_as::<_, CallerIdRow>(
            "SELECT id, number, is_active FROM caller_ids WHERE is_active = TRUE ORDER BY number",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CallerId {
                id: CallerIdId::from_uuid(r.id),
                number: r.number,
                is_active: r.is_active,
            })
            .collect())
    }
}

#[async_trait]
impl CallRepository for PgDialerStore {
    async fn create(&self, call: &Call) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO calls (id, campaign_id, contact_id, caller_id, agent_id, status, call_started_at, call_ended_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(call.id().as_uuid())
        .bind(call.campaign_id().as_uuid())
        .bind(call.contact_id().as_uuid())
        .bind(call.caller_id().as_uuid())
        .bind(call.agent_id().map(|a| a.as_uuid()))
        .bind(call.status().as_str())
        .bind(call.started_at())
        .bind(call.ended_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Created call: {}", call.id());
                Ok(())
            }
            Err(e) => {
                error!("Failed to create call {}: {}", call.id(), e);
                Err(e.into())
            }
        }
    }

    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>> {
        let row = sqlx::query_as::<_, CallRow>(&format!(
            "SELECT {} FROM calls WHERE id = $1",
            CALL_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Call::try_from).transpose()
    }

    async fn save_transition(&self, call: &Call, expected: CallStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE calls SET status = $2, agent_id = $3, call_ended_at = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(call.id().as_uuid())
        .bind(call.status().as_str())
        .bind(call.agent_id().map(|a| a.as_uuid()))
        .bind(call.ended_at())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel_dialing(&self, campaign_id: &CampaignId, ended_at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE calls SET status = 'cancelled', call_ended_at = $2
            WHERE campaign_id = $1 AND status = 'dialing'
            "#,
        )
        .bind(campaign_id.as_uuid())
        .bind(ended_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn status_counts(&self, campaign_id: &CampaignId) -> Result<Vec<CallStatusCount>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM calls WHERE campaign_id = $1 GROUP BY status",
        )
        .bind(campaign_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, count)| {
                status
                    .parse::<CallStatus>()
                    .map(|status| CallStatusCount {
                        status,
                        count: count as u64,
                    })
                    .map_err(|_| DomainError::Repository(format!("Unknown call status: {}", status)))
            })
            .collect()
    }

    async fn list_by_campaign(&self, campaign_id: &CampaignId) -> Result<Vec<Call>> {
        let rows = sqlx::query_as::<_, CallRow>(&format!(
            "SELECT {} FROM calls WHERE campaign_id = $1 ORDER BY call_started_at",
            CALL_COLUMNS
        ))
        .bind(campaign_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Call::try_from).collect()
    }
}
