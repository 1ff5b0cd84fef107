use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::access::{OrganizationId, UserId};
use crate::clients::{
    Client, ClientDetail, ClientFilter, ClientId, ClientRepository, ClientScore, ClientUpdate,
    NewClient, ScoreEvaluator, ScoreInput,
};
use crate::matrices::MatrixId;
use crate::repository::RepositoryError;
use crate::scoring::{CriterionId, ScoreOutcome};

use super::matrices::load_matrix;
use super::{from_millis, to_millis, SqliteStore};

const CLIENT_COLUMNS: &str = "id, organization_id, matrix_id, company_name, contact_person, email, \
     phone, description, score_x, score_y, quadrant, is_active, created_by, created_at_ms, \
     updated_at_ms";

impl ClientRepository for SqliteStore {
    fn insert_client(
        &self,
        organization_id: OrganizationId,
        created_by: UserId,
        client: &NewClient,
    ) -> Result<ClientId, RepositoryError> {
        self.with_conn(|conn| {
            let now = to_millis(Utc::now());
            conn.execute(
                "INSERT INTO clients \
                 (organization_id, matrix_id, company_name, contact_person, email, phone, \
                  description, created_by, created_at_ms, updated_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    organization_id.0,
                    client.matrix_id.map(|id| id.0),
                    client.company_name,
                    client.contact_person,
                    client.email,
                    client.phone,
                    client.description,
                    created_by.0,
                    now,
                ],
            )?;
            Ok(ClientId(conn.last_insert_rowid()))
        })
    }

    fn fetch_client(&self, id: ClientId) -> Result<Option<ClientDetail>, RepositoryError> {
        self.with_conn(|conn| {
            let Some(client) = load_client(conn, id)? else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT criterion_id, score, comment, updated_at_ms FROM client_scores \
                 WHERE client_id = ?1 ORDER BY criterion_id",
            )?;
            let rows = stmt.query_map(params![id.0], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?;
            let mut scores = Vec::new();
            for row in rows {
                let (criterion_id, score, comment, updated_at) = row?;
                scores.push(ClientScore {
                    criterion_id: CriterionId(criterion_id),
                    score,
                    comment,
                    updated_at: from_millis(updated_at)?,
                });
            }

            Ok(Some(ClientDetail { client, scores }))
        })
    }

    fn list_clients(
        &self,
        organization_id: OrganizationId,
        filter: &ClientFilter,
    ) -> Result<Vec<Client>, RepositoryError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CLIENT_COLUMNS} FROM clients \
                 WHERE organization_id = ?1 \
                   AND (?2 IS NULL OR quadrant = ?2) \
                   AND (?3 IS NULL OR matrix_id = ?3) \
                   AND (?4 = 1 OR is_active = 1) \
                 ORDER BY created_at_ms DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![
                    organization_id.0,
                    filter.quadrant,
                    filter.matrix_id.map(|id| id.0),
                    filter.include_inactive,
                ],
                read_client_row,
            )?;

            let mut clients = Vec::new();
            for row in rows {
                clients.push(row?.into_client()?);
            }
            Ok(clients)
        })
    }

    fn update_profile(&self, id: ClientId, update: &ClientUpdate) -> Result<(), RepositoryError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE clients SET \
                   company_name = COALESCE(?1, company_name), \
                   contact_person = COALESCE(?2, contact_person), \
                   email = COALESCE(?3, email), \
                   phone = COALESCE(?4, phone), \
                   description = COALESCE(?5, description), \
                   matrix_id = COALESCE(?6, matrix_id), \
                   updated_at_ms = ?7 \
                 WHERE id = ?8",
                params![
                    update.company_name.as_deref().map(str::trim),
                    update.contact_person.as_deref().map(str::trim),
                    update.email.as_deref().map(str::trim),
                    update.phone.as_deref().map(str::trim),
                    update.description.as_deref().map(str::trim),
                    update.matrix_id.map(|matrix| matrix.0),
                    to_millis(Utc::now()),
                    id.0,
                ],
            )?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn deactivate_client(&self, id: ClientId) -> Result<(), RepositoryError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE clients SET is_active = 0, updated_at_ms = ?1 WHERE id = ?2",
                params![to_millis(Utc::now()), id.0],
            )?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn active_company_exists(
        &self,
        organization_id: OrganizationId,
        company_name: &str,
    ) -> Result<bool, RepositoryError> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM clients \
                     WHERE organization_id = ?1 AND is_active = 1 AND LOWER(company_name) = LOWER(?2) \
                     LIMIT 1",
                    params![organization_id.0, company_name],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    fn record_scores(
        &self,
        id: ClientId,
        scores: &[ScoreInput],
        evaluate: ScoreEvaluator<'_>,
    ) -> Result<Option<ScoreOutcome>, RepositoryError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let matrix_id: Option<Option<i64>> = tx
                .query_row(
                    "SELECT matrix_id FROM clients WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(matrix_id) = matrix_id else {
                return Err(RepositoryError::NotFound);
            };

            let now = to_millis(Utc::now());
            // Only live criteria of the client's own organization accept scores.
            for score in scores {
                tx.execute(
                    "INSERT INTO client_scores (client_id, criterion_id, score, comment, updated_at_ms) \
                     SELECT ?1, ?2, ?3, ?4, ?5 \
                     WHERE EXISTS ( \
                       SELECT 1 FROM matrix_criteria c \
                       JOIN matrices m ON m.id = c.matrix_id \
                       WHERE c.id = ?2 AND c.is_active = 1 \
                         AND m.organization_id = (SELECT organization_id FROM clients WHERE id = ?1)) \
                     ON CONFLICT (client_id, criterion_id) DO UPDATE SET \
                       score = excluded.score, \
                       comment = excluded.comment, \
                       updated_at_ms = excluded.updated_at_ms",
                    params![id.0, score.criterion_id.0, score.score, score.comment, now],
                )?;
            }

            let detail = match matrix_id {
                Some(matrix_id) => load_matrix(&tx, MatrixId(matrix_id))?,
                None => None,
            };
            let Some(detail) = detail else {
                tx.execute(
                    "UPDATE clients SET updated_at_ms = ?1 WHERE id = ?2",
                    params![now, id.0],
                )?;
                tx.commit()?;
                return Ok(None);
            };

            let recorded = recorded_scores(&tx, id)?;
            let outcome = evaluate(&detail, &recorded);
            tx.execute(
                "UPDATE clients SET score_x = ?1, score_y = ?2, quadrant = ?3, updated_at_ms = ?4 \
                 WHERE id = ?5",
                params![outcome.score_x, outcome.score_y, outcome.quadrant, now, id.0],
            )?;
            tx.commit()?;
            Ok(Some(outcome))
        })
    }
}

fn recorded_scores(conn: &Connection, id: ClientId) -> Result<Vec<(CriterionId, f64)>, RepositoryError> {
    let mut stmt = conn.prepare(
        "SELECT criterion_id, score FROM client_scores WHERE client_id = ?1 ORDER BY criterion_id",
    )?;
    let scores = stmt
        .query_map(params![id.0], |row| {
            Ok((CriterionId(row.get(0)?), row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(scores)
}

fn load_client(conn: &Connection, id: ClientId) -> Result<Option<Client>, RepositoryError> {
    let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.0], read_client_row)
        .optional()?;
    row.map(ClientRow::into_client).transpose()
}

/// Raw column values; timestamps are converted outside the rusqlite row callback.
struct ClientRow {
    id: i64,
    organization_id: i64,
    matrix_id: Option<i64>,
    company_name: String,
    contact_person: String,
    email: String,
    phone: String,
    description: String,
    score_x: f64,
    score_y: f64,
    quadrant: Option<String>,
    is_active: bool,
    created_by: i64,
    created_at: i64,
    updated_at: i64,
}

fn read_client_row(row: &Row<'_>) -> rusqlite::Result<ClientRow> {
    Ok(ClientRow {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        matrix_id: row.get(2)?,
        company_name: row.get(3)?,
        contact_person: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        description: row.get(7)?,
        score_x: row.get(8)?,
        score_y: row.get(9)?,
        quadrant: row.get(10)?,
        is_active: row.get(11)?,
        created_by: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl ClientRow {
    fn into_client(self) -> Result<Client, RepositoryError> {
        Ok(Client {
            id: ClientId(self.id),
            organization_id: OrganizationId(self.organization_id),
            matrix_id: self.matrix_id.map(MatrixId),
            company_name: self.company_name,
            contact_person: self.contact_person,
            email: self.email,
            phone: self.phone,
            description: self.description,
            score_x: self.score_x,
            score_y: self.score_y,
            quadrant: self.quadrant,
            is_active: self.is_active,
            created_by: UserId(self.created_by),
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}
