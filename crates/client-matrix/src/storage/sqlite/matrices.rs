use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::access::{OrganizationId, UserId};
use crate::matrices::domain::display_axis_name;
use crate::matrices::{
    CascadeOutcome, CriterionUpsert, DeleteStats, Matrix, MatrixChanges, MatrixDetail, MatrixId,
    MatrixRepository, MatrixSummary, NewCriterion, NewMatrix, PurgeCounts, DEFAULT_AXIS_X_NAME,
    DEFAULT_AXIS_Y_NAME,
};
use crate::repository::RepositoryError;
use crate::scoring::{
    evaluation_order, Axis, Criterion, CriterionId, CriterionStatus, QuadrantRule, RuleOperator,
    StatusId,
};

use super::{from_millis, from_optional_millis, to_millis, SqliteStore};

impl MatrixRepository for SqliteStore {
    fn insert_matrix(&self, matrix: NewMatrix) -> Result<MatrixId, RepositoryError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO matrices \
                 (organization_id, name, description, is_active, template_key, created_by, created_at_ms) \
                 VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6)",
                params![
                    matrix.organization_id.0,
                    matrix.name,
                    matrix.description,
                    matrix.template_key,
                    matrix.created_by.0,
                    to_millis(Utc::now()),
                ],
            )?;
            let id = tx.last_insert_rowid();
            for criterion in &matrix.criteria {
                insert_criterion(&tx, id, criterion)?;
            }
            tx.commit()?;
            Ok(MatrixId(id))
        })
    }

    fn fetch_matrix(&self, id: MatrixId) -> Result<Option<MatrixDetail>, RepositoryError> {
        self.with_conn(|conn| load_matrix(conn, id))
    }

    fn list_matrices(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<MatrixSummary>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.name, m.description, m.is_active, m.created_at_ms, m.deleted_at_ms, \
                        m.axis_x_name, m.axis_y_name, \
                        (SELECT COUNT(*) FROM matrix_criteria c WHERE c.matrix_id = m.id AND c.is_active = 1) \
                 FROM matrices m \
                 WHERE m.organization_id = ?1 \
                 ORDER BY (m.deleted_at_ms IS NOT NULL), m.is_active DESC, m.created_at_ms DESC, m.id DESC",
            )?;
            let rows = stmt.query_map(params![organization_id.0], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })?;

            let mut summaries = Vec::new();
            for row in rows {
                let (id, name, description, is_active, created_at, deleted_at, axis_x, axis_y, count) =
                    row?;
                summaries.push(MatrixSummary {
                    id: MatrixId(id),
                    name,
                    description,
                    is_active,
                    created_at: from_millis(created_at)?,
                    deleted_at: from_optional_millis(deleted_at)?,
                    criteria_count: usize::try_from(count).unwrap_or_default(),
                    axis_x_name: display_axis_name(axis_x.as_deref(), DEFAULT_AXIS_X_NAME)
                        .to_string(),
                    axis_y_name: display_axis_name(axis_y.as_deref(), DEFAULT_AXIS_Y_NAME)
                        .to_string(),
                });
            }
            Ok(summaries)
        })
    }

    fn apply_changes(&self, id: MatrixId, changes: &MatrixChanges) -> Result<(), RepositoryError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            if !matrix_exists(&tx, id)? {
                return Err(RepositoryError::NotFound);
            }

            if let Some(name) = &changes.name {
                tx.execute(
                    "UPDATE matrices SET name = ?1 WHERE id = ?2",
                    params![name, id.0],
                )?;
            }
            if let Some(description) = &changes.description {
                tx.execute(
                    "UPDATE matrices SET description = ?1 WHERE id = ?2",
                    params![description, id.0],
                )?;
            }

            for upsert in &changes.criteria {
                match upsert {
                    CriterionUpsert::Update(criterion_id, criterion) => {
                        let updated = tx.execute(
                            "UPDATE matrix_criteria \
                             SET axis = ?1, name = ?2, description = ?3, weight = ?4, \
                                 min_value = ?5, max_value = ?6, sort_order = ?7 \
                             WHERE id = ?8 AND matrix_id = ?9 AND is_active = 1",
                            params![
                                criterion.axis.label(),
                                criterion.name,
                                criterion.description,
                                criterion.weight,
                                criterion.min_value,
                                criterion.max_value,
                                criterion.sort_order,
                                criterion_id.0,
                                id.0,
                            ],
                        )?;
                        if updated == 1 {
                            tx.execute(
                                "DELETE FROM criterion_statuses WHERE criterion_id = ?1",
                                params![criterion_id.0],
                            )?;
                            insert_statuses(&tx, criterion_id.0, criterion)?;
                        }
                    }
                    CriterionUpsert::Insert(criterion) => {
                        insert_criterion(&tx, id.0, criterion)?;
                    }
                }
            }

            if let Some(rules) = &changes.quadrant_rules {
                tx.execute(
                    "DELETE FROM matrix_quadrant_rules WHERE matrix_id = ?1",
                    params![id.0],
                )?;
                for rule in rules {
                    tx.execute(
                        "INSERT INTO matrix_quadrant_rules \
                         (matrix_id, quadrant, x_min, y_min, x_operator, priority) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            id.0,
                            rule.quadrant,
                            rule.x_min,
                            rule.y_min,
                            rule.x_operator.label(),
                            rule.priority,
                        ],
                    )?;
                }
            }

            tx.commit()?;
            Ok(())
        })
    }

    fn update_axis_names(
        &self,
        id: MatrixId,
        axis_x_name: &str,
        axis_y_name: &str,
    ) -> Result<(), RepositoryError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE matrices SET axis_x_name = ?1, axis_y_name = ?2 WHERE id = ?3",
                params![axis_x_name, axis_y_name, id.0],
            )?;
            if updated == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn mark_deleted(&self, id: MatrixId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            if !matrix_exists(&tx, id)? {
                return Err(RepositoryError::NotFound);
            }
            tx.execute(
                "UPDATE matrices SET deleted_at_ms = ?1, is_active = 0 \
                 WHERE id = ?2 AND deleted_at_ms IS NULL",
                params![to_millis(at), id.0],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    fn deactivate_criterion(
        &self,
        matrix_id: MatrixId,
        criterion_id: CriterionId,
    ) -> Result<bool, RepositoryError> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE matrix_criteria SET is_active = 0 \
                 WHERE id = ?1 AND matrix_id = ?2 AND is_active = 1",
                params![criterion_id.0, matrix_id.0],
            )?;
            Ok(updated == 1)
        })
    }

    fn delete_stats(&self, id: MatrixId) -> Result<Option<DeleteStats>, RepositoryError> {
        self.with_conn(|conn| {
            let name: Option<String> = conn
                .query_row(
                    "SELECT name FROM matrices WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(matrix_name) = name else {
                return Ok(None);
            };

            let criteria_count = count(
                conn,
                "SELECT COUNT(*) FROM matrix_criteria WHERE matrix_id = ?1",
                id,
            )?;
            let statuses_count = count(
                conn,
                "SELECT COUNT(*) FROM criterion_statuses WHERE criterion_id IN \
                 (SELECT id FROM matrix_criteria WHERE matrix_id = ?1)",
                id,
            )?;
            let clients_count = count(
                conn,
                "SELECT COUNT(*) FROM clients WHERE matrix_id = ?1",
                id,
            )?;

            Ok(Some(DeleteStats {
                matrix_name,
                criteria_count,
                statuses_count,
                clients_count,
            }))
        })
    }

    fn purge_matrix(&self, id: MatrixId) -> Result<CascadeOutcome, RepositoryError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let deleted_at: Option<Option<i64>> = tx
                .query_row(
                    "SELECT deleted_at_ms FROM matrices WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()?;
            match deleted_at {
                None => return Ok(CascadeOutcome::Missing),
                Some(None) => return Ok(CascadeOutcome::NotSoftDeleted),
                Some(Some(_)) => {}
            }

            let deleted_client_scores = tx.execute(
                "DELETE FROM client_scores WHERE criterion_id IN \
                 (SELECT id FROM matrix_criteria WHERE matrix_id = ?1)",
                params![id.0],
            )?;
            let deleted_statuses = tx.execute(
                "DELETE FROM criterion_statuses WHERE criterion_id IN \
                 (SELECT id FROM matrix_criteria WHERE matrix_id = ?1)",
                params![id.0],
            )?;
            let deleted_criteria = tx.execute(
                "DELETE FROM matrix_criteria WHERE matrix_id = ?1",
                params![id.0],
            )?;
            let unlinked_clients = tx.execute(
                "UPDATE clients SET matrix_id = NULL, score_x = 0, score_y = 0, quadrant = NULL \
                 WHERE matrix_id = ?1",
                params![id.0],
            )?;
            let deleted_quadrant_rules = tx.execute(
                "DELETE FROM matrix_quadrant_rules WHERE matrix_id = ?1",
                params![id.0],
            )?;
            tx.execute("DELETE FROM matrices WHERE id = ?1", params![id.0])?;
            tx.commit()?;

            Ok(CascadeOutcome::Purged(PurgeCounts {
                deleted_client_scores,
                deleted_statuses,
                deleted_criteria,
                deleted_quadrant_rules,
                unlinked_clients,
            }))
        })
    }

    fn expired_matrices(&self, cutoff: DateTime<Utc>) -> Result<Vec<MatrixId>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM matrices \
                 WHERE deleted_at_ms IS NOT NULL AND deleted_at_ms < ?1 \
                 ORDER BY deleted_at_ms, id",
            )?;
            let ids = stmt
                .query_map(params![to_millis(cutoff)], |row| row.get::<_, i64>(0))?
                .map(|id| id.map(MatrixId))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

/// Loads a matrix with ordered criteria, statuses and rules; usable inside a transaction.
pub(super) fn load_matrix(
    conn: &Connection,
    id: MatrixId,
) -> Result<Option<MatrixDetail>, RepositoryError> {
    let header = conn
        .query_row(
            "SELECT organization_id, name, description, axis_x_name, axis_y_name, is_active, \
                    template_key, created_by, created_at_ms, deleted_at_ms \
             FROM matrices WHERE id = ?1",
            params![id.0],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, bool>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, Option<i64>>(9)?,
                ))
            },
        )
        .optional()?;
    let Some((
        organization_id,
        name,
        description,
        axis_x_name,
        axis_y_name,
        is_active,
        template_key,
        created_by,
        created_at,
        deleted_at,
    )) = header
    else {
        return Ok(None);
    };

    let matrix = Matrix {
        id,
        organization_id: OrganizationId(organization_id),
        name,
        description,
        axis_x_name,
        axis_y_name,
        is_active,
        template_key,
        created_by: UserId(created_by),
        created_at: from_millis(created_at)?,
        deleted_at: from_optional_millis(deleted_at)?,
    };

    let mut criteria = load_criteria(conn, id)?;
    evaluation_order(&mut criteria);
    let quadrant_rules = load_rules(conn, id)?;

    Ok(Some(MatrixDetail {
        matrix,
        criteria,
        quadrant_rules,
    }))
}

fn load_criteria(conn: &Connection, id: MatrixId) -> Result<Vec<Criterion>, RepositoryError> {
    let mut stmt = conn.prepare(
        "SELECT id, axis, name, description, weight, min_value, max_value, sort_order \
         FROM matrix_criteria WHERE matrix_id = ?1 AND is_active = 1",
    )?;
    let mut criteria = stmt
        .query_map(params![id.0], |row| {
            Ok(Criterion {
                id: CriterionId(row.get(0)?),
                axis: Axis::from_stored(&row.get::<_, String>(1)?),
                name: row.get(2)?,
                description: row.get(3)?,
                weight: row.get(4)?,
                min_value: row.get(5)?,
                max_value: row.get(6)?,
                sort_order: row.get(7)?,
                statuses: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT s.criterion_id, s.id, s.label, s.weight, s.sort_order \
         FROM criterion_statuses s \
         JOIN matrix_criteria c ON c.id = s.criterion_id \
         WHERE c.matrix_id = ?1 AND c.is_active = 1 \
         ORDER BY s.sort_order, s.id",
    )?;
    let rows = stmt.query_map(params![id.0], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            CriterionStatus {
                id: StatusId(row.get(1)?),
                label: row.get(2)?,
                weight: row.get(3)?,
                sort_order: row.get(4)?,
            },
        ))
    })?;

    let mut statuses: HashMap<i64, Vec<CriterionStatus>> = HashMap::new();
    for row in rows {
        let (criterion_id, status) = row?;
        statuses.entry(criterion_id).or_default().push(status);
    }
    for criterion in &mut criteria {
        if let Some(found) = statuses.remove(&criterion.id.0) {
            criterion.statuses = found;
        }
    }
    Ok(criteria)
}

fn load_rules(conn: &Connection, id: MatrixId) -> Result<Vec<QuadrantRule>, RepositoryError> {
    let mut stmt = conn.prepare(
        "SELECT quadrant, x_min, y_min, x_operator, priority \
         FROM matrix_quadrant_rules WHERE matrix_id = ?1 \
         ORDER BY priority, id",
    )?;
    let rules = stmt
        .query_map(params![id.0], |row| {
            Ok(QuadrantRule {
                quadrant: row.get(0)?,
                x_min: row.get(1)?,
                y_min: row.get(2)?,
                x_operator: RuleOperator::parse_lenient(&row.get::<_, String>(3)?),
                priority: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rules)
}

fn insert_criterion(
    conn: &Connection,
    matrix_id: i64,
    criterion: &NewCriterion,
) -> Result<i64, RepositoryError> {
    conn.execute(
        "INSERT INTO matrix_criteria \
         (matrix_id, axis, name, description, weight, min_value, max_value, sort_order) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            matrix_id,
            criterion.axis.label(),
            criterion.name,
            criterion.description,
            criterion.weight,
            criterion.min_value,
            criterion.max_value,
            criterion.sort_order,
        ],
    )?;
    let criterion_id = conn.last_insert_rowid();
    insert_statuses(conn, criterion_id, criterion)?;
    Ok(criterion_id)
}

fn insert_statuses(
    conn: &Connection,
    criterion_id: i64,
    criterion: &NewCriterion,
) -> Result<(), RepositoryError> {
    for status in &criterion.statuses {
        conn.execute(
            "INSERT INTO criterion_statuses (criterion_id, label, weight, sort_order) \
             VALUES (?1, ?2, ?3, ?4)",
            params![criterion_id, status.label, status.weight, status.sort_order],
        )?;
    }
    Ok(())
}

fn matrix_exists(conn: &Connection, id: MatrixId) -> Result<bool, RepositoryError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM matrices WHERE id = ?1",
            params![id.0],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn count(conn: &Connection, sql: &str, id: MatrixId) -> Result<usize, RepositoryError> {
    let total: i64 = conn.query_row(sql, params![id.0], |row| row.get(0))?;
    Ok(usize::try_from(total).unwrap_or_default())
}
