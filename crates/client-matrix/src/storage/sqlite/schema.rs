use rusqlite::Connection;

pub(super) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys=ON;

        CREATE TABLE IF NOT EXISTS matrices (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          organization_id INTEGER NOT NULL,
          name TEXT NOT NULL,
          description TEXT NOT NULL DEFAULT '',
          axis_x_name TEXT,
          axis_y_name TEXT,
          is_active INTEGER NOT NULL DEFAULT 1,
          template_key TEXT,
          created_by INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          deleted_at_ms INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_matrices_org ON matrices(organization_id);
        CREATE INDEX IF NOT EXISTS idx_matrices_deleted ON matrices(deleted_at_ms);

        CREATE TABLE IF NOT EXISTS matrix_criteria (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          matrix_id INTEGER NOT NULL REFERENCES matrices(id),
          axis TEXT NOT NULL,
          name TEXT NOT NULL,
          description TEXT NOT NULL DEFAULT '',
          weight REAL NOT NULL DEFAULT 1,
          min_value REAL NOT NULL DEFAULT 0,
          max_value REAL NOT NULL DEFAULT 10,
          sort_order INTEGER NOT NULL DEFAULT 0,
          is_active INTEGER NOT NULL DEFAULT 1
        );
        CREATE INDEX IF NOT EXISTS idx_criteria_matrix ON matrix_criteria(matrix_id);

        CREATE TABLE IF NOT EXISTS criterion_statuses (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          criterion_id INTEGER NOT NULL REFERENCES matrix_criteria(id),
          label TEXT NOT NULL,
          weight REAL NOT NULL DEFAULT 1,
          sort_order INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_statuses_criterion ON criterion_statuses(criterion_id);

        CREATE TABLE IF NOT EXISTS matrix_quadrant_rules (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          matrix_id INTEGER NOT NULL REFERENCES matrices(id),
          quadrant TEXT NOT NULL,
          x_min REAL NOT NULL DEFAULT 0,
          y_min REAL NOT NULL DEFAULT 0,
          x_operator TEXT NOT NULL DEFAULT 'AND',
          priority INTEGER NOT NULL DEFAULT 1
        );
        CREATE INDEX IF NOT EXISTS idx_rules_matrix ON matrix_quadrant_rules(matrix_id);

        CREATE TABLE IF NOT EXISTS clients (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          organization_id INTEGER NOT NULL,
          matrix_id INTEGER REFERENCES matrices(id),
          company_name TEXT NOT NULL,
          contact_person TEXT NOT NULL DEFAULT '',
          email TEXT NOT NULL DEFAULT '',
          phone TEXT NOT NULL DEFAULT '',
          description TEXT NOT NULL DEFAULT '',
          score_x REAL NOT NULL DEFAULT 0,
          score_y REAL NOT NULL DEFAULT 0,
          quadrant TEXT,
          is_active INTEGER NOT NULL DEFAULT 1,
          created_by INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_clients_org ON clients(organization_id);
        CREATE INDEX IF NOT EXISTS idx_clients_matrix ON clients(matrix_id);

        CREATE TABLE IF NOT EXISTS client_scores (
          client_id INTEGER NOT NULL REFERENCES clients(id),
          criterion_id INTEGER NOT NULL REFERENCES matrix_criteria(id),
          score REAL NOT NULL,
          comment TEXT NOT NULL DEFAULT '',
          updated_at_ms INTEGER NOT NULL,
          PRIMARY KEY (client_id, criterion_id)
        );
        CREATE INDEX IF NOT EXISTS idx_scores_criterion ON client_scores(criterion_id);

        CREATE TABLE IF NOT EXISTS assessment_sessions (
          chat_user_id INTEGER PRIMARY KEY,
          payload TEXT NOT NULL,
          expires_at_ms INTEGER NOT NULL
        );
        "#,
    )?;
    add_column_if_missing(conn, "matrix_criteria", "is_active", "INTEGER NOT NULL DEFAULT 1")
}

/// Brings databases created before a column existed up to the current layout.
fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?
        .iter()
        .any(|name| name == column);
    if !present {
        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))?;
    }
    Ok(())
}
