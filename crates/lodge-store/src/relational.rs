use std::collections::BTreeMap;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Transaction};
use tracing::debug;

use lodge_types::record::{format_timestamp, parse_timestamp};
use lodge_types::schema::{ColumnDef, ColumnType, AMENITY_IDS_FIELD, PLACE_AMENITY_TABLE};
use lodge_types::{EntityKind, FieldValue, ObjectKey, Record, ALL_KINDS};

use crate::config::RelationalConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::Storage;

/// Relational backend: one long-lived SQLite session.
///
/// `new` and `delete` stage work in the session; nothing touches the
/// medium until `save` commits it in a single transaction. Schema is
/// provisioned on `reload` from the column definitions in
/// `lodge_types::schema`: bounded text lengths and column types are
/// enforced by the medium itself (`STRICT` tables with `CHECK`
/// constraints), and deletes cascade through foreign keys.
pub struct RelationalStorage {
    conn: Connection,
    staged: Vec<Record>,
    staged_deletes: Vec<ObjectKey>,
}

/// Kinds with a relational mapping, in registry order.
fn mapped_kinds() -> impl Iterator<Item = (EntityKind, &'static str)> {
    ALL_KINDS.iter().filter_map(|k| k.table().map(|t| (*k, t)))
}

impl RelationalStorage {
    /// Open a session against the configured database.
    ///
    /// With `drop_existing` set, all tables are dropped first so the next
    /// `reload` provisions a fresh schema.
    pub fn open(config: &RelationalConfig) -> StoreResult<Self> {
        let conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        if config.drop_existing {
            conn.execute_batch(&drop_ddl())?;
            debug!("existing schema dropped");
        }

        Ok(Self {
            conn,
            staged: Vec::new(),
            staged_deletes: Vec::new(),
        })
    }

    /// In-memory session (tests and embedding).
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(&RelationalConfig::default())
    }

    fn load_kind(
        &self,
        kind: EntityKind,
        out: &mut BTreeMap<ObjectKey, Record>,
    ) -> StoreResult<()> {
        let Some(table) = kind.table() else {
            return Ok(());
        };
        let cols = kind.columns();
        let select = {
            let mut names = vec!["id", "created_at", "updated_at"];
            names.extend(cols.iter().map(|c| c.name));
            format!("SELECT {} FROM {table}", names.join(", "))
        };

        let mut records = Vec::new();
        let mut stmt = self.conn.prepare(&select)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let created_at = parse_timestamp(&row.get::<_, String>(1)?)?;
            let updated_at = parse_timestamp(&row.get::<_, String>(2)?)?;

            let mut fields = BTreeMap::new();
            for (i, col) in cols.iter().enumerate() {
                let value: SqlValue = row.get(3 + i)?;
                if let Some(field) = field_from_sql(col, value) {
                    fields.insert(col.name.to_string(), field);
                }
            }
            records.push(Record::from_parts(kind, id, created_at, updated_at, fields));
        }
        drop(rows);
        drop(stmt);

        if kind == EntityKind::Place {
            for record in &mut records {
                let ids = self.amenity_ids_of(record.id())?;
                if !ids.is_empty() {
                    let mut fields = record.fields().clone();
                    fields.insert(AMENITY_IDS_FIELD.to_string(), FieldValue::List(ids));
                    *record = Record::from_parts(
                        record.kind(),
                        record.id(),
                        record.created_at(),
                        record.updated_at(),
                        fields,
                    );
                }
            }
        }

        for record in records {
            out.insert(record.key(), record);
        }
        Ok(())
    }

    fn amenity_ids_of(&self, place_id: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT amenity_id FROM {PLACE_AMENITY_TABLE} WHERE place_id = ?1 ORDER BY amenity_id"
        ))?;
        let ids = stmt
            .query_map(params![place_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn commit(
        conn: &mut Connection,
        staged: &[Record],
        deletes: &[ObjectKey],
    ) -> StoreResult<()> {
        let tx = conn.transaction()?;
        Self::apply(&tx, staged, deletes)?;
        tx.commit()?;
        Ok(())
    }

    fn apply(tx: &Transaction<'_>, staged: &[Record], deletes: &[ObjectKey]) -> StoreResult<()> {
        for key in deletes {
            if let Some(table) = key.kind.table() {
                tx.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![key.id])?;
            }
        }
        for record in staged {
            let Some(table) = record.kind().table() else {
                return Err(StoreError::Unmapped(record.kind()));
            };
            upsert(tx, table, record)?;
            if record.kind() == EntityKind::Place {
                sync_amenities(tx, record)?;
            }
        }
        Ok(())
    }
}

impl Storage for RelationalStorage {
    fn all(&self, kind: Option<EntityKind>) -> StoreResult<BTreeMap<ObjectKey, Record>> {
        let mut out = BTreeMap::new();
        match kind {
            Some(k) => self.load_kind(k, &mut out)?,
            None => {
                for (k, _) in mapped_kinds() {
                    self.load_kind(k, &mut out)?;
                }
            }
        }
        Ok(out)
    }

    fn new(&mut self, record: Record) -> StoreResult<()> {
        if record.kind().table().is_none() {
            return Err(StoreError::Unmapped(record.kind()));
        }
        let key = record.key();
        self.staged_deletes.retain(|k| *k != key);
        self.staged.retain(|r| r.key() != key);
        self.staged.push(record);
        Ok(())
    }

    fn save(&mut self) -> StoreResult<()> {
        let (inserts, deletes) = (self.staged.len(), self.staged_deletes.len());
        let result = Self::commit(&mut self.conn, &self.staged, &self.staged_deletes);
        // Success consumed the staged work; failure rolled the transaction
        // back and expunged it, so a retry starts from a clean session.
        self.staged.clear();
        self.staged_deletes.clear();
        if result.is_ok() {
            debug!(inserts, deletes, "session committed");
        }
        result
    }

    fn delete(&mut self, record: Option<&Record>) -> StoreResult<()> {
        let Some(record) = record else {
            return Ok(());
        };
        let key = record.key();
        self.staged.retain(|r| r.key() != key);
        if !self.staged_deletes.contains(&key) {
            self.staged_deletes.push(key);
        }
        Ok(())
    }

    fn reload(&mut self) -> StoreResult<()> {
        self.conn.execute_batch(&schema_ddl())?;
        self.staged.clear();
        self.staged_deletes.clear();
        debug!("schema provisioned, session fresh");
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        // The connection itself is released on drop.
        self.staged.clear();
        self.staged_deletes.clear();
        Ok(())
    }
}

fn upsert(tx: &Transaction<'_>, table: &str, record: &Record) -> StoreResult<()> {
    let cols = record.kind().columns();

    let mut names = vec!["id", "created_at", "updated_at"];
    names.extend(cols.iter().map(|c| c.name));
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = names[2..]
        .iter()
        .map(|n| format!("{n} = excluded.{n}"))
        .collect();
    // created_at stays as first inserted; everything else follows the record.
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
        names.join(", "),
        placeholders.join(", "),
        updates.join(", "),
    );

    let mut values: Vec<SqlValue> = vec![
        SqlValue::Text(record.id().to_string()),
        SqlValue::Text(format_timestamp(record.created_at())),
        SqlValue::Text(format_timestamp(record.updated_at())),
    ];
    for col in cols {
        values.push(field_to_sql(col, record.get(col.name)));
    }

    tx.execute(&sql, params_from_iter(values))?;
    Ok(())
}

fn sync_amenities(tx: &Transaction<'_>, place: &Record) -> StoreResult<()> {
    tx.execute(
        &format!("DELETE FROM {PLACE_AMENITY_TABLE} WHERE place_id = ?1"),
        params![place.id()],
    )?;
    if let Some(FieldValue::List(ids)) = place.get(AMENITY_IDS_FIELD) {
        for amenity_id in ids {
            tx.execute(
                &format!(
                    "INSERT OR IGNORE INTO {PLACE_AMENITY_TABLE} (place_id, amenity_id) VALUES (?1, ?2)"
                ),
                params![place.id(), amenity_id],
            )?;
        }
    }
    Ok(())
}

/// Bind a field for its column. Missing integers take the schema default;
/// other missing values bind NULL and the medium decides. A value of the
/// wrong type binds as-is so the medium rejects it at save time.
fn field_to_sql(col: &ColumnDef, field: Option<&FieldValue>) -> SqlValue {
    match field {
        Some(FieldValue::Text(s)) => SqlValue::Text(s.clone()),
        Some(FieldValue::Int(n)) => SqlValue::Integer(*n),
        Some(FieldValue::Float(x)) => SqlValue::Real(*x),
        Some(FieldValue::List(_)) => SqlValue::Null,
        None => match col.ty {
            ColumnType::Integer => SqlValue::Integer(0),
            _ => SqlValue::Null,
        },
    }
}

fn field_from_sql(col: &ColumnDef, value: SqlValue) -> Option<FieldValue> {
    match value {
        SqlValue::Null => None,
        SqlValue::Integer(n) => match col.ty {
            ColumnType::Float => Some(FieldValue::Float(n as f64)),
            _ => Some(FieldValue::Int(n)),
        },
        SqlValue::Real(x) => Some(FieldValue::Float(x)),
        SqlValue::Text(s) => Some(FieldValue::Text(s)),
        SqlValue::Blob(_) => None,
    }
}

fn column_sql(col: &ColumnDef) -> String {
    let mut sql = format!(
        "{} {}",
        col.name,
        match col.ty {
            ColumnType::Text(_) => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
        }
    );
    match col.ty {
        ColumnType::Integer => sql.push_str(" NOT NULL DEFAULT 0"),
        _ if !col.nullable => sql.push_str(" NOT NULL"),
        _ => {}
    }
    if let ColumnType::Text(len) = col.ty {
        sql.push_str(&format!(" CHECK (length({}) <= {len})", col.name));
    }
    sql
}

fn table_ddl(kind: EntityKind, table: &str) -> String {
    let mut parts = vec![
        "id TEXT PRIMARY KEY CHECK (length(id) <= 60)".to_string(),
        "created_at TEXT NOT NULL".to_string(),
        "updated_at TEXT NOT NULL".to_string(),
    ];
    parts.extend(kind.columns().iter().map(column_sql));
    for col in kind.columns() {
        if let Some(to) = col.references.and_then(|k| k.table()) {
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {to}(id) ON DELETE CASCADE",
                col.name
            ));
        }
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    {}\n) STRICT;",
        parts.join(",\n    ")
    )
}

fn schema_ddl() -> String {
    let mut ddl = String::new();
    for (kind, table) in mapped_kinds() {
        ddl.push_str(&table_ddl(kind, table));
        ddl.push('\n');
    }
    ddl.push_str(&format!(
        "CREATE TABLE IF NOT EXISTS {PLACE_AMENITY_TABLE} (\n    \
         place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,\n    \
         amenity_id TEXT NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,\n    \
         PRIMARY KEY (place_id, amenity_id)\n) STRICT;\n"
    ));
    ddl
}

fn drop_ddl() -> String {
    let mut ddl = format!("DROP TABLE IF EXISTS {PLACE_AMENITY_TABLE};\n");
    let tables: Vec<&str> = mapped_kinds().map(|(_, t)| t).collect();
    for table in tables.iter().rev() {
        ddl.push_str(&format!("DROP TABLE IF EXISTS {table};\n"));
    }
    ddl
}
