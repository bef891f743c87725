use anyhow::Result;
use rusqlite::Connection;

/// Column definition for schema management.
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
            primary_key: false,
            unique: false,
        }
    }

    const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Table definition for schema management.
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// `(index name, column)` pairs.
    pub indexes: &'static [(&'static str, &'static str)],
}

/// Ensure a table exists with all defined columns and indexes.
///
/// - If the table doesn't exist, CREATE TABLE with all columns.
/// - If it exists but lacks columns, ALTER TABLE ADD COLUMN. Columns added
///   this way lose their NOT NULL and UNIQUE constraints, which SQLite cannot
///   add after the fact.
pub fn ensure_table(conn: &Connection, table: &TableDef) -> Result<()> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE name = ?1 AND type = 'table'",
        [table.name],
        |row| row.get(0),
    )?;

    if !table_exists {
        let mut columns: Vec<String> = table
            .columns
            .iter()
            .map(|col| {
                let mut sql = format!("[{}] {}", col.name, col.sql_type);
                if col.not_null {
                    sql.push_str(" NOT NULL");
                }
                if col.unique {
                    sql.push_str(" UNIQUE");
                }
                sql
            })
            .collect();

        let pk: Vec<&str> = table
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name)
            .collect();
        if !pk.is_empty() {
            columns.push(format!("PRIMARY KEY({})", pk.join(",")));
        }

        conn.execute_batch(&format!("CREATE TABLE [{}] ({});", table.name, columns.join(",")))?;
    } else {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table.name))?;
        let existing = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        for col in table.columns {
            if !existing.iter().any(|e| e == col.name) {
                conn.execute_batch(&format!(
                    "ALTER TABLE [{}] ADD COLUMN [{}] {}",
                    table.name, col.name, col.sql_type,
                ))?;
            }
        }
    }

    for (index, column) in table.indexes {
        conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS [{index}] ON [{}]([{column}]);",
            table.name
        ))?;
    }

    Ok(())
}

pub static USERS_TABLE: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::new("lookup_key", "TEXT").not_null().primary_key(),
        ColumnDef::new("key_hash", "TEXT").not_null(),
        ColumnDef::new("salt", "TEXT").not_null(),
        ColumnDef::new("username", "TEXT").unique(),
        ColumnDef::new("created_at", "TEXT").not_null(),
    ],
    indexes: &[],
};

pub static SONGS_TABLE: TableDef = TableDef {
    name: "songs",
    columns: &[
        ColumnDef::new("id", "INTEGER").primary_key(),
        ColumnDef::new("title", "TEXT").not_null(),
        ColumnDef::new("author", "TEXT").not_null(),
        ColumnDef::new("file_path", "TEXT").not_null(),
        ColumnDef::new("uploaded_by", "TEXT"),
        ColumnDef::new("file_size", "INTEGER").not_null(),
        ColumnDef::new("created_at", "TEXT").not_null(),
    ],
    indexes: &[("idx_songs_created_at", "created_at")],
};

pub static RECORDS_TABLE: TableDef = TableDef {
    name: "records",
    columns: &[
        ColumnDef::new("id", "INTEGER").primary_key(),
        ColumnDef::new("user_lookup_key", "TEXT").not_null(),
        ColumnDef::new("title", "TEXT").not_null(),
        ColumnDef::new("music_file_path", "TEXT").not_null(),
        ColumnDef::new("note_file_path", "TEXT").not_null(),
        ColumnDef::new("created_at", "TEXT").not_null(),
    ],
    indexes: &[("idx_records_user", "user_lookup_key")],
};

pub static NOTE_CHARTS_TABLE: TableDef = TableDef {
    name: "note_charts",
    columns: &[
        ColumnDef::new("id", "INTEGER").primary_key(),
        ColumnDef::new("user_lookup_key", "TEXT").not_null(),
        ColumnDef::new("music_path", "TEXT").not_null(),
        ColumnDef::new("note_data", "TEXT").not_null(),
        ColumnDef::new("created_at", "TEXT").not_null(),
    ],
    indexes: &[("idx_note_charts_created_at", "created_at")],
};

pub static ALL_TABLES: [&TableDef; 4] = [&USERS_TABLE, &SONGS_TABLE, &RECORDS_TABLE, &NOTE_CHARTS_TABLE];
