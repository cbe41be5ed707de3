//! Declarative persisted schema.
//!
//! The tables are plain data so the offline schema tool (`varco schema`)
//! can render DDL without a live database or any runtime context, while
//! the storage queries rely on the same table and column names. A test
//! cross-checks the two so they cannot drift.

pub struct ColumnDef {
    pub name: &'static str,
    pub definition: &'static str,
}

pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub constraints: &'static [&'static str],
    pub indexes: &'static [&'static str],
}

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef {
            name: "id",
            definition: "UUID PRIMARY KEY DEFAULT gen_random_uuid()",
        },
        ColumnDef {
            name: "email",
            definition: "TEXT NOT NULL",
        },
        ColumnDef {
            name: "email_verified",
            definition: "BOOLEAN NOT NULL DEFAULT FALSE",
        },
        ColumnDef {
            name: "created_at",
            definition: "TIMESTAMPTZ NOT NULL DEFAULT NOW()",
        },
    ],
    constraints: &["UNIQUE (email)"],
    indexes: &[],
};

pub const LOGIN_CODES: TableDef = TableDef {
    name: "login_codes",
    columns: &[
        ColumnDef {
            name: "id",
            definition: "UUID PRIMARY KEY DEFAULT gen_random_uuid()",
        },
        ColumnDef {
            name: "email",
            definition: "TEXT NOT NULL",
        },
        ColumnDef {
            name: "code_hash",
            definition: "BYTEA NOT NULL",
        },
        ColumnDef {
            name: "attempts",
            definition: "INTEGER NOT NULL DEFAULT 0",
        },
        ColumnDef {
            name: "expires_at",
            definition: "TIMESTAMPTZ NOT NULL",
        },
        ColumnDef {
            name: "created_at",
            definition: "TIMESTAMPTZ NOT NULL DEFAULT NOW()",
        },
    ],
    constraints: &[],
    indexes: &["CREATE INDEX IF NOT EXISTS login_codes_email_idx ON login_codes (email)"],
};

pub const SESSIONS: TableDef = TableDef {
    name: "sessions",
    columns: &[
        ColumnDef {
            name: "id",
            definition: "UUID PRIMARY KEY DEFAULT gen_random_uuid()",
        },
        ColumnDef {
            name: "user_id",
            definition: "UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE",
        },
        ColumnDef {
            name: "token_hash",
            definition: "BYTEA NOT NULL",
        },
        ColumnDef {
            name: "ip_address",
            definition: "TEXT",
        },
        ColumnDef {
            name: "timezone",
            definition: "TEXT",
        },
        ColumnDef {
            name: "city",
            definition: "TEXT",
        },
        ColumnDef {
            name: "country",
            definition: "TEXT",
        },
        ColumnDef {
            name: "region",
            definition: "TEXT",
        },
        ColumnDef {
            name: "region_code",
            definition: "TEXT",
        },
        ColumnDef {
            name: "colo",
            definition: "TEXT",
        },
        ColumnDef {
            name: "latitude",
            definition: "TEXT",
        },
        ColumnDef {
            name: "longitude",
            definition: "TEXT",
        },
        ColumnDef {
            name: "expires_at",
            definition: "TIMESTAMPTZ NOT NULL",
        },
        ColumnDef {
            name: "created_at",
            definition: "TIMESTAMPTZ NOT NULL DEFAULT NOW()",
        },
    ],
    constraints: &["UNIQUE (token_hash)"],
    indexes: &["CREATE INDEX IF NOT EXISTS sessions_user_id_idx ON sessions (user_id)"],
};

pub const TABLES: &[&TableDef] = &[&USERS, &LOGIN_CODES, &SESSIONS];

/// Render the full DDL. Pure string work, no I/O.
#[must_use]
pub fn ddl() -> String {
    let mut out = String::from("-- Generated by `varco schema`. Do not edit by hand.\n");
    for table in TABLES {
        out.push_str(&format!("\nCREATE TABLE IF NOT EXISTS {} (\n", table.name));
        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|column| format!("    {} {}", column.name, column.definition))
            .collect();
        lines.extend(
            table
                .constraints
                .iter()
                .map(|constraint| format!("    {constraint}")),
        );
        out.push_str(&lines.join(",\n"));
        out.push_str("\n);\n");
        for index in table.indexes {
            out.push_str(&format!("{index};\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_declares_every_table() {
        let ddl = ddl();
        for table in TABLES {
            assert!(
                ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table.name)),
                "missing table {}",
                table.name
            );
        }
    }

    #[test]
    fn ddl_covers_columns_used_by_storage() {
        let ddl = ddl();
        // Columns the runtime queries bind against.
        for column in [
            "email_verified",
            "code_hash",
            "attempts",
            "token_hash",
            "ip_address",
            "timezone",
            "region_code",
            "colo",
            "latitude",
            "longitude",
            "expires_at",
        ] {
            assert!(ddl.contains(column), "missing column {column}");
        }
    }

    #[test]
    fn sessions_carry_all_eight_geo_columns() {
        let geo_columns = [
            "timezone",
            "city",
            "country",
            "region",
            "region_code",
            "colo",
            "latitude",
            "longitude",
        ];
        for name in geo_columns {
            assert!(
                SESSIONS.columns.iter().any(|column| column.name == name),
                "missing geo column {name}"
            );
        }
    }

    #[test]
    fn shipped_sql_file_matches_generator() {
        let shipped = include_str!("../../db/sql/varco.sql");
        assert_eq!(shipped, ddl());
    }
}
