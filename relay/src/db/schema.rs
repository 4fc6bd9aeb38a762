//! Layout of n8n's `user` table across n8n releases.
//!
//! Each slot lists the column names it may go by, in order of preference. The layout is
//! resolved once from the live column list; nothing else inspects column names.

use super::DbPool;
use crate::constants::owner;
use crate::error::{RelayError, Result};

const ID: &[&str] = &["id"];
const EMAIL: &[&str] = &["email"];
const PASSWORD: &[&str] = &["password"];
const FIRST_NAME: &[&str] = &["firstName", "firstname", "first_name"];
const LAST_NAME: &[&str] = &["lastName", "lastname", "last_name"];
const CREATED_AT: &[&str] = &["createdAt", "created_at"];
const UPDATED_AT: &[&str] = &["updatedAt", "updated_at"];

/// How the owner role is expressed, most recent n8n first.
const ROLE_VARIANTS: &[(&str, RoleStyle)] = &[
    ("roleSlug", RoleStyle::Slug),
    ("role", RoleStyle::Slug),
    ("globalRoleId", RoleStyle::RoleTable),
    ("global_role_id", RoleStyle::RoleTable),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleStyle {
    /// Text column holding `global:owner`.
    Slug,
    /// Foreign key into the `role` table, looked up by name.
    RoleTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleColumn {
    pub column: &'static str,
    pub style: RoleStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTable {
    pub id: Option<&'static str>,
    pub email: &'static str,
    pub password: &'static str,
    pub first_name: Option<&'static str>,
    pub last_name: Option<&'static str>,
    pub role: Option<RoleColumn>,
    pub created_at: Option<&'static str>,
    pub updated_at: Option<&'static str>,
}

/// Values for one new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// A parameterised `INSERT` with its string binds in `$n` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub sql: String,
    pub binds: Vec<String>,
}

fn pick(columns: &[String], candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|c| columns.iter().any(|col| col == c))
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

impl UserTable {
    pub fn resolve(columns: &[String]) -> Result<Self> {
        let required = |slot: &str, candidates: &[&'static str]| {
            pick(columns, candidates).ok_or_else(|| {
                RelayError::Schema(format!(
                    "user table has no {} column (columns: {})",
                    slot,
                    columns.join(", ")
                ))
            })
        };

        let role = ROLE_VARIANTS
            .iter()
            .find(|(name, _)| columns.iter().any(|col| col == name))
            .map(|(column, style)| RoleColumn {
                column: *column,
                style: *style,
            });

        Ok(Self {
            id: pick(columns, ID),
            email: required("email", EMAIL)?,
            password: required("password", PASSWORD)?,
            first_name: pick(columns, FIRST_NAME),
            last_name: pick(columns, LAST_NAME),
            role,
            created_at: pick(columns, CREATED_AT),
            updated_at: pick(columns, UPDATED_AT),
        })
    }

    pub fn needs_role_table(&self) -> bool {
        matches!(
            self.role,
            Some(RoleColumn {
                style: RoleStyle::RoleTable,
                ..
            })
        )
    }

    /// Same layout with the role column left out of inserts.
    pub fn without_role(self) -> Self {
        Self { role: None, ..self }
    }

    pub fn insert_plan(&self, user: &NewUser) -> InsertPlan {
        let mut columns: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        let mut bind = |column: &str, value: &str, cast: &str| {
            binds.push(value.to_string());
            columns.push(quote(column));
            values.push(format!("${}{}", binds.len(), cast));
        };

        if let Some(col) = self.id {
            bind(col, &user.id, "::uuid");
        }
        bind(self.email, &user.email, "");
        bind(self.password, &user.password_hash, "");
        if let Some(col) = self.first_name {
            bind(col, &user.first_name, "");
        }
        if let Some(col) = self.last_name {
            bind(col, &user.last_name, "");
        }
        match self.role {
            Some(RoleColumn {
                column,
                style: RoleStyle::Slug,
            }) => bind(column, owner::ROLE_SLUG, ""),
            Some(RoleColumn {
                column,
                style: RoleStyle::RoleTable,
            }) => {
                binds.push(owner::ROLE_NAME.to_string());
                columns.push(quote(column));
                values.push(format!(
                    "(SELECT id FROM \"role\" WHERE name = ${} LIMIT 1)",
                    binds.len()
                ));
            }
            None => {}
        }
        for col in [self.created_at, self.updated_at].into_iter().flatten() {
            columns.push(quote(col));
            values.push("NOW()".to_string());
        }

        InsertPlan {
            sql: format!(
                "INSERT INTO \"user\" ({}) VALUES ({})",
                columns.join(", "),
                values.join(", ")
            ),
            binds,
        }
    }
}

pub async fn table_exists(pool: &DbPool, table: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = 'public' AND table_name = $1)",
    )
    .bind(table)
    .fetch_one(pool)
    .await
}

pub async fn role_exists(pool: &DbPool, name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS (SELECT 1 FROM "role" WHERE name = $1)"#)
        .bind(name)
        .fetch_one(pool)
        .await
}

pub async fn table_columns(pool: &DbPool, table: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT column_name::text FROM information_schema.columns WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position",
    )
    .bind(table)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn user() -> NewUser {
        NewUser {
            id: "3f1c1d52-0c49-4b7f-8f61-0b6e3f0f4a10".to_string(),
            email: "owner@example.com".to_string(),
            password_hash: "$2b$10$hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[test]
    fn current_n8n_layout() {
        let table = UserTable::resolve(&cols(&[
            "id", "email", "firstName", "lastName", "password", "roleSlug", "createdAt",
            "updatedAt", "role",
        ]))
        .unwrap();

        assert_eq!(
            table.role,
            Some(RoleColumn {
                column: "roleSlug",
                style: RoleStyle::Slug
            })
        );

        let plan = table.insert_plan(&user());
        assert_eq!(
            plan.sql,
            "INSERT INTO \"user\" (\"id\", \"email\", \"password\", \"firstName\", \"lastName\", \"roleSlug\", \"createdAt\", \"updatedAt\") \
             VALUES ($1::uuid, $2, $3, $4, $5, $6, NOW(), NOW())"
        );
        assert_eq!(plan.binds.len(), 6);
        assert_eq!(plan.binds[5], "global:owner");
    }

    #[test]
    fn legacy_role_table_layout() {
        let table = UserTable::resolve(&cols(&[
            "email", "password", "first_name", "last_name", "globalRoleId", "created_at",
        ]))
        .unwrap();

        assert!(table.needs_role_table());
        assert_eq!(table.id, None);
        assert_eq!(table.updated_at, None);

        let plan = table.insert_plan(&user());
        assert_eq!(
            plan.sql,
            "INSERT INTO \"user\" (\"email\", \"password\", \"first_name\", \"last_name\", \"globalRoleId\", \"created_at\") \
             VALUES ($1, $2, $3, $4, (SELECT id FROM \"role\" WHERE name = $5 LIMIT 1), NOW())"
        );
        assert_eq!(plan.binds[4], "owner");
    }

    #[test]
    fn role_table_layout_without_owner_role_omits_the_column() {
        let table = UserTable::resolve(&cols(&["email", "password", "global_role_id"]))
            .unwrap()
            .without_role();

        assert!(!table.needs_role_table());
        assert_eq!(
            table.insert_plan(&user()).sql,
            "INSERT INTO \"user\" (\"email\", \"password\") VALUES ($1, $2)"
        );
    }

    #[test]
    fn first_candidate_wins() {
        let table =
            UserTable::resolve(&cols(&["email", "password", "first_name", "firstName"])).unwrap();
        assert_eq!(table.first_name, Some("firstName"));
    }

    #[test]
    fn missing_role_column_inserts_without_role() {
        let table = UserTable::resolve(&cols(&["email", "password"])).unwrap();
        assert_eq!(table.role, None);
        assert_eq!(
            table.insert_plan(&user()).sql,
            "INSERT INTO \"user\" (\"email\", \"password\") VALUES ($1, $2)"
        );
    }

    #[test]
    fn missing_email_is_a_schema_error() {
        let err = UserTable::resolve(&cols(&["id", "password"])).unwrap_err();
        assert!(matches!(err, RelayError::Schema(msg) if msg.contains("email")));
    }
}
