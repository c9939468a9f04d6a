//! Report access control.
//!
//! Report entry points take an explicit [`Actor`] and ask an [`AccessGate`]
//! before loading anything. [`RoleGate`] is the stock gate: admins see every
//! report, inactive users see none, viewers see what they were granted.
//! [`UserStore`] keeps users and grants in the `users` / `user_permissions`
//! tables. Passwords and login live outside this crate.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::connection::{Connection, Row};
use crate::error::{FbaError, Result};
use crate::sql_builder::SqlBuilder;

// ---------------------------------------------------------------------------
// Report / Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    Overview,
    SalesTraffic,
    Settlements,
    InventoryValue,
    Orders,
    Returns,
    Reviews,
    InventoryAging,
    Forecast,
    InventoryTable,
    ScraperReviews,
    UserManagement,
}

impl Report {
    pub const ALL: [Report; 12] = [
        Report::Overview,
        Report::SalesTraffic,
        Report::Settlements,
        Report::InventoryValue,
        Report::Orders,
        Report::Returns,
        Report::Reviews,
        Report::InventoryAging,
        Report::Forecast,
        Report::InventoryTable,
        Report::ScraperReviews,
        Report::UserManagement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Report::Overview => "overview",
            Report::SalesTraffic => "sales_traffic",
            Report::Settlements => "settlements",
            Report::InventoryValue => "inventory_value",
            Report::Orders => "orders",
            Report::Returns => "returns",
            Report::Reviews => "reviews",
            Report::InventoryAging => "inventory_aging",
            Report::Forecast => "forecast",
            Report::InventoryTable => "inventory_table",
            Report::ScraperReviews => "scraper_reviews",
            Report::UserManagement => "user_management",
        }
    }

    /// Only admins may ever open this report.
    pub fn is_admin_only(self) -> bool {
        matches!(self, Report::UserManagement)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Report {
    type Err = FbaError;

    fn from_str(s: &str) -> Result<Self> {
        Report::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| FbaError::InvalidArgument(format!("unknown report '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = FbaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "viewer" => Ok(Role::Viewer),
            other => Err(FbaError::InvalidArgument(format!("unknown role '{}'", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Whoever is asking for a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub email: String,
    pub role: Role,
    pub permissions: BTreeSet<Report>,
    pub is_active: bool,
}

impl Actor {
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            user_id: None,
            email: email.into(),
            role: Role::Admin,
            permissions: BTreeSet::new(),
            is_active: true,
        }
    }

    pub fn viewer<I>(email: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = Report>,
    {
        Self {
            user_id: None,
            email: email.into(),
            role: Role::Viewer,
            permissions: permissions.into_iter().collect(),
            is_active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

// ---------------------------------------------------------------------------
// AccessGate
// ---------------------------------------------------------------------------

pub trait AccessGate {
    fn can_view(&self, actor: &Actor, report: Report) -> bool;

    fn list_permitted_reports(&self, actor: &Actor) -> BTreeSet<Report> {
        Report::ALL
            .into_iter()
            .filter(|r| self.can_view(actor, *r))
            .collect()
    }
}

/// Gate driven by the actor's role and grants.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGate;

impl AccessGate for RoleGate {
    fn can_view(&self, actor: &Actor, report: Report) -> bool {
        if !actor.is_active {
            return false;
        }
        match actor.role {
            Role::Admin => true,
            Role::Viewer => !report.is_admin_only() && actor.permissions.contains(&report),
        }
    }
}

// ---------------------------------------------------------------------------
// UserStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Option<String>,
}

impl User {
    fn from_row(row: &Row) -> Result<Self> {
        let id = row
            .get("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| FbaError::InvalidArgument("user row without id".to_string()))?;
        let text = |key: &str| {
            row.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Ok(Self {
            id,
            email: text("email"),
            name: text("name"),
            role: text("role").parse().unwrap_or(Role::Viewer),
            is_active: row.get("is_active").and_then(|v| v.as_bool()).unwrap_or(false),
            created_at: row.get("created_at").and_then(|v| v.as_str()).map(String::from),
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, name, role, is_active, CAST(created_at AS VARCHAR) AS created_at";

/// CRUD over users and their report grants.
pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the `users` and `user_permissions` tables if missing.
    pub fn ensure_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE SEQUENCE IF NOT EXISTS users_id_seq START 1;
             CREATE TABLE IF NOT EXISTS users (
                 id         INTEGER PRIMARY KEY DEFAULT nextval('users_id_seq'),
                 email      VARCHAR UNIQUE NOT NULL,
                 name       VARCHAR,
                 role       VARCHAR DEFAULT 'viewer',
                 is_active  BOOLEAN DEFAULT TRUE,
                 created_at TIMESTAMP DEFAULT current_timestamp,
                 last_login TIMESTAMP
             );
             CREATE TABLE IF NOT EXISTS user_permissions (
                 user_id  INTEGER NOT NULL,
                 report   VARCHAR NOT NULL,
                 can_view BOOLEAN DEFAULT TRUE,
                 PRIMARY KEY (user_id, report)
             );",
        )
    }

    pub fn create_user(&self, email: &str, name: &str, role: Role) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(FbaError::InvalidArgument("email must not be empty".to_string()));
        }
        if self.get_by_email(&email)?.is_some() {
            return Err(FbaError::InvalidArgument(format!(
                "user '{}' already exists",
                email
            )));
        }
        self.conn.execute_update(
            "INSERT INTO users (email, name, role, is_active) VALUES (?, ?, ?, TRUE)",
            &[email.clone(), name.to_string(), role.as_str().to_string()],
        )?;
        tracing::info!(email = %email, role = role.as_str(), "created user");
        self.get_by_email(&email)?
            .ok_or_else(|| FbaError::NotFound(format!("user '{}' after insert", email)))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let (sql, params) = SqlBuilder::new("users")
            .select(&[USER_COLUMNS])
            .order_by(&["id ASC"])
            .build();
        self.conn.execute(&sql, &params)?.iter().map(User::from_row).collect()
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        let (sql, params) = SqlBuilder::new("users")
            .select(&[USER_COLUMNS])
            .where_eq("email", &email)
            .limit(1)
            .build();
        let rows = self.conn.execute(&sql, &params)?;
        rows.first().map(User::from_row).transpose()
    }

    pub fn get(&self, user_id: i64) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = CAST(? AS INTEGER)",
            USER_COLUMNS
        );
        let rows = self.conn.execute(&sql, &[user_id.to_string()])?;
        rows.first().map(User::from_row).transpose()
    }

    pub fn set_role(&self, user_id: i64, role: Role) -> Result<()> {
        let n = self.conn.execute_update(
            "UPDATE users SET role = ? WHERE id = CAST(? AS INTEGER)",
            &[role.as_str().to_string(), user_id.to_string()],
        )?;
        self.expect_one(n, user_id)?;
        tracing::info!(user_id, role = role.as_str(), "changed user role");
        Ok(())
    }

    pub fn set_active(&self, user_id: i64, active: bool) -> Result<()> {
        let n = self.conn.execute_update(
            "UPDATE users SET is_active = CAST(? AS BOOLEAN) WHERE id = CAST(? AS INTEGER)",
            &[active.to_string(), user_id.to_string()],
        )?;
        self.expect_one(n, user_id)?;
        tracing::info!(user_id, active, "changed user status");
        Ok(())
    }

    /// Delete a user and their grants.
    pub fn delete_user(&self, user_id: i64) -> Result<()> {
        self.conn.execute_update(
            "DELETE FROM user_permissions WHERE user_id = CAST(? AS INTEGER)",
            &[user_id.to_string()],
        )?;
        let n = self.conn.execute_update(
            "DELETE FROM users WHERE id = CAST(? AS INTEGER)",
            &[user_id.to_string()],
        )?;
        self.expect_one(n, user_id)?;
        tracing::info!(user_id, "deleted user");
        Ok(())
    }

    /// Reports granted to a user. Unknown report names are ignored.
    pub fn load_permissions(&self, user_id: i64) -> Result<BTreeSet<Report>> {
        let rows = self.conn.execute(
            "SELECT report FROM user_permissions \
             WHERE user_id = CAST(? AS INTEGER) AND can_view = TRUE",
            &[user_id.to_string()],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get("report").and_then(|v| v.as_str()))
            .filter_map(|name| name.parse::<Report>().ok())
            .collect())
    }

    /// Replace a user's grants with `reports`.
    pub fn save_permissions(&self, user_id: i64, reports: &BTreeSet<Report>) -> Result<()> {
        self.conn.execute_update(
            "DELETE FROM user_permissions WHERE user_id = CAST(? AS INTEGER)",
            &[user_id.to_string()],
        )?;
        for report in reports {
            self.conn.execute_update(
                "INSERT INTO user_permissions (user_id, report, can_view) \
                 VALUES (CAST(? AS INTEGER), ?, TRUE)",
                &[user_id.to_string(), report.name().to_string()],
            )?;
        }
        tracing::info!(user_id, count = reports.len(), "saved report permissions");
        Ok(())
    }

    /// Build the [`Actor`] for a stored user.
    pub fn actor_for(&self, email: &str) -> Result<Option<Actor>> {
        let Some(user) = self.get_by_email(email)? else {
            return Ok(None);
        };
        let permissions = self.load_permissions(user.id)?;
        Ok(Some(Actor {
            user_id: Some(user.id),
            email: user.email,
            role: user.role,
            permissions,
            is_active: user.is_active,
        }))
    }

    fn expect_one(&self, affected: usize, user_id: i64) -> Result<()> {
        if affected == 0 {
            Err(FbaError::NotFound(format!("user {}", user_id)))
        } else {
            Ok(())
        }
    }
}
