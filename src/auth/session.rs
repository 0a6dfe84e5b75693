//! Tenant-scoped sessions.
//!
//! # Responsibilities
//! - Derive cookie name and domain from the resolved tenant
//! - Issue, look up and revoke session tokens inside one tenant's scope
//!
//! # Design Decisions
//! - Sessions live in a `ScopedTable`, so a token minted on one tenant is
//!   invisible on every other tenant
//! - Cookie names embed the tenant id; a renamed slug keeps its sessions

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header::COOKIE, HeaderMap};
use serde::Serialize;
use uuid::Uuid;

use crate::config::TenancyConfig;
use crate::tenancy::{strip_port, ScopedTable, TenantId, TenantScope};

const COOKIE_PREFIX: &str = "lms_session_";

/// Cookie settings for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_domain: String,
    pub secure: bool,
}

impl SessionConfig {
    pub fn for_tenant(scope: &TenantScope, tenancy: &TenancyConfig) -> Self {
        let id: String = scope
            .tenant_id()
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();

        Self {
            cookie_name: format!("{COOKIE_PREFIX}{id}"),
            cookie_domain: format!(
                "{}.{}",
                scope.slug(),
                strip_port(&tenancy.root_domain).to_ascii_lowercase()
            ),
            secure: tenancy.protocol == "https",
        }
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn set_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Domain={}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name, token, self.cookie_domain
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that clears the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Domain={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name, self.cookie_domain
        )
    }

    /// Session token from the request cookies, if present.
    pub fn read_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, token)| token)
            .filter(|token| !token.is_empty())
    }
}

/// An authenticated learner or admin on one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: String,
    pub tenant_id: TenantId,
    /// Seconds since the Unix epoch.
    pub issued_at: u64,
}

/// Session tokens partitioned by tenant.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: ScopedTable<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `user` and return its token.
    pub fn issue(&self, scope: &TenantScope, user: impl Into<String>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let session = Session {
            user: user.into(),
            tenant_id: scope.tenant_id().clone(),
            issued_at,
        };
        tracing::info!(tenant_id = %scope.tenant_id(), user = %session.user, "Session issued");
        self.sessions.insert(scope, token.clone(), session);
        token
    }

    pub fn lookup(&self, scope: &TenantScope, token: &str) -> Option<Session> {
        self.sessions.get(scope, token)
    }

    pub fn revoke(&self, scope: &TenantScope, token: &str) -> bool {
        self.sessions.remove(scope, token).is_some()
    }

    pub fn active(&self, scope: &TenantScope) -> usize {
        self.sessions.count(scope)
    }
}
