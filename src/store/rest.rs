//! REST backend for the record store.
//!
//! Speaks the PostgREST-style interface the hosted store exposes: one
//! `GET {base}/rest/v1/{table}` per fetch with `select`, `limit`, and an
//! optional `or=(department.ilike...)` filter, authenticated with an
//! `apikey` header plus a bearer token. The service credential is
//! preferred over the anonymous one when both are present.
//!
//! Rows are parsed defensively: a malformed row is skipped, never fatal
//! for the whole fetch.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::intent::DeptHint;
use crate::models::{Collection, RawRecord, Record};

use super::RecordStore;

/// Access credential, tagged with its privilege level.
#[derive(Debug, Clone)]
pub enum Credential {
    Service(String),
    Anon(String),
}

impl Credential {
    fn token(&self) -> &str {
        match self {
            Credential::Service(t) | Credential::Anon(t) => t,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Credential::Service(_) => "service",
            Credential::Anon(_) => "anon",
        }
    }

    /// Read from the environment, preferring the service key.
    pub fn from_env() -> Option<Self> {
        if let Ok(key) = std::env::var("STORE_SERVICE_KEY") {
            if !key.trim().is_empty() {
                return Some(Credential::Service(key));
            }
        }
        if let Ok(key) = std::env::var("STORE_ANON_KEY") {
            if !key.trim().is_empty() {
                return Some(Credential::Anon(key));
            }
        }
        None
    }
}

/// REST-backed record store.
pub struct RestStore {
    base_url: Option<String>,
    credential: Option<Credential>,
    client: reqwest::Client,
}

impl RestStore {
    /// Build from explicit parts. The base URL keeps no trailing slash.
    pub fn new(
        base_url: Option<String>,
        credential: Option<Credential>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the record store")?;
        Ok(Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            credential,
            client,
        })
    }

    /// Build from config, reading credentials from the environment.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(
            config.url.clone(),
            Credential::from_env(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

/// `or=` filter value matching the hint phrase or its abbreviation
/// against the department column.
fn hint_filter(hint: &DeptHint) -> String {
    format!(
        "(department.ilike.*{}*,department.ilike.*{}*)",
        hint.phrase, hint.token
    )
}

#[async_trait]
impl RecordStore for RestStore {
    async fn fetch(
        &self,
        collection: Collection,
        hint: Option<&DeptHint>,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let base = self
            .base_url
            .as_deref()
            .context("record store URL is not configured")?;
        let credential = self
            .credential
            .as_ref()
            .context("record store credential is not configured")?;

        let url = format!("{}/rest/v1/{}", base, collection.table());
        let limit_s = limit.to_string();
        let mut query: Vec<(&str, &str)> = vec![("select", "*"), ("limit", &limit_s)];
        let filter;
        if let Some(h) = hint {
            filter = hint_filter(h);
            query.push(("or", &filter));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header("apikey", credential.token())
            .header("Authorization", format!("Bearer {}", credential.token()))
            .send()
            .await
            .with_context(|| format!("Failed to query record store table {}", collection.table()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "record store returned {} for {}: {}",
                status,
                collection.table(),
                body.chars().take(200).collect::<String>()
            );
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .with_context(|| format!("Invalid JSON from record store table {}", collection.table()))?;

        let total = rows.len();
        let records: Vec<Record> = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<RawRecord>(row).ok())
            .map(|raw| Record::from_raw(raw, collection))
            .collect();
        if records.len() < total {
            tracing::debug!(
                collection = collection.table(),
                skipped = total - records.len(),
                "skipped malformed rows"
            );
        }
        Ok(records)
    }

    fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.credential.is_some()
    }

    fn describe(&self) -> String {
        match (&self.base_url, &self.credential) {
            (Some(url), Some(cred)) => {
                format!("REST record store at {} ({} credential)", url, cred.kind())
            }
            (Some(url), None) => format!("REST record store at {} (no credential)", url),
            _ => "record store not configured".to_string(),
        }
    }
}
