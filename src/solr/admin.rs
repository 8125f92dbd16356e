//! Collection, core and config administration.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{ApiType, Body, Result, SolrClient, SolrError};
use crate::models::display_value;

const MISSING_FIELDS_CHAIN: &str = "add-unknown-fields-to-the-schema";

/// Whether the server runs SolrCloud collections or standalone cores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolrMode {
    Collections,
    Cores,
}

impl SolrMode {
    pub fn api_type(&self) -> ApiType {
        match self {
            SolrMode::Collections => ApiType::Collections,
            SolrMode::Cores => ApiType::Cores,
        }
    }

    fn ping_api(&self) -> &'static str {
        match self {
            SolrMode::Cores => "admin/ping",
            SolrMode::Collections => "admin/ping?distrib=true",
        }
    }
}

/// Bounded poll schedule
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 128,
            interval: Duration::from_secs(1),
        }
    }
}

/// Poll `probe` until it returns true or the attempts run out.
///
/// Errors other than `NotRunning` count as a failed attempt.
pub async fn wait_for_success<F, Fut>(policy: PollPolicy, mut probe: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for count in 0..policy.attempts {
        match probe().await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e @ SolrError::NotRunning(_)) => return Err(e),
            Err(e) => debug!("probe failed: {}", e),
        }
        info!(waiting = true, count, "waiting for Solr");
        tokio::time::sleep(policy.interval).await;
    }
    Ok(false)
}

impl SolrClient {
    /// Check that a collection or core exists and answers a ping
    pub async fn ping(&self, name: &str, mode: SolrMode) -> Result<bool> {
        match self.get_solr(name, mode.ping_api(), false).await {
            Ok(data) => Ok(data.get("status").and_then(Value::as_str) == Some("OK")),
            Err(e @ SolrError::NotRunning(_)) => Err(e),
            Err(e) => {
                debug!("ping {} failed: {}", name, e);
                Ok(false)
            }
        }
    }

    /// Collections when the Collections API answers, cores otherwise
    pub async fn detect_mode(&self) -> Result<SolrMode> {
        match self.get_collections().await {
            Ok(_) => Ok(SolrMode::Collections),
            Err(e) if e.is_status() => Ok(SolrMode::Cores),
            Err(e) => Err(e),
        }
    }

    pub async fn get_collections(&self) -> Result<BTreeSet<String>> {
        let data = self.get_api(ApiType::Collections, "", "").await?;
        let names = data
            .get("collections")
            .and_then(Value::as_array)
            .ok_or_else(|| SolrError::Unexpected("no collections list".into()))?;
        Ok(names.iter().map(display_value).collect())
    }

    pub async fn get_cores(&self) -> Result<BTreeSet<String>> {
        let data = self.get_api(ApiType::Cores, "", "").await?;
        let status = data
            .get("status")
            .and_then(Value::as_object)
            .ok_or_else(|| SolrError::Unexpected("no core status".into()))?;
        Ok(status.keys().cloned().collect())
    }

    /// Collection names, else core names, else nothing if Solr is down
    pub async fn get_names(&self) -> Result<BTreeSet<String>> {
        match self.get_collections().await {
            Ok(names) => return Ok(names),
            Err(e) if e.is_status() => {}
            Err(e @ SolrError::NotRunning(_)) => {
                warn!("{}", e);
                return Ok(BTreeSet::new());
            }
            Err(e) => return Err(e),
        }
        match self.get_cores().await {
            Ok(names) => Ok(names),
            Err(e @ SolrError::NotRunning(_)) => {
                warn!("{}", e);
                Ok(BTreeSet::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Create a collection. With `lock_schema` the collection stops adding
    /// unknown fields on its own.
    pub async fn create_collection(
        &self,
        name: &str,
        shards: u32,
        replication: u32,
        lock_schema: bool,
    ) -> Result<()> {
        info!("create collection {}", name);
        let command = json!({
            "create": {
                "name": name,
                "numShards": shards,
                "replicationFactor": replication,
                "waitForFinalState": "true",
            }
        });
        let response = self
            .post_api(ApiType::Collections, "", "", Body::json(&command))
            .await?;
        debug!("{}", response);
        info!("created collection {}", name);

        if lock_schema {
            let command = json!({
                "set-user-property": {
                    "update.autoCreateFields": "false",
                    "waitForFinalState": "true",
                }
            });
            self.post_api(ApiType::Collections, name, "config", Body::json(&command))
                .await?;
            info!("autoCreateFields {} false", name);
        }
        Ok(())
    }

    /// True when every `add-unknown-fields-to-the-schema` chain has
    /// `default == status`
    pub async fn check_missing_status(
        &self,
        name: &str,
        mode: SolrMode,
        status: &str,
    ) -> Result<bool> {
        let data = self
            .get_api(mode.api_type(), name, "config/updateRequestProcessorChain")
            .await?;
        let chains = data
            .get("config")
            .and_then(|c| c.get("updateRequestProcessorChain"))
            .and_then(Value::as_array)
            .ok_or_else(|| SolrError::Unexpected("no updateRequestProcessorChain".into()))?;
        Ok(missing_status_matches(chains, status))
    }

    pub async fn get_configs(&self) -> Result<Value> {
        self.get_api(ApiType::Cluster, "configs", "").await
    }

    /// Delete the config set `name` and its auto-created twin
    pub async fn delete_config(&self, name: &str) -> Result<()> {
        if name == "_default_" {
            return Err(SolrError::DefaultConfig);
        }
        let configs = self.get_configs().await?;
        let listed: BTreeSet<String> = match configs.get("configSets").and_then(Value::as_array) {
            Some(sets) if !sets.is_empty() => sets.iter().map(display_value).collect(),
            _ => return Ok(()),
        };
        for config in [name.to_string(), format!("{}.AUTOCREATED", name)] {
            if listed.contains(&config) {
                self.delete_api(ApiType::Cluster, "configs", &config).await?;
                info!("deleted config {}", config);
            }
        }
        Ok(())
    }

    /// Delete a collection, waiting until it stops answering pings
    pub async fn delete_collection(
        &self,
        name: &str,
        drop_schema: bool,
        drop_config: bool,
    ) -> Result<()> {
        info!("delete collection {}", name);
        if drop_schema
            && !self
                .get_schema(name, SolrMode::Collections, false)
                .await?
                .is_empty()
        {
            info!("delete schema {}", name);
            self.delete_schema(name).await?;
            info!("deleted schema {}", name);
        }

        self.delete_api(ApiType::Collections, name, "").await?;

        let gone = wait_for_success(PollPolicy::default(), || async move {
            self.ping(name, SolrMode::Cores).await.map(|up| !up)
        })
        .await?;
        if !gone {
            warn!("{} still answers pings after delete", name);
        }

        if drop_config {
            self.delete_config(name).await?;
        }
        info!("deleted collection {}", name);
        Ok(())
    }
}

fn missing_status_matches(chains: &[Value], status: &str) -> bool {
    chains
        .iter()
        .filter(|c| c.get("name").and_then(Value::as_str) == Some(MISSING_FIELDS_CHAIN))
        .all(|c| c.get("default").map(display_value).as_deref() == Some(status))
}
