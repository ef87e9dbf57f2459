//! サービスレジストリとビルドワーカーの選択

use crate::builder::{Builder, BuilderClient};
use crate::error::{ApiError, Result};
use crate::executor::{Executor, ExecutorClient};
use crate::http::check;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// エグゼキュータが登録されるフォーメーション
pub const EXECUTOR_FORMATION: &str = "executor";

/// サービスレジストリに登録されたインスタンス
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceEndpoint {
    pub formation: String,
    pub service: String,
    pub instance: String,
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// サービスレジストリのクライアント（応答するまでノードを順に試す）
#[derive(Debug, Clone)]
pub struct ServiceRegistryClient {
    client: Client,
    nodes: Vec<String>,
}

impl ServiceRegistryClient {
    pub fn new(nodes: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            nodes,
        }
    }

    /// `formation` に登録された全インスタンス
    pub async fn query_formation(&self, formation: &str) -> Result<Vec<ServiceEndpoint>> {
        let mut last_error = String::from("no nodes configured");

        for node in &self.nodes {
            let url = format!("http://{node}/{formation}");
            let outcome = async {
                let response = check(self.client.get(&url).send().await?).await?;
                Ok::<_, ApiError>(response.json::<BTreeMap<String, ServiceEndpoint>>().await?)
            }
            .await;

            match outcome {
                Ok(entries) => return Ok(entries.into_values().collect()),
                Err(e) => {
                    tracing::warn!(node = %node, error = %e, "Service registry node failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(ApiError::RegistryUnavailable(last_error))
    }

    /// エグゼキュータを選ぶ（指定があればその名前、なければランダム）
    pub async fn select_executor(&self, instance: Option<&str>) -> Result<ServiceEndpoint> {
        let executors = self.query_formation(EXECUTOR_FORMATION).await?;
        match instance {
            Some(name) => executors
                .into_iter()
                .find(|e| e.instance == name)
                .ok_or_else(|| ApiError::ExecutorNotFound(name.to_string())),
            None => executors
                .choose(&mut rand::thread_rng())
                .cloned()
                .ok_or(ApiError::NoExecutor),
        }
    }
}

/// リモートのビルダーと、それが動くエグゼキュータ
#[derive(Clone)]
pub struct BuildWorker {
    pub instance: String,
    pub builder: Arc<dyn Builder>,
    pub executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for BuildWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildWorker")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

/// ビルドワーカーの取得元
#[async_trait]
pub trait BuildWorkers: Send + Sync {
    async fn select(&self) -> Result<BuildWorker>;
}

#[async_trait]
impl BuildWorkers for ServiceRegistryClient {
    async fn select(&self) -> Result<BuildWorker> {
        let endpoint = self.select_executor(None).await?;
        let base = endpoint.base_url();
        tracing::debug!(instance = %endpoint.instance, %base, "Selected build worker");

        Ok(BuildWorker {
            instance: endpoint.instance,
            builder: Arc::new(BuilderClient::new(&base)?),
            executor: Arc::new(ExecutorClient::new(&base)?),
        })
    }
}
