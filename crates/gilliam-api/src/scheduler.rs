//! スケジューラ API クライアント
//!
//! スケジューラはフォーメーション・リリース・インスタンスを管理します。
//! 既に使われている名前でリリースを作ると `ApiError::Conflict` になります。

use crate::error::Result;
use crate::http::{base_url, check, join, traverse_collection};
use async_trait::async_trait;
use gilliam_core::{Formation, Instance, Release, ScaleMap};
use reqwest::{Client, Url};
use serde::Serialize;
use std::collections::BTreeMap;

/// デプロイ処理が使うリリース関連の操作
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// フォーメーションの全リリース（全ページ）
    async fn releases(&self, formation: &str) -> Result<Vec<Release>>;

    /// リリースを作成（名前が使用済みなら `ApiError::Conflict`）
    async fn create_release(&self, formation: &str, release: &Release) -> Result<Release>;

    /// `release` へのマイグレーションを1段進める（作業が残っていれば true）
    async fn migrate(&self, formation: &str, release: &str) -> Result<bool>;

    /// スケール変更を1段進める（作業が残っていれば true）
    async fn scale(&self, formation: &str, release: &str, scales: &ScaleMap) -> Result<bool>;
}

/// インスタンス1つを起動するリクエスト
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpawnRequest {
    pub service: String,
    pub release: String,
    pub image: String,
    pub command: Option<Vec<String>>,
    pub env: BTreeMap<String, String>,
    pub ports: Vec<String>,
    pub assigned_to: Option<String>,
    pub requirements: Vec<String>,
    pub rank: Option<u32>,
}

#[derive(Serialize)]
struct ScaleRequest<'a> {
    scales: &'a ScaleMap,
}

#[derive(Serialize)]
struct FormationRequest<'a> {
    name: &'a str,
}

/// スケジューラの HTTP クライアント
#[derive(Debug, Clone)]
pub struct SchedulerClient {
    client: Client,
    base: Url,
}

impl SchedulerClient {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: base_url(base)?,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        join(&self.base, path)
    }

    /// フォーメーションを作成
    pub async fn create_formation(&self, name: &str) -> Result<Formation> {
        let response = self
            .client
            .post(self.url("formation")?)
            .json(&FormationRequest { name })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// フォーメーションの全インスタンス
    pub async fn instances(&self, formation: &str) -> Result<Vec<Instance>> {
        let url = self.url(&format!("formation/{formation}/instance"))?;
        traverse_collection(&self.client, url).await
    }

    /// リリースのスケール設定とは別にインスタンスを1つ起動
    pub async fn spawn(&self, formation: &str, request: &SpawnRequest) -> Result<Instance> {
        let response = self
            .client
            .post(self.url(&format!("formation/{formation}/instance"))?)
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[async_trait]
impl Scheduler for SchedulerClient {
    async fn releases(&self, formation: &str) -> Result<Vec<Release>> {
        let url = self.url(&format!("formation/{formation}/release"))?;
        traverse_collection(&self.client, url).await
    }

    async fn create_release(&self, formation: &str, release: &Release) -> Result<Release> {
        tracing::debug!(formation, release = %release.name, "Creating release");
        let response = self
            .client
            .post(self.url(&format!("formation/{formation}/release"))?)
            .json(release)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn migrate(&self, formation: &str, release: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.url(&format!("formation/{formation}/release/{release}/migrate"))?)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn scale(&self, formation: &str, release: &str, scales: &ScaleMap) -> Result<bool> {
        let response = self
            .client
            .post(self.url(&format!("formation/{formation}/release/{release}/scale"))?)
            .json(&ScaleRequest { scales })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}
