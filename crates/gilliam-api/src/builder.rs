//! ビルダー API クライアント
//!
//! ビルダーはエグゼキュータと並んで動き、ソースツリーの tar アーカイブを
//! イメージにします。

use crate::error::{ApiError, Result};
use crate::http::{base_url, check, for_each_json_line, join};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

/// ソースアーカイブからのイメージ作成
#[async_trait]
pub trait Builder: Send + Sync {
    /// `context`（非圧縮 tar）から `repository:tag` をビルドし、終了コードを返す
    ///
    /// ログは届いた順に `log` へ渡します。
    async fn build(
        &self,
        repository: &str,
        tag: &str,
        context: Vec<u8>,
        log: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<i64>;
}

#[derive(Deserialize)]
struct BuildEvent {
    #[serde(default)]
    stream: Option<String>,
    #[serde(default)]
    exit_code: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct BuilderClient {
    client: Client,
    base: Url,
}

impl BuilderClient {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: base_url(base)?,
        })
    }
}

#[async_trait]
impl Builder for BuilderClient {
    async fn build(
        &self,
        repository: &str,
        tag: &str,
        context: Vec<u8>,
        log: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<i64> {
        let url = join(&self.base, &format!("build/{repository}"))?;
        tracing::debug!(%url, tag, bytes = context.len(), "Uploading build context");

        let response = self
            .client
            .post(url)
            .query(&[("tag", tag)])
            .header(reqwest::header::CONTENT_TYPE, "application/x-tar")
            .body(context)
            .send()
            .await?;
        let response = check(response).await?;

        let mut exit_code = None;
        for_each_json_line(response, |event: BuildEvent| {
            if let Some(text) = event.stream {
                log(&text);
            }
            if event.exit_code.is_some() {
                exit_code = event.exit_code;
            }
            Ok(())
        })
        .await?;

        exit_code.ok_or_else(|| ApiError::Protocol("build ended without an exit code".into()))
    }
}
