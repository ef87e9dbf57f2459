//! エグゼキュータ API クライアント
//!
//! エグゼキュータはクライアントの代わりにコンテナを動かし（`gilliam run`）、
//! ビルドしたイメージをレジストリへプッシュします。

use crate::error::{ApiError, Result};
use crate::http::{base_url, check, for_each_json_line, join};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use gilliam_config::Credentials;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_tungstenite::tungstenite::Message;

/// コンテナ状態のポーリング間隔
const STATE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// イメージプッシュの進捗1件
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushEvent {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// イメージの公開
#[async_trait]
pub trait Executor: Send + Sync {
    /// `repository` をレジストリへプッシュ
    ///
    /// 進捗は1件ずつ `progress` に渡し、`error` を含むものが来たら中断します。
    async fn push_image(
        &self,
        repository: &str,
        credentials: Option<&Credentials>,
        progress: &mut (dyn for<'a> FnMut(&'a PushEvent) + Send),
    ) -> Result<()>;
}

/// コンテナ起動のリクエスト
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub formation: Option<String>,
    pub image: String,
    pub env: BTreeMap<String, String>,
    pub command: Option<Vec<String>>,
    pub tty: bool,
}

#[derive(Debug, Deserialize)]
struct ContainerState {
    id: String,
    #[serde(default)]
    state: String,
}

#[derive(Deserialize)]
struct WaitResponse {
    exit_code: i32,
}

#[derive(Serialize)]
struct ResizeRequest {
    width: u16,
    height: u16,
}

#[derive(Debug, Clone)]
pub struct ExecutorClient {
    client: Client,
    base: Url,
}

impl ExecutorClient {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: base_url(base)?,
        })
    }

    /// コンテナを起動してハンドルを返す
    pub async fn run(&self, request: &RunRequest) -> Result<ProcessHandle> {
        let response = self
            .client
            .post(join(&self.base, "container")?)
            .json(request)
            .send()
            .await?;
        let container: ContainerState = check(response).await?.json().await?;
        tracing::debug!(id = %container.id, state = %container.state, "Started container");

        Ok(ProcessHandle {
            client: self.client.clone(),
            base: self.base.clone(),
            id: container.id,
        })
    }
}

#[async_trait]
impl Executor for ExecutorClient {
    async fn push_image(
        &self,
        repository: &str,
        credentials: Option<&Credentials>,
        progress: &mut (dyn for<'a> FnMut(&'a PushEvent) + Send),
    ) -> Result<()> {
        let url = join(&self.base, &format!("image/{repository}/push"))?;
        let response = self.client.post(url).json(&credentials).send().await?;
        let response = check(response).await?;

        for_each_json_line(response, |event: PushEvent| {
            if let Some(error) = &event.error {
                return Err(ApiError::Remote(error.clone()));
            }
            progress(&event);
            Ok(())
        })
        .await
    }
}

/// `ExecutorClient::run` で起動したコンテナ
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    client: Client,
    base: Url,
    id: String,
}

impl ProcessHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, suffix: &str) -> Result<Url> {
        join(&self.base, &format!("container/{}{suffix}", self.id))
    }

    async fn state(&self) -> Result<String> {
        let response = self.client.get(self.url("")?).send().await?;
        let container: ContainerState = check(response).await?.json().await?;
        Ok(container.state)
    }

    /// コンテナが `wanted` になるまでポーリング
    pub async fn wait_for_state(&self, wanted: &str) -> Result<()> {
        loop {
            let state = self.state().await?;
            if state == wanted {
                return Ok(());
            }
            if matches!(state.as_str(), "exited" | "failed" | "done") {
                return Err(ApiError::Protocol(format!(
                    "container {} is {state}, expected {wanted}",
                    self.id
                )));
            }
            tokio::time::sleep(STATE_POLL_INTERVAL).await;
        }
    }

    /// コンテナの終了を待って終了コードを返す
    pub async fn wait(&self) -> Result<i32> {
        let response = self.client.post(self.url("/wait")?).send().await?;
        let result: WaitResponse = check(response).await?.json().await?;
        Ok(result.exit_code)
    }

    pub async fn resize_tty(&self, width: u16, height: u16) -> Result<()> {
        let response = self
            .client
            .post(self.url("/resize")?)
            .json(&ResizeRequest { width, height })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// コンテナの標準入出力に接続
    ///
    /// 入力は EOF まで転送し、出力はリモートが接続を閉じるまで書き出します。
    pub async fn attach<R, W>(&self, mut input: R, mut output: W, replay: bool) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut url = self.url("/attach")?;
        url.query_pairs_mut()
            .append_pair("replay", if replay { "1" } else { "0" });
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ApiError::InvalidUrl(url.to_string()))?;

        let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        let upstream = async {
            let mut buf = vec![0u8; 4096];
            loop {
                let n = input.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                sink.send(Message::Binary(buf[..n].to_vec())).await?;
            }
            // 入力は終わったが、残りの出力のため接続は保つ
            futures_util::future::pending::<Result<()>>().await
        };

        let downstream = async {
            while let Some(message) = stream.next().await {
                match message? {
                    Message::Binary(data) => output.write_all(&data).await?,
                    Message::Text(text) => output.write_all(text.as_bytes()).await?,
                    Message::Close(_) => break,
                    _ => continue,
                }
                output.flush().await?;
            }
            Ok::<(), ApiError>(())
        };

        tokio::select! {
            result = upstream => result,
            result = downstream => result,
        }
    }
}
