//! HTTP の共通処理
//!
//! ステータスの変換、ページ分割されたコレクションの走査、
//! 改行区切り JSON ストリームの読み取り。

use crate::error::{ApiError, Result};
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// サービスのベース URL をパース（相対パスがその下に解決されるように）
pub fn base_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub(crate) fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| ApiError::InvalidUrl(format!("{base}{path}: {e}")))
}

/// 失敗レスポンスをエラーにする（409 は `ApiError::Conflict`）
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %message, "Remote call failed");
    if status == StatusCode::CONFLICT {
        return Err(ApiError::Conflict(message));
    }
    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}

#[derive(Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    links: Links,
}

#[derive(Deserialize, Default)]
struct Links {
    #[serde(default)]
    next: Option<String>,
}

/// ページ分割されたコレクションを全件取得
///
/// `links.next` がなくなるまで、取得したページを基準に解決して辿ります。
pub(crate) async fn traverse_collection<T: DeserializeOwned>(
    client: &Client,
    mut url: Url,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    loop {
        let response = check(client.get(url.clone()).send().await?).await?;
        let page: Collection<T> = response.json().await?;
        items.extend(page.items);

        match page.links.next.filter(|next| !next.is_empty()) {
            Some(next) => url = join(&url, &next)?,
            None => break,
        }
    }
    Ok(items)
}

/// 改行区切り JSON の本文をデコードし、各ドキュメントを `f` に渡す
pub(crate) async fn for_each_json_line<T, F>(response: Response, mut f: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            decode_line(&line, &mut f)?;
        }
    }
    decode_line(&buffer, &mut f)
}

fn decode_line<T, F>(line: &[u8], f: &mut F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(());
    }
    f(serde_json::from_slice(line)?)
}
