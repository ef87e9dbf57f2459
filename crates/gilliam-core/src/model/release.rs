//! リリースとサービス記述子

use crate::error::{CoreError, Result};
use super::value::{deserialize_command, deserialize_env, deserialize_ports};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// リリース内の1サービスの定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// レジストリ修飾済みのイメージ参照
    pub image: String,

    /// 引数リスト（None はイメージのデフォルトコマンド）
    #[serde(default, deserialize_with = "deserialize_command")]
    pub command: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_env")]
    pub env: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "deserialize_ports")]
    pub ports: Vec<String>,

    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl ServiceDescriptor {
    pub fn new(image: impl Into<String>, command: Option<Vec<String>>, ports: Vec<String>) -> Self {
        Self {
            image: image.into(),
            command,
            env: BTreeMap::new(),
            ports,
            options: serde_json::Map::new(),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// 以前のリリースの環境変数を引き継ぐ
    ///
    /// 衝突したキーは自分（新しい方）の値を優先し、
    /// 以前にしかないキーはそのまま持ち越す。
    pub fn inherit_env(&mut self, previous: &ServiceDescriptor) {
        for (key, value) in &previous.env {
            self.env
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// フォーメーションの不変スナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// 1から始まる整数の文字列表現
    pub name: String,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceDescriptor>,
}

impl Release {
    /// リリース番号（整数として解釈できない名前は None）
    pub fn number(&self) -> Option<u64> {
        self.name.trim().parse().ok()
    }
}

/// 整数名が最大のリリースを選ぶ
///
/// 整数として解釈できない名前のリリースは無視する。
pub fn latest_release<I>(releases: I) -> Option<Release>
where
    I: IntoIterator<Item = Release>,
{
    releases
        .into_iter()
        .filter_map(|release| match release.number() {
            Some(n) => Some((n, release)),
            None => {
                tracing::warn!(name = %release.name, "ignoring release with non-numeric name");
                None
            }
        })
        .max_by_key(|(n, _)| *n)
        .map(|(_, release)| release)
}

/// 次のリリース名（リリースがなければ `"1"`）
pub fn next_release_name(current: Option<&Release>) -> Result<String> {
    match current.and_then(Release::number) {
        None => Ok("1".to_string()),
        Some(n) => n
            .checked_add(1)
            .map(|next| next.to_string())
            .ok_or_else(|| CoreError::ReleaseNumberOverflow(n.to_string())),
    }
}
