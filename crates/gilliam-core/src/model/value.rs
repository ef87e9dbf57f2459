//! YAML/JSON の緩い値を正規化するためのデシリアライザ
//!
//! マニフェストでは `PORT: 5000` や `ports: [80, "443:8443"]` のように
//! 数値と文字列が混在するため、ここで文字列にそろえます。

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// `script` / `command` の指定
///
/// 文字列ならシェル経由で実行し、配列ならそのまま引数リストとして扱う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Line(String),
    Args(Vec<String>),
}

impl CommandSpec {
    /// 引数リストに変換
    pub fn into_args(self) -> Vec<String> {
        match self {
            CommandSpec::Line(line) => vec!["/bin/sh".to_string(), "-c".to_string(), line],
            CommandSpec::Args(args) => args,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

/// ポート一覧（数値・文字列混在可）を文字列リストとして読み込む
pub fn deserialize_ports<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Scalar>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(Scalar::into_string)
        .collect())
}

/// 環境変数マップ（値は数値・真偽値も可）を文字列マップとして読み込む
pub fn deserialize_env<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<BTreeMap<String, Scalar>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into_string()))
        .collect())
}

/// コマンド指定を引数リストとして読み込む（null はイメージのデフォルト）
pub fn deserialize_command<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let spec: Option<CommandSpec> = Option::deserialize(deserializer)?;
    Ok(spec.map(CommandSpec::into_args))
}
