//! スケジューラ・ルーターが返すその他のリソース

use super::value::{deserialize_command, deserialize_env, deserialize_ports};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// フォーメーション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    pub name: String,
}

/// 稼働中のインスタンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    #[serde(default)]
    pub formation: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub release: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_command")]
    pub command: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_env")]
    pub env: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "deserialize_ports")]
    pub ports: Vec<String>,
}

impl Instance {
    /// 表示用にフィールドを文字列で取り出す
    pub fn field(&self, name: &str) -> String {
        match name {
            "name" => self.name.clone(),
            "formation" => self.formation.clone(),
            "service" => self.service.clone(),
            "release" => self.release.clone(),
            "state" => self.state.clone(),
            "assigned_to" => self.assigned_to.clone().unwrap_or_default(),
            "image" => self.image.clone().unwrap_or_default(),
            "command" => self
                .command
                .as_ref()
                .map(|args| args.join(" "))
                .unwrap_or_default(),
            "ports" => self.ports.join(","),
            _ => String::new(),
        }
    }
}

/// ルーターに登録されたルート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    pub path: String,
    pub target: String,
}

impl Route {
    pub fn field(&self, name: &str) -> String {
        match name {
            "name" => self.name.clone(),
            "domain" => self.domain.clone().unwrap_or_default(),
            "path" => self.path.clone(),
            "target" => self.target.clone(),
            _ => String::new(),
        }
    }
}
