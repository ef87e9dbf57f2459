//! サービスの種別と検出
//!
//! `gilliam.yml` の各サービスは次のどちらかとしてビルドされます:
//!
//! - カスタム: ソースツリーをリモートのビルダーでイメージ化する
//! - ビルド済み: 組み込みテーブルにある固定イメージを使う
//!
//! 種別の検出は [`DETECTION_ORDER`] の順に試します。

use crate::custom::CustomService;
use crate::error::{BuildError, Result};
use gilliam_api::{BuildWorkers, RegistryAuth};
use gilliam_config::AuthCache;
use gilliam_core::{ServiceDefinition, ServiceDescriptor};
use std::collections::BTreeMap;
use std::path::Path;

/// ビルドに必要な環境
pub struct BuildOptions<'a> {
    pub project_root: &'a Path,
    pub formation: &'a str,
    /// ステージのリポジトリ（例: `registry.example.com/acme`）
    pub repository: &'a str,
    pub workers: &'a dyn BuildWorkers,
    pub registry_auth: &'a dyn RegistryAuth,
    pub auth_cache: &'a AuthCache,
    /// ビルドしたイメージをプッシュするか
    pub push_images: bool,
}

/// 組み込みのビルド済みイメージ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrebuiltImage {
    pub name: &'static str,
    pub image: &'static str,
    pub ports: &'static [&'static str],
}

pub const PREBUILT_IMAGES: &[PrebuiltImage] = &[PrebuiltImage {
    name: "etcd",
    image: "gilliam/etcd",
    ports: &["4001", "7001"],
}];

/// ビルド済みイメージのサービス（ネットワークも認証も不要）
#[derive(Debug, Clone)]
pub struct PrebuiltService {
    pub name: String,
    pub image: PrebuiltImage,
    env: BTreeMap<String, String>,
}

impl PrebuiltService {
    pub fn describe(&self) -> ServiceDescriptor {
        ServiceDescriptor::new(
            self.image.image,
            None,
            self.image.ports.iter().map(|p| p.to_string()).collect(),
        )
        .with_env(self.env.clone())
    }
}

#[derive(Debug)]
pub enum Service {
    Custom(CustomService),
    Prebuilt(PrebuiltService),
}

type Constructor = fn(&str, &ServiceDefinition) -> Option<Service>;

/// 登録済みのサービス種別（名前 → コンストラクタ）
pub const VARIANTS: &[(&str, Constructor)] = &[("custom", custom_variant), ("etcd", prebuilt_variant)];

fn custom_variant(name: &str, definition: &ServiceDefinition) -> Option<Service> {
    Some(Service::Custom(CustomService::new(name, definition.clone())))
}

fn prebuilt_variant(name: &str, definition: &ServiceDefinition) -> Option<Service> {
    let kind = variant_name(name, definition);
    PREBUILT_IMAGES
        .iter()
        .find(|image| image.name == kind)
        .map(|image| {
            Service::Prebuilt(PrebuiltService {
                name: name.to_string(),
                image: *image,
                env: definition.env.clone(),
            })
        })
}

/// プレビルド種別名: `type` があればそれ、なければ先頭の `_` を除いたサービス名
fn variant_name<'a>(name: &'a str, definition: &'a ServiceDefinition) -> &'a str {
    definition
        .kind
        .as_deref()
        .unwrap_or_else(|| name.strip_prefix('_').unwrap_or(name))
}

fn lookup(kind: &str) -> Option<Constructor> {
    VARIANTS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, constructor)| *constructor)
}

/// 種別検出のルール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionRule {
    /// `type` フィールドで明示
    ExplicitType,
    /// サービス名（先頭の `_` を1つ除く）が種別名と一致
    ServiceName,
    /// `script` があればカスタム
    Script,
}

pub const DETECTION_ORDER: &[DetectionRule] = &[
    DetectionRule::ExplicitType,
    DetectionRule::ServiceName,
    DetectionRule::Script,
];

/// サービス定義から種別を検出して構築
pub fn detect(name: &str, definition: &ServiceDefinition) -> Result<Service> {
    for rule in DETECTION_ORDER {
        let constructor = match rule {
            DetectionRule::ExplicitType => match definition.kind.as_deref() {
                Some(kind) => Some(lookup(kind).ok_or_else(|| BuildError::UnknownVariant {
                    service: name.to_string(),
                    kind: kind.to_string(),
                })?),
                None => None,
            },
            DetectionRule::ServiceName => lookup(name.strip_prefix('_').unwrap_or(name)),
            DetectionRule::Script => definition.script.is_some().then(|| lookup("custom")).flatten(),
        };

        if let Some(service) = constructor.and_then(|construct| construct(name, definition)) {
            tracing::debug!(service = name, rule = ?rule, "Detected service type");
            return Ok(service);
        }
    }

    Err(BuildError::UnknownServiceType {
        service: name.to_string(),
    })
}

/// マニフェストの全サービスを構築
pub fn create_services(
    definitions: &BTreeMap<String, ServiceDefinition>,
) -> Result<BTreeMap<String, Service>> {
    definitions
        .iter()
        .map(|(name, definition)| Ok((name.clone(), detect(name, definition)?)))
        .collect()
}

impl Service {
    pub fn name(&self) -> &str {
        match self {
            Service::Custom(service) => &service.name,
            Service::Prebuilt(service) => &service.name,
        }
    }

    /// サービスをビルドし、リリースに載せる記述子を返す
    pub async fn build(&mut self, options: &BuildOptions<'_>) -> Result<ServiceDescriptor> {
        match self {
            Service::Custom(service) => service.build(options).await,
            Service::Prebuilt(service) => Ok(service.describe()),
        }
    }

    /// ビルド結果を確定する（カスタムサービスならイメージをプッシュ）
    pub async fn commit(&self, options: &BuildOptions<'_>) -> Result<()> {
        match self {
            Service::Custom(service) => service.commit(options).await,
            Service::Prebuilt(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(kind: Option<&str>, script: Option<&str>) -> ServiceDefinition {
        ServiceDefinition {
            kind: kind.map(String::from),
            script: script.map(|s| gilliam_core::CommandSpec::Line(s.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_type_wins() {
        let service = detect("store", &definition(Some("etcd"), Some("./run"))).unwrap();
        match service {
            Service::Prebuilt(prebuilt) => {
                assert_eq!(prebuilt.image.image, "gilliam/etcd");
                assert_eq!(prebuilt.name, "store");
            }
            other => panic!("expected prebuilt, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_explicit_type() {
        assert!(matches!(
            detect("store", &definition(Some("redis"), None)),
            Err(BuildError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn test_service_name_with_underscore() {
        let service = detect("_etcd", &definition(None, None)).unwrap();
        assert!(matches!(service, Service::Prebuilt(_)));
        assert_eq!(service.name(), "_etcd");
    }

    #[test]
    fn test_script_means_custom() {
        let service = detect("web", &definition(None, Some("python app.py"))).unwrap();
        assert!(matches!(service, Service::Custom(_)));
    }

    #[test]
    fn test_undetectable_service() {
        let err = detect("web", &definition(None, None)).unwrap_err();
        assert_eq!(err.to_string(), "cannot detect service type for web");
    }

    #[test]
    fn test_prebuilt_descriptor_carries_env() {
        let mut defn = definition(None, None);
        defn.env.insert("ETCD_NAME".into(), "node0".into());
        let service = detect("etcd", &defn).unwrap();
        let Service::Prebuilt(prebuilt) = service else {
            panic!("expected prebuilt");
        };
        let descriptor = prebuilt.describe();
        assert_eq!(descriptor.ports, vec!["4001", "7001"]);
        assert_eq!(descriptor.env["ETCD_NAME"], "node0");
        assert!(descriptor.command.is_none());
    }
}
