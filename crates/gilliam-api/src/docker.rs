//! Docker レジストリ名と認証情報の確認

use crate::error::{ApiError, Result};
use async_trait::async_trait;
use gilliam_config::Credentials;
use reqwest::{Client, StatusCode};

/// レジストリホストを含まないリポジトリが使うレジストリ
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

/// `repository` を置くレジストリ名
///
/// 先頭のパス要素に `.` か `:` が含まれていればレジストリとみなします
/// （`registry.example.com/acme`、`localhost:5000/acme`）。
pub fn registry_from_repository(repository: &str) -> String {
    match repository.split_once('/') {
        Some((first, _)) if first.contains('.') || first.contains(':') => first.to_string(),
        None if repository.contains('.') || repository.contains(':') => repository.to_string(),
        _ => DEFAULT_REGISTRY.to_string(),
    }
}

/// `registry` が docker のレジストリ名として有効か確認
pub fn verify_registry(registry: &str) -> Result<()> {
    let invalid = |reason: &str| ApiError::InvalidRegistry {
        registry: registry.to_string(),
        reason: reason.to_string(),
    };

    if registry.starts_with("http://") || registry.starts_with("https://") {
        return Err(invalid("registry must not be a URL"));
    }
    if registry.contains('/') {
        return Err(invalid("registry must not contain '/'"));
    }
    if !(registry.contains('.') || registry.contains(':')) {
        return Err(invalid("registry must contain either '.' or ':'"));
    }
    Ok(())
}

/// レジストリの認証確認
#[async_trait]
pub trait RegistryAuth: Send + Sync {
    /// 匿名アクセスを受け付けるか
    async fn anonymous(&self, registry: &str) -> Result<bool>;

    /// `credentials` が受け付けられるか
    async fn check(&self, registry: &str, credentials: &Credentials) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct DockerAuth {
    client: Client,
    scheme: String,
}

impl Default for DockerAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerAuth {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            scheme: "https".to_string(),
        }
    }

    /// レジストリと平文 HTTP で通信（ローカルのテスト用レジストリ向け）
    pub fn insecure() -> Self {
        Self {
            scheme: "http".to_string(),
            ..Self::new()
        }
    }

    fn users_endpoint(&self, registry: &str) -> Result<String> {
        verify_registry(registry)?;
        Ok(format!("{}://{registry}/v1/users/", self.scheme))
    }
}

#[async_trait]
impl RegistryAuth for DockerAuth {
    async fn anonymous(&self, registry: &str) -> Result<bool> {
        let response = self.client.get(self.users_endpoint(registry)?).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    async fn check(&self, registry: &str, credentials: &Credentials) -> Result<bool> {
        let response = self
            .client
            .get(self.users_endpoint(registry)?)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await?;
        Ok(response.status() == StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_from_repository() {
        assert_eq!(registry_from_repository("acme"), DEFAULT_REGISTRY);
        assert_eq!(registry_from_repository("acme/tools"), DEFAULT_REGISTRY);
        assert_eq!(
            registry_from_repository("registry.example.com/acme"),
            "registry.example.com"
        );
        assert_eq!(registry_from_repository("localhost:5000/acme"), "localhost:5000");
        assert_eq!(registry_from_repository("quay.io"), "quay.io");
    }

    #[test]
    fn test_verify_registry() {
        assert!(verify_registry("index.docker.io").is_ok());
        assert!(verify_registry("localhost:5000").is_ok());
        assert!(verify_registry("https://quay.io").is_err());
        assert!(verify_registry("quay.io/acme").is_err());
        assert!(matches!(
            verify_registry("localhost"),
            Err(ApiError::InvalidRegistry { .. })
        ));
    }
}
