//! プッシュ前の認証チェック

use crate::error::{BuildError, Result};
use gilliam_api::{RegistryAuth, registry_from_repository};
use gilliam_config::{AuthCache, Credentials};

/// `repository` をプッシュできるか確認し、executor に渡す認証情報を返す
///
/// 匿名アクセスが許可されていれば `None`。キャッシュに認証情報がないか、
/// レジストリに拒否された場合は `BuildError::AuthRequired`。
pub async fn check_credentials(
    auth: &dyn RegistryAuth,
    cache: &AuthCache,
    repository: &str,
) -> Result<Option<Credentials>> {
    let registry = registry_from_repository(repository);

    if auth.anonymous(&registry).await? {
        tracing::debug!(%registry, "Registry allows anonymous access");
        return Ok(None);
    }

    let auth_required = || BuildError::AuthRequired {
        registry: registry.clone(),
    };
    let credentials = cache.get(&registry).ok_or_else(auth_required)?;
    if !auth.check(&registry, credentials).await? {
        return Err(auth_required());
    }
    Ok(Some(credentials.clone()))
}
