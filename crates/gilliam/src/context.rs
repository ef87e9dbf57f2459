//! コマンド実行時のコンテキスト
//!
//! コマンドラインの指定、`.gilliam/` のポインタファイル、ステージ設定を
//! まとめたもので、コマンドごとに1度だけ作って参照で渡します。

use anyhow::{Context as _, anyhow};
use gilliam_api::{RouterClient, SchedulerClient, ServiceRegistryClient};
use gilliam_config::{AuthCache, FormationConfig, StageConfig};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Context {
    pub project_root: Option<PathBuf>,
    pub stage: Option<String>,
    pub formation: Option<String>,
    pub quiet: bool,
}

impl Context {
    /// カレントディレクトリからプロジェクトを探して構築
    pub fn discover(
        stage: Option<String>,
        formation: Option<String>,
        quiet: bool,
    ) -> anyhow::Result<Self> {
        let project_root = match gilliam_core::find_project_root() {
            Ok(root) => Some(root),
            Err(gilliam_core::CoreError::ProjectRootNotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        Self::resolve(project_root, stage, formation, quiet)
    }

    /// 明示的な指定を優先し、なければ `.gilliam/` の値を使う
    pub fn resolve(
        project_root: Option<PathBuf>,
        stage: Option<String>,
        formation: Option<String>,
        quiet: bool,
    ) -> anyhow::Result<Self> {
        let pointers = project_root.as_deref().map(FormationConfig::new);

        let stage = match (stage, &pointers) {
            (Some(stage), _) => Some(stage),
            (None, Some(pointers)) => pointers.stage()?,
            (None, None) => None,
        };
        let formation = match (formation, &pointers) {
            (Some(formation), _) => Some(formation),
            (None, Some(pointers)) => pointers.formation()?,
            (None, None) => None,
        };

        tracing::debug!(?project_root, ?stage, ?formation, "Resolved context");
        Ok(Self {
            project_root,
            stage,
            formation,
            quiet,
        })
    }

    pub fn require_formation(&self) -> anyhow::Result<&str> {
        self.formation
            .as_deref()
            .ok_or_else(|| anyhow!("no formation; specify using -f"))
    }

    pub fn require_project_root(&self) -> anyhow::Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow!("cannot find a gilliam.yml file"))
    }

    /// `.gilliam/` のポインタファイル（プロジェクト外ならカレントディレクトリ）
    pub fn formation_config(&self) -> anyhow::Result<FormationConfig> {
        let root = match &self.project_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        Ok(FormationConfig::new(root))
    }

    /// 現在のステージ設定（ステージ未指定なら環境変数のみから）
    pub fn stage_config(&self) -> anyhow::Result<StageConfig> {
        match &self.stage {
            Some(stage) => {
                let path = gilliam_config::stage_path(stage)?;
                StageConfig::load(&path).with_context(|| format!("{stage}: cannot load stage"))
            }
            None => Ok(StageConfig::from_env()?),
        }
    }

    pub fn auth_cache(&self) -> anyhow::Result<AuthCache> {
        Ok(AuthCache::load(&gilliam_config::auth_path()?)?)
    }

    pub fn scheduler(&self, stage: &StageConfig) -> anyhow::Result<SchedulerClient> {
        Ok(SchedulerClient::new(stage.scheduler_url())?)
    }

    pub fn router(&self, stage: &StageConfig) -> anyhow::Result<RouterClient> {
        Ok(RouterClient::new(stage.router_url())?)
    }

    pub fn service_registry(&self, stage: &StageConfig) -> ServiceRegistryClient {
        ServiceRegistryClient::new(stage.service_registry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_pointer_files_fill_in_missing_flags() {
        let dir = tempdir().unwrap();
        let pointers = FormationConfig::new(dir.path());
        pointers.set_formation("shop").unwrap();
        pointers.set_stage("prod").unwrap();

        let ctx = Context::resolve(Some(dir.path().to_path_buf()), None, None, false).unwrap();
        assert_eq!(ctx.formation.as_deref(), Some("shop"));
        assert_eq!(ctx.stage.as_deref(), Some("prod"));
    }

    #[test]
    fn test_flags_win_over_pointer_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".gilliam")).unwrap();
        fs::write(dir.path().join(".gilliam/formation"), "shop").unwrap();

        let ctx = Context::resolve(
            Some(dir.path().to_path_buf()),
            Some("dev".into()),
            Some("blog".into()),
            true,
        )
        .unwrap();
        assert_eq!(ctx.require_formation().unwrap(), "blog");
        assert_eq!(ctx.stage.as_deref(), Some("dev"));
    }

    #[test]
    fn test_outside_project() {
        let ctx = Context::resolve(None, None, None, false).unwrap();
        assert!(ctx.require_formation().is_err());
        assert_eq!(
            ctx.require_project_root().unwrap_err().to_string(),
            "cannot find a gilliam.yml file"
        );
    }
}
