//! カスタム（ソースからビルドする）サービス

use crate::auth::check_credentials;
use crate::context::ContextBuilder;
use crate::error::{BuildError, Result};
use crate::progress::PushProgress;
use crate::service::BuildOptions;
use crate::tag::compute_tag;
use crate::tree::SourceTree;
use gilliam_api::{ApiError, BuildWorker, PushEvent};
use gilliam_config::Credentials;
use gilliam_core::{ServiceDefinition, ServiceDescriptor};

/// ビルドログの各行に付ける接頭辞
pub const LOG_PREFIX: &str = " | ";

/// チャンク単位で届くビルドログを行単位に組み直す
pub struct LogRelay<F: FnMut(&str)> {
    prefix: &'static str,
    pending: String,
    emit: F,
}

impl<F: FnMut(&str)> LogRelay<F> {
    pub fn new(prefix: &'static str, emit: F) -> Self {
        Self {
            prefix,
            pending: String::new(),
            emit,
        }
    }

    pub fn write(&mut self, data: &str) {
        self.pending.push_str(data);
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            (self.emit)(&format!("{}{}", self.prefix, line));
        }
    }

    /// 改行で終わらなかった最後の行を出力
    pub fn flush(&mut self) {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            (self.emit)(&format!("{}{}", self.prefix, line));
        }
    }
}

/// ビルド後、プッシュまで保持する状態
#[derive(Debug)]
struct BuiltImage {
    worker: BuildWorker,
    repository: String,
    credentials: Option<Credentials>,
}

#[derive(Debug)]
pub struct CustomService {
    pub name: String,
    definition: ServiceDefinition,
    built: Option<BuiltImage>,
}

impl CustomService {
    pub fn new(name: &str, definition: ServiceDefinition) -> Self {
        Self {
            name: name.to_string(),
            definition,
            built: None,
        }
    }

    /// イメージのリポジトリ: `{ステージのリポジトリ}/{フォーメーション}-{サービス}`
    pub fn repository(&self, options: &BuildOptions<'_>) -> String {
        format!("{}/{}-{}", options.repository, options.formation, self.name)
    }

    pub async fn build(&mut self, options: &BuildOptions<'_>) -> Result<ServiceDescriptor> {
        let repository = self.repository(options);

        // ビルドを始める前に、プッシュできることを確かめる
        let credentials = if options.push_images {
            check_credentials(options.registry_auth, options.auth_cache, &repository).await?
        } else {
            None
        };

        let worker = options.workers.select().await?;
        let approot = options.project_root.join(self.definition.approot());
        let tree = SourceTree::scan(&approot)?;
        let tag = compute_tag(&tree)?;
        let context = ContextBuilder::create_context(&tree)?;

        tracing::info!("start building service '{}' ...", self.name);
        let mut relay = LogRelay::new(LOG_PREFIX, |line: &str| tracing::info!("{line}"));
        let exit_code = worker
            .builder
            .build(&repository, &tag, context, &mut |chunk: &str| relay.write(chunk))
            .await?;
        relay.flush();

        if exit_code != 0 {
            return Err(BuildError::BuildFailed {
                service: self.name.clone(),
                exit_code,
            });
        }
        tracing::debug!(service = %self.name, %tag, "build successful!");

        let image = format!("{repository}:{tag}");
        self.built = Some(BuiltImage {
            worker,
            repository,
            credentials,
        });

        Ok(ServiceDescriptor::new(
            image,
            self.definition.command_args(),
            self.definition.ports.clone(),
        )
        .with_env(self.definition.env.clone()))
    }

    /// ビルドしたイメージをプッシュ（`push_images` が false なら何もしない）
    pub async fn commit(&self, options: &BuildOptions<'_>) -> Result<()> {
        if !options.push_images {
            return Ok(());
        }
        let Some(built) = &self.built else {
            tracing::debug!(service = %self.name, "nothing built; skipping push");
            return Ok(());
        };

        tracing::info!("start pushing image {}:", built.repository);
        let progress = PushProgress::new(&built.repository);
        let result = built
            .worker
            .executor
            .push_image(&built.repository, built.credentials.as_ref(), &mut |event: &PushEvent| {
                progress.update(event)
            })
            .await;

        match result {
            Ok(()) => {
                let elapsed = progress.finish();
                tracing::info!("done (time {elapsed:.1}s)");
                Ok(())
            }
            Err(ApiError::Remote(message)) => {
                progress.finish_error(&message);
                Err(BuildError::PushFailed {
                    service: self.name.clone(),
                    message,
                })
            }
            Err(e) => {
                progress.finish_error(&e.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_relay_reassembles_lines() {
        let mut lines = Vec::new();
        let mut relay = LogRelay::new(LOG_PREFIX, |line: &str| lines.push(line.to_string()));
        relay.write("Step 1/3 : FROM ");
        relay.write("gilliam/base\nStep 2/3");
        relay.write(" : RUN make\r\n");
        relay.write("tail");
        relay.flush();
        drop(relay);

        assert_eq!(
            lines,
            vec![
                " | Step 1/3 : FROM gilliam/base",
                " | Step 2/3 : RUN make",
                " | tail",
            ]
        );
    }

    #[test]
    fn test_flush_without_pending_is_silent() {
        let mut count = 0;
        let mut relay = LogRelay::new(LOG_PREFIX, |_: &str| count += 1);
        relay.write("done\n");
        relay.flush();
        drop(relay);
        assert_eq!(count, 1);
    }
}
