//! Gilliam API クライアント
//!
//! プラットフォームの各サービスへの薄い非同期クライアント:
//!
//! - [`SchedulerClient`]: フォーメーション・リリース・インスタンス
//! - [`BuilderClient`]: ソースアーカイブからのイメージビルド
//! - [`ExecutorClient`]: リモートプロセスとイメージのプッシュ
//! - [`RouterClient`]: HTTP ルート
//! - [`ServiceRegistryClient`]: インスタンスの検索
//! - [`DockerAuth`]: レジストリ認証情報の確認
//!
//! リリース処理から使う操作はトレイト（[`Scheduler`]、[`Builder`]、
//! [`Executor`]、[`BuildWorkers`]、[`RegistryAuth`]）の背後にあり、
//! メモリ上の実装に差し替えられます。

pub mod builder;
pub mod docker;
pub mod error;
pub mod executor;
pub mod http;
pub mod registry;
pub mod router;
pub mod scheduler;

pub use builder::{Builder, BuilderClient};
pub use docker::{DEFAULT_REGISTRY, DockerAuth, RegistryAuth, registry_from_repository, verify_registry};
pub use error::{ApiError, Result};
pub use executor::{Executor, ExecutorClient, ProcessHandle, PushEvent, RunRequest};
pub use registry::{BuildWorker, BuildWorkers, EXECUTOR_FORMATION, ServiceEndpoint, ServiceRegistryClient};
pub use router::RouterClient;
pub use scheduler::{Scheduler, SchedulerClient, SpawnRequest};
