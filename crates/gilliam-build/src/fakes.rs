//! In-memory scheduler, builder, executor and registry used by the tests

use async_trait::async_trait;
use gilliam_api::{
    ApiError, BuildWorker, BuildWorkers, Builder, Executor, PushEvent, RegistryAuth,
    Result as ApiResult, Scheduler,
};
use gilliam_config::Credentials;
use gilliam_core::{Release, ScaleMap, ServiceDescriptor};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub fn release(name: &str, services: &[(&str, ServiceDescriptor)]) -> Release {
    Release {
        name: name.to_string(),
        author: Some("someone".into()),
        message: None,
        services: services
            .iter()
            .map(|(n, d)| (n.to_string(), d.clone()))
            .collect(),
    }
}

pub fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Default)]
pub struct FakeScheduler {
    pub releases: Mutex<Vec<Release>>,
    /// Number of upcoming creates that lose the race to another client
    pub conflicts: Mutex<u32>,
    /// Error returned by every create instead of succeeding
    pub fail_with: Mutex<Option<u16>>,
    pub list_calls: Mutex<u32>,
    pub created: Mutex<Vec<(String, Release)>>,
    pub create_attempts: Mutex<u32>,
    /// Number of steps that report more work before completing
    pub pending_steps: Mutex<u32>,
    pub migrate_calls: Mutex<Vec<(String, String)>>,
    pub scale_calls: Mutex<Vec<ScaleMap>>,
}

impl FakeScheduler {
    pub fn with_releases(releases: Vec<Release>) -> Self {
        Self {
            releases: Mutex::new(releases),
            ..Default::default()
        }
    }

    fn step(&self) -> bool {
        let mut pending = self.pending_steps.lock().unwrap();
        if *pending > 0 {
            *pending -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl Scheduler for FakeScheduler {
    async fn releases(&self, _formation: &str) -> ApiResult<Vec<Release>> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn create_release(&self, formation: &str, release: &Release) -> ApiResult<Release> {
        *self.create_attempts.lock().unwrap() += 1;

        if let Some(status) = *self.fail_with.lock().unwrap() {
            return Err(ApiError::Http {
                status,
                message: "scheduler unavailable".into(),
            });
        }

        let mut conflicts = self.conflicts.lock().unwrap();
        if *conflicts > 0 {
            *conflicts -= 1;
            // another client got there first
            self.releases
                .lock()
                .unwrap()
                .push(self::release(&release.name, &[]));
            return Err(ApiError::Conflict("release exists".into()));
        }

        self.releases.lock().unwrap().push(release.clone());
        self.created
            .lock()
            .unwrap()
            .push((formation.to_string(), release.clone()));
        Ok(release.clone())
    }

    async fn migrate(&self, formation: &str, release: &str) -> ApiResult<bool> {
        self.migrate_calls
            .lock()
            .unwrap()
            .push((formation.to_string(), release.to_string()));
        Ok(self.step())
    }

    async fn scale(&self, _formation: &str, _release: &str, scales: &ScaleMap) -> ApiResult<bool> {
        self.scale_calls.lock().unwrap().push(scales.clone());
        Ok(self.step())
    }
}

/// Shared, ordered record of remote calls
pub type Journal = Arc<Mutex<Vec<String>>>;

pub struct FakeBuilder {
    pub journal: Journal,
    pub exit_code: i64,
}

#[async_trait]
impl Builder for FakeBuilder {
    async fn build(
        &self,
        repository: &str,
        tag: &str,
        context: Vec<u8>,
        log: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> ApiResult<i64> {
        assert!(!context.is_empty());
        self.journal
            .lock()
            .unwrap()
            .push(format!("build {repository}:{tag}"));
        log("Step 1/1 : RUN make\n");
        Ok(self.exit_code)
    }
}

pub struct FakeExecutor {
    pub journal: Journal,
    pub pushed_with: Mutex<Vec<Option<Credentials>>>,
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn push_image(
        &self,
        repository: &str,
        credentials: Option<&Credentials>,
        progress: &mut (dyn for<'a> FnMut(&'a PushEvent) + Send),
    ) -> ApiResult<()> {
        self.journal.lock().unwrap().push(format!("push {repository}"));
        self.pushed_with.lock().unwrap().push(credentials.cloned());
        progress(&PushEvent {
            status: Some("Pushed".into()),
            progress: None,
            error: None,
        });
        Ok(())
    }
}

pub struct FakeWorkers {
    pub journal: Journal,
    pub builder: Arc<FakeBuilder>,
    pub executor: Arc<FakeExecutor>,
}

impl FakeWorkers {
    pub fn new(exit_code: i64) -> Self {
        let journal = Journal::default();
        Self {
            builder: Arc::new(FakeBuilder {
                journal: journal.clone(),
                exit_code,
            }),
            executor: Arc::new(FakeExecutor {
                journal: journal.clone(),
                pushed_with: Mutex::new(Vec::new()),
            }),
            journal,
        }
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildWorkers for FakeWorkers {
    async fn select(&self) -> ApiResult<BuildWorker> {
        self.journal.lock().unwrap().push("select".into());
        Ok(BuildWorker {
            instance: "exec-1".into(),
            builder: self.builder.clone(),
            executor: self.executor.clone(),
        })
    }
}

pub struct FakeRegistryAuth {
    pub anonymous: bool,
    pub accept: bool,
}

#[async_trait]
impl RegistryAuth for FakeRegistryAuth {
    async fn anonymous(&self, _registry: &str) -> ApiResult<bool> {
        Ok(self.anonymous)
    }

    async fn check(&self, _registry: &str, _credentials: &Credentials) -> ApiResult<bool> {
        Ok(self.accept)
    }
}
