use gilliam_api::PushEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// イメージプッシュの進捗表示
pub struct PushProgress {
    progress_bar: ProgressBar,
    started: Instant,
}

impl PushProgress {
    pub fn new(repository: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Pushing {}...", repository));

        Self {
            progress_bar: pb,
            started: Instant::now(),
        }
    }

    /// 進捗ドキュメントを表示に反映
    pub fn update(&self, event: &PushEvent) {
        match (&event.status, &event.progress) {
            (Some(status), Some(progress)) => {
                self.progress_bar.set_message(format!("{status} [{progress}]"));
            }
            (Some(status), None) => self.progress_bar.set_message(status.clone()),
            (None, _) => self.progress_bar.println(""),
        }
        self.progress_bar.tick();
    }

    /// 経過秒数を返して表示を終える
    pub fn finish(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.progress_bar
            .finish_with_message(format!("done (time {elapsed:.1}s)"));
        elapsed
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar
            .finish_with_message(format!("Push failed: {}", error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_handles_every_event_shape() {
        let progress = PushProgress::new("acme/demo-web");
        for event in [
            PushEvent {
                status: Some("Pushing".into()),
                progress: Some("[=>   ] 1MB/5MB".into()),
                error: None,
            },
            PushEvent {
                status: Some("Pushed".into()),
                progress: None,
                error: None,
            },
            PushEvent {
                status: None,
                progress: None,
                error: None,
            },
        ] {
            progress.update(&event);
        }
        assert!(progress.finish() >= 0.0);
    }
}
