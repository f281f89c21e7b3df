use cloudflow_core::{Event, Observer, TracingObserver};
use indicatif::{ProgressBar, ProgressStyle};

/// 待機中のスピナー
///
/// Observer として Cloud に渡すと、試行ごとの状況をメッセージに反映する。
#[derive(Clone)]
pub struct WaitProgress {
    progress_bar: ProgressBar,
}

impl WaitProgress {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        pb.set_message(message.to_string());

        Self { progress_bar: pb }
    }

    pub fn finish_success(&self, message: &str) {
        self.progress_bar.finish_with_message(format!("✓ {}", message));
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar
            .finish_with_message(format!("✗ {}", error));
    }
}

impl Observer for WaitProgress {
    fn notify(&self, event: &Event) {
        match event {
            Event::AttemptFailed {
                attempt,
                max_attempts,
                reason,
                ..
            } => {
                self.progress_bar
                    .set_message(format!("[{}/{}] {}", attempt, max_attempts, reason));
            }
            Event::ResizeStep { instance_id, step } => {
                self.progress_bar
                    .set_message(format!("{}: {}", instance_id, step));
            }
            _ => {}
        }
        // スピナー表示中もログは残す
        self.progress_bar.suspend(|| TracingObserver.notify(event));
    }
}
