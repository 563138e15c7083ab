use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

/// Snapshot handed to pollers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub status: CrawlStatus,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Shared, lock-guarded progress state. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle {
    inner: Arc<Mutex<Progress>>,
}

impl ProgressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        // A panicking writer leaves plain counters behind; keep serving them.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Progress {
        self.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().status == CrawlStatus::Running
    }

    /// Move to `running/0/0`. Returns false if a crawl already holds the state.
    pub fn try_begin(&self, message: impl Into<String>) -> bool {
        let mut progress = self.lock();
        if progress.status == CrawlStatus::Running {
            return false;
        }
        *progress = Progress {
            status: CrawlStatus::Running,
            current: 0,
            total: 0,
            message: message.into(),
        };
        true
    }

    pub fn set_total(&self, total: usize) {
        self.lock().total = total;
    }

    pub fn add_total(&self, extra: usize) {
        self.lock().total += extra;
    }

    pub fn advance(&self) {
        self.lock().current += 1;
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.lock().message = message.into();
    }

    pub fn finish(&self, message: impl Into<String>) {
        let mut progress = self.lock();
        progress.status = CrawlStatus::Done;
        progress.message = message.into();
    }

    pub fn fail(&self, message: impl Into<String>) {
        let mut progress = self.lock();
        progress.status = CrawlStatus::Error;
        progress.message = message.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let handle = ProgressHandle::new();
        assert_eq!(handle.snapshot().status, CrawlStatus::Idle);

        assert!(handle.try_begin("starting"));
        assert!(!handle.try_begin("again"));
        handle.set_total(3);
        handle.advance();
        handle.advance();

        let snap = handle.snapshot();
        assert_eq!(snap.status, CrawlStatus::Running);
        assert_eq!((snap.current, snap.total), (2, 3));

        handle.finish("完成");
        assert_eq!(handle.snapshot().status, CrawlStatus::Done);
        assert!(handle.try_begin("next run"));
        assert_eq!(handle.snapshot().current, 0);
    }

    #[test]
    fn test_concurrent_advance() {
        let handle = ProgressHandle::new();
        handle.try_begin("");
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let h = handle.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        h.advance();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(handle.snapshot().current, 800);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CrawlStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
