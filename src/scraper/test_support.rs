//! In-memory browser sessions serving fixture pages.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::browser::{PageSession, SessionLauncher};
use crate::error::ScrapeError;

pub const INDEX_URL: &str = "https://race.example.jp/keiba/";

#[derive(Default)]
struct Shared {
    pages: HashMap<String, String>,
    /// Navigation and content both fail
    failing: HashSet<String>,
    /// Navigation times out, content is still readable
    slow: HashSet<String>,
    launch_failure: bool,
    opened: AtomicUsize,
    closed: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

#[derive(Default, Clone)]
pub struct StubLauncher {
    shared: Arc<Shared>,
}

impl StubLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(mut self, f: impl FnOnce(&mut Shared)) -> Self {
        f(Arc::get_mut(&mut self.shared).expect("configure before use"));
        self
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.edit(|s| {
            s.pages.insert(url.to_string(), html.to_string());
        })
    }

    pub fn failing(self, url: &str) -> Self {
        self.edit(|s| {
            s.failing.insert(url.to_string());
        })
    }

    pub fn slow(self, url: &str) -> Self {
        self.edit(|s| {
            s.slow.insert(url.to_string());
        })
    }

    pub fn launch_failure(self) -> Self {
        self.edit(|s| s.launch_failure = true)
    }

    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.shared.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionLauncher for StubLauncher {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        if self.shared.launch_failure {
            return Err(ScrapeError::launch("Chrome executable not found"));
        }
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            shared: self.shared.clone(),
            current: None,
        }))
    }
}

struct StubSession {
    shared: Arc<Shared>,
    current: Option<String>,
}

#[async_trait]
impl PageSession for StubSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.shared.navigations.lock().unwrap().push(url.to_string());
        self.current = Some(url.to_string());

        if self.shared.failing.contains(url) || self.shared.slow.contains(url) {
            return Err(ScrapeError::navigation(format!("{}: timed out after 30s", url)));
        }
        if !self.shared.pages.contains_key(url) {
            return Err(ScrapeError::navigation(format!("{}: net::ERR_NAME_NOT_RESOLVED", url)));
        }
        Ok(())
    }

    async fn content(&mut self) -> Result<String, ScrapeError> {
        let Some(url) = self.current.as_deref() else {
            return Ok("<html><head></head><body></body></html>".to_string());
        };
        if self.shared.failing.contains(url) {
            return Err(ScrapeError::navigation("target closed"));
        }
        Ok(self
            .shared
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><head></head><body></body></html>".to_string()))
    }

    async fn close(self: Box<Self>) {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
    }
}
