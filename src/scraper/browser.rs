//! Browser automation using chromiumoxide.
//!
//! Every operation opens its own browser process and tab through a
//! [`SessionLauncher`] and closes it before returning. There is no shared
//! browser between requests.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::stream::{self, Stream, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::ScrapeError;

/// One browser process plus one page.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate and wait for the network to go idle, bounded by the
    /// navigation timeout.
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Serialized HTML of whatever the page currently holds.
    async fn content(&mut self) -> Result<String, ScrapeError>;

    /// Release the page and the browser process. Never fails.
    async fn close(self: Box<Self>);
}

/// Opens a fresh [`PageSession`] per operation.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError>;
}

/// Launches headless Chrome for each session.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: ScraperConfig,
}

impl ChromeLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        let chrome_path = find_chrome_executable(&self.config)?;
        let profile_dir = new_profile_dir()?;
        debug!(
            "Launching browser: {} (profile {})",
            chrome_path.display(),
            profile_dir.path().display()
        );

        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile_dir.path())
            .no_sandbox()
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--no-zygote")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .window_size(1920, 1080)
            .build()
            .map_err(|e| ScrapeError::launch(format!("invalid browser config: {}", e)))?;

        let (mut browser, mut handler) = ChromeBrowser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::launch(e.to_string()))?;

        // Spawn handler task - must keep running for browser to work
        let handle = tokio::spawn(async move {
            loop {
                match handler.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => continue, // Don't break on errors
                    None => break,
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                shutdown_browser(&mut browser).await;
                handle.abort();
                return Err(ScrapeError::launch(format!("failed to open page: {}", e)));
            }
        };

        Ok(Box::new(ChromeSession {
            browser,
            handle,
            page,
            navigation_timeout: self.config.navigation_timeout(),
            max_inflight: self.config.max_inflight_requests,
            idle_window: self.config.idle_window(),
            profile_dir,
        }))
    }
}

/// How long a closing browser gets to exit before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// A launched Chrome process with a single tab.
pub struct ChromeSession {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
    page: Page,
    navigation_timeout: Duration,
    max_inflight: usize,
    idle_window: Duration,
    /// Declared last so it is removed after the browser is gone
    profile_dir: TempDir,
}

/// Private Chrome profile for one session. Chrome runs a single process
/// per profile directory, so concurrent sessions must never share one.
fn new_profile_dir() -> Result<TempDir, ScrapeError> {
    tempfile::Builder::new()
        .prefix("keiba-chrome-")
        .tempdir()
        .map_err(|e| ScrapeError::launch(format!("failed to create profile dir: {}", e)))
}

/// Ask the browser to close, killing it if the close command fails or the
/// process outlives [`EXIT_GRACE`].
async fn shutdown_browser(browser: &mut ChromeBrowser) {
    let closed = match browser.close().await {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to close browser: {}", e);
            false
        }
    };

    if !closed || !exited_within(EXIT_GRACE, browser.wait()).await {
        warn!("Browser still running, killing it");
        if let Some(Err(e)) = browser.kill().await {
            warn!("Failed to kill browser: {}", e);
        }
        if !exited_within(EXIT_GRACE, browser.wait()).await {
            warn!("Browser did not exit after kill");
        }
    }
}

async fn exited_within<F: std::future::Future>(grace: Duration, exit: F) -> bool {
    timeout(grace, exit).await.is_ok()
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let page = &self.page;
        let max_inflight = self.max_inflight;
        let idle_window = self.idle_window;

        let load = async move {
            // Listeners go in before goto so early requests are counted
            let started = page.event_listener::<EventRequestWillBeSent>().await?;
            let finished = page.event_listener::<EventLoadingFinished>().await?;
            let failed = page.event_listener::<EventLoadingFailed>().await?;

            let activity = stream::select(
                started.map(|e| NetworkActivity::Started(e.request_id.inner().clone())),
                stream::select(
                    finished.map(|e| NetworkActivity::Settled(e.request_id.inner().clone())),
                    failed.map(|e| NetworkActivity::Settled(e.request_id.inner().clone())),
                ),
            );

            page.goto(url).await?;
            wait_for_network_idle(Box::pin(activity), max_inflight, idle_window).await;
            Ok::<(), CdpError>(())
        };

        match timeout(self.navigation_timeout, load).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::navigation(format!("{}: {}", url, e))),
            Err(_) => Err(ScrapeError::navigation(format!(
                "{}: timed out after {:?}",
                url, self.navigation_timeout
            ))),
        }
    }

    async fn content(&mut self) -> Result<String, ScrapeError> {
        self.page
            .content()
            .await
            .map_err(|e| ScrapeError::navigation(format!("failed to read page content: {}", e)))
    }

    async fn close(mut self: Box<Self>) {
        if let Err(e) = self.page.clone().close().await {
            debug!("Failed to close page: {}", e);
        }
        shutdown_browser(&mut self.browser).await;
        self.handle.abort();
        debug!("Released profile {}", self.profile_dir.path().display());
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // chromiumoxide kills the child process when the Browser drops
        self.handle.abort();
    }
}

/// Request lifecycle events observed during navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkActivity {
    Started(String),
    /// Finished or failed
    Settled(String),
}

/// Wait until at most `max_inflight` requests stay outstanding for a full
/// `idle_window`. Returns early if the event stream ends.
pub async fn wait_for_network_idle<S>(mut events: S, max_inflight: usize, idle_window: Duration)
where
    S: Stream<Item = NetworkActivity> + Unpin,
{
    let mut inflight: HashSet<String> = HashSet::new();

    loop {
        let next = if inflight.len() <= max_inflight {
            match timeout(idle_window, events.next()).await {
                Ok(next) => next,
                Err(_) => return,
            }
        } else {
            events.next().await
        };

        match next {
            Some(NetworkActivity::Started(id)) => {
                inflight.insert(id);
            }
            Some(NetworkActivity::Settled(id)) => {
                inflight.remove(&id);
            }
            None => return,
        }
    }
}

/// Locate a Chrome executable.
///
/// Order: explicit `chrome_path`, newest build in the puppeteer cache,
/// then the platform default.
pub fn find_chrome_executable(config: &ScraperConfig) -> Result<PathBuf, ScrapeError> {
    if let Some(ref explicit) = config.chrome_path {
        let path = PathBuf::from(explicit);
        if !path.exists() {
            return Err(ScrapeError::launch(format!(
                "Chrome executable not found at: {}",
                path.display()
            )));
        }
        return Ok(path);
    }

    let cache_dir = Path::new(&config.chrome_cache_dir);
    if cache_dir.is_dir() {
        return find_in_puppeteer_cache(cache_dir);
    }

    let default = if cfg!(target_os = "macos") {
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
    } else if cfg!(target_os = "windows") {
        "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe"
    } else {
        "google-chrome"
    };
    Ok(PathBuf::from(default))
}

fn find_in_puppeteer_cache(cache_dir: &Path) -> Result<PathBuf, ScrapeError> {
    let entries = std::fs::read_dir(cache_dir).map_err(|e| {
        ScrapeError::launch(format!("cannot read {}: {}", cache_dir.display(), e))
    })?;

    let mut versions: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    versions.sort();

    let Some(latest) = versions.last() else {
        return Err(ScrapeError::launch(format!(
            "No Chrome versions found inside: {}",
            cache_dir.display()
        )));
    };

    let exe = cache_dir.join(latest).join("chrome-linux64").join("chrome");
    if !exe.exists() {
        return Err(ScrapeError::launch(format!(
            "Chrome executable not found at: {}",
            exe.display()
        )));
    }
    Ok(exe)
}
