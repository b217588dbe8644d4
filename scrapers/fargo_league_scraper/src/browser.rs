//! Headless Chrome page fetching.
//!
//! Pages on the league site are rendered client side, so a plain HTTP GET returns an
//! empty shell. [`ChromeFetcher`] drives a real browser and hands back the DOM once the
//! element the extractor needs has appeared.

use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::{future::Future, time::Duration};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;

/// Source of rendered HTML. One value is one browser session.
#[allow(async_fn_in_trait)]
pub trait HtmlFetcher {
    /// Loads `url` and returns its HTML once `ready_selector` matches or the render
    /// timeout runs out, whichever comes first.
    async fn fetch_html(&self, url: &str, ready_selector: &str) -> Result<String>;

    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

pub struct ChromeFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    render_timeout: Duration,
    poll_interval: Duration,
}

impl ChromeFetcher {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let config = Self::browser_config(settings)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        // The handler drives the CDP connection and has to be polled for the whole session
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        info!("Launched headless browser");

        Ok(Self {
            browser,
            handler,
            render_timeout: settings.render_timeout(),
            poll_interval: settings.poll_interval(),
        })
    }

    fn browser_config(settings: &BrowserSettings) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder();

        if !settings.headless {
            builder = builder.with_head();
        }
        if settings.disable_gpu {
            builder = builder.arg("--disable-gpu");
        }
        if settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))
    }

    async fn wait_until_ready(&self, page: &Page, ready_selector: &str) -> bool {
        poll_until(self.render_timeout, self.poll_interval, || async move {
            page.find_element(ready_selector).await.is_ok()
        })
        .await
    }
}

/// Calls `check` every `interval` until it returns true. Returns false if `timeout`
/// elapses first.
pub async fn poll_until<C, Fut>(timeout: Duration, interval: Duration, mut check: C) -> bool
where
    C: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let poll = async {
        while !check().await {
            tokio::time::sleep(interval).await;
        }
    };
    tokio::time::timeout(timeout, poll).await.is_ok()
}

impl HtmlFetcher for ChromeFetcher {
    async fn fetch_html(&self, url: &str, ready_selector: &str) -> Result<String> {
        let page = self
            .browser
            .new_page(url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;

        let started = Instant::now();
        if self.wait_until_ready(&page, ready_selector).await {
            debug!("{} matched after {:?}", ready_selector, started.elapsed());
        } else {
            warn!(
                "{} did not appear on {} within {:?}, using the page as rendered so far",
                ready_selector, url, self.render_timeout
            );
        }

        let content = page.content().await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page {}: {}", url, e);
        }

        content.with_context(|| format!("Failed to read page content for {}", url))
    }

    async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        closed.context("Failed to close browser")?;
        info!("Closed headless browser");
        Ok(())
    }
}
