//! Chrome DevTools Protocol driver for the [`Browser`] capability.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tracing::debug;

use super::Browser;

/// Browser session backed by a locally launched Chrome/Chromium.
///
/// Owns the CDP handler task for the lifetime of the session; the task is
/// aborted when the session is dropped.
pub struct CdpBrowser {
    _browser: chromiumoxide::Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl CdpBrowser {
    /// Launch a headful browser and open a blank page.
    ///
    /// Headful on purpose: the MFA approval is completed by a human, and the
    /// portal is less hostile to a visible browser.
    pub async fn launch() -> Result<Self> {
        let chrome_path = find_chrome()
            .context("Chrome/Chromium not found. Please install Chrome or Chromium.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .with_head()
            .viewport(None)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = chromiumoxide::Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open a page")?;

        Ok(Self {
            _browser: browser,
            page,
            handler_task,
        })
    }
}

impl Drop for CdpBrowser {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl Browser for CdpBrowser {
    type Element = Arc<Element>;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Self::Element> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found: {selector}"))?;
        Ok(Arc::new(element))
    }

    async fn try_find(&self, selector: &str) -> Result<Option<Self::Element>> {
        // The protocol does not distinguish "no such element" from other
        // lookup failures, so any failure reads as absence here.
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(Arc::new(element))),
            Err(err) => {
                debug!(selector, error = %err, "optional lookup came back empty");
                Ok(None)
            }
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>> {
        let elements = self.page.find_elements(selector).await.unwrap_or_default();
        Ok(elements.into_iter().map(Arc::new).collect())
    }

    async fn find_in(&self, parent: &Self::Element, selector: &str) -> Result<Self::Element> {
        let element = parent
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found in parent: {selector}"))?;
        Ok(Arc::new(element))
    }

    async fn find_all_in(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>> {
        let elements = parent.find_elements(selector).await.unwrap_or_default();
        Ok(elements.into_iter().map(Arc::new).collect())
    }

    async fn style_property(&self, element: &Self::Element, property: &str) -> Result<String> {
        let call = element
            .call_js_fn(
                format!(
                    "function() {{ return getComputedStyle(this).getPropertyValue({property:?}); }}"
                ),
                false,
            )
            .await
            .with_context(|| format!("Failed to read computed style: {property}"))?;

        match call.result.value {
            Some(serde_json::Value::String(value)) => Ok(value),
            other => anyhow::bail!("Unexpected computed style value for {property}: {other:?}"),
        }
    }

    async fn text(&self, element: &Self::Element) -> Result<String> {
        let text = element
            .inner_text()
            .await
            .context("Failed to read element text")?;
        Ok(text.unwrap_or_default())
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        element.click().await.context("Failed to click element")?;
        Ok(())
    }

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<()> {
        element
            .type_str(text)
            .await
            .context("Failed to type into element")?;
        Ok(())
    }

    async fn press_enter(&self, element: &Self::Element) -> Result<()> {
        element
            .press_key("Enter")
            .await
            .context("Failed to press Enter")?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await.context("Failed to read page URL")?;
        Ok(url.unwrap_or_default())
    }
}

/// Find a Chrome/Chromium executable.
fn find_chrome() -> Option<String> {
    for binary in ["google-chrome", "chromium"] {
        if let Ok(output) = std::process::Command::new("which").arg(binary).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    candidates
        .iter()
        .find(|candidate| std::path::Path::new(candidate).exists())
        .map(|candidate| candidate.to_string())
}
