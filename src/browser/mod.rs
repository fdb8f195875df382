//! Abstract browser-automation capability.
//!
//! The portal adapter only ever talks to this trait. The chromiumoxide-backed
//! driver lives behind the `driver` feature so tests can script a DOM without
//! launching a real browser.

#[cfg(feature = "driver")]
mod cdp;

#[cfg(feature = "driver")]
pub use cdp::CdpBrowser;

use anyhow::Result;
use async_trait::async_trait;

/// One logged-in browser session, exclusively owned by its caller.
///
/// Lookup semantics are deliberately split: [`Browser::find`] treats absence
/// as an error, [`Browser::try_find`] treats it as a legitimate answer, and
/// [`Browser::find_all`] returns however many elements currently match.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle to a live DOM element.
    type Element: Clone + Send + Sync;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// Find exactly one element; absence is an error.
    async fn find(&self, selector: &str) -> Result<Self::Element>;

    /// Find one element that may legitimately be absent.
    async fn try_find(&self, selector: &str) -> Result<Option<Self::Element>>;

    /// All elements currently matching `selector`, possibly none.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Find exactly one element inside `parent`.
    async fn find_in(&self, parent: &Self::Element, selector: &str) -> Result<Self::Element>;

    /// All elements inside `parent` matching `selector`.
    async fn find_all_in(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>>;

    /// Computed style property value, e.g. `background-image`.
    async fn style_property(&self, element: &Self::Element, property: &str) -> Result<String>;

    async fn text(&self, element: &Self::Element) -> Result<String>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<()>;

    /// Press Enter with the element focused, submitting its form.
    async fn press_enter(&self, element: &Self::Element) -> Result<()>;

    async fn current_url(&self) -> Result<String>;
}
