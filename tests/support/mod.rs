use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use guichet::browser::Browser;
use guichet::ocr::{digit_from_candidate, DigitRecognizer, RecognitionError};

const PNG_IEND: [u8; 12] = [
    0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Style value embedding a fake PNG whose first byte is `marker`, followed by
/// the IEND terminator and trailing junk the resolver must strip.
pub fn keypad_style(marker: u8) -> String {
    let mut payload = vec![marker];
    payload.extend_from_slice(&PNG_IEND);
    payload.extend_from_slice(b"portal trailing junk");
    format!(
        r#"url("data:image/png;base64,{}")"#,
        STANDARD.encode(payload)
    )
}

/// Recognizer that reads the first byte of the normalized image as the digit.
pub struct FirstByteRecognizer;

#[async_trait]
impl DigitRecognizer for FirstByteRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<Option<u8>, RecognitionError> {
        match image.first() {
            Some(byte) => digit_from_candidate(&(*byte as char).to_string()),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
struct ElementData {
    text: String,
    styles: HashMap<String, String>,
}

#[derive(Default)]
struct State {
    elements: Vec<ElementData>,
    selectors: HashMap<String, Vec<usize>>,
    children: HashMap<(usize, String), Vec<usize>>,
    /// Selector is present for the first N queries, absent afterwards.
    vanish_after: HashMap<String, usize>,
    /// Selector matches nothing for the first N queries.
    appear_after: HashMap<String, usize>,
    queries: HashMap<String, usize>,
    clicks: Vec<usize>,
    typed: Vec<(usize, String)>,
    enter_presses: Vec<usize>,
    visited: Vec<String>,
}

/// Scripted DOM standing in for a live browser session.
///
/// Clones share state, so tests can keep a handle for assertions after the
/// portal adapter has taken ownership of its copy.
#[derive(Clone, Default)]
pub struct MockBrowser {
    state: Arc<Mutex<State>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, selector: &str, data: ElementData) -> usize {
        let mut state = self.state.lock().unwrap();
        let id = state.elements.len();
        state.elements.push(data);
        state
            .selectors
            .entry(selector.to_string())
            .or_default()
            .push(id);
        id
    }

    pub fn element(&self, selector: &str) -> usize {
        self.insert(selector, ElementData::default())
    }

    pub fn styled_element(&self, selector: &str, property: &str, value: &str) -> usize {
        let mut styles = HashMap::new();
        styles.insert(property.to_string(), value.to_string());
        self.insert(
            selector,
            ElementData {
                text: String::new(),
                styles,
            },
        )
    }

    /// Child element scoped under `parent`, returned by `find_in` /
    /// `find_all_in` only.
    pub fn child(&self, parent: usize, selector: &str, text: &str) -> usize {
        let mut state = self.state.lock().unwrap();
        let id = state.elements.len();
        state.elements.push(ElementData {
            text: text.to_string(),
            styles: HashMap::new(),
        });
        state
            .children
            .entry((parent, selector.to_string()))
            .or_default()
            .push(id);
        id
    }

    pub fn vanish_after(&self, selector: &str, queries: usize) {
        self.state
            .lock()
            .unwrap()
            .vanish_after
            .insert(selector.to_string(), queries);
    }

    pub fn appear_after(&self, selector: &str, queries: usize) {
        self.state
            .lock()
            .unwrap()
            .appear_after
            .insert(selector.to_string(), queries);
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(usize, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn enter_presses(&self) -> Vec<usize> {
        self.state.lock().unwrap().enter_presses.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    fn matches(state: &mut State, selector: &str) -> Vec<usize> {
        let count = state.queries.entry(selector.to_string()).or_insert(0);
        *count += 1;
        let count = *count;

        if let Some(&limit) = state.vanish_after.get(selector) {
            if count > limit {
                return Vec::new();
            }
        }
        if let Some(&limit) = state.appear_after.get(selector) {
            if count <= limit {
                return Vec::new();
            }
        }

        state.selectors.get(selector).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Browser for MockBrowser {
    type Element = usize;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        Self::matches(&mut state, selector)
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Element not found: {selector}"))
    }

    async fn try_find(&self, selector: &str) -> Result<Option<usize>> {
        let mut state = self.state.lock().unwrap();
        Ok(Self::matches(&mut state, selector).first().copied())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<usize>> {
        let mut state = self.state.lock().unwrap();
        Ok(Self::matches(&mut state, selector))
    }

    async fn find_in(&self, parent: &usize, selector: &str) -> Result<usize> {
        let state = self.state.lock().unwrap();
        state
            .children
            .get(&(*parent, selector.to_string()))
            .and_then(|children| children.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Element not found in parent: {selector}"))
    }

    async fn find_all_in(&self, parent: &usize, selector: &str) -> Result<Vec<usize>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .children
            .get(&(*parent, selector.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn style_property(&self, element: &usize, property: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .elements
            .get(*element)
            .and_then(|data| data.styles.get(property))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No style {property} on element {element}"))
    }

    async fn text(&self, element: &usize) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .elements
            .get(*element)
            .map(|data| data.text.clone())
            .ok_or_else(|| anyhow::anyhow!("No such element: {element}"))
    }

    async fn click(&self, element: &usize) -> Result<()> {
        self.state.lock().unwrap().clicks.push(*element);
        Ok(())
    }

    async fn type_text(&self, element: &usize, text: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .typed
            .push((*element, text.to_string()));
        Ok(())
    }

    async fn press_enter(&self, element: &usize) -> Result<()> {
        self.state.lock().unwrap().enter_presses.push(*element);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .visited
            .last()
            .cloned()
            .unwrap_or_else(|| "about:blank".to_string()))
    }
}
