//! The external collaborator seam.
//!
//! Everything the bot knows about the page goes through [`PageAutomation`]:
//! best-effort text reads, ordered element queries, clicks, and the game's
//! own affordability flag. Browser wiring lives behind an implementation of
//! this trait; the workspace ships [`crate::SimulatedPage`] for headless
//! runs and tests.

use bot_core::PageError;

/// Opaque reference to one element found on the page.
///
/// The handle carries the element's DOM id so child reads can compose
/// scoped selectors (`#product3 .price`) without another query primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementHandle {
    dom_id: String,
}

impl ElementHandle {
    pub fn new(dom_id: impl Into<String>) -> Self {
        Self {
            dom_id: dom_id.into(),
        }
    }

    pub fn dom_id(&self) -> &str {
        &self.dom_id
    }

    /// Selector addressing the element itself.
    pub fn selector(&self) -> String {
        format!("#{}", self.dom_id)
    }

    /// Selector addressing a child of the element, e.g. `.price`.
    pub fn child_selector(&self, child: &str) -> String {
        format!("#{} {}", self.dom_id, child)
    }
}

/// Minimal capability set the bot requires from the page.
///
/// Recoverable failures (`NotFound`, `Stale`) mean "skip this item for the
/// current tick"; only `SessionLost` ends the loop.
pub trait PageAutomation {
    /// Read the text content behind a selector.
    fn read_text(&self, selector: &str) -> Result<String, PageError>;

    /// All elements matching a selector, in document order. May be empty.
    fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError>;

    /// Click an element. `Ok(false)` means the click did not register.
    fn click(&mut self, handle: &ElementHandle) -> Result<bool, PageError>;

    /// The UI-level enabled/disabled state the game maintains itself.
    fn is_affordable(&self, handle: &ElementHandle) -> Result<bool, PageError>;
}
