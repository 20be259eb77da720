//! Presentation adapter - puts engine output on the page.
//!
//! The page has one output region and one nav region. ASCII art, replies, and
//! idle messages each replace the output region; nav links replace the nav
//! region.

mod ascii;

pub use ascii::*;

use html_escape::encode_text;
use parking_lot::Mutex;

/// Where engine output goes.
pub trait Surface: Send + Sync {
    fn show_ascii(&self, art: &str);

    fn show_reply(&self, text: &str);

    fn show_idle(&self, text: &str);

    /// Make a freshly discovered nav slot visible.
    fn reveal(&self, path: &str, label: &str);

    fn navigate(&self, target: &str, new_context: bool);

    /// Replace the nav region.
    fn render_nav(&self, fragment: &str);

    /// Reload the view after a reset.
    fn reload(&self);
}

pub fn ascii_fragment(art: &str) -> String {
    format!("<pre>{}</pre>", encode_text(art))
}

pub fn reply_fragment(text: &str) -> String {
    format!("<p>{}</p>", encode_text(text))
}

pub fn idle_fragment(text: &str) -> String {
    format!("<p class=\"idle\">{}</p>", encode_text(text))
}

/// Snapshot of an [`HtmlSurface`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    /// Current contents of the output region.
    pub output: String,

    /// Current contents of the nav region.
    pub nav: String,

    /// Paths revealed since the last reload, in order.
    pub revealed: Vec<String>,

    /// Last same-context navigation target.
    pub location: Option<String>,

    /// URLs opened in new contexts, in order.
    pub opened: Vec<String>,

    pub reloads: u32,
}

/// A surface that keeps the page as HTML fragments.
#[derive(Debug, Default)]
pub struct HtmlSurface {
    view: Mutex<PageView>,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> PageView {
        self.view.lock().clone()
    }

    pub fn output(&self) -> String {
        self.view.lock().output.clone()
    }
}

impl Surface for HtmlSurface {
    fn show_ascii(&self, art: &str) {
        self.view.lock().output = ascii_fragment(art);
    }

    fn show_reply(&self, text: &str) {
        self.view.lock().output = reply_fragment(text);
    }

    fn show_idle(&self, text: &str) {
        self.view.lock().output = idle_fragment(text);
    }

    fn reveal(&self, path: &str, _label: &str) {
        let mut view = self.view.lock();
        view.output.clear();
        view.revealed.push(path.to_string());
    }

    fn navigate(&self, target: &str, new_context: bool) {
        let mut view = self.view.lock();
        if new_context {
            view.opened.push(target.to_string());
        } else {
            view.location = Some(target.to_string());
        }
    }

    fn render_nav(&self, fragment: &str) {
        self.view.lock().nav = fragment.to_string();
    }

    fn reload(&self) {
        let mut view = self.view.lock();
        let reloads = view.reloads + 1;
        *view = PageView {
            reloads,
            ..PageView::default()
        };
    }
}
