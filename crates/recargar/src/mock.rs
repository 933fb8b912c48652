//! Scripted in-memory browser session for tests.
//!
//! Test the code, not the model: every unit and integration test in this
//! crate drives the real workflow against [`MockSession`], a deterministic
//! page model implementing [`BrowserSession`]. The model supports the
//! behaviors the workflow has to survive on the live page: elements that
//! render late, consent controls that only appear after a reload, clicks
//! intercepted by overlays, provider content arriving either in a new
//! window or in a same-page iframe, and references going stale across
//! navigations.

use crate::result::{RecargarError, RecargarResult};
use crate::session::{
    stale, BrowserSession, ElementRef, FrameContext, Locator, ScriptArg, WindowHandle,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Element lookup scope inside the mock page model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Scope {
    /// Top-level document of the main window
    Main,
    /// Inside the iframe with this entry id
    Frame(u64),
    /// Top-level document of a secondary window
    Window(String),
}

/// Side effect of clicking a mock element
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Navigate the current window
    Navigate(String),
    /// Open a new window/tab
    OpenWindow {
        /// Handle of the new window
        handle: String,
        /// URL loaded in it
        url: String,
    },
}

/// Declarative description of one element in the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    text: String,
    displayed: bool,
    enabled: bool,
    attrs: HashMap<String, String>,
    css: HashMap<String, String>,
    present_after: u32,
    requires_refreshes: u32,
    click_failures: u32,
    on_click: Option<ClickEffect>,
    is_frame: bool,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            displayed: true,
            enabled: true,
            attrs: HashMap::new(),
            css: HashMap::new(),
            present_after: 0,
            requires_refreshes: 0,
            click_failures: 0,
            on_click: None,
            is_frame: false,
        }
    }
}

impl MockElement {
    /// A visible, enabled element with no text
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Render the element invisibly
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Make the element non-interactive
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set an HTML attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set a computed CSS value
    #[must_use]
    pub fn with_css(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.css.insert(property.into(), value.into());
        self
    }

    /// Element is absent for the first `n` lookups (asynchronous rendering)
    #[must_use]
    pub fn present_after(mut self, n: u32) -> Self {
        self.present_after = n;
        self
    }

    /// Element is absent until the page has been reloaded `n` times
    #[must_use]
    pub fn requires_refreshes(mut self, n: u32) -> Self {
        self.requires_refreshes = n;
        self
    }

    /// The first `n` clicks fail (overlay interception)
    #[must_use]
    pub fn click_fails(mut self, n: u32) -> Self {
        self.click_failures = n;
        self
    }

    /// Side effect applied when the element is clicked
    #[must_use]
    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = Some(effect);
        self
    }
}

#[derive(Debug)]
struct ElementState {
    entry_id: u64,
    spec: MockElement,
    remaining_present_after: u32,
    remaining_click_failures: u32,
    value: String,
}

#[derive(Debug, Clone)]
struct IssuedRef {
    scope: Scope,
    entry_id: u64,
    generation: u64,
}

/// Deterministic fake browser session
#[derive(Debug)]
pub struct MockSession {
    entries: HashMap<Scope, Vec<(Locator, ElementState)>>,
    issued: HashMap<u64, IssuedRef>,
    next_ref_id: u64,
    next_entry_id: u64,
    generation: u64,
    windows: Vec<WindowHandle>,
    urls: HashMap<String, String>,
    main_window: WindowHandle,
    current_window: WindowHandle,
    context: FrameContext,
    refreshes: u32,
    scripts: Vec<String>,
    quit_called: Arc<AtomicBool>,
}

/// Browsers normalize a bare origin to end with a slash; the mock mirrors
/// that so URL patterns behave as they do against a real session.
fn normalize_url(url: &str) -> String {
    match url.find("://") {
        Some(i) if !url[i + 3..].contains('/') => format!("{url}/"),
        _ => url.to_string(),
    }
}

impl MockSession {
    /// Create a session with one window showing `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let main = WindowHandle::new("window-0");
        let mut urls = HashMap::new();
        urls.insert(main.0.clone(), normalize_url(&url.into()));
        Self {
            entries: HashMap::new(),
            issued: HashMap::new(),
            next_ref_id: 1,
            next_entry_id: 1,
            generation: 0,
            windows: vec![main.clone()],
            urls,
            main_window: main.clone(),
            current_window: main,
            context: FrameContext::Top,
            refreshes: 0,
            scripts: Vec::new(),
            quit_called: Arc::new(AtomicBool::new(false)),
        }
    }

    fn insert(&mut self, scope: Scope, locator: Locator, spec: MockElement) -> u64 {
        let entry_id = self.next_entry_id;
        self.next_entry_id += 1;
        let state = ElementState {
            entry_id,
            remaining_present_after: spec.present_after,
            remaining_click_failures: spec.click_failures,
            value: String::new(),
            spec,
        };
        self.entries.entry(scope).or_default().push((locator, state));
        entry_id
    }

    /// Register an element in the main document
    pub fn add_element(&mut self, locator: Locator, element: MockElement) {
        self.insert(Scope::Main, locator, element);
    }

    /// Register an iframe in the main document, returning its frame id for
    /// scoping elements inside it
    pub fn add_iframe(&mut self, src: impl Into<String>) -> u64 {
        let mut spec = MockElement::new().with_attr("src", src);
        spec.is_frame = true;
        self.insert(Scope::Main, Locator::css("iframe"), spec)
    }

    /// Register an element inside a previously added iframe
    pub fn add_frame_element(&mut self, frame_id: u64, locator: Locator, element: MockElement) {
        self.insert(Scope::Frame(frame_id), locator, element);
    }

    /// Register an element in the document of a secondary window
    pub fn add_window_element(&mut self, handle: &str, locator: Locator, element: MockElement) {
        self.insert(Scope::Window(handle.to_string()), locator, element);
    }

    /// Open an additional window without a triggering click
    pub fn open_window(&mut self, handle: &str, url: impl Into<String>) {
        self.windows.push(WindowHandle::new(handle));
        self.urls.insert(handle.to_string(), url.into());
    }

    /// Number of page reloads performed so far
    #[must_use]
    pub fn refresh_count(&self) -> u32 {
        self.refreshes
    }

    /// Scripts executed so far, in order
    #[must_use]
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Whether `quit` has been called
    #[must_use]
    pub fn quit_called(&self) -> bool {
        self.quit_called.load(Ordering::SeqCst)
    }

    /// Shared flag flipped by `quit`, observable after the session moves
    /// into a guard
    #[must_use]
    pub fn quit_probe(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit_called)
    }

    /// Number of open windows
    #[must_use]
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    fn current_scope(&self) -> Scope {
        if self.current_window != self.main_window {
            // Frames inside secondary windows are not modeled
            Scope::Window(self.current_window.0.clone())
        } else {
            match self.context {
                FrameContext::Top => Scope::Main,
                FrameContext::Frame(id) => Scope::Frame(id),
            }
        }
    }

    fn issue(&mut self, scope: Scope, entry_id: u64, locator: &Locator) -> ElementRef {
        let ref_id = self.next_ref_id;
        self.next_ref_id += 1;
        self.issued.insert(
            ref_id,
            IssuedRef {
                scope,
                entry_id,
                generation: self.generation,
            },
        );
        ElementRef::new(ref_id, locator.to_string())
    }

    fn resolve(&mut self, element: &ElementRef) -> RecargarResult<&mut ElementState> {
        let issued = self
            .issued
            .get(&element.id())
            .cloned()
            .ok_or_else(|| stale(element))?;
        if issued.generation != self.generation || issued.scope != self.current_scope() {
            return Err(stale(element));
        }
        self.entries
            .get_mut(&issued.scope)
            .and_then(|states| {
                states
                    .iter_mut()
                    .map(|(_, state)| state)
                    .find(|state| state.entry_id == issued.entry_id)
            })
            .ok_or_else(|| stale(element))
    }

    fn apply_click_effect(&mut self, effect: ClickEffect) {
        match effect {
            ClickEffect::Navigate(url) => {
                self.urls.insert(self.current_window.0.clone(), url);
                self.generation += 1;
                self.context = FrameContext::Top;
            }
            ClickEffect::OpenWindow { handle, url } => {
                self.open_window(&handle, url);
            }
        }
    }

    fn apply_style_script(&mut self, script: &str, args: &[ScriptArg]) -> RecargarResult<()> {
        let property = if script.contains("style.zIndex") {
            "z-index"
        } else if script.contains("style.position") {
            "position"
        } else if script.contains("style.display") {
            "display"
        } else {
            return Ok(());
        };
        let value = script
            .split('\'')
            .nth(1)
            .unwrap_or_default()
            .to_string();
        if let Some(ScriptArg::Element(element)) = args.first() {
            let element = element.clone();
            let state = self.resolve(&element)?;
            state.spec.css.insert(property.to_string(), value);
        }
        Ok(())
    }
}

impl BrowserSession for MockSession {
    fn navigate(&mut self, url: &str) -> RecargarResult<()> {
        self.urls
            .insert(self.current_window.0.clone(), normalize_url(url));
        self.generation += 1;
        self.context = FrameContext::Top;
        Ok(())
    }

    fn refresh(&mut self) -> RecargarResult<()> {
        self.refreshes += 1;
        self.generation += 1;
        self.context = FrameContext::Top;
        Ok(())
    }

    fn current_url(&mut self) -> RecargarResult<String> {
        self.urls
            .get(&self.current_window.0)
            .cloned()
            .ok_or_else(|| RecargarError::Session {
                message: format!("no url for window {}", self.current_window),
            })
    }

    fn find_element(&mut self, locator: &Locator) -> RecargarResult<ElementRef> {
        let scope = self.current_scope();
        let refreshes = self.refreshes;
        let mut found: Option<u64> = None;
        if let Some(states) = self.entries.get_mut(&scope) {
            for (loc, state) in states.iter_mut() {
                if loc != locator {
                    continue;
                }
                if state.spec.requires_refreshes > refreshes {
                    continue;
                }
                if state.remaining_present_after > 0 {
                    state.remaining_present_after -= 1;
                    break;
                }
                found = Some(state.entry_id);
                break;
            }
        }
        match found {
            Some(entry_id) => Ok(self.issue(scope, entry_id, locator)),
            None => Err(RecargarError::NoSuchElement {
                locator: locator.to_string(),
            }),
        }
    }

    fn find_elements(&mut self, locator: &Locator) -> RecargarResult<Vec<ElementRef>> {
        let scope = self.current_scope();
        let refreshes = self.refreshes;
        let mut found = Vec::new();
        if let Some(states) = self.entries.get_mut(&scope) {
            for (loc, state) in states.iter_mut() {
                if loc != locator || state.spec.requires_refreshes > refreshes {
                    continue;
                }
                if state.remaining_present_after > 0 {
                    state.remaining_present_after -= 1;
                    continue;
                }
                found.push(state.entry_id);
            }
        }
        Ok(found
            .into_iter()
            .map(|entry_id| self.issue(scope.clone(), entry_id, locator))
            .collect())
    }

    fn click(&mut self, element: &ElementRef) -> RecargarResult<()> {
        let state = self.resolve(element)?;
        if state.remaining_click_failures > 0 {
            state.remaining_click_failures -= 1;
            return Err(RecargarError::Session {
                message: format!("click intercepted: {element}"),
            });
        }
        let effect = state.spec.on_click.clone();
        if let Some(effect) = effect {
            self.apply_click_effect(effect);
        }
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> RecargarResult<()> {
        let state = self.resolve(element)?;
        state.value.push_str(text);
        Ok(())
    }

    fn text(&mut self, element: &ElementRef) -> RecargarResult<String> {
        Ok(self.resolve(element)?.spec.text.clone())
    }

    fn is_displayed(&mut self, element: &ElementRef) -> RecargarResult<bool> {
        Ok(self.resolve(element)?.spec.displayed)
    }

    fn is_enabled(&mut self, element: &ElementRef) -> RecargarResult<bool> {
        Ok(self.resolve(element)?.spec.enabled)
    }

    fn css_value(&mut self, element: &ElementRef, property: &str) -> RecargarResult<String> {
        Ok(self
            .resolve(element)?
            .spec
            .css
            .get(property)
            .cloned()
            .unwrap_or_default())
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> RecargarResult<Option<String>> {
        let state = self.resolve(element)?;
        if name == "value" && !state.value.is_empty() {
            return Ok(Some(state.value.clone()));
        }
        Ok(state.spec.attrs.get(name).cloned())
    }

    fn execute_script(&mut self, script: &str, args: &[ScriptArg]) -> RecargarResult<Value> {
        self.scripts.push(script.to_string());
        self.apply_style_script(script, args)?;
        Ok(Value::Null)
    }

    fn switch_to_frame(&mut self, frame: &ElementRef) -> RecargarResult<()> {
        let state = self.resolve(frame)?;
        if !state.spec.is_frame {
            return Err(RecargarError::NoSuchFrame {
                description: frame.to_string(),
            });
        }
        let id = state.entry_id;
        self.context = FrameContext::Frame(id);
        Ok(())
    }

    fn switch_to_window(&mut self, handle: &WindowHandle) -> RecargarResult<()> {
        if !self.windows.contains(handle) {
            return Err(RecargarError::NoSuchWindow {
                handle: handle.to_string(),
            });
        }
        self.current_window = handle.clone();
        self.context = FrameContext::Top;
        Ok(())
    }

    fn switch_to_default(&mut self) -> RecargarResult<()> {
        self.context = FrameContext::Top;
        Ok(())
    }

    fn frame_context(&self) -> FrameContext {
        self.context.clone()
    }

    fn window_handle(&mut self) -> RecargarResult<WindowHandle> {
        Ok(self.current_window.clone())
    }

    fn window_handles(&mut self) -> RecargarResult<Vec<WindowHandle>> {
        Ok(self.windows.clone())
    }

    fn quit(&mut self) -> RecargarResult<()> {
        self.quit_called.store(true, Ordering::SeqCst);
        Ok(())
    }
}
