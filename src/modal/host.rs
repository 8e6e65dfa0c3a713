//! Shared UI resources the modal lifecycle borrows: page scroll policy, the
//! focus ring and the key-listener registry.
//!
//! There is one of each per UI. Handles are cheap clones of the same state;
//! the modal takes them through RAII guards so every exit path gives them
//! back.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::model::RecordId;

// ---------------------------------------------------------------------------
// Scroll lock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Auto,
    Hidden,
}

#[derive(Debug, Default)]
struct ScrollState {
    overflow: Overflow,
    holders: u32,
}

/// Page scroll policy. Locking hides overflow until the guard drops.
#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    state: Rc<RefCell<ScrollState>>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide page scroll, remembering the policy in force.
    pub fn acquire(&self) -> ScrollGuard {
        let mut state = self.state.borrow_mut();
        let prior = state.overflow;
        state.overflow = Overflow::Hidden;
        state.holders += 1;
        ScrollGuard {
            state: Rc::clone(&self.state),
            prior,
        }
    }

    pub fn overflow(&self) -> Overflow {
        self.state.borrow().overflow
    }

    /// Set the policy directly (page layout, not the modal).
    pub fn set_overflow(&self, overflow: Overflow) {
        self.state.borrow_mut().overflow = overflow;
    }

    pub fn is_locked(&self) -> bool {
        self.overflow() == Overflow::Hidden
    }

    /// Guards currently alive.
    pub fn holders(&self) -> u32 {
        self.state.borrow().holders
    }
}

/// Restores the prior overflow policy on drop.
#[must_use = "dropping the guard releases the scroll lock"]
pub struct ScrollGuard {
    state: Rc<RefCell<ScrollState>>,
    prior: Overflow,
}

impl fmt::Debug for ScrollGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollGuard").field("prior", &self.prior).finish()
    }
}

impl Drop for ScrollGuard {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.overflow = self.prior;
        state.holders = state.holders.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Focus ring
// ---------------------------------------------------------------------------

/// Identifier of a focusable element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FocusId(String);

impl FocusId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// A list card.
    pub fn card(id: RecordId) -> Self {
        Self(format!("card-{id}"))
    }

    /// A control inside the detail dialog.
    pub fn dialog(part: &str) -> Self {
        Self(format!("dialog-{part}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FocusId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone)]
struct Focusable {
    id: FocusId,
    disabled: bool,
}

#[derive(Debug, Default)]
struct FocusState {
    mounted: Vec<Focusable>,
    current: Option<FocusId>,
}

/// Mounted focusable elements in document order, plus the focused one.
#[derive(Debug, Clone, Default)]
pub struct FocusRing {
    state: Rc<RefCell<FocusState>>,
}

impl FocusRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount an element at the end of document order (no-op if present).
    pub fn mount(&self, id: FocusId) {
        self.mount_with(id, false);
    }

    pub fn mount_disabled(&self, id: FocusId) {
        self.mount_with(id, true);
    }

    fn mount_with(&self, id: FocusId, disabled: bool) {
        let mut state = self.state.borrow_mut();
        match state.mounted.iter_mut().find(|f| f.id == id) {
            Some(existing) => existing.disabled = disabled,
            None => state.mounted.push(Focusable { id, disabled }),
        }
    }

    /// Unmount an element. Focus on it is lost.
    pub fn unmount(&self, id: &FocusId) {
        let mut state = self.state.borrow_mut();
        state.mounted.retain(|f| &f.id != id);
        if state.current.as_ref() == Some(id) {
            state.current = None;
        }
    }

    /// Unmount every element whose id starts with `prefix`.
    pub fn unmount_prefix(&self, prefix: &str) {
        let mut state = self.state.borrow_mut();
        state.mounted.retain(|f| !f.id.as_str().starts_with(prefix));
        if state
            .current
            .as_ref()
            .is_some_and(|c| c.as_str().starts_with(prefix))
        {
            state.current = None;
        }
    }

    pub fn is_mounted(&self, id: &FocusId) -> bool {
        self.state.borrow().mounted.iter().any(|f| &f.id == id)
    }

    /// Mounted and not disabled.
    pub fn is_focusable(&self, id: &FocusId) -> bool {
        self.state
            .borrow()
            .mounted
            .iter()
            .any(|f| &f.id == id && !f.disabled)
    }

    /// Move focus. Fails (returns false) for unmounted or disabled elements.
    pub fn focus(&self, id: &FocusId) -> bool {
        if !self.is_focusable(id) {
            return false;
        }
        self.state.borrow_mut().current = Some(id.clone());
        true
    }

    pub fn blur(&self) {
        self.state.borrow_mut().current = None;
    }

    pub fn current(&self) -> Option<FocusId> {
        self.state.borrow().current.clone()
    }

    pub fn is_focused(&self, id: &FocusId) -> bool {
        self.state.borrow().current.as_ref() == Some(id)
    }

    /// Focusable ids among `ids`, keeping their order.
    pub fn enabled_of(&self, ids: &[FocusId]) -> Vec<FocusId> {
        ids.iter().filter(|id| self.is_focusable(id)).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Key listeners
// ---------------------------------------------------------------------------

/// Document-level key listeners, by owner name.
#[derive(Debug, Clone, Default)]
pub struct KeyListeners {
    installed: Rc<RefCell<Vec<&'static str>>>,
}

impl KeyListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, owner: &'static str) -> ListenerGuard {
        self.installed.borrow_mut().push(owner);
        ListenerGuard {
            installed: Rc::clone(&self.installed),
            owner,
        }
    }

    pub fn count(&self) -> usize {
        self.installed.borrow().len()
    }

    pub fn is_installed(&self, owner: &str) -> bool {
        self.installed.borrow().iter().any(|o| *o == owner)
    }
}

/// Removes its listener on drop.
#[must_use = "dropping the guard removes the listener"]
pub struct ListenerGuard {
    installed: Rc<RefCell<Vec<&'static str>>>,
    owner: &'static str,
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard").field("owner", &self.owner).finish()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut installed = self.installed.borrow_mut();
        if let Some(pos) = installed.iter().position(|o| *o == self.owner) {
            installed.remove(pos);
        }
    }
}

// ---------------------------------------------------------------------------
// UiHost
// ---------------------------------------------------------------------------

/// The single UI's shared resources.
#[derive(Debug, Clone, Default)]
pub struct UiHost {
    pub scroll: ScrollLock,
    pub focus: FocusRing,
    pub keys: KeyListeners,
}

impl UiHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_guard_restores_prior_policy() {
        let lock = ScrollLock::new();
        assert_eq!(lock.overflow(), Overflow::Auto);
        let guard = lock.acquire();
        assert!(lock.is_locked());
        assert_eq!(lock.holders(), 1);
        drop(guard);
        assert_eq!(lock.overflow(), Overflow::Auto);
        assert_eq!(lock.holders(), 0);
    }

    #[test]
    fn test_scroll_guard_keeps_prior_hidden() {
        let lock = ScrollLock::new();
        lock.set_overflow(Overflow::Hidden);
        drop(lock.acquire());
        assert_eq!(lock.overflow(), Overflow::Hidden);
    }

    #[test]
    fn test_focus_refuses_disabled_and_unmounted() {
        let ring = FocusRing::new();
        ring.mount("a".into());
        ring.mount_disabled("b".into());
        assert!(ring.focus(&"a".into()));
        assert!(!ring.focus(&"b".into()));
        assert!(!ring.focus(&"c".into()));
        assert_eq!(ring.current(), Some("a".into()));
        ring.unmount(&"a".into());
        assert_eq!(ring.current(), None);
    }

    #[test]
    fn test_listener_guard_removes_on_drop() {
        let keys = KeyListeners::new();
        let g = keys.install("modal");
        assert!(keys.is_installed("modal"));
        drop(g);
        assert_eq!(keys.count(), 0);
    }
}
