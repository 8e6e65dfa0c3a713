//! Tab focus trap as a pure function.

use super::host::FocusId;

/// Keys the dialog listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKey {
    Escape,
    Tab,
    BackTab,
    Enter,
    Other,
}

/// Focus target after Tab (`backwards == false`) or Shift+Tab within
/// `focusables` (document order, enabled only).
///
/// Wraps last → first and first → last. Focus outside the list lands on the
/// first (or last, going backwards). `None` when there is nothing to focus.
pub fn next_focus(
    focusables: &[FocusId],
    current: Option<&FocusId>,
    backwards: bool,
) -> Option<FocusId> {
    let len = focusables.len();
    if len == 0 {
        return None;
    }

    let pos = current.and_then(|c| focusables.iter().position(|f| f == c));
    let next = match (pos, backwards) {
        (None, false) => 0,
        (None, true) => len - 1,
        (Some(i), false) => (i + 1) % len,
        (Some(i), true) => (i + len - 1) % len,
    };
    focusables.get(next).cloned()
}
