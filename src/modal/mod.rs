//! Record detail dialog lifecycle.
//!
//! `Closed → Open → Closed`. Opening borrows the UI's shared resources
//! (scroll lock, key listener, focus) through guards held in the open state;
//! closing releases them in order: scroll, listener, focus. Dropping the
//! manager while open runs the same teardown.

pub mod host;
pub mod trap;

pub use host::{FocusId, FocusRing, KeyListeners, ListenerGuard, Overflow, ScrollGuard, ScrollLock, UiHost};
pub use trap::{next_focus, ModalKey};

use tracing::debug;

use crate::model::Record;

const LISTENER_OWNER: &str = "record-dialog";

/// Focusable layout of the dialog body, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogLayout {
    pub focusables: Vec<FocusId>,
    /// Receives initial focus when focusable.
    pub close_control: Option<FocusId>,
    /// Mounted but not focusable (e.g. a link with no target).
    pub disabled: Vec<FocusId>,
}

impl DialogLayout {
    /// Controls for a record: close, then repo / demo links when present.
    pub fn for_record(record: &Record) -> Self {
        let close = FocusId::dialog("close");
        let mut focusables = vec![close.clone()];
        let mut disabled = Vec::new();
        for (part, target) in [("repo", &record.repo), ("demo", &record.demo)] {
            let id = FocusId::dialog(part);
            focusables.push(id.clone());
            if target.as_deref().map_or(true, |t| t.trim().is_empty()) {
                disabled.push(id);
            }
        }
        Self {
            focusables,
            close_control: Some(close),
            disabled,
        }
    }
}

/// Result of a key delivered while open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Closed,
    FocusMoved(FocusId),
    Ignored,
    NotOpen,
}

struct OpenDialog {
    record: Record,
    layout: DialogLayout,
    captured_focus: Option<FocusId>,
    // Drop order follows close order: scroll first, then the listener.
    scroll: ScrollGuard,
    listener: ListenerGuard,
}

pub struct ModalManager {
    host: UiHost,
    open: Option<OpenDialog>,
}

impl ModalManager {
    pub fn new(host: UiHost) -> Self {
        Self { host, open: None }
    }

    pub fn host(&self) -> &UiHost {
        &self.host
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn record(&self) -> Option<&Record> {
        self.open.as_ref().map(|o| &o.record)
    }

    pub fn layout(&self) -> Option<&DialogLayout> {
        self.open.as_ref().map(|o| &o.layout)
    }

    /// Open on `record`. While already open only the content is swapped:
    /// no second scroll lock, no second listener, captured focus kept.
    pub fn open(&mut self, record: Record, layout: DialogLayout) {
        if let Some(open) = self.open.as_mut() {
            debug!(id = %record.id, "dialog content swapped");
            unmount_layout(&self.host.focus, &open.layout);
            mount_layout(&self.host.focus, &layout);
            open.record = record;
            open.layout = layout;
            focus_initial(&self.host.focus, &open.layout);
            return;
        }

        debug!(id = %record.id, "dialog opened");
        let captured_focus = self.host.focus.current();
        let scroll = self.host.scroll.acquire();
        mount_layout(&self.host.focus, &layout);
        focus_initial(&self.host.focus, &layout);
        let listener = self.host.keys.install(LISTENER_OWNER);
        self.open = Some(OpenDialog {
            record,
            layout,
            captured_focus,
            scroll,
            listener,
        });
    }

    /// Close and return the record that was shown.
    pub fn close(&mut self) -> Option<Record> {
        let open = self.open.take()?;
        let OpenDialog {
            record,
            layout,
            captured_focus,
            scroll,
            listener,
        } = open;

        drop(scroll);
        drop(listener);
        unmount_layout(&self.host.focus, &layout);
        if let Some(target) = captured_focus {
            // Gone or disabled: leave focus where it is.
            self.host.focus.focus(&target);
        }
        debug!(id = %record.id, "dialog closed");
        Some(record)
    }

    /// Dispatch a key to the dialog listener.
    pub fn handle_key(&mut self, key: ModalKey) -> KeyOutcome {
        let Some(open) = self.open.as_ref() else {
            return KeyOutcome::NotOpen;
        };
        match key {
            ModalKey::Escape => {
                self.close();
                KeyOutcome::Closed
            }
            ModalKey::Tab | ModalKey::BackTab => {
                let enabled = self.host.focus.enabled_of(&open.layout.focusables);
                let current = self.host.focus.current();
                match next_focus(&enabled, current.as_ref(), key == ModalKey::BackTab) {
                    Some(target) if self.host.focus.focus(&target) => {
                        KeyOutcome::FocusMoved(target)
                    }
                    _ => KeyOutcome::Ignored,
                }
            }
            ModalKey::Enter => {
                let close = open.layout.close_control.as_ref();
                if close.is_some_and(|c| self.host.focus.is_focused(c)) {
                    self.close();
                    KeyOutcome::Closed
                } else {
                    KeyOutcome::Ignored
                }
            }
            ModalKey::Other => KeyOutcome::Ignored,
        }
    }
}

impl Drop for ModalManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ModalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalManager")
            .field("open", &self.record().map(|r| r.id))
            .finish()
    }
}

fn mount_layout(ring: &FocusRing, layout: &DialogLayout) {
    for id in &layout.focusables {
        if layout.disabled.contains(id) {
            ring.mount_disabled(id.clone());
        } else {
            ring.mount(id.clone());
        }
    }
}

fn unmount_layout(ring: &FocusRing, layout: &DialogLayout) {
    for id in &layout.focusables {
        ring.unmount(id);
    }
}

fn focus_initial(ring: &FocusRing, layout: &DialogLayout) {
    let close = layout
        .close_control
        .as_ref()
        .filter(|c| ring.is_focusable(c));
    let target = close
        .cloned()
        .or_else(|| ring.enabled_of(&layout.focusables).into_iter().next());
    match target {
        Some(t) => {
            ring.focus(&t);
        }
        None => ring.blur(),
    }
}
