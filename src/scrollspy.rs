//! Year-grouped timeline with a scroll-spy index.
//!
//! Sections are laid out top to bottom in row units. The active section is
//! recomputed on frame ticks only; scroll events just mark the spy dirty.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::Record;
use crate::nav::History;

/// Anchor id of a year section.
pub fn section_id(year: i32) -> String {
    format!("year-{year}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearGroup {
    pub year: i32,
    pub records: Vec<Record>,
}

impl YearGroup {
    pub fn id(&self) -> String {
        section_id(self.year)
    }
}

/// Group by derived year. Years newest first; records keep list order.
pub fn group_by_year(records: &[Record]) -> Vec<YearGroup> {
    let mut by_year: BTreeMap<i32, Vec<Record>> = BTreeMap::new();
    for record in records {
        by_year.entry(record.year()).or_default().push(record.clone());
    }
    by_year
        .into_iter()
        .rev()
        .map(|(year, records)| YearGroup { year, records })
        .collect()
}

/// A rendered section and its top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionAnchor {
    pub id: String,
    pub top: u32,
    pub height: u32,
}

/// Stack groups vertically: a header row, `rows_per_record` per record, and
/// a blank row after each section.
pub fn layout_sections(groups: &[YearGroup], rows_per_record: u32) -> Vec<SectionAnchor> {
    let mut top = 0u32;
    groups
        .iter()
        .map(|g| {
            let height = 1 + g.records.len() as u32 * rows_per_record + 1;
            let anchor = SectionAnchor {
                id: g.id(),
                top,
                height,
            };
            top += height;
            anchor
        })
        .collect()
}

/// Offset above a section top when scrolling to it, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpyOffsets {
    pub wide: u32,
    pub narrow: u32,
    /// Viewports narrower than this use `narrow`.
    pub narrow_breakpoint: u16,
}

impl Default for SpyOffsets {
    fn default() -> Self {
        Self {
            wide: 3,
            narrow: 2,
            narrow_breakpoint: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollSpy {
    offsets: SpyOffsets,
    viewport_width: u16,
    sections: Vec<SectionAnchor>,
    data_ready: bool,
    scroll_y: u32,
    target_y: Option<u32>,
    dirty: bool,
    active: Option<usize>,
    pending_hash: Option<String>,
    recomputes: u64,
}

impl ScrollSpy {
    pub fn new(offsets: SpyOffsets) -> Self {
        Self {
            offsets,
            viewport_width: u16::MAX,
            sections: Vec::new(),
            data_ready: false,
            scroll_y: 0,
            target_y: None,
            dirty: false,
            active: None,
            pending_hash: None,
            recomputes: 0,
        }
    }

    pub fn offset(&self) -> u32 {
        if self.viewport_width < self.offsets.narrow_breakpoint {
            self.offsets.narrow
        } else {
            self.offsets.wide
        }
    }

    pub fn set_viewport_width(&mut self, width: u16) {
        if self.viewport_width != width {
            self.viewport_width = width;
            self.dirty = true;
        }
    }

    pub fn sections(&self) -> &[SectionAnchor] {
        &self.sections
    }

    pub fn scroll_y(&self) -> u32 {
        self.scroll_y
    }

    pub fn is_animating(&self) -> bool {
        self.target_y.is_some()
    }

    /// Times the active section was recomputed.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active
            .and_then(|i| self.sections.get(i))
            .map(|s| s.id.as_str())
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active_id() == Some(id)
    }

    /// Install the rendered sections. A hash remembered before data arrived
    /// is honoured now; returns the scroll target if one was started.
    pub fn set_sections(&mut self, sections: Vec<SectionAnchor>) -> Option<u32> {
        self.sections = sections;
        self.data_ready = true;
        self.active = (!self.sections.is_empty()).then_some(0);
        self.dirty = true;
        let pending = self.pending_hash.take()?;
        self.scroll_to_section(&pending)
    }

    /// Data is being reloaded; anchors are gone until `set_sections`.
    pub fn clear(&mut self) {
        self.sections.clear();
        self.data_ready = false;
        self.active = None;
        self.target_y = None;
    }

    /// Raw scroll input. Recomputation waits for the next frame.
    pub fn on_scroll(&mut self, y: u32) {
        self.target_y = None;
        self.scroll_y = y.min(self.max_scroll());
        self.dirty = true;
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let y = (i64::from(self.scroll_y) + delta).max(0);
        self.on_scroll(u32::try_from(y).unwrap_or(u32::MAX));
    }

    fn max_scroll(&self) -> u32 {
        self.sections.last().map_or(0, |s| s.top + s.height)
    }

    /// Frame tick: advance any smooth scroll and recompute at most once.
    /// Returns whether the active section changed.
    pub fn on_frame(&mut self) -> bool {
        if let Some(target) = self.target_y {
            let distance = target.abs_diff(self.scroll_y);
            let step = (distance / 3).max(1).min(distance);
            self.scroll_y = if target > self.scroll_y {
                self.scroll_y + step
            } else {
                self.scroll_y - step
            };
            if self.scroll_y == target {
                self.target_y = None;
            }
            self.dirty = true;
        }

        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.recomputes += 1;
        let before = self.active;
        self.active = active_index(&self.sections, self.scroll_y + self.offset());
        before != self.active
    }

    /// Anchor click: smooth scroll to the section and replace the hash
    /// without adding a history entry.
    pub fn click_anchor(&mut self, id: &str, history: &mut History) -> Option<u32> {
        let target = self.scroll_to_section(id)?;
        history.replace_hash(Some(id));
        Some(target)
    }

    /// Location hash changed (or initial load). Before data is ready the hash
    /// is remembered; unknown hashes are ignored.
    pub fn apply_hash(&mut self, hash: Option<&str>) -> Option<u32> {
        let hash = hash?.trim_start_matches('#');
        if hash.is_empty() {
            return None;
        }
        if !self.data_ready {
            self.pending_hash = Some(hash.to_string());
            return None;
        }
        self.scroll_to_section(hash)
    }

    pub fn pending_hash(&self) -> Option<&str> {
        self.pending_hash.as_deref()
    }

    fn scroll_to_section(&mut self, id: &str) -> Option<u32> {
        let section = self.sections.iter().find(|s| s.id == id)?;
        let target = section.top.saturating_sub(self.offset());
        debug!(section = id, target, "scrolling to section");
        self.target_y = (target != self.scroll_y).then_some(target);
        self.dirty = true;
        Some(target)
    }
}

/// Last section whose top is at or above `line`, else the first section.
fn active_index(sections: &[SectionAnchor], line: u32) -> Option<usize> {
    if sections.is_empty() {
        return None;
    }
    Some(
        sections
            .iter()
            .rposition(|s| s.top <= line)
            .unwrap_or(0),
    )
}
