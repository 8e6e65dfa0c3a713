use std::fmt;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Work category (closed set for work-history records)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Category {
    Bugfix,
    Datafix,
    Feature,
    Ops,
    Policy,
    Maintenance,
    /// Anything outside the closed set (project categories are free text).
    #[default]
    Other,
}

impl Category {
    /// Filter chips in display order.
    pub const ALL: [Category; 6] = [
        Self::Bugfix,
        Self::Datafix,
        Self::Feature,
        Self::Ops,
        Self::Policy,
        Self::Maintenance,
    ];

    /// Lower-case value as stored in the `category` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bugfix => "bugfix",
            Self::Datafix => "datafix",
            Self::Feature => "feature",
            Self::Ops => "ops",
            Self::Policy => "policy",
            Self::Maintenance => "maintenance",
            Self::Other => "other",
        }
    }

    /// Parse leniently. Unknown values map to `Other`, never an error.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "bugfix" => Self::Bugfix,
            "datafix" => Self::Datafix,
            "feature" => Self::Feature,
            "ops" => Self::Ops,
            "policy" => Self::Policy,
            "maintenance" => Self::Maintenance,
            _ => Self::Other,
        }
    }

    /// Palette key for badges. `k-gray` for anything unrecognised.
    pub fn style_key(self) -> &'static str {
        match self {
            Self::Bugfix => "k-red",
            Self::Datafix => "k-amber",
            Self::Feature => "k-cyan",
            Self::Ops => "k-violet",
            Self::Policy => "k-emerald",
            Self::Maintenance => "k-blue",
            Self::Other => "k-gray",
        }
    }

    /// Accent colour as `#rrggbb`, same palette as [`Category::style_key`].
    pub fn accent_hex(self) -> &'static str {
        match self {
            Self::Bugfix => "#ef4444",
            Self::Datafix => "#f59e0b",
            Self::Feature => "#06b6d4",
            Self::Ops => "#8b5cf6",
            Self::Policy => "#10b981",
            Self::Maintenance => "#3b82f6",
            Self::Other => "#6b7280",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Bugfix => "🐞",
            Self::Datafix => "🧮",
            Self::Feature => "✨",
            Self::Ops => "⚙",
            Self::Policy => "📜",
            Self::Maintenance => "🧰",
            Self::Other => "🔹",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Category::from_str_loose(&s))
    }
}

// ---------------------------------------------------------------------------
// Sort mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortMode {
    /// Identifier descending (newest first).
    #[default]
    Recent,
    /// Title ascending.
    Title,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            Self::Recent => Self::Title,
            Self::Title => Self::Recent,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recent => "Recent",
            Self::Title => "Title",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "name" => Self::Title,
            _ => Self::Recent,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tables in the record store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Projects,
    Works,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Self::Projects => "portfolio_projects",
            Self::Works => "portfolio_works",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Projects => "Projects",
            Self::Works => "Work Experience",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
