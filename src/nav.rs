//! Location and history: route, `page` query parameter, hash fragment.
//!
//! Paths: `/`, `/works`, `/projects`, `/history`, `/project/<idx>`.

use std::fmt;

use crate::query::parse_page_param;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Works,
    Projects,
    History,
    /// Project by index into the home projects list.
    ProjectDetail(usize),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Works => "/works".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::History => "/history".to_string(),
            Route::ProjectDetail(idx) => format!("/project/{idx}"),
        }
    }

    /// Unknown paths fall back to home.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim().trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            "/works" => Route::Works,
            "/projects" => Route::Projects,
            "/history" => Route::History,
            other => other
                .strip_prefix("/project/")
                .and_then(|idx| idx.parse::<usize>().ok())
                .map(Route::ProjectDetail)
                .unwrap_or_default(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Works => "Works",
            Route::Projects => "Projects",
            Route::History => "History",
            Route::ProjectDetail(_) => "Project",
        }
    }

    /// Top-level tabs, in display order.
    pub const TABS: [Route; 4] = [Route::Home, Route::Works, Route::Projects, Route::History];

    pub fn is_paged(&self) -> bool {
        matches!(self, Route::Works | Route::Projects)
    }
}

/// A parsed location.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub route: Route,
    /// 1-based; 1 means the parameter is absent.
    pub page: u32,
    pub hash: Option<String>,
}

impl Location {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            page: 1,
            hash: None,
        }
    }

    /// Parse `path[?query][#hash]`. Invalid or missing `page` is 1.
    pub fn parse(raw: &str) -> Self {
        let (rest, hash) = match raw.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash)),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let page_param = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(k, _)| *k == "page")
                .map(|(_, v)| v)
        });

        Self {
            route: Route::from_path(path),
            page: parse_page_param(page_param),
            hash: hash.filter(|h| !h.is_empty()).map(str::to_string),
        }
    }

    /// Page 1 removes the parameter.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn with_hash(mut self, hash: Option<&str>) -> Self {
        self.hash = hash.map(str::to_string);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.route.path())?;
        if self.page > 1 {
            write!(f, "?page={}", self.page)?;
        }
        if let Some(hash) = &self.hash {
            write!(f, "#{hash}")?;
        }
        Ok(())
    }
}

/// Browser-style session history.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    pub fn current(&self) -> &Location {
        // Never empty: `back` keeps the first entry.
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// New entry. Pushing the current location again is a no-op.
    pub fn push(&mut self, location: Location) {
        if self.current() != &location {
            self.entries.push(location);
        }
    }

    /// Replace the current entry.
    pub fn replace(&mut self, location: Location) {
        if let Some(last) = self.entries.last_mut() {
            *last = location;
        }
    }

    /// Replace only the hash of the current entry.
    pub fn replace_hash(&mut self, hash: Option<&str>) {
        let next = self.current().clone().with_hash(hash);
        self.replace(next);
    }

    /// Change the page of the current entry with a new history entry.
    pub fn push_page(&mut self, page: u32) {
        let mut next = self.current().clone();
        next.set_page(page);
        self.push(next);
    }

    /// Go back one entry. False at the first entry.
    pub fn back(&mut self) -> bool {
        if self.entries.len() > 1 {
            self.entries.pop();
            true
        } else {
            false
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Location::default_home())
    }
}

impl Location {
    pub fn default_home() -> Self {
        Self::new(Route::Home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_location() {
        let loc = Location::parse("/works?page=2#year-2022");
        assert_eq!(loc.route, Route::Works);
        assert_eq!(loc.page, 2);
        assert_eq!(loc.hash.as_deref(), Some("year-2022"));
        assert_eq!(loc.to_string(), "/works?page=2#year-2022");
    }

    #[test]
    fn test_invalid_page_is_one() {
        assert_eq!(Location::parse("/projects?page=abc").page, 1);
        assert_eq!(Location::parse("/projects?page=-4").page, 1);
        assert_eq!(Location::parse("/projects").page, 1);
    }

    #[test]
    fn test_page_one_drops_parameter() {
        let mut loc = Location::parse("/works?page=3");
        loc.set_page(1);
        assert_eq!(loc.to_string(), "/works");
    }

    #[test]
    fn test_project_detail_route() {
        assert_eq!(Route::from_path("/project/3"), Route::ProjectDetail(3));
        assert_eq!(Route::from_path("/project/x"), Route::Home);
        assert_eq!(Route::ProjectDetail(3).path(), "/project/3");
    }

    #[test]
    fn test_replace_hash_adds_no_entry() {
        let mut history = History::new(Location::parse("/history"));
        history.replace_hash(Some("year-2021"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().to_string(), "/history#year-2021");
    }

    #[test]
    fn test_push_and_back() {
        let mut history = History::default();
        history.push(Location::new(Route::Works));
        history.push_page(2);
        assert_eq!(history.len(), 3);
        assert!(history.back());
        assert_eq!(history.current().route, Route::Works);
        assert!(history.back());
        assert!(!history.back());
        assert_eq!(history.current().route, Route::Home);
    }
}
