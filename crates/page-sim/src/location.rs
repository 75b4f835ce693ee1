/// Session history of one browsing context.
///
/// Only the behaviors an SPA router relies on are modeled: entry stack
/// mutation through the History API, traversal, fragment navigation and
/// silent location replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistory {
    entries: Vec<String>,
    index: usize,
}

impl SessionHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    /// Current location (`location.href`).
    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Every entry, oldest first. Never empty.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// `history.pushState`: drops forward entries and appends `url`.
    pub fn push_state(&mut self, url: impl Into<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url.into());
        self.index = self.entries.len() - 1;
    }

    /// `history.replaceState`.
    pub fn replace_state(&mut self, url: impl Into<String>) {
        self.entries[self.index] = url.into();
    }

    /// `history.back()`. Returns false when there is no previous entry.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// `history.forward()`. Returns false when there is no next entry.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// `location.hash = hash`: pushes a new entry with the fragment swapped.
    ///
    /// # Example
    /// ```
    /// use page_sim::SessionHistory;
    ///
    /// let mut history = SessionHistory::new("https://example.test/watch#t=1");
    /// history.set_hash("t=90");
    /// assert_eq!(history.current(), "https://example.test/watch#t=90");
    /// ```
    pub fn set_hash(&mut self, hash: &str) {
        let base = self
            .current()
            .split_once('#')
            .map_or(self.current(), |(base, _)| base);
        let hash = hash.trim_start_matches('#');
        let url = format!("{base}#{hash}");
        self.push_state(url);
    }

    /// Location change that fires no event the page can observe, e.g. a
    /// router writing the URL through a path the History API hook misses.
    pub fn assign_silently(&mut self, url: impl Into<String>) {
        self.replace_state(url);
    }
}
