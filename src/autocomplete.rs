/// Location suggestion dropdown.
///
/// Holds the known locations and the matches for the last query it was
/// given. The query itself is never stored: the caller passes the current
/// location value on every refresh, so the filter record stays the only
/// copy of what the user typed.
pub struct LocationAutocomplete {
    items: Vec<String>,
    /// Indices into `items` that match the last query.
    filtered_indices: Vec<usize>,
    /// Highlighted position within `filtered_indices`, if the user moved into the list.
    cursor: Option<usize>,
}

pub const MAX_SUGGESTIONS: usize = 6;

impl LocationAutocomplete {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            filtered_indices: Vec::new(),
            cursor: None,
        }
    }

    /// Merge `items` into the known locations, keeping them sorted and unique.
    pub fn extend_items(&mut self, items: impl IntoIterator<Item = String>) {
        self.items.extend(items);
        self.items.sort_by_key(|item| item.to_lowercase());
        self.items.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        self.filtered_indices.clear();
        self.cursor = None;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Recompute suggestions for `query`. Exact matches are hidden since
    /// there is nothing left to complete.
    pub fn refresh(&mut self, query: &str) {
        let query = query.trim().to_lowercase();
        self.cursor = None;
        if query.is_empty() {
            self.filtered_indices.clear();
            return;
        }
        self.filtered_indices = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                let lower = item.to_lowercase();
                lower != query && lower.contains(&query)
            })
            .map(|(i, _)| i)
            .take(MAX_SUGGESTIONS)
            .collect();
    }

    pub fn next(&mut self) {
        if self.filtered_indices.is_empty() {
            return;
        }
        let last = self.filtered_indices.len() - 1;
        self.cursor = Some(self.cursor.map_or(0, |c| (c + 1).min(last)));
    }

    /// Moving up past the first suggestion leaves the list.
    pub fn previous(&mut self) {
        self.cursor = match self.cursor {
            Some(0) | None => None,
            Some(c) => Some(c - 1),
        };
    }

    pub fn close(&mut self) {
        self.filtered_indices.clear();
        self.cursor = None;
    }

    pub fn suggestions(&self) -> Vec<&str> {
        self.filtered_indices
            .iter()
            .map(|&i| self.items[i].as_str())
            .collect()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The resolved location string under the cursor.
    pub fn highlighted(&self) -> Option<&str> {
        self.cursor
            .and_then(|c| self.filtered_indices.get(c))
            .map(|&i| self.items[i].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vermont() -> LocationAutocomplete {
        let mut ac = LocationAutocomplete::new();
        ac.extend_items(
            ["Burlington, VT", "South Burlington, VT", "Stowe, VT", "Essex, VT"]
                .map(String::from),
        );
        ac
    }

    #[test]
    fn matches_case_insensitive_substrings() {
        let mut ac = vermont();
        ac.refresh("burl");
        assert_eq!(ac.suggestions(), vec!["Burlington, VT", "South Burlington, VT"]);
        assert_eq!(ac.highlighted(), None);
    }

    #[test]
    fn empty_query_has_no_suggestions() {
        let mut ac = vermont();
        ac.refresh("   ");
        assert!(ac.suggestions().is_empty());
    }

    #[test]
    fn exact_match_is_hidden() {
        let mut ac = vermont();
        ac.refresh("stowe, vt");
        assert!(ac.suggestions().is_empty());
    }

    #[test]
    fn cursor_moves_and_clamps() {
        let mut ac = vermont();
        ac.refresh("vt");
        ac.next();
        assert_eq!(ac.highlighted(), Some("Burlington, VT"));
        for _ in 0..10 {
            ac.next();
        }
        assert_eq!(ac.cursor(), Some(3));
        ac.previous();
        ac.previous();
        ac.previous();
        ac.previous();
        assert_eq!(ac.highlighted(), None);
    }

    #[test]
    fn extend_dedups_ignoring_case() {
        let mut ac = vermont();
        ac.extend_items(["burlington, vt".to_string(), "Barre, VT".to_string()]);
        assert_eq!(ac.len(), 5);
    }

    #[test]
    fn refresh_resets_cursor() {
        let mut ac = vermont();
        ac.refresh("vt");
        ac.next();
        ac.refresh("es");
        assert_eq!(ac.cursor(), None);
        assert_eq!(ac.suggestions(), vec!["Essex, VT"]);
    }
}
