use crate::filter_record::{Facet, FacetKind, FilterRecord};

/// Which filter form the viewport gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Chip bar above the results, secondary facets in a drop-down panel.
    Inline,
    /// Full-screen form, opened on demand.
    Modal,
}

impl Presentation {
    pub fn for_width(width: u16, breakpoint: u16) -> Self {
        if width >= breakpoint {
            Presentation::Inline
        } else {
            Presentation::Modal
        }
    }
}

/// Everything a filter form may show. Both presentations render from this
/// and nothing else, so they cannot drift apart.
pub struct FormView<'a> {
    pub record: &'a FilterRecord,
    pub focus: Option<Facet>,
    pub active_count: usize,
    pub is_loading: bool,
    pub has_results: bool,
    pub suggestions: Vec<&'a str>,
    pub suggestion_cursor: Option<usize>,
    pub home_types: &'a [String],
    pub home_type_cursor: usize,
    /// Partial text of the focused number facet, if it is being typed into.
    pub draft: Option<&'a str>,
    pub spinner_frame: usize,
}

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

impl FormView<'_> {
    pub fn submit_label(&self) -> String {
        if self.is_loading {
            format!("{} Searching…", SPINNER[self.spinner_frame % SPINNER.len()])
        } else if self.has_results {
            "New location".to_string()
        } else {
            "Search".to_string()
        }
    }

    pub fn is_focused(&self, facet: Facet) -> bool {
        self.focus == Some(facet)
    }

    fn focused_draft(&self, facet: Facet) -> Option<&str> {
        self.draft.filter(|_| self.is_focused(facet))
    }

    /// Text under the edit cursor: the draft while one is being typed.
    pub fn input_text(&self, facet: Facet) -> String {
        match self.focused_draft(facet) {
            Some(draft) => draft.to_string(),
            None => self.record.display_value(facet),
        }
    }

    /// Display text for `facet`, showing the draft while it is being typed.
    pub fn value_text(&self, facet: Facet) -> String {
        match self.focused_draft(facet) {
            Some(draft) if !draft.is_empty() => with_unit(facet, draft.to_string()),
            _ => value_text(self.record, facet),
        }
    }

    /// Whether the secondary-facet panel should be open.
    pub fn more_open(&self) -> bool {
        self.focus.is_some_and(|f| !f.is_primary())
    }

    pub fn more_label(&self) -> String {
        let secondary = Facet::ALL
            .into_iter()
            .filter(|f| !f.is_primary() && self.record.is_set(*f))
            .count();
        if secondary == 0 {
            "More filters".to_string()
        } else {
            format!("More filters ({secondary})")
        }
    }

    /// The option the home-type cursor sits on.
    pub fn home_type_option(&self) -> Option<&str> {
        self.home_types.get(self.home_type_cursor).map(String::as_str)
    }
}

/// Display text for one facet. Both forms call this for every value they show.
pub fn value_text(record: &FilterRecord, facet: Facet) -> String {
    match facet.kind() {
        FacetKind::Flag => {
            if record.flag(facet) {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            }
        }
        FacetKind::Set if record.home_type.is_empty() => "Any".to_string(),
        FacetKind::Text | FacetKind::Number if !record.is_set(facet) => "-".to_string(),
        FacetKind::Text | FacetKind::Number | FacetKind::Set | FacetKind::Sort => {
            with_unit(facet, record.display_value(facet))
        }
    }
}

fn with_unit(facet: Facet, raw: String) -> String {
    match facet {
        Facet::MinPrice | Facet::MaxPrice | Facet::HoaMax if !raw.starts_with('$') => {
            format!("${raw}")
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_record::SortKey;

    fn view(record: &FilterRecord) -> FormView<'_> {
        FormView {
            record,
            focus: None,
            active_count: record.active_filter_count(),
            is_loading: false,
            has_results: false,
            suggestions: Vec::new(),
            suggestion_cursor: None,
            home_types: &[],
            home_type_cursor: 0,
            draft: None,
            spinner_frame: 0,
        }
    }

    #[test]
    fn switches_exactly_at_breakpoint() {
        assert_eq!(Presentation::for_width(99, 100), Presentation::Modal);
        assert_eq!(Presentation::for_width(100, 100), Presentation::Inline);
        assert_eq!(Presentation::for_width(180, 100), Presentation::Inline);
    }

    #[test]
    fn submit_label_tracks_host_flags() {
        let record = FilterRecord::default();
        let mut v = view(&record);
        assert_eq!(v.submit_label(), "Search");
        v.has_results = true;
        assert_eq!(v.submit_label(), "New location");
        v.is_loading = true;
        assert!(v.submit_label().ends_with("Searching…"));
    }

    #[test]
    fn more_label_counts_secondary_facets_only() {
        let record = FilterRecord {
            min_price: Some(1),
            has_pool: true,
            keywords: Some("deck".to_string()),
            ..FilterRecord::default()
        };
        assert_eq!(view(&record).more_label(), "More filters (2)");
        assert_eq!(view(&FilterRecord::default()).more_label(), "More filters");
    }

    #[test]
    fn more_panel_opens_for_secondary_focus() {
        let record = FilterRecord::default();
        let mut v = view(&record);
        v.focus = Some(Facet::MinPrice);
        assert!(!v.more_open());
        v.focus = Some(Facet::HasGarage);
        assert!(v.more_open());
    }

    #[test]
    fn value_text_formats_each_kind() {
        let record = FilterRecord {
            min_price: Some(250_000),
            has_ac: true,
            sort: SortKey::Newest,
            ..FilterRecord::default()
        };
        assert_eq!(value_text(&record, Facet::MinPrice), "$250000");
        assert_eq!(value_text(&record, Facet::MaxPrice), "-");
        assert_eq!(value_text(&record, Facet::HasAc), "[x]");
        assert_eq!(value_text(&record, Facet::HasPool), "[ ]");
        assert_eq!(value_text(&record, Facet::HomeType), "Any");
        assert_eq!(value_text(&record, Facet::Sort), "Newest");
        assert_eq!(value_text(&record, Facet::Location), "-");
    }

    #[test]
    fn draft_shows_only_on_the_focused_facet() {
        let record = FilterRecord {
            baths_min: Some(2.0),
            min_price: Some(300),
            ..FilterRecord::default()
        };
        let mut v = view(&record);
        v.draft = Some("2.");
        assert_eq!(v.value_text(Facet::BathsMin), "2");
        v.focus = Some(Facet::BathsMin);
        assert_eq!(v.value_text(Facet::BathsMin), "2.");
        assert_eq!(v.value_text(Facet::MinPrice), "$300");

        v.focus = Some(Facet::MinPrice);
        v.draft = Some("300,");
        assert_eq!(v.value_text(Facet::MinPrice), "$300,");
        assert_eq!(v.input_text(Facet::MinPrice), "300,");
        assert_eq!(v.input_text(Facet::BathsMin), "2");
    }
}
