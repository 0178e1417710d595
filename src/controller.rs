use crate::filter_record::{Facet, FacetValue, FilterRecord};
use std::fmt;

/// The two change channels a controller reports to its host.
pub trait FilterHost {
    /// Fired synchronously after every non-location field mutation.
    fn on_filter_change(&mut self, record: &FilterRecord);
    /// Fired only on an explicit, validated search submission.
    fn on_search(&mut self, record: &FilterRecord);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    MissingLocation,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::MissingLocation => f.write_str("Please enter a location to search"),
        }
    }
}

impl std::error::Error for FilterError {}

/// Owns the filter record and decides which edits reach the host right away.
///
/// Location edits are held back until `submit_search`, since a new location
/// means a new upstream query; every other facet refines live.
pub struct FilterController<H: FilterHost> {
    record: FilterRecord,
    host: H,
}

impl<H: FilterHost> FilterController<H> {
    pub fn new(host: H) -> Self {
        Self::with_record(FilterRecord::default(), host)
    }

    /// Seed the controller from a host-supplied initial record.
    pub fn with_record(record: FilterRecord, host: H) -> Self {
        Self { record, host }
    }

    pub fn record(&self) -> &FilterRecord {
        &self.record
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn set_field(&mut self, facet: Facet, value: impl Into<FacetValue>) {
        self.record = self.record.with_field(facet, value.into());
        if facet.is_deferred() {
            tracing::debug!(location = %self.record.location, "location edited, refinement deferred");
            return;
        }
        tracing::debug!(?facet, "facet changed");
        self.host.on_filter_change(&self.record);
    }

    pub fn toggle_flag(&mut self, facet: Facet) {
        let current = self.record.flag(facet);
        self.set_field(facet, !current);
    }

    /// Add `name` to the home-type set, or remove it if already present.
    pub fn toggle_home_type(&mut self, name: &str) {
        let mut types = self.record.home_type.clone();
        if !types.remove(name) {
            types.insert(name.to_string());
        }
        self.set_field(Facet::HomeType, FacetValue::Set(types));
    }

    pub fn cycle_sort(&mut self, step: isize) {
        let next = self.record.sort.cycled(step);
        self.set_field(Facet::Sort, next);
    }

    /// Hand the current record to the host's search channel.
    ///
    /// Fails without notifying anyone when the location is blank.
    pub fn submit_search(&mut self) -> Result<(), FilterError> {
        if self.record.location.trim().is_empty() {
            tracing::info!("search rejected: missing location");
            return Err(FilterError::MissingLocation);
        }
        tracing::info!(location = %self.record.location, "search submitted");
        self.host.on_search(&self.record);
        Ok(())
    }

    /// Back to the all-default record. The host is not notified.
    pub fn reset(&mut self) {
        self.record = FilterRecord::default();
    }

    /// Replace local state with the host's canonical record, dropping any
    /// unsubmitted edits.
    pub fn adopt_external_record(&mut self, record: FilterRecord) {
        tracing::debug!(location = %record.location, "adopted external record");
        self.record = record;
    }

    pub fn active_filter_count(&self) -> usize {
        self.record.active_filter_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_record::SortKey;

    #[derive(Default)]
    struct RecordingHost {
        changes: Vec<FilterRecord>,
        searches: Vec<FilterRecord>,
    }

    impl FilterHost for RecordingHost {
        fn on_filter_change(&mut self, record: &FilterRecord) {
            self.changes.push(record.clone());
        }

        fn on_search(&mut self, record: &FilterRecord) {
            self.searches.push(record.clone());
        }
    }

    fn controller() -> FilterController<RecordingHost> {
        FilterController::new(RecordingHost::default())
    }

    #[test]
    fn non_location_edits_notify_once_each_with_full_record() {
        let mut c = controller();
        c.set_field(Facet::MinPrice, "200000");
        c.set_field(Facet::BedsMin, "3");
        c.set_field(Facet::HasPool, true);
        c.set_field(Facet::Sort, SortKey::Newest);

        let changes = &c.host().changes;
        assert_eq!(changes.len(), 4);
        assert_eq!(changes[0].min_price, Some(200_000));
        assert_eq!(changes[1].min_price, Some(200_000));
        assert_eq!(changes[1].beds_min, Some(3));
        assert_eq!(&changes[3], c.record());
        assert!(c.host().searches.is_empty());
    }

    #[test]
    fn location_edits_are_deferred() {
        let mut c = controller();
        c.set_field(Facet::Location, "Burl");
        c.set_field(Facet::Location, "Burlington, VT");
        assert!(c.host().changes.is_empty());
        assert_eq!(c.record().location, "Burlington, VT");
    }

    #[test]
    fn location_edit_is_visible_in_next_refinement() {
        let mut c = controller();
        c.set_field(Facet::Location, "Stowe, VT");
        c.set_field(Facet::HasGarage, true);
        assert_eq!(c.host().changes.len(), 1);
        assert_eq!(c.host().changes[0].location, "Stowe, VT");
    }

    #[test]
    fn blank_location_fails_validation_without_callbacks() {
        for location in ["", "   "] {
            let mut c = controller();
            c.set_field(Facet::Location, location);
            assert_eq!(c.submit_search(), Err(FilterError::MissingLocation));
            assert!(c.host().searches.is_empty());
            assert!(c.host().changes.is_empty());
        }

        let mut unset = controller();
        assert_eq!(unset.submit_search(), Err(FilterError::MissingLocation));
        assert!(unset.host().searches.is_empty());
    }

    #[test]
    fn submit_search_sends_complete_record_once() {
        let mut c = controller();
        c.set_field(Facet::Location, "Burlington, VT");
        c.set_field(Facet::Sort, SortKey::PriceHighLow);
        assert_eq!(c.submit_search(), Ok(()));

        let searches = &c.host().searches;
        assert_eq!(searches.len(), 1);
        let expected = FilterRecord {
            location: "Burlington, VT".to_string(),
            sort: SortKey::PriceHighLow,
            ..FilterRecord::default()
        };
        assert_eq!(searches[0], expected);
    }

    #[test]
    fn reset_restores_defaults_and_clears_location() {
        let mut c = controller();
        c.set_field(Facet::Location, "Burlington, VT");
        c.set_field(Facet::MinPrice, "200000");
        c.set_field(Facet::BedsMin, "3");
        c.set_field(Facet::HasPool, true);
        assert_eq!(c.active_filter_count(), 3);

        c.reset();
        assert_eq!(c.active_filter_count(), 0);
        assert_eq!(c.record(), &FilterRecord::default());
        assert!(c.record().location.is_empty());
    }

    #[test]
    fn reset_does_not_notify_host() {
        let mut c = controller();
        c.set_field(Facet::HasAc, true);
        c.reset();
        assert_eq!(c.host().changes.len(), 1);
        assert!(c.host().searches.is_empty());
    }

    #[test]
    fn adopting_external_record_discards_local_edits() {
        let mut c = controller();
        c.set_field(Facet::Location, "Montpelier, VT");
        c.set_field(Facet::Keywords, "porch");

        let canonical = FilterRecord {
            location: "Burlington, VT".to_string(),
            beds_min: Some(2),
            ..FilterRecord::default()
        };
        c.adopt_external_record(canonical.clone());
        assert_eq!(c.record(), &canonical);
        assert_eq!(c.host().changes.len(), 1);
    }

    #[test]
    fn seeded_record_is_used_at_mount() {
        let seed = FilterRecord {
            location: "Essex, VT".to_string(),
            has_garage: true,
            ..FilterRecord::default()
        };
        let c = FilterController::with_record(seed.clone(), RecordingHost::default());
        assert_eq!(c.record(), &seed);
        assert_eq!(c.active_filter_count(), 1);
    }

    #[test]
    fn toggles_go_through_set_field() {
        let mut c = controller();
        c.toggle_home_type("Condo");
        c.toggle_home_type("House");
        c.toggle_home_type("Condo");
        c.toggle_flag(Facet::HasPool);
        c.cycle_sort(1);

        assert_eq!(c.host().changes.len(), 5);
        assert_eq!(
            c.record().home_type.iter().collect::<Vec<_>>(),
            vec!["House"]
        );
        assert!(c.record().has_pool);
        assert_eq!(c.record().sort, SortKey::PriceLowHigh);
    }
}
