use crate::autocomplete::LocationAutocomplete;
use crate::config::AppConfig;
use crate::controller::{FilterController, FilterHost};
use crate::filter_record::{Facet, FacetKind, FilterRecord};
use crate::presentation::{FormView, Presentation};
use crate::provider::{Listing, SearchOutcome, SearchProvider};
use crate::refine;
use crate::toast::{ToastQueue, ToastSender};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Results,
    Filters,
}

/// What the controller asked of its host during the current UI turn.
#[derive(Debug)]
pub enum HostEvent {
    Refine(FilterRecord),
    Search(FilterRecord),
}

/// Forwards controller callbacks to the app's event queue.
pub struct HostChannel {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl FilterHost for HostChannel {
    fn on_filter_change(&mut self, record: &FilterRecord) {
        let _ = self.tx.send(HostEvent::Refine(record.clone()));
    }

    fn on_search(&mut self, record: &FilterRecord) {
        let _ = self.tx.send(HostEvent::Search(record.clone()));
    }
}

struct SearchDone {
    record: FilterRecord,
    result: Result<SearchOutcome>,
}

pub struct App {
    pub focused: Pane,
    pub focus: Facet,

    controller: FilterController<HostChannel>,
    host_rx: mpsc::UnboundedReceiver<HostEvent>,

    pub autocomplete: LocationAutocomplete,
    pub home_types: Vec<String>,
    pub home_type_cursor: usize,
    /// Text typed into the focused number facet. The record holds its parsed
    /// value; this only keeps partial input like "2." on screen.
    number_draft: Option<String>,

    provider: Arc<dyn SearchProvider>,
    search_tx: mpsc::UnboundedSender<SearchDone>,
    search_rx: mpsc::UnboundedReceiver<SearchDone>,

    pub listings: Vec<Listing>,
    /// Indices into `listings` that survive the current refinement, in display order.
    pub visible: Vec<usize>,
    pub listing_index: usize,
    pub total_hits: u64,
    pub is_loading: bool,
    pub has_results: bool,

    /// Blocking message; swallows all input until dismissed.
    pub alert: Option<String>,
    pub toasts: ToastQueue,
    toast_tx: ToastSender,

    pub viewport_width: u16,
    modal_breakpoint: u16,
    tick: usize,

    pub status: String,
}

impl App {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn SearchProvider>,
        initial: Option<FilterRecord>,
    ) -> Self {
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        let (toasts, toast_tx) = ToastQueue::new(
            config.toast_capacity,
            Duration::from_secs(config.toast_ttl_secs),
        );
        let host = HostChannel { tx: host_tx };
        let controller = match initial {
            Some(record) => FilterController::with_record(record, host),
            None => FilterController::new(host),
        };

        let mut autocomplete = LocationAutocomplete::new();
        autocomplete.extend_items(config.locations.iter().cloned());

        Self {
            focused: Pane::Results,
            focus: Facet::Location,
            controller,
            host_rx,
            autocomplete,
            home_types: config.home_types.clone(),
            home_type_cursor: 0,
            number_draft: None,
            provider,
            search_tx,
            search_rx,
            listings: Vec::new(),
            visible: Vec::new(),
            listing_index: 0,
            total_hits: 0,
            is_loading: false,
            has_results: false,
            alert: None,
            toasts,
            toast_tx,
            viewport_width: u16::MAX,
            modal_breakpoint: config.modal_breakpoint,
            tick: 0,
            status: "Loading facets...".to_string(),
        }
    }

    pub fn record(&self) -> &FilterRecord {
        self.controller.record()
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::for_width(self.viewport_width, self.modal_breakpoint)
    }

    pub fn form_view(&self) -> FormView<'_> {
        let editing = self.focused == Pane::Filters;
        FormView {
            record: self.controller.record(),
            focus: editing.then_some(self.focus),
            active_count: self.controller.active_filter_count(),
            is_loading: self.is_loading,
            has_results: self.has_results,
            suggestions: if editing && self.focus == Facet::Location {
                self.autocomplete.suggestions()
            } else {
                Vec::new()
            },
            suggestion_cursor: self.autocomplete.cursor(),
            home_types: &self.home_types,
            home_type_cursor: self.home_type_cursor,
            draft: editing.then_some(self.number_draft.as_deref()).flatten(),
            spinner_frame: self.tick,
        }
    }

    pub fn selected_listing(&self) -> Option<&Listing> {
        self.visible
            .get(self.listing_index)
            .and_then(|&i| self.listings.get(i))
    }

    pub fn visible_listings(&self) -> impl Iterator<Item = &Listing> {
        self.visible.iter().filter_map(|&i| self.listings.get(i))
    }

    /// Populate autocomplete and home-type options from the provider.
    pub async fn load_facets(&mut self) {
        match self.provider.available_facets().await {
            Ok(facets) => {
                self.autocomplete.extend_items(facets.locations);
                for home_type in facets.home_types {
                    if !self
                        .home_types
                        .iter()
                        .any(|t| t.eq_ignore_ascii_case(&home_type))
                    {
                        self.home_types.push(home_type);
                    }
                }
                tracing::info!(
                    source = self.provider.source_name(),
                    locations = self.autocomplete.len(),
                    home_types = self.home_types.len(),
                    "facets loaded"
                );
                self.status = format!(
                    "{} known locations. Press f to filter, Enter to search",
                    self.autocomplete.len()
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "loading facets failed");
                self.status = "Facets unavailable".to_string();
                self.toast_tx.error(format!("Error loading facets: {e}"));
            }
        }
    }

    // --- Per-frame housekeeping ---

    pub fn on_tick(&mut self, now: Instant) {
        self.tick = self.tick.wrapping_add(1);
        self.poll_search_results();
        self.toasts.drain(now);
    }

    pub fn resize(&mut self, width: u16) {
        self.viewport_width = width;
    }

    fn process_host_events(&mut self) {
        while let Ok(event) = self.host_rx.try_recv() {
            match event {
                HostEvent::Refine(record) => self.refine(&record),
                HostEvent::Search(record) => self.start_search(record),
            }
        }
    }

    fn refine(&mut self, record: &FilterRecord) {
        self.visible = refine::apply(&self.listings, record);
        self.listing_index = self
            .listing_index
            .min(self.visible.len().saturating_sub(1));
        tracing::debug!(shown = self.visible.len(), of = self.listings.len(), "refined");
        if self.has_results {
            self.status = format!(
                "{} of {} listings match",
                self.visible.len(),
                self.listings.len()
            );
        }
    }

    fn start_search(&mut self, record: FilterRecord) {
        self.is_loading = true;
        self.status = format!("Searching {}...", record.location.trim());
        let provider = Arc::clone(&self.provider);
        let tx = self.search_tx.clone();
        tokio::spawn(async move {
            let result = provider.search(&record).await;
            let _ = tx.send(SearchDone { record, result });
        });
    }

    fn poll_search_results(&mut self) {
        while let Ok(done) = self.search_rx.try_recv() {
            self.finish_search(done.record, done.result);
        }
    }

    fn finish_search(&mut self, submitted: FilterRecord, result: Result<SearchOutcome>) {
        self.is_loading = false;
        match result {
            Ok(outcome) => {
                tracing::info!(
                    location = %outcome.location,
                    hits = outcome.listings.len(),
                    total = outcome.total,
                    "search finished"
                );
                self.listings = outcome.listings;
                self.total_hits = outcome.total;
                self.listing_index = 0;
                self.has_results = true;
                self.autocomplete.close();

                let canonical = FilterRecord {
                    location: outcome.location,
                    ..submitted
                };
                self.refine(&canonical);
                self.number_draft = None;
                self.toast_tx.success(format!(
                    "{} listings in {}",
                    self.listings.len(),
                    canonical.location
                ));
                self.controller.adopt_external_record(canonical);
                self.focused = Pane::Results;
            }
            Err(e) => {
                tracing::error!(error = %e, location = %submitted.location, "search failed");
                self.status = "Search failed".to_string();
                self.toast_tx.error(format!("Search failed: {e}"));
            }
        }
    }

    // --- Input ---

    /// Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return false;
        }

        let quit = match self.focused {
            Pane::Results => self.handle_results_key(key),
            Pane::Filters => {
                self.handle_filters_key(key);
                false
            }
        };
        self.process_host_events();
        quit
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('f') | KeyCode::Char('/') => self.open_filters(),
            KeyCode::Char('s') => self.controller.cycle_sort(1),
            KeyCode::Char('R') => self.reset_filters(),
            KeyCode::Char('y') => self.copy_selected_url(),
            KeyCode::Char('x') => {
                self.toasts.dismiss_latest();
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
            _ => {}
        }
        false
    }

    fn handle_filters_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('r') {
                self.reset_filters();
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {
                if self.autocomplete.suggestions().is_empty() {
                    self.focused = Pane::Results;
                    self.number_draft = None;
                } else {
                    self.autocomplete.close();
                }
            }
            KeyCode::Tab => self.move_focus(self.focus.next()),
            KeyCode::BackTab => self.move_focus(self.focus.previous()),
            KeyCode::Down => {
                if self.focus == Facet::Location && !self.autocomplete.suggestions().is_empty() {
                    self.autocomplete.next();
                } else {
                    self.move_focus(self.focus.next());
                }
            }
            KeyCode::Up => {
                if self.focus == Facet::Location && self.autocomplete.cursor().is_some() {
                    self.autocomplete.previous();
                } else {
                    self.move_focus(self.focus.previous());
                }
            }
            KeyCode::Left => self.step_focused(-1),
            KeyCode::Right => self.step_focused(1),
            KeyCode::Enter => self.enter(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(' ') if self.focus.kind() == FacetKind::Flag => {
                self.controller.toggle_flag(self.focus);
            }
            KeyCode::Char(' ') if self.focus.kind() == FacetKind::Set => {
                if let Some(name) = self.home_types.get(self.home_type_cursor).cloned() {
                    self.controller.toggle_home_type(&name);
                }
            }
            KeyCode::Char(c) => self.type_char(c),
            _ => {}
        }
    }

    fn open_filters(&mut self) {
        self.focused = Pane::Filters;
        self.move_focus(Facet::Location);
    }

    fn move_focus(&mut self, facet: Facet) {
        self.focus = facet;
        self.number_draft = None;
        if facet == Facet::Location {
            self.autocomplete.refresh(&self.controller.record().location);
        } else {
            self.autocomplete.close();
        }
    }

    fn enter(&mut self) {
        if self.focus == Facet::Location {
            if let Some(location) = self.autocomplete.highlighted().map(str::to_owned) {
                self.controller.set_field(Facet::Location, location);
                self.autocomplete.close();
                return;
            }
        }
        self.submit();
    }

    pub fn submit(&mut self) {
        if self.is_loading {
            return;
        }
        if let Err(e) = self.controller.submit_search() {
            self.alert = Some(e.to_string());
        }
    }

    fn reset_filters(&mut self) {
        self.controller.reset();
        self.number_draft = None;
        self.autocomplete.close();
        self.home_type_cursor = 0;
        self.toast_tx.info("Filters cleared");
    }

    fn type_char(&mut self, c: char) {
        match self.focus.kind() {
            FacetKind::Text => {}
            FacetKind::Number if c.is_ascii_digit() || matches!(c, '.' | ',' | '$') => {}
            _ => return,
        }
        let mut value = self.editing_text();
        value.push(c);
        self.edit_text(value);
    }

    fn backspace(&mut self) {
        if !matches!(self.focus.kind(), FacetKind::Text | FacetKind::Number) {
            return;
        }
        let mut value = self.editing_text();
        value.pop();
        self.edit_text(value);
    }

    /// The text being edited: the draft for number facets once typing has
    /// started, the record's value otherwise.
    fn editing_text(&self) -> String {
        match &self.number_draft {
            Some(draft) if self.focus.kind() == FacetKind::Number => draft.clone(),
            _ => self.controller.record().display_value(self.focus),
        }
    }

    fn edit_text(&mut self, value: String) {
        if self.focus.kind() == FacetKind::Number {
            self.number_draft = Some(value.clone());
        }
        self.controller.set_field(self.focus, value);
        if self.focus == Facet::Location {
            self.autocomplete.refresh(&self.controller.record().location);
        }
    }

    fn step_focused(&mut self, direction: isize) {
        match self.focus.kind() {
            FacetKind::Sort => self.controller.cycle_sort(direction),
            FacetKind::Set => {
                if !self.home_types.is_empty() {
                    let len = self.home_types.len() as isize;
                    self.home_type_cursor =
                        (self.home_type_cursor as isize + direction).rem_euclid(len) as usize;
                }
            }
            FacetKind::Number => self.step_number(direction),
            FacetKind::Flag | FacetKind::Text => {}
        }
    }

    /// Nudge a numeric facet by its natural increment, never below zero.
    fn step_number(&mut self, direction: isize) {
        let (step, start) = number_step(self.focus);
        let current = self.controller.record().display_value(self.focus);
        let value = match current.parse::<f64>() {
            Ok(v) => (v + step * direction as f64).max(0.0),
            Err(_) => start,
        };
        self.number_draft = None;
        self.controller.set_field(self.focus, format_number(value));
    }

    // --- Results ---

    pub fn scroll_down(&mut self) {
        if !self.visible.is_empty() {
            self.listing_index = (self.listing_index + 1).min(self.visible.len() - 1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.listing_index = self.listing_index.saturating_sub(1);
    }

    fn copy_selected_url(&mut self) {
        let Some(url) = self.selected_listing().map(|l| l.url.clone()) else {
            return;
        };
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url.clone())) {
            Ok(()) => self.toast_tx.success(format!("Copied {url}")),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard unavailable");
                self.toast_tx.error(format!("Clipboard unavailable: {e}"));
            }
        }
    }
}

/// Increment and starting value for stepping a numeric facet with ←/→.
fn number_step(facet: Facet) -> (f64, f64) {
    match facet {
        Facet::MinPrice | Facet::MaxPrice => (25_000.0, 100_000.0),
        Facet::BathsMin | Facet::BathsMax => (0.5, 1.0),
        Facet::SqftMin | Facet::SqftMax => (250.0, 1_000.0),
        Facet::LotMin | Facet::LotMax => (1_000.0, 5_000.0),
        Facet::BuiltYearMin | Facet::BuiltYearMax => (1.0, 2000.0),
        Facet::HoaMax => (50.0, 100.0),
        _ => (1.0, 1.0),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{value}")
    }
}
