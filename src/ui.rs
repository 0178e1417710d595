use crate::app::{App, Pane};
use crate::filter_record::{Facet, FacetKind};
use crate::presentation::{FormView, Presentation};
use crate::toast::ToastLevel;
use ratatui::prelude::*;
use ratatui::widgets::{
    Block, Borders, Cell, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Row,
    Table, TableState, Wrap,
};

pub fn render(f: &mut Frame, app: &App) {
    let view = app.form_view();

    if app.presentation() == Presentation::Modal && app.focused == Pane::Filters {
        render_modal_form(f, f.area(), &view);
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // filter bar
                Constraint::Min(5),   // results table
                Constraint::Length(3), // status bar
            ])
            .split(f.area());

        render_results_table(f, chunks[1], app);
        render_status_bar(f, chunks[2], app);
        match app.presentation() {
            Presentation::Inline => render_inline_form(f, chunks[0], chunks[1], &view),
            Presentation::Modal => render_filter_summary(f, chunks[0], &view),
        }
    }

    render_toasts(f, app);
    if let Some(message) = &app.alert {
        render_alert(f, message);
    }
}

// --- Inline form (wide terminals) ---

const INLINE_FACETS: [Facet; 7] = [
    Facet::Location,
    Facet::MinPrice,
    Facet::MaxPrice,
    Facet::BedsMin,
    Facet::BathsMin,
    Facet::HomeType,
    Facet::Sort,
];

const INLINE_CONSTRAINTS: [Constraint; 9] = [
    Constraint::Fill(3),
    Constraint::Fill(2),
    Constraint::Fill(2),
    Constraint::Fill(1),
    Constraint::Fill(1),
    Constraint::Fill(2),
    Constraint::Fill(2),
    Constraint::Length(20),
    Constraint::Length(18),
];

/// Chip bar plus its drop-downs. `overlay` is the area the drop-downs may cover.
pub fn render_inline_form(f: &mut Frame, bar: Rect, overlay: Rect, view: &FormView) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(INLINE_CONSTRAINTS)
        .split(bar);

    for (i, facet) in INLINE_FACETS.into_iter().enumerate() {
        render_facet_chip(f, panes[i], facet, view);
    }

    let more_focused = view.more_open();
    let more = Paragraph::new(format!(" {}", view.more_label())).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(more_focused))
            .title(pane_title("Filters", Some(view.active_count), more_focused)),
    );
    f.render_widget(more, panes[7]);
    render_submit_chip(f, panes[8], view);

    if view.is_focused(Facet::Location) && !view.suggestions.is_empty() {
        render_suggestions(f, panes[0], overlay, view);
    }
    if more_focused {
        render_more_panel(f, panes[7], overlay, view);
    }
}

fn render_facet_chip(f: &mut Frame, area: Rect, facet: Facet, view: &FormView) {
    let focused = view.is_focused(facet);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(pane_title(facet.label(), None, focused));
    f.render_widget(Paragraph::new(chip_line(facet, view)).block(block), area);
}

/// One-line value for a facet, with an edit cursor when focused.
fn chip_line(facet: Facet, view: &FormView) -> Line<'static> {
    let focused = view.is_focused(facet);
    match facet.kind() {
        FacetKind::Text | FacetKind::Number if focused => Line::from(vec![
            Span::raw(format!(" {}", view.input_text(facet))),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ]),
        FacetKind::Set if focused => {
            let option = view.home_type_option().unwrap_or("-").to_string();
            let mark = if view.record.home_type.contains(&option) { "[x]" } else { "[ ]" };
            Line::from(vec![
                Span::styled(" ‹ ", Style::default().fg(Color::Yellow)),
                Span::raw(format!("{mark} {option}")),
                Span::styled(" ›", Style::default().fg(Color::Yellow)),
            ])
        }
        FacetKind::Sort if focused => Line::from(vec![
            Span::styled(" ‹ ", Style::default().fg(Color::Yellow)),
            Span::raw(view.value_text(facet)),
            Span::styled(" ›", Style::default().fg(Color::Yellow)),
        ]),
        _ => {
            let text = view.value_text(facet);
            if view.record.is_set(facet) || facet.kind() == FacetKind::Flag {
                Line::from(format!(" {text}"))
            } else {
                Line::from(Span::styled(
                    format!(" {text}"),
                    Style::default().fg(Color::DarkGray),
                ))
            }
        }
    }
}

fn render_submit_chip(f: &mut Frame, area: Rect, view: &FormView) {
    let style = if view.is_loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Green).bold()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Line::from(Span::styled(" Enter ", style)));
    let widget = Paragraph::new(Line::from(Span::styled(
        format!(" {}", view.submit_label()),
        style,
    )))
    .block(block);
    f.render_widget(widget, area);
}

// --- Drop-downs ---

/// Clamp a popup anchored under `anchor` so it stays inside `within`.
fn popup_rect(anchor: Rect, within: Rect, width: u16, rows: u16) -> Rect {
    let right_edge = within.x + within.width;
    let width = width.min(within.width);
    let x = anchor.x.min(right_edge.saturating_sub(width));
    let height = (rows + 2).min(within.height);
    Rect::new(x, within.y, width, height)
}

fn render_suggestions(f: &mut Frame, anchor: Rect, overlay: Rect, view: &FormView) {
    let popup = popup_rect(
        anchor,
        overlay,
        anchor.width.max(28),
        view.suggestions.len() as u16,
    );
    f.render_widget(Clear, popup);

    let items: Vec<ListItem> = view
        .suggestions
        .iter()
        .map(|&s| ListItem::new(s))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" ↑↓ pick, Enter accept "),
        )
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black).bold())
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always);

    let mut state = ListState::default().with_selected(view.suggestion_cursor);
    f.render_stateful_widget(list, popup, &mut state);
}

fn render_more_panel(f: &mut Frame, anchor: Rect, overlay: Rect, view: &FormView) {
    let secondary: Vec<Facet> = Facet::ALL
        .into_iter()
        .filter(|facet| !facet.is_primary())
        .collect();
    let popup = popup_rect(anchor, overlay, 36, secondary.len() as u16);
    f.render_widget(Clear, popup);

    let items: Vec<ListItem> = secondary
        .iter()
        .map(|&facet| ListItem::new(form_row(facet, view, 13)))
        .collect();
    let selected = secondary.iter().position(|&facet| view.is_focused(facet));
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" More filters "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).bold())
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always);

    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, popup, &mut state);
}

/// `Label ........ value` row shared by the more-panel and the modal form.
fn form_row(facet: Facet, view: &FormView, label_width: usize) -> Line<'static> {
    let label_style = if view.is_focused(facet) {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![Span::styled(
        format!("{:<label_width$}", facet.label()),
        label_style,
    )];
    spans.extend(chip_line(facet, view).spans);
    Line::from(spans)
}

// --- Modal form (narrow terminals) ---

/// Full-screen form listing every facet.
pub fn render_modal_form(f: &mut Frame, area: Rect, view: &FormView) {
    f.render_widget(Clear, area);
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(pane_title("Filters", Some(view.active_count), true));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3), // submit
            Constraint::Length(1), // hints
        ])
        .split(inner);

    let mut lines: Vec<Line> = Vec::new();
    let mut focused_line = 0;
    for facet in Facet::ALL {
        if view.is_focused(facet) {
            focused_line = lines.len();
        }
        lines.push(form_row(facet, view, 14));

        if facet == Facet::Location && view.is_focused(facet) {
            for (i, suggestion) in view.suggestions.iter().enumerate() {
                let style = if view.suggestion_cursor == Some(i) {
                    Style::default().bg(Color::Cyan).fg(Color::Black).bold()
                } else {
                    Style::default().fg(Color::Cyan)
                };
                lines.push(Line::from(vec![
                    Span::raw(" ".repeat(14)),
                    Span::styled(format!("  {suggestion}"), style),
                ]));
            }
        }
        if facet == Facet::HomeType && view.is_focused(facet) {
            let mut spans = vec![Span::raw(" ".repeat(14))];
            for (i, option) in view.home_types.iter().enumerate() {
                let mark = if view.record.home_type.contains(option) { "[x]" } else { "[ ]" };
                let style = if i == view.home_type_cursor {
                    Style::default().fg(Color::Yellow).bold()
                } else {
                    Style::default()
                };
                spans.push(Span::styled(format!(" {mark} {option}"), style));
            }
            lines.push(Line::from(spans));
        }
    }

    let visible_rows = chunks[0].height as usize;
    let scroll = focused_line.saturating_sub(visible_rows.saturating_sub(2));
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0)),
        chunks[0],
    );

    render_submit_chip(f, chunks[1], view);
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Tab next  ←→ adjust  Space toggle  ^R reset  Esc close",
            Style::default().fg(Color::DarkGray),
        ))),
        chunks[2],
    );
}

/// Collapsed bar shown above the results on narrow terminals.
fn render_filter_summary(f: &mut Frame, area: Rect, view: &FormView) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Fill(1), Constraint::Length(16)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(false))
        .title(pane_title("Filters", Some(view.active_count), false));
    let location = view.value_text(Facet::Location);
    let content = Line::from(vec![
        Span::raw(format!(" {location}")),
        Span::styled(" · press f", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(content).block(block), panes[0]);
    render_submit_chip(f, panes[1], view);
}

// --- Results table ---

fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${out}")
}

fn render_results_table(f: &mut Frame, area: Rect, app: &App) {
    let results_focused = app.focused == Pane::Results;
    let keywords = app.record().keywords.clone().unwrap_or_default();

    let header = Row::new(vec![
        Cell::from("Price").style(Style::default().bold()),
        Cell::from("Beds").style(Style::default().bold()),
        Cell::from("Baths").style(Style::default().bold()),
        Cell::from("Sq ft").style(Style::default().bold()),
        Cell::from("Type").style(Style::default().bold()),
        Cell::from("Days").style(Style::default().bold()),
        Cell::from("Address").style(Style::default().bold()),
    ])
    .height(1)
    .bottom_margin(1);

    let rows: Vec<Row> = app
        .visible_listings()
        .map(|listing| {
            let days_style = if listing.days_on_market <= 7 {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format_price(listing.price)).style(Style::default().fg(Color::Green)),
                Cell::from(listing.beds.to_string()),
                Cell::from(listing.baths.to_string()),
                Cell::from(listing.sqft.to_string()),
                Cell::from(listing.home_type.clone()),
                Cell::from(listing.days_on_market.to_string()).style(days_style),
                Cell::from(highlight_matches(
                    &format!("{}, {}", listing.address, listing.location),
                    &keywords,
                )),
            ])
        })
        .collect();

    let title = if app.has_results {
        format!("Listings ({})", app.visible.len())
    } else {
        "Listings".to_string()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Fill(1),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(results_focused))
            .title(pane_title(&title, None, results_focused)),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("▶ ");

    let selected = (!app.visible.is_empty()).then_some(app.listing_index);
    let mut state = TableState::default().with_selected(selected);
    f.render_stateful_widget(table, area, &mut state);
}

// --- Status bar ---

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans: Vec<Span> = Vec::new();

    let hints: &[(&str, &str)] = match app.focused {
        Pane::Results => &[
            ("f", "filters"),
            ("s", "sort"),
            ("↑↓/jk", "navigate"),
            ("y", "copy link"),
            ("R", "reset"),
            ("x", "dismiss"),
            ("q", "quit"),
        ],
        Pane::Filters => &[
            ("Tab", "next"),
            ("←→", "adjust"),
            ("Space", "toggle"),
            ("Enter", "search"),
            ("^R", "reset"),
            ("Esc", "back"),
        ],
    };
    for (key, desc) in hints {
        spans.push(Span::styled(
            format!(" {key} "),
            Style::default().fg(Color::Yellow).bold(),
        ));
        spans.push(Span::raw(format!("{desc}  ")));
    }

    spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw(&app.status));

    let position = if app.visible.is_empty() {
        " 0/0 ".to_string()
    } else {
        format!(
            " {}/{} ({} total) ",
            app.listing_index + 1,
            app.visible.len(),
            app.total_hits
        )
    };

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Line::from(position).right_aligned()),
    );
    f.render_widget(bar, area);
}

// --- Toasts and alert ---

fn render_toasts(f: &mut Frame, app: &App) {
    if app.toasts.is_empty() {
        return;
    }
    let screen = f.area();
    let width = 44.min(screen.width);
    let mut y = screen.y + 1;
    for toast in app.toasts.visible() {
        if y + 3 > screen.y + screen.height {
            break;
        }
        let color = match toast.level {
            ToastLevel::Info => Color::Cyan,
            ToastLevel::Success => Color::Green,
            ToastLevel::Error => Color::Red,
        };
        let area = Rect::new(screen.x + screen.width - width, y, width, 3);
        f.render_widget(Clear, area);
        let widget = Paragraph::new(format!(" {}", toast.message)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        f.render_widget(widget, area);
        y += 3;
    }
}

fn render_alert(f: &mut Frame, message: &str) {
    let screen = f.area();
    let width = 50.min(screen.width);
    let height = 6.min(screen.height);
    let area = Rect::new(
        screen.x + (screen.width - width) / 2,
        screen.y + (screen.height - height) / 2,
        width,
        height,
    );
    f.render_widget(Clear, area);
    let text = vec![
        Line::from(format!(" {message}")),
        Line::from(""),
        Line::from(Span::styled(
            " Press Enter to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let widget = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(Span::styled(" Cannot search ", Style::default().fg(Color::Red).bold())),
    );
    f.render_widget(widget, area);
}

// --- Text highlighting ---

/// Highlight every occurrence of any whitespace-separated term in `query`.
fn highlight_matches(text: &str, query: &str) -> Line<'static> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect();
    if terms.is_empty() {
        return Line::from(text.to_string());
    }

    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower_text = text.to_ascii_lowercase();
    let highlight = Style::default().fg(Color::Black).bg(Color::Yellow).bold();

    let mut spans = Vec::new();
    let mut pos = 0;

    loop {
        let next = terms
            .iter()
            .filter_map(|t| lower_text[pos..].find(t.as_str()).map(|i| (pos + i, t.len())))
            .min_by_key(|(start, _)| *start);
        let Some((abs_start, len)) = next else {
            break;
        };
        let abs_end = abs_start + len;
        if abs_start > pos {
            spans.push(Span::raw(text[pos..abs_start].to_string()));
        }
        spans.push(Span::styled(text[abs_start..abs_end].to_string(), highlight));
        pos = abs_end;
    }

    if pos < text.len() {
        spans.push(Span::raw(text[pos..].to_string()));
    }

    Line::from(spans)
}

// --- Shared helpers ---

fn pane_title(name: &str, badge: Option<usize>, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![Span::styled(format!(" {name} "), style)];
    if let Some(count) = badge.filter(|c| *c > 0) {
        spans.push(Span::styled(
            format!("({count}) "),
            Style::default().fg(Color::Yellow).bold(),
        ));
    }
    Line::from(spans)
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::filter_record::FilterRecord;
    use crate::provider::FileProvider;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use std::sync::Arc;

    fn rows(buffer: &Buffer) -> Vec<String> {
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect())
            .collect()
    }

    fn screen_contains(buffer: &Buffer, needle: &str) -> bool {
        rows(buffer).iter().any(|row| row.contains(needle))
    }

    fn record() -> FilterRecord {
        FilterRecord {
            location: "Burlington, VT".to_string(),
            min_price: Some(250_000),
            has_pool: true,
            ..FilterRecord::default()
        }
    }

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
    fn both_presentations_show_the_same_values() {
        let record = record();
        let v = view(&record);

        let mut inline = Terminal::new(TestBackend::new(140, 20)).unwrap();
        inline
            .draw(|f| {
                let bar = Rect::new(0, 0, 140, 3);
                let overlay = Rect::new(0, 3, 140, 17);
                render_inline_form(f, bar, overlay, &v);
            })
            .unwrap();
        let inline = inline.backend().buffer().clone();

        let mut modal = Terminal::new(TestBackend::new(60, 30)).unwrap();
        modal.draw(|f| render_modal_form(f, f.area(), &v)).unwrap();
        let modal = modal.backend().buffer().clone();

        for needle in ["Burlington, VT", "$250000", "Search"] {
            assert!(screen_contains(&inline, needle), "inline missing {needle}");
            assert!(screen_contains(&modal, needle), "modal missing {needle}");
        }
        assert!(screen_contains(&inline, "More filters (1)"));
        assert!(screen_contains(&modal, "(2)"));
        assert!(screen_contains(&modal, "Pool"));
    }

    #[test]
    fn both_presentations_show_the_typed_draft() {
        let record = FilterRecord {
            baths_min: Some(2.0),
            ..record()
        };
        let mut v = view(&record);
        v.focus = Some(Facet::BathsMin);
        v.draft = Some("2.");

        let mut inline = Terminal::new(TestBackend::new(140, 20)).unwrap();
        inline
            .draw(|f| render_inline_form(f, Rect::new(0, 0, 140, 3), Rect::new(0, 3, 140, 17), &v))
            .unwrap();
        assert!(screen_contains(inline.backend().buffer(), "2.█"));

        let mut modal = Terminal::new(TestBackend::new(60, 30)).unwrap();
        modal.draw(|f| render_modal_form(f, f.area(), &v)).unwrap();
        assert!(screen_contains(modal.backend().buffer(), "2.█"));
    }

    #[test]
    fn more_panel_opens_on_secondary_focus() {
        let record = record();
        let mut v = view(&record);
        v.focus = Some(Facet::HasPool);

        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal
            .draw(|f| render_inline_form(f, Rect::new(0, 0, 140, 3), Rect::new(0, 3, 140, 27), &v))
            .unwrap();
        let buffer = terminal.backend().buffer();
        assert!(screen_contains(buffer, " More filters "));
        assert!(screen_contains(buffer, "Garage"));
    }

    #[test]
    fn full_render_does_not_panic_at_any_width() {
        let provider = Arc::new(FileProvider::new("unused.json"));
        let mut app = App::new(&AppConfig::default(), provider, Some(record()));
        app.alert = Some("Please enter a location to search".to_string());
        for width in [30, 60, 99, 100, 160] {
            app.resize(width);
            for pane in [Pane::Results, Pane::Filters] {
                app.focused = pane;
                let mut terminal = Terminal::new(TestBackend::new(width, 24)).unwrap();
                terminal.draw(|f| render(f, &app)).unwrap();
            }
        }
    }

    #[test]
    fn narrow_results_view_shows_summary_bar() {
        let provider = Arc::new(FileProvider::new("unused.json"));
        let mut app = App::new(&AppConfig::default(), provider, Some(record()));
        app.resize(60);
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        assert!(screen_contains(buffer, "Filters (2)"));
        assert!(screen_contains(buffer, "Burlington, VT"));
    }

    #[test]
    fn prices_get_thousands_separators() {
        assert_eq!(format_price(950), "$950");
        assert_eq!(format_price(1_250_000), "$1,250,000");
        assert_eq!(format_price(325_000), "$325,000");
    }

    #[test]
    fn highlights_each_keyword_term() {
        let line = highlight_matches("12 Lake St, Stowe", "lake stowe");
        let highlighted: Vec<_> = line
            .spans
            .iter()
            .filter(|s| s.style.bg == Some(Color::Yellow))
            .map(|s| s.content.to_string())
            .collect();
        assert_eq!(highlighted, vec!["Lake", "Stowe"]);
    }
}
