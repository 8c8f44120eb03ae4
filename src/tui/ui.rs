//! TUI rendering with ratatui
//!
//! Draws the terminal UI: tabs, bucket list, object list, log view, status
//! bar. Everything is a projection of `App`; nothing here mutates state.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Tabs},
    Frame,
};

use super::app::{App, AppState, InputField, KeyMap, Tab};
use super::entry_list::EntryRow;
use crate::archive;
use crate::search::Matcher;

/// Main draw function - renders the entire TUI
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: top tabs, center content, bottom status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(5),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    draw_tabs(frame, chunks[0], app);

    if let Some(err) = &app.fatal_error {
        draw_fatal(frame, chunks[1], app, err);
    } else {
        match app.tab {
            Tab::Buckets => draw_buckets_tab(frame, chunks[1], app),
            Tab::Objects => draw_objects_tab(frame, chunks[1], app),
            Tab::Log => draw_log_tab(frame, chunks[1], app),
        }
    }

    draw_status_bar(frame, chunks[2], app);

    // Input popup for fields without an inline box
    if let AppState::Input(field) = app.state {
        if field != InputField::Pattern {
            draw_input_popup(frame, area, app, field);
        }
    }

    // Help overlay (drawn last, on top)
    if app.show_help {
        draw_help_overlay(frame, area, app.keys());
    }
}

/// Draw tab bar
fn draw_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|t| {
            let style = if *t == app.tab {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(t.label(), style))
        })
        .collect();

    let profile = if app.profile.is_empty() {
        "<default>"
    } else {
        app.profile.as_str()
    };
    let title = format!(
        " bucket-grep  profile:{}  bucket:{} ",
        profile,
        app.bucket.as_deref().unwrap_or("-")
    );

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(app.tab.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

/// Authentication failure banner
fn draw_fatal(frame: &mut Frame, area: Rect, app: &App, err: &str) {
    let keys = app.keys();
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Cannot use this profile",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("  {}", err)),
        Line::from(""),
        Line::from(format!(
            "  Profile: {}",
            if app.profile.is_empty() {
                "<default>"
            } else {
                app.profile.as_str()
            }
        )),
        Line::from(format!(
            "  Press '{}' or Enter to enter another profile, '{}' to quit.",
            keys.profile, keys.quit
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Authentication ");

    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Draw the bucket selector
fn draw_buckets_tab(frame: &mut Frame, area: Rect, app: &App) {
    if !app.is_connected() {
        let keys = app.keys();
        draw_info_tab(
            frame,
            area,
            "Buckets",
            &format!(
                "Not connected. Press '{}' to enter a profile or '{}' to retry.",
                keys.profile, keys.refresh
            ),
        );
        return;
    }

    let items: Vec<ListItem> = app
        .buckets
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let open = app.bucket.as_deref() == Some(name.as_str());
            let marker = if open { "* " } else { "  " };
            let style = if i == app.bucket_cursor {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(Span::styled(format!("{}{}", marker, name), style)))
        })
        .collect();

    let title = format!(" Buckets ({}) ", app.buckets.len());
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

/// Draw objects tab - path/filters on top, list (left) and details (right)
fn draw_objects_tab(frame: &mut Frame, area: Rect, app: &App) {
    if app.bucket.is_none() {
        draw_info_tab(
            frame,
            area,
            "Objects",
            "No bucket open. Pick one in the Buckets tab (1).",
        );
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    draw_location(frame, rows[0], app);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    draw_entry_list(frame, chunks[0], app);
    draw_entry_details(frame, chunks[1], app);
}

/// Current path and active filters
fn draw_location(frame: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);
    let unset = || Span::styled("-", label);

    let lines = vec![
        Line::from(vec![
            Span::styled(" Path: ", label),
            Span::styled(
                format!("/{}", app.session.current_prefix()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Name^ ", label),
            if app.criteria.name_prefix.is_empty() {
                unset()
            } else {
                Span::styled(app.criteria.name_prefix.clone(), value)
            },
            Span::styled("  Date ", label),
            match app.criteria.date {
                Some(d) => Span::styled(d.format("%Y-%m-%d").to_string(), value),
                None => unset(),
            },
            Span::styled("  Time ", label),
            match app.criteria.time_of_day {
                Some(t) => Span::styled(format!("{} ±10m", t.format("%H:%M")), value),
                None => unset(),
            },
            Span::styled("  (UTC+9)", label),
        ]),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Location ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Draw the folder/file list panel
fn draw_entry_list(frame: &mut Frame, area: Rect, app: &App) {
    let inner_height = area.height.saturating_sub(2) as usize; // borders
    let (rows, relative_selected) = app.entries.visible_window(inner_height);
    let selected_key = app.session.selected_key();

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let (text, color) = match row {
                EntryRow::Parent => ("[..] ..".to_string(), Color::Yellow),
                EntryRow::Folder(folder) => (format!("[DIR] {}/", folder.display_name), Color::Blue),
                EntryRow::File(file) => {
                    let icon = if archive::is_archive(&file.key) {
                        "[GZ ]"
                    } else {
                        "[---]"
                    };
                    let mut text = format!("{} {}", icon, file.display_name);
                    if app.tui_config.show_dates {
                        text.push_str(&format!("  {}", file.modified.format("%Y-%m-%d %H:%M:%S")));
                    }
                    if app.tui_config.show_sizes {
                        text.push_str(&format!(
                            "  {}",
                            humansize::format_size(file.size_bytes, humansize::BINARY)
                        ));
                    }
                    let color = if selected_key == Some(file.key.as_str()) {
                        Color::Green
                    } else if archive::is_archive(&file.key) {
                        Color::White
                    } else {
                        Color::DarkGray
                    };
                    (text, color)
                }
            };

            let style = if i == relative_selected {
                Style::default()
                    .fg(color)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(color)
            };
            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();

    let title = format!(
        " {} folders, {}/{} files ",
        app.entries.folder_count(),
        app.entries.file_count(),
        app.listed_files
    );

    let list = if app.entries.is_empty() {
        List::new(vec![ListItem::new(Line::from(Span::styled(
            "  No objects match the current filters",
            Style::default().fg(Color::DarkGray),
        )))])
    } else {
        List::new(items)
    };

    frame.render_widget(
        list.block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

/// Draw details of the selected file
fn draw_entry_details(frame: &mut Frame, area: Rect, app: &App) {
    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    let selected_file = app.session.selected_key().and_then(|key| {
        app.entries
            .selected()
            .and_then(|row| row.file())
            .filter(|f| f.key == key)
    });

    let detail_text = match (app.session.selected_key(), selected_file) {
        (Some(key), file) => {
            let mut lines = vec![
                Line::from(Span::styled("  Selected Object", heading)),
                Line::from(""),
                Line::from(format!("  Key: {}", key)),
            ];
            if let Some(file) = file {
                lines.push(Line::from(format!(
                    "  Modified: {}",
                    file.modified.format("%Y-%m-%d %H:%M:%S %:z")
                )));
                lines.push(Line::from(format!(
                    "  Size: {}",
                    humansize::format_size(file.size_bytes, humansize::BINARY)
                )));
            }
            lines.push(Line::from(""));
            if app.session.current_text().is_some() {
                lines.push(Line::from(Span::styled(
                    format!("  Decoded: {} lines (tab 3)", app.log.total_lines()),
                    Style::default().fg(Color::Green),
                )));
            } else if app.session.can_decode() {
                lines.push(Line::from(Span::styled(
                    "  Press Enter or 'd' to decode",
                    Style::default().fg(Color::Yellow),
                )));
            } else {
                lines.push(Line::from(Span::styled(
                    "  Not a .gz archive",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines
        }
        (None, _) => vec![Line::from(""), Line::from("  No object selected")],
    };

    let block = Block::default().borders(Borders::ALL).title(" Details ");
    frame.render_widget(Paragraph::new(detail_text).block(block), area);
}

/// Draw the log tab - pattern input and filtered lines
fn draw_log_tab(frame: &mut Frame, area: Rect, app: &App) {
    let Some(text) = app.session.current_text() else {
        draw_info_tab(
            frame,
            area,
            "Log",
            "Nothing decoded. Select a .gz object and press Enter.",
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    draw_pattern_input(frame, chunks[0], app);

    let inner_height = chunks[1].height.saturating_sub(2) as usize;
    let number_width = app.log.total_lines().max(1).to_string().len();
    let matcher = app
        .log
        .matcher()
        .filter(|m| app.tui_config.highlight_matches && !m.is_empty());

    let lines: Vec<Line> = app
        .log
        .window(text, inner_height)
        .into_iter()
        .map(|(number, line)| {
            let mut spans = vec![Span::styled(
                format!("{:>width$} ", number, width = number_width),
                Style::default().fg(Color::DarkGray),
            )];
            spans.extend(highlight_line(line, matcher, app.tui_config.tab_width));
            Line::from(spans)
        })
        .collect();

    let title = format!(
        " {} ({}) ",
        app.session.selected_key().unwrap_or_default(),
        if app.log.hscroll > 0 {
            format!("col {}", app.log.hscroll)
        } else {
            "h/l to scroll sideways".to_string()
        }
    );

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((0, app.log.hscroll));
    frame.render_widget(paragraph, chunks[1]);
}

/// Pattern input with match count or compile error
fn draw_pattern_input(frame: &mut Frame, area: Rect, app: &App) {
    let editing = app.state == AppState::Input(InputField::Pattern);
    let shown = if editing { &app.input } else { &app.log.pattern };

    let (title, border) = match &app.log.error {
        Some(err) => (
            format!(" Regex error: {} ", error_summary(err)),
            Style::default().fg(Color::Red),
        ),
        None => (
            format!(
                " Matched lines: {} / {} ",
                app.log.match_count(),
                app.log.total_lines()
            ),
            Style::default().fg(if editing { Color::Yellow } else { Color::White }),
        ),
    };

    let content = if editing {
        format!("/{}_", shown)
    } else if shown.is_empty() {
        "Press '/' to filter with a regex (e.g. Error|警告|\\tABC)".to_string()
    } else {
        format!("Regex: {}", shown)
    };

    let input = Paragraph::new(content).style(border).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title),
    );
    frame.render_widget(input, area);
}

/// Split a log line into plain and highlighted spans
fn highlight_line<'a>(line: &'a str, matcher: Option<&Matcher>, tab_width: usize) -> Vec<Span<'a>> {
    let hit = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let Some(matcher) = matcher else {
        return vec![Span::raw(expand_tabs(line, tab_width))];
    };

    let mut spans = Vec::new();
    let mut last = 0;
    for range in matcher.spans(line) {
        if range.start > last {
            spans.push(Span::raw(expand_tabs(&line[last..range.start], tab_width)));
        }
        spans.push(Span::styled(expand_tabs(&line[range.clone()], tab_width), hit));
        last = range.end;
    }
    if last < line.len() {
        spans.push(Span::raw(expand_tabs(&line[last..], tab_width)));
    }
    spans
}

/// Replace tabs so the terminal renders them with a fixed width
fn expand_tabs(s: &str, width: usize) -> String {
    s.replace('\t', &" ".repeat(width.max(1)))
}

fn error_summary(s: &str) -> &str {
    s.lines().last().unwrap_or(s).trim()
}

/// Draw an info tab with a message
fn draw_info_tab(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("  {}", message)),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title));

    let paragraph = Paragraph::new(text).block(block);
    frame.render_widget(paragraph, area);
}

/// Popup editor for profile and filter inputs
fn draw_input_popup(frame: &mut Frame, area: Rect, app: &App, field: InputField) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 3.min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let input = Paragraph::new(format!("{}_", app.input))
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(format!(" {} ", field.label())),
        );
    frame.render_widget(input, popup_area);
}

/// Draw status bar
fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let left = Span::styled(
        format!(" {} ", app.status_message),
        Style::default().fg(Color::White),
    );

    let keys = app.keys();
    let hints = match app.tab {
        Tab::Buckets => format!(
            " {}:Help  j/k:Nav  Enter:Open  {}:Profile  {}:Quit ",
            keys.help, keys.profile, keys.quit
        ),
        Tab::Objects => format!(
            " {}:Help  Enter:Open/Decode  h:Up  /:Name  D:Date  T:Time  c:Clear ",
            keys.help
        ),
        Tab::Log => format!(" {}:Help  /:Regex  j/k:Scroll  h/l:Sideways  Bksp:Back ", keys.help),
    };
    let right = Span::styled(hints, Style::default().fg(Color::DarkGray));

    let bar = Paragraph::new(Line::from(vec![left, right])).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(bar, area);
}

/// Draw help overlay popup
fn draw_help_overlay(frame: &mut Frame, area: Rect, keys: KeyMap) {
    // Center the popup
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 34.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let section = Style::default().fg(Color::Yellow);
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  KEYBOARD SHORTCUTS",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("  Navigation", section)),
        Line::from("    j / ↓        Move down"),
        Line::from("    k / ↑        Move up"),
        Line::from("    g / Home     Jump to first"),
        Line::from("    G / End      Jump to last"),
        Line::from("    PgUp/PgDn    Page up/down"),
        Line::from("    Enter / l    Open bucket, folder or decode .gz"),
        Line::from("    Bksp / h     Parent folder"),
        Line::from(""),
        Line::from(Span::styled("  Filters (UTC+9)", section)),
        Line::from("    /            Name prefix (sent with the listing)"),
        Line::from("    D            Date YYYY-MM-DD"),
        Line::from("    T            Time HH:MM, ±10 minutes"),
        Line::from("    c            Clear all filters"),
        Line::from(""),
        Line::from(Span::styled("  Log", section)),
        Line::from(format!("    {}            Decode selected .gz", keys.decode)),
        Line::from("    /            Regex filter (live)"),
        Line::from("    h / l        Scroll sideways, 0 resets"),
        Line::from(""),
        Line::from(Span::styled("  General", section)),
        Line::from("    Tab/Shift+Tab Switch tabs, 1-3 jump"),
        Line::from(format!("    {}            Change profile", keys.profile)),
        Line::from(format!("    {}            Refresh / retry", keys.refresh)),
        Line::from(format!("    {}/F1         Show this help", keys.help)),
        Line::from(format!("    {}/Esc        Quit", keys.quit)),
        Line::from("    Ctrl+C       Force quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .padding(Padding::horizontal(1));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, popup_area);
}
