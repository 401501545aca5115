//! Rendering of the review surface with ratatui.
//!
//! Layout: a header with totals and the sort key, the group/file tree, and
//! a footer with the status line and key hints. Confirmation questions are
//! drawn as a centered dialog on top.

use bytesize::ByteSize;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState,
    },
    Frame,
};

use super::app::{App, TreeNode};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 4;

/// Key hints shown in the footer.
const KEY_HINTS: [(&str, &str); 5] = [
    ("↑↓", "Move"),
    ("Del", "Mark"),
    ("Tab", "Sort"),
    ("F10", "Commit"),
    ("q", "Quit"),
];

fn create_block_with_title<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .title(title)
}

fn split(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Rows of the tree that fit in a terminal of size `area`.
#[must_use]
pub fn list_height(area: Rect) -> usize {
    usize::from(split(area)[1].height.saturating_sub(2))
}

/// Draw the whole surface.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let [header, content, footer] = split(area);

    render_header(frame, app, header);
    render_tree(frame, app, content);
    render_footer(frame, app, footer);

    if let Some(prompt) = app.prompt() {
        render_confirm_dialog(frame, app, area, &prompt);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let model = app.model();
    let files: usize = model.groups().iter().map(|g| g.len()).sum();
    let reclaimable: u64 = model.groups().iter().map(|g| g.wasted_bytes()).sum();
    let text = format!(
        "dupsift | {} groups, {} files, {} reclaimable | sorted by {}",
        model.groups().len(),
        files,
        format_size(reclaimable),
        app.sort_key().label()
    );

    let header = Paragraph::new(text)
        .style(
            Style::default()
                .fg(app.theme().primary)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(app.theme().primary)),
        );
    frame.render_widget(header, area);
}

/// Label of a group header row.
#[must_use]
pub fn group_label(app: &App, index: usize) -> String {
    let Some(group) = app.model().group(index) else {
        return String::new();
    };
    let name = group
        .paths
        .first()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "▼ {}, {} files: '{}'",
        format_size(group.size),
        group.len(),
        name
    )
}

fn render_tree(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let title = format!("Duplicates ({})", app.model().groups().len());

    if app.nodes().is_empty() {
        let empty = Paragraph::new("No duplicates left.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.success))
            .block(create_block_with_title(title));
        frame.render_widget(empty, area);
        return;
    }

    let width = usize::from(area.width.saturating_sub(4));
    let items: Vec<ListItem> = app
        .nodes()
        .iter()
        .map(|node| match node {
            TreeNode::Group { index } => ListItem::new(truncate_string(
                &group_label(app, *index),
                width,
            ))
            .style(
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            TreeNode::File { path, .. } => {
                let shown = truncate_path(&path.to_string_lossy(), width.saturating_sub(13));
                if app.is_marked(path) {
                    ListItem::new(format!("    [DELETE] {shown}"))
                        .style(Style::default().fg(theme.danger))
                } else {
                    ListItem::new(format!("             {shown}"))
                        .style(Style::default().fg(theme.normal))
                }
            }
        })
        .collect();

    let list = List::new(items)
        .block(create_block_with_title(title).border_style(Style::default().fg(theme.primary)))
        .highlight_style(
            Style::default()
                .fg(theme.inverted_fg)
                .bg(theme.secondary)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default()
        .with_selected(Some(app.selected()))
        .with_offset(app.scroll_offset());
    frame.render_stateful_widget(list, area, &mut state);

    let visible = usize::from(area.height.saturating_sub(2));
    if app.nodes().len() > visible {
        let mut scrollbar_state = ScrollbarState::new(app.nodes().len().saturating_sub(visible))
            .position(app.scroll_offset());
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼")),
            area,
            &mut scrollbar_state,
        );
    }
}

/// Footer status text: a transient message, or the marked totals.
#[must_use]
pub fn status_line(app: &App) -> String {
    if let Some(message) = app.status_message() {
        return message.to_string();
    }
    format!(
        "Status: {} files marked for deletion ({}). Press F10 to commit.",
        app.model().marked_count(),
        format_size(app.model().marked_bytes())
    )
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let hints: Vec<Span> = KEY_HINTS
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(
                    format!("[{key}]"),
                    Style::default()
                        .fg(theme.secondary)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{desc} "), Style::default().fg(theme.normal)),
            ]
        })
        .collect();

    let status_style = if app.status_message().is_some() {
        Style::default().fg(theme.secondary)
    } else {
        Style::default().fg(theme.dim)
    };

    let footer = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(status_line(app), status_style)),
        Line::from(hints),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(theme.dim)),
    );
    frame.render_widget(footer, area);
}

fn render_confirm_dialog(frame: &mut Frame, app: &App, area: Rect, prompt: &str) {
    let theme = app.theme();
    let dialog_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, dialog_area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            prompt.to_string(),
            Style::default().fg(theme.normal).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[y] Yes    [n] No",
            Style::default().fg(theme.primary),
        )),
    ];

    let dialog = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true })
        .block(create_block_with_title("Confirm").border_style(Style::default().fg(theme.danger)));
    frame.render_widget(dialog, dialog_area);
}

/// Human-readable size.
///
/// ```
/// use dupsift::tui::ui::format_size;
///
/// assert_eq!(format_size(1024), "1.0 KiB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Truncate to `max_len` characters with a trailing ellipsis.
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Truncate a path from the left, keeping the file name visible.
#[must_use]
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let len = path.chars().count();
    if len <= max_len {
        return path.to_string();
    }
    if max_len <= 6 {
        return truncate_string(path, max_len);
    }
    let tail: String = path.chars().skip(len - (max_len - 3)).collect();
    format!("...{tail}")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
