//! UI rendering for the TUI

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::state::{AppState, CancelChoice, Mode};
use crate::media::{Attachment, MAX_IMAGES};
use crate::theme::{Theme, ThemeColors};

/// Spinner animation frames
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Height of the image strip
const IMAGE_STRIP_HEIGHT: u16 = 6;

/// Main render function
pub fn render(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();

    let area = frame.area();
    let bg_block = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(bg_block, area);

    let banner_height = if state.composer.error().is_some() {
        3
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                  // Header
            Constraint::Length(banner_height),      // Error banner
            Constraint::Min(3),                     // Text
            Constraint::Length(IMAGE_STRIP_HEIGHT), // Images
            Constraint::Length(1),                  // Footer
        ])
        .split(area);

    render_header(frame, state, &colors, chunks[0]);
    if banner_height > 0 {
        render_error_banner(frame, state, &colors, chunks[1]);
    }
    render_text(frame, state, &colors, chunks[2]);
    render_images(frame, state, &colors, chunks[3]);
    render_footer(frame, state, &colors, chunks[4]);

    match state.mode {
        Mode::AttachPath => render_prompt(frame, state, " Attach image ", "Path: "),
        Mode::AltText { .. } => render_prompt(frame, state, " Image description ", "Alt: "),
        Mode::CancelMenu => render_cancel_menu(frame, state),
        Mode::Drafts => render_drafts(frame, state),
        Mode::ThemePicker => render_theme_picker(frame, state),
        Mode::Help => render_help_popup(frame, state),
        Mode::Editing => {}
    }
}

fn render_header(frame: &mut Frame, state: &AppState, colors: &ThemeColors, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),
            Constraint::Min(0),
            Constraint::Length(12),
        ])
        .split(area);

    let cancel = Paragraph::new(Line::from(vec![
        Span::styled(" Esc", colors.key_hint()),
        Span::styled(" Cancel", colors.text_primary()),
    ]));
    frame.render_widget(cancel, chunks[0]);

    let who = match (&state.session_handle, &state.account) {
        (Some(handle), _) => Span::styled(format!("@{handle}"), colors.text_dim()),
        (None, Some(account)) => Span::styled(account.full_handle(), colors.text_muted()),
        (None, None) => Span::styled("Not logged in", colors.text_warning()),
    };
    frame.render_widget(
        Paragraph::new(Line::from(who)).alignment(Alignment::Center),
        chunks[1],
    );

    let label = if state.composer.sending {
        let frame_idx = (state.current_tick() / 2) as usize % SPINNER.len();
        format!(" {} Post ", SPINNER[frame_idx])
    } else {
        " Post ".to_string()
    };
    let post = Paragraph::new(Line::from(Span::styled(
        label,
        colors.post_button(state.composer.can_post()),
    )))
    .alignment(Alignment::Right);
    frame.render_widget(post, chunks[2]);
}

fn render_error_banner(frame: &mut Frame, state: &AppState, colors: &ThemeColors, area: Rect) {
    let Some(failure) = state.composer.error() else {
        return;
    };

    let mut lines = vec![Line::from(Span::styled(
        format!(" ⚠ {} ", failure.message),
        colors.banner_error(),
    ))];
    let second = match &failure.detail {
        Some(detail) => format!(" {detail}. Please try again"),
        None => " Please try again".to_string(),
    };
    lines.push(Line::from(Span::styled(second, colors.text_error())));

    frame.render_widget(Paragraph::new(lines), area);
}

/// Text lines with facets highlighted
fn text_lines<'a>(state: &'a AppState, colors: &ThemeColors) -> Vec<Line<'a>> {
    let text = state.composer.text();
    let rich_text = state.composer.rich_text();

    // Detection may lag behind typing; highlight the part it covers
    let (segments, rest) = if text.starts_with(rich_text.text.as_str()) {
        (rich_text.segments(), &text[rich_text.text.len()..])
    } else {
        (Vec::new(), text)
    };

    let mut lines = vec![Vec::new()];
    let runs = segments
        .iter()
        .map(|s| {
            let style = if s.facet.is_some() {
                colors.text_facet()
            } else {
                colors.text()
            };
            (s.text, style)
        })
        .chain(std::iter::once((rest, colors.text())));

    for (run, style) in runs {
        for (i, part) in run.split('\n').enumerate() {
            if i > 0 {
                lines.push(Vec::new());
            }
            if !part.is_empty()
                && let Some(line) = lines.last_mut()
            {
                line.push(Span::styled(part, style));
            }
        }
    }

    lines.into_iter().map(Line::from).collect()
}

fn render_text(frame: &mut Frame, state: &AppState, colors: &ThemeColors, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if state.mode == Mode::Editing {
            colors.block_focus()
        } else {
            colors.block()
        })
        .style(Style::default().bg(colors.bg));

    let content = if state.composer.text().is_empty() {
        vec![Line::from(Span::styled(
            "What's up?",
            colors.text_muted(),
        ))]
    } else {
        text_lines(state, colors)
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);

    if state.mode == Mode::Editing {
        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2);
        let (col, row) = cursor_offset(state.composer.text(), inner_width);
        if col < inner_width && row < inner_height {
            frame.set_cursor_position((area.x + 1 + col, area.y + 1 + row));
        }
    }
}

/// Cursor position after the last character of `text`, counting soft wraps
/// at `width` columns. Wrapping is approximated per column, not per word.
fn cursor_offset(text: &str, width: u16) -> (u16, u16) {
    if width == 0 {
        return (0, 0);
    }
    let width = usize::from(width);
    let mut row = 0;
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        let cols = line.width();
        if lines.peek().is_none() {
            row += cols / width;
            let col = cols % width;
            return (clamp_u16(col), clamp_u16(row));
        }
        row += cols.div_ceil(width).max(1);
    }
    (0, clamp_u16(row))
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn image_card<'a>(attachment: &'a Attachment, colors: &ThemeColors) -> Vec<Line<'a>> {
    let asset = &attachment.asset;
    let badge = if attachment.has_alt() {
        Span::styled(" ALT ", colors.selected())
    } else {
        Span::styled(" + ALT ", colors.text_muted())
    };

    vec![
        Line::from(Span::styled(
            format!("{}×{} · {}", asset.width, asset.height, asset.size_label()),
            colors.text_dim(),
        )),
        Line::from(badge),
        Line::from(Span::styled(attachment.alt_text(), colors.text())),
    ]
}

fn render_images(frame: &mut Frame, state: &AppState, colors: &ThemeColors, area: Rect) {
    let attachments = &state.composer.attachments;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, MAX_IMAGES as u32); MAX_IMAGES])
        .split(area);

    for (i, attachment) in attachments.iter().enumerate() {
        let selected = i == state.selected_image;
        let card = Paragraph::new(image_card(attachment, colors))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(if selected {
                        colors.block_focus()
                    } else {
                        colors.block()
                    })
                    .title(format!(" {} ", attachment.asset.file_name()))
                    .title_style(colors.text_primary()),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(card, chunks[i]);
    }

    if !attachments.is_full() {
        let add = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("+ Add image", colors.text_secondary())),
            Line::from(Span::styled("Ctrl+O", colors.key_hint())),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(colors.block()),
        );
        frame.render_widget(add, chunks[attachments.len()]);
    }
}

fn render_footer(frame: &mut Frame, state: &AppState, colors: &ThemeColors, area: Rect) {
    let composer = &state.composer;

    let mut right = Vec::new();
    if !composer.attachments.is_empty() {
        right.push(Span::styled(composer.attachments.label(), colors.text_dim()));
        right.push(Span::raw("  "));
    }
    if composer.show_counter() {
        right.push(Span::styled(
            composer.counter_label(),
            if composer.is_too_long() {
                colors.text_error()
            } else {
                colors.text_dim()
            },
        ));
        right.push(Span::raw(" "));
    }
    let right_width: u16 = right.iter().map(|s| s.width() as u16).sum();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right_width)])
        .split(area);

    let left = if state.status.is_empty() {
        vec![
            Span::raw(" "),
            Span::styled("Ctrl+S", colors.key_hint()),
            Span::styled(": post  ", colors.text_muted()),
            Span::styled("Ctrl+O", colors.key_hint()),
            Span::styled(": image  ", colors.text_muted()),
            Span::styled("Ctrl+D", colors.key_hint()),
            Span::styled(": drafts  ", colors.text_muted()),
            Span::styled("F1", colors.key_hint()),
            Span::styled(": help", colors.text_muted()),
        ]
    } else {
        vec![
            Span::raw(" "),
            Span::styled(state.status.as_str(), colors.text_secondary()),
        ]
    };

    let bar = Style::default().bg(colors.surface);
    frame.render_widget(Paragraph::new(Line::from(left)).style(bar), chunks[0]);
    frame.render_widget(Paragraph::new(Line::from(right)).style(bar), chunks[1]);
}

fn popup_block<'a>(colors: &ThemeColors, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(colors.block_focus())
        .style(Style::default().bg(colors.surface))
        .title(title)
        .title_style(colors.text_primary())
}

fn render_prompt(frame: &mut Frame, state: &AppState, title: &str, label: &str) {
    let colors = state.theme.colors();
    let area = frame.area();
    let popup_area = fixed_height_rect(60, 3, area);

    frame.render_widget(Clear, popup_area);
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled(label, colors.text_dim()),
        Span::styled(state.input.as_str(), colors.text()),
    ]))
    .block(
        popup_block(&colors, title)
            .title_bottom(Line::from(" ↵ confirm │ Esc cancel ").centered()),
    );
    frame.render_widget(prompt, popup_area);

    let cursor_x = popup_area.x + 1 + (label.width() + state.input.width()) as u16;
    if cursor_x < (popup_area.x + popup_area.width).saturating_sub(1) {
        frame.set_cursor_position((cursor_x, popup_area.y + 1));
    }
}

fn render_cancel_menu(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let popup_area = fixed_height_rect(30, CancelChoice::ALL.len() as u16 + 2, frame.area());

    let items: Vec<ListItem> = CancelChoice::ALL
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let selected = i == state.cancel_index;
            let style = match (selected, choice) {
                (true, _) => colors.selected(),
                (false, CancelChoice::Discard) => colors.text_error(),
                (false, _) => colors.text(),
            };
            ListItem::new(Line::from(Span::styled(
                format!(" {} {} ", if selected { "▸" } else { " " }, choice.label()),
                style,
            )))
        })
        .collect();

    frame.render_widget(Clear, popup_area);
    frame.render_widget(
        List::new(items).block(popup_block(&colors, " Discard post? ")),
        popup_area,
    );
}

fn render_drafts(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let popup_area = centered_rect(60, 60, frame.area());
    let preview_width = popup_area.width.saturating_sub(24) as usize;

    let items: Vec<ListItem> = if state.drafts.is_empty() {
        vec![ListItem::new(Span::styled(" No saved drafts", colors.text_muted()))]
    } else {
        state
            .drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| {
                let selected = i == state.draft_index;
                let style = if selected {
                    colors.selected()
                } else {
                    colors.text()
                };
                let mut spans = vec![
                    Span::styled(
                        format!(" {} ", draft.updated_at.format("%b %d %H:%M")),
                        colors.text_dim(),
                    ),
                    Span::styled(draft.preview(preview_width), style),
                ];
                if !draft.images.is_empty() {
                    spans.push(Span::styled(
                        format!(" 🖼 {}", draft.images.len()),
                        colors.text_muted(),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let title = format!(" Drafts ({}) ", state.drafts.len());
    frame.render_widget(Clear, popup_area);
    frame.render_widget(
        List::new(items).block(
            popup_block(&colors, &title)
                .title_bottom(Line::from(" ↑↓ navigate │ ↵ open │ d delete │ Esc back ").centered()),
        ),
        popup_area,
    );
}

fn render_theme_picker(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let popup_area = centered_rect(50, 70, frame.area());

    let bg_block = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(Clear, popup_area);
    frame.render_widget(bg_block, popup_area);

    let themes = Theme::all();
    let items: Vec<ListItem> = themes
        .iter()
        .enumerate()
        .map(|(i, theme_name)| {
            let palette = theme_name.palette();
            let selected = i == state.theme_picker_index;

            let preview = format!(
                "  {} {} ",
                if selected { "▸" } else { " " },
                theme_name.display_name()
            );

            let style = if selected {
                Style::default()
                    .fg(palette.accent)
                    .bg(palette.selection)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.fg).bg(colors.bg)
            };

            ListItem::new(Line::from(vec![
                Span::styled(preview, style),
                Span::styled("█", Style::default().fg(palette.accent).bg(colors.bg)),
                Span::styled("█", Style::default().fg(palette.secondary).bg(colors.bg)),
                Span::styled("█", Style::default().fg(palette.info).bg(colors.bg)),
                Span::styled("█", Style::default().fg(palette.error).bg(colors.bg)),
            ]))
        })
        .collect();

    let theme_list = List::new(items)
        .style(Style::default().bg(colors.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.accent))
                .border_type(BorderType::Rounded)
                .style(Style::default().bg(colors.bg))
                .title(format!(
                    " 🎨 Select Theme ({}/{}) ",
                    state.theme_picker_index + 1,
                    themes.len()
                ))
                .title_bottom(Line::from(" ↑↓ navigate │ ↵ apply │ Esc cancel ").centered()),
        );

    frame.render_widget(theme_list, popup_area);
}

fn render_help_popup(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let popup_area = centered_rect(50, 70, frame.area());

    let bg_block = Block::default().style(Style::default().bg(colors.surface));
    frame.render_widget(Clear, popup_area);
    frame.render_widget(bg_block, popup_area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {k:<17}"), colors.key_hint()),
            Span::styled(what, colors.text()),
        ])
    };
    let heading = |title: &'static str| {
        Line::from(Span::styled(
            format!("  {title}"),
            colors.text_primary().add_modifier(Modifier::BOLD),
        ))
    };

    let help_content = vec![
        Line::from(""),
        heading("Post"),
        key("Ctrl+S", "Publish"),
        key("Enter", "New line"),
        key("Esc", "Cancel (save, discard or keep)"),
        Line::from(""),
        heading("Images"),
        key("Ctrl+O", "Attach an image by path"),
        key("Ctrl+L", "Describe the selected image"),
        key("Ctrl+X", "Remove the selected image"),
        key("Alt+←/→", "Select image"),
        Line::from(""),
        heading("Other"),
        key("Ctrl+D", "Saved drafts"),
        key("Ctrl+T", "Theme"),
        key("F1", "This help"),
        key("Ctrl+C", "Quit"),
    ];

    let help = Paragraph::new(help_content)
        .block(popup_block(&colors, " ⌨ Keyboard Shortcuts "))
        .wrap(Wrap { trim: false });

    frame.render_widget(help, popup_area);
}

const fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_width = r.width * percent_x / 100;
    let popup_height = r.height * percent_y / 100;
    Rect {
        x: r.x + (r.width.saturating_sub(popup_width)) / 2,
        y: r.y + (r.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    }
}

const fn fixed_height_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_width = r.width * percent_x / 100;
    let height = if height < r.height { height } else { r.height };
    Rect {
        x: r.x + (r.width.saturating_sub(popup_width)) / 2,
        y: r.y + (r.height.saturating_sub(height)) / 2,
        width: popup_width,
        height,
    }
}
