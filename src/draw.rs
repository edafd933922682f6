use chrono::Local;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::quadrant::QuadrantView;
use crate::components::theme::{ThemeColor, resolve, status_style};
use crate::state::app_state::{ActiveView, FeedState, NotificationLevel};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use campus_api::session::SessionState;
use campus_api::view::{self, MatchRow, Quadrant};
use campus_api::{MatchStatus, Side};

static TABS: &[&str; 5] = &["Live", "Schedule", "Results", "Big Screen", "Teams"];

const HELP_TEXT: &str = "\
q / Ctrl-C   quit
1-5          switch tab
j/k, ↑/↓     move selection
?            this help (Esc to close)
f            full screen
\"            toggle log pane

Live
  a / b      +1 point for team A / B
  A / B      -1 point for team A / B
  s          cycle status (SCH → LIVE → FNL)

Schedule, Results
  s          cycle status

Big Screen
  h/l, ←/→   select quadrant
  c          assign next sport to quadrant
  x          clear quadrant

Writes need a login (CAMPUS_USERNAME / CAMPUS_PASSWORD) or CAMPUS_TOKEN.";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status_line(f, layout.status, app);
        }

        match app.state.active_tab {
            MenuItem::Help => draw_help(f, layout.main),
            MenuItem::BigScreen => draw_big_screen(f, layout.main, app),
            MenuItem::Teams => draw_teams(f, layout.main, app),
            tab => draw_matches(f, layout.main, app, tab),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Live => 0,
        MenuItem::Schedule => 1,
        MenuItem::Results => 2,
        MenuItem::BigScreen => 3,
        MenuItem::Teams => 4,
        MenuItem::Help => tab_position(app.state.previous_tab),
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn tab_position(tab: MenuItem) -> usize {
    TABS.iter().position(|t| *t == tab.title()).unwrap_or(0)
}

/// Placeholder text for a view with no rows to show.
fn empty_message(active: Option<&ActiveView>, empty: &str) -> String {
    let Some(active) = active else {
        return "Not connected".to_string();
    };
    if let Some(err) = active.session.load_error() {
        return format!("Could not load data:\n{err}");
    }
    if active.session.state() == SessionState::Connecting {
        return "Loading...".to_string();
    }
    empty.to_string()
}

fn draw_centered(f: &mut Frame, area: Rect, msg: String) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_matches(f: &mut Frame, area: Rect, app: &App, tab: MenuItem) {
    let block = default_border(Color::White).title(format!(" {} ", tab.title()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let active = app.state.view.as_ref().filter(|v| v.tab == tab);
    let rows: Vec<MatchRow> = match (active, tab.match_view()) {
        (Some(active), Some(match_view)) => {
            let model = active.session.model();
            view::project_matches(&model.matches, &model.teams, &match_view)
        }
        _ => Vec::new(),
    };

    if rows.is_empty() {
        let empty = match tab {
            MenuItem::Live => "No matches in progress",
            MenuItem::Schedule => "Nothing scheduled",
            _ => "No results yet",
        };
        draw_centered(f, inner, empty_message(active, empty));
        return;
    }

    let selected = active.map(|v| v.selected).unwrap_or(0);
    // Keep the selection on screen once the list is taller than the pane.
    let visible = inner.height as usize;
    let skip = (selected + 1).saturating_sub(visible);

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(idx, row)| match_line(row, idx == selected))
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

fn match_line(row: &MatchRow, selected: bool) -> Line<'static> {
    let marker = if selected { ">" } else { " " };
    let when = row
        .scheduled_at
        .map(|t| t.with_timezone(&Local).format("%m/%d %H:%M").to_string())
        .unwrap_or_else(|| "--/-- --:--".to_string());

    let team_style = |side: Side| {
        if row.status != MatchStatus::Scheduled && row.leader() == Some(side) {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };

    let mut spans = vec![
        Span::raw(format!("{marker} ")),
        Span::styled(format!("{:<4} ", row.status.label()), status_style(row.status)),
        Span::styled(format!("{when}  "), resolve(ThemeColor::Dim)),
        Span::styled(format!("{:<10} ", row.sport), resolve(ThemeColor::Primary)),
        Span::styled(row.team_a.clone(), team_style(Side::A)),
    ];
    if row.status == MatchStatus::Scheduled {
        spans.push(Span::raw(" vs "));
    } else {
        spans.push(Span::raw(format!(" {} - {} ", row.points_a, row.points_b)));
    }
    spans.push(Span::styled(row.team_b.clone(), team_style(Side::B)));
    if !row.venue.is_empty() {
        spans.push(Span::styled(format!("  @ {}", row.venue), resolve(ThemeColor::Dim)));
    }

    let line = Line::from(spans);
    if selected {
        line.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        line
    }
}

fn draw_big_screen(f: &mut Frame, area: Rect, app: &App) {
    let Some(active) = app.state.view.as_ref().filter(|v| v.tab == MenuItem::BigScreen) else {
        draw_centered(f, area, "Not connected".to_string());
        return;
    };
    let model = active.session.model();
    let quadrants = view::project_quadrants(&model.layout, &model.matches, &model.teams, &model.sports);
    if let Some(msg) = big_screen_error(active, &quadrants) {
        let block = default_border(Color::White).title(" Big Screen ");
        let inner = block.inner(area);
        f.render_widget(block, area);
        draw_centered(f, inner, msg);
        return;
    }

    let [top, bottom] = Layout::vertical([Constraint::Percentage(50); 2]).areas(area);
    let [q0, q1] = Layout::horizontal([Constraint::Percentage(50); 2]).areas(top);
    let [q2, q3] = Layout::horizontal([Constraint::Percentage(50); 2]).areas(bottom);

    for (index, (quadrant, rect)) in quadrants.iter().zip([q0, q1, q2, q3]).enumerate() {
        f.render_widget(
            QuadrantView { quadrant, index, selected: index == active.selected_quadrant },
            rect,
        );
    }
}

/// A failed snapshot only blanks the big screen while events have not
/// assigned any quadrant since.
fn big_screen_error(active: &ActiveView, quadrants: &[Quadrant]) -> Option<String> {
    let err = active.session.load_error()?;
    quadrants
        .iter()
        .all(|q| matches!(q, Quadrant::Unassigned))
        .then(|| format!("Could not load data:\n{err}"))
}

fn draw_teams(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Teams ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let active = app.state.view.as_ref().filter(|v| v.tab == MenuItem::Teams);
    let rows = active
        .map(|v| {
            let model = v.session.model();
            view::project_teams(&model.teams, &model.schools, &model.sports)
        })
        .unwrap_or_default();

    if rows.is_empty() {
        draw_centered(f, inner, empty_message(active, "No teams registered"));
        return;
    }

    let selected = active.map(|v| v.selected).unwrap_or(0);
    let visible = inner.height as usize;
    let skip = (selected + 1).saturating_sub(visible);

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(idx, row)| {
            let marker = if idx == selected { ">" } else { " " };
            let line = Line::from(vec![
                Span::raw(format!("{marker} {:<24} ", row.name)),
                Span::styled(format!("{:<24} ", row.school), resolve(ThemeColor::Dim)),
                Span::styled(format!("{:<12} ", row.sport), resolve(ThemeColor::Primary)),
                Span::raw(row.gender.as_wire()),
            ]);
            if idx == selected {
                line.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                line
            }
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    f.render_widget(Paragraph::new(HELP_TEXT).block(block), area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let (feed_label, feed_style) = match app.state.feed {
        FeedState::Connecting => ("connecting", resolve(ThemeColor::Dim)),
        FeedState::Online => ("live", resolve(ThemeColor::Live)),
        FeedState::Offline => ("reconnecting", resolve(ThemeColor::Accent)),
        FeedState::Stopped => ("offline", resolve(ThemeColor::Error)),
    };

    let mut spans = vec![
        Span::styled(format!(" ● {feed_label} "), feed_style),
        Span::styled(format!("│ {} ", app.state.auth.label()), resolve(ThemeColor::Dim)),
    ];
    if let Some(note) = &app.state.notification {
        let style = match note.level {
            NotificationLevel::Info => resolve(ThemeColor::Accent),
            NotificationLevel::Error => resolve(ThemeColor::Error),
        };
        spans.push(Span::styled(format!("│ {}", note.message), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .block(default_border(Color::DarkGray).title(" Logs "));
    f.render_widget(logs, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
