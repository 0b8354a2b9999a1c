use std::{io, time::Duration};

use chrono::{DateTime, Local};
use color_eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use today_core::tasks::Task;
use today_task::{SaveStatus, TaskListView};

use crate::{dates, locale::Locale};

/// Interactive "Today" screen. Mutations go straight to the view, which
/// persists them in the background. Press `q` or `Esc` to exit.
pub fn launch(view: &mut TaskListView, locale: Locale) -> Result<()> {
    // Guard restores the terminal even if we early-return.
    let guard = TerminalGuard::enter()?;
    let mut terminal = guard.terminal()?;
    let mut ui = Ui::new(locale);

    loop {
        let now = Local::now();
        terminal.draw(|frame| draw(frame, view, &ui, &now))?;

        if event::poll(Duration::from_millis(150))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(view, &mut ui, key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Description,
    Date,
}

/// Input buffers of the add-task popup. Visibility lives in the view.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AddForm {
    description: String,
    date: String,
    focus: Field,
}

impl AddForm {
    fn blank() -> Self {
        Self {
            description: String::new(),
            date: dates::today_input(),
            focus: Field::Description,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Description => &mut self.description,
            Field::Date => &mut self.date,
        }
    }

    fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Field::Description => Field::Date,
            Field::Date => Field::Description,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Alert {
    title: &'static str,
    message: &'static str,
}

/// Screen-local state that is not persisted.
pub struct Ui {
    locale: Locale,
    selected: usize,
    form: AddForm,
    alert: Option<Alert>,
}

impl Ui {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            selected: 0,
            form: AddForm::blank(),
            alert: None,
        }
    }

    fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Apply one key press. Returns `true` when the user asked to quit.
pub fn handle_key(view: &mut TaskListView, ui: &mut Ui, key: KeyEvent) -> bool {
    if ui.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            ui.alert = None;
        }
        return false;
    }

    if view.is_add_form_visible() {
        handle_form_key(view, ui, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Down | KeyCode::Char('j') => {
            if ui.selected + 1 < view.visible().len() {
                ui.selected += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => ui.selected = ui.selected.saturating_sub(1),
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(id) = view.visible().get(ui.selected).map(|t| t.id) {
                view.toggle_task(id);
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = view.visible().get(ui.selected).map(|t| t.id) {
                view.delete_task(id);
            }
        }
        KeyCode::Char('f') => view.toggle_filter(),
        KeyCode::Char('a') | KeyCode::Char('+') => {
            ui.form = AddForm::blank();
            view.open_add_form();
        }
        _ => {}
    }
    ui.clamp(view.visible().len());
    false
}

fn handle_form_key(view: &mut TaskListView, ui: &mut Ui, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => view.cancel_add_form(),
        KeyCode::Tab | KeyCode::BackTab => ui.form.switch_focus(),
        KeyCode::Backspace => {
            ui.form.focused_mut().pop();
        }
        KeyCode::Char(c) => ui.form.focused_mut().push(c),
        KeyCode::Enter => {
            let Some(estimated_at) = dates::parse_estimate(&ui.form.date) else {
                ui.alert = Some(Alert {
                    title: ui.locale.invalid_data(),
                    message: ui.locale.invalid_date(),
                });
                return;
            };
            match view.add_task(&ui.form.description, estimated_at) {
                Ok(_) => {
                    ui.form = AddForm::blank();
                    ui.selected = view.visible().len().saturating_sub(1);
                }
                Err(_) => {
                    ui.alert = Some(Alert {
                        title: ui.locale.invalid_data(),
                        message: ui.locale.missing_description(),
                    })
                }
            }
        }
        _ => {}
    }
}

/// Render the whole screen for the given moment.
pub fn draw(frame: &mut Frame, view: &TaskListView, ui: &Ui, now: &DateTime<Local>) {
    let locale = ui.locale;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let state = view.state();
    let filter = if view.show_completed() {
        "[all]"
    } else {
        "[pending]"
    };
    let mut summary = vec![Span::raw(format!(
        "{} pending · {} done",
        state.pending_count(),
        state.done_count()
    ))];
    if let SaveStatus::Failed(reason) = view.save_status() {
        summary.push(Span::styled(
            format!("  unsaved: {reason}"),
            Style::default().fg(Color::Red),
        ));
    }
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                locale.title(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(filter, Style::default().fg(Color::Yellow)),
        ]),
        Line::from(locale.today_label(now)),
        Line::from(summary),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    frame.render_widget(header, chunks[0]);

    let list_block = Block::default().borders(Borders::ALL);
    if view.visible().is_empty() {
        let empty = Paragraph::new(locale.empty_list())
            .style(Style::default().fg(Color::DarkGray))
            .block(list_block);
        frame.render_widget(empty, chunks[1]);
    } else {
        let items: Vec<ListItem> = view
            .visible()
            .iter()
            .map(|task| task_item(task, locale))
            .collect();
        let list = List::new(items)
            .block(list_block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut list_state = ListState::default().with_selected(Some(ui.selected));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }

    let footer = Paragraph::new(Line::from(vec![
        key_hint("space"),
        Span::raw(" toggle  "),
        key_hint("d"),
        Span::raw(" delete  "),
        key_hint("a"),
        Span::raw(" add  "),
        key_hint("f"),
        Span::raw(" filter  "),
        key_hint("q"),
        Span::raw(" quit"),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[2]);

    if view.is_add_form_visible() {
        draw_form(frame, &ui.form);
    }
    if let Some(alert) = &ui.alert {
        draw_alert(frame, alert);
    }
}

fn task_item(task: &Task, locale: Locale) -> ListItem<'_> {
    let estimate = locale.short_date(&task.estimated_at.with_timezone(&Local));
    let (mark, text_style) = if task.is_done() {
        (
            "[x] ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ] ", Style::default().add_modifier(Modifier::BOLD))
    };
    let mut spans = vec![
        Span::styled(mark, Style::default().fg(Color::Green)),
        Span::styled(task.description.as_str(), text_style),
        Span::styled(format!("  {estimate}"), Style::default().fg(Color::Gray)),
    ];
    if let Some(done) = task.completed_at {
        let done = locale.short_date(&done.with_timezone(&Local));
        spans.push(Span::styled(
            format!("  ✓ {done}"),
            Style::default().fg(Color::Green),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn draw_form(frame: &mut Frame, form: &AddForm) {
    let area = centered_rect(60, 9, frame.area());
    frame.render_widget(Clear, area);
    let field = |label: &'static str, value: &str, field: Field| {
        let style = if form.focus == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let cursor = if form.focus == field { "_" } else { "" };
        Line::from(vec![
            Span::styled(label, style.add_modifier(Modifier::BOLD)),
            Span::raw(format!("{value}{cursor}")),
        ])
    };
    let body = Paragraph::new(vec![
        field("Description: ", &form.description, Field::Description),
        field("Date:        ", &form.date, Field::Date),
        Line::from(""),
        Line::from(vec![
            key_hint("tab"),
            Span::raw(" next field  "),
            key_hint("enter"),
            Span::raw(" save  "),
            key_hint("esc"),
            Span::raw(" cancel"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("New task"),
    );
    frame.render_widget(body, area);
}

fn draw_alert(frame: &mut Frame, alert: &Alert) {
    let area = centered_rect(50, 5, frame.area());
    frame.render_widget(Clear, area);
    let body = Paragraph::new(vec![Line::from(alert.message), Line::from("[ OK ]")]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(alert.title),
    );
    frame.render_widget(body, area);
}

fn key_hint(key: &'static str) -> Span<'static> {
    Span::styled(key, Style::default().fg(Color::Cyan))
}

/// Centered popup `percent_x` wide and `height` rows tall.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        // Enter alternate screen to avoid polluting the shell buffer.
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }

    fn terminal(&self) -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Terminal::new(backend)?)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup; errors are logged but not propagated from Drop.
        if let Err(err) = disable_raw_mode() {
            eprintln!("failed to disable raw mode: {err}");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture) {
            eprintln!("failed to restore terminal: {err}");
        }
    }
}
