use crate::card::{card_checklist_progress, card_dates, Card, DateField, LabelColor};
use crate::config::Config;
use crate::date_status::{classify, DateStatus};
use crate::errors::{BoardError, DateInputError};
use crate::kanban_board::KanbanBoard;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use anyhow::Context;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

const HELP: &str = "q quit  a card  L list  l label  c item  t tick  d/s/e/r dates  \
                    Enter/Bksp move  K/J reorder  x archive";

/// Saves the board and then runs `restore`, which puts the terminal back.
/// A failed restore never costs the session's edits; when both steps fail the
/// save error is returned and the restore error only logged.
pub fn save_and_restore<F>(board: &KanbanBoard, path: &Path, restore: F) -> anyhow::Result<()>
where
    F: FnOnce() -> io::Result<()>,
{
    let saved = board
        .save(path)
        .with_context(|| format!("Failed to save board to {}", path.display()));
    let restored = restore().context("Failed to restore terminal");
    match (saved, restored) {
        (Err(err), Err(restore_err)) => {
            warn!(error = ?restore_err, "terminal restore failed after a failed save");
            Err(err)
        }
        (saved, restored) => saved.and(restored),
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    board: &mut KanbanBoard,
    config: &Config,
) -> io::Result<()> {
    let offset = config.utc_offset();
    let interval = config.refresh_interval();
    let mut now = Utc::now();
    let mut last_tick = Instant::now();
    let mut status: Option<String> = None;

    loop {
        terminal.draw(|f| draw(f, board, now, offset, status.as_deref()))?;

        let timeout = interval.saturating_sub(last_tick.elapsed());
        if !event::poll(timeout)? {
            now = Utc::now();
            last_tick = Instant::now();
            debug!(%now, "refreshed clock");
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let selected = board.selected_card_id();
        let result: Result<(), String> = match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Char('a') => match (board.selected_list_id(), prompt("Card title")) {
                (Some(list_id), Some(title)) => board
                    .add_card(list_id, &title)
                    .map(|_| board.select_last_card())
                    .map_err(|e| e.to_string()),
                (None, _) => Err("add a list first (L)".to_string()),
                _ => Ok(()),
            },
            KeyCode::Char('L') => match prompt("List title") {
                Some(title) => board.add_list(&title).map(|_| ()).map_err(|e| e.to_string()),
                None => Ok(()),
            },
            KeyCode::Char('l') => on_card(selected, |card_id| {
                match prompt("Label name") {
                    Some(name) => toggle_label_by_name(board, card_id, &name)
                        .map(|_| ())
                        .map_err(|e| e.to_string()),
                    None => Ok(()),
                }
            }),
            KeyCode::Char('c') => on_card(selected, |card_id| match prompt("Checklist item") {
                Some(title) => add_item(board, card_id, &title)
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
                None => Ok(()),
            }),
            KeyCode::Char('t') => on_card(selected, |card_id| {
                finish_next_item(board, card_id)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }),
            KeyCode::Char(c @ ('d' | 's' | 'e' | 'r')) => {
                let field = match c {
                    'd' => DateField::Due,
                    's' => DateField::Start,
                    'e' => DateField::End,
                    _ => DateField::Received,
                };
                on_card(selected, |card_id| {
                    let message = format!(
                        "{} date (YYYY-MM-DD [HH:MM], empty clears)",
                        field.label()
                    );
                    match prompt(&message) {
                        Some(input) => apply_date_input(board, card_id, field, &input, offset),
                        None => Ok(()),
                    }
                })
            }
            KeyCode::Char('x') => on_card(selected, |card_id| {
                board.archive_card(card_id).map_err(|e| e.to_string())?;
                board.clamp_card_cursor();
                Ok(())
            }),
            KeyCode::Char('K') => board.reorder_selected_card(-1).map_err(|e| e.to_string()),
            KeyCode::Char('J') => board.reorder_selected_card(1).map_err(|e| e.to_string()),
            KeyCode::Left => {
                board.select_list(-1);
                Ok(())
            }
            KeyCode::Right => {
                board.select_list(1);
                Ok(())
            }
            KeyCode::Up => {
                board.select_card(-1);
                Ok(())
            }
            KeyCode::Down => {
                board.select_card(1);
                Ok(())
            }
            KeyCode::Enter => board.shift_selected_card(1).map_err(|e| e.to_string()),
            KeyCode::Backspace => board.shift_selected_card(-1).map_err(|e| e.to_string()),
            _ => Ok(()),
        };

        status = match result {
            Ok(()) => None,
            Err(message) => {
                warn!(key = ?key.code, %message, "board action rejected");
                Some(message)
            }
        };
        if matches!(
            key.code,
            KeyCode::Char('a' | 'L' | 'l' | 'c' | 'd' | 's' | 'e' | 'r')
        ) {
            // The prompt wrote outside ratatui's buffer.
            terminal.clear()?;
        }
        now = Utc::now();
    }
}

fn on_card<F>(selected: Option<u32>, f: F) -> Result<(), String>
where
    F: FnOnce(u32) -> Result<(), String>,
{
    match selected {
        Some(card_id) => f(card_id),
        None => Err("no card selected".to_string()),
    }
}

fn draw(
    f: &mut Frame,
    board: &KanbanBoard,
    now: DateTime<Utc>,
    offset: FixedOffset,
    status: Option<&str>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let lists = board.sorted_lists();
    let count = lists.len().max(1) as u32;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(rows[0]);

    for (i, list) in lists.iter().enumerate() {
        let items: Vec<ListItem> = board
            .cards_in_list(list.id)
            .into_iter()
            .map(|card| ListItem::new(card_line(board, card, now, offset)))
            .collect();

        let selected = board.selected_list == i;
        let widget = List::new(items)
            .block(
                Block::default()
                    .title(list.title.as_str())
                    .borders(Borders::ALL)
                    .border_style(if selected {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if selected {
            state.select(Some(board.selected_card));
        }
        f.render_stateful_widget(widget, columns[i], &mut state);
    }

    let footer = match status {
        Some(message) => Paragraph::new(message).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(HELP).style(Style::default().add_modifier(Modifier::DIM)),
    };
    f.render_widget(footer, rows[1]);
}

fn card_line<'a>(
    board: &'a KanbanBoard,
    card: &'a Card,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Line<'a> {
    let mut spans = vec![
        Span::raw(format!("[#{}] ", card.id)),
        Span::styled(card.title.as_str(), Style::default().fg(Color::White)),
    ];

    for label in card.label_ids.iter().filter_map(|&id| board.label(id)) {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            label.name.as_str(),
            Style::default().fg(label_color(label.color)),
        ));
    }

    let (finished, total) = card_checklist_progress(card);
    if total > 0 {
        spans.push(Span::raw(format!(" [{finished}/{total}]")));
    }

    let statuses = classify(now, &card_dates(card));
    let badges = [
        (DateField::Received, card.received_at, statuses.received),
        (DateField::Start, card.start_at, statuses.start),
        (DateField::Due, card.due_at, statuses.due),
        (DateField::End, card.end_at, statuses.end),
    ];
    for (field, at, status) in badges {
        if let (Some(at), Some(status)) = (at, status) {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!(
                    "{}: {}",
                    field.label(),
                    at.with_timezone(&offset).format("%m-%d %H:%M")
                ),
                status_style(status),
            ));
        }
    }

    Line::from(spans)
}

pub fn status_style(status: DateStatus) -> Style {
    match status {
        DateStatus::LongOverdue => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        DateStatus::Due => Style::default().fg(Color::Red),
        DateStatus::AlmostDue => Style::default().fg(Color::Yellow),
        DateStatus::Overdue => Style::default().fg(Color::Magenta),
        DateStatus::Early => Style::default().fg(Color::Green),
        DateStatus::Future => Style::default().fg(Color::Blue),
        DateStatus::Current => Style::default(),
        DateStatus::None => Style::default().add_modifier(Modifier::DIM),
    }
}

fn label_color(color: LabelColor) -> Color {
    match color {
        LabelColor::Green => Color::Green,
        LabelColor::Yellow => Color::Yellow,
        LabelColor::Orange => Color::Rgb(255, 159, 26),
        LabelColor::Red => Color::Red,
        LabelColor::Purple => Color::Magenta,
        LabelColor::Blue => Color::Blue,
        LabelColor::Sky => Color::Cyan,
        LabelColor::Lime => Color::LightGreen,
        LabelColor::Pink => Color::LightMagenta,
        LabelColor::Black => Color::DarkGray,
    }
}

/// Parses prompt input in the configured timezone. Empty input clears the
/// date.
pub fn parse_date_input(
    input: &str,
    offset: FixedOffset,
) -> Result<Option<DateTime<Utc>>, DateInputError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DateInputError::Unrecognised(input.to_string()))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| Some(local.with_timezone(&Utc)))
        .ok_or_else(|| DateInputError::Nonexistent(input.to_string()))
}

fn apply_date_input(
    board: &mut KanbanBoard,
    card_id: u32,
    field: DateField,
    input: &str,
    offset: FixedOffset,
) -> Result<(), String> {
    let value = parse_date_input(input, offset).map_err(|e| e.to_string())?;
    board
        .set_card_date(card_id, field, value)
        .map_err(|e| e.to_string())
}

/// Toggles a label on a card by name, creating the label first if the board
/// has none by that name.
pub fn toggle_label_by_name(
    board: &mut KanbanBoard,
    card_id: u32,
    name: &str,
) -> Result<bool, BoardError> {
    if board.card(card_id).is_none() {
        return Err(BoardError::CardNotFound(card_id));
    }
    let existing = board.label_by_name(name).map(|label| label.id);
    let label_id = match existing {
        Some(id) => id,
        None => {
            let color = LabelColor::nth(board.labels.len());
            board.add_label(name, color)?
        }
    };
    board.toggle_card_label(card_id, label_id)
}

/// Appends an item to the card's first checklist, creating one if needed.
pub fn add_item(board: &mut KanbanBoard, card_id: u32, title: &str) -> Result<u32, BoardError> {
    if title.trim().is_empty() {
        return Err(BoardError::EmptyTitle);
    }
    let card = board.card(card_id).ok_or(BoardError::CardNotFound(card_id))?;
    let first = card
        .checklists
        .iter()
        .min_by(|a, b| a.sort.total_cmp(&b.sort))
        .map(|checklist| checklist.id);
    let checklist_id = match first {
        Some(id) => id,
        None => board.add_checklist(card_id, "Checklist")?,
    };
    board.add_checklist_item(card_id, checklist_id, title)
}

/// Ticks off the first unfinished item, in checklist then item order.
/// Returns the item's id, or `None` when everything is done.
pub fn finish_next_item(board: &mut KanbanBoard, card_id: u32) -> Result<Option<u32>, BoardError> {
    let card = board.card(card_id).ok_or(BoardError::CardNotFound(card_id))?;
    let mut checklists: Vec<_> = card.checklists.iter().collect();
    checklists.sort_by(|a, b| a.sort.total_cmp(&b.sort));
    let next = checklists.iter().find_map(|checklist| {
        let mut items: Vec<_> = checklist.items.iter().filter(|i| !i.is_finished).collect();
        items.sort_by(|a, b| a.sort.total_cmp(&b.sort));
        items.first().map(|item| (checklist.id, item.id))
    });
    match next {
        Some((checklist_id, item_id)) => {
            board.toggle_checklist_item(card_id, checklist_id, item_id)?;
            Ok(Some(item_id))
        }
        None => Ok(None),
    }
}

fn prompt(message: &str) -> Option<String> {
    disable_raw_mode().ok();
    println!("{}", message);
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input);
    enable_raw_mode().ok();
    read.ok().map(|_| input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn board_with_card() -> (KanbanBoard, u32) {
        let mut board = KanbanBoard::with_lists(&["Todo"]).unwrap();
        let list = board.sorted_lists()[0].id;
        let card = board.add_card(list, "card").unwrap();
        (board, card)
    }

    #[test]
    fn failed_restore_still_saves_the_board() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let (board, card) = board_with_card();

        let result = save_and_restore(&board, &path, || Err(io::Error::other("tty gone")));

        assert!(result.is_err());
        let reloaded = KanbanBoard::load(&path).unwrap();
        assert_eq!(reloaded.card(card).map(|c| c.title.as_str()), Some("card"));
    }

    #[test]
    fn failed_save_still_restores_the_terminal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing/board.json");
        let (board, _) = board_with_card();
        let mut restored = false;

        let result = save_and_restore(&board, &path, || {
            restored = true;
            Ok(())
        });

        assert!(result.is_err());
        assert!(restored);
    }

    #[test]
    fn parses_date_and_time_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 10, 12, 30, 0).unwrap();
        assert_eq!(parse_date_input("2024-01-10 12:30", utc()), Ok(Some(expected)));
        assert_eq!(parse_date_input("2024-01-10T12:30", utc()), Ok(Some(expected)));
        assert_eq!(
            parse_date_input(" 2024-01-10 ", utc()),
            Ok(Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn empty_input_clears() {
        assert_eq!(parse_date_input("  ", utc()), Ok(None));
    }

    #[test]
    fn offset_shifts_to_utc() {
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            parse_date_input("2024-01-10 12:00", east),
            Ok(Some(Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap()))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_date_input("next tuesday", utc()),
            Err(DateInputError::Unrecognised(_))
        ));
        assert!(parse_date_input("2024-02-30", utc()).is_err());
    }

    #[test]
    fn label_by_name_is_created_once_and_toggled() {
        let (mut board, card) = board_with_card();
        assert!(toggle_label_by_name(&mut board, card, "Bug").unwrap());
        assert!(!toggle_label_by_name(&mut board, card, "bug").unwrap());
        assert_eq!(board.labels.len(), 1);
        assert!(toggle_label_by_name(&mut board, 999, "Bug").is_err());
        assert_eq!(board.labels.len(), 1);
    }

    #[test]
    fn items_go_to_first_checklist_and_tick_in_order() {
        let (mut board, card) = board_with_card();
        let first = add_item(&mut board, card, "first").unwrap();
        let second = add_item(&mut board, card, "second").unwrap();
        assert_eq!(board.card(card).map(|c| c.checklists.len()), Some(1));

        assert_eq!(finish_next_item(&mut board, card).unwrap(), Some(first));
        assert_eq!(finish_next_item(&mut board, card).unwrap(), Some(second));
        assert_eq!(finish_next_item(&mut board, card).unwrap(), None);
        assert!(matches!(add_item(&mut board, card, " "), Err(BoardError::EmptyTitle)));
    }

    #[test]
    fn status_styles_distinguish_urgency() {
        assert_eq!(status_style(DateStatus::Due).fg, Some(Color::Red));
        assert_eq!(status_style(DateStatus::AlmostDue).fg, Some(Color::Yellow));
        assert_ne!(
            status_style(DateStatus::LongOverdue),
            status_style(DateStatus::Due)
        );
    }
}
