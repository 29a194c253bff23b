use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use todogenius_core::display::{completion_summary, due_state, format_date, DueState};
use todogenius_core::task::{Status, Task};

use super::widgets::{band_style, category_span, due_style};

pub struct TaskList {
    tasks: Vec<Task>,
    list_state: ListState,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut list = Self {
            tasks: Vec::new(),
            list_state: ListState::default(),
        };
        list.set_tasks(tasks);
        list
    }

    /// Replace the tasks, keeping the cursor on the same task when it survives.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        let selected_id = self.selected_task().map(|t| t.id.clone());
        self.tasks = tasks;
        if let Some(id) = selected_id {
            if self.select_task_by_id(&id) {
                return;
            }
        }
        let idx = self
            .list_state
            .selected()
            .map(|i| i.min(self.tasks.len().saturating_sub(1)));
        self.list_state
            .select(if self.tasks.is_empty() { None } else { idx.or(Some(0)) });
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let idx = self.list_state.selected()?;
        self.tasks.get(idx)
    }

    pub fn select_task_by_id(&mut self, task_id: &str) -> bool {
        match self.tasks.iter().position(|t| t.id == task_id) {
            Some(idx) => {
                self.list_state.select(Some(idx));
                true
            }
            None => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.tasks.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if current + 1 < self.tasks.len() {
                    self.list_state.select(Some(current + 1));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if current > 0 {
                    self.list_state.select(Some(current - 1));
                }
            }
            KeyCode::Char('g') | KeyCode::Home => self.list_state.select(Some(0)),
            KeyCode::Char('G') | KeyCode::End => {
                self.list_state.select(Some(self.tasks.len() - 1))
            }
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, now: DateTime<Utc>, loading: bool) {
        let (done, total) = completion_summary(&self.tasks);
        let mut title = format!(" Tasks ({done}/{total} completed) ");
        if loading {
            title.push_str("… ");
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if self.tasks.is_empty() {
            let text = if loading {
                "Loading tasks..."
            } else {
                "No tasks found. Press n to create one."
            };
            let paragraph = Paragraph::new(text)
                .block(block)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self.tasks.iter().map(|t| task_item(t, now)).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).bold())
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn task_item(task: &Task, now: DateTime<Utc>) -> ListItem<'static> {
    let check = if task.is_completed() { "[x] " } else { "[ ] " };
    let band = task.band();
    let title_style = if task.is_completed() {
        Style::default().fg(Color::DarkGray).crossed_out()
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw(check),
        Span::styled("● ", band_style(band)),
        Span::styled(task.title.clone(), title_style),
    ];
    if task.is_ai_enhanced {
        spans.push(Span::styled(" ✦", Style::default().fg(Color::Magenta)));
    }
    if let Some(cat) = task.category() {
        spans.push(Span::raw(" "));
        spans.push(category_span(&cat.name, &cat.color));
    }

    let state = due_state(task, now);
    if let Some(date) = task.deadline_date() {
        let label = match state {
            DueState::Overdue => format!("Overdue {}", format_date(date)),
            DueState::DueSoon => format!("Due soon {}", format_date(date)),
            _ => format_date(date),
        };
        spans.push(Span::styled(format!("  {label}"), due_style(state)));
        if task.is_ai_suggested_deadline {
            spans.push(Span::styled(" (AI)", Style::default().fg(Color::Magenta)));
        }
    }
    if task.status != Status::Pending && !task.is_completed() {
        spans.push(Span::styled(
            format!("  {}", task.status.display_name()),
            Style::default().fg(Color::Blue),
        ));
    }

    ListItem::new(Line::from(spans))
}
