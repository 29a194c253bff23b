use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use todogenius_core::context::{ContextEntry, SourceType};
use todogenius_core::display::relative_date;

pub struct ContextList {
    entries: Vec<ContextEntry>,
    list_state: ListState,
}

impl ContextList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            list_state: ListState::default(),
        }
    }

    pub fn set_entries(&mut self, entries: Vec<ContextEntry>) {
        let selected_id = self.selected().map(|e| e.id.clone());
        self.entries = entries;
        let idx = selected_id
            .and_then(|id| self.entries.iter().position(|e| e.id == id))
            .or_else(|| {
                self.list_state
                    .selected()
                    .map(|i| i.min(self.entries.len().saturating_sub(1)))
            })
            .or(Some(0));
        self.list_state
            .select(if self.entries.is_empty() { None } else { idx });
    }

    pub fn selected(&self) -> Option<&ContextEntry> {
        self.entries.get(self.list_state.selected()?)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.entries.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down if current + 1 < self.entries.len() => {
                self.list_state.select(Some(current + 1));
            }
            KeyCode::Char('k') | KeyCode::Up if current > 0 => {
                self.list_state.select(Some(current - 1));
            }
            KeyCode::Char('g') => self.list_state.select(Some(0)),
            KeyCode::Char('G') => self.list_state.select(Some(self.entries.len() - 1)),
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, today: NaiveDate, loading: bool) {
        let block = Block::default()
            .title(format!(" Context History ({}) ", self.entries.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if self.entries.is_empty() {
            let text = if loading {
                "Loading context..."
            } else {
                "No context entries yet."
            };
            frame.render_widget(
                Paragraph::new(text)
                    .block(block)
                    .style(Style::default().fg(Color::DarkGray)),
                area,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|e| {
                let date = e
                    .date()
                    .map(|d| relative_date(d, today))
                    .unwrap_or_default();
                let mut header = vec![
                    Span::styled(
                        format!("{:<9}", e.source_type.display_name()),
                        source_style(e.source_type),
                    ),
                    Span::styled(date, Style::default().fg(Color::Gray)),
                ];
                if e.is_processed {
                    header.push(Span::styled("  ✓ processed", Style::default().fg(Color::Green)));
                }
                let first_line = e.content.lines().next().unwrap_or_default().to_string();
                ListItem::new(vec![Line::from(header), Line::from(format!("  {first_line}"))])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");
        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }
}

impl Default for ContextList {
    fn default() -> Self {
        Self::new()
    }
}

fn source_style(source: SourceType) -> Style {
    match source {
        SourceType::Whatsapp => Style::default().fg(Color::Green),
        SourceType::Email => Style::default().fg(Color::Blue),
        SourceType::Note => Style::default().fg(Color::Yellow),
        SourceType::Other => Style::default().fg(Color::Gray),
    }
}
