use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use todogenius_core::category::Category;
use todogenius_core::priority::PriorityBand;

use super::widgets::{band_style, category_span, centered_rect, hex_color, priority_bar};
use crate::form::{CategoryOption, FormField, TaskForm};

pub fn render_task_form(
    frame: &mut Frame,
    area: Rect,
    form: &TaskForm,
    categories: &[Category],
    picker: Option<usize>,
) {
    let popup = centered_rect(80, 85, area);
    frame.render_widget(Clear, popup);

    let title = if form.is_edit() { " Edit Task " } else { " New Task " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let show_panel = form.reconciler().panel_visible();
    let columns = if show_panel {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(inner)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(inner)
    };

    render_fields(frame, columns[0], form);
    if show_panel {
        render_suggestion_panel(frame, columns[1], form);
    }
    if let Some(idx) = picker {
        render_category_picker(frame, area, &form.category_options(categories), idx);
    }
}

fn field_block(form: &TaskForm, field: FormField) -> Block<'static> {
    let style = if form.focus() == field {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(format!(" {} ", field.label()))
        .borders(Borders::ALL)
        .border_style(style)
}

fn render_fields(frame: &mut Frame, area: Rect, form: &TaskForm) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(area);

    let mut title_line = vec![Span::raw(form.title().to_string())];
    if form.reconciler().is_loading() {
        title_line.push(Span::styled(
            "  ✦ thinking...",
            Style::default().fg(Color::Magenta),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(title_line)).block(field_block(form, FormField::Title)),
        rows[0],
    );

    frame.render_widget(
        Paragraph::new(form.description().to_string())
            .wrap(Wrap { trim: false })
            .block(field_block(form, FormField::Description)),
        rows[1],
    );

    let category_line = match form.category() {
        Some(cat) => Line::from(category_span(&cat.name, &cat.color)),
        None => Line::from(Span::styled(
            "(none) Enter to choose",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(
        Paragraph::new(category_line).block(field_block(form, FormField::Category)),
        rows[2],
    );

    let band = PriorityBand::classify(form.priority());
    let priority_line = Line::from(vec![
        Span::styled(priority_bar(form.priority()), band_style(band)),
        Span::raw(format!(" {:.1} ", form.priority())),
        Span::styled(band.display_name(), band_style(band)),
    ]);
    frame.render_widget(
        Paragraph::new(priority_line).block(field_block(form, FormField::Priority)),
        rows[3],
    );

    let mut deadline_line = vec![Span::raw(if form.deadline_input().is_empty() {
        "YYYY-MM-DD".to_string()
    } else {
        form.deadline_input().to_string()
    })];
    if form.is_ai_suggested_deadline() {
        deadline_line.push(Span::styled(
            "  AI suggested",
            Style::default().fg(Color::Magenta),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(deadline_line)).block(field_block(form, FormField::Deadline)),
        rows[4],
    );

    let message = match (form.error(), form.reconciler().error(), form.is_saving()) {
        (_, _, true) => Line::from(Span::styled("Saving...", Style::default().fg(Color::Cyan))),
        (Some(err), _, _) => Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red))),
        (None, Some(ai_err), _) => {
            Line::from(Span::styled(ai_err.to_string(), Style::default().fg(Color::Red)))
        }
        (None, None, false) => Line::default(),
    };
    frame.render_widget(Paragraph::new(message), rows[5]);
}

fn render_suggestion_panel(frame: &mut Frame, area: Rect, form: &TaskForm) {
    let block = Block::default()
        .title(" ✦ AI Suggestions ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let Some(s) = form.reconciler().suggestion() else {
        frame.render_widget(block, area);
        return;
    };

    let mut lines = Vec::new();
    if form.current_suggestion().is_none() {
        lines.push(Line::from(Span::styled(
            format!("For \"{}\" (title changed)", s.source_title),
            Style::default().fg(Color::DarkGray).italic(),
        )));
        lines.push(Line::default());
    }
    lines.push(Line::from(vec![
        Span::styled("Confidence ", Style::default().bold()),
        Span::raw(format!("{}%", s.confidence_percent())),
    ]));
    if !s.reasoning.is_empty() {
        lines.push(Line::from(Span::styled(
            s.reasoning.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Description (^D)", Style::default().bold())));
    lines.push(Line::from(s.description().to_string()));
    if let Some(ref cat) = s.category {
        lines.push(Line::from(vec![
            Span::styled("Category (^G) ", Style::default().bold()),
            Span::styled(
                format!(" {} ", cat.name),
                Style::default().bg(hex_color(&cat.color)),
            ),
        ]));
    }
    if let Some(score) = s.priority_score {
        let band = PriorityBand::classify(score);
        lines.push(Line::from(vec![
            Span::styled("Priority (^P) ", Style::default().bold()),
            Span::styled(format!("{score:.1} {}", band.display_name()), band_style(band)),
        ]));
    }
    if let Some(d) = s.deadline {
        lines.push(Line::from(vec![
            Span::styled("Deadline (^L) ", Style::default().bold()),
            Span::raw(d.format("%Y-%m-%d").to_string()),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "^A apply all  ^X hide",
        Style::default().fg(Color::Yellow),
    )));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_category_picker(frame: &mut Frame, area: Rect, options: &[CategoryOption], selected: usize) {
    let popup = centered_rect(40, 50, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" Category (Backspace clears) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let items: Vec<ListItem> = options
        .iter()
        .map(|opt| {
            let tag = opt.tag();
            let mut spans = Vec::new();
            if matches!(opt, CategoryOption::Suggested(_)) {
                spans.push(Span::styled("✦ ", Style::default().fg(Color::Magenta)));
            }
            spans.push(category_span(&tag.name, &tag.color));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("> ")
        .highlight_style(Style::default().bold());
    let mut state = ListState::default();
    if !options.is_empty() {
        state.select(Some(selected.min(options.len() - 1)));
    }
    frame.render_stateful_widget(list, popup, &mut state);
}
