use std::future::Future;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tokio::runtime::Handle;
use todogenius_core::category::Category;
use todogenius_core::context::{ContextEntry, ContextFilter};
use todogenius_core::task::{Task, TaskFilter, TaskPayload};
use todogenius_service::TodoService;
use tracing::{debug, info, warn};

use crate::components::context_list::ContextList;
use crate::components::task_form::render_task_form;
use crate::components::task_list::TaskList;
use crate::components::widgets::{centered_rect, key_hints};
use crate::config::UiConfig;
use crate::context_form::{ContextField, ContextForm, CONTEXT_ADDED};
use crate::debounce::Debounced;
use crate::event::AppEvent;
use crate::form::{FormField, Submission, SuggestionField, TaskForm, UPDATE_FAILED};
use crate::lists::{FetchTicket, RemoteList};
use crate::reconciler::EnhanceTicket;
use crate::route::Route;

const DELETE_FAILED: &str = "Failed to delete task. Please try again.";
const DELETE_CONTEXT_FAILED: &str = "Failed to delete context. Please try again.";
const PROCESS_CONTEXT_FAILED: &str = "Failed to mark context as processed.";

/// What the app is currently doing
#[derive(Debug, Clone)]
pub enum Mode {
    /// Browsing the current view
    Normal,
    /// Typing in the task search box
    Search,
    /// Create/edit form is open; `picker` is the highlighted category row
    TaskForm { picker: Option<usize> },
    /// Confirm delete task
    ConfirmDelete {
        task: Task,
        busy: bool,
        error: Option<String>,
    },
    /// Confirm complete/reopen
    ConfirmToggle {
        task: Task,
        busy: bool,
        error: Option<String>,
    },
    /// Typing a new context entry
    ContextInput,
    /// Confirm delete context entry
    ConfirmDeleteContext {
        entry: ContextEntry,
        busy: bool,
        error: Option<String>,
    },
}

pub struct App {
    service: Arc<dyn TodoService>,
    runtime: Handle,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    in_flight: usize,
    ui: UiConfig,
    route: Route,
    mode: Mode,
    status_message: Option<String>,

    tasks: RemoteList<TaskFilter, Task>,
    categories: RemoteList<(), Category>,
    context: RemoteList<ContextFilter, ContextEntry>,
    task_list: TaskList,
    context_list: ContextList,

    search_input: String,
    search: Debounced<String>,

    form: Option<TaskForm>,
    /// Bumped every time a form opens so late answers for a closed form are ignored.
    form_id: u64,
    context_form: ContextForm,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl App {
    pub fn new(service: Arc<dyn TodoService>, runtime: Handle, ui: UiConfig, route: Route) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            service,
            runtime,
            tx,
            rx,
            in_flight: 0,
            ui,
            route: Route::Tasks,
            mode: Mode::Normal,
            status_message: None,
            tasks: RemoteList::new(TaskFilter::default(), "Error fetching tasks"),
            categories: RemoteList::new((), "Error fetching categories"),
            context: RemoteList::new(ContextFilter::default(), "Error fetching context"),
            task_list: TaskList::new(Vec::new()),
            context_list: ContextList::new(),
            search_input: String::new(),
            search: Debounced::new(ui.search_debounce),
            form: None,
            form_id: 0,
            context_form: ContextForm::new(today()),
        };
        app.reload_categories();
        app.navigate(route);
        app
    }

    // -- Accessors --

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn form(&self) -> Option<&TaskForm> {
        self.form.as_ref()
    }

    pub fn context_form(&self) -> &ContextForm {
        &self.context_form
    }

    pub fn tasks(&self) -> &[Task] {
        self.task_list.tasks()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.task_list.selected_task()
    }

    pub fn task_filter(&self) -> &TaskFilter {
        self.tasks.params()
    }

    pub fn tasks_error(&self) -> Option<&str> {
        self.tasks.error()
    }

    pub fn categories(&self) -> &[Category] {
        self.categories.items()
    }

    pub fn context_entries(&self) -> &[ContextEntry] {
        self.context.items()
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(
            self.mode,
            Mode::Search | Mode::TaskForm { .. } | Mode::ContextInput
        )
    }

    // -- Remote calls --

    /// Run a service call on the runtime; its event comes back through the channel.
    fn spawn<F, Fut>(&mut self, call: F)
    where
        F: FnOnce(Arc<dyn TodoService>) -> Fut,
        Fut: Future<Output = AppEvent> + Send + 'static,
    {
        let fut = call(Arc::clone(&self.service));
        let tx = self.tx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            // The receiver only disappears when the app is shutting down.
            let _ = tx.send(fut.await);
        });
    }

    fn fetch_tasks(&mut self, ticket: Option<FetchTicket<TaskFilter>>) {
        let Some(ticket) = ticket else { return };
        self.spawn(move |svc| async move {
            let result = svc.list_tasks(&ticket.params).await;
            AppEvent::TasksLoaded {
                seq: ticket.seq,
                result,
            }
        });
    }

    fn fetch_context(&mut self, ticket: Option<FetchTicket<ContextFilter>>) {
        let Some(ticket) = ticket else { return };
        self.spawn(move |svc| async move {
            let result = svc.list_context(&ticket.params).await;
            AppEvent::ContextLoaded {
                seq: ticket.seq,
                result,
            }
        });
    }

    fn reload_tasks(&mut self) {
        let ticket = self.tasks.reload();
        self.fetch_tasks(Some(ticket));
    }

    fn reload_categories(&mut self) {
        let ticket = self.categories.reload();
        self.spawn(move |svc| async move {
            let result = svc.list_categories().await;
            AppEvent::CategoriesLoaded {
                seq: ticket.seq,
                result,
            }
        });
    }

    fn reload_context(&mut self) {
        let ticket = self.context.reload();
        self.fetch_context(Some(ticket));
    }

    fn request_enhancement(&mut self, ticket: EnhanceTicket) {
        let form_id = self.form_id;
        self.spawn(move |svc| async move {
            let result = svc.enhance_task(&ticket.title).await;
            AppEvent::Enhanced {
                form_id,
                generation: ticket.generation,
                result,
            }
        });
    }

    // -- Event loop hooks --

    /// Fire any debounce deadlines that have passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(query) = self.search.poll(now) {
            let ticket = self.tasks.update(|f| f.search = query);
            self.fetch_tasks(ticket);
        }
        let ticket = self.form.as_mut().and_then(|f| f.tick(now));
        if let Some(ticket) = ticket {
            self.request_enhancement(ticket);
        }
        self.context_form.tick(now);
    }

    /// Apply every remote result that has already arrived.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Block until no remote call is outstanding or `timeout` passes.
    /// Returns false on timeout.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(event) => self.handle_event(event),
                Err(_) => return false,
            }
        }
        true
    }

    fn handle_event(&mut self, event: AppEvent) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            AppEvent::TasksLoaded { seq, result } => {
                if self.tasks.resolve(seq, result) {
                    self.task_list.set_tasks(self.tasks.items().to_vec());
                }
            }
            AppEvent::CategoriesLoaded { seq, result } => {
                self.categories.resolve(seq, result);
            }
            AppEvent::ContextLoaded { seq, result } => {
                if self.context.resolve(seq, result) {
                    self.context_list.set_entries(self.context.items().to_vec());
                }
            }
            AppEvent::Enhanced {
                form_id,
                generation,
                result,
            } => {
                let current = form_id == self.form_id;
                match self.form.as_mut() {
                    Some(form) if current => {
                        let resolution = form.resolve_enhancement(generation, result);
                        debug!(generation, ?resolution, "AI response settled");
                    }
                    _ => debug!(form_id, "dropping AI response for a closed form"),
                }
            }
            AppEvent::TaskSaved { form_id, result } => self.on_task_saved(form_id, result),
            AppEvent::TaskToggled { task_id, result } => {
                let in_modal =
                    matches!(&self.mode, Mode::ConfirmToggle { task, .. } if task.id == task_id);
                match result {
                    Ok(task) => {
                        info!(task_id = %task.id, status = %task.status, "task toggled");
                        if in_modal {
                            self.mode = Mode::Normal;
                        }
                        self.status_message = Some(if task.is_completed() {
                            format!("Completed: {}", task.title)
                        } else {
                            format!("Reopened: {}", task.title)
                        });
                        self.reload_tasks();
                    }
                    Err(e) => {
                        let msg = e.user_message(UPDATE_FAILED);
                        match self.mode.clone() {
                            Mode::ConfirmToggle { task, .. } if in_modal => {
                                self.mode = Mode::ConfirmToggle {
                                    task,
                                    busy: false,
                                    error: Some(msg),
                                }
                            }
                            _ => self.status_message = Some(msg),
                        }
                    }
                }
            }
            AppEvent::TaskDeleted { task_id, result } => {
                let in_modal =
                    matches!(&self.mode, Mode::ConfirmDelete { task, .. } if task.id == task_id);
                match result {
                    Ok(()) => {
                        info!(%task_id, "task deleted");
                        if let Mode::ConfirmDelete { task, .. } = &self.mode {
                            if in_modal {
                                self.status_message = Some(format!("Deleted: {}", task.title));
                                self.mode = Mode::Normal;
                            }
                        }
                        self.reload_tasks();
                    }
                    Err(e) => {
                        let msg = e.user_message(DELETE_FAILED);
                        match self.mode.clone() {
                            Mode::ConfirmDelete { task, .. } if in_modal => {
                                self.mode = Mode::ConfirmDelete {
                                    task,
                                    busy: false,
                                    error: Some(msg),
                                }
                            }
                            _ => self.status_message = Some(msg),
                        }
                    }
                }
            }
            AppEvent::ContextCreated { result } => {
                if self.context_form.finish_submit(result, Instant::now()) {
                    self.reload_context();
                }
            }
            AppEvent::ContextDeleted { entry_id, result } => {
                let in_modal = matches!(
                    &self.mode,
                    Mode::ConfirmDeleteContext { entry, .. } if entry.id == entry_id
                );
                match result {
                    Ok(()) => {
                        if in_modal {
                            self.mode = Mode::Normal;
                        }
                        self.status_message = Some("Context deleted".into());
                        self.reload_context();
                    }
                    Err(e) => {
                        let msg = e.user_message(DELETE_CONTEXT_FAILED);
                        match self.mode.clone() {
                            Mode::ConfirmDeleteContext { entry, .. } if in_modal => {
                                self.mode = Mode::ConfirmDeleteContext {
                                    entry,
                                    busy: false,
                                    error: Some(msg),
                                }
                            }
                            _ => self.status_message = Some(msg),
                        }
                    }
                }
            }
            AppEvent::ContextProcessed { entry_id, result } => match result {
                Ok(_) => {
                    debug!(%entry_id, "context marked processed");
                    self.status_message = Some("Marked as processed".into());
                    self.reload_context();
                }
                Err(e) => self.status_message = Some(e.user_message(PROCESS_CONTEXT_FAILED)),
            },
        }
    }

    fn on_task_saved(&mut self, form_id: u64, result: Result<Task, todogenius_service::ServiceError>) {
        if let Ok(ref task) = result {
            info!(task_id = %task.id, "task saved");
            self.reload_tasks();
            self.reload_categories();
        }
        let current = form_id == self.form_id;
        let Some(form) = self.form.as_mut().filter(|_| current) else {
            if let Err(e) = result {
                warn!(error = %e, "save failed after its form was closed");
            }
            return;
        };
        let editing = form.is_edit();
        if form.finish_submit(result) {
            self.form = None;
            if matches!(self.mode, Mode::TaskForm { .. }) {
                self.mode = Mode::Normal;
            }
            self.status_message = Some(if editing { "Task updated" } else { "Task created" }.into());
        }
    }

    // -- Navigation --

    pub fn navigate(&mut self, route: Route) {
        debug!(path = route.path(), "navigate");
        self.route = route;
        self.mode = Mode::Normal;
        match self.route {
            Route::Tasks => self.reload_tasks(),
            Route::Context => self.reload_context(),
            Route::NotFound(_) => {}
        }
    }

    // -- Key handling --

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.handle_key_at(key, Instant::now());
    }

    pub fn handle_key_at(&mut self, key: KeyEvent, now: Instant) {
        self.status_message = None;

        if let Route::NotFound(_) = self.route {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('t')) {
                self.navigate(Route::Tasks);
            }
            return;
        }

        match &self.mode.clone() {
            Mode::Normal => match self.route {
                Route::Context => self.handle_context_normal(key),
                _ => self.handle_normal(key),
            },
            Mode::Search => self.handle_search(key, now),
            Mode::TaskForm { picker: Some(idx) } => self.handle_category_picker(key, *idx),
            Mode::TaskForm { picker: None } => self.handle_task_form(key, now),
            Mode::ConfirmDelete { task, busy, .. } => {
                self.handle_confirm_delete(key, task.clone(), *busy)
            }
            Mode::ConfirmToggle { task, busy, .. } => {
                self.handle_confirm_toggle(key, task.clone(), *busy)
            }
            Mode::ContextInput => self.handle_context_input(key),
            Mode::ConfirmDeleteContext { entry, busy, .. } => {
                self.handle_confirm_delete_context(key, entry.clone(), *busy)
            }
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') => self.open_form(None),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(task) = self.task_list.selected_task().cloned() {
                    self.open_form(Some(task));
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('c') => {
                if let Some(task) = self.task_list.selected_task().cloned() {
                    self.mode = Mode::ConfirmToggle {
                        task,
                        busy: false,
                        error: None,
                    };
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.task_list.selected_task().cloned() {
                    self.mode = Mode::ConfirmDelete {
                        task,
                        busy: false,
                        error: None,
                    };
                }
            }
            KeyCode::Char('/') => {
                self.search_input = self.tasks.params().search.clone();
                self.mode = Mode::Search;
            }
            KeyCode::Char('s') => {
                let ticket = self.tasks.update(|f| f.status = f.status.next());
                self.fetch_tasks(ticket);
            }
            KeyCode::Char('p') => {
                let ticket = self.tasks.update(|f| f.cycle_priority());
                self.fetch_tasks(ticket);
            }
            KeyCode::Char('f') => {
                let next = self.next_category_filter();
                let ticket = self.tasks.update(|f| f.category_id = next);
                self.fetch_tasks(ticket);
            }
            KeyCode::Char('C') => {
                self.search.cancel();
                self.search_input.clear();
                let ticket = self.tasks.set_params(TaskFilter::default());
                self.fetch_tasks(ticket);
                self.status_message = Some("Filters cleared".into());
            }
            KeyCode::Char('r') => {
                self.reload_tasks();
                self.reload_categories();
            }
            KeyCode::Char('x') => {
                self.tasks.dismiss_error();
                self.categories.dismiss_error();
            }
            KeyCode::Char('v') | KeyCode::Tab => self.navigate(Route::Context),
            _ => self.task_list.handle_key(key),
        }
    }

    fn next_category_filter(&self) -> Option<String> {
        let cats = self.categories.items();
        match self.tasks.params().category_id {
            None => cats.first().map(|c| c.id.clone()),
            Some(ref id) => cats
                .iter()
                .position(|c| &c.id == id)
                .and_then(|i| cats.get(i + 1))
                .map(|c| c.id.clone()),
        }
    }

    fn handle_search(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Enter => {
                self.search.cancel();
                let query = self.search_input.clone();
                let ticket = self.tasks.update(|f| f.search = query);
                self.fetch_tasks(ticket);
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                self.search_input.pop();
                self.search.set(self.search_input.clone(), now);
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.search.set(self.search_input.clone(), now);
            }
            _ => {}
        }
    }

    fn open_form(&mut self, task: Option<Task>) {
        self.form_id += 1;
        self.form = Some(match task {
            Some(ref t) => TaskForm::edit(t, self.ui.title_debounce),
            None => TaskForm::create(self.ui.title_debounce),
        });
        self.mode = Mode::TaskForm { picker: None };
        self.reload_categories();
    }

    fn handle_task_form(&mut self, key: KeyEvent, now: Instant) {
        let today = today();
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.submit_form(today),
                KeyCode::Char('a') => self.apply_suggestion(None),
                KeyCode::Char('d') => self.apply_suggestion(Some(SuggestionField::Description)),
                KeyCode::Char('g') => self.apply_suggestion(Some(SuggestionField::Category)),
                KeyCode::Char('p') => self.apply_suggestion(Some(SuggestionField::Priority)),
                KeyCode::Char('l') => self.apply_suggestion(Some(SuggestionField::Deadline)),
                KeyCode::Char('x') => {
                    if let Some(form) = self.form.as_mut() {
                        form.reconciler_mut().toggle_panel();
                    }
                }
                _ => {}
            }
            return;
        }

        let Some(form) = self.form.as_mut() else {
            self.mode = Mode::Normal;
            return;
        };
        let focus = form.focus();
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.mode = Mode::Normal;
            }
            KeyCode::Tab => form.set_focus(focus.next(), today),
            KeyCode::BackTab => form.set_focus(focus.prev(), today),
            KeyCode::Enter if focus == FormField::Category => {
                self.mode = Mode::TaskForm { picker: Some(0) };
            }
            KeyCode::Enter => self.submit_form(today),
            KeyCode::Left if focus == FormField::Priority => form.nudge_priority(-1),
            KeyCode::Right if focus == FormField::Priority => form.nudge_priority(1),
            KeyCode::Delete if focus == FormField::Deadline => {
                // Clearing never fails.
                let _ = form.set_deadline(None, today);
            }
            KeyCode::Backspace => form.backspace(now),
            KeyCode::Char(c) => form.insert_char(c, now),
            _ => {}
        }
    }

    fn handle_category_picker(&mut self, key: KeyEvent, idx: usize) {
        let Some(form) = self.form.as_mut() else {
            self.mode = Mode::Normal;
            return;
        };
        let options = form.category_options(self.categories.items());
        match key.code {
            KeyCode::Esc => self.mode = Mode::TaskForm { picker: None },
            KeyCode::Char('j') | KeyCode::Down => {
                let next = (idx + 1).min(options.len().saturating_sub(1));
                self.mode = Mode::TaskForm { picker: Some(next) };
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.mode = Mode::TaskForm {
                    picker: Some(idx.saturating_sub(1)),
                };
            }
            KeyCode::Enter => {
                if let Some(option) = options.get(idx) {
                    form.select_category(Some(option.tag().clone()));
                }
                self.mode = Mode::TaskForm { picker: None };
            }
            KeyCode::Backspace | KeyCode::Delete => {
                form.select_category(None);
                self.mode = Mode::TaskForm { picker: None };
            }
            _ => {}
        }
    }

    fn apply_suggestion(&mut self, field: Option<SuggestionField>) {
        let Some(form) = self.form.as_mut() else { return };
        let result = match field {
            Some(f) => form.apply(f),
            None => form.apply_all(),
        };
        if let Err(e) = result {
            self.status_message = Some(e.to_string());
        }
    }

    fn submit_form(&mut self, today: NaiveDate) {
        let Some(form) = self.form.as_mut() else { return };
        if form.is_saving() {
            return;
        }
        let Ok(submission) = form.begin_submit(today) else {
            return;
        };
        let form_id = self.form_id;
        self.spawn(move |svc| async move {
            let result = match submission {
                Submission::Create(payload) => svc.create_task(&payload).await,
                Submission::Update { id, payload } => svc.update_task(&id, &payload).await,
            };
            AppEvent::TaskSaved { form_id, result }
        });
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent, task: Task, busy: bool) {
        if busy {
            return;
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let id = task.id.clone();
                self.mode = Mode::ConfirmDelete {
                    task,
                    busy: true,
                    error: None,
                };
                self.spawn(move |svc| async move {
                    let result = svc.delete_task(&id).await;
                    AppEvent::TaskDeleted {
                        task_id: id,
                        result,
                    }
                });
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
    }

    fn handle_confirm_toggle(&mut self, key: KeyEvent, task: Task, busy: bool) {
        if busy {
            return;
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let id = task.id.clone();
                let payload = TaskPayload::from_task(&task).with_status(task.status.toggled());
                self.mode = Mode::ConfirmToggle {
                    task,
                    busy: true,
                    error: None,
                };
                self.spawn(move |svc| async move {
                    let result = svc.update_task(&id, &payload).await;
                    AppEvent::TaskToggled {
                        task_id: id,
                        result,
                    }
                });
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
    }

    fn handle_context_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('i') | KeyCode::Char('n') => self.mode = Mode::ContextInput,
            KeyCode::Char('d') => {
                if let Some(entry) = self.context_list.selected().cloned() {
                    self.mode = Mode::ConfirmDeleteContext {
                        entry,
                        busy: false,
                        error: None,
                    };
                }
            }
            KeyCode::Char('m') => {
                let Some(entry) = self.context_list.selected().cloned() else {
                    return;
                };
                if entry.is_processed {
                    self.status_message = Some("Already processed".into());
                    return;
                }
                self.spawn(move |svc| async move {
                    let result = svc.mark_context_processed(&entry.id).await;
                    AppEvent::ContextProcessed {
                        entry_id: entry.id,
                        result,
                    }
                });
            }
            KeyCode::Char('s') => {
                let ticket = self.context.update(|f| f.cycle_source());
                self.fetch_context(ticket);
            }
            KeyCode::Char('p') => {
                let ticket = self.context.update(|f| f.cycle_processed());
                self.fetch_context(ticket);
            }
            KeyCode::Char('r') => self.reload_context(),
            KeyCode::Char('x') => self.context.dismiss_error(),
            KeyCode::Char('v') | KeyCode::Tab => self.navigate(Route::Tasks),
            _ => self.context_list.handle_key(key),
        }
    }

    fn handle_context_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let focus = self.context_form.focus();
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Tab => self.context_form.next_field(),
            KeyCode::Char('s') if ctrl => self.submit_context(),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.context_form.newline()
            }
            KeyCode::Enter => self.submit_context(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if focus == ContextField::Source => {
                self.context_form.cycle_source()
            }
            KeyCode::Left if focus == ContextField::Date => self.context_form.shift_date(-1),
            KeyCode::Right if focus == ContextField::Date => self.context_form.shift_date(1),
            KeyCode::Char('t') if focus == ContextField::Date => self.context_form.reset_date(today()),
            KeyCode::Backspace => self.context_form.backspace(),
            KeyCode::Char(c) if !ctrl => self.context_form.insert_char(c),
            _ => {}
        }
    }

    fn submit_context(&mut self) {
        if self.context_form.is_saving() {
            return;
        }
        let Ok(input) = self.context_form.begin_submit() else {
            return;
        };
        self.spawn(move |svc| async move {
            let result = svc.create_context(&input).await;
            AppEvent::ContextCreated { result }
        });
    }

    fn handle_confirm_delete_context(&mut self, key: KeyEvent, entry: ContextEntry, busy: bool) {
        if busy {
            return;
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let id = entry.id.clone();
                self.mode = Mode::ConfirmDeleteContext {
                    entry,
                    busy: true,
                    error: None,
                };
                self.spawn(move |svc| async move {
                    let result = svc.delete_context(&id).await;
                    AppEvent::ContextDeleted {
                        entry_id: id,
                        result,
                    }
                });
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
    }

    // -- Rendering --

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);
        match self.route {
            Route::Tasks => self.render_tasks_view(frame, layout[1]),
            Route::Context => self.render_context_view(frame, layout[1]),
            Route::NotFound(ref path) => render_not_found(frame, layout[1], path),
        }
        self.render_status_bar(frame, layout[2]);

        // Overlays
        match &self.mode {
            Mode::Normal | Mode::ContextInput => {}
            Mode::Search => render_input_bar(frame, " Search ", &self.search_input, area),
            Mode::TaskForm { picker } => {
                if let Some(ref form) = self.form {
                    render_task_form(frame, area, form, self.categories.items(), *picker);
                }
            }
            Mode::ConfirmDelete { task, busy, error } => render_confirm(
                frame,
                area,
                " Confirm Delete ",
                &format!("Delete \"{}\"?", task.title),
                *busy,
                error.as_deref(),
            ),
            Mode::ConfirmToggle { task, busy, error } => {
                let verb = if task.is_completed() { "Reopen" } else { "Complete" };
                render_confirm(
                    frame,
                    area,
                    " Confirm ",
                    &format!("{verb} \"{}\"?", task.title),
                    *busy,
                    error.as_deref(),
                )
            }
            Mode::ConfirmDeleteContext { entry, busy, error } => {
                let preview: String = entry.content.chars().take(60).collect();
                render_confirm(
                    frame,
                    area,
                    " Delete Context ",
                    &format!("Delete \"{preview}\"?"),
                    *busy,
                    error.as_deref(),
                )
            }
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" todogenius ", Style::default().bold().fg(Color::Magenta)),
            Span::raw("| "),
            Span::styled(self.route.title(), Style::default().fg(Color::Yellow)),
        ];
        if self.in_flight > 0 {
            spans.push(Span::styled(
                format!("  ({} pending)", self.in_flight),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Line::from(spans), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref msg) = self.status_message {
            let line = Line::from(Span::styled(
                format!(" {msg}"),
                Style::default().fg(Color::Green),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints: Vec<(&str, &str)> = match (&self.mode, &self.route) {
            (_, Route::NotFound(_)) => vec![("Enter", "back to tasks"), ("q", "quit")],
            (Mode::Normal, Route::Context) => vec![
                ("q", "quit"),
                ("j/k", "entries"),
                ("i", "add"),
                ("m", "processed"),
                ("d", "del"),
                ("s", "source"),
                ("p", "processed filter"),
                ("r", "reload"),
                ("v", "tasks"),
            ],
            (Mode::Normal, _) => vec![
                ("q", "quit"),
                ("j/k", "tasks"),
                ("n", "new"),
                ("e", "edit"),
                ("Space", "toggle"),
                ("d", "del"),
                ("/", "search"),
                ("s", "status"),
                ("p", "priority"),
                ("f", "category"),
                ("C", "clear"),
                ("r", "reload"),
                ("v", "context"),
            ],
            (Mode::Search, _) => vec![("Enter", "apply"), ("Esc", "close")],
            (Mode::TaskForm { picker: Some(_) }, _) => vec![
                ("j/k", "nav"),
                ("Enter", "select"),
                ("Backspace", "clear"),
                ("Esc", "back"),
            ],
            (Mode::TaskForm { picker: None }, _) => vec![
                ("Tab", "field"),
                ("Enter", "save"),
                ("←/→", "priority"),
                ("^A", "apply all"),
                ("^D/^G/^P/^L", "apply one"),
                ("^X", "panel"),
                ("Esc", "cancel"),
            ],
            (Mode::ContextInput, _) => vec![
                ("Tab", "field"),
                ("←/→", "change"),
                ("Enter", "add"),
                ("Esc", "back"),
            ],
            (
                Mode::ConfirmDelete { .. }
                | Mode::ConfirmToggle { .. }
                | Mode::ConfirmDeleteContext { .. },
                _,
            ) => vec![("y", "confirm"), ("n", "cancel")],
        };

        frame.render_widget(key_hints(&hints), area);
    }

    fn render_tasks_view(&self, frame: &mut Frame, area: Rect) {
        let error = self.tasks.error().or(self.categories.error());
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(if error.is_some() { 1 } else { 0 }),
                Constraint::Min(0),
            ])
            .split(area);

        let filter = self.tasks.params();
        let category = filter
            .category_id
            .as_ref()
            .and_then(|id| self.categories.items().iter().find(|c| &c.id == id))
            .map(|c| c.name.as_str())
            .unwrap_or("All");
        let mut spans = vec![
            Span::styled(" Search: ", Style::default().fg(Color::DarkGray)),
            Span::raw(if filter.search.is_empty() {
                "-".to_string()
            } else {
                filter.search.clone()
            }),
            Span::styled("  Status: ", Style::default().fg(Color::DarkGray)),
            Span::raw(filter.status.display_name()),
            Span::styled("  Priority: ", Style::default().fg(Color::DarkGray)),
            Span::raw(filter.priority.map(|b| b.filter_label()).unwrap_or("All")),
            Span::styled("  Category: ", Style::default().fg(Color::DarkGray)),
            Span::raw(category),
        ];
        let active = filter.active_count();
        if active > 0 {
            spans.push(Span::styled(
                format!("  ({active} active)"),
                Style::default().fg(Color::Cyan),
            ));
        }
        frame.render_widget(Line::from(spans), rows[0]);

        if let Some(err) = error {
            frame.render_widget(
                Line::from(Span::styled(
                    format!(" {err}  (r retry, x dismiss)"),
                    Style::default().fg(Color::White).bg(Color::Red),
                )),
                rows[1],
            );
        }

        self.task_list
            .render(frame, rows[2], Utc::now(), self.tasks.is_loading());
    }

    fn render_context_view(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);
        self.render_context_input(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(if self.context.error().is_some() { 1 } else { 0 }),
                Constraint::Min(0),
            ])
            .split(columns[1]);
        let filter = self.context.params();
        let processed = match filter.is_processed {
            None => "All",
            Some(true) => "Processed",
            Some(false) => "Unprocessed",
        };
        frame.render_widget(
            Line::from(vec![
                Span::styled(" Source: ", Style::default().fg(Color::DarkGray)),
                Span::raw(filter.source_type.map(|s| s.display_name()).unwrap_or("All")),
                Span::styled("  Status: ", Style::default().fg(Color::DarkGray)),
                Span::raw(processed),
            ]),
            rows[0],
        );
        if let Some(err) = self.context.error() {
            frame.render_widget(
                Line::from(Span::styled(
                    format!(" {err}  (r retry, x dismiss)"),
                    Style::default().fg(Color::White).bg(Color::Red),
                )),
                rows[1],
            );
        }
        self.context_list
            .render(frame, rows[2], today(), self.context.is_loading());
    }

    fn render_context_input(&self, frame: &mut Frame, area: Rect) {
        let form = &self.context_form;
        let editing = matches!(self.mode, Mode::ContextInput);
        let focus_style = |field: ContextField| {
            if editing && form.focus() == field {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        };

        let block = Block::default()
            .title(" Add Context ")
            .borders(Borders::ALL)
            .border_style(if editing {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(form.content().to_string())
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .title(" Context Information ")
                        .borders(Borders::ALL)
                        .border_style(focus_style(ContextField::Content)),
                ),
            rows[0],
        );
        frame.render_widget(
            Line::from(vec![
                Span::styled(" Source: ", focus_style(ContextField::Source)),
                Span::raw(form.source_type().display_name()),
            ]),
            rows[1],
        );
        frame.render_widget(
            Line::from(vec![
                Span::styled(" Date:   ", focus_style(ContextField::Date)),
                Span::raw(form.date().format("%Y-%m-%d").to_string()),
            ]),
            rows[2],
        );

        let message = if form.is_saving() {
            Span::styled(" Saving...", Style::default().fg(Color::Cyan))
        } else if let Some(err) = form.error() {
            Span::styled(format!(" {err}"), Style::default().fg(Color::Red))
        } else if form.success_visible() {
            Span::styled(format!(" {CONTEXT_ADDED}"), Style::default().fg(Color::Green))
        } else {
            Span::raw("")
        };
        frame.render_widget(Line::from(message), rows[3]);
    }
}

fn render_not_found(frame: &mut Frame, area: Rect, path: &str) {
    let text = format!("404\n\nNothing lives at {path}.\n\nPress Enter to go back to your tasks.");
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Not Found ")),
        area,
    );
}

fn render_input_bar(frame: &mut Frame, label: &str, input: &str, area: Rect) {
    let input_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(3),
        width: area.width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, input_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(label.to_string());
    frame.render_widget(Paragraph::new(input.to_string()).block(block), input_area);
}

fn render_confirm(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    question: &str,
    busy: bool,
    error: Option<&str>,
) {
    let popup = centered_rect(50, 25, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let mut lines = vec![Line::from(question.to_string()), Line::default()];
    if busy {
        lines.push(Line::from(Span::styled(
            "Working...",
            Style::default().fg(Color::Cyan),
        )));
    } else {
        if let Some(err) = error {
            lines.push(Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from("(y)es / (n)o"));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Center),
        popup,
    );
}
