//! In-memory `TodoService` for tests. Records every call, serves tasks,
//! categories and context entries from memory, and returns scripted AI
//! enhancements or failures.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use todogenius_core::category::Category;
use todogenius_core::context::{ContextEntry, ContextFilter, CreateContext};
use todogenius_core::suggestion::{Descriptions, Enhancement, SuggestedCategory};
use todogenius_core::task::{Status, StatusFilter, Task, TaskFilter, TaskPayload};

use crate::{ServiceError, TodoService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ListCategories,
    ListContext,
    CreateContext,
    DeleteContext,
    MarkContextProcessed,
    EnhanceTask,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListTasks(TaskFilter),
    CreateTask(TaskPayload),
    UpdateTask(String, TaskPayload),
    DeleteTask(String),
    ListCategories,
    ListContext(ContextFilter),
    CreateContext(CreateContext),
    DeleteContext(String),
    MarkContextProcessed(String),
    EnhanceTask(String),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::ListTasks(_) => Op::ListTasks,
            Call::CreateTask(_) => Op::CreateTask,
            Call::UpdateTask(..) => Op::UpdateTask,
            Call::DeleteTask(_) => Op::DeleteTask,
            Call::ListCategories => Op::ListCategories,
            Call::ListContext(_) => Op::ListContext,
            Call::CreateContext(_) => Op::CreateContext,
            Call::DeleteContext(_) => Op::DeleteContext,
            Call::MarkContextProcessed(_) => Op::MarkContextProcessed,
            Call::EnhanceTask(_) => Op::EnhanceTask,
        }
    }
}

#[derive(Default)]
struct MockState {
    tasks: Vec<Task>,
    categories: Vec<Category>,
    context: Vec<ContextEntry>,
    enhancements: HashMap<String, Enhancement>,
    failures: HashMap<Op, ServiceError>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct MockService {
    state: Mutex<MockState>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(self, tasks: Vec<Task>) -> Self {
        self.lock().tasks = tasks;
        self
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        self.lock().categories = categories;
        self
    }

    pub fn with_context(self, entries: Vec<ContextEntry>) -> Self {
        self.lock().context = entries;
        self
    }

    /// Script the enhancement returned for `title`.
    pub fn with_enhancement(self, title: &str, enhancement: Enhancement) -> Self {
        self.lock()
            .enhancements
            .insert(title.to_string(), enhancement);
        self
    }

    /// Make every call of `op` fail with `err` until [`MockService::recover`].
    pub fn fail(&self, op: Op, err: ServiceError) {
        self.lock().failures.insert(op, err);
    }

    pub fn recover(&self, op: Op) {
        self.lock().failures.remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Titles sent to the enhancement endpoint, in order.
    pub fn enhance_calls(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::EnhanceTask(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn context_entries(&self) -> Vec<ContextEntry> {
        self.lock().context.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and return the scripted failure for it, if any.
    fn record(&self, call: Call) -> Result<MutexGuard<'_, MockState>, ServiceError> {
        let mut state = self.lock();
        let op = call.op();
        state.calls.push(call);
        match state.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(state),
        }
    }
}

pub fn make_task(id: &str, title: &str) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        is_ai_enhanced: false,
        deadline: None,
        is_ai_suggested_deadline: false,
        priority_score: 0.5,
        category_id: None,
        category_name: None,
        category_color: None,
        status: Status::Pending,
        is_overdue: false,
        days_until_deadline: None,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
        completed_at: None,
    }
}

pub fn make_category(id: &str, name: &str, color: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        usage_frequency: 0,
        task_count: 0,
    }
}

pub fn make_enhancement(description: &str, category: &str, color: &str) -> Enhancement {
    Enhancement {
        title: String::new(),
        descriptions: Descriptions::One(description.to_string()),
        category: Some(SuggestedCategory {
            name: category.to_string(),
            color: Some(color.to_string()),
            is_new: false,
        }),
        priority_score: Some(0.5),
        deadline: None,
        timeframe_days: None,
        confidence: 0.9,
        reasoning: String::new(),
    }
}

fn apply_payload(task: &mut Task, payload: &TaskPayload, categories: &mut Vec<Category>) {
    task.title = payload.title.clone();
    task.description = payload.description.clone();
    task.priority_score = payload.priority_score;
    task.deadline = payload
        .deadline
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset());
    task.is_ai_enhanced = payload.is_ai_enhanced;
    task.is_ai_suggested_deadline = payload.is_ai_suggested_deadline;
    if let Some(status) = payload.status {
        task.status = status;
    }
    if payload.category_name.is_empty() {
        task.category_id = None;
        task.category_name = None;
        task.category_color = None;
    } else {
        let id = match categories.iter().find(|c| c.name == payload.category_name) {
            Some(c) => c.id.clone(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                categories.push(make_category(&id, &payload.category_name, &payload.category_color));
                id
            }
        };
        task.category_id = Some(id);
        task.category_name = Some(payload.category_name.clone());
        task.category_color = Some(payload.category_color.clone());
    }
    task.updated_at = Some(Utc::now());
}

fn matches_filter(task: &Task, filter: &TaskFilter) -> bool {
    let search = filter.search.trim().to_lowercase();
    if !search.is_empty()
        && !task.title.to_lowercase().contains(&search)
        && !task.description.to_lowercase().contains(&search)
    {
        return false;
    }
    let status_ok = match filter.status {
        StatusFilter::All => true,
        StatusFilter::Pending => task.status == Status::Pending,
        StatusFilter::InProgress => task.status == Status::InProgress,
        StatusFilter::Completed => task.status == Status::Completed,
        StatusFilter::Overdue => {
            !task.is_completed() && task.deadline.is_some_and(|d| d.with_timezone(&Utc) < Utc::now())
        }
    };
    if !status_ok {
        return false;
    }
    if let Some(band) = filter.priority {
        let (min, max) = band.query_bounds();
        if min.is_some_and(|m| task.priority_score < m) || max.is_some_and(|m| task.priority_score > m)
        {
            return false;
        }
    }
    match filter.category_id {
        Some(ref id) => task.category_id.as_ref() == Some(id),
        None => true,
    }
}

#[async_trait]
impl TodoService for MockService {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ServiceError> {
        let state = self.record(Call::ListTasks(filter.clone()))?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| matches_filter(t, filter))
            .cloned()
            .collect())
    }

    async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ServiceError> {
        let mut state = self.record(Call::CreateTask(payload.clone()))?;
        let mut task = make_task(&uuid::Uuid::new_v4().to_string(), &payload.title);
        let MockState {
            tasks, categories, ..
        } = &mut *state;
        apply_payload(&mut task, payload, categories);
        tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &str, payload: &TaskPayload) -> Result<Task, ServiceError> {
        let mut state = self.record(Call::UpdateTask(id.to_string(), payload.clone()))?;
        let MockState {
            tasks, categories, ..
        } = &mut *state;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ServiceError::NotFound("Task not found".into()))?;
        apply_payload(task, payload, categories);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<(), ServiceError> {
        let mut state = self.record(Call::DeleteTask(id.to_string()))?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(ServiceError::NotFound("Task not found".into()));
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        let state = self.record(Call::ListCategories)?;
        Ok(state.categories.clone())
    }

    async fn list_context(&self, filter: &ContextFilter) -> Result<Vec<ContextEntry>, ServiceError> {
        let state = self.record(Call::ListContext(filter.clone()))?;
        Ok(state
            .context
            .iter()
            .filter(|e| filter.source_type.map_or(true, |s| e.source_type == s))
            .filter(|e| filter.is_processed.map_or(true, |p| e.is_processed == p))
            .cloned()
            .collect())
    }

    async fn create_context(&self, input: &CreateContext) -> Result<ContextEntry, ServiceError> {
        let mut state = self.record(Call::CreateContext(input.clone()))?;
        if input.content.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Content cannot be empty".into()));
        }
        let entry = ContextEntry {
            id: uuid::Uuid::new_v4().to_string(),
            content: input.content.trim().to_string(),
            source_type: input.source_type,
            is_processed: false,
            created_at: Some(Utc::now()),
            context_date: Some(input.context_date),
        };
        state.context.insert(0, entry.clone());
        Ok(entry)
    }

    async fn delete_context(&self, id: &str) -> Result<(), ServiceError> {
        let mut state = self.record(Call::DeleteContext(id.to_string()))?;
        let before = state.context.len();
        state.context.retain(|e| e.id != id);
        if state.context.len() == before {
            return Err(ServiceError::NotFound("Context not found".into()));
        }
        Ok(())
    }

    async fn mark_context_processed(&self, id: &str) -> Result<ContextEntry, ServiceError> {
        let mut state = self.record(Call::MarkContextProcessed(id.to_string()))?;
        let entry = state
            .context
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ServiceError::NotFound("Context not found".into()))?;
        entry.is_processed = true;
        Ok(entry.clone())
    }

    async fn enhance_task(&self, title: &str) -> Result<Enhancement, ServiceError> {
        let state = self.record(Call::EnhanceTask(title.to_string()))?;
        Ok(state.enhancements.get(title).cloned().unwrap_or_else(|| Enhancement {
            title: title.to_string(),
            descriptions: Descriptions::One(format!("Details for {title}")),
            confidence: 0.5,
            ..Default::default()
        }))
    }
}
