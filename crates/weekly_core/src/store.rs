use crate::board::Board;
use crate::error::AppError;
use crate::links::LinkRegistry;
use crate::model::{Document, LinkData, NONE_LINK, Settings, SettingsPatch, Task, TaskPatch};
use crate::storage::{Backend, JsonFileBackend};
use crate::week::{Clock, WeekId, clock_from_env};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Highest valid `resetDay` (Saturday, with Sunday as 0).
const MAX_RESET_DAY: u8 = 6;

/// Owns the persisted document. Every call loads the whole document,
/// applies one change and saves the whole document again; nothing is
/// cached between calls.
pub struct Store<B: Backend> {
    backend: B,
    clock: Box<dyn Clock>,
    initial: Document,
}

impl Store<JsonFileBackend> {
    /// Store at `WEEKLY_STORE_PATH` (or the per-user default), dated by
    /// `WEEKLY_TODAY` when set.
    pub fn open_default() -> Result<Self, AppError> {
        Ok(Self::new(JsonFileBackend::from_env()?, clock_from_env()?))
    }
}

impl<B: Backend> Store<B> {
    pub fn new(backend: B, clock: Box<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            initial: Document::starter(),
        }
    }

    /// Document written on first access instead of the starter checklist.
    pub fn with_initial(mut self, document: Document) -> Self {
        self.initial = document;
        self
    }

    pub fn current_week(&self) -> WeekId {
        self.clock.current_week()
    }

    pub fn week_number(&self) -> u8 {
        self.current_week().week()
    }

    fn load(&self) -> Result<Document, AppError> {
        match self.backend.load()? {
            Some(content) => serde_json::from_str(&content).map_err(|err| {
                tracing::error!(error = %err, "stored document is corrupted");
                AppError::persistence(format!("stored document is corrupted: {err}"))
            }),
            None => {
                let document = self.initial.clone();
                if let Err(err) = self.persist(&document) {
                    tracing::warn!(error = %err, "could not persist initial document");
                }
                Ok(document)
            }
        }
    }

    fn persist(&self, document: &Document) -> Result<(), AppError> {
        let content = serde_json::to_string(document)
            .map_err(|err| AppError::persistence(err.to_string()))?;
        self.backend.save(&content).inspect_err(|err| {
            tracing::error!(error = %err, "failed to persist document");
        })
    }

    fn mutate<T, F>(&self, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Document) -> Result<T, AppError>,
    {
        let mut document = self.load()?;
        let outcome = change(&mut document)?;
        self.persist(&document)?;
        Ok(outcome)
    }

    pub fn get_tasks(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.load()?.sorted_tasks())
    }

    pub fn get_task(&self, id: &str) -> Result<Task, AppError> {
        let id = required_id(id)?;
        self.load()?
            .tasks
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| task_not_found(id))
    }

    pub fn add_task(
        &self,
        text: &str,
        link_type: &str,
        link_data: LinkData,
    ) -> Result<Task, AppError> {
        let text = required_text(text)?;
        let link_type = link_type_or_none(link_type);

        self.mutate(|document| {
            let task = Task {
                id: fresh_id(document),
                text,
                link_type,
                link_data,
                order: document.tasks.len(),
            };
            document.tasks.push(task.clone());
            Ok(task)
        })
    }

    pub fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
        let id = required_id(id)?;
        let text = patch.text.as_deref().map(required_text).transpose()?;

        self.mutate(|document| {
            let task = document
                .tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or_else(|| task_not_found(id))?;

            if let Some(text) = text {
                task.text = text;
            }
            if let Some(link_type) = patch.link_type.as_deref() {
                task.link_type = link_type_or_none(link_type);
            }
            if let Some(link_data) = patch.link_data {
                task.link_data = link_data;
            }
            Ok(task.clone())
        })
    }

    pub fn delete_task(&self, id: &str) -> Result<Task, AppError> {
        let id = required_id(id)?;

        self.mutate(|document| {
            let index = document
                .tasks
                .iter()
                .position(|task| task.id == id)
                .ok_or_else(|| task_not_found(id))?;

            let removed = document.tasks.remove(index);
            document.weekly_status.checked.retain(|checked| checked != id);
            document.renumber();
            Ok(removed)
        })
    }

    /// Listed tasks take positions `0..k` in the given order. Unknown and
    /// repeated ids are skipped; tasks left out keep their relative order
    /// after the listed ones.
    pub fn reorder_tasks<S: AsRef<str>>(&self, ordered_ids: &[S]) -> Result<Vec<Task>, AppError> {
        self.mutate(|document| {
            apply_order(document, ordered_ids.iter().map(AsRef::as_ref));
            Ok(document.sorted_tasks())
        })
    }

    /// The drop half of a drag gesture: moves `id` to `to_index` (clamped).
    pub fn move_task(&self, id: &str, to_index: usize) -> Result<Vec<Task>, AppError> {
        let id = required_id(id)?;

        self.mutate(|document| {
            let mut ids: Vec<String> = document
                .sorted_tasks()
                .into_iter()
                .map(|task| task.id)
                .collect();
            let from = ids
                .iter()
                .position(|candidate| candidate == id)
                .ok_or_else(|| task_not_found(id))?;

            let moving = ids.remove(from);
            ids.insert(to_index.min(ids.len()), moving);
            apply_order(document, ids.iter().map(String::as_str));
            Ok(document.sorted_tasks())
        })
    }

    pub fn get_checked_ids(&self) -> Result<BTreeSet<String>, AppError> {
        Ok(self.load()?.weekly_status.checked.into_iter().collect())
    }

    /// Flips `id` in the checked set and returns the new state. Only
    /// existing tasks can be checked.
    pub fn toggle_checked(&self, id: &str) -> Result<bool, AppError> {
        let id = required_id(id)?;

        self.mutate(|document| {
            if !document.contains(id) {
                return Err(task_not_found(id));
            }

            let checked = &mut document.weekly_status.checked;
            match checked.iter().position(|candidate| candidate == id) {
                Some(index) => {
                    checked.remove(index);
                    Ok(false)
                }
                None => {
                    checked.push(id.to_string());
                    Ok(true)
                }
            }
        })
    }

    /// Clears checkmarks when the ISO week has moved on since the last
    /// check. Returns whether a reset happened.
    pub fn check_weekly_reset(&self) -> Result<bool, AppError> {
        let current = self.current_week().to_string();
        let mut document = self.load()?;

        if document.weekly_status.week_id.as_deref() == Some(current.as_str()) {
            return Ok(false);
        }

        let previous = document.weekly_status.week_id.take();
        document.weekly_status.week_id = Some(current.clone());
        document.weekly_status.checked.clear();
        self.persist(&document)?;

        tracing::info!(previous = ?previous, current = %current, "new week, checkmarks reset");
        Ok(true)
    }

    pub fn manual_reset(&self) -> Result<WeekId, AppError> {
        let week = self.current_week();
        self.mutate(|document| {
            document.weekly_status.week_id = Some(week.to_string());
            document.weekly_status.checked.clear();
            Ok(())
        })?;

        tracing::info!(week = %week, "checkmarks reset by hand");
        Ok(week)
    }

    pub fn get_settings(&self) -> Result<Settings, AppError> {
        Ok(self.load()?.settings)
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, AppError> {
        if let Some(reset_day) = patch.reset_day
            && reset_day > MAX_RESET_DAY
        {
            return Err(AppError::invalid_input(format!(
                "reset day must be between 0 and {MAX_RESET_DAY}"
            )));
        }

        self.mutate(|document| {
            if let Some(reset_day) = patch.reset_day {
                document.settings.reset_day = reset_day;
            }
            Ok(document.settings)
        })
    }

    pub fn export_snapshot(&self) -> Result<String, AppError> {
        let document = self.load()?;
        serde_json::to_string_pretty(&document).map_err(|err| AppError::persistence(err.to_string()))
    }

    /// Replaces the whole document with `snapshot`. Nothing changes unless
    /// the snapshot parses and carries a `todos` list. Returns the number of
    /// imported tasks.
    pub fn import_snapshot(&self, snapshot: &str) -> Result<usize, AppError> {
        let mut document = parse_snapshot(snapshot).inspect_err(|err| {
            tracing::warn!(error = %err, "rejected import");
        })?;
        document.normalize();
        self.persist(&document)?;

        tracing::info!(tasks = document.tasks.len(), "imported snapshot");
        Ok(document.tasks.len())
    }

    /// Render data for the current week: rows, progress and link metadata.
    pub fn board(&self, registry: &LinkRegistry) -> Result<Board, AppError> {
        let document = self.load()?;
        let checked: BTreeSet<String> = document.weekly_status.checked.iter().cloned().collect();
        Ok(Board::build(
            document.sorted_tasks(),
            &checked,
            self.current_week(),
            registry,
        ))
    }
}

fn parse_snapshot(snapshot: &str) -> Result<Document, AppError> {
    let value: serde_json::Value =
        serde_json::from_str(snapshot).map_err(|err| AppError::parse(err.to_string()))?;

    if !value.get("todos").is_some_and(serde_json::Value::is_array) {
        return Err(AppError::invalid_input("snapshot must contain a todos list"));
    }

    let document: Document =
        serde_json::from_value(value).map_err(|err| AppError::invalid_input(err.to_string()))?;

    let mut seen = HashSet::new();
    if let Some(duplicate) = document
        .tasks
        .iter()
        .find(|task| !seen.insert(task.id.as_str()))
    {
        return Err(AppError::invalid_input(format!(
            "duplicate task id {}",
            duplicate.id
        )));
    }

    Ok(document)
}

fn apply_order<'a, I>(document: &mut Document, ordered_ids: I)
where
    I: Iterator<Item = &'a str>,
{
    let mut ranked: Vec<String> = Vec::with_capacity(document.tasks.len());
    for id in ordered_ids {
        if document.contains(id) && !ranked.iter().any(|seen| seen == id) {
            ranked.push(id.to_string());
        }
    }

    let listed = ranked.len();
    for task in &mut document.tasks {
        task.order = match ranked.iter().position(|id| *id == task.id) {
            Some(position) => position,
            None => listed + task.order,
        };
    }
    document.renumber();
}

fn fresh_id(document: &Document) -> String {
    loop {
        let id = format!("task-{}", Uuid::new_v4().simple());
        if !document.contains(&id) {
            return id;
        }
    }
}

fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn required_text(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("text is required"));
    }
    Ok(trimmed.to_string())
}

fn link_type_or_none(link_type: &str) -> String {
    let trimmed = link_type.trim();
    if trimmed.is_empty() {
        NONE_LINK.to_string()
    } else {
        trimmed.to_string()
    }
}

fn task_not_found(id: &str) -> AppError {
    AppError::not_found(format!("task {id} not found"))
}
