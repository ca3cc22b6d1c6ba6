use crate::links::LinkRegistry;
use crate::model::Task;
use crate::week::WeekId;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
    pub task: Task,
    pub checked: bool,
    pub icon: String,
    pub label: String,
    pub url: Option<String>,
}

/// What a checklist view needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub week: WeekId,
    pub rows: Vec<BoardRow>,
}

impl Board {
    pub fn build(
        tasks: Vec<Task>,
        checked: &BTreeSet<String>,
        week: WeekId,
        registry: &LinkRegistry,
    ) -> Self {
        let rows = tasks
            .into_iter()
            .map(|task| {
                let kind = registry.describe(&task.link_type);
                BoardRow {
                    checked: checked.contains(&task.id),
                    icon: kind.icon.clone(),
                    label: kind.label.clone(),
                    url: registry.resolve_task(&task),
                    task,
                }
            })
            .collect();

        Self { week, rows }
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn completed(&self) -> usize {
        self.rows.iter().filter(|row| row.checked).count()
    }

    /// Share of checked tasks; 0 for an empty list.
    pub fn ratio(&self) -> f64 {
        if self.rows.is_empty() {
            0.0
        } else {
            self.completed() as f64 / self.total() as f64
        }
    }

    pub fn all_complete(&self) -> bool {
        !self.rows.is_empty() && self.completed() == self.total()
    }
}
