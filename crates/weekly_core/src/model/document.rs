use crate::model::task::{LinkData, NONE_LINK, Task};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default `resetDay`: Monday.
const DEFAULT_RESET_DAY: u8 = 1;

/// The whole persisted value. Every mutation round-trips all of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    #[serde(rename = "todos")]
    pub tasks: Vec<Task>,
    pub weekly_status: WeeklyStatus,
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyStatus {
    pub week_id: Option<String>,
    pub checked: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub reset_day: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reset_day: DEFAULT_RESET_DAY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub reset_day: Option<u8>,
}

impl Document {
    /// First-run checklist.
    pub fn starter() -> Self {
        let tasks = vec![
            starter_task(
                "default-1",
                "Message a friend",
                "whatsapp",
                [("phone", ""), ("message", "Hey! How are you?")],
            ),
            starter_task("default-2", "Check weekly schedule", "calendar", []),
            starter_task("default-3", "Go for a walk", NONE_LINK, []),
        ];

        let mut document = Self {
            tasks,
            ..Self::default()
        };
        document.renumber();
        document
    }

    /// Tasks in display order.
    pub fn sorted_tasks(&self) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        tasks.sort_by_key(|task| task.order);
        tasks
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    /// Rewrites `order` to `0..n` following the current display order.
    pub fn renumber(&mut self) {
        self.tasks.sort_by_key(|task| task.order);
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.order = index;
        }
    }

    /// Dense ordering plus a checked list that only names existing tasks, once each.
    pub fn normalize(&mut self) {
        self.renumber();
        let known: HashSet<&str> = self.tasks.iter().map(|task| task.id.as_str()).collect();
        let mut seen = HashSet::new();
        self.weekly_status
            .checked
            .retain(|id| known.contains(id.as_str()) && seen.insert(id.clone()));
    }
}

fn starter_task<const N: usize>(
    id: &str,
    text: &str,
    link_type: &str,
    link_data: [(&str, &str); N],
) -> Task {
    Task {
        id: id.to_string(),
        text: text.to_string(),
        link_type: link_type.to_string(),
        link_data: link_data
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<LinkData>(),
        order: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Settings, WeeklyStatus};
    use crate::model::Task;

    fn task(id: &str, order: usize) -> Task {
        Task {
            id: id.to_string(),
            text: id.to_string(),
            link_type: "none".to_string(),
            link_data: Default::default(),
            order,
        }
    }

    #[test]
    fn starter_document_is_densely_ordered() {
        let document = Document::starter();
        let orders: Vec<usize> = document.tasks.iter().map(|task| task.order).collect();

        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(document.tasks[0].link_type, "whatsapp");
        assert_eq!(document.weekly_status.week_id, None);
        assert_eq!(document.settings.reset_day, 1);
    }

    #[test]
    fn missing_top_level_fields_fall_back_to_defaults() {
        let document: Document = serde_json::from_str(r#"{"todos": []}"#).unwrap();

        assert!(document.tasks.is_empty());
        assert_eq!(document.weekly_status, WeeklyStatus::default());
        assert_eq!(document.settings, Settings::default());
    }

    #[test]
    fn serializes_with_storage_key_names() {
        let mut document = Document::default();
        document.tasks.push(task("a", 0));
        document.weekly_status.week_id = Some("2026-W02".to_string());

        let value = serde_json::to_value(&document).unwrap();

        assert!(value["todos"].is_array());
        assert_eq!(value["todos"][0]["linkType"], "none");
        assert_eq!(value["weeklyStatus"]["weekId"], "2026-W02");
        assert_eq!(value["settings"]["resetDay"], 1);
    }

    #[test]
    fn task_without_link_fields_defaults_to_none() {
        let task: Task = serde_json::from_str(r#"{"id": "x", "text": "plain"}"#).unwrap();

        assert_eq!(task.link_type, "none");
        assert!(task.link_data.is_empty());
        assert!(!task.has_link());
    }

    #[test]
    fn normalize_closes_gaps_and_prunes_checked() {
        let mut document = Document::default();
        document.tasks = vec![task("c", 7), task("a", 2), task("b", 5)];
        document.weekly_status.checked =
            vec!["b".to_string(), "ghost".to_string(), "b".to_string()];

        document.normalize();

        let ids: Vec<&str> = document.tasks.iter().map(|task| task.id.as_str()).collect();
        let orders: Vec<usize> = document.tasks.iter().map(|task| task.order).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(document.weekly_status.checked, vec!["b".to_string()]);
    }
}
