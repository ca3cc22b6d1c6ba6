mod document;
mod task;

pub use document::{Document, Settings, SettingsPatch, WeeklyStatus};
pub use task::{LinkData, NONE_LINK, Task, TaskPatch};
