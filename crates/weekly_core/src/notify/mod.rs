use crate::error::AppError;
use crate::week::WeekId;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

pub const NOTIFICATION_TITLE: &str = "Weekly checklist";

/// Moments worth celebrating or announcing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    WeekReset { week: WeekId },
    ManualReset { week: WeekId },
    AllComplete { total: usize },
}

impl Feedback {
    pub fn message(&self) -> String {
        match self {
            Self::WeekReset { week } => format!(
                "New week! Checkmarks have been reset for week {}. 🎉",
                week.week()
            ),
            Self::ManualReset { .. } => "Week reset! Start fresh. 💪".to_string(),
            Self::AllComplete { total } if *total == 1 => {
                "Your only task is done this week! 🎉".to_string()
            }
            Self::AllComplete { total } => format!("All {total} tasks done this week! 🎉"),
        }
    }
}

pub trait Notifier {
    fn notify(&self, feedback: &Feedback) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _feedback: &Feedback) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var("WEEKLY_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(AppError::InvalidData(message)) => {
            tracing::debug!(%message, "desktop notifications unavailable");
            Ok(Box::new(NoopNotifier))
        }
        Err(other) => Err(other),
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::{Feedback, NoopNotifier, Notifier};
    use crate::week::WeekId;

    #[test]
    fn week_reset_message_names_the_week() {
        let feedback = Feedback::WeekReset {
            week: WeekId::new(2026, 43).unwrap(),
        };
        assert!(feedback.message().contains("week 43"));
    }

    #[test]
    fn all_complete_message_counts_tasks() {
        assert!(Feedback::AllComplete { total: 4 }.message().contains("All 4 tasks"));
        assert!(Feedback::AllComplete { total: 1 }.message().contains("only task"));
    }

    #[test]
    fn noop_notifier_accepts_everything() {
        let feedback = Feedback::ManualReset {
            week: WeekId::new(2026, 1).unwrap(),
        };
        assert!(NoopNotifier.notify(&feedback).is_ok());
    }
}
