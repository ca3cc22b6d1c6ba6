use crate::error::AppError;
use crate::notify::{Feedback, NOTIFICATION_TITLE, Notifier};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, feedback: &Feedback) -> Result<(), AppError> {
        Notification::new()
            .summary(NOTIFICATION_TITLE)
            .body(&feedback.message())
            .show()
            .map(|_| ())
            .map_err(|err| AppError::io(err.to_string()))
    }
}
