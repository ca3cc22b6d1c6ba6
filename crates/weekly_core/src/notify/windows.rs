use crate::error::AppError;
use crate::notify::{Feedback, NOTIFICATION_TITLE, Notifier};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, feedback: &Feedback) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(NOTIFICATION_TITLE)
            .text1(&feedback.message())
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
