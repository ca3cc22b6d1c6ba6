use crate::error::AppError;

/// How a resolved URL should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Web URL: a fresh browser context with no handle back to us.
    NewContext,
    /// Any other scheme (`mailto:`, app schemes): hand to the system handler.
    InPlace,
}

pub fn dispatch_mode(url: &str) -> Option<DispatchMode> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let lowered = url.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Some(DispatchMode::NewContext)
    } else {
        Some(DispatchMode::InPlace)
    }
}

pub trait Dispatcher {
    fn open_new_context(&self, url: &str) -> Result<(), AppError>;

    fn open_in_place(&self, url: &str) -> Result<(), AppError>;

    /// Opens `url`; returns `false` without doing anything for an absent or
    /// empty URL.
    fn dispatch(&self, url: Option<&str>) -> Result<bool, AppError> {
        let Some(url) = url else {
            return Ok(false);
        };

        match dispatch_mode(url) {
            Some(DispatchMode::NewContext) => self.open_new_context(url.trim())?,
            Some(DispatchMode::InPlace) => self.open_in_place(url.trim())?,
            None => return Ok(false),
        }
        tracing::debug!(url, "dispatched link");
        Ok(true)
    }
}

pub struct SystemDispatcher;

impl Dispatcher for SystemDispatcher {
    fn open_new_context(&self, url: &str) -> Result<(), AppError> {
        webbrowser::open(url).map_err(|err| AppError::io(format!("{url}: {err}")))
    }

    fn open_in_place(&self, url: &str) -> Result<(), AppError> {
        run_opener(platform_opener(url), url)
    }
}

/// Blocks until the opener exits and reports a failing exit status.
fn run_opener(mut command: std::process::Command, url: &str) -> Result<(), AppError> {
    let status = command
        .status()
        .map_err(|err| AppError::io(format!("{url}: {err}")))?;
    if !status.success() {
        return Err(AppError::io(format!("{url}: opener exited with {status}")));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn platform_opener(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("open");
    command.arg(url);
    command
}

#[cfg(windows)]
fn platform_opener(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("cmd");
    command.args(["/C", "start", ""]).arg(url);
    command
}

#[cfg(not(any(target_os = "macos", windows)))]
fn platform_opener(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("xdg-open");
    command.arg(url);
    command
}
