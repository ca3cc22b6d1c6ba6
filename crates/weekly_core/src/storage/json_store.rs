use crate::error::AppError;
use crate::storage::Backend;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "weekly";
const STORE_FILE_NAME: &str = "weekly.json";
const STORE_ENV_VAR: &str = "WEEKLY_STORE_PATH";

/// Per-user application directory (`~/.config/weekly` or `%APPDATA%\weekly`).
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(STORE_FILE_NAME))
}

/// The document stored as one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_path()?))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| STORE_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Backend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }

        std::fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|err| AppError::persistence(format!("{}: {}", self.path.display(), err)))
    }

    fn save(&self, content: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|err| AppError::persistence(err.to_string()))?;
        }

        // Write beside the target and rename so a failed write never truncates it.
        let staging = self.staging_path();
        std::fs::write(&staging, content).map_err(|err| AppError::persistence(err.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&staging, permissions)
                .map_err(|err| AppError::persistence(err.to_string()))?;
        }

        std::fs::rename(&staging, &self.path).map_err(|err| {
            std::fs::remove_file(&staging).ok();
            AppError::persistence(err.to_string())
        })?;
        tracing::debug!(path = %self.path.display(), bytes = content.len(), "saved document");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFileBackend;
    use crate::storage::Backend;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("weekly-{nanos}-{file_name}"))
    }

    #[test]
    fn load_missing_file_is_empty_slot() {
        let backend = JsonFileBackend::new(temp_path("missing.json"));
        assert_eq!(backend.load().unwrap(), None);
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("round-trip.json");
        let backend = JsonFileBackend::new(&path);

        backend.save("{\"todos\": []}").unwrap();
        let loaded = backend.load().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.as_deref(), Some("{\"todos\": []}"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = temp_path("nested");
        let path = dir.join("deeper").join("weekly.json");
        let backend = JsonFileBackend::new(&path);

        backend.save("{}").unwrap();
        let exists = path.exists();
        let staging_left = dir.join("deeper").join("weekly.json.tmp").exists();
        fs::remove_dir_all(&dir).ok();

        assert!(exists);
        assert!(!staging_left);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("perms.json");
        let backend = JsonFileBackend::new(&path);
        backend.save("{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        fs::remove_file(&path).ok();

        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_into_unwritable_location_reports_persistence_failure() {
        let blocker = temp_path("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let backend = JsonFileBackend::new(blocker.join("weekly.json"));

        let err = backend.save("{}").unwrap_err();
        fs::remove_file(&blocker).ok();

        assert_eq!(err.code(), "persistence_failure");
    }
}
