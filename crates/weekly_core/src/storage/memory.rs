use crate::error::AppError;
use crate::storage::Backend;
use std::cell::{Cell, RefCell};

/// In-memory slot, mostly for tests. Saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: RefCell<Option<String>>,
    fail_saves: Cell<bool>,
    saves: Cell<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content<S: Into<String>>(content: S) -> Self {
        let backend = Self::default();
        backend.slot.replace(Some(content.into()));
        backend
    }

    pub fn content(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl Backend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, content: &str) -> Result<(), AppError> {
        if self.fail_saves.get() {
            return Err(AppError::persistence("storage quota exceeded"));
        }
        self.slot.replace(Some(content.to_string()));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
