use crate::error::AppError;

pub mod json_store;
mod memory;

pub use json_store::JsonFileBackend;
pub use memory::MemoryBackend;

/// A single persisted slot holding the serialized document.
pub trait Backend {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<String>, AppError>;

    fn save(&self, content: &str) -> Result<(), AppError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn load(&self) -> Result<Option<String>, AppError> {
        (**self).load()
    }

    fn save(&self, content: &str) -> Result<(), AppError> {
        (**self).save(content)
    }
}
