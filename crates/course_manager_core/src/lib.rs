pub mod autosave;
pub mod codec;
pub mod domain;
pub mod manager;
pub mod memory;
pub mod ports;
pub mod progress;
pub mod validation;
pub mod versions;

pub use autosave::{AutoSaveHandle, AutoSaveScheduler, AutoSaveStatus};
pub use codec::{ExportFile, ImportError};
pub use domain::{
    AutoSaveDraft, Document, DocumentEdit, DocumentStatus, EditError, Module, ModuleEdit,
    ProgressEntry, ProgressMap, Section, SectionEdit, SectionType, Version,
};
pub use manager::{CourseManager, SaveError};
pub use memory::MemoryStore;
pub use ports::{PersistentStore, StorageError, StoreResult};
pub use validation::FieldError;
