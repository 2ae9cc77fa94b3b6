pub mod autosave;
pub mod protocol;
pub mod rest;
pub mod state;

// Re-export the handlers so the binary that builds the router can reach them.
pub use autosave::{autosave_status_handler, start_autosave_handler, stop_autosave_handler};
pub use rest::{
    clear_versions_handler, edit_working_copy_handler, export_course_handler,
    get_progress_handler, get_working_copy_handler, import_course_handler, list_versions_handler,
    load_course_handler, put_progress_handler, put_working_copy_handler, reset_course_handler,
    restore_version_handler, save_course_handler,
};
