use ragbot_knowledge::RagService;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state handed to every handler.
pub struct AppState {
    pub service: Arc<RagService>,

    /// Directory uploaded files are staged in before indexing
    pub upload_dir: PathBuf,

    /// Request body limit applied to uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: Arc<RagService>, upload_dir: PathBuf, max_upload_bytes: usize) -> Self {
        Self {
            service,
            upload_dir,
            max_upload_bytes,
        }
    }
}
