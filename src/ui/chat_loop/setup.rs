use crate::core::manager::ConversationManager;
use crate::core::session::SessionContext;
use crate::core::store::KeyValueStore;
use std::error::Error;
use tracing::{debug, warn};

/// Ask the backend which models it serves and record them on the manager.
///
/// A failure is logged and leaves the current selection alone; with no
/// selection, sends stay refused until a model is chosen.
pub async fn load_models<S: KeyValueStore>(
    manager: &mut ConversationManager<S>,
    session: &SessionContext,
    preferred: Option<&str>,
) -> Result<usize, Box<dyn Error>> {
    match session.fetch_models().await {
        Ok(response) => {
            let count = response.models.len();
            let selected = manager
                .set_available_models(response.models, preferred)
                .map(str::to_string);
            debug!(count, selected = ?selected, "Loaded model list");
            Ok(count)
        }
        Err(err) => {
            warn!(error = %err, base_url = %session.base_url, "Failed to fetch models");
            Err(err)
        }
    }
}
