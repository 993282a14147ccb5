use std::sync::Arc;

use nq_inference::Synthesizer;

pub struct AppState {
    pub synthesizer: Arc<Synthesizer>,
}
