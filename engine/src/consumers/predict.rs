use std::sync::Arc;

use skytrack_formats::Track;

use crate::{Emitter, Subscriber, POINT_EVENT, PREDICT_NS};

/// Landing prediction.
///
/// There is no descent model yet so the track is forwarded unchanged, clients draw it as the
/// predicted path.
///
pub struct PredictConsumer {
    emitter: Arc<dyn Emitter>,
}

impl PredictConsumer {
    pub fn new(emitter: Arc<dyn Emitter>) -> Self {
        PredictConsumer { emitter }
    }
}

impl Subscriber<Track> for PredictConsumer {
    fn name(&self) -> &str {
        "predict"
    }

    fn handle(&self, track: &Track) -> eyre::Result<()> {
        let payload = serde_json::to_string(track)?;
        self.emitter.emit(PREDICT_NS, POINT_EVENT, &payload)
    }
}
