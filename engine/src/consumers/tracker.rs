use std::sync::Arc;

use tracing::trace;

use skytrack_formats::Track;

use crate::{Emitter, Subscriber, EVENTS_NS, POINT_EVENT};

/// Push every new point as-is to the live map.
///
pub struct TrackerConsumer {
    emitter: Arc<dyn Emitter>,
}

impl TrackerConsumer {
    pub fn new(emitter: Arc<dyn Emitter>) -> Self {
        TrackerConsumer { emitter }
    }
}

impl Subscriber<Track> for TrackerConsumer {
    fn name(&self) -> &str {
        "tracker"
    }

    fn handle(&self, track: &Track) -> eyre::Result<()> {
        trace!("track {}", track.id);
        let payload = serde_json::to_string(track)?;
        self.emitter.emit(EVENTS_NS, POINT_EVENT, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelEmitter, Dispatch};
    use serde_json::json;
    use skytrack_formats::Report;

    #[test]
    fn test_tracker_emits_track() {
        let em = ChannelEmitter::new(4);
        let mut rx = em.subscribe();
        let tc = TrackerConsumer::new(Arc::new(em));
        assert_eq!(Dispatch::Inline, tc.dispatch());

        let report = Report::from_value(json!({
            "edge_id": "E1",
            "latitude": 39.7,
            "longitude": -104.9,
            "altitude": 1600.0,
            "speed": 10.0,
            "time": 1706783445,
            "source": "test",
            "heading": 270.5,
        }))
        .unwrap();
        let track = Track::single(report);
        tc.handle(&track).unwrap();

        let msg = rx.try_recv().unwrap();
        assert_eq!(EVENTS_NS, msg.namespace);
        assert_eq!(POINT_EVENT, msg.event);
        let back: Track = serde_json::from_str(&msg.payload).unwrap();
        assert_eq!(track, back);
    }
}
