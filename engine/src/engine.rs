//! The `Engine` puts everything together: store, hub and its workers, consumers, ingestion and
//! statistics.
//!

use std::sync::Arc;

use eyre::{eyre, Result};
use ractor::{call, Actor, ActorRef};
use tokio::task::JoinHandle;
use tracing::{info, trace};

use skytrack_formats::{StationFilter, Track};

use crate::{
    EngineConfig, Emitter, Hub, Ingestor, NavaidConsumer, PoolStats, PredictConsumer, Stats,
    StatsActor, StatsMsg, Store, TrackerConsumer, WorkerPool,
};

pub struct Engine {
    hub: Arc<Hub<Track>>,
    ingestor: Ingestor,
    stats: ActorRef<StatsMsg>,
    stats_h: JoinHandle<()>,
}

impl Engine {
    /// Start the worker pool and the stats actor, then wire the consumers on the point topic.
    ///
    #[tracing::instrument(skip(store, emitter))]
    pub async fn new(
        cfg: &EngineConfig,
        store: Arc<dyn Store>,
        emitter: Arc<dyn Emitter>,
    ) -> Result<Self> {
        let pool = WorkerPool::new(&cfg.pool)?;
        let hub = Arc::new(Hub::new(pool));
        hub.create_topic(&cfg.topic);

        let filter = match &cfg.state {
            Some(state) => StationFilter::state(state),
            None => StationFilter::default(),
        };

        // Order matters: the live map first, then the rest.
        //
        hub.subscribe(&cfg.topic, Arc::new(TrackerConsumer::new(emitter.clone())))?;
        hub.subscribe(
            &cfg.topic,
            Arc::new(
                NavaidConsumer::new(store.clone(), emitter.clone())
                    .nearest(cfg.nearest)
                    .unit(cfg.unit)
                    .filter(filter),
            ),
        )?;
        hub.subscribe(&cfg.topic, Arc::new(PredictConsumer::new(emitter)))?;

        let (stats, stats_h) = Actor::spawn(None, StatsActor, ())
            .await
            .map_err(|e| eyre!("can not start stats: {e}"))?;

        let ingestor = Ingestor::new(store, hub.clone(), &cfg.topic).with_stats(stats.clone());
        info!("engine ready on topic {}", cfg.topic);

        Ok(Engine {
            hub,
            ingestor,
            stats,
            stats_h,
        })
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    pub fn hub(&self) -> &Arc<Hub<Track>> {
        &self.hub
    }

    /// Current counters.
    ///
    pub async fn stats(&self) -> Result<Stats> {
        call!(self.stats, StatsMsg::Get).map_err(|e| eyre!("stats: {e}"))
    }

    /// Wait for the background jobs, then stop the stats actor and return its final counters.
    ///
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(Stats, PoolStats)> {
        let pool = self.hub.shutdown().await;
        trace!("pool: {pool}");

        self.stats
            .cast(StatsMsg::Print)
            .map_err(|e| eyre!("stats: {e}"))?;
        let stats = call!(self.stats, StatsMsg::Exit).map_err(|e| eyre!("stats: {e}"))?;
        self.stats_h.await?;
        Ok((stats, pool))
    }
}
