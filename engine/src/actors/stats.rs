//! Actor definition for `Stats`
//!

use std::fmt::{Display, Formatter};

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::{info, trace};

use crate::Stats;

pub struct StatsActor;

/// Messages handled by the `StatsActor`.
///
/// # Variants
///
/// * `Accepted`, `Rejected`, `Conflict`, `Published`
///     - One more report in that state.
/// * `Failed(u32)`, `Dropped(u32)`
///     - Subscriber failures and refused background jobs for one publish.
/// * `Reset`
///     - Back to zero.
/// * `Print`
///     - Log the current statistics.
/// * `Get`
///     - Reply with the current statistics.
/// * `Exit`
///     - Reply with the final statistics and stop.
///
#[derive(Debug)]
pub enum StatsMsg {
    /// stat updates
    Accepted,
    Rejected,
    Conflict,
    Published,
    Failed(u32),
    Dropped(u32),
    /// commands
    Reset,
    Print,
    Get(RpcReplyPort<Stats>),
    Exit(RpcReplyPort<Stats>),
}

/// Start timestamp and counters.
///
#[derive(Debug)]
pub struct State {
    pub start: i64,
    pub stat: Stats,
}

impl State {
    fn current(&mut self) -> Stats {
        self.stat.tm = (Utc::now().timestamp() - self.start).max(0) as u64;
        self.stat.clone()
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "start={} {}", self.start, self.stat)
    }
}

#[ractor::async_trait]
impl Actor for StatsActor {
    type Msg = StatsMsg;
    type State = State;
    type Arguments = ();

    #[tracing::instrument(skip(self, myself))]
    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        trace!("{:?} starting.", myself.get_name());
        Ok(State {
            start: Utc::now().timestamp(),
            stat: Stats::default(),
        })
    }

    #[tracing::instrument(skip(self, myself))]
    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            // updates
            StatsMsg::Accepted => state.stat.accepted += 1,
            StatsMsg::Rejected => state.stat.rejected += 1,
            StatsMsg::Conflict => state.stat.conflicts += 1,
            StatsMsg::Published => state.stat.published += 1,
            StatsMsg::Failed(n) => state.stat.failed += n,
            StatsMsg::Dropped(n) => state.stat.dropped += n,
            // commands
            StatsMsg::Print => {
                state.current();
                info!("Stats: {}", state);
            }
            StatsMsg::Reset => {
                state.stat = Stats::default();
            }
            StatsMsg::Get(sender) => {
                sender.send(state.current())?;
            }
            // The end
            StatsMsg::Exit(sender) => {
                sender.send(state.current())?;
                myself.stop(None);
            }
        }
        Ok(())
    }
}
