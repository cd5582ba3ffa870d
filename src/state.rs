use crate::clock::Clock;
use crate::message_broker::EventPublisher;
use crate::scheduler::LotSweeper;
use crate::store::AuctionStore;
use std::sync::Arc;

/// 라우터 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventPublisher>,
    sweeper: Arc<LotSweeper>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let sweeper = Arc::new(LotSweeper::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&events),
        ));
        Self {
            store,
            clock,
            events,
            sweeper,
        }
    }

    /// 스케줄러와 목록 조회가 같은 정리 작업을 공유한다
    pub fn sweeper(&self) -> Arc<LotSweeper> {
        Arc::clone(&self.sweeper)
    }
}
