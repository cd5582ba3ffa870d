/// 입찰 관련 커맨드 처리
/// 검증을 통과한 입찰만 저장소에 반영하고, 반영 직전에 다른 입찰이 먼저 들어와
/// 저장소 조건이 깨지면 경매 물품을 다시 읽어 검증부터 다시 한다.
// region:    --- Imports
use super::model::{Bid, NewBid};
use crate::auction::events::AuctionEvent;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::message_broker::EventPublisher;
use crate::store::AuctionStore;
use crate::validation::validate_bid;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub lot_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
}

// 최대 시도 횟수
pub const MAX_BID_ATTEMPTS: usize = 5;

/// 입찰
pub async fn place_bid(
    cmd: PlaceBidCommand,
    store: &dyn AuctionStore,
    clock: &dyn Clock,
    events: &dyn EventPublisher,
) -> Result<Bid> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    for attempt in 1..=MAX_BID_ATTEMPTS {
        let lot = store
            .get_lot(cmd.lot_id)
            .await?
            .ok_or(Error::NotFound("경매 물품"))?;

        let now = clock.now();
        validate_bid(&lot, cmd.amount, now)?;

        let new_bid = NewBid {
            lot_id: cmd.lot_id,
            user_id: cmd.bidder_id,
            amount: cmd.amount,
            created_time: now,
        };

        match store.commit_bid(&new_bid).await? {
            Some(bid) => {
                info!(
                    "{:<12} --> 입찰 성공: lot {}, 현재 가격 {}",
                    "Command", bid.lot_id, bid.amount
                );
                events
                    .publish_and_log(&AuctionEvent::BidPlaced {
                        lot_id: bid.lot_id,
                        bidder_id: bid.user_id,
                        amount: bid.amount,
                        timestamp: bid.created_time,
                    })
                    .await;
                return Ok(bid);
            }
            None => {
                warn!(
                    "{:<12} --> 다른 입찰과 충돌: 재시도 ({}/{})",
                    "Command", attempt, MAX_BID_ATTEMPTS
                );
            }
        }
    }

    Err(Error::Contention)
}
// endregion: --- Commands

// endregion: --- Tests
