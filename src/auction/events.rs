use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AuctionEvent {
    // 입찰 성공 이벤트
    BidPlaced {
        lot_id: i64,
        bidder_id: i64,
        amount: i64,
        timestamp: DateTime<Utc>,
    },
    // 경매 종료 이벤트 (낙찰자가 없으면 winner_id 는 None)
    LotClosed {
        lot_id: i64,
        winner_id: Option<i64>,
        final_price: Option<i64>,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn lot_id(&self) -> i64 {
        match self {
            AuctionEvent::BidPlaced { lot_id, .. } | AuctionEvent::LotClosed { lot_id, .. } => {
                *lot_id
            }
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
            AuctionEvent::LotClosed { .. } => "LotClosed",
        }
    }
}
