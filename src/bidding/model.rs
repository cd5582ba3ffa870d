use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 물품 모델
// 금액은 모두 최소 화폐 단위(센트)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lot {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_price: i64,
    pub current_price: Option<i64>,
    pub is_active: bool,
    pub owner_id: i64,
    pub photo: Option<String>,
}

impl Lot {
    /// 다음 입찰이 넘어야 하는 가격 (입찰이 없으면 시작가)
    pub fn floor_price(&self) -> i64 {
        self.current_price.unwrap_or(self.start_price)
    }

    /// 입찰 가능 여부
    pub fn accepts_bids_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.end_date
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }

    /// 경매 진행률(0 ~ 100, 소수점 둘째 자리)
    pub fn progress_percentage(&self, now: DateTime<Utc>) -> f64 {
        if self.start_date >= self.end_date {
            return if now >= self.end_date { 100.0 } else { 0.0 };
        }
        let total = (self.end_date - self.start_date).num_milliseconds() as f64;
        let elapsed = (now - self.start_date).num_milliseconds() as f64;
        let progress = (elapsed / total * 100.0).clamp(0.0, 100.0);
        (progress * 100.0).round() / 100.0
    }
}

// 입찰 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub lot_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub created_time: DateTime<Utc>,
}

/// 경매 물품 등록 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLot {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub end_date: DateTime<Utc>,
    pub start_price: i64,
    #[serde(default)]
    pub photo: Option<String>,
}

/// 경매 물품 수정 요청 (설명과 종료 시각만 바꿀 수 있다)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotUpdate {
    pub description: String,
    pub end_date: DateTime<Utc>,
}

/// 저장소에 기록할 입찰
#[derive(Debug, Clone)]
pub struct NewBid {
    pub lot_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub created_time: DateTime<Utc>,
}

/// 만료 처리 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedLot {
    pub lot_id: i64,
    pub previous_owner_id: i64,
    pub winner_id: Option<i64>,
    pub final_price: Option<i64>,
}
