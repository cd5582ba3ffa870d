/// 경매 데이터 저장소
///
/// 입찰 기록과 현재가 갱신, 만료 경매 정리처럼 함께 반영되어야 하는 쓰기는
/// 저장소 메서드 하나가 하나의 트랜잭션으로 처리한다.
///
/// * `PgStore` - PostgreSQL (운영)
/// * `MemoryStore` - 메모리 (로컬 실행, 테스트)
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::bidding::model::{Bid, ClosedLot, Lot, LotUpdate, NewBid, NewLot};
use crate::catalog::model::{Category, Comment, NewUser, SiteStats, User, UserUpdate};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 목록 조회 페이지 (1부터 시작)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 5;

    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number as i64 - 1) * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_SIZE)
    }
}

#[async_trait]
pub trait AuctionStore: Send + Sync {
    // -- 카테고리
    async fn create_category(&self, name: &str) -> Result<Category>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    /// 삭제된 카테고리를 참조하던 경매 물품은 카테고리가 비워진다
    async fn delete_category(&self, id: i64) -> Result<bool>;

    // -- 사용자
    async fn create_user(&self, user: &NewUser, now: DateTime<Utc>) -> Result<User>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn list_users(&self, page: Page) -> Result<Vec<User>>;
    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>>;
    /// 사용자의 경매 물품, 입찰, 댓글도 함께 삭제하고
    /// 입찰이 빠진 경매의 현재가는 남은 최고 입찰로 되돌린다
    async fn delete_user(&self, id: i64) -> Result<bool>;

    // -- 경매 물품
    async fn create_lot(&self, owner_id: i64, lot: &NewLot, now: DateTime<Utc>) -> Result<Lot>;
    async fn get_lot(&self, id: i64) -> Result<Option<Lot>>;
    async fn list_lots(&self, is_active: bool, page: Page) -> Result<Vec<Lot>>;
    async fn list_owned_lots(&self, owner_id: i64, is_active: bool) -> Result<Vec<Lot>>;
    /// 사용자가 입찰한 진행 중 경매 (중복 없음)
    async fn list_participating_lots(&self, user_id: i64) -> Result<Vec<Lot>>;
    /// 진행 중이고 종료 시각 전인 경매만 수정된다. 그 밖에는 None
    async fn update_lot(
        &self,
        id: i64,
        update: &LotUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Lot>>;
    /// 입찰과 댓글도 함께 삭제
    async fn delete_lot(&self, id: i64) -> Result<bool>;

    // -- 입찰
    /// 입찰 기록과 현재가 갱신을 한 트랜잭션으로 반영.
    /// 경매가 진행 중이고 금액이 현재가(없으면 시작가)보다 높을 때만 반영하며,
    /// 조건이 맞지 않으면 아무 것도 바꾸지 않고 None.
    async fn commit_bid(&self, bid: &NewBid) -> Result<Option<Bid>>;
    /// 금액 내림차순, 같은 금액은 먼저 들어온 입찰 우선
    async fn list_bids(&self, lot_id: i64) -> Result<Vec<Bid>>;

    // -- 댓글
    async fn add_comment(
        &self,
        lot_id: i64,
        owner_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment>;
    async fn list_comments(&self, lot_id: i64) -> Result<Vec<Comment>>;

    // -- 만료 정리
    async fn expired_lot_ids(&self, now: DateTime<Utc>) -> Result<Vec<i64>>;
    /// 진행 중이고 만료된 경매만 닫는다. 이미 닫혔거나 만료 전이면 None.
    async fn close_lot(&self, lot_id: i64, now: DateTime<Utc>) -> Result<Option<ClosedLot>>;

    // -- 통계
    async fn stats(&self) -> Result<SiteStats>;
}
