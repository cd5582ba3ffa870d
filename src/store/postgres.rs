//! PostgreSQL 저장소
use super::{AuctionStore, Page};
use crate::bidding::model::{Bid, ClosedLot, Lot, LotUpdate, NewBid, NewLot};
use crate::catalog::model::{Category, Comment, NewUser, SiteStats, User, UserUpdate};
use crate::database::DatabaseManager;
use crate::error::Result;
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

pub struct PgStore {
    db: Arc<DatabaseManager>,
}

impl PgStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    fn pool(&self) -> &PgPool {
        self.db.pool()
    }
}

#[async_trait]
impl AuctionStore for PgStore {
    // region:    --- Categories
    async fn create_category(&self, name: &str) -> Result<Category> {
        Ok(sqlx::query_as::<_, Category>(queries::INSERT_CATEGORY)
            .bind(name)
            .fetch_one(self.pool())
            .await?)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>(queries::GET_CATEGORY)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(queries::GET_ALL_CATEGORIES)
            .fetch_all(self.pool())
            .await?)
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(queries::DELETE_CATEGORY)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
    // endregion: --- Categories

    // region:    --- Users
    async fn create_user(&self, user: &NewUser, now: DateTime<Utc>) -> Result<User> {
        Ok(sqlx::query_as::<_, User>(queries::INSERT_USER)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(user.phone_number.as_deref())
            .bind(user.date_of_birth)
            .bind(user.location.as_deref())
            .bind(user.bio.as_deref())
            .bind(user.avatar.as_deref())
            .bind(now)
            .fetch_one(self.pool())
            .await?)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(queries::GET_USER)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn list_users(&self, page: Page) -> Result<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(queries::GET_USERS_PAGE)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?)
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(queries::UPDATE_USER)
            .bind(id)
            .bind(update.first_name.as_deref())
            .bind(update.last_name.as_deref())
            .bind(update.email.as_deref())
            .bind(update.phone_number.as_deref())
            .bind(update.date_of_birth)
            .bind(update.location.as_deref())
            .bind(update.bio.as_deref())
            .bind(update.avatar.as_deref())
            .fetch_optional(self.pool())
            .await?)
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool().begin().await?;

        // 입찰이 빠질 경매를 먼저 잠가 동시 입찰과 엇갈리지 않게 한다
        let bid_on = sqlx::query_scalar::<_, i64>(queries::LOCK_USER_BID_LOTS)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let result = sqlx::query(queries::DELETE_USER)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if !bid_on.is_empty() {
            sqlx::query(queries::RECOMPUTE_LOT_PRICES)
                .bind(&bid_on)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(
            "{:<12} --> 사용자 삭제 id: {}, 현재가 재계산 경매 수: {}",
            "Store",
            id,
            bid_on.len()
        );
        Ok(true)
    }
    // endregion: --- Users

    // region:    --- Lots
    async fn create_lot(&self, owner_id: i64, lot: &NewLot, now: DateTime<Utc>) -> Result<Lot> {
        Ok(sqlx::query_as::<_, Lot>(queries::INSERT_LOT)
            .bind(&lot.name)
            .bind(&lot.description)
            .bind(lot.category_id)
            .bind(now)
            .bind(lot.end_date)
            .bind(lot.start_price)
            .bind(owner_id)
            .bind(lot.photo.as_deref())
            .fetch_one(self.pool())
            .await?)
    }

    async fn get_lot(&self, id: i64) -> Result<Option<Lot>> {
        Ok(sqlx::query_as::<_, Lot>(queries::GET_LOT)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn list_lots(&self, is_active: bool, page: Page) -> Result<Vec<Lot>> {
        Ok(sqlx::query_as::<_, Lot>(queries::GET_LOTS_PAGE)
            .bind(is_active)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?)
    }

    async fn list_owned_lots(&self, owner_id: i64, is_active: bool) -> Result<Vec<Lot>> {
        Ok(sqlx::query_as::<_, Lot>(queries::GET_OWNED_LOTS)
            .bind(owner_id)
            .bind(is_active)
            .fetch_all(self.pool())
            .await?)
    }

    async fn list_participating_lots(&self, user_id: i64) -> Result<Vec<Lot>> {
        Ok(sqlx::query_as::<_, Lot>(queries::GET_PARTICIPATING_LOTS)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn update_lot(
        &self,
        id: i64,
        update: &LotUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Lot>> {
        Ok(sqlx::query_as::<_, Lot>(queries::UPDATE_LOT)
            .bind(id)
            .bind(&update.description)
            .bind(update.end_date)
            .bind(now)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn delete_lot(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(queries::DELETE_LOT)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
    // endregion: --- Lots

    // region:    --- Bids
    async fn commit_bid(&self, bid: &NewBid) -> Result<Option<Bid>> {
        // 트랜잭션 시작
        let mut tx = self.pool().begin().await?;

        // 현재 가격 확인 및 업데이트 (행 잠금)
        let raised = sqlx::query_scalar::<_, i64>(queries::RAISE_LOT_PRICE)
            .bind(bid.lot_id)
            .bind(bid.amount)
            .bind(bid.created_time)
            .fetch_optional(&mut *tx)
            .await?;

        if raised.is_none() {
            tx.rollback().await?;
            debug!(
                "{:<12} --> 현재가 갱신 조건 불일치 lot: {}",
                "Store", bid.lot_id
            );
            return Ok(None);
        }

        // 입찰 기록 추가
        let created = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
            .bind(bid.lot_id)
            .bind(bid.user_id)
            .bind(bid.amount)
            .bind(bid.created_time)
            .fetch_one(&mut *tx)
            .await?;

        // 트랜잭션 커밋
        tx.commit().await?;
        Ok(Some(created))
    }

    async fn list_bids(&self, lot_id: i64) -> Result<Vec<Bid>> {
        Ok(sqlx::query_as::<_, Bid>(queries::GET_LOT_BIDS)
            .bind(lot_id)
            .fetch_all(self.pool())
            .await?)
    }
    // endregion: --- Bids

    // region:    --- Comments
    async fn add_comment(
        &self,
        lot_id: i64,
        owner_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        Ok(sqlx::query_as::<_, Comment>(queries::INSERT_COMMENT)
            .bind(lot_id)
            .bind(owner_id)
            .bind(text)
            .bind(now)
            .fetch_one(self.pool())
            .await?)
    }

    async fn list_comments(&self, lot_id: i64) -> Result<Vec<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(queries::GET_LOT_COMMENTS)
            .bind(lot_id)
            .fetch_all(self.pool())
            .await?)
    }
    // endregion: --- Comments

    // region:    --- Sweep
    async fn expired_lot_ids(&self, now: DateTime<Utc>) -> Result<Vec<i64>> {
        Ok(sqlx::query_scalar::<_, i64>(queries::GET_EXPIRED_LOT_IDS)
            .bind(now)
            .fetch_all(self.pool())
            .await?)
    }

    async fn close_lot(&self, lot_id: i64, now: DateTime<Utc>) -> Result<Option<ClosedLot>> {
        let mut tx = self.pool().begin().await?;

        // 다른 정리 작업이 먼저 닫았으면 잠글 행이 없다
        let previous_owner_id = sqlx::query_scalar::<_, i64>(queries::LOCK_EXPIRED_LOT)
            .bind(lot_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(previous_owner_id) = previous_owner_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let highest = sqlx::query_as::<_, (i64, i64)>(queries::GET_HIGHEST_BID)
            .bind(lot_id)
            .fetch_optional(&mut *tx)
            .await?;
        let winner_id = highest.map(|(user_id, _)| user_id);
        let final_price = highest.map(|(_, amount)| amount);

        sqlx::query(queries::CLOSE_LOT)
            .bind(lot_id)
            .bind(winner_id.unwrap_or(previous_owner_id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(
            "{:<12} --> 경매 종료 lot: {}, 낙찰자: {:?}",
            "Store", lot_id, winner_id
        );
        Ok(Some(ClosedLot {
            lot_id,
            previous_owner_id,
            winner_id,
            final_price,
        }))
    }
    // endregion: --- Sweep

    async fn stats(&self) -> Result<SiteStats> {
        Ok(sqlx::query_as::<_, SiteStats>(queries::GET_SITE_STATS)
            .fetch_one(self.pool())
            .await?)
    }
}
