// region:    --- Imports
use crate::bidding::model::{Bid, Lot};
use crate::catalog::model::{Category, Comment, SiteStats, User};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::scheduler::LotSweeper;
use crate::store::{AuctionStore, Page};
use serde::Serialize;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Views
/// 경매 물품 상세
#[derive(Debug, Clone, Serialize)]
pub struct LotDetail {
    pub lot: Lot,
    pub bids: Vec<Bid>,
    pub comments: Vec<Comment>,
    pub highest_bidder_id: Option<i64>,
    pub highest_bid_amount: Option<i64>,
    pub progress_percentage: f64,
}

/// 사용자 프로필
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub active_lots: Vec<Lot>,
    pub inactive_lots: Vec<Lot>,
    pub participating_lots: Vec<Lot>,
}
// endregion: --- Views

// region:    --- Query Handlers

/// 메인 페이지 통계 조회
pub async fn get_stats(store: &dyn AuctionStore) -> Result<SiteStats> {
    info!("{:<12} --> 통계 조회", "Query");
    store.stats().await
}

/// 모든 카테고리 조회
pub async fn list_categories(store: &dyn AuctionStore) -> Result<Vec<Category>> {
    info!("{:<12} --> 모든 카테고리 조회", "Query");
    store.list_categories().await
}

pub async fn get_category(store: &dyn AuctionStore, id: i64) -> Result<Category> {
    store
        .get_category(id)
        .await?
        .ok_or(Error::NotFound("카테고리"))
}

/// 사용자 목록 조회
pub async fn list_users(store: &dyn AuctionStore, page: Page) -> Result<Vec<User>> {
    info!("{:<12} --> 사용자 목록 조회 page: {}", "Query", page.number);
    store.list_users(page).await
}

/// 사용자 프로필 조회
pub async fn get_user_profile(store: &dyn AuctionStore, user_id: i64) -> Result<UserProfile> {
    info!("{:<12} --> 사용자 프로필 조회 id: {}", "Query", user_id);
    let user = store
        .get_user(user_id)
        .await?
        .ok_or(Error::NotFound("사용자"))?;
    Ok(UserProfile {
        active_lots: store.list_owned_lots(user_id, true).await?,
        inactive_lots: store.list_owned_lots(user_id, false).await?,
        participating_lots: store.list_participating_lots(user_id).await?,
        user,
    })
}

/// 경매 목록 조회. 목록을 읽기 전에 만료 경매를 먼저 정리한다
pub async fn list_lots(
    store: &dyn AuctionStore,
    sweeper: &LotSweeper,
    is_active: bool,
    page: Page,
) -> Result<Vec<Lot>> {
    info!(
        "{:<12} --> 경매 목록 조회 active: {}, page: {}",
        "Query", is_active, page.number
    );
    if let Err(e) = sweeper.sweep().await {
        error!("{:<12} --> 목록 조회 전 정리 실패: {:?}", "Query", e);
    }
    store.list_lots(is_active, page).await
}

/// 경매 물품 상세 조회
pub async fn get_lot_detail(
    store: &dyn AuctionStore,
    clock: &dyn Clock,
    lot_id: i64,
) -> Result<LotDetail> {
    info!("{:<12} --> 경매 물품 조회 id: {}", "Query", lot_id);
    let lot = store
        .get_lot(lot_id)
        .await?
        .ok_or(Error::NotFound("경매 물품"))?;
    let bids = store.list_bids(lot_id).await?;
    let comments = store.list_comments(lot_id).await?;
    let highest = bids.first();

    Ok(LotDetail {
        highest_bidder_id: highest.map(|b| b.user_id),
        highest_bid_amount: highest.map(|b| b.amount),
        progress_percentage: lot.progress_percentage(clock.now()),
        lot,
        bids,
        comments,
    })
}

/// 입찰 이력 조회
pub async fn get_bid_history(store: &dyn AuctionStore, lot_id: i64) -> Result<Vec<Bid>> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", lot_id);
    if store.get_lot(lot_id).await?.is_none() {
        return Err(Error::NotFound("경매 물품"));
    }
    store.list_bids(lot_id).await
}

// endregion: --- Query Handlers

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::commands::{place_bid, PlaceBidCommand};
    use crate::bidding::model::NewLot;
    use crate::catalog::model::NewUser;
    use crate::clock::ManualClock;
    use crate::message_broker::DisabledPublisher;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    async fn user(store: &MemoryStore, name: &str) -> i64 {
        let new_user = NewUser {
            username: name.to_string(),
            ..Default::default()
        };
        store.create_user(&new_user, Utc::now()).await.unwrap().id
    }

    async fn lot(store: &MemoryStore, clock: &ManualClock, owner: i64, hours: i64) -> Lot {
        let new_lot = NewLot {
            name: "시계".to_string(),
            description: "손목시계".to_string(),
            category_id: None,
            end_date: clock.now() + Duration::hours(hours),
            start_price: 100,
            photo: None,
        };
        store.create_lot(owner, &new_lot, clock.now()).await.unwrap()
    }

    async fn bid(store: &MemoryStore, clock: &ManualClock, lot_id: i64, bidder_id: i64, amount: i64) {
        let cmd = PlaceBidCommand {
            lot_id,
            bidder_id,
            amount,
        };
        place_bid(cmd, store, clock, &DisabledPublisher).await.unwrap();
    }

    #[tokio::test]
    async fn listing_closes_expired_lots_first() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sweeper = LotSweeper::new(store.clone(), clock.clone(), Arc::new(DisabledPublisher));
        let seller = user(&store, "seller").await;
        let short = lot(&store, &clock, seller, 1).await;
        let long = lot(&store, &clock, seller, 10).await;

        clock.advance(Duration::hours(2));

        let active = list_lots(store.as_ref(), &sweeper, true, Page::default())
            .await
            .unwrap();
        assert_eq!(active.iter().map(|l| l.id).collect::<Vec<_>>(), vec![long.id]);

        let inactive = list_lots(store.as_ref(), &sweeper, false, Page::default())
            .await
            .unwrap();
        assert_eq!(
            inactive.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![short.id]
        );
    }

    #[tokio::test]
    async fn lot_detail_reports_highest_bid() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        let seller = user(&store, "seller").await;
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let lot = lot(&store, &clock, seller, 4).await;

        bid(&store, &clock, lot.id, alice, 150).await;
        bid(&store, &clock, lot.id, bob, 200).await;
        store
            .add_comment(lot.id, alice, "아쉽네요", clock.now())
            .await
            .unwrap();
        clock.advance(Duration::hours(1));

        let detail = get_lot_detail(&store, &clock, lot.id).await.unwrap();
        assert_eq!(detail.highest_bidder_id, Some(bob));
        assert_eq!(detail.highest_bid_amount, Some(200));
        assert_eq!(detail.bids.len(), 2);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.progress_percentage, 25.0);

        assert!(matches!(
            get_lot_detail(&store, &clock, 12345).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn profile_splits_lots() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sweeper = LotSweeper::new(store.clone(), clock.clone(), Arc::new(DisabledPublisher));
        let seller = user(&store, "seller").await;
        let alice = user(&store, "alice").await;

        let ending = lot(&store, &clock, seller, 1).await;
        let running = lot(&store, &clock, seller, 8).await;
        bid(&store, &clock, running.id, alice, 300).await;
        bid(&store, &clock, running.id, alice, 400).await;

        clock.advance(Duration::hours(2));
        sweeper.sweep().await.unwrap();

        let profile = get_user_profile(store.as_ref(), seller).await.unwrap();
        assert_eq!(profile.active_lots.len(), 1);
        assert_eq!(profile.inactive_lots[0].id, ending.id);

        let bidder = get_user_profile(store.as_ref(), alice).await.unwrap();
        assert_eq!(bidder.participating_lots.len(), 1);
        assert_eq!(bidder.participating_lots[0].id, running.id);
        assert!(bidder.active_lots.is_empty());
    }

    #[tokio::test]
    async fn stats_count_active_lots() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        let seller = user(&store, "seller").await;
        lot(&store, &clock, seller, 1).await;
        store.create_category("도서").await.unwrap();

        let stats = get_stats(&store).await.unwrap();
        assert_eq!(
            stats,
            SiteStats {
                num_categories: 1,
                num_users: 1,
                num_lots: 1,
                num_active_lots: 1,
            }
        );
    }
}
// endregion: --- Tests
