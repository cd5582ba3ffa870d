/// 만료 경매 정리 스케줄러
/// 종료 시각이 지난 진행 중 경매를 닫고 최고 입찰자에게 소유권을 넘긴다.
/// 같은 경매를 두 번 처리하지 않으므로 몇 번을 실행해도 결과는 같다.
/// 경매 하나의 처리 실패가 나머지 경매 처리를 막지 않는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::clock::Clock;
use crate::error::Result;
use crate::message_broker::EventPublisher;
use crate::store::AuctionStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Lot Sweeper
/// 정리 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// 이번에 닫은 경매 수
    pub closed: usize,
    /// 다른 정리 작업이 먼저 닫은 경매 수
    pub skipped: usize,
    /// 처리 중 오류가 난 경매 수
    pub failed: usize,
}

pub struct LotSweeper {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
}

impl LotSweeper {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            clock,
            events,
        }
    }

    /// 만료 경매 정리
    pub async fn sweep(&self) -> Result<SweepReport> {
        let now = self.clock.now();
        let expired = self.store.expired_lot_ids(now).await?;
        let mut report = SweepReport::default();

        for lot_id in expired {
            match self.store.close_lot(lot_id, now).await {
                Ok(Some(closed)) => {
                    report.closed += 1;
                    info!(
                        "{:<12} --> 경매 종료 lot: {}, 낙찰자: {:?}, 최종 가격: {:?}",
                        "Scheduler", closed.lot_id, closed.winner_id, closed.final_price
                    );
                    self.events
                        .publish_and_log(&AuctionEvent::LotClosed {
                            lot_id: closed.lot_id,
                            winner_id: closed.winner_id,
                            final_price: closed.final_price,
                            timestamp: now,
                        })
                        .await;
                }
                Ok(None) => {
                    report.skipped += 1;
                    debug!("{:<12} --> 이미 종료된 경매 lot: {}", "Scheduler", lot_id);
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "{:<12} --> 경매 종료 처리 중 오류 lot: {}, {:?}",
                        "Scheduler", lot_id, e
                    );
                }
            }
        }

        Ok(report)
    }
}
// endregion: --- Lot Sweeper

// region:    --- Auction Scheduler
/// 주기적으로 정리 작업을 실행하는 스케줄러
pub struct AuctionScheduler {
    sweeper: Arc<LotSweeper>,
    period: Duration,
}

impl AuctionScheduler {
    pub fn new(sweeper: Arc<LotSweeper>, period: Duration) -> Self {
        Self { sweeper, period }
    }

    /// 스케줄러 시작
    pub fn start(&self) -> JoinHandle<()> {
        let sweeper = Arc::clone(&self.sweeper);
        let period = self.period;
        info!(
            "{:<12} --> 만료 경매 정리 스케줄러 시작 (주기 {:?})",
            "Scheduler", period
        );
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match sweeper.sweep().await {
                    Ok(report) if report.closed + report.failed > 0 => info!(
                        "{:<12} --> 정리 완료: {:?}",
                        "Scheduler", report
                    ),
                    Ok(_) => debug!("{:<12} --> 정리할 경매 없음", "Scheduler"),
                    Err(e) => error!(
                        "{:<12} --> 만료 경매 조회 중 오류 발생: {:?}",
                        "Scheduler", e
                    ),
                }
            }
        })
    }
}
// endregion: --- Auction Scheduler

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::commands::{place_bid, PlaceBidCommand};
    use crate::bidding::model::{Bid, ClosedLot, Lot, LotUpdate, NewBid, NewLot};
    use crate::catalog::model::{Category, Comment, NewUser, SiteStats, User, UserUpdate};
    use crate::clock::ManualClock;
    use crate::error::Error;
    use crate::message_broker::tests::RecordingPublisher;
    use crate::message_broker::DisabledPublisher;
    use crate::store::{MemoryStore, Page};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use std::collections::BTreeSet;
    use tokio::sync::Mutex;

    // region:    --- Flaky Store
    /// 메모리 저장소를 감싸 정리 작업 중의 실패와 경합을 흉내낸다
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        // 다음 close_lot 호출이 실패할 경매
        broken: Mutex<BTreeSet<i64>>,
        // 만료 목록을 돌려준 직후 다른 정리 작업이 먼저 닫는다
        race_close: Mutex<bool>,
    }

    #[async_trait]
    impl AuctionStore for FlakyStore {
        async fn create_category(&self, name: &str) -> Result<Category> {
            self.inner.create_category(name).await
        }
        async fn get_category(&self, id: i64) -> Result<Option<Category>> {
            self.inner.get_category(id).await
        }
        async fn list_categories(&self) -> Result<Vec<Category>> {
            self.inner.list_categories().await
        }
        async fn delete_category(&self, id: i64) -> Result<bool> {
            self.inner.delete_category(id).await
        }
        async fn create_user(&self, user: &NewUser, now: DateTime<Utc>) -> Result<User> {
            self.inner.create_user(user, now).await
        }
        async fn get_user(&self, id: i64) -> Result<Option<User>> {
            self.inner.get_user(id).await
        }
        async fn list_users(&self, page: Page) -> Result<Vec<User>> {
            self.inner.list_users(page).await
        }
        async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
            self.inner.update_user(id, update).await
        }
        async fn delete_user(&self, id: i64) -> Result<bool> {
            self.inner.delete_user(id).await
        }
        async fn create_lot(&self, owner_id: i64, lot: &NewLot, now: DateTime<Utc>) -> Result<Lot> {
            self.inner.create_lot(owner_id, lot, now).await
        }
        async fn get_lot(&self, id: i64) -> Result<Option<Lot>> {
            self.inner.get_lot(id).await
        }
        async fn list_lots(&self, is_active: bool, page: Page) -> Result<Vec<Lot>> {
            self.inner.list_lots(is_active, page).await
        }
        async fn list_owned_lots(&self, owner_id: i64, is_active: bool) -> Result<Vec<Lot>> {
            self.inner.list_owned_lots(owner_id, is_active).await
        }
        async fn list_participating_lots(&self, user_id: i64) -> Result<Vec<Lot>> {
            self.inner.list_participating_lots(user_id).await
        }
        async fn update_lot(
            &self,
            id: i64,
            update: &LotUpdate,
            now: DateTime<Utc>,
        ) -> Result<Option<Lot>> {
            self.inner.update_lot(id, update, now).await
        }
        async fn delete_lot(&self, id: i64) -> Result<bool> {
            self.inner.delete_lot(id).await
        }
        async fn commit_bid(&self, bid: &NewBid) -> Result<Option<Bid>> {
            self.inner.commit_bid(bid).await
        }
        async fn list_bids(&self, lot_id: i64) -> Result<Vec<Bid>> {
            self.inner.list_bids(lot_id).await
        }
        async fn add_comment(
            &self,
            lot_id: i64,
            owner_id: i64,
            text: &str,
            now: DateTime<Utc>,
        ) -> Result<Comment> {
            self.inner.add_comment(lot_id, owner_id, text, now).await
        }
        async fn list_comments(&self, lot_id: i64) -> Result<Vec<Comment>> {
            self.inner.list_comments(lot_id).await
        }
        async fn expired_lot_ids(&self, now: DateTime<Utc>) -> Result<Vec<i64>> {
            let ids = self.inner.expired_lot_ids(now).await?;
            if std::mem::take(&mut *self.race_close.lock().await) {
                for id in &ids {
                    self.inner.close_lot(*id, now).await?;
                }
            }
            Ok(ids)
        }
        async fn close_lot(&self, lot_id: i64, now: DateTime<Utc>) -> Result<Option<ClosedLot>> {
            if self.broken.lock().await.remove(&lot_id) {
                return Err(Error::Database(sqlx::Error::PoolTimedOut));
            }
            self.inner.close_lot(lot_id, now).await
        }
        async fn stats(&self) -> Result<SiteStats> {
            self.inner.stats().await
        }
    }
    // endregion: --- Flaky Store

    struct Fixture {
        store: Arc<FlakyStore>,
        clock: Arc<ManualClock>,
        events: Arc<RecordingPublisher>,
        sweeper: LotSweeper,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(FlakyStore::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let events = Arc::new(RecordingPublisher::default());
        let sweeper = LotSweeper::new(store.clone(), clock.clone(), events.clone());
        Fixture {
            store,
            clock,
            events,
            sweeper,
        }
    }

    impl Fixture {
        async fn user(&self, name: &str) -> i64 {
            let user = NewUser {
                username: name.to_string(),
                ..Default::default()
            };
            self.store.create_user(&user, self.clock.now()).await.unwrap().id
        }

        async fn lot(&self, owner: i64, hours: i64) -> Lot {
            let new_lot = NewLot {
                name: "노트북".to_string(),
                description: "2020년형".to_string(),
                category_id: None,
                end_date: self.clock.now() + ChronoDuration::hours(hours),
                start_price: 10,
                photo: None,
            };
            self.store
                .create_lot(owner, &new_lot, self.clock.now())
                .await
                .unwrap()
        }

        async fn bid(&self, lot_id: i64, bidder_id: i64, amount: i64) {
            let cmd = PlaceBidCommand {
                lot_id,
                bidder_id,
                amount,
            };
            place_bid(
                cmd,
                self.store.as_ref(),
                self.clock.as_ref(),
                &DisabledPublisher,
            )
            .await
            .unwrap();
        }

        async fn reload(&self, lot_id: i64) -> Lot {
            self.store.get_lot(lot_id).await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn highest_bidder_wins_expired_lot() {
        let f = fixture();
        let seller = f.user("seller").await;
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;
        let lot = f.lot(seller, 1).await;

        f.bid(lot.id, alice, 15).await;
        f.bid(lot.id, bob, 20).await;

        // 만료 전에는 아무 것도 하지 않는다
        assert_eq!(f.sweeper.sweep().await.unwrap(), SweepReport::default());

        f.clock.advance(ChronoDuration::hours(1) + ChronoDuration::seconds(1));
        let report = f.sweeper.sweep().await.unwrap();
        assert_eq!(report.closed, 1);

        let closed = f.reload(lot.id).await;
        assert!(!closed.is_active);
        assert_eq!(closed.owner_id, bob);
        assert_eq!(closed.current_price, Some(20));
    }

    #[tokio::test]
    async fn lot_without_bids_keeps_owner() {
        let f = fixture();
        let seller = f.user("seller").await;
        let lot = f.lot(seller, 1).await;

        f.clock.advance(ChronoDuration::hours(2));
        f.sweeper.sweep().await.unwrap();

        let closed = f.reload(lot.id).await;
        assert!(!closed.is_active);
        assert_eq!(closed.owner_id, seller);
    }

    #[tokio::test]
    async fn sweeping_twice_changes_nothing() {
        let f = fixture();
        let seller = f.user("seller").await;
        let alice = f.user("alice").await;
        let lot = f.lot(seller, 1).await;
        f.bid(lot.id, alice, 50).await;

        f.clock.advance(ChronoDuration::hours(3));
        f.sweeper.sweep().await.unwrap();
        let after_first = f.reload(lot.id).await;

        let second = f.sweeper.sweep().await.unwrap();
        assert_eq!(second, SweepReport::default());
        assert_eq!(f.reload(lot.id).await, after_first);
        assert_eq!(f.events.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn lot_ends_exactly_at_end_date() {
        let f = fixture();
        let seller = f.user("seller").await;
        let lot = f.lot(seller, 1).await;

        f.clock.set(lot.end_date);
        assert_eq!(f.sweeper.sweep().await.unwrap().closed, 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_block_others() {
        let f = fixture();
        let seller = f.user("seller").await;
        let alice = f.user("alice").await;
        let first = f.lot(seller, 1).await;
        let second = f.lot(seller, 2).await;
        f.bid(second.id, alice, 99).await;

        f.store.broken.lock().await.insert(first.id);
        f.clock.advance(ChronoDuration::hours(5));

        let report = f.sweeper.sweep().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.closed, 1);
        assert!(f.reload(first.id).await.is_active);
        assert_eq!(f.reload(second.id).await.owner_id, alice);

        // 다음 실행에서 다시 처리된다
        let retry = f.sweeper.sweep().await.unwrap();
        assert_eq!(retry.closed, 1);
        assert!(!f.reload(first.id).await.is_active);
    }

    #[tokio::test]
    async fn lot_closed_by_another_sweep_is_skipped() {
        let f = fixture();
        let seller = f.user("seller").await;
        let alice = f.user("alice").await;
        let lot = f.lot(seller, 1).await;
        f.bid(lot.id, alice, 40).await;

        f.clock.advance(ChronoDuration::hours(2));
        *f.store.race_close.lock().await = true;

        let report = f.sweeper.sweep().await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                closed: 0,
                skipped: 1,
                failed: 0,
            }
        );
        // 먼저 닫은 쪽의 결과가 그대로 남는다
        let closed = f.reload(lot.id).await;
        assert!(!closed.is_active);
        assert_eq!(closed.owner_id, alice);
        assert!(f.events.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn closed_lot_is_published() {
        let f = fixture();
        let seller = f.user("seller").await;
        let alice = f.user("alice").await;
        let lot = f.lot(seller, 1).await;
        f.bid(lot.id, alice, 25).await;

        f.clock.advance(ChronoDuration::hours(1));
        f.sweeper.sweep().await.unwrap();

        let events = f.events.events.lock().await;
        assert_eq!(
            events.as_slice(),
            &[AuctionEvent::LotClosed {
                lot_id: lot.id,
                winner_id: Some(alice),
                final_price: Some(25),
                timestamp: f.clock.now(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_sweeps_on_interval() {
        let f = fixture();
        let seller = f.user("seller").await;
        let lot = f.lot(seller, 1).await;
        f.clock.advance(ChronoDuration::hours(2));

        let sweeper = Arc::new(LotSweeper::new(
            f.store.clone(),
            f.clock.clone(),
            Arc::new(DisabledPublisher),
        ));
        let handle = AuctionScheduler::new(sweeper, Duration::from_secs(60)).start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!f.reload(lot.id).await.is_active);
        handle.abort();
    }
}
// endregion: --- Tests
