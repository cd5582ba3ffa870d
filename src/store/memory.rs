//! 메모리 저장소
//!
//! 모든 연산이 하나의 뮤텍스 아래에서 실행되므로 각 메서드가 곧 하나의 트랜잭션이다.
//! 외래 키와 연쇄 삭제 규칙은 PostgreSQL 스키마와 같게 맞춘다.
use super::{AuctionStore, Page};
use crate::bidding::model::{Bid, ClosedLot, Lot, LotUpdate, NewBid, NewLot};
use crate::catalog::model::{Category, Comment, NewUser, SiteStats, User, UserUpdate};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    users: BTreeMap<i64, User>,
    lots: BTreeMap<i64, Lot>,
    bids: BTreeMap<i64, Bid>,
    comments: BTreeMap<i64, Comment>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn sorted_bids(&self, lot_id: i64) -> Vec<Bid> {
        let mut bids: Vec<Bid> = self
            .bids
            .values()
            .filter(|b| b.lot_id == lot_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then(a.created_time.cmp(&b.created_time))
                .then(a.id.cmp(&b.id))
        });
        bids
    }

    /// 남은 입찰 중 최고 금액으로 현재가를 다시 맞춘다
    fn recompute_price(&mut self, lot_id: i64) {
        let highest = self
            .bids
            .values()
            .filter(|b| b.lot_id == lot_id)
            .map(|b| b.amount)
            .max();
        if let Some(lot) = self.lots.get_mut(&lot_id) {
            lot.current_price = highest;
        }
    }

    fn remove_lot_cascade(&mut self, lot_id: i64) -> bool {
        if self.lots.remove(&lot_id).is_none() {
            return false;
        }
        self.bids.retain(|_, b| b.lot_id != lot_id);
        self.comments.retain(|_, c| c.lot_id != lot_id);
        true
    }
}

/// 최신 등록 순
fn sort_lots(lots: &mut [Lot]) {
    lots.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    // region:    --- Categories
    async fn create_category(&self, name: &str) -> Result<Category> {
        let mut t = self.tables.lock().await;
        let category = Category {
            id: t.next_id(),
            name: name.to_string(),
        };
        t.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let t = self.tables.lock().await;
        let mut categories: Vec<Category> = t.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().await;
        if t.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for lot in t.lots.values_mut() {
            if lot.category_id == Some(id) {
                lot.category_id = None;
            }
        }
        Ok(true)
    }
    // endregion: --- Categories

    // region:    --- Users
    async fn create_user(&self, user: &NewUser, now: DateTime<Utc>) -> Result<User> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(Error::duplicate());
        }
        let created = User {
            id: t.next_id(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            date_of_birth: user.date_of_birth,
            location: user.location.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
            date_joined: now,
        };
        t.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self, page: Page) -> Result<Vec<User>> {
        let t = self.tables.lock().await;
        let mut users: Vec<User> = t.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(paginate(users, page))
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        let mut t = self.tables.lock().await;
        Ok(t.users.get_mut(&id).map(|user| {
            update.apply_to(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().await;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<i64> = t
            .lots
            .values()
            .filter(|l| l.owner_id == id)
            .map(|l| l.id)
            .collect();
        for lot_id in owned {
            t.remove_lot_cascade(lot_id);
        }
        let bid_on: BTreeSet<i64> = t
            .bids
            .values()
            .filter(|b| b.user_id == id)
            .map(|b| b.lot_id)
            .collect();
        t.bids.retain(|_, b| b.user_id != id);
        for lot_id in bid_on {
            t.recompute_price(lot_id);
        }
        t.comments.retain(|_, c| c.owner_id != id);
        Ok(true)
    }
    // endregion: --- Users

    // region:    --- Lots
    async fn create_lot(&self, owner_id: i64, lot: &NewLot, now: DateTime<Utc>) -> Result<Lot> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&owner_id) {
            return Err(Error::dangling_reference());
        }
        if let Some(category_id) = lot.category_id {
            if !t.categories.contains_key(&category_id) {
                return Err(Error::dangling_reference());
            }
        }
        let created = Lot {
            id: t.next_id(),
            name: lot.name.clone(),
            description: lot.description.clone(),
            category_id: lot.category_id,
            start_date: now,
            end_date: lot.end_date,
            start_price: lot.start_price,
            current_price: None,
            is_active: true,
            owner_id,
            photo: lot.photo.clone(),
        };
        t.lots.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_lot(&self, id: i64) -> Result<Option<Lot>> {
        Ok(self.tables.lock().await.lots.get(&id).cloned())
    }

    async fn list_lots(&self, is_active: bool, page: Page) -> Result<Vec<Lot>> {
        let t = self.tables.lock().await;
        let mut lots: Vec<Lot> = t
            .lots
            .values()
            .filter(|l| l.is_active == is_active)
            .cloned()
            .collect();
        sort_lots(&mut lots);
        Ok(paginate(lots, page))
    }

    async fn list_owned_lots(&self, owner_id: i64, is_active: bool) -> Result<Vec<Lot>> {
        let t = self.tables.lock().await;
        let mut lots: Vec<Lot> = t
            .lots
            .values()
            .filter(|l| l.owner_id == owner_id && l.is_active == is_active)
            .cloned()
            .collect();
        sort_lots(&mut lots);
        Ok(lots)
    }

    async fn list_participating_lots(&self, user_id: i64) -> Result<Vec<Lot>> {
        let t = self.tables.lock().await;
        let mut lots: Vec<Lot> = t
            .lots
            .values()
            .filter(|l| l.is_active)
            .filter(|l| {
                t.bids
                    .values()
                    .any(|b| b.lot_id == l.id && b.user_id == user_id)
            })
            .cloned()
            .collect();
        sort_lots(&mut lots);
        Ok(lots)
    }

    async fn update_lot(
        &self,
        id: i64,
        update: &LotUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Lot>> {
        let mut t = self.tables.lock().await;
        Ok(t
            .lots
            .get_mut(&id)
            .filter(|lot| lot.accepts_bids_at(now))
            .map(|lot| {
                lot.description = update.description.clone();
                lot.end_date = update.end_date;
                lot.clone()
            }))
    }

    async fn delete_lot(&self, id: i64) -> Result<bool> {
        Ok(self.tables.lock().await.remove_lot_cascade(id))
    }
    // endregion: --- Lots

    // region:    --- Bids
    async fn commit_bid(&self, bid: &NewBid) -> Result<Option<Bid>> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&bid.user_id) {
            return Err(Error::dangling_reference());
        }
        let Some(lot) = t.lots.get(&bid.lot_id) else {
            return Ok(None);
        };
        if !lot.accepts_bids_at(bid.created_time) || bid.amount <= lot.floor_price() {
            return Ok(None);
        }

        let created = Bid {
            id: t.next_id(),
            lot_id: bid.lot_id,
            user_id: bid.user_id,
            amount: bid.amount,
            created_time: bid.created_time,
        };
        t.bids.insert(created.id, created.clone());
        if let Some(lot) = t.lots.get_mut(&bid.lot_id) {
            lot.current_price = Some(bid.amount);
        }
        Ok(Some(created))
    }

    async fn list_bids(&self, lot_id: i64) -> Result<Vec<Bid>> {
        Ok(self.tables.lock().await.sorted_bids(lot_id))
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
        let mut t = self.tables.lock().await;
        if !t.lots.contains_key(&lot_id) || !t.users.contains_key(&owner_id) {
            return Err(Error::dangling_reference());
        }
        let comment = Comment {
            id: t.next_id(),
            lot_id,
            owner_id,
            text: text.to_string(),
            created_time: now,
        };
        t.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, lot_id: i64) -> Result<Vec<Comment>> {
        let t = self.tables.lock().await;
        let mut comments: Vec<Comment> = t
            .comments
            .values()
            .filter(|c| c.lot_id == lot_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_time.cmp(&b.created_time).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
    // endregion: --- Comments

    // region:    --- Sweep
    async fn expired_lot_ids(&self, now: DateTime<Utc>) -> Result<Vec<i64>> {
        let t = self.tables.lock().await;
        let mut expired: Vec<&Lot> = t
            .lots
            .values()
            .filter(|l| l.is_active && l.is_expired_at(now))
            .collect();
        expired.sort_by(|a, b| a.end_date.cmp(&b.end_date).then(a.id.cmp(&b.id)));
        Ok(expired.into_iter().map(|l| l.id).collect())
    }

    async fn close_lot(&self, lot_id: i64, now: DateTime<Utc>) -> Result<Option<ClosedLot>> {
        let mut t = self.tables.lock().await;
        let previous_owner_id = match t.lots.get(&lot_id) {
            Some(lot) if lot.is_active && lot.is_expired_at(now) => lot.owner_id,
            _ => return Ok(None),
        };
        let highest = t.sorted_bids(lot_id).into_iter().next();
        let winner_id = highest.as_ref().map(|b| b.user_id);
        let final_price = highest.as_ref().map(|b| b.amount);

        if let Some(lot) = t.lots.get_mut(&lot_id) {
            lot.is_active = false;
            if let Some(winner_id) = winner_id {
                lot.owner_id = winner_id;
            }
        }
        Ok(Some(ClosedLot {
            lot_id,
            previous_owner_id,
            winner_id,
            final_price,
        }))
    }
    // endregion: --- Sweep

    async fn stats(&self) -> Result<SiteStats> {
        let t = self.tables.lock().await;
        Ok(SiteStats {
            num_categories: t.categories.len() as i64,
            num_users: t.users.len() as i64,
            num_lots: t.lots.len() as i64,
            num_active_lots: t.lots.values().filter(|l| l.is_active).count() as i64,
        })
    }
}

// endregion: --- Tests
