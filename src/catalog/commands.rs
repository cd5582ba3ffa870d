/// 카탈로그 관련 커맨드 처리
/// 카테고리, 사용자, 경매 물품, 댓글의 생성/수정/삭제
// region:    --- Imports
use super::model::{Category, Comment, NewUser, User, UserUpdate};
use crate::bidding::model::{Lot, LotUpdate, NewLot};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::permissions::{ensure_owner_or_superuser, ensure_superuser, Actor};
use crate::store::AuctionStore;
use crate::validation;
use tracing::info;

// endregion: --- Imports

// region:    --- Categories
/// 카테고리 생성 (관리자 전용)
pub async fn create_category(
    store: &dyn AuctionStore,
    actor: &Actor,
    name: &str,
) -> Result<Category> {
    ensure_superuser(actor)?;
    validation::validate_category_name(name)?;
    let category = store.create_category(name.trim()).await?;
    info!("{:<12} --> 카테고리 생성 id: {}", "Command", category.id);
    Ok(category)
}

/// 카테고리 삭제 (관리자 전용)
pub async fn delete_category(store: &dyn AuctionStore, actor: &Actor, id: i64) -> Result<()> {
    ensure_superuser(actor)?;
    if !store.delete_category(id).await? {
        return Err(Error::NotFound("카테고리"));
    }
    info!("{:<12} --> 카테고리 삭제 id: {}", "Command", id);
    Ok(())
}
// endregion: --- Categories

// region:    --- Users
/// 회원 가입
pub async fn register_user(
    store: &dyn AuctionStore,
    clock: &dyn Clock,
    new_user: NewUser,
) -> Result<User> {
    validation::validate_new_user(&new_user)?;
    let user = store.create_user(&new_user, clock.now()).await?;
    info!("{:<12} --> 회원 가입 id: {}", "Command", user.id);
    Ok(user)
}

/// 프로필 수정 (본인 또는 관리자)
pub async fn update_user(
    store: &dyn AuctionStore,
    actor: &Actor,
    id: i64,
    update: UserUpdate,
) -> Result<User> {
    ensure_owner_or_superuser(actor, id)?;
    validation::validate_user_update(&update)?;
    store
        .update_user(id, &update)
        .await?
        .ok_or(Error::NotFound("사용자"))
}

/// 회원 탈퇴 (본인 또는 관리자)
pub async fn delete_user(store: &dyn AuctionStore, actor: &Actor, id: i64) -> Result<()> {
    ensure_owner_or_superuser(actor, id)?;
    if !store.delete_user(id).await? {
        return Err(Error::NotFound("사용자"));
    }
    info!("{:<12} --> 회원 탈퇴 id: {}", "Command", id);
    Ok(())
}
// endregion: --- Users

// region:    --- Lots
/// 경매 물품 등록. 등록한 사용자가 소유자가 된다
pub async fn create_lot(
    store: &dyn AuctionStore,
    clock: &dyn Clock,
    actor: &Actor,
    new_lot: NewLot,
) -> Result<Lot> {
    let now = clock.now();
    validation::validate_new_lot(&new_lot, now)?;
    let lot = store.create_lot(actor.user_id, &new_lot, now).await?;
    info!(
        "{:<12} --> 경매 물품 등록 id: {}, 소유자: {}",
        "Command", lot.id, lot.owner_id
    );
    Ok(lot)
}

/// 경매 물품 수정 (소유자 또는 관리자)
/// 종료 시각이 지났거나 이미 닫힌 경매는 수정할 수 없다
pub async fn update_lot(
    store: &dyn AuctionStore,
    clock: &dyn Clock,
    actor: &Actor,
    id: i64,
    update: LotUpdate,
) -> Result<Lot> {
    let lot = store.get_lot(id).await?.ok_or(Error::NotFound("경매 물품"))?;
    ensure_owner_or_superuser(actor, lot.owner_id)?;
    let now = clock.now();
    if !lot.accepts_bids_at(now) {
        return Err(Error::LotExpired);
    }
    validation::validate_lot_update(&update, now)?;

    match store.update_lot(id, &update, now).await? {
        Some(updated) => {
            info!("{:<12} --> 경매 물품 수정 id: {}", "Command", id);
            Ok(updated)
        }
        // 읽은 뒤 정리 작업이나 삭제가 먼저 끝난 경우
        None => match store.get_lot(id).await? {
            Some(_) => Err(Error::LotExpired),
            None => Err(Error::NotFound("경매 물품")),
        },
    }
}

/// 경매 물품 삭제 (소유자 또는 관리자)
pub async fn delete_lot(store: &dyn AuctionStore, actor: &Actor, id: i64) -> Result<()> {
    let lot = store.get_lot(id).await?.ok_or(Error::NotFound("경매 물품"))?;
    ensure_owner_or_superuser(actor, lot.owner_id)?;
    if !store.delete_lot(id).await? {
        return Err(Error::NotFound("경매 물품"));
    }
    info!("{:<12} --> 경매 물품 삭제 id: {}", "Command", id);
    Ok(())
}
// endregion: --- Lots

// region:    --- Comments
/// 댓글 작성
pub async fn add_comment(
    store: &dyn AuctionStore,
    clock: &dyn Clock,
    actor: &Actor,
    lot_id: i64,
    text: &str,
) -> Result<Comment> {
    validation::validate_comment(text)?;
    if store.get_lot(lot_id).await?.is_none() {
        return Err(Error::NotFound("경매 물품"));
    }
    store
        .add_comment(lot_id, actor.user_id, text.trim(), clock.now())
        .await
}
// endregion: --- Comments

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::commands::{place_bid, PlaceBidCommand};
    use crate::clock::ManualClock;
    use crate::message_broker::DisabledPublisher;
    use crate::scheduler::LotSweeper;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    async fn setup() -> (MemoryStore, ManualClock, User, User) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        let owner = register_user(
            &store,
            &clock,
            NewUser {
                username: "owner".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let stranger = register_user(
            &store,
            &clock,
            NewUser {
                username: "stranger".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (store, clock, owner, stranger)
    }

    fn new_lot(clock: &ManualClock) -> NewLot {
        NewLot {
            name: "기타".to_string(),
            description: "어쿠스틱".to_string(),
            category_id: None,
            end_date: clock.now() + Duration::days(3),
            start_price: 5000,
            photo: None,
        }
    }

    #[tokio::test]
    async fn stranger_cannot_delete_lot() {
        let (store, clock, owner, stranger) = setup().await;
        let lot = create_lot(&store, &clock, &Actor::user(owner.id), new_lot(&clock))
            .await
            .unwrap();

        let result = delete_lot(&store, &Actor::user(stranger.id), lot.id).await;
        assert!(matches!(result, Err(Error::Forbidden)));
        assert!(store.get_lot(lot.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn owner_and_superuser_can_delete_lot() {
        let (store, clock, owner, stranger) = setup().await;
        let first = create_lot(&store, &clock, &Actor::user(owner.id), new_lot(&clock))
            .await
            .unwrap();
        let second = create_lot(&store, &clock, &Actor::user(owner.id), new_lot(&clock))
            .await
            .unwrap();

        delete_lot(&store, &Actor::user(owner.id), first.id)
            .await
            .unwrap();
        delete_lot(&store, &Actor::superuser(stranger.id), second.id)
            .await
            .unwrap();
        assert!(store.get_lot(first.id).await.unwrap().is_none());
        assert!(store.get_lot(second.id).await.unwrap().is_none());
        assert!(matches!(
            delete_lot(&store, &Actor::user(owner.id), first.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn lot_is_created_active_and_owned() {
        let (store, clock, owner, _) = setup().await;
        let lot = create_lot(&store, &clock, &Actor::user(owner.id), new_lot(&clock))
            .await
            .unwrap();
        assert!(lot.is_active);
        assert_eq!(lot.owner_id, owner.id);
        assert_eq!(lot.current_price, None);
        assert_eq!(lot.start_date, clock.now());
    }

    #[tokio::test]
    async fn lot_creation_is_validated() {
        let (store, clock, owner, _) = setup().await;
        let mut past = new_lot(&clock);
        past.end_date = clock.now() - Duration::minutes(5);
        assert!(matches!(
            create_lot(&store, &clock, &Actor::user(owner.id), past).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(store.stats().await.unwrap().num_lots, 0);
    }

    #[tokio::test]
    async fn lot_update_rules() {
        let (store, clock, owner, stranger) = setup().await;
        let lot = create_lot(&store, &clock, &Actor::user(owner.id), new_lot(&clock))
            .await
            .unwrap();
        let update = LotUpdate {
            description: "줄 교체 완료".to_string(),
            end_date: clock.now() + Duration::days(5),
        };

        assert!(matches!(
            update_lot(&store, &clock, &Actor::user(stranger.id), lot.id, update.clone()).await,
            Err(Error::Forbidden)
        ));

        let updated = update_lot(&store, &clock, &Actor::user(owner.id), lot.id, update)
            .await
            .unwrap();
        assert_eq!(updated.description, "줄 교체 완료");
        assert_eq!(updated.name, lot.name);
    }

    #[tokio::test]
    async fn expired_lot_cannot_be_extended() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sweeper = LotSweeper::new(store.clone(), clock.clone(), Arc::new(DisabledPublisher));
        let mut ids = Vec::new();
        for name in ["owner", "bidder"] {
            let user = NewUser {
                username: name.to_string(),
                ..Default::default()
            };
            ids.push(register_user(store.as_ref(), clock.as_ref(), user).await.unwrap().id);
        }
        let (owner, bidder) = (ids[0], ids[1]);

        let lot = create_lot(store.as_ref(), clock.as_ref(), &Actor::user(owner), new_lot(&clock))
            .await
            .unwrap();
        let cmd = PlaceBidCommand {
            lot_id: lot.id,
            bidder_id: bidder,
            amount: 5500,
        };
        place_bid(cmd, store.as_ref(), clock.as_ref(), &DisabledPublisher)
            .await
            .unwrap();

        // 종료 시각은 지났지만 아직 정리 전
        clock.advance(Duration::days(3) + Duration::hours(1));
        let extend = LotUpdate {
            description: "기간 연장".to_string(),
            end_date: clock.now() + Duration::days(30),
        };
        for actor in [Actor::user(owner), Actor::superuser(owner)] {
            assert!(matches!(
                update_lot(store.as_ref(), clock.as_ref(), &actor, lot.id, extend.clone()).await,
                Err(Error::LotExpired)
            ));
        }

        let report = sweeper.sweep().await.unwrap();
        assert_eq!(report.closed, 1);
        let closed = store.get_lot(lot.id).await.unwrap().unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.owner_id, bidder);
        assert_eq!(closed.end_date, lot.end_date);

        // 닫힌 뒤에도 마찬가지
        assert!(matches!(
            update_lot(store.as_ref(), clock.as_ref(), &Actor::user(bidder), lot.id, extend).await,
            Err(Error::LotExpired)
        ));
    }

    #[tokio::test]
    async fn profile_changes_need_owner_or_superuser() {
        let (store, _clock, owner, stranger) = setup().await;
        let update = UserUpdate {
            bio: Some("수집가".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            update_user(&store, &Actor::user(stranger.id), owner.id, update.clone()).await,
            Err(Error::Forbidden)
        ));
        let updated = update_user(&store, &Actor::user(owner.id), owner.id, update)
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("수집가"));

        assert!(matches!(
            delete_user(&store, &Actor::user(stranger.id), owner.id).await,
            Err(Error::Forbidden)
        ));
        delete_user(&store, &Actor::superuser(stranger.id), owner.id)
            .await
            .unwrap();
        assert!(store.get_user(owner.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn categories_are_admin_only() {
        let (store, _clock, owner, _) = setup().await;
        assert!(matches!(
            create_category(&store, &Actor::user(owner.id), "가구").await,
            Err(Error::Forbidden)
        ));
        let category = create_category(&store, &Actor::superuser(owner.id), " 가구 ")
            .await
            .unwrap();
        assert_eq!(category.name, "가구");
        delete_category(&store, &Actor::superuser(owner.id), category.id)
            .await
            .unwrap();
        assert!(store.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_need_an_existing_lot() {
        let (store, clock, owner, stranger) = setup().await;
        assert!(matches!(
            add_comment(&store, &clock, &Actor::user(stranger.id), 404, "있나요?").await,
            Err(Error::NotFound(_))
        ));

        let lot = create_lot(&store, &clock, &Actor::user(owner.id), new_lot(&clock))
            .await
            .unwrap();
        let comment = add_comment(&store, &clock, &Actor::user(stranger.id), lot.id, "  상태 좋나요? ")
            .await
            .unwrap();
        assert_eq!(comment.text, "상태 좋나요?");
        assert_eq!(comment.owner_id, stranger.id);
    }
}
// endregion: --- Tests
