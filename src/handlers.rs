// region:    --- Imports
use crate::bidding::commands::{place_bid, PlaceBidCommand};
use crate::bidding::model::{Bid, Lot, LotUpdate, NewLot};
use crate::catalog::commands;
use crate::catalog::model::{Category, Comment, NewUser, SiteStats, User, UserUpdate};
use crate::error::{Error, Result};
use crate::permissions::extract_actor;
use crate::query;
use crate::query::handlers::{LotDetail, UserProfile};
use crate::state::AppState;
use crate::store::Page;
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

// endregion: --- Imports

// region:    --- Extractors
/// JSON 본문 추출. 본문 오류도 다른 오류와 같은 형식으로 내려준다
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(Error::Validation(format!(
                "잘못된 요청 본문입니다: {}",
                rejection.body_text()
            ))),
        }
    }
}
// endregion: --- Extractors

// region:    --- Requests
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

impl PageParams {
    fn page(&self) -> Page {
        Page::new(self.page.unwrap_or(1), Page::DEFAULT_SIZE)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}
// endregion: --- Requests

// region:    --- Router
/// 전체 라우터
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_get_stats))
        .route(
            "/categories",
            get(handle_list_categories).post(handle_create_category),
        )
        .route(
            "/categories/:id",
            get(handle_get_category).delete(handle_delete_category),
        )
        .route("/users", get(handle_list_users).post(handle_register_user))
        .route(
            "/users/:id",
            get(handle_get_user)
                .patch(handle_update_user)
                .delete(handle_delete_user),
        )
        .route("/lots", post(handle_create_lot))
        .route("/lots/active", get(handle_list_active_lots))
        .route("/lots/inactive", get(handle_list_inactive_lots))
        .route(
            "/lots/:id",
            get(handle_get_lot)
                .patch(handle_update_lot)
                .delete(handle_delete_lot),
        )
        .route(
            "/lots/:id/bids",
            get(handle_get_bid_history).post(handle_place_bid),
        )
        .route("/lots/:id/comments", post(handle_add_comment))
        .with_state(state)
}
// endregion: --- Router

// region:    --- Command Handlers

/// 카테고리 생성
pub async fn handle_create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let actor = extract_actor(&headers)?;
    info!("{:<12} --> 카테고리 생성 요청: {:?}", "Handler", req);
    let category: Category = commands::create_category(state.store.as_ref(), &actor, &req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// 카테고리 삭제
pub async fn handle_delete_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let actor = extract_actor(&headers)?;
    commands::delete_category(state.store.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 회원 가입. 신원 확인은 앞단 인증 서비스가 끝낸 상태로 들어온다
pub async fn handle_register_user(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> 회원 가입 요청: {}", "Handler", new_user.username);
    let user = commands::register_user(state.store.as_ref(), state.clock.as_ref(), new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// 프로필 수정
pub async fn handle_update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<User>> {
    let actor = extract_actor(&headers)?;
    let user = commands::update_user(state.store.as_ref(), &actor, id, update).await?;
    Ok(Json(user))
}

/// 회원 탈퇴
pub async fn handle_delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let actor = extract_actor(&headers)?;
    commands::delete_user(state.store.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 경매 물품 등록
pub async fn handle_create_lot(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(new_lot): ApiJson<NewLot>,
) -> Result<impl IntoResponse> {
    let actor = extract_actor(&headers)?;
    info!("{:<12} --> 경매 물품 등록 요청: {}", "Handler", new_lot.name);
    let lot = commands::create_lot(
        state.store.as_ref(),
        state.clock.as_ref(),
        &actor,
        new_lot,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(lot)))
}

/// 경매 물품 수정
pub async fn handle_update_lot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<LotUpdate>,
) -> Result<Json<Lot>> {
    let actor = extract_actor(&headers)?;
    let lot = commands::update_lot(
        state.store.as_ref(),
        state.clock.as_ref(),
        &actor,
        id,
        update,
    )
    .await?;
    Ok(Json(lot))
}

/// 경매 물품 삭제
pub async fn handle_delete_lot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let actor = extract_actor(&headers)?;
    commands::delete_lot(state.store.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(lot_id): Path<i64>,
    ApiJson(req): ApiJson<PlaceBidRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let actor = extract_actor(&headers)?;
    let cmd = PlaceBidCommand {
        lot_id,
        bidder_id: actor.user_id,
        amount: req.amount,
    };
    let bid = place_bid(
        cmd,
        state.store.as_ref(),
        state.clock.as_ref(),
        state.events.as_ref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "입찰이 성공적으로 처리되었습니다.",
            "current_price": bid.amount,
            "bid": bid,
        })),
    ))
}

/// 댓글 작성
pub async fn handle_add_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(lot_id): Path<i64>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<impl IntoResponse> {
    let actor = extract_actor(&headers)?;
    let comment: Comment = commands::add_comment(
        state.store.as_ref(),
        state.clock.as_ref(),
        &actor,
        lot_id,
        &req.text,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 메인 페이지 통계
pub async fn handle_get_stats(State(state): State<AppState>) -> Result<Json<SiteStats>> {
    Ok(Json(query::handlers::get_stats(state.store.as_ref()).await?))
}

/// 모든 카테고리 조회
pub async fn handle_list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(
        query::handlers::list_categories(state.store.as_ref()).await?,
    ))
}

pub async fn handle_get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>> {
    Ok(Json(
        query::handlers::get_category(state.store.as_ref(), id).await?,
    ))
}

/// 사용자 목록 조회
pub async fn handle_list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(
        query::handlers::list_users(state.store.as_ref(), params.page()).await?,
    ))
}

/// 사용자 프로필 조회
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>> {
    Ok(Json(
        query::handlers::get_user_profile(state.store.as_ref(), id).await?,
    ))
}

/// 진행 중 경매 목록
pub async fn handle_list_active_lots(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Lot>>> {
    list_lots(&state, true, params.page()).await
}

/// 종료된 경매 목록
pub async fn handle_list_inactive_lots(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Lot>>> {
    list_lots(&state, false, params.page()).await
}

async fn list_lots(state: &AppState, is_active: bool, page: Page) -> Result<Json<Vec<Lot>>> {
    let sweeper = state.sweeper();
    let lots = query::handlers::list_lots(state.store.as_ref(), &sweeper, is_active, page).await?;
    Ok(Json(lots))
}

/// 경매 물품 상세
pub async fn handle_get_lot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LotDetail>> {
    Ok(Json(
        query::handlers::get_lot_detail(state.store.as_ref(), state.clock.as_ref(), id).await?,
    ))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Bid>>> {
    Ok(Json(
        query::handlers::get_bid_history(state.store.as_ref(), id).await?,
    ))
}

// endregion: --- Query Handlers
