// region:    --- Categories
/// 카테고리 생성
pub const INSERT_CATEGORY: &str = "INSERT INTO categories (name) VALUES ($1) RETURNING id, name";

/// 카테고리 조회
pub const GET_CATEGORY: &str = "SELECT id, name FROM categories WHERE id = $1";

/// 모든 카테고리 조회
pub const GET_ALL_CATEGORIES: &str = "SELECT id, name FROM categories ORDER BY name, id";

/// 카테고리 삭제 (경매 물품의 category_id 는 스키마에서 NULL 처리)
pub const DELETE_CATEGORY: &str = "DELETE FROM categories WHERE id = $1";
// endregion: --- Categories

// region:    --- Users
/// 사용자 생성
pub const INSERT_USER: &str = r#"
    INSERT INTO users (username, first_name, last_name, email, phone_number, date_of_birth, location, bio, avatar, date_joined)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING id, username, first_name, last_name, email, phone_number, date_of_birth, location, bio, avatar, date_joined
"#;

/// 사용자 조회
pub const GET_USER: &str = "SELECT id, username, first_name, last_name, email, phone_number, date_of_birth, location, bio, avatar, date_joined FROM users WHERE id = $1";

/// 사용자 목록 조회
pub const GET_USERS_PAGE: &str = r#"
    SELECT id, username, first_name, last_name, email, phone_number, date_of_birth, location, bio, avatar, date_joined
    FROM users
    ORDER BY username
    LIMIT $1 OFFSET $2
"#;

/// 프로필 수정 (NULL 파라미터는 기존 값 유지)
pub const UPDATE_USER: &str = r#"
    UPDATE users SET
        first_name = COALESCE($2, first_name),
        last_name = COALESCE($3, last_name),
        email = COALESCE($4, email),
        phone_number = COALESCE($5, phone_number),
        date_of_birth = COALESCE($6, date_of_birth),
        location = COALESCE($7, location),
        bio = COALESCE($8, bio),
        avatar = COALESCE($9, avatar)
    WHERE id = $1
    RETURNING id, username, first_name, last_name, email, phone_number, date_of_birth, location, bio, avatar, date_joined
"#;

/// 사용자가 입찰한 경매 잠금
pub const LOCK_USER_BID_LOTS: &str = r#"
    SELECT id FROM lots
    WHERE id IN (SELECT lot_id FROM bids WHERE user_id = $1)
    ORDER BY id
    FOR UPDATE
"#;

/// 사용자 삭제 (경매 물품, 입찰, 댓글은 스키마에서 연쇄 삭제)
pub const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

/// 남은 입찰 중 최고 금액으로 현재가 재계산 (입찰이 없으면 NULL)
pub const RECOMPUTE_LOT_PRICES: &str = r#"
    UPDATE lots SET current_price = (
        SELECT MAX(b.amount) FROM bids b WHERE b.lot_id = lots.id
    )
    WHERE id = ANY($1)
"#;
// endregion: --- Users

// region:    --- Lots
/// 경매 물품 등록
pub const INSERT_LOT: &str = r#"
    INSERT INTO lots (name, description, category_id, start_date, end_date, start_price, is_active, owner_id, photo)
    VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8)
    RETURNING id, name, description, category_id, start_date, end_date, start_price, current_price, is_active, owner_id, photo
"#;

/// 경매 물품 조회
pub const GET_LOT: &str = "SELECT id, name, description, category_id, start_date, end_date, start_price, current_price, is_active, owner_id, photo FROM lots WHERE id = $1";

/// 진행 중 / 종료 경매 목록 조회
pub const GET_LOTS_PAGE: &str = r#"
    SELECT id, name, description, category_id, start_date, end_date, start_price, current_price, is_active, owner_id, photo
    FROM lots
    WHERE is_active = $1
    ORDER BY start_date DESC, id DESC
    LIMIT $2 OFFSET $3
"#;

/// 사용자가 등록한 경매 목록 조회
pub const GET_OWNED_LOTS: &str = r#"
    SELECT id, name, description, category_id, start_date, end_date, start_price, current_price, is_active, owner_id, photo
    FROM lots
    WHERE owner_id = $1 AND is_active = $2
    ORDER BY start_date DESC, id DESC
"#;

/// 사용자가 입찰한 진행 중 경매 목록 조회
pub const GET_PARTICIPATING_LOTS: &str = r#"
    SELECT l.id, l.name, l.description, l.category_id, l.start_date, l.end_date, l.start_price, l.current_price, l.is_active, l.owner_id, l.photo
    FROM lots l
    WHERE l.is_active
      AND EXISTS (SELECT 1 FROM bids b WHERE b.lot_id = l.id AND b.user_id = $1)
    ORDER BY l.start_date DESC, l.id DESC
"#;

/// 경매 물품 수정. 종료 시각이 지난 경매는 건드리지 않는다
pub const UPDATE_LOT: &str = r#"
    UPDATE lots SET description = $2, end_date = $3
    WHERE id = $1 AND is_active AND end_date > $4
    RETURNING id, name, description, category_id, start_date, end_date, start_price, current_price, is_active, owner_id, photo
"#;

/// 경매 물품 삭제 (입찰, 댓글은 스키마에서 연쇄 삭제)
pub const DELETE_LOT: &str = "DELETE FROM lots WHERE id = $1";
// endregion: --- Lots

// region:    --- Bids
/// 현재가 갱신. 진행 중이고 현재가(없으면 시작가)보다 높을 때만 반영된다
pub const RAISE_LOT_PRICE: &str = r#"
    UPDATE lots SET current_price = $2
    WHERE id = $1
      AND is_active
      AND end_date > $3
      AND COALESCE(current_price, start_price) < $2
    RETURNING id
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (lot_id, user_id, amount, created_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, lot_id, user_id, amount, created_time
"#;

/// 입찰 이력 조회 (금액 내림차순)
pub const GET_LOT_BIDS: &str = r#"
    SELECT id, lot_id, user_id, amount, created_time
    FROM bids
    WHERE lot_id = $1
    ORDER BY amount DESC, created_time ASC, id ASC
"#;

/// 최고 입찰 조회
pub const GET_HIGHEST_BID: &str = r#"
    SELECT user_id, amount
    FROM bids
    WHERE lot_id = $1
    ORDER BY amount DESC, created_time ASC, id ASC
    LIMIT 1
"#;
// endregion: --- Bids

// region:    --- Comments
/// 댓글 추가
pub const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (lot_id, owner_id, text, created_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, lot_id, owner_id, text, created_time
"#;

/// 댓글 조회
pub const GET_LOT_COMMENTS: &str = r#"
    SELECT id, lot_id, owner_id, text, created_time
    FROM comments
    WHERE lot_id = $1
    ORDER BY created_time, id
"#;
// endregion: --- Comments

// region:    --- Sweep
/// 만료된 진행 중 경매 조회
pub const GET_EXPIRED_LOT_IDS: &str = r#"
    SELECT id FROM lots
    WHERE is_active AND end_date <= $1
    ORDER BY end_date, id
"#;

/// 만료 경매 잠금 (이미 닫혔으면 행이 없다)
pub const LOCK_EXPIRED_LOT: &str = r#"
    SELECT owner_id FROM lots
    WHERE id = $1 AND is_active AND end_date <= $2
    FOR UPDATE
"#;

/// 경매 종료 및 소유자 변경
pub const CLOSE_LOT: &str =
    "UPDATE lots SET is_active = FALSE, owner_id = $2 WHERE id = $1 AND is_active";
// endregion: --- Sweep

/// 메인 페이지 통계
pub const GET_SITE_STATS: &str = r#"
    SELECT
        (SELECT COUNT(*) FROM categories) AS num_categories,
        (SELECT COUNT(*) FROM users) AS num_users,
        (SELECT COUNT(*) FROM lots) AS num_lots,
        (SELECT COUNT(*) FROM lots WHERE is_active) AS num_active_lots
"#;
