/// 입력 검증
/// 각 함수는 통과하면 Ok(()), 아니면 어떤 규칙에 걸렸는지 담은 에러를 돌려준다.
// region:    --- Imports
use crate::bidding::model::{Lot, LotUpdate, NewLot};
use crate::catalog::model::{NewUser, UserUpdate};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

// endregion: --- Imports

/// DECIMAL(10,2) 상한을 센트로 환산한 값
pub const MAX_AMOUNT: i64 = 9_999_999_999;

const MAX_NAME_LEN: usize = 63;
const MAX_TEXT_LEN: usize = 1000;
const MAX_USERNAME_LEN: usize = 150;
const MAX_PERSON_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MAX_PHONE_LEN: usize = 15;
const MAX_LOCATION_LEN: usize = 100;

fn invalid(msg: impl Into<String>) -> Error {
    Error::Validation(msg.into())
}

fn check_len(value: &str, max: usize, field: &str) -> Result<()> {
    if value.chars().count() > max {
        return Err(invalid(format!("{field}은(는) {max}자를 넘을 수 없습니다.")));
    }
    Ok(())
}

fn check_required(value: &str, max: usize, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field}을(를) 입력해야 합니다.")));
    }
    check_len(value, max, field)
}

fn check_future(end_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if end_date <= now {
        return Err(invalid("종료 시각은 현재 시각 이후여야 합니다."));
    }
    Ok(())
}

// region:    --- Bid
/// 입찰 검증: 종료 여부를 먼저, 그 다음 가격을 본다
pub fn validate_bid(lot: &Lot, amount: i64, now: DateTime<Utc>) -> Result<()> {
    if !lot.accepts_bids_at(now) {
        return Err(Error::LotExpired);
    }
    let floor = lot.floor_price();
    if amount <= floor {
        return Err(Error::BidTooLow { floor });
    }
    if amount > MAX_AMOUNT {
        return Err(invalid(format!("입찰 금액은 {MAX_AMOUNT}을(를) 넘을 수 없습니다.")));
    }
    Ok(())
}
// endregion: --- Bid

// region:    --- Lot
pub fn validate_new_lot(lot: &NewLot, now: DateTime<Utc>) -> Result<()> {
    check_required(&lot.name, MAX_NAME_LEN, "이름")?;
    check_required(&lot.description, MAX_TEXT_LEN, "설명")?;
    check_future(lot.end_date, now)?;
    if lot.start_price <= 0 {
        return Err(invalid("시작 가격은 0보다 커야 합니다."));
    }
    if lot.start_price > MAX_AMOUNT {
        return Err(invalid(format!("시작 가격은 {MAX_AMOUNT}을(를) 넘을 수 없습니다.")));
    }
    Ok(())
}

pub fn validate_lot_update(update: &LotUpdate, now: DateTime<Utc>) -> Result<()> {
    check_required(&update.description, MAX_TEXT_LEN, "설명")?;
    check_future(update.end_date, now)
}
// endregion: --- Lot

// region:    --- User
pub fn validate_username(username: &str) -> Result<()> {
    check_required(username, MAX_USERNAME_LEN, "사용자 이름")?;
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if !username.chars().all(allowed) {
        return Err(invalid(
            "사용자 이름에는 문자, 숫자, @ . + - _ 만 쓸 수 있습니다.",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    check_len(email, MAX_EMAIL_LEN, "이메일")?;
    if !email.is_empty() && !email.contains('@') {
        return Err(invalid("올바른 이메일 주소가 아닙니다."));
    }
    Ok(())
}

pub fn validate_new_user(user: &NewUser) -> Result<()> {
    validate_username(&user.username)?;
    check_len(&user.first_name, MAX_PERSON_NAME_LEN, "이름")?;
    check_len(&user.last_name, MAX_PERSON_NAME_LEN, "성")?;
    validate_email(&user.email)?;
    if let Some(phone) = &user.phone_number {
        check_len(phone, MAX_PHONE_LEN, "전화번호")?;
    }
    if let Some(location) = &user.location {
        check_len(location, MAX_LOCATION_LEN, "지역")?;
    }
    Ok(())
}

pub fn validate_user_update(update: &UserUpdate) -> Result<()> {
    if let Some(v) = &update.first_name {
        check_len(v, MAX_PERSON_NAME_LEN, "이름")?;
    }
    if let Some(v) = &update.last_name {
        check_len(v, MAX_PERSON_NAME_LEN, "성")?;
    }
    if let Some(v) = &update.email {
        validate_email(v)?;
    }
    if let Some(v) = &update.phone_number {
        check_len(v, MAX_PHONE_LEN, "전화번호")?;
    }
    if let Some(v) = &update.location {
        check_len(v, MAX_LOCATION_LEN, "지역")?;
    }
    Ok(())
}
// endregion: --- User

// region:    --- Comment / Category
pub fn validate_comment(text: &str) -> Result<()> {
    check_required(text, MAX_TEXT_LEN, "댓글")
}

pub fn validate_category_name(name: &str) -> Result<()> {
    check_required(name, MAX_NAME_LEN, "카테고리 이름")
}
// endregion: --- Comment / Category

// endregion: --- Tests
