/// 요청자 식별과 권한 검사
/// 인증은 앞단의 인증 서비스가 처리하고, 이 서비스는 헤더로 전달된 사용자 id 와 관리자 여부만 사용한다.
use crate::error::{Error, Result};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SUPERUSER_HEADER: &str = "x-user-superuser";

/// 요청을 보낸 사용자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub is_superuser: bool,
}

impl Actor {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            is_superuser: false,
        }
    }

    pub fn superuser(user_id: i64) -> Self {
        Self {
            user_id,
            is_superuser: true,
        }
    }
}

/// 소유자 또는 관리자만 통과
pub fn ensure_owner_or_superuser(actor: &Actor, owner_id: i64) -> Result<()> {
    if actor.is_superuser || actor.user_id == owner_id {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

pub fn ensure_superuser(actor: &Actor) -> Result<()> {
    if actor.is_superuser {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// 헤더에서 요청자 추출
pub fn extract_actor(headers: &HeaderMap) -> Result<Actor> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or(Error::Unauthorized)?;

    let is_superuser = headers
        .get(SUPERUSER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false);

    Ok(Actor {
        user_id,
        is_superuser,
    })
}
