use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// 카테고리 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// 사용자 모델 (인증 정보는 외부 인증 서비스가 관리)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub date_joined: DateTime<Utc>,
}

/// 회원 가입 요청
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// 프로필 수정 요청. None 인 필드는 그대로 둔다
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserUpdate {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = &self.phone_number {
            user.phone_number = Some(v.clone());
        }
        if let Some(v) = self.date_of_birth {
            user.date_of_birth = Some(v);
        }
        if let Some(v) = &self.location {
            user.location = Some(v.clone());
        }
        if let Some(v) = &self.bio {
            user.bio = Some(v.clone());
        }
        if let Some(v) = &self.avatar {
            user.avatar = Some(v.clone());
        }
    }
}

// 댓글 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub lot_id: i64,
    pub owner_id: i64,
    pub text: String,
    pub created_time: DateTime<Utc>,
}

// 메인 페이지 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteStats {
    pub num_categories: i64,
    pub num_users: i64,
    pub num_lots: i64,
    pub num_active_lots: i64,
}
