/// 서비스 공통 에러
/// 입찰 코어(LotExpired, BidTooLow)와 권한, 검증, 저장소 에러를 하나의 타입으로 다룬다.
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

pub type Result<T> = std::result::Result<T, Error>;

// region:    --- Error
#[derive(Debug, Error)]
pub enum Error {
    #[error("경매가 이미 종료되었습니다.")]
    LotExpired,

    #[error("입찰 금액은 현재 가격({floor})보다 높아야 합니다.")]
    BidTooLow { floor: i64 },

    #[error("{0}을(를) 찾을 수 없습니다.")]
    NotFound(&'static str),

    #[error("이 작업을 수행할 권한이 없습니다.")]
    Forbidden,

    #[error("사용자 인증 정보가 없습니다.")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("동시 입찰이 몰려 처리하지 못했습니다. 다시 시도해 주세요.")]
    Contention,

    #[error("이벤트 발행 실패: {0}")]
    Event(String),

    #[error("데이터베이스 오류: {0}")]
    Database(sqlx::Error),
}

impl Error {
    /// 클라이언트에 내려주는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            Error::LotExpired => "LOT_EXPIRED",
            Error::BidTooLow { .. } => "BID_TOO_LOW",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Forbidden => "FORBIDDEN",
            Error::Unauthorized => "UNAUTHORIZED",
            Error::Validation(_) => "VALIDATION",
            Error::Conflict(_) => "CONFLICT",
            Error::Contention => "CONTENTION",
            Error::Event(_) => "EVENT",
            Error::Database(_) => "DATABASE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::LotExpired | Error::Conflict(_) | Error::Contention => StatusCode::CONFLICT,
            Error::BidTooLow { .. } | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Event(_) | Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn duplicate() -> Self {
        Error::Conflict("이미 사용 중인 값입니다.".to_string())
    }

    pub(crate) fn dangling_reference() -> Self {
        Error::Validation("참조하는 대상이 존재하지 않습니다.".to_string())
    }
}

/// unique / foreign key 위반은 사용자 입력 문제로 분류
impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return Error::duplicate();
            }
            if db_err.is_foreign_key_violation() {
                return Error::dangling_reference();
            }
        }
        Error::Database(e)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Error::BidTooLow { floor } => json!({
                "error": self.to_string(),
                "code": self.code(),
                "floor": floor,
            }),
            Error::Database(e) => {
                error!("{:<12} --> 데이터베이스 오류: {:?}", "Error", e);
                json!({"error": "내부 서버 오류가 발생했습니다.", "code": self.code()})
            }
            _ => json!({"error": self.to_string(), "code": self.code()}),
        };
        (status, Json(body)).into_response()
    }
}
// endregion: --- Error

// endregion: --- Tests
