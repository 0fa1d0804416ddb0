use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    // 閉じ済みの会話を閉じる、遷移できない状態への変更など
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    KeyValueStoreError(#[from] redis::RedisError),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("処理がタイムアウトしました: {0}")]
    TimeoutError(String),
    #[error("ログインに失敗しました")]
    UnauthenticatedError,
    #[error("認可情報が誤っています")]
    UnauthorizedError,
    #[error("許可されていない操作です")]
    ForbiddenOperation,
}

impl AppError {
    // レスポンスボディに載せるエラー種別
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UnprocessableEntity(_) => "unprocessable_entity",
            AppError::EntityNotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::ValidationError(_) => "validation",
            AppError::UnauthenticatedError => "unauthenticated",
            AppError::UnauthorizedError => "unauthorized",
            AppError::ForbiddenOperation => "forbidden",
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::ConversionEntityError(_)
            | AppError::TimeoutError(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError | AppError::UnauthorizedError => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::ConversionEntityError(_)
            | AppError::TimeoutError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
        }
        let body = Json(serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        }));
        (status_code, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::EntityNotFound("booking".into()), StatusCode::NOT_FOUND, "not_found")]
    #[case(AppError::Conflict("closed".into()), StatusCode::BAD_REQUEST, "conflict")]
    #[case(AppError::ForbiddenOperation, StatusCode::FORBIDDEN, "forbidden")]
    #[case(AppError::UnauthenticatedError, StatusCode::UNAUTHORIZED, "unauthenticated")]
    #[case(
        AppError::NoRowsAffectedError("x".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal"
    )]
    fn error_maps_to_status_and_kind(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] kind: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.kind(), kind);
        assert_eq!(err.into_response().status(), status);
    }
}
