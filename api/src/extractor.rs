use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use kernel::model::{
    auth::{AccessToken, Identity},
    id::UserId,
    role::Role,
};
use registry::AppRegistry;
use shared::error::AppError;

// リクエストヘッダのアクセストークンから解決したユーザー
pub struct AuthorizedUser {
    pub access_token: AccessToken,
    pub identity: Identity,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.identity.is_admin()
    }

    pub fn is_stylist(&self) -> bool {
        self.identity.role == Role::Stylist
    }
}

#[async_trait]
impl FromRequestParts<AppRegistry> for AuthorizedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        registry: &AppRegistry,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::UnauthorizedError)?;
        let access_token = AccessToken(bearer.token().to_string());

        let identity = registry
            .auth_repository()
            .fetch_identity_from_token(&access_token)
            .await?
            .ok_or(AppError::UnauthenticatedError)?;

        Ok(Self {
            access_token,
            identity,
        })
    }
}
