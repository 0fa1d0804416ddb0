use crate::model::auth::{AccessToken, Identity};
use async_trait::async_trait;
use shared::error::AppResult;

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    // アクセストークンからユーザー ID とロールを引く
    // トークンの発行は認証サービス側の責務
    async fn fetch_identity_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<Identity>>;
}
