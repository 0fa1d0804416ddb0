use std::sync::Arc;

use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    auth::{AccessToken, Identity},
    id::UserId,
    role::Role,
};
use kernel::repository::auth::AuthRepository;
use shared::error::{AppError, AppResult};

use crate::{
    database::{model::parse_status, ConnectionPool},
    redis::{model::AuthorizationKey, RedisClient},
};

#[derive(new)]
pub struct AuthRepositoryImpl {
    db: ConnectionPool,
    kv: Arc<RedisClient>,
}

#[async_trait]
impl AuthRepository for AuthRepositoryImpl {
    async fn fetch_identity_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<Identity>> {
        let key: AuthorizationKey = access_token.into();
        let Some(user_id) = self.kv.get(&key).await?.map(|v| v.into_inner()) else {
            return Ok(None);
        };

        // ロールは毎回 users テーブルから引く
        let row: Option<(UserId, String)> =
            sqlx::query_as("SELECT user_id, role FROM users WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.db.inner_ref())
                .await
                .map_err(AppError::SpecificOperationError)?;

        row.map(|(user_id, role)| {
            Ok(Identity {
                user_id,
                role: parse_status::<Role>(&role, "users.role")?,
            })
        })
        .transpose()
    }
}
