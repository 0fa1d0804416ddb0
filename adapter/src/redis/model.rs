use kernel::model::{auth::AccessToken, id::UserId};
use shared::error::AppError;

pub trait RedisKey {
    type Value: RedisValue + TryFrom<String, Error = AppError>;
    fn inner(&self) -> String;
}

pub trait RedisValue {
    fn inner(&self) -> String;
}

// 認証サービスが発行したアクセストークンをキーに、ユーザー ID が保存されている
pub struct AuthorizationKey(String);

pub struct AuthorizedUserId(UserId);

impl From<&AccessToken> for AuthorizationKey {
    fn from(value: &AccessToken) -> Self {
        Self(value.0.clone())
    }
}

impl AuthorizedUserId {
    pub fn into_inner(self) -> UserId {
        self.0
    }
}

impl RedisKey for AuthorizationKey {
    type Value = AuthorizedUserId;

    fn inner(&self) -> String {
        self.0.clone()
    }
}

impl RedisValue for AuthorizedUserId {
    fn inner(&self) -> String {
        self.0.to_string()
    }
}

impl TryFrom<String> for AuthorizedUserId {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse::<UserId>().map(Self).map_err(|_| {
            AppError::ConversionEntityError(format!("トークンに紐づくユーザー ID が不正です: {s}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_value_round_trip() {
        let value = AuthorizedUserId::try_from("42".to_string()).unwrap();
        assert_eq!(value.inner(), "42");
        assert_eq!(value.into_inner(), UserId::new(42));
        assert!(AuthorizedUserId::try_from("not-a-number".to_string()).is_err());
    }

    #[test]
    fn key_uses_raw_token() {
        let token = AccessToken("abc123".into());
        assert_eq!(AuthorizationKey::from(&token).inner(), "abc123");
    }
}
