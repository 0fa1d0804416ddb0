use crate::model::{id::UserId, role::Role};

pub struct AccessToken(pub String);

// リクエストを送ってきた主体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
