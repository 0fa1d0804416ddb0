use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Stylist,
    #[default]
    Customer,
}
