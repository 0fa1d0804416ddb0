use std::{env, str::FromStr};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(()),
        }
    }
}

// 環境変数 ENV から実行環境を判定する
// 未設定・不正値の場合、デバッグビルドなら Development、リリースビルドなら Production
pub fn which() -> Environment {
    #[cfg(debug_assertions)]
    let default_env = Environment::Development;
    #[cfg(not(debug_assertions))]
    let default_env = Environment::Production;

    env::var("ENV")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_env)
}

#[cfg(test)]
mod tests {
    use super::Environment;
    use rstest::rstest;

    #[rstest]
    #[case("development", Ok(Environment::Development))]
    #[case("DEV", Ok(Environment::Development))]
    #[case("production", Ok(Environment::Production))]
    #[case("prod", Ok(Environment::Production))]
    #[case("staging", Err(()))]
    fn parse_env_values(#[case] input: &str, #[case] expected: Result<Environment, ()>) {
        assert_eq!(input.parse::<Environment>(), expected);
    }
}
