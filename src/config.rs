use jsonwebtoken::Algorithm;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub signing_key: String,
    pub signing_algorithm: Algorithm,
}

/// Process-wide configuration, built once at startup and read-only after
/// that. Handed around as `Arc<AppConfig>` inside `AppState`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthConfig {
            signing_key: std::env::var("TOKEN_SIGNING_KEY")?,
            signing_algorithm: std::env::var("TOKEN_SIGNING_ALGORITHM")
                .unwrap_or_else(|_| "HS256".into())
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid TOKEN_SIGNING_ALGORITHM: {e}"))?,
        };
        Ok(Self { database_url, auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_algorithm_parses_to_hs256() {
        let alg: Algorithm = "HS256".parse().expect("parse algorithm");
        assert_eq!(alg, Algorithm::HS256);
    }
}
