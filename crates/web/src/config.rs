use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    pub freeze_verified_marks: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            freeze_verified_marks: parse_flag(std::env::var("FREEZE_VERIFIED_MARKS").ok(), true)
                .context("FREEZE_VERIFIED_MARKS must be true or false")?,
        })
    }
}

fn parse_flag(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => anyhow::bail!("invalid boolean '{}'", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(None, true).unwrap());
        assert!(!parse_flag(Some("FALSE".to_string()), true).unwrap());
        assert!(parse_flag(Some("1".to_string()), false).unwrap());
        assert!(!parse_flag(Some(" ".to_string()), false).unwrap());
        assert!(parse_flag(Some("maybe".to_string()), true).is_err());
    }
}
