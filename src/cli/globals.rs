use secrecy::SecretString;

#[derive(Clone)]
pub struct GlobalArgs {
    pub base_url: String,
    pub token_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(base_url: String, token_secret: SecretString) -> Self {
        Self {
            base_url,
            token_secret,
        }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("base_url", &self.base_url)
            .field("token_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://id.donaci.dev".to_string(),
            SecretString::from("s3cret".to_string()),
        );
        assert_eq!(args.base_url, "https://id.donaci.dev");
        assert_eq!(args.token_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let args = GlobalArgs::new(
            "https://id.donaci.dev".to_string(),
            SecretString::from("s3cret".to_string()),
        );
        let debug = format!("{args:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("s3cret"));
    }
}
