use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    // TOTP設定
    /// TOTP発行者名（認証アプリに表示される）
    pub totp_issuer: String,
    /// コード桁数（6〜8）
    #[serde(default = "default_totp_digits")]
    pub totp_digits: usize,
    /// タイムステップ（秒）
    #[serde(default = "default_totp_period")]
    pub totp_period: u64,
    /// 許容する時刻ずれ（前後ステップ数）
    #[serde(default = "default_totp_skew")]
    pub totp_skew: u8,
    /// 二要素認証設定済みユーザーにコード入力を強制するか
    #[serde(default)]
    pub totp_enforce: bool,

    // CSRFナンス設定
    /// ナンス署名用シークレット（必須）
    pub nonce_secret: SecretBox<String>,
    /// ナンスの有効期間（秒）
    #[serde(default = "default_nonce_ttl_secs")]
    pub nonce_ttl_secs: u64,
}

const DEFAULT_TOTP_DIGITS: usize = 6;
const DEFAULT_TOTP_PERIOD: u64 = 30;
const DEFAULT_TOTP_SKEW: u8 = 1;
const DEFAULT_NONCE_TTL_SECS: u64 = 86_400;

fn default_totp_digits() -> usize {
    DEFAULT_TOTP_DIGITS
}

fn default_totp_period() -> u64 {
    DEFAULT_TOTP_PERIOD
}

fn default_totp_skew() -> u8 {
    DEFAULT_TOTP_SKEW
}

fn default_nonce_ttl_secs() -> u64 {
    DEFAULT_NONCE_TTL_SECS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_rfc_6238() {
        let config: Config = envy::from_iter(vec![
            ("TOTP_ISSUER".to_string(), "TestApp".to_string()),
            ("NONCE_SECRET".to_string(), "test-secret".to_string()),
        ])
        .unwrap();

        assert_eq!(config.totp_digits, 6);
        assert_eq!(config.totp_period, 30);
        assert_eq!(config.totp_skew, 1);
        assert!(!config.totp_enforce);
        assert_eq!(config.nonce_ttl_secs, 86_400);
    }

    #[test]
    fn test_missing_nonce_secret_is_an_error() {
        let result: Result<Config, _> =
            envy::from_iter(vec![("TOTP_ISSUER".to_string(), "TestApp".to_string())]);
        assert!(result.is_err());
    }
}
