use std::sync::Arc;

use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::Config;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// TOTP設定保存操作のアクション名
pub const TOTP_CONFIG_SAVE: &str = "totp_config_save";

/// アクションスコープ付きCSRFナンスサービス
///
/// `HMAC-SHA256(key, tick | action | user_id)` をトークンとして発行する。
/// サーバー側に状態を持たないため、発行と検証が別リクエストでも成立する。
///
/// # Note
/// tick = 現在時刻 / 有効期間。検証時は現在tickと直前tickを受け入れるため、
/// トークンの実効寿命は ttl 〜 2×ttl の間になる
#[derive(Clone)]
pub struct NonceService {
    mac: HmacSha256,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl NonceService {
    pub fn new(key: &str, ttl_secs: u64, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        if key.is_empty() {
            return Err(AppError::Validation(
                "ナンス署名用シークレットが空です".to_string(),
            ));
        }
        if ttl_secs == 0 {
            return Err(AppError::Validation(
                "ナンス有効期間は1秒以上で指定してください".to_string(),
            ));
        }

        // HMACの鍵長に制限はないため new_from_slice は失敗しない
        let mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC初期化エラー: {e}")))?;

        Ok(Self {
            mac,
            ttl_secs,
            clock,
        })
    }

    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        Self::new(
            config.nonce_secret.expose_secret(),
            config.nonce_ttl_secs,
            clock,
        )
    }

    /// 指定ユーザー・アクションに対するナンスを発行
    pub fn issue(&self, user_id: Uuid, action: &str) -> String {
        let tick = self.clock.now_unix() / self.ttl_secs;
        self.token_for_tick(tick, user_id, action)
    }

    /// ナンスを検証
    ///
    /// # Security
    /// 比較は `Mac::verify_slice` による定数時間比較
    pub fn verify(&self, token: &str, user_id: Uuid, action: &str) -> bool {
        let Ok(token_bytes) = HEXLOWER.decode(token.as_bytes()) else {
            return false;
        };

        let tick = self.clock.now_unix() / self.ttl_secs;
        // 現在tickと直前tickを許容
        [tick, tick.saturating_sub(1)]
            .iter()
            .any(|t| self.mac_for_tick(*t, user_id, action).verify_slice(&token_bytes).is_ok())
    }

    fn token_for_tick(&self, tick: u64, user_id: Uuid, action: &str) -> String {
        let mac = self.mac_for_tick(tick, user_id, action);
        HEXLOWER.encode(&mac.finalize().into_bytes())
    }

    fn mac_for_tick(&self, tick: u64, user_id: Uuid, action: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{tick}|{action}|{user_id}").as_bytes());
        mac
    }
}
