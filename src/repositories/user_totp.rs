use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::UserTotpRecord;
use crate::repositories::AttributeStore;

/// シークレットを保持する属性キー
pub const KEY_TOTP_SECRET: &str = "totp_secret";
/// 設定完了フラグを保持する属性キー（"1" = 完了）
pub const KEY_TOTP_CONFIG_COMPLETED: &str = "totp_config_completed";

/// ユーザーTOTPレコードのリポジトリ
///
/// 属性ストア上の生のキーバリューを [`UserTotpRecord`] として読み書きする。
#[derive(Clone)]
pub struct UserTotpRepository {
    store: Arc<dyn AttributeStore>,
}

impl UserTotpRepository {
    pub fn new(store: Arc<dyn AttributeStore>) -> Self {
        Self { store }
    }

    /// ユーザーIDでTOTPレコードを取得
    ///
    /// # Note
    /// 設定完了フラグが立っているのにシークレットが無い状態は
    /// 不変条件違反（破損レコード）として `InvalidSecret` を返す
    pub fn find(&self, user_id: Uuid) -> Result<UserTotpRecord, AppError> {
        let secret = self.secret(user_id)?;
        let completed = self
            .store
            .get(user_id, KEY_TOTP_CONFIG_COMPLETED)
            .map_err(AppError::Store)?
            .as_deref()
            == Some("1");

        if completed && secret.is_none() {
            tracing::error!(user_id = %user_id, "設定完了フラグありシークレットなしの破損レコード");
            return Err(AppError::InvalidSecret);
        }

        Ok(UserTotpRecord {
            user_id,
            secret,
            completed,
        })
    }

    /// シークレットのみ取得
    pub fn secret(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        let secret = self
            .store
            .get(user_id, KEY_TOTP_SECRET)
            .map_err(AppError::Store)?;

        // 空文字は未設定と同義に扱う
        Ok(secret.filter(|s| !s.is_empty()))
    }

    /// シークレットを保存
    pub fn save_secret(&self, user_id: Uuid, secret: &str) -> Result<(), AppError> {
        if secret.is_empty() {
            return Err(AppError::InvalidSecret);
        }
        self.store
            .set(user_id, KEY_TOTP_SECRET, secret)
            .map_err(AppError::Store)
    }

    /// 設定完了フラグを保存
    pub fn set_completed(&self, user_id: Uuid, completed: bool) -> Result<(), AppError> {
        let value = if completed { "1" } else { "0" };
        self.store
            .set(user_id, KEY_TOTP_CONFIG_COMPLETED, value)
            .map_err(AppError::Store)
    }

    /// シークレットを削除
    pub fn delete_secret(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store
            .delete(user_id, KEY_TOTP_SECRET)
            .map_err(AppError::Store)
    }
}
