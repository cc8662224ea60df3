use serde::Serialize;
use uuid::Uuid;

/// ユーザーごとの二要素認証（TOTP）設定状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnrollmentState {
    /// シークレット未生成
    NoSecret,
    /// シークレット生成済み・設定未完了（QRコード提示中）
    PendingEnrollment,
    /// 設定完了（ログイン時にコード検証対象）
    Enrolled,
}

/// ユーザーの二要素認証（TOTP）レコード
///
/// 属性ストア上の2キー（`totp_secret` / `totp_config_completed`）を
/// 型付きで束ねたもの。
///
/// # Security
/// シークレット平文はログ・シリアライズ出力に含めない
#[derive(Debug, Clone, Serialize)]
pub struct UserTotpRecord {
    pub user_id: Uuid,
    #[serde(skip)]
    pub secret: Option<String>,
    pub completed: bool,
}

impl UserTotpRecord {
    pub fn state(&self) -> EnrollmentState {
        match (&self.secret, self.completed) {
            (None, _) => EnrollmentState::NoSecret,
            (Some(_), false) => EnrollmentState::PendingEnrollment,
            (Some(_), true) => EnrollmentState::Enrolled,
        }
    }
}
