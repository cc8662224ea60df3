use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::EnrollmentState;
use crate::repositories::UserTotpRepository;
use crate::services::nonce::{NonceService, TOTP_CONFIG_SAVE};
use crate::services::totp::TotpService;

/// ユーザー編集の認可ポリシー
///
/// ホスト側の権限システム（ロール・管理者判定など）が実装する。
pub trait AccessPolicy: Send + Sync {
    fn can_edit_user(&self, actor: Uuid, target: Uuid) -> bool;
}

/// 本人のみ編集を許可するポリシー
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfEditPolicy;

impl AccessPolicy for SelfEditPolicy {
    fn can_edit_user(&self, actor: Uuid, target: Uuid) -> bool {
        actor == target
    }
}

/// 登録画面の描画内容
///
/// HTML非依存。チェックボックス状態・登録用URI・CSRFナンスをホストに渡し、
/// QRコード画像化は外部のレンダラに委ねる。
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentPage {
    /// 設定完了チェックボックスの現在値
    pub completed: bool,
    /// 登録用 otpauth:// URI（設定未完了の間のみ提示）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_uri: Option<String>,
    /// 保存フォームに埋め込むCSRFナンス
    pub nonce: String,
}

/// プロフィール保存フォームの送信内容
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSubmission {
    /// 「設定完了」チェックボックス
    #[serde(default)]
    pub completed: bool,
    /// CSRFナンス
    pub nonce: Option<String>,
}

/// 二要素認証の登録フロー
///
/// 状態遷移:
/// - 初回表示: シークレット未生成なら生成して保存（NoSecret → PendingEnrollment）
/// - 完了にチェックして保存: Enrolled
/// - チェックを外して保存: 完了フラグを下ろしシークレットも削除
///   （スキャン済みの可能性があるシークレットの再利用を防ぎ、
///   次回表示時に新しいシークレットを生成させる）
#[derive(Clone)]
pub struct EnrollmentService {
    repo: UserTotpRepository,
    totp: TotpService,
    nonces: NonceService,
    policy: Arc<dyn AccessPolicy>,
}

impl EnrollmentService {
    pub fn new(
        repo: UserTotpRepository,
        totp: TotpService,
        nonces: NonceService,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            repo,
            totp,
            nonces,
            policy,
        }
    }

    /// 登録画面を構築
    ///
    /// シークレットが無ければここで生成・保存する（生成契機は属性の不在のみ）。
    ///
    /// # Security
    /// 設定完了後はシークレットも登録用URIも一切返さない
    pub fn view(
        &self,
        actor: Uuid,
        user_id: Uuid,
        account_label: &str,
    ) -> Result<EnrollmentPage, AppError> {
        if !self.policy.can_edit_user(actor, user_id) {
            tracing::warn!(actor = %actor, user_id = %user_id, "権限のない登録画面表示要求");
            return Err(AppError::Forbidden);
        }

        let record = self.repo.find(user_id)?;

        let secret = match record.secret {
            Some(secret) => secret,
            None => {
                let secret = TotpService::generate_secret();
                self.repo.save_secret(user_id, &secret)?;
                tracing::info!(user_id = %user_id, "TOTPシークレットを生成");
                secret
            }
        };

        let provisioning_uri = if record.completed {
            None
        } else {
            Some(self.totp.provisioning_uri(&secret, account_label)?)
        };

        Ok(EnrollmentPage {
            completed: record.completed,
            provisioning_uri,
            nonce: self.nonces.issue(user_id, TOTP_CONFIG_SAVE),
        })
    }

    /// プロフィール保存を処理
    ///
    /// # Security
    /// 編集権限と有効なナンスの両方が揃わない限り一切の状態変更を行わない
    pub fn save(
        &self,
        actor: Uuid,
        user_id: Uuid,
        submission: &ProfileSubmission,
    ) -> Result<EnrollmentState, AppError> {
        if !self.policy.can_edit_user(actor, user_id) {
            tracing::warn!(actor = %actor, user_id = %user_id, "権限のない設定保存要求");
            return Err(AppError::Forbidden);
        }

        let nonce_valid = submission
            .nonce
            .as_deref()
            .is_some_and(|token| self.nonces.verify(token, user_id, TOTP_CONFIG_SAVE));
        if !nonce_valid {
            tracing::warn!(user_id = %user_id, "ナンス検証失敗（CSRF攻撃の可能性）");
            return Err(AppError::Forbidden);
        }

        if submission.completed {
            // 不変条件: シークレットなしで設定完了にはできない
            if self.repo.secret(user_id)?.is_none() {
                tracing::warn!(user_id = %user_id, "シークレット未生成のまま設定完了が送信された");
                return Err(AppError::TotpNotEnrolled);
            }
            self.repo.set_completed(user_id, true)?;
            tracing::info!(user_id = %user_id, "二要素認証の設定完了");
        } else {
            self.repo.set_completed(user_id, false)?;
            self.repo.delete_secret(user_id)?;
            tracing::info!(user_id = %user_id, "二要素認証の設定解除・シークレット破棄");
        }

        Ok(self.repo.find(user_id)?.state())
    }
}
