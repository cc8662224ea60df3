use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AppError;
use crate::repositories::UserTotpRepository;
use crate::services::auth::{AuthStep, LoginSubmission, StepDecision};
use crate::services::totp::TotpService;

/// ログイン時のTOTP検証ゲート
///
/// パスワード照合ステップの後段に置く [`AuthStep`]。
///
/// # Security
/// - 未設定ユーザーへのコード送信と不一致は同じ拒否理由に集約する
///   （設定状態の漏洩防止）
/// - コード・シークレットはログに出力しない
pub struct TotpGate {
    repo: UserTotpRepository,
    totp: TotpService,
    clock: Arc<dyn Clock>,
    /// 設定完了ユーザーにコード入力を強制するか
    ///
    /// false の場合、コード未入力のログインは素通りする（コードが送信された
    /// 場合のみ検証する挙動）。既定は false。
    enforce: bool,
}

impl TotpGate {
    pub fn new(
        repo: UserTotpRepository,
        totp: TotpService,
        clock: Arc<dyn Clock>,
        enforce: bool,
    ) -> Self {
        Self {
            repo,
            totp,
            clock,
            enforce,
        }
    }
}

impl AuthStep for TotpGate {
    fn name(&self) -> &'static str {
        "totp_gate"
    }

    fn evaluate(
        &self,
        user_id: Uuid,
        submission: &LoginSubmission,
    ) -> Result<StepDecision, AppError> {
        let Some(candidate) = submission.totp_code.as_deref() else {
            if self.enforce {
                let record = self.repo.find(user_id)?;
                if record.completed {
                    return Ok(StepDecision::Deny(AppError::TotpRequired));
                }
            }
            return Ok(StepDecision::Allow);
        };

        // 形式チェック: ストア・エンジンに触れる前に弾く
        if !self.totp.is_well_formed(candidate) {
            return Ok(StepDecision::Deny(AppError::TotpCodeFormat));
        }

        let Some(secret) = self.repo.secret(user_id)? else {
            // 未設定は不一致と同じ拒否理由に集約
            return Ok(StepDecision::Deny(AppError::TotpInvalid));
        };

        let verified = match self.totp.verify(&secret, candidate, self.clock.now_unix()) {
            Ok(verified) => verified,
            Err(AppError::InvalidSecret) => {
                // 破損レコードは内部ログに残し、呼び出し元には一般の認証失敗として返す
                tracing::error!(user_id = %user_id, "TOTPシークレットが破損");
                return Ok(StepDecision::Deny(AppError::TotpInvalid));
            }
            Err(e) => return Err(e),
        };

        if verified {
            Ok(StepDecision::Allow)
        } else {
            Ok(StepDecision::Deny(AppError::TotpInvalid))
        }
    }
}
