use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

/// ログインフォームの送信内容（型付き）
///
/// パスワード照合はホスト側で済んでいる前提のため、
/// この層に渡るのは二要素認証コードのみ。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginSubmission {
    /// 二要素認証コード（未入力なら None）
    pub totp_code: Option<String>,
}

/// 認証ステップの判定結果
#[derive(Debug)]
pub enum StepDecision {
    /// 続行を許可
    Allow,
    /// ログイン試行全体を拒否（先行ステップの成功を覆す）
    Deny(AppError),
}

/// 認証パイプラインの1ステップ
///
/// ホストのパスワード照合や本クレートのTOTP検証を同じ形で並べるための契約。
pub trait AuthStep: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        user_id: Uuid,
        submission: &LoginSubmission,
    ) -> Result<StepDecision, AppError>;
}

/// 認証パイプライン
///
/// 登録順にステップを評価し、最初の Deny でログイン試行全体を打ち切る。
/// フックチェーンのような暗黙の制御フローを避け、順序を明示する。
#[derive(Default)]
pub struct AuthPipeline {
    steps: Vec<Box<dyn AuthStep>>,
}

impl AuthPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: Box<dyn AuthStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// ログイン試行を評価
    ///
    /// 全ステップが Allow なら Ok。Deny は即座に Err として返す。
    pub fn run(&self, user_id: Uuid, submission: &LoginSubmission) -> Result<(), AppError> {
        for step in &self.steps {
            match step.evaluate(user_id, submission)? {
                StepDecision::Allow => {}
                StepDecision::Deny(reason) => {
                    tracing::warn!(user_id = %user_id, step = step.name(), error = %reason, "ログイン拒否");
                    return Err(reason);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllowAll;

    impl AuthStep for AllowAll {
        fn name(&self) -> &'static str {
            "allow_all"
        }

        fn evaluate(&self, _: Uuid, _: &LoginSubmission) -> Result<StepDecision, AppError> {
            Ok(StepDecision::Allow)
        }
    }

    struct DenyAll;

    impl AuthStep for DenyAll {
        fn name(&self) -> &'static str {
            "deny_all"
        }

        fn evaluate(&self, _: Uuid, _: &LoginSubmission) -> Result<StepDecision, AppError> {
            Ok(StepDecision::Deny(AppError::Forbidden))
        }
    }

    #[test]
    fn test_empty_pipeline_allows() {
        let pipeline = AuthPipeline::new();
        assert!(pipeline.run(Uuid::new_v4(), &LoginSubmission::default()).is_ok());
    }

    #[test]
    fn test_all_allow() {
        let pipeline = AuthPipeline::new()
            .with_step(Box::new(AllowAll))
            .with_step(Box::new(AllowAll));
        assert!(pipeline.run(Uuid::new_v4(), &LoginSubmission::default()).is_ok());
    }

    #[test]
    fn test_deny_overrides_prior_allow() {
        let pipeline = AuthPipeline::new()
            .with_step(Box::new(AllowAll))
            .with_step(Box::new(DenyAll));
        let result = pipeline.run(Uuid::new_v4(), &LoginSubmission::default());
        assert!(matches!(result, Err(AppError::Forbidden)));
    }
}
