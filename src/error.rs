#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("属性ストアエラー")]
    Store(#[source] anyhow::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("認証コードは6桁の数字ではありません")]
    TotpCodeFormat,

    #[error("認証コードが無効です")]
    TotpInvalid,

    #[error("二要素認証が設定されていません")]
    TotpNotEnrolled,

    #[error("認証コードの入力が必要です")]
    TotpRequired,

    #[error("TOTPシークレットが不正です")]
    InvalidSecret,

    #[error("権限がありません")]
    Forbidden,
}

impl AppError {
    /// エンドユーザー向けメッセージに変換
    ///
    /// # Security
    /// TOTP関連の失敗理由（未設定・形式不正・不一致）は区別せず、
    /// すべて同一メッセージに集約する（設定状態の漏洩防止）
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "入力内容が正しくありません",
            Self::TotpCodeFormat
            | Self::TotpInvalid
            | Self::TotpNotEnrolled
            | Self::InvalidSecret => "認証コードが正しくありません",
            Self::TotpRequired => "認証コードを入力してください",
            Self::Forbidden => "この操作を行う権限がありません",
            Self::Store(_) | Self::Internal(_) => "内部エラーが発生しました",
        }
    }
}
