//! totpgate - ログインフローに組み込むTOTP二要素認証コア
//!
//! RFC 6238 のコード導出・検証、登録フローの状態機械、ログイン時の
//! 検証ゲートを提供する。ユーザー属性の永続化（[`repositories::AttributeStore`]）、
//! 編集権限の判定（[`services::AccessPolicy`]）、QRコード画像化は
//! ホスト側の実装に委ねる。
//!
//! 組み込みの流れ:
//! 1. [`config::Config`] を読み込み、[`services::TotpService`] /
//!    [`services::NonceService`] を構築
//! 2. プロフィール画面から [`services::EnrollmentService`] の view / save を呼ぶ
//! 3. パスワード照合後の認証パイプラインに [`services::TotpGate`] を登録する

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::AppError;
pub use models::{EnrollmentState, UserTotpRecord};
pub use repositories::{AttributeStore, MemoryAttributeStore, UserTotpRepository};
pub use services::{
    AuthPipeline, AuthStep, EnrollmentService, LoginSubmission, NonceService, StepDecision,
    TotpGate, TotpService,
};
