use data_encoding::BASE32;
use rand::RngCore;
use totp_rs::{Algorithm, TOTP};

use crate::config::Config;
use crate::error::AppError;

/// 生成するシークレットのバイト長（160ビット）
const SECRET_BYTES: usize = 20;

/// TOTP (Time-based One-Time Password) サービス
///
/// RFC 6238 のコード導出・検証を行う純粋なアルゴリズム部。I/Oは持たない。
///
/// # Security
/// - シークレット平文はログに出力しない
/// - コード比較は totp-rs 内部で定数時間比較される
#[derive(Debug, Clone)]
pub struct TotpService {
    issuer: String,
    digits: usize,
    period: u64,
    skew: u8,
}

impl TotpService {
    /// 新しい TotpService を作成
    ///
    /// # Arguments
    /// * `issuer` - TOTP発行者名（認証アプリに表示される）
    /// * `digits` - コード桁数（RFC 4226 の範囲 6〜8）
    /// * `period` - タイムステップ（秒）
    /// * `skew` - 検証時に許容する前後ステップ数
    pub fn new(issuer: String, digits: usize, period: u64, skew: u8) -> Result<Self, AppError> {
        if !(6..=8).contains(&digits) {
            return Err(AppError::Validation(
                "コード桁数は6〜8で指定してください".to_string(),
            ));
        }
        if period == 0 {
            return Err(AppError::Validation(
                "タイムステップは1秒以上で指定してください".to_string(),
            ));
        }

        Ok(Self {
            issuer,
            digits,
            period,
            skew,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.totp_issuer.clone(),
            config.totp_digits,
            config.totp_period,
            config.totp_skew,
        )
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// 20バイトのランダムシークレットを生成し、Base32でエンコード
    ///
    /// # Security
    /// CSPRNGを使用すること。予測可能なシークレットは認証の完全なバイパスになる。
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        BASE32.encode(&bytes)
    }

    /// 指定時刻のTOTPコードを導出
    ///
    /// 同じ secret / timestamp / digits / period からは常に同じコードが得られる。
    pub fn derive_code(&self, secret: &str, timestamp: u64) -> Result<String, AppError> {
        let totp = self.create_totp(secret)?;
        Ok(totp.generate(timestamp))
    }

    /// TOTPコードを検証
    ///
    /// `[counter-skew, counter+skew]` のいずれかのステップでコードが一致すれば true。
    ///
    /// # Note
    /// 桁数・数字のみの形式チェックを通らない候補はシークレットに触れずに
    /// false を返す（不正な形式で例外にはしない）
    pub fn verify(&self, secret: &str, candidate: &str, timestamp: u64) -> Result<bool, AppError> {
        if !self.is_well_formed(candidate) {
            return Ok(false);
        }

        let totp = self.create_totp(secret)?;
        Ok(totp.check(candidate, timestamp))
    }

    /// 候補コードが桁数どおりのASCII数字列か
    pub fn is_well_formed(&self, candidate: &str) -> bool {
        candidate.len() == self.digits && candidate.chars().all(|c| c.is_ascii_digit())
    }

    /// 登録用の otpauth:// URI を構築
    ///
    /// `otpauth://totp/{issuer}:{label}?secret=...&issuer=...&algorithm=SHA1&digits=...&period=...`
    ///
    /// 副作用なしの文字列構築のみ。QRコード画像化は外部レンダラに委ねる。
    pub fn provisioning_uri(&self, secret: &str, label: &str) -> Result<String, AppError> {
        // URIに載せる前にシークレットの形式を確認しておく
        self.decode_secret(secret)?;

        Ok(format!(
            "otpauth://totp/{issuer}:{label}?secret={secret}&issuer={issuer}&algorithm=SHA1&digits={digits}&period={period}",
            issuer = urlencoding::encode(&self.issuer),
            label = urlencoding::encode(label),
            digits = self.digits,
            period = self.period,
        ))
    }

    /// TOTP オブジェクトを作成（導出・検証用）
    fn create_totp(&self, secret: &str) -> Result<TOTP, AppError> {
        let secret_bytes = self.decode_secret(secret)?;

        TOTP::new(
            Algorithm::SHA1,
            self.digits,
            self.skew,
            self.period,
            secret_bytes,
            None,
            String::new(),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "TOTP作成エラー");
            AppError::InvalidSecret
        })
    }

    fn decode_secret(&self, secret: &str) -> Result<Vec<u8>, AppError> {
        if secret.is_empty() {
            tracing::error!("空のTOTPシークレット");
            return Err(AppError::InvalidSecret);
        }

        BASE32.decode(secret.as_bytes()).map_err(|e| {
            tracing::error!(error = ?e, "シークレットのBase32デコードエラー");
            AppError::InvalidSecret
        })
    }
}
