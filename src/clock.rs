use std::time::{SystemTime, UNIX_EPOCH};

/// 現在時刻（Unix秒）の供給源
///
/// TOTP検証とナンスの有効期限判定が参照する。
/// テストでは固定時刻の実装に差し替える。
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// システム時計
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) struct FixedClock(pub u64);

#[cfg(test)]
impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0
    }
}
