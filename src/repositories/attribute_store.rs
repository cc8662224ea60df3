use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

/// ユーザー属性の永続化ストア
///
/// ホスト側のユーザーデータベースが実装する。単一キーの読み書きは
/// アトミックであることを前提とする（複数キーにまたがるトランザクションは
/// 要求しない）。
pub trait AttributeStore: Send + Sync {
    /// 属性を取得（未設定なら None）
    fn get(&self, user_id: Uuid, key: &str) -> anyhow::Result<Option<String>>;

    /// 属性を設定（既存値は上書き）
    fn set(&self, user_id: Uuid, key: &str, value: &str) -> anyhow::Result<()>;

    /// 属性を削除（未設定でもエラーにしない）
    fn delete(&self, user_id: Uuid, key: &str) -> anyhow::Result<()>;
}

/// インメモリ実装
///
/// テストおよび独自ストアを持たない組み込みホスト向け。
#[derive(Debug, Default)]
pub struct MemoryAttributeStore {
    attributes: Mutex<HashMap<(Uuid, String), String>>,
}

impl MemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<(Uuid, String), String>>> {
        self.attributes
            .lock()
            .map_err(|_| anyhow::anyhow!("attribute store mutex poisoned"))
    }
}

impl AttributeStore for MemoryAttributeStore {
    fn get(&self, user_id: Uuid, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.lock()?.get(&(user_id, key.to_string())).cloned())
    }

    fn set(&self, user_id: Uuid, key: &str, value: &str) -> anyhow::Result<()> {
        self.lock()?
            .insert((user_id, key.to_string()), value.to_string());
        Ok(())
    }

    fn delete(&self, user_id: Uuid, key: &str) -> anyhow::Result<()> {
        self.lock()?.remove(&(user_id, key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_attribute() {
        let store = MemoryAttributeStore::new();
        let result = store.get(Uuid::new_v4(), "totp_secret").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_set_and_get() {
        let store = MemoryAttributeStore::new();
        let user_id = Uuid::new_v4();

        store.set(user_id, "totp_secret", "ABC234").unwrap();
        assert_eq!(
            store.get(user_id, "totp_secret").unwrap(),
            Some("ABC234".to_string())
        );
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemoryAttributeStore::new();
        let user_id = Uuid::new_v4();

        store.set(user_id, "totp_config_completed", "0").unwrap();
        store.set(user_id, "totp_config_completed", "1").unwrap();
        assert_eq!(
            store.get(user_id, "totp_config_completed").unwrap(),
            Some("1".to_string())
        );
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryAttributeStore::new();
        let user_id = Uuid::new_v4();

        store.set(user_id, "totp_secret", "ABC234").unwrap();
        store.delete(user_id, "totp_secret").unwrap();
        store.delete(user_id, "totp_secret").unwrap();
        assert!(store.get(user_id, "totp_secret").unwrap().is_none());
    }

    #[test]
    fn test_attributes_are_scoped_per_user() {
        let store = MemoryAttributeStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.set(alice, "totp_secret", "ABC234").unwrap();
        assert!(store.get(bob, "totp_secret").unwrap().is_none());
    }
}
