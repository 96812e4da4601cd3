//! 完整性标签 — HMAC-SHA256 防篡改
//!
//! 每条日志条目的 `hash` 字段是对 `(user_id, query, status, timestamp)`
//! 用注入密钥计算的 HMAC-SHA256。任何字段被带外修改，重算的标签就对
//! 不上，`verify` 以数据形式报告 `valid: false`。
//!
//! # 规范化
//!
//! 变长字段直接拼接（或用固定分隔符拼接）不是单射：字段值本身可以
//! 包含分隔符，`("a|b","c")` 和 `("a","b|c")` 会得到同一串输入。
//! 这里对每个字段先写入 8 字节 LE 长度再写入内容，字段元组到 MAC
//! 输入的映射严格单射。

use ring::hmac;

/// 完整性标签密钥
///
/// 从配置注入（可轮换），内部持有派生好的 HMAC 密钥。
pub struct IntegrityKey {
    key: hmac::Key,
}

impl std::fmt::Debug for IntegrityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 不打印密钥材料
        f.debug_struct("IntegrityKey").finish_non_exhaustive()
    }
}

impl IntegrityKey {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// 计算条目的完整性标签（小写 hex）
    pub fn tag(&self, user_id: &str, query: &str, status: &str, timestamp: &str) -> String {
        let input = canonical_input(&[user_id, query, status, timestamp]);
        hex::encode(hmac::sign(&self.key, &input).as_ref())
    }

    /// 校验存储的标签 — 常数时间比较
    ///
    /// hex 解码失败（标签被改成非法字符串）视为不匹配。
    pub fn verify_tag(
        &self,
        user_id: &str,
        query: &str,
        status: &str,
        timestamp: &str,
        provided_hex: &str,
    ) -> bool {
        let Ok(provided) = hex::decode(provided_hex) else {
            return false;
        };
        let input = canonical_input(&[user_id, query, status, timestamp]);
        hmac::verify(&self.key, &input, &provided).is_ok()
    }

    /// 为通过校验的条目签发验证令牌
    ///
    /// 对 `(id, hash)` 计算 HMAC，调用方可凭它向第三方证明
    /// "该 id 在校验时刻的标签是这个值"。
    pub fn verification_token(&self, id: i64, hash: &str) -> String {
        let mut input = Vec::with_capacity(8 + 8 + hash.len());
        input.extend_from_slice(&id.to_le_bytes());
        input.extend_from_slice(&(hash.len() as u64).to_le_bytes());
        input.extend_from_slice(hash.as_bytes());
        hex::encode(hmac::sign(&self.key, &input).as_ref())
    }
}

/// 长度前缀规范化：`u64 LE len || bytes` per field
fn canonical_input(fields: &[&str]) -> Vec<u8> {
    let total: usize = fields.iter().map(|f| 8 + f.len()).sum();
    let mut buf = Vec::with_capacity(total);
    for field in fields {
        buf.extend_from_slice(&(field.len() as u64).to_le_bytes());
        buf.extend_from_slice(field.as_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> IntegrityKey {
        IntegrityKey::new(b"unit-test-secret-key-0123456789abcdef")
    }

    #[test]
    fn test_tag_round_trip() {
        let k = key();
        let tag = k.tag("alice", "SELECT 1", "SUCCESS", "2025-06-01T10:00:00.000000Z");
        assert_eq!(tag.len(), 64);
        assert!(k.verify_tag(
            "alice",
            "SELECT 1",
            "SUCCESS",
            "2025-06-01T10:00:00.000000Z",
            &tag
        ));
    }

    #[test]
    fn test_any_field_tamper_invalidates() {
        let k = key();
        let ts = "2025-06-01T10:00:00.000000Z";
        let tag = k.tag("alice", "SELECT 1", "SUCCESS", ts);

        assert!(!k.verify_tag("bob", "SELECT 1", "SUCCESS", ts, &tag));
        assert!(!k.verify_tag("alice", "SELECT 2", "SUCCESS", ts, &tag));
        assert!(!k.verify_tag("alice", "SELECT 1", "ERROR", ts, &tag));
        assert!(!k.verify_tag("alice", "SELECT 1", "SUCCESS", "2025-06-01T10:00:00.000001Z", &tag));
    }

    #[test]
    fn test_canonicalization_is_injective() {
        let k = key();
        let ts = "2025-06-01T10:00:00.000000Z";

        // 字段边界移动必须产生不同标签 — 这是朴素 "|" 拼接做不到的
        let a = k.tag("alice|SELECT 1", "x", "SUCCESS", ts);
        let b = k.tag("alice", "SELECT 1|x", "SUCCESS", ts);
        assert_ne!(a, b);

        let c = k.tag("ab", "c", "SUCCESS", ts);
        let d = k.tag("a", "bc", "SUCCESS", ts);
        assert_ne!(c, d);

        // NUL 字节同样不能制造歧义
        let e = k.tag("a\0b", "c", "SUCCESS", ts);
        let f = k.tag("a", "b\0c", "SUCCESS", ts);
        assert_ne!(e, f);
    }

    #[test]
    fn test_garbage_hex_is_mismatch_not_panic() {
        let k = key();
        assert!(!k.verify_tag("alice", "q", "s", "t", "not-hex-at-all"));
        assert!(!k.verify_tag("alice", "q", "s", "t", ""));
    }

    #[test]
    fn test_different_keys_disagree() {
        let k1 = key();
        let k2 = IntegrityKey::new(b"another-secret-key-material-xyzxyzxyz");
        let ts = "2025-06-01T10:00:00.000000Z";
        let tag = k1.tag("alice", "SELECT 1", "SUCCESS", ts);
        assert!(!k2.verify_tag("alice", "SELECT 1", "SUCCESS", ts, &tag));
    }
}
