use std::sync::atomic::{AtomicI64, Ordering};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 规范时间戳格式 — RFC 3339 UTC，微秒精度，`Z` 后缀
///
/// 条目的 `timestamp` 字段在写入时固定为这个格式，完整性标签对
/// 这串文本计算。存储与哈希共用同一字符串，避免反序列化漂移。
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// 当前时刻的规范时间戳文本
pub fn canonical_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Snowflake-style entry ID generator.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: per-process sequence (4096 ids per ms)
///
/// Unlike a purely random low word, the sequence is driven by a CAS loop
/// over the last issued id, so ids are strictly increasing within the
/// process and never collide under concurrent callers. When a millisecond
/// overflows its 4096 slots the counter borrows from the timestamp bits,
/// which keeps monotonicity (the clock catches up on the next tick).
#[derive(Debug)]
pub struct EntryIdSequence {
    last: AtomicI64,
}

/// Custom epoch: 2024-01-01 00:00:00 UTC
const EPOCH_MS: i64 = 1_704_067_200_000;

impl EntryIdSequence {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Issue the next id. Lock-free, safe under concurrent callers.
    pub fn next(&self) -> i64 {
        loop {
            let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
            let candidate = ts << 12;
            let prev = self.last.load(Ordering::Acquire);
            let id = if candidate > prev { candidate } else { prev + 1 };
            if self
                .last
                .compare_exchange(prev, id, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return id;
            }
        }
    }
}

impl Default for EntryIdSequence {
    fn default() -> Self {
        Self::new()
    }
}
