use std::time::Duration;

/// 1リクエストあたりの自動再試行回数
/// 同じペイロードで1回だけ再送し、それでも失敗したら呼び出し元にエラーを返す
const MAX_RETRIES: u32 = 1;

/// GQLリクエストの再試行を管理する構造体
pub struct RetryPolicy {
    delay: Duration,
    max_retries: u32,
    retries_used: u32,
}

impl RetryPolicy {
    /// 新しいRetryPolicyインスタンスを作成
    ///
    /// 再試行回数は1回固定
    pub fn new(delay: Duration) -> Self {
        Self::with_config(delay, MAX_RETRIES)
    }

    /// カスタム設定でRetryPolicyインスタンスを作成
    pub fn with_config(delay: Duration, max_retries: u32) -> Self {
        Self {
            delay,
            max_retries,
            retries_used: 0,
        }
    }

    /// 再試行を1回消費し、待機時間を返す
    ///
    /// 再試行の残りがない場合はNone
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.retries_used >= self.max_retries {
            return None;
        }
        self.retries_used += 1;
        Some(self.delay)
    }

    /// これまでのリクエスト試行回数（初回を含む）
    pub fn attempt_count(&self) -> u32 {
        self.retries_used + 1
    }
}
