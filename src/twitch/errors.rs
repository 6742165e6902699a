use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwitchError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// 再試行後も失敗した通信・パースエラー
    #[error("Request failed after retry: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// キャンセルによる静かな終了（エラーとして報告しない）
    #[error("Operation aborted")]
    Aborted,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Failed to fetch VODs from '{0}'")]
    ChannelNotFound(String),
}

impl TwitchError {
    /// キャンセル由来の終了かどうか
    pub fn is_quiet_abort(&self) -> bool {
        matches!(self, TwitchError::Aborted)
    }
}

impl From<TwitchError> for String {
    fn from(err: TwitchError) -> String {
        err.to_string()
    }
}
