// =============================================================================
// 共通設定・定数モジュール
// =============================================================================
// Twitch GQLへの接続情報、キャッシュ配置、同時ダウンロード数などの設定値を定義
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

/// HTTPリクエストのデフォルトタイムアウト（秒）
///
/// GQLへのリクエストで使用。
/// 応答がない場合でも適切にタイムアウトし、ジョブが永久に止まらないようにする。
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Twitch GQLエンドポイント
pub const GQL_ENDPOINT: &str = "https://gql.twitch.tv/gql";

/// Twitch Web版が使用している公開Client-ID
pub const PUBLIC_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

/// キャッシュディレクトリのデフォルト
pub const DEFAULT_CACHE_DIR: &str = "./cache";

/// 同時ダウンロード数のデフォルト
pub const DEFAULT_MAX_DOWNLOADS: usize = 3;

/// 1回目の失敗から再試行までの待機時間（ミリ秒）
pub const RETRY_DELAY_MS: u64 = 500;

/// HTTPリクエストのデフォルトタイムアウト（Duration）
///
/// HTTPクライアント構築時に直接使用可能
pub fn http_timeout() -> Duration {
    Duration::from_secs(HTTP_TIMEOUT_SECS)
}

/// スクレイパー全体の設定
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// GQLエンドポイントURL（テスト時はモックサーバーに差し替える）
    pub endpoint: String,
    /// Client-IDヘッダーに載せる値
    pub client_id: String,
    /// チャットキャッシュの保存先
    pub cache_dir: PathBuf,
    /// 同時に実行するダウンロードの上限（キャッシュ読み込みは含まない）
    pub max_downloads: usize,
    pub http_timeout: Duration,
    pub retry_delay: Duration,
}

impl ScraperConfig {
    /// キャッシュディレクトリを指定して作成
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            endpoint: GQL_ENDPOINT.to_string(),
            client_id: PUBLIC_CLIENT_ID.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            http_timeout: http_timeout(),
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}
