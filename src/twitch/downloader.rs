//! チャットリプレイのダウンロード管理
//!
//! 複数VODのチャット取得を同時に進める。キャッシュがあれば読み込み、
//! なければ（または強制再取得時は）GQLからページングで取得してキャッシュに保存する。
//!
//! ## 同時実行
//! ジョブは呼び出し元のタスク上で`join_all`により協調的に実行される（スポーンしない）。
//! ダウンロード数はセマフォで制限し、キャッシュ読み込みは制限の対象外。
//!
//! ## キャンセル
//! `abort_all()`で全ジョブ共通のトークンをキャンセルする。
//! 各ジョブは次の待機ポイントで静かに終了し、エラーとしては報告されない。

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::cache::ChatCache;
use super::errors::TwitchError;
use super::gql::{GqlClient, GqlTransport};
use super::pagination::fetch_all;
use super::types::{ChatMessage, VideoId};
use crate::config::ScraperConfig;

/// ダウンロードイベント
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// VOD1本分のチャット
    Data {
        video_id: VideoId,
        messages: Vec<ChatMessage>,
    },

    /// ページを1つ処理した（VODは区別しない）
    Progress,

    /// ジョブの失敗（キャンセルは含まない）
    Error { video_id: VideoId, message: String },

    /// 全ジョブが成功した
    Success,

    /// 1つ以上のジョブが成功しなかった
    Failure,
}

/// ジョブ1件の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOutcome {
    Success,
    Error,
    Aborted,
}

/// 実行結果の集計
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: usize,
}

impl DownloadSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.aborted == 0
    }

    fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Success => self.succeeded += 1,
            JobOutcome::Error => self.failed += 1,
            JobOutcome::Aborted => self.aborted += 1,
        }
    }
}

/// チャットリプレイダウンローダー
pub struct ChatDownloader {
    transport: Arc<dyn GqlTransport>,
    cache: ChatCache,
    /// 同時ダウンロード数の制限
    download_slots: Semaphore,
    max_downloads: usize,
    /// 全ジョブ共通のキャンセルトークン
    cancel: CancellationToken,
}

impl ChatDownloader {
    /// 設定からダウンローダーを作成
    ///
    /// キャッシュディレクトリがなければ作成する
    pub fn new(config: &ScraperConfig) -> Result<Self, TwitchError> {
        let transport = Arc::new(GqlClient::new(config)?);
        Self::with_transport(transport, config)
    }

    /// トランスポートを指定して作成
    pub fn with_transport(
        transport: Arc<dyn GqlTransport>,
        config: &ScraperConfig,
    ) -> Result<Self, TwitchError> {
        let cache = ChatCache::new(&config.cache_dir);
        cache.ensure_dir()?;

        let max_downloads = config.max_downloads.max(1);

        Ok(Self {
            transport,
            cache,
            download_slots: Semaphore::new(max_downloads),
            max_downloads,
            cancel: CancellationToken::new(),
        })
    }

    /// 実行中・待機中の全ジョブをできるだけ早く止める
    pub fn abort_all(&self) {
        log::info!("Aborting all chat downloads");
        self.cancel.cancel();
    }

    /// シグナルハンドラなどから`abort_all`相当を行うためのトークン
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn max_downloads(&self) -> usize {
        self.max_downloads
    }

    /// VOD一覧の取得などで同じトランスポートを使うためのアクセサ
    pub fn transport(&self) -> &dyn GqlTransport {
        self.transport.as_ref()
    }

    /// キャッシュに存在しないVOD IDだけを返す
    pub fn remove_cached_vods_from_list(&self, video_ids: &[VideoId]) -> Vec<VideoId> {
        video_ids
            .iter()
            .filter(|id| !self.cache.contains(id))
            .cloned()
            .collect()
    }

    /// 複数VODのチャットリプレイを取得する
    ///
    /// VODごとに`Data`または`Error`を、ページごとに`Progress`を通知し、
    /// 全ジョブ終了後に`Success`か`Failure`を1回だけ通知する。
    /// 重複したIDは1回だけ処理する。
    pub async fn get_chat_replays<F>(
        &self,
        video_ids: &[VideoId],
        force_download: bool,
        on_event: F,
    ) -> DownloadSummary
    where
        F: Fn(DownloadEvent),
    {
        let mut seen = HashSet::new();
        let jobs = video_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| self.retrieve(id, force_download, &on_event));

        let outcomes = join_all(jobs).await;

        let mut summary = DownloadSummary::default();
        for outcome in outcomes {
            summary.record(outcome);
        }

        log::info!(
            "Chat replays finished: {} succeeded, {} failed, {} aborted",
            summary.succeeded,
            summary.failed,
            summary.aborted
        );

        if summary.is_success() {
            on_event(DownloadEvent::Success);
        } else {
            on_event(DownloadEvent::Failure);
        }

        summary
    }

    /// VOD1本分のジョブ
    async fn retrieve<F>(&self, video_id: &str, force_download: bool, on_event: &F) -> JobOutcome
    where
        F: Fn(DownloadEvent),
    {
        let result = if self.cancel.is_cancelled() {
            Err(TwitchError::Aborted)
        } else if !force_download && self.cache.contains(video_id) {
            self.cache.read(video_id).await
        } else {
            self.download(video_id, on_event).await
        };

        match result {
            Ok(messages) => {
                on_event(DownloadEvent::Data {
                    video_id: video_id.to_string(),
                    messages,
                });
                JobOutcome::Success
            }
            Err(e) if e.is_quiet_abort() => {
                log::debug!("Chat download for {} aborted", video_id);
                JobOutcome::Aborted
            }
            Err(e) => {
                log::error!("Chat download for {} failed: {}", video_id, e);
                on_event(DownloadEvent::Error {
                    video_id: video_id.to_string(),
                    message: e.to_string(),
                });
                JobOutcome::Error
            }
        }
    }

    /// 空きスロットを待ってからダウンロードし、キャッシュに保存する
    async fn download<F>(&self, video_id: &str, on_event: &F) -> Result<Vec<ChatMessage>, TwitchError>
    where
        F: Fn(DownloadEvent),
    {
        // ジョブ終了までスロットを保持する
        let _slot = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(TwitchError::Aborted),
            slot = self.download_slots.acquire() => slot.map_err(|_| TwitchError::Aborted)?,
        };

        let messages = fetch_all(self.transport.as_ref(), video_id, &self.cancel, || {
            on_event(DownloadEvent::Progress)
        })
        .await?;

        self.cache.write(video_id, &messages).await?;
        Ok(messages)
    }
}

impl std::fmt::Debug for ChatDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatDownloader")
            .field("cache_dir", &self.cache.dir())
            .field("max_downloads", &self.max_downloads)
            .field("aborted", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitch::test_support::{comments_page, end_page, ScriptedTransport};
    use std::cell::RefCell;
    use std::time::Duration;

    fn test_config(dir: &tempfile::TempDir, max_downloads: usize) -> ScraperConfig {
        ScraperConfig {
            max_downloads,
            retry_delay: Duration::ZERO,
            ..ScraperConfig::with_cache_dir(dir.path())
        }
    }

    fn ids(list: &[&str]) -> Vec<VideoId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn two_page_script(prefix: &str) -> Vec<Result<serde_json::Value, TwitchError>> {
        let a = format!("{}-a", prefix);
        let b = format!("{}-b", prefix);
        let c = format!("{}-c", prefix);
        vec![
            Ok(comments_page(&[(a.as_str(), 1.0), (b.as_str(), 2.0)])),
            Ok(comments_page(&[(b.as_str(), 2.0), (c.as_str(), 3.0)])),
            Ok(end_page()),
        ]
    }

    #[tokio::test]
    async fn test_download_emits_data_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::per_video(vec![("100", two_page_script("x"))]));
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 3)).unwrap();

        let events = RefCell::new(Vec::new());
        let summary = downloader
            .get_chat_replays(&ids(&["100"]), false, |e| events.borrow_mut().push(e))
            .await;

        assert!(summary.is_success());
        let events = events.into_inner();
        let progress = events.iter().filter(|e| matches!(e, DownloadEvent::Progress)).count();
        assert_eq!(progress, 2);
        assert!(matches!(events.last(), Some(DownloadEvent::Success)));

        let data = events
            .iter()
            .find_map(|e| match e {
                DownloadEvent::Data { video_id, messages } if video_id == "100" => Some(messages.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(data.len(), 3);

        let cache = ChatCache::new(dir.path());
        assert_eq!(cache.read("100").await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 3)).unwrap();

        // 事前にキャッシュを用意
        let seed = ScriptedTransport::new(two_page_script("seed"));
        let cached = fetch_all(&seed, "123", &CancellationToken::new(), || {}).await.unwrap();
        ChatCache::new(dir.path()).write("123", &cached).await.unwrap();

        let events = RefCell::new(Vec::new());
        let summary = downloader
            .get_chat_replays(&ids(&["123"]), false, |e| events.borrow_mut().push(e))
            .await;

        assert!(summary.is_success());
        assert!(transport.requests().is_empty());
        let events = events.into_inner();
        match &events[0] {
            DownloadEvent::Data { video_id, messages } => {
                assert_eq!(video_id, "123");
                assert_eq!(messages, &cached);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_force_download_overwrites_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChatCache::new(dir.path());
        let stale = fetch_all(
            &ScriptedTransport::new(vec![Ok(comments_page(&[("stale", 1.0)])), Ok(end_page())]),
            "55",
            &CancellationToken::new(),
            || {},
        )
        .await
        .unwrap();
        cache.write("55", &stale).await.unwrap();

        let transport = Arc::new(ScriptedTransport::per_video(vec![("55", two_page_script("fresh"))]));
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 3)).unwrap();

        let summary = downloader.get_chat_replays(&ids(&["55"]), true, |_| {}).await;

        assert!(summary.is_success());
        assert_eq!(transport.requests().len(), 3);
        let refreshed = cache.read("55").await.unwrap();
        assert_eq!(refreshed.len(), 3);
        assert_eq!(refreshed[0].message, "fresh-a");
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let dir = tempfile::tempdir().unwrap();
        let videos = ["1", "2", "3", "4", "5", "6"];
        let scripts = videos
            .iter()
            .map(|id| (*id, two_page_script(id)))
            .collect();
        let transport = Arc::new(
            ScriptedTransport::per_video(scripts).with_delay(Duration::from_millis(10)),
        );
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 2)).unwrap();

        let summary = downloader.get_chat_replays(&ids(&videos), false, |_| {}).await;

        assert_eq!(summary.succeeded, 6);
        // 上限まで並行し、上限を超えない
        assert_eq!(transport.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_error_is_isolated_per_video() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::per_video(vec![
            ("bad", vec![Err(TwitchError::Transport("connection reset".to_string()))]),
            ("good", two_page_script("g")),
        ]));
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 3)).unwrap();

        let events = RefCell::new(Vec::new());
        let summary = downloader
            .get_chat_replays(&ids(&["bad", "good"]), false, |e| events.borrow_mut().push(e))
            .await;

        assert_eq!(summary, DownloadSummary { succeeded: 1, failed: 1, aborted: 0 });
        let events = events.into_inner();
        assert!(events.iter().any(|e| matches!(e, DownloadEvent::Error { video_id, .. } if video_id == "bad")));
        assert!(events.iter().any(|e| matches!(e, DownloadEvent::Data { video_id, .. } if video_id == "good")));
        assert!(matches!(events.last(), Some(DownloadEvent::Failure)));

        // 失敗したVODのキャッシュは作られない
        let cache = ChatCache::new(dir.path());
        assert!(!cache.contains("bad"));
        assert!(cache.contains("good"));
    }

    #[tokio::test]
    async fn test_cancellation_settles_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let videos = ["1", "2", "3"];
        let scripts = videos
            .iter()
            .map(|id| (*id, two_page_script(id)))
            .collect();
        let transport = Arc::new(
            ScriptedTransport::per_video(scripts).with_delay(Duration::from_millis(100)),
        );
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 1)).unwrap();

        let video_ids = ids(&videos);
        let events = RefCell::new(Vec::new());
        let (summary, _) = tokio::join!(
            downloader.get_chat_replays(&video_ids, false, |e| events.borrow_mut().push(e)),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                downloader.abort_all();
            }
        );

        assert_eq!(summary.aborted, 3);
        assert!(!summary.is_success());
        // 待機中だったジョブはリクエストを送らない
        assert_eq!(transport.requested_videos(), vec!["1".to_string()]);

        let events = events.into_inner();
        assert!(!events.iter().any(|e| matches!(e, DownloadEvent::Error { .. })));
        assert!(matches!(events.last(), Some(DownloadEvent::Failure)));
        assert!(!ChatCache::new(dir.path()).contains("1"));
    }

    #[tokio::test]
    async fn test_abort_before_start_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new(two_page_script("x")));
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 3)).unwrap();
        downloader.abort_all();

        let summary = downloader.get_chat_replays(&ids(&["9"]), false, |_| {}).await;

        assert_eq!(summary.aborted, 1);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_processed_once() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::per_video(vec![("8", two_page_script("d"))]));
        let downloader = ChatDownloader::with_transport(transport.clone(), &test_config(&dir, 3)).unwrap();

        let summary = downloader.get_chat_replays(&ids(&["8", "8"]), false, |_| {}).await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_remove_cached_vods_from_list() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ChatDownloader::with_transport(
            Arc::new(ScriptedTransport::new(vec![])),
            &test_config(&dir, 3),
        )
        .unwrap();
        ChatCache::new(dir.path()).write("2", &[]).await.unwrap();

        assert_eq!(
            downloader.remove_cached_vods_from_list(&ids(&["1", "2", "3"])),
            ids(&["1", "3"])
        );
    }

    #[test]
    fn test_creates_cache_dir_and_clamps_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScraperConfig {
            max_downloads: 0,
            ..ScraperConfig::with_cache_dir(dir.path().join("nested"))
        };

        let downloader =
            ChatDownloader::with_transport(Arc::new(ScriptedTransport::new(vec![])), &config).unwrap();

        assert_eq!(downloader.max_downloads(), 1);
        assert!(dir.path().join("nested").is_dir());
    }
}
