// =============================================================================
// チャットリプレイキャッシュ
// =============================================================================
// VODごとにチャット全体を1つのJSONファイルとして保存する
// ファイルが存在しない = 未キャッシュ
// =============================================================================

use std::path::{Path, PathBuf};

use super::errors::TwitchError;
use super::types::ChatMessage;

/// チャットリプレイキャッシュ
#[derive(Debug, Clone)]
pub struct ChatCache {
    /// キャッシュディレクトリ
    dir: PathBuf,
}

impl ChatCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// キャッシュディレクトリを作成（存在する場合は何もしない）
    pub fn ensure_dir(&self) -> Result<(), TwitchError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            TwitchError::Cache(format!(
                "Failed to create cache directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// VOD IDに対応するキャッシュファイルのパス
    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", video_id))
    }

    /// キャッシュが存在するか
    pub fn contains(&self, video_id: &str) -> bool {
        self.path_for(video_id).is_file()
    }

    /// キャッシュからチャット全体を読み込む
    pub async fn read(&self, video_id: &str) -> Result<Vec<ChatMessage>, TwitchError> {
        let path = self.path_for(video_id);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            TwitchError::Cache(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let messages: Vec<ChatMessage> = serde_json::from_slice(&bytes).map_err(|e| {
            TwitchError::Cache(format!("Corrupt cache entry {}: {}", path.display(), e))
        })?;

        log::debug!(
            "Chat cache hit for {} ({} messages)",
            video_id,
            messages.len()
        );
        Ok(messages)
    }

    /// チャット全体をキャッシュに書き込む（既存のエントリは丸ごと置き換える）
    ///
    /// 一時ファイルに書いてからリネームするため、途中までのエントリは残らない
    pub async fn write(&self, video_id: &str, messages: &[ChatMessage]) -> Result<(), TwitchError> {
        let path = self.path_for(video_id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", video_id));

        let json = serde_json::to_vec(messages)
            .map_err(|e| TwitchError::Cache(format!("Failed to serialize chat: {}", e)))?;

        tokio::fs::write(&tmp_path, json).await.map_err(|e| {
            TwitchError::Cache(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            TwitchError::Cache(format!("Failed to write {}: {}", path.display(), e))
        })?;

        log::debug!(
            "Chat cached for {} ({} messages)",
            video_id,
            messages.len()
        );
        Ok(())
    }
}
