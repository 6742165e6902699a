use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 配信アーカイブ（VOD）のID
pub type VideoId = String;

/// チャットメッセージ
///
/// キャッシュファイルにはこの形式のままJSON配列として保存される。
/// フィールド名は既存のキャッシュと互換性を保つためsnake_caseのまま。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 送信された絶対時刻
    pub created: DateTime<Utc>,
    /// 配信開始からの経過秒
    pub stream_timestamp: f64,
    pub user: ChatUser,
    /// メッセージ本文（フラグメントを連結したもの）
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUser {
    /// 表示名（大文字や非ASCII文字を含む場合あり）
    pub display_name: String,
    /// 小文字化されたログイン名
    pub name: String,
    pub id: String,
}
