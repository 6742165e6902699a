//! Twitch チャットリプレイ取得モジュール
//!
//! ## 構成
//! - `gql`: GQLエンドポイントへのリクエスト（1回だけ自動再試行）
//! - `pagination`: オフセット指定のページングと境界の重複排除
//! - `cache`: VODごとのJSONキャッシュ
//! - `downloader`: 複数VODの同時取得、キャッシュ判定、キャンセル
//! - `vod_list`: チャンネルの最新VOD一覧

pub mod cache;
pub mod downloader;
pub mod errors;
pub mod gql;
pub mod pagination;
pub mod retry;
pub mod types;
pub mod vod_list;

#[cfg(test)]
pub(crate) mod test_support;

pub use downloader::{ChatDownloader, DownloadEvent, DownloadSummary};
pub use errors::TwitchError;
pub use types::{ChatMessage, ChatUser, VideoId};
