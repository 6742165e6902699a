//! Twitch GQL 固有の型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// チャットリプレイ取得用のpersisted query
const VIDEO_COMMENTS_OPERATION: &str = "VideoCommentsByOffsetOrCursor";
const VIDEO_COMMENTS_HASH: &str =
    "b70a3591ff0f4e0313d126c6a1502d79a1c02baebb288227c582044aa76adf6a";

/// チャンネルのVOD一覧取得用のpersisted query
const CHANNEL_VIDEOS_OPERATION: &str = "FilterableVideoTower_Videos";
const CHANNEL_VIDEOS_HASH: &str =
    "a937f1d22e269e39a03b509f65a7490f9fc247d7f83d6ac1421523e3b68042cb";

/// GQLリクエスト（1オペレーション分）
///
/// クエリ文字列は送らず、サーバー側に登録済みのクエリをハッシュで指定する。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlRequest {
    pub operation_name: String,
    pub variables: serde_json::Value,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extensions {
    pub persisted_query: PersistedQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedQuery {
    pub version: u32,
    #[serde(rename = "sha256Hash")]
    pub sha256_hash: String,
}

impl GqlRequest {
    fn persisted(operation_name: &str, sha256_hash: &str, variables: serde_json::Value) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            variables,
            extensions: Extensions {
                persisted_query: PersistedQuery {
                    version: 1,
                    sha256_hash: sha256_hash.to_string(),
                },
            },
        }
    }

    /// 指定オフセット以降のチャットを1ページ分要求する
    ///
    /// cursorによる継続はサーバーに拒否されるため、オフセット秒で指定する。
    /// APIのcontentOffsetSecondsは整数なので切り捨てて送る。
    pub fn video_comments(video_id: &str, offset_seconds: f64) -> Self {
        let offset = offset_seconds.max(0.0).floor() as u64;
        Self::persisted(
            VIDEO_COMMENTS_OPERATION,
            VIDEO_COMMENTS_HASH,
            json!({
                "videoID": video_id,
                "contentOffsetSeconds": offset
            }),
        )
    }

    /// チャンネルの最新アーカイブを要求する
    pub fn channel_videos(channel: &str, limit: u32) -> Self {
        Self::persisted(
            CHANNEL_VIDEOS_OPERATION,
            CHANNEL_VIDEOS_HASH,
            json!({
                "limit": limit.max(1),
                "channelOwnerLogin": channel,
                "broadcastType": "ARCHIVE",
                "videoSort": "TIME"
            }),
        )
    }
}

/// 1ページ分の解析結果
#[derive(Debug)]
pub enum CommentPage {
    /// `comments`がnull（VODの終端を過ぎた）
    End,
    Edges(Vec<CommentEdge>),
}

/// コメント（edge）
#[derive(Debug, Clone, Deserialize)]
pub struct CommentEdge {
    pub cursor: Option<String>,
    pub node: CommentNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub content_offset_seconds: Option<f64>,
    pub commenter: Option<Commenter>,
    pub message: Option<CommentBody>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commenter {
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentBody {
    pub fragments: Option<Vec<Fragment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fragment {
    pub text: Option<String>,
}
