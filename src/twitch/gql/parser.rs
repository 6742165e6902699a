//! GQL レスポンスパーサー

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::*;
use crate::twitch::errors::TwitchError;
use crate::twitch::types::{ChatMessage, ChatUser};

/// エラーメッセージに含めるレスポンス本文の最大長
const MAX_ERROR_BODY_LEN: usize = 300;

/// 値が欠けている場合のプレースホルダー
const MISSING_NAME: &str = "null";
const MISSING_USER_ID: &str = "0";

fn describe(value: &Value) -> String {
    let text = value.to_string();
    if text.len() <= MAX_ERROR_BODY_LEN {
        return text;
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// チャットリプレイのレスポンスを1ページとして解析
///
/// - `comments`が明示的にnull → 終端
/// - `comments`が欠落、または`edges`が配列でない → 不正なレスポンス
pub fn parse_comment_page(response: &Value) -> Result<CommentPage, TwitchError> {
    match response.pointer("/0/data/video/comments") {
        Some(Value::Null) => Ok(CommentPage::End),
        Some(comments) => match comments.get("edges") {
            Some(edges @ Value::Array(_)) => {
                let edges: Vec<CommentEdge> = serde_json::from_value(edges.clone())
                    .map_err(|e| {
                        TwitchError::MalformedResponse(format!("Invalid comment edge: {}", e))
                    })?;
                Ok(CommentPage::Edges(edges))
            }
            _ => Err(TwitchError::MalformedResponse(format!(
                "Invalid response: {}",
                describe(response)
            ))),
        },
        None => Err(TwitchError::MalformedResponse(format!(
            "Invalid response: {}",
            describe(response)
        ))),
    }
}

/// コメントを内部のChatMessage形式に変換
///
/// フラグメントのない本文は不正なメッセージとして扱う
pub fn transform_comment(edge: &CommentEdge) -> Result<ChatMessage, TwitchError> {
    let node = &edge.node;

    let fragments = node
        .message
        .as_ref()
        .and_then(|m| m.fragments.as_ref())
        .ok_or_else(|| {
            TwitchError::MalformedResponse(format!("Invalid message format (id: {})", node.id))
        })?;
    let message: String = fragments
        .iter()
        .filter_map(|f| f.text.as_deref())
        .collect();

    let commenter = node.commenter.as_ref();
    let display_name = commenter
        .and_then(|c| c.display_name.clone())
        .unwrap_or_else(|| MISSING_NAME.to_string());
    let name = commenter
        .and_then(|c| c.login.clone().or_else(|| c.display_name.clone()))
        .unwrap_or_else(|| MISSING_NAME.to_string())
        .to_lowercase();
    let id = commenter
        .and_then(|c| c.id.clone())
        .unwrap_or_else(|| MISSING_USER_ID.to_string());

    Ok(ChatMessage {
        created: node.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        stream_timestamp: node.content_offset_seconds.unwrap_or(0.0),
        user: ChatUser {
            display_name,
            name,
            id,
        },
        message,
    })
}

/// VOD一覧のレスポンスからIDを取り出す
pub fn parse_video_ids(response: &Value, channel: &str) -> Result<Vec<String>, TwitchError> {
    let Some(first) = response.as_array().and_then(|parts| parts.first()) else {
        return Err(TwitchError::MalformedResponse(format!(
            "Invalid response: {}",
            describe(response)
        )));
    };

    let user = match first.pointer("/data/user") {
        Some(Value::Null) | None => return Err(TwitchError::ChannelNotFound(channel.to_string())),
        Some(user) => user,
    };

    let edges = user
        .pointer("/videos/edges")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            TwitchError::MalformedResponse(format!("Invalid response: {}", describe(response)))
        })?;

    edges
        .iter()
        .map(|edge| match edge.pointer("/node/id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(TwitchError::MalformedResponse(format!(
                "Invalid video edge: {}",
                describe(edge)
            ))),
        })
        .collect()
}
