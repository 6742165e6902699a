//! チャットリプレイのページング取得
//!
//! GQLはcursorでの継続を受け付けないため、直前ページ最後のメッセージの
//! オフセット秒を次のリクエストに使う。オフセット指定で再取得すると
//! 前ページの末尾が次ページの先頭に再び含まれるので、直前ページのIDで重複を除く。

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use super::errors::TwitchError;
use super::gql::{parse_comment_page, transform_comment, CommentPage, GqlRequest, GqlTransport};
use super::types::ChatMessage;

/// オフセットが進まず新規メッセージもないページが連続した場合の上限
/// これを超えるとループが進まないものとしてエラーにする
const MAX_STALLED_PAGES: u32 = 5;

/// VOD1本分のチャットを終端まで取得する
///
/// ページを1つ処理するごとに`on_progress`を呼ぶ。
pub async fn fetch_all<T, F>(
    transport: &T,
    video_id: &str,
    cancel: &CancellationToken,
    on_progress: F,
) -> Result<Vec<ChatMessage>, TwitchError>
where
    T: GqlTransport + ?Sized,
    F: Fn(),
{
    let mut messages: Vec<ChatMessage> = Vec::new();
    let mut offset = 0.0_f64;
    // 直前ページに含まれていたメッセージID（全体では蓄積しない）
    let mut boundary_ids: HashSet<String> = HashSet::new();
    let mut stalled_pages = 0;
    let mut page_count = 0_u64;

    log::debug!("Downloading chat for {}", video_id);

    loop {
        let request = GqlRequest::video_comments(video_id, offset);
        let response = transport.execute(&request, cancel).await?;

        let edges = match parse_comment_page(&response)? {
            CommentPage::End => break,
            CommentPage::Edges(edges) => edges,
        };

        let Some(last) = edges.last() else {
            return Err(TwitchError::MalformedResponse(format!(
                "Cannot find last message offset (video: {}, offset: {})",
                video_id, offset
            )));
        };
        let next_offset = last.node.content_offset_seconds.ok_or_else(|| {
            TwitchError::MalformedResponse(format!(
                "Cannot find last message offset (video: {}, offset: {})",
                video_id, offset
            ))
        })?;
        // cursorが無いか空文字なら続きは無い
        let has_continuation = last.cursor.as_deref().is_some_and(|c| !c.is_empty());

        let before = messages.len();
        for edge in edges.iter().filter(|e| !boundary_ids.contains(&e.node.id)) {
            messages.push(transform_comment(edge)?);
        }
        let appended = messages.len() - before;

        boundary_ids = edges.into_iter().map(|e| e.node.id).collect();

        if appended == 0 && next_offset <= offset {
            stalled_pages += 1;
            if stalled_pages > MAX_STALLED_PAGES {
                return Err(TwitchError::MalformedResponse(format!(
                    "Pagination stalled at offset {} (video: {})",
                    offset, video_id
                )));
            }
        } else {
            stalled_pages = 0;
        }

        offset = next_offset;
        page_count += 1;
        on_progress();

        if !has_continuation {
            log::debug!("No continuation after offset {} (video: {})", offset, video_id);
            break;
        }
    }

    log::info!(
        "Downloaded {} messages in {} pages for {}",
        messages.len(),
        page_count,
        video_id
    );

    Ok(messages)
}
