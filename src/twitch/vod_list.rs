//! チャンネルの最新VOD ID取得
//!
//! ページングも重複排除もない、1リクエストだけの取得。

use tokio_util::sync::CancellationToken;

use super::errors::TwitchError;
use super::gql::{parse_video_ids, GqlRequest, GqlTransport};
use super::types::VideoId;

/// チャンネルの最新アーカイブのIDを新しい順に最大`limit`件取得する
pub async fn get_recent_vods<T>(
    transport: &T,
    channel: &str,
    limit: u32,
    cancel: &CancellationToken,
) -> Result<Vec<VideoId>, TwitchError>
where
    T: GqlTransport + ?Sized,
{
    log::info!("Fetching the {} most recent VODs from '{}'", limit.max(1), channel);

    let request = GqlRequest::channel_videos(channel, limit);
    let response = transport.execute(&request, cancel).await?;
    let ids = parse_video_ids(&response, channel)?;

    log::debug!("Found {} VODs for '{}'", ids.len(), channel);
    Ok(ids)
}
