use chrono::{DateTime, SecondsFormat, Utc};

/// VODの該当時刻へのリンクを生成
///
/// 発言の5秒前から再生されるようにする（0秒未満にはならない）
///
/// # Examples
/// ```
/// use chat_scraper_lib::util::vod_link;
///
/// assert_eq!(vod_link("123", 65.8), "https://twitch.tv/videos/123?t=60s");
/// assert_eq!(vod_link("123", 2.0), "https://twitch.tv/videos/123?t=0s");
/// ```
pub fn vod_link(video_id: &str, stream_timestamp: f64) -> String {
    let seconds = (stream_timestamp - 5.0).floor().max(0.0) as u64;
    format!("https://twitch.tv/videos/{}?t={}s", video_id, seconds)
}

/// 投稿日時を秒精度のISO 8601形式にする
pub fn format_created(created: &DateTime<Utc>) -> String {
    created.to_rfc3339_opts(SecondsFormat::Secs, true)
}
