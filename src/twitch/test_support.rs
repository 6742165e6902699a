//! テスト用のスクリプト化されたGQLトランスポート

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::errors::TwitchError;
use super::gql::{GqlRequest, GqlTransport};

type Script = VecDeque<Result<Value, TwitchError>>;

/// 事前に用意したレスポンスを順番に返すトランスポート
///
/// VIDEO IDごとのスクリプトがあればそれを、なければ共通スクリプトを使う。
pub(crate) struct ScriptedTransport {
    default_script: Mutex<Script>,
    video_scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<GqlRequest>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<Value, TwitchError>>) -> Self {
        Self {
            default_script: Mutex::new(script.into()),
            video_scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn per_video(scripts: Vec<(&str, Vec<Result<Value, TwitchError>>)>) -> Self {
        let transport = Self::new(vec![]);
        {
            let mut map = transport.video_scripts.lock().unwrap();
            for (video_id, script) in scripts {
                map.insert(video_id.to_string(), script.into());
            }
        }
        transport
    }

    /// 応答までの待機時間を設定（同時実行数の計測用）
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn requests(&self) -> Vec<GqlRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requested_videos(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.variables["videoID"].as_str().map(str::to_string))
            .collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, request: &GqlRequest) -> Result<Value, TwitchError> {
        let video_id = request.variables["videoID"].as_str().unwrap_or_default();
        let mut scripts = self.video_scripts.lock().unwrap();
        let next = match scripts.get_mut(video_id) {
            Some(script) => script.pop_front(),
            None => self.default_script.lock().unwrap().pop_front(),
        };
        next.unwrap_or_else(|| {
            Err(TwitchError::Transport(format!(
                "no scripted response for video {}",
                video_id
            )))
        })
    }
}

#[async_trait]
impl GqlTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: &GqlRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, TwitchError> {
        if cancel.is_cancelled() {
            return Err(TwitchError::Aborted);
        }
        self.requests.lock().unwrap().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if cancel.is_cancelled() {
            return Err(TwitchError::Aborted);
        }
        self.next_response(request)
    }
}

/// 指定した(ID, オフセット秒)のコメントを含むページ
///
/// 本文はIDと同じ文字列になる
pub(crate) fn comments_page(comments: &[(&str, f64)]) -> Value {
    let edges: Vec<Value> = comments
        .iter()
        .map(|(id, offset)| {
            json!({
                "cursor": format!("cursor-{}", id),
                "node": {
                    "id": id,
                    "createdAt": "2024-01-01T00:00:00Z",
                    "contentOffsetSeconds": offset,
                    "commenter": {
                        "id": format!("u-{}", id),
                        "login": format!("user_{}", id),
                        "displayName": format!("User_{}", id)
                    },
                    "message": { "fragments": [{ "text": id }] }
                }
            })
        })
        .collect();

    json!([{ "data": { "video": { "comments": { "edges": edges } } } }])
}

/// 終端ページ（commentsがnull）
pub(crate) fn end_page() -> Value {
    json!([{ "data": { "video": { "comments": null } } }])
}
