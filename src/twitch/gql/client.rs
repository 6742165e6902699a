//! Twitch GQL クライアント実装

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::types::GqlRequest;
use crate::config::ScraperConfig;
use crate::twitch::errors::TwitchError;
use crate::twitch::retry::RetryPolicy;

/// GQLリクエストを1件実行するトランスポート
///
/// 実装は通信・パース失敗時に同じペイロードで1回だけ再試行し、
/// キャンセル済みの場合は`TwitchError::Aborted`を返すこと。
#[async_trait]
pub trait GqlTransport: Send + Sync {
    async fn execute(
        &self,
        request: &GqlRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, TwitchError>;
}

/// Twitch GQLクライアント
pub struct GqlClient {
    client: Client,
    endpoint: String,
    client_id: String,
    retry_delay: std::time::Duration,
}

impl GqlClient {
    /// 新しいクライアントを作成
    ///
    /// # Errors
    /// HTTPクライアントのビルドに失敗した場合にエラーを返す
    pub fn new(config: &ScraperConfig) -> Result<Self, TwitchError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            client_id: config.client_id.clone(),
            retry_delay: config.retry_delay,
        })
    }

    /// 1回分のPOSTを送信してJSONを受け取る
    ///
    /// 送信前と応答受信後にキャンセルを確認する。
    /// 送信済みのリクエストは中断せず、結果を捨てるだけ。
    async fn send_once(
        &self,
        body: &[&GqlRequest],
        cancel: &CancellationToken,
    ) -> Result<Value, AttemptError> {
        if cancel.is_cancelled() {
            return Err(AttemptError::Aborted);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "*/*")
            .header("Client-ID", &self.client_id)
            .json(body)
            .send()
            .await;

        if cancel.is_cancelled() {
            return Err(AttemptError::Aborted);
        }

        let response = response.map_err(|e| AttemptError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptError::Failed(format!(
                "GQL error: {} - {}",
                status, text
            )));
        }

        let data = response.json::<Value>().await;

        if cancel.is_cancelled() {
            return Err(AttemptError::Aborted);
        }

        data.map_err(|e| AttemptError::Failed(format!("GQL parse error: {}", e)))
    }
}

/// 1回の試行の結果（再試行の判定用）
enum AttemptError {
    Aborted,
    Failed(String),
}

#[async_trait]
impl GqlTransport for GqlClient {
    async fn execute(
        &self,
        request: &GqlRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, TwitchError> {
        // 元のWebクライアントと同じく配列（バッチ形式）で送る
        let body = [request];
        let mut retry = RetryPolicy::new(self.retry_delay);

        loop {
            match self.send_once(&body, cancel).await {
                Ok(data) => return Ok(data),
                Err(AttemptError::Aborted) => return Err(TwitchError::Aborted),
                Err(AttemptError::Failed(reason)) => {
                    let Some(delay) = retry.next_delay() else {
                        log::error!(
                            "{} failed after {} attempts: {}",
                            request.operation_name,
                            retry.attempt_count(),
                            reason
                        );
                        return Err(TwitchError::Transport(reason));
                    };

                    log::warn!(
                        "{} failed, retrying in {:?}: {}",
                        request.operation_name,
                        delay,
                        reason
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(TwitchError::Aborted),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for GqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GqlClient")
            .field("endpoint", &self.endpoint)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}
