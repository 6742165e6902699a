//! Twitch GQL クライアントモジュール
//!
//! Twitch Webクライアントが使う非公開のGQLエンドポイントからチャットリプレイと
//! VOD一覧を取得する。クエリはpersisted query（ハッシュ指定）で送る。
//!
//! ## 注意事項
//! - 非公式APIのため、仕様変更のリスクあり
//! - 認証は公開Client-IDのみ

pub mod client;
pub mod parser;
pub mod types;

pub use client::{GqlClient, GqlTransport};
pub use parser::{parse_comment_page, parse_video_ids, transform_comment};
pub use types::*;
