//! チャットメッセージのフィルタリング
//!
//! 本文（辞書）とユーザー名のルールでメッセージを選別し、
//! マッチ箇所のハイライト範囲を返す。

pub mod loader;
pub mod matcher;
pub mod rules;

pub use loader::{load_list, RulesetError};
pub use matcher::{evaluate, MatchResult};
pub use rules::{Rule, RuleKind, RuleSet};
