//! メッセージの判定
//!
//! ユーザールール → 本文ルールの順に評価する。

use super::rules::{RuleKind, RuleSet};
use crate::highlight::{HighlightStyle, MatchSpan};
use crate::twitch::ChatMessage;

/// 判定結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub included: bool,
    /// 重なりを含む生の範囲（表示前に`highlight::resolve`で整える）
    pub spans: Vec<MatchSpan>,
}

impl MatchResult {
    fn rejected() -> Self {
        Self::default()
    }
}

/// メッセージを辞書ルールとユーザールールで判定する
pub fn evaluate(message: &ChatMessage, dictionary: &RuleSet, users: &RuleSet) -> MatchResult {
    if !passes_user_rules(&message.user.name, users) {
        return MatchResult::rejected();
    }

    if !dictionary.is_active() {
        return MatchResult {
            included: true,
            spans: Vec::new(),
        };
    }

    let lowercase_body = message.message.to_lowercase();
    let mut found = dictionary.has_wildcard();
    let mut spans = Vec::new();

    for rule in dictionary.iter() {
        match rule.kind() {
            RuleKind::Blacklist => {
                if rule.is_blacklisted(&lowercase_body) {
                    return MatchResult::rejected();
                }
            }
            // ワイルドカードがある場合はブラックリストだけを評価する
            RuleKind::ExactWord | RuleKind::Substring if !dictionary.has_wildcard() => {
                let matches = rule.find_all(&message.message);
                if !matches.is_empty() {
                    found = true;
                    spans.extend(
                        matches
                            .into_iter()
                            .map(|(start, end)| MatchSpan::new(start, end, HighlightStyle::Match)),
                    );
                }
            }
            _ => {}
        }
    }

    if found {
        MatchResult {
            included: true,
            spans,
        }
    } else {
        MatchResult::rejected()
    }
}

fn passes_user_rules(login: &str, users: &RuleSet) -> bool {
    if !users.is_active() {
        return true;
    }

    let blacklisted = users
        .iter()
        .any(|r| r.kind() == RuleKind::Blacklist && r.names(login));
    if blacklisted {
        return false;
    }

    users.has_wildcard()
        || users
            .iter()
            .any(|r| r.kind() == RuleKind::ExactWord && r.names(login))
}
