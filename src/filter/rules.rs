// =============================================================================
// マッチルール
// =============================================================================
// 辞書（本文）ルール:
//   *        ワイルドカード
//   ^word    ブラックリスト（部分一致で除外）
//   =word    単語単位の完全一致
//   word     正規表現（コンパイルできなければ文字列として扱う）
// ユーザールール:
//   *        ワイルドカード
//   ^name    ブラックリスト
//   name     ホワイトリスト（先頭の=は無視、常に名前全体で比較）
// =============================================================================

use regex::Regex;

/// ルールの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Blacklist,
    ExactWord,
    Substring,
    Wildcard,
}

/// 1つのマッチルール
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    /// 小文字化済みのパターン（接頭辞は除く）
    pattern: String,
    /// 本文検索用の正規表現（ExactWord / Substringのみ）
    regex: Option<Regex>,
}

impl Rule {
    /// 辞書のエントリからルールを作成
    pub fn dictionary(entry: &str) -> Self {
        let entry = entry.to_lowercase();

        if entry == "*" {
            return Self::new(RuleKind::Wildcard, entry, None);
        }
        if let Some(pattern) = entry.strip_prefix('^') {
            return Self::new(RuleKind::Blacklist, pattern.to_string(), None);
        }
        if let Some(word) = entry.strip_prefix('=') {
            let regex = case_insensitive(&format!(r"\b{}\b", regex::escape(word)));
            return Self::new(RuleKind::ExactWord, word.to_string(), regex);
        }

        let regex = case_insensitive(&entry).or_else(|| {
            log::debug!("Pattern '{}' is not a valid regex, matching it literally", entry);
            case_insensitive(&regex::escape(&entry))
        });
        Self::new(RuleKind::Substring, entry, regex)
    }

    /// ユーザーリストのエントリからルールを作成
    pub fn user(entry: &str) -> Self {
        let entry = entry.to_lowercase();
        let entry = entry.strip_prefix('=').unwrap_or(&entry);

        if entry == "*" {
            return Self::new(RuleKind::Wildcard, entry.to_string(), None);
        }
        match entry.strip_prefix('^') {
            Some(name) => Self::new(RuleKind::Blacklist, name.to_string(), None),
            None => Self::new(RuleKind::ExactWord, entry.to_string(), None),
        }
    }

    fn new(kind: RuleKind, pattern: String, regex: Option<Regex>) -> Self {
        Self {
            kind,
            pattern,
            regex,
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 小文字化済みの本文にブラックリストのパターンが含まれるか
    pub fn is_blacklisted(&self, lowercase_body: &str) -> bool {
        self.kind == RuleKind::Blacklist && lowercase_body.contains(&self.pattern)
    }

    /// 本文中のマッチ位置をすべて返す（大文字小文字は区別しない）
    pub fn find_all(&self, body: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(regex) => regex.find_iter(body).map(|m| (m.start(), m.end())).collect(),
            None => Vec::new(),
        }
    }

    /// ユーザー名がこのルールの名前と一致するか
    pub fn names(&self, login: &str) -> bool {
        self.pattern == login
    }
}

/// 大文字小文字を区別しない正規表現を作る
fn case_insensitive(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("(?i){}", pattern)).ok()
}

/// ルールの集合
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    wildcard: bool,
}

impl RuleSet {
    pub fn dictionary<S: AsRef<str>>(entries: &[S]) -> Self {
        Self::from_rules(entries.iter().map(|e| Rule::dictionary(e.as_ref())).collect())
    }

    pub fn users<S: AsRef<str>>(entries: &[S]) -> Self {
        Self::from_rules(entries.iter().map(|e| Rule::user(e.as_ref())).collect())
    }

    fn from_rules(rules: Vec<Rule>) -> Self {
        let wildcard = rules.iter().any(|r| r.kind == RuleKind::Wildcard);
        Self { rules, wildcard }
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    /// ワイルドカード以外のルールがあるか
    pub fn is_active(&self) -> bool {
        self.rules.iter().any(|r| r.kind != RuleKind::Wildcard)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}
