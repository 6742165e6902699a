//! ハイライト範囲の整理と端末出力
//!
//! マッチ結果の範囲は重なり合うことがあるため、表示前に
//! 昇順かつ重なりのない範囲列に整える。

use colored::{ColoredString, Colorize};

/// ハイライトの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStyle {
    /// 辞書ルールにマッチした部分
    Match,
    /// VODへのリンク
    Link,
    /// 進行状況などの通知
    Notice,
}

impl HighlightStyle {
    fn paint(self, text: &str) -> ColoredString {
        match self {
            HighlightStyle::Match => text.truecolor(120, 192, 90),
            HighlightStyle::Link => text.truecolor(122, 171, 249).underline(),
            HighlightStyle::Notice => text.truecolor(160, 128, 0),
        }
    }
}

/// 本文中のハイライト範囲（UTF-8のバイト位置、endは含まない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub style: HighlightStyle,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize, style: HighlightStyle) -> Self {
        Self { start, end, style }
    }
}

/// 範囲を昇順・重なりなしに整える
///
/// 1. 範囲を`[0, text.len()]`に収め、文字境界に揃える
/// 2. 開始位置で安定ソート
/// 3. 直前の範囲と重なる場合は開始位置を直前の終端まで後ろにずらし、
///    終端は直前の終端以上に伸ばす
/// 4. 空になった範囲を取り除く
pub fn resolve(text: &str, spans: &[MatchSpan]) -> Vec<MatchSpan> {
    let mut prepared: Vec<MatchSpan> = spans
        .iter()
        .map(|span| MatchSpan {
            start: floor_char_boundary(text, span.start),
            end: ceil_char_boundary(text, span.end),
            style: span.style,
        })
        .collect();

    // sort_byは安定ソート
    prepared.sort_by(|a, b| a.start.cmp(&b.start));

    for i in 1..prepared.len() {
        let prev_end = prepared[i - 1].end;
        let current = &mut prepared[i];
        if prev_end > current.start {
            current.start = prev_end;
        }
        current.end = current.end.max(prev_end);
    }

    prepared.retain(|span| span.start < span.end);
    prepared
}

/// ハイライトを適用した文字列を生成する
///
/// `plain`の場合はエスケープシーケンスを付けずにそのまま返す
pub fn render(text: &str, spans: &[MatchSpan], plain: bool) -> String {
    if plain {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for span in resolve(text, spans) {
        out.push_str(&text[pos..span.start]);
        out.push_str(&span.style.paint(&text[span.start..span.end]).to_string());
        pos = span.end;
    }
    out.push_str(&text[pos..]);
    out
}

/// 文字列全体を1つのスタイルで表示する
pub fn paint(text: &str, style: HighlightStyle, plain: bool) -> String {
    render(text, &[MatchSpan::new(0, text.len(), style)], plain)
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
