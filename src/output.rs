//! 検索結果の端末出力
//!
//! 結果は標準出力、進捗インジケータとエラーは標準エラー出力に書く。

use std::cell::Cell;
use std::io::Write;

use crate::highlight::{self, HighlightStyle, MatchSpan};
use crate::twitch::ChatMessage;
use crate::util::{format_created, vod_link};

/// 名前欄の幅（": "の分を除く）
const MAX_NAME_LEN: usize = 20;

/// リンク欄の幅
const LINK_WIDTH: usize = "https://twitch.tv/videos/".len() + 23;

/// 進捗インジケータの最大長
const INDICATOR_MAX: usize = 20;

/// 出力設定と進捗インジケータの状態
#[derive(Debug)]
pub struct Printer {
    plain: bool,
    print_links: bool,
    indicator_len: Cell<usize>,
}

impl Printer {
    pub fn new(plain: bool, print_links: bool) -> Self {
        Self {
            plain,
            print_links,
            indicator_len: Cell::new(0),
        }
    }

    /// 通知メッセージ
    pub fn notice(&self, text: &str) {
        self.clear_indicator();
        println!("{}", highlight::paint(text, HighlightStyle::Notice, self.plain));
    }

    /// エラーメッセージ
    pub fn error(&self, text: &str) {
        self.clear_indicator();
        eprintln!("{}", text);
    }

    /// マッチしたメッセージを1行出力
    pub fn message(&self, video_id: &str, message: &ChatMessage, spans: &[MatchSpan]) {
        self.clear_indicator();
        println!("{}", self.format_message(video_id, message, spans));
    }

    fn format_message(&self, video_id: &str, message: &ChatMessage, spans: &[MatchSpan]) -> String {
        let mut line = String::new();

        if self.print_links {
            let link = vod_link(video_id, message.stream_timestamp);
            let padding = LINK_WIDTH.saturating_sub(link.len());
            line.push_str(&highlight::paint(&link, HighlightStyle::Link, self.plain));
            line.push_str(&" ".repeat(padding));
        }

        let name = format!("{}: ", message.user.name);
        line.push_str(&format!(
            "[{}] {:<width$}",
            format_created(&message.created),
            name,
            width = MAX_NAME_LEN + 4
        ));
        line.push_str(&highlight::render(&message.message, spans, self.plain));
        line
    }

    /// ページ1つ分の進捗
    pub fn tick(&self) {
        let len = self.indicator_len.get();
        let mut stderr = std::io::stderr();
        if len >= INDICATOR_MAX {
            let _ = write!(stderr, "\r{}\r", " ".repeat(INDICATOR_MAX));
            self.indicator_len.set(0);
        }
        let _ = write!(stderr, "░");
        let _ = stderr.flush();
        self.indicator_len.set(self.indicator_len.get() + 1);
    }

    fn clear_indicator(&self) {
        if self.indicator_len.get() > 0 {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r{}\r", " ".repeat(INDICATOR_MAX));
            let _ = stderr.flush();
            self.indicator_len.set(0);
        }
    }
}
