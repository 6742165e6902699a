//! コマンドライン引数からのルールリスト読み込み
//!
//! - `a,b,c` 形式のカンマ区切り（`\,`でカンマ自体を表す）
//! - `rules.json` 形式のJSONファイル（文字列の配列）
//!
//! どちらも全体を引用符で囲んでもよい。

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesetError {
    #[error("The file \"{}\" either couldn't be opened or doesn't contain a valid list.", .0.display())]
    InvalidFile(PathBuf),

    #[error("The list is empty")]
    Empty,
}

impl From<RulesetError> for String {
    fn from(err: RulesetError) -> String {
        err.to_string()
    }
}

/// 引数を解釈してルール文字列のリストを返す
pub async fn load_list(arg: &str) -> Result<Vec<String>, RulesetError> {
    let arg = strip_quotes(arg);
    if arg.is_empty() {
        return Err(RulesetError::Empty);
    }

    if arg.ends_with(".json") {
        return read_json_list(PathBuf::from(arg)).await;
    }

    let list = split_comma_list(arg);
    if list.is_empty() {
        return Err(RulesetError::Empty);
    }
    Ok(list)
}

async fn read_json_list(path: PathBuf) -> Result<Vec<String>, RulesetError> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Failed to read {}: {}", path.display(), e);
            return Err(RulesetError::InvalidFile(path));
        }
    };

    match serde_json::from_slice::<Vec<String>>(&bytes) {
        Ok(list) => {
            log::debug!("Loaded {} rules from {}", list.len(), path.display());
            Ok(list)
        }
        Err(e) => {
            log::debug!("Invalid rule list in {}: {}", path.display(), e);
            Err(RulesetError::InvalidFile(path))
        }
    }
}

/// 全体を囲む引用符を1組だけ取り除く
fn strip_quotes(arg: &str) -> &str {
    let bytes = arg.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &arg[1..arg.len() - 1];
        }
    }
    arg
}

/// カンマで分割する（空要素は捨てる）
///
/// `\,` はカンマとして扱い、それ以外のエスケープはそのまま残す
fn split_comma_list(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = list.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(',') => current.push(','),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            ',' => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }
    items
}
