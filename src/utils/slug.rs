// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use deunicode::deunicode;
use regex::Regex;
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile slug regex"));

/// slug 的最大长度
pub const MAX_SLUG_LEN: usize = 80;

/// 把标题转换为 URL slug
///
/// 先音译为 ASCII，再把非字母数字字符折叠为单个连字符。
/// 结果为空时返回 `article`。
pub fn slugify(title: &str) -> String {
    let ascii = deunicode(title).to_lowercase();
    let slug = NON_ALNUM.replace_all(&ascii, "-");
    let mut slug = slug.trim_matches('-').to_string();

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        // Cut back to the last full word
        if let Some(idx) = slug.rfind('-') {
            slug.truncate(idx);
        }
        slug = slug.trim_matches('-').to_string();
    }

    if slug.is_empty() {
        "article".to_string()
    } else {
        slug
    }
}
