// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use rand::distr::Alphanumeric;
use rand::Rng;

/// 短码长度
pub const SHORT_CODE_LEN: usize = 8;

/// 生成随机的字母数字短码
pub fn generate_short_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_CODE_LEN)
        .map(char::from)
        .collect()
}
