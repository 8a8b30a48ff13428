use crate::error::RsidxResult;
use log;
use std::{
    fmt::{Binary, Display},
    sync::Once,
};

pub type Result<T> = RsidxResult<T>;

#[allow(unused)]
static INIT_LOG: Once = Once::new();

#[allow(unused)]
pub fn init_logger() {
    INIT_LOG.call_once(|| {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .is_test(true)
            .try_init();
    });
}

pub fn handle_error_and_exit(err: impl Display) -> ! {
    log::error!("{err}");
    std::process::exit(1);
}

/// 64-bit FNV-1a over raw bytes. Stable across platforms and runs.
pub fn stable_hash64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Removes a trailing `\n`, `\r\n` or lone `\r` in place.
pub fn trim_line_ending(line: &mut Vec<u8>) {
    while let Some(b'\n' | b'\r') = line.last() {
        line.pop();
    }
}

pub fn format_number_with_commas<T>(n: T) -> String
where
    T: Display + Binary,
{
    let s = n.to_string();
    let (sign, digits) = s.strip_prefix('-').map_or(("", s.as_str()), |d| ("-", d));

    if let 0..=3 = digits.len() {
        return s;
    }

    let mut result = String::with_capacity(digits.len() + (digits.len() - 1) / 3 + sign.len());
    for (digit_count, c) in digits.chars().rev().enumerate() {
        if digit_count > 0 && digit_count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result = result.chars().rev().collect();
    if !sign.is_empty() {
        result.insert_str(0, sign);
    }

    result
}
