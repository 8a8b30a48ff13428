//! Chromosome label canonicalization.
//!
//! Summary statistics and reference databases spell chromosomes in many ways
//! (`1`, `chr1`, `CHR1`, `NC_000001.11`, `X`, `chrMT`, ...). Every accepted
//! spelling maps to a small integer code so both streams can be ordered and
//! compared with a single integer comparison:
//!
//! | code  | chromosome          |
//! |-------|---------------------|
//! | 1-22  | autosomes           |
//! | 23    | X                   |
//! | 24    | Y                   |
//! | 25    | mitochondrial (MT)  |

pub const CHR_X: u8 = 23;
pub const CHR_Y: u8 = 24;
pub const CHR_MT: u8 = 25;
pub const MAX_CHROMOSOME_CODE: u8 = CHR_MT;

const REFSEQ_PREFIX: &[u8] = b"NC_";
const REFSEQ_DIGITS: usize = 6;
const REFSEQ_MT_ACCESSION: u32 = 12920;

/// Canonical chromosome code in `1..=25`, or `None` when the token is not
/// part of the accepted grammar.
pub fn canonical_chromosome(token: &str) -> Option<u8> {
    let token = token.trim().as_bytes();
    let token = strip_prefix_ignore_case(token, b"CHR").unwrap_or(token);
    if token.is_empty() {
        return None;
    }

    if let Some(accession) = strip_prefix_ignore_case(token, REFSEQ_PREFIX) {
        return refseq_code(accession);
    }

    if token.eq_ignore_ascii_case(b"X") {
        return Some(CHR_X);
    }
    if token.eq_ignore_ascii_case(b"Y") {
        return Some(CHR_Y);
    }
    if token.eq_ignore_ascii_case(b"M")
        || token.eq_ignore_ascii_case(b"MT")
        || token.eq_ignore_ascii_case(b"MTDNA")
    {
        return Some(CHR_MT);
    }

    let code = parse_digits(token)?;
    (1..=u32::from(MAX_CHROMOSOME_CODE))
        .contains(&code)
        .then_some(code as u8)
}

/// Maps the accession body of `NC_xxxxxx[.v]` to a chromosome code.
fn refseq_code(accession: &[u8]) -> Option<u8> {
    if accession.len() < REFSEQ_DIGITS {
        return None;
    }
    let (digits, version) = accession.split_at(REFSEQ_DIGITS);
    if !version.is_empty() && version[0] != b'.' {
        return None;
    }
    match parse_digits(digits)? {
        n @ 1..=24 => Some(n as u8),
        REFSEQ_MT_ACCESSION => Some(CHR_MT),
        _ => None,
    }
}

/// Strict unsigned decimal parse: digits only, no sign, no whitespace.
fn parse_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 9 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0')),
    )
}

fn strip_prefix_ignore_case<'a>(bytes: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    if bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&bytes[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_prefixed_autosomes() {
        assert_eq!(canonical_chromosome("1"), Some(1));
        assert_eq!(canonical_chromosome("22"), Some(22));
        assert_eq!(canonical_chromosome("chr7"), Some(7));
        assert_eq!(canonical_chromosome("CHR7"), Some(7));
        assert_eq!(canonical_chromosome("Chr12"), Some(12));
        assert_eq!(canonical_chromosome("01"), Some(1));
    }

    #[test]
    fn test_sex_and_mitochondrial_aliases() {
        assert_eq!(canonical_chromosome("X"), Some(CHR_X));
        assert_eq!(canonical_chromosome("chrx"), Some(CHR_X));
        assert_eq!(canonical_chromosome("Y"), Some(CHR_Y));
        assert_eq!(canonical_chromosome("M"), Some(CHR_MT));
        assert_eq!(canonical_chromosome("chrM"), Some(CHR_MT));
        assert_eq!(canonical_chromosome("MT"), Some(CHR_MT));
        assert_eq!(canonical_chromosome("mtDNA"), Some(CHR_MT));
        assert_eq!(canonical_chromosome("23"), Some(CHR_X));
        assert_eq!(canonical_chromosome("25"), Some(CHR_MT));
    }

    #[test]
    fn test_refseq_accessions() {
        assert_eq!(canonical_chromosome("NC_000001.11"), Some(1));
        assert_eq!(canonical_chromosome("nc_000022.11"), Some(22));
        assert_eq!(canonical_chromosome("NC_000023.11"), Some(CHR_X));
        assert_eq!(canonical_chromosome("NC_000024.10"), Some(CHR_Y));
        assert_eq!(canonical_chromosome("NC_012920.1"), Some(CHR_MT));
        assert_eq!(canonical_chromosome("NC_000007"), Some(7));
    }

    #[test]
    fn test_rejects_tokens_outside_grammar() {
        for token in [
            "", "chr", "0", "26", "-1", "+1", "1.0", "1a", "chrUn", "GL000192.1", "XY",
            "NC_000025.1", "NC_00001.1", "NC_000001x", "NC_012921.1", "chr 1",
        ] {
            assert_eq!(canonical_chromosome(token), None, "token {token:?}");
        }
    }

    #[test]
    fn test_every_code_is_reachable() {
        for code in 1..=MAX_CHROMOSOME_CODE {
            let numeric = code.to_string();
            assert_eq!(canonical_chromosome(&numeric), Some(code));
            assert_eq!(canonical_chromosome(&format!("chr{numeric}")), Some(code));
        }
    }
}
