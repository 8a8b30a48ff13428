//! Orientation-invariant allele pair keys.
//!
//! Two allele pairs describe the same single-nucleotide variant when they are
//! equal as unordered pairs, or when one is the Watson-Crick complement of the
//! other (the study reported the opposite strand). [`AlleleKey::new`] folds all
//! of these spellings onto one key.
//!
//! Multi-base alleles are keyed on the unordered pair only; strand flips of
//! indels are not normalized.

use crate::utils::util::stable_hash64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlleleType {
    Snp,
    Indel,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlleleKey {
    pub allele_type: AlleleType,
    pub key: u64,
}

impl AlleleKey {
    pub const OTHER: AlleleKey = AlleleKey {
        allele_type: AlleleType::Other,
        key: 0,
    };

    pub fn new(a1: &str, a2: &str) -> Self {
        let (a1, a2) = (a1.as_bytes(), a2.as_bytes());
        if a1.len() == 1 && a2.len() == 1 {
            if let (Some(x), Some(y)) = (nucleotide_code(a1[0]), nucleotide_code(a2[0])) {
                return Self {
                    allele_type: AlleleType::Snp,
                    key: snp_key(x, y),
                };
            }
        }

        if is_nucleotide_string(a1) && is_nucleotide_string(a2) {
            return Self {
                allele_type: AlleleType::Indel,
                key: indel_key(a1, a2),
            };
        }

        Self::OTHER
    }

    /// Whether this key may take part in matching at all.
    #[inline]
    pub fn is_matchable(&self) -> bool {
        self.allele_type != AlleleType::Other
    }

    /// Match equality: same type and key, and never true for [`AlleleType::Other`].
    #[inline]
    pub fn matches(&self, other: &AlleleKey) -> bool {
        self.is_matchable() && self == other
    }
}

#[inline]
fn nucleotide_code(base: u8) -> Option<u8> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

fn is_nucleotide_string(allele: &[u8]) -> bool {
    !allele.is_empty() && allele.iter().all(|&b| nucleotide_code(b).is_some())
}

#[inline]
fn pack_pair(x: u8, y: u8) -> u64 {
    let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
    (u64::from(lo) << 2) | u64::from(hi)
}

/// Complement of a 2-bit code: A<->T, C<->G.
#[inline]
fn complement(code: u8) -> u8 {
    3 - code
}

fn snp_key(x: u8, y: u8) -> u64 {
    let direct = pack_pair(x, y);
    let flipped = pack_pair(complement(x), complement(y));
    direct.min(flipped)
}

fn indel_key(a1: &[u8], a2: &[u8]) -> u64 {
    let a1 = a1.to_ascii_uppercase();
    let a2 = a2.to_ascii_uppercase();
    let (low, high) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
    stable_hash64(&low) ^ (stable_hash64(&high) << 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

    fn comp(base: char) -> char {
        match base {
            'A' => 'T',
            'C' => 'G',
            'G' => 'C',
            'T' => 'A',
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_snp_key_is_order_and_strand_invariant() {
        for a1 in BASES {
            for a2 in BASES {
                let key = AlleleKey::new(&a1.to_string(), &a2.to_string());
                assert_eq!(key.allele_type, AlleleType::Snp);

                let swapped = AlleleKey::new(&a2.to_string(), &a1.to_string());
                assert_eq!(key, swapped, "{a1}/{a2} vs {a2}/{a1}");

                let reverse_complement =
                    AlleleKey::new(&comp(a2).to_string(), &comp(a1).to_string());
                assert_eq!(key, reverse_complement, "{a1}/{a2} reverse complement");
            }
        }
    }

    #[test]
    fn test_snp_keys_distinguish_unrelated_pairs() {
        let ag = AlleleKey::new("A", "G");
        let ac = AlleleKey::new("A", "C");
        let at = AlleleKey::new("A", "T");
        let cg = AlleleKey::new("C", "G");
        assert_ne!(ag, ac);
        assert_ne!(ag, at);
        assert_ne!(at, cg);
        // A/G flips to T/C; A/C flips to T/G.
        assert_eq!(ag, AlleleKey::new("T", "C"));
        assert_eq!(ac, AlleleKey::new("G", "T"));
    }

    #[test]
    fn test_snp_key_is_case_insensitive() {
        assert_eq!(AlleleKey::new("a", "g"), AlleleKey::new("A", "G"));
        assert_eq!(AlleleKey::new("t", "C"), AlleleKey::new("A", "G"));
    }

    #[test]
    fn test_indel_key_is_order_invariant_but_not_strand_flipped() {
        let key = AlleleKey::new("AT", "A");
        assert_eq!(key.allele_type, AlleleType::Indel);
        assert_eq!(key, AlleleKey::new("A", "AT"));
        assert_eq!(key, AlleleKey::new("at", "a"));
        assert_ne!(key, AlleleKey::new("TA", "T"));
        assert_ne!(key, AlleleKey::new("AG", "A"));
    }

    #[test]
    fn test_other_alleles_never_match() {
        for (a1, a2) in [("A", "N"), ("-", "A"), ("", "A"), ("I", "D"), ("<DEL>", "A")] {
            let key = AlleleKey::new(a1, a2);
            assert_eq!(key, AlleleKey::OTHER);
            assert!(!key.is_matchable());
            assert!(!key.matches(&AlleleKey::new(a1, a2)));
        }
        assert!(AlleleKey::new("A", "G").matches(&AlleleKey::new("C", "T")));
    }
}
