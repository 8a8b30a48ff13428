use std::fmt;

/// Semantic columns of a summary statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Identifier,
    Chromosome,
    Position,
    Allele1,
    Allele2,
    PValue,
    Freq,
    Beta,
    Se,
    SampleSize,
}

impl Field {
    pub const COUNT: usize = 10;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Identifier,
        Field::Chromosome,
        Field::Position,
        Field::Allele1,
        Field::Allele2,
        Field::PValue,
        Field::Freq,
        Field::Beta,
        Field::Se,
        Field::SampleSize,
    ];

    /// Numeric fields screened by QC, in check order.
    pub const NUMERIC: [Field; 5] = [
        Field::Beta,
        Field::Se,
        Field::Freq,
        Field::PValue,
        Field::SampleSize,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Identifier => "identifier",
            Field::Chromosome => "chromosome",
            Field::Position => "position",
            Field::Allele1 => "allele 1",
            Field::Allele2 => "allele 2",
            Field::PValue => "p-value",
            Field::Freq => "frequency",
            Field::Beta => "effect size",
            Field::Se => "standard error",
            Field::SampleSize => "sample size",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Zero-based header position of each [`Field`], `None` when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; Field::COUNT],
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, column: usize) -> Self {
        self.set(field, Some(column));
        self
    }

    pub fn set(&mut self, field: Field, column: Option<usize>) {
        self.indices[field.index()] = column;
    }

    #[inline]
    pub fn get(&self, field: Field) -> Option<usize> {
        self.indices[field.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_indices_are_dense() {
        for (position, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), position);
        }
    }

    #[test]
    fn test_column_map_set_and_get() {
        let mut map = ColumnMap::new().with(Field::Chromosome, 1).with(Field::PValue, 5);
        assert_eq!(map.get(Field::Chromosome), Some(1));
        assert_eq!(map.get(Field::PValue), Some(5));
        assert_eq!(map.get(Field::Freq), None);
        map.set(Field::PValue, None);
        assert_eq!(map.get(Field::PValue), None);
    }
}
