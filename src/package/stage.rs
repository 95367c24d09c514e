use strum::{Display, EnumIter, FromRepr};

/// How far decoding of a package has progressed.
///
/// Stages are cumulative and strictly ordered; a package only ever moves forward, one
/// stage at a time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, FromRepr,
)]
#[repr(u8)]
pub enum Stage {
    /// Header, name, import and export tables are decoded; object bodies are not
    Deserialized,
    /// Class, super and outer references are resolved
    Linked,
    /// Tagged property lists of all exports are decoded
    PropertiesParsed,
    /// Trailing bulk payloads are located
    BulkDataParsed,
}

impl Stage {
    /// Returns the stage following this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Deserialized => Some(Stage::Linked),
            Stage::Linked => Some(Stage::PropertiesParsed),
            Stage::PropertiesParsed => Some(Stage::BulkDataParsed),
            Stage::BulkDataParsed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn ordered_and_sequential() {
        let stages: Vec<Stage> = Stage::iter().collect();
        assert!(stages.windows(2).all(|pair| pair[0] < pair[1]));
        for pair in stages.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Stage::BulkDataParsed.next(), None);
        assert_eq!(Stage::from_repr(Stage::Linked as u8), Some(Stage::Linked));
    }
}
