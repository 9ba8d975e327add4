use glob::Pattern;

/// Which worksheet of a workbook to load.
#[derive(Clone, Debug, Default)]
pub(crate) struct Criteria {
    /// Only sheets whose name matches are considered.
    pub(crate) sheet_name_pattern: Option<Pattern>,
}

impl Criteria {
    pub(crate) fn new(sheet_name_pattern: Option<Pattern>) -> Self {
        Self { sheet_name_pattern }
    }

    /// True when no pattern is set or the name matches it.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        self.sheet_name_pattern
            .as_ref()
            .map(|pattern| pattern.matches(sheet_name))
            .unwrap_or(true)
    }
}
