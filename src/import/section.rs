use crate::import::rows::PreviewRow;
use bigdecimal::BigDecimal;
use bigdecimal::Zero;

/// A priced item ready to be stored.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub description: String,
    pub code: Option<String>,
    pub unit_price: BigDecimal,
    /// Most recent section heading at or above this row
    pub section_name: Option<String>,
}

/// Role of a preview row once classified.
#[derive(Debug, PartialEq)]
enum Step {
    /// A heading: no code, a description and no price (or a zero price).
    Section(String),
    Entry {
        code: Option<String>,
        description: String,
        unit_price: BigDecimal,
    },
    Skip,
}

fn classify(row: PreviewRow) -> Step {
    let code = row.code.map(|code| code.trim().to_owned()).filter(|code| !code.is_empty());
    let description = row
        .description
        .map(|description| description.trim().to_owned())
        .filter(|description| !description.is_empty());
    match (code, description, row.price) {
        (None, Some(description), price) if price.as_ref().map_or(true, Zero::is_zero) => Step::Section(description),
        (_, None, _) => Step::Skip,
        (code, Some(description), price) => Step::Entry {
            code,
            description,
            unit_price: price.unwrap_or_else(BigDecimal::zero),
        },
    }
}

/// Advances the current section over one row, returning the new section and
/// the entry the row produces, if any.
pub fn advance(current_section: Option<String>, row: PreviewRow) -> (Option<String>, Option<CatalogEntry>) {
    match classify(row) {
        Step::Section(name) => (Some(name), None),
        Step::Skip => (current_section, None),
        Step::Entry {
            code,
            description,
            unit_price,
        } => {
            let entry = CatalogEntry {
                description,
                code,
                unit_price,
                section_name: current_section.clone(),
            };
            (current_section, Some(entry))
        }
    }
}

/// Turns preview rows into catalog entries in a single pass, tagging each
/// entry with the section heading that precedes it.
pub fn map_sections<I: IntoIterator<Item = PreviewRow>>(rows: I) -> Vec<CatalogEntry> {
    let (_, entries) = rows
        .into_iter()
        .fold((None, Vec::new()), |(section, mut entries), row| {
            let (section, entry) = advance(section, row);
            entries.extend(entry);
            (section, entries)
        });
    entries
}
