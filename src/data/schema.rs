//! Canonical Column Vocabulary
//! Column names, numeric-signal tokens and the header renaming rules for PLE result sheets.

use serde::Serialize;

/// Substring that marks a sheet as using the division schema.
pub const DIVISION_MARKER: &str = "Div";

/// Header substrings that mark a column as numeric.
pub const NUMERIC_TOKENS: [&str; 9] = [
    "Div",
    "Boys",
    "Girls",
    "_M",
    "_F",
    "Total",
    "Registered",
    "Pass",
    "Rate",
];

pub const DISTRICT: &str = "District";
pub const YEAR: &str = "Year";
pub const SUB_REGION: &str = "Sub Region";
pub const ZONE: &str = "Zone";

pub const REGISTERED_TOTAL: &str = "Registered - Total";
pub const REGISTERED_BOYS: &str = "Registered - Boys";
pub const REGISTERED_GIRLS: &str = "Registered - Girls";
pub const PASSED_TOTAL: &str = "Passed_Total";
pub const FAILED_TOTAL: &str = "Failed_Total";
pub const PASS_RATE: &str = "Pass_Rate";
pub const EXCELLENCE_RATE: &str = "Excellence_Rate";
pub const STRONG_PERFORMANCE_RATE: &str = "Strong_Performance_Rate";
pub const BOYS_PASS_RATE: &str = "Boys_Pass_Rate";
pub const GIRLS_PASS_RATE: &str = "Girls_Pass_Rate";
pub const GENDER_GAP: &str = "Gender_Gap";

/// Performance band assigned to an examinee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Division {
    One,
    Two,
    Three,
    Four,
    /// Ungraded (failed).
    U,
    /// Registered but did not sit.
    X,
}

impl Division {
    /// Rule order: first division whose token appears in a header wins.
    pub const ALL: [Division; 6] = [
        Division::One,
        Division::Two,
        Division::Three,
        Division::Four,
        Division::U,
        Division::X,
    ];

    /// Divisions that count as a pass.
    pub const PASSING: [Division; 4] = [
        Division::One,
        Division::Two,
        Division::Three,
        Division::Four,
    ];

    pub const FAILING: [Division; 2] = [Division::U, Division::X];

    pub fn label(self) -> &'static str {
        match self {
            Division::One => "1",
            Division::Two => "2",
            Division::Three => "3",
            Division::Four => "4",
            Division::U => "U",
            Division::X => "X",
        }
    }

    /// Short header spelling, e.g. `Div1`.
    fn short_token(self) -> &'static str {
        match self {
            Division::One => "Div1",
            Division::Two => "Div2",
            Division::Three => "Div3",
            Division::Four => "Div4",
            Division::U => "DivU",
            Division::X => "DivX",
        }
    }

    /// Long header spelling, e.g. `Division 1`.
    pub fn name(self) -> &'static str {
        match self {
            Division::One => "Division 1",
            Division::Two => "Division 2",
            Division::Three => "Division 3",
            Division::Four => "Division 4",
            Division::U => "Division U",
            Division::X => "Division X",
        }
    }

    /// Whether a raw header refers to this division.
    pub fn is_named_in(self, header: &str) -> bool {
        header.contains(self.short_token()) || header.contains(self.name())
    }

    /// Canonical column name, e.g. `Division 1 - Boys`.
    pub fn column(self, part: Part) -> String {
        format!("{} - {}", self.name(), part.suffix())
    }

    /// Parse a user-supplied division label (`1`, `U`, `Division 4`, `div x`).
    pub fn parse(text: &str) -> Option<Division> {
        let trimmed = text.trim();
        let label = trimmed
            .strip_prefix("Division")
            .or_else(|| trimmed.strip_prefix("division"))
            .or_else(|| trimmed.strip_prefix("Div"))
            .or_else(|| trimmed.strip_prefix("div"))
            .unwrap_or(trimmed)
            .trim();

        Division::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(label))
    }
}

/// Which head-count a division column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Part {
    Boys,
    Girls,
    Total,
}

impl Part {
    pub const ALL: [Part; 3] = [Part::Boys, Part::Girls, Part::Total];

    pub fn suffix(self) -> &'static str {
        match self {
            Part::Boys => "Boys",
            Part::Girls => "Girls",
            Part::Total => "Total",
        }
    }

    /// Gender markers are checked before `Total`.
    pub fn detect(header: &str) -> Option<Part> {
        if header.contains("_M") || header.contains("Boys") {
            Some(Part::Boys)
        } else if header.contains("_F") || header.contains("Girls") {
            Some(Part::Girls)
        } else if header.contains("Total") {
            Some(Part::Total)
        } else {
            None
        }
    }

    /// `Registered - {part}` column name.
    pub fn registered_column(self) -> &'static str {
        match self {
            Part::Boys => REGISTERED_BOYS,
            Part::Girls => REGISTERED_GIRLS,
            Part::Total => REGISTERED_TOTAL,
        }
    }
}

/// Whether a column's cells should be coerced to numbers.
pub fn is_numeric_column(name: &str) -> bool {
    NUMERIC_TOKENS.iter().any(|token| name.contains(token))
}

/// A sheet uses the division schema if any header contains `Div`.
pub fn has_division_schema<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    names.into_iter().any(|name| name.contains(DIVISION_MARKER))
}

/// Canonical name for a raw header, or `None` if no rule applies.
///
/// Division rules run first (1, 2, 3, 4, U, X); the first division whose token
/// appears claims the header, so a header never satisfies two division rules.
/// A header naming a division but no gender or total falls through to the
/// area rule.
pub fn canonical_name(header: &str) -> Option<String> {
    let division_match = Division::ALL
        .into_iter()
        .find(|division| division.is_named_in(header))
        .and_then(|division| Part::detect(header).map(|part| division.column(part)));

    if division_match.is_some() {
        return division_match;
    }

    if header.contains("Area") && !header.contains(DISTRICT) {
        return Some(DISTRICT.to_string());
    }

    None
}
