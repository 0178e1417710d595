use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordering applied to the refined result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    Recommended,
    #[serde(rename = "Price_Low_High")]
    PriceLowHigh,
    #[serde(rename = "Price_High_Low")]
    PriceHighLow,
    Newest,
    Bedrooms,
    Bathrooms,
    #[serde(rename = "Square_Feet")]
    SquareFeet,
    #[serde(rename = "Lot_Size")]
    LotSize,
}

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        SortKey::Recommended,
        SortKey::PriceLowHigh,
        SortKey::PriceHighLow,
        SortKey::Newest,
        SortKey::Bedrooms,
        SortKey::Bathrooms,
        SortKey::SquareFeet,
        SortKey::LotSize,
    ];

    /// Wire name, e.g. `Price_High_Low`.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Recommended => "Recommended",
            SortKey::PriceLowHigh => "Price_Low_High",
            SortKey::PriceHighLow => "Price_High_Low",
            SortKey::Newest => "Newest",
            SortKey::Bedrooms => "Bedrooms",
            SortKey::Bathrooms => "Bathrooms",
            SortKey::SquareFeet => "Square_Feet",
            SortKey::LotSize => "Lot_Size",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Recommended => "Recommended",
            SortKey::PriceLowHigh => "Price (low to high)",
            SortKey::PriceHighLow => "Price (high to low)",
            SortKey::Newest => "Newest",
            SortKey::Bedrooms => "Most bedrooms",
            SortKey::Bathrooms => "Most bathrooms",
            SortKey::SquareFeet => "Largest sq ft",
            SortKey::LotSize => "Largest lot",
        }
    }

    pub fn parse(value: &str) -> Option<SortKey> {
        let value = value.trim();
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(value))
    }

    /// Step through `ALL`, wrapping at both ends.
    pub fn cycled(self, step: isize) -> SortKey {
        let len = SortKey::ALL.len() as isize;
        let idx = SortKey::ALL.iter().position(|k| *k == self).unwrap_or(0) as isize;
        SortKey::ALL[(idx + step).rem_euclid(len) as usize]
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single source of truth for one search session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRecord {
    pub location: String,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub beds_min: Option<u32>,
    pub beds_max: Option<u32>,
    pub baths_min: Option<f32>,
    pub baths_max: Option<f32>,
    pub sqft_min: Option<u32>,
    pub sqft_max: Option<u32>,
    pub home_type: BTreeSet<String>,
    pub days_on_listing: Option<u32>,
    pub has_pool: bool,
    pub has_garage: bool,
    #[serde(rename = "hasAC")]
    pub has_ac: bool,
    pub lot_min: Option<u32>,
    pub lot_max: Option<u32>,
    pub built_year_min: Option<u16>,
    pub built_year_max: Option<u16>,
    pub hoa_max: Option<u32>,
    pub keywords: Option<String>,
    pub sort: SortKey,
}

/// One independently settable search dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Location,
    MinPrice,
    MaxPrice,
    BedsMin,
    BedsMax,
    BathsMin,
    BathsMax,
    SqftMin,
    SqftMax,
    HomeType,
    DaysOnListing,
    HasPool,
    HasGarage,
    HasAc,
    LotMin,
    LotMax,
    BuiltYearMin,
    BuiltYearMax,
    HoaMax,
    Keywords,
    Sort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    Text,
    Number,
    Flag,
    Set,
    Sort,
}

impl Facet {
    /// Form order, shared by both presentations.
    pub const ALL: [Facet; 21] = [
        Facet::Location,
        Facet::MinPrice,
        Facet::MaxPrice,
        Facet::BedsMin,
        Facet::BathsMin,
        Facet::HomeType,
        Facet::Sort,
        Facet::BedsMax,
        Facet::BathsMax,
        Facet::SqftMin,
        Facet::SqftMax,
        Facet::DaysOnListing,
        Facet::HasPool,
        Facet::HasGarage,
        Facet::HasAc,
        Facet::LotMin,
        Facet::LotMax,
        Facet::BuiltYearMin,
        Facet::BuiltYearMax,
        Facet::HoaMax,
        Facet::Keywords,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Facet::Location => "Location",
            Facet::MinPrice => "Min price",
            Facet::MaxPrice => "Max price",
            Facet::BedsMin => "Beds",
            Facet::BedsMax => "Max beds",
            Facet::BathsMin => "Baths",
            Facet::BathsMax => "Max baths",
            Facet::SqftMin => "Min sq ft",
            Facet::SqftMax => "Max sq ft",
            Facet::HomeType => "Home type",
            Facet::DaysOnListing => "Days listed",
            Facet::HasPool => "Pool",
            Facet::HasGarage => "Garage",
            Facet::HasAc => "A/C",
            Facet::LotMin => "Min lot",
            Facet::LotMax => "Max lot",
            Facet::BuiltYearMin => "Built after",
            Facet::BuiltYearMax => "Built before",
            Facet::HoaMax => "Max HOA",
            Facet::Keywords => "Keywords",
            Facet::Sort => "Sort",
        }
    }

    pub fn kind(self) -> FacetKind {
        match self {
            Facet::Location | Facet::Keywords => FacetKind::Text,
            Facet::HasPool | Facet::HasGarage | Facet::HasAc => FacetKind::Flag,
            Facet::HomeType => FacetKind::Set,
            Facet::Sort => FacetKind::Sort,
            Facet::MinPrice
            | Facet::MaxPrice
            | Facet::BedsMin
            | Facet::BedsMax
            | Facet::BathsMin
            | Facet::BathsMax
            | Facet::SqftMin
            | Facet::SqftMax
            | Facet::DaysOnListing
            | Facet::LotMin
            | Facet::LotMax
            | Facet::BuiltYearMin
            | Facet::BuiltYearMax
            | Facet::HoaMax => FacetKind::Number,
        }
    }

    /// Primary facets sit on the inline bar; the rest live behind "More filters".
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            Facet::Location
                | Facet::MinPrice
                | Facet::MaxPrice
                | Facet::BedsMin
                | Facet::BathsMin
                | Facet::HomeType
                | Facet::Sort
        )
    }

    /// Deferred facets are held back from live refinement until search is submitted.
    pub fn is_deferred(self) -> bool {
        self == Facet::Location
    }

    pub fn next(self) -> Facet {
        let idx = Facet::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Facet::ALL[(idx + 1) % Facet::ALL.len()]
    }

    pub fn previous(self) -> Facet {
        let idx = Facet::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Facet::ALL[(idx + Facet::ALL.len() - 1) % Facet::ALL.len()]
    }
}

/// A value handed to `FilterController::set_field`.
///
/// `Text` is the raw form-input shape and is coerced to the facet's type;
/// the other variants are already typed.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    Text(String),
    Flag(bool),
    Set(BTreeSet<String>),
    Sort(SortKey),
}

impl From<&str> for FacetValue {
    fn from(value: &str) -> Self {
        FacetValue::Text(value.to_string())
    }
}

impl From<String> for FacetValue {
    fn from(value: String) -> Self {
        FacetValue::Text(value)
    }
}

impl From<bool> for FacetValue {
    fn from(value: bool) -> Self {
        FacetValue::Flag(value)
    }
}

impl From<SortKey> for FacetValue {
    fn from(value: SortKey) -> Self {
        FacetValue::Sort(value)
    }
}

/// Parse a numeric form input. Empty or malformed input means "unset".
fn parse_number<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Like `parse_number`, but "NaN" and "inf" are malformed too.
fn parse_baths(raw: &str) -> Option<f32> {
    parse_number::<f32>(raw).filter(|v| v.is_finite())
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

/// Blank text unsets the field. Otherwise the text is kept as typed, so a
/// trailing space survives while the next word is entered.
fn non_blank(raw: String) -> Option<String> {
    if raw.trim().is_empty() { None } else { Some(raw) }
}

fn format_opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl FilterRecord {
    /// Replace exactly one field, coercing `value` to the field's type.
    pub fn with_field(&self, facet: Facet, value: FacetValue) -> FilterRecord {
        let mut next = self.clone();
        next.assign(facet, value);
        next
    }

    /// Typed values only land on a facet of the same kind; anything else is
    /// ignored and the field keeps its value.
    fn assign(&mut self, facet: Facet, value: FacetValue) {
        let text = match (facet, value) {
            (_, FacetValue::Text(text)) => text,
            (Facet::HasPool, FacetValue::Flag(flag)) => {
                self.has_pool = flag;
                return;
            }
            (Facet::HasGarage, FacetValue::Flag(flag)) => {
                self.has_garage = flag;
                return;
            }
            (Facet::HasAc, FacetValue::Flag(flag)) => {
                self.has_ac = flag;
                return;
            }
            (Facet::HomeType, FacetValue::Set(set)) => {
                self.home_type = set;
                return;
            }
            (Facet::Sort, FacetValue::Sort(key)) => {
                self.sort = key;
                return;
            }
            (facet, value) => {
                tracing::debug!(?facet, ?value, "value does not fit facet, ignored");
                return;
            }
        };

        match facet {
            Facet::Location => self.location = text,
            Facet::Keywords => self.keywords = non_blank(text),
            Facet::MinPrice => self.min_price = parse_number(&text),
            Facet::MaxPrice => self.max_price = parse_number(&text),
            Facet::BedsMin => self.beds_min = parse_number(&text),
            Facet::BedsMax => self.beds_max = parse_number(&text),
            Facet::BathsMin => self.baths_min = parse_baths(&text),
            Facet::BathsMax => self.baths_max = parse_baths(&text),
            Facet::SqftMin => self.sqft_min = parse_number(&text),
            Facet::SqftMax => self.sqft_max = parse_number(&text),
            Facet::DaysOnListing => self.days_on_listing = parse_number(&text),
            Facet::LotMin => self.lot_min = parse_number(&text),
            Facet::LotMax => self.lot_max = parse_number(&text),
            Facet::BuiltYearMin => self.built_year_min = parse_number(&text),
            Facet::BuiltYearMax => self.built_year_max = parse_number(&text),
            Facet::HoaMax => self.hoa_max = parse_number(&text),
            Facet::HasPool => self.has_pool = parse_flag(&text),
            Facet::HasGarage => self.has_garage = parse_flag(&text),
            Facet::HasAc => self.has_ac = parse_flag(&text),
            Facet::HomeType => {
                self.home_type = text
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            Facet::Sort => {
                if let Some(key) = SortKey::parse(&text) {
                    self.sort = key;
                }
            }
        }
    }

    /// The raw text a form input shows for `facet`. Both presentations read
    /// values through here, never from a copy of their own.
    pub fn display_value(&self, facet: Facet) -> String {
        match facet {
            Facet::Location => self.location.clone(),
            Facet::Keywords => self.keywords.clone().unwrap_or_default(),
            Facet::MinPrice => format_opt(self.min_price),
            Facet::MaxPrice => format_opt(self.max_price),
            Facet::BedsMin => format_opt(self.beds_min),
            Facet::BedsMax => format_opt(self.beds_max),
            Facet::BathsMin => format_opt(self.baths_min),
            Facet::BathsMax => format_opt(self.baths_max),
            Facet::SqftMin => format_opt(self.sqft_min),
            Facet::SqftMax => format_opt(self.sqft_max),
            Facet::DaysOnListing => format_opt(self.days_on_listing),
            Facet::LotMin => format_opt(self.lot_min),
            Facet::LotMax => format_opt(self.lot_max),
            Facet::BuiltYearMin => format_opt(self.built_year_min),
            Facet::BuiltYearMax => format_opt(self.built_year_max),
            Facet::HoaMax => format_opt(self.hoa_max),
            Facet::HasPool => self.has_pool.to_string(),
            Facet::HasGarage => self.has_garage.to_string(),
            Facet::HasAc => self.has_ac.to_string(),
            Facet::HomeType => self.home_type.iter().cloned().collect::<Vec<_>>().join(", "),
            Facet::Sort => self.sort.label().to_string(),
        }
    }

    pub fn flag(&self, facet: Facet) -> bool {
        match facet {
            Facet::HasPool => self.has_pool,
            Facet::HasGarage => self.has_garage,
            Facet::HasAc => self.has_ac,
            _ => false,
        }
    }

    /// Whether `facet` holds something other than its default value.
    pub fn is_set(&self, facet: Facet) -> bool {
        match facet {
            Facet::Location => !self.location.is_empty(),
            Facet::Keywords => self.keywords.as_deref().is_some_and(|k| !k.trim().is_empty()),
            Facet::MinPrice => self.min_price.is_some(),
            Facet::MaxPrice => self.max_price.is_some(),
            Facet::BedsMin => self.beds_min.is_some(),
            Facet::BedsMax => self.beds_max.is_some(),
            Facet::BathsMin => self.baths_min.is_some(),
            Facet::BathsMax => self.baths_max.is_some(),
            Facet::SqftMin => self.sqft_min.is_some(),
            Facet::SqftMax => self.sqft_max.is_some(),
            Facet::DaysOnListing => self.days_on_listing.is_some(),
            Facet::LotMin => self.lot_min.is_some(),
            Facet::LotMax => self.lot_max.is_some(),
            Facet::BuiltYearMin => self.built_year_min.is_some(),
            Facet::BuiltYearMax => self.built_year_max.is_some(),
            Facet::HoaMax => self.hoa_max.is_some(),
            Facet::HasPool => self.has_pool,
            Facet::HasGarage => self.has_garage,
            Facet::HasAc => self.has_ac,
            Facet::HomeType => !self.home_type.is_empty(),
            Facet::Sort => self.sort != SortKey::Recommended,
        }
    }

    /// Number of non-default facets, not counting location and sort.
    pub fn active_filter_count(&self) -> usize {
        Facet::ALL
            .into_iter()
            .filter(|f| !matches!(f, Facet::Location | Facet::Sort))
            .filter(|f| self.is_set(*f))
            .count()
    }
}
