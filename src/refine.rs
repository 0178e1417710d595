use crate::filter_record::{FilterRecord, SortKey};
use crate::provider::Listing;
use std::cmp::Ordering;

fn at_least<T: PartialOrd>(value: T, min: Option<T>) -> bool {
    min.is_none_or(|m| value >= m)
}

fn at_most<T: PartialOrd>(value: T, max: Option<T>) -> bool {
    max.is_none_or(|m| value <= m)
}

/// Listings without a value for a bounded field drop out once that bound is set.
fn opt_within<T: PartialOrd + Copy>(value: Option<T>, min: Option<T>, max: Option<T>) -> bool {
    match value {
        Some(v) => at_least(v, min) && at_most(v, max),
        None => min.is_none() && max.is_none(),
    }
}

fn keywords_match(listing: &Listing, keywords: &str) -> bool {
    let haystack = format!(
        "{} {} {}",
        listing.address,
        listing.description,
        listing.features.join(" ")
    )
    .to_lowercase();
    keywords
        .split_whitespace()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

/// Whether `listing` passes every non-location facet in `record`.
/// Inverted ranges simply match nothing.
pub fn matches(listing: &Listing, record: &FilterRecord) -> bool {
    at_least(listing.price, record.min_price)
        && at_most(listing.price, record.max_price)
        && at_least(listing.beds, record.beds_min)
        && at_most(listing.beds, record.beds_max)
        && at_least(listing.baths, record.baths_min)
        && at_most(listing.baths, record.baths_max)
        && at_least(listing.sqft, record.sqft_min)
        && at_most(listing.sqft, record.sqft_max)
        && (record.home_type.is_empty()
            || record
                .home_type
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&listing.home_type)))
        && at_most(listing.days_on_market, record.days_on_listing)
        && (!record.has_pool || listing.has_pool)
        && (!record.has_garage || listing.has_garage)
        && (!record.has_ac || listing.has_ac)
        && opt_within(listing.lot_sqft, record.lot_min, record.lot_max)
        && opt_within(
            listing.year_built,
            record.built_year_min,
            record.built_year_max,
        )
        && at_most(listing.hoa_fee.unwrap_or(0), record.hoa_max)
        && record
            .keywords
            .as_deref()
            .is_none_or(|k| keywords_match(listing, k))
}

fn compare(a: &Listing, b: &Listing, sort: SortKey) -> Ordering {
    match sort {
        SortKey::Recommended => Ordering::Equal,
        SortKey::PriceLowHigh => a.price.cmp(&b.price),
        SortKey::PriceHighLow => b.price.cmp(&a.price),
        SortKey::Newest => a.days_on_market.cmp(&b.days_on_market),
        SortKey::Bedrooms => b.beds.cmp(&a.beds),
        SortKey::Bathrooms => b.baths.total_cmp(&a.baths),
        SortKey::SquareFeet => b.sqft.cmp(&a.sqft),
        SortKey::LotSize => b.lot_sqft.unwrap_or(0).cmp(&a.lot_sqft.unwrap_or(0)),
    }
}

/// Indices into `listings` that pass `record`, in `record.sort` order.
/// `Recommended` keeps the provider's order.
pub fn apply(listings: &[Listing], record: &FilterRecord) -> Vec<usize> {
    let mut indices: Vec<usize> = listings
        .iter()
        .enumerate()
        .filter(|(_, l)| matches(l, record))
        .map(|(i, _)| i)
        .collect();
    // Stable, so ties keep provider order.
    indices.sort_by(|&a, &b| compare(&listings[a], &listings[b], record.sort));
    indices
}
