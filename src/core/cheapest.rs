use thiserror::Error;

use crate::domain::model::Offer;

#[derive(Debug, Error, PartialEq)]
pub enum SelectError {
    #[error("offer list is empty")]
    EmptyOfferSet,

    #[error("offer has unparseable price total: {0}")]
    InvalidPrice(String),
}

/// Minimum-by-price reduction over a list of priced offers.
///
/// Comparison is numeric on the decimal total, never lexical. Ties keep the
/// first offer encountered, so the result is stable and deterministic.
pub fn select_cheapest(offers: &[Offer]) -> Result<&Offer, SelectError> {
    let mut best: Option<(&Offer, f64)> = None;

    for offer in offers {
        let amount = offer
            .total_amount()
            .filter(|a| a.is_finite())
            .ok_or_else(|| SelectError::InvalidPrice(offer.price.total.clone()))?;

        match best {
            Some((_, current)) if amount >= current => {}
            _ => best = Some((offer, amount)),
        }
    }

    best.map(|(offer, _)| offer)
        .ok_or(SelectError::EmptyOfferSet)
}

/// Boundary formatting: `"<amount> <currency>"`.
pub fn format_price(offer: &Offer) -> String {
    format!("{} {}", offer.price.total, offer.price.currency)
}
