//! Carrier selection
//!
//! Pure decision function over aggregated quotes. No I/O, no clock, no
//! randomness, which keeps it exhaustively property-testable independent of
//! network behaviour.

use freight_types::{CarrierId, Quote, SelectionReason};
use thiserror::Error;

/// Every eligible carrier returned an unavailable quote.
///
/// Distinct from "no carrier eligible by size": a carrier can be
/// size-eligible yet still fail to quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no eligible carrier produced a usable quote")]
pub struct NoCarrierAvailable;

/// The winning carrier and why it won
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub carrier: CarrierId,

    /// Price of the winning quote, minor units
    pub price_minor: i64,

    pub currency: String,

    pub reason: SelectionReason,
}

/// Select a carrier from aggregated quotes.
///
/// Policy, in order: discard unavailable quotes; zero left fails; exactly
/// one left wins as `OnlyOption`; otherwise the minimum price wins as
/// `Cheapest`, with ties broken by `priority_order` (the registry's
/// tie-break order, earlier wins).
pub fn select(quotes: &[Quote], priority_order: &[CarrierId]) -> Result<Selection, NoCarrierAvailable> {
    let rank = |carrier: &CarrierId| {
        priority_order
            .iter()
            .position(|c| c == carrier)
            .unwrap_or(usize::MAX)
    };

    let mut available: Vec<&Quote> = quotes.iter().filter(|q| q.is_available()).collect();
    if available.is_empty() {
        return Err(NoCarrierAvailable);
    }

    let reason = if available.len() == 1 {
        SelectionReason::OnlyOption
    } else {
        SelectionReason::Cheapest
    };

    available.sort_by_key(|q| (q.price_minor().unwrap_or(i64::MAX), rank(&q.carrier)));
    let winner = available[0];

    let (price_minor, currency) = match &winner.outcome {
        freight_types::QuoteOutcome::Priced {
            price_minor,
            currency,
            ..
        } => (*price_minor, currency.clone()),
        // filtered above
        freight_types::QuoteOutcome::Unavailable { .. } => return Err(NoCarrierAvailable),
    };

    Ok(Selection {
        carrier: winner.carrier.clone(),
        price_minor,
        currency,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use freight_types::QuoteFailure;
    use proptest::prelude::*;

    fn carrier(name: &str) -> CarrierId {
        CarrierId::new(name)
    }

    #[test]
    fn single_available_quote_is_only_option() {
        let quotes = vec![
            Quote::priced(carrier("a"), 1000, "AUD"),
            Quote::unavailable(carrier("b"), QuoteFailure::Timeout),
        ];
        let selection = select(&quotes, &[carrier("a"), carrier("b")]).unwrap();
        assert_eq!(selection.carrier, carrier("a"));
        assert_eq!(selection.reason, SelectionReason::OnlyOption);
        assert_eq!(selection.price_minor, 1000);
    }

    #[test]
    fn cheapest_wins_among_several() {
        let quotes = vec![
            Quote::priced(carrier("a"), 1000, "AUD"),
            Quote::priced(carrier("b"), 1500, "AUD"),
        ];
        let selection = select(&quotes, &[carrier("a"), carrier("b")]).unwrap();
        assert_eq!(selection.carrier, carrier("a"));
        assert_eq!(selection.reason, SelectionReason::Cheapest);
        assert_eq!(selection.price_minor, 1000);
    }

    #[test]
    fn price_ties_break_by_priority_order() {
        let quotes = vec![
            Quote::priced(carrier("b"), 1000, "AUD"),
            Quote::priced(carrier("a"), 1000, "AUD"),
        ];
        // "a" ranks ahead of "b"
        let selection = select(&quotes, &[carrier("a"), carrier("b")]).unwrap();
        assert_eq!(selection.carrier, carrier("a"));
    }

    #[test]
    fn all_unavailable_fails() {
        let quotes = vec![
            Quote::unavailable(carrier("a"), QuoteFailure::Timeout),
            Quote::unavailable(
                carrier("b"),
                QuoteFailure::CarrierError {
                    message: "500".to_string(),
                },
            ),
        ];
        assert_eq!(
            select(&quotes, &[carrier("a"), carrier("b")]),
            Err(NoCarrierAvailable)
        );
    }

    #[test]
    fn empty_quote_set_fails() {
        assert_eq!(select(&[], &[]), Err(NoCarrierAvailable));
    }

    fn arb_quote(idx: usize) -> impl Strategy<Value = Quote> {
        let id = format!("carrier-{}", idx);
        prop_oneof![
            (0i64..100_000).prop_map(move |price| Quote::priced(
                CarrierId::new(id.clone()),
                price,
                "AUD"
            )),
            Just(Quote::unavailable(
                CarrierId::new(format!("carrier-{}", idx)),
                QuoteFailure::Timeout
            )),
        ]
    }

    fn arb_quotes(max: usize) -> impl Strategy<Value = Vec<Quote>> {
        (1..=max).prop_flat_map(|n| {
            (0..n).map(arb_quote).collect::<Vec<_>>()
        })
    }

    proptest! {
        /// The selected price is never above any other available quote's price.
        #[test]
        fn winner_is_never_beaten_on_price(quotes in arb_quotes(6)) {
            let order: Vec<CarrierId> = quotes.iter().map(|q| q.carrier.clone()).collect();
            if let Ok(selection) = select(&quotes, &order) {
                for quote in quotes.iter().filter(|q| q.is_available()) {
                    prop_assert!(selection.price_minor <= quote.price_minor().unwrap());
                }
            }
        }

        /// Selection fails exactly when no quote is available.
        #[test]
        fn fails_iff_nothing_available(quotes in arb_quotes(6)) {
            let order: Vec<CarrierId> = quotes.iter().map(|q| q.carrier.clone()).collect();
            let available = quotes.iter().filter(|q| q.is_available()).count();
            prop_assert_eq!(select(&quotes, &order).is_err(), available == 0);
        }

        /// The reason is consistent with the quote set.
        #[test]
        fn reason_matches_available_count(quotes in arb_quotes(6)) {
            let order: Vec<CarrierId> = quotes.iter().map(|q| q.carrier.clone()).collect();
            let available = quotes.iter().filter(|q| q.is_available()).count();
            if let Ok(selection) = select(&quotes, &order) {
                match available {
                    1 => prop_assert_eq!(selection.reason, SelectionReason::OnlyOption),
                    _ => prop_assert_eq!(selection.reason, SelectionReason::Cheapest),
                }
            }
        }

        /// The winner always comes from the available set.
        #[test]
        fn winner_was_actually_quoted(quotes in arb_quotes(6)) {
            let order: Vec<CarrierId> = quotes.iter().map(|q| q.carrier.clone()).collect();
            if let Ok(selection) = select(&quotes, &order) {
                let quoted = quotes.iter().any(|q| {
                    q.carrier == selection.carrier
                        && q.price_minor() == Some(selection.price_minor)
                });
                prop_assert!(quoted, "winner {:?} not present in quotes", selection.carrier);
            }
        }
    }
}
