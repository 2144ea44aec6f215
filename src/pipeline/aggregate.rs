//! Aggregation: flatten per-document records into one ordered table.
//!
//! Order is `(auction_date, term_days)` ascending with absent values sorted
//! after present ones, for each key independently. The sort is stable, so
//! records with equal keys keep the order in which documents were supplied.

use crate::output::AuctionRecord;
use std::cmp::Ordering;

/// Flatten and order records from every document.
pub fn aggregate<I>(per_document: I) -> Vec<AuctionRecord>
where
    I: IntoIterator<Item = Vec<AuctionRecord>>,
{
    let mut records: Vec<AuctionRecord> = per_document.into_iter().flatten().collect();
    records.sort_by(compare_records);
    records
}

/// Total order used by [`aggregate`].
pub fn compare_records(a: &AuctionRecord, b: &AuctionRecord) -> Ordering {
    none_last(&a.auction_date, &b.auction_date).then_with(|| none_last(&a.term_days, &b.term_days))
}

fn none_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{RejectionReason, TermSummary};
    use chrono::NaiveDate;

    fn rec(doc: &str, date: Option<(i32, u32, u32)>, term: Option<u32>, demanded: f64) -> AuctionRecord {
        AuctionRecord::from_summary(
            doc,
            date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            RejectionReason::None,
            TermSummary {
                term_days: term,
                amount_demanded: demanded,
                amount_awarded: 0.0,
                rate: 0.0,
            },
        )
    }

    fn keys(records: &[AuctionRecord]) -> Vec<(Option<NaiveDate>, Option<u32>)> {
        records.iter().map(|r| (r.auction_date, r.term_days)).collect()
    }

    #[test]
    fn sorts_by_date_then_term() {
        let later = vec![rec("b", Some((2024, 3, 22)), Some(364), 1.0)];
        let earlier = vec![
            rec("a", Some((2024, 3, 15)), Some(728), 2.0),
            rec("a", Some((2024, 3, 15)), Some(364), 3.0),
        ];
        let out = aggregate(vec![later, earlier]);
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day);
        assert_eq!(
            keys(&out),
            vec![(d(15), Some(364)), (d(15), Some(728)), (d(22), Some(364))]
        );
    }

    #[test]
    fn absent_values_sort_last() {
        let out = aggregate(vec![vec![
            rec("x", None, Some(91), 1.0),
            rec("y", Some((2024, 1, 5)), None, 2.0),
            rec("y", Some((2024, 1, 5)), Some(182), 3.0),
            rec("x", None, None, 4.0),
        ]]);
        let d = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(
            keys(&out),
            vec![(d, Some(182)), (d, None), (None, Some(91)), (None, None)]
        );
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let out = aggregate(vec![
            vec![rec("first", Some((2024, 2, 1)), Some(364), 1.0)],
            vec![rec("second", Some((2024, 2, 1)), Some(364), 2.0)],
            vec![rec("third", Some((2024, 2, 1)), Some(364), 3.0)],
        ]);
        let docs: Vec<&str> = out.iter().map(|r| r.source_document.as_str()).collect();
        assert_eq!(docs, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_input() {
        assert!(aggregate(Vec::<Vec<AuctionRecord>>::new()).is_empty());
    }
}
