//! The fold from stored event members to nested count tables.
//!
//! `fold` is a single stateless pass. Each member is decoded, optionally
//! filtered by identity, labelled once, and then counted in every granularity
//! whose cutoff it clears, both globally and under its own name.

use std::collections::BTreeMap;

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::bucket::{BucketKeys, Cutoffs, Granularity};
use crate::codec;

/// Bucket label -> count. Labels are unique; their order carries no meaning.
pub type CountTable = BTreeMap<String, u64>;

/// One count table per granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountTables {
    pub daily: CountTable,
    pub weekly: CountTable,
    pub monthly: CountTable,
}

impl CountTables {
    pub fn table(&self, granularity: Granularity) -> &CountTable {
        match granularity {
            Granularity::Daily => &self.daily,
            Granularity::Weekly => &self.weekly,
            Granularity::Monthly => &self.monthly,
        }
    }

    fn table_mut(&mut self, granularity: Granularity) -> &mut CountTable {
        match granularity {
            Granularity::Daily => &mut self.daily,
            Granularity::Weekly => &mut self.weekly,
            Granularity::Monthly => &mut self.monthly,
        }
    }

    fn increment(&mut self, granularity: Granularity, label: &str) {
        *self
            .table_mut(granularity)
            .entry(label.to_string())
            .or_insert(0) += 1;
    }

    /// Sum of all buckets at one granularity.
    pub fn total(&self, granularity: Granularity) -> u64 {
        self.table(granularity).values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty() && self.weekly.is_empty() && self.monthly.is_empty()
    }
}

/// Query result: global counts plus per-name counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub global: CountTables,
    pub usages: BTreeMap<String, CountTables>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.usages.is_empty()
    }

    pub fn usage(&self, name: &str) -> Option<&CountTables> {
        self.usages.get(name)
    }
}

/// Fold stored members into an [`AggregationResult`].
///
/// Members that fail to decode (or whose timestamp has no calendar label) are
/// dropped and the fold continues. `identity` restricts counting to events whose
/// `uniqueId` equals it; `None` or an empty string counts everything.
pub fn fold<I, Tz>(records: I, cutoffs: &Cutoffs, identity: Option<&str>, tz: &Tz) -> AggregationResult
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    Tz: TimeZone,
{
    let mut result = AggregationResult::default();
    let mut skipped = 0usize;

    for record in records {
        let event = match codec::decode(record.as_ref()) {
            Ok(event) => event,
            Err(e) => {
                skipped += 1;
                tracing::debug!(error = %e, "skipping undecodable event record");
                continue;
            }
        };

        if !event.matches_identity(identity) {
            continue;
        }

        let Some(keys) = BucketKeys::for_timestamp(event.created_at(), tz) else {
            skipped += 1;
            tracing::debug!(created_at = event.created_at(), "skipping event outside calendar range");
            continue;
        };

        let usage = result.usages.entry(event.name().to_string()).or_default();

        for granularity in Granularity::ALL {
            if event.created_at() >= cutoffs.get(granularity) {
                let label = keys.get(granularity);
                usage.increment(granularity, label);
                result.global.increment(granularity, label);
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "aggregation dropped malformed records");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Lookback;
    use crate::event::Event;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn member(name: &str, created_at: DateTime<Utc>, unique_id: Option<&str>) -> String {
        let mut event = Event::new(name, created_at.timestamp_millis(), "auth").unwrap();
        if let Some(id) = unique_id {
            event = event.with_unique_id(id);
        }
        codec::encode(&event).unwrap()
    }

    fn cutoffs(days: u32) -> Cutoffs {
        Cutoffs::compute(&now(), Lookback::new(days).unwrap())
    }

    #[test]
    fn recent_event_is_counted_in_every_granularity() {
        let records = vec![member("login", now(), None)];
        let result = fold(&records, &cutoffs(7), None, &Utc);

        for tables in [&result.global, result.usage("login").unwrap()] {
            assert_eq!(tables.daily.get("2024-05-15"), Some(&1));
            assert_eq!(tables.weekly.get("2024-05-12"), Some(&1));
            assert_eq!(tables.monthly.get("2024-05"), Some(&1));
        }
    }

    #[test]
    fn older_events_drop_out_of_narrower_windows() {
        // Lookback 7: daily window 7 days, weekly window 49 days, monthly window 7 months.
        let records = vec![
            member("login", now(), None),
            member("login", now() - Duration::days(40), None),
            member("login", now() - Duration::days(50), None),
        ];
        let result = fold(&records, &cutoffs(7), None, &Utc);

        assert_eq!(result.global.total(Granularity::Daily), 1);
        assert_eq!(result.global.total(Granularity::Weekly), 2);
        assert_eq!(result.global.total(Granularity::Monthly), 3);

        let login = result.usage("login").unwrap();
        assert_eq!(login.daily.len(), 1);
        assert_eq!(login.monthly.get("2024-04"), Some(&1));
        assert_eq!(login.monthly.get("2024-03"), Some(&1));
        assert_eq!(login.monthly.get("2024-05"), Some(&1));
    }

    #[test]
    fn events_older_than_the_monthly_cutoff_are_ignored() {
        let records = vec![member("login", now() - Duration::days(300), None)];
        let result = fold(&records, &cutoffs(7), None, &Utc);

        assert!(result.global.is_empty());
        assert!(result.usage("login").unwrap().is_empty());
    }

    #[test]
    fn counts_are_split_per_name_and_summed_globally() {
        let records = vec![
            member("login", now(), None),
            member("login", now() - Duration::hours(1), None),
            member("logout", now(), None),
        ];
        let result = fold(&records, &cutoffs(7), None, &Utc);

        assert_eq!(result.global.daily.get("2024-05-15"), Some(&3));
        assert_eq!(result.usage("login").unwrap().daily.get("2024-05-15"), Some(&2));
        assert_eq!(result.usage("logout").unwrap().daily.get("2024-05-15"), Some(&1));
    }

    #[test]
    fn identity_filter_counts_only_matching_events() {
        let records = vec![
            member("login", now(), Some("alice")),
            member("login", now(), Some("bob")),
            member("login", now(), None),
        ];

        let result = fold(&records, &cutoffs(7), Some("alice"), &Utc);
        assert_eq!(result.usage("login").unwrap().total(Granularity::Daily), 1);
        assert_eq!(result.global.total(Granularity::Daily), 1);

        let unfiltered = fold(&records, &cutoffs(7), Some(""), &Utc);
        assert_eq!(unfiltered.global.total(Granularity::Daily), 3);
    }

    #[test]
    fn filtered_out_names_do_not_appear() {
        let records = vec![member("login", now(), Some("alice")), member("signup", now(), Some("bob"))];
        let result = fold(&records, &cutoffs(7), Some("alice"), &Utc);

        assert!(result.usage("login").is_some());
        assert!(result.usage("signup").is_none());
    }

    #[test]
    fn malformed_records_do_not_break_aggregation() {
        let records = vec![
            "{not json".to_string(),
            member("login", now(), None),
            r#"{"name":"ghost","type":"auth"}"#.to_string(),
            String::new(),
            member("login", now(), None),
        ];
        let result = fold(&records, &cutoffs(7), None, &Utc);

        assert_eq!(result.global.total(Granularity::Daily), 2);
        assert_eq!(result.usages.len(), 1);
    }

    #[test]
    fn no_records_yield_empty_result() {
        let result = fold(Vec::<String>::new(), &cutoffs(7), None, &Utc);
        assert!(result.is_empty());
        assert_eq!(result, AggregationResult::default());
    }

    #[test]
    fn result_serializes_to_nested_tables() {
        let records = vec![member("login", now(), None)];
        let result = fold(&records, &cutoffs(1), None, &Utc);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["global"]["daily"]["2024-05-15"], 1);
        assert_eq!(json["usages"]["login"]["weekly"]["2024-05-12"], 1);
        assert_eq!(json["usages"]["login"]["monthly"]["2024-05"], 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: events older than the monthly cutoff contribute nothing, and
        /// events inside the daily window land in exactly one bucket per table.
        #[test]
        fn cutoffs_bound_contributions(
            ages_hours in prop::collection::vec(0i64..(24 * 800), 1..40),
            days in 1u32..30u32,
        ) {
            let c = cutoffs(days);
            let records: Vec<String> = ages_hours
                .iter()
                .map(|h| member("e", now() - Duration::hours(*h), None))
                .collect();

            let result = fold(&records, &c, None, &Utc);

            let created: Vec<i64> = ages_hours
                .iter()
                .map(|h| (now() - Duration::hours(*h)).timestamp_millis())
                .collect();

            for granularity in Granularity::ALL {
                let expected = created.iter().filter(|t| **t >= c.get(granularity)).count() as u64;
                prop_assert_eq!(result.global.total(granularity), expected);
            }

            let in_daily = created.iter().filter(|t| **t >= c.daily).count() as u64;
            prop_assert!(result.global.total(Granularity::Weekly) >= in_daily);
            prop_assert!(result.global.total(Granularity::Monthly) >= in_daily);
        }
    }
}
