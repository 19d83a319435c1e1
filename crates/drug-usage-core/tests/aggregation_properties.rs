//! Property tests for the aggregation views.

use drug_usage_core::{aggregate, filter_records, DrugRecord, RollupView};
use proptest::prelude::*;

/// Allowed drift of a share column from 100.0.
const SHARE_TOLERANCE: f64 = 0.1;

/// Float noise when re-summing one-decimal figures.
const SUM_EPSILON: f64 = 1e-3;

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "(Aspirin|Ibuprofen|布洛芬) [0-9]{1,2}0mg",
        "Drug [A-Z]{2}",
    ]
}

fn arb_record() -> impl Strategy<Value = DrugRecord> {
    (
        "[A-Z][0-9]{3}",
        arb_name(),
        0.0f64..10_000.0,
        "[A-Z][a-z]{0,3} (Labs|Co|藥廠)",
        prop::option::of(0.0f64..500.0),
    )
        .prop_map(|(code, name, quantity, manufacturer, price)| {
            let record = DrugRecord::new(code, name, quantity).with_manufacturer(manufacturer);
            match price {
                Some(price) => record.with_unit_price(price),
                None => record,
            }
        })
}

fn assert_shares(view: &RollupView) -> Result<(), TestCaseError> {
    let quantity_shares: f64 = view.rows.iter().map(|r| r.quantity_share).sum();
    if view.total_quantity() > 0.0 {
        prop_assert!((quantity_shares - 100.0).abs() <= SHARE_TOLERANCE, "{}", quantity_shares);
    } else {
        prop_assert_eq!(quantity_shares, 0.0);
    }

    let cost_shares: f64 = view.rows.iter().map(|r| r.cost_share).sum();
    if view.total_cost() > 0.0 {
        prop_assert!((cost_shares - 100.0).abs() <= SHARE_TOLERANCE, "{}", cost_shares);
    } else {
        prop_assert_eq!(cost_shares, 0.0);
    }
    Ok(())
}

proptest! {
    #[test]
    fn rollups_reconcile_with_detail(records in prop::collection::vec(arb_record(), 0..80)) {
        let views = aggregate(&records);
        let detail_quantity = views.detail.total_quantity();
        let detail_cost = views.detail.total_cost();

        for view in [&views.by_name, &views.by_manufacturer] {
            prop_assert!((view.total_quantity() - detail_quantity).abs() <= SUM_EPSILON);
            prop_assert!((view.total_cost() - detail_cost).abs() <= SUM_EPSILON);

            let counted: usize = view.rows.iter().map(|r| r.row_count).sum();
            prop_assert_eq!(counted, records.len());

            let unknown: usize = view.rows.iter().map(|r| r.unknown_price_rows).sum();
            let expected = records.iter().filter(|r| r.known_unit_price().is_none()).count();
            prop_assert_eq!(unknown, expected);
        }
    }

    #[test]
    fn shares_sum_to_hundred(records in prop::collection::vec(arb_record(), 0..80)) {
        let views = aggregate(&records);
        assert_shares(&views.by_name)?;
        assert_shares(&views.by_manufacturer)?;

        let detail_cost: f64 = views.detail.rows.iter().filter_map(|r| r.cost_share).sum();
        if views.detail.total_cost() > 0.0 {
            prop_assert!((detail_cost - 100.0).abs() <= SHARE_TOLERANCE, "{}", detail_cost);
        }
    }

    #[test]
    fn many_equal_groups_sum_to_hundred(groups in 1usize..120) {
        let records: Vec<DrugRecord> = (0..groups)
            .map(|i| {
                DrugRecord::new(format!("C{i}"), format!("Drug {i:03}"), 1.0).with_unit_price(1.0)
            })
            .collect();
        let views = aggregate(&records);
        prop_assert_eq!(views.by_name.rows.len(), groups);
        assert_shares(&views.by_name)?;
    }

    #[test]
    fn rollup_keys_are_sorted_and_unique(records in prop::collection::vec(arb_record(), 0..40)) {
        let views = aggregate(&records);
        for view in [&views.by_name, &views.by_manufacturer] {
            let keys: Vec<&str> = view.rows.iter().map(|r| r.key.as_str()).collect();
            prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn filter_matches_case_insensitively(
        records in prop::collection::vec(arb_record(), 0..20),
        term in prop::sample::select(vec!["aspirin", "ASPIRIN", "profen", "500", "布洛芬", "zzz"]),
    ) {
        let matched = filter_records(term, &records);
        let needle = term.to_lowercase();

        let expected = records
            .iter()
            .filter(|r| r.name.as_deref().is_some_and(|n| n.to_lowercase().contains(&needle)))
            .count();
        prop_assert_eq!(matched.len(), expected);
        for record in matched {
            let name = record.name.as_deref().unwrap_or_default().to_lowercase();
            prop_assert!(name.contains(&needle));
        }
    }
}
