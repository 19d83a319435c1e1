//! Aggregation engine: per-record detail plus drug-name and manufacturer rollups.
//!
//! Rounding is half away from zero at one decimal, applied the same way in every view.
//! Rollups sum the already-rounded detail figures so the views reconcile.
//! Rows with an unknown price contribute to quantity but never to cost; each rollup
//! row counts them in `unknown_price_rows`.
//!
//! Shares are apportioned in tenths of a percent so every view sums to exactly 100.0
//! (or 0.0 when its grand total is zero).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{AggregateViews, DetailRow, DetailView, DrugRecord, Grouping, RollupRow, RollupView};

/// Tenths of a percent in a whole.
const SHARE_UNITS: i64 = 1000;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage shares of `values`, one decimal each, summing to 100.0.
///
/// Largest-remainder apportionment: every share is floored to a tenth, then the
/// leftover tenths go to the largest remainders, earlier positions first on ties.
/// A zero grand total yields all zeros.
pub fn apportion_shares(values: &[f64]) -> Vec<f64> {
    let whole: f64 = values.iter().sum();
    if whole <= 0.0 {
        return vec![0.0; values.len()];
    }

    let exact: Vec<f64> = values
        .iter()
        .map(|v| v / whole * SHARE_UNITS as f64)
        .collect();
    let mut units: Vec<i64> = exact.iter().map(|e| (e + 1e-9).floor() as i64).collect();

    let assigned: i64 = units.iter().sum();
    let leftover = (SHARE_UNITS - assigned).clamp(0, values.len() as i64) as usize;

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - units[a] as f64;
        let rb = exact[b] - units[b] as f64;
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal)
    });
    for &index in order.iter().take(leftover) {
        units[index] += 1;
    }

    units.into_iter().map(|u| u as f64 / 10.0).collect()
}

/// Compute the detail, by-name and by-manufacturer views for matched records.
pub fn aggregate<'a, I>(records: I) -> AggregateViews
where
    I: IntoIterator<Item = &'a DrugRecord>,
{
    let detail = detail_view(records);
    let by_name = rollup(&detail, Grouping::DrugName);
    let by_manufacturer = rollup(&detail, Grouping::Manufacturer);

    tracing::debug!(
        rows = detail.rows.len(),
        names = by_name.rows.len(),
        manufacturers = by_manufacturer.rows.len(),
        "aggregated records"
    );

    AggregateViews {
        detail,
        by_name,
        by_manufacturer,
    }
}

/// One derived row per record, in input order.
pub fn detail_view<'a, I>(records: I) -> DetailView
where
    I: IntoIterator<Item = &'a DrugRecord>,
{
    let mut rows: Vec<DetailRow> = records
        .into_iter()
        .map(|record| {
            let unit_price = record.known_unit_price();
            DetailRow {
                code: record.code.clone(),
                name: record.name_key().to_string(),
                manufacturer: record.manufacturer.clone(),
                quantity: round1(record.quantity),
                unit_price,
                total: unit_price.map(|price| round1(record.quantity * price)),
                quantity_share: 0.0,
                cost_share: None,
            }
        })
        .collect();

    let quantities: Vec<f64> = rows.iter().map(|r| r.quantity).collect();
    for (row, share) in rows.iter_mut().zip(apportion_shares(&quantities)) {
        row.quantity_share = share;
    }

    let priced: Vec<usize> = (0..rows.len()).filter(|&i| rows[i].total.is_some()).collect();
    let totals: Vec<f64> = priced.iter().filter_map(|&i| rows[i].total).collect();
    for (&index, share) in priced.iter().zip(apportion_shares(&totals)) {
        rows[index].cost_share = Some(share);
    }

    DetailView { rows }
}

#[derive(Default)]
struct GroupAccumulator {
    row_count: usize,
    quantity: f64,
    total: f64,
    unknown_price_rows: usize,
}

/// Group detail rows by drug name or manufacturer, ordered by key.
pub fn rollup(detail: &DetailView, grouping: Grouping) -> RollupView {
    let mut groups: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();

    for row in &detail.rows {
        let key = match grouping {
            Grouping::DrugName => row.name.as_str(),
            Grouping::Manufacturer => row.manufacturer.as_str(),
        };
        let acc = groups.entry(key).or_default();
        acc.row_count += 1;
        acc.quantity += row.quantity;
        match row.total {
            Some(total) => acc.total += total,
            None => acc.unknown_price_rows += 1,
        }
    }

    let mut rows: Vec<RollupRow> = groups
        .into_iter()
        .map(|(key, acc)| RollupRow {
            key: key.to_string(),
            row_count: acc.row_count,
            quantity: round1(acc.quantity),
            total: round1(acc.total),
            unknown_price_rows: acc.unknown_price_rows,
            quantity_share: 0.0,
            cost_share: 0.0,
        })
        .collect();

    let quantities: Vec<f64> = rows.iter().map(|r| r.quantity).collect();
    let totals: Vec<f64> = rows.iter().map(|r| r.total).collect();
    let quantity_shares = apportion_shares(&quantities);
    let cost_shares = apportion_shares(&totals);

    let shares = quantity_shares.into_iter().zip(cost_shares);
    for (row, (quantity_share, cost_share)) in rows.iter_mut().zip(shares) {
        row.quantity_share = quantity_share;
        row.cost_share = cost_share;
    }

    RollupView { grouping, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspirin_records() -> Vec<DrugRecord> {
        vec![
            DrugRecord::new("A001", "Aspirin 100mg", 10.0)
                .with_manufacturer("Bayer")
                .with_unit_price(3.0),
            DrugRecord::new("A002", "Aspirin 100mg", 20.5)
                .with_manufacturer("Generic Co")
                .with_unit_price(3.0),
        ]
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(1.25), 1.3);
        assert_eq!(round1(1.24), 1.2);
        assert_eq!(round1(30.5), 30.5);
        assert_eq!(round1(0.05), 0.1);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_apportion_zero_whole() {
        assert_eq!(apportion_shares(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(apportion_shares(&[]).is_empty());
    }

    #[test]
    fn test_apportion_thirds() {
        assert_eq!(apportion_shares(&[1.0, 2.0]), vec![33.3, 66.7]);
        assert_eq!(apportion_shares(&[1.0, 1.0, 1.0]), vec![33.4, 33.3, 33.3]);
    }

    #[test]
    fn test_equal_groups_sum_to_hundred() {
        for groups in [6usize, 7, 30, 97] {
            let records: Vec<DrugRecord> = (0..groups)
                .map(|i| {
                    DrugRecord::new(format!("C{i}"), format!("Drug {i:03}"), 1.0).with_unit_price(1.0)
                })
                .collect();
            let views = aggregate(&records);

            let quantity: f64 = views.by_name.rows.iter().map(|r| r.quantity_share).sum();
            let cost: f64 = views.by_name.rows.iter().map(|r| r.cost_share).sum();
            assert!((quantity - 100.0).abs() < 1e-6, "{groups} groups: {quantity}");
            assert!((cost - 100.0).abs() < 1e-6, "{groups} groups: {cost}");

            let detail: f64 = views.detail.rows.iter().filter_map(|r| r.cost_share).sum();
            assert!((detail - 100.0).abs() < 1e-6, "{groups} rows: {detail}");
        }
    }

    #[test]
    fn test_leftover_goes_to_first_key_on_ties() {
        let records: Vec<DrugRecord> = ["Gamma", "Alpha", "Beta", "Delta", "Epsilon", "Zeta"]
            .iter()
            .map(|name| DrugRecord::new("X", *name, 1.0))
            .collect();
        let views = aggregate(&records);

        // 1000 tenths over 6 groups: 166 each, 4 leftover to the first four keys.
        let shares: Vec<(&str, f64)> = views
            .by_name
            .rows
            .iter()
            .map(|r| (r.key.as_str(), r.quantity_share))
            .collect();
        assert_eq!(
            shares,
            vec![
                ("Alpha", 16.7),
                ("Beta", 16.7),
                ("Delta", 16.7),
                ("Epsilon", 16.7),
                ("Gamma", 16.6),
                ("Zeta", 16.6),
            ]
        );
    }

    #[test]
    fn test_by_name_rollup() {
        let records = aspirin_records();
        let views = aggregate(&records);

        assert_eq!(views.by_name.rows.len(), 1);
        let row = &views.by_name.rows[0];
        assert_eq!(row.key, "Aspirin 100mg");
        assert_eq!(row.row_count, 2);
        assert_eq!(row.quantity, 30.5);
        assert_eq!(row.total, 91.5);
        assert_eq!(row.cost_share, 100.0);
        assert_eq!(row.quantity_share, 100.0);
        assert!(!row.has_unknown_prices());
    }

    #[test]
    fn test_by_manufacturer_rollup() {
        let records = aspirin_records();
        let views = aggregate(&records);

        let rows = &views.by_manufacturer.rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "Bayer");
        assert_eq!(rows[0].total, 30.0);
        assert_eq!(rows[0].cost_share, 32.8);
        assert_eq!(rows[1].key, "Generic Co");
        assert_eq!(rows[1].total, 61.5);
        assert_eq!(rows[1].cost_share, 67.2);
    }

    #[test]
    fn test_detail_preserves_order_and_rounds() {
        let records = vec![
            DrugRecord::new("Z9", "Zeta", 1.26).with_unit_price(2.0),
            DrugRecord::new("A1", "Alpha", 3.0),
        ];
        let detail = detail_view(&records);

        assert_eq!(detail.rows[0].code, "Z9");
        assert_eq!(detail.rows[0].quantity, 1.3);
        assert_eq!(detail.rows[0].total, Some(2.5));
        assert_eq!(detail.rows[0].cost_share, Some(100.0));
        assert_eq!(detail.rows[1].code, "A1");
        assert_eq!(detail.rows[1].total, None);
        assert_eq!(detail.rows[1].cost_share, None);
    }

    #[test]
    fn test_unknown_price_excluded_not_zeroed() {
        let mut records = aspirin_records();
        let mut unknown = DrugRecord::new("A003", "Aspirin 100mg", 5.0).with_manufacturer("Bayer");
        unknown.unit_price = crate::models::parse_unit_price("N/A");
        records.push(unknown);

        let views = aggregate(&records);

        assert_eq!(views.detail.rows[2].total, None);
        let row = &views.by_name.rows[0];
        assert_eq!(row.quantity, 35.5);
        assert_eq!(row.total, 91.5);
        assert_eq!(row.unknown_price_rows, 1);
        assert!(row.has_unknown_prices());
        assert_eq!(views.by_manufacturer.row("Bayer").unwrap().unknown_price_rows, 1);
    }

    #[test]
    fn test_all_unknown_prices() {
        let records = vec![
            DrugRecord::new("A1", "Alpha", 1.0),
            DrugRecord::new("B1", "Beta", 2.0),
        ];
        let views = aggregate(&records);

        for row in &views.by_name.rows {
            assert_eq!(row.total, 0.0);
            assert_eq!(row.cost_share, 0.0);
            assert_eq!(row.unknown_price_rows, row.row_count);
        }
        assert_eq!(views.by_name.row("Beta").unwrap().quantity_share, 66.7);
    }

    #[test]
    fn test_empty_input() {
        let views = aggregate(&Vec::<DrugRecord>::new());

        assert!(views.is_empty());
        assert!(views.by_name.is_empty());
        assert!(views.by_manufacturer.is_empty());
        assert_eq!(views.by_name.grouping, Grouping::DrugName);
        assert_eq!(views.by_manufacturer.grouping, Grouping::Manufacturer);
    }

    #[test]
    fn test_rollup_keys_sorted() {
        let records = vec![
            DrugRecord::new("3", "Gamma", 1.0),
            DrugRecord::new("1", "Alpha", 1.0),
            DrugRecord::new("2", "Beta", 1.0),
            DrugRecord::new("4", "Alpha", 1.0),
        ];
        let views = aggregate(&records);

        let keys: Vec<_> = views.by_name.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(views.by_name.row("Alpha").unwrap().quantity, 2.0);
    }
}
