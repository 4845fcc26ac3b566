//! # Table rendering of detection results
//!
//! Display adaptors that render detection results as terminal tables with
//! [`comfy-table`](https://docs.rs/comfy-table/latest/comfy_table/). They borrow
//! the result and format it lazily through [`std::fmt::Display`].
//!
//! Adaptors
//! -----------------
//! * [`OutliersTable`] – Large-variation outliers, one row per breached day.
//! * [`StaticShipsTable`] – Static groups of the single-window detection.
//! * [`SnapshotMatchesTable`] – Rows of the two-snapshot join.
//! * [`StaticShipsDisplay`] – Dispatches on a [`StaticShips`] slot.
//!
//! Examples
//! -----------------
//! ```rust, ignore
//! let report = detector.detect_large_variations(1.7)?;
//! println!("{}", OutliersTable::new(&report.outliers));
//! ```
use std::fmt;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};

use crate::constants::BREACH_PCT_DECIMALS;
use crate::detector::static_objects::{SnapshotMatches, StaticShipRecord};
use crate::detector::variation::OutlierRecord;
use crate::detector::StaticShips;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.into_iter().map(Cell::new).collect::<Vec<_>>());
    table
}

fn right(content: impl ToString) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

/// Table of large-variation outliers, in detection order.
pub struct OutliersTable<'a> {
    outliers: &'a [OutlierRecord],
    show_bound: bool,
}

impl<'a> OutliersTable<'a> {
    pub fn new(outliers: &'a [OutlierRecord]) -> Self {
        OutliersTable {
            outliers,
            show_bound: false,
        }
    }

    /// Also print the value of the breached bound.
    pub fn with_bound(mut self, yes: bool) -> Self {
        self.show_bound = yes;
        self
    }

    fn render(&self) -> String {
        let mut header = vec!["Date", "Type", "Count", "Breach [%]", "Bound type"];
        if self.show_bound {
            header.push("Bound");
        }
        let mut table = new_table(header);

        for record in self.outliers {
            let mut row = Row::from(vec![
                Cell::new(record.date),
                Cell::new(&record.ship_type),
                right(record.count),
                right(format!("{:.*}", BREACH_PCT_DECIMALS, record.breach_pct)),
                Cell::new(record.bound_type),
            ]);
            if self.show_bound {
                row.add_cell(right(format!("{:.3}", record.bound)));
            }
            table.add_row(row);
        }
        table.to_string()
    }
}

impl fmt::Display for OutliersTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Outliers (n={})", self.outliers.len())?;
        writeln!(f, "-------------------")?;
        f.write_str(&self.render())
    }
}

/// Table of single-window static groups.
pub struct StaticShipsTable<'a> {
    records: &'a [StaticShipRecord],
}

impl<'a> StaticShipsTable<'a> {
    pub fn new(records: &'a [StaticShipRecord]) -> Self {
        StaticShipsTable { records }
    }
}

impl fmt::Display for StaticShipsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Static ships (n={})", self.records.len())?;
        writeln!(f, "-------------------")?;

        let mut table = new_table(vec!["Lon [deg]", "Lat [deg]", "Type", "Repeats"]);
        for record in self.records {
            table.add_row(vec![
                right(record.lon),
                right(record.lat),
                Cell::new(&record.ship_type),
                right(record.count),
            ]);
        }
        write!(f, "{table}")
    }
}

/// Table of two-snapshot matches. Extra columns are not shown.
pub struct SnapshotMatchesTable<'a> {
    matches: &'a SnapshotMatches,
}

impl<'a> SnapshotMatchesTable<'a> {
    pub fn new(matches: &'a SnapshotMatches) -> Self {
        SnapshotMatchesTable { matches }
    }
}

impl fmt::Display for SnapshotMatchesTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Static ships across snapshots (n={})", self.matches.len())?;
        writeln!(f, "-------------------")?;

        let mut table = new_table(vec![
            "Lon [deg]",
            "Lat [deg]",
            "Id (t0)",
            "Date (t0)",
            "Type (t0)",
            "Id (t1)",
            "Date (t1)",
            "Type (t1)",
        ]);
        for row in &self.matches.rows {
            table.add_row(vec![
                right(row.lon),
                right(row.lat),
                right(&row.left.object_id),
                Cell::new(row.left.date),
                Cell::new(&row.left.ship_type),
                right(&row.right.object_id),
                Cell::new(row.right.date),
                Cell::new(&row.right.ship_type),
            ]);
        }
        write!(f, "{table}")
    }
}

/// Renders whichever static result a detector holds.
pub struct StaticShipsDisplay<'a>(pub &'a StaticShips);

impl fmt::Display for StaticShipsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            StaticShips::MultiPeriod(records) => StaticShipsTable::new(records).fmt(f),
            StaticShips::TwoSnapshots(matches) => SnapshotMatchesTable::new(matches).fmt(f),
        }
    }
}

#[cfg(test)]
mod display_test {
    use super::*;
    use crate::detector::static_objects::SnapshotMatch;
    use crate::detector::variation::BoundType;
    use crate::observations::Observation;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 6, d).unwrap()
    }

    #[test]
    fn test_outliers_table() {
        let outliers = vec![OutlierRecord {
            date: day(4),
            ship_type: "freighter".into(),
            count: 14,
            bound_type: BoundType::Max,
            bound: 12.338,
            breach_pct: 13.4706,
        }];
        let out = OutliersTable::new(&outliers).with_bound(true).to_string();
        assert!(out.starts_with("Outliers (n=1)"));
        assert!(out.contains("2022-06-04"));
        assert!(out.contains("freighter"));
        assert!(out.contains("13.47"));
        assert!(out.contains("bound_max"));
        assert!(out.contains("12.338"));
    }

    #[test]
    fn test_empty_static_table_has_header() {
        let out = StaticShipsTable::new(&[]).to_string();
        assert!(out.starts_with("Static ships (n=0)"));
        assert!(out.contains("Repeats"));
    }

    #[test]
    fn test_static_dispatch() {
        let matches = SnapshotMatches {
            rows: vec![SnapshotMatch {
                lon: 3.142,
                lat: 8.325,
                left: Observation::new(11u64, "freighter", day(1), 3.142, 8.325),
                right: Observation::new("X-2", "scout", day(2), 3.142, 8.325),
            }],
            ..SnapshotMatches::default()
        };
        let out = StaticShipsDisplay(&StaticShips::TwoSnapshots(matches)).to_string();
        assert!(out.starts_with("Static ships across snapshots (n=1)"));
        assert!(out.contains("X-2"));
        assert!(out.contains("scout"));

        let records = vec![StaticShipRecord {
            lon: 1.5,
            lat: -2.25,
            ship_type: "tanker".into(),
            count: 3,
        }];
        let out = StaticShipsDisplay(&StaticShips::MultiPeriod(records)).to_string();
        assert!(out.contains("tanker"));
        assert!(out.contains("-2.25"));
    }
}
