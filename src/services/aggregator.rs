//! Aggregator service for grouping shipments into report buckets

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use tracing::{debug, info};

use crate::services::period::{classify, month_name, parse_dmy, week_label_sort_key};
use crate::types::{
    present, AggregateBucket, BucketTotals, HubFleetStats, MitraSummary, PartnerAnalysis,
    PartnerKey, PartnerPeriodRow, PeriodColumn, PeriodKey, PeriodTrend, PeriodType,
    PerformanceTotals, ProjectAnalysis, ProjectKey, ProjectPeriodRow, ShipmentRecord, TrendStatus,
};
use chrono::Datelike;

/// Buckets keyed by `K`, remembering first-seen key order
#[derive(Debug, Clone)]
pub struct Grouped<K> {
    order: Vec<K>,
    buckets: HashMap<K, AggregateBucket>,
}

impl<K: Eq + Hash + Clone> Grouped<K> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    pub fn add(&mut self, key: K, record: &ShipmentRecord) {
        if !self.buckets.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.buckets.entry(key).or_default().add(record);
    }

    pub fn get(&self, key: &K) -> Option<&AggregateBucket> {
        self.buckets.get(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Freeze every bucket, in first-seen key order
    pub fn finalize(mut self) -> Vec<(K, BucketTotals)> {
        self.order
            .into_iter()
            .filter_map(|key| {
                let bucket = self.buckets.remove(&key)?;
                Some((key, bucket.finalize()))
            })
            .collect()
    }
}

impl<K: Eq + Hash + Clone> Default for Grouped<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct-member sets keyed by `K`, remembering first-seen key order
#[derive(Debug, Clone)]
struct UniqueCounter<K> {
    order: Vec<K>,
    sets: HashMap<K, HashSet<String>>,
}

impl<K: Eq + Hash + Clone> UniqueCounter<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            sets: HashMap::new(),
        }
    }

    fn insert(&mut self, key: K, member: &str) {
        if !self.sets.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.sets
            .entry(key)
            .or_default()
            .insert(member.to_string());
    }

    fn finalize(mut self) -> Vec<(K, usize)> {
        self.order
            .into_iter()
            .filter_map(|key| {
                let members = self.sets.remove(&key)?;
                Some((key, members.len()))
            })
            .collect()
    }
}

/// Aggregator for computing report statistics
pub struct Aggregator;

impl Aggregator {
    /// Group records by `key_fn`; records mapped to `None` are skipped
    pub fn group_by<K, F>(records: &[ShipmentRecord], mut key_fn: F) -> Grouped<K>
    where
        K: Eq + Hash + Clone,
        F: FnMut(&ShipmentRecord) -> Option<K>,
    {
        let mut grouped = Grouped::new();
        for record in records {
            if let Some(key) = key_fn(record) {
                grouped.add(key, record);
            }
        }
        grouped
    }

    /// Group by hub, skipping records without one
    pub fn by_hub(records: &[ShipmentRecord]) -> Grouped<String> {
        Self::group_by(records, |r| present(&r.hub).map(String::from))
    }

    /// Group by project name, skipping records without one
    pub fn by_project(records: &[ShipmentRecord]) -> Grouped<String> {
        Self::group_by(records, |r| present(&r.project_name).map(String::from))
    }

    /// Group by classified delivery period; unclassifiable dates are skipped
    pub fn by_period(records: &[ShipmentRecord], period_type: PeriodType) -> Grouped<PeriodKey> {
        Self::group_by(records, |r| classify(&r.delivery_date, period_type))
    }

    /// Chronological delivery trend with period-over-period growth
    pub fn period_trend(records: &[ShipmentRecord], period_type: PeriodType) -> Vec<PeriodTrend> {
        let mut periods = Self::by_period(records, period_type).finalize();
        periods.sort_by(|(a, _), (b, _)| a.sort_key.cmp(&b.sort_key));

        let mut cumulative: u64 = 0;
        let mut previous: Option<u64> = None;
        let mut trend = Vec::with_capacity(periods.len());

        for (key, totals) in periods {
            cumulative = cumulative.saturating_add(totals.count);
            let (growth, status) = match previous {
                None => (0.0, TrendStatus::Baseline),
                Some(0) => (0.0, TrendStatus::Stable),
                Some(prev) => {
                    let growth = (totals.count as f64 - prev as f64) / prev as f64;
                    (growth, TrendStatus::from_growth(growth))
                }
            };
            previous = Some(totals.count);

            trend.push(PeriodTrend {
                label: key.label,
                sort_key: key.sort_key,
                deliveries: totals.count,
                cost: totals.cost_sum,
                cumulative,
                growth,
                status,
            });
        }

        trend
    }

    /// Change in deliveries from the first to the last period.
    /// 0 with fewer than two periods or an empty first period.
    pub fn growth_rate(trend: &[PeriodTrend]) -> f64 {
        match (trend.first(), trend.last()) {
            (Some(first), Some(last)) if trend.len() > 1 && first.deliveries > 0 => {
                (last.deliveries as f64 - first.deliveries as f64) / first.deliveries as f64
            }
            _ => 0.0,
        }
    }

    /// Totals across every record
    pub fn overall(records: &[ShipmentRecord]) -> PerformanceTotals {
        let mut totals = PerformanceTotals::default();
        let mut projects: HashSet<&str> = HashSet::new();
        let mut hubs: HashSet<&str> = HashSet::new();
        let mut mitras: HashSet<&str> = HashSet::new();
        let mut positive_distance = 0.0;
        let mut positive_count: u64 = 0;

        for record in records {
            totals.deliveries = totals.deliveries.saturating_add(1);
            if record.is_on_time() {
                totals.on_time = totals.on_time.saturating_add(1);
            }
            totals.total_cost += record.cost;
            totals.total_distance += record.distance_km;
            if record.distance_km > 0.0 {
                positive_distance += record.distance_km;
                positive_count += 1;
            }

            if let Some(p) = present(&record.project_name) {
                projects.insert(p);
            }
            if let Some(h) = present(&record.hub) {
                hubs.insert(h);
            }
            if let Some(m) = present(&record.mitra_name) {
                mitras.insert(m);
            }
        }

        totals.avg_distance = if positive_count == 0 {
            0.0
        } else {
            positive_distance / positive_count as f64
        };
        totals.unique_projects = projects.len();
        totals.unique_hubs = hubs.len();
        totals.unique_mitras = mitras.len();
        totals
    }

    /// Unique-mitra counts per project (client, hub, year) and period.
    ///
    /// Records without a mitra or client are skipped. Records whose date
    /// does not classify still count toward the record total and the
    /// global unique sets, but never toward a period.
    pub fn project_analysis(
        records: &[ShipmentRecord],
        period_type: PeriodType,
    ) -> ProjectAnalysis {
        info!(
            records = records.len(),
            %period_type,
            "aggregating project analysis"
        );

        let mut project_periods: HashMap<ProjectKey, UniqueCounter<String>> = HashMap::new();
        let mut project_totals: UniqueCounter<ProjectKey> = UniqueCounter::new();
        let mut hub_totals: UniqueCounter<String> = UniqueCounter::new();
        let mut client_totals: UniqueCounter<String> = UniqueCounter::new();
        let mut period_totals: UniqueCounter<String> = UniqueCounter::new();
        let mut columns: Vec<PeriodColumn> = Vec::new();

        let mut unique_mitras: HashSet<&str> = HashSet::new();
        let mut unique_projects: HashSet<&str> = HashSet::new();
        let mut unique_hubs: HashSet<&str> = HashSet::new();
        let mut unique_years: HashSet<i32> = HashSet::new();
        let mut total_records: u64 = 0;

        for record in records {
            let (Some(mitra), Some(client)) =
                (present(&record.mitra_name), present(&record.client_name))
            else {
                continue;
            };

            total_records += 1;
            unique_mitras.insert(mitra);
            unique_projects.insert(client);
            if let Some(hub) = present(&record.hub) {
                unique_hubs.insert(hub);
            }

            let Some(date) = parse_dmy(&record.delivery_date) else {
                debug!(date = %record.delivery_date, "unclassifiable delivery date");
                continue;
            };
            unique_years.insert(date.year());

            let Some(column) = project_column(record, period_type) else {
                continue;
            };
            if !columns.iter().any(|c| c.label == column.label) {
                columns.push(column.clone());
            }

            let key = ProjectKey {
                client: client.to_string(),
                hub: record.hub.clone(),
                year: date.year(),
            };
            project_periods
                .entry(key.clone())
                .or_insert_with(UniqueCounter::new)
                .insert(column.label.clone(), mitra);
            project_totals.insert(key, mitra);
            hub_totals.insert(record.hub.clone(), mitra);
            client_totals.insert(client.to_string(), mitra);
            period_totals.insert(column.label, mitra);
        }

        columns.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        let mut rows: Vec<ProjectPeriodRow> = project_totals
            .finalize()
            .into_iter()
            .map(|(key, total)| {
                let periods = project_periods
                    .remove(&key)
                    .map(UniqueCounter::finalize)
                    .unwrap_or_default();
                ProjectPeriodRow {
                    key,
                    periods,
                    total,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));

        let period_counts: HashMap<String, usize> = period_totals.finalize().into_iter().collect();
        let period_totals = columns
            .iter()
            .map(|c| {
                let count = period_counts.get(&c.label).copied().unwrap_or(0);
                (c.label.clone(), count)
            })
            .collect();

        let analysis = ProjectAnalysis {
            rows,
            columns,
            hub_totals: hub_totals.finalize(),
            client_totals: client_totals.finalize(),
            period_totals,
            unique_mitras: unique_mitras.len(),
            unique_projects: unique_projects.len(),
            unique_hubs: unique_hubs.len(),
            unique_years: unique_years.len(),
            total_records,
        };

        info!(
            unique_mitras = analysis.unique_mitras,
            unique_projects = analysis.unique_projects,
            unique_hubs = analysis.unique_hubs,
            total_records = analysis.total_records,
            combinations = analysis.rows.len(),
            "aggregation complete"
        );

        analysis
    }

    /// Roll mitra summaries up by hub, in first-seen hub order
    pub fn fleet_by_hub(mitras: &[MitraSummary]) -> Vec<HubFleetStats> {
        let mut order: Vec<String> = Vec::new();
        let mut stats: HashMap<String, (u64, u64, f64)> = HashMap::new();

        for mitra in mitras {
            for hub in &mitra.hubs {
                let entry = stats.entry(hub.clone()).or_insert_with(|| {
                    order.push(hub.clone());
                    (0, 0, 0.0)
                });
                entry.0 = entry.0.saturating_add(1);
                entry.1 = entry.1.saturating_add(mitra.total_deliveries);
                entry.2 += mitra.on_time_rate;
            }
        }

        order
            .into_iter()
            .filter_map(|hub| {
                let (count, deliveries, rate_sum) = stats.remove(&hub)?;
                Some(HubFleetStats {
                    hub,
                    mitra_count: count,
                    deliveries,
                    avg_on_time_rate: if count == 0 {
                        0.0
                    } else {
                        rate_sum / count as f64
                    },
                })
            })
            .collect()
    }
}

impl Aggregator {
    /// Deliveries per (mitra, client, hub, year) and period column.
    ///
    /// A record counts when it names a mitra and a client and its date
    /// yields a period column; every total below is over those records.
    pub fn partner_deliveries(
        records: &[ShipmentRecord],
        period_type: PeriodType,
    ) -> PartnerAnalysis {
        info!(
            records = records.len(),
            %period_type,
            "aggregating partner deliveries"
        );

        let cell = |r: &ShipmentRecord| partner_cell(r, period_type);
        let cells = Self::group_by(records, cell).finalize();
        let mitras = Self::group_by(records, |r| cell(r).map(|(key, _)| key.mitra));
        let clients = Self::group_by(records, |r| cell(r).map(|(key, _)| key.client));
        let hubs = Self::group_by(records, |r| {
            cell(r).and_then(|(key, _)| present(&key.hub).map(String::from))
        });
        let periods = Self::group_by(records, |r| cell(r).map(|(_, column)| column.label));

        let mut columns: Vec<PeriodColumn> = Vec::new();
        let mut rows: BTreeMap<PartnerKey, PartnerPeriodRow> = BTreeMap::new();
        let mut total_deliveries: u64 = 0;
        for ((key, column), totals) in cells {
            total_deliveries += totals.count;
            let row = rows.entry(key.clone()).or_insert_with(|| PartnerPeriodRow {
                key,
                periods: Vec::new(),
                total: 0,
            });
            row.periods.push((column.label.clone(), totals.count));
            row.total += totals.count;
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        let position = |label: &str| columns.iter().position(|c| c.label == label);
        let rows: Vec<PartnerPeriodRow> = rows
            .into_values()
            .map(|mut row| {
                row.periods.sort_by_key(|(label, _)| position(label.as_str()));
                row
            })
            .collect();

        let period_counts: HashMap<String, u64> = periods
            .finalize()
            .into_iter()
            .map(|(label, totals)| (label, totals.count))
            .collect();
        let period_totals = columns
            .iter()
            .map(|c| (c.label.clone(), period_counts.get(&c.label).copied().unwrap_or(0)))
            .collect();

        let counts = |grouped: Grouped<String>| -> Vec<(String, u64)> {
            grouped
                .finalize()
                .into_iter()
                .map(|(key, totals)| (key, totals.count))
                .collect()
        };

        let analysis = PartnerAnalysis {
            rows,
            columns,
            unique_mitras: mitras.len(),
            unique_clients: clients.len(),
            unique_hubs: hubs.len(),
            mitra_totals: counts(mitras),
            hub_totals: counts(hubs),
            period_totals,
            total_deliveries,
        };

        info!(
            unique_mitras = analysis.unique_mitras,
            unique_clients = analysis.unique_clients,
            unique_hubs = analysis.unique_hubs,
            total_deliveries = analysis.total_deliveries,
            combinations = analysis.rows.len(),
            "aggregation complete"
        );
        analysis
    }
}

/// Partner key and period column of a counted record
fn partner_cell(record: &ShipmentRecord, period_type: PeriodType) -> Option<(PartnerKey, PeriodColumn)> {
    let mitra = present(&record.mitra_name)?;
    let client = present(&record.client_name)?;
    let date = parse_dmy(&record.delivery_date)?;
    let column = project_column(record, period_type)?;
    let key = PartnerKey {
        mitra: mitra.to_string(),
        client: client.to_string(),
        hub: record.hub.clone(),
        year: date.year(),
    };
    Some((key, column))
}

/// Period column a record falls into for the project table.
///
/// Monthly columns are month names without the year (the year is part of
/// the project key); weekly columns use the record's own `weekly` label.
/// A record without a valid delivery date has no column in any period type.
pub fn project_column(record: &ShipmentRecord, period_type: PeriodType) -> Option<PeriodColumn> {
    match period_type {
        PeriodType::Monthly => {
            let date = parse_dmy(&record.delivery_date)?;
            Some(PeriodColumn {
                label: month_name(date.month())?.to_string(),
                sort_key: format!("{:02}", date.month()),
            })
        }
        PeriodType::Weekly => {
            parse_dmy(&record.delivery_date)?;
            present(&record.weekly).map(|label| PeriodColumn {
                label: label.to_string(),
                sort_key: week_label_sort_key(label),
            })
        }
        PeriodType::Daily | PeriodType::Yearly => {
            classify(&record.delivery_date, period_type).map(|key| PeriodColumn {
                label: key.label,
                sort_key: key.sort_key,
            })
        }
    }
}
