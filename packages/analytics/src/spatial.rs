//! Metrics grouped by home ZIP code.
//!
//! ZIP codes inside the coverage set (usually the ZCTAs of the boundary
//! file the map draws) get their own value. Everything else is pooled
//! into one out-of-coverage value computed from the pooled contributions,
//! so pooled lengths of stay come from the raw samples rather than from
//! per-ZIP averages.

use std::collections::{BTreeMap, BTreeSet};

use detention_stats_analytics_models::{DateAxis, LosStatistic, MetricKind, SpatialResult};
use detention_stats_stay_models::{DetentionType, StayRecord, normalize_zip, pad_numeric_zip};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::{
    AggregationScope, AnalyticsError,
    fold::{EventCount, LengthOfStaySamples, OverlapDays, WindowMetric, fold_records},
    statistics::summarize,
};

/// Feature property holding the ZIP code in census ZCTA boundary files.
pub const DEFAULT_ZIP_PROPERTY: &str = "ZCTA5CE10";

/// The set of ZIP codes drawn on the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipCoverage {
    zips: BTreeSet<String>,
}

impl ZipCoverage {
    /// Reads the coverage set from a `GeoJSON` `FeatureCollection`, taking
    /// each feature's `property` as its ZIP code. Numeric properties are
    /// zero-padded. Features without a usable property are skipped.
    ///
    /// # Errors
    ///
    /// * If the text is not `GeoJSON`
    /// * If the document is not a `FeatureCollection`
    pub fn from_geojson_str(geojson_str: &str, property: &str) -> Result<Self, AnalyticsError> {
        let geojson: GeoJson = geojson_str.parse().map_err(|e| AnalyticsError::Coverage {
            message: format!("Failed to parse GeoJSON: {e}"),
        })?;
        Self::from_geojson(&geojson, property)
    }

    /// See [`Self::from_geojson_str`].
    ///
    /// # Errors
    ///
    /// * If the document is not a `FeatureCollection`
    pub fn from_geojson(geojson: &GeoJson, property: &str) -> Result<Self, AnalyticsError> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(AnalyticsError::Coverage {
                message: "Coverage GeoJSON must be a FeatureCollection".to_string(),
            });
        };

        let mut skipped = 0;
        let mut zips = BTreeSet::new();
        for feature in &collection.features {
            let zip = match feature.property(property) {
                Some(serde_json::Value::String(s)) => normalize_zip(s).map(ToString::to_string),
                Some(serde_json::Value::Number(n)) => n
                    .as_u64()
                    .and_then(|zip| pad_numeric_zip(&zip.to_string()))
                    .and_then(|zip| normalize_zip(&zip).map(ToString::to_string)),
                _ => None,
            };
            match zip {
                Some(zip) => {
                    zips.insert(zip);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("{skipped} coverage features had no usable '{property}' property");
        }
        log::info!("Loaded {} coverage ZIP codes", zips.len());

        Ok(Self { zips })
    }

    /// Returns `true` if `zip` is drawn on the map.
    #[must_use]
    pub fn contains(&self, zip: &str) -> bool {
        self.zips.contains(zip)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zips.is_empty()
    }

    /// ZIP codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.zips.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ZipCoverage {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            zips: iter
                .into_iter()
                .filter_map(|zip| normalize_zip(zip.as_ref()).map(ToString::to_string))
                .collect(),
        }
    }
}

/// One spatial metric, whichever family it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZipMetric {
    Count(SpatialResult<u64>),
    LengthOfStay(SpatialResult<Option<f64>>),
    Population(SpatialResult<f64>),
}

fn fold_by_zip<M, T>(
    records: &[StayRecord],
    scope: &AggregationScope,
    coverage: &ZipCoverage,
    metric: &M,
    kind: MetricKind,
    finish: impl Fn(&M::Acc) -> T,
) -> SpatialResult<T>
where
    M: WindowMetric,
{
    let home_zip =
        |record: &StayRecord, _: DetentionType| record.home_zip().map(ToString::to_string);
    let fold = fold_records(records, scope, &home_zip, metric);

    let mut by_zip = BTreeMap::new();
    let mut pooled = M::Acc::default();
    let mut out_of_coverage_zips = Vec::new();

    for (zip, split) in fold.categories {
        let acc = split.combined(metric);
        if coverage.contains(&zip) {
            by_zip.insert(zip, finish(&acc));
        } else {
            metric.merge(&mut pooled, acc);
            out_of_coverage_zips.push(zip);
        }
    }
    for zip in coverage.iter() {
        if !by_zip.contains_key(zip) {
            by_zip.insert(zip.to_string(), finish(&M::Acc::default()));
        }
    }

    log::debug!(
        "{kind} by ZIP for {}: {} covered, {} pooled out of coverage",
        scope.window,
        by_zip.len(),
        out_of_coverage_zips.len()
    );

    SpatialResult {
        metric: kind,
        by_zip,
        out_of_coverage: finish(&pooled),
        out_of_coverage_zips,
    }
}

/// Admissions or releases per ZIP code.
pub fn zip_counts(
    records: &[StayRecord],
    scope: &AggregationScope,
    coverage: &ZipCoverage,
    axis: DateAxis,
) -> SpatialResult<u64> {
    let kind = match axis {
        DateAxis::Entry => MetricKind::Admissions,
        DateAxis::Exit => MetricKind::Releases,
    };
    fold_by_zip(records, scope, coverage, &EventCount(axis), kind, |count: &u64| *count)
}

/// Mean or median length of stay per ZIP code.
pub fn zip_length_of_stay(
    records: &[StayRecord],
    scope: &AggregationScope,
    coverage: &ZipCoverage,
    statistic: LosStatistic,
) -> SpatialResult<Option<f64>> {
    let kind = match statistic {
        LosStatistic::Mean => MetricKind::AverageLengthOfStay,
        LosStatistic::Median => MetricKind::MedianLengthOfStay,
    };
    fold_by_zip(records, scope, coverage, &LengthOfStaySamples, kind, |samples: &Vec<u32>| {
        summarize(samples, statistic).value
    })
}

/// Average daily population per ZIP code.
#[allow(clippy::cast_precision_loss)]
pub fn zip_average_daily_population(
    records: &[StayRecord],
    scope: &AggregationScope,
    coverage: &ZipCoverage,
) -> SpatialResult<f64> {
    let days_in_window = f64::from(scope.window.days_in_window());
    fold_by_zip(
        records,
        scope,
        coverage,
        &OverlapDays,
        MetricKind::AverageDailyPopulation,
        |days: &u64| *days as f64 / days_in_window,
    )
}

/// Computes `kind` per ZIP code.
pub fn zip_metric(
    records: &[StayRecord],
    scope: &AggregationScope,
    coverage: &ZipCoverage,
    kind: MetricKind,
) -> ZipMetric {
    match kind {
        MetricKind::Admissions => {
            ZipMetric::Count(zip_counts(records, scope, coverage, DateAxis::Entry))
        }
        MetricKind::Releases => {
            ZipMetric::Count(zip_counts(records, scope, coverage, DateAxis::Exit))
        }
        MetricKind::AverageLengthOfStay => ZipMetric::LengthOfStay(zip_length_of_stay(
            records,
            scope,
            coverage,
            LosStatistic::Mean,
        )),
        MetricKind::MedianLengthOfStay => ZipMetric::LengthOfStay(zip_length_of_stay(
            records,
            scope,
            coverage,
            LosStatistic::Median,
        )),
        MetricKind::AverageDailyPopulation => {
            ZipMetric::Population(zip_average_daily_population(records, scope, coverage))
        }
    }
}
