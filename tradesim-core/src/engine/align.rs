//! Chart alignment — points every "current element" alias at the element
//! relevant to the candle the simulation is standing at.
//!
//! Three passes per candle:
//! 1. Daily-file partitions (`Multi-Period-Daily`), only for day-partitioned runs
//! 2. Market-file partitions (`Multi-Period-Market`)
//! 3. The `AnyTimeFrame` partition (`Single-File`): always the last element

use crate::domain::{
    Chart, ChartElement, ChartKey, DataDependency, DependencyCategory, Period,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("chart has no partition {key} required by dataset {dataset}")]
    MissingPartition { key: ChartKey, dataset: String },
    #[error("dataset {dataset} is not in ascending time order at element {position}")]
    Unordered { dataset: String, position: usize },
}

/// The period lists driving the two multi-period passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentLayout {
    pub market_periods: Vec<Period>,
    pub daily_periods: Vec<Period>,
}

impl Default for AlignmentLayout {
    fn default() -> Self {
        Self {
            market_periods: Period::MARKET.to_vec(),
            daily_periods: Period::DAILY.to_vec(),
        }
    }
}

/// Position of the first element whose `end` went backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfOrder(pub usize);

/// Find the element of an ascending series that is current at `now`.
///
/// Only the elements scanned up to the match are order-checked; whole series
/// are checked once per run by [`check_chart_order`].
///
/// An element ending exactly at `now` wins. Otherwise, at the first element
/// ending after `now`, the previous element is used if it ended before `now`;
/// if it did not, there is a gap and nothing is current yet.
pub fn find_current_element(
    elements: &[ChartElement],
    now: i64,
) -> Result<Option<&ChartElement>, OutOfOrder> {
    for (i, element) in elements.iter().enumerate() {
        if i > 0 && element.end < elements[i - 1].end {
            return Err(OutOfOrder(i));
        }
        if element.end == now {
            return Ok(Some(element));
        }
        if i > 0 && element.end > now {
            let previous = &elements[i - 1];
            return Ok(if previous.end < now { Some(previous) } else { None });
        }
    }
    Ok(None)
}

/// Align every declared dependency of `chart` to `now` (the current candle end).
pub fn align_chart(
    chart: &mut Chart,
    now: i64,
    dependencies: &[DataDependency],
    layout: &AlignmentLayout,
    day_partitioned: bool,
) -> Result<(), AlignError> {
    if day_partitioned {
        align_periods(
            chart,
            now,
            dependencies,
            &layout.daily_periods,
            DependencyCategory::MultiPeriodDaily,
            "Daily",
        )?;
    }

    align_periods(
        chart,
        now,
        dependencies,
        &layout.market_periods,
        DependencyCategory::MultiPeriodMarket,
        "Market",
    )?;

    align_single_files(chart, dependencies)
}

fn align_periods(
    chart: &mut Chart,
    now: i64,
    dependencies: &[DataDependency],
    periods: &[Period],
    category: DependencyCategory,
    file_kind: &str,
) -> Result<(), AlignError> {
    for &period in periods {
        let key = ChartKey::Period(period);
        let mut applicable = dependencies
            .iter()
            .filter(|d| d.category == category && d.applies_to(period))
            .peekable();
        let Some(&first) = applicable.peek() else {
            continue;
        };

        let dataset_of = |dep: &DataDependency| format!("{file_kind}-{}-{}", period.label(), dep.plural);

        let partition = match chart.partition_mut(key) {
            Some(p) => p,
            None => {
                let dataset = dataset_of(first);
                tracing::error!(%dataset, %key, "chart partition missing");
                return Err(AlignError::MissingPartition { key, dataset });
            }
        };

        for dep in applicable {
            let Some(series) = partition.series(&dep.plural) else {
                continue;
            };
            let current = match find_current_element(series, now) {
                Ok(found) => found.cloned(),
                Err(OutOfOrder(position)) => {
                    let dataset = dataset_of(dep);
                    tracing::error!(%dataset, position, now, "current element lookup failed");
                    return Err(AlignError::Unordered { dataset, position });
                }
            };
            if let Some(element) = current {
                partition.set_current(&dep.singular, element);
            }
        }
    }
    Ok(())
}

fn align_single_files(chart: &mut Chart, dependencies: &[DataDependency]) -> Result<(), AlignError> {
    let mut single_files = dependencies
        .iter()
        .filter(|d| d.category == DependencyCategory::SingleFile)
        .peekable();
    let Some(&first) = single_files.peek() else {
        return Ok(());
    };

    let key = ChartKey::AnyTimeFrame;
    let Some(partition) = chart.partition_mut(key) else {
        let dataset = format!("{key}-{}", first.plural);
        tracing::error!(%dataset, "chart partition missing");
        return Err(AlignError::MissingPartition { key, dataset });
    };

    for dep in single_files {
        let last = partition
            .series(&dep.plural)
            .and_then(|series| series.last())
            .cloned();
        match last {
            Some(element) => partition.set_current(&dep.singular, element),
            None => partition.clear_current(&dep.singular),
        }
    }
    Ok(())
}

/// Check that every series of every partition ends in ascending time order.
pub fn check_chart_order(chart: &Chart) -> Result<(), AlignError> {
    for key in chart.keys() {
        let Some(partition) = chart.partition(key) else {
            continue;
        };
        for (plural, series) in &partition.series {
            let unordered = series
                .windows(2)
                .position(|pair| pair[1].end < pair[0].end);
            if let Some(position) = unordered {
                let dataset = format!("{key}-{plural}");
                tracing::error!(%dataset, position = position + 1, "series out of order");
                return Err(AlignError::Unordered {
                    dataset,
                    position: position + 1,
                });
            }
        }
    }
    Ok(())
}
