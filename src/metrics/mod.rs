//! Intensity measures for processed stations

pub mod imc;
pub mod imt;
pub mod oscillator;

pub use imc::{greater_of_two_horizontals, Imc};
pub use imt::Imt;

use crate::config::{validate_metrics_config, FailedStreamPolicy, MetricsConfig};
use crate::error::Result;
use crate::stream::Stream;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Label → value for one (IMT, IMC) pair
pub type ComponentValues = BTreeMap<String, f64>;

/// Results keyed by IMT name, then IMC name, then channel or component label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricTable {
    values: BTreeMap<String, BTreeMap<String, ComponentValues>>,
}

fn imt_key(name: &str) -> String {
    Imt::parse(name).map_or_else(|| name.trim().to_ascii_uppercase(), |imt| imt.name())
}

fn imc_key(name: &str) -> String {
    Imc::parse(name).map_or_else(|| name.trim().to_ascii_uppercase(), |imc| imc.name())
}

impl MetricTable {
    fn insert(&mut self, imt: &Imt, imc: &Imc, values: ComponentValues) {
        self.values
            .entry(imt.name())
            .or_default()
            .insert(imc.name(), values);
    }

    /// Values for one pair; names are matched case-insensitively (`sa1.0` finds `SA(1.0)`)
    pub fn get(&self, imt: &str, imc: &str) -> Option<&ComponentValues> {
        self.values.get(&imt_key(imt))?.get(&imc_key(imc))
    }

    /// A single labelled value, e.g. `value("pga", "channels", "HN1")`
    pub fn value(&self, imt: &str, imc: &str, label: &str) -> Option<f64> {
        let values = self.get(imt, imc)?;
        values
            .get(label)
            .or_else(|| values.get(&imc_key(label)))
            .copied()
    }

    /// IMT names present in the table
    pub fn imts(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// IMC names computed for `imt`
    pub fn imcs(&self, imt: &str) -> Vec<&str> {
        self.values
            .get(&imt_key(imt))
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of (IMT, IMC) pairs
    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_requests<S: AsRef<str>>(imcs: &[S], imts: &[S]) -> (Vec<Imc>, Vec<Imt>) {
    let imcs = imcs
        .iter()
        .filter_map(|name| {
            let parsed = Imc::parse(name.as_ref());
            if parsed.is_none() {
                warn!("skipping unrecognised IMC '{}'", name.as_ref());
            }
            parsed
        })
        .collect();
    let imts = imts
        .iter()
        .filter_map(|name| {
            let parsed = Imt::parse(name.as_ref());
            if parsed.is_none() {
                warn!("skipping unrecognised IMT '{}'", name.as_ref());
            }
            parsed
        })
        .collect();
    (imcs, imts)
}

/// Metrics for one station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSummary {
    pub station_id: String,
    /// Processing verdict of the stream the values came from
    pub passed: bool,
    pub table: MetricTable,
}

impl StationSummary {
    /// Compute every requested (IMT, IMC) pair for one stream.
    ///
    /// Unrecognised names are skipped with a warning. Any recognised pair that
    /// cannot be computed (e.g. a rotation on a stream without exactly two
    /// horizontals) fails the whole call.
    pub fn from_stream<S: AsRef<str>>(
        stream: &Stream,
        imcs: &[S],
        imts: &[S],
        config: &MetricsConfig,
    ) -> Result<Self> {
        validate_metrics_config(config)?;
        let (imcs, imts) = parse_requests(imcs, imts);
        let mut table = MetricTable::default();
        for imt in &imts {
            for imc in &imcs {
                let values =
                    imc.compute(imt, stream, config.damping_ratio, config.rotation_step_deg)?;
                table.insert(imt, imc, values);
            }
        }
        debug!("{}: {} metric pairs", stream.id(), table.len());
        Ok(Self {
            station_id: stream.id(),
            passed: stream.passed(),
            table,
        })
    }

    pub fn get(&self, imt: &str, imc: &str) -> Option<&ComponentValues> {
        self.table.get(imt, imc)
    }
}

/// A pair that could not be computed for one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairError {
    pub imt: String,
    pub imc: String,
    pub message: String,
}

/// Metrics for one station within a collection; pair failures do not abort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub station_id: String,
    pub passed: bool,
    /// Not computed because processing failed and the policy is `skip`
    pub skipped: bool,
    pub table: MetricTable,
    pub errors: Vec<PairError>,
}

fn summarize_one(
    stream: &Stream,
    imcs: &[Imc],
    imts: &[Imt],
    config: &MetricsConfig,
) -> CollectionSummary {
    let mut summary = CollectionSummary {
        station_id: stream.id(),
        passed: stream.passed(),
        skipped: false,
        table: MetricTable::default(),
        errors: Vec::new(),
    };

    if !summary.passed && config.failed_stream_policy == FailedStreamPolicy::Skip {
        debug!("{}: failed processing, metrics skipped", summary.station_id);
        summary.skipped = true;
        return summary;
    }

    for imt in imts {
        for imc in imcs {
            match imc.compute(imt, stream, config.damping_ratio, config.rotation_step_deg) {
                Ok(values) => summary.table.insert(imt, imc, values),
                Err(e) => {
                    warn!("{}: {} / {} failed: {}", summary.station_id, imt, imc, e);
                    summary.errors.push(PairError {
                        imt: imt.name(),
                        imc: imc.name(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
    summary
}

/// Compute metrics for many stations in parallel.
///
/// Each pair is independent: a failing pair is recorded in `errors` and the
/// rest of the table is still filled. Failed streams are skipped or flagged
/// according to `config.failed_stream_policy`.
pub fn summarize_streams<S: AsRef<str>>(
    streams: &[Stream],
    imcs: &[S],
    imts: &[S],
    config: &MetricsConfig,
) -> Vec<CollectionSummary> {
    let (imcs, imts) = parse_requests(imcs, imts);
    streams
        .par_iter()
        .map(|stream| summarize_one(stream, &imcs, &imts, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_normalises_names() {
        let mut table = MetricTable::default();
        table.insert(
            &Imt::Sa(1.0),
            &Imc::RotD(50.0),
            BTreeMap::from([("ROTD(50.0)".to_string(), 12.5)]),
        );

        assert_eq!(table.value("sa1.0", "rotd50", "rotd50"), Some(12.5));
        assert_eq!(table.value("SA(1.0)", "ROTD(50.0)", "ROTD(50.0)"), Some(12.5));
        assert!(table.get("sa(2.0)", "rotd50").is_none());
        assert_eq!(table.imcs("sa(1.0)"), vec!["ROTD(50.0)"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_serializes_as_nested_maps() {
        let mut table = MetricTable::default();
        table.insert(&Imt::Pga, &Imc::Channels, BTreeMap::from([("HN1".to_string(), 1.0)]));
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["PGA"]["CHANNELS"]["HN1"], 1.0);
    }
}
