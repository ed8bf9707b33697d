//! Decoding of Prometheus text exposition bodies.

use std::collections::HashMap;

use prometheus_parse::{Sample, Scrape};

use crate::error::CheckError;

/// Decode an exposition body into a map from metric family name to its
/// samples. The body must be UTF-8; undecodable input is a parse error.
pub fn parse_families(body: &[u8]) -> Result<HashMap<String, Vec<Sample>>, CheckError> {
    let text = std::str::from_utf8(body).map_err(|e| CheckError::MetricsParse(e.to_string()))?;
    let scrape = Scrape::parse(
        text.lines()
            .map(|line| Ok::<String, std::io::Error>(line.to_string())),
    )
    .map_err(|e| CheckError::MetricsParse(e.to_string()))?;

    let mut families: HashMap<String, Vec<Sample>> = HashMap::new();
    for sample in scrape.samples {
        families
            .entry(sample.metric.clone())
            .or_default()
            .push(sample);
    }
    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "\
# HELP lotus_chain_node_worker_height Height of the working chain.\n\
# TYPE lotus_chain_node_worker_height gauge\n\
lotus_chain_node_worker_height 42\n\
lotus_chain_node_height 41\n";

    #[test]
    fn families_keyed_by_metric_name() {
        let families = parse_families(BODY.as_bytes()).unwrap();
        assert!(families.contains_key("lotus_chain_node_worker_height"));
        assert!(families.contains_key("lotus_chain_node_height"));

        let samples = &families["lotus_chain_node_worker_height"];
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn empty_body_yields_no_families() {
        let families = parse_families(b"").unwrap();
        assert!(families.is_empty());
    }

    #[test]
    fn labelled_samples_group_under_one_family() {
        let body = "\
worker_height{miner=\"t01000\"} 10\n\
worker_height{miner=\"t01001\"} 12\n";
        let families = parse_families(body.as_bytes()).unwrap();
        assert_eq!(families["worker_height"].len(), 2);
    }

    #[test]
    fn non_utf8_body_is_a_parse_error() {
        let err = parse_families(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, CheckError::MetricsParse(_)), "got {err:?}");
    }
}
