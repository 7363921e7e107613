//! VCF ingestion: row-level fields only, with contig recoding.
//!
//! Per-sample columns (FORMAT onwards) are ignored. INFO entries surface as
//! `info.<KEY>` string columns over the union of keys seen in the records;
//! flag entries read as "true". Gzip-compressed sources are handled
//! transparently, including the block-gzip files common for variant data.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};

use flate2::read::MultiGzDecoder;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::registry::recode_contig;
use crate::transform::allele_pair;

struct VcfRecord {
    locus: String,
    alleles: String,
    rsid: Option<String>,
    qual: Option<f64>,
    filters: Option<String>,
    info: BTreeMap<String, String>,
}

pub(crate) fn read_vcf(location: &str) -> Result<DataFrame> {
    let file = File::open(location).map_err(|source| PipelineError::SourceRead {
        path: location.to_string(),
        source,
    })?;
    let reader: Box<dyn BufRead> = if location.ends_with(".gz") || location.ends_with(".bgz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut records = Vec::new();
    let mut info_keys: BTreeSet<String> = BTreeSet::new();
    for line in reader.lines() {
        let line = line.map_err(|source| PipelineError::SourceRead {
            path: location.to_string(),
            source,
        })?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = parse_record(location, &line)?;
        info_keys.extend(record.info.keys().cloned());
        records.push(record);
    }

    let mut columns = vec![
        Series::new(
            "locus",
            records.iter().map(|r| r.locus.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            "alleles",
            records.iter().map(|r| r.alleles.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            "rsid",
            records.iter().map(|r| r.rsid.clone()).collect::<Vec<_>>(),
        ),
        Series::new(
            "qual",
            records.iter().map(|r| r.qual).collect::<Vec<_>>(),
        ),
        Series::new(
            "filters",
            records.iter().map(|r| r.filters.clone()).collect::<Vec<_>>(),
        ),
    ];
    for key in &info_keys {
        let values: Vec<Option<String>> = records.iter().map(|r| r.info.get(key).cloned()).collect();
        columns.push(Series::new(&format!("info.{key}"), values));
    }

    Ok(DataFrame::new(columns)?)
}

fn parse_record(location: &str, line: &str) -> Result<VcfRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 8 {
        return Err(PipelineError::SourceParse {
            path: location.to_string(),
            detail: format!("VCF record has {} fields, expected at least 8", fields.len()),
        });
    }

    let contig = recode_contig(fields[0]).to_string();
    let position = fields[1];
    let locus = format!("{contig}:{position}");
    let alleles = allele_pair(fields[3], fields[4]);
    let rsid = missing_to_none(fields[2]);
    let qual = match fields[5] {
        "." => None,
        raw => Some(raw.parse::<f64>().map_err(|_| PipelineError::SourceParse {
            path: location.to_string(),
            detail: format!("bad QUAL value {raw:?}"),
        })?),
    };
    let filters = missing_to_none(fields[6]);

    let mut info = BTreeMap::new();
    if fields[7] != "." {
        for entry in fields[7].split(';') {
            if entry.is_empty() {
                continue;
            }
            match entry.split_once('=') {
                Some((key, value)) => info.insert(key.to_string(), value.to_string()),
                // A bare key is a flag.
                None => info.insert(entry.to_string(), "true".to_string()),
            };
        }
    }

    Ok(VcfRecord {
        locus,
        alleles,
        rsid,
        qual,
        filters,
        info,
    })
}

fn missing_to_none(raw: &str) -> Option<String> {
    if raw == "." {
        None
    } else {
        Some(raw.to_string())
    }
}
