//! Static registry of the mitochondrial reference datasets.
//!
//! Each entry couples a source location and format with the derivations that
//! normalize the source to the shared `(locus, alleles)` key and the fields
//! kept in the combined table. The registry does no validation of the
//! derivations; a bad pattern surfaces when the dataset is loaded.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::transform::RowTransform;

/// Canonical contig name for mitochondrial DNA.
pub const MITO_CONTIG: &str = "chrM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A prebuilt columnar table (Parquet, or an artifact directory written
    /// by this tool).
    Table,
    /// Tab-separated text with a header row.
    Tsv,
    /// A JSON array of flat objects.
    Json,
    /// Variant-call format, optionally gzip-compressed.
    Vcf,
}

#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub name: &'static str,
    pub source_location: String,
    pub source_format: SourceFormat,
    /// Derived fields, applied in order; an entry may overwrite a source
    /// field of the same name.
    pub derivations: Vec<(&'static str, RowTransform)>,
    /// Fields wrapped into the per-dataset nested column, in output order.
    pub retained_fields: Vec<&'static str>,
}

/// Alternate chromosome spellings mapped to the canonical `chr`-prefixed
/// names. Contigs not listed here pass through unchanged.
pub static CONTIG_RECODING: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("1", "chr1"),
        ("2", "chr2"),
        ("3", "chr3"),
        ("4", "chr4"),
        ("5", "chr5"),
        ("6", "chr6"),
        ("7", "chr7"),
        ("8", "chr8"),
        ("9", "chr9"),
        ("10", "chr10"),
        ("11", "chr11"),
        ("12", "chr12"),
        ("13", "chr13"),
        ("14", "chr14"),
        ("15", "chr15"),
        ("16", "chr16"),
        ("17", "chr17"),
        ("18", "chr18"),
        ("19", "chr19"),
        ("20", "chr20"),
        ("21", "chr21"),
        ("22", "chr22"),
        ("X", "chrX"),
        ("Y", "chrY"),
        ("MT", MITO_CONTIG),
        ("NW_009646201.1", "chr1"),
    ])
});

/// Recode a contig name to its canonical spelling.
pub fn recode_contig(contig: &str) -> &str {
    CONTIG_RECODING.get(contig).copied().unwrap_or(contig)
}

static REGISTRY: Lazy<BTreeMap<&'static str, DatasetDescriptor>> = Lazy::new(|| {
    use RowTransform::*;

    let descriptors = vec![
        DatasetDescriptor {
            name: "gnomad",
            source_location:
                "gs://gcp-public-data--gnomad/release/3.1/ht/genomes/gnomad.genomes.v3.1.sites.chrM.ht"
                    .to_string(),
            source_format: SourceFormat::Table,
            derivations: vec![],
            retained_fields: vec!["AN", "AC_hom", "AC_het", "AF_hom", "AF_het", "max_hl"],
        },
        DatasetDescriptor {
            name: "mitomap",
            source_location:
                "gs://seqr-reference-data/GRCh38/MITOMAP/Mitomap Confirmed Mutations Feb. 04 2022.tsv"
                    .to_string(),
            source_format: SourceFormat::Tsv,
            derivations: vec![
                (
                    "locus",
                    LocusFromPattern {
                        field: "Allele",
                        pattern: "m.([0-9]+)",
                    },
                ),
                (
                    "alleles",
                    AllelesFromPattern {
                        field: "Allele",
                        pattern: "m.[0-9]+([ATGC]+)>([ATGC]+)",
                    },
                ),
                (
                    "pathogenic",
                    Defined {
                        field: "Associated Diseases",
                    },
                ),
            ],
            retained_fields: vec!["pathogenic"],
        },
        DatasetDescriptor {
            name: "mitimpact",
            // from https://mitimpact.css-mendel.it/cdn/MitImpact_db_3.0.7.txt.zip
            source_location: "gs://seqr-reference-data/GRCh38/MitImpact/MitImpact_db_3.0.7.txt"
                .to_string(),
            source_format: SourceFormat::Tsv,
            derivations: vec![
                ("locus", LocusFromField { field: "Start" }),
                (
                    "alleles",
                    AllelesFromFields {
                        ref_field: "Ref",
                        alt_field: "Alt",
                    },
                ),
            ],
            retained_fields: vec!["APOGEE_score"],
        },
        DatasetDescriptor {
            name: "hmtvar",
            // from https://www.hmtvar.uniba.it/api/main/
            source_location: "gs://seqr-reference-data/GRCh38/HmtVar/HmtVar Jan. 10 2022.json"
                .to_string(),
            source_format: SourceFormat::Json,
            derivations: vec![
                ("locus", LocusFromField { field: "nt_start" }),
                (
                    "alleles",
                    AllelesFromFields {
                        ref_field: "ref_rCRS",
                        alt_field: "alt",
                    },
                ),
            ],
            retained_fields: vec!["disease_score"],
        },
        DatasetDescriptor {
            name: "helix",
            // from https://helix-research-public.s3.amazonaws.com/mito/HelixMTdb_20200327.tsv
            source_location: "gs://seqr-reference-data/GRCh38/Hilex/HelixMTdb_20200327.tsv"
                .to_string(),
            source_format: SourceFormat::Tsv,
            derivations: vec![
                (
                    "locus",
                    LocusFromSplit {
                        field: "locus",
                        separator: ':',
                        index: 1,
                    },
                ),
                (
                    "alleles",
                    AllelesFromPattern {
                        field: "alleles",
                        pattern: r#"\["([AGTC]+)","([AGTC]+)"\]"#,
                    },
                ),
            ],
            retained_fields: vec!["counts_hom", "AF_hom", "counts_het", "AF_het", "max_ARF"],
        },
        DatasetDescriptor {
            name: "clinvar",
            // from ftp://ftp.ncbi.nlm.nih.gov/pub/clinvar/vcf_GRCh38/clinvar.vcf.gz
            source_location:
                "gs://seqr-reference-data/GRCh38/clinvar/clinvar.GRCh38.2022-01-10.vcf.gz"
                    .to_string(),
            source_format: SourceFormat::Vcf,
            derivations: vec![
                (
                    "ALLELEID",
                    Passthrough {
                        field: "info.ALLELEID",
                    },
                ),
                (
                    "CLNSIG",
                    Passthrough {
                        field: "info.CLNSIG",
                    },
                ),
                (
                    "CLNREVSTAT",
                    Passthrough {
                        field: "info.CLNREVSTAT",
                    },
                ),
            ],
            retained_fields: vec!["ALLELEID", "CLNSIG", "CLNREVSTAT"],
        },
        DatasetDescriptor {
            name: "dbnsfp",
            source_location:
                "gs://seqr-reference-data/GRCh38/all_reference_data/v2/combined_reference_data_grch38-2.0.4.ht"
                    .to_string(),
            source_format: SourceFormat::Table,
            derivations: vec![],
            retained_fields: vec!["dbnsfp"],
        },
    ];

    descriptors.into_iter().map(|d| (d.name, d)).collect()
});

/// Look up a dataset by name.
pub fn descriptor(name: &str) -> Option<&'static DatasetDescriptor> {
    REGISTRY.get(name)
}

/// All registered dataset names, sorted.
pub fn names() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}
