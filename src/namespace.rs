use crate::error::TriplexError;
use std::fmt;

pub const SEPARATOR: char = ':';

/// A dataset preset that can be selected by its shortcut on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespacePreset {
    pub shortcut: &'static str,
    pub source: &'static str,
    pub release: &'static str,
    pub organism: &'static str,
    pub genome: &'static str,
    pub location: &'static str,
}

pub const MICRORNA_ORG: &str = "microrna.org";

pub const KNOWN_NAMESPACES: &[NamespacePreset] = &[
    NamespacePreset {
        shortcut: "test",
        source: MICRORNA_ORG,
        release: "aug.2010",
        organism: "hsa",
        genome: "hg19",
        location: "data/microrna.org__aug.2010__hsa__hg19.test",
    },
    NamespacePreset {
        shortcut: "1",
        source: MICRORNA_ORG,
        release: "aug.2010",
        organism: "hsa",
        genome: "hg19",
        location: "https://zenodo.org/record/3870932/files/microrna.org__aug.2010__hsa__hg19.tsv",
    },
    NamespacePreset {
        shortcut: "2",
        source: MICRORNA_ORG,
        release: "aug.2010",
        organism: "mmu",
        genome: "mm9",
        location: "https://zenodo.org/record/3870932/files/microrna.org__aug.2010__mmu__mm9.tsv",
    },
    NamespacePreset {
        shortcut: "3",
        source: MICRORNA_ORG,
        release: "aug.2010",
        organism: "rno",
        genome: "rn4",
        location: "https://zenodo.org/record/3870932/files/microrna.org__aug.2010__rno__rn4.tsv",
    },
    NamespacePreset {
        shortcut: "4",
        source: MICRORNA_ORG,
        release: "aug.2010",
        organism: "dme",
        genome: "dm3",
        location: "https://zenodo.org/record/3870932/files/microrna.org__aug.2010__dme__dm3.tsv",
    },
];

impl NamespacePreset {
    pub fn namespace(&self) -> Namespace {
        Namespace {
            source: self.source.to_string(),
            release: self.release.to_string(),
            organism: self.organism.to_string(),
            genome: self.genome.to_string(),
        }
    }
}

/// Partition key isolating one dataset's cached state: `source:release:organism:genome`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub source: String,
    pub release: String,
    pub organism: String,
    pub genome: String,
}

impl Namespace {
    pub fn new(source: &str, release: &str, organism: &str, genome: &str) -> Result<Self, TriplexError> {
        let parts = [source, release, organism, genome];
        if let Some(bad) = parts.iter().find(|p| p.is_empty() || p.contains(SEPARATOR)) {
            return Err(TriplexError::Namespace(format!(
                "namespace component {:?} must be non-empty and contain no '{}'",
                bad, SEPARATOR
            )));
        }
        Ok(Self {
            source: source.to_string(),
            release: release.to_string(),
            organism: organism.to_string(),
            genome: genome.to_string(),
        })
    }

    /// Accepts a registry shortcut (`test`, `1`..`4`) or a literal namespace string.
    pub fn resolve(value: &str) -> Result<Self, TriplexError> {
        if let Some(preset) = KNOWN_NAMESPACES.iter().find(|p| p.shortcut == value) {
            return Ok(preset.namespace());
        }
        let parts: Vec<&str> = value.split(SEPARATOR).collect();
        match parts.as_slice() {
            [source, release, organism, genome] => Self::new(source, release, organism, genome),
            _ => Err(TriplexError::Namespace(format!(
                "{:?} is neither a known shortcut nor a source:release:organism:genome string",
                value
            ))),
        }
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.source,
            self.release,
            self.organism,
            self.genome,
            sep = SEPARATOR
        )
    }
}
