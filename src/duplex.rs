use std::fmt;

pub const FIELD_SEPARATOR: char = '\t';
pub const COMMENT_MARKER: char = '#';

/// Positional fields of one microrna.org prediction line, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplexField {
    MirnaAccession,
    MirnaName,
    GeneId,
    GeneSymbol,
    TranscriptId,
    ExtTranscriptId,
    MirnaAlignment,
    Alignment,
    GeneAlignment,
    MirnaStart,
    MirnaEnd,
    GeneStart,
    GeneEnd,
    GenomeCoordinates,
    Conservation,
    AlignScore,
    SeedCategory,
    Energy,
    MirsvrScore,
}

pub const FIELD_COUNT: usize = 19;

impl DuplexField {
    pub const ALL: [DuplexField; FIELD_COUNT] = [
        DuplexField::MirnaAccession,
        DuplexField::MirnaName,
        DuplexField::GeneId,
        DuplexField::GeneSymbol,
        DuplexField::TranscriptId,
        DuplexField::ExtTranscriptId,
        DuplexField::MirnaAlignment,
        DuplexField::Alignment,
        DuplexField::GeneAlignment,
        DuplexField::MirnaStart,
        DuplexField::MirnaEnd,
        DuplexField::GeneStart,
        DuplexField::GeneEnd,
        DuplexField::GenomeCoordinates,
        DuplexField::Conservation,
        DuplexField::AlignScore,
        DuplexField::SeedCategory,
        DuplexField::Energy,
        DuplexField::MirsvrScore,
    ];

    /// Hash field name used in the cache.
    pub fn name(self) -> &'static str {
        match self {
            DuplexField::MirnaAccession => "mirbase_acc",
            DuplexField::MirnaName => "mirna_name",
            DuplexField::GeneId => "gene_id",
            DuplexField::GeneSymbol => "gene_symbol",
            DuplexField::TranscriptId => "transcript_id",
            DuplexField::ExtTranscriptId => "ext_transcript_id",
            DuplexField::MirnaAlignment => "mirna_alignment",
            DuplexField::Alignment => "alignment",
            DuplexField::GeneAlignment => "gene_alignment",
            DuplexField::MirnaStart => "mirna_start",
            DuplexField::MirnaEnd => "mirna_end",
            DuplexField::GeneStart => "gene_start",
            DuplexField::GeneEnd => "gene_end",
            DuplexField::GenomeCoordinates => "genome_coordinates",
            DuplexField::Conservation => "conservation",
            DuplexField::AlignScore => "align_score",
            DuplexField::SeedCategory => "seed_cat",
            DuplexField::Energy => "energy",
            DuplexField::MirsvrScore => "mirsvr_score",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DuplexField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDuplexError {
    pub found: usize,
}

impl fmt::Display for ParseDuplexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} fields, found {}", FIELD_COUNT, self.found)
    }
}

impl std::error::Error for ParseDuplexError {}

/// One miRNA-to-target binding record. Values are kept verbatim; only the
/// gene alignment start is ever interpreted, and only at comparison time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplex {
    values: Vec<String>,
}

impl Duplex {
    /// Splits a dataset line into its positional fields. Fields beyond the
    /// nineteenth are ignored.
    pub fn from_line(line: &str) -> Result<Self, ParseDuplexError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let values: Vec<String> = line
            .split(FIELD_SEPARATOR)
            .take(FIELD_COUNT)
            .map(str::to_string)
            .collect();
        if values.len() < FIELD_COUNT {
            return Err(ParseDuplexError { found: values.len() });
        }
        Ok(Self { values })
    }

    pub fn get(&self, field: DuplexField) -> &str {
        &self.values[field.index()]
    }

    pub fn transcript_id(&self) -> &str {
        self.get(DuplexField::TranscriptId)
    }

    pub fn mirna_name(&self) -> &str {
        self.get(DuplexField::MirnaName)
    }

    /// `(name, value)` pairs in file order, ready to be written as a hash.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        DuplexField::ALL
            .iter()
            .map(|f| (f.name(), self.get(*f)))
            .collect()
    }
}

pub fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_line(transcript: &str, gene_start: u32) -> String {
        [
            "MIMAT0000062", "hsa-let-7a", "5270", "SERPINE2", transcript, "uc002vnu.2",
            "uugAUAUGUUGGAUGAUGGAGu", "   | |:|||||||||| ", "aaaUUUUUCUACUACCUCu",
            "2", "21", &gene_start.to_string(), &(gene_start + 19).to_string(),
            "[hg19:2:224840068-224840087:-]", "0.5684", "122", "0", "-14.73", "-0.7132",
        ]
        .join("\t")
    }

    #[test]
    fn test_from_line_maps_positions() {
        let duplex = Duplex::from_line(&sample_line("NM_006216", 1048)).unwrap();
        assert_eq!(duplex.get(DuplexField::MirnaAccession), "MIMAT0000062");
        assert_eq!(duplex.mirna_name(), "hsa-let-7a");
        assert_eq!(duplex.transcript_id(), "NM_006216");
        assert_eq!(duplex.get(DuplexField::Alignment), "   | |:|||||||||| ");
        assert_eq!(duplex.get(DuplexField::GeneStart), "1048");
        assert_eq!(duplex.get(DuplexField::GeneEnd), "1067");
        assert_eq!(duplex.get(DuplexField::MirsvrScore), "-0.7132");
    }

    #[test]
    fn test_from_line_strips_line_terminator_only() {
        let line = format!("{}\r\n", sample_line("NM_006216", 10));
        let duplex = Duplex::from_line(&line).unwrap();
        assert_eq!(duplex.get(DuplexField::MirsvrScore), "-0.7132");
    }

    #[test]
    fn test_eighteen_fields_is_malformed() {
        let line = sample_line("NM_006216", 10);
        let truncated = line.rsplit_once('\t').unwrap().0;
        let err = Duplex::from_line(truncated).unwrap_err();
        assert_eq!(err, ParseDuplexError { found: 18 });
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let line = format!("{}\textra", sample_line("NM_006216", 10));
        let duplex = Duplex::from_line(&line).unwrap();
        assert_eq!(duplex.fields().len(), FIELD_COUNT);
    }

    #[test]
    fn test_field_order_matches_names() {
        let names: Vec<&str> = DuplexField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names[9], "mirna_start");
        assert_eq!(names[11], "gene_start");
        assert_eq!(names[18], "mirsvr_score");
        for (i, f) in DuplexField::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn test_comment_lines() {
        assert!(is_comment("#mirbase_acc\tmirna_name"));
        assert!(!is_comment("MIMAT0000062\thsa-let-7a"));
    }
}
