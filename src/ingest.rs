use crate::cache::{CacheBackend, NamespaceCache};
use crate::duplex::{is_comment, Duplex};
use crate::error::TriplexError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub lines: usize,
    pub comments: usize,
    pub duplexes: usize,
    pub malformed: usize,
    /// Pending-set size once the dataset has been read.
    pub targets: usize,
}

/// Reads a tab-separated prediction dataset into the cache, grouping
/// duplexes by target transcript and registering every target as pending.
///
/// Re-ingesting into a populated namespace is not deduplicated; resetting a
/// namespace beforehand is up to the caller.
pub struct DuplexIngestor;

impl DuplexIngestor {
    pub fn ingest_path<B: CacheBackend>(
        cache: &mut NamespaceCache<B>,
        path: &Path,
    ) -> Result<IngestReport, TriplexError> {
        info!(dataset = %path.display(), namespace = %cache.namespace(), "reading duplexes");
        let file = File::open(path)?;
        Self::ingest_reader(cache, BufReader::new(file))
    }

    pub fn ingest_reader<B: CacheBackend, R: BufRead>(
        cache: &mut NamespaceCache<B>,
        reader: R,
    ) -> Result<IngestReport, TriplexError> {
        let mut report = IngestReport::default();

        for line in reader.lines() {
            let line = line?;
            report.lines += 1;

            if is_comment(&line) {
                report.comments += 1;
                continue;
            }

            let duplex = match Duplex::from_line(&line) {
                Ok(d) => d,
                Err(e) => {
                    report.malformed += 1;
                    warn!(line = report.lines, error = %e, "skipping malformed dataset line");
                    continue;
                }
            };

            let duplex_key = cache.duplex_key(report.lines);
            let target_key = cache.target_key(duplex.transcript_id());

            cache.put_duplex(&duplex_key, &duplex)?;
            cache.add_to_target_set(&target_key, &duplex_key)?;
            cache.add_pending_target(&target_key)?;
            report.duplexes += 1;

            debug!(
                duplex = %duplex_key,
                target_key = %target_key,
                mirna = duplex.mirna_name(),
                "cached duplex"
            );
        }

        report.targets = cache.pending_count()?;
        info!(
            duplexes = report.duplexes,
            targets = report.targets,
            malformed = report.malformed,
            comments = report.comments,
            "found {} RNA duplexes across {} target genes",
            report.duplexes,
            report.targets
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplex::DuplexField;
    use crate::memory_cache::MemoryCache;
    use crate::namespace::Namespace;
    use std::io::Cursor;

    fn line(transcript: &str, mirna: &str, gene_start: u32) -> String {
        let mut fields = vec!["x".to_string(); 19];
        fields[DuplexField::MirnaName.index()] = mirna.to_string();
        fields[DuplexField::TranscriptId.index()] = transcript.to_string();
        fields[DuplexField::GeneStart.index()] = gene_start.to_string();
        fields.join("\t")
    }

    fn cache() -> NamespaceCache<MemoryCache> {
        NamespaceCache::new(Namespace::resolve("test").unwrap(), MemoryCache::new())
    }

    #[test]
    fn test_groups_duplexes_by_target() {
        let data = [
            "#mirbase_acc\tmirna_name".to_string(),
            line("NM_1", "hsa-let-7a", 100),
            line("NM_1", "hsa-miR-21", 115),
            line("NM_2", "hsa-miR-155", 40),
        ]
        .join("\n");
        let mut cache = cache();
        let report = DuplexIngestor::ingest_reader(&mut cache, Cursor::new(data)).unwrap();

        assert_eq!(
            report,
            IngestReport { lines: 4, comments: 1, duplexes: 3, malformed: 0, targets: 2 }
        );
        let target = cache.target_key("NM_1");
        let mut members = cache.duplex_set(&target).unwrap();
        members.sort();
        assert_eq!(members, vec![cache.duplex_key(2), cache.duplex_key(3)]);
        assert_eq!(
            cache.field(&cache.duplex_key(3), "mirna_name").unwrap(),
            Some("hsa-miR-21".to_string())
        );
        assert_eq!(
            cache.field(&cache.duplex_key(3), "gene_start").unwrap(),
            Some("115".to_string())
        );
    }

    #[test]
    fn test_malformed_line_is_skipped_and_counted() {
        let short: Vec<&str> = vec!["f"; 18];
        let data = [short.join("\t"), line("NM_1", "hsa-let-7a", 100)].join("\n");
        let mut cache = cache();
        let report = DuplexIngestor::ingest_reader(&mut cache, Cursor::new(data)).unwrap();

        assert_eq!(report.malformed, 1);
        assert_eq!(report.duplexes, 1);
        assert_eq!(report.targets, 1);
        assert_eq!(cache.field(&cache.duplex_key(1), "gene_start").unwrap(), None);
        assert_eq!(cache.duplex_key(2), format!("{}:duplex:line2", cache.namespace()));
        assert!(cache.field(&cache.duplex_key(2), "gene_start").unwrap().is_some());
    }

    #[test]
    fn test_unreachable_cache_aborts_ingestion() {
        let store = MemoryCache::new();
        store.set_offline(true);
        let mut cache = NamespaceCache::new(Namespace::resolve("test").unwrap(), store);
        let data = line("NM_1", "hsa-let-7a", 100);
        let err = DuplexIngestor::ingest_reader(&mut cache, Cursor::new(data)).unwrap_err();
        assert!(err.is_cache_failure());
    }

    #[test]
    fn test_ingest_path_reads_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("dataset.tsv");
        std::fs::write(&path, format!("{}\n{}\n", line("NM_9", "a", 1), line("NM_9", "b", 20))).unwrap();
        let mut cache = cache();
        let report = DuplexIngestor::ingest_path(&mut cache, &path).unwrap();
        assert_eq!(report.duplexes, 2);
        assert_eq!(report.targets, 1);
    }
}
