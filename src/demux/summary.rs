use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;

use super::engine::{Classification, Label};
use crate::runtime::Error;

pub const HISTOGRAM_FILENAME: &str = "distance_histogram.tsv";
pub const FREQUENCY_LOG_FILENAME: &str = "frequency_logfile.txt";

const RULE: &str = "..................";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MismatchCounts {
    pub zero: u64,
    pub one: u64,
    pub higher: u64,
}

impl MismatchCounts {
    pub fn total(&self) -> u64 {
        self.zero + self.one + self.higher
    }
}

#[derive(Serialize)]
struct HistogramCsvRow {
    distance: usize,
    count: u64,
}

///////////////////////////////
/// Counters accumulated over a whole demultiplexing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cutoff: usize,
    pub matched: u64,
    pub ambiguous: u64,
    pub no_match: u64,
    pub distance_histogram: BTreeMap<usize, u64>,
    pub per_barcode: BTreeMap<String, MismatchCounts>,
}

impl RunSummary {
    pub fn new(cutoff: usize) -> RunSummary {
        RunSummary {
            cutoff,
            matched: 0,
            ambiguous: 0,
            no_match: 0,
            distance_histogram: (0..=cutoff).map(|d| (d, 0)).collect(),
            per_barcode: BTreeMap::new(),
        }
    }

    pub fn total_reads(&self) -> u64 {
        self.matched + self.ambiguous + self.no_match
    }

    /// Count one classified read pair
    pub fn record(&mut self, classification: &Classification) {
        match &classification.label {
            Label::Matched(barcode) => {
                self.matched += 1;
                let counts = self.per_barcode.entry(barcode.clone()).or_default();
                match classification.distance {
                    Some(0) => counts.zero += 1,
                    Some(1) => counts.one += 1,
                    _ => counts.higher += 1,
                }
            }
            Label::Ambiguous => self.ambiguous += 1,
            Label::NoMatch => self.no_match += 1,
        }
    }

    pub fn bin_distance(&mut self, distance: usize) {
        *self.distance_histogram.entry(distance).or_insert(0) += 1;
    }

    pub fn log_histogram(&self) {
        for (distance, count) in &self.distance_histogram {
            info!("distance {}: {}", distance, count);
        }
    }

    ///////////////////////////////
    /// Tab-separated histogram of minimum distance per read pair
    pub fn write_histogram(&self, path: &Path) -> Result<(), Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;

        for (distance, count) in &self.distance_histogram {
            writer
                .serialize(HistogramCsvRow {
                    distance: *distance,
                    count: *count,
                })
                .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;
        }
        writer.flush().map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    ///////////////////////////////
    /// Human-readable breakdown of match quality
    pub fn render(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let total = self.total_reads();

        writeln!(out, "Total reads: {}", total)?;
        writeln!(out, "{}", RULE)?;

        writeln!(out, "Ambiguous:")?;
        writeln!(out, "{}", RULE)?;
        writeln!(
            out,
            "Total ambiguous reads: {} ({:.2}%)\n",
            self.ambiguous,
            percent(self.ambiguous, total)
        )?;

        writeln!(out, "No match:")?;
        writeln!(out, "{}", RULE)?;
        writeln!(
            out,
            "Total non-match reads: {} ({:.2}%)\n",
            self.no_match,
            percent(self.no_match, total)
        )?;

        for (barcode, counts) in &self.per_barcode {
            let bc_total = counts.total();
            writeln!(out, "Barcode: {}", barcode)?;
            writeln!(out, "{}", RULE)?;
            writeln!(
                out,
                "Zero base mismatch: {:.2}%",
                percent(counts.zero, bc_total)
            )?;
            writeln!(
                out,
                "One base mismatch: {:.2}%",
                percent(counts.one, bc_total)
            )?;
            writeln!(
                out,
                "Higher base mismatch: {:.2}%",
                percent(counts.higher, bc_total)
            )?;
            writeln!(
                out,
                "Total read for this barcode: {} (percent of total reads: {:.2}%)\n",
                bc_total,
                percent(bc_total, total)
            )?;
        }
        Ok(())
    }

    pub fn render_frequency_log(&self) -> Result<String, Error> {
        let mut out = String::new();
        self.render(&mut out)
            .map_err(|e| Error::parse_error("frequency log", Some(e.to_string())))?;
        Ok(out)
    }

    pub fn write_frequency_log(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, self.render_frequency_log()?).map_err(|e| Error::io(path, e))
    }

    /// Write both reports into a directory
    pub fn write_reports(&self, dir_out: &Path) -> Result<(), Error> {
        self.write_histogram(&dir_out.join(HISTOGRAM_FILENAME))?;
        self.write_frequency_log(&dir_out.join(FREQUENCY_LOG_FILENAME))?;
        Ok(())
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(bc: &str, d: usize) -> Classification {
        Classification {
            label: Label::Matched(bc.to_string()),
            distance: Some(d),
        }
    }

    #[test]
    fn test_histogram_is_prefilled() {
        let s = RunSummary::new(2);
        assert_eq!(
            s.distance_histogram.iter().collect::<Vec<_>>(),
            vec![(&0, &0), (&1, &0), (&2, &0)]
        );
        assert_eq!(s.total_reads(), 0);
    }

    #[test]
    fn test_record_splits_by_mismatch() {
        let mut s = RunSummary::new(3);
        s.record(&matched("AAAAAA", 0));
        s.record(&matched("AAAAAA", 1));
        s.record(&matched("AAAAAA", 3));
        s.record(&matched("CCCCCC", 0));
        s.record(&Classification {
            label: Label::Ambiguous,
            distance: Some(1),
        });
        s.record(&Classification {
            label: Label::NoMatch,
            distance: None,
        });

        assert_eq!(s.matched, 4);
        assert_eq!(s.ambiguous, 1);
        assert_eq!(s.no_match, 1);
        assert_eq!(s.total_reads(), 6);
        assert_eq!(
            s.per_barcode["AAAAAA"],
            MismatchCounts {
                zero: 1,
                one: 1,
                higher: 1
            }
        );
        assert_eq!(s.per_barcode["CCCCCC"].total(), 1);
    }

    #[test]
    fn test_frequency_log_content() {
        let mut s = RunSummary::new(1);
        s.record(&matched("AAAAAA", 0));
        s.record(&matched("AAAAAA", 1));
        s.record(&matched("AAAAAA", 0));
        s.record(&Classification {
            label: Label::NoMatch,
            distance: None,
        });

        let text = s.render_frequency_log().unwrap();
        assert!(text.starts_with("Total reads: 4\n"));
        assert!(text.contains("Total ambiguous reads: 0 (0.00%)"));
        assert!(text.contains("Total non-match reads: 1 (25.00%)"));
        assert!(text.contains("Barcode: AAAAAA\n"));
        assert!(text.contains("Zero base mismatch: 66.67%"));
        assert!(text.contains("One base mismatch: 33.33%"));
        assert!(text.contains("Higher base mismatch: 0.00%"));
        assert!(text.contains("Total read for this barcode: 3 (percent of total reads: 75.00%)"));
    }

    #[test]
    fn test_empty_run_has_no_nan() {
        let text = RunSummary::new(1).render_frequency_log().unwrap();
        assert!(text.contains("Total ambiguous reads: 0 (0.00%)"));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_render_stops_at_writer_error() {
        struct Capped(String);
        impl fmt::Write for Capped {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                if self.0.len() + s.len() > 20 {
                    return Err(fmt::Error);
                }
                self.0.push_str(s);
                Ok(())
            }
        }

        let mut s = RunSummary::new(1);
        s.record(&matched("AAAAAA", 0));
        let mut out = Capped(String::new());
        assert!(s.render(&mut out).is_err());
        assert_eq!(out.0, "Total reads: 1\n");

        let mut full = String::new();
        s.render(&mut full).unwrap();
        assert_eq!(full, s.render_frequency_log().unwrap());
    }

    #[test]
    fn test_write_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = RunSummary::new(1);
        s.bin_distance(0);
        s.bin_distance(0);
        s.bin_distance(1);
        s.write_reports(dir.path()).unwrap();

        let hist = fs::read_to_string(dir.path().join(HISTOGRAM_FILENAME)).unwrap();
        assert_eq!(hist, "distance\tcount\n0\t2\n1\t1\n");
        assert!(dir.path().join(FREQUENCY_LOG_FILENAME).exists());
    }
}
