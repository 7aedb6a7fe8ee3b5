use super::{Metric, MetricError};

///////////////////////////////
/// Substitution-only distance between two equal-length symbol strings.
/// No alignment is attempted: insertions and deletions are not modelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hamming;

impl Hamming {
    pub fn distance_bytes(source: &[u8], target: &[u8]) -> Result<usize, MetricError> {
        if source.is_empty() {
            return Err(MetricError::EmptyOperand { side: "source" });
        }
        if target.is_empty() {
            return Err(MetricError::EmptyOperand { side: "target" });
        }
        if source.len() != target.len() {
            return Err(length_mismatch(source, target));
        }

        Ok(source
            .iter()
            .zip(target.iter())
            .filter(|(a, b)| a != b)
            .count())
    }
}

#[cold]
fn length_mismatch(source: &[u8], target: &[u8]) -> MetricError {
    MetricError::LengthMismatch {
        source_seq: String::from_utf8_lossy(source).into_owned(),
        target_seq: String::from_utf8_lossy(target).into_owned(),
        source_len: source.len(),
        target_len: target.len(),
    }
}

impl Metric<String> for Hamming {
    fn distance(&self, a: &String, b: &String) -> Result<usize, MetricError> {
        Hamming::distance_bytes(a.as_bytes(), b.as_bytes())
    }
}

impl Metric<Vec<u8>> for Hamming {
    fn distance(&self, a: &Vec<u8>, b: &Vec<u8>) -> Result<usize, MetricError> {
        Hamming::distance_bytes(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn d(a: &str, b: &str) -> Result<usize, MetricError> {
        Hamming.distance(&a.to_string(), &b.to_string())
    }

    #[test]
    fn test_counts_substitutions() {
        assert_eq!(d("AAAAAA", "AAAAAA").unwrap(), 0);
        assert_eq!(d("AAAAAA", "AAAAAT").unwrap(), 1);
        assert_eq!(d("AAAACC", "CCCCCC").unwrap(), 4);
        assert_eq!(d("ACGT", "TGCA").unwrap(), 4);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(
            d("", "ACGT").unwrap_err(),
            MetricError::EmptyOperand { side: "source" }
        );
        assert_eq!(
            d("ACGT", "").unwrap_err(),
            MetricError::EmptyOperand { side: "target" }
        );
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = d("ACGTAC", "ACG").unwrap_err();
        match &err {
            MetricError::LengthMismatch {
                source_len,
                target_len,
                ..
            } => {
                assert_eq!(*source_len, 6);
                assert_eq!(*target_len, 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("ACGTAC"));
    }

    #[test]
    fn test_bytes_and_strings_agree() {
        let a = b"GATTACA".to_vec();
        let b = b"GATCACA".to_vec();
        assert_eq!(Hamming.distance(&a, &b).unwrap(), 1);
        assert_eq!(d("GATTACA", "GATCACA").unwrap(), 1);
    }

    #[test]
    fn test_metric_axioms_random() {
        let mut rng = StdRng::seed_from_u64(42);
        let random = |rng: &mut StdRng| -> Vec<u8> {
            (0..10).map(|_| b"ACGTN"[rng.gen_range(0..5)]).collect()
        };
        for _ in 0..1000 {
            let a = random(&mut rng);
            let b = random(&mut rng);
            let c = random(&mut rng);

            let ab = Hamming.distance(&a, &b).unwrap();
            let ba = Hamming.distance(&b, &a).unwrap();
            let bc = Hamming.distance(&b, &c).unwrap();
            let ac = Hamming.distance(&a, &c).unwrap();

            assert_eq!(ab, ba);
            assert_eq!(Hamming.distance(&a, &a).unwrap(), 0);
            assert!(ac <= ab + bc);
        }
    }
}
