use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use itertools::Itertools;
use log::{debug, info};

use crate::bktree::{load_tree, BkTree, Hamming, Metric};
use crate::utils::expand_and_resolve_path;

pub const DEFAULT_SEARCH_MAX_DISTANCE: &str = "1";

/// Commandline option: Look up one barcode in an index
#[derive(Args)]
pub struct SearchCMD {
    // Index made by build-dict
    #[arg(short = 'd', long = "dict", value_parser)]
    pub path_dict: PathBuf,

    #[arg(short = 'q', long = "query")]
    pub query: String,

    // Maximum distance of reported hits
    #[arg(short = 'm', long = "mismatch", value_parser = clap::value_parser!(usize), default_value = DEFAULT_SEARCH_MAX_DISTANCE)]
    pub max_distance: usize,
}

///////////////////////////////
/// All entries within `max_distance` of the query, closest first and then
/// alphabetically
pub fn search_hits<'a>(
    tree: &'a BkTree<String, Hamming>,
    query: &str,
    max_distance: usize,
) -> Result<Vec<(usize, &'a String)>> {
    let query = query.to_string();
    let mut hits = Vec::new();
    for hit in tree.find(&query, max_distance)? {
        hits.push((tree.metric().distance(hit, &query)?, hit));
    }
    Ok(hits.into_iter().sorted().collect())
}

impl SearchCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let path_dict = expand_and_resolve_path(&self.path_dict)?;
        let tree = load_tree(&path_dict, Hamming)
            .with_context(|| format!("Failed to load barcode index {}", path_dict.display()))?;
        debug!("Loaded index with {} barcodes", tree.len());

        let hits = search_hits(&tree, &self.query, self.max_distance)?;
        info!(
            "{} hits within distance {} of {}",
            hits.len(),
            self.max_distance,
            self.query
        );
        for (dist, barcode) in hits {
            println!("{}\t{}", barcode, dist);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_are_sorted() {
        let mut tree = BkTree::new(Hamming);
        for bc in ["CCCCCC", "AAAAAT", "AAAAAA", "AAAATT"] {
            tree.insert(bc.to_string()).unwrap();
        }
        let hits: Vec<_> = search_hits(&tree, "AAAAAA", 2)
            .unwrap()
            .into_iter()
            .map(|(d, bc)| (d, bc.as_str()))
            .collect();
        assert_eq!(hits, vec![(0, "AAAAAA"), (1, "AAAAAT"), (2, "AAAATT")]);
    }

    #[test]
    fn test_bad_query_length() {
        let mut tree = BkTree::new(Hamming);
        tree.insert("AAAAAA".to_string()).unwrap();
        assert!(search_hits(&tree, "AAA", 1).is_err());
    }
}
