use std::path::Path;

use crate::rcv::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// The columns holding the ranks of the candidates, with the candidate names
/// read from the header. Columns before `start_col`, the excluded columns and
/// the columns without a name are skipped.
pub fn candidate_columns(
    header: &[Option<String>],
    start_col: usize,
    excluded: &[usize],
) -> Vec<(usize, String)> {
    header
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx >= start_col && !excluded.contains(idx))
        .filter_map(|(idx, name)| match name.as_ref().map(|s| s.trim()) {
            Some(s) if !s.is_empty() => Some((idx, s.to_string())),
            _ => None,
        })
        .collect()
}

pub fn parse_rank(ballot_id: &str, candidate_name: &str, content: &str) -> BRcvResult<u32> {
    match content.trim().parse::<u32>() {
        Ok(rank) if rank > 0 => Ok(rank),
        _ => Err(Box::new(RcvError::ParsingRank {
            ballot_id: ballot_id.to_string(),
            candidate_name: candidate_name.to_string(),
            content: content.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ids_use_the_file_name() {
        let default_id = make_default_id("/some/dir/ballots.csv");
        assert_eq!(default_id(12), "ballots.csv-00000012");
    }

    #[test]
    fn columns_skip_ids_and_blanks() {
        let header = vec![
            Some("id".to_string()),
            Some("count".to_string()),
            Some("A".to_string()),
            None,
            Some(" B ".to_string()),
            Some("".to_string()),
        ];
        assert_eq!(
            candidate_columns(&header, 0, &[0, 1]),
            vec![(2, "A".to_string()), (4, "B".to_string())]
        );
        assert_eq!(candidate_columns(&header, 3, &[]), vec![(4, "B".to_string())]);
    }

    #[test]
    fn ranks_are_positive() {
        assert_eq!(parse_rank("b1", "A", " 2 ").unwrap(), 2);
        assert!(parse_rank("b1", "A", "0").is_err());
        assert!(parse_rank("b1", "A", "first").is_err());
        assert!(parse_rank("b1", "A", "-1").is_err());
    }
}
