// Primitives for reading CSV files.
// One row per ballot, one column per candidate holding the rank given to that candidate.

use crate::rcv::{
    io_common::{candidate_columns, make_default_id, parse_rank},
    *,
};

pub fn read_csv_likert(path: String, cfs: &FileSource) -> BRcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);

    let id_idx_o = cfs.id_column_index_int()?;
    let count_idx_o = cfs.count_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index()?;

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;
    let mut records = rdr.into_records();
    // The candidate names are on the row just above the first ballot.
    for _ in 1..first_row {
        _ = records.next();
    }
    let header = records
        .next()
        .context(MissingHeaderSnafu {})?
        .context(CsvLineParseSnafu {})?;
    let header: Vec<Option<String>> = header.iter().map(|s| Some(s.to_string())).collect();
    let excluded: Vec<usize> = id_idx_o.iter().chain(count_idx_o.iter()).cloned().collect();
    let columns = candidate_columns(&header, choices_start_col, &excluded);
    debug!("read_csv_likert: columns: {:?}", columns);
    if columns.is_empty() {
        return Err(Box::new(RcvError::MissingHeader {}));
    }

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = first_row + idx + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineToShortSnafu { lineno })?
                .to_string()
        } else {
            default_id(lineno)
        };

        let count: Option<u64> = if let Some(count_idx) = count_idx_o {
            let count_s = line.get(count_idx).context(CsvLineToShortSnafu { lineno })?;
            Some(
                count_s
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .context(ParsingCountSnafu { lineno })?,
            )
        } else {
            Some(1)
        };

        let mut ranks: Vec<(String, u32)> = Vec::new();
        for (col, name) in columns.iter() {
            match line.get(*col) {
                Some(s) if !s.trim().is_empty() => {
                    ranks.push((name.clone(), parse_rank(&id, name, s)?))
                }
                // Unranked
                _ => {}
            }
        }
        debug!(
            "read_csv_likert: lineno: {:?} count: {:?} ranks: {:?}",
            lineno, count, &ranks
        );

        res.push(ParsedBallot {
            id: Some(id),
            count,
            ranks,
        });
    }
    Ok(res)
}
