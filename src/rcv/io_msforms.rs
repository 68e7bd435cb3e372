// Excel exports of forms with a ranking question: one column per candidate,
// each cell holding the rank given to that candidate.

use calamine::DataType;

use crate::rcv::{
    io_common::{candidate_columns, make_default_id, parse_rank},
    *,
};

pub fn read_xlsx_likert(path: String, cfs: &FileSource) -> BRcvResult<Vec<ParsedBallot>> {
    let wrange = get_range(&path, cfs)?;
    let rows: Vec<&[DataType]> = wrange.rows().collect();
    parse_likert_rows(&rows, cfs, &path)
}

fn parse_likert_rows(
    rows: &[&[DataType]],
    cfs: &FileSource,
    path: &str,
) -> BRcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let id_idx_o = cfs.id_column_index_int()?;
    let count_idx_o = cfs.count_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index()?;

    let header = rows.get(first_row - 1).context(EmptyExcelSnafu {})?;
    debug!("read_xlsx_likert: header: {:?}", header);
    let header: Vec<Option<String>> = header.iter().map(cell_to_string).collect();
    let excluded: Vec<usize> = id_idx_o.iter().chain(count_idx_o.iter()).cloned().collect();
    let columns = candidate_columns(&header, choices_start_col, &excluded);
    debug!("read_xlsx_likert: columns: {:?}", columns);
    if columns.is_empty() {
        return Err(Box::new(RcvError::EmptyExcel {}));
    }

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in rows.iter().enumerate().skip(first_row) {
        let lineno = idx + 1;
        // Trailing rows left empty by the form export.
        if row.iter().all(|c| *c == DataType::Empty) {
            continue;
        }

        let id = match id_idx_o {
            Some(id_idx) => row
                .get(id_idx)
                .and_then(cell_to_string)
                .context(EmptyExcelSnafu {})?,
            None => default_id(lineno),
        };

        let count: Option<u64> = match count_idx_o {
            Some(count_idx) => {
                let cell = row.get(count_idx).context(EmptyExcelSnafu {})?;
                Some(read_count(cell).context(ParsingCountSnafu { lineno })?)
            }
            None => Some(1),
        };

        let mut ranks: Vec<(String, u32)> = Vec::new();
        for (col, name) in columns.iter() {
            match row.get(*col) {
                None | Some(DataType::Empty) => {
                    // No choice made, skip.
                }
                Some(DataType::String(s)) if s.trim().is_empty() => {}
                Some(DataType::String(s)) => ranks.push((name.clone(), parse_rank(&id, name, s)?)),
                Some(DataType::Int(i)) if *i > 0 && *i <= u32::MAX as i64 => {
                    ranks.push((name.clone(), *i as u32))
                }
                Some(DataType::Float(f))
                    if f.fract() == 0.0 && *f >= 1.0 && *f <= u32::MAX as f64 =>
                {
                    ranks.push((name.clone(), *f as u32))
                }
                Some(v) => {
                    return Err(Box::new(RcvError::ExcelWrongCellType {
                        lineno: lineno as u64,
                        content: format!("{:?} IN {:?}", v, row),
                    }));
                }
            }
        }
        debug!("read_xlsx_likert: lineno: {:?} ranks: {:?}", lineno, &ranks);

        res.push(ParsedBallot {
            id: Some(id),
            count,
            ranks,
        });
    }
    Ok(res)
}

fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn read_count(cell: &DataType) -> Option<u64> {
    match cell {
        DataType::Int(i) if *i >= 0 => Some(*i as u64),
        DataType::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as u64),
        DataType::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn get_range(path: &String, cfs: &FileSource) -> BRcvResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> =
        open_workbook(path.clone()).context(OpeningExcelSnafu { path: path.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(RcvError::EmptyExcel {})),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_file: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => Err(Box::new(RcvError::ExcelAmbiguousWorksheet {})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    fn parse(rows: &[Vec<DataType>], cfs: &FileSource) -> BRcvResult<Vec<ParsedBallot>> {
        let rows: Vec<&[DataType]> = rows.iter().map(|r| r.as_slice()).collect();
        parse_likert_rows(&rows, cfs, "form.xlsx")
    }

    fn source(js: JSValue) -> FileSource {
        serde_json::from_value(js).unwrap()
    }

    #[test]
    fn form_export() {
        let cfs = source(json!({
            "provider": "xlsx_likert",
            "filePath": "form.xlsx",
            "idColumnIndex": 1,
            "firstVoteColumnIndex": 2
        }));
        let rows = vec![
            vec![s("ID"), s("Alice"), s("Bob"), s("Carol")],
            vec![DataType::Float(1.0), DataType::Float(2.0), DataType::Float(1.0), DataType::Empty],
            vec![DataType::Int(2), s("1"), DataType::Int(3), DataType::Int(2)],
            vec![DataType::Empty, DataType::Empty, DataType::Empty, DataType::Empty],
        ];
        let res = parse(&rows, &cfs).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].id, Some("1".to_string()));
        assert_eq!(
            res[0].ranks,
            vec![("Alice".to_string(), 2), ("Bob".to_string(), 1)]
        );
        assert_eq!(res[1].count, Some(1));
        assert_eq!(res[1].ranks.len(), 3);
    }

    #[test]
    fn counts_and_default_ids() {
        let cfs = source(json!({
            "provider": "xlsx_likert",
            "filePath": "form.xlsx",
            "countColumnIndex": "C",
            "firstVoteRowIndex": 3
        }));
        let rows = vec![
            vec![s("Exported results")],
            vec![s("A"), s("B"), s("Weight")],
            vec![DataType::Int(1), DataType::Int(2), DataType::Float(3.0)],
        ];
        let res = parse(&rows, &cfs).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].id, Some("form.xlsx-00000003".to_string()));
        assert_eq!(res[0].count, Some(3));
        assert_eq!(res[0].ranks, vec![("A".to_string(), 1), ("B".to_string(), 2)]);
    }

    #[test]
    fn wrong_cells() {
        let cfs = source(json!({"provider": "xlsx_likert", "filePath": "form.xlsx"}));
        let rows = vec![
            vec![s("A"), s("B")],
            vec![DataType::Bool(true), DataType::Int(1)],
        ];
        let err = parse(&rows, &cfs).unwrap_err();
        assert!(matches!(*err, RcvError::ExcelWrongCellType { lineno: 2, .. }));
        let no_header: Vec<Vec<DataType>> = vec![];
        assert!(parse(&no_header, &cfs).is_err());
    }
}
