// Text rendering of the rounds, printed after the tabulation.

use crate::rcv::*;

const ROUND_HEADER: &str = "Round Number";

/// One row per round, one column per candidate with the share of the vote of this
/// candidate. The cell is left blank once the candidate is eliminated.
pub fn results_table(result: &ElectionResult) -> String {
    let candidates: Vec<String> = match result.results().first() {
        Some(first_round) => first_round.candidates(),
        None => return String::new(),
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut header = vec![ROUND_HEADER.to_string()];
    header.extend(candidates.iter().cloned());
    rows.push(header);
    for round_result in result.results() {
        let mut row = vec![round_result.round.to_string()];
        for name in candidates.iter() {
            let cell = round_result
                .percentage(name)
                .map(|pct| format!("{} %", round_two_decimals(pct)))
                .unwrap_or_default();
            row.push(cell);
        }
        rows.push(row);
    }

    let widths: Vec<usize> = (0..rows[0].len())
        .map(|col| rows.iter().map(|r| r[col].chars().count()).max().unwrap_or(0))
        .collect();
    rows.iter()
        .map(|row| {
            row.iter()
                .zip(widths.iter())
                .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
                .collect::<Vec<String>>()
                .join(" | ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worked_example() -> ElectionResult {
        let mut builder = instant_runoff::builder::Builder::new(&VoteRules::default()).unwrap();
        for ranking in [
            ["A", "B", "C"],
            ["A", "C", "B"],
            ["B", "A", "C"],
            ["C", "A", "B"],
            ["C", "B", "A"],
        ] {
            let ranking: Vec<String> = ranking.iter().map(|s| s.to_string()).collect();
            builder.add_ranking(&ranking).unwrap();
        }
        instant_runoff::run_election(&builder).unwrap()
    }

    #[test]
    fn blank_cells_after_elimination() {
        let table = results_table(&worked_example());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Round Number | A"));
        assert_eq!(lines[1], "1            | 40 % | 20 % | 40 %");
        assert_eq!(lines[2], "2            | 60 % |      | 40 %");
    }
}
