use log::{debug, info, warn};

use instant_runoff::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rcv::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_msforms;
pub mod report;

#[derive(Debug, Snafu)]
pub enum RcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The worksheet is empty or a cell is missing"))]
    EmptyExcel {},
    #[snafu(display("The file has several worksheets, the worksheet name must be provided"))]
    ExcelAmbiguousWorksheet {},
    #[snafu(display("Line {lineno}: cannot read cell {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },

    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Expected a list of ballots, or an object with a raw_data list of ballots"))]
    JsonBallotShape {},
    #[snafu(display("Ballot {ballot_id}: expected an object from candidate names to ranks"))]
    JsonBallotNotAnObject { ballot_id: String },

    #[snafu(display(
        "Ballot {ballot_id}: the rank of {candidate_name} is not a positive integer: {content}"
    ))]
    ParsingRank {
        ballot_id: String,
        candidate_name: String,
        content: String,
    },
    #[snafu(display("Line {lineno}: the count is not a positive integer"))]
    ParsingCount { lineno: usize },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineToShort { lineno: usize },
    #[snafu(display("The file has no header row"))]
    MissingHeader {},

    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No ballots to read: use --input or add ballotSources to the configuration"))]
    MissingBallotSource {},
    #[snafu(display("Provider not implemented: {provider}"))]
    UnknownProvider { provider: String },

    #[snafu(display("Voting error: {source}"))]
    Tabulation { source: VotingErrors },
    #[snafu(display("Ballot {ballot_id} is invalid: {source}"))]
    InvalidBallot {
        ballot_id: String,
        source: VotingErrors,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RcvResult<T> = Result<T, RcvError>;
pub type BRcvResult<T> = Result<T, Box<RcvError>>;

/// A ballot, as parsed by the readers.
/// This is before checking that it ranks every candidate exactly once.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: Option<u64>,
    pub ranks: Vec<(String, u32)>,
}

fn result_stats_to_json(rs: &ElectionResult) -> (Vec<JSValue>, Vec<JSValue>) {
    let mut percentages: Vec<JSValue> = Vec::new();
    let mut rounds: Vec<JSValue> = Vec::new();
    for round_result in rs.results() {
        let mut pcts: JSMap<String, JSValue> = JSMap::new();
        for (name, pct) in round_result.tally.iter() {
            pcts.insert(name.clone(), json!(pct));
        }
        percentages.push(JSValue::Object(pcts));

        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_result.first_choices.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }
        let mut round: JSMap<String, JSValue> = JSMap::new();
        round.insert("round".to_string(), json!(round_result.round));
        round.insert("tally".to_string(), JSValue::Object(tally));
        // The last round has no elimination.
        if let Some(name) = &round_result.eliminated {
            round.insert("eliminated".to_string(), json!(name));
        }
        rounds.push(JSValue::Object(round));
    }
    (percentages, rounds)
}

fn build_summary_js(config: &OutputConfig, rv: &ElectionResult) -> JSValue {
    let (results, rounds) = result_stats_to_json(rv);
    let percentage_of_winner = match rv.percentage_of_winner() {
        WinningPercentage::Percentage(pct) => json!(pct),
        WinningPercentage::Draw => json!(DRAW),
    };
    json!({
        "config": config,
        "results": results,
        "rounds": rounds,
        "nameOfWinner": rv.name_of_winner(),
        "percentageOfWinner": percentage_of_winner,
        "howManyRounds": rv.how_many_rounds()
    })
}

fn read_ranking_data(root_path: &str, cfs: &FileSource) -> BRcvResult<Vec<ParsedBallot>> {
    let p: PathBuf = [root_path, cfs.file_path.as_str()].iter().collect();
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    match cfs.provider.as_str() {
        "json" => io_json::read_json_ballots(p2),
        "csv_likert" => io_csv::read_csv_likert(p2, cfs),
        "xlsx_likert" | "msforms_likert" => io_msforms::read_xlsx_likert(p2, cfs),
        x => Err(Box::new(RcvError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

// Returns the ballots and, at the same positions, the ids of the ballots they were read from.
fn validate_ballots(parsed_ballots: &[ParsedBallot]) -> (Vec<Ballot>, Vec<String>) {
    let mut res: Vec<Ballot> = Vec::new();
    let mut ids: Vec<String> = Vec::new();
    for (idx, pb) in parsed_ballots.iter().enumerate() {
        // Default of 1 if not specified
        let count = pb.count.unwrap_or(1);
        if count == 0 {
            warn!("validate_ballots: skipping ballot {:?} with a count of 0", pb.id);
            continue;
        }
        debug!("Ranks for ballot {:?}: {:?}", pb.id, pb.ranks);
        res.push(Ballot {
            ranks: pb.ranks.clone(),
            count,
        });
        ids.push(pb.id.clone().unwrap_or_else(|| format!("#{}", idx + 1)));
    }
    (res, ids)
}

// Invalid ballots are reported with the id found in the ballot files, not with
// their position among the ballots that were kept.
fn tabulation_error(err: VotingErrors, ballot_ids: &[String]) -> Box<RcvError> {
    let ballot_id = match &err {
        VotingErrors::InvalidBallot { ballot_index, .. } => {
            ballot_ids.get(*ballot_index).cloned()
        }
        _ => None,
    };
    match ballot_id {
        Some(ballot_id) => Box::new(RcvError::InvalidBallot {
            ballot_id,
            source: err,
        }),
        None => Box::new(RcvError::Tabulation { source: err }),
    }
}

fn validate_rules(rcv_rules: &Option<RcvRules>) -> RcvResult<VoteRules> {
    let rules = match rcv_rules {
        None => return Ok(VoteRules::DEFAULT_RULES),
        Some(r) => r,
    };
    let tiebreak_mode = match rules.tiebreak_mode.as_str() {
        "useCandidateOrder" => TieBreakMode::UseCandidateOrder,
        "random" => {
            let seed = match rules.random_seed.clone().map(|s| s.parse::<u32>()) {
                Some(Result::Ok(x)) => x,
                x => {
                    whatever!("The random tiebreak mode needs a numeric randomSeed, got {:?}", x)
                }
            };
            TieBreakMode::Random(seed)
        }
        x => {
            whatever!("Cannot use tiebreak mode {:?} (currently not implemented)", x)
        }
    };
    Ok(VoteRules { tiebreak_mode })
}

fn output_config(config: &Option<RcvConfig>) -> OutputConfig {
    let settings = config.as_ref().and_then(|c| c.output_settings.clone());
    match settings {
        Some(s) => OutputConfig {
            contest: s.contest_name,
            date: s.contest_date,
            jurisdiction: s.contest_juridiction,
            office: s.contest_office,
        },
        None => OutputConfig {
            contest: "Election".to_string(),
            date: None,
            jurisdiction: None,
            office: None,
        },
    }
}

fn output_path(args: &Args, config: &Option<RcvConfig>, root_path: &str) -> Option<String> {
    if args.out.is_some() {
        return args.out.clone();
    }
    let settings = config.as_ref()?.output_settings.as_ref()?;
    let dir = settings.output_directory.clone()?;
    let p: PathBuf = [root_path, dir.as_str(), "summary.json"].iter().collect();
    Some(p.as_path().display().to_string())
}

fn write_summary(out: &str, pretty_js_stats: &str) -> BRcvResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js_stats);
    } else {
        fs::write(out, pretty_js_stats).context(WritingSummarySnafu { path: out })?;
        info!("Summary written to {}", out);
    }
    Ok(())
}

/// Reads the ballots described by the arguments and the configuration file, runs the
/// tabulation, prints the results and writes the summary.
pub fn run_election(args: &Args) -> BRcvResult<()> {
    let config: Option<RcvConfig> = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    info!("config: {:?}", config);

    let root_path: String = match &args.config {
        Some(p) => Path::new(p.as_str())
            .parent()
            .context(MissingParentDirSnafu {})?
            .display()
            .to_string(),
        None => String::new(),
    };

    let sources: Vec<FileSource> = match (&args.input, &config) {
        (Some(input), _) => vec![FileSource::from_path(
            args.input_type.clone().unwrap_or_else(|| "json".to_string()),
            input.clone(),
            args.excel_worksheet_name.clone(),
        )],
        (None, Some(c)) => c.ballot_sources.clone(),
        (None, None) => vec![],
    };
    if sources.is_empty() {
        return Err(Box::new(RcvError::MissingBallotSource {}));
    }

    // Explicit paths on the command line are not relative to the configuration.
    let sources_root = if args.input.is_some() { "" } else { root_path.as_str() };
    let mut data: Vec<ParsedBallot> = Vec::new();
    for cfs in sources.iter() {
        let mut file_data = read_ranking_data(sources_root, cfs)?;
        data.append(&mut file_data);
    }
    let (ballots, ballot_ids) = validate_ballots(&data);
    info!("Read {} ballots", ballots.len());

    let candidates: Option<Vec<String>> = match (&args.candidates, &config) {
        (Some(names), _) => Some(names.clone()),
        (None, Some(c)) => c
            .candidates
            .as_ref()
            .map(|cs| cs.iter().map(|c| c.name.clone()).collect()),
        (None, None) => None,
    };

    let rules = validate_rules(&config.as_ref().and_then(|c| c.rules.clone()))?;

    let result = run_voting_stats(&ballots, &rules, &candidates)
        .map_err(|e| tabulation_error(e, &ballot_ids))?;
    info!("res {:?}", result);

    println!("{}", report::results_table(&result));
    println!("{}", result.summary());

    // Assemble the final json
    let result_js = build_summary_js(&output_config(&config), &result);
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingSummarySnafu {})?;
    debug!("stats:{}", pretty_js_stats);

    if let Some(out) = output_path(args, &config, &root_path) {
        write_summary(&out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        debug!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return Err(Box::new(RcvError::ReferenceMismatch {}));
        }
    }

    Ok(())
}

#[cfg(test)]
fn test_dir() -> String {
    option_env!("RCV_TEST_DIR")
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}/tests/data", env!("CARGO_MANIFEST_DIR")))
}

#[cfg(test)]
fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> BRcvResult<()> {
    let test_dir = test_dir();
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        ..Default::default()
    };
    run_election(&args)
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    let res = run_election_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = &res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
    }
    assert!(res.is_ok());
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn worked_example() {
        test_wrapper("worked_example");
    }

    #[test]
    fn draw_from_voting_page() {
        test_wrapper("draw_from_voting_page");
    }

    #[test]
    fn csv_likert_weighted() {
        test_wrapper("csv_likert_weighted");
    }

    #[test]
    fn invalid_ballot_is_reported() {
        let _ = env_logger::builder().is_test(true).try_init();
        let args = Args {
            input: Some(format!("{}/invalid_ballot/ballots.json", test_dir())),
            ..Default::default()
        };
        let err = run_election(&args).unwrap_err();
        match *err {
            RcvError::InvalidBallot { ballot_id, source } => {
                assert_eq!(ballot_id, "ballots.json-00000002");
                assert_eq!(
                    source,
                    VotingErrors::InvalidBallot {
                        ballot_index: 1,
                        issue: BallotIssue::DuplicateRank(1)
                    }
                );
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn skipped_ballots_do_not_shift_ids() {
        let _ = env_logger::builder().is_test(true).try_init();
        let args = Args {
            config: Some(format!(
                "{}/zero_count_before_invalid/zero_count_before_invalid_config.json",
                test_dir()
            )),
            ..Default::default()
        };
        let err = run_election(&args).unwrap_err();
        match *err {
            RcvError::InvalidBallot { ballot_id, source } => {
                assert_eq!(ballot_id, "b2");
                assert_eq!(
                    source,
                    VotingErrors::InvalidBallot {
                        ballot_index: 0,
                        issue: BallotIssue::DuplicateRank(1)
                    }
                );
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn other_voting_errors_are_not_tied_to_a_ballot() {
        let err = tabulation_error(VotingErrors::EmptyInput, &["b1".to_string()]);
        assert!(matches!(
            *err,
            RcvError::Tabulation {
                source: VotingErrors::EmptyInput
            }
        ));
        let out_of_range = VotingErrors::InvalidBallot {
            ballot_index: 3,
            issue: BallotIssue::ZeroWeight,
        };
        let err = tabulation_error(out_of_range, &["b1".to_string()]);
        assert!(matches!(*err, RcvError::Tabulation { .. }));
    }

    #[test]
    fn summary_errors_are_not_parsing_errors() {
        let source = serde_json::from_str::<JSValue>("{").unwrap_err();
        let err = RcvError::SerializingSummary { source };
        assert_eq!(err.to_string(), "Error serializing the summary");
    }

    #[test]
    fn command_line_candidates_override_the_config() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = test_dir();
        let out = std::env::temp_dir()
            .join("irvtally_command_line_candidates.json")
            .display()
            .to_string();
        let args = Args {
            config: Some(format!(
                "{}/csv_likert_weighted/csv_likert_weighted_config.json",
                dir
            )),
            candidates: Some(vec![
                "Anna".to_string(),
                "Bob".to_string(),
                "Clara".to_string(),
            ]),
            out: Some(out.clone()),
            ..Default::default()
        };
        run_election(&args).unwrap();
        let summary = read_summary(&out).unwrap();
        let first_round: Vec<&String> = summary["results"][0]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(first_round, vec!["Anna", "Bob", "Clara"]);
        // Bob and Clara tie with 3 votes: Bob now comes first and is eliminated.
        assert_eq!(summary["rounds"][0]["eliminated"], json!("Bob"));
        assert_eq!(summary["nameOfWinner"], json!("Anna"));
        assert_eq!(summary["percentageOfWinner"], json!(70.0));
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = test_dir();
        let args = Args {
            input: Some(format!("{}/draw_from_voting_page/ballots.json", dir)),
            reference: Some(format!(
                "{}/worked_example/worked_example_expected_summary.json",
                dir
            )),
            ..Default::default()
        };
        let err = run_election(&args).unwrap_err();
        assert!(matches!(*err, RcvError::ReferenceMismatch {}));
    }

    #[test]
    fn missing_source() {
        let err = run_election(&Args::default()).unwrap_err();
        assert!(matches!(*err, RcvError::MissingBallotSource {}));
    }

    #[test]
    fn rules_parsing() {
        let random = RcvRules {
            tiebreak_mode: "random".to_string(),
            random_seed: Some("42".to_string()),
        };
        assert_eq!(
            validate_rules(&Some(random)).unwrap().tiebreak_mode,
            TieBreakMode::Random(42)
        );
        let no_seed = RcvRules {
            tiebreak_mode: "random".to_string(),
            random_seed: None,
        };
        assert!(validate_rules(&Some(no_seed)).is_err());
        let unknown = RcvRules {
            tiebreak_mode: "stopCountingAndAsk".to_string(),
            random_seed: None,
        };
        assert!(validate_rules(&Some(unknown)).is_err());
        assert_eq!(validate_rules(&None).unwrap(), VoteRules::DEFAULT_RULES);
    }
}
