use crate::rcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_juridiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

// Indexes in the configuration start at 1, following the conventions of the excel world.
// The accessors return indexes starting at 0.
impl FileSource {
    pub fn from_path(
        provider: String,
        file_path: String,
        excel_worksheet_name: Option<String>,
    ) -> FileSource {
        FileSource {
            provider,
            file_path,
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            id_column_index: None,
            count_column_index: None,
            excel_worksheet_name,
        }
    }

    /// The first column with a candidate. Defaults to the first column.
    pub fn first_vote_column_index(&self) -> RcvResult<usize> {
        match &self._first_vote_column_index {
            None => Ok(0),
            x => Ok(read_js_int(x)? - 1),
        }
    }

    /// The first row with a ballot. The row before it holds the candidate names.
    pub fn first_vote_row_index(&self) -> RcvResult<usize> {
        match &self._first_vote_row_index {
            None => Ok(1),
            x => {
                let idx = read_js_int(x)? - 1;
                if idx == 0 {
                    whatever!("firstVoteRowIndex must leave room for the header row")
                }
                Ok(idx)
            }
        }
    }

    pub fn id_column_index_int(&self) -> RcvResult<Option<usize>> {
        if self.id_column_index.is_some() {
            read_js_int(&self.id_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }

    pub fn count_column_index_int(&self) -> RcvResult<Option<usize>> {
        if self.count_column_index.is_some() {
            read_js_int(&self.count_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvCandidate {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvRules {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: String,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<FileSource>,
    pub candidates: Option<Vec<RcvCandidate>>,
    pub rules: Option<RcvRules>,
}

pub fn read_config(path: &str) -> BRcvResult<RcvConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RcvConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> BRcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// Returns a strictly positive index.
fn read_js_int(x: &Option<JSValue>) -> RcvResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {})?,
        // Excel-style column names, only single letters for now.
        Some(JSValue::String(s)) if s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            let c1: char = s
                .to_ascii_lowercase()
                .chars()
                .next()
                .context(ParsingJsonNumberSnafu {})?;
            (c1 as usize) - ('a' as usize) + 1
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {})?,
        _ => None.context(ParsingJsonNumberSnafu {})?,
    };
    if res == 0 {
        return Err(RcvError::ParsingJsonNumber {});
    }
    Ok(res)
}
