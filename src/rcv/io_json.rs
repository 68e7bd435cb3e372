// Ballots sent by the voting page: objects from candidate names to ranks.

use crate::rcv::{io_common::make_default_id, *};

pub fn read_json_ballots(path: String) -> BRcvResult<Vec<ParsedBallot>> {
    let contents =
        fs::read_to_string(path.as_str()).context(OpeningJsonSnafu { path: path.clone() })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    parse_json_ballots(&js, &path)
}

fn parse_json_ballots(js: &JSValue, path: &str) -> BRcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    // Either the plain list, or the request body of the voting page.
    let raw_ballots = match js {
        JSValue::Array(l) => l,
        JSValue::Object(obj) => obj
            .get("raw_data")
            .and_then(|v| v.as_array())
            .context(JsonBallotShapeSnafu {})?,
        _ => return Err(Box::new(RcvError::JsonBallotShape {})),
    };

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, raw) in raw_ballots.iter().enumerate() {
        let id = default_id(idx + 1);
        let obj = raw
            .as_object()
            .context(JsonBallotNotAnObjectSnafu { ballot_id: id.clone() })?;
        let mut ranks: Vec<(String, u32)> = Vec::new();
        // The key order is preserved, it defines the order of the candidates.
        for (name, v) in obj.iter() {
            let rank = match v {
                JSValue::Number(n) => n
                    .as_u64()
                    .filter(|r| *r > 0 && *r <= u32::MAX as u64)
                    .map(|r| r as u32)
                    .context(ParsingRankSnafu {
                        ballot_id: id.clone(),
                        candidate_name: name.clone(),
                        content: n.to_string(),
                    })?,
                JSValue::String(s) => io_common::parse_rank(&id, name, s)?,
                x => {
                    return Err(Box::new(RcvError::ParsingRank {
                        ballot_id: id.clone(),
                        candidate_name: name.clone(),
                        content: x.to_string(),
                    }))
                }
            };
            ranks.push((name.clone(), rank));
        }
        debug!("parse_json_ballots: {:?} ranks: {:?}", id, ranks);
        res.push(ParsedBallot {
            id: Some(id),
            count: Some(1),
            ranks,
        });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(pb: &ParsedBallot) -> Vec<(&str, u32)> {
        pb.ranks.iter().map(|(n, r)| (n.as_str(), *r)).collect()
    }

    #[test]
    fn plain_list_keeps_key_order() {
        let js: JSValue = serde_json::from_str(
            r#"[{"C": 1, "A": 2, "B": 3}, {"A": 1, "B": "2", "C": 3}]"#,
        )
        .unwrap();
        let res = parse_json_ballots(&js, "ballots.json").unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(ranks(&res[0]), vec![("C", 1), ("A", 2), ("B", 3)]);
        assert_eq!(ranks(&res[1]), vec![("A", 1), ("B", 2), ("C", 3)]);
        assert_eq!(res[1].id, Some("ballots.json-00000002".to_string()));
    }

    #[test]
    fn request_body() {
        let js = json!({"type": "results", "raw_data": [{"A": 1, "B": 2}, {"B": 1, "A": 2}]});
        let res = parse_json_ballots(&js, "request.json").unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(ranks(&res[1]), vec![("B", 1), ("A", 2)]);
    }

    #[test]
    fn bad_shapes() {
        assert!(parse_json_ballots(&json!({"type": "results"}), "x.json").is_err());
        assert!(parse_json_ballots(&json!("ballots"), "x.json").is_err());
        assert!(parse_json_ballots(&json!([["A", "B"]]), "x.json").is_err());
        assert!(parse_json_ballots(&json!([{"A": 1.5}]), "x.json").is_err());
        assert!(parse_json_ballots(&json!([{"A": 0}]), "x.json").is_err());
        assert!(parse_json_ballots(&json!([{"A": null}]), "x.json").is_err());
    }
}
