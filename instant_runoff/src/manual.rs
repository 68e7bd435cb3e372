/*!

This is the long-form manual for `instant_runoff` and `irvtally`.

## Counting rules

Every ballot ranks all the candidates, from 1 (most preferred) to the number of
candidates. Each round:

1. The first choices are counted for the candidates still running, and reported
   as a share of all the ballots (0 to 100). Candidates without any first choice
   are reported with 0.
2. A candidate with strictly more than 50% wins and the count stops.
3. If exactly two candidates are left and each has exactly 50%, the election is a
   draw and the count stops. Two candidates at 50% with other candidates still
   running is not a draw: counting continues.
4. Otherwise the candidate with the fewest first choices is eliminated. It is
   removed from every ballot, and the choices ranked below it move up by one.

Ties for the fewest first choices are broken with the tiebreak mode:
* `useCandidateOrder` (default): the candidate listed first is eliminated. The
  order is the list of candidates if one is provided, otherwise the order of
  the first ballot.
* `random`: the tied candidates are shuffled with a hash of the `randomSeed`,
  the round number and their names. The same seed always produces the same
  count.

## Input formats

### `json`

A list of ballots, each one an object from candidate name to rank:

```text
[{"A": 1, "B": 2, "C": 3}, {"B": 1, "A": 2, "C": 3}]
```

The body sent by the voting page is also accepted:

```text
{"type": "results", "raw_data": [{"A": 1, "B": 2, "C": 3}]}
```

### `csv_likert`

One column per candidate, the candidate names in the header, and the rank of
each candidate in the cells:

```text
id,count,A,B,C
id1,20,1,2,3
id2,10,3,1,2
```

The `id` and `count` columns are optional and located with `idColumnIndex` and
`countColumnIndex`. The first candidate column is `firstVoteColumnIndex`.

### `xlsx_likert`

The same layout as `csv_likert`, in an Excel worksheet. The worksheet is
selected with `excelWorksheetName`, or is the only worksheet of the file.

## Configuration

```text
{
  "outputSettings": {"contestName": "Board election"},
  "ballotSources": [{"provider": "json", "filePath": "ballots.json"}],
  "candidates": [{"name": "A"}, {"name": "B"}, {"name": "C"}],
  "rules": {"tiebreakMode": "random", "randomSeed": "42"}
}
```

Column and row indexes start at 1, following the conventions of spreadsheets.
File paths are relative to the configuration file.

## Output

The summary written with `--out` contains the share of every candidate for each
round (`results`), the first choices and the eliminated candidate of each round
(`rounds`), `nameOfWinner` and `percentageOfWinner` (both `"DRAW"` for a draw)
and `howManyRounds`.

 */
