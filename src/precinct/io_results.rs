// Reader for the precinct results file.

use std::io::Read;

use crate::precinct::{io_common::pad_precinct_id, *};

// Positions in the 16-column layout.
const NUM_COLUMNS: usize = 16;
const COL_COUNTY_ID: usize = 1;
const COL_PRECINCT_ID: usize = 2;
const COL_OFFICE_ID: usize = 3;
const COL_PARTY: usize = 10;
const COL_VOTES: usize = 13;
const COL_PERCENTAGE: usize = 14;
const COL_TOTAL: usize = 15;

pub fn read_results_file(path: &str, src: &ResultsSource) -> BMapResult<Vec<VoteRecord>> {
    info!("Attempting to read results file {:?}", path);
    let file = fs::File::open(path).context(OpeningFileSnafu { path })?;
    read_results(file, src)
}

pub fn read_results<R: Read>(rdr: R, src: &ResultsSource) -> BMapResult<Vec<VoteRecord>> {
    let records = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(src.delimiter_byte()?)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(rdr)
        .into_records();

    let mut res: Vec<VoteRecord> = Vec::new();
    let mut num_skipped = 0;
    for (idx, line_r) in records.enumerate() {
        let line = line_r.context(CsvLineParseSnafu { lineno: idx + 1 })?;
        // Blank lines are skipped by the reader and do not count in idx.
        let lineno = line
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        if line.len() != NUM_COLUMNS {
            return Err(Box::new(MapError::CsvColumnCount {
                lineno,
                num_columns: line.len(),
            }));
        }
        let cell = |col: usize| line.get(col).unwrap_or("");

        if let Some(office_id) = &src.office_id {
            if cell(COL_OFFICE_ID) != office_id {
                debug!(
                    "read_results: lineno {}: skipping office {:?}",
                    lineno,
                    cell(COL_OFFICE_ID)
                );
                num_skipped += 1;
                continue;
            }
        }

        let record = VoteRecord {
            county_id: parse_cell(cell(COL_COUNTY_ID), lineno, COL_COUNTY_ID)?,
            precinct_id: pad_precinct_id(cell(COL_PRECINCT_ID)),
            category: cell(COL_PARTY).to_string(),
            votes: parse_cell(cell(COL_VOTES), lineno, COL_VOTES)?,
            percentage: parse_cell(cell(COL_PERCENTAGE), lineno, COL_PERCENTAGE)?,
            total: parse_cell(cell(COL_TOTAL), lineno, COL_TOTAL)?,
        };
        debug!("read_results: lineno {}: {:?}", lineno, record);
        res.push(record);
    }
    info!(
        "Read {} result rows ({} rows of other offices skipped)",
        res.len(),
        num_skipped
    );
    Ok(res)
}

fn parse_cell<T: std::str::FromStr>(content: &str, lineno: usize, column: usize) -> MapResult<T> {
    content.parse::<T>().ok().context(CsvNumberSnafu {
        lineno,
        column,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ResultsSource {
        ResultsSource {
            file_path: "USPresPct.txt".to_string(),
            delimiter: None,
            office_id: None,
        }
    }

    const ROWS: &str = "\
MN;03;0007;0102;U.S. President & Vice President;;0301;Kamala D. Harris and Tim Walz;;;DFL;;;450;45.00;1000
MN;03;0007;0102;U.S. President & Vice President;;0302;Donald J. Trump and JD Vance;;;R;;;500;50.00;1000
MN;3;12;0103;U.S. Senator;;0401;Amy Klobuchar;;;DFL;;;20;66.67;30
";

    #[test]
    fn reads_the_used_columns() {
        let records = read_results(ROWS.as_bytes(), &source()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            VoteRecord {
                county_id: 3,
                precinct_id: "0007".to_string(),
                category: "DFL".to_string(),
                votes: 450,
                percentage: 45.0,
                total: 1000,
            }
        );
        assert_eq!(records[1].category, "R");
        // Short numeric precinct ids are zero-filled.
        assert_eq!(records[2].precinct_id, "0012");
    }

    #[test]
    fn filters_on_office() {
        let src = ResultsSource {
            office_id: Some("0102".to_string()),
            ..source()
        };
        let records = read_results(ROWS.as_bytes(), &src).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn short_lines_are_errors() {
        let res = read_results("MN;03;0007;0102\n".as_bytes(), &source());
        match res {
            Err(e) => assert!(matches!(
                *e,
                MapError::CsvColumnCount {
                    lineno: 1,
                    num_columns: 4
                }
            )),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn extra_columns_are_errors() {
        let line = "MN;03;0007;0102;P;;0301;H;;;DFL;;;450;45.00;1000;EXTRA;MORE\n";
        match read_results(line.as_bytes(), &source()) {
            Err(e) => assert!(matches!(
                *e,
                MapError::CsvColumnCount {
                    lineno: 1,
                    num_columns: 18
                }
            )),
            Ok(_) => panic!("expected an error"),
        }
        // A shifted row after a valid one.
        let rows = format!("{}{}", ROWS, line);
        match read_results(rows.as_bytes(), &source()) {
            Err(e) => assert!(matches!(*e, MapError::CsvLineParse { lineno: 4, .. })),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let rows = ROWS.replacen('\n', "\n\n", 1);
        let records = read_results(rows.as_bytes(), &source()).unwrap();
        assert_eq!(records.len(), 3);
        let bad = format!("{}\nMN;03;0007;0102;P;;0301;H;;;DFL;;;many;45.00;1000\n", ROWS);
        match read_results(bad.as_bytes(), &source()) {
            Err(e) => assert!(matches!(*e, MapError::CsvNumber { column: 13, .. })),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn bad_numbers_are_errors() {
        let line = "MN;03;0007;0102;P;;0301;H;;;DFL;;;many;45.00;1000\n";
        let res = read_results(line.as_bytes(), &source());
        match res {
            Err(e) => assert!(matches!(
                *e,
                MapError::CsvNumber {
                    lineno: 1,
                    column: 13,
                    ..
                }
            )),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn other_delimiters() {
        let src = ResultsSource {
            delimiter: Some(",".to_string()),
            ..source()
        };
        let rows = ROWS.replace(';', ",");
        assert_eq!(read_results(rows.as_bytes(), &src).unwrap().len(), 3);
        let bad = ResultsSource {
            delimiter: Some(";;".to_string()),
            ..source()
        };
        assert!(read_results(ROWS.as_bytes(), &bad).is_err());
    }
}
