//! # Telemetry log
//!
//! Append-only, space delimited record of the fleet's positions and strategy metrics. One row is
//! written per logged tick, holding `X<i> Y<i> Metric<i>` for each vehicle followed by the
//! elapsed time since the start of the run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{io::{Read, Write}, path::Path};
use util::{
    archive::{read_archive, ArchiveError, Archiver},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const TELEM_LOG_DELIMITER: u8 = b' ';

const ELAPSED_TIME_COLUMN: &str = "ElapsedTime";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Logged state of one vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemSample {
    pub x_m: f64,
    pub y_m: f64,
    pub metric: f64,
}

/// One row of the log.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemRow {
    pub samples: Vec<TelemSample>,
    pub elapsed_s: f64,
}

pub struct TelemLog {
    arch: Archiver,

    num_vehicles: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum TelemLogError {
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Expected samples for {expected} vehicles but got {found}")]
    WrongNumSamples { expected: usize, found: usize },

    #[error("Malformed header, expected {expected} columns but found {found}")]
    MalformedHeader { expected: String, found: String },

    #[error("Row {row} has {found} columns, expected {expected}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Cannot parse value {value:?} in row {row}")]
    BadValue { row: usize, value: String },
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Column names of a log for the given fleet size.
pub fn header(num_vehicles: usize) -> Vec<String> {
    let mut cols: Vec<String> = (1..=num_vehicles)
        .flat_map(|i| vec![format!("X{}", i), format!("Y{}", i), format!("Metric{}", i)])
        .collect();
    cols.push(ELAPSED_TIME_COLUMN.to_string());

    cols
}

/// Read a log back into its rows.
pub fn replay<R: Read>(reader: R) -> Result<Vec<TelemRow>, TelemLogError> {
    let (head, records) = read_archive(reader, TELEM_LOG_DELIMITER)?;

    // Header is 3 columns per vehicle plus the elapsed time
    if head.is_empty() || (head.len() - 1) % 3 != 0 {
        return Err(TelemLogError::MalformedHeader {
            expected: "3 columns per vehicle and ElapsedTime".into(),
            found: head.iter().collect::<Vec<_>>().join(" "),
        });
    }
    let num_vehicles = (head.len() - 1) / 3;
    let expected = header(num_vehicles);
    if head.iter().ne(expected.iter().map(|s| s.as_str())) {
        return Err(TelemLogError::MalformedHeader {
            expected: expected.join(" "),
            found: head.iter().collect::<Vec<_>>().join(" "),
        });
    }

    records
        .iter()
        .enumerate()
        .map(|(row, rec)| {
            if rec.len() != expected.len() {
                return Err(TelemLogError::MalformedRow {
                    row,
                    expected: expected.len(),
                    found: rec.len(),
                });
            }

            let values = rec
                .iter()
                .map(|v| {
                    v.parse::<f64>().map_err(|_| TelemLogError::BadValue {
                        row,
                        value: v.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            let samples = values[..num_vehicles * 3]
                .chunks(3)
                .map(|c| TelemSample {
                    x_m: c[0],
                    y_m: c[1],
                    metric: c[2],
                })
                .collect();

            Ok(TelemRow {
                samples,
                elapsed_s: values[num_vehicles * 3],
            })
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TelemLog {
    /// Create a log at a path relative to the session's archive root and write its header.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session,
        path: P,
        num_vehicles: usize,
    ) -> Result<Self, TelemLogError> {
        let arch = Archiver::from_path(session, path, TELEM_LOG_DELIMITER)?;
        Self::with_archiver(arch, num_vehicles)
    }

    /// Create a log writing into any writer and write its header.
    pub fn from_writer<W: Write + Send + 'static>(
        writer: W,
        num_vehicles: usize,
    ) -> Result<Self, TelemLogError> {
        Self::with_archiver(
            Archiver::from_writer(writer, TELEM_LOG_DELIMITER),
            num_vehicles,
        )
    }

    fn with_archiver(mut arch: Archiver, num_vehicles: usize) -> Result<Self, TelemLogError> {
        arch.write_row(header(num_vehicles))?;

        Ok(Self { arch, num_vehicles })
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Append a row, `samples` must hold exactly one entry per vehicle in fleet order.
    pub fn write_record(
        &mut self,
        samples: &[TelemSample],
        elapsed_s: f64,
    ) -> Result<(), TelemLogError> {
        if samples.len() != self.num_vehicles {
            return Err(TelemLogError::WrongNumSamples {
                expected: self.num_vehicles,
                found: samples.len(),
            });
        }

        let mut fields: Vec<String> = samples
            .iter()
            .flat_map(|s| vec![s.x_m.to_string(), s.y_m.to_string(), s.metric.to_string()])
            .collect();
        fields.push(elapsed_s.to_string());

        self.arch.write_row(fields)?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Writer sharing its buffer with the test.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        pub(crate) fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_header() {
        assert_eq!(
            header(2),
            vec!["X1", "Y1", "Metric1", "X2", "Y2", "Metric2", "ElapsedTime"]
        );
        assert_eq!(header(0), vec!["ElapsedTime"]);
    }

    #[test]
    fn test_replay_reproduces_records() {
        let buf = SharedBuf::default();
        let mut log = TelemLog::from_writer(buf.clone(), 2).unwrap();

        let rows = vec![
            TelemRow {
                samples: vec![
                    TelemSample { x_m: 90.0, y_m: 25.0, metric: 0.0 },
                    TelemSample { x_m: 80.0, y_m: 25.0, metric: 0.6931471805599453 },
                ],
                elapsed_s: 0.1,
            },
            TelemRow {
                samples: vec![
                    TelemSample { x_m: 89.37512, y_m: -25.125, metric: 1.0 / 3.0 },
                    TelemSample { x_m: 79.5, y_m: 25.0001, metric: 0.0 },
                ],
                elapsed_s: 2.203,
            },
        ];

        for r in rows.iter() {
            log.write_record(&r.samples, r.elapsed_s).unwrap();
        }

        let text = String::from_utf8(buf.contents()).unwrap();
        assert!(text.starts_with("X1 Y1 Metric1 X2 Y2 Metric2 ElapsedTime\n"));

        assert_eq!(replay(buf.contents().as_slice()).unwrap(), rows);
    }

    #[test]
    fn test_rejects_wrong_fleet_size() {
        let mut log = TelemLog::from_writer(SharedBuf::default(), 2).unwrap();

        let res = log.write_record(&[TelemSample { x_m: 0.0, y_m: 0.0, metric: 0.0 }], 0.0);
        assert!(matches!(
            res,
            Err(TelemLogError::WrongNumSamples { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_replay_rejects_bad_header() {
        let text = "A B C\n1 2 3\n";
        assert!(matches!(
            replay(text.as_bytes()),
            Err(TelemLogError::MalformedHeader { .. })
        ));
    }
}
