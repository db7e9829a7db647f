//! CBOR capture of received frames.

use std::{fs::File, io::BufWriter, path::Path};

use ipframe_harness::CaseReport;
use ipframe_proto::IpHeaderDescriptor;
use serde::{Deserialize, Serialize};

use crate::SimError;

/// One received frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
    /// IP header as emitted
    pub header: IpHeaderDescriptor,
    /// IP payload, UDP header word first
    pub payload: Vec<u8>,
    /// Error flag on the final beat
    pub error: bool,
}

/// Everything received during one matrix case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Case name
    pub case: String,
    /// Payload length used
    pub payload_len: usize,
    /// Pause schedule used
    pub schedule: String,
    /// Ticks until idle
    pub ticks: u64,
    /// Frames in receive order
    pub frames: Vec<CapturedFrame>,
}

impl From<&CaseReport> for CaptureRecord {
    fn from(report: &CaseReport) -> Self {
        Self {
            case: report.case.to_string(),
            payload_len: report.payload_len,
            schedule: report.schedule.to_string(),
            ticks: report.ticks,
            frames: report
                .frames
                .iter()
                .map(|frame| CapturedFrame {
                    header: frame.header,
                    payload: frame.payload.to_vec(),
                    error: frame.error,
                })
                .collect(),
        }
    }
}

/// Write `records` to `path` as one CBOR array.
pub fn write(path: &Path, records: &[CaptureRecord]) -> Result<(), SimError> {
    let file = File::create(path)?;
    ciborium::ser::into_writer(records, BufWriter::new(file))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ipframe_core::EncapsulatorConfig;
    use ipframe_harness::{MatrixCase, PauseSchedule, run_case};

    use super::*;

    #[test]
    fn record_survives_cbor() {
        let report =
            run_case(MatrixCase::ErrorFlag, 5, PauseSchedule::Sink, EncapsulatorConfig::default())
                .unwrap();
        let record = CaptureRecord::from(&report);
        assert_eq!(record.frames.len(), 2);
        assert!(record.frames[0].error);

        let mut buf = Vec::new();
        ciborium::ser::into_writer(&record, &mut buf).unwrap();
        let decoded: CaptureRecord = ciborium::de::from_reader(buf.as_slice()).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(decoded.schedule, "sink pause");
    }
}
