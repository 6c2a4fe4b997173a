//! Property record encoder.

use super::{PropertyRecord, labels};
use crate::property::PropertyValue;

const MAJOR_UINT: u8 = 0;
const MAJOR_NINT: u8 = 1;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

const SIMPLE_FALSE: u8 = 0xf4;
const SIMPLE_TRUE: u8 = 0xf5;
const FLOAT64: u8 = 0xfb;

/// Encode a set of property records to a wire payload.
///
/// Encoding is infallible; the transmit-size bound is enforced by the
/// sync engine against the payload this returns.
pub fn encode_records(records: &[PropertyRecord]) -> Vec<u8> {
    let mut encoder = RecordEncoder::new();
    encoder.encode(records);
    encoder.into_bytes()
}

/// Streaming encoder for property records.
pub struct RecordEncoder {
    buffer: Vec<u8>,
}

impl Default for RecordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Encode a payload: an array of records.
    pub fn encode(&mut self, records: &[PropertyRecord]) {
        self.push_header(MAJOR_ARRAY, records.len() as u64);
        for record in records {
            self.encode_record(record);
        }
    }

    /// Consume the encoder and return the payload bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn encode_record(&mut self, record: &PropertyRecord) {
        let pairs = 2 + u64::from(record.time.is_some());
        self.push_header(MAJOR_MAP, pairs);

        self.push_header(MAJOR_UINT, labels::NAME);
        self.encode_text(&record.name);

        match &record.value {
            PropertyValue::Int(v) => {
                self.push_header(MAJOR_UINT, labels::VALUE);
                self.encode_int(*v);
            }
            PropertyValue::Float(v) => {
                self.push_header(MAJOR_UINT, labels::VALUE);
                self.encode_f64(*v);
            }
            PropertyValue::Text(v) => {
                self.push_header(MAJOR_UINT, labels::VALUE_TEXT);
                self.encode_text(v);
            }
            PropertyValue::Bool(v) => {
                self.push_header(MAJOR_UINT, labels::VALUE_BOOL);
                self.buffer.push(if *v { SIMPLE_TRUE } else { SIMPLE_FALSE });
            }
        }

        if let Some(time) = record.time {
            self.push_header(MAJOR_UINT, labels::TIME);
            self.push_header(MAJOR_UINT, time);
        }
    }

    fn encode_int(&mut self, value: i64) {
        if value >= 0 {
            self.push_header(MAJOR_UINT, value as u64);
        } else {
            // Negative integers encode -(n+1); in range for all of i64.
            self.push_header(MAJOR_NINT, (-(value + 1)) as u64);
        }
    }

    fn encode_f64(&mut self, value: f64) {
        self.buffer.push(FLOAT64);
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    fn encode_text(&mut self, text: &str) {
        self.push_header(MAJOR_TEXT, text.len() as u64);
        self.buffer.extend_from_slice(text.as_bytes());
    }

    /// Shortest-form header for a major type and its argument.
    fn push_header(&mut self, major: u8, value: u64) {
        let mt = major << 5;
        if value < 24 {
            self.buffer.push(mt | value as u8);
        } else if value <= u64::from(u8::MAX) {
            self.buffer.push(mt | 24);
            self.buffer.push(value as u8);
        } else if value <= u64::from(u16::MAX) {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
        } else if value <= u64::from(u32::MAX) {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::LAST_VALUES_REQUEST;

    fn encode_one(record: PropertyRecord) -> Vec<u8> {
        encode_records(&[record])
    }

    #[test]
    fn test_last_values_request_bytes() {
        // The reconciliation request is itself one record; the constant
        // in core must be exactly what the encoder produces for it.
        let payload = encode_one(PropertyRecord::new("r:m", "getLastValues"));
        assert_eq!(payload, LAST_VALUES_REQUEST);
        assert_eq!(
            hex::encode(&payload),
            "81a20063723a6d036d6765744c61737456616c756573"
        );
    }

    #[test]
    fn test_bool_record() {
        let payload = encode_one(PropertyRecord::new("on", true));
        // [{0: "on", 4: true}]
        assert_eq!(hex::encode(&payload), "81a200626f6e04f5");
    }

    #[test]
    fn test_int_record_with_time() {
        let payload = encode_one(PropertyRecord::new("c", 5i64).with_time(100));
        // [{0: "c", 2: 5, 6: 100}]
        assert_eq!(hex::encode(&payload), "81a30061630205061864");
    }

    #[test]
    fn test_negative_int() {
        let payload = encode_one(PropertyRecord::new("t", -41i64));
        // -41 encodes as major 1, argument 40 (0x38 0x28)
        assert_eq!(hex::encode(&payload), "81a2006174023828");
    }

    #[test]
    fn test_float_record() {
        let payload = encode_one(PropertyRecord::new("f", 1.5f64));
        // 1.5 as float64 is fb3ff8000000000000
        assert_eq!(hex::encode(&payload), "81a200616602fb3ff8000000000000");
    }

    #[test]
    fn test_shortest_form_boundaries() {
        let mut encoder = RecordEncoder::new();
        encoder.push_header(MAJOR_UINT, 23);
        encoder.push_header(MAJOR_UINT, 24);
        encoder.push_header(MAJOR_UINT, 255);
        encoder.push_header(MAJOR_UINT, 256);
        encoder.push_header(MAJOR_UINT, 65535);
        encoder.push_header(MAJOR_UINT, 65536);
        assert_eq!(
            hex::encode(encoder.into_bytes()),
            "17181818ff19010019ffff1a00010000"
        );
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(encode_records(&[]), vec![0x80]);
    }
}
