use zdt_types::Error;

/// One SLCAN ASCII line, decoded into its CAN id and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlcanFrame {
    pub id: u32,
    pub data: Vec<u8>,
}

impl SlcanFrame {
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// Formats `T<8-hex id><1-hex len><hex data>\r`.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(1 + 8 + 1 + self.data.len() * 2 + 1);
        out.push('T');
        out.push_str(&format!("{:08X}", self.id));
        out.push_str(&format!("{:X}", self.data.len()));
        for b in &self.data {
            out.push_str(&format!("{b:02X}"));
        }
        out.push('\r');
        out
    }

    /// Parses one `\r`-terminated (or bare) SLCAN line. Non-`T` lines (such
    /// as bell/ack characters some adapters emit) are rejected as malformed;
    /// the transport's receive loop is expected to skip them before calling
    /// this.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let line = line.trim_end_matches('\r').trim_end_matches('\n');
        if !line.starts_with('T') {
            return Err(Error::MalformedFrame(format!("not an extended frame: {line:?}")));
        }
        if line.len() < 1 + 8 + 1 {
            return Err(Error::MalformedFrame(format!("line too short: {line:?}")));
        }
        let id = u32::from_str_radix(&line[1..9], 16)
            .map_err(|e| Error::MalformedFrame(format!("bad frame id: {e}")))?;
        let len = usize::from_str_radix(&line[9..10], 16)
            .map_err(|e| Error::MalformedFrame(format!("bad length nibble: {e}")))?;
        let hex_data = &line[10..];
        if hex_data.len() != len * 2 {
            return Err(Error::MalformedFrame(format!(
                "declared length {len} does not match {} hex chars",
                hex_data.len()
            )));
        }
        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            let byte = u8::from_str_radix(&hex_data[i * 2..i * 2 + 2], 16)
                .map_err(|e| Error::MalformedFrame(format!("bad data byte: {e}")))?;
            data.push(byte);
        }
        Ok(Self { id, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_scenario_s1() {
        let frame = SlcanFrame::new(0x0100, vec![0xF3, 0xAB, 0x01, 0x00, 0x6B]);
        assert_eq!(frame.encode(), "T000001005F3AB01006B\r");
    }

    #[test]
    fn round_trips() {
        let frame = SlcanFrame::new(0x0201, vec![0xFD, 0x00, 0x03, 0x84, 0x01, 0x00, 0x6B]);
        let encoded = frame.encode();
        let parsed = SlcanFrame::parse(&encoded).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn rejects_non_extended_line() {
        assert!(SlcanFrame::parse("z\r").is_err());
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(SlcanFrame::parse("T000001005F3AB\r").is_err());
    }
}
