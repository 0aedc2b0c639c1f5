use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::memory::ReadMemory;

/// Raw bytes read from one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryDump {
    pub address: u64,
    pub bytes: Vec<u8>,
}

impl MemoryDump {
    pub fn read<R: ReadMemory + ?Sized>(reader: &R, address: u64, size: usize) -> Result<Self> {
        Ok(Self {
            address,
            bytes: reader.read_bytes(address, size)?,
        })
    }

    /// Hexdump lines, optionally with an ASCII column.
    ///
    /// ```text
    /// 0x000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
    /// ```
    pub fn lines(&self, ascii: bool) -> Vec<String> {
        self.bytes
            .chunks(16)
            .enumerate()
            .map(|(i, chunk)| format_line(i * 16, chunk, ascii))
            .collect()
    }
}

fn format_line(offset: usize, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:03X}: ", offset);
    for j in 0..16 {
        if j == 8 {
            line.push(' ');
        }
        match chunk.get(j) {
            Some(byte) => line.push_str(&format!("{:02X} ", byte)),
            None => line.push_str("   "),
        }
    }
    if ascii {
        line.push_str(" |");
        for byte in chunk {
            line.push(if (0x20..0x7F).contains(byte) {
                *byte as char
            } else {
                '.'
            });
        }
        for _ in chunk.len()..16 {
            line.push(' ');
        }
        line.push('|');
    }
    line.trim_end_matches(' ').to_string()
}

impl fmt::Display for MemoryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hexdump at 0x{:X} ({} bytes):", self.address, self.bytes.len())?;
        for line in self.lines(true) {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
