//! Hex dumps of the zero page and stack page.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bus::{NesBus, STACK_END, STACK_START, ZERO_PAGE_START};

/// Bytes per dump row.
pub const ROW_BYTES: usize = 32;

/// Row start address -> space separated hex bytes.
pub type Dump = BTreeMap<u16, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDump {
    pub zero_page: Dump,
    pub stack: Dump,
}

impl MemoryDump {
    pub fn new(bus: &NesBus) -> Self {
        let ram = bus.ram();
        Self {
            zero_page: dump_rows(ram, ZERO_PAGE_START, STACK_START),
            stack: dump_rows(ram, STACK_START, STACK_END),
        }
    }
}

fn dump_rows(ram: &[u8], start: usize, end: usize) -> Dump {
    ram[start..end]
        .chunks(ROW_BYTES)
        .enumerate()
        .map(|(i, row)| {
            let text = row
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            ((start + i * ROW_BYTES) as u16, text)
        })
        .collect()
}

fn write_dump(f: &mut fmt::Formatter<'_>, dump: &Dump) -> fmt::Result {
    for (addr, row) in dump {
        writeln!(f, "[{:04X}] {}", addr, row)?;
    }
    Ok(())
}

impl fmt::Display for MemoryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dump(f, &self.zero_page)?;
        write_dump(f, &self.stack)
    }
}
