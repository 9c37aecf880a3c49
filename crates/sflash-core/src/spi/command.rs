//! SPI command frames
//!
//! A command is one chip-select bracket on the bus: the opcode, an
//! optional 3-byte big-endian address, the write payload, then padding
//! bytes clocked out while the response shifts in. Because the bus is
//! full duplex, the frame sent and the frame received always have the
//! same length; the response bytes of interest are the final
//! `read_len` bytes of the exchange.

/// A single SPI flash transaction
///
/// The lifetime parameter `'a` ties the command to the payload it
/// references, avoiding a copy for page-program data.
#[derive(Debug)]
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,
    /// Address (if any), sent big-endian in 3 bytes
    pub address: Option<u32>,
    /// Data to write after opcode and address
    pub write_data: &'a [u8],
    /// Number of response bytes expected after the header
    pub read_len: usize,
}

impl<'a> SpiCommand<'a> {
    /// Create a command with no address or data (e.g., WREN, WRDI)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_len: 0,
        }
    }

    /// Create a register read command with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, read_len: usize) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_len,
        }
    }

    /// Create a register write command with no address (e.g., WRSR)
    pub fn write_reg(opcode: u8, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: None,
            write_data: data,
            read_len: 0,
        }
    }

    /// Create an addressed read command (e.g., READ)
    pub fn read(opcode: u8, addr: u32, read_len: usize) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: &[],
            read_len,
        }
    }

    /// Create an addressed write command (e.g., PP)
    pub fn write(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: data,
            read_len: 0,
        }
    }

    /// Create an erase command (opcode + address, no data)
    pub fn erase(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: &[],
            read_len: 0,
        }
    }

    /// Length of the opcode + address header in bytes
    pub fn header_len(&self) -> usize {
        1 + if self.address.is_some() { 3 } else { 0 }
    }

    /// Total length of the duplex exchange in bytes
    pub fn frame_len(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_len
    }

    /// Encode the outgoing frame
    ///
    /// Response padding is zero-filled; the slave ignores MOSI while it
    /// drives data out.
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.frame_len());
        frame.push(self.opcode);
        if let Some(addr) = self.address {
            frame.push((addr >> 16) as u8);
            frame.push((addr >> 8) as u8);
            frame.push(addr as u8);
        }
        frame.extend_from_slice(self.write_data);
        frame.resize(self.frame_len(), 0);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_simple_frame() {
        let cmd = SpiCommand::simple(opcodes::WREN);
        assert_eq!(cmd.to_frame(), vec![0x06]);
    }

    #[test]
    fn test_read_frame_pads_for_response() {
        let cmd = SpiCommand::read(opcodes::READ, 0x012345, 4);
        assert_eq!(cmd.to_frame(), vec![0x03, 0x01, 0x23, 0x45, 0, 0, 0, 0]);
        assert_eq!(cmd.header_len(), 4);
        assert_eq!(cmd.frame_len(), 8);
    }

    #[test]
    fn test_write_frame_carries_payload() {
        let data = [0xAA, 0x55];
        let cmd = SpiCommand::write(opcodes::PP, 0x0100, &data);
        assert_eq!(cmd.to_frame(), vec![0x02, 0x00, 0x01, 0x00, 0xAA, 0x55]);
    }

    #[test]
    fn test_erase_frame() {
        let cmd = SpiCommand::erase(opcodes::BE_D8, 0x020000);
        assert_eq!(cmd.to_frame(), vec![0xD8, 0x02, 0x00, 0x00]);
    }
}
