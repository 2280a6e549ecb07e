use miette::Result;

use crate::error;
use crate::ops::{AluOp, Opcode};

/// The LS-8 can address 256 bytes of memory.
pub(crate) const MEMORY_MAX: usize = 0x100;

/// Widest instruction: opcode plus two operand bytes.
const MAX_OPERANDS: usize = 2;

/// Represents complete machine state during runtime.
pub struct RunState {
    /// System memory - 256 bytes in size.
    mem: [u8; MEMORY_MAX],
    /// Program counter
    pc: u8,
    /// 8x 8-bit registers, R6 doubling as the stack pointer
    reg: [u8; 8],
    /// Condition flags, untouched by the current instruction set
    _fl: u8,
    /// Cleared by HLT
    running: bool,
    /// Print machine state to stderr before every cycle
    trace: bool,
}

impl RunState {
    /// Place a program at the bottom of zeroed memory, ready to run.
    pub fn from_raw(raw: &[u8]) -> Result<RunState> {
        if raw.len() > MEMORY_MAX {
            return Err(error::load_raw_too_long(raw.len()));
        }

        let mut mem = [0; MEMORY_MAX];
        mem[..raw.len()].copy_from_slice(raw);

        Ok(RunState {
            mem,
            pc: 0,
            // R6 starts at the conventional top of stack
            reg: [0, 0, 0, 0, 0, 0, 0xF4, 0],
            _fl: 0,
            running: true,
            trace: false,
        })
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run with preset memory until HLT.
    pub fn run(&mut self) -> Result<()> {
        while self.running {
            self.step()?;
        }
        Ok(())
    }

    /// Execute a single fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<()> {
        if self.trace {
            self.print_trace();
        }

        let ir_addr = self.pc;
        let ir = self.ram_read(ir_addr);
        let op =
            Opcode::try_from(ir).map_err(|byte| error::runtime_unknown_opcode(byte, ir_addr))?;

        // Operands are fetched only after the opcode says how many exist
        let mut operands = [0; MAX_OPERANDS];
        for (offs, operand) in operands.iter_mut().take(op.operand_count()).enumerate() {
            *operand = self.ram_read(self.offset_pc(1 + offs as u8)?);
        }

        match op {
            Opcode::LDI => self.reg_write(operands[0], operands[1])?,
            Opcode::PRN => println!("{}", self.reg_read(operands[0])?),
            Opcode::ADD => self.alu(AluOp::Add, operands[0], operands[1])?,
            Opcode::MUL => self.alu(AluOp::Mul, operands[0], operands[1])?,
            Opcode::HLT => self.running = false,
        }

        // A halted machine keeps its pc on the HLT instruction
        if self.running {
            self.pc = self.offset_pc(op.size())?;
        }
        Ok(())
    }

    /// Wrapping arithmetic into `reg_a`.
    fn alu(&mut self, op: AluOp, reg_a: u8, reg_b: u8) -> Result<()> {
        let a = self.reg_read(reg_a)?;
        let b = self.reg_read(reg_b)?;
        let res = match op {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Mul => a.wrapping_mul(b),
        };
        self.reg_write(reg_a, res)
    }

    /// Read the byte at `addr`.
    ///
    /// Any `u8` address is inside memory, so this cannot fail.
    pub fn ram_read(&self, addr: u8) -> u8 {
        self.mem[addr as usize]
    }

    /// Store `value` at `addr`.
    pub fn ram_write(&mut self, addr: u8, value: u8) {
        self.mem[addr as usize] = value;
    }

    /// Read a general purpose register.
    ///
    /// Register operands come straight from program bytes; an index past R7
    /// is a reported error.
    pub fn reg_read(&self, reg: u8) -> Result<u8> {
        match self.reg.get(reg as usize) {
            Some(&val) => Ok(val),
            None => Err(error::runtime_bad_register(reg, self.pc)),
        }
    }

    /// Write a general purpose register.
    pub fn reg_write(&mut self, reg: u8, value: u8) -> Result<()> {
        match self.reg.get_mut(reg as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(error::runtime_bad_register(reg, self.pc)),
        }
    }

    /// Address of the byte `offs` past the current instruction.
    fn offset_pc(&self, offs: u8) -> Result<u8> {
        self.pc
            .checked_add(offs)
            .ok_or_else(|| error::runtime_pc_overflow(self.pc))
    }

    /// Print one line of machine state, handy when debugging a program.
    fn print_trace(&self) {
        // Peeks past pc may wrap near the end of memory; the trace is
        // diagnostic output only
        eprint!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            self.ram_read(self.pc),
            self.ram_read(self.pc.wrapping_add(1)),
            self.ram_read(self.pc.wrapping_add(2)),
        );
        for val in self.reg {
            eprint!(" {val:02X}");
        }
        eprintln!();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ops;

    fn run_program(bytes: &[u8]) -> RunState {
        let mut state = RunState::from_raw(bytes).unwrap();
        state.run().unwrap();
        state
    }

    #[test]
    fn registers_start_zeroed_except_stack_pointer() {
        let state = RunState::from_raw(&[]).unwrap();
        for reg in [0, 1, 2, 3, 4, 5, 7] {
            assert_eq!(state.reg_read(reg).unwrap(), 0);
        }
        assert_eq!(state.reg_read(6).unwrap(), 0xF4);
        assert_eq!(state.pc(), 0);
        assert!(state.is_running());
    }

    #[test]
    fn program_must_fit_in_memory() {
        assert!(RunState::from_raw(&[0; MEMORY_MAX]).is_ok());
        assert!(RunState::from_raw(&[0; MEMORY_MAX + 1]).is_err());
    }

    #[test]
    fn ldi_loads_immediate() {
        for (reg, val) in [(0, 8), (3, 123), (7, 255)] {
            let state = run_program(&[ops::LDI, reg, val, ops::HLT]);
            assert_eq!(state.reg_read(reg).unwrap(), val);
        }
    }

    #[test]
    fn add_wraps_modulo_256() {
        #[rustfmt::skip]
        let state = run_program(&[
            ops::LDI, 0, 250,
            ops::LDI, 1, 10,
            ops::ADD, 0, 1,
            ops::HLT,
        ]);
        assert_eq!(state.reg_read(0).unwrap(), 4);
    }

    #[test]
    fn mul_wraps_and_commutes() {
        for (a, b) in [(9u8, 10u8), (16, 16), (255, 255)] {
            let expected = (a as u16 * b as u16 % 256) as u8;
            #[rustfmt::skip]
            let lhs = run_program(&[
                ops::LDI, 0, a,
                ops::LDI, 1, b,
                ops::MUL, 0, 1,
                ops::HLT,
            ]);
            #[rustfmt::skip]
            let rhs = run_program(&[
                ops::LDI, 0, b,
                ops::LDI, 1, a,
                ops::MUL, 0, 1,
                ops::HLT,
            ]);
            assert_eq!(lhs.reg_read(0).unwrap(), expected);
            assert_eq!(rhs.reg_read(0).unwrap(), expected);
        }
    }

    #[test]
    fn hlt_alone_stops_the_loop() {
        let state = run_program(&[ops::HLT]);
        assert!(!state.is_running());
        assert_eq!(state.pc(), 0);
    }

    #[test]
    fn pc_advances_by_instruction_width() {
        // LDI R0,8 ; PRN R0 ; HLT - exactly three cycles
        let mut state = RunState::from_raw(&[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001])
            .unwrap();
        state.step().unwrap();
        assert_eq!(state.pc(), 3);
        state.step().unwrap();
        assert_eq!(state.pc(), 5);
        state.step().unwrap();
        assert!(!state.is_running());
        assert_eq!(state.reg_read(0).unwrap(), 8);
    }

    #[test]
    fn unknown_opcode_reports_byte_and_address() {
        let mut state = RunState::from_raw(&[ops::LDI, 0, 8, 0b1111_1111]).unwrap();
        let err = state.run().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("0b11111111"));
        assert!(text.contains("0x03"));
        // Work done before the bad byte is left intact
        assert_eq!(state.reg_read(0).unwrap(), 8);
        assert!(state.is_running());
    }

    #[test]
    fn register_operand_past_r7_is_an_error() {
        let mut state = RunState::from_raw(&[ops::LDI, 8, 1, ops::HLT]).unwrap();
        let err = state.run().unwrap_err();
        assert!(err.to_string().contains("Register index 8"));
    }

    #[test]
    fn hlt_in_last_cell_halts_cleanly() {
        // 85 LDIs fill addresses 0..255, leaving HLT in the last cell
        let mut bytes = Vec::with_capacity(MEMORY_MAX);
        for _ in 0..85 {
            bytes.extend_from_slice(&[ops::LDI, 0, 0]);
        }
        bytes.push(ops::HLT);
        assert_eq!(bytes.len(), MEMORY_MAX);

        let state = run_program(&bytes);
        assert!(!state.is_running());
        assert_eq!(state.pc(), 0xFF);
    }

    #[test]
    fn instruction_overhanging_memory_is_an_error() {
        // A lone LDI opcode in the last cell wants operands past address 255
        let mut bytes = Vec::with_capacity(MEMORY_MAX - 1);
        for _ in 0..84 {
            bytes.extend_from_slice(&[ops::LDI, 0, 0]);
        }
        bytes.extend_from_slice(&[ops::PRN, 0]);
        bytes.push(ops::LDI);
        assert_eq!(bytes.len(), MEMORY_MAX - 1);

        let mut state = RunState::from_raw(&bytes).unwrap();
        let err = state.run().unwrap_err();
        assert!(err.to_string().contains("end of memory"));
    }

    #[test]
    fn ram_accessors_cover_all_of_memory() {
        let mut state = RunState::from_raw(&[]).unwrap();
        state.ram_write(0, 0xAA);
        state.ram_write(255, 0x55);
        assert_eq!(state.ram_read(0), 0xAA);
        assert_eq!(state.ram_read(255), 0x55);
        assert_eq!(state.ram_read(128), 0);
    }
}
