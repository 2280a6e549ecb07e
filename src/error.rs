use std::num::ParseIntError;
use std::ops::Range;

use miette::{miette, LabeledSpan, Report, Severity};

// Loader errors

pub fn load_bad_lit(span: Range<usize>, src: &str, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::bad_lit",
        help = "each line holds one byte, written as up to 8 binary digits like 10000010",
        labels = vec![LabeledSpan::at(span, "incorrect literal")],
        "Encountered an invalid byte literal: {e}",
    )
    .with_source_code(src.to_string())
}

pub fn load_too_long(span: Range<usize>, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_long",
        help = "programs are limited to the 256 bytes of machine memory",
        labels = vec![LabeledSpan::at(span, "first byte past the end of memory")],
        "Program does not fit in memory",
    )
    .with_source_code(src.to_string())
}

pub fn load_raw_too_long(len: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_long",
        help = "programs are limited to the 256 bytes of machine memory",
        "Program of {len} bytes does not fit in memory",
    )
}

// Runtime errors

pub fn runtime_unknown_opcode(byte: u8, addr: u8) -> Report {
    miette!(
        severity = Severity::Error,
        code = "runtime::unknown_opcode",
        help = "the machine executes whatever the program counter points at, so a stray data byte usually means a missing or misplaced HLT",
        "Unknown opcode 0b{byte:08b} (0x{byte:02X}) at address 0x{addr:02X}",
    )
}

pub fn runtime_bad_register(reg: u8, addr: u8) -> Report {
    miette!(
        severity = Severity::Error,
        code = "runtime::bad_register",
        help = "register operands must name one of R0 through R7",
        "Register index {reg} out of range in the instruction at address 0x{addr:02X}",
    )
}

pub fn runtime_pc_overflow(addr: u8) -> Report {
    miette!(
        severity = Severity::Error,
        code = "runtime::pc_overflow",
        help = "the last reachable instruction of a program should be HLT",
        "Execution ran past the end of memory after address 0x{addr:02X}",
    )
}
