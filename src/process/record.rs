//! Little-endian binary records for process configuration.
//!
//! A record is a `u32` variant tag, a `u32` version, then the variant's fields
//! in declaration order: `f64` for constants, `u32` for indices and counts.

use std::io::{Read, Write};

use crate::error::{Result, SweepError};
use crate::particle::ComponentChange;

pub const RECORD_VERSION: u32 = 1;

pub const COAGULATION_TAG: u32 = 1;
pub const SURFACE_OXIDATION_TAG: u32 = 2;
pub const MASS_DIFFUSION_TAG: u32 = 3;

pub fn write_u32(out: &mut dyn Write, value: u32) -> Result<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub fn read_u32(input: &mut dyn Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn write_f64(out: &mut dyn Write, value: f64) -> Result<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub fn read_f64(input: &mut dyn Read) -> Result<f64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

pub fn write_bool(out: &mut dyn Write, value: bool) -> Result<()> {
    write_u32(out, u32::from(value))
}

pub fn read_bool(input: &mut dyn Read) -> Result<bool> {
    match read_u32(input)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SweepError::Record(format!("invalid flag value {}", other))),
    }
}

/// Indices are stored as fixed-width `u32` fields.
pub fn write_index(out: &mut dyn Write, index: usize) -> Result<()> {
    let value = u32::try_from(index)
        .map_err(|_| SweepError::Record(format!("index {} does not fit in a u32 field", index)))?;
    write_u32(out, value)
}

pub fn read_index(input: &mut dyn Read) -> Result<usize> {
    Ok(read_u32(input)? as usize)
}

pub fn write_header(out: &mut dyn Write, tag: u32) -> Result<()> {
    write_u32(out, tag)?;
    write_u32(out, RECORD_VERSION)
}

/// Reads the header and returns the variant tag.
pub fn read_header(input: &mut dyn Read) -> Result<u32> {
    let tag = read_u32(input)?;
    let version = read_u32(input)?;
    if version != RECORD_VERSION {
        return Err(SweepError::Record(format!(
            "unsupported record version {} (expected {})",
            version, RECORD_VERSION
        )));
    }
    Ok(tag)
}

pub fn write_changes(out: &mut dyn Write, changes: &[ComponentChange]) -> Result<()> {
    write_index(out, changes.len())?;
    for change in changes {
        write_index(out, change.component)?;
        write_f64(out, change.delta)?;
    }
    Ok(())
}

pub fn read_changes(input: &mut dyn Read) -> Result<Vec<ComponentChange>> {
    let count = read_index(input)?;
    (0..count)
        .map(|_| {
            let component = read_index(input)?;
            let delta = read_f64(input)?;
            Ok(ComponentChange { component, delta })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_rejects_unknown_version() {
        let mut buf = Vec::new();
        write_u32(&mut buf, COAGULATION_TAG).unwrap();
        write_u32(&mut buf, 99).unwrap();
        let result = read_header(&mut Cursor::new(buf));
        assert!(matches!(result, Err(SweepError::Record(_))));
    }

    #[test]
    fn test_truncated_record_is_io_error() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 7).unwrap();
        let result = read_f64(&mut Cursor::new(buf));
        assert!(matches!(result, Err(SweepError::Io(_))));
    }

    #[test]
    fn test_field_layout_is_little_endian() {
        let mut buf = Vec::new();
        write_header(&mut buf, SURFACE_OXIDATION_TAG).unwrap();
        write_f64(&mut buf, 1.5).unwrap();
        assert_eq!(&buf[..8], &[2, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(&buf[8..], &1.5f64.to_le_bytes());
    }
}
