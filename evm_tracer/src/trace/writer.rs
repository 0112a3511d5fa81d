use std::marker::PhantomData;

use bitvec::prelude::*;
use ethereum_types::U256;
use evm_tracer_common::{right_pad, u256_to_be_bytes};

use super::column::ColumnSet;
use super::ModuleTrace;
use crate::error::TraceError;

/// Writes fixed-width rows into one pre-sized buffer per column.
///
/// Each column of a row must be set exactly once before the row can be
/// validated. Values are big-endian: leading zero bytes are dropped, the
/// remaining bit length is checked against the column width, and the value is
/// written left-padded.
#[derive(Debug)]
pub struct TraceWriter<C: ColumnSet> {
    capacity: usize,
    rows: usize,
    buffers: Vec<Vec<u8>>,
    filled: BitVec,
    _columns: PhantomData<C>,
}

impl<C: ColumnSet> TraceWriter<C> {
    /// Reserves room for exactly `capacity` rows.
    pub fn new(capacity: usize) -> Self {
        let buffers = C::DEFS
            .iter()
            .map(|def| vec![0u8; def.width * capacity])
            .collect();
        Self {
            capacity,
            rows: 0,
            buffers,
            filled: bitvec![0; C::DEFS.len()],
            _columns: PhantomData,
        }
    }

    pub fn set_bool(&mut self, column: C, value: bool) -> Result<&mut Self, TraceError> {
        self.write(column, &[value as u8])
    }

    pub fn set_u64(&mut self, column: C, value: u64) -> Result<&mut Self, TraceError> {
        self.write(column, &value.to_be_bytes())
    }

    pub fn set_u128(&mut self, column: C, value: u128) -> Result<&mut Self, TraceError> {
        self.write(column, &value.to_be_bytes())
    }

    pub fn set_u256(&mut self, column: C, value: U256) -> Result<&mut Self, TraceError> {
        self.write(column, &u256_to_be_bytes(value))
    }

    /// Sets a big-endian value given as raw bytes.
    pub fn set_bytes(&mut self, column: C, value: &[u8]) -> Result<&mut Self, TraceError> {
        self.write(column, value)
    }

    /// Sets a left-aligned limb, right-padded to the column width.
    pub fn set_limb(&mut self, column: C, limb: &[u8]) -> Result<&mut Self, TraceError> {
        let def = column.def();
        if limb.len() > def.width {
            return Err(TraceError::InvalidWidth {
                column: def.name,
                bits: limb.len() * 8,
            });
        }
        self.write(column, &right_pad(limb, def.width))
    }

    fn write(&mut self, column: C, value: &[u8]) -> Result<&mut Self, TraceError> {
        let def = column.def();
        let index = column.index();
        if self.filled[index] {
            return Err(TraceError::ColumnAlreadySet(def.name));
        }
        if self.rows >= self.capacity {
            return Err(TraceError::BufferOverflow {
                module: C::MODULE,
                capacity: self.capacity,
            });
        }

        let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
        let trimmed = &value[start..];
        let bits = match trimmed.first() {
            Some(first) => trimmed.len() * 8 - first.leading_zeros() as usize,
            None => 0,
        };
        if bits > def.width * 8 {
            return Err(TraceError::InvalidWidth {
                column: def.name,
                bits,
            });
        }

        let row_end = (self.rows + 1) * def.width;
        self.buffers[index][row_end - trimmed.len()..row_end].copy_from_slice(trimmed);
        self.filled.set(index, true);
        Ok(self)
    }

    /// Closes the current row, failing on the first column left unset.
    pub fn validate_row(&mut self) -> Result<(), TraceError> {
        if let Some(missing) = self.filled.first_zero() {
            return Err(TraceError::ColumnNotFilled(C::DEFS[missing].name));
        }
        self.advance()
    }

    /// Closes the current row, leaving every unset column at zero.
    pub fn fill_and_validate_row(&mut self) -> Result<(), TraceError> {
        if self.rows >= self.capacity {
            return Err(TraceError::BufferOverflow {
                module: C::MODULE,
                capacity: self.capacity,
            });
        }
        self.advance()
    }

    fn advance(&mut self) -> Result<(), TraceError> {
        self.rows += 1;
        self.filled.fill(false);
        Ok(())
    }

    /// Number of validated rows.
    pub fn size(&self) -> Result<usize, TraceError> {
        if self.filled.any() {
            return Err(TraceError::RowNotValidated {
                module: C::MODULE,
                row: self.rows,
            });
        }
        Ok(self.rows)
    }

    /// Checks that every reserved row was written and hands out the buffers.
    pub fn finish(self) -> Result<ModuleTrace, TraceError> {
        let rows = self.size()?;
        if rows != self.capacity {
            return Err(TraceError::LineCountMismatch {
                module: C::MODULE,
                expected: self.capacity,
                actual: rows,
            });
        }
        Ok(ModuleTrace {
            module: C::MODULE,
            headers: C::headers(rows),
            columns: self.buffers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::declare_columns! {
        enum Cols in "test" {
            Wide => "WIDE": 4,
            Flag => "FLAG": 1,
        }
    }

    #[test]
    fn full_row_validates_once() -> Result<(), TraceError> {
        let mut trace = TraceWriter::<Cols>::new(2);
        trace.set_u64(Cols::Wide, 0x0102)?.set_bool(Cols::Flag, true)?;
        trace.validate_row()?;
        assert_eq!(trace.size()?, 1);
        assert!(matches!(
            trace.validate_row(),
            Err(TraceError::ColumnNotFilled("test.WIDE"))
        ));
        Ok(())
    }

    #[test]
    fn missing_column_is_named() {
        let mut trace = TraceWriter::<Cols>::new(1);
        trace.set_u64(Cols::Wide, 1).unwrap();
        let err = trace.validate_row().unwrap_err();
        assert_eq!(err.to_string(), "test.FLAG has not been filled");
    }

    #[test]
    fn double_set_fails() {
        let mut trace = TraceWriter::<Cols>::new(1);
        trace.set_bool(Cols::Flag, false).unwrap();
        let err = trace.set_bool(Cols::Flag, true).unwrap_err();
        assert_eq!(err.to_string(), "test.FLAG already set");
    }

    #[test]
    fn width_is_enforced_on_trimmed_value() {
        let mut trace = TraceWriter::<Cols>::new(1);
        // Leading zeros do not count against the width.
        trace.set_bytes(Cols::Wide, &[0, 0, 0, 0, 0xff, 1, 2, 3]).unwrap();
        let err = trace.set_u64(Cols::Flag, 0x100).unwrap_err();
        assert_eq!(err.to_string(), "test.FLAG has invalid width (9 bits)");
    }

    #[test]
    fn values_are_left_padded() -> Result<(), TraceError> {
        let mut trace = TraceWriter::<Cols>::new(2);
        trace.set_u64(Cols::Wide, 0xabcd)?.set_bool(Cols::Flag, true)?;
        trace.validate_row()?;
        trace.fill_and_validate_row()?;
        let out = trace.finish()?;
        assert_eq!(out.columns[0], vec![0, 0, 0xab, 0xcd, 0, 0, 0, 0]);
        assert_eq!(out.columns[1], vec![1, 0]);
        assert_eq!(out.headers[0].length, 2);
        Ok(())
    }

    #[test]
    fn limbs_are_left_aligned() -> Result<(), TraceError> {
        let mut trace = TraceWriter::<Cols>::new(1);
        trace.set_limb(Cols::Wide, &[0x94, 0x01])?.set_bool(Cols::Flag, false)?;
        trace.validate_row()?;
        assert_eq!(trace.finish()?.columns[0], vec![0x94, 0x01, 0, 0]);

        let mut trace = TraceWriter::<Cols>::new(1);
        assert!(matches!(
            trace.set_limb(Cols::Wide, &[1; 5]),
            Err(TraceError::InvalidWidth { bits: 40, .. })
        ));
        Ok(())
    }

    #[test]
    fn size_rejects_partial_row() {
        let mut trace = TraceWriter::<Cols>::new(1);
        trace.set_bool(Cols::Flag, true).unwrap();
        assert!(matches!(
            trace.size(),
            Err(TraceError::RowNotValidated { row: 0, .. })
        ));
    }

    #[test]
    fn finish_checks_row_count() {
        let mut trace = TraceWriter::<Cols>::new(2);
        trace.fill_and_validate_row().unwrap();
        assert!(matches!(
            trace.finish(),
            Err(TraceError::LineCountMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn writing_past_capacity_fails() {
        let mut trace = TraceWriter::<Cols>::new(0);
        assert!(matches!(
            trace.set_bool(Cols::Flag, true),
            Err(TraceError::BufferOverflow { capacity: 0, .. })
        ));
    }
}
