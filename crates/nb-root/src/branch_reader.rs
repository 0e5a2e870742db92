//! Decode branch baskets into `f64` columns.

use nb_core::{Column, JaggedColumn};

use crate::basket::{Basket, read_basket};
use crate::error::{Result, RootError};
use crate::rbuffer::BYTE_COUNT_MASK;
use crate::tree::{BranchInfo, BranchKind, LeafType};

/// Size of the header in front of a streamed `std::vector<T>` entry:
/// byte count (4), class version (2), element count (4).
const STL_VECTOR_HEADER: usize = 10;

/// Reads the values of one branch.
pub struct BranchReader<'a> {
    file: &'a [u8],
    branch: &'a BranchInfo,
}

impl<'a> BranchReader<'a> {
    /// Reader over `branch` in the file bytes `file`.
    pub fn new(file: &'a [u8], branch: &'a BranchInfo) -> Self {
        Self { file, branch }
    }

    /// All values of a fixed-size branch, in entry order.
    ///
    /// Scalar leaves yield one value per entry; `x[n]/T` leaves yield `n`.
    pub fn as_f64(&self) -> Result<Vec<f64>> {
        if self.branch.is_jagged() {
            return Err(RootError::TypeMismatch(format!(
                "branch '{}' has variable-size entries",
                self.branch.name
            )));
        }
        let leaf = self.branch.leaf_type;
        let mut out = Vec::new();
        for i in 0..self.branch.n_baskets() {
            let basket = self.basket(i)?;
            decode_into(&basket.data, leaf, &self.branch.name, &mut out)?;
        }
        Ok(out)
    }

    /// Values of every entry as a jagged column.
    pub fn as_jagged(&self) -> Result<JaggedColumn> {
        let leaf = self.branch.leaf_type;
        let stl = matches!(self.branch.kind, BranchKind::Element { .. });
        let mut column = JaggedColumn { flat: Vec::new(), offsets: vec![0] };

        for i in 0..self.branch.n_baskets() {
            let basket = self.basket(i)?;
            match &basket.entry_offsets {
                Some(_) => {
                    for e in 0..basket.n_entries {
                        let chunk = basket.entry(e).ok_or_else(|| {
                            RootError::Deserialization(format!(
                                "branch '{}': basket {i} has no entry {e}",
                                self.branch.name
                            ))
                        })?;
                        let elems = if stl { stl_vector_elements(chunk, leaf) } else { None };
                        decode_into(elems.unwrap_or(chunk), leaf, &self.branch.name, &mut column.flat)?;
                        column.offsets.push(column.flat.len());
                    }
                }
                None => {
                    let n = self.branch.basket_entries(i).max(basket.n_entries);
                    if n == 0 {
                        continue;
                    }
                    if basket.data.is_empty() || basket.data.len() % n != 0 {
                        return Err(RootError::Deserialization(format!(
                            "branch '{}': basket {i} holds {} bytes for {n} entries",
                            self.branch.name,
                            basket.data.len()
                        )));
                    }
                    for chunk in basket.data.chunks_exact(basket.data.len() / n) {
                        decode_into(chunk, leaf, &self.branch.name, &mut column.flat)?;
                        column.offsets.push(column.flat.len());
                    }
                }
            }
        }

        if column.n_entries() as u64 != self.branch.entries {
            log::warn!(
                "branch '{}': decoded {} entries, metadata says {}",
                self.branch.name,
                column.n_entries(),
                self.branch.entries
            );
        }
        Ok(column)
    }

    /// The branch as a table column: scalar when every entry holds exactly
    /// one value, jagged otherwise.
    pub fn read_column(&self) -> Result<Column> {
        if self.branch.is_jagged() {
            return Ok(Column::Jagged(self.as_jagged()?));
        }
        let values = self.as_f64()?;
        let entries = self.branch.entries as usize;
        if values.len() == entries {
            return Ok(Column::Scalar(values));
        }
        if entries > 0 && values.len() % entries == 0 {
            let width = values.len() / entries;
            return Ok(Column::Jagged(JaggedColumn::from_rows(values.chunks_exact(width))));
        }
        Err(RootError::Deserialization(format!(
            "branch '{}': {} values for {entries} entries",
            self.branch.name,
            values.len()
        )))
    }

    fn basket(&self, i: usize) -> Result<Basket<'a>> {
        read_basket(self.file, self.branch.basket_seek[i])
    }
}

/// Elements of a streamed `std::vector<T>` entry, when `chunk` has the
/// vector header and its counts agree with the chunk length.
fn stl_vector_elements(chunk: &[u8], leaf: LeafType) -> Option<&[u8]> {
    let header = chunk.get(..STL_VECTOR_HEADER)?;
    let word = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if word & BYTE_COUNT_MASK == 0 {
        return None;
    }
    let byte_count = (word & !BYTE_COUNT_MASK) as usize;
    if byte_count + 4 != chunk.len() {
        return None;
    }
    let n = u32::from_be_bytes([header[6], header[7], header[8], header[9]]) as usize;
    let elems = &chunk[STL_VECTOR_HEADER..];
    (n.checked_mul(leaf.byte_size())? == elems.len()).then_some(elems)
}

fn decode_into(bytes: &[u8], leaf: LeafType, branch: &str, out: &mut Vec<f64>) -> Result<()> {
    let size = leaf.byte_size();
    if bytes.len() % size != 0 {
        return Err(RootError::Deserialization(format!(
            "branch '{branch}': {} bytes is not a multiple of {size}",
            bytes.len()
        )));
    }
    out.extend(bytes.chunks_exact(size).map(|b| leaf.decode(b)));
    Ok(())
}
