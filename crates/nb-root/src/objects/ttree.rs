//! `TTree`, `TBranch`, `TBranchElement` and `TLeaf` streamers.

use std::collections::HashMap;

use crate::error::{Result, RootError};
use crate::rbuffer::{BYTE_COUNT_MASK, RBuffer};
use crate::tree::{BranchInfo, BranchKind, LeafType, Tree};

const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
const CLASS_MASK: u32 = 0x8000_0000;
/// `kMapOffset`: offset between buffer positions and reference-map keys.
const MAP_OFFSET: usize = 2;

/// What a pointer slot in the stream holds.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Null pointer.
    Null,
    /// Back-reference to an object read earlier; nothing else follows.
    Reference,
    /// An inline object. `class_name` is `None` when the class tag refers to
    /// a registration this reader never saw.
    Object { class_name: Option<String>, end: Option<usize> },
}

/// Class-reference map for one object payload.
///
/// ROOT keys its map by position in the original key buffer, where the
/// payload starts `key_len` bytes in.
struct ClassRefs {
    origin: usize,
    classes: HashMap<usize, String>,
}

impl ClassRefs {
    fn new(key_len: usize) -> Self {
        Self { origin: key_len, classes: HashMap::new() }
    }

    fn read_slot(&mut self, r: &mut RBuffer) -> Result<Slot> {
        let word = r.read_u32()?;
        let (tag, tag_pos, end) = if word & BYTE_COUNT_MASK == 0 || word == NEW_CLASS_TAG {
            (word, None, None)
        } else {
            let tag_pos = r.pos();
            let end = tag_pos + (word & !BYTE_COUNT_MASK) as usize;
            (r.read_u32()?, Some(tag_pos), Some(end))
        };

        if tag == NEW_CLASS_TAG {
            let name = r.read_cstring()?;
            let slot = match tag_pos {
                Some(pos) => pos + self.origin + MAP_OFFSET,
                None => self.classes.len() + 1,
            };
            self.classes.insert(slot, name.clone());
            return Ok(Slot::Object { class_name: Some(name), end });
        }
        if tag & CLASS_MASK == 0 {
            return Ok(if tag == 0 { Slot::Null } else { Slot::Reference });
        }
        let reference = (tag & !CLASS_MASK) as usize;
        let class_name = self.classes.get(&reference).cloned();
        if class_name.is_none() {
            log::debug!("unresolved class reference {reference:#x}");
        }
        Ok(Slot::Object { class_name, end })
    }

    /// Read a `TObjArray` header and return its element count and end.
    fn read_obj_array_header(r: &mut RBuffer) -> Result<(usize, Option<usize>)> {
        let header = r.read_version()?;
        r.read_tobject()?;
        let _name = r.read_string()?;
        let count = r.read_i32()?;
        let _low = r.read_i32()?;
        let count = usize::try_from(count)
            .map_err(|_| RootError::Deserialization(format!("negative TObjArray size {count}")))?;
        Ok((count, header.end))
    }

    /// Read a `TObjArray` of branches.
    fn read_branches(&mut self, r: &mut RBuffer) -> Result<Vec<BranchInfo>> {
        let (count, array_end) = Self::read_obj_array_header(r)?;
        let mut branches = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            let Slot::Object { class_name, end } = self.read_slot(r)? else {
                continue;
            };
            let class_name = match class_name {
                Some(name) => name,
                None => sniff_branch_class(r)?,
            };
            let parsed = match class_name.as_str() {
                "TBranch" => self.read_branch(r).map(Some),
                "TBranchElement" => self.read_branch_element(r).map(Some),
                other => {
                    log::debug!("skipping branch of class {other}");
                    Ok(None)
                }
            };
            match (parsed, end) {
                (Ok(Some(branch)), _) => branches.push(branch),
                (Ok(None), Some(_)) => {}
                (Err(e), Some(_)) => log::debug!("skipping unreadable {class_name}: {e}"),
                (Ok(None), None) => {
                    return Err(RootError::Deserialization(format!(
                        "cannot skip {class_name} without byte count"
                    )));
                }
                (Err(e), None) => return Err(e),
            }
            if let Some(end) = end {
                r.set_pos(end)?;
            }
        }
        if let Some(end) = array_end {
            r.set_pos(end)?;
        }
        Ok(branches)
    }

    /// Plain `TBranch`: the element type comes from the leaf, or from the
    /// type code of the leaf list.
    fn read_branch(&mut self, r: &mut RBuffer) -> Result<BranchInfo> {
        let raw = self.read_branch_fields(r)?;
        let leaf_type = raw.leaf_type.or_else(|| LeafType::from_leaf_title(&raw.title));
        raw.into_info(BranchKind::Leaf, leaf_type)
    }

    /// `TBranchElement`: a `TBranch` base followed by the streamed class name.
    fn read_branch_element(&mut self, r: &mut RBuffer) -> Result<BranchInfo> {
        let header = r.read_version()?;
        let raw = self.read_branch_fields(r)?;
        let class_name = r.read_string()?;
        r.finish(header)?;

        let leaf_type = LeafType::from_vector_class(&class_name).or(raw.leaf_type);
        raw.into_info(BranchKind::Element { class_name }, leaf_type)
    }

    /// `TBranch` streamer (versions 10-13).
    fn read_branch_fields(&mut self, r: &mut RBuffer) -> Result<RawBranch> {
        let header = r.read_version()?;
        if header.version < 10 {
            return Err(RootError::Deserialization(format!(
                "TBranch version {} is not supported",
                header.version
            )));
        }
        let (name, title) = r.read_tnamed()?;
        r.skip_object()?; // TAttFill

        let _compress = r.read_i32()?;
        let _basket_size = r.read_i32()?;
        let entry_offset_len = r.read_i32()?;
        let write_basket = r.read_i32()?;
        let _entry_number = r.read_i64()?;
        if header.version >= 13 {
            r.skip_object()?; // TIOFeatures
        }
        let _offset = r.read_i32()?;
        let max_baskets = r.read_i32()?;
        let _split_level = r.read_i32()?;
        let entries = r.read_i64()?;
        if header.version >= 11 {
            let _first_entry = r.read_i64()?;
        }
        let _tot_bytes = r.read_i64()?;
        let _zip_bytes = r.read_i64()?;

        let _sub_branches = self.read_branches(r)?;
        let leaf_type = self.read_leaves(r)?;
        self.skip_baskets(r)?;

        let max = usize::try_from(max_baskets).unwrap_or(0);
        let written = usize::try_from(write_basket).unwrap_or(0).min(max);
        let mut basket_bytes: Vec<u32> = r.read_flagged_array(max, |r| Ok(r.read_i32()? as u32))?;
        let mut basket_entry: Vec<u64> = r.read_flagged_array(max, |r| Ok(r.read_i64()? as u64))?;
        let mut basket_seek: Vec<u64> = r.read_flagged_array(max, |r| Ok(r.read_i64()? as u64))?;
        r.finish(header)?; // fFileName

        basket_bytes.truncate(written);
        basket_seek.truncate(written);
        basket_entry.truncate(written + 1);

        Ok(RawBranch {
            name,
            title,
            leaf_type,
            entries: entries.max(0) as u64,
            entry_offset_len: entry_offset_len.max(0) as u32,
            basket_bytes,
            basket_entry,
            basket_seek,
        })
    }

    /// Read a `TObjArray` of leaves and return the first leaf's type.
    fn read_leaves(&mut self, r: &mut RBuffer) -> Result<Option<LeafType>> {
        let (count, array_end) = Self::read_obj_array_header(r)?;
        let mut first = None;
        for i in 0..count {
            if let Slot::Object { class_name, end } = self.read_slot(r)? {
                let leaf = self.read_leaf(r, class_name.as_deref(), end)?;
                if i == 0 {
                    first = leaf;
                }
            }
        }
        if let Some(end) = array_end {
            r.set_pos(end)?;
        }
        Ok(first)
    }

    /// `TLeaf*` streamer: subclass header, then the `TLeaf` base.
    fn read_leaf(
        &mut self,
        r: &mut RBuffer,
        class_name: Option<&str>,
        end: Option<usize>,
    ) -> Result<Option<LeafType>> {
        let outer = r.read_version()?;
        let base = r.read_version()?;
        let (_name, _title) = r.read_tnamed()?;
        let _len = r.read_i32()?;
        let _len_type = r.read_i32()?;
        let _offset = r.read_i32()?;
        let _is_range = r.read_u8()?;
        let is_unsigned = r.read_u8()? != 0;
        // fLeafCount
        if let Slot::Object { class_name: count_class, end: count_end } = self.read_slot(r)? {
            self.read_leaf(r, count_class.as_deref(), count_end)?;
        }
        r.finish(base)?;
        r.finish(outer)?;
        if let Some(end) = end {
            r.set_pos(end)?;
        }

        Ok(class_name
            .and_then(LeafType::from_leaf_class)
            .map(|t| if is_unsigned { unsigned_variant(t) } else { t }))
    }

    /// Walk the in-memory `fBaskets` array, registering classes only.
    fn skip_baskets(&mut self, r: &mut RBuffer) -> Result<()> {
        let (count, array_end) = Self::read_obj_array_header(r)?;
        for _ in 0..count {
            if let Slot::Object { end: Some(end), .. } = self.read_slot(r)? {
                r.set_pos(end)?;
            }
        }
        if let Some(end) = array_end {
            r.set_pos(end)?;
        }
        Ok(())
    }
}

/// `TBranch` fields before the element type is settled.
struct RawBranch {
    name: String,
    title: String,
    leaf_type: Option<LeafType>,
    entries: u64,
    entry_offset_len: u32,
    basket_bytes: Vec<u32>,
    basket_entry: Vec<u64>,
    basket_seek: Vec<u64>,
}

impl RawBranch {
    fn into_info(self, kind: BranchKind, leaf_type: Option<LeafType>) -> Result<BranchInfo> {
        let leaf_type = leaf_type.ok_or_else(|| {
            RootError::TypeMismatch(format!(
                "branch '{}' ({:?}, title '{}') has no numeric element type",
                self.name, kind, self.title
            ))
        })?;
        Ok(BranchInfo {
            name: self.name,
            title: self.title,
            kind,
            leaf_type,
            entries: self.entries,
            entry_offset_len: self.entry_offset_len,
            basket_bytes: self.basket_bytes,
            basket_entry: self.basket_entry,
            basket_seek: self.basket_seek,
        })
    }
}

fn unsigned_variant(t: LeafType) -> LeafType {
    match t {
        LeafType::I8 => LeafType::U8,
        LeafType::I16 => LeafType::U16,
        LeafType::I32 => LeafType::U32,
        LeafType::I64 => LeafType::U64,
        other => other,
    }
}

/// Guess the class of a branch whose class tag could not be resolved.
///
/// A `TBranch` opens with its `TNamed` base (version 1); a
/// `TBranchElement` opens with its `TBranch` base (version >= 10).
fn sniff_branch_class(r: &mut RBuffer) -> Result<String> {
    let start = r.pos();
    let _outer = r.read_version()?;
    let inner = r.read_version()?;
    r.set_pos(start)?;
    Ok(if inner.version <= 1 { "TBranch" } else { "TBranchElement" }.to_string())
}

/// Parse a `TTree` from its key payload. `key_len` is the length of the key
/// header that preceded the payload in the file.
pub fn read_tree(payload: &[u8], key_len: usize) -> Result<Tree> {
    let mut r = RBuffer::new(payload);
    let mut refs = ClassRefs::new(key_len);

    let header = r.read_version()?;
    if header.version < 16 {
        return Err(RootError::Deserialization(format!(
            "TTree version {} is not supported",
            header.version
        )));
    }
    let v = header.version;
    let (name, _title) = r.read_tnamed()?;
    r.skip_object()?; // TAttLine
    r.skip_object()?; // TAttFill
    r.skip_object()?; // TAttMarker

    let entries = r.read_i64()?;
    let _tot_bytes = r.read_i64()?;
    let _zip_bytes = r.read_i64()?;
    let _saved_bytes = r.read_i64()?;
    if v >= 18 {
        let _flushed_bytes = r.read_i64()?;
    }
    let _weight = r.read_f64()?;
    let _timer_interval = r.read_i32()?;
    let _scan_field = r.read_i32()?;
    let _update = r.read_i32()?;
    if v >= 18 {
        let _default_entry_offset_len = r.read_i32()?;
    }
    let n_cluster_range = if v >= 19 { r.read_i32()?.max(0) as usize } else { 0 };
    let _max_entries = r.read_i64()?;
    let _max_entry_loop = r.read_i64()?;
    let _max_virtual_size = r.read_i64()?;
    let _auto_save = r.read_i64()?;
    if v >= 18 {
        let _auto_flush = r.read_i64()?;
    }
    let _estimate = r.read_i64()?;
    if v >= 19 {
        let _cluster_range_end = r.read_flagged_array(n_cluster_range, |r| r.read_i64())?;
        let _cluster_size = r.read_flagged_array(n_cluster_range, |r| r.read_i64())?;
    }
    if v >= 20 {
        r.skip_object()?; // TIOFeatures
    }

    let branches = refs.read_branches(&mut r)?;
    log::debug!("tree '{name}': {entries} entries, {} branches", branches.len());

    Ok(Tree { name, entries: entries.max(0) as u64, branches })
}
