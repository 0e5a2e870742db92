//! Minimal ROOT file writer for tests.
//!
//! Produces small-seek files with one directory holding one `TTree`, in the
//! layout ROOT 6 writes: `TBranch` + `TLeafI`/`TLeafD` for scalars and split
//! `TBranchElement` + `TLeafElement` for `vector<double>` branches.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

const BYTE_COUNT_MASK: u32 = 0x4000_0000;
const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
const CLASS_MASK: u32 = 0x8000_0000;
const BASKET_HEADER_LEN: usize = 19;

/// Values of one branch.
#[derive(Debug, Clone)]
pub enum Values {
    Int(Vec<i32>),
    Double(Vec<f64>),
    VectorDouble(Vec<Vec<f64>>),
}

impl Values {
    fn len(&self) -> usize {
        match self {
            Values::Int(v) => v.len(),
            Values::Double(v) => v.len(),
            Values::VectorDouble(v) => v.len(),
        }
    }

    fn is_jagged(&self) -> bool {
        matches!(self, Values::VectorDouble(_))
    }

    /// Serialized bytes of entry `i`.
    fn entry(&self, i: usize) -> Vec<u8> {
        match self {
            Values::Int(v) => v[i].to_be_bytes().to_vec(),
            Values::Double(v) => v[i].to_be_bytes().to_vec(),
            Values::VectorDouble(rows) => {
                let row = &rows[i];
                let mut out = Vec::with_capacity(10 + 8 * row.len());
                out.extend_from_slice(&((6 + 8 * row.len()) as u32 | BYTE_COUNT_MASK).to_be_bytes());
                out.extend_from_slice(&9u16.to_be_bytes());
                out.extend_from_slice(&(row.len() as u32).to_be_bytes());
                for v in row {
                    out.extend_from_slice(&v.to_be_bytes());
                }
                out
            }
        }
    }
}

/// Builds an in-memory ROOT file with one tree.
#[derive(Debug, Clone)]
pub struct NtupleBuilder {
    dir: String,
    tree: String,
    branches: Vec<(String, Values)>,
    basket_entries: usize,
    compress: bool,
}

impl NtupleBuilder {
    /// Tree `tree` inside directory `dir` (the analyzer writes `nnbar/nnbar`).
    pub fn new(dir: &str, tree: &str) -> Self {
        Self {
            dir: dir.into(),
            tree: tree.into(),
            branches: Vec::new(),
            basket_entries: 2,
            compress: true,
        }
    }

    pub fn int(mut self, name: &str, values: &[i32]) -> Self {
        self.branches.push((name.into(), Values::Int(values.to_vec())));
        self
    }

    pub fn double(mut self, name: &str, values: &[f64]) -> Self {
        self.branches.push((name.into(), Values::Double(values.to_vec())));
        self
    }

    pub fn vector(mut self, name: &str, rows: &[Vec<f64>]) -> Self {
        self.branches.push((name.into(), Values::VectorDouble(rows.to_vec())));
        self
    }

    /// Entries per basket.
    pub fn basket_entries(mut self, n: usize) -> Self {
        self.basket_entries = n.max(1);
        self
    }

    /// Whether objects are zlib-compressed.
    pub fn compressed(mut self, yes: bool) -> Self {
        self.compress = yes;
        self
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).expect("write test ROOT file");
    }

    pub fn build(&self) -> Vec<u8> {
        let n_entries = self.branches.first().map_or(0, |(_, v)| v.len());
        let mut file = vec![0u8; 100];

        let mut layouts = Vec::new();
        for (name, values) in &self.branches {
            assert_eq!(values.len(), n_entries, "branch {name} length");
            layouts.push(self.write_baskets(&mut file, name, values));
        }

        let title = "";
        let tree_key_len = key_len("TTree", &self.tree, title, 0);
        let tree_object = TreeWriter::new(tree_key_len).tree(&self.tree, n_entries, &self.branches, &layouts);
        let tree_header = write_key(&mut file, "TTree", &self.tree, title, &[], &tree_object, self.compress);

        let dir_keys_seek = write_key_list(&mut file, &self.dir, &[tree_header]);
        let record = dir_record(dir_keys_seek);
        let dir_header = write_key(&mut file, "TDirectoryFile", &self.dir, &self.dir, &[], &record, false);

        let top_keys_seek = write_key_list(&mut file, "test.root", &[dir_header]);

        let begin = file.len();
        let mut name_part = Vec::new();
        push_string(&mut name_part, "test.root");
        push_string(&mut name_part, "");
        let top_record = dir_record(top_keys_seek);
        let klen = key_len("TFile", "test.root", "", 0);
        let nbytes_name = klen + name_part.len();
        let header = key_header(
            (nbytes_name + top_record.len()) as u32,
            (name_part.len() + top_record.len()) as u32,
            klen,
            begin,
            "TFile",
            "test.root",
            "",
        );
        file.extend_from_slice(&header);
        file.extend_from_slice(&name_part);
        file.extend_from_slice(&top_record);

        let end = file.len() as u32;
        let mut h = Vec::new();
        h.extend_from_slice(b"root");
        h.extend_from_slice(&62206u32.to_be_bytes());
        h.extend_from_slice(&(begin as u32).to_be_bytes());
        h.extend_from_slice(&end.to_be_bytes());
        h.extend_from_slice(&0u32.to_be_bytes()); // fSeekFree
        h.extend_from_slice(&0u32.to_be_bytes()); // fNbytesFree
        h.extend_from_slice(&0u32.to_be_bytes()); // nfree
        h.extend_from_slice(&(nbytes_name as u32).to_be_bytes());
        h.push(4); // fUnits
        h.extend_from_slice(&101u32.to_be_bytes());
        h.extend_from_slice(&0u32.to_be_bytes()); // fSeekInfo
        h.extend_from_slice(&0u32.to_be_bytes()); // fNbytesInfo
        file[..h.len()].copy_from_slice(&h);
        file
    }

    fn write_baskets(&self, file: &mut Vec<u8>, name: &str, values: &Values) -> BranchLayout {
        let mut layout = BranchLayout::default();
        let n = values.len();
        let mut first = 0;
        while first < n {
            let last = (first + self.basket_entries).min(n);
            let klen = key_len("TBasket", name, &self.tree, BASKET_HEADER_LEN);

            let mut data = Vec::new();
            let mut starts = Vec::new();
            for i in first..last {
                starts.push(data.len());
                data.extend_from_slice(&values.entry(i));
            }
            let mut object = data.clone();
            if values.is_jagged() {
                object.extend_from_slice(&((starts.len() + 1) as i32).to_be_bytes());
                for s in &starts {
                    object.extend_from_slice(&((s + klen) as i32).to_be_bytes());
                }
                object.extend_from_slice(&0i32.to_be_bytes());
            }

            let mut extra = Vec::new();
            extra.extend_from_slice(&3u16.to_be_bytes());
            extra.extend_from_slice(&32000i32.to_be_bytes());
            extra.extend_from_slice(&(if values.is_jagged() { 40i32 } else { 8 }).to_be_bytes());
            extra.extend_from_slice(&((last - first) as i32).to_be_bytes());
            extra.extend_from_slice(&((klen + data.len()) as i32).to_be_bytes());
            extra.push(0);

            let seek = file.len();
            write_key(file, "TBasket", name, &self.tree, &extra, &object, self.compress);
            layout.seeks.push(seek as u64);
            layout.bytes.push((file.len() - seek) as u32);
            layout.first_entries.push(first as u64);
            first = last;
        }
        layout.first_entries.push(n as u64);
        layout
    }
}

#[derive(Debug, Default)]
struct BranchLayout {
    seeks: Vec<u64>,
    bytes: Vec<u32>,
    first_entries: Vec<u64>,
}

fn push_string(out: &mut Vec<u8>, s: &str) {
    assert!(s.len() < 255);
    out.push(s.len() as u8);
    out.extend_from_slice(s.as_bytes());
}

fn key_len(class: &str, name: &str, title: &str, extra: usize) -> usize {
    26 + 3 + class.len() + name.len() + title.len() + extra
}

fn key_header(
    n_bytes: u32,
    obj_len: u32,
    key_len: usize,
    seek: usize,
    class: &str,
    name: &str,
    title: &str,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&n_bytes.to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(&obj_len.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&(key_len as u16).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(seek as u32).to_be_bytes());
    out.extend_from_slice(&100u32.to_be_bytes());
    push_string(&mut out, class);
    push_string(&mut out, name);
    push_string(&mut out, title);
    out
}

/// Append a key with its object; returns the bare `TKey` header.
fn write_key(
    file: &mut Vec<u8>,
    class: &str,
    name: &str,
    title: &str,
    extra: &[u8],
    object: &[u8],
    compress: bool,
) -> Vec<u8> {
    let seek = file.len();
    let klen = key_len(class, name, title, extra.len());
    let stored = if compress { zlib_block(object) } else { object.to_vec() };
    let header =
        key_header((klen + stored.len()) as u32, object.len() as u32, klen, seek, class, name, title);
    file.extend_from_slice(&header);
    file.extend_from_slice(extra);
    file.extend_from_slice(&stored);
    header
}

/// Append a key list (`TKey` header, count, key headers); returns its seek.
fn write_key_list(file: &mut Vec<u8>, dir: &str, headers: &[Vec<u8>]) -> usize {
    let mut object = (headers.len() as u32).to_be_bytes().to_vec();
    for h in headers {
        object.extend_from_slice(h);
    }
    let seek = file.len();
    write_key(file, "TDirectory", dir, "", &[], &object, false);
    seek
}

fn dir_record(seek_keys: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&5u16.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // ctime
    out.extend_from_slice(&0u32.to_be_bytes()); // mtime
    out.extend_from_slice(&0u32.to_be_bytes()); // nbytes keys
    out.extend_from_slice(&0u32.to_be_bytes()); // nbytes name
    out.extend_from_slice(&0u32.to_be_bytes()); // seek dir
    out.extend_from_slice(&0u32.to_be_bytes()); // seek parent
    out.extend_from_slice(&(seek_keys as u32).to_be_bytes());
    out.extend_from_slice(&[0u8; 30]); // UUID and padding
    out
}

fn zlib_block(object: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(object).expect("zlib write");
    let compressed = enc.finish().expect("zlib finish");
    let mut out = b"ZL".to_vec();
    out.push(8);
    out.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&(object.len() as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&compressed);
    out
}

/// Streams a `TTree` object with class references keyed the way ROOT does.
struct TreeWriter {
    out: Vec<u8>,
    classes: HashMap<String, usize>,
    key_len: usize,
}

impl TreeWriter {
    fn new(key_len: usize) -> Self {
        Self { out: Vec::new(), classes: HashMap::new(), key_len }
    }

    fn u8(&mut self, v: u8) {
        self.out.push(v);
    }
    fn i16(&mut self, v: i16) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }
    fn u16(&mut self, v: u16) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }
    fn i32(&mut self, v: i32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }
    fn u32(&mut self, v: u32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }
    fn i64(&mut self, v: i64) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }
    fn f64(&mut self, v: f64) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }
    fn string(&mut self, s: &str) {
        push_string(&mut self.out, s);
    }

    fn begin(&mut self) -> usize {
        let mark = self.out.len();
        self.u32(0);
        mark
    }

    fn begin_versioned(&mut self, version: u16) -> usize {
        let mark = self.begin();
        self.u16(version);
        mark
    }

    fn end(&mut self, mark: usize) {
        let count = (self.out.len() - mark - 4) as u32 | BYTE_COUNT_MASK;
        self.out[mark..mark + 4].copy_from_slice(&count.to_be_bytes());
    }

    fn tobject(&mut self) {
        self.u16(1);
        self.u32(0);
        self.u32(0x0300_0000);
    }

    fn tnamed(&mut self, name: &str, title: &str) {
        let m = self.begin_versioned(1);
        self.tobject();
        self.string(name);
        self.string(title);
        self.end(m);
    }

    fn att(&mut self, version: u16, shorts: &[i16]) {
        let m = self.begin_versioned(version);
        for &s in shorts {
            self.i16(s);
        }
        self.end(m);
    }

    fn io_features(&mut self) {
        let m = self.begin_versioned(1);
        self.u8(0);
        self.end(m);
    }

    fn obj_array_begin(&mut self, n: usize) -> usize {
        let m = self.begin_versioned(3);
        self.tobject();
        self.string("");
        self.i32(n as i32);
        self.i32(0);
        m
    }

    /// Class tag inside an already opened pointer slot.
    fn class_tag(&mut self, class: &str) {
        match self.classes.get(class) {
            Some(&pos) => self.u32(CLASS_MASK | (pos + self.key_len + 2) as u32),
            None => {
                self.classes.insert(class.to_string(), self.out.len());
                self.u32(NEW_CLASS_TAG);
                self.out.extend_from_slice(class.as_bytes());
                self.out.push(0);
            }
        }
    }

    fn tree(
        mut self,
        name: &str,
        entries: usize,
        branches: &[(String, Values)],
        layouts: &[BranchLayout],
    ) -> Vec<u8> {
        let t = self.begin_versioned(20);
        self.tnamed(name, "");
        self.att(2, &[1, 1, 1]); // TAttLine
        self.att(2, &[0, 1001]); // TAttFill
        self.att(2, &[1, 1, 0, 0]); // TAttMarker
        self.i64(entries as i64);
        self.i64(0); // fTotBytes
        self.i64(0); // fZipBytes
        self.i64(0); // fSavedBytes
        self.i64(0); // fFlushedBytes
        self.f64(1.0); // fWeight
        self.i32(0); // fTimerInterval
        self.i32(25); // fScanField
        self.i32(0); // fUpdate
        self.i32(0); // fDefaultEntryOffsetLen
        self.i32(0); // fNClusterRange
        self.i64(1_000_000_000_000); // fMaxEntries
        self.i64(1_000_000_000_000); // fMaxEntryLoop
        self.i64(0); // fMaxVirtualSize
        self.i64(-300_000_000); // fAutoSave
        self.i64(-30_000_000); // fAutoFlush
        self.i64(1_000_000); // fEstimate
        self.u8(1); // fClusterRangeEnd
        self.u8(1); // fClusterSize
        self.io_features();

        let arr = self.obj_array_begin(branches.len());
        for ((name, values), layout) in branches.iter().zip(layouts) {
            self.branch(name, values, layout, entries);
        }
        self.end(arr);
        self.end(t);
        self.out
    }

    fn branch(&mut self, name: &str, values: &Values, layout: &BranchLayout, entries: usize) {
        let slot = self.begin();
        match values {
            Values::Int(_) => {
                self.class_tag("TBranch");
                self.tbranch(name, &format!("{name}/I"), "TLeafI", 4, 0, layout, entries);
            }
            Values::Double(_) => {
                self.class_tag("TBranch");
                self.tbranch(name, &format!("{name}/D"), "TLeafD", 8, 0, layout, entries);
            }
            Values::VectorDouble(_) => {
                self.class_tag("TBranchElement");
                let e = self.begin_versioned(10);
                self.tbranch(name, name, "TLeafElement", 8, 40, layout, entries);
                self.string("vector<double>"); // fClassName
                self.string(""); // fParentName
                self.string(""); // fClonesName
                self.u32(0x1234); // fCheckSum
                self.i16(6); // fClassVersion
                self.i32(-1); // fID
                self.i32(0); // fType
                self.i32(-1); // fStreamerType
                self.i32(0); // fMaximum
                self.u32(0); // fBranchCount
                self.u32(0); // fBranchCount2
                self.end(e);
            }
        }
        self.end(slot);
    }

    #[allow(clippy::too_many_arguments)]
    fn tbranch(
        &mut self,
        name: &str,
        title: &str,
        leaf_class: &str,
        elem_size: i32,
        entry_offset_len: i32,
        layout: &BranchLayout,
        entries: usize,
    ) {
        let written = layout.seeks.len();
        let max_baskets = written.max(10);

        let b = self.begin_versioned(13);
        self.tnamed(name, title);
        self.att(2, &[0, 1001]); // TAttFill
        self.i32(101); // fCompress
        self.i32(32000); // fBasketSize
        self.i32(entry_offset_len);
        self.i32(written as i32); // fWriteBasket
        self.i64(entries as i64); // fEntryNumber
        self.io_features();
        self.i32(0); // fOffset
        self.i32(max_baskets as i32);
        self.i32(99); // fSplitLevel
        self.i64(entries as i64);
        self.i64(0); // fFirstEntry
        self.i64(0); // fTotBytes
        self.i64(0); // fZipBytes

        let sub = self.obj_array_begin(0);
        self.end(sub);

        let leaves = self.obj_array_begin(1);
        let slot = self.begin();
        self.class_tag(leaf_class);
        let outer = self.begin_versioned(1);
        let base = self.begin_versioned(2);
        self.tnamed(name, title);
        self.i32(1); // fLen
        self.i32(elem_size); // fLenType
        self.i32(0); // fOffset
        self.u8(0); // fIsRange
        self.u8(0); // fIsUnsigned
        self.u32(0); // fLeafCount
        self.end(base);
        match leaf_class {
            "TLeafI" => {
                self.i32(0);
                self.i32(0);
            }
            "TLeafD" => {
                self.f64(0.0);
                self.f64(0.0);
            }
            _ => {
                self.i32(-1); // fID
                self.i32(0); // fType
            }
        }
        self.end(outer);
        self.end(slot);
        self.end(leaves);

        let baskets = self.obj_array_begin(0);
        self.end(baskets);

        self.u8(1);
        for i in 0..max_baskets {
            self.i32(layout.bytes.get(i).map_or(0, |&b| b as i32));
        }
        self.u8(1);
        for i in 0..max_baskets {
            self.i64(layout.first_entries.get(i).map_or(0, |&e| e as i64));
        }
        self.u8(1);
        for i in 0..max_baskets {
            self.i64(layout.seeks.get(i).map_or(0, |&s| s as i64));
        }
        self.string(""); // fFileName
        self.end(b);
    }
}
