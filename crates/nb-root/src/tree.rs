//! Branch metadata of a parsed `TTree`.

/// Element type of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafType {
    /// 32-bit float (`/F`, `TLeafF`).
    F32,
    /// 64-bit float (`/D`, `TLeafD`).
    F64,
    /// 8-bit signed (`/B`, `TLeafB`).
    I8,
    /// 8-bit unsigned (`/b`).
    U8,
    /// 16-bit signed (`/S`, `TLeafS`).
    I16,
    /// 16-bit unsigned (`/s`).
    U16,
    /// 32-bit signed (`/I`, `TLeafI`).
    I32,
    /// 32-bit unsigned (`/i`).
    U32,
    /// 64-bit signed (`/L`, `TLeafL`).
    I64,
    /// 64-bit unsigned (`/l`).
    U64,
    /// Boolean stored in one byte (`/O`, `TLeafO`).
    Bool,
}

impl LeafType {
    /// Size in bytes of one element.
    pub fn byte_size(self) -> usize {
        match self {
            LeafType::I8 | LeafType::U8 | LeafType::Bool => 1,
            LeafType::I16 | LeafType::U16 => 2,
            LeafType::F32 | LeafType::I32 | LeafType::U32 => 4,
            LeafType::F64 | LeafType::I64 | LeafType::U64 => 8,
        }
    }

    /// Type of a `TLeaf` subclass. Unsigned variants are only visible in the
    /// leaf list, so the class alone maps to the signed type.
    pub fn from_leaf_class(class_name: &str) -> Option<Self> {
        Some(match class_name {
            "TLeafF" => LeafType::F32,
            "TLeafD" => LeafType::F64,
            "TLeafB" => LeafType::I8,
            "TLeafS" => LeafType::I16,
            "TLeafI" => LeafType::I32,
            "TLeafL" => LeafType::I64,
            "TLeafO" => LeafType::Bool,
            _ => return None,
        })
    }

    /// Type from a leaf-list title such as `"NumberTracks/I"` or `"x[n]/D"`.
    /// A title without a type code is a float leaf.
    pub fn from_leaf_title(title: &str) -> Option<Self> {
        let code = match title.rsplit_once('/') {
            Some((_, code)) => code,
            None => return Some(LeafType::F32),
        };
        Some(match code {
            "F" => LeafType::F32,
            "D" => LeafType::F64,
            "B" => LeafType::I8,
            "b" => LeafType::U8,
            "S" => LeafType::I16,
            "s" => LeafType::U16,
            "I" => LeafType::I32,
            "i" => LeafType::U32,
            "L" => LeafType::I64,
            "l" => LeafType::U64,
            "O" => LeafType::Bool,
            _ => return None,
        })
    }

    /// Element type of a `vector<T>` class name (`"vector<double>"`).
    pub fn from_vector_class(class_name: &str) -> Option<Self> {
        let inner = class_name
            .trim()
            .strip_prefix("vector<")
            .or_else(|| class_name.trim().strip_prefix("std::vector<"))?
            .strip_suffix('>')?
            .trim();
        Some(match inner {
            "double" | "Double_t" | "Double32_t" => LeafType::F64,
            "float" | "Float_t" | "Float16_t" => LeafType::F32,
            "char" | "Char_t" => LeafType::I8,
            "unsigned char" | "UChar_t" => LeafType::U8,
            "short" | "Short_t" => LeafType::I16,
            "unsigned short" | "UShort_t" => LeafType::U16,
            "int" | "Int_t" => LeafType::I32,
            "unsigned int" | "UInt_t" => LeafType::U32,
            "long" | "Long_t" | "long long" | "Long64_t" => LeafType::I64,
            "unsigned long" | "ULong_t" | "unsigned long long" | "ULong64_t" => LeafType::U64,
            "bool" | "Bool_t" => LeafType::Bool,
            _ => return None,
        })
    }

    /// Decode one big-endian element. `bytes` must be exactly
    /// [`byte_size`](Self::byte_size) long.
    pub fn decode(self, bytes: &[u8]) -> f64 {
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        match self {
            LeafType::F32 => f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            LeafType::F64 => f64::from_be_bytes(raw),
            LeafType::I8 => raw[0] as i8 as f64,
            LeafType::U8 => raw[0] as f64,
            LeafType::I16 => i16::from_be_bytes([raw[0], raw[1]]) as f64,
            LeafType::U16 => u16::from_be_bytes([raw[0], raw[1]]) as f64,
            LeafType::I32 => i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            LeafType::U32 => u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            LeafType::I64 => i64::from_be_bytes(raw) as f64,
            LeafType::U64 => u64::from_be_bytes(raw) as f64,
            LeafType::Bool => f64::from(u8::from(raw[0] != 0)),
        }
    }
}

/// How a branch was streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchKind {
    /// Plain `TBranch` with a leaf list.
    Leaf,
    /// `TBranchElement` holding an object of `class_name` (e.g. `vector<double>`).
    Element {
        /// Streamed class.
        class_name: String,
    },
}

/// Metadata of one branch.
#[derive(Debug, Clone)]
pub struct BranchInfo {
    /// Branch name.
    pub name: String,
    /// Branch title (the leaf list for plain branches).
    pub title: String,
    /// Streaming kind.
    pub kind: BranchKind,
    /// Element type.
    pub leaf_type: LeafType,
    /// Number of entries.
    pub entries: u64,
    /// `fEntryOffsetLen`: non-zero when entries vary in size.
    pub entry_offset_len: u32,
    /// On-disk size of each written basket.
    pub basket_bytes: Vec<u32>,
    /// First entry of each written basket, plus one trailing boundary.
    pub basket_entry: Vec<u64>,
    /// File offset of each written basket.
    pub basket_seek: Vec<u64>,
}

impl BranchInfo {
    /// Number of baskets written to disk.
    pub fn n_baskets(&self) -> usize {
        self.basket_seek.len()
    }

    /// Entries stored in basket `i`.
    pub fn basket_entries(&self, i: usize) -> usize {
        let start = self.basket_entry.get(i).copied().unwrap_or(0);
        let end = self.basket_entry.get(i + 1).copied().unwrap_or(self.entries);
        end.saturating_sub(start) as usize
    }

    /// Whether each entry holds a variable number of values.
    pub fn is_jagged(&self) -> bool {
        self.entry_offset_len > 0
            || matches!(&self.kind, BranchKind::Element { class_name } if class_name.contains("vector<"))
    }
}

/// A parsed `TTree`.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Tree name.
    pub name: String,
    /// Number of entries (events).
    pub entries: u64,
    /// Top-level branches.
    pub branches: Vec<BranchInfo>,
}

impl Tree {
    /// Find a branch by name.
    pub fn find_branch(&self, name: &str) -> Option<&BranchInfo> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Names of all branches.
    pub fn branch_names(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.name.as_str()).collect()
    }
}
