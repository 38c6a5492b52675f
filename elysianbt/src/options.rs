//! Options shared by every encoding, plus the binary specific ones.
//!
//! All options derive `Serialize` and `Deserialize`, so they can be kept in a
//! configuration file next to the rest of an application's settings.
use serde::{Deserialize, Serialize};

/// Default bound on how deep containers may nest.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options every reader and writer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NbtOptions {
    /// Whether the outermost tag carries a name. Java and Bedrock files do,
    /// Bedrock network payloads and the text form do not.
    pub has_root_name: bool,

    /// Containers may nest this deep. The root compound is at depth 1.
    pub max_depth: usize,
}

impl Default for NbtOptions {
    fn default() -> Self {
        Self {
            has_root_name: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// How string bytes are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StringEncoding {
    /// Java's Modified UTF-8, i.e. CESU-8 with NUL encoded as two bytes.
    #[default]
    ModifiedUtf8,
    Utf8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryOptions {
    #[serde(flatten)]
    pub generic: NbtOptions,
    pub little_endian: bool,

    /// Encode ints, longs and lengths as (ZigZag) VarInts.
    pub var_int: bool,
    pub string_encoding: StringEncoding,
}

impl BinaryOptions {
    /// Java edition files: big-endian with a named root.
    pub fn java() -> Self {
        Self {
            generic: NbtOptions::default(),
            little_endian: false,
            var_int: false,
            string_encoding: StringEncoding::ModifiedUtf8,
        }
    }

    /// Bedrock edition files: little-endian with a named root.
    pub fn bedrock() -> Self {
        Self {
            generic: NbtOptions::default(),
            little_endian: true,
            var_int: false,
            string_encoding: StringEncoding::Utf8,
        }
    }

    /// Bedrock network payloads: little-endian, VarInt, no root name.
    pub fn bedrock_network() -> Self {
        Self {
            generic: NbtOptions {
                has_root_name: false,
                ..NbtOptions::default()
            },
            little_endian: true,
            var_int: true,
            string_encoding: StringEncoding::Utf8,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.generic.max_depth = max_depth;
        self
    }

    pub fn with_root_name(mut self, has_root_name: bool) -> Self {
        self.generic.has_root_name = has_root_name;
        self
    }
}

impl Default for BinaryOptions {
    fn default() -> Self {
        Self::java()
    }
}
