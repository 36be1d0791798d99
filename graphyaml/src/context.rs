//! Per-call state.

use graphyaml_core::{AnchorTable, DEFAULT_MASK, MemberDescriptor, Object, TypeDescriptor};

use crate::SerializerSettings;

/// Per-call overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSettings {
    /// Members are read and written only when their mask shares a bit with
    /// this one.
    pub member_mask: u32,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            member_mask: DEFAULT_MASK,
        }
    }
}

/// State of one serialize or deserialize call, returned to the caller after
/// a read.
#[derive(Debug, Clone)]
pub struct SerializerContext {
    pub(crate) anchors: AnchorTable,
    pub(crate) has_remap_occurred: bool,
    pub(crate) member_mask: u32,
    pub(crate) is_serializing: bool,
}

impl SerializerContext {
    pub(crate) fn new(anchors: AnchorTable, settings: ContextSettings, is_serializing: bool) -> Self {
        Self {
            anchors,
            has_remap_occurred: false,
            member_mask: settings.member_mask,
            is_serializing,
        }
    }

    /// Whether a legacy tag, member name or enum name was read.
    pub fn has_remap_occurred(&self) -> bool {
        self.has_remap_occurred
    }

    pub fn member_mask(&self) -> u32 {
        self.member_mask
    }

    pub fn is_serializing(&self) -> bool {
        self.is_serializing
    }

    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }
}

/// What a backend hook is looking at.
#[derive(Debug, Clone, Copy)]
pub struct ObjectContext<'a> {
    pub settings: &'a SerializerSettings,
    /// Runtime descriptor of `instance`.
    pub descriptor: &'a TypeDescriptor,
    pub instance: &'a Object,
    /// Member holding `instance`, when there is one.
    pub member: Option<&'a MemberDescriptor>,
    pub member_mask: u32,
    pub is_serializing: bool,
    /// Styling the items node of a type that also has members.
    pub items: bool,
}
